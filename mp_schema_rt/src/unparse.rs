/***************************************************************************************************
 * Copyright (c) 2023-2024 Qualcomm Innovation Center, Inc. All rights reserved.
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy of this software
 * and associated documentation files (the “Software”), to deal in the Software without
 * restriction, including without limitation the rights to use, copy, modify, merge, publish,
 * distribute, sublicense, and/or sell copies of the Software, and to permit persons to whom the
 * Software is furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all copies or
 * substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING
 * BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
 * NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
 * DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
 **************************************************************************************************/
/***************************************************************************************************
 * mp_schema_rt MsgPack unparser
 *
 * Serializes an output-side IR back into MsgPack bytes. Integers always use the shortest
 * presentation that fits, and the signed family only for negative values; strings, bins and
 * containers pick the narrowest length class. Copy-enabled tags draw their payload from the
 * constant bank for one slot, then the current bank falls back to the input bank.
 **************************************************************************************************/
use crate::constants::*;
use crate::error::{Result, TranscodeError};
use crate::ir::{TypeId, Value, SPILL_ESCAPE};
use crate::state::State;

#[cfg(feature = "trace")]
use func_trace::trace;

#[cfg(feature = "trace")]
func_trace::init_depth_var!();

/// Headroom kept available in `res` at every loop iteration: enough for any opcode together
/// with its fixed-size payload, so only blob copies need a second capacity check.
const HEADROOM: usize = 10;

/// Serialize the first `nitems` slots of `state.ot`/`state.ov` into `state.res` as MsgPack.
///
/// `b1` is the input bank (the bytes a preceding [`crate::parser::parse`] consumed — `String`,
/// `Bin` and `Ext` slots resolve their end-relative offsets against it). `b2` is the constant
/// bank for the `CString`/`CBin`/`Copy` tags. `spill` backs the large-offset escape: a
/// copy-enabled slot with `xoff == `[`SPILL_ESCAPE`] takes its payload from
/// `spill[next_slot_value]` and consumes the following slot as the index carrier.
///
/// On success returns the encoded length; the message is `state.res()`. On failure the
/// diagnostic is in `state.res()` and the output is discarded.
#[cfg_attr(feature = "trace", trace)]
pub fn unparse(
    state: &mut State,
    nitems: usize,
    b1: &[u8],
    b2: &[u8],
    spill: &[&[u8]],
) -> Result<usize> {
    match unparse_inner(state, nitems, b1, b2, spill) {
        Ok(len) => {
            state.res_size = len;
            Ok(len)
        }
        Err(e) => Err(state.set_error(e)),
    }
}

fn unparse_inner(
    state: &mut State,
    nitems: usize,
    b1: &[u8],
    b2: &[u8],
    spill: &[&[u8]],
) -> Result<usize> {
    if nitems > state.ot.len() || nitems > state.ov.len() {
        return Err(TranscodeError::Invalid);
    }

    let mut out = 0usize;
    state.grow_res(out + HEADROOM)?;

    let mut i = 0usize;
    while i < nitems {
        // invariant: at least HEADROOM bytes available behind `out`
        let tag = state.ot[i];
        let value = state.ov[i];
        let mut consumed = 1usize;

        match tag {
            TypeId::Nil => {
                state.res[out] = MP_NIL;
                out += 1;
            }
            TypeId::False => {
                state.res[out] = MP_FALSE;
                out += 1;
            }
            TypeId::True => {
                state.res[out] = MP_TRUE;
                out += 1;
            }
            TypeId::Long => {
                out = emit_long(&mut state.res, out, value.as_i64());
            }
            TypeId::Ulong => {
                out = emit_unsigned(&mut state.res, out, value.as_u64());
            }
            TypeId::Float => {
                state.res[out] = MP_FLOAT32;
                put_u32(&mut state.res, out + 1, (value.as_f64() as f32).to_bits());
                out += 5;
            }
            TypeId::Double => {
                state.res[out] = MP_FLOAT64;
                put_u64(&mut state.res, out + 1, value.as_f64().to_bits());
                out += 9;
            }
            TypeId::String | TypeId::CString => {
                let bank = if tag == TypeId::CString { b2 } else { b1 };
                out = emit_str_header(&mut state.res, out, value.xlen());
                let (src, used) = copy_source(value, next_value(state, i, nitems), bank, spill)?;
                out = copy_blob(state, out, src)?;
                consumed = used;
            }
            TypeId::Bin | TypeId::CBin => {
                let bank = if tag == TypeId::CBin { b2 } else { b1 };
                out = emit_bin_header(&mut state.res, out, value.xlen());
                let (src, used) = copy_source(value, next_value(state, i, nitems), bank, spill)?;
                out = copy_blob(state, out, src)?;
                consumed = used;
            }
            TypeId::Ext => {
                out = emit_ext_header(&mut state.res, out, value.xlen())?;
                let (src, used) = copy_source(value, next_value(state, i, nitems), b1, spill)?;
                out = copy_blob(state, out, src)?;
                consumed = used;
            }
            TypeId::Array => {
                let count = value.xlen();
                if count <= FIXARRAY_MAX_LEN {
                    state.res[out] = MP_FIXARRAY + count as u8;
                    out += 1;
                } else if count <= u16::MAX as u32 {
                    state.res[out] = MP_ARRAY16;
                    put_u16(&mut state.res, out + 1, count as u16);
                    out += 3;
                } else {
                    state.res[out] = MP_ARRAY32;
                    put_u32(&mut state.res, out + 1, count);
                    out += 5;
                }
            }
            TypeId::Map => {
                let count = value.xlen();
                if count <= FIXMAP_MAX_LEN {
                    state.res[out] = MP_FIXMAP + count as u8;
                    out += 1;
                } else if count <= u16::MAX as u32 {
                    state.res[out] = MP_MAP16;
                    put_u16(&mut state.res, out + 1, count as u16);
                    out += 3;
                } else {
                    state.res[out] = MP_MAP32;
                    put_u32(&mut state.res, out + 1, count);
                    out += 5;
                }
            }
            TypeId::Copy => {
                // raw splice, no framing
                let (src, used) = copy_source(value, next_value(state, i, nitems), b2, spill)?;
                out = copy_blob(state, out, src)?;
                consumed = used;
            }
        }

        // restore the headroom invariant for the next slot
        state.grow_res(out + HEADROOM)?;
        i += consumed;
    }

    Ok(out)
}

/// Value slot following slot `i`, if any: the spill-index carrier of an escaped copy.
#[inline]
fn next_value(state: &State, i: usize, nitems: usize) -> Option<Value> {
    if i + 1 < nitems {
        Some(state.ov[i + 1])
    } else {
        None
    }
}

/// Resolve the payload bytes of a copy-enabled slot and the number of IR slots it spans.
///
/// The regular form reads `xlen` bytes at the end-relative offset `xoff` in `bank`. The
/// `xoff == SPILL_ESCAPE` form takes the payload from the spill table instead, indexed by the
/// following slot, and spans two slots. Offsets or lengths outside the bank are reported as
/// malformed IR.
fn copy_source<'a>(
    value: Value,
    next: Option<Value>,
    bank: &'a [u8],
    spill: &'a [&'a [u8]],
) -> Result<(&'a [u8], usize)> {
    let xlen = value.xlen() as usize;
    if value.xoff() == SPILL_ESCAPE {
        let carrier = next.ok_or(TranscodeError::Invalid)?;
        let blob = *spill
            .get(carrier.as_u64() as usize)
            .ok_or(TranscodeError::Invalid)?;
        if blob.len() < xlen {
            return Err(TranscodeError::Invalid);
        }
        Ok((&blob[..xlen], 2))
    } else {
        let xoff = value.xoff() as usize;
        if xoff > bank.len() || xlen > xoff {
            return Err(TranscodeError::Invalid);
        }
        let start = bank.len() - xoff;
        Ok((&bank[start..start + xlen], 1))
    }
}

/// Append the resolved payload, ensuring room for it plus the headroom of the next iteration.
fn copy_blob(state: &mut State, out: usize, src: &[u8]) -> Result<usize> {
    state.grow_res(out + src.len() + HEADROOM)?;
    state.res[out..out + src.len()].copy_from_slice(src);
    Ok(out + src.len())
}

/// Shortest unsigned presentation. Never emits a signed form.
#[inline]
fn emit_unsigned(res: &mut [u8], out: usize, v: u64) -> usize {
    if v <= 0x7f {
        res[out] = v as u8;
        out + 1
    } else if v <= u8::MAX as u64 {
        res[out] = MP_UINT8;
        res[out + 1] = v as u8;
        out + 2
    } else if v <= u16::MAX as u64 {
        res[out] = MP_UINT16;
        put_u16(res, out + 1, v as u16);
        out + 3
    } else if v <= u32::MAX as u64 {
        res[out] = MP_UINT32;
        put_u32(res, out + 1, v as u32);
        out + 5
    } else {
        res[out] = MP_UINT64;
        put_u64(res, out + 1, v);
        out + 9
    }
}

/// Shortest presentation of a signed value. Non-negative values take the unsigned family;
/// signedness is not a value property worth preserving in MsgPack, and downstream consumers
/// index unsigned integers.
#[inline]
fn emit_long(res: &mut [u8], out: usize, v: i64) -> usize {
    if v >= 0 {
        return emit_unsigned(res, out, v as u64);
    }
    if v >= -32 {
        res[out] = v as i8 as u8;
        out + 1
    } else if v >= i8::MIN as i64 {
        res[out] = MP_INT8;
        res[out + 1] = v as i8 as u8;
        out + 2
    } else if v >= i16::MIN as i64 {
        res[out] = MP_INT16;
        put_u16(res, out + 1, v as i16 as u16);
        out + 3
    } else if v >= i32::MIN as i64 {
        res[out] = MP_INT32;
        put_u32(res, out + 1, v as i32 as u32);
        out + 5
    } else {
        res[out] = MP_INT64;
        put_u64(res, out + 1, v as u64);
        out + 9
    }
}

/// Narrowest str framing for a payload of `xlen` bytes.
#[inline]
fn emit_str_header(res: &mut [u8], out: usize, xlen: u32) -> usize {
    if xlen <= FIXSTR_MAX_LEN {
        res[out] = MP_FIXSTR + xlen as u8;
        out + 1
    } else if xlen <= u8::MAX as u32 {
        res[out] = MP_STR8;
        res[out + 1] = xlen as u8;
        out + 2
    } else if xlen <= u16::MAX as u32 {
        res[out] = MP_STR16;
        put_u16(res, out + 1, xlen as u16);
        out + 3
    } else {
        res[out] = MP_STR32;
        put_u32(res, out + 1, xlen);
        out + 5
    }
}

/// Narrowest bin framing for a payload of `xlen` bytes.
#[inline]
fn emit_bin_header(res: &mut [u8], out: usize, xlen: u32) -> usize {
    if xlen <= u8::MAX as u32 {
        res[out] = MP_BIN8;
        res[out + 1] = xlen as u8;
        out + 2
    } else if xlen <= u16::MAX as u32 {
        res[out] = MP_BIN16;
        put_u16(res, out + 1, xlen as u16);
        out + 3
    } else {
        res[out] = MP_BIN32;
        put_u32(res, out + 1, xlen);
        out + 5
    }
}

/// Ext framing. `xlen` counts the type byte plus payload, so the fixext shapes are the exact
/// lengths 2/3/5/9/17 and the sized classes carry `xlen - 1` in their wire length field.
/// An ext slot without even a type byte is malformed.
fn emit_ext_header(res: &mut [u8], out: usize, xlen: u32) -> Result<usize> {
    match xlen {
        2 => {
            res[out] = MP_FIXEXT1;
            Ok(out + 1)
        }
        3 => {
            res[out] = MP_FIXEXT2;
            Ok(out + 1)
        }
        5 => {
            res[out] = MP_FIXEXT4;
            Ok(out + 1)
        }
        9 => {
            res[out] = MP_FIXEXT8;
            Ok(out + 1)
        }
        17 => {
            res[out] = MP_FIXEXT16;
            Ok(out + 1)
        }
        _ => {
            let payload = xlen.checked_sub(1).ok_or(TranscodeError::Invalid)?;
            if payload <= u8::MAX as u32 {
                res[out] = MP_EXT8;
                res[out + 1] = payload as u8;
                Ok(out + 2)
            } else if payload <= u16::MAX as u32 {
                res[out] = MP_EXT16;
                put_u16(res, out + 1, payload as u16);
                Ok(out + 3)
            } else {
                res[out] = MP_EXT32;
                put_u32(res, out + 1, payload);
                Ok(out + 5)
            }
        }
    }
}

#[inline]
fn put_u16(res: &mut [u8], at: usize, v: u16) {
    res[at..at + 2].copy_from_slice(&v.to_be_bytes());
}

#[inline]
fn put_u32(res: &mut [u8], at: usize, v: u32) {
    res[at..at + 4].copy_from_slice(&v.to_be_bytes());
}

#[inline]
fn put_u64(res: &mut [u8], at: usize, v: u64) {
    res[at..at + 8].copy_from_slice(&v.to_be_bytes());
}
