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
 * mp_schema_rt MsgPack parser
 *
 * A single-pass decoder flattening one MsgPack message into the input-side IR arrays. Container
 * lengths are resolved into relative forward offsets with a patch chain threaded through the
 * xoff fields of not-yet-closed containers, so no per-container second pass is needed.
 **************************************************************************************************/
use crate::constants::*;
use crate::error::{Result, TranscodeError};
use crate::ir::{TypeId, Value};
use crate::state::State;
use crate::utils::within;

use std::convert::TryInto;
use std::mem::size_of;

#[cfg(feature = "trace")]
use func_trace::trace;

#[cfg(feature = "trace")]
func_trace::init_depth_var!();

/// Decode one whole MsgPack message from `input` into `state.t`/`state.v`.
///
/// On success returns the number of IR slots produced; the root value is slot 0 and the IR is a
/// strict depth-first left-to-right flattening of the message tree. `state.res` is empty. Bytes
/// after the root value, if any, are ignored.
///
/// On failure returns the error and mirrors its diagnostic into `state.res`; the IR contents
/// are undefined and must be discarded.
///
/// Blob slots record end-relative offsets into `input`: the payload of a `String`/`Bin`/`Ext`
/// slot occupies `input[input.len() - xoff..][..xlen]`. The same `input` must therefore be
/// passed as bank 1 to a later unparse of this IR.
#[cfg_attr(feature = "trace", trace)]
pub fn parse(state: &mut State, input: &[u8]) -> Result<usize> {
    match parse_inner(state, input) {
        Ok(nitems) => {
            state.res_size = 0;
            Ok(nitems)
        }
        Err(e) => Err(state.set_error(e)),
    }
}

fn parse_inner(state: &mut State, input: &[u8]) -> Result<usize> {
    let end = input.len();
    let mut pos = 0usize; // read cursor in input
    let mut slot = 0usize; // next IR slot to fill
    let mut todo: u32 = 1; // values still to emit in the current container
    let mut patch: u32 = u32::MAX; // head of the open-container chain (chained via xoff)
    let mut stack = 0usize; // live save-stack entries, aliased onto state.ov

    loop {
        while todo == 0 {
            // The current container is complete: resolve its forward offset and pop the
            // enclosing todo. The chain head always names the most recently opened container.
            if stack == 0 {
                return Ok(slot);
            }
            stack -= 1;
            todo = state.ov[stack].as_u64() as u32;
            let fixit = patch as usize;
            patch = state.v[fixit].xoff();
            state.v[fixit] = Value::from_parts(state.v[fixit].xlen(), (slot - fixit) as u32);
        }
        todo -= 1;

        if pos == end {
            return Err(TranscodeError::Truncated);
        }

        // One slot of headroom before emitting.
        if slot == state.t.len() {
            state.grow_input(slot + 1)?;
        }

        let op = input[pos];
        match op {
            0x00..=0x7f => {
                // positive fixint
                state.t[slot] = TypeId::Long;
                state.v[slot] = Value::from_i64(op as i64);
                pos += 1;
            }
            0x80..=0x8f => {
                // fixmap
                let count = (op - MP_FIXMAP) as u32;
                pos += 1;
                open_container(state, TypeId::Map, count, count * 2, slot, &mut patch, &mut stack, &mut todo)?;
            }
            0x90..=0x9f => {
                // fixarray
                let count = (op - MP_FIXARRAY) as u32;
                pos += 1;
                open_container(state, TypeId::Array, count, count, slot, &mut patch, &mut stack, &mut todo)?;
            }
            0xa0..=0xbf => {
                // fixstr
                let len = (op - MP_FIXSTR) as u32;
                pos += 1;
                pos = blob(state, input, TypeId::String, len, slot, pos)?;
            }
            MP_NIL => {
                state.t[slot] = TypeId::Nil;
                pos += 1;
            }
            MP_RESERVED => return Err(TranscodeError::Invalid),
            MP_FALSE => {
                state.t[slot] = TypeId::False;
                pos += 1;
            }
            MP_TRUE => {
                state.t[slot] = TypeId::True;
                pos += 1;
            }
            MP_BIN8 => {
                let len = read_u8(input, pos + 1)? as u32;
                pos += 2;
                pos = blob(state, input, TypeId::Bin, len, slot, pos)?;
            }
            MP_BIN16 => {
                let len = read_u16(input, pos + 1)? as u32;
                pos += 3;
                pos = blob(state, input, TypeId::Bin, len, slot, pos)?;
            }
            MP_BIN32 => {
                let len = read_u32(input, pos + 1)?;
                pos += 5;
                pos = blob(state, input, TypeId::Bin, len, slot, pos)?;
            }
            MP_EXT8 => {
                // xlen counts the payload plus the type byte
                let len = ext_len(read_u8(input, pos + 1)? as u32)?;
                pos += 2;
                pos = blob(state, input, TypeId::Ext, len, slot, pos)?;
            }
            MP_EXT16 => {
                let len = ext_len(read_u16(input, pos + 1)? as u32)?;
                pos += 3;
                pos = blob(state, input, TypeId::Ext, len, slot, pos)?;
            }
            MP_EXT32 => {
                let len = ext_len(read_u32(input, pos + 1)?)?;
                pos += 5;
                pos = blob(state, input, TypeId::Ext, len, slot, pos)?;
            }
            MP_FLOAT32 => {
                let bits = read_u32(input, pos + 1)?;
                state.t[slot] = TypeId::Float;
                state.v[slot] = Value::from_f64(f32::from_bits(bits) as f64);
                pos += 5;
            }
            MP_FLOAT64 => {
                let bits = read_u64(input, pos + 1)?;
                state.t[slot] = TypeId::Double;
                state.v[slot] = Value::from_f64(f64::from_bits(bits));
                pos += 9;
            }
            MP_UINT8 => {
                state.t[slot] = TypeId::Long;
                state.v[slot] = Value::from_i64(read_u8(input, pos + 1)? as i64);
                pos += 2;
            }
            MP_UINT16 => {
                state.t[slot] = TypeId::Long;
                state.v[slot] = Value::from_i64(read_u16(input, pos + 1)? as i64);
                pos += 3;
            }
            MP_UINT32 => {
                state.t[slot] = TypeId::Long;
                state.v[slot] = Value::from_i64(read_u32(input, pos + 1)? as i64);
                pos += 5;
            }
            MP_UINT64 => {
                // Values above i64::MAX keep their unsigned presentation; everything else is
                // canonicalized to Long.
                let v = read_u64(input, pos + 1)?;
                if v > i64::MAX as u64 {
                    state.t[slot] = TypeId::Ulong;
                    state.v[slot] = Value::from_u64(v);
                } else {
                    state.t[slot] = TypeId::Long;
                    state.v[slot] = Value::from_i64(v as i64);
                }
                pos += 9;
            }
            MP_INT8 => {
                state.t[slot] = TypeId::Long;
                state.v[slot] = Value::from_i64(read_u8(input, pos + 1)? as i8 as i64);
                pos += 2;
            }
            MP_INT16 => {
                state.t[slot] = TypeId::Long;
                state.v[slot] = Value::from_i64(read_u16(input, pos + 1)? as i16 as i64);
                pos += 3;
            }
            MP_INT32 => {
                state.t[slot] = TypeId::Long;
                state.v[slot] = Value::from_i64(read_u32(input, pos + 1)? as i32 as i64);
                pos += 5;
            }
            MP_INT64 => {
                state.t[slot] = TypeId::Long;
                state.v[slot] = Value::from_i64(read_u64(input, pos + 1)? as i64);
                pos += 9;
            }
            MP_FIXEXT1 | MP_FIXEXT2 => {
                let len = (op - MP_FIXEXT1) as u32 + 2;
                pos += 1;
                pos = blob(state, input, TypeId::Ext, len, slot, pos)?;
            }
            MP_FIXEXT4 => {
                pos += 1;
                pos = blob(state, input, TypeId::Ext, 5, slot, pos)?;
            }
            MP_FIXEXT8 => {
                pos += 1;
                pos = blob(state, input, TypeId::Ext, 9, slot, pos)?;
            }
            MP_FIXEXT16 => {
                pos += 1;
                pos = blob(state, input, TypeId::Ext, 17, slot, pos)?;
            }
            MP_STR8 => {
                let len = read_u8(input, pos + 1)? as u32;
                pos += 2;
                pos = blob(state, input, TypeId::String, len, slot, pos)?;
            }
            MP_STR16 => {
                let len = read_u16(input, pos + 1)? as u32;
                pos += 3;
                pos = blob(state, input, TypeId::String, len, slot, pos)?;
            }
            MP_STR32 => {
                let len = read_u32(input, pos + 1)?;
                pos += 5;
                pos = blob(state, input, TypeId::String, len, slot, pos)?;
            }
            MP_ARRAY16 => {
                let count = read_u16(input, pos + 1)? as u32;
                pos += 3;
                open_container(state, TypeId::Array, count, count, slot, &mut patch, &mut stack, &mut todo)?;
            }
            MP_ARRAY32 => {
                let count = read_u32(input, pos + 1)?;
                pos += 5;
                open_container(state, TypeId::Array, count, count, slot, &mut patch, &mut stack, &mut todo)?;
            }
            MP_MAP16 => {
                let count = read_u16(input, pos + 1)? as u32;
                pos += 3;
                open_container(state, TypeId::Map, count, count * 2, slot, &mut patch, &mut stack, &mut todo)?;
            }
            MP_MAP32 => {
                let count = read_u32(input, pos + 1)?;
                let pending = count.checked_mul(2).ok_or(TranscodeError::Truncated)?;
                pos += 5;
                open_container(state, TypeId::Map, count, pending, slot, &mut patch, &mut stack, &mut todo)?;
            }
            0xe0..=0xff => {
                // negative fixint
                state.t[slot] = TypeId::Long;
                state.v[slot] = Value::from_i64(op as i8 as i64);
                pos += 1;
            }
        }
        slot += 1;
    }
}

/// Record a container slot and make it the head of the patch chain: its xoff temporarily holds
/// the previous chain head and is rewritten to the real forward offset when the container
/// closes. The enclosing todo is saved on the stack aliased onto `state.ov`.
#[allow(clippy::too_many_arguments)]
#[inline]
fn open_container(
    state: &mut State,
    tag: TypeId,
    count: u32,
    pending: u32,
    slot: usize,
    patch: &mut u32,
    stack: &mut usize,
    todo: &mut u32,
) -> Result<()> {
    state.t[slot] = tag;
    state.v[slot] = Value::from_parts(count, *patch);
    *patch = slot as u32;

    if *stack == state.ov.len() {
        state.grow_stack(*stack + 1)?;
    }
    state.ov[*stack] = Value::from_u64(*todo as u64);
    *stack += 1;
    *todo = pending;
    Ok(())
}

/// Record a blob slot. `pos` names the first payload byte; the stored xoff is the payload's
/// distance from the end of the input so it stays meaningful wherever the pinned bank lives.
/// Returns the cursor just past the payload.
#[inline]
fn blob(
    state: &mut State,
    input: &[u8],
    tag: TypeId,
    len: u32,
    slot: usize,
    pos: usize,
) -> Result<usize> {
    if !within(input, pos, len as usize) {
        return Err(TranscodeError::Truncated);
    }
    state.t[slot] = tag;
    state.v[slot] = Value::from_parts(len, (input.len() - pos) as u32);
    Ok(pos + len as usize)
}

/// An ext blob's xlen includes the type byte; lengths that would not fit a u32 with it are
/// unrepresentable in the IR.
#[inline]
fn ext_len(payload: u32) -> Result<u32> {
    payload.checked_add(1).ok_or(TranscodeError::Invalid)
}

#[inline]
fn read_u8(buf: &[u8], start: usize) -> Result<u8> {
    if within(buf, start, size_of::<u8>()) {
        Ok(buf[start])
    } else {
        Err(TranscodeError::Truncated)
    }
}

#[inline]
fn read_u16(buf: &[u8], start: usize) -> Result<u16> {
    if within(buf, start, size_of::<u16>()) {
        let result: core::result::Result<[u8; 2], _> = buf[start..start + 2].try_into();
        match result {
            Ok(bytes) => Ok(u16::from_be_bytes(bytes)),
            Err(_) => Err(TranscodeError::Truncated),
        }
    } else {
        Err(TranscodeError::Truncated)
    }
}

#[inline]
fn read_u32(buf: &[u8], start: usize) -> Result<u32> {
    if within(buf, start, size_of::<u32>()) {
        let result: core::result::Result<[u8; 4], _> = buf[start..start + 4].try_into();
        match result {
            Ok(bytes) => Ok(u32::from_be_bytes(bytes)),
            Err(_) => Err(TranscodeError::Truncated),
        }
    } else {
        Err(TranscodeError::Truncated)
    }
}

#[inline]
fn read_u64(buf: &[u8], start: usize) -> Result<u64> {
    if within(buf, start, size_of::<u64>()) {
        let result: core::result::Result<[u8; 8], _> = buf[start..start + 8].try_into();
        match result {
            Ok(bytes) => Ok(u64::from_be_bytes(bytes)),
            Err(_) => Err(TranscodeError::Truncated),
        }
    } else {
        Err(TranscodeError::Truncated)
    }
}
