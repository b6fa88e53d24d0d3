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
 * mp_schema_rt intermediate representation
 *
 * The IR is a depth-first flattening of a MsgPack value tree into two parallel arrays: a tag
 * array of `TypeId` and a value array of 64-bit `Value` slots. One slot per MsgPack value,
 * containers counted once. Element i of an IR is valid only if both arrays are populated at i.
 **************************************************************************************************/
use crate::error::TranscodeError;

use std::convert::TryFrom;

/// Sentinel `xoff` of a copy-enabled slot whose blob does not live in a data bank. The slot
/// immediately after the escaped one carries (as a raw `u64`) an index into the spill table
/// passed to the unparser, and is consumed together with it.
pub const SPILL_ESCAPE: u32 = u32::MAX;

/// Tags identifying how the companion [`Value`] slot of an IR element is to be interpreted.
///
/// Discriminant values are fixed so that tag streams produced by an external schema compiler
/// remain stable across releases.
///
/// - `Nil`, `False`, `True` have no companion value (the slot is allocated but unused).
/// - `Long` carries an `i64`, `Ulong` a `u64` above `i64::MAX` (the parser prefers `Long`).
/// - `Float` and `Double` both carry an `f64`; `Float` marks a value that was (and will again
///   be) serialized in single precision.
/// - `String`, `Bin` and `Ext` carry an `(xlen, xoff)` pair locating a blob in the input bank.
///   For `Ext`, `xlen` counts the payload plus the one-byte type code.
/// - `Array` and `Map` carry the element count (pair count for `Map`) in `xlen` and the relative
///   forward offset to the slot after their last descendant in `xoff`.
/// - `CString` and `CBin` are unparse-only String/Bin variants drawing their blob from the
///   constant bank instead of the input bank.
/// - `Copy` is unparse-only and splices `xlen` bytes verbatim from the constant bank, without
///   any MsgPack framing. It provides complex prebuilt default values.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TypeId {
    /// nil
    Nil = 1,
    /// false
    False = 2,
    /// true
    True = 3,
    /// Signed 64-bit integer
    Long = 4,
    /// Unsigned 64-bit integer above `i64::MAX`
    Ulong = 5,
    /// 64-bit float carrier for an originally 32-bit value
    Float = 6,
    /// 64-bit float
    Double = 7,
    /// UTF-8 string blob in the input bank
    String = 8,
    /// Binary blob in the input bank
    Bin = 9,
    /// Extension blob (type byte + payload) in the input bank
    Ext = 10,
    /// Array container
    Array = 11,
    /// Map container
    Map = 12,
    /// String blob in the constant bank (unparse only)
    CString = 18,
    /// Binary blob in the constant bank (unparse only)
    CBin = 19,
    /// Verbatim byte splice from the constant bank (unparse only)
    Copy = 20,
}

impl Default for TypeId {
    fn default() -> Self {
        TypeId::Nil
    }
}

impl TryFrom<u8> for TypeId {
    type Error = TranscodeError;

    /// Decode a raw tag byte, e.g. from a schema compiler's serialized program. Unknown codes
    /// are the `Internal error: unknown code` failure of the runtime.
    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(TypeId::Nil),
            2 => Ok(TypeId::False),
            3 => Ok(TypeId::True),
            4 => Ok(TypeId::Long),
            5 => Ok(TypeId::Ulong),
            6 => Ok(TypeId::Float),
            7 => Ok(TypeId::Double),
            8 => Ok(TypeId::String),
            9 => Ok(TypeId::Bin),
            10 => Ok(TypeId::Ext),
            11 => Ok(TypeId::Array),
            12 => Ok(TypeId::Map),
            18 => Ok(TypeId::CString),
            19 => Ok(TypeId::CBin),
            20 => Ok(TypeId::Copy),
            _ => Err(TranscodeError::UnknownCode),
        }
    }
}

/// A 64-bit IR value slot.
///
/// The slot is a plain bit container; the companion [`TypeId`] decides which view is meaningful:
/// `i64` for `Long`, `u64` for `Ulong` (and for the spill-table index of the slot following an
/// escaped copy), `f64` for `Float`/`Double`, and the packed `(xlen, xoff)` pair for blobs and
/// containers.
///
/// Blob `xoff` is end-relative: the payload occupies `bank[bank.len() - xoff..][..xlen]`. The
/// convention stays valid no matter where the pinned bank lives.
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq)]
pub struct Value(u64);

impl Value {
    /// Wrap a signed integer.
    #[inline]
    pub fn from_i64(v: i64) -> Self {
        Value(v as u64)
    }

    /// Wrap an unsigned integer (also used for spill-table indices).
    #[inline]
    pub fn from_u64(v: u64) -> Self {
        Value(v)
    }

    /// Wrap a float, preserving its bit pattern.
    #[inline]
    pub fn from_f64(v: f64) -> Self {
        Value(v.to_bits())
    }

    /// Pack an `(xlen, xoff)` pair.
    #[inline]
    pub fn from_parts(xlen: u32, xoff: u32) -> Self {
        Value((xoff as u64) << 32 | xlen as u64)
    }

    /// The slot viewed as a signed integer.
    #[inline]
    pub fn as_i64(self) -> i64 {
        self.0 as i64
    }

    /// The slot viewed as an unsigned integer.
    #[inline]
    pub fn as_u64(self) -> u64 {
        self.0
    }

    /// The slot viewed as a float.
    #[inline]
    pub fn as_f64(self) -> f64 {
        f64::from_bits(self.0)
    }

    /// Blob byte length, or container element count.
    #[inline]
    pub fn xlen(self) -> u32 {
        self.0 as u32
    }

    /// End-relative blob offset, or relative forward container offset.
    #[inline]
    pub fn xoff(self) -> u32 {
        (self.0 >> 32) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_roundtrips_integers() {
        assert_eq!(Value::from_i64(-100).as_i64(), -100);
        assert_eq!(Value::from_u64(u64::MAX).as_u64(), u64::MAX);
        // A negative Long viewed through the unsigned lens is its 2-complement image.
        assert_eq!(Value::from_i64(-1).as_u64(), u64::MAX);
    }

    #[test]
    fn value_roundtrips_floats() {
        assert_eq!(Value::from_f64(1.5).as_f64(), 1.5);
        assert!(Value::from_f64(f64::NAN).as_f64().is_nan());
    }

    #[test]
    fn value_packs_xlen_xoff() {
        let v = Value::from_parts(3, 0xdead_beef);
        assert_eq!(v.xlen(), 3);
        assert_eq!(v.xoff(), 0xdead_beef);
    }

    #[test]
    fn unknown_tag_bytes_are_rejected() {
        assert_eq!(TypeId::try_from(4), Ok(TypeId::Long));
        assert_eq!(TypeId::try_from(20), Ok(TypeId::Copy));
        for bad in [0u8, 13, 17, 21, 255] {
            assert_eq!(TypeId::try_from(bad), Err(TranscodeError::UnknownCode));
        }
    }
}
