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
 * mp_schema_rt MsgPack wire constants
 *
 * First-byte values of the MsgPack serialization format. All multi-byte fields that follow an
 * opcode are big-endian on the wire.
 **************************************************************************************************/

/// Base opcode of the fixmap family (`0x80 + count`, count <= 15)
pub const MP_FIXMAP: u8 = 0x80;
/// Base opcode of the fixarray family (`0x90 + count`, count <= 15)
pub const MP_FIXARRAY: u8 = 0x90;
/// Base opcode of the fixstr family (`0xa0 + length`, length <= 31)
pub const MP_FIXSTR: u8 = 0xa0;

/// nil
pub const MP_NIL: u8 = 0xc0;
/// Reserved by the MsgPack specification, never valid in a stream
pub const MP_RESERVED: u8 = 0xc1;
/// false
pub const MP_FALSE: u8 = 0xc2;
/// true
pub const MP_TRUE: u8 = 0xc3;

/// bin with an 8-bit length field
pub const MP_BIN8: u8 = 0xc4;
/// bin with a 16-bit length field
pub const MP_BIN16: u8 = 0xc5;
/// bin with a 32-bit length field
pub const MP_BIN32: u8 = 0xc6;

/// ext with an 8-bit length field (length excludes the type byte on the wire)
pub const MP_EXT8: u8 = 0xc7;
/// ext with a 16-bit length field
pub const MP_EXT16: u8 = 0xc8;
/// ext with a 32-bit length field
pub const MP_EXT32: u8 = 0xc9;

/// IEEE 754 single precision
pub const MP_FLOAT32: u8 = 0xca;
/// IEEE 754 double precision
pub const MP_FLOAT64: u8 = 0xcb;

/// unsigned 8-bit integer
pub const MP_UINT8: u8 = 0xcc;
/// unsigned 16-bit integer
pub const MP_UINT16: u8 = 0xcd;
/// unsigned 32-bit integer
pub const MP_UINT32: u8 = 0xce;
/// unsigned 64-bit integer
pub const MP_UINT64: u8 = 0xcf;

/// signed 8-bit integer
pub const MP_INT8: u8 = 0xd0;
/// signed 16-bit integer
pub const MP_INT16: u8 = 0xd1;
/// signed 32-bit integer
pub const MP_INT32: u8 = 0xd2;
/// signed 64-bit integer
pub const MP_INT64: u8 = 0xd3;

/// ext with a 1-byte payload after the type byte
pub const MP_FIXEXT1: u8 = 0xd4;
/// ext with a 2-byte payload after the type byte
pub const MP_FIXEXT2: u8 = 0xd5;
/// ext with a 4-byte payload after the type byte
pub const MP_FIXEXT4: u8 = 0xd6;
/// ext with an 8-byte payload after the type byte
pub const MP_FIXEXT8: u8 = 0xd7;
/// ext with a 16-byte payload after the type byte
pub const MP_FIXEXT16: u8 = 0xd8;

/// str with an 8-bit length field
pub const MP_STR8: u8 = 0xd9;
/// str with a 16-bit length field
pub const MP_STR16: u8 = 0xda;
/// str with a 32-bit length field
pub const MP_STR32: u8 = 0xdb;

/// array with a 16-bit count field
pub const MP_ARRAY16: u8 = 0xdc;
/// array with a 32-bit count field
pub const MP_ARRAY32: u8 = 0xdd;
/// map with a 16-bit pair-count field
pub const MP_MAP16: u8 = 0xde;
/// map with a 32-bit pair-count field
pub const MP_MAP32: u8 = 0xdf;

/// Largest payload length encodable as a fixstr
pub const FIXSTR_MAX_LEN: u32 = 31;
/// Largest element count encodable as a fixarray
pub const FIXARRAY_MAX_LEN: u32 = 15;
/// Largest pair count encodable as a fixmap
pub const FIXMAP_MAX_LEN: u32 = 15;
