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
 * mp_schema_rt Error API
 *
 * Failure kinds for the MsgPack transcoder runtime. The `Display` rendering of each variant is
 * the exact ASCII diagnostic mirrored into `State::res` on failure, so callers reading the
 * diagnostic buffer and callers matching on the error value see the same text.
 **************************************************************************************************/
use std::result;

use thiserror::Error;

/// An alias for Result<T, TranscodeError> used throughout this crate.
pub type Result<T> = result::Result<T, TranscodeError>;

/// `TranscodeError` enumerates the ways a parse or unparse call can fail. There is no partial
/// success: after any error the IR contents are undefined and must be discarded before the
/// `State` is used again.
#[derive(Copy, Clone, Error, Debug, PartialEq, Eq)]
pub enum TranscodeError {
    /// The parser ran off the end of the input while reading an opcode or its payload.
    #[error("Truncated data")]
    Truncated,
    /// The parser met the reserved opcode 0xc1, or an IR slot references bytes outside its bank.
    #[error("Invalid data")]
    Invalid,
    /// An allocation failed while growing one of the `State` buffers.
    #[error("Out of memory")]
    OutOfMemory,
    /// A tag byte does not name any known `TypeId`.
    #[error("Internal error: unknown code")]
    UnknownCode,
}
