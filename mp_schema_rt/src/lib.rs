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
 * mp_schema_rt module definition
 *
 * Runtime core for schema-directed MessagePack transcoding: a flat-IR parser/unparser pair over
 * pinned data banks, plus a perfect hash generator used to dispatch on field-name string sets.
 **************************************************************************************************/

#![warn(missing_docs)]

//! # MP_SCHEMA_RT
//!
//! The `mp_schema_rt` crate is the runtime half of a schema-directed MessagePack transcoder.
//! A schema compiler (out of scope here) turns a record schema into a program that rewrites
//! messages; this crate supplies the primitives that program runs on:
//!
//! - [`parser::parse`] decodes one MsgPack message into a flat, stack-friendly intermediate
//!   representation: two parallel arrays of [`types::TypeId`] tags and 64-bit [`types::Value`]
//!   slots, one slot per value, containers resolved into relative forward offsets.
//! - [`unparser::unparse`] serializes such an IR (transformed or synthesized by the schema
//!   layer) back into MsgPack, splicing constants and prebuilt defaults from a secondary data
//!   bank where the IR asks for them.
//! - [`hasher::create_hash`] builds a compact 32-bit descriptor of a collision-free hash over a
//!   static set of field names, and [`hasher::eval_hash`] evaluates it, so key routing needs no
//!   string comparisons on the hot path.
//!
//! All working storage lives in a [`types::State`] that is created once and reused across
//! messages; its buffers grow monotonically and are never shrunk by a successful call. A
//! `State` must not be shared between threads; distinct `State` objects are fully independent.
//!
//! ## Example
//!
//! Parse a small message, move the IR to the output side unchanged, and serialize it again:
//!
//! ```
//! use mp_schema_rt::parser::parse;
//! use mp_schema_rt::types::State;
//! use mp_schema_rt::unparser::unparse;
//!
//! # fn main() -> Result<(), mp_schema_rt::error::TranscodeError> {
//! let input = [0x93u8, 0x01, 0x02, 0x03]; // [1, 2, 3]
//!
//! let mut state = State::new();
//! let nitems = parse(&mut state, &input)?;
//! assert_eq!(nitems, 4); // the array plus three elements
//!
//! state.grow_output(nitems)?;
//! for i in 0..nitems {
//!     state.ot[i] = state.t[i];
//!     state.ov[i] = state.v[i];
//! }
//!
//! unparse(&mut state, nitems, &input, &[], &[])?;
//! assert_eq!(state.res(), &input);
//! # Ok(())
//! # }
//! ```
//!
//! ## Hashing field names
//!
//! ```
//! use mp_schema_rt::hasher::{create_hash, descriptor_needs_length, eval_hash};
//!
//! let names: &[&[u8]] = &[b"March", b"May", b"June"];
//! let func = create_hash(names, &[0x3a, 0x91, 0x7c, 0x05]);
//! assert_ne!(func, 0);
//!
//! let hash_of = |s: &[u8]| {
//!     let len = if descriptor_needs_length(func) { s.len() } else { 0 };
//!     eval_hash(func, s, len)
//! };
//! assert_ne!(hash_of(b"March"), hash_of(b"May"));
//! assert_ne!(hash_of(b"May"), hash_of(b"June"));
//! ```

pub(crate) mod constants;
pub(crate) mod hash;
pub(crate) mod ir;
pub(crate) mod parse;
pub(crate) mod state;
pub(crate) mod unparse;
pub(crate) mod utils;

/// The `error` module contains the failure kinds used throughout `mp_schema_rt`.
pub mod error;

/// The `types` module exports the IR building blocks: the [`TypeId`] tag enumeration, the
/// [`Value`] slot, the [`State`] working storage and the spill-escape sentinel.
pub mod types {
    pub use super::ir::{TypeId, Value, SPILL_ESCAPE};
    pub use super::state::State;
}

/// The `parser` module exports the MsgPack → IR decoding entry point.
pub mod parser {
    pub use super::parse::parse;
}

/// The `unparser` module exports the IR → MsgPack serialization entry point.
pub mod unparser {
    pub use super::unparse::unparse;
}

/// The `hasher` module exports the perfect-hash builder and the runtime lookup helpers driven
/// by its descriptors.
pub mod hasher {
    pub use super::hash::{
        create_hash, descriptor_needs_length, eval_fnv1a, eval_hash, key_eq, search,
    };
}
