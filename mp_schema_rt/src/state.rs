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
 * mp_schema_rt transcoder state
 *
 * The `State` owns the four growable IR arrays and the result buffer. It is created once and
 * reused across messages; all buffers grow monotonically and never shrink on success. A `State`
 * is not safe for concurrent use; distinct `State` objects are independent.
 **************************************************************************************************/
use crate::error::{Result, TranscodeError};
use crate::ir::{TypeId, Value};

#[cfg(feature = "trace")]
use func_trace::trace;

#[cfg(feature = "trace")]
func_trace::init_depth_var!();

/// Working storage for the parse and unparse entry points.
///
/// The vector length of each array is its reserved capacity; the live prefix is whatever the
/// last parse (for `t`/`v`) or the upstream schema transformation (for `ot`/`ov`) produced.
/// Slots beyond the live prefix hold stale data from earlier messages.
#[derive(Debug, Default)]
pub struct State {
    /// Input-side tags, filled by the parser.
    pub t: Vec<TypeId>,
    /// Input-side value slots, parallel to `t`.
    pub v: Vec<Value>,
    /// Output-side tags, consumed by the unparser. Populated by the caller after `grow_output`.
    pub ot: Vec<TypeId>,
    /// Output-side value slots, parallel to `ot`.
    pub ov: Vec<Value>,
    /// Result bytes: the serialized message after unparse, or a diagnostic after a failure.
    pub(crate) res: Vec<u8>,
    /// Live length of `res`.
    pub(crate) res_size: usize,
}

impl State {
    /// Construct an empty `State`. All buffers start unallocated; the first message pays the
    /// initial growth to 128 slots.
    pub fn new() -> Self {
        State::default()
    }

    /// Ensure the output-side IR arrays `ot`/`ov` can hold at least `min_capacity` slots.
    ///
    /// The upstream schema layer calls this before writing a transformed IR for `unparse`.
    #[cfg_attr(feature = "trace", trace)]
    pub fn grow_output(&mut self, min_capacity: usize) -> Result<()> {
        if self.ot.len() < min_capacity {
            let new_capacity = next_capacity(min_capacity);
            grow(&mut self.ov, new_capacity)?;
            grow(&mut self.ot, new_capacity)?;
        }
        Ok(())
    }

    /// Bytes produced by the last call: the serialized message on unparse success, empty on
    /// parse success, and a short ASCII diagnostic after any failure.
    #[inline]
    pub fn res(&self) -> &[u8] {
        &self.res[..self.res_size]
    }

    /// Length of [`State::res`].
    #[inline]
    pub fn res_size(&self) -> usize {
        self.res_size
    }

    /// Ensure the input-side IR arrays `t`/`v` can hold at least `min_capacity` slots.
    pub(crate) fn grow_input(&mut self, min_capacity: usize) -> Result<()> {
        if self.t.len() < min_capacity {
            let new_capacity = next_capacity(min_capacity);
            grow(&mut self.v, new_capacity)?;
            grow(&mut self.t, new_capacity)?;
        }
        Ok(())
    }

    /// Ensure the save stack aliased onto `ov` can hold at least `min_capacity` entries.
    /// Keeps `ot` in lock-step so the parallel-array invariant survives the aliasing.
    pub(crate) fn grow_stack(&mut self, min_capacity: usize) -> Result<()> {
        if self.ov.len() < min_capacity {
            let new_capacity = next_capacity(min_capacity);
            grow(&mut self.ov, new_capacity)?;
            grow(&mut self.ot, new_capacity)?;
        }
        Ok(())
    }

    /// Ensure `res` can hold at least `min_capacity` bytes.
    pub(crate) fn grow_res(&mut self, min_capacity: usize) -> Result<()> {
        if self.res.len() < min_capacity {
            grow(&mut self.res, next_capacity(min_capacity))?;
        }
        Ok(())
    }

    /// Record a failure: mirror the diagnostic text into `res` and hand the error back for
    /// `?`-style propagation. If even the diagnostic cannot be stored, `res` is left empty.
    #[cfg_attr(feature = "trace", trace)]
    pub(crate) fn set_error(&mut self, err: TranscodeError) -> TranscodeError {
        let msg = err.to_string();
        if self.res.len() < msg.len() && grow(&mut self.res, next_capacity(msg.len())).is_err() {
            self.res_size = 0;
            return err;
        }
        self.res[..msg.len()].copy_from_slice(msg.as_bytes());
        self.res_size = msg.len();
        err
    }
}

/// Compute the capacity to grow to: 128 slots initially, then half again as much each step
/// until `min_capacity` is reached.
#[inline]
pub(crate) fn next_capacity(min_capacity: usize) -> usize {
    let mut capacity = 128;
    while capacity < min_capacity {
        capacity += capacity / 2;
    }
    capacity
}

/// Grow `buf` to exactly `new_capacity` elements, reporting allocator failure as
/// `Out of memory` rather than aborting.
fn grow<T: Default + Clone>(buf: &mut Vec<T>, new_capacity: usize) -> Result<()> {
    let additional = new_capacity.saturating_sub(buf.len());
    buf.try_reserve_exact(additional)
        .map_err(|_| TranscodeError::OutOfMemory)?;
    buf.resize(new_capacity, T::default());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_grows_by_half_steps() {
        assert_eq!(next_capacity(0), 128);
        assert_eq!(next_capacity(128), 128);
        assert_eq!(next_capacity(129), 192);
        assert_eq!(next_capacity(193), 288);
        assert_eq!(next_capacity(289), 432);
    }

    #[test]
    fn grow_output_is_monotonic_and_parallel() {
        let mut state = State::new();
        state.grow_output(1).unwrap();
        assert_eq!(state.ot.len(), 128);
        assert_eq!(state.ov.len(), 128);

        state.grow_output(200).unwrap();
        assert_eq!(state.ot.len(), 288);
        assert_eq!(state.ov.len(), 288);

        // Asking for less must not shrink.
        state.grow_output(10).unwrap();
        assert_eq!(state.ot.len(), 288);
    }

    #[test]
    fn set_error_fills_the_diagnostic_buffer() {
        let mut state = State::new();
        let err = state.set_error(TranscodeError::Truncated);
        assert_eq!(err, TranscodeError::Truncated);
        assert_eq!(state.res(), b"Truncated data");
    }
}
