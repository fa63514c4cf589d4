// Copyright 2026 SOMAS contributors
//
// Permission is hereby granted, free of charge, to any person obtaining a copy of
// this software and associated documentation files (the "Software"), to deal in
// the Software without restriction, including without limitation the rights to
// use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of
// the Software, and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS
// FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR
// COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER
// IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! This module defines the `ConflictChecker` trait: the query surface every
//! `SolverCore` pass uses to decide whether two tensors may share bytes.

use crate::common::TensorId;

/// Something that can answer "may tensors `i` and `j` share the same byte
/// range?" `ConflictModel` is the only implementation shipped by this crate,
/// but the trait keeps `SolverCore` decoupled from how the underlying bitset
/// was built or stored.
pub trait ConflictChecker {
    /// `true` iff tensors `i` and `j` may occupy overlapping byte ranges
    /// (i.e. they do **not** conflict). Must be symmetric: `can_share(i, j)
    /// == can_share(j, i)`. Querying `i == j` is unspecified and never done
    /// by the solver.
    fn can_share(&self, i: TensorId, j: TensorId) -> bool;

    /// Number of tensors this checker was built for.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
