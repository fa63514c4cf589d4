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

//! `ConflictModel` owns the reuse matrix: one `BitSet` row per tensor, bit `j`
//! of row `i` set iff tensors `i` and `j` may share memory.

use crate::abstraction::ConflictChecker;
use crate::common::TensorId;
use crate::implementation::bitset::BitSet;

/// The symmetric `can_share` matrix shared read-only by every `SolverCore`
/// pass. Construction (deriving bits from lifetime intervals) is the
/// pre-stage's job, not this type's: `ConflictModel` only stores and queries
/// bits it is given.
#[derive(Clone, Debug)]
pub struct ConflictModel {
    rows: Vec<BitSet>,
}

impl ConflictModel {
    /// An all-conflicting (no sharing) matrix over `n` tensors: every bit
    /// starts at 0, so callers must explicitly mark pairs that may share.
    pub fn new(n: usize) -> Self {
        ConflictModel {
            rows: (0..n).map(|_| BitSet::new(n)).collect(),
        }
    }

    /// Builds a model directly from pre-computed rows (mainly for tests and
    /// for callers, such as the CSV pre-stage, that already built the bitset
    /// themselves).
    pub fn from_rows(rows: Vec<BitSet>) -> Self {
        let n = rows.len();
        for row in &rows {
            assert_eq!(row.len(), n, "ConflictModel rows must all have length n");
        }
        ConflictModel { rows }
    }

    /// Marks `i` and `j` as able to share bytes. Idempotent and symmetric.
    pub fn allow_share(&mut self, i: TensorId, j: TensorId) {
        if i == j {
            return;
        }
        self.rows[i.index()].set(j.index());
        self.rows[j.index()].set(i.index());
    }

    /// Marks `i` and `j` as conflicting (may not share bytes).
    pub fn forbid_share(&mut self, i: TensorId, j: TensorId) {
        if i == j {
            return;
        }
        self.rows[i.index()].clear(j.index());
        self.rows[j.index()].clear(i.index());
    }

    /// Number of tensors this tensor conflicts with
    /// (`n - ones(row) - 1`, excluding the unused diagonal).
    pub fn num_constraints(&self, i: TensorId) -> usize {
        let n = self.rows.len();
        let ones = self.rows[i.index()].count_ones();
        n.saturating_sub(ones).saturating_sub(1)
    }
}

impl ConflictChecker for ConflictModel {
    fn can_share(&self, i: TensorId, j: TensorId) -> bool {
        self.rows[i.index()].test(j.index())
    }

    fn len(&self) -> usize {
        self.rows.len()
    }
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################
