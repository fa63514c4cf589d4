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

//! This module defines the most basic data types that are used throughout all
//! of the solver: tensor identities, lifetime/lifelong classification, the
//! solver-internal tensor descriptor, and the result types returned at the
//! crate's public boundary.

use std::time::Duration;

use crate::implementation::strategy::{AlgoVariant, FitRule, SortKey};

// ----------------------------------------------------------------------------
// --- TENSOR ID ----------------------------------------------------------
// ----------------------------------------------------------------------------
/// A dense numeric identity for a tensor. The id also indexes the conflict
/// matrix, so ids are expected to range over `0..n` for `n` tensors.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct TensorId(pub usize);
impl TensorId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}
impl From<usize> for TensorId {
    fn from(value: usize) -> Self {
        TensorId(value)
    }
}

// ----------------------------------------------------------------------------
// --- LIFELONG CLASSIFICATION --------------------------------------------
// ----------------------------------------------------------------------------
/// A tensor's lifelong classification, mirroring the four cases a SOMAS
/// tensor can fall into: an ordinary tensor whose lifetime is its own, one
/// that spans the entire graph, or one that is pinned to only one end of it.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
pub enum LifelongKind {
    /// Lifetime is whatever the tensor's own `[start, end)` interval says.
    #[default]
    None,
    /// Lifetime spans the whole graph; pre-reserved at offset 0.
    All,
    /// Lifetime starts at graph-start but ends with the tensor's own end.
    Start,
    /// Lifetime starts with the tensor's own start but runs to graph-end.
    End,
}
impl LifelongKind {
    pub fn is_lifelong_all(self) -> bool {
        matches!(self, LifelongKind::All)
    }
}

// ----------------------------------------------------------------------------
// --- TENSOR DESCRIPTOR ---------------------------------------------------
// ----------------------------------------------------------------------------
/// The solver's unit of work: everything a `SolverCore` pass needs to know
/// about one tensor, plus the slot where it writes the tensor's offset.
#[derive(Clone, Debug)]
pub struct TensorDesc {
    /// Unique index into the conflict matrix.
    pub id: TensorId,
    /// Aligned byte size. Zero-size tensors are skipped during placement but
    /// keep an id slot (and may still anchor a contiguity chain).
    pub size: usize,
    /// Lifelong classification.
    pub lifelong: LifelongKind,
    /// Contiguity predecessor: `Some(p)` iff `p.right == Some(self)`.
    pub left: Option<TensorId>,
    /// Contiguity successor: `Some(n)` iff `n.left == Some(self)`.
    pub right: Option<TensorId>,
    /// Assigned byte offset. `None` until a solver pass places the tensor.
    pub offset: Option<usize>,
    /// Count of other tensors that conflict with this one
    /// (`= n - ones(conflict_row)`), used as a sort key.
    pub num_constraints: usize,
}
impl TensorDesc {
    /// Builds a fresh, unplaced descriptor for tensor `id`.
    pub fn new(id: TensorId, size: usize, lifelong: LifelongKind) -> Self {
        TensorDesc {
            id,
            size,
            lifelong,
            left: None,
            right: None,
            offset: None,
            num_constraints: 0,
        }
    }

    #[inline]
    pub fn is_chain_head(&self) -> bool {
        self.left.is_none()
    }
}

// ----------------------------------------------------------------------------
// --- LIFETIME ---------------------------------------------------------------
// ----------------------------------------------------------------------------
/// A tensor's half-open `[start, end)` lifetime interval. The core solver
/// never looks at raw intervals, only at the conflict bitset derived from
/// them; this type exists for the `io` pre-stage that builds that bitset.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Lifetime {
    pub start: usize,
    pub end: usize,
}
impl Lifetime {
    pub fn overlaps(self, other: Lifetime) -> bool {
        self.start < other.end && other.start < self.end
    }
}

// ----------------------------------------------------------------------------
// --- CONTIGUITY CHAIN SPEC ------------------------------------------------
// ----------------------------------------------------------------------------
/// A single contiguity chain as supplied by the caller: an ordered sequence
/// of tensor ids that must be laid out back-to-back, in that order.
pub type ChainSpec = Vec<TensorId>;

// ----------------------------------------------------------------------------
// --- RESULTS --------------------------------------------------------------
// ----------------------------------------------------------------------------
/// The caller-facing two-state outcome of a solve.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Status {
    Success,
    Failed,
}

/// One strategy pass's result, as reported by a `SolverCore` run. Consumed by
/// the `Selector` and by the portfolio's summary log.
#[derive(Copy, Clone, Debug)]
pub struct PassResult {
    pub sol_index: usize,
    pub sort: SortKey,
    pub fit: FitRule,
    pub algo: AlgoVariant,
    /// Peak memory for this pass (`max(offset + size)`), or `usize::MAX`
    /// when the pass failed verification.
    pub upper_bound: usize,
    pub lifelong_memory: usize,
    pub elapsed: Duration,
    pub failed: bool,
}

/// The summary the portfolio hands back alongside `Status`: everything the
/// log stream needs plus the winning `max_offset`.
#[derive(Clone, Debug)]
pub struct SolveReport {
    pub best_sol_index: usize,
    pub max_offset: usize,
    pub lifelong_memory: usize,
    pub best_algo: AlgoVariant,
    pub best_sort: SortKey,
    pub best_fit: FitRule,
    pub best_timing: Duration,
    pub total_elapsed: Duration,
    pub worst_bytes: usize,
    pub total_passes: usize,
}
impl SolveReport {
    /// `(worst - best) / best`, the fractional spread between the worst and
    /// best passes in the portfolio.
    pub fn spread(&self) -> f64 {
        if self.max_offset == 0 {
            0.0
        } else {
            (self.worst_bytes as f64 - self.max_offset as f64) / self.max_offset as f64
        }
    }
}

// ----------------------------------------------------------------------------
// --- ERRORS -----------------------------------------------------------------
// ----------------------------------------------------------------------------
/// Errors that can be surfaced across the solve boundary. Task-local faults
/// inside a single strategy pass never reach this type directly: they are
/// contained by the portfolio and only escalate here when every pass fails,
/// or when the input itself is invalid.
#[derive(Debug, thiserror::Error)]
pub enum SomasError {
    #[error("contiguity chain references missing tensor id {0:?}")]
    InputInvalid(TensorId),

    #[error("solver pass {0} failed verification: {1}")]
    SolverVerificationFailed(usize, String),

    #[error("solver pass {0} raised an unexpected fault: {1}")]
    SolverInternalException(usize, String),

    #[error("no strategy pass produced a valid solution")]
    AllPassesFailed,

    #[error("could not write output csv at {path}: {source}")]
    OutputIoFailure {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not read input csv at {path}: {source}")]
    InputIoFailure {
        path: String,
        #[source]
        source: csv::Error,
    },
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################
