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

//! # somas-solver
//!
//! A parallel portfolio of heuristic packers that assigns a non-negative
//! byte offset to every tensor in a computation graph, such that:
//!
//! - tensors with overlapping lifetimes never share bytes,
//! - contiguity chains are laid out back-to-back in the order given,
//! - peak memory (the largest `offset + size` over all tensors) is as small
//!   as the portfolio of heuristics can make it.
//!
//! This is the Static Offset Memory Allocation for Shared tensors (SOMAS)
//! problem as it appears ahead of executing a dataflow graph: once tensor
//! lifetimes are known, a single static layout is computed once and reused
//! for every execution, rather than allocating and freeing at run time.
//!
//! ## Quick example
//!
//! ```
//! use std::collections::HashMap;
//! use somas_solver::{solve, ConflictModel, LifelongKind, TensorDesc, TensorId};
//!
//! // Two tensors whose lifetimes never overlap may share the same bytes.
//! let mut descriptors = HashMap::new();
//! descriptors.insert(TensorId(0), TensorDesc::new(TensorId(0), 100, LifelongKind::None));
//! descriptors.insert(TensorId(1), TensorDesc::new(TensorId(1), 100, LifelongKind::None));
//!
//! let mut conflicts = ConflictModel::new(2);
//! conflicts.allow_share(TensorId(0), TensorId(1));
//!
//! let (status, report) = solve(&mut descriptors, &conflicts, &[], true).unwrap();
//! assert_eq!(somas_solver::Status::Success, status);
//! assert_eq!(100, report.max_offset);
//! assert_eq!(Some(0), descriptors[&TensorId(0)].offset);
//! assert_eq!(Some(0), descriptors[&TensorId(1)].offset);
//! ```
//!
//! ## Architecture
//!
//! | Component | Module | Responsibility |
//! |---|---|---|
//! | BitSet | [`implementation::bitset`] | Dense `N`-bit vectors backing the conflict matrix |
//! | TensorDesc | [`common`] | The solver's per-tensor unit of work |
//! | ConflictModel | [`implementation::conflict`] | The symmetric `can_share` matrix |
//! | SolverCore | [`implementation::solver::core`] | One `(sort, fit, algo)` placement pass |
//! | Portfolio | [`implementation::solver`] | Runs every strategy in parallel, selects the winner |
//! | Selector | [`implementation::solver::select`] | The best-of-K selection policy |
//!
//! The [`io`] module and the `somas` binary are thin pre/post stages (CSV
//! ingestion, conflict-matrix construction from lifetime intervals, CSV
//! export) built on top of this library; they are not part of the core
//! solver and a caller embedding this crate is free to ignore them.

pub mod abstraction;
pub mod common;
pub mod implementation;
pub mod io;
pub mod logging;

pub use abstraction::ConflictChecker;
pub use common::{
    ChainSpec, LifelongKind, PassResult, SolveReport, SomasError, Status, TensorDesc, TensorId,
};
pub use implementation::solver::{solve, solve_with_threads};
pub use implementation::ConflictModel;

// ############################################################################
// #### TESTS #################################################################
// ############################################################################
