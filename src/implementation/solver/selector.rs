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

//! Selector (C6): picks the winning pass out of the portfolio's K results
//!.

use crate::common::PassResult;
use crate::implementation::strategy::AlgoVariant;

/// Below this gap, a many-objects result is kept over a marginally smaller
/// single-object one: the more regular layout is worth the extra bytes when
/// the gain is small.
pub const MANY_OBJECTS_BIAS_THRESHOLD: usize = 100 * 1024 * 1024;

/// The outcome of running Selector over a batch of passes.
pub struct Selection {
    pub best: PassResult,
    pub worst_bytes: usize,
    pub total_passes: usize,
}

/// Applies the Selector policy to `results`, iterating in submission order
/// (ascending `sol_index`) so ties resolve deterministically. Failed passes
/// are disqualified from `best` but still count towards `total_passes`.
/// Returns `None` iff every pass failed.
pub fn select(mut results: Vec<PassResult>) -> Option<Selection> {
    results.sort_by_key(|r| r.sol_index);
    let total_passes = results.len();

    let mut best: Option<PassResult> = None;
    let mut worst_bytes = 0usize;

    for candidate in results.into_iter().filter(|r| !r.failed) {
        worst_bytes = worst_bytes.max(candidate.upper_bound);
        best = Some(accept(best, candidate));
    }

    best.map(|best| Selection { best, worst_bytes, total_passes })
}

/// Decides whether `candidate` replaces `current`, implementing the
/// many-objects bias tie-break.
fn accept(current: Option<PassResult>, candidate: PassResult) -> PassResult {
    let Some(current) = current else {
        return candidate;
    };
    if candidate.upper_bound >= current.upper_bound {
        return current;
    }
    let prefers_structure = current.algo == AlgoVariant::ManyObjects
        && candidate.algo == AlgoVariant::SingleObject
        && current.upper_bound - candidate.upper_bound <= MANY_OBJECTS_BIAS_THRESHOLD;
    if prefers_structure {
        current
    } else {
        candidate
    }
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_selector {
    use super::*;
    use crate::implementation::strategy::{FitRule, SortKey};
    use std::time::Duration;

    fn pass(sol_index: usize, algo: AlgoVariant, upper_bound: usize, failed: bool) -> PassResult {
        PassResult {
            sol_index,
            sort: SortKey::GreaterSize,
            fit: FitRule::BestFit,
            algo,
            upper_bound,
            lifelong_memory: 0,
            elapsed: Duration::ZERO,
            failed,
        }
    }

    #[test]
    fn empty_batch_has_no_selection() {
        assert!(select(Vec::new()).is_none());
    }

    #[test]
    fn all_failed_passes_select_nothing() {
        let results = vec![pass(0, AlgoVariant::SingleObject, usize::MAX, true)];
        assert!(select(results).is_none());
    }

    #[test]
    fn smallest_upper_bound_wins() {
        let results = vec![
            pass(0, AlgoVariant::SingleObject, 300, false),
            pass(1, AlgoVariant::SingleObject, 100, false),
            pass(2, AlgoVariant::SingleObject, 200, false),
        ];
        let selection = select(results).unwrap();
        assert_eq!(1, selection.best.sol_index);
        assert_eq!(300, selection.worst_bytes);
        assert_eq!(3, selection.total_passes);
    }

    #[test]
    fn ties_retain_the_earlier_winner() {
        let results = vec![pass(0, AlgoVariant::SingleObject, 100, false), pass(1, AlgoVariant::SingleObject, 100, false)];
        let selection = select(results).unwrap();
        assert_eq!(0, selection.best.sol_index);
    }

    #[test]
    fn failed_passes_never_win_but_are_counted() {
        let results = vec![
            pass(0, AlgoVariant::SingleObject, usize::MAX, true),
            pass(1, AlgoVariant::SingleObject, 128, false),
        ];
        let selection = select(results).unwrap();
        assert_eq!(1, selection.best.sol_index);
        assert_eq!(2, selection.total_passes);
    }

    #[test]
    fn many_objects_bias_keeps_structure_below_threshold() {
        let results = vec![
            pass(0, AlgoVariant::ManyObjects, 1_000_000, false),
            pass(1, AlgoVariant::SingleObject, 999_999, false),
        ];
        let selection = select(results).unwrap();
        assert_eq!(0, selection.best.sol_index);
        assert_eq!(AlgoVariant::ManyObjects, selection.best.algo);
    }

    #[test]
    fn many_objects_bias_yields_above_threshold() {
        let results = vec![
            pass(0, AlgoVariant::ManyObjects, 1_000_000_000, false),
            pass(1, AlgoVariant::SingleObject, 1, false),
        ];
        let selection = select(results).unwrap();
        assert_eq!(1, selection.best.sol_index);
        assert_eq!(AlgoVariant::SingleObject, selection.best.algo);
    }
}
