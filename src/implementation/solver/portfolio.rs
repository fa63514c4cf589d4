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

//! Portfolio / SolverPre (C5): fans the strategy portfolio out across a
//! worker pool and applies Selector to pick the winner.
//!
//! The worker pool is a `parking_lot::Mutex`-guarded work queue shared by
//! every thread, with `std::thread::scope`'s join acting as the barrier,
//! built fresh for each `solve()` call rather than kept alive process-wide —
//! simpler, and sufficient since the only requirement is that the K tasks
//! run in parallel with a barrier at the end.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use log::{info, warn};
use parking_lot::Mutex;

use crate::abstraction::ConflictChecker;
use crate::common::{ChainSpec, PassResult, SolveReport, SomasError, Status, TensorDesc, TensorId};
use crate::implementation::chain::install_chains;
use crate::implementation::solver::core::run_pass;
use crate::implementation::solver::selector::select;
use crate::implementation::strategy::{all_strategies, AlgoVariant, FitRule, SortKey, Strategy};

/// Runs every `(sort, fit, algo)` strategy using `num_cpus::get()` workers
/// and writes the winning clone's offsets back into `descriptors`. This is
/// the crate's single public entry point.
pub fn solve(
    descriptors: &mut HashMap<TensorId, TensorDesc>,
    conflicts: &(dyn ConflictChecker + Sync),
    chains: &[ChainSpec],
    verify: bool,
) -> Result<(Status, SolveReport), SomasError> {
    solve_with_threads(descriptors, conflicts, chains, verify, num_cpus::get().max(1))
}

/// Same as [`solve`], but with an explicit worker count — used by the CLI's
/// `--threads` flag and by tests that want deterministic single-threaded
/// runs.
pub fn solve_with_threads(
    descriptors: &mut HashMap<TensorId, TensorDesc>,
    conflicts: &(dyn ConflictChecker + Sync),
    chains: &[ChainSpec],
    verify: bool,
    nb_threads: usize,
) -> Result<(Status, SolveReport), SomasError> {
    let started = Instant::now();

    if descriptors.is_empty() {
        return Ok((Status::Success, empty_report(started.elapsed())));
    }

    populate_num_constraints(descriptors, conflicts);

    // Step 1-2: K independent clones, each with its own contiguity links.
    let strategies = all_strategies();
    let mut queue: VecDeque<(Strategy, HashMap<TensorId, TensorDesc>)> = VecDeque::with_capacity(strategies.len());
    for strategy in strategies {
        let mut clone = descriptors.clone();
        install_chains(&mut clone, chains)?;
        queue.push_back((strategy, clone));
    }
    let queue = Mutex::new(queue);
    let outcomes: Mutex<Vec<(PassResult, HashMap<TensorId, TensorDesc>)>> = Mutex::new(Vec::new());

    // Step 3-4: submit to a shared worker pool, barrier at scope exit.
    std::thread::scope(|scope| {
        for _ in 0..nb_threads.max(1) {
            scope.spawn(|| worker_loop(&queue, conflicts, verify, &outcomes));
        }
    });

    let outcomes = outcomes.into_inner();
    let passes: Vec<PassResult> = outcomes.iter().map(|(result, _)| *result).collect();

    // Step 5: Selector picks the winner.
    let selection = select(passes).ok_or(SomasError::AllPassesFailed)?;
    let winner = outcomes
        .into_iter()
        .find(|(result, _)| result.sol_index == selection.best.sol_index)
        .map(|(_, clone)| clone)
        .expect("selector returned an index present in the outcomes batch");

    // Step 6: copy offsets back into the caller's map.
    for (id, desc) in descriptors.iter_mut() {
        desc.offset = winner[id].offset;
    }

    // Step 7: publish max_offset and a summary record.
    let report = SolveReport {
        best_sol_index: selection.best.sol_index,
        max_offset: selection.best.upper_bound,
        lifelong_memory: selection.best.lifelong_memory,
        best_algo: selection.best.algo,
        best_sort: selection.best.sort,
        best_fit: selection.best.fit,
        best_timing: selection.best.elapsed,
        total_elapsed: started.elapsed(),
        worst_bytes: selection.worst_bytes,
        total_passes: selection.total_passes,
    };
    log_summary(&report);

    Ok((Status::Success, report))
}

fn empty_report(elapsed: Duration) -> SolveReport {
    SolveReport {
        best_sol_index: 0,
        max_offset: 0,
        lifelong_memory: 0,
        best_algo: AlgoVariant::SingleObject,
        best_sort: SortKey::GreaterSize,
        best_fit: FitRule::BestFit,
        best_timing: Duration::ZERO,
        total_elapsed: elapsed,
        worst_bytes: 0,
        total_passes: 0,
    }
}

/// Fills in `num_constraints` for every descriptor from the shared conflict
/// model, since the sort strategies need it and `ConflictChecker` alone
/// (not the richer `ConflictModel`) is all the portfolio is handed.
fn populate_num_constraints(descriptors: &mut HashMap<TensorId, TensorDesc>, conflicts: &dyn ConflictChecker) {
    let n = conflicts.len();
    for desc in descriptors.values_mut() {
        let conflicting = (0..n)
            .filter(|&j| j != desc.id.index() && !conflicts.can_share(desc.id, TensorId(j)))
            .count();
        desc.num_constraints = conflicting;
    }
}

fn worker_loop(
    queue: &Mutex<VecDeque<(Strategy, HashMap<TensorId, TensorDesc>)>>,
    conflicts: &(dyn ConflictChecker + Sync),
    verify: bool,
    outcomes: &Mutex<Vec<(PassResult, HashMap<TensorId, TensorDesc>)>>,
) {
    loop {
        let next = queue.lock().pop_front();
        let Some((strategy, mut clone)) = next else {
            return;
        };

        // A pass that panics (e.g. on a malformed but publicly reachable
        // chain input) must not bring down the whole portfolio: catch it
        // here, at the boundary, and disqualify just this strategy.
        let caught = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| run_pass(&mut clone, conflicts, strategy, verify)));

        let outcome = match caught {
            Ok(Ok(result)) => result,
            Ok(Err(err)) => {
                match &err {
                    SomasError::SolverVerificationFailed(..) => warn!("{err}"),
                    _ => warn!("solver pass {} raised an unexpected fault: {err}", strategy.index),
                }
                failed_result(strategy)
            }
            Err(panic) => {
                let fault = SomasError::SolverInternalException(strategy.index, panic_message(&panic));
                warn!("{fault}");
                failed_result(strategy)
            }
        };
        outcomes.lock().push((outcome, clone));
    }
}

fn failed_result(strategy: Strategy) -> PassResult {
    PassResult {
        sol_index: strategy.index,
        sort: strategy.sort,
        fit: strategy.fit,
        algo: strategy.algo,
        upper_bound: usize::MAX,
        lifelong_memory: 0,
        elapsed: Duration::ZERO,
        failed: true,
    }
}

/// Extracts a human-readable message from a caught panic payload, the way
/// `std::panic::Location`-less panics usually carry it: a `&str` or `String`.
fn panic_message(payload: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn log_summary(report: &SolveReport) {
    let gb = report.max_offset as f64 / (1024.0 * 1024.0 * 1024.0);
    info!(
        "best_index={} best_bytes={} ({gb:.3} GB) lifelong_bytes={} elapsed_us={} algo={} sort={} fit={} spread={:.2}%",
        report.best_sol_index,
        report.max_offset,
        report.lifelong_memory,
        report.best_timing.as_micros(),
        report.best_algo.name(),
        report.best_sort.name(),
        report.best_fit.name(),
        report.spread() * 100.0,
    );
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_portfolio {
    use super::*;
    use crate::common::LifelongKind;
    use crate::implementation::conflict::ConflictModel;

    fn desc_map(specs: &[(usize, usize, LifelongKind)]) -> HashMap<TensorId, TensorDesc> {
        specs
            .iter()
            .map(|&(id, size, lifelong)| {
                let tid = TensorId(id);
                (tid, TensorDesc::new(tid, size, lifelong))
            })
            .collect()
    }

    #[test]
    fn empty_input_succeeds_with_zero_max_offset() {
        let mut descs = HashMap::new();
        let conflicts = ConflictModel::new(0);
        let (status, report) = solve_with_threads(&mut descs, &conflicts, &[], true, 2).unwrap();
        assert_eq!(Status::Success, status);
        assert_eq!(0, report.max_offset);
    }

    #[test]
    fn single_tensor_lands_at_offset_zero() {
        let mut descs = desc_map(&[(0, 100, LifelongKind::None)]);
        let conflicts = ConflictModel::new(1);
        let (status, report) = solve_with_threads(&mut descs, &conflicts, &[], true, 2).unwrap();
        assert_eq!(Status::Success, status);
        assert_eq!(100, report.max_offset);
        assert_eq!(Some(0), descs[&TensorId(0)].offset);
    }

    #[test]
    fn disjoint_tensors_share_offset_zero() {
        let mut descs = desc_map(&[(0, 100, LifelongKind::None), (1, 100, LifelongKind::None)]);
        let mut conflicts = ConflictModel::new(2);
        conflicts.allow_share(TensorId(0), TensorId(1));
        let (_, report) = solve_with_threads(&mut descs, &conflicts, &[], true, 2).unwrap();
        assert_eq!(100, report.max_offset);
    }

    #[test]
    fn invalid_chain_reference_fails_the_whole_solve() {
        let mut descs = desc_map(&[(0, 100, LifelongKind::None)]);
        let conflicts = ConflictModel::new(1);
        let chains = vec![vec![TensorId(0), TensorId(99)]];
        let err = solve_with_threads(&mut descs, &conflicts, &chains, true, 2).unwrap_err();
        assert!(matches!(err, SomasError::InputInvalid(TensorId(99))));
    }

    #[test]
    fn cyclic_chain_fails_cleanly_instead_of_panicking_across_the_boundary() {
        let mut descs = desc_map(&[(0, 64, LifelongKind::None), (1, 64, LifelongKind::None), (2, 64, LifelongKind::None)]);
        let conflicts = ConflictModel::new(3);
        // Two overlapping chains that close a 0 -> 1 -> 2 -> 0 cycle: every
        // pass verifying this clone fails, but `solve_with_threads` must
        // still return a clean `Err`, never unwind.
        let chains = vec![vec![TensorId(0), TensorId(1), TensorId(2)], vec![TensorId(2), TensorId(0)]];
        let err = solve_with_threads(&mut descs, &conflicts, &chains, true, 2).unwrap_err();
        assert!(matches!(err, SomasError::AllPassesFailed));
    }

    #[test]
    fn selection_is_deterministic_across_repeated_runs() {
        let mut first = desc_map(&[(0, 256, LifelongKind::None), (1, 128, LifelongKind::None), (2, 128, LifelongKind::None)]);
        let mut conflicts = ConflictModel::new(3);
        conflicts.allow_share(TensorId(1), TensorId(2));
        let mut second = first.clone();

        let (_, report_a) = solve_with_threads(&mut first, &conflicts, &[], true, 4).unwrap();
        let (_, report_b) = solve_with_threads(&mut second, &conflicts, &[], true, 4).unwrap();

        assert_eq!(report_a.max_offset, report_b.max_offset);
        for id in [TensorId(0), TensorId(1), TensorId(2)] {
            assert_eq!(first[&id].offset, second[&id].offset);
        }
    }
}
