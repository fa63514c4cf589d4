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

//! `SolverCore`: one heuristic placement pass, configured with a single
//! `(sort, fit, algo)` strategy triple.

use std::collections::HashMap;
use std::time::Instant;

use crate::abstraction::ConflictChecker;
use crate::common::{LifelongKind, PassResult, SomasError, TensorDesc, TensorId};
use crate::implementation::chain::{chain_head, chain_members};
use crate::implementation::strategy::{AlgoVariant, FitRule, Strategy};

/// A block of already-placed bytes, owned either by a real tensor (queryable
/// through `ConflictChecker`) or by the lifelong-reservation region (which
/// conflicts with everything, by construction).
#[derive(Copy, Clone)]
enum Owner {
    Lifelong,
    Tensor(TensorId),
}

struct PlacedBlock {
    offset: usize,
    size: usize,
    owner: Owner,
}

/// One chain (or singleton) to be placed as a unit, with each member's local
/// offset relative to the unit's own start.
struct Unit {
    head: TensorId,
    members: Vec<(TensorId, usize, usize)>, // (id, size, local_offset)
    total_size: usize,
}

/// Runs one strategy pass against `descriptors` (mutated in place) and the
/// shared `conflicts` model. Returns the pass's upper bound and lifelong
/// memory on success, or a `SolverVerificationFailed` error when `verify` is
/// set and the constructed layout is illegal — which should
/// never actually happen given the placement algorithms are
/// constructive-by-feasibility-check.
pub fn run_pass(
    descriptors: &mut HashMap<TensorId, TensorDesc>,
    conflicts: &dyn ConflictChecker,
    strategy: Strategy,
    verify: bool,
) -> Result<PassResult, SomasError> {
    let started = Instant::now();

    let lifelong_memory = reserve_lifelong_all(descriptors);
    let mut placed: Vec<PlacedBlock> = Vec::new();
    if lifelong_memory > 0 {
        placed.push(PlacedBlock {
            offset: 0,
            size: lifelong_memory,
            owner: Owner::Lifelong,
        });
    }
    let mut current_upper = lifelong_memory;
    // `ManyObjects` lanes: each entry is a base offset shared by every unit
    // placed there; units in the same lane are pairwise conflict-free, so the
    // lane's offset never needs to move once opened.
    let mut stack_bases: Vec<usize> = Vec::new();

    let mut units = collect_units(descriptors);
    units.sort_by(|a, b| {
        let rep_a = &descriptors[&a.head];
        let rep_b = &descriptors[&b.head];
        strategy.sort.compare((a.total_size, rep_a), (b.total_size, rep_b))
    });

    for unit in &units {
        let offset = place_unit(unit, conflicts, &placed, &mut stack_bases, current_upper, strategy);
        current_upper = current_upper.max(offset + unit.total_size);

        for &(id, size, local_offset) in &unit.members {
            descriptors.get_mut(&id).unwrap().offset = Some(offset + local_offset);
            if size > 0 {
                placed.push(PlacedBlock {
                    offset: offset + local_offset,
                    size,
                    owner: Owner::Tensor(id),
                });
            }
        }
    }

    if verify {
        verify_solution(descriptors, conflicts, lifelong_memory, strategy.index)?;
    }

    Ok(PassResult {
        sol_index: strategy.index,
        sort: strategy.sort,
        fit: strategy.fit,
        algo: strategy.algo,
        upper_bound: current_upper,
        lifelong_memory,
        elapsed: started.elapsed(),
        failed: false,
    })
}

/// Phase 1: places every `LifelongKind::All` tensor at increasing offsets
/// starting from 0, in ascending id order for determinism. Returns the
/// cumulative `lifelong_memory`.
fn reserve_lifelong_all(descriptors: &mut HashMap<TensorId, TensorDesc>) -> usize {
    let mut ids: Vec<TensorId> = descriptors
        .values()
        .filter(|d| d.lifelong.is_lifelong_all())
        .map(|d| d.id)
        .collect();
    ids.sort_by_key(|id| id.index());

    let mut cursor = 0usize;
    for id in ids {
        let desc = descriptors.get_mut(&id).unwrap();
        desc.offset = Some(cursor);
        cursor += desc.size;
    }
    cursor
}

/// Phase 2: collects every not-yet-placed chain head (or singleton) as a
/// placement unit.
fn collect_units(descriptors: &HashMap<TensorId, TensorDesc>) -> Vec<Unit> {
    let mut units = Vec::new();
    let mut heads: Vec<TensorId> = descriptors
        .values()
        .filter(|d| d.offset.is_none() && d.is_chain_head())
        .map(|d| d.id)
        .collect();
    heads.sort_by_key(|id| id.index());

    for head in heads {
        let member_ids = chain_members(descriptors, head);
        let mut members = Vec::with_capacity(member_ids.len());
        let mut local_offset = 0usize;
        for id in member_ids {
            let size = descriptors[&id].size;
            members.push((id, size, local_offset));
            local_offset += size;
        }
        units.push(Unit {
            head,
            total_size: local_offset,
            members,
        });
    }
    units
}

fn ranges_overlap(a_start: usize, a_end: usize, b_start: usize, b_end: usize) -> bool {
    a_start < b_end && b_start < a_end
}

/// Phase 3/3.6: is placing `unit` at `offset` legal against every
/// already-placed block?
fn unit_feasible_at(unit: &Unit, offset: usize, placed: &[PlacedBlock], conflicts: &dyn ConflictChecker) -> bool {
    for &(id, size, local_offset) in &unit.members {
        if size == 0 {
            continue;
        }
        let m_start = offset + local_offset;
        let m_end = m_start + size;
        for block in placed {
            if !ranges_overlap(m_start, m_end, block.offset, block.offset + block.size) {
                continue;
            }
            match block.owner {
                Owner::Lifelong => return false,
                Owner::Tensor(other) => {
                    if !conflicts.can_share(id, other) {
                        return false;
                    }
                }
            }
        }
    }
    true
}

/// Builds the candidate offset set for `AlgoVariant::SingleObject`:
/// `{0} ∪ {off + sz for each placed block}`.
fn single_object_candidates(placed: &[PlacedBlock]) -> Vec<usize> {
    let mut candidates = vec![0usize];
    candidates.extend(placed.iter().map(|b| b.offset + b.size));
    candidates.sort_unstable();
    candidates.dedup();
    candidates
}

/// Builds the restricted candidate set for `AlgoVariant::ManyObjects`: each
/// open stack's base (tensors sharing a stack all start there, since they
/// are pairwise conflict-free), plus `current_upper` to allow opening a new
/// stack.
fn many_objects_candidates(stack_bases: &[usize], current_upper: usize) -> Vec<usize> {
    let mut candidates: Vec<usize> = stack_bases.to_vec();
    candidates.push(current_upper);
    candidates.sort_unstable();
    candidates.dedup();
    candidates
}

fn choose_by_fit(feasible: &[usize], size: usize, current_upper: usize, fit: FitRule) -> usize {
    match fit {
        FitRule::BestFit => *feasible
            .iter()
            .min_by_key(|&&o| (current_upper.max(o + size), o))
            .expect("feasible set must be non-empty"),
        FitRule::WorstFit => *feasible.iter().max().expect("feasible set must be non-empty"),
    }
}

fn place_unit(
    unit: &Unit,
    conflicts: &dyn ConflictChecker,
    placed: &[PlacedBlock],
    stack_bases: &mut Vec<usize>,
    current_upper: usize,
    strategy: Strategy,
) -> usize {
    let candidates = match strategy.algo {
        AlgoVariant::SingleObject => single_object_candidates(placed),
        AlgoVariant::ManyObjects => many_objects_candidates(stack_bases, current_upper),
    };

    let feasible: Vec<usize> = candidates
        .into_iter()
        .filter(|&o| unit_feasible_at(unit, o, placed, conflicts))
        .collect();

    let offset = if feasible.is_empty() {
        // Should not happen: current_upper is always a feasible fallback.
        current_upper
    } else {
        choose_by_fit(&feasible, unit.total_size, current_upper, strategy.fit)
    };

    if let AlgoVariant::ManyObjects = strategy.algo {
        if !stack_bases.contains(&offset) {
            stack_bases.push(offset);
        }
    }

    offset
}

/// Phase 4: verification. Confirms no conflicting overlap, every contiguity
/// link is respected, and every lifelong-all tensor sits inside its
/// reservation.
fn verify_solution(
    descriptors: &HashMap<TensorId, TensorDesc>,
    conflicts: &dyn ConflictChecker,
    lifelong_memory: usize,
    sol_index: usize,
) -> Result<(), SomasError> {
    let tensors: Vec<&TensorDesc> = descriptors.values().collect();

    // An unplaced tensor means `collect_units` never reached it — the only
    // way that happens on valid input is a cyclic contiguity chain, where
    // every member has `left.is_some()` and none is ever picked as a head.
    // Caught here as a clean failure rather than panicking on `.unwrap()`.
    for desc in &tensors {
        if desc.offset.is_none() {
            return Err(SomasError::SolverVerificationFailed(
                sol_index,
                format!("tensor {:?} was never placed (its contiguity chain may be cyclic)", desc.id),
            ));
        }
    }

    for (i, a) in tensors.iter().enumerate() {
        let a_off = a.offset.unwrap();
        if a.size == 0 {
            continue;
        }
        if a.lifelong.is_lifelong_all() && a_off >= lifelong_memory {
            return Err(SomasError::SolverVerificationFailed(
                sol_index,
                format!("lifelong tensor {:?} placed at {a_off} >= lifelong_memory {lifelong_memory}", a.id),
            ));
        }
        for b in tensors.iter().skip(i + 1) {
            let b_off = b.offset.unwrap();
            if b.size == 0 {
                continue;
            }
            if !ranges_overlap(a_off, a_off + a.size, b_off, b_off + b.size) {
                continue;
            }
            if !conflicts.can_share(a.id, b.id) {
                return Err(SomasError::SolverVerificationFailed(
                    sol_index,
                    format!("tensors {:?} and {:?} overlap but may not share bytes", a.id, b.id),
                ));
            }
        }
    }

    for desc in &tensors {
        if let Some(right) = desc.right {
            let right_desc = &descriptors[&right];
            let expected = desc.offset.unwrap() + desc.size;
            if right_desc.offset != Some(expected) {
                return Err(SomasError::SolverVerificationFailed(
                    sol_index,
                    format!(
                        "chain break: {:?} expected at {expected} but placed at {:?}",
                        right, right_desc.offset
                    ),
                ));
            }
            let head = chain_head(descriptors, desc.id);
            if descriptors[&head].left.is_some() {
                return Err(SomasError::SolverVerificationFailed(
                    sol_index,
                    format!("contiguity chain containing {:?} has no head: left/right links form a cycle", desc.id),
                ));
            }
        }
    }

    Ok(())
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_core {
    use super::*;
    use crate::implementation::conflict::ConflictModel;
    use crate::implementation::strategy::{all_strategies, SortKey};

    fn descriptors(specs: &[(usize, usize, LifelongKind)]) -> HashMap<TensorId, TensorDesc> {
        specs
            .iter()
            .map(|&(id, size, lifelong)| {
                let tid = TensorId(id);
                (tid, TensorDesc::new(tid, size, lifelong))
            })
            .collect()
    }

    fn strategy_for(sort: SortKey, fit: FitRule, algo: AlgoVariant) -> Strategy {
        all_strategies()
            .into_iter()
            .find(|s| s.sort == sort && s.fit == fit && s.algo == algo)
            .unwrap()
    }

    #[test]
    fn single_tensor_lands_at_zero() {
        let mut descs = descriptors(&[(0, 100, LifelongKind::None)]);
        let conflicts = ConflictModel::new(1);
        let strategy = strategy_for(SortKey::GreaterSize, FitRule::BestFit, AlgoVariant::SingleObject);
        let result = run_pass(&mut descs, &conflicts, strategy, true).unwrap();
        assert_eq!(100, result.upper_bound);
        assert_eq!(Some(0), descs[&TensorId(0)].offset);
    }

    #[test]
    fn disjoint_lifetimes_share_offset_zero() {
        let mut descs = descriptors(&[(0, 100, LifelongKind::None), (1, 100, LifelongKind::None)]);
        let mut conflicts = ConflictModel::new(2);
        conflicts.allow_share(TensorId(0), TensorId(1));
        let strategy = strategy_for(SortKey::GreaterSize, FitRule::BestFit, AlgoVariant::SingleObject);
        let result = run_pass(&mut descs, &conflicts, strategy, true).unwrap();
        assert_eq!(100, result.upper_bound);
        assert_eq!(Some(0), descs[&TensorId(0)].offset);
        assert_eq!(Some(0), descs[&TensorId(1)].offset);
    }

    #[test]
    fn overlapping_lifetimes_get_disjoint_ranges() {
        let mut descs = descriptors(&[(0, 100, LifelongKind::None), (1, 100, LifelongKind::None)]);
        let conflicts = ConflictModel::new(2); // no sharing allowed: they conflict
        let strategy = strategy_for(SortKey::GreaterSize, FitRule::BestFit, AlgoVariant::SingleObject);
        let result = run_pass(&mut descs, &conflicts, strategy, true).unwrap();
        assert_eq!(200, result.upper_bound);
        let a = descs[&TensorId(0)].offset.unwrap();
        let b = descs[&TensorId(1)].offset.unwrap();
        assert_ne!(a, b);
        assert_eq!(200, a.max(b) + 100);
    }

    #[test]
    fn zero_size_tensor_gets_an_offset_but_no_footprint() {
        let mut descs = descriptors(&[(0, 100, LifelongKind::None), (1, 0, LifelongKind::None)]);
        let conflicts = ConflictModel::new(2);
        let strategy = strategy_for(SortKey::GreaterSize, FitRule::BestFit, AlgoVariant::SingleObject);
        let result = run_pass(&mut descs, &conflicts, strategy, true).unwrap();
        assert_eq!(100, result.upper_bound);
        assert!(descs[&TensorId(1)].offset.is_some());
    }

    #[test]
    fn lifelong_all_tensor_is_reserved_first() {
        let mut descs = descriptors(&[(0, 512, LifelongKind::All), (1, 128, LifelongKind::None)]);
        let conflicts = ConflictModel::new(2); // conflicts with everything else
        let strategy = strategy_for(SortKey::GreaterSize, FitRule::BestFit, AlgoVariant::SingleObject);
        let result = run_pass(&mut descs, &conflicts, strategy, true).unwrap();
        assert_eq!(512, result.lifelong_memory);
        assert_eq!(640, result.upper_bound);
        assert_eq!(Some(0), descs[&TensorId(0)].offset);
        assert_eq!(Some(512), descs[&TensorId(1)].offset);
    }

    #[test]
    fn chain_is_placed_contiguously() {
        let mut descs = descriptors(&[
            (0, 128, LifelongKind::None),
            (1, 64, LifelongKind::None),
            (2, 64, LifelongKind::None),
        ]);
        descs.get_mut(&TensorId(1)).unwrap().right = Some(TensorId(2));
        descs.get_mut(&TensorId(2)).unwrap().left = Some(TensorId(1));
        let conflicts = ConflictModel::new(3); // tensor 0 conflicts with the chain
        let strategy = strategy_for(SortKey::GreaterSize, FitRule::BestFit, AlgoVariant::SingleObject);
        let result = run_pass(&mut descs, &conflicts, strategy, true).unwrap();
        assert_eq!(256, result.upper_bound);
        let off1 = descs[&TensorId(1)].offset.unwrap();
        let off2 = descs[&TensorId(2)].offset.unwrap();
        assert_eq!(off2, off1 + 64);
    }

    #[test]
    fn cyclic_contiguity_chain_fails_verification_instead_of_panicking() {
        let mut descs = descriptors(&[
            (0, 64, LifelongKind::None),
            (1, 64, LifelongKind::None),
            (2, 64, LifelongKind::None),
        ]);
        // 0 -> 1 -> 2 -> 0: every tensor has a left neighbour, so none is a
        // chain head and `collect_units` never places any of them.
        descs.get_mut(&TensorId(0)).unwrap().right = Some(TensorId(1));
        descs.get_mut(&TensorId(1)).unwrap().left = Some(TensorId(0));
        descs.get_mut(&TensorId(1)).unwrap().right = Some(TensorId(2));
        descs.get_mut(&TensorId(2)).unwrap().left = Some(TensorId(1));
        descs.get_mut(&TensorId(2)).unwrap().right = Some(TensorId(0));
        descs.get_mut(&TensorId(0)).unwrap().left = Some(TensorId(2));

        let conflicts = ConflictModel::new(3);
        let strategy = strategy_for(SortKey::GreaterSize, FitRule::BestFit, AlgoVariant::SingleObject);
        let err = run_pass(&mut descs, &conflicts, strategy, true).unwrap_err();
        assert!(matches!(err, SomasError::SolverVerificationFailed(..)));
    }

    #[test]
    fn many_objects_algorithm_also_respects_conflicts() {
        let mut descs = descriptors(&[(0, 64, LifelongKind::None), (1, 32, LifelongKind::None), (2, 48, LifelongKind::None)]);
        let mut conflicts = ConflictModel::new(3);
        conflicts.allow_share(TensorId(1), TensorId(2));
        let strategy = strategy_for(SortKey::GreaterSize, FitRule::BestFit, AlgoVariant::ManyObjects);
        let result = run_pass(&mut descs, &conflicts, strategy, true).unwrap();
        // 0 conflicts with both 1 and 2, so it needs its own space; 1 and 2 may share.
        assert!(result.upper_bound <= 64 + 48);
    }
}
