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

//! Contiguity chain installation: wiring `left`/`right` links into a cloned
//! descriptor map before a `SolverCore` pass runs.

use std::collections::HashMap;

use log::warn;

use crate::common::{ChainSpec, SomasError, TensorDesc, TensorId};

/// Installs every chain's `left`/`right` links into `descriptors`.
///
/// A chain `[a, b, c]` results in `a.right = b`, `b.left = a`, `b.right = c`,
/// `c.left = b`. A reference to a missing tensor id fails the whole call
/// (`InputInvalid`). A tensor that already has a link before this call
/// overwrites it with a `log::warn!` rather than failing — last writer wins.
pub fn install_chains(
    descriptors: &mut HashMap<TensorId, TensorDesc>,
    chains: &[ChainSpec],
) -> Result<(), SomasError> {
    for chain in chains {
        for pair in chain.windows(2) {
            let (left, right) = (pair[0], pair[1]);
            check_tensors_exist(descriptors, left, right)?;
            warn_if_already_linked(descriptors, left, right);

            descriptors.get_mut(&left).unwrap().right = Some(right);
            descriptors.get_mut(&right).unwrap().left = Some(left);
        }
    }
    Ok(())
}

fn check_tensors_exist(
    descriptors: &HashMap<TensorId, TensorDesc>,
    left: TensorId,
    right: TensorId,
) -> Result<(), SomasError> {
    if !descriptors.contains_key(&left) {
        return Err(SomasError::InputInvalid(left));
    }
    if !descriptors.contains_key(&right) {
        return Err(SomasError::InputInvalid(right));
    }
    Ok(())
}

fn warn_if_already_linked(descriptors: &HashMap<TensorId, TensorDesc>, left: TensorId, right: TensorId) {
    if let Some(existing) = descriptors[&left].right {
        warn!("tensor {left:?} already has a right neighbour (id: {existing:?}), overwriting");
    }
    if let Some(existing) = descriptors[&right].left {
        warn!("tensor {right:?} already has a left neighbour (id: {existing:?}), overwriting");
    }
}

/// Walks from `id` back to the head of its chain (the tensor with no
/// `left` neighbour). Returns `id` itself when it is not chained.
pub fn chain_head(descriptors: &HashMap<TensorId, TensorDesc>, mut id: TensorId) -> TensorId {
    let mut guard = descriptors.len();
    while let Some(left) = descriptors[&id].left {
        id = left;
        guard -= 1;
        if guard == 0 {
            // a cycle would otherwise spin forever; chains are assumed
            // acyclic, so this only guards against caller bugs.
            break;
        }
    }
    id
}

/// Collects the full chain starting at its head, in order, following `right`
/// links.
pub fn chain_members(descriptors: &HashMap<TensorId, TensorDesc>, head: TensorId) -> Vec<TensorId> {
    let mut members = vec![head];
    let mut cur = head;
    let mut guard = descriptors.len();
    while let Some(right) = descriptors[&cur].right {
        members.push(right);
        cur = right;
        guard -= 1;
        if guard == 0 {
            break;
        }
    }
    members
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_chain {
    use super::*;
    use crate::common::LifelongKind;

    fn map(ids: &[usize]) -> HashMap<TensorId, TensorDesc> {
        ids.iter()
            .map(|&i| {
                let id = TensorId(i);
                (id, TensorDesc::new(id, 64, LifelongKind::None))
            })
            .collect()
    }

    #[test]
    fn install_chains_links_consecutive_pairs() {
        let mut descriptors = map(&[0, 1, 2]);
        let chains = vec![vec![TensorId(0), TensorId(1), TensorId(2)]];
        install_chains(&mut descriptors, &chains).unwrap();

        assert_eq!(Some(TensorId(1)), descriptors[&TensorId(0)].right);
        assert_eq!(Some(TensorId(0)), descriptors[&TensorId(1)].left);
        assert_eq!(Some(TensorId(2)), descriptors[&TensorId(1)].right);
        assert_eq!(Some(TensorId(1)), descriptors[&TensorId(2)].left);
    }

    #[test]
    fn install_chains_rejects_missing_tensor() {
        let mut descriptors = map(&[0, 1]);
        let chains = vec![vec![TensorId(0), TensorId(99)]];
        let err = install_chains(&mut descriptors, &chains).unwrap_err();
        assert!(matches!(err, SomasError::InputInvalid(TensorId(99))));
    }

    #[test]
    fn chain_head_and_members_resolve_correctly() {
        let mut descriptors = map(&[0, 1, 2]);
        let chains = vec![vec![TensorId(0), TensorId(1), TensorId(2)]];
        install_chains(&mut descriptors, &chains).unwrap();

        assert_eq!(TensorId(0), chain_head(&descriptors, TensorId(2)));
        assert_eq!(
            vec![TensorId(0), TensorId(1), TensorId(2)],
            chain_members(&descriptors, TensorId(0))
        );
    }

    #[test]
    fn unchained_tensor_is_its_own_head_and_sole_member() {
        let descriptors = map(&[7]);
        assert_eq!(TensorId(7), chain_head(&descriptors, TensorId(7)));
        assert_eq!(vec![TensorId(7)], chain_members(&descriptors, TensorId(7)));
    }
}
