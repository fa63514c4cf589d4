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

//! The closed enumerations that parameterize a `SolverCore` pass: how
//! tensors are ordered, how a feasible offset is chosen among candidates,
//! and which placement algorithm variant is used. Dispatch over these is a
//! tagged match, never subtype polymorphism.

use std::cmp::Ordering;

use crate::common::TensorDesc;

/// Deterministic total orders over tensors, all ties broken by ascending id
///.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum SortKey {
    /// S0: size desc, then num_constraints asc.
    GreaterSizeSmallerConstraints,
    /// S1: size desc, then num_constraints desc.
    GreaterSizeGreaterConstraints,
    /// S2: size desc only.
    GreaterSize,
    /// S3: num_constraints asc, then size desc.
    SmallerConstraintsGreaterSize,
    /// S4: num_constraints desc, then size asc.
    GreaterConstraintsSmallerSize,
    /// S5: num_constraints asc only.
    SmallerConstraints,
}

impl SortKey {
    pub const ALL: [SortKey; 6] = [
        SortKey::GreaterSizeSmallerConstraints,
        SortKey::GreaterSizeGreaterConstraints,
        SortKey::GreaterSize,
        SortKey::SmallerConstraintsGreaterSize,
        SortKey::GreaterConstraintsSmallerSize,
        SortKey::SmallerConstraints,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SortKey::GreaterSizeSmallerConstraints => "GreaterSizeSmallerConstraints",
            SortKey::GreaterSizeGreaterConstraints => "GreaterSizeGreaterConstraints",
            SortKey::GreaterSize => "GreaterSize",
            SortKey::SmallerConstraintsGreaterSize => "SmallerConstraintsGreaterSize",
            SortKey::GreaterConstraintsSmallerSize => "GreaterConstraintsSmallerSize",
            SortKey::SmallerConstraints => "SmallerConstraints",
        }
    }

    /// Orders two placement units, each identified by its total `size` and
    /// the representative tensor used for the `num_constraints` tie key.
    /// Ties (after the strategy's own keys) fall back to ascending id.
    pub fn compare(self, a: (usize, &TensorDesc), b: (usize, &TensorDesc)) -> Ordering {
        let (size_a, rep_a) = a;
        let (size_b, rep_b) = b;
        let by_id = || rep_a.id.index().cmp(&rep_b.id.index());

        let primary = match self {
            SortKey::GreaterSizeSmallerConstraints | SortKey::GreaterSizeGreaterConstraints | SortKey::GreaterSize => {
                size_b.cmp(&size_a)
            }
            SortKey::SmallerConstraintsGreaterSize
            | SortKey::GreaterConstraintsSmallerSize
            | SortKey::SmallerConstraints => rep_a.num_constraints.cmp(&rep_b.num_constraints),
        };
        let primary = match self {
            SortKey::GreaterConstraintsSmallerSize => primary.reverse(),
            _ => primary,
        };

        let secondary = match self {
            SortKey::GreaterSizeSmallerConstraints => rep_a.num_constraints.cmp(&rep_b.num_constraints),
            SortKey::GreaterSizeGreaterConstraints => rep_b.num_constraints.cmp(&rep_a.num_constraints),
            SortKey::SmallerConstraintsGreaterSize => size_b.cmp(&size_a),
            SortKey::GreaterConstraintsSmallerSize => size_a.cmp(&size_b),
            SortKey::GreaterSize | SortKey::SmallerConstraints => Ordering::Equal,
        };

        primary.then(secondary).then_with(by_id)
    }
}

/// How a feasible offset is picked from the candidate set.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum FitRule {
    /// F0: minimum resulting upper bound, tie-break smaller offset.
    BestFit,
    /// F1: maximum offset (maximizes fragmentation headroom).
    WorstFit,
}

impl FitRule {
    pub const ALL: [FitRule; 2] = [FitRule::BestFit, FitRule::WorstFit];

    pub fn name(self) -> &'static str {
        match self {
            FitRule::BestFit => "BestFit",
            FitRule::WorstFit => "WorstFit",
        }
    }
}

/// The packing algorithm variant.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum AlgoVariant {
    /// A0: all tensors packed into a single growing pool.
    SingleObject,
    /// A1: multiple disjoint conflict-free "stacks".
    ManyObjects,
}

impl AlgoVariant {
    pub const ALL: [AlgoVariant; 2] = [AlgoVariant::SingleObject, AlgoVariant::ManyObjects];

    pub fn name(self) -> &'static str {
        match self {
            AlgoVariant::SingleObject => "SingleObject",
            AlgoVariant::ManyObjects => "ManyObjects",
        }
    }
}

/// One `(sort, fit, algo)` triple plus its enumeration index, in the exact
/// submission order required of the portfolio: algorithm outermost, sort in
/// the middle, fit innermost.
#[derive(Copy, Clone, Debug)]
pub struct Strategy {
    pub index: usize,
    pub sort: SortKey,
    pub fit: FitRule,
    pub algo: AlgoVariant,
}

/// Enumerates the full `K = |Sort| . |Fit| . |Algo|` strategy portfolio in
/// submission order.
pub fn all_strategies() -> Vec<Strategy> {
    let mut out = Vec::with_capacity(SortKey::ALL.len() * FitRule::ALL.len() * AlgoVariant::ALL.len());
    let mut index = 0;
    for algo in AlgoVariant::ALL {
        for sort in SortKey::ALL {
            for fit in FitRule::ALL {
                out.push(Strategy { index, sort, fit, algo });
                index += 1;
            }
        }
    }
    out
}

// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_strategy {
    use super::*;
    use crate::common::{LifelongKind, TensorId};

    fn desc(id: usize, num_constraints: usize) -> TensorDesc {
        let mut d = TensorDesc::new(TensorId(id), 0, LifelongKind::None);
        d.num_constraints = num_constraints;
        d
    }

    #[test]
    fn all_strategies_has_24_combinations_in_submission_order() {
        let all = all_strategies();
        assert_eq!(24, all.len());
        assert_eq!(AlgoVariant::SingleObject, all[0].algo);
        assert_eq!(AlgoVariant::ManyObjects, all[12].algo);
        for (i, s) in all.iter().enumerate() {
            assert_eq!(i, s.index);
        }
    }

    #[test]
    fn greater_size_breaks_ties_by_ascending_id() {
        let a = desc(5, 0);
        let b = desc(1, 0);
        assert_eq!(Ordering::Greater, SortKey::GreaterSize.compare((10, &a), (10, &b)));
    }

    #[test]
    fn greater_size_smaller_constraints_orders_by_size_then_constraints() {
        let a = desc(0, 3);
        let b = desc(1, 1);
        // equal size => smaller constraints (b) wins
        assert_eq!(
            Ordering::Greater,
            SortKey::GreaterSizeSmallerConstraints.compare((10, &a), (10, &b))
        );
    }

    #[test]
    fn smaller_constraints_orders_by_constraints_only() {
        let a = desc(0, 5);
        let b = desc(1, 2);
        assert_eq!(Ordering::Greater, SortKey::SmallerConstraints.compare((999, &a), (1, &b)));
    }
}
