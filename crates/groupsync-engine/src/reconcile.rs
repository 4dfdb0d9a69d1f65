//! Set reconciliation: desired vs. current membership.

use std::collections::HashSet;
use tracing::debug;

/// Unordered set of directory object ids. Membership identity is id
/// equality only; attributes play no part.
pub type MembershipSet = HashSet<String>;

/// How computed differences are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Apply both additions and removals; an empty desired set removes
    /// every current member.
    FullReconcile,
    /// Apply additions only; never remove existing destination members.
    AdditiveOnly,
}

/// The adds and removes that take `current` to `desired`.
///
/// Invariants: `to_add` is disjoint from current, `to_remove` is a subset
/// of current, and the two are disjoint from each other. Both are sorted
/// for deterministic apply order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationPlan {
    pub to_add: Vec<String>,
    pub to_remove: Vec<String>,
}

impl ReconciliationPlan {
    /// True when the plan changes nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Computes the symmetric difference between desired and current
/// membership.
#[must_use]
pub fn diff(desired: &MembershipSet, current: &MembershipSet) -> ReconciliationPlan {
    let mut to_add: Vec<String> = desired.difference(current).cloned().collect();
    let mut to_remove: Vec<String> = current.difference(desired).cloned().collect();
    to_add.sort();
    to_remove.sort();

    ReconciliationPlan { to_add, to_remove }
}

/// Builds the reconciliation plan under the given policy.
#[must_use]
pub fn plan(desired: &MembershipSet, current: &MembershipSet, policy: Policy) -> ReconciliationPlan {
    let plan = match policy {
        Policy::AdditiveOnly => {
            let mut to_add: Vec<String> = desired.difference(current).cloned().collect();
            to_add.sort();
            ReconciliationPlan {
                to_add,
                to_remove: Vec::new(),
            }
        }
        // An empty current set needs no diff: everything desired is an add.
        Policy::FullReconcile if current.is_empty() => {
            let mut to_add: Vec<String> = desired.iter().cloned().collect();
            to_add.sort();
            ReconciliationPlan {
                to_add,
                to_remove: Vec::new(),
            }
        }
        Policy::FullReconcile => diff(desired, current),
    };

    debug!(
        "Plan: {} to add, {} to remove ({:?})",
        plan.to_add.len(),
        plan.to_remove.len(),
        policy
    );
    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[&str]) -> MembershipSet {
        ids.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_diff_correctness() {
        let desired = set(&["a", "b", "c"]);
        let current = set(&["b", "d"]);

        let plan = diff(&desired, &current);
        assert_eq!(plan.to_add, vec!["a", "c"]);
        assert_eq!(plan.to_remove, vec!["d"]);

        // Applying the plan to current yields exactly desired.
        let mut applied = current.clone();
        for id in &plan.to_add {
            applied.insert(id.clone());
        }
        for id in &plan.to_remove {
            applied.remove(id);
        }
        assert_eq!(applied, desired);
    }

    #[test]
    fn test_diff_invariants() {
        let desired = set(&["a", "b"]);
        let current = set(&["b", "c"]);

        let plan = diff(&desired, &current);
        for id in &plan.to_add {
            assert!(!current.contains(id));
        }
        for id in &plan.to_remove {
            assert!(current.contains(id));
        }
        assert!(plan.to_add.iter().all(|id| !plan.to_remove.contains(id)));
    }

    #[test]
    fn test_idempotence() {
        let members = set(&["a", "b", "c"]);
        let plan = diff(&members, &members);
        assert!(plan.is_noop());
    }

    #[test]
    fn test_additive_only_never_removes() {
        let desired = set(&["a"]);
        let current = set(&["b", "c"]);

        let plan = plan(&desired, &current, Policy::AdditiveOnly);
        assert_eq!(plan.to_add, vec!["a"]);
        assert!(plan.to_remove.is_empty());
    }

    #[test]
    fn test_full_reconcile_empty_desired_removes_all() {
        let desired = MembershipSet::new();
        let current = set(&["a", "b"]);

        let plan = plan(&desired, &current, Policy::FullReconcile);
        assert!(plan.to_add.is_empty());
        assert_eq!(plan.to_remove, vec!["a", "b"]);
    }

    #[test]
    fn test_full_reconcile_empty_current_pure_add() {
        let desired = set(&["a", "b"]);
        let current = MembershipSet::new();

        let plan = plan(&desired, &current, Policy::FullReconcile);
        assert_eq!(plan.to_add, vec!["a", "b"]);
        assert!(plan.to_remove.is_empty());
    }
}
