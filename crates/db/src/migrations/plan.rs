//! Migration planning
//!
//! Turns (current version, target, registered units) into the ordered list of
//! steps a run executes. Pure: no database access, so every direction rule is
//! unit-testable.

use super::definitions::{MigrationDirection, MigrationTarget};
use super::id::MigrationId;
use super::registry::RegisteredMigration;

/// Ordered steps of one run
#[derive(Debug, Clone)]
pub struct MigrationPlan {
    pub direction: MigrationDirection,
    /// Version the ledger should report once every step is committed
    pub to: Option<MigrationId>,
    pub steps: Vec<RegisteredMigration>,
}

impl MigrationPlan {
    /// Plan a run from `current` to `target` over `universe` (ascending by ID).
    ///
    /// Forward runs execute every unit with `current < id <= target` in
    /// ascending order; backward runs execute every unit with
    /// `target < id <= current` in descending order. The target need not be a
    /// registered ID: it only marks a boundary.
    pub fn compute(
        current: Option<&MigrationId>,
        target: &MigrationTarget,
        universe: &[RegisteredMigration],
    ) -> Self {
        let latest = universe.last().map(|m| m.id().clone());

        let (direction, goal) = match (current, target) {
            (_, MigrationTarget::Latest) => (MigrationDirection::Up, latest),
            (None, MigrationTarget::Version(id)) => (MigrationDirection::Up, Some(id.clone())),
            (Some(current), MigrationTarget::Version(id)) if current > id => {
                (MigrationDirection::Down, Some(id.clone()))
            }
            (Some(_), MigrationTarget::Version(id)) => (MigrationDirection::Up, Some(id.clone())),
        };

        let steps: Vec<RegisteredMigration> = match direction {
            MigrationDirection::Up => universe
                .iter()
                .filter(|m| current.map_or(true, |current| m.id() > current))
                .filter(|m| goal.as_ref().map_or(false, |goal| m.id() <= goal))
                .cloned()
                .collect(),
            MigrationDirection::Down => universe
                .iter()
                .rev()
                .filter(|m| current.map_or(false, |current| m.id() <= current))
                .filter(|m| goal.as_ref().map_or(true, |goal| m.id() > goal))
                .cloned()
                .collect(),
        };

        let to = match direction {
            // Rolling back leaves the greatest ledger ID at or below the target
            MigrationDirection::Down => universe
                .iter()
                .rev()
                .map(|m| m.id())
                .find(|id| goal.as_ref().map_or(false, |goal| *id <= goal))
                .cloned(),
            MigrationDirection::Up => steps
                .last()
                .map(|m| m.id().clone())
                .or_else(|| current.cloned()),
        };

        Self {
            direction,
            to,
            steps,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn ids(&self) -> Vec<MigrationId> {
        self.steps.iter().map(|m| m.id().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::{MigrationRegistry, SqlMigration};

    const A: &str = "20250101_000000";
    const B: &str = "20250201_000000";
    const C: &str = "20250301_000000";

    fn universe() -> Vec<RegisteredMigration> {
        let mut registry = MigrationRegistry::new();
        for id in [C, A, B] {
            registry.register(SqlMigration::new(id, "", "")).unwrap();
        }
        registry.ordered_units()
    }

    fn id(raw: &str) -> MigrationId {
        MigrationId::parse(raw).unwrap()
    }

    fn version(raw: &str) -> MigrationTarget {
        MigrationTarget::Version(id(raw))
    }

    fn ids(plan: &MigrationPlan) -> Vec<String> {
        plan.ids().iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn test_fresh_database_to_latest_applies_everything() {
        let plan = MigrationPlan::compute(None, &MigrationTarget::Latest, &universe());
        assert_eq!(plan.direction, MigrationDirection::Up);
        assert_eq!(ids(&plan), vec![A, B, C]);
        assert_eq!(plan.to, Some(id(C)));
    }

    #[test]
    fn test_fresh_database_to_concrete_target() {
        let plan = MigrationPlan::compute(None, &version(B), &universe());
        assert_eq!(plan.direction, MigrationDirection::Up);
        assert_eq!(ids(&plan), vec![A, B]);
    }

    #[test]
    fn test_latest_only_applies_pending() {
        let current = id(A);
        let plan = MigrationPlan::compute(Some(&current), &MigrationTarget::Latest, &universe());
        assert_eq!(ids(&plan), vec![B, C]);
    }

    #[test]
    fn test_backward_runs_descending_and_keeps_target() {
        let current = id(C);
        let plan = MigrationPlan::compute(Some(&current), &version(A), &universe());
        assert_eq!(plan.direction, MigrationDirection::Down);
        assert_eq!(ids(&plan), vec![C, B]);
        assert_eq!(plan.to, Some(id(A)));
    }

    #[test]
    fn test_unregistered_target_is_a_boundary() {
        let current = id(C);
        let plan = MigrationPlan::compute(Some(&current), &version("20250215_000000"), &universe());
        assert_eq!(plan.direction, MigrationDirection::Down);
        assert_eq!(ids(&plan), vec![C]);
        assert_eq!(plan.to, Some(id(B)));

        let plan = MigrationPlan::compute(Some(&current), &version("20240101_000000"), &universe());
        assert_eq!(ids(&plan), vec![C, B, A]);
        assert_eq!(plan.to, None);

        let current = id(A);
        let plan = MigrationPlan::compute(Some(&current), &version("20250215_000000"), &universe());
        assert_eq!(plan.direction, MigrationDirection::Up);
        assert_eq!(ids(&plan), vec![B]);
    }

    #[test]
    fn test_target_equal_to_current_is_noop() {
        let current = id(B);
        let plan = MigrationPlan::compute(Some(&current), &version(B), &universe());
        assert_eq!(plan.direction, MigrationDirection::Up);
        assert!(plan.is_empty());
        assert_eq!(plan.to, Some(id(B)));
    }

    #[test]
    fn test_empty_universe() {
        let plan = MigrationPlan::compute(None, &MigrationTarget::Latest, &[]);
        assert!(plan.is_empty());
        assert_eq!(plan.to, None);
    }
}
