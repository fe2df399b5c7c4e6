//! Migration Registry - the ordered universe of migration units
//!
//! The registry is an ordinary value: the composition root builds one from an
//! explicit list of units and hands it to the runner. Tests build their own.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::definitions::Migration;
use super::id::MigrationId;
use crate::error::RegistrationError;

/// A migration unit together with its validated ID
#[derive(Clone)]
pub struct RegisteredMigration {
    id: MigrationId,
    unit: Arc<dyn Migration>,
}

impl RegisteredMigration {
    pub fn id(&self) -> &MigrationId {
        &self.id
    }

    pub fn unit(&self) -> &dyn Migration {
        self.unit.as_ref()
    }
}

impl fmt::Debug for RegisteredMigration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredMigration")
            .field("id", &self.id)
            .field("description", &self.unit.description())
            .finish()
    }
}

/// Registered migrations keyed (and therefore ordered) by ID
#[derive(Default, Clone)]
pub struct MigrationRegistry {
    units: BTreeMap<MigrationId, RegisteredMigration>,
}

impl MigrationRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Start an explicit list of units
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Register a unit.
    ///
    /// Fails on a malformed or already-registered ID; the registry is left
    /// unchanged in both cases.
    pub fn register<M: Migration + 'static>(&mut self, unit: M) -> Result<(), RegistrationError> {
        self.register_arc(Arc::new(unit))
    }

    /// Register a shared unit
    pub fn register_arc(&mut self, unit: Arc<dyn Migration>) -> Result<(), RegistrationError> {
        let id = MigrationId::parse(unit.id())?;
        if self.units.contains_key(&id) {
            return Err(RegistrationError::DuplicateId { id: id.to_string() });
        }

        tracing::trace!("registered migration {}", id);
        self.units.insert(id.clone(), RegisteredMigration { id, unit });
        Ok(())
    }

    /// All units ascending by ID, regardless of registration order
    pub fn ordered_units(&self) -> Vec<RegisteredMigration> {
        self.units.values().cloned().collect()
    }

    /// Look up a unit by ID
    pub fn get(&self, id: &MigrationId) -> Option<&RegisteredMigration> {
        self.units.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        MigrationId::parse(id).map_or(false, |id| self.units.contains_key(&id))
    }

    /// Greatest registered ID
    pub fn latest_id(&self) -> Option<&MigrationId> {
        self.units.keys().next_back()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl fmt::Debug for MigrationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.units.keys()).finish()
    }
}

/// Collects units and registers them in list order on `build`
#[derive(Default)]
pub struct RegistryBuilder {
    units: Vec<Arc<dyn Migration>>,
}

impl RegistryBuilder {
    pub fn add<M: Migration + 'static>(mut self, unit: M) -> Self {
        self.units.push(Arc::new(unit));
        self
    }

    pub fn extend<I>(mut self, units: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Migration>>,
    {
        self.units.extend(units);
        self
    }

    /// Register every collected unit, stopping at the first error
    pub fn build(self) -> Result<MigrationRegistry, RegistrationError> {
        let mut registry = MigrationRegistry::new();
        for unit in self.units {
            registry.register_arc(unit)?;
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::SqlMigration;

    fn unit(id: &str, marker: &str) -> SqlMigration {
        SqlMigration::new(id, "", "").with_description(marker)
    }

    fn ids(registry: &MigrationRegistry) -> Vec<String> {
        registry
            .ordered_units()
            .iter()
            .map(|m| m.id().to_string())
            .collect()
    }

    #[test]
    fn test_register_rejects_invalid_ids() {
        let mut registry = MigrationRegistry::new();
        for bad in ["", "20250322", "2025_03_22_1234", "20250322_123456_add_posts", "99990101_000000"] {
            assert_eq!(
                registry.register(unit(bad, "bad")),
                Err(RegistrationError::InvalidId { id: bad.to_string() })
            );
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_duplicate_keeps_first_registration() {
        let mut registry = MigrationRegistry::new();
        registry.register(unit("20250101_000000", "first")).unwrap();

        let err = registry.register(unit("20250101_000000", "second")).unwrap_err();
        assert_eq!(err, RegistrationError::DuplicateId { id: "20250101_000000".to_string() });

        assert_eq!(registry.len(), 1);
        let kept = registry.get(&MigrationId::parse("20250101_000000").unwrap()).unwrap();
        assert_eq!(kept.unit().description(), "first");
    }

    #[test]
    fn test_order_is_independent_of_registration_order() {
        let a = "20250101_000000";
        let b = "20250201_000000";
        let c = "20250201_000001";

        let mut forward = MigrationRegistry::new();
        for id in [a, b, c] {
            forward.register(unit(id, id)).unwrap();
        }

        let mut shuffled = MigrationRegistry::new();
        for id in [c, a, b] {
            shuffled.register(unit(id, id)).unwrap();
        }

        assert_eq!(ids(&forward), vec![a, b, c]);
        assert_eq!(ids(&forward), ids(&shuffled));
        assert_eq!(shuffled.latest_id().unwrap(), &c);
    }

    #[test]
    fn test_empty_registry() {
        let registry = MigrationRegistry::new();
        assert!(registry.ordered_units().is_empty());
        assert!(registry.latest_id().is_none());
    }

    #[test]
    fn test_builder_stops_at_first_error() {
        let err = MigrationRegistry::builder()
            .add(unit("20250101_000000", "a"))
            .add(unit("20250101_000000", "dup"))
            .add(unit("bogus", "bad"))
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistrationError::DuplicateId { .. }));

        let registry = MigrationRegistry::builder()
            .add(unit("20250201_000000", "b"))
            .add(unit("20250101_000000", "a"))
            .build()
            .unwrap();
        assert_eq!(ids(&registry), vec!["20250101_000000", "20250201_000000"]);
        assert!(registry.contains("20250101_000000"));
        assert!(!registry.contains("20250301_000000"));
    }
}
