//! Table-level constraints.

use serde::Deserialize;

/// A named table constraint, e.g. `("orders_customer_number", "UNIQUE (customer_id, number)")`
///
/// Constraints are re-applied on every pass: the old definition is dropped by name and the
/// current one added, so changing `value` replaces the constraint in place.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConstraintSpec {
    pub name: String,
    /// Constraint definition as written after `ADD CONSTRAINT <name>`.
    pub value: String,
}

impl ConstraintSpec {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Statement removing any previous definition; a no-op when the constraint is absent.
    pub fn drop_rule(&self, table: &str) -> String {
        format!("ALTER TABLE {} DROP CONSTRAINT IF EXISTS {}", table, self.name)
    }

    pub fn add_rule(&self, table: &str) -> String {
        format!("ALTER TABLE {} ADD CONSTRAINT {} {}", table, self.name, self.value)
    }
}
