//! Planned changes produced by a reconciliation run.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Mapping state of a single group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    /// The group already carries the role named after it.
    Mapped,
    /// No role named after the group exists yet.
    RoleMissing,
    /// The role exists but is not mapped to the group.
    MappingMissing,
}

impl Classification {
    /// Checks whether the group needs a mapping.
    #[must_use]
    pub const fn needs_mapping(self) -> bool {
        !matches!(self, Self::Mapped)
    }
}

/// Roles to create and group/role mappings to add.
///
/// A group needing both a new role and a mapping appears in both
/// collections. Mappings are keyed by group ID, so groups sharing a name
/// each keep their own entry while the role is listed once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    missing_roles: BTreeSet<String>,
    missing_mappings: BTreeMap<String, String>,
}

impl ChangeSet {
    /// Creates an empty change set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a role that must be created.
    pub(crate) fn add_missing_role(&mut self, role_name: impl Into<String>) {
        self.missing_roles.insert(role_name.into());
    }

    /// Records a group that must be mapped to the named role.
    pub(crate) fn add_missing_mapping(
        &mut self,
        group_id: impl Into<String>,
        role_name: impl Into<String>,
    ) {
        self.missing_mappings.insert(group_id.into(), role_name.into());
    }

    /// Role names to create.
    pub fn missing_roles(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.missing_roles.iter().map(String::as_str)
    }

    /// `(group id, role name)` pairs to map.
    pub fn missing_mappings(&self) -> impl ExactSizeIterator<Item = (&str, &str)> + '_ {
        self.missing_mappings
            .iter()
            .map(|(id, role)| (id.as_str(), role.as_str()))
    }

    /// Checks whether a role is scheduled for creation.
    #[must_use]
    pub fn is_role_missing(&self, role_name: &str) -> bool {
        self.missing_roles.contains(role_name)
    }

    /// Role name scheduled for a group, if any.
    #[must_use]
    pub fn mapping_for(&self, group_id: &str) -> Option<&str> {
        self.missing_mappings.get(group_id).map(String::as_str)
    }

    /// Number of roles to create.
    #[must_use]
    pub fn role_count(&self) -> usize {
        self.missing_roles.len()
    }

    /// Number of mappings to add.
    #[must_use]
    pub fn mapping_count(&self) -> usize {
        self.missing_mappings.len()
    }

    /// Checks whether nothing needs to change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.missing_roles.is_empty() && self.missing_mappings.is_empty()
    }
}
