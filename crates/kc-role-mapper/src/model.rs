//! Representations of the Keycloak entities the mapper reads and writes.
//!
//! Field names follow the Admin REST API's camelCase JSON so the same types
//! serve the HTTP adapter and the in-memory store.

use serde::{Deserialize, Serialize};

/// A realm, as returned by the realm lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Realm {
    /// Internal realm ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Realm name.
    pub realm: String,
}

impl Realm {
    /// Creates a realm representation.
    #[must_use]
    pub fn new(id: impl Into<String>, realm: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            realm: realm.into(),
        }
    }
}

/// A group in the realm's group tree.
///
/// `realm_roles` holds role *names*, which is what the group detail endpoint
/// returns. The group listing may leave it empty, so the engine always
/// re-reads a group before classifying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    /// Provider-assigned group ID.
    pub id: String,
    /// Group name, also the name of the role the group should carry.
    pub name: String,
    /// Full path from the root (e.g. `/qa/qa-leads`).
    #[serde(default)]
    pub path: String,
    /// Names of the realm roles mapped to this group.
    #[serde(default)]
    pub realm_roles: Vec<String>,
    /// Child groups.
    #[serde(default)]
    pub sub_groups: Vec<Group>,
    /// Number of children the server knows about, reported by newer servers
    /// that no longer inline `subGroups` in listings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_group_count: Option<u64>,
}

impl Group {
    /// Creates a top-level group with no roles and no children.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            path: format!("/{name}"),
            name,
            realm_roles: Vec::new(),
            sub_groups: Vec::new(),
            sub_group_count: None,
        }
    }

    /// Adds a mapped realm role name.
    #[must_use]
    pub fn with_realm_role(mut self, role_name: impl Into<String>) -> Self {
        self.realm_roles.push(role_name.into());
        self
    }

    /// Adds a child group, re-rooting its path under this group.
    #[must_use]
    pub fn with_sub_group(mut self, mut child: Group) -> Self {
        child.reparent(&self.path);
        self.sub_groups.push(child);
        self
    }

    /// Checks whether a realm role with exactly this name is mapped.
    #[must_use]
    pub fn has_realm_role(&self, role_name: &str) -> bool {
        self.realm_roles.iter().any(|r| r == role_name)
    }

    /// Checks whether the server reported children that were not inlined.
    #[must_use]
    pub fn has_unloaded_children(&self) -> bool {
        self.sub_groups.is_empty() && self.sub_group_count.is_some_and(|n| n > 0)
    }

    fn reparent(&mut self, parent_path: &str) {
        self.path = format!("{parent_path}/{}", self.name);
        let path = self.path.clone();
        for child in &mut self.sub_groups {
            child.reparent(&path);
        }
    }
}

/// A realm role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    /// Role ID, absent until the role exists on the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Role name (unique within the realm).
    pub name: String,
    /// Role description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Role {
    /// Creates a role representation that has not been persisted yet.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: None,
        }
    }

    /// Sets the role ID.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}
