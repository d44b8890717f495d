//! In-memory identity store.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{MapperError, MapperResult};
use crate::model::{Group, Realm, Role};

use super::IdentityStore;

/// A call made against an [`InMemoryStore`], in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    /// `get_realm(name)`.
    GetRealm(String),
    /// `list_groups()`.
    ListGroups,
    /// `get_group(id)`.
    GetGroup(String),
    /// `find_role_by_name(name)`.
    FindRoleByName(String),
    /// `create_role(name)`.
    CreateRole(String),
    /// `add_realm_roles_to_group(group_id, role names)`.
    AddRealmRoles(String, Vec<String>),
    /// `remove_realm_roles_from_group(group_id, role names)`.
    RemoveRealmRoles(String, Vec<String>),
}

impl StoreCall {
    /// Checks whether the call changes provider state.
    #[must_use]
    pub const fn is_write(&self) -> bool {
        matches!(
            self,
            Self::CreateRole(_) | Self::AddRealmRoles(..) | Self::RemoveRealmRoles(..)
        )
    }
}

#[derive(Debug, Default)]
struct State {
    groups: Vec<Group>,
    roles: Vec<Role>,
    calls: Vec<StoreCall>,
    next_role_id: usize,
}

/// Identity store backed by an in-memory group tree and role catalogue.
///
/// Records every call so tests can assert on ordering and on the absence of
/// writes. A role name can be marked as failing to simulate a provider
/// rejecting its creation.
#[derive(Debug)]
pub struct InMemoryStore {
    realm: Realm,
    target: String,
    state: Mutex<State>,
    failing_role: Option<String>,
}

impl InMemoryStore {
    /// Creates an empty store for the given realm.
    #[must_use]
    pub fn new(realm: impl Into<String>) -> Self {
        let realm = realm.into();
        Self {
            realm: Realm::new(format!("{realm}-id"), realm.clone()),
            target: realm,
            state: Mutex::new(State::default()),
            failing_role: None,
        }
    }

    /// Points the store at a different realm name than the one it holds.
    #[must_use]
    pub fn with_target_realm(mut self, name: impl Into<String>) -> Self {
        self.target = name.into();
        self
    }

    /// Drops the held realm's internal identifier.
    #[must_use]
    pub fn without_realm_id(mut self) -> Self {
        self.realm.id = None;
        self
    }

    /// Adds a root group (with its children).
    #[must_use]
    pub fn with_group(self, group: Group) -> Self {
        self.state.lock().groups.push(group);
        self
    }

    /// Adds an existing realm role.
    #[must_use]
    pub fn with_role(self, name: impl Into<String>) -> Self {
        {
            let mut state = self.state.lock();
            let id = next_role_id(&mut state);
            state.roles.push(Role::named(name).with_id(id));
        }
        self
    }

    /// Makes `create_role` fail for the given name.
    #[must_use]
    pub fn failing_role_creation(mut self, name: impl Into<String>) -> Self {
        self.failing_role = Some(name.into());
        self
    }

    /// Returns the calls made so far.
    #[must_use]
    pub fn calls(&self) -> Vec<StoreCall> {
        self.state.lock().calls.clone()
    }

    /// Forgets the recorded calls.
    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Returns the names of all realm roles.
    #[must_use]
    pub fn role_names(&self) -> Vec<String> {
        self.state.lock().roles.iter().map(|r| r.name.clone()).collect()
    }

    fn record(&self, call: StoreCall) {
        tracing::trace!(?call, "in-memory store call");
        self.state.lock().calls.push(call);
    }
}

fn next_role_id(state: &mut State) -> String {
    state.next_role_id += 1;
    format!("role-{}", state.next_role_id)
}

fn find_group<'a>(groups: &'a [Group], id: &str) -> Option<&'a Group> {
    groups.iter().find_map(|g| {
        if g.id == id {
            Some(g)
        } else {
            find_group(&g.sub_groups, id)
        }
    })
}

fn find_group_mut<'a>(groups: &'a mut [Group], id: &str) -> Option<&'a mut Group> {
    for group in groups {
        if group.id == id {
            return Some(group);
        }
        if let Some(found) = find_group_mut(&mut group.sub_groups, id) {
            return Some(found);
        }
    }
    None
}

fn role_names(roles: &[Role]) -> Vec<String> {
    roles.iter().map(|r| r.name.clone()).collect()
}

#[async_trait]
impl IdentityStore for InMemoryStore {
    fn realm(&self) -> &str {
        &self.target
    }

    async fn get_realm(&self, name: &str) -> MapperResult<Realm> {
        self.record(StoreCall::GetRealm(name.to_string()));
        if name == self.realm.realm {
            Ok(self.realm.clone())
        } else {
            Err(MapperError::not_found("Realm", name))
        }
    }

    async fn list_groups(&self) -> MapperResult<Vec<Group>> {
        self.record(StoreCall::ListGroups);
        Ok(self.state.lock().groups.clone())
    }

    async fn get_group(&self, id: &str) -> MapperResult<Group> {
        self.record(StoreCall::GetGroup(id.to_string()));
        let state = self.state.lock();
        find_group(&state.groups, id)
            .cloned()
            .ok_or_else(|| MapperError::not_found("Group", id))
    }

    async fn find_role_by_name(&self, name: &str) -> MapperResult<Option<Role>> {
        self.record(StoreCall::FindRoleByName(name.to_string()));
        let state = self.state.lock();
        Ok(state.roles.iter().find(|r| r.name == name).cloned())
    }

    async fn create_role(&self, name: &str) -> MapperResult<Role> {
        self.record(StoreCall::CreateRole(name.to_string()));
        if self.failing_role.as_deref() == Some(name) {
            return Err(MapperError::Api {
                status: 403,
                message: format!("not allowed to create role '{name}'"),
            });
        }

        let mut state = self.state.lock();
        if state.roles.iter().any(|r| r.name == name) {
            return Err(MapperError::already_exists("Role", name));
        }
        let id = next_role_id(&mut state);
        let role = Role::named(name).with_id(id);
        state.roles.push(role.clone());
        Ok(role)
    }

    async fn add_realm_roles_to_group(&self, group_id: &str, roles: &[Role]) -> MapperResult<()> {
        self.record(StoreCall::AddRealmRoles(group_id.to_string(), role_names(roles)));
        let mut state = self.state.lock();
        if let Some(missing) = roles
            .iter()
            .find(|role| !state.roles.iter().any(|r| r.name == role.name))
        {
            return Err(MapperError::not_found("Role", missing.name.clone()));
        }

        let group = find_group_mut(&mut state.groups, group_id)
            .ok_or_else(|| MapperError::not_found("Group", group_id))?;
        for role in roles {
            if !group.has_realm_role(&role.name) {
                group.realm_roles.push(role.name.clone());
            }
        }
        Ok(())
    }

    async fn remove_realm_roles_from_group(
        &self,
        group_id: &str,
        roles: &[Role],
    ) -> MapperResult<()> {
        self.record(StoreCall::RemoveRealmRoles(group_id.to_string(), role_names(roles)));
        let mut state = self.state.lock();
        let group = find_group_mut(&mut state.groups, group_id)
            .ok_or_else(|| MapperError::not_found("Group", group_id))?;
        group
            .realm_roles
            .retain(|name| !roles.iter().any(|r| &r.name == name));
        Ok(())
    }
}
