//! Identity store capability.
//!
//! The engine and applier only talk to the identity provider through
//! [`IdentityStore`]. [`KeycloakClient`] implements it over the Admin REST
//! API; [`InMemoryStore`] holds a canned realm for tests.

pub mod keycloak;
pub mod memory;

pub use keycloak::KeycloakClient;
pub use memory::{InMemoryStore, StoreCall};

use async_trait::async_trait;

use crate::error::MapperResult;
use crate::model::{Group, Realm, Role};

/// Operations the mapper needs from the identity provider, scoped to the
/// target realm.
///
/// Every call completes its remote round-trip before returning. Failures are
/// returned as-is; implementations do not retry.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Name of the realm this store reads and writes.
    fn realm(&self) -> &str;

    /// Looks up a realm by name.
    ///
    /// ## Errors
    ///
    /// Returns `MapperError::NotFound` if the realm doesn't exist.
    async fn get_realm(&self, name: &str) -> MapperResult<Realm>;

    /// Lists the root groups, each with its children nested.
    async fn list_groups(&self) -> MapperResult<Vec<Group>>;

    /// Gets a group with its currently mapped realm-role names.
    async fn get_group(&self, id: &str) -> MapperResult<Group>;

    /// Finds a realm role by name. A missing role is `Ok(None)`.
    async fn find_role_by_name(&self, name: &str) -> MapperResult<Option<Role>>;

    /// Creates a realm role.
    ///
    /// ## Errors
    ///
    /// Fails if a role with the same name exists or the caller lacks
    /// permission.
    async fn create_role(&self, name: &str) -> MapperResult<Role>;

    /// Maps realm roles to a group.
    async fn add_realm_roles_to_group(&self, group_id: &str, roles: &[Role]) -> MapperResult<()>;

    /// Removes realm role mappings from a group.
    async fn remove_realm_roles_from_group(
        &self,
        group_id: &str,
        roles: &[Role],
    ) -> MapperResult<()>;
}
