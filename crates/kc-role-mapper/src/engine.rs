//! Reconciliation engine.
//!
//! Walks the realm's group forest depth-first (parents before children) and
//! works out, for each group, whether the realm role named after it exists
//! and is mapped. The walk only reads from the store; the result is a
//! [`ChangeSet`] handed back to the caller.

use crate::changeset::{ChangeSet, Classification};
use crate::error::{MapperError, MapperResult};
use crate::model::{Group, Realm, Role};
use crate::store::IdentityStore;

/// Checks that the store's realm exists before any other work is done.
///
/// ## Errors
///
/// Returns `MapperError::NotFound` if the realm doesn't exist or carries no
/// internal identifier.
pub async fn validate_realm<S: IdentityStore + ?Sized>(store: &S) -> MapperResult<Realm> {
    let name = store.realm();
    let realm = store.get_realm(name).await?;
    if realm.id.is_none() {
        return Err(MapperError::not_found("Realm", name));
    }
    tracing::info!(realm = %realm.realm, "found realm");
    Ok(realm)
}

/// Classifies a group given the result of looking up the role named after it.
///
/// A group is mapped iff one of its realm roles has exactly the group's name
/// (case-sensitive). The role lookup only matters for unmapped groups.
#[must_use]
pub fn classify(group: &Group, existing_role: Option<&Role>) -> Classification {
    if group.has_realm_role(&group.name) {
        Classification::Mapped
    } else if existing_role.is_some() {
        Classification::MappingMissing
    } else {
        Classification::RoleMissing
    }
}

/// Computes the roles and mappings needed so that every group carries a
/// realm role of the same name.
///
/// Every group is re-read before classification because the listing may
/// omit role mappings. Sub-groups are visited whatever their parent's state.
///
/// ## Errors
///
/// Fails on the first store error; the error names the group being processed.
pub async fn plan<S: IdentityStore + ?Sized>(store: &S) -> MapperResult<ChangeSet> {
    let roots = store.list_groups().await?;
    let mut changes = ChangeSet::new();
    let mut visited = 0usize;

    let mut pending: Vec<Group> = roots.into_iter().rev().collect();
    while let Some(listed) = pending.pop() {
        let classification = reconcile_group(store, &listed, &mut changes)
            .await
            .map_err(|e| MapperError::Reconcile {
                group: display_path(&listed),
                source: Box::new(e),
            })?;
        visited += 1;

        tracing::debug!(
            group = %listed.name,
            id = %listed.id,
            ?classification,
            sub_groups = listed.sub_groups.len(),
            "classified group"
        );
        pending.extend(listed.sub_groups.into_iter().rev());
    }

    tracing::info!(
        groups = visited,
        roles = changes.role_count(),
        mappings = changes.mapping_count(),
        "reconciliation plan complete"
    );
    Ok(changes)
}

async fn reconcile_group<S: IdentityStore + ?Sized>(
    store: &S,
    listed: &Group,
    changes: &mut ChangeSet,
) -> MapperResult<Classification> {
    let group = store.get_group(&listed.id).await?;

    if group.has_realm_role(&group.name) {
        tracing::info!(group = %group.name, "role is already mapped");
        return Ok(Classification::Mapped);
    }

    let role = store.find_role_by_name(&group.name).await?;
    let classification = classify(&group, role.as_ref());
    match classification {
        Classification::RoleMissing => {
            tracing::info!(group = %group.name, "role and mapping are missing");
            changes.add_missing_role(&group.name);
        }
        Classification::MappingMissing => {
            tracing::info!(
                group = %group.name,
                role_id = role.as_ref().and_then(|r| r.id.as_deref()).unwrap_or_default(),
                "role exists, mapping is missing"
            );
        }
        Classification::Mapped => {}
    }
    changes.add_missing_mapping(&group.id, &group.name);
    Ok(classification)
}

fn display_path(group: &Group) -> String {
    if group.path.is_empty() {
        group.name.clone()
    } else {
        group.path.clone()
    }
}
