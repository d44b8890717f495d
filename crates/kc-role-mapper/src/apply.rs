//! Change set application.

use serde::{Deserialize, Serialize};

use crate::changeset::ChangeSet;
use crate::error::{MapperError, MapperResult};
use crate::store::IdentityStore;

/// Outcome of applying a change set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyReport {
    /// Number of roles created.
    pub roles_created: usize,
    /// Number of group/role mappings added.
    pub mappings_created: usize,
    /// Whether the operator declined the changes.
    pub declined: bool,
}

impl ApplyReport {
    /// Report for a declined change set.
    #[must_use]
    pub const fn declined() -> Self {
        Self {
            roles_created: 0,
            mappings_created: 0,
            declined: true,
        }
    }

    fn fail(&self, operation: String, source: MapperError) -> MapperError {
        MapperError::PartialApply {
            operation,
            roles_created: self.roles_created,
            mappings_created: self.mappings_created,
            source: Box::new(source),
        }
    }
}

/// Applies a change set once the operator has confirmed it.
///
/// All roles are created before any mapping is added. Each mapping re-reads
/// its role by name right before binding it, so roles created moments earlier
/// are picked up with their server-assigned IDs. Without confirmation nothing
/// is written.
///
/// ## Errors
///
/// Stops at the first failure and returns `MapperError::PartialApply` with the
/// work already done. Applied changes are not rolled back.
pub async fn apply<S: IdentityStore + ?Sized>(
    store: &S,
    changes: ChangeSet,
    confirmed: bool,
) -> MapperResult<ApplyReport> {
    let mut report = ApplyReport::default();
    if changes.is_empty() {
        return Ok(report);
    }
    if !confirmed {
        tracing::info!("changes declined, nothing applied");
        return Ok(ApplyReport::declined());
    }

    for role_name in changes.missing_roles() {
        tracing::info!(role = %role_name, "creating missing role");
        store
            .create_role(role_name)
            .await
            .map_err(|e| report.fail(format!("create role '{role_name}'"), e))?;
        report.roles_created += 1;
    }

    for (group_id, role_name) in changes.missing_mappings() {
        let operation = || format!("map role '{role_name}' to group {group_id}");
        let role = store
            .find_role_by_name(role_name)
            .await
            .and_then(|found| found.ok_or_else(|| MapperError::not_found("Role", role_name)))
            .map_err(|e| report.fail(operation(), e))?;

        tracing::info!(
            group_id,
            role = %role.name,
            role_id = role.id.as_deref().unwrap_or_default(),
            "creating mapping"
        );
        store
            .add_realm_roles_to_group(group_id, std::slice::from_ref(&role))
            .await
            .map_err(|e| report.fail(operation(), e))?;
        report.mappings_created += 1;
    }

    Ok(report)
}
