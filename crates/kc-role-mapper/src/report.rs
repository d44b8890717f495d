//! Change set preview.

use serde::{Deserialize, Serialize};
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::changeset::ChangeSet;
use crate::error::MapperResult;

/// Statement printed when the realm is already reconciled.
pub const NO_CHANGES: &str = "*** All roles and mappings are already set, no changes needed ***";

/// Heading above the roles to be created.
pub const ROLES_HEADING: &str = "*** The following missing roles will be created ***";

/// Heading above the mappings to be created.
pub const MAPPINGS_HEADING: &str = "*** The following mappings will be created ***";

/// Report format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// JSON document.
    Json,
}

/// One row of the mapping table.
#[derive(Debug, Tabled)]
struct MappingRow<'a> {
    #[tabled(rename = "Group")]
    group: &'a str,
    #[tabled(rename = "Group ID")]
    group_id: &'a str,
    #[tabled(rename = "Role")]
    role: &'a str,
}

/// Renders a change set as text.
#[must_use]
pub fn render_text(changes: &ChangeSet) -> String {
    if changes.is_empty() {
        return format!("{NO_CHANGES}\n");
    }

    let mut out = String::new();
    out.push_str(ROLES_HEADING);
    out.push('\n');
    if changes.role_count() == 0 {
        out.push_str("(none, all roles exist)\n");
    }
    for role in changes.missing_roles() {
        out.push_str(&format!("Role {role}\n"));
    }

    out.push_str(MAPPINGS_HEADING);
    out.push('\n');
    // Roles carry their group's name.
    let rows: Vec<MappingRow<'_>> = changes
        .missing_mappings()
        .map(|(group_id, role)| MappingRow {
            group: role,
            group_id,
            role,
        })
        .collect();
    out.push_str(&Table::new(rows).with(Style::rounded()).to_string());
    out.push('\n');
    out
}

/// Renders a change set as pretty-printed JSON.
pub fn render_json(changes: &ChangeSet) -> MapperResult<String> {
    Ok(serde_json::to_string_pretty(changes)?)
}

/// Renders a change set in the requested format.
pub fn render(changes: &ChangeSet, format: OutputFormat) -> MapperResult<String> {
    match format {
        OutputFormat::Text => Ok(render_text(changes)),
        OutputFormat::Json => render_json(changes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ChangeSet {
        let mut changes = ChangeSet::new();
        changes.add_missing_role("engineers");
        changes.add_missing_mapping("g-eng", "engineers");
        changes.add_missing_mapping("g-ops", "ops");
        changes
    }

    #[test]
    fn empty_reports_no_changes() {
        let text = render_text(&ChangeSet::new());

        assert_eq!(text.trim(), NO_CHANGES);
        assert!(!text.contains(ROLES_HEADING));
    }

    #[test]
    fn lists_roles_and_mappings() {
        let text = render_text(&sample());

        assert!(text.contains(ROLES_HEADING));
        assert!(text.contains("Role engineers"));
        assert!(!text.contains("Role ops\n"));
        assert!(text.contains(MAPPINGS_HEADING));
        assert!(text.contains("g-eng"));
        assert!(text.contains("g-ops"));
        assert!(!text.contains(NO_CHANGES));
        assert!(text.find(ROLES_HEADING) < text.find(MAPPINGS_HEADING));
    }

    #[test]
    fn mappings_only() {
        let mut changes = ChangeSet::new();
        changes.add_missing_mapping("g-ops", "ops");

        let text = render_text(&changes);
        assert!(text.contains("(none, all roles exist)"));
        assert!(text.contains("g-ops"));
    }

    #[test]
    fn rendering_leaves_change_set_untouched() {
        let changes = sample();
        let before = changes.clone();

        render(&changes, OutputFormat::Text).unwrap();
        render(&changes, OutputFormat::Json).unwrap();
        assert_eq!(changes, before);
    }

    #[test]
    fn json_round_trips() {
        let changes = sample();
        let json = render_json(&changes).unwrap();

        let parsed: ChangeSet = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, changes);
    }
}
