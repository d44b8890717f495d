//! One reconciliation run: validate, plan, preview, then apply if confirmed.

use std::io::Write;

use crate::apply::{apply, ApplyReport};
use crate::engine::{plan, validate_realm};
use crate::error::MapperResult;
use crate::output::{info_to, success_to, warning_to};
use crate::report::{render, OutputFormat};
use crate::store::IdentityStore;

/// Options controlling a run. The realm is the store's own.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Only report the changes.
    pub dry_run: bool,
    /// Apply without prompting.
    pub assume_yes: bool,
    /// Report format.
    pub format: OutputFormat,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Everything was already in place.
    NoChanges,
    /// Changes were reported but dry-run mode kept them from being applied.
    DryRun,
    /// The operator declined the changes.
    Declined,
    /// The changes were applied.
    Applied(ApplyReport),
}

/// Runs a reconciliation against the realm `store` is bound to.
///
/// The report is written to `out` and nothing else is; progress and outcome
/// messages go to `status`. `confirm` is only called when there is something
/// to apply and neither dry-run nor `assume_yes` is set.
pub async fn run<S, O, E, F>(
    store: &S,
    options: &RunOptions,
    out: &mut O,
    status: &mut E,
    confirm: F,
) -> MapperResult<RunOutcome>
where
    S: IdentityStore + ?Sized,
    O: Write,
    E: Write,
    F: FnOnce() -> MapperResult<bool>,
{
    let realm = validate_realm(store).await?;
    info_to(status, &format!("Found realm: {}", realm.realm))?;

    let changes = plan(store).await?;
    write!(out, "{}", render(&changes, options.format)?)?;
    if options.format == OutputFormat::Json {
        writeln!(out)?;
    }
    out.flush()?;

    if changes.is_empty() {
        return Ok(RunOutcome::NoChanges);
    }
    if options.dry_run {
        info_to(status, "Dry run only: disable `dry_run_only` in the configuration (or drop --dry-run) to create the missing roles and mappings")?;
        return Ok(RunOutcome::DryRun);
    }

    let confirmed = options.assume_yes || confirm()?;
    let report = apply(store, changes, confirmed).await?;
    if report.declined {
        warning_to(status, "Operation cancelled, no changes applied")?;
        return Ok(RunOutcome::Declined);
    }

    success_to(
        status,
        &format!(
            "Created {} role(s) and {} mapping(s)",
            report.roles_created, report.mappings_created
        ),
    )?;
    Ok(RunOutcome::Applied(report))
}
