//! CLI argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{ConfigOverrides, DEFAULT_CONFIG_FILE};
use crate::report::OutputFormat;

/// Keycloak role mapper - makes every group carry a realm role of the same name.
#[derive(Debug, Parser)]
#[command(name = "kc-role-mapper")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file.
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE, env = "KC_MAPPER_CONFIG")]
    pub config: PathBuf,

    /// Server URL (overrides config).
    #[arg(short, long, env = "KC_SERVER_URL")]
    pub server: Option<String>,

    /// Admin username (overrides config).
    #[arg(short, long, env = "KC_USERNAME")]
    pub username: Option<String>,

    /// Admin password (overrides config).
    #[arg(long, env = "KC_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Realm to reconcile (overrides config).
    #[arg(short, long, env = "KC_REALM")]
    pub realm: Option<String>,

    /// Only report the changes, never apply them.
    #[arg(long)]
    pub dry_run: bool,

    /// Apply without asking for confirmation.
    #[arg(short, long, conflicts_with = "dry_run")]
    pub yes: bool,

    /// Report format.
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Configuration values given on the command line.
    #[must_use]
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            server_url: self.server.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            realm: self.realm.clone(),
            dry_run: self.dry_run,
        }
    }
}
