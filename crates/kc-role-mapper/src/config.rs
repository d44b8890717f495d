//! Mapper configuration.
//!
//! Settings come from a TOML file and may be overridden from the command line
//! or environment. The server URL, admin username, admin password and target
//! realm are required.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MapperError, MapperResult};

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "mapper.toml";

/// Settings as they appear in the configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Only report the changes, never apply them.
    #[serde(default)]
    pub dry_run_only: bool,
    /// Server URL (e.g., http://localhost:8080).
    pub server_url: Option<String>,
    /// Admin username.
    pub username: Option<String>,
    /// Admin password.
    pub password: Option<String>,
    /// Realm to reconcile.
    pub realm: Option<String>,
    /// Path prefix of the Keycloak endpoints.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_path: Option<String>,
    /// Realm the admin user authenticates against.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_realm: Option<String>,
    /// OAuth2 client used for the password grant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// HTTP request timeout in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Template written when no configuration file exists.
    #[must_use]
    pub fn template() -> Self {
        Self {
            dry_run_only: false,
            server_url: Some("http://localhost:8080".to_string()),
            username: Some("admin".to_string()),
            password: Some("password".to_string()),
            realm: Some("realm".to_string()),
            ..Self::default()
        }
    }
}

/// Values supplied on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Server URL.
    pub server_url: Option<String>,
    /// Admin username.
    pub username: Option<String>,
    /// Admin password.
    pub password: Option<String>,
    /// Realm to reconcile.
    pub realm: Option<String>,
    /// Force dry-run mode.
    pub dry_run: bool,
}

/// Resolved mapper configuration.
#[derive(Clone)]
pub struct MapperConfig {
    /// Only report the changes, never apply them.
    pub dry_run_only: bool,
    /// Server URL.
    pub server_url: String,
    /// Admin username.
    pub username: String,
    /// Admin password.
    pub password: String,
    /// Realm to reconcile.
    pub realm: String,
    /// Path prefix of the Keycloak endpoints.
    pub context_path: String,
    /// Realm the admin user authenticates against.
    pub auth_realm: String,
    /// OAuth2 client used for the password grant.
    pub client_id: String,
    /// HTTP request timeout in seconds.
    pub timeout_secs: u64,
}

impl MapperConfig {
    /// Loads the configuration file at `path` and applies `overrides`.
    ///
    /// If the file doesn't exist, a template is written in its place and a
    /// configuration error is returned so the operator can fill it in.
    pub fn load(path: &Path, overrides: ConfigOverrides) -> MapperResult<Self> {
        if !path.exists() {
            write_template(path)?;
            return Err(MapperError::Config(format!(
                "missing configuration file {}; a template was created, edit it and re-run",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let file: FileConfig = toml::from_str(&content).map_err(|e| {
            MapperError::Config(format!("failed to parse {}: {e}", path.display()))
        })?;
        Self::resolve(file, overrides)
    }

    /// Merges file values with overrides and checks required settings.
    pub fn resolve(file: FileConfig, overrides: ConfigOverrides) -> MapperResult<Self> {
        let config = Self {
            dry_run_only: overrides.dry_run || file.dry_run_only,
            server_url: required("server_url", overrides.server_url.or(file.server_url))?,
            username: required("username", overrides.username.or(file.username))?,
            password: required("password", overrides.password.or(file.password))?,
            realm: required("realm", overrides.realm.or(file.realm))?,
            context_path: normalize_context_path(file.context_path.as_deref().unwrap_or("/auth")),
            auth_realm: file.auth_realm.unwrap_or_else(|| "master".to_string()),
            client_id: file.client_id.unwrap_or_else(|| "admin-cli".to_string()),
            timeout_secs: file.timeout_secs.unwrap_or(30),
        };

        if config.timeout_secs == 0 {
            return Err(MapperError::Config("timeout_secs must be positive".to_string()));
        }
        Ok(config)
    }

    /// Server URL joined with the context path, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("{}{}", self.server_url.trim_end_matches('/'), self.context_path)
    }
}

impl fmt::Display for MapperConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "server={} user={} password=******** realm={} dry_run_only={}",
            self.base_url(),
            self.username,
            self.realm,
            self.dry_run_only
        )
    }
}

impl fmt::Debug for MapperConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapperConfig")
            .field("dry_run_only", &self.dry_run_only)
            .field("server_url", &self.server_url)
            .field("username", &self.username)
            .field("password", &"********")
            .field("realm", &self.realm)
            .field("context_path", &self.context_path)
            .field("auth_realm", &self.auth_realm)
            .field("client_id", &self.client_id)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn required(key: &str, value: Option<String>) -> MapperResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(MapperError::Config(format!("missing required setting `{key}`"))),
    }
}

fn normalize_context_path(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

fn write_template(path: &Path) -> MapperResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let content = toml::to_string_pretty(&FileConfig::template())
        .map_err(|e| MapperError::Config(format!("failed to serialize template: {e}")))?;
    std::fs::write(path, content)?;
    tracing::info!(path = %path.display(), "wrote configuration template");
    Ok(())
}
