//! Role mapper error types.

use thiserror::Error;

/// Role mapper error type.
#[derive(Debug, Error)]
pub enum MapperError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Authentication error.
    #[error("authentication error: {0}")]
    Auth(String),

    /// API error.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: String,
    },

    /// Resource not found.
    #[error("{resource_type} not found: {id}")]
    NotFound {
        /// Type of resource.
        resource_type: String,
        /// Resource identifier.
        id: String,
    },

    /// Resource already exists.
    #[error("{resource_type} already exists: {id}")]
    AlreadyExists {
        /// Type of resource.
        resource_type: String,
        /// Resource identifier.
        id: String,
    },

    /// Reading or classifying a group failed.
    #[error("failed to reconcile group '{group}': {source}")]
    Reconcile {
        /// Path of the group being processed.
        group: String,
        /// Underlying error.
        #[source]
        source: Box<MapperError>,
    },

    /// Applying the change set stopped part-way through.
    #[error(
        "failed to {operation} after creating {roles_created} role(s) and {mappings_created} mapping(s): {source}"
    )]
    PartialApply {
        /// Operation that failed.
        operation: String,
        /// Roles created before the failure.
        roles_created: usize,
        /// Mappings created before the failure.
        mappings_created: usize,
        /// Underlying error.
        #[source]
        source: Box<MapperError>,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl MapperError {
    /// Creates a not found error.
    #[must_use]
    pub fn not_found(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }

    /// Creates an already exists error.
    #[must_use]
    pub fn already_exists(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::AlreadyExists {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }

    /// Checks if this is a not found error.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Role mapper result type.
pub type MapperResult<T> = Result<T, MapperError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_error() {
        let err = MapperError::not_found("Realm", "acme");

        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Realm not found: acme");
    }

    #[test]
    fn partial_apply_names_progress_and_cause() {
        let err = MapperError::PartialApply {
            operation: "create role 'ops'".to_string(),
            roles_created: 2,
            mappings_created: 0,
            source: Box::new(MapperError::already_exists("Role", "ops")),
        };

        let message = err.to_string();
        assert!(message.contains("create role 'ops'"));
        assert!(message.contains("2 role(s)"));
        assert!(message.contains("Role already exists: ops"));
        assert!(!err.is_not_found());
    }
}
