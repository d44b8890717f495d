//! # kc-role-mapper
//!
//! Reconciles a Keycloak realm's groups with its realm roles: every group,
//! sub-groups included, should have a realm role of the same name mapped to
//! it.
//!
//! A run has two passes:
//! - [`engine::plan`] walks the group tree and returns a [`ChangeSet`]
//!   (roles to create, mappings to add) without writing anything
//! - [`apply::apply`] creates the roles, then the mappings, once confirmed
//!
//! The identity provider is reached through the [`IdentityStore`] trait.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::uninlined_format_args)]

pub mod apply;
pub mod changeset;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod output;
pub mod report;
pub mod run;
pub mod store;

pub use apply::ApplyReport;
pub use changeset::{ChangeSet, Classification};
pub use cli::Cli;
pub use config::MapperConfig;
pub use error::{MapperError, MapperResult};
pub use store::{IdentityStore, InMemoryStore, KeycloakClient};
