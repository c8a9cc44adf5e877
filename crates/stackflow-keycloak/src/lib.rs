//! Keycloak adapter for stackflow
//!
//! Manages identity-broker components through the Keycloak admin REST API.
//!
//! # Example
//!
//! ```ignore
//! use stackflow_config::KeycloakOptions;
//! use stackflow_keycloak::{ComponentSpec, KeycloakApi, reconcile_component};
//!
//! let config = KeycloakOptions { /* ... */ ..Default::default() }.resolve()?;
//! let api = KeycloakApi::connect(&config).await?;
//!
//! let spec = ComponentSpec::new("ldap1", "org.keycloak.storage.UserStorageProvider");
//! let outcome = reconcile_component(&api, &spec, false).await?;
//! ```

pub mod api;
pub mod component;
pub mod error;

pub use api::KeycloakApi;
pub use component::{ComponentClient, ComponentSpec, reconcile_component};
pub use error::{KeycloakError, Result};
