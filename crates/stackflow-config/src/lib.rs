//! Connection configuration for stackflow adapters
//!
//! - OpenStack: `clouds.yaml`, `OS_*` environment variables, or an explicit
//!   auth mapping ([`CloudOptions`])
//! - Keycloak: admin URL, realm, client and credentials ([`KeycloakOptions`])

pub mod cloud;
pub mod error;
pub mod keycloak;

pub use cloud::{
    AuthSettings, AuthType, CloudConfig, CloudEntry, CloudOptions, Credentials, PasswordAuth,
    find_clouds_file, load_cloud, load_cloud_from,
};
pub use error::{ConfigError, Result};
pub use keycloak::{KeycloakConfig, KeycloakCredentials, KeycloakOptions};
