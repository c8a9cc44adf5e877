//! stackflow core
//!
//! Converges a named remote resource (identity-broker component, floating
//! IP, trust, image, ...) to a desired state with as few remote calls as
//! possible and without ever creating a duplicate.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │            stackflow CLI (one command            │
//! │              per adapter, JSON out)              │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                 stackflow-core                   │
//! │  ┌──────────────┐  ┌──────────────────────────┐ │
//! │  │    merge     │  │ Reconciler / allocate /  │ │
//! │  │ (pure, sync) │  │ wait (async, sequential) │ │
//! │  └──────────────┘  └──────────────────────────┘ │
//! │  trait ResourceClient / AllocatingClient         │
//! └───────┬─────────────────┬───────────────────────┘
//!         │                 │
//! ┌───────▼───────┐ ┌───────▼───────┐
//! │   keycloak    │ │   openstack   │
//! │   (REST)      │ │   (REST)      │
//! └───────────────┘ └───────────────┘
//! ```
//!
//! Nothing is cached between invocations; the remote control plane is the
//! only source of truth.

pub mod allocate;
pub mod client;
pub mod descriptor;
pub mod error;
pub mod merge;
pub mod outcome;
pub mod reconcile;
pub mod wait;

// Re-exports
pub use allocate::{Allocation, AllocatingClient, find_or_allocate, release};
pub use client::ResourceClient;
pub use descriptor::{
    ConfigMap, ConfigValue, DesiredFields, ResourceDescriptor, ResourceQuery, Scalar,
};
pub use error::{ReconcileError, Result};
pub use merge::{merge, normalize_config};
pub use outcome::Outcome;
pub use reconcile::{Action, ReconciliationResult, Reconciler, TargetState};
pub use wait::{StatusCheck, StatusSource, WaitConfig, wait_for_status, wait_until};
