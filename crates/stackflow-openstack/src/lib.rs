//! OpenStack adapters for stackflow
//!
//! Every adapter authenticates once through a [`Session`] and reports an
//! [`Outcome`](stackflow_core::Outcome).
//!
//! - [`find_fip`] / [`free_fip`]: floating IPs (Neutron)
//! - [`create_trust`]: role delegation (Keystone)
//! - [`stack_outputs`]: stack outputs (Heat)
//! - [`upload_volume_to_image`]: volume to image (Cinder, Glance)

pub mod error;
pub mod identity;
pub mod image;
pub mod network;
pub mod orchestration;
pub mod session;

pub use error::{OpenStackError, Result};
pub use identity::{RoleRef, TrustRequest, create_trust};
pub use image::{VolumeUploadRequest, upload_volume_to_image};
pub use network::{FipRequest, FloatingIp, FloatingIpPool, Network, NetworkClient, find_fip, free_fip};
pub use orchestration::{get_stack_outputs, stack_outputs};
pub use session::Session;
