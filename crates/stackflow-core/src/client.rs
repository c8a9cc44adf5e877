//! Remote resource client trait definition

use crate::descriptor::{ResourceDescriptor, ResourceQuery};
use crate::error::Result;
use async_trait::async_trait;

/// One remote control plane, one resource kind
///
/// Each method maps onto exactly one remote call. Failures surface as
/// [`crate::ReconcileError`] and are never retried here.
#[async_trait]
pub trait ResourceClient: Send + Sync {
    /// Resource kind for messages and logs (e.g. "component")
    fn kind(&self) -> &str;

    /// First resource matching the query, in the remote API's natural order
    async fn find(&self, query: &ResourceQuery) -> Result<Option<ResourceDescriptor>>;

    /// Create a resource from a fully merged descriptor
    async fn create(&self, desired: &ResourceDescriptor) -> Result<ResourceDescriptor>;

    /// Replace the resource with the given id
    async fn update(&self, id: &str, desired: &ResourceDescriptor) -> Result<ResourceDescriptor>;

    /// Delete the resource with the given id
    async fn delete(&self, id: &str) -> Result<()>;

    /// The descriptor as the remote side would store it
    ///
    /// Dry runs compare in this form, since they never see the re-read.
    fn canonicalize(&self, descriptor: ResourceDescriptor) -> ResourceDescriptor {
        descriptor
    }
}
