//! Find-or-allocate and detach-before-release for pooled resources
//!
//! Pooled resources (floating addresses, for instance) are not created
//! under a caller-chosen name: either an idle one is reused, or the remote
//! side allocates a fresh one. A specific identity can be requested, but it
//! is never created on demand.

use crate::error::{ReconcileError, Result};
use async_trait::async_trait;

/// Client for a pool of allocatable resources
#[async_trait]
pub trait AllocatingClient: Send + Sync {
    type Resource: Send + Sync;

    /// Resource kind for messages and logs (e.g. "floating IP")
    fn kind(&self) -> &str;

    /// First resource that is allocated but not attached to anything
    async fn find_available(&self) -> Result<Option<Self::Resource>>;

    /// The resource with exactly this identity, if it exists
    async fn find_by_identity(&self, identity: &str) -> Result<Option<Self::Resource>>;

    /// Allocate a new resource from the pool
    async fn allocate(&self) -> Result<Self::Resource>;

    /// Detach the resource from whatever it is attached to
    async fn detach(&self, resource: &Self::Resource) -> Result<Self::Resource>;

    fn is_attached(&self, resource: &Self::Resource) -> bool;

    /// Error raised when a requested identity does not exist
    fn not_found(&self, identity: &str) -> ReconcileError {
        ReconcileError::NotFound(format!("{} {} not found", self.kind(), identity))
    }
}

/// Result of an allocation
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation<R> {
    pub changed: bool,
    /// `None` only when a dry run skipped an allocation
    pub resource: Option<R>,
}

impl<R> Allocation<R> {
    fn unchanged(resource: R) -> Self {
        Self {
            changed: false,
            resource: Some(resource),
        }
    }

    fn changed(resource: Option<R>) -> Self {
        Self {
            changed: true,
            resource,
        }
    }
}

/// Return the requested resource, or reuse an idle one, or allocate
///
/// A requested identity is looked up only; it is never detached and never
/// allocated.
pub async fn find_or_allocate<C>(
    client: &C,
    identity: Option<&str>,
    dry_run: bool,
) -> Result<Allocation<C::Resource>>
where
    C: AllocatingClient + ?Sized,
{
    if let Some(identity) = identity {
        let resource = lookup(client, identity).await?;
        return Ok(Allocation::unchanged(resource));
    }

    if let Some(resource) = client.find_available().await? {
        tracing::debug!("Reusing available {}", client.kind());
        return Ok(Allocation::unchanged(resource));
    }

    if dry_run {
        tracing::warn!("Dry run: skipping allocation of {}", client.kind());
        return Ok(Allocation::changed(None));
    }

    tracing::info!("Allocating new {}", client.kind());
    let resource = client.allocate().await?;
    Ok(Allocation::changed(Some(resource)))
}

/// Like [`find_or_allocate`], but a requested resource that is attached
/// somewhere gets detached first
pub async fn release<C>(
    client: &C,
    identity: Option<&str>,
    dry_run: bool,
) -> Result<Allocation<C::Resource>>
where
    C: AllocatingClient + ?Sized,
{
    let Some(identity) = identity else {
        return find_or_allocate(client, None, dry_run).await;
    };

    let resource = lookup(client, identity).await?;
    if !client.is_attached(&resource) {
        return Ok(Allocation::unchanged(resource));
    }

    if dry_run {
        tracing::warn!("Dry run: skipping detach of {} {}", client.kind(), identity);
        return Ok(Allocation::changed(Some(resource)));
    }

    tracing::info!("Detaching {} {}", client.kind(), identity);
    let detached = client.detach(&resource).await?;
    Ok(Allocation::changed(Some(detached)))
}

async fn lookup<C>(client: &C, identity: &str) -> Result<C::Resource>
where
    C: AllocatingClient + ?Sized,
{
    client
        .find_by_identity(identity)
        .await?
        .ok_or_else(|| client.not_found(identity))
}
