//! Idempotent convergence of a single named resource

use crate::client::ResourceClient;
use crate::descriptor::{DesiredFields, ResourceDescriptor, ResourceQuery};
use crate::error::{ReconcileError, Result};
use crate::merge::merge;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Target state requested by the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetState {
    #[default]
    Present,
    Absent,
}

impl std::fmt::Display for TargetState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetState::Present => write!(f, "present"),
            TargetState::Absent => write!(f, "absent"),
        }
    }
}

impl FromStr for TargetState {
    type Err = ReconcileError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "present" => Ok(TargetState::Present),
            "absent" => Ok(TargetState::Absent),
            other => Err(ReconcileError::Configuration(format!(
                "state must be one of [present, absent], got '{}'",
                other
            ))),
        }
    }
}

/// Mutating call chosen by the reconciler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Create a new resource
    Create,
    /// Update an existing resource
    Update,
    /// Delete a resource
    Delete,
    /// No changes needed
    NoOp,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Create => write!(f, "create"),
            Action::Update => write!(f, "update"),
            Action::Delete => write!(f, "delete"),
            Action::NoOp => write!(f, "no-op"),
        }
    }
}

/// Outcome of one reconciliation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciliationResult {
    pub changed: bool,
    pub action: Action,
    /// Authoritative post-state; absent after a delete or a no-op on an absent resource
    pub resource: Option<ResourceDescriptor>,
}

/// Drives lookup, decide, act, re-read against one [`ResourceClient`]
pub struct Reconciler<'a, C: ?Sized> {
    client: &'a C,
    dry_run: bool,
}

impl<'a, C: ResourceClient + ?Sized> Reconciler<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self {
            client,
            dry_run: false,
        }
    }

    /// Skip mutating calls, but still report what would change
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    pub async fn reconcile(
        &self,
        query: &ResourceQuery,
        desired: &DesiredFields,
        state: TargetState,
    ) -> Result<ReconciliationResult> {
        match state {
            TargetState::Present => self.ensure_present(query, desired).await,
            TargetState::Absent => self.ensure_absent(query).await,
        }
    }

    /// Create the resource, or update it unconditionally when it exists
    ///
    /// `changed` compares the re-read post-state with the pre-state, so
    /// updating an already converged resource reports no change.
    pub async fn ensure_present(
        &self,
        query: &ResourceQuery,
        desired: &DesiredFields,
    ) -> Result<ReconciliationResult> {
        let kind = self.client.kind();
        let existing = self.client.find(query).await?;
        let target = merge(existing.as_ref(), desired);
        let action = if existing.is_some() {
            Action::Update
        } else {
            Action::Create
        };

        if self.dry_run {
            tracing::warn!("Dry run: skipping {} of {} {}", action, kind, query);
            let target = self.client.canonicalize(target);
            let before = existing.map(|e| self.client.canonicalize(e));
            let changed = before.as_ref() != Some(&target);
            return Ok(ReconciliationResult {
                changed,
                action,
                resource: Some(target),
            });
        }

        match &existing {
            None => {
                tracing::info!("Creating {} {}", kind, query);
                self.client.create(&target).await?;
            }
            Some(found) => {
                let id = required_id(kind, query, found)?;
                tracing::info!("Updating {} {} ({})", kind, query, id);
                self.client.update(id, &target).await?;
            }
        }

        // The create/update response may be partial; the lookup is authoritative
        let current = self.client.find(query).await?.ok_or_else(|| {
            ReconcileError::protocol(format!(
                "{} matching {} not found after {}",
                kind, query, action
            ))
        })?;
        let changed = existing.as_ref() != Some(&current);
        tracing::debug!("{} {} converged (changed: {})", kind, query, changed);

        Ok(ReconciliationResult {
            changed,
            action,
            resource: Some(current),
        })
    }

    /// Delete the resource if it exists
    pub async fn ensure_absent(&self, query: &ResourceQuery) -> Result<ReconciliationResult> {
        let kind = self.client.kind();
        let Some(existing) = self.client.find(query).await? else {
            tracing::debug!("{} {} already absent", kind, query);
            return Ok(ReconciliationResult {
                changed: false,
                action: Action::NoOp,
                resource: None,
            });
        };

        let id = required_id(kind, query, &existing)?;
        if self.dry_run {
            tracing::warn!("Dry run: skipping delete of {} {} ({})", kind, query, id);
        } else {
            tracing::info!("Deleting {} {} ({})", kind, query, id);
            self.client.delete(id).await?;
        }

        Ok(ReconciliationResult {
            changed: true,
            action: Action::Delete,
            resource: None,
        })
    }
}

fn required_id<'d>(
    kind: &str,
    query: &ResourceQuery,
    descriptor: &'d ResourceDescriptor,
) -> Result<&'d str> {
    descriptor.id.as_deref().ok_or_else(|| {
        ReconcileError::protocol(format!("{} matching {} has no id", kind, query))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{ConfigValue, Scalar};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_test::assert_err;

    /// In-memory control plane that matches on the `name` filter
    #[derive(Default)]
    struct MemoryClient {
        resources: Mutex<Vec<ResourceDescriptor>>,
        finds: AtomicUsize,
        creates: AtomicUsize,
        updates: AtomicUsize,
        deletes: AtomicUsize,
        lose_after_write: bool,
    }

    impl MemoryClient {
        fn with(resource: ResourceDescriptor) -> Self {
            let client = Self::default();
            client.resources.lock().unwrap().push(resource);
            client
        }

        fn mutations(&self) -> usize {
            self.creates.load(Ordering::SeqCst)
                + self.updates.load(Ordering::SeqCst)
                + self.deletes.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ResourceClient for MemoryClient {
        fn kind(&self) -> &str {
            "component"
        }

        async fn find(&self, query: &ResourceQuery) -> Result<Option<ResourceDescriptor>> {
            self.finds.fetch_add(1, Ordering::SeqCst);
            let name = query.get("name");
            Ok(self
                .resources
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.attribute_str("name") == name)
                .cloned())
        }

        async fn create(&self, desired: &ResourceDescriptor) -> Result<ResourceDescriptor> {
            let n = self.creates.fetch_add(1, Ordering::SeqCst);
            let created = desired.clone().with_id(format!("id-{}", n));
            if !self.lose_after_write {
                self.resources.lock().unwrap().push(created.clone());
            }
            Ok(created)
        }

        async fn update(&self, id: &str, desired: &ResourceDescriptor) -> Result<ResourceDescriptor> {
            self.updates.fetch_add(1, Ordering::SeqCst);
            let mut resources = self.resources.lock().unwrap();
            let slot = resources
                .iter_mut()
                .find(|r| r.id.as_deref() == Some(id))
                .ok_or_else(|| ReconcileError::transport("404"))?;
            *slot = desired.without_id().with_id(id);
            Ok(slot.clone())
        }

        async fn delete(&self, id: &str) -> Result<()> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            self.resources
                .lock()
                .unwrap()
                .retain(|r| r.id.as_deref() != Some(id));
            Ok(())
        }
    }

    fn ldap_query() -> ResourceQuery {
        ResourceQuery::new()
            .with("name", "ldap1")
            .with("type", "org.keycloak.storage.UserStorageProvider")
    }

    fn ldap_desired() -> DesiredFields {
        DesiredFields::new()
            .set("name", "ldap1")
            .set("providerType", "org.keycloak.storage.UserStorageProvider")
            .config_entry("enabled", true)
    }

    #[tokio::test]
    async fn test_create_when_absent() {
        let client = MemoryClient::default();
        let result = Reconciler::new(&client)
            .ensure_present(&ldap_query(), &ldap_desired())
            .await
            .unwrap();

        assert!(result.changed);
        assert_eq!(result.action, Action::Create);
        assert_eq!(client.creates.load(Ordering::SeqCst), 1);
        assert_eq!(client.updates.load(Ordering::SeqCst), 0);

        let resource = result.resource.unwrap();
        assert_eq!(resource.id.as_deref(), Some("id-0"));
        assert_eq!(
            resource.config_value("enabled"),
            Some(&ConfigValue::Sequence(vec![Scalar::Bool(true)]))
        );
    }

    #[tokio::test]
    async fn test_second_apply_is_unchanged() {
        let client = MemoryClient::default();
        let reconciler = Reconciler::new(&client);

        let first = reconciler
            .ensure_present(&ldap_query(), &ldap_desired())
            .await
            .unwrap();
        let second = reconciler
            .ensure_present(&ldap_query(), &ldap_desired())
            .await
            .unwrap();

        assert!(first.changed);
        assert!(!second.changed);
        assert_eq!(second.action, Action::Update);
        // update is still issued, no diffing before the call
        assert_eq!(client.updates.load(Ordering::SeqCst), 1);
        assert_eq!(client.creates.load(Ordering::SeqCst), 1);
        assert_eq!(client.resources.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_reports_change() {
        let existing = ResourceDescriptor::new()
            .with_id("c-1")
            .with_attribute("name", "ldap1")
            .with_attribute("providerId", "ldap");
        let client = MemoryClient::with(existing);

        let result = Reconciler::new(&client)
            .ensure_present(&ldap_query(), &ldap_desired())
            .await
            .unwrap();

        assert!(result.changed);
        let resource = result.resource.unwrap();
        assert_eq!(resource.id.as_deref(), Some("c-1"));
        assert_eq!(resource.attribute_str("providerId"), Some("ldap"));
        assert_eq!(
            resource.attribute_str("providerType"),
            Some("org.keycloak.storage.UserStorageProvider")
        );
    }

    #[tokio::test]
    async fn test_missing_after_create_is_protocol_error() {
        let client = MemoryClient {
            lose_after_write: true,
            ..Default::default()
        };

        let err = Reconciler::new(&client)
            .ensure_present(&ldap_query(), &ldap_desired())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "remote_protocol");
    }

    #[tokio::test]
    async fn test_absent_when_already_absent() {
        let client = MemoryClient::default();
        let result = Reconciler::new(&client)
            .ensure_absent(&ldap_query())
            .await
            .unwrap();

        assert!(!result.changed);
        assert_eq!(result.action, Action::NoOp);
        assert_eq!(client.mutations(), 0);
    }

    #[tokio::test]
    async fn test_absent_deletes_existing() {
        let existing = ResourceDescriptor::new()
            .with_id("c-1")
            .with_attribute("name", "ldap1");
        let client = MemoryClient::with(existing);

        let result = Reconciler::new(&client)
            .reconcile(&ldap_query(), &DesiredFields::new(), TargetState::Absent)
            .await
            .unwrap();

        assert!(result.changed);
        assert!(result.resource.is_none());
        assert_eq!(client.deletes.load(Ordering::SeqCst), 1);
        // no re-read after delete
        assert_eq!(client.finds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_existing_without_id_is_rejected() {
        let client = MemoryClient::with(ResourceDescriptor::new().with_attribute("name", "ldap1"));
        assert_err!(Reconciler::new(&client).ensure_absent(&ldap_query()).await);
        assert_eq!(client.mutations(), 0);
    }

    #[tokio::test]
    async fn test_dry_run_create() {
        let client = MemoryClient::default();
        let result = Reconciler::new(&client)
            .dry_run(true)
            .ensure_present(&ldap_query(), &ldap_desired())
            .await
            .unwrap();

        assert!(result.changed);
        assert_eq!(result.action, Action::Create);
        assert_eq!(client.mutations(), 0);
        assert!(result.resource.unwrap().id.is_none());
    }

    #[tokio::test]
    async fn test_dry_run_converged_update() {
        let existing = ResourceDescriptor::new()
            .with_id("c-1")
            .with_attribute("name", "ldap1")
            .with_attribute("providerType", "org.keycloak.storage.UserStorageProvider")
            .with_config(
                [("enabled".to_string(), ConfigValue::from_iter([true]))]
                    .into_iter()
                    .collect(),
            );
        let client = MemoryClient::with(existing);

        let result = Reconciler::new(&client)
            .dry_run(true)
            .ensure_present(&ldap_query(), &ldap_desired())
            .await
            .unwrap();

        assert!(!result.changed);
        assert_eq!(client.mutations(), 0);
    }

    #[tokio::test]
    async fn test_dry_run_delete() {
        let client = MemoryClient::with(
            ResourceDescriptor::new()
                .with_id("c-1")
                .with_attribute("name", "ldap1"),
        );

        let result = Reconciler::new(&client)
            .dry_run(true)
            .ensure_absent(&ldap_query())
            .await
            .unwrap();

        assert!(result.changed);
        assert_eq!(client.mutations(), 0);
        assert_eq!(client.resources.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_target_state_parse() {
        assert_eq!("present".parse::<TargetState>().unwrap(), TargetState::Present);
        assert_eq!("absent".parse::<TargetState>().unwrap(), TargetState::Absent);
        assert_eq!(
            "gone".parse::<TargetState>().unwrap_err().kind(),
            "configuration"
        );
        assert_eq!(TargetState::default(), TargetState::Present);
    }
}
