//! Keycloak component management
//!
//! Components live under `/admin/realms/{realm}/components` and are
//! identified by name, provider type and (optionally) parent id.

use crate::api::KeycloakApi;
use async_trait::async_trait;
use reqwest::header::LOCATION;
use reqwest::{Method, Url};
use stackflow_core::{
    ConfigMap, ConfigValue, DesiredFields, Outcome, Reconciler, ResourceClient,
    ResourceDescriptor, ResourceQuery, Scalar, TargetState,
};

pub const DEFAULT_REALM: &str = "master";

/// Component endpoint of one realm
pub struct ComponentClient<'a> {
    api: &'a KeycloakApi,
    realm: String,
}

impl<'a> ComponentClient<'a> {
    pub fn new(api: &'a KeycloakApi, realm: impl Into<String>) -> Self {
        Self {
            api,
            realm: realm.into(),
        }
    }

    fn components_url(&self) -> crate::Result<Url> {
        self.api.url(&["admin", "realms", self.realm.as_str(), "components"])
    }

    fn component_url(&self, id: &str) -> crate::Result<Url> {
        self.api
            .url(&["admin", "realms", self.realm.as_str(), "components", id])
    }
}

#[async_trait]
impl ResourceClient for ComponentClient<'_> {
    fn kind(&self) -> &str {
        "component"
    }

    async fn find(&self, query: &ResourceQuery) -> stackflow_core::Result<Option<ResourceDescriptor>> {
        let request = self
            .api
            .request(Method::GET, self.components_url()?)
            .query(query.pairs());

        let components: Vec<ResourceDescriptor> = self
            .api
            .send_json(request, "Could not obtain list of components")
            .await?;

        Ok(components.into_iter().next())
    }

    async fn create(&self, desired: &ResourceDescriptor) -> stackflow_core::Result<ResourceDescriptor> {
        let request = self
            .api
            .request(Method::POST, self.components_url()?)
            .json(&desired.without_id());

        let response = self.api.send(request, "Could not create component").await?;

        // Keycloak answers 201 with the new id only in the Location header
        let created = match response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|location| location.rsplit('/').next())
            .filter(|id| !id.is_empty())
        {
            Some(id) => desired.without_id().with_id(id),
            None => desired.without_id(),
        };
        Ok(created)
    }

    async fn update(
        &self,
        id: &str,
        desired: &ResourceDescriptor,
    ) -> stackflow_core::Result<ResourceDescriptor> {
        let request = self
            .api
            .request(Method::PUT, self.component_url(id)?)
            .json(&desired.without_id());

        self.api.send(request, "Could not update component").await?;
        Ok(desired.without_id().with_id(id))
    }

    async fn delete(&self, id: &str) -> stackflow_core::Result<()> {
        let request = self
            .api
            .request(Method::DELETE, self.component_url(id)?);
        self.api.send(request, "Could not delete component").await?;
        Ok(())
    }

    /// Keycloak stores every config value as a list of strings
    fn canonicalize(&self, mut descriptor: ResourceDescriptor) -> ResourceDescriptor {
        if let Some(config) = descriptor.config.as_mut() {
            for value in config.values_mut() {
                *value = value
                    .normalize()
                    .iter()
                    .map(|scalar| Scalar::Text(scalar.to_string()))
                    .collect::<ConfigValue>();
            }
        }
        descriptor
    }
}

/// Caller-supplied parameters of the component adapter
#[derive(Debug, Clone)]
pub struct ComponentSpec {
    pub realm: String,
    pub name: String,
    pub provider_type: String,
    pub provider_id: Option<String>,
    pub subtype: Option<String>,
    pub parent_id: Option<String>,
    pub config: ConfigMap,
    pub state: TargetState,
}

impl ComponentSpec {
    pub fn new(name: impl Into<String>, provider_type: impl Into<String>) -> Self {
        Self {
            realm: DEFAULT_REALM.to_string(),
            name: name.into(),
            provider_type: provider_type.into(),
            provider_id: None,
            subtype: None,
            parent_id: None,
            config: ConfigMap::new(),
            state: TargetState::Present,
        }
    }

    /// Lookup filters; the endpoint calls the provider type `type` and the
    /// parent id `parent`
    pub fn query(&self) -> ResourceQuery {
        ResourceQuery::new()
            .with("name", self.name.as_str())
            .with("type", self.provider_type.as_str())
            .with_opt("parent", self.parent_id.as_deref())
    }

    /// Desired attributes in wire casing
    pub fn desired(&self) -> DesiredFields {
        DesiredFields::new()
            .set("name", self.name.as_str())
            .set("providerType", self.provider_type.as_str())
            .set_opt("providerId", self.provider_id.as_deref())
            .set_opt("subType", self.subtype.as_deref())
            .set_opt("parentId", self.parent_id.as_deref())
            .with_config(self.config.clone())
    }
}

/// Create, update or delete one component
///
/// Facts: `component`, the post-state, when the component exists afterwards.
pub async fn reconcile_component(
    api: &KeycloakApi,
    spec: &ComponentSpec,
    dry_run: bool,
) -> stackflow_core::Result<Outcome> {
    let client = ComponentClient::new(api, spec.realm.as_str());
    let result = Reconciler::new(&client)
        .dry_run(dry_run)
        .reconcile(&spec.query(), &spec.desired(), spec.state)
        .await?;

    let component = result.resource.map(|r| r.to_value()).transpose()?;

    Ok(Outcome::success(result.changed).with_opt_fact("component", component))
}
