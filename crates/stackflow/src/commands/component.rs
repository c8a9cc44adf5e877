use crate::args::KeycloakArgs;
use clap::Args;
use stackflow_core::{ConfigMap, Outcome, ReconcileError, TargetState};
use stackflow_keycloak::{ComponentSpec, reconcile_component};

#[derive(Args, Debug, Clone)]
pub struct ComponentArgs {
    /// Realm that owns the component
    #[arg(long, default_value = stackflow_keycloak::component::DEFAULT_REALM)]
    pub realm: String,

    #[arg(long)]
    pub name: String,

    /// e.g. org.keycloak.storage.UserStorageProvider
    #[arg(long)]
    pub provider_type: String,

    #[arg(long)]
    pub provider_id: Option<String>,

    #[arg(long)]
    pub subtype: Option<String>,

    #[arg(long)]
    pub parent_id: Option<String>,

    /// Component configuration as a JSON object
    #[arg(long)]
    pub config: Option<String>,

    /// present or absent
    #[arg(long, default_value = "present")]
    pub state: String,

    #[command(flatten)]
    pub connection: KeycloakArgs,
}

impl ComponentArgs {
    fn spec(&self) -> stackflow_core::Result<ComponentSpec> {
        let config: ConfigMap = match self.config.as_deref() {
            Some(raw) => serde_json::from_str(raw).map_err(|e| {
                ReconcileError::Configuration(format!("invalid --config JSON: {}", e))
            })?,
            None => ConfigMap::new(),
        };

        let mut spec = ComponentSpec::new(self.name.as_str(), self.provider_type.as_str());
        spec.realm = self.realm.clone();
        spec.provider_id = self.provider_id.clone();
        spec.subtype = self.subtype.clone();
        spec.parent_id = self.parent_id.clone();
        spec.config = config;
        spec.state = self.state.parse::<TargetState>()?;
        Ok(spec)
    }
}

pub async fn handle(args: &ComponentArgs, dry_run: bool) -> stackflow_core::Result<Outcome> {
    let spec = args.spec()?;
    let api = args.connection.connect().await?;
    reconcile_component(&api, &spec, dry_run).await
}
