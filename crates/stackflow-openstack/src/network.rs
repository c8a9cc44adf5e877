//! Floating IPs
//!
//! Floating addresses are pooled: `find-fip` reuses an idle address of the
//! project or allocates a new one, and `free-fip` detaches a specific
//! address from its port.

use crate::error::OpenStackError;
use crate::session::{Session, join_url, service, versioned};
use async_trait::async_trait;
use reqwest::{Method, Url};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use stackflow_core::{Allocation, AllocatingClient, Outcome, ReconcileError, find_or_allocate, release};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Network {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FloatingIp {
    pub id: String,
    pub floating_ip_address: String,
    pub floating_network_id: String,
    #[serde(default)]
    pub port_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Deserialize)]
struct NetworkBody {
    network: Network,
}

#[derive(Deserialize)]
struct NetworksBody {
    networks: Vec<Network>,
}

#[derive(Deserialize)]
struct FloatingIpBody {
    floatingip: FloatingIp,
}

#[derive(Deserialize)]
struct FloatingIpsBody {
    floatingips: Vec<FloatingIp>,
}

/// Neutron v2.0 client
pub struct NetworkClient<'a> {
    session: &'a Session,
    base_url: String,
}

impl<'a> NetworkClient<'a> {
    pub fn new(session: &'a Session) -> crate::Result<Self> {
        let base_url = versioned(&session.endpoint(service::NETWORK)?, "/v2.0");
        Ok(Self { session, base_url })
    }

    fn url(&self, segments: &[&str]) -> crate::Result<Url> {
        join_url(&self.base_url, segments)
    }

    /// Look a network up by id, then by name
    pub async fn find_network(&self, name_or_id: &str) -> crate::Result<Network> {
        let request = self
            .session
            .request(Method::GET, self.url(&["networks", name_or_id])?.as_str());
        let by_id: Option<NetworkBody> = self
            .session
            .send_json_optional(request, "Could not get network")
            .await?;
        if let Some(body) = by_id {
            return Ok(body.network);
        }

        let request = self
            .session
            .request(Method::GET, self.url(&["networks"])?.as_str())
            .query(&[("name", name_or_id)]);
        let body: NetworksBody = self
            .session
            .send_json(request, "Could not list networks")
            .await?;

        let mut matches = body.networks.into_iter();
        match (matches.next(), matches.next()) {
            (Some(network), None) => Ok(network),
            (Some(_), Some(_)) => Err(OpenStackError::InvalidParameter(format!(
                "More than one network named {}",
                name_or_id
            ))),
            (None, _) => Err(OpenStackError::NotFound(format!(
                "Network {} not found.",
                name_or_id
            ))),
        }
    }

    pub async fn list_floating_ips(&self, filters: &[(&str, &str)]) -> crate::Result<Vec<FloatingIp>> {
        let request = self
            .session
            .request(Method::GET, self.url(&["floatingips"])?.as_str())
            .query(filters);
        let body: FloatingIpsBody = self
            .session
            .send_json(request, "Could not list floating IPs")
            .await?;
        Ok(body.floatingips)
    }

    pub async fn create_floating_ip(&self, network_id: &str) -> crate::Result<FloatingIp> {
        let request = self
            .session
            .request(Method::POST, self.url(&["floatingips"])?.as_str())
            .json(&json!({ "floatingip": { "floating_network_id": network_id } }));
        let body: FloatingIpBody = self
            .session
            .send_json(request, "Could not allocate floating IP")
            .await?;
        Ok(body.floatingip)
    }

    pub async fn update_floating_ip(&self, id: &str, fields: Value) -> crate::Result<FloatingIp> {
        let request = self
            .session
            .request(Method::PUT, self.url(&["floatingips", id])?.as_str())
            .json(&json!({ "floatingip": fields }));
        let body: FloatingIpBody = self
            .session
            .send_json(request, "Could not update floating IP")
            .await?;
        Ok(body.floatingip)
    }
}

/// Floating IPs of one external network, scoped to the session's project
pub struct FloatingIpPool<'a> {
    client: &'a NetworkClient<'a>,
    network: Network,
    /// Network as the caller named it, for messages
    label: String,
}

impl<'a> FloatingIpPool<'a> {
    pub fn new(client: &'a NetworkClient<'a>, network: Network, label: impl Into<String>) -> Self {
        Self {
            client,
            network,
            label: label.into(),
        }
    }

    pub fn network(&self) -> &Network {
        &self.network
    }
}

#[async_trait]
impl AllocatingClient for FloatingIpPool<'_> {
    type Resource = FloatingIp;

    fn kind(&self) -> &str {
        "floating IP"
    }

    async fn find_available(&self) -> stackflow_core::Result<Option<FloatingIp>> {
        let ips = self
            .client
            .list_floating_ips(&[
                ("floating_network_id", self.network.id.as_str()),
                ("project_id", self.client.session.project_id()),
            ])
            .await?;
        Ok(ips.into_iter().find(|ip| ip.port_id.is_none()))
    }

    async fn find_by_identity(&self, address: &str) -> stackflow_core::Result<Option<FloatingIp>> {
        let ips = self
            .client
            .list_floating_ips(&[
                ("floating_ip_address", address),
                ("floating_network_id", self.network.id.as_str()),
            ])
            .await?;
        Ok(ips.into_iter().next())
    }

    async fn allocate(&self) -> stackflow_core::Result<FloatingIp> {
        Ok(self.client.create_floating_ip(&self.network.id).await?)
    }

    async fn detach(&self, ip: &FloatingIp) -> stackflow_core::Result<FloatingIp> {
        Ok(self
            .client
            .update_floating_ip(&ip.id, json!({ "port_id": null }))
            .await?)
    }

    fn is_attached(&self, ip: &FloatingIp) -> bool {
        ip.port_id.is_some()
    }

    fn not_found(&self, address: &str) -> ReconcileError {
        ReconcileError::NotFound(format!(
            "Floating IP {} not found on network {}.",
            address, self.label
        ))
    }
}

/// Parameters of `find-fip` and `free-fip`
#[derive(Debug, Clone)]
pub struct FipRequest {
    /// Name or id of the network that provides floating IPs
    pub floating_network: String,
    pub ip: Option<String>,
}

/// Return the requested floating IP, an idle one, or a new allocation
///
/// Facts: `fip_id`, `fip_ip`.
pub async fn find_fip(
    session: &Session,
    request: &FipRequest,
    dry_run: bool,
) -> stackflow_core::Result<Outcome> {
    let client = NetworkClient::new(session)?;
    let network = client.find_network(&request.floating_network).await?;
    let pool = FloatingIpPool::new(&client, network, request.floating_network.as_str());

    let allocation = find_or_allocate(&pool, request.ip.as_deref(), dry_run).await?;
    Ok(fip_outcome(allocation))
}

/// Detach the requested floating IP from its port, or behave like
/// [`find_fip`] when no address is given
///
/// Facts: `fip_id`, `fip_ip`.
pub async fn free_fip(
    session: &Session,
    request: &FipRequest,
    dry_run: bool,
) -> stackflow_core::Result<Outcome> {
    let client = NetworkClient::new(session)?;
    let network = client.find_network(&request.floating_network).await?;
    let pool = FloatingIpPool::new(&client, network, request.floating_network.as_str());

    let allocation = release(&pool, request.ip.as_deref(), dry_run).await?;
    Ok(fip_outcome(allocation))
}

fn fip_outcome(allocation: Allocation<FloatingIp>) -> Outcome {
    let (id, address) = match allocation.resource {
        Some(ip) => (Some(ip.id), Some(ip.floating_ip_address)),
        None => (None, None),
    };
    Outcome::success(allocation.changed)
        .with_opt_fact("fip_id", id)
        .with_opt_fact("fip_ip", address)
}
