use crate::args::CloudArgs;
use clap::Args;
use stackflow_core::Outcome;
use stackflow_openstack::{FipRequest, find_fip, free_fip};

#[derive(Args, Debug, Clone)]
pub struct FipArgs {
    /// Name or id of the network that provides floating IPs
    #[arg(long, alias = "floating-network-id")]
    pub floating_network: String,

    /// Specific floating IP address
    #[arg(long)]
    pub ip: Option<String>,

    #[command(flatten)]
    pub cloud: CloudArgs,
}

impl FipArgs {
    fn request(&self) -> FipRequest {
        FipRequest {
            floating_network: self.floating_network.clone(),
            ip: self.ip.clone(),
        }
    }
}

pub async fn handle_find(args: &FipArgs, dry_run: bool) -> stackflow_core::Result<Outcome> {
    let session = args.cloud.connect().await?;
    find_fip(&session, &args.request(), dry_run).await
}

pub async fn handle_free(args: &FipArgs, dry_run: bool) -> stackflow_core::Result<Outcome> {
    let session = args.cloud.connect().await?;
    free_fip(&session, &args.request(), dry_run).await
}
