use crate::args::CloudArgs;
use clap::Args;
use stackflow_core::Outcome;
use stackflow_openstack::stack_outputs;

#[derive(Args, Debug, Clone)]
pub struct StackArgs {
    /// Stack name or id
    #[arg(long)]
    pub stack: String,

    #[command(flatten)]
    pub cloud: CloudArgs,
}

/// Read-only, so dry runs behave the same
pub async fn handle(args: &StackArgs) -> stackflow_core::Result<Outcome> {
    let session = args.cloud.connect().await?;
    stack_outputs(&session, &args.stack).await
}
