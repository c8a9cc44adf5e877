use crate::args::CloudArgs;
use clap::{ArgAction, Args};
use stackflow_core::Outcome;
use stackflow_openstack::{RoleRef, TrustRequest, create_trust};

#[derive(Args, Debug, Clone)]
pub struct TrustArgs {
    #[arg(long)]
    pub trustee_user_id: String,

    /// Role name, or {"id": ...} / {"name": ...}; repeatable
    #[arg(long = "role", required = true)]
    pub roles: Vec<String>,

    /// Let the trustee impersonate the trustor
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub impersonation: bool,

    #[command(flatten)]
    pub cloud: CloudArgs,
}

impl TrustArgs {
    fn request(&self) -> stackflow_core::Result<TrustRequest> {
        let roles = self
            .roles
            .iter()
            .map(|role| role.parse::<RoleRef>())
            .collect::<Result<Vec<_>, _>>()?;

        let mut request = TrustRequest::new(self.trustee_user_id.as_str(), roles);
        request.impersonation = self.impersonation;
        Ok(request)
    }
}

pub async fn handle(args: &TrustArgs, dry_run: bool) -> stackflow_core::Result<Outcome> {
    let request = args.request()?;
    let session = args.cloud.connect().await?;
    create_trust(&session, &request, dry_run).await
}
