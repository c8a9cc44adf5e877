use crate::args::CloudArgs;
use clap::{ArgAction, Args};
use stackflow_core::Outcome;
use stackflow_openstack::{VolumeUploadRequest, upload_volume_to_image};
use std::time::Duration;

#[derive(Args, Debug, Clone)]
pub struct VolumeUploadArgs {
    #[arg(long)]
    pub image_name: String,

    #[arg(long)]
    pub volume_id: String,

    /// Upload even if the volume is attached
    #[arg(long)]
    pub force: bool,

    #[arg(long)]
    pub container_format: Option<String>,

    #[arg(long)]
    pub disk_format: Option<String>,

    /// Wait until the image is active
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub wait: bool,

    /// Seconds to wait
    #[arg(long, default_value_t = 120)]
    pub timeout: u64,

    #[command(flatten)]
    pub cloud: CloudArgs,
}

impl VolumeUploadArgs {
    fn request(&self) -> VolumeUploadRequest {
        let mut request = VolumeUploadRequest::new(self.image_name.as_str(), self.volume_id.as_str());
        request.force = self.force;
        request.container_format = self.container_format.clone();
        request.disk_format = self.disk_format.clone();
        request.wait = self.wait;
        request.timeout = Duration::from_secs(self.timeout);
        request
    }
}

pub async fn handle(args: &VolumeUploadArgs, dry_run: bool) -> stackflow_core::Result<Outcome> {
    let session = args.cloud.connect().await?;
    upload_volume_to_image(&session, &args.request(), dry_run).await
}
