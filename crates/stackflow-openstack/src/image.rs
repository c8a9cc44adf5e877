//! Volume to image upload
//!
//! Cinder copies the volume into a new Glance image asynchronously. The
//! image is usable once it is `active`, and the volume is back to
//! `available` once the copy has finished.

use crate::session::{Session, join_url, service, versioned};
use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use stackflow_core::{Outcome, StatusCheck, StatusSource, WaitConfig, wait_for_status};
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
pub const IMAGE_READY: &str = "active";
pub const VOLUME_IDLE: &str = "available";

/// Parameters of the volume upload adapter
#[derive(Debug, Clone)]
pub struct VolumeUploadRequest {
    pub image_name: String,
    pub volume_id: String,
    pub force: bool,
    pub container_format: Option<String>,
    pub disk_format: Option<String>,
    pub wait: bool,
    pub timeout: Duration,
}

impl VolumeUploadRequest {
    pub fn new(image_name: impl Into<String>, volume_id: impl Into<String>) -> Self {
        Self {
            image_name: image_name.into(),
            volume_id: volume_id.into(),
            force: false,
            container_format: None,
            disk_format: None,
            wait: true,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug, Serialize)]
struct UploadAction<'a> {
    image_name: &'a str,
    force: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    container_format: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    disk_format: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct UploadBody {
    #[serde(rename = "os-volume_upload_image")]
    upload: UploadedImage,
}

#[derive(Debug, Deserialize)]
struct UploadedImage {
    image_id: String,
}

#[derive(Debug, Deserialize)]
struct ImageStatus {
    status: String,
}

#[derive(Debug, Deserialize)]
struct VolumeBody {
    volume: VolumeStatus,
}

#[derive(Debug, Deserialize)]
struct VolumeStatus {
    status: String,
}

/// Reads the new image and its source volume
pub struct UploadStatus<'a> {
    session: &'a Session,
    image_url: String,
    volume_url: String,
}

impl<'a> UploadStatus<'a> {
    pub fn new(session: &'a Session, image_url: String, volume_url: String) -> Self {
        Self {
            session,
            image_url,
            volume_url,
        }
    }
}

#[async_trait]
impl StatusSource for UploadStatus<'_> {
    async fn check(&self) -> stackflow_core::Result<Vec<StatusCheck>> {
        let request = self.session.request(Method::GET, &self.image_url);
        let image: ImageStatus = self
            .session
            .send_json(request, "Could not get image")
            .await?;

        let request = self.session.request(Method::GET, &self.volume_url);
        let volume: VolumeBody = self
            .session
            .send_json(request, "Could not get volume")
            .await?;

        Ok(vec![
            StatusCheck::new("image", image.status, IMAGE_READY),
            StatusCheck::new("volume", volume.volume.status, VOLUME_IDLE),
        ])
    }
}

/// Upload a volume to a new image, optionally waiting for it to settle
///
/// Facts: `image_id`.
pub async fn upload_volume_to_image(
    session: &Session,
    request: &VolumeUploadRequest,
    dry_run: bool,
) -> stackflow_core::Result<Outcome> {
    if dry_run {
        tracing::warn!(
            "Dry run: skipping upload of volume {} to image {}",
            request.volume_id,
            request.image_name
        );
        return Ok(Outcome::success(true));
    }

    let volume_base = session.endpoint(service::BLOCK_STORAGE)?;
    let volume_url = join_url(&volume_base, &["volumes", request.volume_id.as_str()])?;
    let action_url = join_url(&volume_base, &["volumes", request.volume_id.as_str(), "action"])?;
    let action = UploadAction {
        image_name: &request.image_name,
        force: request.force,
        container_format: request.container_format.as_deref(),
        disk_format: request.disk_format.as_deref(),
    };
    let http = session
        .request(Method::POST, action_url.as_str())
        .json(&json!({ "os-volume_upload_image": action }));
    let body: UploadBody = session
        .send_json(http, "Could not upload volume to image")
        .await?;
    let image_id = body.upload.image_id;
    tracing::info!("Uploading volume {} to image {}", request.volume_id, image_id);

    if request.wait {
        let image_base = versioned(&session.endpoint(service::IMAGE)?, "/v2");
        let image_url = join_url(&image_base, &["images", image_id.as_str()])?;
        let source = UploadStatus::new(session, image_url.into(), volume_url.into());
        wait_for_status(&WaitConfig::new(request.timeout), "image", &source).await?;
    }

    Ok(Outcome::success(true).with_fact("image_id", image_id))
}
