//! Fallback delivery through an external file host.
//!
//! The file is streamed as the body of `PUT <endpoint>/<basename>`; hosts in
//! the transfer.sh family answer 200/201 with the public link as plain text.
//! The returned text is not validated here: callers run it through
//! `core::validation::validate_hosted_url` before showing it to anyone.

use async_trait::async_trait;
use reqwest::{Body, Client, StatusCode};
use std::path::Path;
use tokio_util::io::ReaderStream;
use url::Url;

use crate::core::config;
use crate::core::utils::format_megabytes;
use crate::download::error::DeliveryError;

/// Uploads a local file and returns the host's response text.
#[async_trait]
pub trait HostUploader: Send + Sync {
    async fn upload(&self, path: &Path) -> Result<String, DeliveryError>;
}

/// `HostUploader` for a PUT-style object store.
#[derive(Debug, Clone)]
pub struct ObjectStoreUploader {
    client: Client,
    endpoint: Url,
}

impl ObjectStoreUploader {
    /// Builds an uploader with the configured request timeout.
    pub fn new(endpoint: &str) -> Result<Self, DeliveryError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| DeliveryError::UploadFailed(format!("invalid upload endpoint '{}': {}", endpoint, e)))?;
        if endpoint.cannot_be_a_base() {
            return Err(DeliveryError::UploadFailed(format!(
                "upload endpoint '{}' cannot take a path",
                endpoint
            )));
        }

        let client = Client::builder()
            .timeout(config::upload::timeout())
            .build()
            .map_err(|e| DeliveryError::UploadFailed(format!("HTTP client build failed: {}", e)))?;

        Ok(Self { client, endpoint })
    }

    /// Uploader for `UPLOAD_ENDPOINT` (transfer.sh by default).
    pub fn from_env() -> Result<Self, DeliveryError> {
        Self::new(config::upload::ENDPOINT.as_str())
    }

    /// `<endpoint>/<basename>`, with the name percent-encoded as one path segment.
    pub fn target_url(&self, file_name: &str) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(file_name);
        }
        url
    }
}

#[async_trait]
impl HostUploader for ObjectStoreUploader {
    async fn upload(&self, path: &Path) -> Result<String, DeliveryError> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| DeliveryError::UploadFailed(format!("no file name in {}", path.display())))?;

        let file = fs_err::tokio::File::open(path)
            .await
            .map_err(|e| DeliveryError::FileMissing(e.to_string()))?;
        let size = file
            .metadata()
            .await
            .map_err(|e| DeliveryError::FileMissing(e.to_string()))?
            .len();

        let url = self.target_url(file_name);
        log::info!("Uploading {} ({}) to {}", path.display(), format_megabytes(size), url);

        let body = Body::wrap_stream(ReaderStream::new(file));
        let response = self
            .client
            .put(url)
            .header(reqwest::header::CONTENT_LENGTH, size)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DeliveryError::UploadFailed(format!(
                        "timed out after {}s",
                        config::upload::REQUEST_TIMEOUT_SECS
                    ))
                } else {
                    DeliveryError::UploadFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !matches!(status, StatusCode::OK | StatusCode::CREATED) {
            log::warn!("File host rejected {}: {}", file_name, status);
            return Err(DeliveryError::UploadFailed(format!("host answered {}", status)));
        }

        let text = response
            .text()
            .await
            .map_err(|e| DeliveryError::UploadFailed(format!("failed to read host response: {}", e)))?;
        let link = text.trim();
        if link.is_empty() {
            return Err(DeliveryError::UploadFailed("host returned an empty body".to_string()));
        }

        log::info!("File host returned {:?} for {}", link, file_name);
        Ok(link.to_string())
    }
}
