use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::Client;
use url::Url;

use crate::config::RelayConfig;
use crate::domain::{DownloadRequest, RelayError};
use crate::utils::resolve_filename;

pub type Result<T> = std::result::Result<T, RelayError>;

/// An opened mirror response: resolved name, announced size and the body.
pub struct MirrorDownload {
    pub filename: String,
    /// Value of `Content-Length`, 0 when absent or unparsable
    pub total: u64,
    pub body: BoxStream<'static, Result<Bytes>>,
}

#[derive(Clone)]
pub struct MirrorClient {
    config: RelayConfig,
    client: Client,
}

impl MirrorClient {
    pub fn new(config: RelayConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// `<mirror_base>/d/<id>`; only purely numeric ids are accepted.
    pub fn download_url(&self, id: &str) -> Result<Url> {
        if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(RelayError::InvalidId(id.to_string()));
        }

        let raw = format!("{}/d/{}", self.config.mirror_base.trim_end_matches('/'), id);
        Url::parse(&raw).map_err(|e| RelayError::InvalidId(format!("{}: {}", raw, e)))
    }

    /// Sends the GET and hands back the body as a stream of chunks.
    ///
    /// Any non-success status is an error; nothing is retried.
    pub async fn open_download(&self, request: &DownloadRequest) -> Result<MirrorDownload> {
        let url = self.download_url(&request.id)?;
        log::info!("Fetching beatmapset {} from {}", request.id, url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::Status(status));
        }

        let disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok());
        let filename = resolve_filename(disposition, &request.fallback_name, &request.id);
        let total = response.content_length().unwrap_or(0);

        let body = response
            .bytes_stream()
            .map_err(|e| RelayError::Stream(e.to_string()))
            .boxed();

        Ok(MirrorDownload {
            filename,
            total,
            body,
        })
    }
}
