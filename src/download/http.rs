use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, REFERER};
use reqwest::Client;
use tracing::warn;

use crate::app::{HarvestError, Result};
use crate::download::{DownloadConfig, ImageSource};

pub struct HttpImageSource {
    client: Client,
}

impl HttpImageSource {
    pub fn new(config: &DownloadConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .gzip(true)
            .brotli(true)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self { client })
    }
}

/// Origin of `url`, used as referer when no job page is known.
fn origin(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    Some(parsed.origin().ascii_serialization())
}

#[async_trait]
impl ImageSource for HttpImageSource {
    async fn fetch(&self, url: &str, referer: Option<&str>) -> Result<Vec<u8>> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("image/avif,image/webp,image/apng,image/*,*/*;q=0.8"),
        );
        let referer = referer.map(str::to_string).or_else(|| origin(url));
        if let Some(value) = referer.and_then(|r| HeaderValue::from_str(&r).ok()) {
            headers.insert(REFERER, value);
        }

        let response = self.client.get(url).headers(headers).send().await?;
        response.error_for_status_ref()?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !content_type.starts_with("image/") && content_type != "application/octet-stream" {
            warn!("{} answered with {:?}, saving anyway", url, content_type);
        }

        let body = response.bytes().await?.to_vec();
        if body.is_empty() {
            return Err(HarvestError::Other(format!("{} returned an empty body", url)));
        }
        Ok(body)
    }
}
