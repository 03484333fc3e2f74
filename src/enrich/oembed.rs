use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::enrich::{EnrichError, TitleSource};

/// YouTube's own oEmbed endpoint. Answers 401/404 for private, deleted or
/// embed-disabled videos.
pub const YOUTUBE_OEMBED: &str = "https://www.youtube.com/oembed";

/// noembed.com, a public oEmbed aggregator. Reports failures as 200 with an `error` field.
pub const NOEMBED: &str = "https://noembed.com/embed";

pub const USER_AGENT: &str = concat!("jukebox/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct OEmbedResponse {
    title: Option<String>,
    error: Option<String>,
}

/// Title lookup against an oEmbed provider.
#[derive(Debug, Clone)]
pub struct OEmbedSource {
    name: &'static str,
    endpoint: String,
    client: Client,
    timeout: Duration,
}

impl OEmbedSource {
    pub fn new(name: &'static str, endpoint: impl Into<String>, client: Client, timeout: Duration) -> Self {
        Self {
            name,
            endpoint: endpoint.into(),
            client,
            timeout,
        }
    }

    pub fn youtube(client: Client, timeout: Duration) -> Self {
        Self::new("youtube-oembed", YOUTUBE_OEMBED, client, timeout)
    }

    pub fn noembed(client: Client, timeout: Duration) -> Self {
        Self::new("noembed", NOEMBED, client, timeout)
    }

    /// Full request URL for `link`, query-encoded.
    pub fn request_url(&self, link: &str) -> Result<Url, EnrichError> {
        Url::parse_with_params(&self.endpoint, &[("url", link), ("format", "json")])
            .map_err(|e| EnrichError::Malformed(format!("bad endpoint {}: {}", self.endpoint, e)))
    }
}

#[async_trait]
impl TitleSource for OEmbedSource {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn title(&self, link: &str) -> Result<String, EnrichError> {
        let response = self
            .client
            .get(self.request_url(link)?)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EnrichError::Status(status.as_u16()));
        }

        let body: OEmbedResponse = response
            .json()
            .await
            .map_err(|e| EnrichError::Malformed(e.to_string()))?;

        if let Some(error) = body.error {
            return Err(EnrichError::Malformed(error));
        }
        body.title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| EnrichError::Malformed("response has no title".to_string()))
    }
}
