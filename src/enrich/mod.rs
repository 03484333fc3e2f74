//! Best-effort titles for submitted links.
//!
//! Sources are tried in rank order, each under its own time budget; the first
//! title wins. When every source fails the title is derived from the link itself,
//! so enrichment can lower the quality of an item but never lose it.

pub mod link;
pub mod oembed;

use std::time::Duration;

use async_trait::async_trait;

pub use link::{extract_video_id, fallback_title, is_video_link};
pub use oembed::OEmbedSource;

pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum EnrichError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider answered HTTP {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// One way of finding a human-readable title for a link.
#[async_trait]
pub trait TitleSource: Send + Sync {
    fn name(&self) -> &'static str;
    async fn title(&self, link: &str) -> Result<String, EnrichError>;
}

/// Outcome of [`Enricher::enrich`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrichment {
    pub title: String,
    /// True when a source supplied the title; false for the link-derived fallback.
    pub enriched: bool,
}

pub struct Enricher {
    sources: Vec<Box<dyn TitleSource>>,
    attempt_timeout: Duration,
}

impl Enricher {
    pub fn new(sources: Vec<Box<dyn TitleSource>>, attempt_timeout: Duration) -> Self {
        Self {
            sources,
            attempt_timeout,
        }
    }

    /// No sources: every link gets its fallback title.
    pub fn offline() -> Self {
        Self::new(Vec::new(), DEFAULT_ATTEMPT_TIMEOUT)
    }

    /// YouTube oEmbed first, then noembed.com, sharing one HTTP client.
    pub fn online(attempt_timeout: Duration) -> Result<Self, EnrichError> {
        let client = reqwest::Client::builder()
            .user_agent(oembed::USER_AGENT)
            .timeout(attempt_timeout)
            .build()?;
        Ok(Self::new(
            vec![
                Box::new(OEmbedSource::youtube(client.clone(), attempt_timeout)),
                Box::new(OEmbedSource::noembed(client, attempt_timeout)),
            ],
            attempt_timeout,
        ))
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub async fn enrich(&self, link: &str) -> Enrichment {
        for source in &self.sources {
            let attempt = tokio::time::timeout(self.attempt_timeout, source.title(link)).await;
            match attempt.unwrap_or(Err(EnrichError::Timeout(self.attempt_timeout))) {
                Ok(title) => {
                    tracing::debug!("{} titled {} as \"{}\"", source.name(), link, title);
                    return Enrichment {
                        title,
                        enriched: true,
                    };
                }
                Err(e) => tracing::warn!("{} could not title {}: {}", source.name(), link, e),
            }
        }
        Enrichment {
            title: fallback_title(link),
            enriched: false,
        }
    }
}

impl std::fmt::Debug for Enricher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Enricher")
            .field("sources", &self.source_names())
            .field("attempt_timeout", &self.attempt_timeout)
            .finish()
    }
}
