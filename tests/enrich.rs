use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jukebox::enrich::{
    extract_video_id, fallback_title, is_video_link, EnrichError, Enricher, OEmbedSource, TitleSource,
};
use jukebox::queue::PLACEHOLDER_TITLE;

const WATCH: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

/// Answers with a fixed title, or fails with HTTP 500.
struct Fixed {
    name: &'static str,
    title: Option<&'static str>,
    calls: Arc<AtomicUsize>,
}

impl Fixed {
    fn ok(name: &'static str, title: &'static str) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (Self { name, title: Some(title), calls: calls.clone() }, calls)
    }

    fn failing(name: &'static str) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (Self { name, title: None, calls: calls.clone() }, calls)
    }
}

#[async_trait]
impl TitleSource for Fixed {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn title(&self, _link: &str) -> Result<String, EnrichError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.title.map(str::to_string).ok_or(EnrichError::Status(500))
    }
}

/// Never answers within any sane budget.
struct Stalled;

#[async_trait]
impl TitleSource for Stalled {
    fn name(&self) -> &'static str {
        "stalled"
    }

    async fn title(&self, _link: &str) -> Result<String, EnrichError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok("too late".to_string())
    }
}

// ── link parsing ──────────────────────────────────────────────────────────────

#[test]
fn watch_link_id() {
    assert_eq!(extract_video_id(WATCH).as_deref(), Some("dQw4w9WgXcQ"));
}

#[test]
fn watch_link_with_extra_params() {
    let link = "https://www.youtube.com/watch?list=PL123&v=abc123&t=42";
    assert_eq!(extract_video_id(link).as_deref(), Some("abc123"));
}

#[test]
fn short_link_id() {
    assert_eq!(extract_video_id("https://youtu.be/xyz789?t=10").as_deref(), Some("xyz789"));
}

#[test]
fn unparsable_link_falls_back_to_v_param() {
    assert_eq!(extract_video_id("youtube.com/watch?v=raw42&x=1").as_deref(), Some("raw42"));
}

#[test]
fn link_without_id() {
    assert_eq!(extract_video_id("https://www.youtube.com/feed/trending"), None);
}

#[test]
fn fallback_title_is_video_id() {
    assert_eq!(fallback_title(WATCH), "dQw4w9WgXcQ");
}

#[test]
fn fallback_title_without_id_is_placeholder() {
    assert_eq!(fallback_title("https://www.youtube.com/"), PLACEHOLDER_TITLE);
}

#[test]
fn video_link_check() {
    assert!(is_video_link(WATCH));
    assert!(is_video_link("https://youtu.be/abc"));
    assert!(!is_video_link("https://example.com/video"));
    assert!(!is_video_link("   "));
}

#[test]
fn oembed_request_url_encodes_link() {
    let source = OEmbedSource::youtube(reqwest::Client::new(), Duration::from_secs(1));
    let url = source.request_url(WATCH).unwrap();
    assert_eq!(url.host_str(), Some("www.youtube.com"));
    let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    assert!(pairs.contains(&("url".to_string(), WATCH.to_string())));
    assert!(pairs.contains(&("format".to_string(), "json".to_string())));
}

// ── enricher chain ────────────────────────────────────────────────────────────

#[tokio::test]
async fn first_success_wins() {
    let (first, first_calls) = Fixed::ok("first", "Never Gonna Give You Up");
    let (second, second_calls) = Fixed::ok("second", "other");
    let enricher = Enricher::new(vec![Box::new(first), Box::new(second)], Duration::from_secs(1));

    let result = enricher.enrich(WATCH).await;
    assert_eq!(result.title, "Never Gonna Give You Up");
    assert!(result.enriched);
    assert_eq!(first_calls.load(Ordering::SeqCst), 1);
    assert_eq!(second_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn failure_falls_through_to_next_source() {
    let (first, _) = Fixed::failing("first");
    let (second, second_calls) = Fixed::ok("second", "From Second");
    let enricher = Enricher::new(vec![Box::new(first), Box::new(second)], Duration::from_secs(1));

    let result = enricher.enrich(WATCH).await;
    assert_eq!(result.title, "From Second");
    assert!(result.enriched);
    assert_eq!(second_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn all_failing_yields_deterministic_fallback() {
    let (a, _) = Fixed::failing("a");
    let (b, _) = Fixed::failing("b");
    let enricher = Enricher::new(vec![Box::new(a), Box::new(b)], Duration::from_secs(1));

    let first = enricher.enrich(WATCH).await;
    let second = enricher.enrich(WATCH).await;
    assert_eq!(first.title, "dQw4w9WgXcQ");
    assert!(!first.enriched);
    assert_eq!(first, second);
}

#[tokio::test]
async fn stalled_source_is_cut_off() {
    let (after, _) = Fixed::ok("after", "Quick Title");
    let enricher = Enricher::new(vec![Box::new(Stalled), Box::new(after)], Duration::from_millis(50));

    let started = std::time::Instant::now();
    let result = enricher.enrich(WATCH).await;
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(result.title, "Quick Title");
}

#[tokio::test]
async fn offline_enricher_uses_fallback() {
    let result = Enricher::offline().enrich("https://youtu.be/short1").await;
    assert_eq!(result.title, "short1");
    assert!(!result.enriched);
}

#[test]
fn online_enricher_ranks_youtube_first() {
    let enricher = Enricher::online(Duration::from_secs(2)).unwrap();
    assert_eq!(enricher.source_names(), ["youtube-oembed", "noembed"]);
}
