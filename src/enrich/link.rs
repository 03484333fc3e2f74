use url::Url;

use crate::queue::item::PLACEHOLDER_TITLE;

/// Hosts accepted as video links.
pub const VIDEO_HOSTS: &[&str] = &["youtube.com", "youtu.be"];

/// Loose check used to reject obviously foreign links before queuing.
pub fn is_video_link(link: &str) -> bool {
    let link = link.trim();
    !link.is_empty() && VIDEO_HOSTS.iter().any(|h| link.contains(h))
}

/// Video id from `youtu.be/<id>` or `...watch?v=<id>` links.
///
/// Links that do not parse as URLs fall back to whatever follows `v=`.
pub fn extract_video_id(link: &str) -> Option<String> {
    let link = link.trim();
    let id = match Url::parse(link) {
        Ok(url) => {
            let host = url.host_str().unwrap_or_default();
            if host.ends_with("youtu.be") {
                url.path_segments()
                    .and_then(|mut segments| segments.next())
                    .map(str::to_string)
            } else {
                url.query_pairs()
                    .find(|(key, _)| key == "v")
                    .map(|(_, value)| value.into_owned())
            }
        }
        Err(_) => link
            .split_once("v=")
            .map(|(_, rest)| rest.split('&').next().unwrap_or_default().to_string()),
    };
    id.filter(|id| !id.is_empty())
}

/// Deterministic title for a link whose real title could not be fetched.
pub fn fallback_title(link: &str) -> String {
    extract_video_id(link).unwrap_or_else(|| PLACEHOLDER_TITLE.to_string())
}
