use serde::{Deserialize, Serialize};

/// Title shown when no better title could be found for an item.
pub const PLACEHOLDER_TITLE: &str = "Untitled video";

/// Source of a queued item. Unknown kinds from newer clients deserialize as `Other`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemKind {
    VideoLink,
    LibraryTrack,
    #[serde(other)]
    Other,
}

/// A single playable entry in the queue.
///
/// Items carry no unique key of their own: an item is identified by its position
/// in the queue together with these fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItem {
    pub kind: ItemKind,
    /// Source-specific id (YouTube video id, library item id). Absent for legacy bare-URL items.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    /// The link as submitted. Kept so the player can re-derive the id if needed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    /// Opaque cover handle; the player turns it into an image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_reference: Option<String>,
}

impl QueueItem {
    pub fn video_link(url: impl Into<String>, external_id: Option<String>, title: impl Into<String>) -> Self {
        Self {
            kind: ItemKind::VideoLink,
            external_id,
            source_url: Some(url.into()),
            title: title.into(),
            artist: None,
            cover_reference: None,
        }
    }

    pub fn library_track(
        external_id: impl Into<String>,
        title: Option<String>,
        artist: Option<String>,
        cover_reference: Option<String>,
    ) -> Self {
        Self {
            kind: ItemKind::LibraryTrack,
            external_id: Some(external_id.into()),
            source_url: None,
            title: title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| PLACEHOLDER_TITLE.to_string()),
            artist,
            cover_reference,
        }
    }
}
