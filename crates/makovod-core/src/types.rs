//! Core data types for the mako VOD core
//!
//! Catalog items flow from the extraction engine to the caller; the
//! payload types are the decrypted JSON documents of the playback
//! handshake.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A show, season or episode scraped from a catalog page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Absolute URL of the item's page
    pub url: String,

    /// Display name
    pub name: String,

    /// Episode identifier (episodes only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
}

impl CatalogItem {
    /// Deduplication key: the guid when known, otherwise the URL
    pub fn identity(&self) -> &str {
        self.guid.as_deref().unwrap_or(&self.url)
    }
}

/// The three kinds of catalog page the site serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    Shows,
    Seasons,
    Episodes,
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContentType::Shows => "shows",
            ContentType::Seasons => "seasons",
            ContentType::Episodes => "episodes",
        };
        f.write_str(name)
    }
}

/// Identifiers needed to request an episode's playlist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeDetails {
    pub vcm_id: String,
    pub gallery_channel_id: String,
    pub video_channel_id: String,
}

/// Decrypted playlist payload; only the first media URL matters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaylistDescriptor {
    #[serde(default)]
    pub media: Vec<MediaEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaEntry {
    #[serde(default)]
    pub url: Option<String>,
}

impl PlaylistDescriptor {
    pub fn first_url(&self) -> Option<&str> {
        self.media
            .first()
            .and_then(|m| m.url.as_deref())
            .filter(|u| !u.is_empty())
    }
}

/// Request body of the entitlement handshake, serialized compactly
#[derive(Debug, Serialize)]
pub struct EntitlementRequest<'a> {
    /// Path component of the playlist URL
    pub lp: &'a str,
    /// CDN name
    pub rv: &'a str,
}

/// Decrypted entitlement response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntitlementResponse {
    #[serde(default)]
    pub tickets: Vec<Ticket>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ticket {
    #[serde(default)]
    pub ticket: Option<String>,
}

impl EntitlementResponse {
    pub fn first_ticket(&self) -> Option<&str> {
        self.tickets
            .first()
            .and_then(|t| t.ticket.as_deref())
            .filter(|t| !t.is_empty())
    }
}

/// Final result of playback resolution
///
/// An unticketed URL is best-effort: the origin may refuse it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaybackUrl {
    pub url: String,
    pub ticketed: bool,
}
