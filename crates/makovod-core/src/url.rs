//! URL helper functions for mako.co.il
//!
//! Builds the site's fixed endpoints and does the link arithmetic the
//! extraction engine and playback resolver need.

use ::url::Url;

use crate::error::{MakoError, Result};
use crate::types::EpisodeDetails;

/// Builds the show index URL
///
/// # Example
/// ```
/// use makovod_core::url::build_index_url;
/// let url = build_index_url("https://www.mako.co.il");
/// assert_eq!(url, "https://www.mako.co.il/mako-vod-index");
/// ```
pub fn build_index_url(base: &str) -> String {
    format!("{}/mako-vod-index", base.trim_end_matches('/'))
}

/// Builds the AJAX playlist URL for an episode
///
/// # Example
/// ```
/// use makovod_core::EpisodeDetails;
/// use makovod_core::url::build_playlist_url;
/// let details = EpisodeDetails {
///     vcm_id: "abc".to_string(),
///     gallery_channel_id: "g1".to_string(),
///     video_channel_id: "v1".to_string(),
/// };
/// assert_eq!(
///     build_playlist_url("https://www.mako.co.il", &details),
///     "https://www.mako.co.il/AjaxPage?jspName=playlist12.jsp&vcmid=abc&videoChannelId=v1&galleryChannelId=g1&consumer=responsive"
/// );
/// ```
pub fn build_playlist_url(base: &str, details: &EpisodeDetails) -> String {
    format!(
        "{}/AjaxPage?jspName=playlist12.jsp&vcmid={}&videoChannelId={}&galleryChannelId={}&consumer=responsive",
        base.trim_end_matches('/'),
        urlencoding::encode(&details.vcm_id),
        urlencoding::encode(&details.video_channel_id),
        urlencoding::encode(&details.gallery_channel_id),
    )
}

/// Resolves `href` against `base` the way a browser would
///
/// Returns `None` if the base is not an absolute URL or the join fails.
pub fn resolve_url(base: &str, href: &str) -> Option<String> {
    let base = Url::parse(base).ok()?;
    base.join(href).ok().map(String::from)
}

/// Path component of an absolute URL (no query, no fragment)
///
/// # Errors
/// Returns `InvalidUrl` if `url` does not parse.
pub fn url_path(url: &str) -> Result<String> {
    Url::parse(url)
        .map(|u| u.path().to_string())
        .map_err(|e| MakoError::InvalidUrl(format!("{}: {}", url, e)))
}

/// Appends an entitlement ticket as a query component
///
/// # Example
/// ```
/// use makovod_core::url::append_ticket;
/// assert_eq!(append_ticket("https://cdn/a.m3u8", "t=1"), "https://cdn/a.m3u8?t=1");
/// assert_eq!(append_ticket("https://cdn/a.m3u8?x=2", "t=1"), "https://cdn/a.m3u8?x=2&t=1");
/// ```
pub fn append_ticket(url: &str, ticket: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}{}", url, separator, ticket)
}
