//! Playback URL resolution
//!
//! Episode page -> identifiers -> encrypted playlist -> stream URL ->
//! encrypted entitlement handshake -> ticketed stream URL.
//!
//! Everything up to the stream URL is required. Once a stream URL exists,
//! failures in the entitlement handshake degrade to returning it without
//! a ticket.

use tracing::{debug, info, warn};

use crate::client::MakoClient;
use crate::crypto::{self, Keyset};
use crate::error::{MakoError, Result};
use crate::parser::parse_episode_details;
use crate::types::{EntitlementRequest, EntitlementResponse, PlaybackUrl, PlaylistDescriptor};
use crate::url::{append_ticket, build_playlist_url, url_path};

const CDN_NAME: &str = "AKAMAI";

/// Resolves an episode page URL to a playable stream URL
///
/// # Errors
/// - Transport errors fetching the episode page or the playlist
/// - `ParseError` / `MissingField` if the episode page lacks identifiers
///   or the playlist holds no media URL
/// - `CryptoError` if the playlist cannot be decrypted
pub async fn resolve_playback(client: &MakoClient, episode_url: &str) -> Result<PlaybackUrl> {
    let details = parse_episode_details(&client.get(episode_url).await?)?;
    debug!(?details, "episode details");

    let playlist_url = build_playlist_url(client.base_url(), &details);
    let body = client.get(&playlist_url).await?;
    let body = body.trim();
    if body.is_empty() {
        return Err(MakoError::ParseError("empty playlist response".to_string()));
    }

    let stream_url = decode_playlist(body)?;
    info!(url = %stream_url, "stream URL found");

    match fetch_ticket(client, &stream_url).await {
        Ok(Some(ticket)) => Ok(PlaybackUrl {
            url: append_ticket(&stream_url, &ticket),
            ticketed: true,
        }),
        Ok(None) => {
            warn!("entitlement response carried no ticket, returning unticketed URL");
            Ok(unticketed(stream_url))
        }
        Err(e) => {
            warn!(error = %e, "entitlement handshake failed, returning unticketed URL");
            Ok(unticketed(stream_url))
        }
    }
}

/// Decrypts the playlist body and returns its first media URL
pub fn decode_playlist(body: &str) -> Result<String> {
    let plain = crypto::decrypt(body, Keyset::Playlist)?;
    let playlist: PlaylistDescriptor = serde_json::from_str(&plain)
        .map_err(|e| MakoError::ParseError(format!("playlist: {}", e)))?;
    playlist
        .first_url()
        .map(str::to_string)
        .ok_or_else(|| MakoError::MissingField("media[0].url".to_string()))
}

/// Builds the encrypted entitlement request body for a stream URL
pub fn entitlement_payload(stream_url: &str) -> Result<String> {
    let path = url_path(stream_url)?;
    let request = serde_json::to_string(&EntitlementRequest {
        lp: &path,
        rv: CDN_NAME,
    })
    .map_err(|e| MakoError::ParseError(format!("entitlement request: {}", e)))?;
    Ok(crypto::encrypt(&request, Keyset::Entitlement))
}

/// Decrypts an entitlement response and returns its first ticket
pub fn decode_entitlement(body: &str) -> Result<Option<String>> {
    let plain = crypto::decrypt(body, Keyset::Entitlement)?;
    let response: EntitlementResponse = serde_json::from_str(&plain)
        .map_err(|e| MakoError::ParseError(format!("entitlement: {}", e)))?;
    Ok(response.first_ticket().map(str::to_string))
}

async fn fetch_ticket(client: &MakoClient, stream_url: &str) -> Result<Option<String>> {
    let payload = entitlement_payload(stream_url)?;
    let body = client.post_text(client.entitlement_url(), &payload).await?;
    decode_entitlement(body.trim())
}

fn unticketed(url: String) -> PlaybackUrl {
    PlaybackUrl {
        url,
        ticketed: false,
    }
}
