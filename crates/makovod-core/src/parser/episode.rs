//! Episode page parser
//!
//! Playback identifiers live in the Next.js page-data script.

use scraper::{Html, Selector};
use serde_json::Value;

use crate::error::{MakoError, Result};
use crate::types::EpisodeDetails;

/// Extracts the playlist identifiers from an episode page
///
/// Reads `props.pageProps.data.vod` from `script#__NEXT_DATA__`.
///
/// # Errors
/// - `ParseError` if the script is absent or not valid JSON
/// - `MissingField` if any identifier is absent or empty
pub fn parse_episode_details(html: &str) -> Result<EpisodeDetails> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("script#__NEXT_DATA__")
        .map_err(|e| MakoError::ParseError(format!("Invalid selector: {:?}", e)))?;

    let script = document
        .select(&selector)
        .next()
        .ok_or_else(|| MakoError::ParseError("no __NEXT_DATA__ script".to_string()))?;
    let raw: String = script.text().collect();

    let data: Value = serde_json::from_str(raw.trim())
        .map_err(|e| MakoError::ParseError(format!("__NEXT_DATA__: {}", e)))?;
    let vod = data
        .pointer("/props/pageProps/data/vod")
        .ok_or_else(|| MakoError::MissingField("props.pageProps.data.vod".to_string()))?;

    Ok(EpisodeDetails {
        vcm_id: identifier(vod, "itemVcmId")?,
        gallery_channel_id: identifier(vod, "galleryChannelId")?,
        video_channel_id: identifier(vod, "channelId")?,
    })
}

/// Identifiers arrive as strings or numbers depending on the page
fn identifier(vod: &Value, key: &str) -> Result<String> {
    let value = match vod.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };

    if value.is_empty() {
        Err(MakoError::MissingField(format!("vod.{}", key)))
    } else {
        Ok(value)
    }
}
