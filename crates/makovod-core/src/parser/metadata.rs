//! Show name parser
//!
//! Show titles are only reliable in the schema.org block of the show's
//! own page, not on the index.

use scraper::{Html, Selector};
use serde_json::Value;

use crate::error::{MakoError, Result};

/// Parses the canonical series name from a show page
///
/// A page describing a single `TVSeason` yields its parent series name.
/// When the metadata lists more than one season, a season count is
/// appended.
///
/// # Errors
/// - `ParseError` if there is no JSON-LD block or it is not valid JSON
/// - `MissingField` if no name can be found
pub fn parse_show_name(html: &str) -> Result<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(r#"script[type="application/ld+json"]"#)
        .map_err(|e| MakoError::ParseError(format!("Invalid selector: {:?}", e)))?;

    let script = document
        .select(&selector)
        .next()
        .ok_or_else(|| MakoError::ParseError("no JSON-LD block".to_string()))?;
    let raw: String = script.text().collect();

    let data: Value = serde_json::from_str(raw.trim())
        .map_err(|e| MakoError::ParseError(format!("JSON-LD: {}", e)))?;

    series_name(&data)
}

fn series_name(data: &Value) -> Result<String> {
    let node = match (data.get("@type").and_then(Value::as_str), data.get("partOfTVSeries")) {
        (Some("TVSeason"), Some(series)) => series,
        _ => data,
    };

    let name = node
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| MakoError::MissingField("name".to_string()))?;

    let seasons = data
        .get("containsSeason")
        .and_then(Value::as_array)
        .map_or(0, Vec::len);

    if seasons > 1 {
        Ok(format!("{} ({} עונות)", name, seasons))
    } else {
        Ok(name.to_string())
    }
}
