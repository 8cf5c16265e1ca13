//! mako.co.il VOD Core Library
//!
//! Resolves a playable stream URL for an episode of a show on mako.co.il.
//!
//! # Overview
//!
//! This crate provides:
//! - A throttled HTTP client with bounded retries
//! - A selector-driven extraction engine for show, season and episode pages
//! - A persisted show-name cache with a freshness policy
//! - The two-stage encrypted playback handshake (playlist, entitlement)
//!
//! # Example
//!
//! ```no_run
//! use makovod_core::{MakoScraper, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let scraper = MakoScraper::new()?;
//!
//!     let shows = scraper.shows().await;
//!     let Some(show) = shows.first() else { return Ok(()) };
//!
//!     let episodes = scraper.episodes(&show.url).await;
//!     if let Some(episode) = episodes.first() {
//!         let playback = scraper.resolve_playback(&episode.url).await?;
//!         println!("{}", playback.url);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Tickets
//!
//! Stream URLs normally carry an entitlement ticket. If the ticket
//! handshake fails the URL is still returned with `ticketed: false`;
//! whether the CDN serves it is up to the origin.

pub mod cache;
mod client;
pub mod crypto;
mod error;
pub mod names;
pub mod parser;
mod resolver;
mod scraper;
mod types;
pub mod url;

// Re-export client types
pub use client::{ClientConfig, MakoClient, Throttle};

// Re-export error types
pub use error::{MakoError, Result};

// Re-export cache and name policy
pub use cache::{CACHE_TTL, CacheStore, NameCache};
pub use names::{NameRefreshOptions, NameRefreshReport, ShowNameSource, refresh_show_names};

// Re-export parser functions
pub use parser::{extract_items, parse_episode_details, parse_show_name};

// Re-export playback resolution
pub use resolver::{decode_entitlement, decode_playlist, entitlement_payload, resolve_playback};

// Re-export main scraper API
pub use scraper::{Chooser, MakoScraper, Navigation, Stage};

// Re-export data types
pub use types::{CatalogItem, ContentType, EpisodeDetails, PlaybackUrl};
