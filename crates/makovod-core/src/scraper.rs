//! Main scraper API for mako.co.il
//!
//! Combines the HTTP client, the catalog parsers, the show-name policy
//! and the playback resolver, and drives the show -> season -> episode
//! navigation.

use std::fmt;
use std::future::Future;

use tracing::{info, warn};

use crate::cache::{CacheStore, NameCache};
use crate::client::{ClientConfig, MakoClient};
use crate::error::Result;
use crate::names::{NameRefreshOptions, NameRefreshReport, ShowNameSource, refresh_show_names};
use crate::parser::{extract_items, parse_show_name};
use crate::resolver::resolve_playback;
use crate::types::{CatalogItem, ContentType, PlaybackUrl};
use crate::url::build_index_url;

/// Main scraper API for mako.co.il
///
/// Fetch-and-parse methods never fail: any error is logged and reported
/// as an empty result, so callers treat "nothing found" uniformly.
pub struct MakoScraper {
    client: MakoClient,
}

impl MakoScraper {
    /// Create a new scraper with default configuration
    ///
    /// # Errors
    /// Returns error if HTTP client initialization fails
    pub fn new() -> Result<Self> {
        let client = MakoClient::new()?;
        Ok(Self { client })
    }

    /// Create a new scraper with custom client configuration
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let client = MakoClient::with_config(config)?;
        Ok(Self { client })
    }

    /// Fetch `url` and extract items of `content_type` from it
    ///
    /// # Returns
    /// Extracted items, empty if the fetch failed or nothing matched
    pub async fn fetch_items(&self, url: &str, content_type: ContentType) -> Vec<CatalogItem> {
        let html = match self.client.get(url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(url, %content_type, error = %e, "catalog fetch failed");
                return Vec::new();
            }
        };

        let items = extract_items(&html, content_type, url, self.client.base_url());
        info!(url, %content_type, count = items.len(), "catalog items found");
        items
    }

    /// Shows listed on the VOD index, with index-page titles
    pub async fn shows(&self) -> Vec<CatalogItem> {
        let index = build_index_url(self.client.base_url());
        self.fetch_items(&index, ContentType::Shows).await
    }

    /// Shows with names corrected from the cache and per-show pages
    ///
    /// Loads the cache from `store`, refreshes names, and persists
    /// progress. `shutdown` interrupts the name batch (see
    /// [`refresh_show_names`]).
    pub async fn shows_with_names<F>(
        &self,
        store: &CacheStore,
        options: &NameRefreshOptions,
        shutdown: F,
    ) -> (Vec<CatalogItem>, NameRefreshReport)
    where
        F: Future<Output = ()>,
    {
        let mut shows = self.shows().await;
        if shows.is_empty() {
            return (shows, NameRefreshReport::default());
        }

        let mut cache: NameCache = store.load();
        let report =
            refresh_show_names(&mut shows, &mut cache, store, self, options, shutdown).await;
        (shows, report)
    }

    /// Seasons listed on a show page
    pub async fn seasons(&self, show_url: &str) -> Vec<CatalogItem> {
        self.fetch_items(show_url, ContentType::Seasons).await
    }

    /// Episodes listed on a season (or season-less show) page
    pub async fn episodes(&self, page_url: &str) -> Vec<CatalogItem> {
        self.fetch_items(page_url, ContentType::Episodes).await
    }

    /// Resolve an episode page to a playable stream URL
    ///
    /// # Errors
    /// See [`resolve_playback`]
    pub async fn resolve_playback(&self, episode_url: &str) -> Result<PlaybackUrl> {
        resolve_playback(&self.client, episode_url).await
    }

    /// Walk shows -> seasons -> episodes with `chooser` and resolve the
    /// chosen episode
    ///
    /// Shows without a season tier go straight to their episode list.
    pub async fn navigate<C: Chooser>(&self, shows: &[CatalogItem], chooser: &mut C) -> Navigation {
        if shows.is_empty() {
            return Navigation::NothingFound(Stage::Show);
        }
        let Some(show) = pick(chooser, Stage::Show, shows) else {
            return Navigation::Cancelled(Stage::Show);
        };

        let seasons = self.seasons(&show.url).await;
        let episodes = if seasons.is_empty() {
            info!(show = %show.name, "no season tier, listing episodes from show page");
            self.episodes(&show.url).await
        } else {
            let Some(season) = pick(chooser, Stage::Season, &seasons) else {
                return Navigation::Cancelled(Stage::Season);
            };
            self.episodes(&season.url).await
        };

        if episodes.is_empty() {
            return Navigation::NothingFound(Stage::Episode);
        }
        let Some(episode) = pick(chooser, Stage::Episode, &episodes) else {
            return Navigation::Cancelled(Stage::Episode);
        };

        info!(episode = %episode.name, "resolving playback");
        match self.resolve_playback(&episode.url).await {
            Ok(playback) => Navigation::Resolved { episode, playback },
            Err(error) => {
                warn!(episode = %episode.name, error = %error, "playback resolution failed");
                Navigation::Failed {
                    episode,
                    reason: error.to_string(),
                }
            }
        }
    }
}

impl ShowNameSource for MakoScraper {
    fn fetch_show_name(&self, url: &str) -> impl Future<Output = Option<String>> {
        async move {
            let html = match self.client.get(url).await {
                Ok(html) => html,
                Err(e) => {
                    warn!(url, error = %e, "show page fetch failed");
                    return None;
                }
            };
            match parse_show_name(&html) {
                Ok(name) => Some(name),
                Err(e) => {
                    warn!(url, error = %e, "show name not found");
                    None
                }
            }
        }
    }
}

/// Navigation step a selection is made at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Show,
    Season,
    Episode,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Show => "show",
            Stage::Season => "season",
            Stage::Episode => "episode",
        };
        f.write_str(name)
    }
}

/// Picks one item from a non-empty list
///
/// Returning `None` (or an out-of-range index) cancels navigation.
pub trait Chooser {
    fn choose(&mut self, stage: Stage, items: &[CatalogItem]) -> Option<usize>;
}

/// How a navigation run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Resolved {
        episode: CatalogItem,
        playback: PlaybackUrl,
    },
    /// A listing came back empty; nothing to resolve
    NothingFound(Stage),
    /// The chooser declined to pick
    Cancelled(Stage),
    /// An episode was chosen but no stream URL could be obtained
    Failed { episode: CatalogItem, reason: String },
}

fn pick<C: Chooser>(chooser: &mut C, stage: Stage, items: &[CatalogItem]) -> Option<CatalogItem> {
    let index = chooser.choose(stage, items)?;
    items.get(index).cloned()
}
