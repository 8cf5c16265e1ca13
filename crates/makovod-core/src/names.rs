//! Show-name refresh policy
//!
//! Index pages carry unreliable titles, so each show's name is fetched
//! from its own page and remembered in the [`NameCache`]. This module
//! decides which shows need a fetch, applies cached names, and persists
//! progress.

use std::future::Future;
use std::pin::pin;

use tracing::{info, warn};

use crate::cache::{CacheStore, NameCache, now_secs};
use crate::types::CatalogItem;

/// Anything that can look up a show's canonical name by URL
pub trait ShowNameSource {
    /// `None` when the name could not be obtained; never fatal
    fn fetch_show_name(&self, url: &str) -> impl Future<Output = Option<String>>;
}

/// Caller-supplied knobs for a refresh run
#[derive(Debug, Clone)]
pub struct NameRefreshOptions {
    /// Use whatever the cache holds, regardless of age, and fetch nothing
    pub skip_name_fetch: bool,
    /// Fetch at most this many names, in input order
    pub max_shows: Option<usize>,
    /// Save after this many fetches (the last fetch always saves)
    pub save_every: usize,
}

impl Default for NameRefreshOptions {
    fn default() -> Self {
        Self {
            skip_name_fetch: false,
            max_shows: None,
            save_every: 10,
        }
    }
}

/// What a refresh run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameRefreshReport {
    /// Shows named from the cache
    pub from_cache: usize,
    /// Names fetched successfully
    pub fetched: usize,
    /// Fetches that produced no name
    pub failed: usize,
    /// Shows left unfetched because of `max_shows`
    pub skipped: usize,
    /// The run was interrupted; progress so far was saved
    pub interrupted: bool,
}

/// Corrects show names in place using the cache and `source`
///
/// When `shutdown` resolves mid-batch the in-flight fetch is abandoned,
/// completed work is saved and the report is marked interrupted.
pub async fn refresh_show_names<S, F>(
    shows: &mut [CatalogItem],
    cache: &mut NameCache,
    store: &CacheStore,
    source: &S,
    options: &NameRefreshOptions,
    shutdown: F,
) -> NameRefreshReport
where
    S: ShowNameSource,
    F: Future<Output = ()>,
{
    let mut report = NameRefreshReport::default();

    if options.skip_name_fetch {
        report.from_cache = apply_cached(shows, cache);
        info!(from_cache = report.from_cache, "name fetch skipped, using cached names");
        return report;
    }

    let fresh = cache.is_fresh(now_secs());
    if fresh {
        report.from_cache = apply_cached(shows, cache);
        if report.from_cache > 0 {
            info!(count = report.from_cache, "using cached show names");
        }
    } else {
        info!("show name cache is stale, refetching all names");
    }

    let mut to_fetch: Vec<usize> = (0..shows.len())
        .filter(|&i| !(fresh && cache.get(&shows[i].url).is_some()))
        .collect();
    if to_fetch.is_empty() {
        info!("all show names already cached");
        return report;
    }
    if let Some(max) = options.max_shows
        && max < to_fetch.len()
    {
        report.skipped = to_fetch.len() - max;
        to_fetch.truncate(max);
    }

    let total = to_fetch.len();
    info!(total, "fetching show names");

    let mut shutdown = pin!(shutdown);
    let save_every = options.save_every.max(1);

    for (done, &index) in to_fetch.iter().enumerate() {
        let url = shows[index].url.clone();

        let fetched = tokio::select! {
            biased;
            _ = &mut shutdown => None,
            name = source.fetch_show_name(&url) => Some(name),
        };

        let Some(name) = fetched else {
            warn!(processed = done, total, "name fetch interrupted, saving progress");
            report.interrupted = true;
            persist(cache, store);
            return report;
        };

        match name {
            Some(name) => {
                info!(url = %url, name = %name, "found show name");
                cache.insert(&url, &name);
                shows[index].name = name;
                report.fetched += 1;
            }
            None => {
                warn!(url = %url, "could not fetch show name, keeping index title");
                report.failed += 1;
            }
        }

        let processed = done + 1;
        info!(processed, total, "show name progress");
        if processed % save_every == 0 || processed == total {
            persist(cache, store);
        }
    }

    report
}

fn apply_cached(shows: &mut [CatalogItem], cache: &NameCache) -> usize {
    let mut applied = 0;
    for show in shows.iter_mut() {
        if let Some(name) = cache.get(&show.url) {
            show.name = name.to_string();
            applied += 1;
        }
    }
    applied
}

/// Save failures are logged, never fatal
fn persist(cache: &mut NameCache, store: &CacheStore) {
    cache.touch(now_secs());
    if let Err(e) = store.save(cache) {
        warn!(path = %store.path().display(), error = %e, "failed to save show name cache");
    }
}
