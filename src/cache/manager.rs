//! Generic cache refresh manager
//!
//! One manager per dataset, all sharing the same protocol. A read first
//! passes the staleness gate (`last_update + TTL < now`), refreshing
//! synchronously when the snapshot is too old, then serves records from
//! exactly one snapshot of the dataset store.
//!
//! Deliberately unmitigated: concurrent reads that observe staleness at the
//! same time each trigger their own refresh. Both upstream fetches happen and
//! the later metadata write wins. Every caller still gets a single-timestamp
//! snapshot, because the read re-queries the metadata pointer after its own
//! refresh and filters on that stamp alone.

use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info};

use crate::data::{FetchError, SourceAdapter};
use crate::store::{DatasetStore, MetadataStore, Stamped, StoreError};

/// Server-side cap on the page size a caller may request
pub const MAX_PAGE_COUNT: u32 = 100;

/// Errors surfaced by cached reads and refreshes
///
/// Store failures are never swallowed; both variants surface to the caller,
/// which maps them to a server error.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The upstream fetch failed; the metadata timestamp was not advanced
    #[error("upstream fetch failed: {0}")]
    Upstream(#[from] FetchError),

    /// A metadata or dataset store operation failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Pagination over the current snapshot, in snapshot order
#[derive(Debug, Clone, Copy)]
pub struct Page {
    page: u32,
    page_count: u32,
}

impl Page {
    /// Builds a page request, clamping `page_count` to [`MAX_PAGE_COUNT`]
    pub fn new(page: u32, page_count: u32) -> Self {
        Self {
            page,
            page_count: page_count.min(MAX_PAGE_COUNT),
        }
    }

    /// Records skipped before this page starts
    pub fn skip(&self) -> usize {
        if self.page <= 1 {
            0
        } else {
            // Page numbers come straight from the caller; the product can
            // exceed u32.
            (self.page as usize - 1).saturating_mul(self.page_count as usize)
        }
    }

    /// Records returned at most
    pub fn limit(&self) -> usize {
        self.page_count as usize
    }
}

/// A read query against the current snapshot
///
/// The filter runs per record; pagination applies after filtering, in
/// snapshot order.
pub struct Query<'a, T> {
    filter: Option<Box<dyn Fn(&T) -> bool + Send + Sync + 'a>>,
    page: Option<Page>,
}

impl<'a, T> Query<'a, T> {
    /// Every record of the current snapshot
    pub fn all() -> Self {
        Self {
            filter: None,
            page: None,
        }
    }

    /// Records of the current snapshot matching `filter`
    pub fn matching(filter: impl Fn(&T) -> bool + Send + Sync + 'a) -> Self {
        Self {
            filter: Some(Box::new(filter)),
            page: None,
        }
    }

    /// Restricts the result to one page
    pub fn paged(mut self, page: Page) -> Self {
        self.page = Some(page);
        self
    }
}

impl<T> Default for Query<'_, T> {
    fn default() -> Self {
        Self::all()
    }
}

/// The staleness gate: a snapshot older than the TTL must be refreshed
/// before it is read.
pub fn is_stale(last_update_ms: i64, ttl_ms: i64, now_ms: i64) -> bool {
    last_update_ms + ttl_ms < now_ms
}

/// Staleness-gated cache over one dataset
///
/// Constructed explicitly from its collaborators; holds no global state.
pub struct RefreshManager<A: SourceAdapter> {
    adapter: A,
    metadata: MetadataStore,
    datasets: DatasetStore,
    ttl_ms: i64,
}

impl<A: SourceAdapter> RefreshManager<A> {
    /// Creates a manager for the adapter's dataset with the given TTL
    pub fn new(adapter: A, metadata: MetadataStore, datasets: DatasetStore, ttl: Duration) -> Self {
        Self {
            adapter,
            metadata,
            datasets,
            ttl_ms: ttl.as_millis() as i64,
        }
    }

    fn metadata_key(&self) -> String {
        format!("{}_last_update", self.adapter.dataset_key())
    }

    /// Serves records from the current snapshot, refreshing first when the
    /// snapshot is stale.
    ///
    /// An empty result is valid and distinct from an error: it means the
    /// current snapshot holds no matching records (callers map it to a
    /// not-found response). A never-refreshed dataset reads as timestamp 0,
    /// which is always stale, so the first read triggers the first refresh.
    pub async fn get(&self, query: Query<'_, A::Record>) -> Result<Vec<Stamped<A::Record>>, CacheError> {
        let key = self.metadata_key();
        let mut last_update = self.metadata.get(&key)?.unwrap_or(0);

        let now = Utc::now().timestamp_millis();
        if is_stale(last_update, self.ttl_ms, now) {
            debug!(
                dataset = self.adapter.dataset_key(),
                last_update, "snapshot stale, refreshing before read"
            );
            self.refresh().await?;
            // Re-read the pointer the refresh just advanced. Filtering on the
            // pre-refresh timestamp would select the previous snapshot.
            last_update = self.metadata.get(&key)?.unwrap_or(0);
        }

        let mut records = self
            .datasets
            .query_snapshot::<A::Record>(self.adapter.dataset_key(), last_update)?;

        if let Some(filter) = &query.filter {
            records.retain(|stamped| filter(&stamped.record));
        }
        if let Some(page) = query.page {
            records = records
                .into_iter()
                .skip(page.skip())
                .take(page.limit())
                .collect();
        }

        Ok(records)
    }

    /// Fetches a fresh snapshot and advances the metadata pointer.
    ///
    /// The stamp is captured once before the fetch starts, so every record of
    /// the snapshot carries the same `last_update_time`. Stamps are strictly
    /// increasing per dataset: two cycles landing in the same millisecond
    /// would otherwise merge into one snapshot. When the whole fetch fails
    /// the pointer is not advanced and the previous snapshot stays current.
    /// Returns the new stamp.
    pub async fn refresh(&self) -> Result<i64, CacheError> {
        let now = Utc::now().timestamp_millis();
        let stamp = match self.metadata.get(&self.metadata_key())? {
            Some(previous) if previous >= now => previous + 1,
            _ => now,
        };
        let records = self.adapter.fetch().await?;

        info!(
            dataset = self.adapter.dataset_key(),
            stamp,
            count = records.len(),
            "refreshed dataset"
        );

        let stamped = records
            .into_iter()
            .map(|record| Stamped {
                last_update_time: stamp,
                record,
            })
            .collect();
        self.datasets
            .append_snapshot(self.adapter.dataset_key(), stamped)?;
        self.metadata.set(&self.metadata_key(), stamp)?;
        Ok(stamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: i64 = 6 * 60 * 60 * 1000; // 6 hours in ms

    #[test]
    fn test_gate_fresh_one_ms_before_boundary() {
        let last_update = 1_700_000_000_000;
        assert!(!is_stale(last_update, TTL, last_update + TTL - 1));
    }

    #[test]
    fn test_gate_fresh_exactly_at_boundary() {
        // stale means strictly past last_update + TTL
        let last_update = 1_700_000_000_000;
        assert!(!is_stale(last_update, TTL, last_update + TTL));
    }

    #[test]
    fn test_gate_stale_one_ms_past_boundary() {
        let last_update = 1_700_000_000_000;
        assert!(is_stale(last_update, TTL, last_update + TTL + 1));
    }

    #[test]
    fn test_gate_never_refreshed_is_always_stale() {
        assert!(is_stale(0, TTL, Utc::now().timestamp_millis()));
    }

    #[test]
    fn test_page_one_skips_nothing() {
        let page = Page::new(1, 10);
        assert_eq!(page.skip(), 0);
        assert_eq!(page.limit(), 10);
    }

    #[test]
    fn test_page_zero_behaves_like_page_one() {
        let page = Page::new(0, 10);
        assert_eq!(page.skip(), 0);
    }

    #[test]
    fn test_page_two_skips_one_page() {
        let page = Page::new(2, 10);
        assert_eq!(page.skip(), 10);
        assert_eq!(page.limit(), 10);
    }

    #[test]
    fn test_page_maximum_page_number_does_not_overflow() {
        let page = Page::new(u32::MAX, 100);
        assert_eq!(page.skip() as u64, (u32::MAX as u64 - 1) * 100);
    }

    #[test]
    fn test_page_count_clamped_to_cap() {
        let page = Page::new(2, 500);
        assert_eq!(page.limit(), MAX_PAGE_COUNT as usize);
        // Skip is computed from the clamped count too.
        assert_eq!(page.skip(), MAX_PAGE_COUNT as usize);
    }
}
