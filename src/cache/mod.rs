//! The cache refresh manager: staleness-gated, snapshot-consistent reads

pub mod manager;

pub use manager::{CacheError, Page, Query, RefreshManager, MAX_PAGE_COUNT};
