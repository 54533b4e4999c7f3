//! Application context: explicit wiring of stores, adapters, and managers
//!
//! The context opens both stores once at startup and hands out one refresh
//! manager per dataset; adapter construction is the point where a dataset's
//! API key is actually required.

use anyhow::Result;
use reqwest::Client;

use crate::cache::RefreshManager;
use crate::config::Config;
use crate::data::{
    CoronaCityAdapter, CoronaStateAdapter, NewsAdapter, SourceAdapter, VaccineAdapter,
    WeatherAdapter,
};
use crate::store::{DatasetStore, MetadataStore, StoreError};

/// Shared state for one process: configuration, stores, HTTP client
pub struct AppContext {
    config: Config,
    metadata: MetadataStore,
    datasets: DatasetStore,
    http: Client,
}

impl AppContext {
    /// Opens the stores under the configured data directory
    pub fn new(config: Config) -> Result<Self, StoreError> {
        let metadata = MetadataStore::open(&config.data_dir)?;
        let datasets = DatasetStore::open(&config.data_dir)?;
        Ok(Self {
            config,
            metadata,
            datasets,
            http: Client::new(),
        })
    }

    fn manager<A: SourceAdapter>(&self, adapter: A) -> RefreshManager<A> {
        RefreshManager::new(
            adapter,
            self.metadata.clone(),
            self.datasets.clone(),
            self.config.ttl,
        )
    }

    /// Manager for the per-city weather dataset
    pub fn weather(&self) -> Result<RefreshManager<WeatherAdapter>> {
        let key = self.config.require_owm_key()?.to_string();
        Ok(self.manager(WeatherAdapter::new(self.http.clone(), key)))
    }

    /// Manager for the pandemic news dataset
    pub fn news(&self) -> Result<RefreshManager<NewsAdapter>> {
        let (id, secret) = self.config.require_naver_keys()?;
        let (id, secret) = (id.to_string(), secret.to_string());
        Ok(self.manager(NewsAdapter::new(self.http.clone(), id, secret)))
    }

    /// Manager for the nationwide infection-statistics dataset
    pub fn corona_state(&self) -> Result<RefreshManager<CoronaStateAdapter>> {
        let key = self.config.require_data_go_kr_key()?.to_string();
        Ok(self.manager(CoronaStateAdapter::new(self.http.clone(), key)))
    }

    /// Manager for the per-region infection-statistics dataset
    pub fn corona_city(&self) -> Result<RefreshManager<CoronaCityAdapter>> {
        let key = self.config.require_data_go_kr_key()?.to_string();
        Ok(self.manager(CoronaCityAdapter::new(self.http.clone(), key)))
    }

    /// Manager for the vaccination-center dataset
    pub fn vaccine(&self) -> Result<RefreshManager<VaccineAdapter>> {
        let key = self.config.require_data_go_kr_key()?.to_string();
        Ok(self.manager(VaccineAdapter::new(self.http.clone(), key)))
    }
}
