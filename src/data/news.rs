//! Naver news-search adapter for pandemic headlines
//!
//! One bulk call per refresh: fixed query "코로나", 100 items sorted by
//! relevance. Authentication rides in the `X-Naver-Client-Id` /
//! `X-Naver-Client-Secret` headers; the payload nests its items in a flat
//! `items` envelope.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{fetch_json, FetchError, SourceAdapter};

/// Base URL for the Naver news search API
const NAVER_NEWS_URL: &str = "https://openapi.naver.com/v1/search/news.json";

/// Fixed search term the companion app shows news for
const SEARCH_QUERY: &str = "코로나";

/// Items requested per refresh (the API maximum)
const SEARCH_DISPLAY: u32 = 100;

/// Dataset key for the news collection
pub const DATASET_KEY: &str = "news";

/// One news article, as stored and served
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsRecord {
    /// Headline (may contain the API's highlight markup)
    pub title: String,
    /// Link to the publisher's own page
    pub original_link: String,
    /// Link to the Naver news page
    pub link: String,
    /// Article summary snippet
    pub description: String,
    /// Publication date as given by the API (RFC 2822)
    pub pub_date: String,
}

/// Adapter fetching pandemic news from the Naver search API
#[derive(Debug, Clone)]
pub struct NewsAdapter {
    http: Client,
    client_id: String,
    client_secret: String,
    base_url: String,
}

impl NewsAdapter {
    /// Creates a new adapter with the given HTTP client and API credentials
    pub fn new(http: Client, client_id: String, client_secret: String) -> Self {
        Self {
            http,
            client_id,
            client_secret,
            base_url: NAVER_NEWS_URL.to_string(),
        }
    }
}

#[async_trait]
impl SourceAdapter for NewsAdapter {
    type Record = NewsRecord;

    fn dataset_key(&self) -> &'static str {
        DATASET_KEY
    }

    async fn fetch(&self) -> Result<Vec<NewsRecord>, FetchError> {
        let request = self
            .http
            .get(&self.base_url)
            .header("X-Naver-Client-Id", &self.client_id)
            .header("X-Naver-Client-Secret", &self.client_secret)
            .query(&[
                ("query", SEARCH_QUERY),
                ("display", &SEARCH_DISPLAY.to_string()),
                ("sort", "sim"),
            ]);
        let response: NaverNewsResponse = fetch_json(request).await?;
        Ok(response.items.into_iter().map(map_article).collect())
    }
}

fn map_article(item: NaverNewsItem) -> NewsRecord {
    NewsRecord {
        title: item.title,
        original_link: item.originallink,
        link: item.link,
        description: item.description,
        pub_date: item.pub_date,
    }
}

/// Naver news search response envelope
#[derive(Debug, Deserialize)]
struct NaverNewsResponse {
    #[serde(default)]
    items: Vec<NaverNewsItem>,
}

#[derive(Debug, Deserialize)]
struct NaverNewsItem {
    title: String,
    originallink: String,
    link: String,
    description: String,
    #[serde(rename = "pubDate")]
    pub_date: String,
}
