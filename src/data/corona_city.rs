//! data.go.kr adapter for per-region (sido) infection statistics
//!
//! Same envelope family as the nationwide service; one row per region per
//! reference day. Region names arrive in Korean in `gubun`.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{fetch_json, FetchError, GovEnvelope, SourceAdapter};

/// Base URL for the per-region infection-state service
const CORONA_CITY_URL: &str =
    "http://openapi.data.go.kr/openapi/service/rest/Covid19/getCovid19SidoInfStateJson";

/// Rows requested per refresh (17 regions plus the nationwide total row)
const NUM_OF_ROWS: u32 = 20;

/// Dataset key for the per-region statistics collection
pub const DATASET_KEY: &str = "corona_city";

/// Infection statistics for one region, as stored and served
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoronaCityRecord {
    /// Korean region name (e.g. "서울")
    pub region: String,
    /// Romanized region name, when published
    pub region_en: Option<String>,
    /// Cumulative confirmed cases
    pub confirmed: i64,
    /// Increase versus the previous day
    pub daily_increase: i64,
    /// Cumulative deaths
    pub deaths: i64,
    /// Reference day as published (e.g. "2021년 08월 23일 00시")
    pub std_day: String,
}

/// Adapter fetching per-region statistics from data.go.kr
#[derive(Debug, Clone)]
pub struct CoronaCityAdapter {
    http: Client,
    service_key: String,
    base_url: String,
}

impl CoronaCityAdapter {
    /// Creates a new adapter with the given HTTP client and service key
    pub fn new(http: Client, service_key: String) -> Self {
        Self {
            http,
            service_key,
            base_url: CORONA_CITY_URL.to_string(),
        }
    }
}

#[async_trait]
impl SourceAdapter for CoronaCityAdapter {
    type Record = CoronaCityRecord;

    fn dataset_key(&self) -> &'static str {
        DATASET_KEY
    }

    async fn fetch(&self) -> Result<Vec<CoronaCityRecord>, FetchError> {
        let today = Utc::now().date_naive().format("%Y%m%d").to_string();
        let request = self.http.get(&self.base_url).query(&[
            ("ServiceKey", self.service_key.as_str()),
            ("pageNo", "1"),
            ("numOfRows", &NUM_OF_ROWS.to_string()),
            ("startCreateDt", today.as_str()),
            ("endCreateDt", today.as_str()),
        ]);
        let envelope: GovEnvelope<CityItem> = fetch_json(request).await?;
        Ok(envelope.into_items().into_iter().map(map_city_row).collect())
    }
}

fn map_city_row(item: CityItem) -> CoronaCityRecord {
    CoronaCityRecord {
        region: item.gubun,
        region_en: item.gubun_en,
        confirmed: item.def_cnt,
        daily_increase: item.inc_dec,
        deaths: item.death_cnt,
        std_day: item.std_day,
    }
}

/// Raw row of the per-region service
#[derive(Debug, Deserialize)]
struct CityItem {
    gubun: String,
    #[serde(rename = "gubunEn", default)]
    gubun_en: Option<String>,
    #[serde(rename = "defCnt")]
    def_cnt: i64,
    #[serde(rename = "incDec")]
    inc_dec: i64,
    #[serde(rename = "deathCnt")]
    death_cnt: i64,
    #[serde(rename = "stdDay")]
    std_day: String,
}
