//! data.go.kr adapter for nationwide infection statistics
//!
//! Queries the Covid19 infection-state service for the last five days of
//! daily rows. The payload nests its rows at `response.body.items.item`.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{fetch_json, FetchError, GovEnvelope, SourceAdapter};

/// Base URL for the nationwide infection-state service
const CORONA_STATE_URL: &str =
    "http://openapi.data.go.kr/openapi/service/rest/Covid19/getCovid19InfStateJson";

/// Rows requested per refresh
const NUM_OF_ROWS: u32 = 50;

/// Days of history requested per refresh
const WINDOW_DAYS: i64 = 5;

/// Dataset key for the nationwide statistics collection
pub const DATASET_KEY: &str = "corona_state";

/// One day of nationwide infection statistics, as stored and served
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoronaStateRecord {
    /// Reference date (YYYYMMDD)
    pub state_dt: String,
    /// Reference time of day
    pub state_time: String,
    /// Cumulative confirmed cases
    pub decide_cnt: i64,
    /// Cumulative deaths
    pub death_cnt: i64,
    /// Patients currently under care, when published
    pub care_cnt: Option<i64>,
    /// Cumulative tests, when published
    pub acc_exam_cnt: Option<i64>,
}

/// Adapter fetching nationwide statistics from data.go.kr
#[derive(Debug, Clone)]
pub struct CoronaStateAdapter {
    http: Client,
    service_key: String,
    base_url: String,
}

impl CoronaStateAdapter {
    /// Creates a new adapter with the given HTTP client and service key
    pub fn new(http: Client, service_key: String) -> Self {
        Self {
            http,
            service_key,
            base_url: CORONA_STATE_URL.to_string(),
        }
    }
}

#[async_trait]
impl SourceAdapter for CoronaStateAdapter {
    type Record = CoronaStateRecord;

    fn dataset_key(&self) -> &'static str {
        DATASET_KEY
    }

    async fn fetch(&self) -> Result<Vec<CoronaStateRecord>, FetchError> {
        let today = Utc::now().date_naive();
        let start = today - Duration::days(WINDOW_DAYS);
        let request = self.http.get(&self.base_url).query(&[
            ("ServiceKey", self.service_key.as_str()),
            ("pageNo", "1"),
            ("numOfRows", &NUM_OF_ROWS.to_string()),
            ("startCreateDt", &start.format("%Y%m%d").to_string()),
            ("endCreateDt", &today.format("%Y%m%d").to_string()),
        ]);
        let envelope: GovEnvelope<StateItem> = fetch_json(request).await?;
        Ok(envelope.into_items().into_iter().map(map_state_row).collect())
    }
}

fn map_state_row(item: StateItem) -> CoronaStateRecord {
    CoronaStateRecord {
        state_dt: item.state_dt,
        state_time: item.state_time,
        decide_cnt: item.decide_cnt,
        death_cnt: item.death_cnt,
        care_cnt: item.care_cnt,
        acc_exam_cnt: item.acc_exam_cnt,
    }
}

/// Raw row of the infection-state service
#[derive(Debug, Deserialize)]
struct StateItem {
    #[serde(rename = "stateDt")]
    state_dt: String,
    #[serde(rename = "stateTime")]
    state_time: String,
    #[serde(rename = "decideCnt")]
    decide_cnt: i64,
    #[serde(rename = "deathCnt")]
    death_cnt: i64,
    #[serde(rename = "careCnt", default)]
    care_cnt: Option<i64>,
    #[serde(rename = "accExamCnt", default)]
    acc_exam_cnt: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Trimmed infection-state response
    const VALID_RESPONSE: &str = r#"{
        "response": {
            "header": { "resultCode": "00", "resultMsg": "OK" },
            "body": {
                "items": {
                    "item": [
                        {
                            "accDefRate": 1.8,
                            "accExamCnt": 12000000,
                            "careCnt": 25000,
                            "createDt": "2021-08-23 09:40:07.048",
                            "deathCnt": 2200,
                            "decideCnt": 238000,
                            "seq": 600,
                            "stateDt": "20210823",
                            "stateTime": "00:00",
                            "updateDt": "null"
                        },
                        {
                            "accExamCnt": 11950000,
                            "careCnt": 24800,
                            "deathCnt": 2195,
                            "decideCnt": 236500,
                            "seq": 599,
                            "stateDt": "20210822",
                            "stateTime": "00:00"
                        }
                    ]
                },
                "numOfRows": 50,
                "pageNo": 1,
                "totalCount": 2
            }
        }
    }"#;

    #[test]
    fn test_parse_and_map_valid_response() {
        let envelope: GovEnvelope<StateItem> = serde_json::from_str(VALID_RESPONSE).unwrap();
        let records: Vec<CoronaStateRecord> =
            envelope.into_items().into_iter().map(map_state_row).collect();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].state_dt, "20210823");
        assert_eq!(records[0].decide_cnt, 238000);
        assert_eq!(records[0].death_cnt, 2200);
        assert_eq!(records[0].care_cnt, Some(25000));
        assert_eq!(records[1].state_dt, "20210822");
    }

    #[test]
    fn test_optional_counts_may_be_absent() {
        let json = r#"{
            "response": {
                "body": {
                    "items": {
                        "item": [
                            { "stateDt": "20210823", "stateTime": "00:00",
                              "decideCnt": 1, "deathCnt": 0 }
                        ]
                    }
                }
            }
        }"#;
        let envelope: GovEnvelope<StateItem> = serde_json::from_str(json).unwrap();
        let records: Vec<CoronaStateRecord> =
            envelope.into_items().into_iter().map(map_state_row).collect();
        assert_eq!(records[0].care_cnt, None);
        assert_eq!(records[0].acc_exam_cnt, None);
    }

    #[test]
    fn test_no_rows_is_empty_not_error() {
        let json = r#"{ "response": { "header": { "resultCode": "03" } } }"#;
        let envelope: GovEnvelope<StateItem> = serde_json::from_str(json).unwrap();
        assert!(envelope.into_items().is_empty());
    }
}
