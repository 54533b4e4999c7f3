//! External source adapters, one per cached dataset
//!
//! Each submodule owns the record shape for one dataset, the upstream request
//! construction, and the mapping from the upstream payload (every API nests
//! its items differently) into that record shape. Adapters do not retry and
//! do not touch the stores; failures propagate as [`FetchError`].

pub mod cities;
pub mod corona_city;
pub mod corona_state;
pub mod news;
pub mod vaccine;
pub mod weather;

pub use cities::{all_cities, get_city_by_id, City};
pub use corona_city::{CoronaCityAdapter, CoronaCityRecord};
pub use corona_state::{CoronaStateAdapter, CoronaStateRecord};
pub use news::{NewsAdapter, NewsRecord};
pub use vaccine::{VaccineAdapter, VaccineCenterRecord};
pub use weather::{WeatherAdapter, WeatherRecord};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Maximum length of an upstream response body echoed into an error message
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Errors that can occur while fetching fresh records from an upstream API
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed before a response arrived
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream answered with a non-success status
    #[error("upstream returned {status}: {body}")]
    UpstreamStatus {
        status: reqwest::StatusCode,
        body: String,
    },

    /// Response body did not parse as the expected JSON shape
    #[error("failed to parse upstream response: {0}")]
    Parse(#[from] serde_json::Error),

    /// Response parsed but a required field was absent
    #[error("missing expected field in response: {0}")]
    MissingField(String),

    /// Response parsed but a field held an unusable value
    #[error("invalid field value in response: {0}")]
    InvalidField(String),

    /// Every call of a fanned-out fetch failed
    #[error("no upstream call succeeded for dataset {0}")]
    AllSubfetchesFailed(&'static str),
}

impl FetchError {
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub(crate) fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        FetchError::UpstreamStatus {
            status,
            body: Self::truncate_body(body),
        }
    }
}

/// Capability contract of one dataset's upstream source
///
/// A refresh asks the adapter for all fresh records in one call; the adapter
/// may fan that out internally (per-city weather). Request construction and
/// payload unwrapping stay inside the implementation.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// The record shape this adapter produces for the dataset store
    type Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static;

    /// Stable dataset key, also the metadata key prefix (`<key>_last_update`)
    fn dataset_key(&self) -> &'static str;

    /// Fetches all fresh records from the upstream API
    async fn fetch(&self) -> Result<Vec<Self::Record>, FetchError>;
}

/// Sends a prepared request and parses a JSON body, mapping non-success
/// statuses to [`FetchError::UpstreamStatus`].
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<T, FetchError> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(FetchError::from_status(status, &body));
    }
    Ok(serde_json::from_str(&body)?)
}

/// Collects a fanned-out fetch, keeping whatever succeeded.
///
/// Failed sub-fetches are logged and dropped; the snapshot is written from
/// the survivors and the timestamp still advances. Only when every call
/// failed does the refresh as a whole fail.
pub(crate) fn collect_partial<T>(
    dataset: &'static str,
    results: Vec<Result<T, FetchError>>,
) -> Result<Vec<T>, FetchError> {
    let mut records = Vec::with_capacity(results.len());
    let mut failures = 0usize;
    for result in results {
        match result {
            Ok(record) => records.push(record),
            Err(e) => {
                failures += 1;
                warn!(dataset, error = %e, "sub-fetch failed, keeping partial snapshot");
            }
        }
    }
    if failures > 0 && records.is_empty() {
        return Err(FetchError::AllSubfetchesFailed(dataset));
    }
    Ok(records)
}

/// Envelope of the data.go.kr open-data REST services: the item list sits at
/// `response.body.items.item`, with the whole chain absent when no rows match.
#[derive(Debug, Deserialize)]
pub(crate) struct GovEnvelope<T> {
    pub response: GovResponse<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GovResponse<T> {
    pub body: Option<GovBody<T>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GovBody<T> {
    #[serde(default = "GovItems::empty")]
    pub items: GovItems<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GovItems<T> {
    #[serde(default = "Vec::new")]
    pub item: Vec<T>,
}

impl<T> GovItems<T> {
    fn empty() -> Self {
        GovItems { item: Vec::new() }
    }
}

impl<T> GovEnvelope<T> {
    /// Unwraps the nested item list, treating a missing body as zero rows
    pub(crate) fn into_items(self) -> Vec<T> {
        self.response
            .body
            .map(|body| body.items.item)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_partial_keeps_successes() {
        let results: Vec<Result<i32, FetchError>> = vec![
            Ok(1),
            Err(FetchError::MissingField("weather".to_string())),
            Ok(3),
        ];
        let records = collect_partial("weather", results).unwrap();
        assert_eq!(records, vec![1, 3]);
    }

    #[test]
    fn test_collect_partial_all_failed_is_an_error() {
        let results: Vec<Result<i32, FetchError>> = vec![
            Err(FetchError::MissingField("a".to_string())),
            Err(FetchError::MissingField("b".to_string())),
        ];
        let result = collect_partial("weather", results);
        assert!(matches!(
            result,
            Err(FetchError::AllSubfetchesFailed("weather"))
        ));
    }

    #[test]
    fn test_collect_partial_empty_input_is_empty_ok() {
        let results: Vec<Result<i32, FetchError>> = Vec::new();
        assert!(collect_partial("weather", results).unwrap().is_empty());
    }

    #[test]
    fn test_truncate_body_short_passthrough() {
        assert_eq!(FetchError::truncate_body("short"), "short");
    }

    #[test]
    fn test_truncate_body_long_is_cut() {
        let long = "x".repeat(2000);
        let truncated = FetchError::truncate_body(&long);
        assert!(truncated.contains("truncated"));
        assert!(truncated.len() < long.len());
    }

    #[test]
    fn test_gov_envelope_unwraps_items() {
        let json = r#"{
            "response": {
                "header": { "resultCode": "00", "resultMsg": "OK" },
                "body": {
                    "items": { "item": [1, 2, 3] },
                    "numOfRows": 50,
                    "pageNo": 1,
                    "totalCount": 3
                }
            }
        }"#;
        let envelope: GovEnvelope<i32> = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.into_items(), vec![1, 2, 3]);
    }

    #[test]
    fn test_gov_envelope_missing_body_is_zero_rows() {
        let json = r#"{
            "response": {
                "header": { "resultCode": "03", "resultMsg": "NODATA_ERROR" }
            }
        }"#;
        let envelope: GovEnvelope<i32> = serde_json::from_str(json).unwrap();
        assert!(envelope.into_items().is_empty());
    }

    #[test]
    fn test_gov_envelope_item_type_needs_no_default() {
        // The row types of the real services do not implement Default, so
        // the envelope's derives must not require it.
        #[derive(Debug, Deserialize, PartialEq)]
        struct Row {
            seq: u32,
        }
        let json = r#"{
            "response": {
                "body": { "items": { "item": [ { "seq": 1 }, { "seq": 2 } ] } }
            }
        }"#;
        let envelope: GovEnvelope<Row> = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.into_items(), vec![Row { seq: 1 }, Row { seq: 2 }]);
    }

    #[test]
    fn test_gov_envelope_missing_items_is_zero_rows() {
        let json = r#"{
            "response": {
                "body": { "numOfRows": 50, "pageNo": 1, "totalCount": 0 }
            }
        }"#;
        let envelope: GovEnvelope<i32> = serde_json::from_str(json).unwrap();
        assert!(envelope.into_items().is_empty());
    }
}
