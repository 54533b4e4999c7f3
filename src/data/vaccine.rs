//! data.go.kr adapter for vaccination centers, plus the geo filter
//!
//! One bulk call per refresh fetches the full center list (the API publishes
//! well under 500 centers). The payload nests its rows in a flat `data`
//! envelope and publishes coordinates as strings, which are parsed here so
//! reads can filter by distance.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{fetch_json, FetchError, SourceAdapter};

/// Base URL for the vaccination-center service
const VACCINE_CENTER_URL: &str =
    "https://api.odcloud.kr/api/15077586/v1/centers";

/// Centers requested per refresh (covers the full published list)
const PER_PAGE: u32 = 500;

/// Dataset key for the vaccination-center collection
pub const DATASET_KEY: &str = "vaccine";

/// Hard cap on the `within` radius a caller may request, in kilometers
pub const MAX_WITHIN_KM: f64 = 30.0;

/// Mean Earth radius in kilometers, for the haversine distance
const EARTH_RADIUS_KM: f64 = 6371.0;

/// One vaccination center, as stored and served
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaccineCenterRecord {
    /// Center name (e.g. "코로나19 중앙 예방접종센터")
    pub center_name: String,
    /// Hosting facility name
    pub facility_name: String,
    /// Street address
    pub address: String,
    /// Province-level region
    pub sido: String,
    /// District-level region
    pub sigungu: String,
    /// Center classification (e.g. "중앙/권역")
    pub center_type: String,
    /// Contact number, when published
    pub phone_number: Option<String>,
    /// Latitude in decimal degrees
    pub lat: f64,
    /// Longitude in decimal degrees
    pub lng: f64,
}

/// Adapter fetching the vaccination-center list from data.go.kr
#[derive(Debug, Clone)]
pub struct VaccineAdapter {
    http: Client,
    service_key: String,
    base_url: String,
}

impl VaccineAdapter {
    /// Creates a new adapter with the given HTTP client and service key
    pub fn new(http: Client, service_key: String) -> Self {
        Self {
            http,
            service_key,
            base_url: VACCINE_CENTER_URL.to_string(),
        }
    }
}

#[async_trait]
impl SourceAdapter for VaccineAdapter {
    type Record = VaccineCenterRecord;

    fn dataset_key(&self) -> &'static str {
        DATASET_KEY
    }

    async fn fetch(&self) -> Result<Vec<VaccineCenterRecord>, FetchError> {
        let request = self.http.get(&self.base_url).query(&[
            ("page", "1"),
            ("perPage", &PER_PAGE.to_string()),
            ("returnType", "json"),
            ("serviceKey", self.service_key.as_str()),
        ]);
        let response: CenterResponse = fetch_json(request).await?;
        response.data.into_iter().map(map_center).collect()
    }
}

/// Maps one raw center row, parsing the string-typed coordinates
fn map_center(item: CenterItem) -> Result<VaccineCenterRecord, FetchError> {
    let lat = parse_coordinate("lat", &item.lat)?;
    let lng = parse_coordinate("lng", &item.lng)?;
    Ok(VaccineCenterRecord {
        center_name: item.center_name,
        facility_name: item.facility_name,
        address: item.address,
        sido: item.sido,
        sigungu: item.sigungu,
        center_type: item.center_type,
        phone_number: item.phone_number,
        lat,
        lng,
    })
}

fn parse_coordinate(field: &str, value: &str) -> Result<f64, FetchError> {
    value
        .trim()
        .parse()
        .map_err(|_| FetchError::InvalidField(format!("{}: {:?}", field, value)))
}

/// Great-circle distance between two points, in kilometers
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

/// Builds the read filter "centers within `within_km` of `(lat, lon)`".
///
/// The radius is capped at [`MAX_WITHIN_KM`]; a center exactly on the radius
/// is included.
pub fn within_radius(
    lat: f64,
    lon: f64,
    within_km: f64,
) -> impl Fn(&VaccineCenterRecord) -> bool + Send + Sync {
    let radius = within_km.min(MAX_WITHIN_KM);
    move |center| distance_km(lat, lon, center.lat, center.lng) <= radius
}

/// Vaccination-center response envelope
#[derive(Debug, Deserialize)]
struct CenterResponse {
    #[serde(default)]
    data: Vec<CenterItem>,
}

#[derive(Debug, Deserialize)]
struct CenterItem {
    #[serde(rename = "centerName")]
    center_name: String,
    #[serde(rename = "facilityName")]
    facility_name: String,
    address: String,
    sido: String,
    sigungu: String,
    #[serde(rename = "centerType")]
    center_type: String,
    #[serde(rename = "phoneNumber", default)]
    phone_number: Option<String>,
    lat: String,
    lng: String,
}
