//! OpenWeatherMap adapter for per-city current weather
//!
//! One refresh fans out into one request per city in the static big-city
//! table. Sub-fetches that fail are logged and dropped; the snapshot is
//! written from whatever succeeded (the refresh fails only when every city
//! call fails).

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::cities::{City, BIG_CITIES};
use super::{collect_partial, fetch_json, FetchError, SourceAdapter};

/// Base URL for the OpenWeatherMap current-weather API
const OWM_BASE_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

/// Dataset key for the weather collection
pub const DATASET_KEY: &str = "weather";

/// Current weather for one city, as stored and served
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherRecord {
    /// OpenWeatherMap city id
    pub city_id: u64,
    /// Romanized city name from the static table
    pub city: String,
    /// Korean display name from the static table
    pub city_kor: String,
    /// Temperature in Celsius
    pub temp: f64,
    /// Feels-like temperature in Celsius
    pub feels_like: f64,
    /// Relative humidity percentage (0-100)
    pub humidity: u8,
    /// Condition group, e.g. "Clouds"
    pub condition: String,
    /// Localized condition description
    pub description: String,
    /// Wind speed in m/s
    pub wind_speed: f64,
    /// OpenWeatherMap icon code
    pub icon: String,
}

/// Adapter fetching current weather for the big-city table
#[derive(Debug, Clone)]
pub struct WeatherAdapter {
    http: Client,
    api_key: String,
    base_url: String,
}

impl WeatherAdapter {
    /// Creates a new adapter with the given HTTP client and API key
    pub fn new(http: Client, api_key: String) -> Self {
        Self {
            http,
            api_key,
            base_url: OWM_BASE_URL.to_string(),
        }
    }

    async fn fetch_city(&self, city: &City) -> Result<WeatherRecord, FetchError> {
        let request = self.http.get(&self.base_url).query(&[
            ("id", city.id.to_string().as_str()),
            ("appid", self.api_key.as_str()),
            ("units", "metric"),
            ("lang", "kr"),
        ]);
        let response: OwmResponse = fetch_json(request).await?;
        map_city_weather(response, city)
    }
}

#[async_trait]
impl SourceAdapter for WeatherAdapter {
    type Record = WeatherRecord;

    fn dataset_key(&self) -> &'static str {
        DATASET_KEY
    }

    async fn fetch(&self) -> Result<Vec<WeatherRecord>, FetchError> {
        let calls = BIG_CITIES.iter().map(|city| self.fetch_city(city));
        let results = join_all(calls).await;
        collect_partial(DATASET_KEY, results)
    }
}

/// Maps one OpenWeatherMap response onto the stored record shape,
/// substituting the localized city names from the static table.
fn map_city_weather(response: OwmResponse, city: &City) -> Result<WeatherRecord, FetchError> {
    let condition = response
        .weather
        .first()
        .ok_or_else(|| FetchError::MissingField("weather".to_string()))?;

    Ok(WeatherRecord {
        city_id: response.id,
        city: city.name.to_string(),
        city_kor: city.name_kor.to_string(),
        temp: response.main.temp,
        feels_like: response.main.feels_like,
        humidity: response.main.humidity.round() as u8,
        condition: condition.main.clone(),
        description: condition.description.clone(),
        wind_speed: response.wind.speed,
        icon: condition.icon.clone(),
    })
}

/// OpenWeatherMap current-weather response
#[derive(Debug, Deserialize)]
struct OwmResponse {
    id: u64,
    weather: Vec<OwmCondition>,
    main: OwmMain,
    wind: OwmWind,
}

#[derive(Debug, Deserialize)]
struct OwmCondition {
    main: String,
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
    feels_like: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OwmWind {
    speed: f64,
}
