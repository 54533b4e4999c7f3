//! Static table of Korean metropolitan cities
//!
//! Keys are OpenWeatherMap city ids; the Korean name is the display name the
//! companion app shows, so weather records are localized against this table
//! at mapping time.

use serde::Serialize;

/// A city the weather dataset is fetched for
#[derive(Debug, Clone, Copy, Serialize)]
pub struct City {
    /// OpenWeatherMap city id
    pub id: u64,
    /// Romanized name
    pub name: &'static str,
    /// Korean display name
    pub name_kor: &'static str,
}

/// The big-city table the weather refresh fans out over
pub static BIG_CITIES: [City; 10] = [
    City {
        id: 1835848,
        name: "Seoul",
        name_kor: "서울",
    },
    City {
        id: 1838524,
        name: "Busan",
        name_kor: "부산",
    },
    City {
        id: 1843564,
        name: "Incheon",
        name_kor: "인천",
    },
    City {
        id: 1835329,
        name: "Daegu",
        name_kor: "대구",
    },
    City {
        id: 1835235,
        name: "Daejeon",
        name_kor: "대전",
    },
    City {
        id: 1841811,
        name: "Gwangju",
        name_kor: "광주",
    },
    City {
        id: 1833747,
        name: "Ulsan",
        name_kor: "울산",
    },
    City {
        id: 1835553,
        name: "Suwon",
        name_kor: "수원",
    },
    City {
        id: 1846326,
        name: "Changwon",
        name_kor: "창원",
    },
    City {
        id: 1846266,
        name: "Jeju",
        name_kor: "제주",
    },
];

/// Returns all cities in the table
pub fn all_cities() -> &'static [City] {
    &BIG_CITIES
}

/// Looks up a city by its OpenWeatherMap id
pub fn get_city_by_id(id: u64) -> Option<&'static City> {
    BIG_CITIES.iter().find(|city| city.id == id)
}
