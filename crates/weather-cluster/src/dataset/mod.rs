// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! City weather dataset decoding.
//!
//! The dataset is a JSON document with a top-level `cities` array in the
//! OpenWeatherMap "current weather" shape. Every nested field is decoded as
//! optional so that a record with a missing field still parses; validation
//! happens later in the feature factory, where the record index and the
//! missing field can be reported.

use std::io::Read;

use serde::Deserialize;
use thiserror::Error;

use crate::observation::MalformedRecordError;

/// Errors that can occur while loading a dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid dataset JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Malformed(#[from] MalformedRecordError),
}

/// Geographic coordinate pair in degrees.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCoord {
    pub lon: Option<f64>,
    pub lat: Option<f64>,
}

/// City identity block.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCity {
    pub name: Option<String>,
    pub coord: Option<RawCoord>,
}

/// Main measurements block.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMain {
    pub temp: Option<f64>,
}

/// One weather description entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawWeather {
    /// Condition group, e.g. "Clear" or "Rain".
    pub main: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A single city record as it appears in the dataset.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCityRecord {
    pub city: Option<RawCity>,
    pub main: Option<RawMain>,
    #[serde(default)]
    pub weather: Vec<RawWeather>,
}

#[cfg(test)]
impl RawCityRecord {
    /// Fully populated record for test fixtures.
    pub(crate) fn new(name: &str, lon: f64, lat: f64, temp: f64, weather: &str) -> Self {
        Self {
            city: Some(RawCity {
                name: Some(name.to_string()),
                coord: Some(RawCoord {
                    lon: Some(lon),
                    lat: Some(lat),
                }),
            }),
            main: Some(RawMain { temp: Some(temp) }),
            weather: vec![RawWeather {
                main: Some(weather.to_string()),
                description: None,
            }],
        }
    }
}

/// The decoded dataset document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub cities: Vec<RawCityRecord>,
}

impl Dataset {
    /// Decode a dataset from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, DatasetError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Decode a dataset from raw JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DatasetError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Decode a dataset from any reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        Ok(serde_json::from_reader(reader)?)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "cities": [
            {
                "city": { "id": 360630, "name": "Cairo", "coord": { "lon": 31.2357, "lat": 30.0444 } },
                "main": { "temp": 31.5, "humidity": 20 },
                "weather": [ { "id": 800, "main": "Clear", "description": "clear sky" } ]
            },
            {
                "city": { "name": "London", "coord": { "lon": -0.1257, "lat": 51.5085 } },
                "main": { "temp": 12.0 },
                "weather": [ { "main": "Rain" }, { "main": "Clouds" } ]
            }
        ]
    }"#;

    #[test]
    fn test_parse_sample() {
        let dataset = Dataset::from_json_str(SAMPLE).unwrap();
        assert_eq!(dataset.len(), 2);

        let cairo = &dataset.cities[0];
        let city = cairo.city.as_ref().unwrap();
        assert_eq!(city.name.as_deref(), Some("Cairo"));
        let coord = city.coord.as_ref().unwrap();
        assert_eq!(coord.lon, Some(31.2357));
        assert_eq!(coord.lat, Some(30.0444));
        assert_eq!(cairo.main.as_ref().unwrap().temp, Some(31.5));
        assert_eq!(cairo.weather[0].main.as_deref(), Some("Clear"));
        assert_eq!(cairo.weather[0].description.as_deref(), Some("clear sky"));

        assert_eq!(dataset.cities[1].weather.len(), 2);
    }

    #[test]
    fn test_missing_fields_still_parse() {
        let json = r#"{ "cities": [ { "city": { "name": "Nowhere" } } ] }"#;
        let dataset = Dataset::from_json_str(json).unwrap();
        assert_eq!(dataset.len(), 1);
        assert!(dataset.cities[0].main.is_none());
        assert!(dataset.cities[0].weather.is_empty());
    }

    #[test]
    fn test_missing_cities_is_empty() {
        let dataset = Dataset::from_slice(b"{}").unwrap();
        assert!(dataset.is_empty());
    }

    #[test]
    fn test_invalid_json() {
        let err = Dataset::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, DatasetError::Json(_)));
    }

    #[test]
    fn test_wrong_type_is_json_error() {
        let json = r#"{ "cities": [ { "main": { "temp": "hot" } } ] }"#;
        assert!(matches!(
            Dataset::from_json_str(json),
            Err(DatasetError::Json(_))
        ));
    }

    #[test]
    fn test_from_reader() {
        let dataset = Dataset::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(dataset.len(), 2);
    }
}
