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

//! Point observations and the factory that builds them from raw records.
//!
//! An [`Observation`] is immutable once created: its position is projected
//! from longitude/latitude exactly once, and there are no setters.

use std::fmt;

use log::warn;
use thiserror::Error;

use crate::dataset::RawCityRecord;
use crate::projection::{Coordinate, WebMercator};

/// What is wrong with a record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldProblem {
    Missing,
    /// Present but not a usable value, e.g. a latitude of 95.
    OutOfRange,
}

impl fmt::Display for FieldProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => f.write_str("missing"),
            Self::OutOfRange => f.write_str("out of range"),
        }
    }
}

/// A raw record lacks a field every observation needs, or holds an
/// unusable value in it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed city record #{index}: {problem} {field}")]
pub struct MalformedRecordError {
    /// Position of the record in the input batch.
    pub index: usize,
    /// Path of the offending field, e.g. `city.coord.lon`.
    pub field: &'static str,
    pub problem: FieldProblem,
}

/// Weather condition group of an observation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WeatherCategory {
    Clear,
    Clouds,
    Rain,
    Thunderstorm,
    /// Any condition outside the four recognized groups (Fog, Snow, ...).
    Other(String),
}

impl WeatherCategory {
    /// Classify a condition group name. Matching is exact, so "rain" is
    /// not the same as "Rain".
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name {
            "Clear" => Self::Clear,
            "Clouds" => Self::Clouds,
            "Rain" => Self::Rain,
            "Thunderstorm" => Self::Thunderstorm,
            other => Self::Other(other.to_string()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Clear => "Clear",
            Self::Clouds => "Clouds",
            Self::Rain => "Rain",
            Self::Thunderstorm => "Thunderstorm",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for WeatherCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One city's weather reading reduced to a point.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    position: Coordinate,
    name: String,
    temperature: f64,
    category: WeatherCategory,
}

impl Observation {
    /// Create an observation, projecting `lon`/`lat` degrees into
    /// render-projection meters.
    #[must_use]
    pub fn from_lon_lat(
        name: impl Into<String>,
        lon: f64,
        lat: f64,
        temperature: f64,
        category: WeatherCategory,
    ) -> Self {
        Self {
            position: WebMercator::forward(lon, lat),
            name: name.into(),
            temperature,
            category,
        }
    }

    /// Position in render-projection meters.
    #[must_use]
    pub fn position(&self) -> Coordinate {
        self.position
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    #[must_use]
    pub fn category(&self) -> &WeatherCategory {
        &self.category
    }
}

/// What to do with records that are missing required fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecordPolicy {
    /// Reject the whole batch on the first malformed record.
    #[default]
    FailFast,
    /// Log and drop malformed records, keeping the rest.
    SkipInvalid,
}

/// Converts raw city records into observations.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureFactory {
    policy: RecordPolicy,
}

impl FeatureFactory {
    #[must_use]
    pub fn new(policy: RecordPolicy) -> Self {
        Self { policy }
    }

    #[must_use]
    pub fn policy(&self) -> RecordPolicy {
        self.policy
    }

    /// Build one observation per record, in input order.
    ///
    /// With [`RecordPolicy::FailFast`] the output has exactly as many
    /// observations as there are records, or the first error is returned.
    /// With [`RecordPolicy::SkipInvalid`] malformed records are logged and
    /// left out.
    pub fn build_observations(
        &self,
        records: &[RawCityRecord],
    ) -> Result<Vec<Observation>, MalformedRecordError> {
        let mut observations = Vec::with_capacity(records.len());

        for (index, record) in records.iter().enumerate() {
            match Self::build_observation(index, record) {
                Ok(observation) => observations.push(observation),
                Err(e) => match self.policy {
                    RecordPolicy::FailFast => return Err(e),
                    RecordPolicy::SkipInvalid => warn!("Skipping {}", e),
                },
            }
        }

        Ok(observations)
    }

    /// Validate and convert a single record.
    pub fn build_observation(
        index: usize,
        record: &RawCityRecord,
    ) -> Result<Observation, MalformedRecordError> {
        let missing = |field| MalformedRecordError {
            index,
            field,
            problem: FieldProblem::Missing,
        };
        let out_of_range = |field| MalformedRecordError {
            index,
            field,
            problem: FieldProblem::OutOfRange,
        };

        let city = record.city.as_ref().ok_or_else(|| missing("city"))?;
        let coord = city.coord.as_ref().ok_or_else(|| missing("city.coord"))?;
        let lon = coord.lon.ok_or_else(|| missing("city.coord.lon"))?;
        let lat = coord.lat.ok_or_else(|| missing("city.coord.lat"))?;
        // Outside these the mercator projection yields NaN
        if !lon.is_finite() {
            return Err(out_of_range("city.coord.lon"));
        }
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(out_of_range("city.coord.lat"));
        }
        let name = city.name.as_deref().ok_or_else(|| missing("city.name"))?;
        let temperature = record
            .main
            .as_ref()
            .and_then(|m| m.temp)
            .ok_or_else(|| missing("main.temp"))?;
        let first = record.weather.first().ok_or_else(|| missing("weather"))?;
        let condition = first
            .main
            .as_deref()
            .ok_or_else(|| missing("weather[0].main"))?;

        Ok(Observation::from_lon_lat(
            name,
            lon,
            lat,
            temperature,
            WeatherCategory::parse(condition),
        ))
    }
}
