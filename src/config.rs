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

//! Application configuration management.
//!
//! This module handles persistent configuration storage using TOML format.
//! It covers the active basemap, the initial view, clustering distances and
//! where the weather dataset and icons are loaded from.

use std::time::Duration;

use log::warn;
use serde::{Deserialize, Serialize};
use weather_cluster::basemap;
use weather_cluster::cluster::{DEFAULT_DISTANCE, DEFAULT_MIN_DISTANCE};
use weather_cluster::{ClusterConfig, Coordinate, RecordPolicy};

use crate::loader::LoadOptions;

const APP_NAME: &str = "cityweather-map";
const CONFIG_NAME: &str = "config";

/// Default location of the weather dataset
pub const DEFAULT_DATASET_SOURCE: &str = "citiesWeather.json";

/// Application configuration stored in TOML format
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    /// Configuration schema version for migrations
    #[serde(default = "default_config_version")]
    pub config_version: u32,

    /// Id of the visible basemap
    #[serde(default = "default_basemap")]
    pub active_basemap: String,

    /// Initial map zoom level
    #[serde(default = "default_zoom")]
    pub default_zoom: f64,

    /// Initial map center X in EPSG:3857 meters
    #[serde(default = "default_center")]
    pub center_x: f64,

    /// Initial map center Y in EPSG:3857 meters
    #[serde(default = "default_center")]
    pub center_y: f64,

    /// Cluster merge distance in pixels
    #[serde(default = "default_cluster_distance")]
    pub cluster_distance: f64,

    /// Minimum distance between cluster icons in pixels
    #[serde(default = "default_cluster_min_distance")]
    pub cluster_min_distance: f64,

    /// Dataset path or http(s) URL
    #[serde(default = "default_dataset_source")]
    pub dataset_source: String,

    /// Directory holding the weather icon PNGs
    #[serde(default = "default_icon_dir")]
    pub icon_dir: String,

    /// Extra dataset fetch attempts after a failure
    #[serde(default)]
    pub load_retries: u32,

    /// Drop malformed city records instead of failing the whole load
    #[serde(default)]
    pub skip_invalid_records: bool,
}

// Default value functions for serde
fn default_config_version() -> u32 {
    1
}

fn default_basemap() -> String {
    basemap::OSM.to_string()
}

fn default_zoom() -> f64 {
    4.0
}

fn default_center() -> f64 {
    3_500_000.0
}

fn default_cluster_distance() -> f64 {
    DEFAULT_DISTANCE
}

fn default_cluster_min_distance() -> f64 {
    DEFAULT_MIN_DISTANCE
}

fn default_dataset_source() -> String {
    DEFAULT_DATASET_SOURCE.to_string()
}

fn default_icon_dir() -> String {
    "assets/icons".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            active_basemap: default_basemap(),
            default_zoom: default_zoom(),
            center_x: default_center(),
            center_y: default_center(),
            cluster_distance: default_cluster_distance(),
            cluster_min_distance: default_cluster_min_distance(),
            dataset_source: default_dataset_source(),
            icon_dir: default_icon_dir(),
            load_retries: 0,
            skip_invalid_records: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from disk
    pub fn load() -> Result<Self, confy::ConfyError> {
        confy::load(APP_NAME, CONFIG_NAME)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<(), confy::ConfyError> {
        confy::store(APP_NAME, CONFIG_NAME, self)
    }

    /// Get the config file path for display to user
    pub fn get_config_path() -> Result<std::path::PathBuf, confy::ConfyError> {
        confy::get_configuration_file_path(APP_NAME, CONFIG_NAME)
    }

    /// Initial map center. A non-finite stored value falls back to the
    /// default center.
    pub fn center(&self) -> Coordinate {
        if self.center_x.is_finite() && self.center_y.is_finite() {
            Coordinate::new(self.center_x, self.center_y)
        } else {
            warn!("Ignoring invalid map center ({}, {})", self.center_x, self.center_y);
            Coordinate::new(default_center(), default_center())
        }
    }

    /// Initial zoom level. NaN or infinite values fall back to the default.
    pub fn zoom(&self) -> f64 {
        if self.default_zoom.is_finite() {
            self.default_zoom
        } else {
            warn!("Ignoring invalid zoom {}", self.default_zoom);
            default_zoom()
        }
    }

    pub fn cluster_config(&self) -> ClusterConfig {
        ClusterConfig {
            distance: self.cluster_distance,
            min_distance: self.cluster_min_distance,
        }
    }

    pub fn record_policy(&self) -> RecordPolicy {
        if self.skip_invalid_records {
            RecordPolicy::SkipInvalid
        } else {
            RecordPolicy::FailFast
        }
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            retries: self.load_retries,
            backoff: Duration::from_millis(500),
            policy: self.record_policy(),
            cluster: self.cluster_config(),
        }
    }
}
