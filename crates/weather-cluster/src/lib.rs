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

//! Weather cluster library for city weather map overlays.
//!
//! This library turns a dataset of per-city weather readings into a
//! clustered map overlay in which each cluster is drawn with the weather
//! icon of its hottest city. It has no UI dependencies and is split into
//! layers that can be used independently:
//!
//! - **Projection layer**: Web Mercator transforms between longitude/latitude
//!   and render-projection meters, plus view/tile math
//! - **Dataset layer**: JSON decoding of raw city records
//! - **Observation layer**: validation of raw records into immutable point
//!   observations
//! - **Cluster layer**: screen-distance clustering that is recomputed when
//!   the view resolution changes
//! - **Style layer**: representative (hottest) member selection and icon
//!   mapping
//! - **Basemap layer**: basemap definitions and the one-visible switcher
//!
//! # Quick Start
//!
//! ```
//! use weather_cluster::{ClusterConfig, ClusterLayer, Dataset, FeatureFactory, WebMercator};
//!
//! let json = r#"{ "cities": [
//!     { "city": { "name": "Cairo", "coord": { "lon": 31.2357, "lat": 30.0444 } },
//!       "main": { "temp": 31.0 }, "weather": [ { "main": "Clear" } ] },
//!     { "city": { "name": "Giza", "coord": { "lon": 31.2089, "lat": 30.0131 } },
//!       "main": { "temp": 29.0 }, "weather": [ { "main": "Clouds" } ] }
//! ] }"#;
//!
//! let dataset = Dataset::from_json_str(json).unwrap();
//! let mut layer =
//!     ClusterLayer::from_dataset(&dataset, FeatureFactory::default(), ClusterConfig::default())
//!         .unwrap();
//!
//! for instruction in layer.render(WebMercator::resolution_for_zoom(4.0)) {
//!     println!(
//!         "{} cities, hottest {} -> {}",
//!         instruction.member_count,
//!         instruction.representative,
//!         instruction.symbol.icon.file_name()
//!     );
//! }
//! ```
//!
//! # Styling a Single Cluster
//!
//! ```
//! use weather_cluster::{Cluster, ClusterStyler, Observation, WeatherCategory, WeatherIcon};
//!
//! let cluster = Cluster::from_observations([
//!     Observation::from_lon_lat("Lyon", 4.85, 45.75, 18.0, WeatherCategory::Clouds),
//!     Observation::from_lon_lat("Grenoble", 5.72, 45.17, 25.0, WeatherCategory::Rain),
//! ]);
//!
//! let symbol = ClusterStyler::style_cluster(&cluster).unwrap();
//! assert_eq!(symbol.icon, WeatherIcon::Rainy);
//! ```

pub mod basemap;
pub mod cluster;
pub mod dataset;
pub mod observation;
pub mod overlay;
pub mod projection;
pub mod style;

pub use basemap::{Basemap, BasemapSwitcher};
pub use cluster::{Cluster, ClusterConfig, ClusterIndex};
pub use dataset::{Dataset, DatasetError, RawCityRecord};
pub use observation::{
    FeatureFactory, FieldProblem, MalformedRecordError, Observation, RecordPolicy, WeatherCategory,
};
pub use overlay::{ClusterLayer, RenderInstruction};
pub use projection::{Coordinate, MapView, WebMercator};
pub use style::{ClusterStyler, DisplaySymbol, StyleError, WeatherIcon};
