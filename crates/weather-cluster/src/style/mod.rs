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

//! Cluster styling.
//!
//! Each cluster is drawn with a single weather icon taken from its hottest
//! member (the representative). Selection starts from the first member and
//! only moves on to a strictly hotter one, so ties go to whichever member
//! comes first in cluster order. NaN temperatures rank below every number,
//! including negative infinity, so a cluster always resolves to some member.

use thiserror::Error;

use crate::cluster::Cluster;
use crate::observation::{Observation, WeatherCategory};

/// Render scale applied to every cluster icon.
pub const ICON_SCALE: f32 = 0.1;

/// Errors that can occur while styling a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StyleError {
    #[error("cannot style an empty cluster")]
    EmptyCluster,
}

/// The five weather icons a cluster can be drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeatherIcon {
    Sunny,
    Cloud,
    Rainy,
    Thunderstorm,
    CloudyWithRain,
}

impl WeatherIcon {
    pub const ALL: [WeatherIcon; 5] = [
        WeatherIcon::Sunny,
        WeatherIcon::Cloud,
        WeatherIcon::Rainy,
        WeatherIcon::Thunderstorm,
        WeatherIcon::CloudyWithRain,
    ];

    /// Icon for a weather category. Unrecognized categories fall back to
    /// [`WeatherIcon::CloudyWithRain`].
    #[must_use]
    pub fn for_category(category: &WeatherCategory) -> Self {
        match category {
            WeatherCategory::Clear => Self::Sunny,
            WeatherCategory::Clouds => Self::Cloud,
            WeatherCategory::Rain => Self::Rainy,
            WeatherCategory::Thunderstorm => Self::Thunderstorm,
            WeatherCategory::Other(_) => Self::CloudyWithRain,
        }
    }

    /// Asset file name of the icon image.
    #[must_use]
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Sunny => "sunny.png",
            Self::Cloud => "cloud.png",
            Self::Rainy => "rainy.png",
            Self::Thunderstorm => "thunderstorm.png",
            Self::CloudyWithRain => "cloudywithrain.png",
        }
    }
}

/// How to draw one cluster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplaySymbol {
    pub icon: WeatherIcon,
    pub scale: f32,
}

/// Stateless cluster styler.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClusterStyler;

impl ClusterStyler {
    /// Pick the hottest member of a cluster. Ties keep the earliest member.
    pub fn representative(cluster: &Cluster) -> Result<&Observation, StyleError> {
        let mut members = cluster.iter();
        let mut hottest = members.next().ok_or(StyleError::EmptyCluster)?;

        for candidate in members {
            if is_hotter(candidate.temperature(), hottest.temperature()) {
                hottest = candidate;
            }
        }

        Ok(hottest)
    }

    /// Compute the display symbol for a cluster.
    pub fn style_cluster(cluster: &Cluster) -> Result<DisplaySymbol, StyleError> {
        Self::style_with_representative(cluster).map(|(_, symbol)| symbol)
    }

    /// Like [`Self::style_cluster`], also returning the member the symbol
    /// was derived from.
    pub fn style_with_representative(
        cluster: &Cluster,
    ) -> Result<(&Observation, DisplaySymbol), StyleError> {
        let representative = Self::representative(cluster)?;
        let symbol = DisplaySymbol {
            icon: WeatherIcon::for_category(representative.category()),
            scale: ICON_SCALE,
        };
        Ok((representative, symbol))
    }
}

// Strictly greater, with NaN below everything
fn is_hotter(candidate: f64, current: f64) -> bool {
    match (candidate.is_nan(), current.is_nan()) {
        (true, _) => false,
        (false, true) => true,
        (false, false) => candidate > current,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(name: &str, temperature: f64, category: &str) -> Observation {
        Observation::from_lon_lat(name, 0.0, 0.0, temperature, WeatherCategory::parse(category))
    }

    fn cluster(members: Vec<Observation>) -> Cluster {
        Cluster::from_observations(members)
    }

    #[test]
    fn test_single_clear_is_sunny() {
        let c = cluster(vec![obs("Cairo", 30.0, "Clear")]);
        let symbol = ClusterStyler::style_cluster(&c).unwrap();
        assert_eq!(symbol.icon, WeatherIcon::Sunny);
        assert_eq!(symbol.scale, ICON_SCALE);
    }

    #[test]
    fn test_hottest_member_wins() {
        let c = cluster(vec![obs("A", 18.0, "Clouds"), obs("B", 25.0, "Rain")]);
        assert_eq!(ClusterStyler::representative(&c).unwrap().name(), "B");
        assert_eq!(ClusterStyler::style_cluster(&c).unwrap().icon, WeatherIcon::Rainy);
    }

    #[test]
    fn test_unrecognized_category_uses_default_icon() {
        let c = cluster(vec![obs("Lima", 20.0, "Fog")]);
        assert_eq!(
            ClusterStyler::style_cluster(&c).unwrap().icon,
            WeatherIcon::CloudyWithRain
        );
    }

    #[test]
    fn test_tie_goes_to_first_member() {
        let c = cluster(vec![obs("A", 22.0, "Clear"), obs("B", 22.0, "Thunderstorm")]);
        for _ in 0..3 {
            assert_eq!(ClusterStyler::representative(&c).unwrap().name(), "A");
            assert_eq!(ClusterStyler::style_cluster(&c).unwrap().icon, WeatherIcon::Sunny);
        }

        let reversed = cluster(vec![obs("B", 22.0, "Thunderstorm"), obs("A", 22.0, "Clear")]);
        assert_eq!(
            ClusterStyler::style_cluster(&reversed).unwrap().icon,
            WeatherIcon::Thunderstorm
        );
    }

    #[test]
    fn test_maximum_is_not_last_member() {
        // A running maximum that reset per member would report the last one
        let c = cluster(vec![
            obs("Hot", 40.0, "Clear"),
            obs("Mild", 20.0, "Clouds"),
            obs("Cold", 5.0, "Rain"),
        ]);
        assert_eq!(ClusterStyler::representative(&c).unwrap().name(), "Hot");
        assert_eq!(ClusterStyler::style_cluster(&c).unwrap().icon, WeatherIcon::Sunny);
    }

    #[test]
    fn test_category_table() {
        let cases = [
            ("Clear", WeatherIcon::Sunny),
            ("Clouds", WeatherIcon::Cloud),
            ("Rain", WeatherIcon::Rainy),
            ("Thunderstorm", WeatherIcon::Thunderstorm),
            ("Snow", WeatherIcon::CloudyWithRain),
            ("", WeatherIcon::CloudyWithRain),
        ];
        for (category, icon) in cases {
            let c = cluster(vec![obs("X", 1.0, category)]);
            let symbol = ClusterStyler::style_cluster(&c).unwrap();
            assert_eq!(symbol.icon, icon, "category {category:?}");
            assert!(WeatherIcon::ALL.contains(&symbol.icon));
        }
    }

    #[test]
    fn test_empty_cluster_is_error() {
        let c = cluster(Vec::new());
        assert_eq!(ClusterStyler::representative(&c), Err(StyleError::EmptyCluster));
        assert_eq!(ClusterStyler::style_cluster(&c), Err(StyleError::EmptyCluster));
    }

    #[test]
    fn test_negative_temperatures() {
        let c = cluster(vec![obs("A", -30.0, "Clouds"), obs("B", -2.5, "Clear")]);
        assert_eq!(ClusterStyler::representative(&c).unwrap().name(), "B");
    }

    #[test]
    fn test_all_negative_infinity_picks_first() {
        let c = cluster(vec![
            obs("A", f64::NEG_INFINITY, "Rain"),
            obs("B", f64::NEG_INFINITY, "Clear"),
        ]);
        assert_eq!(ClusterStyler::representative(&c).unwrap().name(), "A");
        assert_eq!(ClusterStyler::style_cluster(&c).unwrap().icon, WeatherIcon::Rainy);
    }

    #[test]
    fn test_nan_ranks_lowest() {
        let all_nan = cluster(vec![obs("A", f64::NAN, "Clouds"), obs("B", f64::NAN, "Clear")]);
        assert_eq!(ClusterStyler::representative(&all_nan).unwrap().name(), "A");

        let nan_first = cluster(vec![
            obs("A", f64::NAN, "Clouds"),
            obs("B", f64::NEG_INFINITY, "Clear"),
        ]);
        assert_eq!(ClusterStyler::representative(&nan_first).unwrap().name(), "B");

        let nan_later = cluster(vec![obs("A", 1.0, "Rain"), obs("B", f64::NAN, "Clear")]);
        assert_eq!(ClusterStyler::representative(&nan_later).unwrap().name(), "A");
    }

    #[test]
    fn test_positive_infinity_wins() {
        let c = cluster(vec![obs("A", 50.0, "Clear"), obs("B", f64::INFINITY, "Thunderstorm")]);
        assert_eq!(
            ClusterStyler::style_cluster(&c).unwrap().icon,
            WeatherIcon::Thunderstorm
        );
    }

    #[test]
    fn test_file_names() {
        let names: Vec<_> = WeatherIcon::ALL.iter().map(WeatherIcon::file_name).collect();
        assert_eq!(
            names,
            ["sunny.png", "cloud.png", "rainy.png", "thunderstorm.png", "cloudywithrain.png"]
        );
    }
}
