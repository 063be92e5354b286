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

//! Basemap definitions and the single-visible-layer switcher.

use log::{info, warn};

/// Id of the OpenStreetMap standard basemap.
pub const OSM: &str = "osm";
/// Id of the Stadia "Alidade Smooth" light gray basemap.
pub const LIGHT_GRAY_ALIDADE: &str = "light_gray_alidade";
/// Id of the Stadia "Alidade Smooth Dark" basemap.
pub const DARK_ALIDADE: &str = "dark_alidade";

/// A raster tile basemap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Basemap {
    /// Stable identifier used by the switcher and in config.
    pub id: &'static str,
    /// Human-readable label.
    pub title: &'static str,
    /// Tile URL with `{z}`, `{x}` and `{y}` placeholders.
    pub url_template: &'static str,
    pub attribution: &'static str,
    pub attribution_url: &'static str,
}

impl Basemap {
    /// Expand the URL template for one tile.
    #[must_use]
    pub fn tile_url(&self, zoom: u8, x: u32, y: u32) -> String {
        self.url_template
            .replace("{z}", &zoom.to_string())
            .replace("{x}", &x.to_string())
            .replace("{y}", &y.to_string())
    }
}

/// The three basemaps, in display order.
#[must_use]
pub fn default_basemaps() -> Vec<Basemap> {
    vec![
        Basemap {
            id: OSM,
            title: "OpenStreetMap",
            url_template: "https://tile.openstreetmap.org/{z}/{x}/{y}.png",
            attribution: "© OpenStreetMap contributors",
            attribution_url: "https://www.openstreetmap.org/copyright",
        },
        Basemap {
            id: LIGHT_GRAY_ALIDADE,
            title: "Light Gray",
            url_template: "https://tiles.stadiamaps.com/tiles/alidade_smooth/{z}/{x}/{y}@2x.png",
            attribution: "© Stadia Maps © OpenMapTiles © OpenStreetMap contributors",
            attribution_url: "https://stadiamaps.com/attribution",
        },
        Basemap {
            id: DARK_ALIDADE,
            title: "Dark",
            url_template: "https://tiles.stadiamaps.com/tiles/alidade_smooth_dark/{z}/{x}/{y}@2x.png",
            attribution: "© Stadia Maps © OpenMapTiles © OpenStreetMap contributors",
            attribution_url: "https://stadiamaps.com/attribution",
        },
    ]
}

/// Holds the group of basemaps and which one is visible.
///
/// At most one basemap is visible at a time. Selecting an unknown id hides
/// all of them.
#[derive(Debug, Clone)]
pub struct BasemapSwitcher {
    layers: Vec<Basemap>,
    active: Option<usize>,
}

impl Default for BasemapSwitcher {
    fn default() -> Self {
        Self::new(default_basemaps(), OSM)
    }
}

impl BasemapSwitcher {
    /// Create a switcher with `initial` visible.
    #[must_use]
    pub fn new(layers: Vec<Basemap>, initial: &str) -> Self {
        let mut switcher = Self {
            layers,
            active: None,
        };
        switcher.select(initial);
        switcher
    }

    /// Make the basemap with `id` the only visible one.
    ///
    /// Returns `false` and hides every basemap when `id` is unknown.
    pub fn select(&mut self, id: &str) -> bool {
        self.active = self.layers.iter().position(|layer| layer.id == id);
        match self.active {
            Some(_) => {
                info!("Basemap switched to {}", id);
                true
            }
            None => {
                warn!("Unknown basemap '{}', hiding all basemaps", id);
                false
            }
        }
    }

    /// The currently visible basemap, if any.
    #[must_use]
    pub fn active(&self) -> Option<&Basemap> {
        self.active.and_then(|i| self.layers.get(i))
    }

    #[must_use]
    pub fn active_id(&self) -> Option<&'static str> {
        self.active().map(|layer| layer.id)
    }

    #[must_use]
    pub fn is_visible(&self, id: &str) -> bool {
        self.active_id() == Some(id)
    }

    #[must_use]
    pub fn layers(&self) -> &[Basemap] {
        &self.layers
    }

    /// Lookup a basemap definition by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Basemap> {
        self.layers.iter().find(|layer| layer.id == id)
    }
}
