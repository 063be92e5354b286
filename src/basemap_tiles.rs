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

use walkers::sources::{Attribution, TileSource};
use walkers::TileId;
use weather_cluster::Basemap;

/// Tile source backed by one of the configured basemaps
#[derive(Debug, Clone)]
pub struct BasemapTileSource {
    basemap: Basemap,
}

impl BasemapTileSource {
    pub fn new(basemap: Basemap) -> Self {
        Self { basemap }
    }

    pub fn id(&self) -> &'static str {
        self.basemap.id
    }
}

impl TileSource for BasemapTileSource {
    fn tile_url(&self, tile_id: TileId) -> String {
        self.basemap.tile_url(tile_id.zoom, tile_id.x, tile_id.y)
    }

    fn attribution(&self) -> Attribution {
        Attribution {
            text: self.basemap.attribution,
            url: self.basemap.attribution_url,
            logo_light: None,
            logo_dark: None,
        }
    }

    // Use default implementations for tile_size() and max_zoom()
}
