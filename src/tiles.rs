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

//! Basemap tile fetching and caching.
//!
//! Tiles are downloaded on background threads, cached on disk under a
//! SHA-256 of their URL and kept in memory as egui textures. Each basemap
//! has its own set of tiles, so switching basemaps does not evict anything.

use egui::{ColorImage, TextureHandle};
use log::{debug, warn};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};
use walkers::sources::TileSource;
use walkers::TileId;
use weather_cluster::projection::TILE_SIZE;
use weather_cluster::{MapView, WebMercator};

use crate::basemap_tiles::BasemapTileSource;

const CACHE_DURATION_DAYS: u64 = 7;
const USER_AGENT: &str = concat!("cityweather-map/", env!("CARGO_PKG_VERSION"));

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub basemap: &'static str,
    pub x: u32,
    pub y: u32,
    pub zoom: u8,
}

impl TileCoord {
    pub fn new(basemap: &'static str, x: u32, y: u32, zoom: u8) -> Self {
        Self { basemap, x, y, zoom }
    }

    fn tile_id(self) -> TileId {
        TileId {
            x: self.x,
            y: self.y,
            zoom: self.zoom,
        }
    }
}

/// A tile to draw and where: pixel offset of its top-left corner from the
/// view center and its on-screen edge length.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisibleTile {
    pub coord: TileCoord,
    pub offset_x: f32,
    pub offset_y: f32,
    pub size: f32,
}

/// Get cache filename based on hash of URL
fn cache_filename(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub enum TileState {
    Loading,
    Loaded(TextureHandle),
    Failed,
}

pub struct TileManager {
    cache_dir: PathBuf,
    client: reqwest::blocking::Client,
    tiles: Arc<Mutex<HashMap<TileCoord, TileState>>>,
    download_queue: Arc<Mutex<HashSet<TileCoord>>>,
}

impl std::fmt::Debug for TileManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileManager")
            .field("cache_dir", &self.cache_dir)
            .finish_non_exhaustive()
    }
}

impl Default for TileManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TileManager {
    pub fn new() -> Self {
        let cache_dir = Self::get_cache_dir();

        // Create cache directory if it doesn't exist
        if let Err(e) = fs::create_dir_all(&cache_dir) {
            warn!("Failed to create tile cache directory: {}", e);
        }

        Self::cleanup_old_tiles(&cache_dir);

        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(20))
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to configure tile HTTP client ({}), using defaults", e);
                reqwest::blocking::Client::new()
            });

        Self {
            cache_dir,
            client,
            tiles: Arc::new(Mutex::new(HashMap::new())),
            download_queue: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    fn get_cache_dir() -> PathBuf {
        let mut path = dirs::cache_dir().unwrap_or_else(|| PathBuf::from(".cache"));
        path.push("cityweather-map");
        path.push("tiles");
        path
    }

    fn cleanup_old_tiles(cache_dir: &Path) {
        let now = SystemTime::now();
        let max_age = Duration::from_secs(CACHE_DURATION_DAYS * 24 * 60 * 60);

        if let Ok(entries) = fs::read_dir(cache_dir) {
            for entry in entries.flatten() {
                let expired = entry
                    .metadata()
                    .and_then(|m| m.modified())
                    .ok()
                    .and_then(|modified| now.duration_since(modified).ok())
                    .is_some_and(|age| age > max_age);
                if expired {
                    let _ = fs::remove_file(entry.path());
                    debug!("Removed old tile cache: {:?}", entry.path());
                }
            }
        }
    }

    /// Get tile from cache or queue for download
    pub fn get_tile(
        &self,
        source: &BasemapTileSource,
        coord: TileCoord,
        ctx: &egui::Context,
    ) -> Option<TextureHandle> {
        let mut tiles = self.tiles.lock().unwrap();

        match tiles.get(&coord) {
            Some(TileState::Loaded(texture)) => Some(texture.clone()),
            Some(TileState::Loading | TileState::Failed) => None,
            None => {
                let url = source.tile_url(coord.tile_id());
                let cache_path = self.cache_dir.join(format!("{}.png", cache_filename(&url)));

                if cache_path.exists() {
                    match fs::read(&cache_path)
                        .map_err(|e| e.to_string())
                        .and_then(|bytes| decode_tile(&bytes, coord, ctx))
                    {
                        Ok(texture) => {
                            tiles.insert(coord, TileState::Loaded(texture.clone()));
                            return Some(texture);
                        }
                        Err(e) => warn!("Failed to load cached tile: {}", e),
                    }
                }

                tiles.insert(coord, TileState::Loading);
                self.queue_download(coord, url, cache_path, ctx.clone());
                None
            }
        }
    }

    fn queue_download(&self, coord: TileCoord, url: String, cache_path: PathBuf, ctx: egui::Context) {
        let mut queue = self.download_queue.lock().unwrap();
        if queue.insert(coord) {
            let tiles = Arc::clone(&self.tiles);
            let pending = Arc::clone(&self.download_queue);
            let client = self.client.clone();

            std::thread::spawn(move || {
                let state = match Self::download_tile(&client, &url, &cache_path) {
                    Ok(bytes) => match decode_tile(&bytes, coord, &ctx) {
                        Ok(texture) => TileState::Loaded(texture),
                        Err(e) => {
                            warn!("Failed to decode tile {}: {}", url, e);
                            TileState::Failed
                        }
                    },
                    Err(e) => {
                        warn!("Failed to fetch tile {}: {}", url, e);
                        TileState::Failed
                    }
                };

                tiles.lock().unwrap().insert(coord, state);
                pending.lock().unwrap().remove(&coord);
                ctx.request_repaint();
            });
        }
    }

    fn download_tile(
        client: &reqwest::blocking::Client,
        url: &str,
        cache_path: &Path,
    ) -> Result<Vec<u8>, String> {
        debug!("Downloading tile: {}", url);
        let response = client.get(url).send().map_err(|e| e.to_string())?;
        if !response.status().is_success() {
            return Err(format!("HTTP {}", response.status()));
        }
        let bytes = response.bytes().map_err(|e| e.to_string())?.to_vec();

        if let Err(e) = fs::write(cache_path, &bytes) {
            warn!("Failed to save tile to cache: {}", e);
        }
        Ok(bytes)
    }

    /// Get all tiles needed to cover a viewport
    pub fn get_visible_tiles(
        basemap: &'static str,
        view: &MapView,
        viewport_width: f32,
        viewport_height: f32,
    ) -> Vec<VisibleTile> {
        let tile_zoom = view.zoom.round().clamp(0.0, 19.0) as u8;
        // Tiles are stretched when the view sits between integer zoom levels
        let tile_px = TILE_SIZE * 2_f64.powf(view.zoom - f64::from(tile_zoom));

        let (center_tile_x, center_tile_y) = WebMercator::to_tile(view.center, tile_zoom);

        let tiles_wide = (f64::from(viewport_width) / tile_px).ceil() as i64 + 2;
        let tiles_high = (f64::from(viewport_height) / tile_px).ceil() as i64 + 2;

        let start_x = center_tile_x.floor() as i64 - tiles_wide / 2;
        let start_y = center_tile_y.floor() as i64 - tiles_high / 2;

        let max_tile = 1_i64 << tile_zoom;
        let mut tiles = Vec::new();

        for dy in 0..=tiles_high {
            for dx in 0..=tiles_wide {
                let tile_x = start_x + dx;
                let tile_y = start_y + dy;

                // Latitude doesn't wrap
                if tile_y < 0 || tile_y >= max_tile {
                    continue;
                }
                // Longitude wraps around
                let wrapped_x = tile_x.rem_euclid(max_tile);

                tiles.push(VisibleTile {
                    coord: TileCoord::new(basemap, wrapped_x as u32, tile_y as u32, tile_zoom),
                    offset_x: ((tile_x as f64 - center_tile_x) * tile_px) as f32,
                    offset_y: ((tile_y as f64 - center_tile_y) * tile_px) as f32,
                    size: tile_px as f32,
                });
            }
        }

        tiles
    }

    pub fn has_loading_tiles(&self) -> bool {
        let tiles = self.tiles.lock().unwrap();
        tiles.values().any(|state| matches!(state, TileState::Loading))
    }

    pub fn get_error_count(&self) -> usize {
        let tiles = self.tiles.lock().unwrap();
        tiles.values().filter(|state| matches!(state, TileState::Failed)).count()
    }
}

fn decode_tile(bytes: &[u8], coord: TileCoord, ctx: &egui::Context) -> Result<TextureHandle, String> {
    let img = image::load_from_memory(bytes).map_err(|e| e.to_string())?;
    let rgba = img.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    let color_image = ColorImage::from_rgba_unmultiplied(size, &rgba.into_raw());

    Ok(ctx.load_texture(
        format!("tile_{}_{}_{}/{}", coord.basemap, coord.zoom, coord.x, coord.y),
        color_image,
        egui::TextureOptions::default(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use weather_cluster::Coordinate;

    #[test]
    fn test_visible_tiles_cover_viewport() {
        let view = MapView::new(Coordinate::default(), 2.0);
        let tiles = TileManager::get_visible_tiles("osm", &view, 800.0, 600.0);

        // Zoom 2 has 4x4 tiles; all of them are visible in an 800x600 view
        let mut coords: Vec<_> = tiles.iter().map(|t| (t.coord.x, t.coord.y)).collect();
        coords.sort_unstable();
        coords.dedup();
        assert_eq!(coords.len(), 16);
        assert!(tiles.iter().all(|t| t.coord.zoom == 2 && t.coord.basemap == "osm"));
        assert!(tiles.iter().all(|t| (t.size - 256.0).abs() < 1e-3));
    }

    #[test]
    fn test_center_tile_offset() {
        let view = MapView::new(Coordinate::default(), 1.0);
        let tiles = TileManager::get_visible_tiles("osm", &view, 256.0, 256.0);
        // The world center is the shared corner of the four zoom-1 tiles
        let tile = tiles.iter().find(|t| t.coord.x == 1 && t.coord.y == 1).unwrap();
        assert!(tile.offset_x.abs() < 1e-3);
        assert!(tile.offset_y.abs() < 1e-3);
    }

    #[test]
    fn test_fractional_zoom_scales_tiles() {
        let view = MapView::new(Coordinate::default(), 3.4);
        let tiles = TileManager::get_visible_tiles("osm", &view, 512.0, 512.0);
        let expected = 256.0 * 2_f32.powf(0.4);
        assert!(tiles.iter().all(|t| t.coord.zoom == 3));
        assert!((tiles[0].size - expected).abs() < 1e-2);
    }

    #[test]
    fn test_cache_filename_stable() {
        let a = cache_filename("https://tile.openstreetmap.org/1/0/0.png");
        let b = cache_filename("https://tile.openstreetmap.org/1/0/0.png");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, cache_filename("https://tile.openstreetmap.org/1/0/1.png"));
    }
}
