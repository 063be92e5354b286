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

//! Spherical (Web) Mercator projection.
//!
//! Source data arrives as geographic longitude/latitude degrees (EPSG:4326).
//! Everything the map draws lives in EPSG:3857 meters, which is also the
//! coordinate system clustering distances are measured in.

use std::f64::consts::PI;

/// Earth radius used by EPSG:3857, in meters.
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Half the width of the projected world, in meters.
pub const HALF_WORLD: f64 = PI * EARTH_RADIUS;

/// Tile edge length in pixels.
pub const TILE_SIZE: f64 = 256.0;

/// A point in render-projection (EPSG:3857) meters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Web Mercator projection utilities
#[derive(Debug, Clone, Copy)]
pub struct WebMercator;

impl WebMercator {
    /// Project longitude/latitude degrees into EPSG:3857 meters.
    ///
    /// Latitudes beyond the Mercator limit (about ±85.05°) are clamped to the
    /// edge of the projected world.
    #[must_use]
    pub fn forward(lon: f64, lat: f64) -> Coordinate {
        let x = EARTH_RADIUS * lon.to_radians();
        let y = EARTH_RADIUS * (PI * (lat + 90.0) / 360.0).tan().ln();
        Coordinate::new(x, y.clamp(-HALF_WORLD, HALF_WORLD))
    }

    /// Inverse of [`WebMercator::forward`], returning `(lon, lat)` degrees.
    #[must_use]
    pub fn inverse(coord: Coordinate) -> (f64, f64) {
        let lon = (coord.x / EARTH_RADIUS).to_degrees();
        let lat = 360.0 * (coord.y / EARTH_RADIUS).exp().atan() / PI - 90.0;
        (lon, lat)
    }

    /// Map units per pixel at a (possibly fractional) zoom level.
    #[must_use]
    pub fn resolution_for_zoom(zoom: f64) -> f64 {
        2.0 * HALF_WORLD / TILE_SIZE / 2_f64.powf(zoom)
    }

    /// Convert a projected coordinate into fractional tile coordinates.
    #[must_use]
    pub fn to_tile(coord: Coordinate, zoom: u8) -> (f64, f64) {
        let n = 2_f64.powi(i32::from(zoom));
        let tx = (coord.x + HALF_WORLD) / (2.0 * HALF_WORLD) * n;
        let ty = (HALF_WORLD - coord.y) / (2.0 * HALF_WORLD) * n;
        (tx, ty)
    }

    /// Convert fractional tile coordinates back into a projected coordinate.
    #[must_use]
    pub fn from_tile(tx: f64, ty: f64, zoom: u8) -> Coordinate {
        let n = 2_f64.powi(i32::from(zoom));
        Coordinate::new(
            tx / n * 2.0 * HALF_WORLD - HALF_WORLD,
            HALF_WORLD - ty / n * 2.0 * HALF_WORLD,
        )
    }
}

/// The visible part of the map: a center in projected meters and a
/// fractional zoom level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapView {
    pub center: Coordinate,
    pub zoom: f64,
}

impl MapView {
    #[must_use]
    pub fn new(center: Coordinate, zoom: f64) -> Self {
        Self { center, zoom }
    }

    #[must_use]
    pub fn resolution(&self) -> f64 {
        WebMercator::resolution_for_zoom(self.zoom)
    }

    /// Pixel offset of `coord` from the view center (y grows downward).
    #[must_use]
    pub fn to_pixel_offset(&self, coord: Coordinate) -> (f64, f64) {
        let res = self.resolution();
        ((coord.x - self.center.x) / res, (self.center.y - coord.y) / res)
    }

    /// Projected coordinate at a pixel offset from the view center.
    #[must_use]
    pub fn from_pixel_offset(&self, dx: f64, dy: f64) -> Coordinate {
        let res = self.resolution();
        Coordinate::new(self.center.x + dx * res, self.center.y - dy * res)
    }

    /// Move the center by a pixel drag delta, keeping it inside the world.
    pub fn pan_pixels(&mut self, dx: f64, dy: f64) {
        let res = self.resolution();
        self.center.x = (self.center.x - dx * res).clamp(-HALF_WORLD, HALF_WORLD);
        self.center.y = (self.center.y + dy * res).clamp(-HALF_WORLD, HALF_WORLD);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_origin() {
        let c = WebMercator::forward(0.0, 0.0);
        assert!(c.x.abs() < 1e-9);
        assert!(c.y.abs() < 1e-6);
    }

    #[test]
    fn test_forward_known_point() {
        // Cairo
        let c = WebMercator::forward(31.2357, 30.0444);
        assert!((c.x - 3_477_142.22).abs() < 0.1);
        assert!((c.y - 3_509_258.33).abs() < 0.1);
    }

    #[test]
    fn test_round_trip() {
        for &(lon, lat) in &[
            (0.0, 0.0),
            (-122.4194, 37.7749),
            (151.2093, -33.8688),
            (179.9, 84.0),
            (-179.9, -84.0),
        ] {
            let (lon2, lat2) = WebMercator::inverse(WebMercator::forward(lon, lat));
            assert!((lon - lon2).abs() < 1e-9, "lon {lon} -> {lon2}");
            assert!((lat - lat2).abs() < 1e-9, "lat {lat} -> {lat2}");
        }
    }

    #[test]
    fn test_polar_latitude_clamped() {
        let c = WebMercator::forward(0.0, 90.0);
        assert!((c.y - HALF_WORLD).abs() < 1e-6);
    }

    #[test]
    fn test_resolution_halves_per_zoom() {
        let r0 = WebMercator::resolution_for_zoom(0.0);
        assert!((r0 - 156_543.033_928_041).abs() < 1e-6);
        let r1 = WebMercator::resolution_for_zoom(1.0);
        assert!((r0 / r1 - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_tile_round_trip() {
        let c = WebMercator::forward(-118.4081, 33.9425);
        let (tx, ty) = WebMercator::to_tile(c, 8);
        let back = WebMercator::from_tile(tx, ty, 8);
        assert!((c.x - back.x).abs() < 1e-6);
        assert!((c.y - back.y).abs() < 1e-6);
    }

    #[test]
    fn test_view_pixel_offsets() {
        let view = MapView::new(Coordinate::new(1000.0, 2000.0), 4.0);
        let res = view.resolution();
        let p = Coordinate::new(1000.0 + 10.0 * res, 2000.0 - 5.0 * res);
        let (dx, dy) = view.to_pixel_offset(p);
        assert!((dx - 10.0).abs() < 1e-9);
        assert!((dy - 5.0).abs() < 1e-9);
        let back = view.from_pixel_offset(dx, dy);
        assert!((back.x - p.x).abs() < 1e-6);
        assert!((back.y - p.y).abs() < 1e-6);
    }

    #[test]
    fn test_pan_moves_opposite_to_drag() {
        let mut view = MapView::new(Coordinate::default(), 3.0);
        view.pan_pixels(100.0, 0.0);
        assert!(view.center.x < 0.0);
        view.pan_pixels(0.0, 100.0);
        assert!(view.center.y > 0.0);
    }
}
