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

//! Weather icon textures.
//!
//! Icons are read once from the icon directory at startup. An icon that is
//! missing or cannot be decoded is drawn as a colored disc instead.

use std::collections::HashMap;
use std::path::Path;

use egui::{Color32, ColorImage, TextureHandle};
use log::{info, warn};
use weather_cluster::WeatherIcon;

/// Loaded icon textures keyed by icon.
pub struct IconSet {
    textures: HashMap<WeatherIcon, TextureHandle>,
}

impl std::fmt::Debug for IconSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IconSet")
            .field("loaded", &self.textures.len())
            .finish()
    }
}

impl IconSet {
    /// Load every icon found in `dir`.
    pub fn load(dir: &Path, ctx: &egui::Context) -> Self {
        let mut textures = HashMap::new();

        for icon in WeatherIcon::ALL {
            let path = dir.join(icon.file_name());
            match load_image(&path) {
                Ok(image) => {
                    let texture = ctx.load_texture(
                        format!("icon_{}", icon.file_name()),
                        image,
                        egui::TextureOptions::LINEAR,
                    );
                    textures.insert(icon, texture);
                }
                Err(e) => warn!("Weather icon {} unavailable: {}", path.display(), e),
            }
        }

        info!("Loaded {} of {} weather icons", textures.len(), WeatherIcon::ALL.len());
        Self { textures }
    }

    pub fn get(&self, icon: WeatherIcon) -> Option<&TextureHandle> {
        self.textures.get(&icon)
    }
}

fn load_image(path: &Path) -> Result<ColorImage, String> {
    let bytes = std::fs::read(path).map_err(|e| e.to_string())?;
    let img = image::load_from_memory(&bytes).map_err(|e| e.to_string())?;
    let rgba = img.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(ColorImage::from_rgba_unmultiplied(size, &rgba.into_raw()))
}

/// Color used when an icon texture is not available.
pub fn fallback_color(icon: WeatherIcon) -> Color32 {
    match icon {
        WeatherIcon::Sunny => Color32::from_rgb(255, 190, 40),
        WeatherIcon::Cloud => Color32::from_rgb(170, 180, 190),
        WeatherIcon::Rainy => Color32::from_rgb(60, 120, 220),
        WeatherIcon::Thunderstorm => Color32::from_rgb(120, 60, 170),
        WeatherIcon::CloudyWithRain => Color32::from_rgb(90, 150, 160),
    }
}
