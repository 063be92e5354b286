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

mod app;
mod basemap_tiles;
mod config;
mod icons;
mod loader;
mod tiles;

use clap::Parser;
use eframe::egui;
use log::{info, warn};

use app::WeatherMapApp;
use config::AppConfig;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// City weather map with clustered weather icons
#[derive(Parser, Debug)]
#[command(name = "cityweather-map", version)]
#[command(about = "City weather map with clustered weather icons", long_about = None)]
struct Args {
    /// Weather dataset file path or http(s) URL
    #[arg(short, long)]
    data: Option<String>,

    /// Initial basemap (osm, light_gray_alidade, dark_alidade)
    #[arg(short, long)]
    basemap: Option<String>,

    /// Initial zoom level
    #[arg(short, long)]
    zoom: Option<f64>,

    /// Directory holding the weather icon PNGs
    #[arg(long)]
    icons: Option<String>,

    /// Skip malformed city records instead of failing the load
    #[arg(long)]
    skip_invalid: bool,

    /// Extra dataset fetch attempts after a failure
    #[arg(long)]
    retries: Option<u32>,
}

impl Args {
    /// Command-line values take precedence over the stored config.
    fn apply(self, config: &mut AppConfig) {
        if let Some(data) = self.data {
            config.dataset_source = data;
        }
        if let Some(basemap) = self.basemap {
            config.active_basemap = basemap;
        }
        if let Some(zoom) = self.zoom {
            config.default_zoom = zoom;
        }
        if let Some(icons) = self.icons {
            config.icon_dir = icons;
        }
        if self.skip_invalid {
            config.skip_invalid_records = true;
        }
        if let Some(retries) = self.retries {
            config.load_retries = retries;
        }
    }
}

fn main() -> Result<(), eframe::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    info!("Starting CityWeather Map...");

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        warn!("Failed to load config ({}), using defaults", e);
        AppConfig::default()
    });
    if let Ok(path) = AppConfig::get_config_path() {
        info!("Config file: {}", path.display());
    }
    args.apply(&mut config);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_title("CityWeather Map"),
        ..Default::default()
    };

    eframe::run_native(
        "CityWeather Map",
        options,
        Box::new(move |cc| Ok(Box::new(WeatherMapApp::new(cc, config)))),
    )
}
