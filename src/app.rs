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

//! Map window: basemap tiles, the weather cluster overlay and the basemap
//! switcher panel.

use std::path::Path;
use std::sync::mpsc::{self, TryRecvError};

use chrono::{DateTime, Local};
use eframe::egui;
use log::{info, warn};
use weather_cluster::basemap::default_basemaps;
use weather_cluster::{BasemapSwitcher, ClusterLayer, MapView, RenderInstruction};

use crate::basemap_tiles::BasemapTileSource;
use crate::config::AppConfig;
use crate::icons::{fallback_color, IconSet};
use crate::loader::{self, DatasetSource, LoadError};
use crate::tiles::TileManager;

const MIN_ZOOM: f64 = 2.0;
const MAX_ZOOM: f64 = 18.0;
// Scroll points per zoom level
const SCROLL_ZOOM_STEP: f64 = 200.0;
const FALLBACK_RADIUS: f32 = 10.0;
const ICON_MARGIN: f32 = 64.0;

/// State of the one-shot dataset load.
#[derive(Debug)]
enum LoadStatus {
    Loading,
    Loaded { cities: usize, at: DateTime<Local> },
    Failed(String),
}

pub struct WeatherMapApp {
    config: AppConfig,
    view: MapView,
    basemaps: BasemapSwitcher,
    tile_sources: Vec<BasemapTileSource>,
    tile_manager: TileManager,
    tile_error: Option<String>,
    icons: IconSet,
    layer: Option<ClusterLayer>,
    load_rx: Option<mpsc::Receiver<Result<ClusterLayer, LoadError>>>,
    load_status: LoadStatus,
}

impl std::fmt::Debug for WeatherMapApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherMapApp")
            .field("view", &self.view)
            .field("basemap", &self.basemaps.active_id())
            .field("load_status", &self.load_status)
            .finish_non_exhaustive()
    }
}

impl WeatherMapApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        let basemaps = BasemapSwitcher::new(default_basemaps(), &config.active_basemap);
        let tile_sources = default_basemaps()
            .into_iter()
            .map(BasemapTileSource::new)
            .collect();
        let icons = IconSet::load(Path::new(&config.icon_dir), &cc.egui_ctx);

        // The overlay is added once, when the dataset arrives
        let repaint_ctx = cc.egui_ctx.clone();
        let load_rx = loader::spawn_load(
            DatasetSource::parse(&config.dataset_source),
            config.load_options(),
            move || repaint_ctx.request_repaint(),
        );

        let view = MapView::new(config.center(), config.zoom().clamp(MIN_ZOOM, MAX_ZOOM));

        Self {
            config,
            view,
            basemaps,
            tile_sources,
            tile_manager: TileManager::new(),
            tile_error: None,
            icons,
            layer: None,
            load_rx: Some(load_rx),
            load_status: LoadStatus::Loading,
        }
    }

    /// Pick up the dataset load result, if it has arrived.
    fn poll_dataset(&mut self) {
        let received = match self.load_rx.as_ref().map(mpsc::Receiver::try_recv) {
            None | Some(Err(TryRecvError::Empty)) => return,
            Some(Ok(result)) => result,
            Some(Err(TryRecvError::Disconnected)) => {
                Err(LoadError::Runtime(std::io::Error::other("dataset loader stopped")))
            }
        };
        self.load_rx = None;

        match received {
            Ok(layer) => {
                self.load_status = LoadStatus::Loaded {
                    cities: layer.index().len(),
                    at: Local::now(),
                };
                self.layer = Some(layer);
            }
            Err(e) => {
                // Basemaps keep working without the overlay
                self.load_status = LoadStatus::Failed(e.to_string());
            }
        }
    }

    fn select_basemap(&mut self, id: &str) {
        if self.basemaps.select(id) {
            self.config.active_basemap = id.to_string();
            if let Err(e) = self.config.save() {
                warn!("Failed to save config: {}", e);
            }
        }
    }

    fn handle_input(&mut self, ui: &egui::Ui, response: &egui::Response) {
        if response.hovered() {
            let (scroll, pinch) = ui.ctx().input(|i| (i.smooth_scroll_delta.y, i.zoom_delta()));
            let mut zoom_change = f64::from(scroll) / SCROLL_ZOOM_STEP;
            if (pinch - 1.0).abs() > 0.001 {
                zoom_change += f64::from(pinch.log2());
            }
            if zoom_change.abs() > f64::EPSILON {
                self.view.zoom = (self.view.zoom + zoom_change).clamp(MIN_ZOOM, MAX_ZOOM);
            }
        }

        if response.dragged() {
            let delta = response.drag_delta();
            self.view.pan_pixels(f64::from(delta.x), f64::from(delta.y));
        }
    }

    fn draw_map(&mut self, ui: &mut egui::Ui) {
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
        let rect = response.rect;
        let painter = painter.with_clip_rect(rect);
        let center = rect.center();

        painter.rect_filled(rect, 0.0, egui::Color32::from_rgb(200, 220, 240));

        self.handle_input(ui, &response);
        self.draw_basemap(ui.ctx(), &painter, rect);

        let resolution = self.view.resolution();
        let instructions = match self.layer.as_mut() {
            Some(layer) => layer.render(resolution),
            None => Vec::new(),
        };

        let hover = response.hover_pos();
        let mut hover_label = None;
        for instruction in &instructions {
            let (dx, dy) = self.view.to_pixel_offset(instruction.position);
            let pos = center + egui::vec2(dx as f32, dy as f32);
            if !rect.expand(ICON_MARGIN).contains(pos) {
                continue;
            }

            let radius = self.draw_cluster(&painter, pos, instruction);
            if hover.is_some_and(|h| h.distance(pos) <= radius) {
                hover_label = Some((pos - egui::vec2(0.0, radius + 4.0), cluster_label(instruction)));
            }
        }

        if let Some((pos, label)) = hover_label {
            draw_label(&painter, pos, &label);
        }

        painter.text(
            rect.left_bottom() + egui::vec2(10.0, -10.0),
            egui::Align2::LEFT_BOTTOM,
            "Drag to pan | Scroll or pinch to zoom",
            egui::FontId::proportional(12.0),
            egui::Color32::BLACK,
        );

        if let Some(basemap) = self.basemaps.active() {
            painter.text(
                rect.right_bottom() + egui::vec2(-10.0, -10.0),
                egui::Align2::RIGHT_BOTTOM,
                basemap.attribution,
                egui::FontId::proportional(10.0),
                egui::Color32::from_black_alpha(180),
            );
        }

        self.draw_status(&painter, rect);
    }

    fn draw_basemap(&mut self, ctx: &egui::Context, painter: &egui::Painter, rect: egui::Rect) {
        let Some(active) = self.basemaps.active() else {
            return;
        };
        let Some(source) = self.tile_sources.iter().find(|s| s.id() == active.id) else {
            return;
        };

        let center = rect.center();
        let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
        let mut tiles_rendered = 0;

        for tile in TileManager::get_visible_tiles(active.id, &self.view, rect.width(), rect.height()) {
            if let Some(texture) = self.tile_manager.get_tile(source, tile.coord, ctx) {
                let tile_rect = egui::Rect::from_min_size(
                    center + egui::vec2(tile.offset_x, tile.offset_y),
                    egui::vec2(tile.size, tile.size),
                );
                painter.image(texture.id(), tile_rect, uv, egui::Color32::WHITE);
                tiles_rendered += 1;
            }
        }

        // Update error state based on tile loading
        let errors = self.tile_manager.get_error_count();
        if errors > 0 {
            self.tile_error = Some(format!("Failed to load {errors} tiles"));
        } else if self.tile_manager.has_loading_tiles() {
            self.tile_error = Some("Loading map tiles...".to_string());
        } else if tiles_rendered > 0 {
            self.tile_error = None;
        }
    }

    /// Draw one cluster icon and return its hit radius.
    fn draw_cluster(&self, painter: &egui::Painter, pos: egui::Pos2, instruction: &RenderInstruction) -> f32 {
        let icon = instruction.symbol.icon;
        let radius = if let Some(texture) = self.icons.get(icon) {
            let size = texture.size_vec2() * instruction.symbol.scale;
            painter.image(
                texture.id(),
                egui::Rect::from_center_size(pos, size),
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
            size.max_elem() / 2.0
        } else {
            painter.circle_filled(pos, FALLBACK_RADIUS, fallback_color(icon));
            painter.circle_stroke(pos, FALLBACK_RADIUS, egui::Stroke::new(1.5, egui::Color32::WHITE));
            FALLBACK_RADIUS
        };

        if instruction.member_count > 1 {
            let badge = pos + egui::vec2(radius * 0.75, -radius * 0.75);
            painter.circle_filled(badge, 8.0, egui::Color32::from_rgb(40, 40, 40));
            painter.text(
                badge,
                egui::Align2::CENTER_CENTER,
                instruction.member_count.to_string(),
                egui::FontId::proportional(9.0),
                egui::Color32::WHITE,
            );
        }

        radius
    }

    fn draw_status(&self, painter: &egui::Painter, rect: egui::Rect) {
        let message = match &self.load_status {
            LoadStatus::Failed(e) => Some((format!("Weather data unavailable: {e}"), true)),
            LoadStatus::Loading => Some(("Loading weather data...".to_string(), false)),
            LoadStatus::Loaded { .. } => self
                .tile_error
                .as_ref()
                .map(|msg| (msg.clone(), msg.starts_with("Failed"))),
        };
        let Some((message, is_error)) = message else {
            return;
        };

        let bg_color = if is_error {
            egui::Color32::from_rgb(220, 50, 50)
        } else {
            egui::Color32::from_rgb(255, 200, 100)
        };

        let pos = rect.center_top() + egui::vec2(0.0, 20.0);
        let galley = painter.layout_no_wrap(
            message.clone(),
            egui::FontId::proportional(12.0),
            egui::Color32::WHITE,
        );
        let padding = egui::vec2(12.0, 6.0);
        let bubble = egui::Rect::from_center_size(pos, galley.size() + padding * 2.0);

        painter.rect_filled(bubble, 5.0, bg_color);
        painter.text(
            pos,
            egui::Align2::CENTER_CENTER,
            message,
            egui::FontId::proportional(12.0),
            egui::Color32::WHITE,
        );
    }

    fn draw_basemap_switcher(&mut self, ctx: &egui::Context) {
        egui::Window::new("Basemaps")
            .anchor(egui::Align2::LEFT_TOP, egui::vec2(10.0, 10.0))
            .resizable(false)
            .collapsible(true)
            .show(ctx, |ui| {
                let choices: Vec<(&'static str, &'static str)> = self
                    .basemaps
                    .layers()
                    .iter()
                    .map(|b| (b.id, b.title))
                    .collect();

                let mut selected = None;
                for (id, title) in choices {
                    if ui.radio(self.basemaps.is_visible(id), title).clicked() {
                        selected = Some(id);
                    }
                }
                if let Some(id) = selected {
                    info!("Basemap selected from panel: {}", id);
                    self.select_basemap(id);
                }

                ui.separator();
                match &self.load_status {
                    LoadStatus::Loading => ui.label("Weather: loading..."),
                    LoadStatus::Loaded { cities, at } => {
                        ui.label(format!("Weather: {} cities (loaded {})", cities, at.format("%H:%M:%S")))
                    }
                    LoadStatus::Failed(_) => ui.label("Weather: unavailable"),
                };
                ui.label(format!("Zoom {:.1}", self.view.zoom));
            });
    }
}

fn cluster_label(instruction: &RenderInstruction) -> String {
    if instruction.member_count > 1 {
        format!(
            "{} {:.1}°C (hottest of {})",
            instruction.representative, instruction.temperature, instruction.member_count
        )
    } else {
        format!("{} {:.1}°C", instruction.representative, instruction.temperature)
    }
}

fn draw_label(painter: &egui::Painter, pos: egui::Pos2, text: &str) {
    let font = egui::FontId::proportional(11.0);
    let galley = painter.layout_no_wrap(text.to_string(), font.clone(), egui::Color32::WHITE);

    // Draw background box
    let padding = egui::vec2(3.0, 2.0);
    let box_rect = egui::Rect::from_center_size(
        pos - egui::vec2(0.0, galley.size().y / 2.0),
        galley.size() + padding * 2.0,
    );
    painter.rect_filled(box_rect, 2.0, egui::Color32::from_rgba_unmultiplied(0, 0, 0, 180));
    painter.text(
        box_rect.center(),
        egui::Align2::CENTER_CENTER,
        text,
        font,
        egui::Color32::WHITE,
    );
}

impl eframe::App for WeatherMapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_dataset();

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                self.draw_map(ui);
            });

        self.draw_basemap_switcher(ctx);
    }
}
