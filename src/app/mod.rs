//! `MapApp`, the top-level egui application state.
//!
//! Methods are split across the sibling sub-modules:
//!
//! - `toolbar` — universe, metric and mode selectors
//! - `content` — the map viewport (planar painter, ray-cast city or bubble chart)
//! - `stats`   — side panel with legend, hover readout and cache counters

pub mod content;
pub mod stats;
pub mod toolbar;

use eframe::egui;

use market_cityscape::codec::color::Rgba;
use market_cityscape::engine::MapEngine;
use market_cityscape::market::chart::{self, ChartSeries};
use market_cityscape::market::mock::{self, Universe};
use market_cityscape::market::Snapshot;
use market_cityscape::render::bubble::BubbleAdapter;
use market_cityscape::render::extruded::ExtrudedAdapter;
use market_cityscape::render::planar::{PlanarAdapter, Viewport};
use market_cityscape::render::{PresentationAdapter, RenderMode};

// ─── Application state ───────────────────────────────────────────────────────

pub struct MapApp {
    pub engine: MapEngine,
    pub render_mode: RenderMode,
    pub universe: Universe,
    pub seed: u64,
    /// Where the current tree came from, for the status line.
    pub source: String,
    pub show_stats: bool,
    pub planar: PlanarAdapter,
    pub extruded: ExtrudedAdapter,
    pub bubble: BubbleAdapter,
    // 3-D view
    pub scene_texture: Option<egui::TextureHandle>,
    pub scene_dirty: bool,
    pub cam_dragging: bool,
    pub scene_size: [usize; 2],
    // Clicked instrument and its demo price history
    pub selected: Option<String>,
    pub selected_chart: Option<ChartSeries>,
}

impl MapApp {
    pub fn new(engine: MapEngine, render_mode: RenderMode, universe: Universe, seed: u64, source: String) -> Self {
        let presentation = engine.config().presentation;
        let bubble = engine.config().bubble;
        Self {
            engine,
            render_mode,
            universe,
            seed,
            source,
            show_stats: true,
            planar: PlanarAdapter::new(presentation, Viewport::new(0.0, 0.0, 1.0, 1.0)),
            extruded: ExtrudedAdapter::new(presentation, [1.0, 1.0]),
            bubble: BubbleAdapter::new(bubble, Viewport::new(0.0, 0.0, 1.0, 1.0)),
            scene_texture: None,
            scene_dirty: true,
            cam_dragging: false,
            scene_size: [0, 0],
            selected: None,
            selected_chart: None,
        }
    }

    /// Replace the tree with a freshly generated mock universe.
    pub fn regenerate(&mut self) {
        self.engine.set_snapshot(Snapshot::new(mock::generate(self.universe, self.seed)));
        self.source = format!("mock {} (seed {})", self.universe.label(), self.seed);
        self.planar.pointer_left();
        self.extruded.pointer_left();
        self.bubble.pointer_left();
        self.extruded.reset_camera();
        self.selected = None;
        self.selected_chart = None;
        self.scene_dirty = true;
    }

    pub fn select(&mut self, ticker: &str) {
        let seed = ticker.bytes().fold(self.seed, |h, b| h.wrapping_mul(31).wrapping_add(b as u64));
        let today = chrono::Local::now().date_naive();
        self.selected_chart = Some(chart::mock_series(seed, 60, today));
        self.selected = Some(ticker.to_string());
    }
}

pub fn to_color32(c: Rgba) -> egui::Color32 {
    egui::Color32::from_rgba_unmultiplied(c.r, c.g, c.b, c.a)
}

impl eframe::App for MapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(egui::Visuals::dark());

        // Top toolbar
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            self.draw_toolbar(ui);
        });

        // Stats side panel
        if self.show_stats {
            egui::SidePanel::right("stats")
                .default_width(240.0)
                .show(ctx, |ui| {
                    self.draw_stats_panel(ui);
                });
        }

        // Main content area
        let ctx_clone = ctx.clone();
        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                self.draw_content(ui, &ctx_clone);
            });
    }
}
