//! Toolbar rendering for `MapApp`.
//!
//! Draws the universe picker, metric selectors, render-mode selector and the
//! stats toggle.

use eframe::egui;

use market_cityscape::codec::{ColorMetric, HeightMetric};
use market_cityscape::market::mock::Universe;
use market_cityscape::render::RenderMode;

use super::MapApp;

impl MapApp {
    /// Render the top toolbar strip.
    pub fn draw_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.add_space(4.0);

            // Universe + reseed
            let prev_universe = self.universe;
            egui::ComboBox::from_id_salt("universe")
                .selected_text(self.universe.label())
                .show_ui(ui, |ui| {
                    for u in Universe::ALL {
                        ui.selectable_value(&mut self.universe, u, u.label());
                    }
                });
            if self.universe != prev_universe {
                self.regenerate();
            }
            if ui.button("\u{21BB} Reseed").clicked() {
                self.seed = self.seed.wrapping_add(1);
                self.regenerate();
            }

            ui.separator();

            // Height metric
            let mut height = self.engine.height_metric();
            ui.label("Height");
            egui::ComboBox::from_id_salt("height_metric")
                .selected_text(height.label())
                .show_ui(ui, |ui| {
                    for m in HeightMetric::ALL {
                        ui.selectable_value(&mut height, m, m.label());
                    }
                });
            if height != self.engine.height_metric() {
                self.engine.set_height_metric(height);
                self.scene_dirty = true;
            }

            // Color metric
            let mut color = self.engine.color_metric();
            ui.label("Color");
            egui::ComboBox::from_id_salt("color_metric")
                .selected_text(color.label())
                .show_ui(ui, |ui| {
                    for m in ColorMetric::ALL {
                        ui.selectable_value(&mut color, m, m.label());
                    }
                });
            if color != self.engine.color_metric() {
                self.engine.set_color_metric(color);
                self.scene_dirty = true;
            }

            ui.separator();

            // Render mode selector
            let prev_mode = self.render_mode;
            egui::ComboBox::from_id_salt("render_mode")
                .selected_text(match self.render_mode {
                    RenderMode::Planar => "2D",
                    RenderMode::Extruded => "3D",
                    RenderMode::Bubble => "Bubble",
                })
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut self.render_mode, RenderMode::Planar, "2D Treemap");
                    ui.selectable_value(&mut self.render_mode, RenderMode::Extruded, "3D City");
                    ui.selectable_value(&mut self.render_mode, RenderMode::Bubble, "Bubble Chart");
                });
            if self.render_mode != prev_mode {
                self.scene_dirty = true;
            }

            if self.render_mode == RenderMode::Extruded && ui.button("Reset camera").clicked() {
                self.extruded.reset_camera();
                self.scene_dirty = true;
            }

            ui.toggle_value(&mut self.show_stats, "Stats");
        });
    }
}
