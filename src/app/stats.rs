//! Right-hand stats panel: source, color legend, selection, cache counters.

use eframe::egui;
use egui::{Color32, RichText};

use market_cityscape::codec::color::Rgba;
use market_cityscape::codec::{ColorMetric, PerformanceTier};
use market_cityscape::config::ColorScale;
use market_cityscape::render::{PresentationAdapter, RenderMode};

use super::{to_color32, MapApp};

fn swatch(ui: &mut egui::Ui, color: Rgba, text: &str) {
    ui.horizontal(|ui| {
        let (rect, _) = ui.allocate_exact_size(egui::vec2(14.0, 14.0), egui::Sense::hover());
        ui.painter().rect_filled(rect, 2.0, to_color32(color));
        ui.label(text);
    });
}

fn color_legend(ui: &mut egui::Ui, color: ColorMetric, scale: &ColorScale) {
    match color {
        ColorMetric::Performance => {
            let (s, m) = (scale.strong_threshold * 100.0, scale.medium_threshold * 100.0);
            let tiers = [
                (PerformanceTier::StrongUp, format!("> +{:.0}%", s)),
                (PerformanceTier::MediumUp, format!("> +{:.0}%", m)),
                (PerformanceTier::LightUp, "≥ 0%".to_string()),
                (PerformanceTier::LightDown, format!("> -{:.0}%", m)),
                (PerformanceTier::MediumDown, format!("> -{:.0}%", s)),
                (PerformanceTier::StrongDown, format!("< -{:.0}%", s)),
            ];
            for (tier, text) in tiers {
                swatch(ui, tier.color(scale), &text);
            }
            swatch(ui, scale.neutral, "no data");
        }
        ColorMetric::Yield => {
            let d = scale.yield_domain;
            for t in [0.0, 0.5, 1.0] {
                let l = scale.yield_lightness.lerp(t);
                let c = Rgba::from_hsl(scale.yield_hue as f32, scale.yield_saturation as f32, l as f32);
                swatch(ui, c, &format!("{:.1}%", d.lerp(t) * 100.0));
            }
        }
        ColorMetric::Debt => {
            let d = scale.debt_domain;
            for t in [0.0, 0.5, 1.0] {
                let h = scale.debt_hue.lerp(t);
                let c = Rgba::from_hsl(h as f32, scale.debt_saturation as f32, scale.debt_lightness as f32);
                swatch(ui, c, &format!("D/E {:.1}", d.lerp(t)));
            }
        }
    }
}

impl MapApp {
    pub fn draw_stats_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Market Map");
        ui.label(RichText::new(&self.source).small().color(Color32::GRAY));
        ui.separator();

        let config = *self.engine.config();
        let (height, color) = (self.engine.height_metric(), self.engine.color_metric());
        if self.render_mode == RenderMode::Bubble {
            ui.label("x: performance   y: rel. volume   size: weight");
            ui.strong("Color: Sector");
            let mut seen: Vec<&str> = Vec::new();
            for b in self.bubble.bubbles() {
                let name = b.sector.as_deref().unwrap_or("Other");
                if !seen.contains(&name) {
                    seen.push(name);
                    swatch(ui, b.fill, name);
                }
            }
        } else {
            ui.label(format!("Area: weight   Height: {}", height.label()));
            ui.strong(format!("Color: {}", color.label()));
            color_legend(ui, color, &config.color);
        }
        ui.separator();

        // Hovered instrument
        let active = match self.render_mode {
            RenderMode::Planar => self.planar.active_index(),
            RenderMode::Extruded => self.extruded.active_index(),
            RenderMode::Bubble => self.bubble.active_index(),
        };
        if let Some(state) = self.engine.render_state() {
            ui.label(format!("{} instruments, {} groups", state.nodes.len(), state.groups.len()));
            if let Some(node) = active.and_then(|i| state.node(i)) {
                ui.strong(format!("{} ({})", node.name, node.ticker));
                for line in node.readout.lines() {
                    ui.label(line);
                }
            }
        }

        // Selected instrument's price history summary
        if let (Some(ticker), Some(chart)) = (&self.selected, &self.selected_chart) {
            ui.separator();
            ui.strong(format!("Selected: {}", ticker));
            if let (Some(first), Some(last)) = (chart.candles().first(), chart.candles().last()) {
                let change = (last.close - first.open) / first.open * 100.0;
                ui.label(format!("{} sessions from {}", chart.len(), first.day));
                ui.label(format!("Last close {:.2} ({:+.2}%)", last.close, change));
            }
        }

        ui.separator();
        let stats = self.engine.stats();
        ui.label(
            RichText::new(format!(
                "partition runs {} / hits {}\nderive runs {} / hits {}",
                stats.partition_runs, stats.partition_hits, stats.derive_runs, stats.derive_hits
            ))
            .small()
            .monospace(),
        );
    }
}
