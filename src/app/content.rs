//! Main viewport for `MapApp`.
//!
//! Planar and bubble modes paint the adapter's primitives with egui's painter
//! every frame. Extruded mode ray-casts the box instances into a texture, re-rendering
//! only when the camera, hover, metrics or viewport size change.

use eframe::egui;
use egui::{Align2, Color32, FontId, Pos2, Rect, RichText, Rounding, Sense, Shape, Stroke};

use market_cityscape::render::bubble::Bubble;
use market_cityscape::render::derive::EncodedNode;
use market_cityscape::render::planar::{ScreenRect, Viewport};
use market_cityscape::render::raster::{render_scene, RasterScene};
use market_cityscape::render::{PointerEvent, PresentationAdapter, RenderMode};

use super::{to_color32, MapApp};

fn to_rect(r: &ScreenRect) -> Rect {
    Rect::from_min_max(Pos2::new(r.min[0], r.min[1]), Pos2::new(r.max[0], r.max[1]))
}

/// Label color with enough contrast against `fill`.
fn ink_for(fill: Color32) -> Color32 {
    let luma = 0.299 * fill.r() as f32 + 0.587 * fill.g() as f32 + 0.114 * fill.b() as f32;
    if luma > 150.0 {
        Color32::from_rgb(15, 23, 42)
    } else {
        Color32::WHITE
    }
}

fn bubble_card(ui: &mut egui::Ui, node: &EncodedNode, bubble: &Bubble) {
    ui.strong(&node.name);
    ui.monospace(&node.ticker);
    if let Some(sector) = &bubble.sector {
        ui.label(RichText::new(sector).color(Color32::GRAY));
    }
    ui.separator();
    let perf = if bubble.performance_percent >= 0.0 {
        Color32::from_rgb(0x4a, 0xde, 0x80)
    } else {
        Color32::from_rgb(0xf8, 0x71, 0x71)
    };
    ui.label(RichText::new(format!("Performance: {:.2}%", bubble.performance_percent)).color(perf));
    ui.label(format!("Relative Vol: {:.2}x", bubble.relative_volume));
}

fn hover_card(ui: &mut egui::Ui, node: &EncodedNode) {
    ui.strong(&node.name);
    ui.monospace(&node.ticker);
    for line in node.readout.lines() {
        ui.label(line);
    }
}

impl MapApp {
    pub fn draw_content(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        match self.render_mode {
            RenderMode::Planar => self.draw_planar(ui),
            RenderMode::Extruded => self.draw_extruded(ui, ctx),
            RenderMode::Bubble => self.draw_bubble(ui),
        }
    }

    // ── 2D treemap ──

    fn draw_planar(&mut self, ui: &mut egui::Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click().union(Sense::hover()));
        let presentation = self.engine.config().presentation;
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, Rounding::ZERO, to_color32(presentation.background));

        let Some(state) = self.engine.render_state() else {
            painter.text(rect.center(), Align2::CENTER_CENTER, "No snapshot loaded", FontId::proportional(16.0), Color32::GRAY);
            return;
        };

        self.planar
            .set_viewport(Viewport::new(rect.min.x, rect.min.y, rect.width(), rect.height()));
        self.planar.render(state);

        match response.hover_pos() {
            Some(pos) => {
                self.planar.pointer_moved(&PointerEvent::new(pos.x, pos.y));
            }
            None => self.planar.pointer_left(),
        }

        for cell in self.planar.cells() {
            let fill = to_color32(self.planar.display_fill(cell.index).unwrap_or(cell.fill));
            let r = to_rect(&cell.rect);
            painter.rect_filled(r, Rounding::ZERO, fill);
            if let Some(label) = &cell.label {
                painter.text(
                    Pos2::new(label.position[0], label.position[1]),
                    Align2::CENTER_CENTER,
                    &label.text,
                    FontId::proportional(label.size.clamp(6.0, 48.0)),
                    ink_for(fill),
                );
            }
        }

        let frame_color = to_color32(presentation.frame);
        for frame in self.planar.frames() {
            let r = to_rect(&frame.rect);
            painter.rect_stroke(r, Rounding::ZERO, Stroke::new(1.0, frame_color));
            if let Some(header) = &frame.header {
                painter.text(
                    Pos2::new(header.position[0], header.position[1]),
                    Align2::LEFT_TOP,
                    &header.text,
                    FontId::proportional(header.size),
                    Color32::from_white_alpha(200),
                );
            }
        }

        if let Some(index) = self.planar.active_index() {
            if let Some(cell) = self.planar.cells().get(index) {
                painter.rect_stroke(to_rect(&cell.rect), Rounding::ZERO, Stroke::new(2.0, Color32::WHITE));
            }
            let clicked = response.clicked();
            if let Some(node) = self.planar.resolve(state, index) {
                let ticker = node.ticker.clone();
                response.on_hover_ui_at_pointer(|ui| hover_card(ui, node));
                if clicked {
                    self.select(&ticker);
                }
            }
        }
    }

    // ── 3D city ──

    fn draw_extruded(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let extent = self.extruded.extent();

        // Drag to orbit, scroll to dolly
        if response.dragged() {
            let delta = response.drag_delta();
            self.extruded.camera_mut().orbit(delta.x * 0.008, -delta.y * 0.008);
            self.scene_dirty = true;
            self.cam_dragging = true;
        } else {
            self.cam_dragging = false;
        }
        if response.hovered() {
            let scroll = ui.input(|i| i.raw_scroll_delta.y);
            if scroll.abs() > 0.1 {
                self.extruded.camera_mut().zoom(1.0 - scroll * 0.003, extent * 0.3, extent * 4.0);
                self.scene_dirty = true;
            }
        }

        let presentation = self.engine.config().presentation;
        let Some(state) = self.engine.render_state() else {
            ui.painter_at(rect).text(rect.center(), Align2::CENTER_CENTER, "No snapshot loaded", FontId::proportional(16.0), Color32::GRAY);
            return;
        };

        self.extruded.set_viewport(rect.width(), rect.height());
        self.extruded.render(state);

        let prev_active = self.extruded.active_index();
        match response.hover_pos() {
            Some(pos) if !self.cam_dragging => {
                self.extruded
                    .pointer_moved(&PointerEvent::new(pos.x - rect.min.x, pos.y - rect.min.y));
            }
            _ => self.extruded.pointer_left(),
        }
        if self.extruded.active_index() != prev_active {
            self.scene_dirty = true;
        }

        // Lower resolution while dragging keeps the orbit responsive
        let scale = if self.cam_dragging { 0.35 } else { 1.0 };
        let w = ((rect.width() * scale) as usize).clamp(1, 1280);
        let h = ((rect.height() * scale) as usize).clamp(1, 960);
        if self.scene_size != [w, h] {
            self.scene_dirty = true;
        }

        if self.scene_dirty || self.scene_texture.is_none() {
            let scene = RasterScene {
                instances: self.extruded.instances(),
                extent: self.extruded.extent(),
                background: presentation.background,
                ground: presentation.ground,
                highlight: self.extruded.active_index().map(|i| (i, self.extruded.highlight())),
            };
            let pixels = render_scene(&scene, self.extruded.camera(), w, h);
            let image = egui::ColorImage::from_rgba_unmultiplied([w, h], &pixels);
            self.scene_texture = Some(ctx.load_texture("city_view", image, egui::TextureOptions::LINEAR));
            self.scene_size = [w, h];
            self.scene_dirty = false;
            if self.cam_dragging {
                ctx.request_repaint();
            }
        }

        let painter = ui.painter_at(rect);
        if let Some(tex) = &self.scene_texture {
            painter.image(
                tex.id(),
                rect,
                Rect::from_min_max(Pos2::new(0.0, 0.0), Pos2::new(1.0, 1.0)),
                Color32::WHITE,
            );
        }

        // Roof labels, projected with the same camera the raster used
        let cam = self.extruded.camera().camera();
        for label in self.extruded.labels() {
            let world = glam::Vec3::from(label.position);
            if let Some((px, z)) = cam.project(world, rect.width(), rect.height()) {
                let size = label.size * cam.pixels_per_unit(z, rect.height());
                if size >= 7.0 {
                    painter.text(
                        Pos2::new(rect.min.x + px[0], rect.min.y + px[1]),
                        Align2::CENTER_CENTER,
                        &label.text,
                        FontId::proportional(size.min(32.0)),
                        Color32::WHITE,
                    );
                }
            }
        }

        if let Some(index) = self.extruded.active_index() {
            let clicked = response.clicked();
            if let Some(node) = self.extruded.resolve(state, index) {
                let ticker = node.ticker.clone();
                response.on_hover_ui_at_pointer(|ui| hover_card(ui, node));
                if clicked {
                    self.select(&ticker);
                }
            }
        }
    }

    // ── Bubble chart ──

    fn draw_bubble(&mut self, ui: &mut egui::Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click().union(Sense::hover()));
        let presentation = self.engine.config().presentation;
        let neutral = self.engine.config().color.neutral;
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, Rounding::ZERO, to_color32(presentation.background));

        let Some(state) = self.engine.render_state() else {
            painter.text(rect.center(), Align2::CENTER_CENTER, "No snapshot loaded", FontId::proportional(16.0), Color32::GRAY);
            return;
        };

        self.bubble
            .set_viewport(Viewport::new(rect.min.x, rect.min.y, rect.width(), rect.height()));
        self.bubble.render(state);
        match response.hover_pos() {
            Some(pos) => {
                self.bubble.pointer_moved(&PointerEvent::new(pos.x, pos.y));
            }
            None => self.bubble.pointer_left(),
        }

        let Some(axes) = self.bubble.axes().copied() else {
            return;
        };
        let plot = to_rect(&axes.plot);
        let grid = Stroke::new(1.0, to_color32(presentation.frame));
        let axis_ink = Color32::from_rgb(0x94, 0xa3, 0xb8);
        let font = FontId::proportional(11.0);

        // Dashed grid with tick labels
        for i in 0..=4 {
            let t = i as f64 / 4.0;
            let (xv, yv) = (axes.x.lerp(t), axes.y.lerp(t));
            let [x, _] = axes.to_screen(xv, 0.0);
            let [_, y] = axes.to_screen(0.0, yv);
            painter.extend(Shape::dashed_line(&[Pos2::new(x, plot.top()), Pos2::new(x, plot.bottom())], grid, 4.0, 4.0));
            painter.extend(Shape::dashed_line(&[Pos2::new(plot.left(), y), Pos2::new(plot.right(), y)], grid, 4.0, 4.0));
            painter.text(Pos2::new(x, plot.bottom() + 4.0), Align2::CENTER_TOP, format!("{:.1}%", xv), font.clone(), axis_ink);
            painter.text(Pos2::new(plot.left() - 6.0, y), Align2::RIGHT_CENTER, format!("{:.1}x", yv), font.clone(), axis_ink);
        }
        painter.text(Pos2::new(plot.center().x, plot.bottom() + 20.0), Align2::CENTER_TOP, "Performance %", font.clone(), axis_ink);
        painter.text(Pos2::new(rect.left() + 4.0, plot.top() - 18.0), Align2::LEFT_TOP, "Relative Volume", font.clone(), axis_ink);

        // Zero-move line and average-volume line
        painter.line_segment(
            [Pos2::new(axes.zero_x, plot.top()), Pos2::new(axes.zero_x, plot.bottom())],
            Stroke::new(1.0, Color32::from_rgb(0x47, 0x55, 0x69)),
        );
        painter.extend(Shape::dashed_line(
            &[Pos2::new(plot.left(), axes.average_y), Pos2::new(plot.right(), axes.average_y)],
            Stroke::new(1.0, to_color32(neutral)),
            6.0,
            4.0,
        ));

        // Big bubbles first so small ones stay visible
        let alpha = (self.bubble.opacity() * 255.0) as u8;
        let mut order: Vec<&Bubble> = self.bubble.bubbles().iter().collect();
        order.sort_by(|a, b| b.radius.total_cmp(&a.radius));
        let active = self.bubble.active_index();
        for b in order {
            let c = to_color32(b.fill);
            let fill = Color32::from_rgba_unmultiplied(c.r(), c.g(), c.b(), alpha);
            let width = if active == Some(b.index) { 2.5 } else { 1.0 };
            let center = Pos2::new(b.center[0], b.center[1]);
            painter.circle(center, b.radius, fill, Stroke::new(width, Color32::WHITE));
            painter.text(
                Pos2::new(b.label.position[0], b.label.position[1]),
                Align2::CENTER_BOTTOM,
                &b.label.text,
                FontId::proportional(b.label.size),
                Color32::WHITE,
            );
        }

        if let Some(index) = active {
            let clicked = response.clicked();
            let bubble = self.bubble.bubbles().get(index).cloned();
            if let (Some(node), Some(bubble)) = (self.bubble.resolve(state, index), bubble) {
                let ticker = node.ticker.clone();
                response.on_hover_ui_at_pointer(|ui| bubble_card(ui, node, &bubble));
                if clicked {
                    self.select(&ticker);
                }
            }
        }
    }
}
