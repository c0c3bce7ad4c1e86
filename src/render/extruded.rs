//! Extruded adapter: each leaf becomes a box standing on the map plane,
//! its height set by the height metric.
//!
//! Output is a flat instance buffer (`BoxInstance` is `Pod`, so the slice can
//! be handed to a GPU as-is) plus roof labels for cells large enough to read.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::config::PresentationConfig;

use super::camera::{ray_box, CameraParams};
use super::derive::RenderState;
use super::{retain_active, PointerEvent, PresentationAdapter};

/// One box, in scene units. 40 bytes, no padding.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct BoxInstance {
    pub center: [f32; 3],
    pub scale: [f32; 3],
    pub color: [f32; 4],
}

impl BoxInstance {
    pub fn min(&self) -> Vec3 {
        Vec3::from(self.center) - Vec3::from(self.scale) * 0.5
    }

    pub fn max(&self) -> Vec3 {
        Vec3::from(self.center) + Vec3::from(self.scale) * 0.5
    }
}

/// Ticker text lying on a roof.
#[derive(Debug, Clone, PartialEq)]
pub struct RoofLabel {
    pub index: usize,
    pub text: String,
    /// Just above the roof center.
    pub position: [f32; 3],
    /// Glyph height in scene units.
    pub size: f32,
}

pub struct ExtrudedAdapter {
    config: PresentationConfig,
    camera: CameraParams,
    viewport: [f32; 2],
    extent: f32,
    instances: Vec<BoxInstance>,
    labels: Vec<RoofLabel>,
    active: Option<usize>,
}

impl ExtrudedAdapter {
    pub fn new(config: PresentationConfig, viewport: [f32; 2]) -> Self {
        Self {
            config,
            camera: CameraParams::default(),
            viewport,
            extent: 100.0,
            instances: Vec::new(),
            labels: Vec::new(),
            active: None,
        }
    }

    pub fn camera(&self) -> &CameraParams {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut CameraParams {
        &mut self.camera
    }

    /// Viewport size in pixels; picking assumes the scene fills it.
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport = [width.max(1.0), height.max(1.0)];
    }

    pub fn viewport(&self) -> [f32; 2] {
        self.viewport
    }

    pub fn extent(&self) -> f32 {
        self.extent
    }

    pub fn instances(&self) -> &[BoxInstance] {
        &self.instances
    }

    pub fn labels(&self) -> &[RoofLabel] {
        &self.labels
    }

    /// Instance buffer bytes, ready for a vertex buffer upload.
    pub fn instance_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }

    pub fn highlight(&self) -> f32 {
        self.config.highlight
    }

    /// Reset the orbit to the default three-quarter view of the current map.
    pub fn reset_camera(&mut self) {
        self.camera = CameraParams::framing(self.extent);
    }
}

impl PresentationAdapter for ExtrudedAdapter {
    type Primitive = BoxInstance;

    fn render(&mut self, state: &RenderState) -> &[BoxInstance] {
        self.active = retain_active(self.active, state);
        if state.extent > 0.0 && state.extent as f32 != self.extent {
            self.extent = state.extent as f32;
            self.camera = CameraParams::framing(self.extent);
        }

        self.instances.clear();
        self.labels.clear();
        let min_size = self.config.label_min_size;

        for node in &state.nodes {
            self.instances.push(BoxInstance {
                center: node.center.to_array(),
                scale: node.scale.to_array(),
                color: node.color.to_f32(),
            });

            let (w, d) = (node.scale.x, node.scale.z);
            if w >= min_size && d >= min_size {
                self.labels.push(RoofLabel {
                    index: node.index,
                    text: node.ticker.clone(),
                    position: [node.center.x, node.height + 0.01, node.center.z],
                    size: w.min(d) / self.config.label_divisor,
                });
            }
        }

        &self.instances
    }

    fn pick(&self, event: &PointerEvent) -> Option<usize> {
        let [w, h] = self.viewport;
        if event.x < 0.0 || event.y < 0.0 || event.x > w || event.y > h {
            return None;
        }
        let cam = self.camera.camera();
        let dir = cam.ray_through_pixel(event.x, event.y, w, h);

        self.instances
            .iter()
            .enumerate()
            .filter_map(|(i, b)| ray_box(cam.origin, dir, b.min(), b.max()).map(|t| (i, t)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    fn active_index(&self) -> Option<usize> {
        self.active
    }

    fn set_active(&mut self, index: Option<usize>) {
        self.active = index;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{ColorMetric, HeightMetric};
    use crate::config::EngineConfig;
    use crate::layout::partition;
    use crate::market::{Attributes, MarketNode};
    use crate::render::derive::derive;

    fn state(height: HeightMetric) -> RenderState {
        let config = EngineConfig::default();
        let root = MarketNode::group(
            "Market",
            "MKT",
            vec![
                MarketNode::leaf("Alpha", "A", 300.0)
                    .with_attributes(Attributes { pe_ratio: Some(60.0), ..Attributes::default() }),
                MarketNode::leaf("Beta", "B", 100.0)
                    .with_attributes(Attributes { pe_ratio: Some(5.0), ..Attributes::default() }),
            ],
        );
        derive(&partition(&root, &config.layout), height, ColorMetric::Performance, &config)
    }

    fn adapter() -> ExtrudedAdapter {
        ExtrudedAdapter::new(PresentationConfig::default(), [640.0, 480.0])
    }

    #[test]
    fn instance_layout_is_gpu_friendly() {
        assert_eq!(std::mem::size_of::<BoxInstance>(), 40);
        let mut a = adapter();
        a.render(&state(HeightMetric::Pe));
        assert_eq!(a.instance_bytes().len(), 80);
    }

    #[test]
    fn boxes_stand_on_the_plane() {
        let mut a = adapter();
        let s = state(HeightMetric::Pe);
        let boxes = a.render(&s).to_vec();
        assert_eq!(boxes.len(), 2);
        for (b, node) in boxes.iter().zip(&s.nodes) {
            assert!(b.min().y.abs() < 1e-5);
            assert!((b.max().y - node.height).abs() < 1e-5);
        }
        assert!(boxes[0].scale[1] > boxes[1].scale[1]);
    }

    #[test]
    fn roof_labels_sized_by_footprint() {
        let mut a = adapter();
        let s = state(HeightMetric::Pe);
        a.render(&s);
        let label = &a.labels()[0];
        assert_eq!(label.text, "A");
        let n = &s.nodes[0];
        assert!((label.size - n.scale.x.min(n.scale.z) / 3.5).abs() < 1e-5);
        assert!(label.position[1] > n.height);
    }

    #[test]
    fn pick_finds_box_under_pointer() {
        let mut a = adapter();
        a.render(&state(HeightMetric::Pe));
        let cam = a.camera().camera();
        // scan for a pixel that sees the tall box
        let mut found = false;
        for py in (0..480).step_by(8) {
            for px in (0..640).step_by(8) {
                let event = PointerEvent::new(px as f32, py as f32);
                if let Some(i) = a.pick(&event) {
                    let dir = cam.ray_through_pixel(event.x, event.y, 640.0, 480.0);
                    let b = a.instances()[i];
                    assert!(ray_box(cam.origin, dir, b.min(), b.max()).is_some());
                    found |= i == 0;
                }
            }
        }
        assert!(found);
        assert_eq!(a.pick(&PointerEvent::new(-1.0, 10.0)), None);
    }

    #[test]
    fn pick_prefers_nearest_box() {
        let mut a = adapter();
        a.render(&state(HeightMetric::Pe));
        // straight down over the center of box 1: its roof is the first hit
        let b = a.instances()[1];
        let cam = a.camera_mut();
        cam.target = [b.center[0], 0.0, b.center[2]];
        cam.elevation = 1.5;
        cam.distance = 60.0;
        assert_eq!(a.pick(&PointerEvent::new(320.0, 240.0)), Some(1));
    }

    #[test]
    fn hover_survives_height_switch() {
        let mut a = adapter();
        a.render(&state(HeightMetric::Pe));
        a.set_active(Some(0));
        a.render(&state(HeightMetric::MarketCap));
        assert_eq!(a.active_index(), Some(0));
        a.pointer_left();
        assert_eq!(a.active_index(), None);
    }
}
