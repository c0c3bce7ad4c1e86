pub mod bubble;
pub mod camera;
pub mod derive;
pub mod extruded;
pub mod planar;
pub mod raster;

use derive::{EncodedNode, RenderState};

/// Presentation mode for the map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Flat nested treemap
    #[default]
    Planar,
    /// Boxes extruded by the height metric
    Extruded,
    /// Scatter of performance against relative volume
    Bubble,
}

impl RenderMode {
    pub fn name(self) -> &'static str {
        match self {
            RenderMode::Planar => "planar",
            RenderMode::Extruded => "extruded",
            RenderMode::Bubble => "bubble",
        }
    }

    /// Accepts `planar`/`2d`, `extruded`/`3d` and `bubble`/`scatter`;
    /// anything else is planar.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "planar" | "2d" | "flat" => RenderMode::Planar,
            "extruded" | "3d" | "city" => RenderMode::Extruded,
            "bubble" | "bubbles" | "scatter" => RenderMode::Bubble,
            other => {
                log::warn!("Unknown render mode '{}', using planar", other);
                RenderMode::Planar
            }
        }
    }
}

/// Pointer position in viewport pixels, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub x: f32,
    pub y: f32,
}

impl PointerEvent {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Turns a [`RenderState`] into drawable primitives and owns hover state.
///
/// Primitive `i` always belongs to `state.nodes[i]`, so a picked index can be
/// resolved against the state it was rendered from.
pub trait PresentationAdapter {
    type Primitive;

    /// Rebuild primitives. Keeps the active index when it is still in range.
    fn render(&mut self, state: &RenderState) -> &[Self::Primitive];

    /// Index of the node under the pointer, if any.
    fn pick(&self, event: &PointerEvent) -> Option<usize>;

    fn active_index(&self) -> Option<usize>;

    fn set_active(&mut self, index: Option<usize>);

    /// Pointer enter/move: the picked node becomes active.
    fn pointer_moved(&mut self, event: &PointerEvent) -> Option<usize> {
        let hit = self.pick(event);
        self.set_active(hit);
        hit
    }

    fn pointer_left(&mut self) {
        self.set_active(None);
    }

    fn resolve<'s>(&self, state: &'s RenderState, index: usize) -> Option<&'s EncodedNode> {
        state.node(index)
    }
}

/// Drop an active index the new state no longer has.
pub(crate) fn retain_active(active: Option<usize>, state: &RenderState) -> Option<usize> {
    active.filter(|&i| i < state.nodes.len())
}
