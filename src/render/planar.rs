//! Planar adapter: the partition drawn flat, one filled cell per leaf, with
//! optional sector frames and header labels.

use crate::codec::color::Rgba;
use crate::config::PresentationConfig;
use crate::layout::LayoutRect;

use super::derive::RenderState;
use super::{retain_active, PointerEvent, PresentationAdapter};

/// Screen-space rectangle in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenRect {
    pub min: [f32; 2],
    pub max: [f32; 2],
}

impl ScreenRect {
    pub fn width(&self) -> f32 {
        self.max[0] - self.min[0]
    }

    pub fn height(&self) -> f32 {
        self.max[1] - self.min[1]
    }

    pub fn center(&self) -> [f32; 2] {
        [(self.min[0] + self.max[0]) * 0.5, (self.min[1] + self.max[1]) * 0.5]
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.min[0] && x < self.max[0] && y >= self.min[1] && y < self.max[1]
    }

    /// Scale about the center by `factor`.
    pub fn shrunk(&self, factor: f32) -> Self {
        let [cx, cy] = self.center();
        let (hw, hh) = (self.width() * factor * 0.5, self.height() * factor * 0.5);
        Self { min: [cx - hw, cy - hh], max: [cx + hw, cy + hh] }
    }
}

/// Where the map is drawn, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Pixels per map unit and the top-left of the centered square.
    fn fit(&self, extent: f64) -> (f32, [f32; 2]) {
        let side = self.width.min(self.height).max(0.0);
        let scale = side / extent as f32;
        let origin = [self.x + (self.width - side) * 0.5, self.y + (self.height - side) * 0.5];
        (scale, origin)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub text: String,
    pub position: [f32; 2],
    /// Font size in pixels.
    pub size: f32,
}

/// One leaf cell.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanarCell {
    pub index: usize,
    pub rect: ScreenRect,
    pub fill: Rgba,
    pub label: Option<Label>,
}

/// Outline and header of a group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupFrame {
    pub group: usize,
    pub depth: usize,
    pub rect: ScreenRect,
    pub header: Option<Label>,
}

pub struct PlanarAdapter {
    config: PresentationConfig,
    viewport: Viewport,
    cells: Vec<PlanarCell>,
    frames: Vec<GroupFrame>,
    active: Option<usize>,
}

impl PlanarAdapter {
    pub fn new(config: PresentationConfig, viewport: Viewport) -> Self {
        Self {
            config,
            viewport,
            cells: Vec::new(),
            frames: Vec::new(),
            active: None,
        }
    }

    /// Takes effect on the next `render`.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn cells(&self) -> &[PlanarCell] {
        &self.cells
    }

    pub fn frames(&self) -> &[GroupFrame] {
        &self.frames
    }

    /// Fill for cell `index`, lightened while it is hovered.
    pub fn display_fill(&self, index: usize) -> Option<Rgba> {
        let cell = self.cells.get(index)?;
        Some(if self.active == Some(index) {
            cell.fill.lighten(self.config.highlight)
        } else {
            cell.fill
        })
    }

    fn to_screen(&self, r: &LayoutRect, scale: f32, origin: [f32; 2]) -> ScreenRect {
        ScreenRect {
            min: [origin[0] + r.x0 as f32 * scale, origin[1] + r.y0 as f32 * scale],
            max: [origin[0] + r.x1 as f32 * scale, origin[1] + r.y1 as f32 * scale],
        }
    }
}

impl PresentationAdapter for PlanarAdapter {
    type Primitive = PlanarCell;

    fn render(&mut self, state: &RenderState) -> &[PlanarCell] {
        self.active = retain_active(self.active, state);
        self.cells.clear();
        self.frames.clear();
        if state.extent <= 0.0 {
            return &self.cells;
        }

        let (scale, origin) = self.viewport.fit(state.extent);
        let min_size = self.config.label_min_size as f64;

        for node in &state.nodes {
            // map units, like the extruded roof labels
            let (w, d) = (node.rect.width(), node.rect.height());
            let rect = self.to_screen(&node.rect, scale, origin).shrunk(self.config.shrink);
            let label = (w >= min_size && d >= min_size).then(|| Label {
                text: node.ticker.clone(),
                position: rect.center(),
                size: w.min(d) as f32 / self.config.label_divisor * scale,
            });
            self.cells.push(PlanarCell { index: node.index, rect, fill: node.color, label });
        }

        for group in state.groups.iter().filter(|g| g.depth <= self.config.max_group_depth) {
            let rect = self.to_screen(&group.rect, scale, origin);
            let fits = group.rect.width() >= min_size && group.rect.height() >= min_size;
            let header = fits.then(|| Label {
                text: group.name.to_uppercase(),
                position: [rect.min[0] + 2.0, rect.min[1] + 1.0],
                size: (rect.height() * 0.05).clamp(9.0, 14.0),
            });
            self.frames.push(GroupFrame { group: group.index, depth: group.depth, rect, header });
        }

        &self.cells
    }

    fn pick(&self, event: &PointerEvent) -> Option<usize> {
        self.cells
            .iter()
            .find(|c| c.rect.contains(event.x, event.y))
            .map(|c| c.index)
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
    use crate::market::MarketNode;
    use crate::render::derive::derive;

    fn state(config: &EngineConfig, color: ColorMetric) -> RenderState {
        let root = MarketNode::group(
            "Market",
            "MKT",
            vec![
                MarketNode::group("Tech", "TECH", vec![MarketNode::leaf("A", "A", 300.0)]),
                MarketNode::group(
                    "Energy",
                    "NRG",
                    vec![MarketNode::leaf("B", "B", 60.0), MarketNode::leaf("C", "C", 40.0)],
                ),
            ],
        );
        let p = partition(&root, &config.layout);
        derive(&p, HeightMetric::Pe, color, config)
    }

    fn adapter(config: &EngineConfig) -> PlanarAdapter {
        PlanarAdapter::new(config.presentation, Viewport::new(0.0, 0.0, 400.0, 400.0))
    }

    #[test]
    fn one_cell_per_node_in_order() {
        let config = EngineConfig::default();
        let s = state(&config, ColorMetric::Performance);
        let mut a = adapter(&config);
        let cells = a.render(&s);
        assert_eq!(cells.len(), s.nodes.len());
        for (i, cell) in cells.iter().enumerate() {
            assert_eq!(cell.index, i);
        }
    }

    #[test]
    fn pick_hits_the_cell_under_the_pointer() {
        let config = EngineConfig::default();
        let s = state(&config, ColorMetric::Performance);
        let mut a = adapter(&config);
        a.render(&s);
        for cell in a.cells() {
            let [x, y] = cell.rect.center();
            assert_eq!(a.pick(&PointerEvent::new(x, y)), Some(cell.index));
        }
        // root padding strip
        assert_eq!(a.pick(&PointerEvent::new(0.2, 0.2)), None);
        assert_eq!(a.pick(&PointerEvent::new(-10.0, 50.0)), None);
    }

    fn gap(a: &ScreenRect, b: &ScreenRect) -> f32 {
        (b.min[0] - a.max[0])
            .max(a.min[0] - b.max[0])
            .max(b.min[1] - a.max[1])
            .max(a.min[1] - b.max[1])
    }

    #[test]
    fn sibling_cells_are_separated() {
        let config = EngineConfig::default();
        let s = state(&config, ColorMetric::Performance);
        let mut a = adapter(&config);
        let cells = a.render(&s);
        // B and C share the Energy sector
        assert!(gap(&cells[1].rect, &cells[2].rect) > 1.0);
        for (i, x) in cells.iter().enumerate() {
            for y in &cells[i + 1..] {
                assert!(gap(&x.rect, &y.rect) > 0.0);
            }
        }

        let mut solid = PlanarAdapter::new(config.presentation.with_shrink(1.0), Viewport::new(0.0, 0.0, 400.0, 400.0));
        let cells = solid.render(&s);
        assert!(gap(&cells[1].rect, &cells[2].rect).abs() < 1e-3);
    }

    #[test]
    fn picking_the_gutter_finds_nothing() {
        let config = EngineConfig::default();
        let s = state(&config, ColorMetric::Performance);
        let mut a = adapter(&config);
        a.render(&s);
        let (b, c) = (a.cells()[1].rect, a.cells()[2].rect);
        let mid = if b.max[1] <= c.min[1] {
            [b.center()[0], (b.max[1] + c.min[1]) * 0.5]
        } else {
            [(b.max[0] + c.min[0]) * 0.5, b.center()[1]]
        };
        assert_eq!(a.pick(&PointerEvent::new(mid[0], mid[1])), None);
    }

    #[test]
    fn label_threshold_ignores_zoom() {
        let config = EngineConfig::default();
        let s = state(&config, ColorMetric::Performance);
        let shown = |side: f32| {
            let mut a = PlanarAdapter::new(config.presentation, Viewport::new(0.0, 0.0, side, side));
            a.render(&s).iter().map(|c| c.label.is_some()).collect::<Vec<_>>()
        };
        assert_eq!(shown(100.0), shown(4000.0));
    }

    #[test]
    fn viewport_is_letterboxed() {
        let config = EngineConfig::default();
        let s = state(&config, ColorMetric::Performance);
        let mut a = PlanarAdapter::new(config.presentation, Viewport::new(0.0, 0.0, 800.0, 400.0));
        a.render(&s);
        for cell in a.cells() {
            assert!(cell.rect.min[0] >= 200.0 - 1e-3);
            assert!(cell.rect.max[0] <= 600.0 + 1e-3);
        }
    }

    #[test]
    fn hover_survives_metric_switch() {
        let config = EngineConfig::default();
        let mut a = adapter(&config);
        a.render(&state(&config, ColorMetric::Performance));
        let [x, y] = a.cells()[1].rect.center();
        assert_eq!(a.pointer_moved(&PointerEvent::new(x, y)), Some(1));

        a.render(&state(&config, ColorMetric::Debt));
        assert_eq!(a.active_index(), Some(1));
        assert_ne!(a.display_fill(1), Some(a.cells()[1].fill));

        a.pointer_left();
        assert_eq!(a.active_index(), None);
        assert_eq!(a.display_fill(1), Some(a.cells()[1].fill));
    }

    #[test]
    fn active_index_dropped_when_out_of_range() {
        let config = EngineConfig::default();
        let mut a = adapter(&config);
        a.set_active(Some(7));
        a.render(&state(&config, ColorMetric::Performance));
        assert_eq!(a.active_index(), None);
    }

    #[test]
    fn labels_suppressed_on_small_cells() {
        let config = EngineConfig::default();
        let s = state(&config, ColorMetric::Performance);
        let mut strict = PlanarAdapter::new(
            config.presentation.with_label_min_size(1000.0),
            Viewport::new(0.0, 0.0, 400.0, 400.0),
        );
        assert!(strict.render(&s).iter().all(|c| c.label.is_none()));
        let mut loose = adapter(&config);
        let cells = loose.render(&s);
        let label = cells[0].label.as_ref().unwrap();
        assert_eq!(label.text, "A");
        assert!(label.size > 0.0);
    }

    #[test]
    fn frames_follow_group_depth() {
        let config = EngineConfig::default();
        let s = state(&config, ColorMetric::Performance);
        let mut a = adapter(&config);
        a.render(&s);
        assert_eq!(a.frames().len(), 2);
        assert_eq!(a.frames()[0].header.as_ref().unwrap().text, "TECH");

        let mut none = PlanarAdapter::new(
            PresentationConfig { max_group_depth: 0, ..config.presentation },
            Viewport::new(0.0, 0.0, 400.0, 400.0),
        );
        none.render(&s);
        assert!(none.frames().is_empty());
    }

    #[test]
    fn resolve_reads_back_the_node() {
        let config = EngineConfig::default();
        let s = state(&config, ColorMetric::Performance);
        let a = adapter(&config);
        assert_eq!(a.resolve(&s, 0).map(|n| n.ticker.as_str()), Some("A"));
        assert!(a.resolve(&s, 99).is_none());
    }
}
