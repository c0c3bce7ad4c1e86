//! Bubble adapter: the leaves plotted as a scatter chart instead of a map.
//!
//! x = performance in percent, y = relative volume, diameter = weight (log),
//! fill = sector. Built for the commodities universe, where outliers with a
//! big move on heavy volume matter more than relative size.

use crate::codec::color::Rgba;
use crate::config::{BubbleConfig, MetricDomain};

use super::derive::RenderState;
use super::planar::{Label, ScreenRect, Viewport};
use super::{retain_active, PointerEvent, PresentationAdapter};

/// One plotted instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct Bubble {
    pub index: usize,
    pub center: [f32; 2],
    pub radius: f32,
    pub fill: Rgba,
    /// Ticker, just above the bubble.
    pub label: Label,
    pub sector: Option<String>,
    pub performance_percent: f64,
    pub relative_volume: f64,
}

/// Plot area and axis domains of the last render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BubbleAxes {
    pub plot: ScreenRect,
    /// Performance in percent, symmetric around zero.
    pub x: MetricDomain,
    /// Relative volume, starting at zero.
    pub y: MetricDomain,
    /// Screen x of the 0% line.
    pub zero_x: f32,
    /// Screen y of the mean relative volume.
    pub average_y: f32,
}

impl BubbleAxes {
    pub fn to_screen(&self, x: f64, y: f64) -> [f32; 2] {
        let p = &self.plot;
        [
            p.min[0] + self.x.normalize(x) as f32 * p.width(),
            p.max[1] - self.y.normalize(y) as f32 * p.height(),
        ]
    }
}

pub struct BubbleAdapter {
    config: BubbleConfig,
    viewport: Viewport,
    bubbles: Vec<Bubble>,
    axes: Option<BubbleAxes>,
    active: Option<usize>,
}

impl BubbleAdapter {
    pub fn new(config: BubbleConfig, viewport: Viewport) -> Self {
        Self {
            config,
            viewport,
            bubbles: Vec::new(),
            axes: None,
            active: None,
        }
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn bubbles(&self) -> &[Bubble] {
        &self.bubbles
    }

    /// `None` until something has been rendered.
    pub fn axes(&self) -> Option<&BubbleAxes> {
        self.axes.as_ref()
    }

    pub fn opacity(&self) -> f32 {
        self.config.opacity
    }

    fn plot_rect(&self) -> ScreenRect {
        let [top, right, bottom, left] = self.config.margins;
        let v = &self.viewport;
        let min = [v.x + left, v.y + top];
        ScreenRect {
            min,
            max: [
                (v.x + v.width - right).max(min[0] + 1.0),
                (v.y + v.height - bottom).max(min[1] + 1.0),
            ],
        }
    }
}

impl PresentationAdapter for BubbleAdapter {
    type Primitive = Bubble;

    fn render(&mut self, state: &RenderState) -> &[Bubble] {
        self.active = retain_active(self.active, state);
        self.bubbles.clear();
        self.axes = None;
        if state.is_empty() {
            return &self.bubbles;
        }

        // missing readings sit on the zero line / at average volume
        let points: Vec<(f64, f64)> = state
            .nodes
            .iter()
            .map(|n| {
                let a = &n.attributes;
                (
                    a.performance_ratio.filter(|p| p.is_finite()).unwrap_or(0.0) * 100.0,
                    a.relative_volume.filter(|v| v.is_finite()).unwrap_or(1.0),
                )
            })
            .collect();

        let x_abs = points.iter().map(|(x, _)| x.abs()).fold(1.0, f64::max) * 1.1;
        let y_max = points.iter().map(|(_, y)| *y).fold(1.0, f64::max) * 1.1;
        let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / points.len() as f64;

        let mut axes = BubbleAxes {
            plot: self.plot_rect(),
            x: MetricDomain::new(-x_abs, x_abs),
            y: MetricDomain::new(0.0, y_max),
            zero_x: 0.0,
            average_y: 0.0,
        };
        axes.zero_x = axes.to_screen(0.0, 0.0)[0];
        axes.average_y = axes.to_screen(0.0, mean_y)[1];

        // sector ordinals for palette fallback
        let sectors: Vec<usize> = state.groups.iter().filter(|g| g.parent.is_none()).map(|g| g.index).collect();

        for (node, &(x, y)) in state.nodes.iter().zip(&points) {
            let center = axes.to_screen(x, y);
            let radius = self.config.diameter_for(node.weight) * 0.5;
            let sector = state.sector_of(node);
            let fill = match sector {
                Some(g) => {
                    let ordinal = sectors.iter().position(|&i| i == g.index).unwrap_or(0);
                    self.config.sector_color(&g.name, ordinal)
                }
                None => self.config.unassigned,
            };
            self.bubbles.push(Bubble {
                index: node.index,
                center,
                radius,
                fill,
                label: Label {
                    text: node.ticker.clone(),
                    position: [center[0], center[1] - radius - 6.0],
                    size: 10.0,
                },
                sector: sector.map(|g| g.name.clone()),
                performance_percent: x,
                relative_volume: y,
            });
        }

        self.axes = Some(axes);
        &self.bubbles
    }

    /// The bubble whose center is nearest among those under the pointer.
    fn pick(&self, event: &PointerEvent) -> Option<usize> {
        self.bubbles
            .iter()
            .filter_map(|b| {
                let (dx, dy) = (event.x - b.center[0], event.y - b.center[1]);
                let d2 = dx * dx + dy * dy;
                (d2 <= b.radius * b.radius).then_some((b.index, d2))
            })
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
