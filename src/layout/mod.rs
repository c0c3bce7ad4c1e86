//! Space partitioner: weighted market tree → nested treemap rectangles.
//!
//! Pipeline per internal node:
//!   1. Inset its rectangle by `padding` (plus the header band for sectors)
//!   2. Drop children with no positive effective weight
//!   3. Sort the rest by effective weight, descending (stable)
//!   4. Squarify them into the inset rectangle and recurse
//!
//! The output is flat: leaves in depth-first, weight-descending order, which
//! is the index every later stage (and picking) refers to.

pub mod squarify;

use std::ops::Range;

use crate::config::LayoutConfig;
use crate::market::{Instrument, MarketNode};

/// Axis-aligned rectangle in map units. `y` grows downward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutRect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl LayoutRect {
    pub const fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub const fn square(extent: f64) -> Self {
        Self::new(0.0, 0.0, extent, extent)
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.x0 + self.x1) * 0.5, (self.y0 + self.y1) * 0.5)
    }

    pub fn contains_rect(&self, other: &LayoutRect) -> bool {
        const EPS: f64 = 1e-9;
        other.x0 >= self.x0 - EPS
            && other.y0 >= self.y0 - EPS
            && other.x1 <= self.x1 + EPS
            && other.y1 <= self.y1 + EPS
    }

    /// Area shared with `other` (0 when they only touch).
    pub fn overlap_area(&self, other: &LayoutRect) -> f64 {
        let w = self.x1.min(other.x1) - self.x0.max(other.x0);
        let h = self.y1.min(other.y1) - self.y0.max(other.y0);
        if w > 0.0 && h > 0.0 {
            w * h
        } else {
            0.0
        }
    }

    /// Shrink each side by the given amount. An axis that would collapse is
    /// replaced by a span of `min_span` (never wider than the original)
    /// centered on the original.
    pub fn inset(&self, left: f64, top: f64, right: f64, bottom: f64, min_span: f64) -> Self {
        let (x0, x1) = inset_axis(self.x0, self.x1, left, right, min_span);
        let (y0, y1) = inset_axis(self.y0, self.y1, top, bottom, min_span);
        Self { x0, y0, x1, y1 }
    }
}

fn inset_axis(lo: f64, hi: f64, before: f64, after: f64, min_span: f64) -> (f64, f64) {
    let (a, b) = (lo + before, hi - after);
    if b - a >= min_span && b > a {
        return (a, b);
    }
    let half = min_span.min(hi - lo) * 0.5;
    let mid = (lo + hi) * 0.5;
    (mid - half, mid + half)
}

/// A leaf with its rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLeaf {
    pub index: usize,
    pub instrument: Instrument,
    pub rect: LayoutRect,
    /// Root children sit at depth 1.
    pub depth: usize,
    /// Innermost enclosing group, if any.
    pub group: Option<usize>,
}

/// An intermediate node (sector, industry, ...) below the root.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedGroup {
    pub index: usize,
    pub name: String,
    pub ticker: String,
    /// Outer rectangle, before padding and header band.
    pub rect: LayoutRect,
    pub depth: usize,
    pub parent: Option<usize>,
    /// Sum of positive leaf weights beneath.
    pub weight: f64,
    /// Range into `Partition::leaves`.
    pub leaves: Range<usize>,
}

/// Output of [`partition`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Partition {
    pub extent: f64,
    pub leaves: Vec<PlacedLeaf>,
    pub groups: Vec<PlacedGroup>,
}

impl Partition {
    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }
}

/// Partition `root` into the square `[0, extent]²`.
///
/// # Panics
/// If `config.extent` is not positive and finite.
pub fn partition(root: &MarketNode, config: &LayoutConfig) -> Partition {
    assert!(
        config.extent.is_finite() && config.extent > 0.0,
        "layout extent must be positive and finite, got {}",
        config.extent
    );

    let mut placer = Placer {
        config,
        unit: max_leaf_weight(root),
        leaves: Vec::with_capacity(root.leaf_count()),
        groups: Vec::new(),
        skipped: 0,
    };

    if placer.unit > 0.0 {
        let bounds = LayoutRect::square(config.extent);
        if root.is_leaf() {
            let p = config.padding;
            placer.push_leaf(root, bounds.inset(p, p, p, p, config.min_span), 0, None);
        } else {
            placer.place_group(root, bounds, 0, None);
        }
    }

    if placer.skipped > 0 {
        log::debug!("Partition: {} leaves without positive weight skipped", placer.skipped);
    }
    log::debug!(
        "Partition: {} leaves, {} groups in extent {}",
        placer.leaves.len(),
        placer.groups.len(),
        config.extent
    );

    Partition {
        extent: config.extent,
        leaves: placer.leaves,
        groups: placer.groups,
    }
}

/// Largest layout weight of any leaf, 0 when none is positive.
fn max_leaf_weight(node: &MarketNode) -> f64 {
    if node.is_leaf() {
        node.layout_weight()
    } else {
        node.children.iter().map(max_leaf_weight).fold(0.0, f64::max)
    }
}

struct Placer<'a> {
    config: &'a LayoutConfig,
    /// Every weight is divided by this before summing, so sibling totals
    /// stay finite even when raw weights are near `f64::MAX`.
    unit: f64,
    leaves: Vec<PlacedLeaf>,
    groups: Vec<PlacedGroup>,
    skipped: usize,
}

impl Placer<'_> {
    /// Effective weight in units of the largest leaf.
    fn scaled_weight(&self, node: &MarketNode) -> f64 {
        if node.is_leaf() {
            node.layout_weight() / self.unit
        } else {
            node.children.iter().map(|c| self.scaled_weight(c)).sum()
        }
    }

    fn push_leaf(&mut self, node: &MarketNode, rect: LayoutRect, depth: usize, group: Option<usize>) {
        self.leaves.push(PlacedLeaf {
            index: self.leaves.len(),
            instrument: Instrument::from_leaf(node),
            rect,
            depth,
            group,
        });
    }

    fn place_group(&mut self, node: &MarketNode, rect: LayoutRect, depth: usize, parent: Option<usize>) {
        let cfg = self.config;
        let p = cfg.padding;
        let header = if depth > 0 { cfg.group_header } else { 0.0 };
        let inner = rect.inset(p, p + header, p, p, cfg.min_span);

        let own = if depth > 0 {
            let index = self.groups.len();
            self.groups.push(PlacedGroup {
                index,
                name: node.name.clone(),
                ticker: node.ticker.clone(),
                rect,
                depth,
                parent,
                weight: node.effective_weight(),
                leaves: self.leaves.len()..self.leaves.len(),
            });
            Some(index)
        } else {
            parent
        };

        let mut children: Vec<(&MarketNode, f64)> = Vec::with_capacity(node.children.len());
        for child in &node.children {
            let w = self.scaled_weight(child);
            if w > 0.0 {
                children.push((child, w));
            } else {
                self.skipped += child.leaf_count();
                if child.is_leaf() && (child.weight < 0.0 || !child.weight.is_finite()) {
                    log::debug!("Malformed weight {} on {}, treated as zero", child.weight, child.ticker);
                }
            }
        }
        // stable: equal weights keep insertion order
        children.sort_by(|a, b| b.1.total_cmp(&a.1));

        let total: f64 = children.iter().map(|(_, w)| w).sum();
        let areas: Vec<f64> = children.iter().map(|(_, w)| w / total * inner.area()).collect();
        let rects = squarify::squarify(&areas, inner);

        for ((child, _), child_rect) in children.into_iter().zip(rects) {
            if child.is_leaf() {
                self.push_leaf(child, child_rect, depth + 1, own);
            } else {
                self.place_group(child, child_rect, depth + 1, own);
            }
        }

        if let Some(index) = own.filter(|_| depth > 0) {
            self.groups[index].leaves.end = self.leaves.len();
        }
    }
}
