//! Render-state derivation: partition + selected metrics → per-leaf boxes.
//!
//! This is the cheap half of the pipeline. It reads only the flat
//! [`Partition`] and never touches the tree, so switching metrics costs one
//! pass over the leaves.

use glam::Vec3;

use crate::codec::color::Rgba;
use crate::codec::{self, ColorMetric, HeightMetric, Readout};
use crate::config::EngineConfig;
use crate::layout::{LayoutRect, Partition};
use crate::market::Attributes;

/// One leaf, fully encoded. The only leaf structure presentation adapters read.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedNode {
    /// Position in the partition's leaf order.
    pub index: usize,
    pub ticker: String,
    pub name: String,
    pub group: Option<usize>,
    /// Layout weight and raw readings, for views that plot them directly.
    pub weight: f64,
    pub attributes: Attributes,
    pub rect: LayoutRect,
    pub height: f32,
    /// Scene-space center; the map is centered on the origin, `y` is up.
    pub center: Vec3,
    /// Box size: `(width·shrink, height, depth·shrink)`.
    pub scale: Vec3,
    pub color: Rgba,
    pub readout: Readout,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EncodedGroup {
    pub index: usize,
    pub name: String,
    pub ticker: String,
    pub rect: LayoutRect,
    pub depth: usize,
    pub parent: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderState {
    pub extent: f64,
    pub height_metric: HeightMetric,
    pub color_metric: ColorMetric,
    pub nodes: Vec<EncodedNode>,
    pub groups: Vec<EncodedGroup>,
}

impl RenderState {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, index: usize) -> Option<&EncodedNode> {
        self.nodes.get(index)
    }

    /// Outermost group above `node` (the sector in a market → sector →
    /// instrument tree).
    pub fn sector_of(&self, node: &EncodedNode) -> Option<&EncodedGroup> {
        let mut group = self.groups.get(node.group?)?;
        while let Some(parent) = group.parent.and_then(|p| self.groups.get(p)) {
            group = parent;
        }
        Some(group)
    }

    /// Tallest box, or 0 for an empty scene.
    pub fn max_height(&self) -> f32 {
        self.nodes.iter().map(|n| n.height).fold(0.0, f32::max)
    }
}

/// Encode every placed leaf under the chosen metrics.
pub fn derive(partition: &Partition, height: HeightMetric, color: ColorMetric, config: &EngineConfig) -> RenderState {
    let half = partition.extent * 0.5;
    let shrink = config.presentation.shrink;

    let nodes = partition
        .leaves
        .iter()
        .map(|leaf| {
            let inst = &leaf.instrument;
            let h = codec::height_value(inst, height, &config.height);
            let (cx, cz) = leaf.rect.center();
            EncodedNode {
                index: leaf.index,
                ticker: inst.ticker.clone(),
                name: inst.name.clone(),
                group: leaf.group,
                weight: inst.weight,
                attributes: inst.attributes,
                rect: leaf.rect,
                height: h,
                center: Vec3::new((cx - half) as f32, h * 0.5, (cz - half) as f32),
                scale: Vec3::new(leaf.rect.width() as f32 * shrink, h, leaf.rect.height() as f32 * shrink),
                color: codec::color_value(inst, color, &config.color),
                readout: codec::readout(inst, height, color),
            }
        })
        .collect();

    let groups = partition
        .groups
        .iter()
        .map(|g| EncodedGroup {
            index: g.index,
            name: g.name.clone(),
            ticker: g.ticker.clone(),
            rect: g.rect,
            depth: g.depth,
            parent: g.parent,
        })
        .collect();

    RenderState {
        extent: partition.extent,
        height_metric: height,
        color_metric: color,
        nodes,
        groups,
    }
}
