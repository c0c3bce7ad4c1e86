pub mod chart;
pub mod mock;
pub mod snapshot;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Optional fundamentals and price action attached to a node.
///
/// Every field may be missing: plenty of instruments have no P/E, futures
/// have no dividend yield, and so on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Attributes {
    /// Fractional change, 0.012 = +1.2%
    #[serde(default, alias = "performance", skip_serializing_if = "Option::is_none")]
    pub performance_ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pe_ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pb_ratio: Option<f64>,
    /// Fraction, 0.025 = 2.5%
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dividend_yield: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debt_to_equity: Option<f64>,
    /// 1.0 = average volume
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_volume: Option<f64>,
}

impl Attributes {
    /// Drop non-finite readings so that every consumer sees them as absent.
    pub fn sanitized(self) -> Self {
        let finite = |v: Option<f64>| v.filter(|x| x.is_finite());
        Self {
            performance_ratio: finite(self.performance_ratio),
            pe_ratio: finite(self.pe_ratio),
            pb_ratio: finite(self.pb_ratio),
            dividend_yield: finite(self.dividend_yield),
            debt_to_equity: finite(self.debt_to_equity),
            relative_volume: finite(self.relative_volume),
        }
    }
}

/// One node of the market tree (market → sector → instrument).
///
/// Interior weights are informational; layout always re-sums leaf weights.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketNode {
    pub name: String,
    pub ticker: String,
    #[serde(default, alias = "value")]
    pub weight: f64,
    #[serde(flatten)]
    pub attributes: Attributes,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MarketNode>,
}

impl MarketNode {
    pub fn leaf(name: impl Into<String>, ticker: impl Into<String>, weight: f64) -> Self {
        Self {
            name: name.into(),
            ticker: ticker.into(),
            weight,
            attributes: Attributes::default(),
            children: Vec::new(),
        }
    }

    pub fn group(
        name: impl Into<String>,
        ticker: impl Into<String>,
        children: Vec<MarketNode>,
    ) -> Self {
        Self {
            name: name.into(),
            ticker: ticker.into(),
            weight: 0.0,
            attributes: Attributes::default(),
            children,
        }
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Weight usable for layout: negative and non-finite values count as zero.
    pub fn layout_weight(&self) -> f64 {
        if self.weight.is_finite() && self.weight > 0.0 {
            self.weight
        } else {
            0.0
        }
    }

    /// Sum of usable leaf weights beneath (or at) this node.
    pub fn effective_weight(&self) -> f64 {
        if self.is_leaf() {
            self.layout_weight()
        } else {
            self.children.iter().map(MarketNode::effective_weight).sum()
        }
    }

    /// Recursively count all nodes in this subtree
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(|c| c.node_count()).sum::<usize>()
    }

    pub fn leaf_count(&self) -> usize {
        if self.is_leaf() {
            1
        } else {
            self.children.iter().map(|c| c.leaf_count()).sum()
        }
    }

    /// Depth-first search by ticker (first match wins).
    pub fn find(&self, ticker: &str) -> Option<&MarketNode> {
        if self.ticker == ticker {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(ticker))
    }
}

/// Flat copy of a leaf, carried by layout output so later stages never walk the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Instrument {
    pub name: String,
    pub ticker: String,
    pub weight: f64,
    pub attributes: Attributes,
}

impl Instrument {
    pub fn from_leaf(node: &MarketNode) -> Self {
        Self {
            name: node.name.clone(),
            ticker: node.ticker.clone(),
            weight: node.layout_weight(),
            attributes: node.attributes.sanitized(),
        }
    }
}

/// Process-unique identity of a tree snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SnapshotId(u64);

impl SnapshotId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// An immutable tree handed over by a data source for one update cycle.
#[derive(Debug, Clone)]
pub struct Snapshot {
    id: SnapshotId,
    root: Arc<MarketNode>,
}

impl Snapshot {
    pub fn new(root: MarketNode) -> Self {
        Self {
            id: SnapshotId::next(),
            root: Arc::new(root),
        }
    }

    pub fn id(&self) -> SnapshotId {
        self.id
    }

    pub fn root(&self) -> &MarketNode {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sector() -> MarketNode {
        MarketNode::group(
            "Technology",
            "TECH",
            vec![
                MarketNode::leaf("Apple", "AAPL", 300.0),
                MarketNode::leaf("Broken", "BRK", -5.0),
                MarketNode::leaf("NaN Corp", "NAN", f64::NAN),
                MarketNode::leaf("Microsoft", "MSFT", 100.0),
            ],
        )
    }

    #[test]
    fn effective_weight_ignores_interior_and_bad_weights() {
        let mut node = sector();
        node.weight = 1e12;
        assert!((node.effective_weight() - 400.0).abs() < 1e-9);
    }

    #[test]
    fn childless_node_is_a_leaf_with_its_own_weight() {
        let node = MarketNode::leaf("Solo", "SOLO", 42.0);
        assert!(node.is_leaf());
        assert_eq!(node.effective_weight(), 42.0);
    }

    #[test]
    fn counts_and_find() {
        let root = MarketNode::group("Market", "MKT", vec![sector()]);
        assert_eq!(root.node_count(), 6);
        assert_eq!(root.leaf_count(), 4);
        assert_eq!(root.find("MSFT").map(|n| n.weight), Some(100.0));
        assert!(root.find("NOPE").is_none());
    }

    #[test]
    fn sanitized_drops_non_finite() {
        let attrs = Attributes {
            pe_ratio: Some(f64::INFINITY),
            pb_ratio: Some(2.0),
            ..Attributes::default()
        };
        let clean = attrs.sanitized();
        assert_eq!(clean.pe_ratio, None);
        assert_eq!(clean.pb_ratio, Some(2.0));
    }

    #[test]
    fn snapshots_get_distinct_ids() {
        let a = Snapshot::new(sector());
        let b = Snapshot::new(sector());
        assert_ne!(a.id(), b.id());
        assert_eq!(a.clone().id(), a.id());
    }

    #[test]
    fn deserializes_source_field_names() {
        let json = r#"{
            "name": "Apple", "ticker": "AAPL", "value": 3.0e12,
            "performance": 0.012, "pe_ratio": 31.5
        }"#;
        let node: MarketNode = serde_json::from_str(json).unwrap();
        assert_eq!(node.weight, 3.0e12);
        assert_eq!(node.attributes.performance_ratio, Some(0.012));
        assert_eq!(node.attributes.pe_ratio, Some(31.5));
        assert_eq!(node.attributes.dividend_yield, None);
        assert!(node.is_leaf());
    }
}
