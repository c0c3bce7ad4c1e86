//! Property-based invariant tests for the partition → derive pipeline.
//!
//! 1. Leaf area is proportional to weight (no padding)
//! 2. Leaves tile the extent exactly (no padding); with padding, siblings
//!    fill their parent's rectangle minus padding and header band
//! 3. Leaves never overlap, with or without padding
//! 4. Every leaf lies inside its group and inside the extent
//! 5. Determinism: same tree, same partition
//! 6. Index stability across metric switches
//! 7. Encoded heights and colors stay defined for arbitrary readings

use market_cityscape::codec::{self, ColorMetric, HeightMetric};
use market_cityscape::config::{EngineConfig, HeightScale, LayoutConfig};
use market_cityscape::layout::{partition, Partition};
use market_cityscape::market::{Attributes, Instrument, MarketNode};
use market_cityscape::render::derive::derive;
use proptest::prelude::*;

// ── Strategies ──────────────────────────────────────────────────────────

fn weight_strategy() -> impl Strategy<Value = f64> {
    prop_oneof![
        9 => 1.0f64..1e6,
        1 => Just(0.0),
    ]
}

fn tree_strategy() -> impl Strategy<Value = MarketNode> {
    prop::collection::vec(prop::collection::vec(weight_strategy(), 1..12), 1..6).prop_map(|sectors| {
        let children = sectors
            .into_iter()
            .enumerate()
            .map(|(si, weights)| {
                let leaves = weights
                    .into_iter()
                    .enumerate()
                    .map(|(li, w)| MarketNode::leaf(format!("L{}-{}", si, li), format!("T{}_{}", si, li), w))
                    .collect();
                MarketNode::group(format!("Sector {}", si), format!("S{}", si), leaves)
            })
            .collect();
        MarketNode::group("Market", "MKT", children)
    })
}

fn reading() -> impl Strategy<Value = Option<f64>> {
    prop_oneof![
        Just(None),
        Just(Some(f64::NAN)),
        Just(Some(f64::INFINITY)),
        (-1e6f64..1e6).prop_map(Some),
    ]
}

fn attributes_strategy() -> impl Strategy<Value = Attributes> {
    (reading(), reading(), reading(), reading(), reading(), reading()).prop_map(|(p, pe, pb, y, d, rv)| Attributes {
        performance_ratio: p,
        pe_ratio: pe,
        pb_ratio: pb,
        dividend_yield: y,
        debt_to_equity: d,
        relative_volume: rv,
    })
}

fn flat_config() -> LayoutConfig {
    LayoutConfig::default().with_padding(0.0)
}

fn max_overlap(p: &Partition) -> f64 {
    let mut worst = 0.0f64;
    for (i, a) in p.leaves.iter().enumerate() {
        for b in &p.leaves[i + 1..] {
            worst = worst.max(a.rect.overlap_area(&b.rect));
        }
    }
    worst
}

// ═══════════════════════════════════════════════════════════════════════
// 1–2. Proportional areas, exact tiling
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn leaf_area_proportional_to_weight(root in tree_strategy()) {
        let p = partition(&root, &flat_config());
        let total_weight = root.effective_weight();
        prop_assume!(total_weight > 0.0);
        let total_area = 100.0 * 100.0;
        for leaf in &p.leaves {
            let expected = leaf.instrument.weight / total_weight * total_area;
            prop_assert!(
                (leaf.rect.area() - expected).abs() <= 1e-6 * total_area,
                "{}: area {} expected {}", leaf.instrument.ticker, leaf.rect.area(), expected
            );
        }
    }

    #[test]
    fn leaves_tile_the_extent(root in tree_strategy()) {
        let p = partition(&root, &flat_config());
        prop_assume!(!p.is_empty());
        let covered: f64 = p.leaves.iter().map(|l| l.rect.area()).sum();
        prop_assert!((covered - 10_000.0).abs() < 1e-6);
    }
}

proptest! {
    #[test]
    fn siblings_fill_parent_minus_padding(root in tree_strategy(), padding in 0.0f64..1.0, header in 0.0f64..2.0) {
        let config = LayoutConfig::default().with_padding(padding).with_group_header(header);
        let p = partition(&root, &config);
        prop_assume!(!p.is_empty());

        // root: sector rectangles cover the extent minus root padding
        let inner = 100.0 - 2.0 * padding;
        let sectors: f64 = p.groups.iter().filter(|g| g.depth == 1).map(|g| g.rect.area()).sum();
        prop_assert!((sectors - inner * inner).abs() <= 1e-6 * inner * inner, "root {} vs {}", sectors, inner * inner);

        for group in &p.groups {
            let w = group.rect.width() - 2.0 * padding;
            let h = group.rect.height() - 2.0 * padding - header;
            // collapsed insets are clamped, not padded
            if w <= config.min_span || h <= config.min_span {
                continue;
            }
            let expected = w * h;
            let covered: f64 = p.leaves[group.leaves.clone()].iter().map(|l| l.rect.area()).sum();
            prop_assert!(
                (covered - expected).abs() <= 1e-6 * expected,
                "{}: {} vs {}", group.ticker, covered, expected
            );
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 3–4. Non-overlap and containment
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn leaves_never_overlap(root in tree_strategy(), padding in 0.0f64..2.0, header in 0.0f64..3.0) {
        let config = LayoutConfig::default().with_padding(padding).with_group_header(header);
        let p = partition(&root, &config);
        prop_assert!(max_overlap(&p) < 1e-9, "overlap {}", max_overlap(&p));
    }

    #[test]
    fn leaves_inside_group_and_extent(root in tree_strategy(), padding in 0.0f64..2.0, extent in 1.0f64..500.0) {
        let config = LayoutConfig::default().with_padding(padding).with_extent(extent);
        let p = partition(&root, &config);
        let bounds = market_cityscape::layout::LayoutRect::square(extent);
        for leaf in &p.leaves {
            prop_assert!(bounds.contains_rect(&leaf.rect));
            prop_assert!(leaf.rect.width() > 0.0 && leaf.rect.height() > 0.0);
            if let Some(g) = leaf.group {
                prop_assert!(p.groups[g].rect.contains_rect(&leaf.rect));
                prop_assert!(p.groups[g].leaves.contains(&leaf.index));
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 5–6. Determinism and index stability
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn partition_is_deterministic(root in tree_strategy()) {
        let config = LayoutConfig::default();
        prop_assert_eq!(partition(&root, &config), partition(&root, &config));
    }

    #[test]
    fn indices_stable_across_metric_switches(root in tree_strategy()) {
        let config = EngineConfig::default();
        let p = partition(&root, &config.layout);
        let a = derive(&p, HeightMetric::Pe, ColorMetric::Performance, &config);
        let b = derive(&p, HeightMetric::RelativeVolume, ColorMetric::Debt, &config);
        prop_assert_eq!(a.nodes.len(), p.leaves.len());
        for (i, (x, y)) in a.nodes.iter().zip(&b.nodes).enumerate() {
            prop_assert_eq!(x.index, i);
            prop_assert_eq!(&x.ticker, &y.ticker);
            prop_assert_eq!(x.rect, y.rect);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 7. Encoding totality
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn heights_stay_in_range(attributes in attributes_strategy(), weight in 0.0f64..1e13) {
        let scale = HeightScale::default();
        let inst = Instrument { name: "X".into(), ticker: "X".into(), weight, attributes };
        for m in HeightMetric::ALL {
            let h = codec::height_value(&inst, m, &scale);
            prop_assert!(h.is_finite());
            prop_assert!((1.0..=20.0).contains(&h), "{:?} gave {}", m, h);
        }
    }

    #[test]
    fn colors_are_total_and_repeatable(attributes in attributes_strategy()) {
        let config = EngineConfig::default();
        let inst = Instrument { name: "X".into(), ticker: "X".into(), weight: 1.0, attributes };
        for m in ColorMetric::ALL {
            let c = codec::color_value(&inst, m, &config.color);
            prop_assert_eq!(c.a, 255);
            prop_assert_eq!(c, codec::color_value(&inst, m, &config.color));
        }
    }
}
