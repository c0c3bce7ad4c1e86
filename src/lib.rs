//! Hierarchical market maps.
//!
//! A weighted market tree is partitioned into a squarified treemap, each
//! leaf's metrics are encoded onto height and color, and the result is drawn
//! either flat or as an extruded city of boxes.
//!
//! ```no_run
//! use market_cityscape::codec::{ColorMetric, HeightMetric};
//! use market_cityscape::config::EngineConfig;
//! use market_cityscape::engine::MapEngine;
//! use market_cityscape::market::{mock, Snapshot};
//!
//! let mut engine = MapEngine::new(EngineConfig::default())
//!     .unwrap()
//!     .with_metrics(HeightMetric::Pe, ColorMetric::Performance)
//!     .with_snapshot(Snapshot::new(mock::generate(mock::Universe::Equities, 42)));
//! let state = engine.render_state().unwrap();
//! println!("{} boxes", state.nodes.len());
//! ```

pub mod codec;
pub mod config;
pub mod engine;
pub mod layout;
pub mod market;
pub mod render;
