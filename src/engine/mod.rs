//! Map engine: current snapshot plus the memoized partition and render state.
//!
//! Snapshot → partition → render state. The partition is keyed by snapshot
//! identity and the render state by (snapshot, height metric, color metric),
//! so a metric switch re-derives without re-partitioning, and a new snapshot
//! drops both.

use crate::codec::{ColorMetric, HeightMetric};
use crate::config::{ConfigError, EngineConfig};
use crate::layout::{partition, Partition};
use crate::market::snapshot::{apply_quotes, QuoteRow};
use crate::market::{Snapshot, SnapshotId};
use crate::render::derive::{derive, RenderState};

/// Cache counters, mostly for tests and the status bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub partition_runs: u64,
    pub partition_hits: u64,
    pub derive_runs: u64,
    pub derive_hits: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StateKey {
    snapshot: SnapshotId,
    height: HeightMetric,
    color: ColorMetric,
}

pub struct MapEngine {
    config: EngineConfig,
    snapshot: Option<Snapshot>,
    height: HeightMetric,
    color: ColorMetric,
    partition: Option<(SnapshotId, Partition)>,
    state: Option<(StateKey, RenderState)>,
    stats: EngineStats,
}

impl MapEngine {
    /// Refuses an invalid configuration.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            snapshot: None,
            height: HeightMetric::default(),
            color: ColorMetric::default(),
            partition: None,
            state: None,
            stats: EngineStats::default(),
        })
    }

    pub fn with_metrics(mut self, height: HeightMetric, color: ColorMetric) -> Self {
        self.height = height;
        self.color = color;
        self
    }

    pub fn with_snapshot(mut self, snapshot: Snapshot) -> Self {
        self.set_snapshot(snapshot);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Replace the configuration. Both caches are dropped on success.
    pub fn set_config(&mut self, config: EngineConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.config = config;
        self.partition = None;
        self.state = None;
        Ok(())
    }

    /// Install a new snapshot. The last one handed over wins.
    pub fn set_snapshot(&mut self, snapshot: Snapshot) {
        log::info!(
            "Snapshot {} installed ({} leaves)",
            snapshot.id().get(),
            snapshot.root().leaf_count()
        );
        self.snapshot = Some(snapshot);
        self.partition = None;
        self.state = None;
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    /// Overlay quote rows on the current tree and install the result as a
    /// new snapshot. Returns false when there is no snapshot yet.
    pub fn apply_quotes(&mut self, rows: &[QuoteRow]) -> bool {
        let Some(current) = &self.snapshot else {
            return false;
        };
        let updated = Snapshot::new(apply_quotes(current.root(), rows));
        self.set_snapshot(updated);
        true
    }

    pub fn height_metric(&self) -> HeightMetric {
        self.height
    }

    pub fn color_metric(&self) -> ColorMetric {
        self.color
    }

    pub fn set_height_metric(&mut self, metric: HeightMetric) {
        self.height = metric;
    }

    pub fn set_color_metric(&mut self, metric: ColorMetric) {
        self.color = metric;
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// Partition of the current snapshot, computed at most once per snapshot.
    pub fn partition(&mut self) -> Option<&Partition> {
        let id = self.snapshot.as_ref()?.id();
        self.ensure_partition(id);
        self.partition.as_ref().map(|(_, p)| p)
    }

    /// Render state for the current snapshot and metrics.
    pub fn render_state(&mut self) -> Option<&RenderState> {
        let id = self.snapshot.as_ref()?.id();
        let key = StateKey { snapshot: id, height: self.height, color: self.color };

        if self.state.as_ref().is_some_and(|(k, _)| *k == key) {
            log::debug!("Render state HIT: {:?}/{:?}", key.height, key.color);
            self.stats.derive_hits += 1;
        } else {
            log::debug!("Render state MISS: {:?}/{:?}", key.height, key.color);
            self.ensure_partition(id);
            let (_, partition) = self.partition.as_ref()?;
            let state = derive(partition, self.height, self.color, &self.config);
            self.stats.derive_runs += 1;
            self.state = Some((key, state));
        }

        self.state.as_ref().map(|(_, s)| s)
    }

    fn ensure_partition(&mut self, id: SnapshotId) {
        if self.partition.as_ref().is_some_and(|(pid, _)| *pid == id) {
            log::debug!("Partition HIT: snapshot {}", id.get());
            self.stats.partition_hits += 1;
            return;
        }
        let Some(snapshot) = &self.snapshot else {
            return;
        };
        log::debug!("Partition MISS: snapshot {}", id.get());
        let p = partition(snapshot.root(), &self.config.layout);
        self.stats.partition_runs += 1;
        self.partition = Some((id, p));
    }
}
