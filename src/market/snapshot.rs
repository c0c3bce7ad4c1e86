//! Tree snapshots from JSON, plus the quote overlay produced by the daily
//! snapshot ingestion job.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{MarketNode, Snapshot};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read snapshot {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parse a market tree from JSON text.
pub fn parse_tree(json: &str) -> Result<MarketNode, SnapshotError> {
    Ok(serde_json::from_str(json)?)
}

/// Load a snapshot from a JSON file.
pub fn load_snapshot(path: impl AsRef<Path>) -> Result<Snapshot, SnapshotError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let root = parse_tree(&text)?;
    log::info!(
        "Loaded snapshot {} ({} nodes, {} leaves)",
        path.display(),
        root.node_count(),
        root.leaf_count()
    );
    Ok(Snapshot::new(root))
}

/// One upserted row of the ingestion job, keyed by ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRow {
    pub ticker: String,
    pub price: f64,
    pub change_percent: f64,
    pub last_updated: DateTime<Utc>,
}

pub fn parse_quotes(json: &str) -> Result<Vec<QuoteRow>, SnapshotError> {
    Ok(serde_json::from_str(json)?)
}

/// Load quote rows (a JSON array) from a file.
pub fn load_quotes(path: impl AsRef<Path>) -> Result<Vec<QuoteRow>, SnapshotError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let rows = parse_quotes(&text)?;
    log::info!("Loaded {} quote rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Build a new tree whose matching leaves carry the quoted change as
/// `performance_ratio`. Fundamentals are left untouched and the input is not
/// modified. When a ticker appears more than once the newest row wins.
pub fn apply_quotes(root: &MarketNode, rows: &[QuoteRow]) -> MarketNode {
    let mut latest: HashMap<&str, &QuoteRow> = HashMap::with_capacity(rows.len());
    for row in rows {
        match latest.get(row.ticker.as_str()) {
            Some(seen) if seen.last_updated >= row.last_updated => {}
            _ => {
                latest.insert(row.ticker.as_str(), row);
            }
        }
    }
    let mut applied = 0usize;
    let tree = overlay(root, &latest, &mut applied);
    log::debug!("Quote overlay: {} rows, {} leaves updated", rows.len(), applied);
    tree
}

fn overlay(node: &MarketNode, quotes: &HashMap<&str, &QuoteRow>, applied: &mut usize) -> MarketNode {
    let mut out = MarketNode {
        name: node.name.clone(),
        ticker: node.ticker.clone(),
        weight: node.weight,
        attributes: node.attributes,
        children: node
            .children
            .iter()
            .map(|c| overlay(c, quotes, applied))
            .collect(),
    };
    if out.is_leaf() {
        if let Some(row) = quotes.get(node.ticker.as_str()) {
            if row.change_percent.is_finite() {
                out.attributes.performance_ratio = Some(row.change_percent);
                *applied += 1;
            }
        }
    }
    out
}
