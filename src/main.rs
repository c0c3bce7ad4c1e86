use std::path::PathBuf;

use clap::Parser;
use eframe::egui;

use market_cityscape::codec::{ColorMetric, HeightMetric};
use market_cityscape::config::EngineConfig;
use market_cityscape::engine::MapEngine;
use market_cityscape::market::mock::{self, Universe};
use market_cityscape::market::snapshot::{load_quotes, load_snapshot};
use market_cityscape::market::Snapshot;
use market_cityscape::render::RenderMode;

mod app;

use app::MapApp;

/// Market treemap viewer: area = weight, height and color = chosen metrics.
#[derive(Parser, Debug)]
#[command(name = "market-cityscape", version, about)]
struct Args {
    /// Market tree JSON; a mock universe is generated when omitted
    #[arg(long, env = "CITYSCAPE_SNAPSHOT")]
    snapshot: Option<PathBuf>,

    /// Mock universe: equities, etfs or commodities
    #[arg(long, default_value = "equities")]
    universe: String,

    /// Seed for the mock universe
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// planar, extruded or bubble
    #[arg(long, default_value = "planar")]
    mode: String,

    /// Height metric: pe, pb, yield, market_cap, relative_volume
    #[arg(long, default_value = "pe")]
    height: String,

    /// Color metric: performance, yield, debt
    #[arg(long, default_value = "performance")]
    color: String,

    /// Engine config JSON (any subset of fields)
    #[arg(long, env = "CITYSCAPE_CONFIG")]
    config: Option<PathBuf>,

    /// Quote rows to overlay on the tree (daily ingestion output)
    #[arg(long)]
    quotes: Option<PathBuf>,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let (engine, universe, source) = match build_engine(&args) {
        Ok(parts) => parts,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(2);
        }
    };

    let mode = RenderMode::from_name(&args.mode);
    let seed = args.seed;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1280.0, 800.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Market Cityscape",
        options,
        Box::new(move |_cc| Ok(Box::new(MapApp::new(engine, mode, universe, seed, source)))),
    )
    .expect("Failed to start Market Cityscape");
}

fn build_engine(args: &Args) -> Result<(MapEngine, Universe, String), Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    let universe = Universe::from_name(&args.universe);
    let (snapshot, source) = match &args.snapshot {
        Some(path) => (load_snapshot(path)?, path.display().to_string()),
        None => (
            Snapshot::new(mock::generate(universe, args.seed)),
            format!("mock {} (seed {})", universe.label(), args.seed),
        ),
    };

    let mut engine = MapEngine::new(config)?
        .with_metrics(HeightMetric::from_name(&args.height), ColorMetric::from_name(&args.color))
        .with_snapshot(snapshot);

    if let Some(path) = &args.quotes {
        let rows = load_quotes(path)?;
        engine.apply_quotes(&rows);
    }

    Ok((engine, universe, source))
}
