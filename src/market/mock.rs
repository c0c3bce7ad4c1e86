//! Seeded demo trees for the viewer and for tests.
//!
//! Three universes, each root → sector → instrument:
//!   - `Equities`: S&P-style sectors, 15 stocks each, full fundamentals
//!   - `Etfs`: asset classes with 8 funds each, no leverage
//!   - `Commodities`: futures by sector, no P/E or yield, high relative volume

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{Attributes, MarketNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Universe {
    #[default]
    Equities,
    Etfs,
    Commodities,
}

impl Universe {
    pub const ALL: [Universe; 3] = [Universe::Equities, Universe::Etfs, Universe::Commodities];

    pub fn label(self) -> &'static str {
        match self {
            Universe::Equities => "Equities",
            Universe::Etfs => "ETFs",
            Universe::Commodities => "Commodities",
        }
    }

    /// Unknown names fall back to equities.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "equities" | "stocks" => Universe::Equities,
            "etfs" | "etf" => Universe::Etfs,
            "commodities" | "futures" => Universe::Commodities,
            other => {
                log::warn!("Unknown universe '{}', using equities", other);
                Universe::Equities
            }
        }
    }
}

/// Build a demo tree. The same `(universe, seed)` always yields the same tree.
pub fn generate(universe: Universe, seed: u64) -> MarketNode {
    let mut rng = StdRng::seed_from_u64(seed);
    match universe {
        Universe::Equities => equities(&mut rng),
        Universe::Etfs => etfs(&mut rng),
        Universe::Commodities => commodities(&mut rng),
    }
}

const SECTORS: &[&str] = &["Technology", "Healthcare", "Finance", "Consumer", "Energy"];
const TICKERS: &[&str] = &[
    "AAPL", "MSFT", "NVDA", "AMZN", "GOOGL", "META", "TSLA", "JPM", "V", "LLY",
];

fn equities(rng: &mut StdRng) -> MarketNode {
    let sectors = SECTORS
        .iter()
        .enumerate()
        .map(|(si, sector)| {
            let stocks = (0..15)
                .map(|i| {
                    // Tickers are unique per sector; suffix the repeats.
                    let base = TICKERS[i % TICKERS.len()];
                    let ticker = if i < TICKERS.len() {
                        format!("{}{}", base, si)
                    } else {
                        format!("{}{}.{}", base, si, i)
                    };
                    MarketNode::leaf(format!("{} Stock {}", sector, i), ticker, rng.random_range(1e10..5.1e11))
                        .with_attributes(Attributes {
                            performance_ratio: Some((rng.random::<f64>() - 0.5) * 0.08),
                            pe_ratio: Some(rng.random_range(5.0..55.0)),
                            pb_ratio: Some(rng.random_range(0.5..10.5)),
                            dividend_yield: Some(rng.random_range(0.0..0.08)),
                            debt_to_equity: Some(rng.random_range(0.0..3.0)),
                            relative_volume: Some(rng.random_range(0.5..4.5)),
                        })
                })
                .collect();
            let mut node = MarketNode::group(*sector, sector.to_uppercase(), stocks);
            node.weight = rng.random_range(5e11..2.5e12);
            node.attributes.performance_ratio = Some((rng.random::<f64>() - 0.5) * 0.05);
            node
        })
        .collect();

    let mut root = MarketNode::group("S&P 500", "SPX", sectors);
    root.weight = 1e13;
    root
}

fn etfs(rng: &mut StdRng) -> MarketNode {
    const ASSET_CLASSES: &[&str] = &["Equity", "Fixed Income", "Commodity", "Real Estate"];
    const ETF_TICKERS: &[&str] = &["SPY", "QQQ", "IWM", "EEM", "AGG", "TLT", "GLD", "VNQ"];

    let classes = ASSET_CLASSES
        .iter()
        .enumerate()
        .map(|(ci, class)| {
            let funds = ETF_TICKERS
                .iter()
                .enumerate()
                .map(|(i, t)| {
                    MarketNode::leaf(format!("ETF {}", i), format!("{}{}", t, ci), rng.random_range(5e9..2.05e11))
                        .with_attributes(Attributes {
                            performance_ratio: Some((rng.random::<f64>() - 0.5) * 0.06),
                            pe_ratio: Some(rng.random_range(10.0..40.0)),
                            pb_ratio: Some(rng.random_range(1.0..6.0)),
                            dividend_yield: Some(rng.random_range(0.0..0.06)),
                            debt_to_equity: Some(0.0),
                            relative_volume: Some(rng.random_range(0.5..3.5)),
                        })
                })
                .collect();
            let ticker: String = class.chars().take(3).collect::<String>().to_uppercase();
            MarketNode::group(*class, ticker, funds)
        })
        .collect();

    let mut root = MarketNode::group("Global Universe", "ALL", classes);
    root.weight = 5e12;
    root
}

fn commodities(rng: &mut StdRng) -> MarketNode {
    const SECTORS: &[(&str, &[&str])] = &[
        ("Energy", &["CL", "NG", "RB", "HO"]),
        ("Metals", &["GC", "SI", "HG", "PL"]),
        ("Agriculture", &["ZC", "ZW", "ZS", "KC"]),
        ("Meats/Livestock", &["LE", "HE", "GF"]),
    ];

    let sectors = SECTORS
        .iter()
        .map(|(sector, tickers)| {
            let contracts = tickers
                .iter()
                .map(|t| {
                    MarketNode::leaf(*t, *t, rng.random_range(1e10..1.1e11)).with_attributes(Attributes {
                        performance_ratio: Some((rng.random::<f64>() - 0.5) * 0.15),
                        relative_volume: Some(rng.random_range(0.5..5.5)),
                        dividend_yield: Some(0.0),
                        debt_to_equity: Some(0.0),
                        ..Attributes::default()
                    })
                })
                .collect();
            let ticker: String = sector.chars().take(3).collect::<String>().to_uppercase();
            MarketNode::group(*sector, ticker, contracts)
        })
        .collect();

    let mut root = MarketNode::group("Commodities", "CMD", sectors);
    root.weight = 2e12;
    root
}
