//! Daily OHLCV series handed to the chart widgets.
//!
//! The map engine never reads these; they flow from the data source straight
//! to the charts. The type lives here so both sides agree on the invariants.

use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One trading day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    #[serde(alias = "time")]
    pub day: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChartError {
    #[error("candle {index} ({day}) is not after the previous trading day")]
    OutOfOrder { index: usize, day: NaiveDate },
    #[error("candle {index} ({day}) has a negative or non-finite value")]
    InvalidValue { index: usize, day: NaiveDate },
    #[error("candle {index} ({day}) has high/low outside open/close")]
    InvalidRange { index: usize, day: NaiveDate },
}

/// A validated, strictly increasing candle sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartSeries {
    candles: Vec<Candle>,
}

impl ChartSeries {
    pub fn new(candles: Vec<Candle>) -> Result<Self, ChartError> {
        for (index, c) in candles.iter().enumerate() {
            let values = [c.open, c.high, c.low, c.close, c.volume];
            if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
                return Err(ChartError::InvalidValue { index, day: c.day });
            }
            if c.low > c.open.min(c.close) || c.high < c.open.max(c.close) {
                return Err(ChartError::InvalidRange { index, day: c.day });
            }
            if index > 0 && candles[index - 1].day >= c.day {
                return Err(ChartError::OutOfOrder { index, day: c.day });
            }
        }
        Ok(Self { candles })
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn last_close(&self) -> Option<f64> {
        self.candles.last().map(|c| c.close)
    }
}

impl<'de> Deserialize<'de> for ChartSeries {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let candles = Vec::<Candle>::deserialize(deserializer)?;
        ChartSeries::new(candles).map_err(serde::de::Error::custom)
    }
}

/// Random-walk demo series of `days` candles ending the day before `end`.
pub fn mock_series(seed: u64, days: usize, end: NaiveDate) -> ChartSeries {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut price = 150.0_f64;
    let mut candles = Vec::with_capacity(days);

    for i in 0..days {
        let day = end - Duration::days((days - i) as i64);
        let open = price;
        let close = (price + (rng.random::<f64>() - 0.5) * 2.0).max(0.01);
        let high = open.max(close) + rng.random::<f64>();
        let low = (open.min(close) - rng.random::<f64>()).max(0.0);
        let volume = rng.random_range(500_000.0..1_500_000.0_f64).floor();
        candles.push(Candle { day, open, high, low, close, volume });
        price = close;
    }

    // The walk above satisfies every invariant by construction.
    ChartSeries { candles }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn candle(d: u32) -> Candle {
        Candle { day: day(d), open: 10.0, high: 11.0, low: 9.5, close: 10.5, volume: 1000.0 }
    }

    #[test]
    fn accepts_increasing_days() {
        let s = ChartSeries::new(vec![candle(2), candle(3), candle(5)]).unwrap();
        assert_eq!(s.len(), 3);
        assert_eq!(s.last_close(), Some(10.5));
    }

    #[test]
    fn rejects_duplicate_day() {
        let err = ChartSeries::new(vec![candle(2), candle(2)]).unwrap_err();
        assert_eq!(err, ChartError::OutOfOrder { index: 1, day: day(2) });
    }

    #[test]
    fn rejects_negative_volume() {
        let mut c = candle(2);
        c.volume = -1.0;
        assert!(matches!(ChartSeries::new(vec![c]), Err(ChartError::InvalidValue { .. })));
    }

    #[test]
    fn rejects_high_below_close() {
        let mut c = candle(2);
        c.high = 10.0;
        assert!(matches!(ChartSeries::new(vec![c]), Err(ChartError::InvalidRange { .. })));
    }

    #[test]
    fn mock_series_is_valid_and_deterministic() {
        let end = day(31);
        let a = mock_series(9, 20, end);
        assert_eq!(a.len(), 20);
        assert!(ChartSeries::new(a.candles().to_vec()).is_ok());
        assert_eq!(a, mock_series(9, 20, end));
        assert!(a.candles().last().unwrap().day < end);
    }

    #[test]
    fn deserialize_validates() {
        let json = r#"[
            {"time": "2024-01-03", "open": 1, "high": 2, "low": 0.5, "close": 1.5, "volume": 10},
            {"time": "2024-01-02", "open": 1, "high": 2, "low": 0.5, "close": 1.5, "volume": 10}
        ]"#;
        assert!(serde_json::from_str::<ChartSeries>(json).is_err());
    }
}
