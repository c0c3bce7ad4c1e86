//! Metric codec: raw financial attributes → bounded visual channels.
//!
//! Two independent encodings per instrument:
//!   - height: one attribute clamped to its domain and remapped to a range
//!   - color:  a bracketed performance scale or an HSL ramp
//!
//! Everything here is a pure function of its inputs. Missing readings never
//! fail: heights fall back to 0 before clamping, performance falls back to
//! the neutral color.

pub mod color;

use crate::config::{ColorScale, HeightScale, SizeMapping};
use crate::market::Instrument;
use color::Rgba;

// ━━━ Metric selection ━━━

/// Attribute mapped onto box height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HeightMetric {
    #[default]
    Pe,
    Pb,
    Yield,
    MarketCap,
    RelativeVolume,
}

impl HeightMetric {
    pub const ALL: [HeightMetric; 5] = [
        HeightMetric::Pe,
        HeightMetric::Pb,
        HeightMetric::Yield,
        HeightMetric::MarketCap,
        HeightMetric::RelativeVolume,
    ];

    pub fn name(self) -> &'static str {
        match self {
            HeightMetric::Pe => "pe",
            HeightMetric::Pb => "pb",
            HeightMetric::Yield => "yield",
            HeightMetric::MarketCap => "market_cap",
            HeightMetric::RelativeVolume => "relative_volume",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HeightMetric::Pe => "P/E Ratio",
            HeightMetric::Pb => "P/B Ratio",
            HeightMetric::Yield => "Dividend Yield",
            HeightMetric::MarketCap => "Market Cap",
            HeightMetric::RelativeVolume => "Relative Volume",
        }
    }

    /// Parse a wire name. Unknown names fall back to P/E with a warning.
    pub fn from_name(name: &str) -> Self {
        let key = name.trim().to_ascii_lowercase();
        match Self::ALL.iter().find(|m| m.name() == key) {
            Some(m) => *m,
            None => {
                log::warn!("Unknown height metric '{}', falling back to '{}'", name, Self::default().name());
                Self::default()
            }
        }
    }
}

/// Attribute mapped onto box color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorMetric {
    #[default]
    Performance,
    Yield,
    Debt,
}

impl ColorMetric {
    pub const ALL: [ColorMetric; 3] = [ColorMetric::Performance, ColorMetric::Yield, ColorMetric::Debt];

    pub fn name(self) -> &'static str {
        match self {
            ColorMetric::Performance => "performance",
            ColorMetric::Yield => "yield",
            ColorMetric::Debt => "debt",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ColorMetric::Performance => "Performance",
            ColorMetric::Yield => "Dividend Yield",
            ColorMetric::Debt => "Debt / Equity",
        }
    }

    /// Parse a wire name. Unknown names fall back to performance with a warning.
    pub fn from_name(name: &str) -> Self {
        let key = name.trim().to_ascii_lowercase();
        match Self::ALL.iter().find(|m| m.name() == key) {
            Some(m) => *m,
            None => {
                log::warn!("Unknown color metric '{}', falling back to '{}'", name, Self::default().name());
                Self::default()
            }
        }
    }
}

// ━━━ Height ━━━

/// Box height for `instrument` under `metric`, always inside the configured range.
pub fn height_value(instrument: &Instrument, metric: HeightMetric, scale: &HeightScale) -> f32 {
    let a = &instrument.attributes;
    let (raw, domain) = match metric {
        HeightMetric::MarketCap => return market_cap_height(instrument.weight, scale),
        HeightMetric::Pe => (a.pe_ratio, scale.pe),
        HeightMetric::Pb => (a.pb_ratio, scale.pb),
        HeightMetric::Yield => (a.dividend_yield.map(|y| y * 100.0), scale.yield_percent),
        HeightMetric::RelativeVolume => (a.relative_volume, scale.relative_volume),
    };
    let raw = raw.filter(|v| v.is_finite()).unwrap_or(0.0);
    scale.range.lerp(domain.normalize(raw)) as f32
}

fn market_cap_height(weight: f64, scale: &HeightScale) -> f32 {
    let weight = if weight.is_finite() { weight } else { 0.0 };
    let domain = scale.market_cap;
    let t = match scale.market_cap_mapping {
        SizeMapping::Linear => domain.normalize(weight),
        SizeMapping::Log10 => {
            let (lo, hi) = (domain.min.log10(), domain.max.log10());
            let v = domain.clamp(weight).log10();
            ((v - lo) / (hi - lo)).clamp(0.0, 1.0)
        }
    };
    scale.market_cap_range.lerp(t) as f32
}

// ━━━ Color ━━━

/// Bracket of the three-tier performance scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceTier {
    StrongUp,
    MediumUp,
    LightUp,
    LightDown,
    MediumDown,
    StrongDown,
}

pub fn performance_tier(performance: f64, scale: &ColorScale) -> PerformanceTier {
    if performance > scale.strong_threshold {
        PerformanceTier::StrongUp
    } else if performance > scale.medium_threshold {
        PerformanceTier::MediumUp
    } else if performance >= 0.0 {
        PerformanceTier::LightUp
    } else if performance < -scale.strong_threshold {
        PerformanceTier::StrongDown
    } else if performance < -scale.medium_threshold {
        PerformanceTier::MediumDown
    } else {
        PerformanceTier::LightDown
    }
}

impl PerformanceTier {
    pub fn color(self, scale: &ColorScale) -> Rgba {
        match self {
            PerformanceTier::StrongUp => scale.strong_up,
            PerformanceTier::MediumUp => scale.medium_up,
            PerformanceTier::LightUp => scale.light_up,
            PerformanceTier::LightDown => scale.light_down,
            PerformanceTier::MediumDown => scale.medium_down,
            PerformanceTier::StrongDown => scale.strong_down,
        }
    }
}

/// Fill color for `instrument` under `metric`. Defined for every input.
pub fn color_value(instrument: &Instrument, metric: ColorMetric, scale: &ColorScale) -> Rgba {
    let a = &instrument.attributes;
    match metric {
        ColorMetric::Performance => match a.performance_ratio.filter(|p| p.is_finite()) {
            Some(p) => performance_tier(p, scale).color(scale),
            None => scale.neutral,
        },
        ColorMetric::Yield => {
            let y = a.dividend_yield.filter(|v| v.is_finite()).unwrap_or(0.0);
            let l = scale.yield_lightness.lerp(scale.yield_domain.normalize(y));
            Rgba::from_hsl(scale.yield_hue as f32, scale.yield_saturation as f32, l as f32)
        }
        ColorMetric::Debt => {
            let d = a.debt_to_equity.filter(|v| v.is_finite()).unwrap_or(0.0);
            let h = scale.debt_hue.lerp(scale.debt_domain.normalize(d));
            Rgba::from_hsl(h as f32, scale.debt_saturation as f32, scale.debt_lightness as f32)
        }
    }
}

// ━━━ Tooltip readouts ━━━

/// Human-readable values shown when a box is hovered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Readout {
    /// Signed percent move, e.g. `+1.20%`.
    pub performance: String,
    /// The active height metric, e.g. `P/E: 22.0`.
    pub height: String,
    /// The active color metric unless it is performance (already shown).
    pub color: Option<String>,
}

impl Readout {
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.performance.as_str())
            .chain(std::iter::once(self.height.as_str()))
            .chain(self.color.as_deref())
    }
}

pub fn readout(instrument: &Instrument, height: HeightMetric, color: ColorMetric) -> Readout {
    let a = &instrument.attributes;
    let performance = match a.performance_ratio {
        Some(p) => format!("{:+.2}%", p * 100.0),
        None => "n/a".to_string(),
    };
    let height = match height {
        HeightMetric::Pe => format!("P/E: {}", fixed(a.pe_ratio, 1)),
        HeightMetric::Pb => format!("P/B: {}", fixed(a.pb_ratio, 1)),
        HeightMetric::Yield => dividend(a.dividend_yield),
        HeightMetric::MarketCap => format!("Cap: {}", dollars(instrument.weight)),
        HeightMetric::RelativeVolume => match a.relative_volume {
            Some(v) => format!("RVol: {:.2}x", v),
            None => "RVol: n/a".to_string(),
        },
    };
    let color = match color {
        ColorMetric::Performance => None,
        ColorMetric::Yield => Some(dividend(a.dividend_yield)),
        ColorMetric::Debt => Some(format!("D/E: {}", fixed(a.debt_to_equity, 2))),
    };
    Readout { performance, height, color }
}

fn fixed(v: Option<f64>, decimals: usize) -> String {
    match v {
        Some(v) => format!("{:.*}", decimals, v),
        None => "n/a".to_string(),
    }
}

fn dividend(v: Option<f64>) -> String {
    match v {
        Some(y) => format!("Div: {:.2}%", y * 100.0),
        None => "Div: n/a".to_string(),
    }
}

/// `$2.1T`, `$350.0B`, `$12.0M`, `$950`
fn dollars(v: f64) -> String {
    const UNITS: [(f64, &str); 3] = [(1e12, "T"), (1e9, "B"), (1e6, "M")];
    for (size, suffix) in UNITS {
        if v >= size {
            return format!("${:.1}{}", v / size, suffix);
        }
    }
    format!("${:.0}", v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::Attributes;

    fn instrument(attributes: Attributes) -> Instrument {
        Instrument {
            name: "Test".into(),
            ticker: "TST".into(),
            weight: 5e11,
            attributes,
        }
    }

    fn perf(p: f64) -> Instrument {
        instrument(Attributes { performance_ratio: Some(p), ..Attributes::default() })
    }

    #[test]
    fn metric_names_parse_and_fall_back() {
        for m in HeightMetric::ALL {
            assert_eq!(HeightMetric::from_name(m.name()), m);
        }
        for m in ColorMetric::ALL {
            assert_eq!(ColorMetric::from_name(m.name()), m);
        }
        assert_eq!(HeightMetric::from_name(" PB "), HeightMetric::Pb);
        assert_eq!(HeightMetric::from_name("ebitda"), HeightMetric::Pe);
        assert_eq!(ColorMetric::from_name("momentum"), ColorMetric::Performance);
    }

    #[test]
    fn pe_is_clamped_to_domain() {
        let scale = HeightScale::default();
        let at_cap = instrument(Attributes { pe_ratio: Some(60.0), ..Attributes::default() });
        let beyond = instrument(Attributes { pe_ratio: Some(200.0), ..Attributes::default() });
        assert_eq!(
            height_value(&at_cap, HeightMetric::Pe, &scale),
            height_value(&beyond, HeightMetric::Pe, &scale)
        );
        assert_eq!(height_value(&beyond, HeightMetric::Pe, &scale), 20.0);
    }

    #[test]
    fn missing_attribute_reads_as_zero() {
        let scale = HeightScale::default();
        let bare = instrument(Attributes::default());
        // 0 clamps to the bottom of every attribute domain
        for m in [HeightMetric::Pe, HeightMetric::Pb, HeightMetric::Yield, HeightMetric::RelativeVolume] {
            assert_eq!(height_value(&bare, m, &scale), 1.0);
        }
    }

    #[test]
    fn yield_height_uses_percent() {
        let scale = HeightScale::default();
        let inst = instrument(Attributes { dividend_yield: Some(0.04), ..Attributes::default() });
        // 4% is the middle of [0, 8]
        assert!((height_value(&inst, HeightMetric::Yield, &scale) - 10.5).abs() < 1e-5);
    }

    #[test]
    fn market_cap_ignores_attributes() {
        let scale = HeightScale::default();
        let mut inst = instrument(Attributes::default());
        inst.weight = 2e12;
        assert_eq!(height_value(&inst, HeightMetric::MarketCap, &scale), 20.0);
        inst.weight = 5e15;
        assert_eq!(height_value(&inst, HeightMetric::MarketCap, &scale), 20.0);
        inst.weight = 0.0;
        assert_eq!(height_value(&inst, HeightMetric::MarketCap, &scale), 2.0);
    }

    #[test]
    fn market_cap_log_mapping() {
        let scale = HeightScale::default().with_market_cap_mapping(SizeMapping::Log10);
        let mut inst = instrument(Attributes::default());
        inst.weight = (1e9_f64 * 2e12).sqrt();
        assert!((height_value(&inst, HeightMetric::MarketCap, &scale) - 11.0).abs() < 1e-4);
    }

    #[test]
    fn performance_tiers() {
        let scale = ColorScale::default();
        assert_eq!(performance_tier(0.04, &scale), PerformanceTier::StrongUp);
        assert_eq!(performance_tier(0.02, &scale), PerformanceTier::MediumUp);
        assert_eq!(performance_tier(0.0, &scale), PerformanceTier::LightUp);
        assert_eq!(performance_tier(-0.005, &scale), PerformanceTier::LightDown);
        assert_eq!(performance_tier(-0.02, &scale), PerformanceTier::MediumDown);
        assert_eq!(performance_tier(-0.05, &scale), PerformanceTier::StrongDown);
        // boundaries belong to the weaker bracket
        assert_eq!(performance_tier(0.03, &scale), PerformanceTier::MediumUp);
        assert_eq!(performance_tier(-0.01, &scale), PerformanceTier::LightDown);
    }

    #[test]
    fn performance_colors() {
        let scale = ColorScale::default();
        assert_eq!(color_value(&perf(0.04), ColorMetric::Performance, &scale), Rgba::rgb(0x16, 0xa3, 0x4a));
        assert_eq!(color_value(&perf(-0.005), ColorMetric::Performance, &scale), Rgba::rgb(0xf8, 0x71, 0x71));
        let bare = instrument(Attributes::default());
        assert_eq!(color_value(&bare, ColorMetric::Performance, &scale), scale.neutral);
    }

    #[test]
    fn yield_lightness_ramps() {
        let scale = ColorScale::default();
        let low = color_value(&instrument(Attributes::default()), ColorMetric::Yield, &scale);
        let high = instrument(Attributes { dividend_yield: Some(0.5), ..Attributes::default() });
        let high = color_value(&high, ColorMetric::Yield, &scale);
        assert_eq!(low, Rgba::from_hsl(0.5, 1.0, 0.1));
        assert_eq!(high, Rgba::from_hsl(0.5, 1.0, 0.9));
    }

    #[test]
    fn debt_hue_runs_blue_to_red() {
        let scale = ColorScale::default();
        let none = color_value(&instrument(Attributes::default()), ColorMetric::Debt, &scale);
        let heavy = instrument(Attributes { debt_to_equity: Some(9.0), ..Attributes::default() });
        let heavy = color_value(&heavy, ColorMetric::Debt, &scale);
        assert!(none.b > none.r);
        assert!(heavy.r > heavy.b);
        assert_eq!(heavy, Rgba::from_hsl(0.0, 0.8, 0.5));
    }

    #[test]
    fn encoding_is_bit_identical_on_repeat() {
        let inst = instrument(Attributes {
            performance_ratio: Some(0.0123),
            pe_ratio: Some(17.3),
            debt_to_equity: Some(1.7),
            ..Attributes::default()
        });
        let (hs, cs) = (HeightScale::default(), ColorScale::default());
        for m in HeightMetric::ALL {
            assert_eq!(height_value(&inst, m, &hs).to_bits(), height_value(&inst, m, &hs).to_bits());
        }
        for m in ColorMetric::ALL {
            assert_eq!(color_value(&inst, m, &cs), color_value(&inst, m, &cs));
        }
    }

    #[test]
    fn readout_strings() {
        let inst = instrument(Attributes {
            performance_ratio: Some(0.012),
            pe_ratio: Some(22.0),
            dividend_yield: Some(0.025),
            debt_to_equity: Some(1.1),
            relative_volume: Some(1.8),
            ..Attributes::default()
        });
        let r = readout(&inst, HeightMetric::Pe, ColorMetric::Yield);
        assert_eq!(r.performance, "+1.20%");
        assert_eq!(r.height, "P/E: 22.0");
        assert_eq!(r.color.as_deref(), Some("Div: 2.50%"));
        assert_eq!(r.lines().count(), 3);

        let r = readout(&inst, HeightMetric::RelativeVolume, ColorMetric::Debt);
        assert_eq!(r.height, "RVol: 1.80x");
        assert_eq!(r.color.as_deref(), Some("D/E: 1.10"));

        let r = readout(&inst, HeightMetric::MarketCap, ColorMetric::Performance);
        assert_eq!(r.height, "Cap: $500.0B");
        assert_eq!(r.color, None);

        let bare = readout(&instrument(Attributes::default()), HeightMetric::Pb, ColorMetric::Performance);
        assert_eq!(bare.performance, "n/a");
        assert_eq!(bare.height, "P/B: n/a");
    }
}
