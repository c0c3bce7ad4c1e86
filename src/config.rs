//! Engine configuration.
//!
//! Every knob has a default matching the stock market map, and a JSON file
//! may override any subset of them:
//!
//! ```json
//! { "layout": { "padding": 0.5 }, "height": { "pe": { "min": 0, "max": 80 } } }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec::color::Rgba;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("layout extent must be positive and finite, got {0}")]
    InvalidExtent(f64),
    #[error("{name} must be non-negative and finite, got {value}")]
    NegativeLength { name: &'static str, value: f64 },
    #[error("layout min_span must be positive and finite, got {0}")]
    NonPositiveSpan(f64),
    #[error("domain '{name}' is empty or inverted: [{min}, {max}]")]
    InvalidDomain { name: &'static str, min: f64, max: f64 },
    #[error("log10 market-cap mapping needs a positive domain, got min {0}")]
    NonPositiveLogDomain(f64),
    #[error("box shrink must be in (0, 1], got {0}")]
    InvalidShrink(f32),
    #[error("performance thresholds must satisfy 0 <= medium < strong, got {medium} / {strong}")]
    InvalidThresholds { medium: f64, strong: f64 },
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A closed numeric interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricDomain {
    pub min: f64,
    pub max: f64,
}

impl MetricDomain {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, v: f64) -> f64 {
        v.clamp(self.min, self.max)
    }

    /// Position of `v` inside the domain, clamped to `[0, 1]`.
    pub fn normalize(&self, v: f64) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 {
            return 0.0;
        }
        ((self.clamp(v) - self.min) / span).clamp(0.0, 1.0)
    }

    pub fn lerp(&self, t: f64) -> f64 {
        self.min + (self.max - self.min) * t
    }

    fn check(&self, name: &'static str) -> Result<(), ConfigError> {
        if self.min.is_finite() && self.max.is_finite() && self.min < self.max {
            Ok(())
        } else {
            Err(ConfigError::InvalidDomain { name, min: self.min, max: self.max })
        }
    }

    /// Like `check`, but a reversed interval is allowed (e.g. a hue ramp).
    fn check_ramp(&self, name: &'static str) -> Result<(), ConfigError> {
        if self.min.is_finite() && self.max.is_finite() {
            Ok(())
        } else {
            Err(ConfigError::InvalidDomain { name, min: self.min, max: self.max })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeMapping {
    #[default]
    Linear,
    Log10,
}

// ━━━ Layout ━━━

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Side of the square map, in map units.
    pub extent: f64,
    /// Inset applied to every internal node before its children are placed.
    pub padding: f64,
    /// Band reserved at the top of each sector for its header.
    pub group_header: f64,
    /// Smallest span an inset may leave behind.
    pub min_span: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self { extent: 100.0, padding: 0.3, group_header: 0.0, min_span: 1e-3 }
    }
}

impl LayoutConfig {
    pub fn with_extent(mut self, extent: f64) -> Self {
        self.extent = extent;
        self
    }

    pub fn with_padding(mut self, padding: f64) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_group_header(mut self, band: f64) -> Self {
        self.group_header = band;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.extent.is_finite() && self.extent > 0.0) {
            return Err(ConfigError::InvalidExtent(self.extent));
        }
        for (name, value) in [
            ("padding", self.padding),
            ("group_header", self.group_header),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::NegativeLength { name, value });
            }
        }
        // a zero span would let a collapsed inset produce x0 == x1
        if !(self.min_span.is_finite() && self.min_span > 0.0) {
            return Err(ConfigError::NonPositiveSpan(self.min_span));
        }
        Ok(())
    }
}

// ━━━ Height channel ━━━

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeightScale {
    pub pe: MetricDomain,
    pub pb: MetricDomain,
    /// Dividend yield in percent.
    pub yield_percent: MetricDomain,
    pub relative_volume: MetricDomain,
    /// Output range shared by every attribute-driven metric.
    pub range: MetricDomain,
    /// Absolute leaf-weight domain for the market-cap metric.
    pub market_cap: MetricDomain,
    pub market_cap_range: MetricDomain,
    pub market_cap_mapping: SizeMapping,
}

impl Default for HeightScale {
    fn default() -> Self {
        Self {
            pe: MetricDomain::new(5.0, 60.0),
            pb: MetricDomain::new(0.5, 10.0),
            yield_percent: MetricDomain::new(0.0, 8.0),
            relative_volume: MetricDomain::new(0.5, 10.0),
            range: MetricDomain::new(1.0, 20.0),
            market_cap: MetricDomain::new(1e9, 2e12),
            market_cap_range: MetricDomain::new(2.0, 20.0),
            market_cap_mapping: SizeMapping::Linear,
        }
    }
}

impl HeightScale {
    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.range = MetricDomain::new(min, max);
        self
    }

    pub fn with_market_cap_mapping(mut self, mapping: SizeMapping) -> Self {
        self.market_cap_mapping = mapping;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pe.check("height.pe")?;
        self.pb.check("height.pb")?;
        self.yield_percent.check("height.yield_percent")?;
        self.relative_volume.check("height.relative_volume")?;
        self.range.check("height.range")?;
        self.market_cap.check("height.market_cap")?;
        self.market_cap_range.check("height.market_cap_range")?;
        if self.range.min < 0.0 || self.market_cap_range.min < 0.0 {
            return Err(ConfigError::NegativeLength {
                name: "height.range.min",
                value: self.range.min.min(self.market_cap_range.min),
            });
        }
        if self.market_cap_mapping == SizeMapping::Log10 && self.market_cap.min <= 0.0 {
            return Err(ConfigError::NonPositiveLogDomain(self.market_cap.min));
        }
        Ok(())
    }
}

// ━━━ Color channel ━━━

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorScale {
    pub strong_up: Rgba,
    pub medium_up: Rgba,
    pub light_up: Rgba,
    pub strong_down: Rgba,
    pub medium_down: Rgba,
    pub light_down: Rgba,
    /// Used when an instrument has no performance reading.
    pub neutral: Rgba,
    /// Fractional moves; 0.03 = 3%.
    pub strong_threshold: f64,
    pub medium_threshold: f64,

    pub yield_domain: MetricDomain,
    pub yield_lightness: MetricDomain,
    pub yield_hue: f64,
    pub yield_saturation: f64,

    pub debt_domain: MetricDomain,
    /// Hue ramp from low to high leverage (blue → red).
    pub debt_hue: MetricDomain,
    pub debt_saturation: f64,
    pub debt_lightness: f64,
}

impl Default for ColorScale {
    fn default() -> Self {
        Self {
            strong_up: Rgba::rgb(0x16, 0xa3, 0x4a),
            medium_up: Rgba::rgb(0x22, 0xc5, 0x5e),
            light_up: Rgba::rgb(0x4a, 0xde, 0x80),
            strong_down: Rgba::rgb(0xdc, 0x26, 0x26),
            medium_down: Rgba::rgb(0xef, 0x44, 0x44),
            light_down: Rgba::rgb(0xf8, 0x71, 0x71),
            neutral: Rgba::rgb(0x64, 0x74, 0x8b),
            strong_threshold: 0.03,
            medium_threshold: 0.01,
            yield_domain: MetricDomain::new(0.0, 0.08),
            yield_lightness: MetricDomain::new(0.1, 0.9),
            yield_hue: 0.5,
            yield_saturation: 1.0,
            debt_domain: MetricDomain::new(0.0, 3.0),
            debt_hue: MetricDomain::new(0.6, 0.0),
            debt_saturation: 0.8,
            debt_lightness: 0.5,
        }
    }
}

impl ColorScale {
    pub fn with_thresholds(mut self, medium: f64, strong: f64) -> Self {
        self.medium_threshold = medium;
        self.strong_threshold = strong;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let (medium, strong) = (self.medium_threshold, self.strong_threshold);
        if !(medium.is_finite() && strong.is_finite() && medium >= 0.0 && medium < strong) {
            return Err(ConfigError::InvalidThresholds { medium, strong });
        }
        self.yield_domain.check("color.yield_domain")?;
        self.debt_domain.check("color.debt_domain")?;
        self.yield_lightness.check_ramp("color.yield_lightness")?;
        self.debt_hue.check_ramp("color.debt_hue")?;
        Ok(())
    }
}

// ━━━ Presentation ━━━

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresentationConfig {
    /// Fraction of each cell a box (3D) or tile (2D) occupies, leaving
    /// streets between neighbours.
    pub shrink: f32,
    /// Labels are drawn only when both width and depth reach this size, in
    /// map units. The threshold does not depend on zoom or viewport size.
    pub label_min_size: f32,
    /// Roof label size is `min(w, d) / label_divisor`.
    pub label_divisor: f32,
    /// Deepest group level that gets a frame in the planar view.
    pub max_group_depth: usize,
    /// How far the hovered box is lightened towards white.
    pub highlight: f32,
    pub background: Rgba,
    pub ground: Rgba,
    pub frame: Rgba,
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            shrink: 0.9,
            label_min_size: 3.0,
            label_divisor: 3.5,
            max_group_depth: 1,
            highlight: 0.35,
            background: Rgba::rgb(0x0f, 0x17, 0x2a),
            ground: Rgba::rgb(0x1e, 0x29, 0x3b),
            frame: Rgba::rgb(0x33, 0x41, 0x55),
        }
    }
}

impl PresentationConfig {
    pub fn with_shrink(mut self, shrink: f32) -> Self {
        self.shrink = shrink;
        self
    }

    pub fn with_label_min_size(mut self, size: f32) -> Self {
        self.label_min_size = size;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.shrink > 0.0 && self.shrink <= 1.0) {
            return Err(ConfigError::InvalidShrink(self.shrink));
        }
        if !(self.label_min_size.is_finite() && self.label_min_size >= 0.0) {
            return Err(ConfigError::NegativeLength {
                name: "presentation.label_min_size",
                value: self.label_min_size as f64,
            });
        }
        if !(self.label_divisor.is_finite() && self.label_divisor > 0.0) {
            return Err(ConfigError::NegativeLength {
                name: "presentation.label_divisor",
                value: self.label_divisor as f64,
            });
        }
        Ok(())
    }
}

// ━━━ Bubble chart ━━━

/// Scatter view of a universe: x = performance, y = relative volume,
/// bubble size = weight, fill = sector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BubbleConfig {
    pub energy: Rgba,
    pub metals: Rgba,
    pub agriculture: Rgba,
    pub livestock: Rgba,
    /// Instruments that sit directly under the root.
    pub unassigned: Rgba,
    /// Weights mapped (log10, clamped) onto `diameter`.
    pub size_domain: MetricDomain,
    /// Bubble diameter range in pixels.
    pub diameter: MetricDomain,
    /// Plot margins in pixels: top, right, bottom, left.
    pub margins: [f32; 4],
    pub opacity: f32,
}

impl Default for BubbleConfig {
    fn default() -> Self {
        Self {
            energy: Rgba::rgb(0xef, 0x44, 0x44),
            metals: Rgba::rgb(0xea, 0xb3, 0x08),
            agriculture: Rgba::rgb(0x22, 0xc5, 0x5e),
            livestock: Rgba::rgb(0xf9, 0x73, 0x16),
            unassigned: Rgba::rgb(0x94, 0xa3, 0xb8),
            size_domain: MetricDomain::new(1e9, 2e11),
            diameter: MetricDomain::new(10.0, 50.0),
            margins: [40.0, 40.0, 40.0, 50.0],
            opacity: 0.8,
        }
    }
}

impl BubbleConfig {
    pub fn palette(&self) -> [Rgba; 4] {
        [self.energy, self.metals, self.agriculture, self.livestock]
    }

    /// Commodity sectors get their own color by name; any other sector takes
    /// the palette entry at its position among the sectors.
    pub fn sector_color(&self, name: &str, ordinal: usize) -> Rgba {
        let key = name.to_ascii_lowercase();
        if key.starts_with("energy") {
            self.energy
        } else if key.contains("metal") {
            self.metals
        } else if key.contains("agri") {
            self.agriculture
        } else if key.contains("meat") || key.contains("livestock") {
            self.livestock
        } else {
            self.palette()[ordinal % 4]
        }
    }

    /// Diameter in pixels for a weight; missing or non-positive weights get
    /// the smallest bubble.
    pub fn diameter_for(&self, weight: f64) -> f32 {
        let d = self.size_domain;
        if !(weight.is_finite() && weight > 0.0) {
            return self.diameter.min as f32;
        }
        let (lo, hi) = (d.min.log10(), d.max.log10());
        let t = ((d.clamp(weight).log10() - lo) / (hi - lo)).clamp(0.0, 1.0);
        self.diameter.lerp(t) as f32
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.size_domain.check("bubble.size_domain")?;
        if self.size_domain.min <= 0.0 {
            return Err(ConfigError::NonPositiveLogDomain(self.size_domain.min));
        }
        self.diameter.check("bubble.diameter")?;
        if self.diameter.min <= 0.0 {
            return Err(ConfigError::NegativeLength { name: "bubble.diameter.min", value: self.diameter.min });
        }
        for value in self.margins {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::NegativeLength { name: "bubble.margins", value: value as f64 });
            }
        }
        if !(self.opacity > 0.0 && self.opacity <= 1.0) {
            return Err(ConfigError::NegativeLength { name: "bubble.opacity", value: self.opacity as f64 });
        }
        Ok(())
    }
}

// ━━━ Engine ━━━

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub layout: LayoutConfig,
    pub height: HeightScale,
    pub color: ColorScale,
    pub presentation: PresentationConfig,
    pub bubble: BubbleConfig,
}

impl EngineConfig {
    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_height(mut self, height: HeightScale) -> Self {
        self.height = height;
        self
    }

    pub fn with_color(mut self, color: ColorScale) -> Self {
        self.color = color;
        self
    }

    pub fn with_presentation(mut self, presentation: PresentationConfig) -> Self {
        self.presentation = presentation;
        self
    }

    pub fn with_bubble(mut self, bubble: BubbleConfig) -> Self {
        self.bubble = bubble;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.layout.validate()?;
        self.height.validate()?;
        self.color.validate()?;
        self.presentation.validate()?;
        self.bubble.validate()
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json(&text)?;
        log::info!("Loaded config {}", path.display());
        Ok(config)
    }
}
