//! Analysis configuration.
//!
//! Every window size, threshold and symbol the pipeline uses lives here and is
//! passed into the entry point explicitly. All fields have defaults, so an
//! empty TOML document is a valid configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Timeframe;
use crate::indicators::atr::AtrMode;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Which of the four required primary series a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesRole {
    VeryFast,
    Fast,
    Short,
    Long,
}

impl SeriesRole {
    pub fn all() -> [SeriesRole; 4] {
        [
            SeriesRole::VeryFast,
            SeriesRole::Fast,
            SeriesRole::Short,
            SeriesRole::Long,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            SeriesRole::VeryFast => "very_fast",
            SeriesRole::Fast => "fast",
            SeriesRole::Short => "short",
            SeriesRole::Long => "long",
        }
    }
}

impl std::fmt::Display for SeriesRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeframeSpec {
    pub timeframe: Timeframe,
    /// Calendar days of history requested from the provider.
    pub lookback_days: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeframesConfig {
    pub very_fast: TimeframeSpec,
    pub fast: TimeframeSpec,
    pub short: TimeframeSpec,
    pub long: TimeframeSpec,
}

impl TimeframesConfig {
    pub fn get(&self, role: SeriesRole) -> TimeframeSpec {
        match role {
            SeriesRole::VeryFast => self.very_fast,
            SeriesRole::Fast => self.fast,
            SeriesRole::Short => self.short,
            SeriesRole::Long => self.long,
        }
    }
}

impl Default for TimeframesConfig {
    fn default() -> Self {
        Self {
            very_fast: TimeframeSpec {
                timeframe: Timeframe::Min5,
                lookback_days: 1,
            },
            fast: TimeframeSpec {
                timeframe: Timeframe::Min15,
                lookback_days: 5,
            },
            short: TimeframeSpec {
                timeframe: Timeframe::Hour1,
                lookback_days: 7,
            },
            long: TimeframeSpec {
                timeframe: Timeframe::Hour4,
                lookback_days: 30,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub rsi_period: usize,
    pub sma_period: usize,
    pub atr_period: usize,
    pub atr_mode: AtrMode,
    pub volume_window: usize,
    pub volume_spike_multiplier: f64,
    pub trend_span: usize,
    /// Window for the rolling high/low reported as resistance/support.
    pub range_window: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            sma_period: 25,
            atr_period: 14,
            atr_mode: AtrMode::TrueRange,
            volume_window: 20,
            volume_spike_multiplier: 1.5,
            trend_span: 20,
            range_window: 48,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CisdConfig {
    /// Number of bar-to-bar changes examined.
    pub lookback: usize,
    /// Shock threshold in standard deviations.
    pub sigma: f64,
}

impl Default for CisdConfig {
    fn default() -> Self {
        Self {
            lookback: 50,
            sigma: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeProfileConfig {
    pub bins: usize,
    /// A bin is a vacuum when its weight is below this fraction of the mean.
    pub vacuum_ratio: f64,
    /// Zones surfaced in the report, in ascending price order.
    pub max_zones: usize,
    /// Trailing bars included; 0 means the whole series.
    pub window: usize,
}

impl Default for VolumeProfileConfig {
    fn default() -> Self {
        Self {
            bins: 15,
            vacuum_ratio: 0.3,
            max_zones: 3,
            window: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// |composite_short| above this drives the directional statuses.
    pub signal_threshold: i32,
    pub rsi_weight_short: f64,
    pub deviation_weight: f64,
    /// Multiplier applied to the short composite while ATR is expanding.
    pub atr_boost: f64,
    pub rsi_weight_long: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            signal_threshold: 30,
            rsi_weight_short: 1.5,
            deviation_weight: -15.0,
            atr_boost: 1.2,
            rsi_weight_long: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Fixed offset used to stamp `update_timestamp`.
    pub utc_offset_hours: i32,
    /// Lower/upper clamp of the RSI-derived buy ratio.
    pub buy_ratio_bounds: (u8, u8),
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            utc_offset_hours: 9,
            buy_ratio_bounds: (10, 90),
        }
    }
}

/// Full analysis configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub symbol: String,
    /// Correlation proxies, tried in order.
    pub proxies: Vec<String>,
    pub timeframes: TimeframesConfig,
    pub indicators: IndicatorConfig,
    pub cisd: CisdConfig,
    pub volume_profile: VolumeProfileConfig,
    pub scoring: ScoringConfig,
    pub report: ReportConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            symbol: "GC=F".into(),
            proxies: vec!["DX-Y.NYB".into(), "DX=F".into(), "UUP".into()],
            timeframes: TimeframesConfig::default(),
            indicators: IndicatorConfig::default(),
            cisd: CisdConfig::default(),
            volume_profile: VolumeProfileConfig::default(),
            scoring: ScoringConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: AnalysisConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbol.trim().is_empty() {
            return Err(ConfigError::Invalid("symbol must not be empty".into()));
        }

        let ind = &self.indicators;
        let periods = [
            ("rsi_period", ind.rsi_period),
            ("sma_period", ind.sma_period),
            ("atr_period", ind.atr_period),
            ("volume_window", ind.volume_window),
            ("trend_span", ind.trend_span),
            ("range_window", ind.range_window),
            ("cisd.lookback", self.cisd.lookback),
            ("volume_profile.bins", self.volume_profile.bins),
            ("volume_profile.max_zones", self.volume_profile.max_zones),
        ];
        for (name, value) in periods {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be > 0")));
            }
        }

        let positives = [
            ("volume_spike_multiplier", ind.volume_spike_multiplier),
            ("cisd.sigma", self.cisd.sigma),
            ("volume_profile.vacuum_ratio", self.volume_profile.vacuum_ratio),
            ("scoring.atr_boost", self.scoring.atr_boost),
        ];
        for (name, value) in positives {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }

        if self.scoring.signal_threshold < 0 {
            return Err(ConfigError::Invalid(
                "scoring.signal_threshold must be >= 0".into(),
            ));
        }

        let (lo, hi) = self.report.buy_ratio_bounds;
        if lo > hi || hi > 100 {
            return Err(ConfigError::Invalid(format!(
                "report.buy_ratio_bounds must satisfy lo <= hi <= 100, got ({lo}, {hi})"
            )));
        }

        if !(-12..=14).contains(&self.report.utc_offset_hours) {
            return Err(ConfigError::Invalid(format!(
                "report.utc_offset_hours out of range: {}",
                self.report.utc_offset_hours
            )));
        }

        Ok(())
    }
}
