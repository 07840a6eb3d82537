//! Analysis stages and report assembly.
//!
//! Five first-stage analyzers read the input series independently:
//! - indicator snapshots of the short and long series
//! - correlation against the resolved proxy
//! - CISD supply/demand levels on the fast series
//! - volume-profile vacuum zones on the fast series
//! - trend sync between the very-fast and fast series
//!
//! None of them depends on another, so callers may evaluate them in any order
//! or in parallel. `assemble` is the fan-in: it rejects undefined inputs,
//! scores, classifies and builds the `Report`.

pub mod cisd;
pub mod correlation;
pub mod scoring;
pub mod snapshot;
pub mod sync;
pub mod volume_profile;

pub use cisd::{detect as detect_cisd, CisdLevels, LevelKind, SupplyDemandLevel};
pub use correlation::{align_closes, correlate, resolve_proxy, Correlation, ProxyResolution};
pub use scoring::{classify, score, Classification, ScoringInputs, SignalStatus};
pub use snapshot::{IndicatorSnapshot, Trend};
pub use sync::{synchronize, SyncState};
pub use volume_profile::{vacuum_zones, VacuumZone, VolumeProfile};

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, Utc};
use tracing::info;

use crate::config::{AnalysisConfig, SeriesRole};
use crate::domain::Series;
use crate::error::AnalysisError;
use crate::report::{Report, SCHEMA_VERSION};

/// The bar series one run analyzes. Immutable once built.
#[derive(Debug, Clone)]
pub struct AnalysisInputs {
    pub symbol: String,
    pub primary: BTreeMap<SeriesRole, Series>,
    pub proxy: ProxyResolution,
}

/// Borrowed view of the four required primary series, all non-empty.
#[derive(Debug, Clone, Copy)]
pub struct RequiredSeries<'a> {
    pub very_fast: &'a Series,
    pub fast: &'a Series,
    pub short: &'a Series,
    pub long: &'a Series,
}

impl AnalysisInputs {
    pub fn new(symbol: impl Into<String>, proxy: ProxyResolution) -> Self {
        Self {
            symbol: symbol.into(),
            primary: BTreeMap::new(),
            proxy,
        }
    }

    pub fn with_series(mut self, role: SeriesRole, series: Series) -> Self {
        self.primary.insert(role, series);
        self
    }

    /// The series for `role`, or `DataUnavailable` when absent or empty.
    pub fn require(&self, role: SeriesRole) -> Result<&Series, AnalysisError> {
        self.primary
            .get(&role)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AnalysisError::DataUnavailable {
                role,
                symbol: self.symbol.clone(),
            })
    }

    /// Check every required role up front, before any computation.
    pub fn required(&self) -> Result<RequiredSeries<'_>, AnalysisError> {
        Ok(RequiredSeries {
            very_fast: self.require(SeriesRole::VeryFast)?,
            fast: self.require(SeriesRole::Fast)?,
            short: self.require(SeriesRole::Short)?,
            long: self.require(SeriesRole::Long)?,
        })
    }
}

/// Results of the five first-stage analyzers.
#[derive(Debug, Clone, PartialEq)]
pub struct StageOutputs {
    pub short: IndicatorSnapshot,
    pub long: IndicatorSnapshot,
    pub correlation: Correlation,
    pub cisd: CisdLevels,
    pub vacuum_zones: Vec<VacuumZone>,
    pub sync: SyncState,
}

/// Run metadata stamped onto the report.
#[derive(Debug, Clone)]
pub struct ReportMeta {
    pub dataset_hash: String,
    pub synthetic: bool,
    pub generated_at: DateTime<Utc>,
}

pub fn snapshot_stage(
    series: &Series,
    role: SeriesRole,
    config: &AnalysisConfig,
) -> Result<IndicatorSnapshot, AnalysisError> {
    IndicatorSnapshot::compute(series, &config.indicators).ok_or_else(|| {
        AnalysisError::DataUnavailable {
            role,
            symbol: series.symbol().to_string(),
        }
    })
}

pub fn correlation_stage(short: &Series, proxy: &ProxyResolution) -> Correlation {
    correlate(short, proxy)
}

pub fn cisd_stage(fast: &Series, config: &AnalysisConfig) -> CisdLevels {
    detect_cisd(fast, &config.cisd)
}

pub fn volume_profile_stage(fast: &Series, config: &AnalysisConfig) -> Vec<VacuumZone> {
    vacuum_zones(fast, &config.volume_profile)
}

pub fn sync_stage(series: &RequiredSeries<'_>, config: &AnalysisConfig) -> SyncState {
    synchronize(series.very_fast, series.fast, config.indicators.trend_span)
}

/// Evaluate all first-stage analyzers one after another.
pub fn run_stages(
    inputs: &AnalysisInputs,
    config: &AnalysisConfig,
) -> Result<StageOutputs, AnalysisError> {
    let series = inputs.required()?;
    Ok(StageOutputs {
        short: snapshot_stage(series.short, SeriesRole::Short, config)?,
        long: snapshot_stage(series.long, SeriesRole::Long, config)?,
        correlation: correlation_stage(series.short, &inputs.proxy),
        cisd: cisd_stage(series.fast, config),
        vacuum_zones: volume_profile_stage(series.fast, config),
        sync: sync_stage(&series, config),
    })
}

/// An indicator is usable only when it is finite and the series covers the
/// full window plus one bar.
fn ensure_defined(
    value: f64,
    indicator: &'static str,
    role: SeriesRole,
    snapshot: &IndicatorSnapshot,
    needed: usize,
) -> Result<(), AnalysisError> {
    if value.is_finite() && snapshot.bars >= needed {
        Ok(())
    } else {
        Err(AnalysisError::UndefinedIndicator {
            indicator,
            role,
            bars: snapshot.bars,
            needed,
        })
    }
}

/// Fan-in: score, classify and build the report.
pub fn assemble(
    inputs: &AnalysisInputs,
    outputs: StageOutputs,
    config: &AnalysisConfig,
    meta: ReportMeta,
) -> Result<Report, AnalysisError> {
    let ind = &config.indicators;
    let StageOutputs {
        short,
        long,
        correlation,
        cisd,
        vacuum_zones,
        sync,
    } = outputs;

    ensure_defined(short.rsi, "rsi", SeriesRole::Short, &short, ind.rsi_period + 1)?;
    ensure_defined(short.deviation, "deviation", SeriesRole::Short, &short, ind.sma_period + 1)?;
    ensure_defined(long.rsi, "rsi", SeriesRole::Long, &long, ind.rsi_period + 1)?;

    let long_trend = long.trend;
    let classification = score(
        &ScoringInputs {
            short: &short,
            rsi_long: long.rsi,
            long_trend,
            sync: &sync,
            cisd: &cisd,
        },
        &config.scoring,
    );

    let (lo, hi) = config.report.buy_ratio_bounds;
    let buy_ratio = (short.rsi.trunc() as i64).clamp(lo as i64, hi as i64) as u8;

    let offset = FixedOffset::east_opt(config.report.utc_offset_hours * 3600).ok_or_else(|| {
        crate::config::ConfigError::Invalid(format!(
            "report.utc_offset_hours out of range: {}",
            config.report.utc_offset_hours
        ))
    })?;

    info!(
        symbol = %inputs.symbol,
        status = %classification.status,
        composite_short = classification.composite_short,
        composite_long = classification.composite_long,
        "signal classified"
    );

    Ok(Report {
        schema_version: SCHEMA_VERSION,
        symbol: inputs.symbol.clone(),
        price: short.price,
        rsi: short.rsi,
        rsi_long: long.rsi,
        deviation: short.deviation,
        atr: short.atr,
        atr_expanding: short.atr_expanding,
        correlation,
        proxy_symbol: inputs.proxy.symbol().map(str::to_string),
        composite_short: classification.composite_short,
        composite_long: classification.composite_long,
        is_golden: classification.status == SignalStatus::GoldenSign,
        is_death: classification.status == SignalStatus::DeathSign,
        vol_spike: short.vol_spike,
        buy_ratio,
        long_trend,
        resistance: short.resistance,
        support: short.support,
        cisd_resistance: cisd.resistance_price(),
        cisd_support: cisd.support_price(),
        vacuum_zones,
        is_synced: sync.synced,
        sync_direction: sync.direction,
        status: classification.status,
        reason: classification.reason,
        update_timestamp: meta.generated_at.with_timezone(&offset),
        dataset_hash: meta.dataset_hash,
        synthetic: meta.synthetic,
    })
}

/// Sequential end-to-end analysis: validate, run every stage, assemble.
pub fn analyze(
    inputs: &AnalysisInputs,
    config: &AnalysisConfig,
    meta: ReportMeta,
) -> Result<Report, AnalysisError> {
    config.validate()?;
    let outputs = run_stages(inputs, config)?;
    assemble(inputs, outputs, config, meta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Bar, Timeframe};
    use chrono::TimeZone;

    fn trending_series(tf: Timeframe, n: usize, step: f64) -> Series {
        let base = Utc.with_ymd_and_hms(2024, 6, 3, 0, 0, 0).unwrap();
        let bars = (0..n)
            .map(|i| {
                // small oscillation keeps RSI defined away from 0/100
                let wiggle = if i % 3 == 0 { -0.6 } else { 0.4 };
                let close = 2300.0 + step * i as f64 + wiggle;
                Bar {
                    timestamp: base + chrono::Duration::seconds(tf.seconds() * i as i64),
                    open: close - 0.2,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: 100.0 + (i % 7) as f64 * 10.0,
                }
            })
            .collect();
        Series::new("GC=F", tf, bars).unwrap()
    }

    fn inputs(step: f64) -> AnalysisInputs {
        AnalysisInputs::new("GC=F", ProxyResolution::NoneAvailable)
            .with_series(SeriesRole::VeryFast, trending_series(Timeframe::Min5, 200, step))
            .with_series(SeriesRole::Fast, trending_series(Timeframe::Min15, 200, step))
            .with_series(SeriesRole::Short, trending_series(Timeframe::Hour1, 120, step))
            .with_series(SeriesRole::Long, trending_series(Timeframe::Hour4, 120, step))
    }

    fn meta() -> ReportMeta {
        ReportMeta {
            dataset_hash: "test".into(),
            synthetic: false,
            generated_at: Utc.with_ymd_and_hms(2024, 6, 3, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn missing_role_is_data_unavailable() {
        let mut data = inputs(0.5);
        data.primary.remove(&SeriesRole::Long);
        let err = analyze(&data, &AnalysisConfig::default(), meta()).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::DataUnavailable {
                role: SeriesRole::Long,
                ..
            }
        ));
    }

    #[test]
    fn empty_short_series_aborts() {
        let data = inputs(0.5).with_series(SeriesRole::Short, Series::empty("GC=F", Timeframe::Hour1));
        let err = analyze(&data, &AnalysisConfig::default(), meta()).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::DataUnavailable {
                role: SeriesRole::Short,
                ..
            }
        ));
    }

    #[test]
    fn too_short_for_deviation_is_undefined() {
        let data = inputs(0.5).with_series(SeriesRole::Short, trending_series(Timeframe::Hour1, 20, 0.5));
        let err = analyze(&data, &AnalysisConfig::default(), meta()).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::UndefinedIndicator {
                indicator: "deviation",
                role: SeriesRole::Short,
                bars: 20,
                needed: 26,
            }
        ));
    }

    #[test]
    fn deviation_needs_one_bar_beyond_the_sma_window() {
        // SMA25 is finite at 25 bars, but the deviation window needs 26
        let data = inputs(0.5).with_series(SeriesRole::Short, trending_series(Timeframe::Hour1, 25, 0.5));
        let err = analyze(&data, &AnalysisConfig::default(), meta()).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::UndefinedIndicator {
                indicator: "deviation",
                role: SeriesRole::Short,
                bars: 25,
                needed: 26,
            }
        ));

        let data = inputs(0.5).with_series(SeriesRole::Short, trending_series(Timeframe::Hour1, 26, 0.5));
        assert!(analyze(&data, &AnalysisConfig::default(), meta()).is_ok());
    }

    #[test]
    fn long_rsi_needs_full_window() {
        let data = inputs(0.5).with_series(SeriesRole::Long, trending_series(Timeframe::Hour4, 14, 0.5));
        let err = analyze(&data, &AnalysisConfig::default(), meta()).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::UndefinedIndicator {
                indicator: "rsi",
                role: SeriesRole::Long,
                bars: 14,
                needed: 15,
            }
        ));
    }

    #[test]
    fn invalid_config_is_an_error_not_a_panic() {
        let mut config = AnalysisConfig::default();
        config.indicators.rsi_period = 0;
        let err = analyze(&inputs(0.5), &config, meta()).unwrap_err();
        assert!(matches!(err, AnalysisError::Config(_)));
    }

    #[test]
    fn report_fields_are_consistent() {
        let report = analyze(&inputs(0.5), &AnalysisConfig::default(), meta()).unwrap();

        assert_eq!(report.symbol, "GC=F");
        assert_eq!(report.correlation, Correlation::Unavailable);
        assert_eq!(report.proxy_symbol, None);
        assert_eq!(report.long_trend, Trend::Up);
        assert!(report.is_synced);
        assert_eq!(report.sync_direction, Trend::Up);
        assert!((-100..=100).contains(&report.composite_short));
        assert!((-100..=100).contains(&report.composite_long));
        assert_eq!(report.is_golden, report.status == SignalStatus::GoldenSign);
        assert_eq!(report.is_death, report.status == SignalStatus::DeathSign);
        assert!((10..=90).contains(&report.buy_ratio));
        assert!(report.vacuum_zones.len() <= 3);
        assert!(report.resistance >= report.price);
        assert!(report.support <= report.price);
        assert_eq!(report.update_timestamp.to_rfc3339(), "2024-06-03T18:30:00+09:00");
    }

    #[test]
    fn resolved_proxy_is_reported() {
        let mut data = inputs(0.5);
        let proxy = trending_series(Timeframe::Hour1, 120, -0.1);
        data.proxy = ProxyResolution::Resolved {
            symbol: "DX-Y.NYB".into(),
            series: proxy,
        };
        let report = analyze(&data, &AnalysisConfig::default(), meta()).unwrap();
        assert_eq!(report.proxy_symbol.as_deref(), Some("DX-Y.NYB"));
        let r = report.correlation.value().unwrap();
        assert!((-1.0..=1.0).contains(&r));
        assert!(r < 0.0);
    }
}
