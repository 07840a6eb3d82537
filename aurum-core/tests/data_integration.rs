//! Integration tests for the CSV provider feeding the analysis stages.

use std::fmt::Write as _;
use std::path::Path;

use aurum_core::analysis::{analyze, resolve_proxy, AnalysisInputs, ProxyResolution, ReportMeta};
use aurum_core::config::{AnalysisConfig, SeriesRole};
use aurum_core::data::{CsvProvider, DataError, DataProvider};
use aurum_core::domain::Timeframe;
use aurum_core::AnalysisError;
use chrono::{TimeZone, Utc};

/// Write a wavy upward-drifting series as `{symbol}_{label}.csv`.
fn write_fixture(dir: &Path, symbol: &str, timeframe: Timeframe, bars: usize, drift: f64) {
    let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap().timestamp();
    let step = timeframe.seconds();
    let mut csv = String::from("timestamp,open,high,low,close,volume\n");
    for i in 0..bars {
        let close = 2300.0 + drift * i as f64 + (i as f64 * 0.7).sin() * 3.0;
        let open = close - 0.5;
        writeln!(
            csv,
            "{},{open:.4},{:.4},{:.4},{close:.4},{}",
            start + step * i as i64,
            close + 1.5,
            close - 1.5,
            500 + (i % 11) * 40
        )
        .unwrap();
    }
    std::fs::write(dir.join(format!("{symbol}_{}.csv", timeframe.label())), csv).unwrap();
}

fn fixture_dir(with_long: bool) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path(), "GC=F", Timeframe::Min5, 288, 0.05);
    write_fixture(dir.path(), "GC=F", Timeframe::Min15, 480, 0.05);
    write_fixture(dir.path(), "GC=F", Timeframe::Hour1, 720, 0.2);
    if with_long {
        write_fixture(dir.path(), "GC=F", Timeframe::Hour4, 180, 0.8);
    }
    write_fixture(dir.path(), "UUP", Timeframe::Hour1, 720, -0.01);
    dir
}

fn load_inputs(provider: &CsvProvider, config: &AnalysisConfig) -> Result<AnalysisInputs, DataError> {
    let mut inputs = AnalysisInputs::new(
        config.symbol.clone(),
        resolve_proxy(&config.proxies, |symbol| {
            provider.fetch(symbol, config.timeframes.short.timeframe, config.timeframes.short.lookback_days)
        }),
    );
    for role in SeriesRole::all() {
        let spec = config.timeframes.get(role);
        let series = provider.fetch(&config.symbol, spec.timeframe, spec.lookback_days)?;
        inputs = inputs.with_series(role, series);
    }
    Ok(inputs)
}

fn meta() -> ReportMeta {
    ReportMeta {
        dataset_hash: "fixture".into(),
        synthetic: false,
        generated_at: Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap(),
    }
}

#[test]
fn csv_directory_runs_end_to_end() {
    let dir = fixture_dir(true);
    let provider = CsvProvider::new(dir.path());
    let config = AnalysisConfig::default();

    let inputs = load_inputs(&provider, &config).unwrap();
    // first two candidates have no files; the third resolves
    assert_eq!(inputs.proxy.symbol(), Some("UUP"));

    let report = analyze(&inputs, &config, meta()).unwrap();
    assert_eq!(report.symbol, "GC=F");
    assert_eq!(report.proxy_symbol.as_deref(), Some("UUP"));
    assert!(report.correlation.is_available());
    assert!((0.0..=100.0).contains(&report.rsi));
    assert!(report.vacuum_zones.len() <= 3);
    assert_eq!(report.is_golden, report.status.to_string() == "Golden sign");
}

#[test]
fn lookback_window_limits_bars() {
    let dir = fixture_dir(true);
    let provider = CsvProvider::new(dir.path());
    // 720 hourly bars span 30 days; a 7-day lookback keeps the last 168
    let series = provider.fetch("GC=F", Timeframe::Hour1, 7).unwrap();
    assert_eq!(series.len(), 168);
    assert_eq!(provider.fetch("GC=F", Timeframe::Min5, 1).unwrap().len(), 288);
}

#[test]
fn long_series_is_resampled_when_missing() {
    let dir = fixture_dir(false);
    let provider = CsvProvider::new(dir.path());
    let series = provider.fetch("GC=F", Timeframe::Hour4, 30).unwrap();
    assert_eq!(series.timeframe(), Timeframe::Hour4);
    // 720 hourly bars from midnight fold into 180 four-hour buckets
    assert_eq!(series.len(), 180);
}

#[test]
fn missing_proxies_degrade_to_unavailable() {
    let dir = fixture_dir(true);
    std::fs::remove_file(dir.path().join("UUP_1h.csv")).unwrap();
    let provider = CsvProvider::new(dir.path());
    let config = AnalysisConfig::default();

    let inputs = load_inputs(&provider, &config).unwrap();
    assert!(matches!(inputs.proxy, ProxyResolution::NoneAvailable));

    let report = analyze(&inputs, &config, meta()).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["correlation"], "unavailable");
    assert!(json["proxy_symbol"].is_null());
}

#[test]
fn empty_short_file_aborts_the_run() {
    let dir = fixture_dir(true);
    std::fs::write(
        dir.path().join("GC=F_1h.csv"),
        "timestamp,open,high,low,close,volume\n",
    )
    .unwrap();
    let provider = CsvProvider::new(dir.path());
    let config = AnalysisConfig::default();

    // the provider refuses an empty file outright
    assert!(matches!(
        load_inputs(&provider, &config),
        Err(DataError::Empty { .. })
    ));

    // and the core refuses an empty series if one reaches it anyway
    let inputs = AnalysisInputs::new("GC=F", ProxyResolution::NoneAvailable)
        .with_series(SeriesRole::VeryFast, provider.fetch("GC=F", Timeframe::Min5, 1).unwrap())
        .with_series(SeriesRole::Fast, provider.fetch("GC=F", Timeframe::Min15, 5).unwrap())
        .with_series(SeriesRole::Short, aurum_core::domain::Series::empty("GC=F", Timeframe::Hour1))
        .with_series(SeriesRole::Long, provider.fetch("GC=F", Timeframe::Hour4, 30).unwrap());
    let err = analyze(&inputs, &config, meta()).unwrap_err();
    assert!(matches!(
        err,
        AnalysisError::DataUnavailable {
            role: SeriesRole::Short,
            ..
        }
    ));
}
