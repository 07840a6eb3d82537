//! CSV directory provider.
//!
//! Reads `{dir}/{symbol}_{timeframe}.csv` with the header
//! `timestamp,open,high,low,close,volume`. Timestamps are RFC 3339 strings or
//! unix seconds. Rows must already be in ascending time order.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tracing::debug;

use super::provider::{DataError, DataProvider};
use crate::domain::{resample, Bar, Series, Timeframe};

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: f64,
}

/// Serves bars from a directory of per-symbol, per-timeframe CSV files.
#[derive(Debug, Clone)]
pub struct CsvProvider {
    dir: PathBuf,
}

impl CsvProvider {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, symbol: &str, timeframe: Timeframe) -> PathBuf {
        self.dir.join(format!("{symbol}_{}.csv", timeframe.label()))
    }

    fn read(&self, symbol: &str, timeframe: Timeframe) -> Result<Series, DataError> {
        let path = self.path_for(symbol, timeframe);
        let mut reader = ::csv::ReaderBuilder::new()
            .trim(::csv::Trim::All)
            .from_path(&path)
            .map_err(|source| {
                let missing = matches!(
                    source.kind(),
                    ::csv::ErrorKind::Io(e) if e.kind() == std::io::ErrorKind::NotFound
                );
                if missing {
                    DataError::Empty {
                        symbol: symbol.to_string(),
                        timeframe,
                    }
                } else {
                    DataError::Csv {
                        path: path.clone(),
                        source,
                    }
                }
            })?;

        let mut bars = Vec::new();
        for (i, record) in reader.deserialize::<CsvRow>().enumerate() {
            let row = record.map_err(|source| DataError::Csv {
                path: path.clone(),
                source,
            })?;
            let timestamp = parse_timestamp(&row.timestamp).ok_or_else(|| DataError::InvalidRow {
                path: path.clone(),
                row: i + 1,
                reason: format!("unrecognized timestamp '{}'", row.timestamp),
            })?;
            let bar = Bar {
                timestamp,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume,
            };
            if !bar.is_sane() {
                return Err(DataError::InvalidRow {
                    path: path.clone(),
                    row: i + 1,
                    reason: format!(
                        "inconsistent OHLCV ({}, {}, {}, {}, {})",
                        row.open, row.high, row.low, row.close, row.volume
                    ),
                });
            }
            bars.push(bar);
        }

        debug!(path = %path.display(), rows = bars.len(), "read csv");
        Ok(Series::new(symbol, timeframe, bars)?)
    }
}

/// RFC 3339 or integer/fractional unix seconds.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    let secs: f64 = s.parse().ok()?;
    if !secs.is_finite() {
        return None;
    }
    DateTime::from_timestamp(secs.trunc() as i64, 0)
}

/// Keep the bars within `lookback_days` of the newest bar.
fn trailing_days(series: Series, lookback_days: u32) -> Result<Series, DataError> {
    let Some(last) = series.last() else {
        return Ok(series);
    };
    let cutoff = last.timestamp - Duration::days(i64::from(lookback_days.max(1)));
    let bars: Vec<Bar> = series
        .bars()
        .iter()
        .filter(|b| b.timestamp > cutoff)
        .copied()
        .collect();
    Ok(Series::new(series.symbol(), series.timeframe(), bars)?)
}

impl DataProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv"
    }

    /// Prefers a file at the exact timeframe and falls back to resampling
    /// the source timeframe's file (4h from 1h).
    fn fetch(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        lookback_days: u32,
    ) -> Result<Series, DataError> {
        let series = match self.read(symbol, timeframe) {
            Ok(series) => series,
            Err(DataError::Empty { .. }) if timeframe.source() != timeframe => {
                let source = self.read(symbol, timeframe.source())?;
                resample(&source, timeframe)?
            }
            Err(e) => return Err(e),
        };

        let series = trailing_days(series, lookback_days)?;
        if series.is_empty() {
            return Err(DataError::Empty {
                symbol: symbol.to_string(),
                timeframe,
            });
        }
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs;

    const HOURLY: &str = "\
timestamp,open,high,low,close,volume
2024-06-03T00:00:00Z,2330,2335,2328,2333,1200
2024-06-03T01:00:00Z,2333,2338,2331,2336.5,900
2024-06-03T02:00:00Z,2336.5,2340,2334,2339,800
1717383600,2339,2341,2332,2334,1000
";

    #[test]
    fn parses_both_timestamp_forms() {
        let a = parse_timestamp("2024-06-03T04:00:00+00:00").unwrap();
        let b = parse_timestamp("1717383600").unwrap();
        assert_eq!(a, Utc.with_ymd_and_hms(2024, 6, 3, 4, 0, 0).unwrap());
        assert_eq!(b, Utc.with_ymd_and_hms(2024, 6, 3, 3, 0, 0).unwrap());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn reads_exact_timeframe() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("GC=F_1h.csv"), HOURLY).unwrap();

        let provider = CsvProvider::new(dir.path());
        let series = provider.fetch("GC=F", Timeframe::Hour1, 7).unwrap();
        assert_eq!(series.len(), 4);
        assert_eq!(series.closes(), vec![2333.0, 2336.5, 2339.0, 2334.0]);
    }

    #[test]
    fn four_hour_falls_back_to_resampled_hourly() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("GC=F_1h.csv"), HOURLY).unwrap();

        let provider = CsvProvider::new(dir.path());
        let series = provider.fetch("GC=F", Timeframe::Hour4, 30).unwrap();
        assert_eq!(series.timeframe(), Timeframe::Hour4);
        assert_eq!(series.len(), 1);
        let bar = series.bars()[0];
        assert_eq!(bar.open, 2330.0);
        assert_eq!(bar.high, 2341.0);
        assert_eq!(bar.low, 2328.0);
        assert_eq!(bar.close, 2334.0);
        assert_eq!(bar.volume, 3900.0);
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let provider = CsvProvider::new(dir.path());
        let err = provider.fetch("UUP", Timeframe::Hour1, 7).unwrap_err();
        assert!(matches!(err, DataError::Empty { .. }));
    }

    #[test]
    fn bad_timestamp_names_the_row() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("GC=F_5m.csv"),
            "timestamp,open,high,low,close,volume\nnot-a-time,1,1,1,1,1\n",
        )
        .unwrap();
        let provider = CsvProvider::new(dir.path());
        let err = provider.fetch("GC=F", Timeframe::Min5, 1).unwrap_err();
        assert!(matches!(err, DataError::InvalidRow { row: 1, .. }));
    }

    #[test]
    fn nan_and_inverted_rows_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let provider = CsvProvider::new(dir.path());
        let header = "timestamp,open,high,low,close,volume\n";

        let nan = format!("{header}2024-06-03T00:00:00Z,1,2,0.5,1,1\n2024-06-03T01:00:00Z,1,2,0.5,NaN,1\n");
        fs::write(dir.path().join("GC=F_1h.csv"), nan).unwrap();
        let err = provider.fetch("GC=F", Timeframe::Hour1, 7).unwrap_err();
        assert!(matches!(err, DataError::InvalidRow { row: 2, .. }), "{err}");

        let inverted = format!("{header}2024-06-03T00:00:00Z,10,9,11,10,1\n");
        fs::write(dir.path().join("GC=F_1h.csv"), inverted).unwrap();
        let err = provider.fetch("GC=F", Timeframe::Hour1, 7).unwrap_err();
        assert!(matches!(err, DataError::InvalidRow { row: 1, .. }), "{err}");
    }

    #[test]
    fn lookback_trims_old_bars() {
        let dir = tempfile::tempdir().unwrap();
        let csv = "\
timestamp,open,high,low,close,volume
2024-05-01T00:00:00Z,1,1,1,1,1
2024-06-02T00:00:00Z,2,2,2,2,1
2024-06-03T00:00:00Z,3,3,3,3,1
";
        fs::write(dir.path().join("GC=F_1d.csv"), csv).unwrap();
        let provider = CsvProvider::new(dir.path());
        let series = provider.fetch("GC=F", Timeframe::Day1, 5).unwrap();
        assert_eq!(series.closes(), vec![2.0, 3.0]);
    }

    #[test]
    fn out_of_order_rows_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let csv = "\
timestamp,open,high,low,close,volume
2024-06-03T01:00:00Z,1,1,1,1,1
2024-06-03T00:00:00Z,2,2,2,2,1
";
        fs::write(dir.path().join("GC=F_1h.csv"), csv).unwrap();
        let provider = CsvProvider::new(dir.path());
        let err = provider.fetch("GC=F", Timeframe::Hour1, 7).unwrap_err();
        assert!(matches!(err, DataError::Series(_)));
    }
}
