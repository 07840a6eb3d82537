//! Timeframe labels and bar aggregation.

use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use serde::{Deserialize, Serialize};

use super::bar::{Bar, Series, SeriesError};

/// Bar granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    Min1,
    #[serde(rename = "5m")]
    Min5,
    #[serde(rename = "15m")]
    Min15,
    #[serde(rename = "30m")]
    Min30,
    #[serde(rename = "1h")]
    Hour1,
    #[serde(rename = "4h")]
    Hour4,
    #[serde(rename = "1d")]
    Day1,
}

impl Timeframe {
    /// Duration of one bar in seconds.
    pub fn seconds(&self) -> i64 {
        match self {
            Timeframe::Min1 => 60,
            Timeframe::Min5 => 5 * 60,
            Timeframe::Min15 => 15 * 60,
            Timeframe::Min30 => 30 * 60,
            Timeframe::Hour1 => 60 * 60,
            Timeframe::Hour4 => 4 * 60 * 60,
            Timeframe::Day1 => 24 * 60 * 60,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Timeframe::Min1 => "1m",
            Timeframe::Min5 => "5m",
            Timeframe::Min15 => "15m",
            Timeframe::Min30 => "30m",
            Timeframe::Hour1 => "1h",
            Timeframe::Hour4 => "4h",
            Timeframe::Day1 => "1d",
        }
    }

    /// The timeframe a provider must be asked for. Providers have no 4h
    /// interval, so 4h bars are built from 1h bars.
    pub fn source(&self) -> Timeframe {
        match self {
            Timeframe::Hour4 => Timeframe::Hour1,
            other => *other,
        }
    }

    pub fn all() -> &'static [Timeframe] {
        &[
            Timeframe::Min1,
            Timeframe::Min5,
            Timeframe::Min15,
            Timeframe::Min30,
            Timeframe::Hour1,
            Timeframe::Hour4,
            Timeframe::Day1,
        ]
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Timeframe::all()
            .iter()
            .find(|tf| tf.label() == s)
            .copied()
            .ok_or_else(|| format!("unknown timeframe '{s}'"))
    }
}

/// Aggregate a series into a coarser timeframe.
///
/// Buckets are aligned to multiples of the target duration since the unix
/// epoch. open = first, high = max, low = min, close = last, volume = sum.
pub fn resample(series: &Series, target: Timeframe) -> Result<Series, SeriesError> {
    let interval = target.seconds();
    let mut aggregated: Vec<Bar> = Vec::new();
    let mut current: Option<(i64, Bar)> = None;

    for bar in series.bars() {
        let bucket_start = bar.timestamp.timestamp().div_euclid(interval) * interval;

        match current.as_mut() {
            Some((start, agg)) if *start == bucket_start => {
                agg.high = agg.high.max(bar.high);
                agg.low = agg.low.min(bar.low);
                agg.close = bar.close;
                agg.volume += bar.volume;
            }
            _ => {
                if let Some((_, done)) = current.take() {
                    aggregated.push(done);
                }
                let timestamp = DateTime::from_timestamp(bucket_start, 0).unwrap_or(bar.timestamp);
                current = Some((bucket_start, Bar { timestamp, ..*bar }));
            }
        }
    }

    if let Some((_, done)) = current {
        aggregated.push(done);
    }

    Series::new(series.symbol(), target, aggregated)
}
