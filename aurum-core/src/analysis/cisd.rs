//! Supply/demand shock detection (CISD).
//!
//! A bar whose close-to-close change exceeds `sigma` standard deviations of
//! the recent changes marks aggressive selling (down-shock) or buying
//! (up-shock). The high of the latest down-shock is resistance; the low of
//! the latest up-shock is support.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::CisdConfig;
use crate::domain::Series;
use crate::indicators::stats::sample_std;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelKind {
    Resistance,
    Support,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SupplyDemandLevel {
    pub price: f64,
    pub kind: LevelKind,
    /// Timestamp of the shock bar that produced the level.
    pub timestamp: DateTime<Utc>,
}

/// Latest resistance and support levels; `None` when no shock of that
/// polarity occurred in the window.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CisdLevels {
    pub resistance: Option<SupplyDemandLevel>,
    pub support: Option<SupplyDemandLevel>,
}

impl CisdLevels {
    pub fn resistance_price(&self) -> Option<f64> {
        self.resistance.map(|l| l.price)
    }

    pub fn support_price(&self) -> Option<f64> {
        self.support.map(|l| l.price)
    }
}

/// Scan the trailing `lookback` close-to-close changes of `series`.
///
/// The threshold is `sigma` times the sample standard deviation of those
/// changes. A window with fewer than two changes, or with zero variance, has
/// no shocks.
pub fn detect(series: &Series, config: &CisdConfig) -> CisdLevels {
    let bars = series.tail(config.lookback + 1);
    if bars.len() < 3 {
        return CisdLevels::default();
    }

    let changes: Vec<f64> = bars.windows(2).map(|w| w[1].close - w[0].close).collect();
    let std = sample_std(&changes);
    if !std.is_finite() || std == 0.0 {
        return CisdLevels::default();
    }
    let threshold = config.sigma * std;

    let mut levels = CisdLevels::default();
    // changes[k] belongs to bars[k + 1]; walk newest to oldest.
    for (k, &change) in changes.iter().enumerate().rev() {
        let bar = &bars[k + 1];
        if levels.resistance.is_none() && change < -threshold {
            levels.resistance = Some(SupplyDemandLevel {
                price: bar.high,
                kind: LevelKind::Resistance,
                timestamp: bar.timestamp,
            });
        }
        if levels.support.is_none() && change > threshold {
            levels.support = Some(SupplyDemandLevel {
                price: bar.low,
                kind: LevelKind::Support,
                timestamp: bar.timestamp,
            });
        }
        if levels.resistance.is_some() && levels.support.is_some() {
            break;
        }
    }

    debug!(
        symbol = series.symbol(),
        threshold,
        resistance = ?levels.resistance_price(),
        support = ?levels.support_price(),
        "cisd levels"
    );
    levels
}
