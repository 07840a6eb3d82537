//! Composite scores and signal classification.
//!
//! ```text
//! composite_short = (50 - rsi_short) * 1.5 + deviation_short * (-15)
//! composite_short *= 1.2 when ATR is expanding
//! composite_short = clamp(trunc(composite_short), -100, 100)
//! composite_long  = clamp(trunc((50 - rsi_long) * 2), -100, 100)
//! ```
//!
//! Classification takes the first matching rule:
//! GoldenSign, DeathSign, SyncExpansion, PullbackBuy, BounceSell, Neutral.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::analysis::cisd::CisdLevels;
use crate::analysis::snapshot::{IndicatorSnapshot, Trend};
use crate::analysis::sync::SyncState;
use crate::config::ScoringConfig;

pub const SCORE_BOUND: i32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalStatus {
    GoldenSign,
    DeathSign,
    SyncExpansion,
    PullbackBuy,
    BounceSell,
    Neutral,
}

impl SignalStatus {
    pub fn label(&self) -> &'static str {
        match self {
            SignalStatus::GoldenSign => "Golden sign",
            SignalStatus::DeathSign => "Death sign",
            SignalStatus::SyncExpansion => "Sync expansion",
            SignalStatus::PullbackBuy => "Pullback buy",
            SignalStatus::BounceSell => "Bounce sell",
            SignalStatus::Neutral => "Neutral",
        }
    }
}

impl fmt::Display for SignalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Truncate toward zero, then clamp to [-100, 100]. Saturates on infinities.
pub fn truncate_clamp(value: f64) -> i32 {
    (value.trunc() as i64).clamp(-(SCORE_BOUND as i64), SCORE_BOUND as i64) as i32
}

pub fn composite_short(rsi: f64, deviation: f64, atr_expanding: bool, config: &ScoringConfig) -> i32 {
    let mut score = (50.0 - rsi) * config.rsi_weight_short + deviation * config.deviation_weight;
    if atr_expanding {
        score *= config.atr_boost;
    }
    truncate_clamp(score)
}

pub fn composite_long(rsi_long: f64, config: &ScoringConfig) -> i32 {
    truncate_clamp((50.0 - rsi_long) * config.rsi_weight_long)
}

/// Total over every input; exactly one status per tuple.
pub fn classify(composite_short: i32, long_trend: Trend, synced: bool, threshold: i32) -> SignalStatus {
    if composite_short > threshold && long_trend == Trend::Up {
        SignalStatus::GoldenSign
    } else if composite_short < -threshold && long_trend == Trend::Down {
        SignalStatus::DeathSign
    } else if synced {
        SignalStatus::SyncExpansion
    } else if composite_short > threshold {
        SignalStatus::PullbackBuy
    } else if composite_short < -threshold {
        SignalStatus::BounceSell
    } else {
        SignalStatus::Neutral
    }
}

/// Everything the scoring engine reads.
#[derive(Debug, Clone, Copy)]
pub struct ScoringInputs<'a> {
    pub short: &'a IndicatorSnapshot,
    pub rsi_long: f64,
    pub long_trend: Trend,
    pub sync: &'a SyncState,
    pub cisd: &'a CisdLevels,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub composite_short: i32,
    pub composite_long: i32,
    pub status: SignalStatus,
    pub reason: String,
}

/// Score and classify. RSI and deviation inputs must be finite; the
/// pipeline rejects undefined indicators before calling this.
pub fn score(inputs: &ScoringInputs<'_>, config: &ScoringConfig) -> Classification {
    let short = inputs.short;
    let cs = composite_short(short.rsi, short.deviation, short.atr_expanding, config);
    let cl = composite_long(inputs.rsi_long, config);
    let status = classify(cs, inputs.long_trend, inputs.sync.synced, config.signal_threshold);
    let reason = rationale(status, inputs, cs, config.signal_threshold);

    Classification {
        composite_short: cs,
        composite_long: cl,
        status,
        reason,
    }
}

fn level(price: Option<f64>) -> String {
    match price {
        Some(p) => format!("{p:.2}"),
        None => "none".to_string(),
    }
}

/// Human-readable explanation embedding the numbers that drove `status`.
pub fn rationale(
    status: SignalStatus,
    inputs: &ScoringInputs<'_>,
    composite_short: i32,
    threshold: i32,
) -> String {
    let rsi = inputs.short.rsi;
    let dev = inputs.short.deviation;
    let trend = inputs.long_trend;

    match status {
        SignalStatus::GoldenSign => format!(
            "{status}: short-term pressure {composite_short:+} with the long trend {trend}. \
             RSI {rsi:.1}, deviation {dev:+.2}% from SMA; CISD support {}.",
            level(inputs.cisd.support_price())
        ),
        SignalStatus::DeathSign => format!(
            "{status}: short-term pressure {composite_short:+} with the long trend {trend}. \
             RSI {rsi:.1}, deviation {dev:+.2}% from SMA; CISD resistance {}.",
            level(inputs.cisd.resistance_price())
        ),
        SignalStatus::SyncExpansion => format!(
            "{status}: fast timeframes aligned {}; short-term pressure {composite_short:+}.",
            inputs.sync.direction
        ),
        SignalStatus::PullbackBuy => format!(
            "{status}: RSI {rsi:.1} and deviation {dev:+.2}% show an oversold dip \
             while the long trend is {trend}."
        ),
        SignalStatus::BounceSell => format!(
            "{status}: RSI {rsi:.1} and deviation {dev:+.2}% show an overbought bounce \
             while the long trend is {trend}."
        ),
        SignalStatus::Neutral => format!(
            "{status}: short-term pressure {composite_short:+} within ±{threshold}; RSI {rsi:.1}."
        ),
    }
}
