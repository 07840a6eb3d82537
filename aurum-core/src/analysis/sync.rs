//! Trend alignment between the two fast timeframes.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::snapshot::Trend;
use crate::domain::Series;
use crate::indicators::Ewma;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    /// Both fast timeframes trend the same way.
    pub synced: bool,
    /// The common trend when synced, otherwise the very-fast trend.
    pub direction: Trend,
    pub very_fast: Trend,
    pub fast: Trend,
}

/// Compare the EWMA trend flag of the very-fast and fast series.
pub fn synchronize(very_fast: &Series, fast: &Series, trend_span: usize) -> SyncState {
    let ewma = Ewma::new(trend_span);
    let vf = Trend::from_flag(ewma.trend_flag(very_fast.bars()));
    let f = Trend::from_flag(ewma.trend_flag(fast.bars()));

    let state = SyncState {
        synced: vf == f,
        direction: vf,
        very_fast: vf,
        fast: f,
    };
    debug!(
        very_fast = %state.very_fast,
        fast = %state.fast,
        synced = state.synced,
        "timeframe sync"
    );
    state
}
