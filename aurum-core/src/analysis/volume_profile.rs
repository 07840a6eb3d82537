//! Volume-weighted close-price histogram and vacuum-zone detection.
//!
//! Bin edges are evenly spaced across the observed close range of the window.
//! Each bin's weight is the summed volume of bars closing inside it. A bin
//! whose weight is below `vacuum_ratio` times the mean bin weight is a vacuum
//! zone: price tends to travel quickly through thinly traded bands.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::VolumeProfileConfig;
use crate::domain::{Bar, Series};

/// Half-open price interval `[from, to)` (the top bin also includes `to`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VacuumZone {
    pub from: f64,
    pub to: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VolumeProfile {
    /// `bins + 1` monotonically increasing edges.
    pub edges: Vec<f64>,
    /// Summed volume per bin, indexed from lowest to highest price.
    pub weights: Vec<f64>,
}

impl VolumeProfile {
    /// Build the histogram over the trailing `window` bars (0 = all bars).
    ///
    /// A window whose closes are all equal gets the range `[c - 0.5, c + 0.5]`
    /// so the edges stay strictly increasing. Bars with a non-finite close are
    /// left out. `None` when no bar has a finite close or `bins` is zero.
    pub fn build(series: &Series, bins: usize, window: usize) -> Option<Self> {
        let bars = if window == 0 {
            series.bars()
        } else {
            series.tail(window)
        };
        if bins == 0 {
            return None;
        }
        let priced: Vec<&Bar> = bars.iter().filter(|b| b.close.is_finite()).collect();
        if priced.is_empty() {
            return None;
        }

        let (mut lo, mut hi) = priced
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), b| {
                (lo.min(b.close), hi.max(b.close))
            });
        if !lo.is_finite() || !hi.is_finite() {
            return None;
        }
        if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }

        let width = (hi - lo) / bins as f64;
        let mut edges: Vec<f64> = (0..bins).map(|i| lo + i as f64 * width).collect();
        edges.push(hi);

        let mut weights = vec![0.0; bins];
        for bar in &priced {
            let idx = (((bar.close - lo) / width).floor() as usize).min(bins - 1);
            weights[idx] += bar.volume;
        }

        Some(Self { edges, weights })
    }

    pub fn average_weight(&self) -> f64 {
        if self.weights.is_empty() {
            return f64::NAN;
        }
        self.weights.iter().sum::<f64>() / self.weights.len() as f64
    }

    /// Every vacuum bin in index (ascending price) order.
    pub fn vacuum_zones(&self, ratio: f64) -> Vec<VacuumZone> {
        let threshold = ratio * self.average_weight();
        self.weights
            .iter()
            .enumerate()
            .filter(|(_, &w)| w < threshold)
            .map(|(i, _)| VacuumZone {
                from: self.edges[i],
                to: self.edges[i + 1],
            })
            .collect()
    }
}

/// The first `max_zones` vacuum zones of the series in ascending price order.
pub fn vacuum_zones(series: &Series, config: &VolumeProfileConfig) -> Vec<VacuumZone> {
    let Some(profile) = VolumeProfile::build(series, config.bins, config.window) else {
        return Vec::new();
    };
    let mut zones = profile.vacuum_zones(config.vacuum_ratio);
    debug!(
        symbol = series.symbol(),
        average_weight = profile.average_weight(),
        vacuum_bins = zones.len(),
        "volume profile"
    );
    zones.truncate(config.max_zones);
    zones
}
