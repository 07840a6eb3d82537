//! Domain types: bars, series, timeframes.

pub mod bar;
pub mod timeframe;

pub use bar::{Bar, Series, SeriesError};
pub use timeframe::{resample, Timeframe};
