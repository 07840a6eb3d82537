//! Series loading and data resolution for the runner.
//!
//! Loads the four required primary series plus the first available proxy.
//! Implements the fallback policy:
//! 1. If a provider is configured → fetch through it
//! 2. If the fetch fails and `synthetic` is set → generate synthetic bars (tagged)
//! 3. Otherwise → fail with a clear error; nothing downstream runs
//!
//! Synthetic data is a developer-only demo mode. Reports built on synthetic
//! data carry `synthetic = true`. Proxies are never synthesized: a correlation
//! against invented data would look real.

use std::collections::BTreeMap;

use aurum_core::analysis::{resolve_proxy, AnalysisInputs, ProxyResolution};
use aurum_core::config::{AnalysisConfig, SeriesRole};
use aurum_core::data::{DataError, DataProvider};
use aurum_core::domain::{Bar, Series, SeriesError, Timeframe};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, warn};

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to load {role} series {symbol} {timeframe}: {source}")]
    Fetch {
        role: SeriesRole,
        symbol: String,
        timeframe: Timeframe,
        #[source]
        source: DataError,
    },

    #[error(
        "no data source for '{symbol}' {timeframe} (configure data_dir, go online, or use --synthetic)"
    )]
    NoSource { symbol: String, timeframe: Timeframe },

    #[error(transparent)]
    Series(#[from] SeriesError),
}

/// Options controlling how series are loaded.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Generate synthetic bars when real data is unavailable.
    pub synthetic: bool,
    /// End of the synthetic window; real providers ignore it.
    pub now: DateTime<Utc>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            synthetic: false,
            now: Utc::now(),
        }
    }
}

/// Where a series came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Provider,
    Synthetic,
}

/// Result of loading, including provenance.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub inputs: AnalysisInputs,
    /// Data source per primary role.
    pub sources: BTreeMap<SeriesRole, DataSource>,
    /// Dataset hash for fingerprinting (BLAKE3 over all bar data).
    pub dataset_hash: String,
    /// Whether any primary series is synthetic.
    pub has_synthetic: bool,
}

/// Load every series one analysis run needs.
///
/// `provider` is `None` for runs without a data source (offline without a
/// CSV directory); only synthetic generation can succeed then.
pub fn load_inputs(
    provider: Option<&dyn DataProvider>,
    config: &AnalysisConfig,
    opts: &LoadOptions,
) -> Result<LoadedData, LoadError> {
    let symbol = config.symbol.as_str();
    let mut primary = BTreeMap::new();
    let mut sources = BTreeMap::new();

    for role in SeriesRole::all() {
        let spec = config.timeframes.get(role);
        let fetched = provider.map(|p| p.fetch(symbol, spec.timeframe, spec.lookback_days));

        let (series, source) = match fetched {
            Some(Ok(series)) => (series, DataSource::Provider),
            Some(Err(e)) if opts.synthetic => {
                warn!(
                    %role,
                    symbol,
                    error = %e,
                    transient = e.is_transient(),
                    "fetch failed, generating synthetic bars"
                );
                let series =
                    generate_synthetic_series(symbol, spec.timeframe, spec.lookback_days, opts.now)?;
                (series, DataSource::Synthetic)
            }
            Some(Err(source)) => {
                return Err(LoadError::Fetch {
                    role,
                    symbol: symbol.to_string(),
                    timeframe: spec.timeframe,
                    source,
                })
            }
            None if opts.synthetic => {
                warn!(%role, symbol, "no data source, generating synthetic bars");
                let series =
                    generate_synthetic_series(symbol, spec.timeframe, spec.lookback_days, opts.now)?;
                (series, DataSource::Synthetic)
            }
            None => {
                return Err(LoadError::NoSource {
                    symbol: symbol.to_string(),
                    timeframe: spec.timeframe,
                })
            }
        };

        info!(%role, symbol, timeframe = %spec.timeframe, bars = series.len(), "loaded series");
        primary.insert(role, series);
        sources.insert(role, source);
    }

    let proxy = match provider {
        Some(p) => {
            let short = config.timeframes.short;
            resolve_proxy(&config.proxies, |candidate| {
                p.fetch(candidate, short.timeframe, short.lookback_days)
            })
        }
        None => ProxyResolution::NoneAvailable,
    };

    let has_synthetic = sources.values().any(|s| *s == DataSource::Synthetic);
    let inputs = AnalysisInputs {
        symbol: symbol.to_string(),
        primary,
        proxy,
    };
    let dataset_hash = compute_dataset_hash(&inputs);

    Ok(LoadedData {
        inputs,
        sources,
        dataset_hash,
        has_synthetic,
    })
}

fn hash_series(hasher: &mut blake3::Hasher, series: &Series) {
    hasher.update(series.symbol().as_bytes());
    hasher.update(series.timeframe().label().as_bytes());
    for bar in series.bars() {
        hasher.update(&bar.timestamp.timestamp().to_le_bytes());
        hasher.update(&bar.open.to_le_bytes());
        hasher.update(&bar.high.to_le_bytes());
        hasher.update(&bar.low.to_le_bytes());
        hasher.update(&bar.close.to_le_bytes());
        hasher.update(&bar.volume.to_le_bytes());
    }
}

/// Compute a deterministic BLAKE3 hash over all input bars.
///
/// Primary series are hashed in role order, then the resolved proxy.
pub fn compute_dataset_hash(inputs: &AnalysisInputs) -> String {
    let mut hasher = blake3::Hasher::new();

    for (role, series) in &inputs.primary {
        hasher.update(role.label().as_bytes());
        hash_series(&mut hasher, series);
    }
    if let ProxyResolution::Resolved { symbol, series } = &inputs.proxy {
        hasher.update(b"proxy");
        hasher.update(symbol.as_bytes());
        hash_series(&mut hasher, series);
    }

    hasher.finalize().to_hex().to_string()
}

/// Generate synthetic bars for demos and offline development.
///
/// A random walk around a gold-like price, seeded from `symbol/timeframe` so
/// every role gets its own deterministic path. Bars end at the last full
/// `timeframe` boundary before `end`.
pub fn generate_synthetic_series(
    symbol: &str,
    timeframe: Timeframe,
    lookback_days: u32,
    end: DateTime<Utc>,
) -> Result<Series, SeriesError> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let seed_bytes = blake3::hash(format!("{symbol}/{}", timeframe.label()).as_bytes());
    let seed: [u8; 32] = *seed_bytes.as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let step = timeframe.seconds();
    let count = (i64::from(lookback_days.max(1)) * 86_400 / step).max(1);
    let last_start = end.timestamp().div_euclid(step) * step - step;
    let first_start = last_start - (count - 1) * step;

    // per-bar volatility scales with the square root of the bar length
    let sigma = 0.0008 * (step as f64 / 300.0).sqrt();
    let mut price = 2300.0_f64;
    let mut bars = Vec::with_capacity(count as usize);

    for i in 0..count {
        let Some(timestamp) = DateTime::from_timestamp(first_start + i * step, 0) else {
            continue;
        };
        let ret: f64 = rng.gen_range(-sigma..sigma);
        let open = price;
        let close = price * (1.0 + ret);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..sigma / 2.0));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..sigma / 2.0));
        let volume = rng.gen_range(200.0..2_000.0) * (step as f64 / 300.0);

        bars.push(Bar {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        });
        price = close;
    }

    Series::new(symbol, timeframe, bars)
}
