//! Correlation between the primary series and the first proxy that resolves.

use std::fmt::Display;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, warn};

use crate::domain::Series;
use crate::indicators::stats::pearson;

const UNAVAILABLE: &str = "unavailable";

/// Correlation coefficient, or an explicit marker that none could be computed.
///
/// Serializes as a bare number or the string `"unavailable"`; never as 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Correlation {
    Value(f64),
    Unavailable,
}

impl Correlation {
    pub fn value(&self) -> Option<f64> {
        match self {
            Correlation::Value(v) => Some(*v),
            Correlation::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Correlation::Value(_))
    }
}

impl Serialize for Correlation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Correlation::Value(v) => serializer.serialize_f64(*v),
            Correlation::Unavailable => serializer.serialize_str(UNAVAILABLE),
        }
    }
}

impl<'de> Deserialize<'de> for Correlation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(f64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(v) => Ok(Correlation::Value(v)),
            Repr::Text(s) if s == UNAVAILABLE => Ok(Correlation::Unavailable),
            Repr::Text(s) => Err(serde::de::Error::custom(format!(
                "expected a number or \"{UNAVAILABLE}\", got \"{s}\""
            ))),
        }
    }
}

/// Outcome of the ordered proxy lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum ProxyResolution {
    Resolved { symbol: String, series: Series },
    NoneAvailable,
}

impl ProxyResolution {
    pub fn symbol(&self) -> Option<&str> {
        match self {
            ProxyResolution::Resolved { symbol, .. } => Some(symbol),
            ProxyResolution::NoneAvailable => None,
        }
    }
}

/// Try each candidate in order; the first one whose lookup succeeds with a
/// non-empty series wins. Lookup failures are logged and skipped.
pub fn resolve_proxy<F, E>(candidates: &[String], mut lookup: F) -> ProxyResolution
where
    F: FnMut(&str) -> Result<Series, E>,
    E: Display,
{
    for symbol in candidates {
        match lookup(symbol) {
            Ok(series) if !series.is_empty() => {
                debug!(proxy = %symbol, bars = series.len(), "proxy resolved");
                return ProxyResolution::Resolved {
                    symbol: symbol.clone(),
                    series,
                };
            }
            Ok(_) => debug!(proxy = %symbol, "proxy returned no bars"),
            Err(e) => debug!(proxy = %symbol, error = %e, "proxy lookup failed"),
        }
    }
    warn!(candidates = ?candidates, "no proxy symbol returned data");
    ProxyResolution::NoneAvailable
}

/// Close prices of the two series at timestamps present in both, in time order.
pub fn align_closes(primary: &Series, proxy: &Series) -> (Vec<f64>, Vec<f64>) {
    let a = primary.bars();
    let b = proxy.bars();
    let mut left = Vec::new();
    let mut right = Vec::new();
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        match a[i].timestamp.cmp(&b[j].timestamp) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                left.push(a[i].close);
                right.push(b[j].close);
                i += 1;
                j += 1;
            }
        }
    }

    (left, right)
}

/// Pearson correlation of aligned closes. Unavailable with no resolved proxy,
/// fewer than two aligned points, or a zero-variance side.
pub fn correlate(primary: &Series, proxy: &ProxyResolution) -> Correlation {
    let ProxyResolution::Resolved { symbol, series } = proxy else {
        return Correlation::Unavailable;
    };

    let (x, y) = align_closes(primary, series);
    match pearson(&x, &y) {
        Some(r) => {
            debug!(proxy = %symbol, aligned = x.len(), correlation = r, "correlation");
            Correlation::Value(r)
        }
        None => {
            warn!(proxy = %symbol, aligned = x.len(), "correlation undefined on aligned closes");
            Correlation::Unavailable
        }
    }
}
