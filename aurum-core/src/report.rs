//! The report record handed to persistence and alerting collaborators.
//!
//! Field names and types are the boundary other components depend on.
//! A `Report` is only ever built from a complete set of stage outputs.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::analysis::correlation::Correlation;
use crate::analysis::scoring::SignalStatus;
use crate::analysis::snapshot::Trend;
use crate::analysis::volume_profile::VacuumZone;

/// Current schema version for persisted reports.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub symbol: String,
    pub price: f64,
    pub rsi: f64,
    pub rsi_long: f64,
    pub deviation: f64,
    pub atr: f64,
    pub atr_expanding: bool,
    pub correlation: Correlation,
    /// Proxy the correlation was computed against.
    pub proxy_symbol: Option<String>,
    pub composite_short: i32,
    pub composite_long: i32,
    pub is_golden: bool,
    pub is_death: bool,
    pub vol_spike: bool,
    /// RSI truncated and clamped to the configured bounds.
    pub buy_ratio: u8,
    pub long_trend: Trend,
    /// Rolling high of the short series.
    pub resistance: f64,
    /// Rolling low of the short series.
    pub support: f64,
    #[serde(with = "none_sentinel")]
    pub cisd_resistance: Option<f64>,
    #[serde(with = "none_sentinel")]
    pub cisd_support: Option<f64>,
    pub vacuum_zones: Vec<VacuumZone>,
    pub is_synced: bool,
    pub sync_direction: Trend,
    pub status: SignalStatus,
    pub reason: String,
    pub update_timestamp: DateTime<FixedOffset>,
    pub dataset_hash: String,
    #[serde(default)]
    pub synthetic: bool,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// `Option<f64>` as a number or the string `"none"`.
mod none_sentinel {
    use serde::{Deserialize, Deserializer, Serializer};

    const NONE: &str = "none";

    pub fn serialize<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_f64(*v),
            None => serializer.serialize_str(NONE),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(f64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(v) => Ok(Some(v)),
            Repr::Text(s) if s == NONE => Ok(None),
            Repr::Text(s) => Err(serde::de::Error::custom(format!(
                "expected a number or \"{NONE}\", got \"{s}\""
            ))),
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_report() -> Report {
    use chrono::TimeZone;
    Report {
        schema_version: SCHEMA_VERSION,
        symbol: "GC=F".into(),
        price: 2331.4,
        rsi: 41.2,
        rsi_long: 55.0,
        deviation: -0.35,
        atr: 4.1,
        atr_expanding: true,
        correlation: Correlation::Unavailable,
        proxy_symbol: None,
        composite_short: 19,
        composite_long: -10,
        is_golden: false,
        is_death: false,
        vol_spike: false,
        buy_ratio: 41,
        long_trend: Trend::Up,
        resistance: 2350.0,
        support: 2301.5,
        cisd_resistance: Some(2340.25),
        cisd_support: None,
        vacuum_zones: vec![VacuumZone {
            from: 2310.0,
            to: 2312.5,
        }],
        is_synced: false,
        sync_direction: Trend::Down,
        status: SignalStatus::Neutral,
        reason: "Neutral".into(),
        update_timestamp: FixedOffset::east_opt(9 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 6, 3, 18, 30, 0)
            .unwrap(),
        dataset_hash: "abc".into(),
        synthetic: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_in_json() {
        let json = serde_json::to_value(sample_report()).unwrap();
        assert_eq!(json["correlation"], "unavailable");
        assert_eq!(json["cisd_support"], "none");
        assert_eq!(json["cisd_resistance"], 2340.25);
        assert_eq!(json["status"], "Neutral");
        assert_eq!(json["long_trend"], "up");
        assert_eq!(json["vacuum_zones"][0]["from"], 2310.0);
        assert_eq!(json["update_timestamp"], "2024-06-03T18:30:00+09:00");
    }

    #[test]
    fn report_round_trips() {
        let report = sample_report();
        let json = serde_json::to_string(&report).unwrap();
        let back: Report = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }

    #[test]
    fn missing_schema_version_defaults() {
        let mut json = serde_json::to_value(sample_report()).unwrap();
        json.as_object_mut().unwrap().remove("schema_version");
        let back: Report = serde_json::from_value(json).unwrap();
        assert_eq!(back.schema_version, SCHEMA_VERSION);
    }
}
