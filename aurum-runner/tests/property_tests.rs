//! Property tests for pipeline scheduling.
//!
//! The first-stage analyzers share no state, so evaluating them on the rayon
//! pool must give exactly the report the sequential path gives, whatever the
//! input bars are.

use aurum_core::config::AnalysisConfig;
use aurum_runner::{load_inputs, run_pipeline, LoadOptions, PipelineOptions};
use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn parallel_and_sequential_agree(
        symbol in "[A-Z]{2,4}",
        minutes in 0i64..(60 * 24 * 30),
        threshold in 0i32..60,
    ) {
        let now = Utc.with_ymd_and_hms(2024, 6, 3, 0, 0, 0).unwrap() + Duration::minutes(minutes);
        let mut config = AnalysisConfig {
            symbol,
            ..AnalysisConfig::default()
        };
        config.scoring.signal_threshold = threshold;

        let data = load_inputs(None, &config, &LoadOptions { synthetic: true, now }).unwrap();

        let sequential = run_pipeline(&data, &config, &PipelineOptions { parallel: false, now });
        let parallel = run_pipeline(&data, &config, &PipelineOptions { parallel: true, now });

        match (sequential, parallel) {
            (Ok(a), Ok(b)) => prop_assert_eq!(a, b),
            (Err(a), Err(b)) => prop_assert_eq!(a.to_string(), b.to_string()),
            (a, b) => prop_assert!(false, "paths disagree: {:?} vs {:?}", a.is_ok(), b.is_ok()),
        }
    }
}
