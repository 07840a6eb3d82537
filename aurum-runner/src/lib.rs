//! Aurum Runner: data loading, stage scheduling and report export.
//!
//! This crate builds on `aurum-core` to provide:
//! - Series loading through a provider with synthetic fallback
//! - Ordered proxy resolution and dataset fingerprinting
//! - The all-or-nothing pipeline entry point with rayon fan-out
//! - Atomic JSON report export and a Markdown summary

pub mod config;
pub mod data_loader;
pub mod export;
pub mod pipeline;

pub use config::{ConfigId, RunConfig};
pub use data_loader::{
    compute_dataset_hash, generate_synthetic_series, load_inputs, DataSource, LoadError,
    LoadOptions, LoadedData,
};
pub use export::{export_json, import_json, read_report, render_markdown, write_report};
pub use pipeline::{run, run_pipeline, run_stages_parallel, PipelineOptions, RunError};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<RunConfig>();
        assert_sync::<RunConfig>();
        assert_send::<LoadOptions>();
        assert_sync::<LoadOptions>();
        assert_send::<PipelineOptions>();
        assert_sync::<PipelineOptions>();
    }

    #[test]
    fn loaded_data_is_send_sync() {
        assert_send::<LoadedData>();
        assert_sync::<LoadedData>();
    }

    #[test]
    fn errors_are_send_sync() {
        assert_send::<LoadError>();
        assert_sync::<LoadError>();
        assert_send::<RunError>();
        assert_sync::<RunError>();
    }
}
