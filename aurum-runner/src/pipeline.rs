//! Pipeline entry point: load, fan out the analysis stages, fan in, report.
//!
//! A run is all-or-nothing. Every required series is checked before any
//! stage starts, and a stage failure discards the other stages' results.

use aurum_core::analysis::{self, AnalysisInputs, ReportMeta, StageOutputs};
use aurum_core::config::{AnalysisConfig, ConfigError, SeriesRole};
use aurum_core::data::DataProvider;
use aurum_core::{AnalysisError, Report};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::RunConfig;
use crate::data_loader::{load_inputs, LoadError, LoadOptions, LoadedData};

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

/// How the stages are scheduled and when the run is stamped.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Evaluate the first-stage analyzers on the rayon pool.
    pub parallel: bool,
    /// Report timestamp and end of any synthetic window.
    pub now: DateTime<Utc>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            now: Utc::now(),
        }
    }
}

/// Evaluate the five first-stage analyzers concurrently.
///
/// Required series are validated first, so a missing series aborts before
/// any work is scheduled.
pub fn run_stages_parallel(
    inputs: &AnalysisInputs,
    config: &AnalysisConfig,
) -> Result<StageOutputs, AnalysisError> {
    let series = inputs.required()?;

    let ((short, long), (correlation, (cisd, (vacuum_zones, sync)))) = rayon::join(
        || {
            rayon::join(
                || analysis::snapshot_stage(series.short, SeriesRole::Short, config),
                || analysis::snapshot_stage(series.long, SeriesRole::Long, config),
            )
        },
        || {
            rayon::join(
                || analysis::correlation_stage(series.short, &inputs.proxy),
                || {
                    rayon::join(
                        || analysis::cisd_stage(series.fast, config),
                        || {
                            rayon::join(
                                || analysis::volume_profile_stage(series.fast, config),
                                || analysis::sync_stage(&series, config),
                            )
                        },
                    )
                },
            )
        },
    );

    Ok(StageOutputs {
        short: short?,
        long: long?,
        correlation,
        cisd,
        vacuum_zones,
        sync,
    })
}

/// Run the analysis over already-loaded data.
pub fn run_pipeline(
    data: &LoadedData,
    config: &AnalysisConfig,
    opts: &PipelineOptions,
) -> Result<Report, RunError> {
    config.validate()?;
    let inputs = &data.inputs;
    let outputs = if opts.parallel {
        run_stages_parallel(inputs, config)?
    } else {
        analysis::run_stages(inputs, config)?
    };
    debug!(parallel = opts.parallel, "stages complete");

    let meta = ReportMeta {
        dataset_hash: data.dataset_hash.clone(),
        synthetic: data.has_synthetic,
        generated_at: opts.now,
    };
    Ok(analysis::assemble(inputs, outputs, config, meta)?)
}

/// Load through `provider` and analyze, as configured by `config`.
pub fn run(
    config: &RunConfig,
    provider: Option<&dyn DataProvider>,
    now: DateTime<Utc>,
) -> Result<Report, RunError> {
    config.validate()?;
    info!(
        symbol = %config.analysis.symbol,
        config_id = %config.config_id(),
        provider = provider.map(|p| p.name()).unwrap_or("none"),
        "starting analysis run"
    );

    let load_opts = LoadOptions {
        synthetic: config.synthetic,
        now,
    };
    let data = load_inputs(provider, &config.analysis, &load_opts)?;

    let opts = PipelineOptions {
        parallel: config.parallel,
        now,
    };
    let report = run_pipeline(&data, &config.analysis, &opts)?;
    info!(
        status = %report.status,
        dataset_hash = %report.dataset_hash,
        synthetic = report.synthetic,
        "analysis run complete"
    );
    Ok(report)
}
