//! Training workflow.
//!
//! A run is prepared in two steps before the external trainer is launched:
//! the dataset descriptor is verified, then the device is resolved and the
//! device-dependent settings (batch cap, workers) are computed.

mod config;
mod dataset;
mod results;
mod runner;

pub use config::{
    Augmentation, Device, LaunchSettings, LossWeights, ModelSize, OptimizerConfig,
    ResolvedDevice, TrainConfig, CPU_MAX_BATCH,
};
pub use dataset::{verify_dataset, DatasetDescriptor, DatasetSummary, REQUIRED_DIRS};
pub use results::{read_results_csv, MapRating, ValidationMetrics};
pub use runner::{
    parse_nvidia_smi, probe_gpu, resolve_device, GpuInfo, TrainOutcome, Trainer, UltralyticsCli,
};

use serde::Serialize;

use crate::error::SignscopeError;

/// Everything decided before the trainer starts.
#[derive(Clone, Debug, Serialize)]
pub struct TrainPlan {
    pub dataset: DatasetSummary,
    pub gpu: Option<GpuInfo>,
    pub launch: LaunchSettings,
}

/// Verify the dataset and resolve the device for `config`.
pub fn prepare_training<F>(config: &TrainConfig, probe: F) -> Result<TrainPlan, SignscopeError>
where
    F: FnOnce() -> Option<GpuInfo>,
{
    let dataset = verify_dataset(&config.data)?;
    let (device, gpu) = resolve_device(config.device, probe);
    let launch = config.launch_settings(device);

    if let Some(requested) = launch.batch_reduced_from {
        tracing::warn!(
            requested,
            batch = launch.batch,
            "reducing batch size for CPU training"
        );
    }

    Ok(TrainPlan {
        dataset,
        gpu,
        launch,
    })
}
