//! Launching the external trainer.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Command;

use serde::Serialize;

use super::config::{Device, LaunchSettings, ResolvedDevice, TrainConfig};
use super::results::{read_results_csv, ValidationMetrics};
use crate::error::SignscopeError;

/// A GPU reported by the driver.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GpuInfo {
    pub name: String,
    /// Total memory in GiB, when reported.
    pub memory_gib: Option<f64>,
}

/// Query the first GPU through `nvidia-smi`.
///
/// Any failure (tool missing, no device, unexpected output) means no GPU.
pub fn probe_gpu() -> Option<GpuInfo> {
    let output = Command::new("nvidia-smi")
        .args(["--query-gpu=name,memory.total", "--format=csv,noheader"])
        .output()
        .ok()?;
    if !output.status.success() {
        tracing::debug!(status = %output.status, "nvidia-smi reported failure");
        return None;
    }
    parse_nvidia_smi(&String::from_utf8_lossy(&output.stdout))
}

/// Parse the first line of `nvidia-smi --query-gpu=name,memory.total
/// --format=csv,noheader` output, e.g. `NVIDIA A100, 40960 MiB`.
pub fn parse_nvidia_smi(output: &str) -> Option<GpuInfo> {
    let line = output.lines().map(str::trim).find(|line| !line.is_empty())?;
    let mut fields = line.splitn(2, ',').map(str::trim);

    let name = fields.next().filter(|name| !name.is_empty())?.to_string();
    let memory_gib = fields.next().and_then(|memory| {
        let mib = memory.trim_end_matches("MiB").trim().parse::<f64>().ok()?;
        Some(mib / 1024.0)
    });

    Some(GpuInfo { name, memory_gib })
}

/// Resolve `auto` using `probe`; explicit devices are taken as given.
pub fn resolve_device<F>(device: Device, probe: F) -> (ResolvedDevice, Option<GpuInfo>)
where
    F: FnOnce() -> Option<GpuInfo>,
{
    match device {
        Device::Cpu => (ResolvedDevice::Cpu, None),
        Device::Gpu(index) => (ResolvedDevice::Gpu(index), None),
        Device::Auto => match probe() {
            Some(gpu) => (ResolvedDevice::Gpu(0), Some(gpu)),
            None => (ResolvedDevice::Cpu, None),
        },
    }
}

/// Where a finished run left its artifacts.
#[derive(Clone, Debug, Serialize)]
pub struct TrainOutcome {
    pub run_dir: PathBuf,
    pub best_weights: PathBuf,
    pub last_weights: PathBuf,
    /// `None` when `results.csv` was missing or unreadable.
    pub metrics: Option<ValidationMetrics>,
}

impl TrainOutcome {
    /// Collect the artifacts of a run directory after training.
    pub fn from_run_dir(run_dir: PathBuf) -> Self {
        let results = run_dir.join("results.csv");
        let metrics = match read_results_csv(&results) {
            Ok(metrics) => Some(metrics),
            Err(err) => {
                tracing::warn!(error = %err, "could not read final metrics");
                None
            }
        };

        Self {
            best_weights: run_dir.join("weights").join("best.pt"),
            last_weights: run_dir.join("weights").join("last.pt"),
            run_dir,
            metrics,
        }
    }
}

/// A training backend.
pub trait Trainer {
    fn train(
        &self,
        config: &TrainConfig,
        launch: &LaunchSettings,
    ) -> Result<TrainOutcome, SignscopeError>;
}

/// Trains through the Ultralytics `yolo` command-line tool.
#[derive(Clone, Debug)]
pub struct UltralyticsCli {
    program: OsString,
}

impl Default for UltralyticsCli {
    fn default() -> Self {
        Self::new("yolo")
    }
}

impl UltralyticsCli {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// The full argument list passed to the program.
    pub fn arguments(&self, config: &TrainConfig, launch: &LaunchSettings) -> Vec<String> {
        let mut args = vec!["detect".to_string(), "train".to_string()];
        args.extend(config.to_cli_args(launch));
        args
    }
}

impl Trainer for UltralyticsCli {
    fn train(
        &self,
        config: &TrainConfig,
        launch: &LaunchSettings,
    ) -> Result<TrainOutcome, SignscopeError> {
        let args = self.arguments(config, launch);
        tracing::info!(
            program = %self.program.to_string_lossy(),
            args = %args.join(" "),
            "launching trainer"
        );

        let status = Command::new(&self.program)
            .args(&args)
            .status()
            .map_err(|source| SignscopeError::TrainingFailed {
                message: format!(
                    "could not launch '{}': {source}",
                    self.program.to_string_lossy()
                ),
            })?;

        if !status.success() {
            return Err(SignscopeError::TrainingFailed {
                message: format!("trainer exited with {status}"),
            });
        }

        Ok(TrainOutcome::from_run_dir(config.run_dir()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nvidia_smi_line() {
        let gpu = parse_nvidia_smi("NVIDIA GeForce RTX 3080, 10240 MiB\n").expect("gpu");
        assert_eq!(gpu.name, "NVIDIA GeForce RTX 3080");
        assert_eq!(gpu.memory_gib, Some(10.0));
    }

    #[test]
    fn nvidia_smi_without_memory_still_names_gpu() {
        let gpu = parse_nvidia_smi("\n  Tesla T4\n").expect("gpu");
        assert_eq!(gpu.name, "Tesla T4");
        assert_eq!(gpu.memory_gib, None);
        assert!(parse_nvidia_smi("").is_none());
    }

    #[test]
    fn auto_device_follows_probe() {
        let found = || {
            Some(GpuInfo {
                name: "gpu".to_string(),
                memory_gib: None,
            })
        };
        assert_eq!(resolve_device(Device::Auto, found).0, ResolvedDevice::Gpu(0));
        assert_eq!(resolve_device(Device::Auto, || None).0, ResolvedDevice::Cpu);
        assert_eq!(resolve_device(Device::Gpu(3), || None).0, ResolvedDevice::Gpu(3));
        assert_eq!(resolve_device(Device::Cpu, found).0, ResolvedDevice::Cpu);
    }

    #[test]
    fn arguments_start_with_task_and_mode() {
        let config = TrainConfig::default();
        let launch = config.launch_settings(ResolvedDevice::Cpu);
        let args = UltralyticsCli::default().arguments(&config, &launch);
        assert_eq!(&args[..2], ["detect", "train"]);
        assert!(args.contains(&"batch=8".to_string()));
    }

    #[test]
    fn missing_program_is_training_failure() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let config = TrainConfig::default();
        let launch = config.launch_settings(ResolvedDevice::Cpu);
        let trainer = UltralyticsCli::new(temp.path().join("no-such-yolo"));

        let err = trainer.train(&config, &launch).unwrap_err();
        assert!(matches!(err, SignscopeError::TrainingFailed { .. }));
    }

    #[test]
    fn outcome_without_results_has_no_metrics() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let outcome = TrainOutcome::from_run_dir(temp.path().to_path_buf());
        assert!(outcome.metrics.is_none());
        assert!(outcome.best_weights.ends_with("weights/best.pt"));
    }
}
