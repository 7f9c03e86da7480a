//! Training profile.
//!
//! Every hyperparameter passed to the trainer is enumerated here with its
//! default. A profile can be loaded from YAML; missing keys keep defaults.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SignscopeError;

/// Largest batch size used when training on CPU.
pub const CPU_MAX_BATCH: u32 = 8;
pub const CPU_WORKERS: u32 = 4;
pub const GPU_WORKERS: u32 = 8;

/// YOLOv10 model variant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModelSize {
    /// Nano
    #[default]
    N,
    /// Small
    S,
    /// Medium
    M,
    /// Large
    L,
    /// Extra large
    X,
}

impl ModelSize {
    pub fn suffix(&self) -> &'static str {
        match self {
            ModelSize::N => "n",
            ModelSize::S => "s",
            ModelSize::M => "m",
            ModelSize::L => "l",
            ModelSize::X => "x",
        }
    }

    /// Pretrained checkpoint name, e.g. `yolov10n.pt`.
    pub fn weights_file(&self) -> String {
        format!("yolov10{}.pt", self.suffix())
    }
}

/// Requested training device.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Device {
    /// Use the first GPU when one is detected, else the CPU.
    #[default]
    Auto,
    Cpu,
    Gpu(u32),
}

impl FromStr for Device {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Device::Auto),
            "cpu" => Ok(Device::Cpu),
            other => other
                .parse::<u32>()
                .map(Device::Gpu)
                .map_err(|_| format!("invalid device '{s}' (expected auto, cpu or a GPU index)")),
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Auto => write!(f, "auto"),
            Device::Cpu => write!(f, "cpu"),
            Device::Gpu(index) => write!(f, "{index}"),
        }
    }
}

impl Serialize for Device {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Device {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Index(u32),
            Name(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Index(index) => Ok(Device::Gpu(index)),
            Raw::Name(name) => name.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// A device after `auto` has been resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ResolvedDevice {
    Cpu,
    Gpu(u32),
}

impl ResolvedDevice {
    pub fn is_cpu(&self) -> bool {
        matches!(self, ResolvedDevice::Cpu)
    }

    /// Value for the trainer's `device=` argument.
    pub fn as_arg(&self) -> String {
        match self {
            ResolvedDevice::Cpu => "cpu".to_string(),
            ResolvedDevice::Gpu(index) => index.to_string(),
        }
    }
}

/// Image augmentation settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Augmentation {
    pub hsv_h: f64,
    pub hsv_s: f64,
    pub hsv_v: f64,
    pub degrees: f64,
    pub translate: f64,
    pub scale: f64,
    pub shear: f64,
    pub perspective: f64,
    pub flipud: f64,
    pub fliplr: f64,
    pub mosaic: f64,
    pub mixup: f64,
    pub copy_paste: f64,
}

impl Default for Augmentation {
    fn default() -> Self {
        Self {
            hsv_h: 0.015,
            hsv_s: 0.7,
            hsv_v: 0.4,
            degrees: 0.0,
            translate: 0.1,
            scale: 0.5,
            shear: 0.0,
            perspective: 0.0,
            flipud: 0.0,
            fliplr: 0.5,
            mosaic: 1.0,
            mixup: 0.0,
            copy_paste: 0.0,
        }
    }
}

/// Optimizer and learning-rate schedule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Optimizer name understood by the trainer; `auto` lets it choose.
    pub name: String,
    pub lr0: f64,
    pub lrf: f64,
    pub momentum: f64,
    pub weight_decay: f64,
    pub warmup_epochs: f64,
    pub warmup_momentum: f64,
    pub warmup_bias_lr: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            name: "auto".to_string(),
            lr0: 0.01,
            lrf: 0.01,
            momentum: 0.937,
            weight_decay: 0.0005,
            warmup_epochs: 3.0,
            warmup_momentum: 0.8,
            warmup_bias_lr: 0.1,
        }
    }
}

/// Loss gains.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LossWeights {
    #[serde(rename = "box")]
    pub box_gain: f64,
    #[serde(rename = "cls")]
    pub cls_gain: f64,
    #[serde(rename = "dfl")]
    pub dfl_gain: f64,
}

impl Default for LossWeights {
    fn default() -> Self {
        Self {
            box_gain: 7.5,
            cls_gain: 0.5,
            dfl_gain: 1.5,
        }
    }
}

/// Full training profile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub model: ModelSize,
    /// Dataset descriptor (`data.yaml`).
    pub data: PathBuf,
    pub epochs: u32,
    pub batch: u32,
    pub imgsz: u32,
    /// Epochs without improvement before early stop.
    pub patience: u32,
    pub seed: u64,
    pub deterministic: bool,
    pub device: Device,
    pub project: PathBuf,
    /// Run name; defaults to `YOLOv10{size}_BRSSD`.
    pub name: Option<String>,
    pub exist_ok: bool,
    pub pretrained: bool,
    pub save: bool,
    /// Checkpoint every N epochs; -1 disables.
    pub save_period: i32,
    pub val: bool,
    pub plots: bool,
    pub verbose: bool,
    pub augmentation: Augmentation,
    pub optimizer: OptimizerConfig,
    pub loss: LossWeights,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            model: ModelSize::N,
            data: PathBuf::from("brssd_data.yaml"),
            epochs: 100,
            batch: 16,
            imgsz: 640,
            patience: 50,
            seed: 42,
            deterministic: true,
            device: Device::Auto,
            project: PathBuf::from("runs/brssd"),
            name: None,
            exist_ok: true,
            pretrained: true,
            save: true,
            save_period: -1,
            val: true,
            plots: true,
            verbose: true,
            augmentation: Augmentation::default(),
            optimizer: OptimizerConfig::default(),
            loss: LossWeights::default(),
        }
    }
}

/// Device-dependent settings computed just before launch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LaunchSettings {
    pub device: ResolvedDevice,
    pub batch: u32,
    pub workers: u32,
    /// Set when the requested batch was reduced for CPU training.
    pub batch_reduced_from: Option<u32>,
}

impl TrainConfig {
    pub fn from_yaml_file(path: &Path) -> Result<Self, SignscopeError> {
        let data = fs::read_to_string(path).map_err(SignscopeError::Io)?;
        serde_yaml::from_str(&data).map_err(|source| SignscopeError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn run_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("YOLOv10{}_BRSSD", self.model.suffix()))
    }

    /// Directory the trainer writes this run into.
    pub fn run_dir(&self) -> PathBuf {
        self.project.join(self.run_name())
    }

    /// Apply the CPU batch cap and pick the worker count.
    pub fn launch_settings(&self, device: ResolvedDevice) -> LaunchSettings {
        let (batch, batch_reduced_from) = if device.is_cpu() && self.batch > CPU_MAX_BATCH {
            (CPU_MAX_BATCH, Some(self.batch))
        } else {
            (self.batch, None)
        };

        LaunchSettings {
            device,
            batch,
            workers: if device.is_cpu() {
                CPU_WORKERS
            } else {
                GPU_WORKERS
            },
            batch_reduced_from,
        }
    }

    /// Render the profile as `key=value` arguments for `yolo detect train`.
    pub fn to_cli_args(&self, launch: &LaunchSettings) -> Vec<String> {
        let aug = &self.augmentation;
        let opt = &self.optimizer;
        let loss = &self.loss;

        let pairs: Vec<(&str, String)> = vec![
            ("model", self.model.weights_file()),
            ("data", self.data.display().to_string()),
            ("epochs", self.epochs.to_string()),
            ("imgsz", self.imgsz.to_string()),
            ("batch", launch.batch.to_string()),
            ("name", self.run_name()),
            ("patience", self.patience.to_string()),
            ("save", self.save.to_string()),
            ("device", launch.device.as_arg()),
            ("workers", launch.workers.to_string()),
            ("project", self.project.display().to_string()),
            ("exist_ok", self.exist_ok.to_string()),
            ("pretrained", self.pretrained.to_string()),
            ("optimizer", opt.name.clone()),
            ("verbose", self.verbose.to_string()),
            ("seed", self.seed.to_string()),
            ("deterministic", self.deterministic.to_string()),
            ("val", self.val.to_string()),
            ("plots", self.plots.to_string()),
            ("save_period", self.save_period.to_string()),
            ("hsv_h", aug.hsv_h.to_string()),
            ("hsv_s", aug.hsv_s.to_string()),
            ("hsv_v", aug.hsv_v.to_string()),
            ("degrees", aug.degrees.to_string()),
            ("translate", aug.translate.to_string()),
            ("scale", aug.scale.to_string()),
            ("shear", aug.shear.to_string()),
            ("perspective", aug.perspective.to_string()),
            ("flipud", aug.flipud.to_string()),
            ("fliplr", aug.fliplr.to_string()),
            ("mosaic", aug.mosaic.to_string()),
            ("mixup", aug.mixup.to_string()),
            ("copy_paste", aug.copy_paste.to_string()),
            ("lr0", opt.lr0.to_string()),
            ("lrf", opt.lrf.to_string()),
            ("momentum", opt.momentum.to_string()),
            ("weight_decay", opt.weight_decay.to_string()),
            ("warmup_epochs", opt.warmup_epochs.to_string()),
            ("warmup_momentum", opt.warmup_momentum.to_string()),
            ("warmup_bias_lr", opt.warmup_bias_lr.to_string()),
            ("box", loss.box_gain.to_string()),
            ("cls", loss.cls_gain.to_string()),
            ("dfl", loss.dfl_gain.to_string()),
        ];

        pairs
            .into_iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_size_maps_to_checkpoint() {
        assert_eq!(ModelSize::N.weights_file(), "yolov10n.pt");
        assert_eq!(ModelSize::X.weights_file(), "yolov10x.pt");
    }

    #[test]
    fn device_parses_names_and_indices() {
        assert_eq!("auto".parse::<Device>(), Ok(Device::Auto));
        assert_eq!("CPU".parse::<Device>(), Ok(Device::Cpu));
        assert_eq!("1".parse::<Device>(), Ok(Device::Gpu(1)));
        assert!("gpu".parse::<Device>().is_err());
        assert_eq!(Device::Gpu(2).to_string(), "2");
    }

    #[test]
    fn default_run_name_follows_model_size() {
        let config = TrainConfig {
            model: ModelSize::M,
            ..TrainConfig::default()
        };
        assert_eq!(config.run_name(), "YOLOv10m_BRSSD");
        assert_eq!(config.run_dir(), PathBuf::from("runs/brssd/YOLOv10m_BRSSD"));
    }

    #[test]
    fn cpu_caps_batch_and_workers() {
        let config = TrainConfig::default();

        let cpu = config.launch_settings(ResolvedDevice::Cpu);
        assert_eq!(cpu.batch, 8);
        assert_eq!(cpu.workers, 4);
        assert_eq!(cpu.batch_reduced_from, Some(16));

        let gpu = config.launch_settings(ResolvedDevice::Gpu(0));
        assert_eq!(gpu.batch, 16);
        assert_eq!(gpu.workers, 8);
        assert_eq!(gpu.batch_reduced_from, None);

        let small = TrainConfig {
            batch: 4,
            ..TrainConfig::default()
        };
        assert_eq!(small.launch_settings(ResolvedDevice::Cpu).batch_reduced_from, None);
    }

    #[test]
    fn cli_args_enumerate_profile() {
        let config = TrainConfig::default();
        let launch = config.launch_settings(ResolvedDevice::Gpu(0));
        let args = config.to_cli_args(&launch);

        for expected in [
            "model=yolov10n.pt",
            "epochs=100",
            "batch=16",
            "device=0",
            "workers=8",
            "seed=42",
            "deterministic=true",
            "hsv_h=0.015",
            "fliplr=0.5",
            "momentum=0.937",
            "weight_decay=0.0005",
            "box=7.5",
            "dfl=1.5",
            "save_period=-1",
            "name=YOLOv10n_BRSSD",
        ] {
            assert!(args.iter().any(|arg| arg == expected), "missing {expected}");
        }
    }

    #[test]
    fn yaml_profile_overrides_selected_keys() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("train.yaml");
        fs::write(
            &path,
            "model: s\nepochs: 5\ndevice: cpu\naugmentation:\n  mosaic: 0.0\nloss:\n  box: 5.0\n",
        )
        .expect("write config");

        let config = TrainConfig::from_yaml_file(&path).expect("load config");
        assert_eq!(config.model, ModelSize::S);
        assert_eq!(config.epochs, 5);
        assert_eq!(config.device, Device::Cpu);
        assert_eq!(config.augmentation.mosaic, 0.0);
        assert_eq!(config.augmentation.fliplr, 0.5);
        assert_eq!(config.loss.box_gain, 5.0);
        assert_eq!(config.loss.cls_gain, 0.5);
        assert_eq!(config.batch, 16);
    }

    #[test]
    fn yaml_device_accepts_integer_index() {
        let config: TrainConfig = serde_yaml::from_str("device: 1\n").expect("parse");
        assert_eq!(config.device, Device::Gpu(1));
    }

    #[test]
    fn malformed_profile_is_reported() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("train.yaml");
        fs::write(&path, "epochs: many\n").expect("write config");

        let err = TrainConfig::from_yaml_file(&path).unwrap_err();
        assert!(matches!(err, SignscopeError::ConfigParse { .. }));
    }
}
