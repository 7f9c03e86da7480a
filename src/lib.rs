//! Signscope: tooling around a traffic-sign detection workflow.
//!
//! Signscope downloads the BRSSD road-sign dataset, launches YOLOv10
//! training runs through the Ultralytics CLI, and summarizes what comes out:
//! prediction label statistics, annotated prediction images and training
//! run artifacts.
//!
//! # Modules
//!
//! - [`labels`]: YOLO label parsing, pixel geometry and prediction directories
//! - [`style`]: Class names and colors
//! - [`stats`]: Per-class detection tallies and the analysis report
//! - [`overlay`]: Drawing detections onto images
//! - [`metrics`]: Training run artifact inspection
//! - [`train`]: Training profile and trainer launch
//! - [`fetch`]: Dataset download with provider fallback
//! - [`error`]: Error types for signscope operations

pub mod error;
pub mod fetch;
pub mod labels;
pub mod logging;
pub mod metrics;
pub mod overlay;
pub mod stats;
pub mod style;
pub mod train;

use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, Subcommand, ValueEnum};

pub use error::SignscopeError;

use crate::fetch::{DatasetSource, FetchRequest};
use crate::labels::PredictionLayout;
use crate::overlay::{LabelFont, Visualizer};
use crate::style::StyleTable;
use crate::train::{Device, ModelSize, Trainer, TrainConfig, UltralyticsCli};

/// The signscope CLI application.
#[derive(Parser)]
#[command(name = "signscope")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Summarize the detections in a prediction directory.
    Analyze(AnalyzeArgs),
    /// Draw predicted boxes onto images.
    Visualize(VisualizeArgs),
    /// Inspect the artifacts of a training run.
    Metrics(MetricsArgs),
    /// Report the class-id range used by a label directory.
    Classes(ClassesArgs),
    /// Train a YOLOv10 model on the dataset.
    Train(TrainArgs),
    /// Download the dataset.
    Download(DownloadArgs),
}

/// Report output format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Arguments shared by commands that read a prediction directory.
#[derive(clap::Args)]
struct PredictionArgs {
    /// Prediction directory holding the images.
    #[arg(default_value = ".")]
    predictions: PathBuf,

    /// Label directory (defaults to `<predictions>/labels`).
    #[arg(long)]
    labels: Option<PathBuf>,

    /// YAML class style table (defaults to the built-in traffic-sign table).
    #[arg(long)]
    styles: Option<PathBuf>,
}

impl PredictionArgs {
    fn layout(&self) -> Result<PredictionLayout, SignscopeError> {
        PredictionLayout::discover(&self.predictions, self.labels.as_deref())
    }

    fn style_table(&self) -> Result<StyleTable, SignscopeError> {
        load_styles(self.styles.as_deref())
    }
}

#[derive(clap::Args)]
struct AnalyzeArgs {
    #[command(flatten)]
    input: PredictionArgs,

    /// Number of label files to list detection by detection.
    #[arg(long, default_value_t = 3)]
    samples: usize,

    /// Output format for the report.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
}

/// What `visualize` renders.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum VisualizeMode {
    /// Grid, per-class sheets and individual images.
    #[default]
    All,
    Grid,
    Class,
    Individual,
}

#[derive(clap::Args)]
struct VisualizeArgs {
    #[command(flatten)]
    input: PredictionArgs,

    #[arg(long, value_enum, default_value_t = VisualizeMode::All)]
    mode: VisualizeMode,

    /// Number of images in the grid.
    #[arg(long, default_value_t = 9)]
    grid: usize,

    /// Class ids to render per-class sheets for.
    #[arg(long, value_delimiter = ',', default_value = "36,26,23")]
    classes: Vec<u32>,

    /// Maximum images per class sheet.
    #[arg(long, default_value_t = 6)]
    max_per_class: usize,

    /// Directory for the grid and class sheets.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Directory for individually annotated images.
    #[arg(long, default_value = "visualized")]
    individual_dir: PathBuf,

    /// TrueType font for class tags (defaults to a system font).
    #[arg(long, env = "SIGNSCOPE_FONT")]
    font: Option<PathBuf>,
}

#[derive(clap::Args)]
struct MetricsArgs {
    /// Training run directory (e.g. runs/brssd/YOLOv10m_BRSSD).
    #[arg(default_value = ".")]
    run_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
}

#[derive(clap::Args)]
struct ClassesArgs {
    /// Label directory to scan.
    #[arg(default_value = "./BRSSD/train/labels")]
    labels: PathBuf,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
}

#[derive(clap::Args)]
struct TrainArgs {
    /// YAML training profile; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Model size.
    #[arg(long, value_enum)]
    model: Option<ModelSize>,

    /// Number of training epochs.
    #[arg(long)]
    epochs: Option<u32>,

    /// Batch size.
    #[arg(long)]
    batch: Option<u32>,

    /// Image size.
    #[arg(long)]
    imgsz: Option<u32>,

    /// Dataset YAML file.
    #[arg(long)]
    data: Option<PathBuf>,

    /// Device to use: auto, cpu, 0, 1, etc.
    #[arg(long)]
    device: Option<Device>,

    /// Ultralytics executable.
    #[arg(long, default_value = "yolo")]
    yolo: PathBuf,

    /// Print the resolved plan and trainer command without launching.
    #[arg(long)]
    dry_run: bool,
}

#[derive(clap::Args)]
struct DownloadArgs {
    /// Download source.
    #[arg(long, value_enum, default_value_t = DatasetSource::All)]
    source: DatasetSource,

    /// Directory to place the dataset in.
    #[arg(long, default_value = "./BRSSD")]
    output: PathBuf,

    /// Roboflow API key.
    #[arg(long, env = "ROBOFLOW_API_KEY", hide_env_values = true)]
    roboflow_api_key: Option<String>,
}

/// Run the signscope CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), SignscopeError> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    match cli.command {
        Some(Commands::Analyze(args)) => run_analyze(args),
        Some(Commands::Visualize(args)) => run_visualize(args),
        Some(Commands::Metrics(args)) => run_metrics(args),
        Some(Commands::Classes(args)) => run_classes(args),
        Some(Commands::Train(args)) => run_train(args),
        Some(Commands::Download(args)) => run_download(args),
        None => {
            println!("signscope {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Dataset, training and prediction tooling for traffic-sign detection.");
            println!();
            println!("Run 'signscope --help' for usage information.");
            Ok(())
        }
    }
}

fn load_styles(path: Option<&Path>) -> Result<StyleTable, SignscopeError> {
    match path {
        Some(path) => StyleTable::from_yaml_file(path),
        None => Ok(StyleTable::traffic_signs()),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), SignscopeError> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

/// Execute the analyze subcommand.
fn run_analyze(args: AnalyzeArgs) -> Result<(), SignscopeError> {
    let layout = args.input.layout()?;
    let styles = args.input.style_table()?;
    let opts = stats::AnalyzeOptions {
        sample_files: args.samples,
    };

    let report = stats::analyze_predictions(&layout, &styles, &opts)?;

    match args.output {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Text => {
            print!("{}", report);
            Ok(())
        }
    }
}

/// Execute the visualize subcommand.
///
/// Steps are independent: a failing step is reported and the remaining
/// steps still run.
fn run_visualize(args: VisualizeArgs) -> Result<(), SignscopeError> {
    let layout = args.input.layout()?;
    let styles = args.input.style_table()?;
    let font = LabelFont::load(args.font.as_deref())?;
    let visualizer = Visualizer::new(&layout, &styles, &font);

    let run_grid = matches!(args.mode, VisualizeMode::All | VisualizeMode::Grid);
    let run_class = matches!(args.mode, VisualizeMode::All | VisualizeMode::Class);
    let run_individual = matches!(args.mode, VisualizeMode::All | VisualizeMode::Individual);

    let mut steps = 0usize;
    let mut failed = 0usize;

    println!("Traffic Sign Prediction Visualizer");
    println!("{}", "=".repeat(60));
    match font.source() {
        Some(path) if font.has_glyphs() => {
            tracing::info!(font = %path.display(), "drawing class tags")
        }
        _ => println!("⚠ No font available, class tags are drawn without text"),
    }

    if run_grid {
        steps += 1;
        println!();
        println!("Creating grid visualization ({} images)...", args.grid);
        match visualizer.render_grid(args.grid, &args.out_dir) {
            Ok(Some(output)) => println!(
                "  ✓ {} ({} images)",
                output.path.display(),
                output.images
            ),
            Ok(None) => println!("  ✗ no labeled images found"),
            Err(err) => {
                failed += 1;
                println!("  ✗ {err}");
            }
        }
    }

    if run_class {
        println!();
        println!("Creating visualizations by class...");
        for &class_id in &args.classes {
            steps += 1;
            println!("  - Class {} ({})", class_id, styles.name(class_id));
            match visualizer.render_class(class_id, args.max_per_class, &args.out_dir) {
                Ok(Some(output)) => println!(
                    "    ✓ {} ({} images)",
                    output.path.display(),
                    output.images
                ),
                Ok(None) => println!("    ✗ no images found with class {class_id}"),
                Err(err) => {
                    failed += 1;
                    println!("    ✗ {err}");
                }
            }
        }
    }

    if run_individual {
        steps += 1;
        println!();
        println!("Creating individual visualizations...");
        match visualizer.render_individual(&args.individual_dir) {
            Ok(outcome) => {
                println!(
                    "  ✓ {} annotated images in {}",
                    outcome.written.len(),
                    outcome.output_dir.display()
                );
                for (image, message) in &outcome.failed {
                    println!("  ✗ {}: {}", image.display(), message);
                }
            }
            Err(err) => {
                failed += 1;
                println!("  ✗ {err}");
            }
        }
    }

    println!();
    if failed > 0 {
        return Err(SignscopeError::StepsFailed {
            failed,
            total: steps,
        });
    }
    println!("Visualization complete.");
    Ok(())
}

/// Execute the metrics subcommand.
fn run_metrics(args: MetricsArgs) -> Result<(), SignscopeError> {
    let report = metrics::inspect_run(&args.run_dir)?;
    for path in metrics::missing_artifacts(&report) {
        tracing::info!(path = %path.display(), "expected training artifact is missing");
    }

    match args.output {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Text => {
            print!("{}", report);
            Ok(())
        }
    }
}

/// Execute the classes subcommand.
fn run_classes(args: ClassesArgs) -> Result<(), SignscopeError> {
    let range = stats::class_range(&args.labels)?;

    match args.output {
        OutputFormat::Json => print_json(&range),
        OutputFormat::Text => {
            println!(
                "Found {} label files in {}",
                range.label_files,
                args.labels.display()
            );
            match range.max_class_id {
                Some(max) => println!("Max class ID found: {max}"),
                None => println!("Max class ID found: none"),
            }
            println!("Implied number of classes: {}", range.implied_classes());
            Ok(())
        }
    }
}

/// Execute the train subcommand.
fn run_train(args: TrainArgs) -> Result<(), SignscopeError> {
    let mut config = match &args.config {
        Some(path) => TrainConfig::from_yaml_file(path)?,
        None => TrainConfig::default(),
    };
    if let Some(model) = args.model {
        config.model = model;
    }
    if let Some(epochs) = args.epochs {
        config.epochs = epochs;
    }
    if let Some(batch) = args.batch {
        config.batch = batch;
    }
    if let Some(imgsz) = args.imgsz {
        config.imgsz = imgsz;
    }
    if let Some(data) = args.data {
        config.data = data;
    }
    if let Some(device) = args.device {
        config.device = device;
    }

    println!("YOLOv10 Training on BRSSD Dataset");
    println!("{}", "=".repeat(60));

    let plan = train::prepare_training(&config, train::probe_gpu)?;

    let dataset = &plan.dataset;
    println!("Dataset: {}", dataset.dataset.root.display());
    println!("  Training images:   {}", dataset.train_images);
    println!("  Validation images: {}", dataset.valid_images);
    if let Some(test) = dataset.test_images {
        println!("  Test images:       {test}");
    }
    match dataset.dataset.class_count {
        Some(count) => println!("  Classes:           {count}"),
        None => println!("  Classes:           unknown"),
    }

    match &plan.gpu {
        Some(gpu) => match gpu.memory_gib {
            Some(memory) => println!("✓ GPU available: {} ({memory:.1} GB)", gpu.name),
            None => println!("✓ GPU available: {}", gpu.name),
        },
        None if plan.launch.device.is_cpu() => println!("⚠ No GPU detected, training on CPU"),
        None => {}
    }
    if let Some(requested) = plan.launch.batch_reduced_from {
        println!(
            "⚠ Reducing batch size from {requested} to {} for CPU training",
            plan.launch.batch
        );
    }

    println!();
    println!("Configuration:");
    println!("  Model:      {}", config.model.weights_file());
    println!("  Epochs:     {}", config.epochs);
    println!("  Batch size: {}", plan.launch.batch);
    println!("  Image size: {}", config.imgsz);
    println!("  Device:     {}", plan.launch.device.as_arg());
    println!("  Run:        {}", config.run_dir().display());

    let trainer = UltralyticsCli::new(args.yolo.into_os_string());
    if args.dry_run {
        println!();
        println!("Command:");
        println!(
            "  yolo {}",
            trainer.arguments(&config, &plan.launch).join(" ")
        );
        return Ok(());
    }

    println!();
    println!("Starting training...");
    let outcome = match trainer.train(&config, &plan.launch) {
        Ok(outcome) => outcome,
        Err(err) => {
            eprintln!("✗ Training failed: {err}");
            eprintln!();
            eprintln!("Troubleshooting:");
            eprintln!("  1. Install Ultralytics: pip install ultralytics");
            eprintln!("  2. Check the dataset path in {}", config.data.display());
            eprintln!("  3. Reduce the batch size if memory runs out (--batch 8)");
            eprintln!("  4. Try a smaller model (--model n)");
            return Err(err);
        }
    };

    println!();
    println!("Training completed successfully!");
    if let Some(m) = &outcome.metrics {
        println!();
        println!("Validation Metrics:");
        println!("  mAP50:     {:.4}", m.map50);
        println!("  mAP50-95:  {:.4}", m.map50_95);
        println!("  Precision: {:.4}", m.precision);
        println!("  Recall:    {:.4}", m.recall);
    }
    println!();
    println!("Model saved:");
    println!("  Best weights: {}", outcome.best_weights.display());
    println!("  Last weights: {}", outcome.last_weights.display());
    println!("  Results:      {}", outcome.run_dir.display());
    Ok(())
}

/// Execute the download subcommand.
fn run_download(args: DownloadArgs) -> Result<(), SignscopeError> {
    let request = FetchRequest {
        output_dir: args.output,
        roboflow_api_key: args.roboflow_api_key,
    };
    let providers = fetch::providers_for(args.source);

    println!("BRSSD Dataset Downloader");
    println!("{}", "=".repeat(60));

    match fetch::download_dataset(&providers, &request) {
        Ok(outcome) => {
            for failure in &outcome.earlier_failures {
                println!("  ✗ {failure}");
            }
            println!(
                "✓ Downloaded from {} into {}",
                outcome.provider,
                outcome.location.display()
            );
            Ok(())
        }
        Err(err) => {
            if let SignscopeError::DownloadFailed { attempts } = &err {
                for attempt in attempts {
                    println!("  ✗ {attempt}");
                }
            }
            println!();
            println!("✗ Automatic download failed from all sources");
            println!();
            print!("{}", fetch::manual_instructions(&request.output_dir));
            Err(err)
        }
    }
}
