//! peeptree CLI: cut annotated images into labeled training tiles.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use log::{info, warn};
use peeptree::writer::ImageTileWriter;
use peeptree::{AnnotationRecord, GenerateConfig, ImageSize, TileParams, TrainingDataGenerator};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "peeptree")]
#[command(about = "Generate positive/background training tiles from Pascal VOC annotations")]
#[command(version)]
struct Cli {
    /// More log output (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Emit structured JSON logs (reads RUST_LOG, ignores -v/-q).
    #[cfg(feature = "tracing")]
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Map every annotation in a folder to tiles and write them as PNG files.
    Generate(GenerateArgs),

    /// Print the tile labels of a single annotation file as JSON.
    Inspect(InspectArgs),

    /// Write a default JSON config for `generate`.
    InitConfig {
        /// Output path.
        out: PathBuf,
        /// Annotation folder to put in the config.
        #[arg(long, default_value = "annotations")]
        src: PathBuf,
        /// Tile folder to put in the config.
        #[arg(long, default_value = "tiles")]
        target: PathBuf,
    },
}

#[derive(Debug, Clone, Args)]
struct ParamArgs {
    /// Tile side length in resized-image pixels.
    #[arg(long)]
    block_dim: Option<u32>,

    /// Minimum covered area (px^2) for a positive tile; default is half a tile.
    #[arg(long)]
    min_covered_area: Option<f64>,

    /// Canvas every image is resized to, as WxH.
    #[arg(long, value_parser = parse_size)]
    resize: Option<ImageSize>,
}

impl ParamArgs {
    fn apply(&self, params: &mut TileParams) {
        if let Some(dim) = self.block_dim {
            params.block_dim = dim;
        }
        if let Some(area) = self.min_covered_area {
            params.min_block_covered_area = Some(area);
        }
        if let Some(size) = self.resize {
            params.resize = size;
        }
    }
}

#[derive(Debug, Clone, Args)]
struct GenerateArgs {
    /// JSON config; flags given on the command line override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Folder with the `*.xml` annotations.
    #[arg(long)]
    src: Option<PathBuf>,

    /// Folder the tiles are written to.
    #[arg(long)]
    target: Option<PathBuf>,

    /// Classes file (default `<src>/predefined_classes.txt`).
    #[arg(long)]
    classes: Option<PathBuf>,

    /// Folder for debug overlays (tiles and boxes drawn on the resized image).
    #[arg(long)]
    overlay: Option<PathBuf>,

    /// Path to write the batch report (JSON).
    #[arg(long)]
    report: Option<PathBuf>,

    #[command(flatten)]
    params: ParamArgs,
}

#[derive(Debug, Clone, Args)]
struct InspectArgs {
    /// Annotation file.
    file: PathBuf,

    #[command(flatten)]
    params: ParamArgs,
}

fn parse_size(s: &str) -> Result<ImageSize, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got '{s}'"))?;
    let w: u32 = w.trim().parse().map_err(|_| format!("invalid width '{w}'"))?;
    let h: u32 = h.trim().parse().map_err(|_| format!("invalid height '{h}'"))?;
    ImageSize::new(w, h).map_err(|e| e.to_string())
}

fn init_simple_logger(cli: &Cli) -> CliResult<()> {
    let level = peeptree::core::level_from_verbosity(cli.verbose, cli.quiet);
    peeptree::core::init_with_level(level)?;
    Ok(())
}

#[cfg(feature = "tracing")]
fn init_logging(cli: &Cli) -> CliResult<()> {
    if cli.json_logs {
        peeptree::core::init_tracing(true)?;
        return Ok(());
    }
    init_simple_logger(cli)
}

#[cfg(not(feature = "tracing"))]
fn init_logging(cli: &Cli) -> CliResult<()> {
    init_simple_logger(cli)
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    match cli.command {
        Commands::Generate(args) => run_generate(&args),
        Commands::Inspect(args) => run_inspect(&args),
        Commands::InitConfig { out, src, target } => run_init_config(&out, src, target),
    }
}

// ── generate ───────────────────────────────────────────────────────────

fn resolve_config(args: &GenerateArgs) -> CliResult<GenerateConfig> {
    let mut cfg = match &args.config {
        Some(path) => GenerateConfig::load_json(path)?,
        None => {
            let (Some(src), Some(target)) = (&args.src, &args.target) else {
                return Err("--src and --target are required without --config".into());
            };
            GenerateConfig::new(src, target)
        }
    };
    if let Some(src) = &args.src {
        cfg.src_dir = src.clone();
    }
    if let Some(target) = &args.target {
        cfg.target_dir = target.clone();
    }
    if args.classes.is_some() {
        cfg.classes_file = args.classes.clone();
    }
    if args.overlay.is_some() {
        cfg.overlay_dir = args.overlay.clone();
    }
    if args.report.is_some() {
        cfg.report_path = args.report.clone();
    }
    args.params.apply(&mut cfg.params);
    Ok(cfg)
}

fn run_generate(args: &GenerateArgs) -> CliResult<()> {
    let cfg = resolve_config(args)?;
    let generator = cfg.build_generator()?;

    let mut writer = ImageTileWriter::new(&cfg.target_dir, cfg.params.resize)?;
    if let Some(dir) = &cfg.overlay_dir {
        writer = writer.with_overlay(dir)?;
    }

    let report = generator.run(&mut writer)?;

    if let Some(path) = &cfg.report_path {
        report.write_json(path)?;
        info!("report written to {}", path.display());
    }
    if !report.is_clean() {
        warn!(
            "{} of {} records skipped",
            report.skipped.len(),
            report.records_seen
        );
    }

    println!(
        "{} records mapped, {} positive and {} background tiles in {}",
        report.records_mapped,
        report.positive_tiles,
        report.background_tiles,
        cfg.target_dir.display()
    );
    Ok(())
}

// ── inspect ────────────────────────────────────────────────────────────

fn run_inspect(args: &InspectArgs) -> CliResult<()> {
    let mut params = TileParams::default();
    args.params.apply(&mut params);

    let record = AnnotationRecord::load(&args.file)?;
    let src_dir = args
        .file
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let generator = TrainingDataGenerator::new(&src_dir, params)?;
    let tiles = generator.map_record(&record)?;

    println!("{}", serde_json::to_string_pretty(&tiles)?);
    Ok(())
}

// ── init-config ────────────────────────────────────────────────────────

fn run_init_config(out: &Path, src: PathBuf, target: PathBuf) -> CliResult<()> {
    let cfg = GenerateConfig::new(src, target);
    cfg.write_json(out)?;
    println!("wrote {}", out.display());
    Ok(())
}
