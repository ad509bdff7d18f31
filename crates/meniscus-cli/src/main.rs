//! meniscus CLI: batch liquid-volume tracking for two containers.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use meniscus::{
    Calibration, DetectionDebug, DirectorySink, DirectorySource, MeniscusDetector, NullSink,
    PipelineConfig, Roi, VolumeTracker,
};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "meniscus")]
#[command(about = "Track liquid volume in two containers from timestamped photographs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a frame directory into a cleaned volume table.
    Process(CliProcessArgs),

    /// Detect the meniscus in one ROI of a single image.
    Detect(CliDetectArgs),

    /// Print a calibration file after validation.
    CalibrationInfo {
        /// Path to the calibration file.
        #[arg(long)]
        calibration: PathBuf,
    },

    /// Print the default pipeline configuration as JSON.
    DefaultConfig {
        /// Print the legacy preset instead.
        #[arg(long)]
        legacy: bool,
    },
}

#[derive(Debug, Clone, Args)]
struct CliProcessArgs {
    /// Directory of YYYYMMDD-HHMMSS.jpg frames.
    #[arg(long)]
    frames_dir: PathBuf,

    /// Calibration file (Shape/MinVolume/MaxVolume/Instructions).
    #[arg(long)]
    calibration: PathBuf,

    /// Container 1 ROI as x,y,width,height.
    #[arg(long)]
    roi1: Roi,

    /// Container 2 ROI as x,y,width,height.
    #[arg(long)]
    roi2: Roi,

    /// Output CSV (default: <frames-dir>/volumes.csv).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Also write raw and cleaned series with cleaning reports (JSON).
    #[arg(long)]
    json: Option<PathBuf>,

    /// Write per-container blur/processed diagnostic images under this directory.
    #[arg(long)]
    diagnostics: Option<PathBuf>,

    /// Write frames annotated with ROIs and meniscus lines to this directory.
    #[arg(long)]
    annotate: Option<PathBuf>,

    #[command(flatten)]
    pipeline: CliPipelineArgs,
}

#[derive(Debug, Clone, Args)]
struct CliDetectArgs {
    /// Path to the input image.
    #[arg(long)]
    image: PathBuf,

    /// Container ROI as x,y,width,height.
    #[arg(long)]
    roi: Roi,

    /// Path to write the detection result (JSON).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Write smoothed.png and edges.png for this detection into a directory.
    #[arg(long)]
    debug_dir: Option<PathBuf>,

    #[command(flatten)]
    pipeline: CliPipelineArgs,
}

/// Overrides applied on top of the (optional) JSON config.
#[derive(Debug, Clone, Args, Default)]
struct CliPipelineArgs {
    /// Pipeline config JSON (schema meniscus.config.v1).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Start from the legacy preset (7.0 ceiling, misses read as height 0).
    #[arg(long, conflicts_with = "config")]
    legacy: bool,

    #[arg(long, value_enum)]
    preprocess: Option<PreprocessArg>,

    /// Binary threshold level in [30, 128] (threshold modes only).
    #[arg(long)]
    threshold_level: Option<u8>,

    /// Blur kernel as WIDTHxHEIGHT (odd sides), e.g. 25x5.
    #[arg(long)]
    blur_kernel: Option<String>,

    /// Minimum bounding-box width/height ratio for a meniscus candidate.
    #[arg(long)]
    aspect_ratio_min: Option<f64>,

    #[arg(long, value_enum)]
    tie_break: Option<TieBreakArg>,

    /// Require the contour orientation to lie within +-max_abs_angle_deg.
    #[arg(long, conflicts_with = "no_angle_filter")]
    angle_filter: bool,

    /// Disable the orientation gate, even if the config enables it.
    #[arg(long)]
    no_angle_filter: bool,

    /// Rows above the ROI bottom that read as an empty container.
    #[arg(long)]
    floor_band_px: Option<u32>,

    /// Physical volume ceiling; larger samples are treated as missing.
    #[arg(long)]
    max_plausible_volume: Option<f64>,

    /// Absolute z-score above which a sample is an outlier.
    #[arg(long)]
    z_threshold: Option<f64>,

    #[arg(long, value_enum)]
    not_found: Option<NotFoundArg>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PreprocessArg {
    Threshold,
    Blur,
    ThresholdThenBlur,
}

impl PreprocessArg {
    fn to_core(self) -> meniscus::PreprocessMode {
        match self {
            Self::Threshold => meniscus::PreprocessMode::Threshold,
            Self::Blur => meniscus::PreprocessMode::Blur,
            Self::ThresholdThenBlur => meniscus::PreprocessMode::ThresholdThenBlur,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TieBreakArg {
    MaxPerimeter,
    MaxAspectRatio,
}

impl TieBreakArg {
    fn to_core(self) -> meniscus::TieBreak {
        match self {
            Self::MaxPerimeter => meniscus::TieBreak::MaxPerimeter,
            Self::MaxAspectRatio => meniscus::TieBreak::MaxAspectRatio,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum NotFoundArg {
    Gap,
    Zero,
}

impl NotFoundArg {
    fn to_core(self) -> meniscus::NotFoundPolicy {
        match self {
            Self::Gap => meniscus::NotFoundPolicy::Gap,
            Self::Zero => meniscus::NotFoundPolicy::Zero,
        }
    }
}

fn parse_kernel(text: &str) -> CliResult<meniscus::BlurKernel> {
    let (w, h) = text
        .split_once(['x', 'X'])
        .ok_or_else(|| -> CliError { format!("invalid blur kernel '{}'", text).into() })?;
    Ok(meniscus::BlurKernel {
        width: w.trim().parse()?,
        height: h.trim().parse()?,
    })
}

impl CliPipelineArgs {
    fn to_config(&self) -> CliResult<PipelineConfig> {
        let mut config = match (&self.config, self.legacy) {
            (Some(path), _) => PipelineConfig::from_json_file(path)?,
            (None, true) => PipelineConfig::legacy(),
            (None, false) => PipelineConfig::default(),
        };

        // Detector overrides
        if let Some(p) = self.preprocess {
            config.detector.preprocess = p.to_core();
        }
        if let Some(level) = self.threshold_level {
            config.detector.threshold_level = level;
        }
        if let Some(ref k) = self.blur_kernel {
            config.detector.blur_kernel = parse_kernel(k)?;
        }
        if let Some(r) = self.aspect_ratio_min {
            config.detector.aspect_ratio_min = r;
        }
        if let Some(t) = self.tie_break {
            config.detector.tie_break = t.to_core();
        }
        if self.angle_filter {
            config.detector.angle_filter = true;
        } else if self.no_angle_filter {
            config.detector.angle_filter = false;
        }
        if let Some(band) = self.floor_band_px {
            config.detector.floor_band_px = band;
        }

        // Cleaner overrides
        if let Some(c) = self.max_plausible_volume {
            config.cleaner.max_plausible_volume = Some(c);
        }
        if let Some(z) = self.z_threshold {
            config.cleaner.z_threshold = z;
        }
        if let Some(nf) = self.not_found {
            config.not_found = nf.to_core();
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Process(args) => run_process(&args),
        Commands::Detect(args) => run_detect(&args),
        Commands::CalibrationInfo { calibration } => run_calibration_info(&calibration),
        Commands::DefaultConfig { legacy } => run_default_config(legacy),
    }
}

// ── process ────────────────────────────────────────────────────────────

fn run_process(args: &CliProcessArgs) -> CliResult<()> {
    let calibration = Calibration::from_file(&args.calibration)?;
    let mut config = args.pipeline.to_config()?;
    if args.annotate.is_some() {
        config.retain_frames = true;
    }

    let tracker = VolumeTracker::with_config([args.roi1, args.roi2], calibration, config)?;
    tracing::info!(
        "ROIs: container1={} container2={}",
        tracker.rois()[0],
        tracker.rois()[1]
    );

    let source = DirectorySource::new(&args.frames_dir);
    let result = match &args.diagnostics {
        Some(dir) => {
            tracing::info!("Diagnostics under {}", dir.display());
            tracker.track(&source, &mut DirectorySink::new(dir))?
        }
        None => tracker.track(&source, &mut NullSink)?,
    };

    let csv_path = args
        .out
        .clone()
        .unwrap_or_else(|| args.frames_dir.join(meniscus::DEFAULT_CSV_NAME));
    meniscus::write_csv_file(&result.cleaned, &csv_path)?;

    if let Some(ref json_path) = args.json {
        meniscus::write_json_file(&result, json_path)?;
    }

    if let Some(ref dir) = args.annotate {
        meniscus::write_annotated_frames(&result.cleaned, tracker.rois(), dir)?;
    }

    println!("Results saved to {}", csv_path.display());
    Ok(())
}

// ── detect ─────────────────────────────────────────────────────────────

fn run_detect(args: &CliDetectArgs) -> CliResult<()> {
    tracing::info!("Loading image: {}", args.image.display());

    let frame = image::open(&args.image)
        .map_err(|e| -> CliError {
            format!("Failed to open image {}: {}", args.image.display(), e).into()
        })?
        .to_rgb8();
    let (w, h) = frame.dimensions();
    tracing::info!("Image size: {}x{}", w, h);

    let config = args.pipeline.to_config()?;
    let detector = MeniscusDetector::new(config.detector);

    let (detection, debug) = if args.debug_dir.is_some() {
        let (d, dbg) = detector.detect_with_debug(&args.roi, &frame)?;
        (d, Some(dbg))
    } else {
        (detector.detect(&args.roi, &frame)?, None)
    };

    tracing::info!(
        "{} contours, {} candidates, thresholds [{}, {}]",
        detection.n_contours,
        detection.n_candidates,
        detection.thresholds.low,
        detection.thresholds.high
    );
    println!("Height of the liquid: {} pixels", detection.height_px);

    if let Some(ref out) = args.out {
        let json = serde_json::to_string_pretty(&detection)?;
        std::fs::write(out, &json)?;
        tracing::info!("Results written to {}", out.display());
    }

    if let (Some(dir), Some(dbg)) = (&args.debug_dir, debug) {
        write_debug_images(dir, &dbg)?;
    }

    Ok(())
}

fn write_debug_images(dir: &Path, dbg: &DetectionDebug) -> CliResult<()> {
    std::fs::create_dir_all(dir)?;
    dbg.smoothed.save(dir.join("smoothed.png"))?;
    dbg.annotated.save(dir.join("edges.png"))?;
    tracing::info!("Debug images written to {}", dir.display());
    Ok(())
}

// ── calibration-info ───────────────────────────────────────────────────

fn run_calibration_info(path: &Path) -> CliResult<()> {
    let cal = Calibration::from_file(path)?;

    println!("meniscus calibration {}", path.display());
    println!("  shape:          {}", cal.shape);
    println!("  min volume:     {}", cal.min_volume);
    println!("  max volume:     {}", cal.max_volume);
    println!("  span:           {}", cal.span());
    if !cal.instructions.is_empty() {
        println!("  instructions:   {}", cal.instructions);
    }

    Ok(())
}

// ── default-config ─────────────────────────────────────────────────────

fn run_default_config(legacy: bool) -> CliResult<()> {
    let config = if legacy {
        PipelineConfig::legacy()
    } else {
        PipelineConfig::default()
    };
    println!("{}", config.to_json_pretty()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_text_parses() {
        let k = parse_kernel("25x5").unwrap();
        assert_eq!((k.width, k.height), (25, 5));
        assert!(parse_kernel("25").is_err());
        assert!(parse_kernel("ax5").is_err());
    }

    #[test]
    fn overrides_apply_on_top_of_preset() {
        let args = CliPipelineArgs {
            legacy: true,
            tie_break: Some(TieBreakArg::MaxAspectRatio),
            angle_filter: true,
            z_threshold: Some(3.0),
            ..Default::default()
        };
        let cfg = args.to_config().unwrap();
        assert_eq!(cfg.cleaner.max_plausible_volume, Some(7.0));
        assert_eq!(cfg.cleaner.z_threshold, 3.0);
        assert_eq!(cfg.detector.tie_break, meniscus::TieBreak::MaxAspectRatio);
        assert!(cfg.detector.angle_filter);
        assert_eq!(cfg.not_found, meniscus::NotFoundPolicy::Zero);
    }

    #[test]
    fn invalid_override_is_rejected() {
        let args = CliPipelineArgs {
            blur_kernel: Some("4x4".to_string()),
            ..Default::default()
        };
        assert!(args.to_config().is_err());

        let args = CliPipelineArgs {
            threshold_level: Some(200),
            ..Default::default()
        };
        assert!(args.to_config().is_err());
    }

    #[test]
    fn angle_filter_from_config_can_be_switched_off() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.json");
        std::fs::write(
            &path,
            r#"{ "schema": "meniscus.config.v1", "detector": { "angle_filter": true } }"#,
        )
        .unwrap();

        let keep = CliPipelineArgs {
            config: Some(path.clone()),
            ..Default::default()
        };
        assert!(keep.to_config().unwrap().detector.angle_filter);

        let off = CliPipelineArgs {
            config: Some(path),
            no_angle_filter: true,
            ..Default::default()
        };
        assert!(!off.to_config().unwrap().detector.angle_filter);
    }

    #[test]
    fn angle_filter_flags_conflict() {
        let parsed = Cli::try_parse_from([
            "meniscus",
            "process",
            "--frames-dir",
            "frames",
            "--calibration",
            "cal.txt",
            "--roi1",
            "10,20,30,40",
            "--roi2",
            "50,20,30,40",
            "--angle-filter",
            "--no-angle-filter",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn cli_parses_process_command() {
        let cli = Cli::try_parse_from([
            "meniscus",
            "process",
            "--frames-dir",
            "frames",
            "--calibration",
            "cal.txt",
            "--roi1",
            "10,20,30,40",
            "--roi2",
            "50,20,30,40",
            "--tie-break",
            "max-aspect-ratio",
        ])
        .unwrap();
        match cli.command {
            Commands::Process(args) => {
                assert_eq!(args.roi2, Roi::new(50, 20, 30, 40).unwrap());
                assert!(matches!(
                    args.pipeline.tie_break,
                    Some(TieBreakArg::MaxAspectRatio)
                ));
            }
            _ => panic!("expected process"),
        }
    }
}
