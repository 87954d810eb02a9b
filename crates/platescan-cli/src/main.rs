//! platescan CLI: command-line interface for license plate reading.

use clap::{Args, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};

use platescan::{
    AcceptAll, LinearPlateClassifier, PlateClassifier, PlateReader, ReadConfig, RotatedRegion,
};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "platescan")]
#[command(about = "Locate license plates, segment their characters and read them")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline on an image (needs the `tesseract` feature).
    Read(CliReadArgs),

    /// Propose, refine and classify plate regions without OCR.
    Regions(CliRegionArgs),

    /// Segment a canonical plate image into glyphs.
    Segment {
        /// Path to a canonical (e.g. 144x33) grayscale plate image.
        #[arg(long)]
        plate: PathBuf,

        /// Optional config JSON with segmentation overrides.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory to write the thresholded plate and glyphs (PNG).
        #[arg(long)]
        dump_dir: Option<PathBuf>,
    },

    /// Run the syntax corrector on a raw plate string.
    Correct {
        /// Raw recognized string, e.g. BGG234AB.
        #[arg(long)]
        text: String,

        /// Optional config JSON with grammar overrides.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Args)]
struct CommonArgs {
    /// Path to the input image.
    #[arg(long)]
    image: PathBuf,

    /// Path to write results (JSON).
    #[arg(long)]
    out: PathBuf,

    /// Linear plate classifier (JSON with `weights` and `bias`). Every
    /// candidate is accepted when omitted.
    #[arg(long)]
    model: Option<PathBuf>,

    /// Config JSON; missing fields take their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fixed flood-fill seed for reproducible runs.
    #[arg(long)]
    seed: Option<u64>,

    /// Directory to write intermediate images (PNG).
    #[arg(long)]
    dump_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct CliReadArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// OCR language code(s).
    #[arg(long)]
    lang: Option<String>,

    /// Directory holding Tesseract traineddata files.
    #[arg(long)]
    tessdata: Option<PathBuf>,

    /// Skip the syntax correction pass.
    #[arg(long)]
    no_syntax: bool,

    /// Path to write the annotated image (PNG).
    #[arg(long)]
    annotate: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct CliRegionArgs {
    #[command(flatten)]
    common: CommonArgs,
}

/// One refined candidate and the classifier's verdict.
#[derive(serde::Serialize)]
struct RegionReport {
    position: platescan::PixelRect,
    region: RotatedRegion,
    accepted: bool,
}

#[derive(serde::Serialize)]
struct RegionsOutput {
    image_size: [u32; 2],
    proposals: Vec<RotatedRegion>,
    candidates: Vec<RegionReport>,
}

#[derive(serde::Serialize)]
struct SegmentReport {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
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
        Commands::Read(args) => run_read(&args),
        Commands::Regions(args) => run_regions(&args),
        Commands::Segment {
            plate,
            config,
            dump_dir,
        } => run_segment(&plate, config.as_deref(), dump_dir.as_deref()),
        Commands::Correct { text, config } => run_correct(&text, config.as_deref()),
    }
}

fn load_config(path: Option<&Path>) -> CliResult<ReadConfig> {
    match path {
        Some(p) => {
            tracing::info!("Loading config: {}", p.display());
            Ok(ReadConfig::from_json_file(p)?)
        }
        None => Ok(ReadConfig::default()),
    }
}

fn load_classifier(path: Option<&Path>) -> CliResult<Box<dyn PlateClassifier>> {
    match path {
        Some(p) => {
            tracing::info!("Loading plate classifier: {}", p.display());
            Ok(Box::new(LinearPlateClassifier::from_json_file(p)?))
        }
        None => {
            tracing::warn!("No classifier model given; accepting every candidate");
            Ok(Box::new(AcceptAll))
        }
    }
}

fn load_image(path: &Path) -> CliResult<image::RgbImage> {
    tracing::info!("Loading image: {}", path.display());
    let img = image::open(path).map_err(|e| -> CliError {
        format!("Failed to open image {}: {}", path.display(), e).into()
    })?;
    let rgb = img.to_rgb8();
    let (w, h) = rgb.dimensions();
    tracing::info!("Image size: {}x{}", w, h);
    Ok(rgb)
}

fn save_png<I: AsRef<Path>>(dir: &Path, name: I, img: &image::GrayImage) -> CliResult<()> {
    let path = dir.join(name);
    img.save_with_format(&path, image::ImageFormat::Png)?;
    Ok(())
}

/// Write proposal stages and canonical candidates under `dir`.
fn dump_regions(
    dir: &Path,
    reader: &PlateReader,
    image: &image::RgbImage,
    candidates: &[platescan::PlateCandidate],
) -> CliResult<()> {
    std::fs::create_dir_all(dir)?;
    let (_, trace) = reader.propose(image);
    for (i, (name, stage)) in trace.stages().iter().enumerate() {
        save_png(dir, format!("proposal_{i}_{name}.png"), stage)?;
    }
    for (i, cand) in candidates.iter().enumerate() {
        save_png(dir, format!("candidate_{i}.png"), &cand.image)?;
    }
    tracing::info!("Stage images written to {}", dir.display());
    Ok(())
}

// ── read ──────────────────────────────────────────────────────────────

#[cfg(feature = "tesseract")]
fn make_recognizer(
    args: &CliReadArgs,
    config: &ReadConfig,
) -> CliResult<Box<dyn platescan::CharacterRecognizer>> {
    let data_path = args
        .tessdata
        .as_ref()
        .map(|p| p.display().to_string());
    Ok(Box::new(platescan::TesseractRecognizer::new(
        data_path.as_deref(),
        &config.ocr,
    )?))
}

#[cfg(not(feature = "tesseract"))]
fn make_recognizer(
    _args: &CliReadArgs,
    _config: &ReadConfig,
) -> CliResult<Box<dyn platescan::CharacterRecognizer>> {
    Err("platescan-cli was built without the `tesseract` feature; rebuild with --features tesseract".into())
}

fn run_read(args: &CliReadArgs) -> CliResult<()> {
    let common = &args.common;
    let mut config = load_config(common.config.as_deref())?;
    if common.seed.is_some() {
        config.seed = common.seed;
    }
    if let Some(lang) = &args.lang {
        config.ocr.language = lang.clone();
    }
    if args.no_syntax {
        config.syntax_correction = false;
    }

    // Shared by the read and the dump.
    let rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut recognizer = make_recognizer(args, &config)?;
    let classifier = load_classifier(common.model.as_deref())?;
    let reader = PlateReader::new(config)?;
    let image = load_image(&common.image)?;

    let result = reader.read_with_rng(
        &image,
        classifier.as_ref(),
        recognizer.as_mut(),
        &mut rng.clone(),
    );
    tracing::info!(
        "Read {} plates ({} regions, {} candidates, {} accepted, {} dropped)",
        result.plates.len(),
        result.n_regions,
        result.n_candidates,
        result.n_accepted,
        result.n_dropped,
    );
    for plate in &result.plates {
        tracing::info!(
            "  {} (raw {}) at {},{} {}x{}",
            plate.text,
            plate.raw_text,
            plate.position.x,
            plate.position.y,
            plate.position.width,
            plate.position.height,
        );
    }

    let json = serde_json::to_string_pretty(&result)?;
    std::fs::write(&common.out, &json)?;
    tracing::info!("Results written to {}", common.out.display());

    if let Some(path) = &args.annotate {
        platescan::annotate(&image, &result).save_with_format(path, image::ImageFormat::Png)?;
        tracing::info!("Annotated image written to {}", path.display());
    }

    if let Some(dir) = &common.dump_dir {
        let candidates = reader.candidates_with_rng(&image, &mut rng.clone());
        dump_regions(dir, &reader, &image, &candidates)?;
        for (i, cand) in candidates.iter().enumerate() {
            let (segments, binary) = reader.segment(&cand.image);
            save_png(dir, format!("candidate_{i}_threshold.png"), &binary)?;
            for (j, seg) in segments.iter().enumerate() {
                save_png(dir, format!("candidate_{i}_glyph_{j}.png"), &seg.glyph)?;
            }
        }
    }

    Ok(())
}

// ── regions ───────────────────────────────────────────────────────────

fn run_regions(args: &CliRegionArgs) -> CliResult<()> {
    let common = &args.common;
    let mut config = load_config(common.config.as_deref())?;
    if common.seed.is_some() {
        config.seed = common.seed;
    }
    let classifier = load_classifier(common.model.as_deref())?;
    let reader = PlateReader::new(config)?;
    let image = load_image(&common.image)?;

    let (proposals, _) = reader.propose(&image);
    let candidates = reader.candidates(&image);
    let mut reports = Vec::with_capacity(candidates.len());
    for cand in &candidates {
        let accepted = match classifier.predict(cand.features()) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("Classifier failed at {:?}: {}", cand.position, e);
                false
            }
        };
        reports.push(RegionReport {
            position: cand.position,
            region: cand.region,
            accepted,
        });
    }
    tracing::info!(
        "{} proposals, {} candidates, {} accepted",
        proposals.len(),
        reports.len(),
        reports.iter().filter(|r| r.accepted).count(),
    );

    let (w, h) = image.dimensions();
    let output = RegionsOutput {
        image_size: [w, h],
        proposals,
        candidates: reports,
    };
    std::fs::write(&common.out, serde_json::to_string_pretty(&output)?)?;
    tracing::info!("Results written to {}", common.out.display());

    if let Some(dir) = &common.dump_dir {
        dump_regions(dir, &reader, &image, &candidates)?;
    }
    Ok(())
}

// ── segment ───────────────────────────────────────────────────────────

fn run_segment(plate: &Path, config: Option<&Path>, dump_dir: Option<&Path>) -> CliResult<()> {
    let reader = PlateReader::new(load_config(config)?)?;
    let img = image::open(plate)
        .map_err(|e| -> CliError {
            format!("Failed to open plate {}: {}", plate.display(), e).into()
        })?
        .to_luma8();

    let (segments, binary) = reader.segment(&img);
    let reports: Vec<SegmentReport> = segments
        .iter()
        .map(|s| SegmentReport {
            x: s.rect.x,
            y: s.rect.y,
            width: s.rect.width,
            height: s.rect.height,
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&reports)?);

    if let Some(dir) = dump_dir {
        std::fs::create_dir_all(dir)?;
        save_png(dir, "threshold.png", &binary)?;
        for (i, seg) in segments.iter().enumerate() {
            save_png(dir, format!("glyph_{i}.png"), &seg.glyph)?;
        }
        tracing::info!("Glyphs written to {}", dir.display());
    }
    Ok(())
}

// ── correct ───────────────────────────────────────────────────────────

fn run_correct(text: &str, config: Option<&Path>) -> CliResult<()> {
    let reader = PlateReader::new(load_config(config)?)?;
    let corrected = reader.correct(text);
    println!("Input:     {}", text);
    println!("Corrected: {}", corrected);
    Ok(())
}
