use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use idfuse::config::FusionConfig;
use idfuse::core::model::PatientRecord;
use idfuse::pipeline::{build_record, export_record, load_transcription, process_image, PipelineConfig};
use idfuse::sources::{DetectorBridge, DocumentAiResponse, ExtractionSource};

#[derive(Parser, Debug)]
#[command(name = "idfuse")]
#[command(version, about = "National ID field fusion across a local detector and a remote document service", long_about = None)]
struct Cli {
    /// TOML file overriding fusion thresholds and weights
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Reference date for age and future-date rules (default: today)
    #[arg(long, global = true)]
    today: Option<NaiveDate>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fuse a candidates JSON file into a patient record
    Fuse {
        /// Candidates file produced by both extraction sources
        input: PathBuf,

        /// Output directory (default: ./<input_name>_record)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only print the final status line
        #[arg(short, long)]
        quiet: bool,
    },

    /// Run both extraction sources on an ID image and fuse the results
    Process {
        /// ID card image
        image: PathBuf,

        /// Local detector script
        #[arg(long, default_value = "detector/detect_fields.py")]
        detector: PathBuf,

        /// Scripts the local detector reads
        #[arg(long, default_value = "sin+tam+eng")]
        lang: String,

        /// Saved remote service response for this image
        #[arg(long)]
        remote_response: Option<PathBuf>,

        /// Output directory (default: ./<image_name>_record)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fuse several candidates files
    Batch {
        /// Candidates files
        inputs: Vec<PathBuf>,

        /// Output directory for all records
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check whether an intake transcription needs human review
    Review {
        /// Transcription JSON ({"transcript": ..., "confidence": ...})
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let fusion = match &cli.config {
        Some(path) => FusionConfig::load(path)?,
        None => FusionConfig::default(),
    };
    let today = cli.today.unwrap_or_else(|| Local::now().date_naive());

    match cli.command {
        Commands::Fuse {
            input,
            output,
            quiet,
        } => fuse_single(input, output, fusion, today, quiet),
        Commands::Process {
            image,
            detector,
            lang,
            remote_response,
            output,
        } => process_single(image, detector, lang, remote_response, output, fusion, today),
        Commands::Batch { inputs, output } => fuse_batch(inputs, output, fusion, today),
        Commands::Review { input } => review_transcription(&input, &fusion),
    }
}

fn default_output(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    PathBuf::from(format!("{stem}_{suffix}"))
}

fn print_status(record: &PatientRecord) {
    println!(
        "[{}] {} (confidence {:.2})",
        record.overall_status, record.document_id, record.overall_confidence
    );
}

fn fuse_single(
    input: PathBuf,
    output: Option<PathBuf>,
    fusion: FusionConfig,
    today: NaiveDate,
    quiet: bool,
) -> Result<()> {
    if !input.is_file() {
        anyhow::bail!("Input is not a file: {}", input.display());
    }

    let output_dir = output.unwrap_or_else(|| default_output(&input, "record"));
    if !quiet {
        println!("[*] Candidates: {}", input.display());
        println!("[*] Output: {}", output_dir.display());
        println!("[*] Reference date: {today}");
    }

    let config = PipelineConfig::new(input.clone(), output_dir.clone(), fusion, today);
    let record = build_record(&config)
        .with_context(|| format!("Failed to fuse candidates: {}", input.display()))?;

    export_record(&record, &config.output)
        .with_context(|| format!("Failed to export to: {}", output_dir.display()))?;

    print_status(&record);
    Ok(())
}

fn process_single(
    image: PathBuf,
    detector: PathBuf,
    lang: String,
    remote_response: Option<PathBuf>,
    output: Option<PathBuf>,
    fusion: FusionConfig,
    today: NaiveDate,
) -> Result<()> {
    if !image.is_file() {
        anyhow::bail!("Image does not exist: {}", image.display());
    }

    let output_dir = output.unwrap_or_else(|| default_output(&image, "record"));
    let config = PipelineConfig::new(image.clone(), output_dir.clone(), fusion, today);

    let local = DetectorBridge::new(detector).with_lang(lang);
    let remote = remote_response.map(DocumentAiResponse::new);
    let mut sources: Vec<&dyn ExtractionSource> = Vec::new();
    sources.push(&local);
    if let Some(remote) = &remote {
        sources.push(remote);
    }

    let record = process_image(&config, &sources)
        .with_context(|| format!("Failed to process image: {}", image.display()))?;
    export_record(&record, &config.output)
        .with_context(|| format!("Failed to export to: {}", output_dir.display()))?;

    print_status(&record);
    Ok(())
}

fn fuse_batch(
    inputs: Vec<PathBuf>,
    output: Option<PathBuf>,
    fusion: FusionConfig,
    today: NaiveDate,
) -> Result<()> {
    if inputs.is_empty() {
        anyhow::bail!("No input files specified");
    }

    let base_output = output.unwrap_or_else(|| PathBuf::from("batch_records"));
    println!("[*] Batch fusing {} file(s)", inputs.len());

    let mut success = 0;
    let mut failed = 0;

    for (i, input) in inputs.iter().enumerate() {
        println!("[{}/{}] {}", i + 1, inputs.len(), input.display());

        let stem = input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("document_{i}"));
        let output_dir = base_output.join(stem);

        match fuse_single(input.clone(), Some(output_dir), fusion.clone(), today, true) {
            Ok(()) => success += 1,
            Err(e) => {
                eprintln!("  [✗] Failed: {e:#}");
                failed += 1;
            }
        }
    }

    println!("\n[*] Summary: {success} fused, {failed} failed");

    if failed > 0 {
        anyhow::bail!("{failed} file(s) failed to fuse");
    }

    Ok(())
}

fn review_transcription(input: &Path, fusion: &FusionConfig) -> Result<()> {
    let transcription = load_transcription(input)?;
    let verdict = if transcription.needs_review(fusion.review_threshold) {
        "NEEDS REVIEW"
    } else {
        "OK"
    };
    println!(
        "[{verdict}] confidence {:.2} (threshold {:.2})",
        transcription.confidence, fusion.review_threshold
    );
    println!("{}", transcription.transcript);
    Ok(())
}
