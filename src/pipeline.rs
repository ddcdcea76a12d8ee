use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::info;

use crate::assembler::RecordAssembler;
use crate::config::FusionConfig;
use crate::core::model::{DocumentCandidates, PatientRecord};
use crate::core::transcript::Transcription;
use crate::export::{Exporter, JsonExporter, TextExporter};
use crate::sources::{collect_candidates, ExtractionSource};

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub fusion: FusionConfig,
    pub today: NaiveDate,
}

impl PipelineConfig {
    pub fn new(input: PathBuf, output: PathBuf, fusion: FusionConfig, today: NaiveDate) -> Self {
        Self {
            input,
            output,
            fusion,
            today,
        }
    }

    pub fn assembler(&self) -> RecordAssembler {
        RecordAssembler::new(self.fusion.clone(), self.today)
    }
}

pub fn load_candidates(path: &Path) -> Result<DocumentCandidates> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read candidates {}", path.display()))?;
    serde_json::from_str(&json)
        .with_context(|| format!("failed to parse candidates {}", path.display()))
}

/// Builds a record from a candidates file already produced by both sources.
pub fn build_record(config: &PipelineConfig) -> Result<PatientRecord> {
    let document = load_candidates(&config.input)?;
    let record = config
        .assembler()
        .assemble_document(document)
        .with_context(|| format!("malformed candidate list in {}", config.input.display()))?;
    Ok(record)
}

/// Runs the extraction sources on an image, then builds the record.
pub fn process_image(
    config: &PipelineConfig,
    sources: &[&dyn ExtractionSource],
) -> Result<PatientRecord> {
    let candidates = collect_candidates(sources, &config.input)?;
    info!(
        image = %config.input.display(),
        candidates = candidates.len(),
        "collected field candidates"
    );
    let document_id = config
        .input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| config.input.display().to_string());
    let record = config
        .assembler()
        .assemble(&document_id, candidates)
        .with_context(|| format!("malformed candidates for {}", config.input.display()))?;
    Ok(record)
}

pub fn export_record(record: &PatientRecord, output: &Path) -> Result<()> {
    let json_exporter = JsonExporter::new(output.to_path_buf());
    json_exporter.export(record)?;

    let text_exporter = TextExporter::new(output.to_path_buf());
    text_exporter.export(record)?;

    Ok(())
}

pub fn load_transcription(path: &Path) -> Result<Transcription> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read transcription {}", path.display()))?;
    serde_json::from_str(&json)
        .with_context(|| format!("failed to parse transcription {}", path.display()))
}
