use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::model::{FieldCandidate, FieldName, Source};
use crate::sources::ExtractionSource;

/// One detection printed by the local detector script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    pub field: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub confidence: f32,
}

/// Runs the locally trained detector/OCR model as a subprocess and reads its
/// JSON list of detections from stdout.
#[derive(Debug, Clone)]
pub struct DetectorBridge {
    program: String,
    script_path: PathBuf,
    lang: String,
}

impl DetectorBridge {
    pub fn new(script_path: PathBuf) -> Self {
        Self {
            program: "python3".to_string(),
            script_path,
            lang: "sin+tam+eng".to_string(),
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_lang(mut self, lang: String) -> Self {
        self.lang = lang;
        self
    }

    fn command(&self, image_path: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg(&self.script_path)
            .arg("--image")
            .arg(image_path)
            .arg("--lang")
            .arg(&self.lang);
        command
    }

    pub fn run(&self, image_path: &Path) -> Result<Vec<Detection>> {
        let output = self
            .command(image_path)
            .output()
            .with_context(|| format!("failed to invoke detector {}", self.script_path.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("detector failed: {stderr}");
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_detections(&stdout)
    }
}

pub fn parse_detections(json: &str) -> Result<Vec<Detection>> {
    serde_json::from_str(json).with_context(|| "failed to parse detector JSON output")
}

/// Detector labels outside the declared field set are an upstream defect
/// and fail the whole extraction with an `InputError` underneath.
pub fn detections_to_candidates(detections: Vec<Detection>) -> Result<Vec<FieldCandidate>> {
    detections
        .into_iter()
        .map(|detection| -> Result<FieldCandidate> {
            let field: FieldName = detection
                .field
                .parse()
                .with_context(|| "detector emitted an undeclared field")?;
            Ok(FieldCandidate::new(
                field,
                detection.text,
                Source::LocalModel,
                detection.confidence,
            ))
        })
        .collect()
}

impl ExtractionSource for DetectorBridge {
    fn source(&self) -> Source {
        Source::LocalModel
    }

    fn extract(&self, image: &Path) -> Result<Vec<FieldCandidate>> {
        detections_to_candidates(self.run(image)?)
    }
}
