use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

use anyhow::Result;

use crate::core::model::{FusedField, PatientRecord};
use crate::export::Exporter;

/// Writes `record.txt`, a summary for the person at the intake desk.
#[derive(Debug, Clone)]
pub struct TextExporter {
    out_dir: PathBuf,
}

impl TextExporter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }

    fn format_field(field: &FusedField) -> String {
        let value = field
            .chosen_value
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "-".to_string());
        let mut line = format!(
            "{:<16} {:<32} {:?} {:.2}",
            field.field_name.as_str(),
            value,
            field.agreement,
            field.fused_confidence
        );
        if !field.violations.is_empty() {
            let codes = field
                .violations
                .iter()
                .map(|v| format!("{v:?}"))
                .collect::<Vec<_>>()
                .join(", ");
            line.push_str(&format!(" [{codes}]"));
        }
        line
    }

    pub fn render(record: &PatientRecord) -> String {
        let mut text = String::new();
        let _ = writeln!(text, "=== Document {} ===", record.document_id);
        let _ = writeln!(
            text,
            "Status: {}  Confidence: {:.2}",
            record.overall_status, record.overall_confidence
        );
        if let Some(age) = record.age {
            let _ = writeln!(text, "Age: {age}");
        }
        text.push('\n');
        for field in record.fields.values() {
            text.push_str(&Self::format_field(field));
            text.push('\n');
        }
        text
    }
}

impl Exporter for TextExporter {
    fn export(&self, record: &PatientRecord) -> Result<()> {
        fs::create_dir_all(&self.out_dir)?;
        fs::write(self.out_dir.join("record.txt"), Self::render(record))?;
        Ok(())
    }
}
