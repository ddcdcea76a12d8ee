use std::fs;
use std::path::PathBuf;

use anyhow::Result;

use crate::core::model::PatientRecord;
use crate::export::Exporter;

/// Writes `record.json`: the flat field → value mapping, status, confidence
/// and per-field audit trail.
#[derive(Debug, Clone)]
pub struct JsonExporter {
    out_dir: PathBuf,
}

impl JsonExporter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }
}

impl Exporter for JsonExporter {
    fn export(&self, record: &PatientRecord) -> Result<()> {
        fs::create_dir_all(&self.out_dir)?;
        let path = self.out_dir.join("record.json");
        let data = serde_json::to_string_pretty(&record.summary())?;
        fs::write(path, data)?;
        Ok(())
    }
}
