use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::config::FusionConfig;
use crate::core::confidence::is_valid_confidence;
use crate::core::model::{
    CanonicalValue, DocumentCandidates, FieldCandidate, FieldName, FusedField, NormalizedField,
    PatientRecord, Validity,
};
use crate::error::InputError;
use crate::fusion::finalize::{classify_record, overall_confidence};
use crate::fusion::{FusionEngine, SimpleFusionEngine};
use crate::normalize::date::age_in_years;
use crate::normalize::{derive_from_id, Normalizer};
use crate::validate::{IdCheck, Validator};

/// Runs normalization, validation and fusion over one document's candidates
/// and folds the result into a [`PatientRecord`].
///
/// Holds no per-document state; concurrent calls on a shared assembler are
/// independent.
pub struct RecordAssembler {
    config: FusionConfig,
    normalizer: Normalizer,
    validator: Validator,
    engine: SimpleFusionEngine,
}

impl RecordAssembler {
    /// `today` is the reference date for future-date and age rules.
    pub fn new(config: FusionConfig, today: NaiveDate) -> Self {
        Self {
            normalizer: Normalizer::new(&config),
            validator: Validator::new(&config, today),
            engine: SimpleFusionEngine::new(&config),
            config,
        }
    }

    pub fn with_id_check(mut self, id_check: Box<dyn IdCheck>) -> Self {
        self.validator = self.validator.with_id_check(id_check);
        self
    }

    pub fn assemble(
        &self,
        document_id: &str,
        candidates: Vec<FieldCandidate>,
    ) -> Result<PatientRecord, InputError> {
        self.assemble_with_age(document_id, candidates, None)
    }

    pub fn assemble_document(&self, document: DocumentCandidates) -> Result<PatientRecord, InputError> {
        let candidates = document
            .candidates
            .into_iter()
            .map(FieldCandidate::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        self.assemble_with_age(&document.document_id, candidates, document.reported_age)
    }

    pub fn assemble_with_age(
        &self,
        document_id: &str,
        candidates: Vec<FieldCandidate>,
        reported_age: Option<u32>,
    ) -> Result<PatientRecord, InputError> {
        for candidate in &candidates {
            if !is_valid_confidence(candidate.source_confidence) {
                return Err(InputError::InvalidConfidence {
                    field: candidate.field_name,
                    provider: candidate.source,
                    confidence: candidate.source_confidence,
                });
            }
        }

        let mut normalized: BTreeMap<FieldName, Vec<NormalizedField>> = BTreeMap::new();
        for candidate in candidates {
            let field = self.normalizer.normalize(candidate);
            for derived in derive_from_id(&field) {
                normalized.entry(derived.field_name).or_default().push(derived);
            }
            normalized.entry(field.field_name).or_default().push(field);
        }

        let validated = self.validator.validate(normalized, reported_age);

        let fields: BTreeMap<FieldName, FusedField> = validated
            .into_iter()
            .map(|(name, candidates)| {
                let fused = self.engine.fuse(name, candidates);
                debug!(
                    document_id,
                    field = %name,
                    agreement = ?fused.agreement,
                    validity = ?fused.validity,
                    confidence = fused.fused_confidence,
                    "fused field"
                );
                (name, fused)
            })
            .collect();

        let overall_confidence = overall_confidence(&fields, &self.config);
        let overall_status = classify_record(&fields, overall_confidence, &self.config);
        let age = chosen_age(&fields, self.validator.today());

        info!(
            document_id,
            status = %overall_status,
            confidence = overall_confidence,
            "assembled patient record"
        );

        Ok(PatientRecord {
            document_id: document_id.to_string(),
            fields,
            overall_status,
            overall_confidence,
            age,
        })
    }
}

fn chosen_age(fields: &BTreeMap<FieldName, FusedField>, today: NaiveDate) -> Option<u32> {
    let dob = fields.get(&FieldName::DateOfBirth)?;
    if dob.validity == Validity::Invalid {
        return None;
    }
    let birth = dob.chosen_value.as_ref().and_then(CanonicalValue::as_date)?;
    age_in_years(birth, today)
}
