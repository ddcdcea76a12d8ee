use std::collections::BTreeMap;

use crate::config::FusionConfig;
use crate::core::confidence::weighted_confidence;
use crate::core::model::{Agreement, FieldName, FusedField, RecordStatus, Validity};

pub fn overall_confidence(fields: &BTreeMap<FieldName, FusedField>, config: &FusionConfig) -> f32 {
    weighted_confidence(
        fields
            .iter()
            .map(|(name, field)| (config.weight(*name), field.fused_confidence)),
    )
}

/// First match wins: an unidentifiable patient is rejected, any doubt about
/// the other fields makes the record partial.
pub fn classify_record(
    fields: &BTreeMap<FieldName, FusedField>,
    overall_confidence: f32,
    config: &FusionConfig,
) -> RecordStatus {
    let identity_lost = fields
        .get(&FieldName::NationalId)
        .map(|id| id.agreement == Agreement::NoSource || id.validity == Validity::Invalid)
        .unwrap_or(true);
    if identity_lost {
        return RecordStatus::Rejected;
    }

    let doubtful = fields.values().any(|field| is_doubtful(field, config));
    if doubtful || overall_confidence < config.accept_threshold {
        RecordStatus::Partial
    } else {
        RecordStatus::Accepted
    }
}

fn is_doubtful(field: &FusedField, config: &FusionConfig) -> bool {
    match field.agreement {
        Agreement::NoSource => !config.is_optional(field.field_name),
        Agreement::SourcesDisagree => true,
        Agreement::BothAgree | Agreement::SingleSource => field.validity != Validity::Valid,
    }
}
