pub mod date;
pub mod gazetteer;
pub mod text;
pub mod tokens;

use crate::config::FusionConfig;
use crate::core::model::{CanonicalValue, FieldCandidate, FieldName, NormalizedField, Origin};
use crate::core::nic::NationalId;

/// Turns raw candidate text into typed values. Never fails: unparseable
/// text yields `canonical_value = None` and keeps the raw text for audit.
#[derive(Debug, Clone)]
pub struct Normalizer {
    district_similarity: f64,
}

impl Normalizer {
    pub fn new(config: &FusionConfig) -> Self {
        Self {
            district_similarity: config.district_similarity,
        }
    }

    pub fn normalize(&self, candidate: FieldCandidate) -> NormalizedField {
        let canonical_value = self.canonicalize(candidate.field_name, &candidate.raw_value);
        NormalizedField {
            field_name: candidate.field_name,
            canonical_value,
            raw_value: candidate.raw_value,
            source: candidate.source,
            source_confidence: candidate.source_confidence,
            origin: Origin::Extracted,
        }
    }

    fn canonicalize(&self, field: FieldName, raw: &str) -> Option<CanonicalValue> {
        match field {
            FieldName::NationalId => NationalId::parse(raw).map(CanonicalValue::NationalId),
            FieldName::DateOfBirth => date::parse_date(raw).map(CanonicalValue::Date),
            FieldName::Gender => tokens::parse_gender(raw).map(CanonicalValue::Gender),
            FieldName::BloodGroup => tokens::parse_blood_group(raw).map(CanonicalValue::BloodGroup),
            FieldName::District => gazetteer::match_district(raw, self.district_similarity)
                .map(|name| CanonicalValue::District(name.to_string())),
            FieldName::NameLocal
            | FieldName::NameEnglish
            | FieldName::AddressLocal
            | FieldName::AddressEnglish => text::normalize_text(raw).map(CanonicalValue::Text),
        }
    }
}

/// Date of birth and gender decoded from a normalized national ID, as
/// candidates of the source that read the ID, at that read's confidence.
pub fn derive_from_id(id_field: &NormalizedField) -> Vec<NormalizedField> {
    let Some(id) = id_field
        .canonical_value
        .as_ref()
        .and_then(CanonicalValue::as_national_id)
    else {
        return Vec::new();
    };

    let derived = |field_name, value| NormalizedField {
        field_name,
        canonical_value: Some(value),
        raw_value: id.number().to_string(),
        source: id_field.source,
        source_confidence: id_field.source_confidence,
        origin: Origin::DerivedFromId,
    };

    let mut fields = Vec::with_capacity(2);
    if let Some(birth) = id.birth_date() {
        fields.push(derived(FieldName::DateOfBirth, CanonicalValue::Date(birth)));
    }
    if let Some(gender) = id.gender() {
        fields.push(derived(FieldName::Gender, CanonicalValue::Gender(gender)));
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{Gender, Source};
    use chrono::NaiveDate;

    fn normalizer() -> Normalizer {
        Normalizer::new(&FusionConfig::default())
    }

    #[test]
    fn normalizes_national_id() {
        let field = normalizer().normalize(FieldCandidate::new(
            FieldName::NationalId,
            "98234 1234v",
            Source::LocalModel,
            0.9,
        ));
        let id = field.canonical_value.as_ref().and_then(CanonicalValue::as_national_id);
        assert_eq!(id.map(NationalId::number), Some("982341234V"));
        assert_eq!(field.raw_value, "98234 1234v");
        assert_eq!(field.origin, Origin::Extracted);
    }

    #[test]
    fn malformed_input_yields_none() {
        let n = normalizer();
        for (field, raw) in [
            (FieldName::NationalId, "98-234"),
            (FieldName::DateOfBirth, "yesterday"),
            (FieldName::BloodGroup, "Z"),
            (FieldName::District, "Atlantis"),
            (FieldName::NameEnglish, "   "),
        ] {
            let normalized = n.normalize(FieldCandidate::new(field, raw, Source::RemoteService, 0.5));
            assert_eq!(normalized.canonical_value, None, "{field} {raw:?}");
            assert_eq!(normalized.raw_value, raw);
        }
    }

    #[test]
    fn district_keeps_gazetteer_spelling() {
        let field = normalizer().normalize(FieldCandidate::new(
            FieldName::District,
            "colombo",
            Source::RemoteService,
            0.7,
        ));
        assert_eq!(
            field.canonical_value,
            Some(CanonicalValue::District("Colombo".to_string()))
        );
    }

    #[test]
    fn derives_birth_date_and_gender_from_id() {
        let id_field = normalizer().normalize(FieldCandidate::new(
            FieldName::NationalId,
            "987341234V",
            Source::RemoteService,
            0.85,
        ));
        let derived = derive_from_id(&id_field);
        assert_eq!(derived.len(), 2);
        assert!(derived.iter().all(|f| f.origin == Origin::DerivedFromId));
        assert!(derived.iter().all(|f| f.source == Source::RemoteService));
        assert!(derived.iter().all(|f| f.source_confidence == 0.85));
        assert_eq!(
            derived[0].canonical_value,
            NaiveDate::from_ymd_opt(1998, 8, 21).map(CanonicalValue::Date)
        );
        assert_eq!(derived[1].canonical_value, Some(CanonicalValue::Gender(Gender::Female)));
    }

    #[test]
    fn malformed_id_derives_nothing() {
        let id_field = normalizer().normalize(FieldCandidate::new(
            FieldName::NationalId,
            "not an id",
            Source::LocalModel,
            0.4,
        ));
        assert!(derive_from_id(&id_field).is_empty());
    }
}
