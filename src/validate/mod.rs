pub mod cross;
pub mod rules;

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::config::FusionConfig;
use crate::core::model::{FieldName, NormalizedField, ValidatedField};

pub use cross::ValidatedFields;
pub use rules::{IdCheck, StructuralIdCheck};

/// Applies per-field rules, then cross-field rules once every field of the
/// document has been normalized. Pure: the reference date is fixed at
/// construction.
pub struct Validator {
    today: NaiveDate,
    max_age_years: u32,
    id_check: Box<dyn IdCheck>,
}

impl Validator {
    pub fn new(config: &FusionConfig, today: NaiveDate) -> Self {
        Self {
            today,
            max_age_years: config.max_age_years,
            id_check: Box::new(StructuralIdCheck),
        }
    }

    pub fn with_id_check(mut self, id_check: Box<dyn IdCheck>) -> Self {
        self.id_check = id_check;
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn validate(
        &self,
        fields: BTreeMap<FieldName, Vec<NormalizedField>>,
        reported_age: Option<u32>,
    ) -> ValidatedFields {
        let mut validated: ValidatedFields = FieldName::ALL
            .into_iter()
            .map(|name| (name, Vec::new()))
            .collect();

        for (name, candidates) in fields {
            let entry = validated.entry(name).or_default();
            for candidate in candidates {
                let mut field = ValidatedField::new(candidate);
                rules::check_field(&mut field, self.id_check.as_ref(), self.today, self.max_age_years);
                entry.push(field);
            }
        }

        cross::check_id_consistency(&mut validated, FieldName::DateOfBirth);
        cross::check_id_consistency(&mut validated, FieldName::Gender);
        if let Some(age) = reported_age {
            cross::check_reported_age(&mut validated, age, self.today);
        }
        cross::check_bilingual_pairs(&mut validated);
        cross::mark_missing(&mut validated);

        validated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{
        CanonicalValue, FieldCandidate, Origin, Source, Validity, Violation,
    };
    use crate::normalize::{derive_from_id, Normalizer};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn normalized(candidates: &[(FieldName, &str, Source, f32)]) -> BTreeMap<FieldName, Vec<NormalizedField>> {
        let normalizer = Normalizer::new(&FusionConfig::default());
        let mut fields: BTreeMap<FieldName, Vec<NormalizedField>> = BTreeMap::new();
        for (name, raw, source, confidence) in candidates {
            let field = normalizer.normalize(FieldCandidate::new(*name, *raw, *source, *confidence));
            for derived in derive_from_id(&field) {
                fields.entry(derived.field_name).or_default().push(derived);
            }
            fields.entry(*name).or_default().push(field);
        }
        fields
    }

    fn validate(
        candidates: &[(FieldName, &str, Source, f32)],
        reported_age: Option<u32>,
    ) -> ValidatedFields {
        Validator::new(&FusionConfig::default(), today()).validate(normalized(candidates), reported_age)
    }

    #[test]
    fn every_declared_field_is_present() {
        let validated = validate(&[], None);
        assert_eq!(validated.len(), FieldName::ALL.len());
        assert!(validated.values().all(Vec::is_empty));
    }

    #[test]
    fn gender_text_contradicting_id_is_flagged_on_both() {
        let validated = validate(
            &[
                (FieldName::NationalId, "987341234V", Source::LocalModel, 0.9),
                (FieldName::Gender, "Male", Source::LocalModel, 0.8),
            ],
            None,
        );
        let gender = &validated[&FieldName::Gender];
        assert_eq!(gender.len(), 2);
        for candidate in gender {
            assert_eq!(candidate.validity, Validity::Invalid, "{:?}", candidate.origin());
            assert!(candidate.violations.contains(&Violation::IdFieldMismatch));
        }
    }

    #[test]
    fn matching_birth_date_is_valid() {
        let validated = validate(
            &[
                (FieldName::NationalId, "982341234V", Source::LocalModel, 0.9),
                (FieldName::DateOfBirth, "21/08/1998", Source::RemoteService, 0.7),
            ],
            Some(28),
        );
        let dob = &validated[&FieldName::DateOfBirth];
        assert_eq!(dob.len(), 2);
        assert!(dob.iter().all(|c| c.validity == Validity::Valid), "{dob:?}");
    }

    #[test]
    fn derived_value_survives_when_one_explicit_read_agrees() {
        let validated = validate(
            &[
                (FieldName::NationalId, "982341234V", Source::LocalModel, 0.9),
                (FieldName::DateOfBirth, "21/08/1998", Source::LocalModel, 0.9),
                (FieldName::DateOfBirth, "27/08/1998", Source::RemoteService, 0.6),
            ],
            None,
        );
        for candidate in &validated[&FieldName::DateOfBirth] {
            let expected = if candidate.source() == Source::RemoteService {
                Validity::Invalid
            } else {
                Validity::Valid
            };
            assert_eq!(candidate.validity, expected, "{candidate:?}");
        }
    }

    #[test]
    fn reported_age_must_match() {
        let validated = validate(
            &[(FieldName::DateOfBirth, "1998-08-21", Source::LocalModel, 0.9)],
            Some(30),
        );
        let dob = &validated[&FieldName::DateOfBirth][0];
        assert_eq!(dob.validity, Validity::Invalid);
        assert!(dob.violations.contains(&Violation::AgeMismatch));
    }

    #[test]
    fn lone_half_of_pair_is_unverifiable() {
        let validated = validate(
            &[(FieldName::NameLocal, "සමන් පෙරේරා", Source::LocalModel, 0.8)],
            None,
        );
        let name = &validated[&FieldName::NameLocal][0];
        assert_eq!(name.validity, Validity::Unverifiable);
        assert!(name.violations.contains(&Violation::PairIncomplete));
    }

    #[test]
    fn wrong_script_is_invalid() {
        let validated = validate(
            &[
                (FieldName::NameLocal, "Saman Perera", Source::LocalModel, 0.8),
                (FieldName::NameEnglish, "සමන් පෙරේරා", Source::RemoteService, 0.8),
            ],
            None,
        );
        for name in [FieldName::NameLocal, FieldName::NameEnglish] {
            let candidate = &validated[&name][0];
            assert_eq!(candidate.validity, Validity::Invalid);
            assert!(candidate.violations.contains(&Violation::ScriptMismatch));
        }
    }

    #[test]
    fn unusable_only_candidates_are_missing() {
        let validated = validate(
            &[(FieldName::BloodGroup, "??", Source::RemoteService, 0.3)],
            None,
        );
        let candidate = &validated[&FieldName::BloodGroup][0];
        assert_eq!(candidate.validity, Validity::Unverifiable);
        assert!(candidate.violations.contains(&Violation::Missing));
        assert!(candidate.violations.contains(&Violation::Malformed));
    }

    #[test]
    fn values_derived_from_a_rejected_id_are_unverifiable() {
        // Modern format, born 2027-12-15: after the reference date.
        let validated = validate(
            &[(FieldName::NationalId, "202735001234", Source::LocalModel, 0.9)],
            None,
        );
        let id = &validated[&FieldName::NationalId][0];
        assert_eq!(id.validity, Validity::Invalid);
        assert!(id.violations.contains(&Violation::FutureDate));

        let gender = &validated[&FieldName::Gender];
        assert_eq!(gender.len(), 1);
        assert_eq!(gender[0].origin(), Origin::DerivedFromId);
        assert_eq!(gender[0].validity, Validity::Unverifiable);
    }

    #[test]
    fn id_derived_values_keep_their_origin() {
        let validated = validate(
            &[(FieldName::NationalId, "982341234V", Source::RemoteService, 0.85)],
            None,
        );
        let gender = &validated[&FieldName::Gender];
        assert_eq!(gender.len(), 1);
        assert_eq!(gender[0].origin(), Origin::DerivedFromId);
        assert_eq!(gender[0].validity, Validity::Valid);
        assert!(matches!(gender[0].value(), Some(CanonicalValue::Gender(_))));
    }
}
