use chrono::NaiveDate;

use crate::core::model::{CanonicalValue, FieldName, ValidatedField, Validity, Violation};
use crate::core::nic::{IdFormat, NationalId};
use crate::normalize::date::age_in_years;

/// Format check applied to every national ID candidate.
pub trait IdCheck: Send + Sync {
    fn check(&self, id: &NationalId, today: NaiveDate) -> Result<(), Violation>;
}

/// Checks what the number layout itself guarantees: an in-range day code
/// naming a real calendar day, a plausible birth year, no future birth.
/// No check-digit arithmetic is applied.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralIdCheck;

impl IdCheck for StructuralIdCheck {
    fn check(&self, id: &NationalId, today: NaiveDate) -> Result<(), Violation> {
        if id.format() == IdFormat::Modern && id.birth_year() < 1900 {
            return Err(Violation::ChecksumFailed);
        }
        let birth = id.birth_date().ok_or(Violation::ChecksumFailed)?;
        if birth > today {
            return Err(Violation::FutureDate);
        }
        Ok(())
    }
}

/// Single-field rules. Cross-field rules run afterwards in `cross`.
pub fn check_field(
    field: &mut ValidatedField,
    id_check: &dyn IdCheck,
    today: NaiveDate,
    max_age_years: u32,
) {
    let Some(value) = field.value().cloned() else {
        field.flag(Validity::Unverifiable, Violation::Malformed);
        return;
    };

    match (field.field_name(), &value) {
        (FieldName::NationalId, CanonicalValue::NationalId(id)) => {
            if let Err(violation) = id_check.check(id, today) {
                field.flag(Validity::Invalid, violation);
            }
        }
        (FieldName::DateOfBirth, CanonicalValue::Date(birth)) => match age_in_years(*birth, today) {
            None => field.flag(Validity::Invalid, Violation::FutureDate),
            Some(age) if age > max_age_years => field.flag(Validity::Invalid, Violation::OutOfRange),
            Some(_) => {}
        },
        (FieldName::BloodGroup, CanonicalValue::BloodGroup(_))
        | (FieldName::Gender, CanonicalValue::Gender(_))
        | (FieldName::District, CanonicalValue::District(_)) => {}
        (
            FieldName::NameLocal
            | FieldName::NameEnglish
            | FieldName::AddressLocal
            | FieldName::AddressEnglish,
            CanonicalValue::Text(_),
        ) => {}
        _ => field.flag(Validity::Invalid, Violation::Malformed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{BloodGroup, NormalizedField, Origin, Source};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn validated(field_name: FieldName, value: Option<CanonicalValue>) -> ValidatedField {
        ValidatedField::new(NormalizedField {
            field_name,
            canonical_value: value,
            raw_value: String::new(),
            source: Source::LocalModel,
            source_confidence: 0.9,
            origin: Origin::Extracted,
        })
    }

    fn id_field(raw: &str) -> ValidatedField {
        validated(
            FieldName::NationalId,
            NationalId::parse(raw).map(CanonicalValue::NationalId),
        )
    }

    fn run(mut field: ValidatedField) -> ValidatedField {
        check_field(&mut field, &StructuralIdCheck, today(), 150);
        field
    }

    #[test]
    fn well_formed_ids_are_valid() {
        for raw in ["982341234V", "987341234X", "199823401234", "200006001234"] {
            let field = run(id_field(raw));
            assert_eq!(field.validity, Validity::Valid, "{raw}");
        }
    }

    #[test]
    fn out_of_range_day_code_fails_check() {
        for raw in ["989001234V", "984001234V", "985001234V", "980001234V", "980601234V"] {
            let field = run(id_field(raw));
            assert_eq!(field.validity, Validity::Invalid, "{raw}");
            assert!(field.violations.contains(&Violation::ChecksumFailed));
        }
    }

    #[test]
    fn future_birth_in_id_is_invalid() {
        let field = run(id_field("209903401234"));
        assert_eq!(field.validity, Validity::Invalid);
        assert!(field.violations.contains(&Violation::FutureDate));
    }

    #[test]
    fn date_of_birth_rules() {
        let future = run(validated(
            FieldName::DateOfBirth,
            NaiveDate::from_ymd_opt(2030, 1, 1).map(CanonicalValue::Date),
        ));
        assert!(future.violations.contains(&Violation::FutureDate));

        let ancient = run(validated(
            FieldName::DateOfBirth,
            NaiveDate::from_ymd_opt(1801, 1, 1).map(CanonicalValue::Date),
        ));
        assert!(ancient.violations.contains(&Violation::OutOfRange));

        let ok = run(validated(
            FieldName::DateOfBirth,
            NaiveDate::from_ymd_opt(1998, 8, 21).map(CanonicalValue::Date),
        ));
        assert_eq!(ok.validity, Validity::Valid);
    }

    #[test]
    fn missing_value_is_unverifiable() {
        let field = run(validated(FieldName::BloodGroup, None));
        assert_eq!(field.validity, Validity::Unverifiable);
        assert!(field.violations.contains(&Violation::Malformed));
    }

    #[test]
    fn wrong_value_kind_is_malformed() {
        let field = run(validated(
            FieldName::Gender,
            Some(CanonicalValue::BloodGroup(BloodGroup::APositive)),
        ));
        assert_eq!(field.validity, Validity::Invalid);
    }
}
