use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::core::model::{
    CanonicalValue, FieldName, Origin, Source, ValidatedField, Validity, Violation,
};
use crate::normalize::date::age_in_years;
use crate::normalize::text::has_local_script;

pub type ValidatedFields = BTreeMap<FieldName, Vec<ValidatedField>>;

const BILINGUAL_PAIRS: [(FieldName, FieldName); 2] = [
    (FieldName::NameLocal, FieldName::NameEnglish),
    (FieldName::AddressLocal, FieldName::AddressEnglish),
];

fn has_value(fields: &ValidatedFields, name: FieldName) -> bool {
    fields
        .get(&name)
        .map(|candidates| candidates.iter().any(|c| c.value().is_some()))
        .unwrap_or(false)
}

/// ID numbers that passed their own check, with the source that read them.
fn valid_ids(fields: &ValidatedFields) -> Vec<(Source, String)> {
    fields
        .get(&FieldName::NationalId)
        .into_iter()
        .flatten()
        .filter(|candidate| candidate.validity == Validity::Valid)
        .filter_map(|candidate| {
            candidate
                .value()
                .and_then(CanonicalValue::as_national_id)
                .map(|id| (candidate.source(), id.number().to_string()))
        })
        .collect()
}

/// Explicit and ID-derived values of `field` must agree. A disagreeing
/// explicit value is flagged, and so is every derived value that no
/// explicit value supports.
pub fn check_id_consistency(fields: &mut ValidatedFields, field: FieldName) {
    let parents = valid_ids(fields);
    let Some(candidates) = fields.get_mut(&field) else {
        return;
    };

    let has_valid_parent = |candidate: &ValidatedField| {
        parents
            .iter()
            .any(|(source, number)| *source == candidate.source() && *number == candidate.field.raw_value)
    };

    for candidate in candidates.iter_mut() {
        if candidate.origin() == Origin::DerivedFromId && !has_valid_parent(&*candidate) {
            candidate.validity = candidate.validity.max(Validity::Unverifiable);
        }
    }

    let derived: Vec<CanonicalValue> = candidates
        .iter()
        .filter(|c| c.origin() == Origin::DerivedFromId && has_valid_parent(c))
        .filter_map(|c| c.value().cloned())
        .collect();
    let explicit: Vec<CanonicalValue> = candidates
        .iter()
        .filter(|c| c.origin() == Origin::Extracted)
        .filter_map(|c| c.value().cloned())
        .collect();
    if derived.is_empty() || explicit.is_empty() {
        return;
    }

    for candidate in candidates.iter_mut() {
        let Some(value) = candidate.value() else {
            continue;
        };
        let mismatched = match candidate.origin() {
            Origin::Extracted => !derived.contains(value),
            Origin::DerivedFromId => !explicit.contains(value),
        };
        if mismatched {
            candidate.flag(Validity::Invalid, Violation::IdFieldMismatch);
        }
    }
}

pub fn check_reported_age(fields: &mut ValidatedFields, reported_age: u32, today: NaiveDate) {
    let Some(candidates) = fields.get_mut(&FieldName::DateOfBirth) else {
        return;
    };
    for candidate in candidates.iter_mut() {
        let Some(birth) = candidate.value().and_then(CanonicalValue::as_date) else {
            continue;
        };
        if age_in_years(birth, today) != Some(reported_age) {
            candidate.flag(Validity::Invalid, Violation::AgeMismatch);
        }
    }
}

/// Script plausibility on each side of a name/address pair, and the
/// non-empty-together rule across the pair.
pub fn check_bilingual_pairs(fields: &mut ValidatedFields) {
    for (local, english) in BILINGUAL_PAIRS {
        for name in [local, english] {
            let Some(candidates) = fields.get_mut(&name) else {
                continue;
            };
            for candidate in candidates.iter_mut() {
                let Some(text) = candidate.value().and_then(CanonicalValue::as_text) else {
                    continue;
                };
                if has_local_script(text) != name.is_local_script() {
                    candidate.flag(Validity::Invalid, Violation::ScriptMismatch);
                }
            }
        }

        let local_present = has_value(fields, local);
        let english_present = has_value(fields, english);
        let lonely = match (local_present, english_present) {
            (true, false) => local,
            (false, true) => english,
            _ => continue,
        };
        if let Some(candidates) = fields.get_mut(&lonely) {
            for candidate in candidates.iter_mut().filter(|c| c.value().is_some()) {
                candidate.flag(Validity::Unverifiable, Violation::PairIncomplete);
            }
        }
    }
}

/// Fields where no source produced a usable value.
pub fn mark_missing(fields: &mut ValidatedFields) {
    for candidates in fields.values_mut() {
        if candidates.iter().all(|c| c.value().is_none()) {
            for candidate in candidates.iter_mut() {
                candidate.flag(Validity::Unverifiable, Violation::Missing);
            }
        }
    }
}
