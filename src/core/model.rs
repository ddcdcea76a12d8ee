use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::nic::NationalId;
use crate::error::InputError;

/// Closed set of identity fields read from a national ID card.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    NationalId,
    NameLocal,
    NameEnglish,
    AddressLocal,
    AddressEnglish,
    DateOfBirth,
    Gender,
    BloodGroup,
    District,
}

impl FieldName {
    pub const ALL: [FieldName; 9] = [
        FieldName::NationalId,
        FieldName::NameLocal,
        FieldName::NameEnglish,
        FieldName::AddressLocal,
        FieldName::AddressEnglish,
        FieldName::DateOfBirth,
        FieldName::Gender,
        FieldName::BloodGroup,
        FieldName::District,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldName::NationalId => "national_id",
            FieldName::NameLocal => "name_local",
            FieldName::NameEnglish => "name_english",
            FieldName::AddressLocal => "address_local",
            FieldName::AddressEnglish => "address_english",
            FieldName::DateOfBirth => "date_of_birth",
            FieldName::Gender => "gender",
            FieldName::BloodGroup => "blood_group",
            FieldName::District => "district",
        }
    }

    /// Local-script / English counterpart of a bilingual field.
    pub fn pair(&self) -> Option<FieldName> {
        match self {
            FieldName::NameLocal => Some(FieldName::NameEnglish),
            FieldName::NameEnglish => Some(FieldName::NameLocal),
            FieldName::AddressLocal => Some(FieldName::AddressEnglish),
            FieldName::AddressEnglish => Some(FieldName::AddressLocal),
            _ => None,
        }
    }

    pub fn is_local_script(&self) -> bool {
        matches!(self, FieldName::NameLocal | FieldName::AddressLocal)
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldName {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldName::ALL
            .into_iter()
            .find(|field| field.as_str() == s.trim())
            .ok_or_else(|| InputError::UnknownField(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Source {
    LocalModel,
    RemoteService,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::LocalModel => f.write_str("LOCAL_MODEL"),
            Source::RemoteService => f.write_str("REMOTE_SERVICE"),
        }
    }
}

/// One source's proposed value for one field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldCandidate {
    pub field_name: FieldName,
    pub raw_value: String,
    pub source: Source,
    pub source_confidence: f32,
}

impl FieldCandidate {
    pub fn new(
        field_name: FieldName,
        raw_value: impl Into<String>,
        source: Source,
        source_confidence: f32,
    ) -> Self {
        Self {
            field_name,
            raw_value: raw_value.into(),
            source,
            source_confidence,
        }
    }
}

/// Candidate as it arrives on the wire, before the field name is checked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCandidate {
    pub field_name: String,
    #[serde(default)]
    pub raw_value: String,
    pub source: Source,
    #[serde(default)]
    pub source_confidence: f32,
}

impl TryFrom<RawCandidate> for FieldCandidate {
    type Error = InputError;

    fn try_from(raw: RawCandidate) -> Result<Self, Self::Error> {
        let field_name = raw.field_name.parse()?;
        Ok(FieldCandidate {
            field_name,
            raw_value: raw.raw_value,
            source: raw.source,
            source_confidence: raw.source_confidence,
        })
    }
}

/// All candidates collected for one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentCandidates {
    pub document_id: String,
    #[serde(default)]
    pub candidates: Vec<RawCandidate>,
    /// Age stated outside the card, e.g. by the patient at intake.
    #[serde(default)]
    pub reported_age: Option<u32>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Origin {
    Extracted,
    DerivedFromId,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Gender {
    Male,
    Female,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => f.write_str("Male"),
            Gender::Female => f.write_str("Female"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum BloodGroup {
    #[serde(rename = "A+")]
    APositive,
    #[serde(rename = "A-")]
    ANegative,
    #[serde(rename = "B+")]
    BPositive,
    #[serde(rename = "B-")]
    BNegative,
    #[serde(rename = "AB+")]
    AbPositive,
    #[serde(rename = "AB-")]
    AbNegative,
    #[serde(rename = "O+")]
    OPositive,
    #[serde(rename = "O-")]
    ONegative,
}

impl BloodGroup {
    pub const ALL: [BloodGroup; 8] = [
        BloodGroup::APositive,
        BloodGroup::ANegative,
        BloodGroup::BPositive,
        BloodGroup::BNegative,
        BloodGroup::AbPositive,
        BloodGroup::AbNegative,
        BloodGroup::OPositive,
        BloodGroup::ONegative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BloodGroup::APositive => "A+",
            BloodGroup::ANegative => "A-",
            BloodGroup::BPositive => "B+",
            BloodGroup::BNegative => "B-",
            BloodGroup::AbPositive => "AB+",
            BloodGroup::AbNegative => "AB-",
            BloodGroup::OPositive => "O+",
            BloodGroup::ONegative => "O-",
        }
    }
}

impl fmt::Display for BloodGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed, normalized value of a field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CanonicalValue {
    NationalId(NationalId),
    Date(NaiveDate),
    Gender(Gender),
    BloodGroup(BloodGroup),
    District(String),
    Text(String),
}

impl CanonicalValue {
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            CanonicalValue::Date(date) => Some(*date),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CanonicalValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_national_id(&self) -> Option<&NationalId> {
        match self {
            CanonicalValue::NationalId(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for CanonicalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CanonicalValue::NationalId(id) => f.write_str(id.number()),
            CanonicalValue::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            CanonicalValue::Gender(gender) => write!(f, "{gender}"),
            CanonicalValue::BloodGroup(group) => write!(f, "{group}"),
            CanonicalValue::District(name) | CanonicalValue::Text(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalizedField {
    pub field_name: FieldName,
    pub canonical_value: Option<CanonicalValue>,
    pub raw_value: String,
    pub source: Source,
    pub source_confidence: f32,
    pub origin: Origin,
}

/// Ordered from most to least trusted; `max` gives the worse of two.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Validity {
    Valid,
    Unverifiable,
    Invalid,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Violation {
    Missing,
    Malformed,
    ChecksumFailed,
    FutureDate,
    OutOfRange,
    IdFieldMismatch,
    AgeMismatch,
    PairIncomplete,
    ScriptMismatch,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidatedField {
    #[serde(flatten)]
    pub field: NormalizedField,
    pub validity: Validity,
    pub violations: BTreeSet<Violation>,
}

impl ValidatedField {
    pub fn new(field: NormalizedField) -> Self {
        Self {
            field,
            validity: Validity::Valid,
            violations: BTreeSet::new(),
        }
    }

    pub fn field_name(&self) -> FieldName {
        self.field.field_name
    }

    pub fn value(&self) -> Option<&CanonicalValue> {
        self.field.canonical_value.as_ref()
    }

    pub fn source(&self) -> Source {
        self.field.source
    }

    pub fn confidence(&self) -> f32 {
        self.field.source_confidence
    }

    pub fn origin(&self) -> Origin {
        self.field.origin
    }

    /// Records a violation, keeping the worse of the current and given validity.
    pub fn flag(&mut self, validity: Validity, violation: Violation) {
        self.validity = self.validity.max(validity);
        self.violations.insert(violation);
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Agreement {
    BothAgree,
    SourcesDisagree,
    SingleSource,
    NoSource,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FusedField {
    pub field_name: FieldName,
    pub chosen_value: Option<CanonicalValue>,
    pub chosen_source: Option<Source>,
    pub agreement: Agreement,
    pub fused_confidence: f32,
    pub validity: Validity,
    pub violations: BTreeSet<Violation>,
    pub candidates: Vec<ValidatedField>,
}

impl FusedField {
    pub fn no_source(field_name: FieldName, candidates: Vec<ValidatedField>) -> Self {
        let mut violations: BTreeSet<Violation> = candidates
            .iter()
            .flat_map(|candidate| candidate.violations.iter().copied())
            .collect();
        violations.insert(Violation::Missing);
        Self {
            field_name,
            chosen_value: None,
            chosen_source: None,
            agreement: Agreement::NoSource,
            fused_confidence: 0.0,
            validity: Validity::Unverifiable,
            violations,
            candidates,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordStatus {
    Accepted,
    Partial,
    Rejected,
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordStatus::Accepted => f.write_str("ACCEPTED"),
            RecordStatus::Partial => f.write_str("PARTIAL"),
            RecordStatus::Rejected => f.write_str("REJECTED"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientRecord {
    pub document_id: String,
    pub fields: BTreeMap<FieldName, FusedField>,
    pub overall_status: RecordStatus,
    pub overall_confidence: f32,
    /// Whole years at the reference date, from the chosen date of birth.
    pub age: Option<u32>,
}

impl PatientRecord {
    pub fn field(&self, name: FieldName) -> Option<&FusedField> {
        self.fields.get(&name)
    }

    pub fn value(&self, name: FieldName) -> Option<&CanonicalValue> {
        self.fields
            .get(&name)
            .and_then(|field| field.chosen_value.as_ref())
    }

    pub fn summary(&self) -> RecordSummary {
        let values = self
            .fields
            .iter()
            .map(|(name, field)| {
                (
                    name.as_str().to_string(),
                    field.chosen_value.as_ref().map(ToString::to_string),
                )
            })
            .collect();
        let audit = self
            .fields
            .iter()
            .map(|(name, field)| {
                (
                    name.as_str().to_string(),
                    FieldAudit {
                        agreement: field.agreement,
                        chosen_source: field.chosen_source,
                        fused_confidence: field.fused_confidence,
                        validity: field.validity,
                        violations: field.violations.clone(),
                        candidates: field.candidates.clone(),
                    },
                )
            })
            .collect();
        RecordSummary {
            document_id: self.document_id.clone(),
            values,
            age: self.age,
            overall_status: self.overall_status,
            overall_confidence: self.overall_confidence,
            audit,
        }
    }
}

/// Flat field → value view of a record with the per-field audit trail.
#[derive(Debug, Clone, Serialize)]
pub struct RecordSummary {
    pub document_id: String,
    #[serde(flatten)]
    pub values: BTreeMap<String, Option<String>>,
    pub age: Option<u32>,
    pub overall_status: RecordStatus,
    pub overall_confidence: f32,
    pub audit: BTreeMap<String, FieldAudit>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldAudit {
    pub agreement: Agreement,
    pub chosen_source: Option<Source>,
    pub fused_confidence: f32,
    pub validity: Validity,
    pub violations: BTreeSet<Violation>,
    pub candidates: Vec<ValidatedField>,
}
