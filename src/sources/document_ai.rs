//! Saved responses of the remote document-understanding service.
//!
//! Entities are mapped to fields by keywords in their type; form fields by
//! keywords in their label. Names and addresses go to the local or English
//! variant by the script of the value.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::core::model::{FieldCandidate, FieldName, Source};
use crate::normalize::text::has_local_script;
use crate::sources::ExtractionSource;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub pages: Vec<Page>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default)]
    pub mention_text: String,
    #[serde(default)]
    pub confidence: f32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    #[serde(default)]
    pub form_fields: Vec<FormField>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    pub field_name: Layout,
    pub field_value: Layout,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    #[serde(default)]
    pub text_anchor: Option<TextAnchor>,
    #[serde(default)]
    pub confidence: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextAnchor {
    #[serde(default)]
    pub content: String,
}

impl Layout {
    fn text(&self) -> &str {
        self.text_anchor
            .as_ref()
            .map(|anchor| anchor.content.trim())
            .unwrap_or_default()
    }
}

/// Reads the service's JSON response stored next to the image.
#[derive(Debug, Clone)]
pub struct DocumentAiResponse {
    response_path: PathBuf,
}

impl DocumentAiResponse {
    pub fn new(response_path: PathBuf) -> Self {
        Self { response_path }
    }
}

impl ExtractionSource for DocumentAiResponse {
    fn source(&self) -> Source {
        Source::RemoteService
    }

    fn extract(&self, _image: &Path) -> Result<Vec<FieldCandidate>> {
        let json = fs::read_to_string(&self.response_path).with_context(|| {
            format!("failed to read service response {}", self.response_path.display())
        })?;
        candidates_from_response(&json)
    }
}

pub fn candidates_from_response(json: &str) -> Result<Vec<FieldCandidate>> {
    let document: Document =
        serde_json::from_str(json).with_context(|| "failed to parse service response JSON")?;

    let mut candidates: Vec<FieldCandidate> = document
        .entities
        .iter()
        .filter_map(|entity| {
            let text = entity.mention_text.trim();
            classify_label(&entity.type_, text).map(|field| {
                FieldCandidate::new(field, text, Source::RemoteService, entity.confidence)
            })
        })
        .collect();

    for form_field in document.pages.iter().flat_map(|page| page.form_fields.iter()) {
        let value = form_field.field_value.text();
        if let Some(field) = classify_label(form_field.field_name.text(), value) {
            candidates.push(FieldCandidate::new(
                field,
                value,
                Source::RemoteService,
                form_field.field_value.confidence,
            ));
        }
    }

    Ok(candidates)
}

/// Field for an entity type or form label. More specific keywords are tried
/// first so that e.g. "residence" is not read as an id.
pub fn classify_label(label: &str, value: &str) -> Option<FieldName> {
    let label = label.to_lowercase();
    let has = |keywords: &[&str]| keywords.iter().any(|k| label.contains(k));

    if has(&["blood", "bg"]) {
        Some(FieldName::BloodGroup)
    } else if has(&["birth", "dob"]) {
        Some(FieldName::DateOfBirth)
    } else if has(&["address", "residence"]) {
        Some(if has_local_script(value) {
            FieldName::AddressLocal
        } else {
            FieldName::AddressEnglish
        })
    } else if has(&["gender", "sex"]) {
        Some(FieldName::Gender)
    } else if has(&["district"]) {
        Some(FieldName::District)
    } else if has(&["name"]) {
        Some(if has_local_script(value) {
            FieldName::NameLocal
        } else {
            FieldName::NameEnglish
        })
    } else if has(&["nic", "identity", "number", "id"]) {
        Some(FieldName::NationalId)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_labels_like_the_service_emits_them() {
        assert_eq!(classify_label("nic_number", "982341234V"), Some(FieldName::NationalId));
        assert_eq!(classify_label("Residence", "12 Galle Road"), Some(FieldName::AddressEnglish));
        assert_eq!(classify_label("address", "කොළඹ 03"), Some(FieldName::AddressLocal));
        assert_eq!(classify_label("full_name", "Saman Perera"), Some(FieldName::NameEnglish));
        assert_eq!(classify_label("full_name", "සමන් පෙරේරා"), Some(FieldName::NameLocal));
        assert_eq!(classify_label("date_of_birth", "1998-08-21"), Some(FieldName::DateOfBirth));
        assert_eq!(classify_label("BG", "O+"), Some(FieldName::BloodGroup));
        assert_eq!(classify_label("District", "Colombo"), Some(FieldName::District));
        assert_eq!(classify_label("photo", ""), None);
    }

    #[test]
    fn reads_entities_and_form_fields() -> Result<()> {
        let candidates = candidates_from_response(
            r#"{
                "entities": [
                    {"type": "nic_number", "mentionText": " 982341234V ", "confidence": 0.85},
                    {"type": "signature", "mentionText": "", "confidence": 0.4}
                ],
                "pages": [{
                    "formFields": [{
                        "fieldName": {"textAnchor": {"content": "Date of Birth:"}},
                        "fieldValue": {"textAnchor": {"content": "21/08/1998\n"}, "confidence": 0.7}
                    }]
                }]
            }"#,
        )?;
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].field_name, FieldName::NationalId);
        assert_eq!(candidates[0].raw_value, "982341234V");
        assert_eq!(candidates[0].source, Source::RemoteService);
        assert_eq!(candidates[1].field_name, FieldName::DateOfBirth);
        assert_eq!(candidates[1].raw_value, "21/08/1998");
        assert_eq!(candidates[1].source_confidence, 0.7);
        Ok(())
    }

    #[test]
    fn empty_response_has_no_candidates() -> Result<()> {
        assert!(candidates_from_response("{}")?.is_empty());
        Ok(())
    }
}
