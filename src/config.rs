use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::model::{FieldName, Source};

/// Tunables for normalization, validation, fusion and record assembly.
///
/// Every key is optional in the TOML file; missing keys keep the defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FusionConfig {
    /// Weight of each field in the overall confidence, keyed by field name.
    /// Fields not listed weigh 1.
    pub weights: BTreeMap<String, f32>,
    pub single_source_discount: f32,
    pub disagreement_cap: f32,
    /// Winner when both sources agree with equal confidence.
    pub agreement_tie_break: Source,
    /// Winner when the sources disagree with equal confidence.
    pub disagreement_tie_break: Source,
    /// Overall confidence below this makes the record PARTIAL.
    pub accept_threshold: f32,
    /// Transcripts below this confidence are flagged for review.
    pub review_threshold: f32,
    /// Minimum normalized Levenshtein similarity for a district match.
    pub district_similarity: f64,
    pub max_age_years: u32,
    /// Fields whose absence does not downgrade the record.
    pub optional_fields: BTreeSet<FieldName>,
}

impl Default for FusionConfig {
    fn default() -> Self {
        let weights = [(FieldName::NationalId, 2.0), (FieldName::DateOfBirth, 2.0)]
            .into_iter()
            .map(|(field, weight)| (field.as_str().to_string(), weight))
            .collect();
        Self {
            weights,
            single_source_discount: 0.9,
            disagreement_cap: 0.6,
            agreement_tie_break: Source::LocalModel,
            disagreement_tie_break: Source::RemoteService,
            accept_threshold: 0.75,
            review_threshold: 0.8,
            district_similarity: 0.85,
            max_age_years: 150,
            optional_fields: BTreeSet::from([FieldName::BloodGroup]),
        }
    }
}

impl FusionConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml_str(&text)
            .with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let mut config: FusionConfig = toml::from_str(text)?;
        // A [weights] table overrides individual fields, not the whole default set.
        let mut weights = FusionConfig::default().weights;
        weights.append(&mut config.weights);
        config.weights = weights;
        for key in config.weights.keys() {
            key.parse::<FieldName>()?;
        }
        for (name, value) in [
            ("single_source_discount", config.single_source_discount),
            ("disagreement_cap", config.disagreement_cap),
            ("accept_threshold", config.accept_threshold),
            ("review_threshold", config.review_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                anyhow::bail!("{name} must lie in [0, 1], got {value}");
            }
        }
        if !(0.0..=1.0).contains(&config.district_similarity) {
            anyhow::bail!(
                "district_similarity must lie in [0, 1], got {}",
                config.district_similarity
            );
        }
        let bad_weight = config
            .weights
            .iter()
            .find(|(_, weight)| weight.is_nan() || **weight < 0.0);
        if let Some((field, weight)) = bad_weight {
            anyhow::bail!("weight for {field} must be a non-negative number, got {weight}");
        }
        Ok(config)
    }

    pub fn weight(&self, field: FieldName) -> f32 {
        self.weights.get(field.as_str()).copied().unwrap_or(1.0)
    }

    pub fn is_optional(&self, field: FieldName) -> bool {
        self.optional_fields.contains(&field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_weight_identity_fields_double() {
        let config = FusionConfig::default();
        assert_eq!(config.weight(FieldName::NationalId), 2.0);
        assert_eq!(config.weight(FieldName::DateOfBirth), 2.0);
        assert_eq!(config.weight(FieldName::District), 1.0);
        assert!(config.is_optional(FieldName::BloodGroup));
    }

    #[test]
    fn partial_toml_keeps_defaults() -> Result<()> {
        let config = FusionConfig::from_toml_str(
            r#"
            accept_threshold = 0.8
            disagreement_tie_break = "LOCAL_MODEL"
            optional_fields = ["blood_group", "district"]

            [weights]
            gender = 1.5
            "#,
        )?;
        assert_eq!(config.accept_threshold, 0.8);
        assert_eq!(config.disagreement_tie_break, Source::LocalModel);
        assert!(config.is_optional(FieldName::District));
        assert_eq!(config.weight(FieldName::Gender), 1.5);
        assert_eq!(config.weight(FieldName::NationalId), 2.0);
        assert_eq!(config.single_source_discount, 0.9);
        Ok(())
    }

    #[test]
    fn unknown_weight_key_is_rejected() {
        let err = FusionConfig::from_toml_str("[weights]\npassport = 2.0\n").unwrap_err();
        assert!(err.to_string().contains("passport"), "got {err}");
    }

    #[test]
    fn out_of_range_knobs_are_rejected() {
        for toml in [
            "accept_threshold = 1.5",
            "review_threshold = -0.1",
            "district_similarity = 2.0",
            "disagreement_cap = nan",
            "[weights]\ngender = -1.0",
            "[weights]\ngender = nan",
        ] {
            let err = FusionConfig::from_toml_str(toml).unwrap_err();
            assert!(err.to_string().contains("must"), "{toml:?} gave {err}");
        }
    }
}
