use std::collections::BTreeSet;

use crate::config::FusionConfig;
use crate::core::confidence::{disagreement_confidence, single_source_confidence};
use crate::core::model::{
    Agreement, FieldName, FusedField, Origin, Source, ValidatedField, Validity, Violation,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionPolicy {
    pub single_source_discount: f32,
    pub disagreement_cap: f32,
    pub agreement_tie_break: Source,
    pub disagreement_tie_break: Source,
}

impl From<&FusionConfig> for FusionPolicy {
    fn from(config: &FusionConfig) -> Self {
        Self {
            single_source_discount: config.single_source_discount,
            disagreement_cap: config.disagreement_cap,
            agreement_tie_break: config.agreement_tie_break,
            disagreement_tie_break: config.disagreement_tie_break,
        }
    }
}

/// Picks one value for a field out of both sources' validated candidates.
///
/// Only the best validity tier that holds a value takes part. Each source is
/// represented by its most confident candidate in that tier, an extracted
/// read beating an ID-derived one on equal confidence.
pub fn resolve_field(
    field_name: FieldName,
    candidates: Vec<ValidatedField>,
    policy: &FusionPolicy,
) -> FusedField {
    let top_tier = candidates
        .iter()
        .filter(|c| c.value().is_some())
        .map(|c| c.validity)
        .min();
    let Some(tier) = top_tier else {
        return FusedField::no_source(field_name, candidates);
    };

    let local = representative(&candidates, tier, Source::LocalModel);
    let remote = representative(&candidates, tier, Source::RemoteService);

    let (chosen, agreement, fused_confidence) = match (local, remote) {
        (Some(l), Some(r)) if l.value() == r.value() => {
            let chosen = more_confident(l, r, policy.agreement_tie_break);
            (chosen, Agreement::BothAgree, l.confidence().max(r.confidence()))
        }
        (Some(l), Some(r)) => {
            let chosen = more_confident(l, r, policy.disagreement_tie_break);
            let confidence = disagreement_confidence(chosen.confidence(), policy.disagreement_cap);
            (chosen, Agreement::SourcesDisagree, confidence)
        }
        (Some(only), None) | (None, Some(only)) => {
            let confidence = single_source_confidence(only.confidence(), policy.single_source_discount);
            (only, Agreement::SingleSource, confidence)
        }
        (None, None) => return FusedField::no_source(field_name, candidates),
    };

    let chosen_value = chosen.value().cloned();
    let chosen_source = Some(chosen.source());
    let validity = chosen.validity;
    let violations: BTreeSet<Violation> = candidates
        .iter()
        .flat_map(|c| c.violations.iter().copied())
        .collect();

    FusedField {
        field_name,
        chosen_value,
        chosen_source,
        agreement,
        fused_confidence,
        validity,
        violations,
        candidates,
    }
}

fn representative(
    candidates: &[ValidatedField],
    tier: Validity,
    source: Source,
) -> Option<&ValidatedField> {
    let mut best: Option<&ValidatedField> = None;
    for candidate in candidates
        .iter()
        .filter(|c| c.source() == source && c.validity == tier && c.value().is_some())
    {
        let better = match best {
            None => true,
            Some(current) => {
                candidate.confidence() > current.confidence()
                    || (candidate.confidence() == current.confidence()
                        && candidate.origin() == Origin::Extracted
                        && current.origin() == Origin::DerivedFromId)
            }
        };
        if better {
            best = Some(candidate);
        }
    }
    best
}

fn more_confident<'a>(
    local: &'a ValidatedField,
    remote: &'a ValidatedField,
    tie_break: Source,
) -> &'a ValidatedField {
    if local.confidence() > remote.confidence() {
        local
    } else if remote.confidence() > local.confidence() {
        remote
    } else if tie_break == Source::LocalModel {
        local
    } else {
        remote
    }
}
