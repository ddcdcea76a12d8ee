/// Fraction of a lone source's confidence kept when nothing corroborates it.
pub fn single_source_confidence(confidence: f32, discount: f32) -> f32 {
    (confidence * discount).clamp(0.0, 1.0)
}

/// Disagreeing sources never yield more than `cap`.
pub fn disagreement_confidence(confidence: f32, cap: f32) -> f32 {
    confidence.min(cap).clamp(0.0, 1.0)
}

/// Weighted mean of `(weight, confidence)` pairs; 0 when nothing is weighted.
pub fn weighted_confidence<I>(items: I) -> f32
where
    I: IntoIterator<Item = (f32, f32)>,
{
    let (weighted_sum, total_weight) = items
        .into_iter()
        .fold((0.0_f32, 0.0_f32), |(sum, total), (weight, confidence)| {
            (sum + weight * confidence, total + weight)
        });
    if total_weight <= 0.0 {
        return 0.0;
    }
    (weighted_sum / total_weight).clamp(0.0, 1.0)
}

pub fn is_valid_confidence(confidence: f32) -> bool {
    (0.0..=1.0).contains(&confidence)
}
