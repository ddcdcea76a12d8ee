use strsim::normalized_levenshtein;

use crate::normalize::text::match_key;

/// The 25 administrative districts.
pub const DISTRICTS: [&str; 25] = [
    "Ampara",
    "Anuradhapura",
    "Badulla",
    "Batticaloa",
    "Colombo",
    "Galle",
    "Gampaha",
    "Hambantota",
    "Jaffna",
    "Kalutara",
    "Kandy",
    "Kegalle",
    "Kilinochchi",
    "Kurunegala",
    "Mannar",
    "Matale",
    "Matara",
    "Monaragala",
    "Mullaitivu",
    "Nuwara Eliya",
    "Polonnaruwa",
    "Puttalam",
    "Ratnapura",
    "Trincomalee",
    "Vavuniya",
];

/// Best gazetteer entry for `raw`, if one is at least `min_similarity` alike.
pub fn match_district(raw: &str, min_similarity: f64) -> Option<&'static str> {
    let key = match_key(raw);
    let key = key
        .strip_suffix(" district")
        .unwrap_or(&key)
        .trim_matches(|c: char| c == ',' || c == '.' || c.is_whitespace());
    if key.is_empty() {
        return None;
    }

    let mut best: Option<(&'static str, f64)> = None;
    for district in DISTRICTS {
        let score = normalized_levenshtein(key, &district.to_lowercase());
        if best.map(|(_, top)| score > top).unwrap_or(true) {
            best = Some((district, score));
        }
    }

    best.filter(|(_, score)| *score >= min_similarity)
        .map(|(district, _)| district)
}
