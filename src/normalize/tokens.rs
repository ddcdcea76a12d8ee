use crate::core::model::{BloodGroup, Gender};
use crate::normalize::text::match_key;

pub fn parse_gender(raw: &str) -> Option<Gender> {
    match match_key(raw).trim_end_matches('.') {
        "m" | "male" | "man" | "පුරුෂ" | "පිරිමි" | "ஆண்" => Some(Gender::Male),
        "f" | "female" | "woman" | "ස්ත්රී" | "ගැහැණු" | "பெண்" => Some(Gender::Female),
        _ => None,
    }
}

pub fn parse_blood_group(raw: &str) -> Option<BloodGroup> {
    let mut compact: String = raw
        .to_uppercase()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '.')
        .collect();
    for prefix in ["BLOODGROUP", "BG:", "BG"] {
        if let Some(rest) = compact.strip_prefix(prefix) {
            compact = rest.trim_start_matches(':').to_string();
            break;
        }
    }
    let compact = compact
        .replace("POSITIVE", "+")
        .replace("NEGATIVE", "-")
        .replace("POS", "+")
        .replace("NEG", "-")
        .replace("+VE", "+")
        .replace("-VE", "-")
        .replace('−', "-");
    // OCR reads the letter O as a zero.
    let compact = match compact.strip_prefix('0') {
        Some(rest) => format!("O{rest}"),
        None => compact,
    };

    BloodGroup::ALL
        .into_iter()
        .find(|group| group.as_str() == compact)
}
