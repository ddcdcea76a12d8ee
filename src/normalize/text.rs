/// Sinhala and Tamil text cleanup for names and addresses.
/// OCR on these scripts tends to emit decomposed vowel signs and to put
/// spaces between a consonant and its sign; both are repaired here.
use unicode_normalization::UnicodeNormalization;

const ZERO_WIDTH_JOINER: char = '\u{200D}';
const ZERO_WIDTH_NON_JOINER: char = '\u{200C}';

pub fn is_sinhala(c: char) -> bool {
    matches!(c as u32, 0x0D80..=0x0DFF)
}

pub fn is_tamil(c: char) -> bool {
    matches!(c as u32, 0x0B80..=0x0BFF)
}

pub fn has_local_script(text: &str) -> bool {
    text.chars().any(|c| is_sinhala(c) || is_tamil(c))
}

/// Vowel signs and virama: they attach to the preceding consonant.
fn is_dependent_sign(c: char) -> bool {
    matches!(
        c as u32,
        0x0D81..=0x0D83 | // Sinhala anusvara / visarga
        0x0DCA..=0x0DDF | // Sinhala virama and vowel signs
        0x0DF2..=0x0DF3 |
        0x0B82 |          // Tamil anusvara
        0x0BBE..=0x0BCD | // Tamil vowel signs and virama
        0x0BD7
    )
}

/// Drops a whitespace run sitting between a local-script letter and a
/// dependent sign. Runs are buffered until the next visible character
/// decides whether they stay.
fn remove_space_before_signs(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut pending = String::new();
    let mut prev_is_letter = false;

    for c in text.chars() {
        if c.is_whitespace() {
            pending.push(c);
            continue;
        }
        if !(prev_is_letter && is_dependent_sign(c)) {
            result.push_str(&pending);
        }
        pending.clear();
        result.push(c);
        prev_is_letter = is_sinhala(c) || is_tamil(c);
    }
    result.push_str(&pending);

    result
}

/// NFC, sign reattachment, whitespace collapsed to single spaces.
/// Returns `None` when nothing but whitespace remains.
pub fn normalize_text(raw: &str) -> Option<String> {
    let composed = raw.nfc().collect::<String>();
    let repaired = remove_space_before_signs(&composed);
    let collapsed = repaired.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

/// Lowercased text without zero-width joiners, for keyword matching.
pub fn match_key(raw: &str) -> String {
    raw.nfc()
        .filter(|c| *c != ZERO_WIDTH_JOINER && *c != ZERO_WIDTH_NON_JOINER)
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace() {
        assert_eq!(
            normalize_text("  12  Galle\tRoad,\n Colombo 03 ").as_deref(),
            Some("12 Galle Road, Colombo 03")
        );
        assert_eq!(normalize_text(" \t "), None);
    }

    #[test]
    fn reattaches_split_vowel_signs() {
        // පෙරේරා with a stray space before the vowel sign
        let expected = "පෙරේරා".nfc().collect::<String>();
        assert_eq!(normalize_text("ප ෙරේරා"), Some(expected));
        assert_eq!(normalize_text("සමන් පෙරේරා").as_deref(), Some("සමන් පෙරේරා"));
    }

    #[test]
    fn long_whitespace_runs_stay_linear() {
        let spaces = " ".repeat(200_000);
        assert_eq!(normalize_text(&format!("a{spaces}b")).as_deref(), Some("a b"));

        let expected = "පෙරේරා".nfc().collect::<String>();
        assert_eq!(normalize_text(&format!("ප{spaces}ෙරේරා")), Some(expected));
    }

    #[test]
    fn detects_local_scripts() {
        assert!(has_local_script("සමන්"));
        assert!(has_local_script("குமார்"));
        assert!(!has_local_script("Saman Perera"));
    }

    #[test]
    fn match_key_drops_joiners() {
        assert_eq!(match_key("ස්ත්\u{200D}රී"), "ස්ත්රී");
        assert_eq!(match_key(" Female "), "female");
    }
}
