//! Sri Lankan National Identity Card numbers.
//!
//! Legacy cards carry `YYDDDSSSC` followed by `V` or `X`; modern cards carry
//! twelve digits `YYYYDDDSSSSC`. `DDD` is the day of the birth year, counted as
//! if February always had 29 days, with 500 added for women.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::model::Gender;

const FEMALE_OFFSET: u16 = 500;

// February always counts 29 days in the day code.
const DAYS_IN_MONTH: [u16; 12] = [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IdFormat {
    Legacy,
    Modern,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct NationalId {
    number: String,
    format: IdFormat,
}

impl NationalId {
    /// Parses an ID as read from a card. Whitespace is dropped and the legacy
    /// suffix letter uppercased; anything not matching either layout is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let number: String = raw
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| c.to_ascii_uppercase())
            .collect();

        let format = match number.len() {
            10 => {
                let (digits, letter) = number.split_at(9);
                if !digits.bytes().all(|b| b.is_ascii_digit()) || !matches!(letter, "V" | "X") {
                    return None;
                }
                IdFormat::Legacy
            }
            12 if number.bytes().all(|b| b.is_ascii_digit()) => IdFormat::Modern,
            _ => return None,
        };

        Some(Self { number, format })
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn format(&self) -> IdFormat {
        self.format
    }

    pub fn birth_year(&self) -> i32 {
        match self.format {
            IdFormat::Legacy => 1900 + digits_value(&self.number[0..2]) as i32,
            IdFormat::Modern => digits_value(&self.number[0..4]) as i32,
        }
    }

    /// Raw three-digit day code, including the female offset.
    pub fn day_code(&self) -> u16 {
        match self.format {
            IdFormat::Legacy => digits_value(&self.number[2..5]) as u16,
            IdFormat::Modern => digits_value(&self.number[4..7]) as u16,
        }
    }

    /// Day of year with the female offset removed, if the code is in range.
    pub fn day_of_year(&self) -> Option<u16> {
        match self.day_code() {
            code @ 1..=366 => Some(code),
            code @ 501..=866 => Some(code - FEMALE_OFFSET),
            _ => None,
        }
    }

    pub fn gender(&self) -> Option<Gender> {
        self.day_of_year()?;
        if self.day_code() > FEMALE_OFFSET {
            Some(Gender::Female)
        } else {
            Some(Gender::Male)
        }
    }

    /// Birth date encoded in the number. `None` when the day code is out of
    /// range or names a day the birth year does not have (29 February).
    pub fn birth_date(&self) -> Option<NaiveDate> {
        let mut remaining = self.day_of_year()?;
        for (idx, days) in DAYS_IN_MONTH.iter().enumerate() {
            if remaining <= *days {
                return NaiveDate::from_ymd_opt(
                    self.birth_year(),
                    idx as u32 + 1,
                    u32::from(remaining),
                );
            }
            remaining -= days;
        }
        None
    }
}

fn digits_value(digits: &str) -> u32 {
    digits
        .bytes()
        .fold(0, |acc, b| acc * 10 + u32::from(b - b'0'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_legacy_number_with_lowercase_letter() {
        let id = NationalId::parse(" 98234 1234v ").expect("legacy id");
        assert_eq!(id.number(), "982341234V");
        assert_eq!(id.format(), IdFormat::Legacy);
    }

    #[test]
    fn parses_modern_number() {
        let id = NationalId::parse("199823401234").expect("modern id");
        assert_eq!(id.format(), IdFormat::Modern);
        assert_eq!(id.birth_year(), 1998);
        assert_eq!(id.day_code(), 234);
    }

    #[test]
    fn rejects_malformed_numbers() {
        assert!(NationalId::parse("").is_none());
        assert!(NationalId::parse("98234123V").is_none());
        assert!(NationalId::parse("982341234Q").is_none());
        assert!(NationalId::parse("19982340123A").is_none());
        assert!(NationalId::parse("9823412345V").is_none());
    }

    #[test]
    fn decodes_male_birth_date() {
        let id = NationalId::parse("982341234V").unwrap();
        assert_eq!(id.gender(), Some(Gender::Male));
        assert_eq!(id.birth_date(), NaiveDate::from_ymd_opt(1998, 8, 21));
    }

    #[test]
    fn decodes_female_offset() {
        let id = NationalId::parse("987341234V").unwrap();
        assert_eq!(id.gender(), Some(Gender::Female));
        assert_eq!(id.birth_date(), NaiveDate::from_ymd_opt(1998, 8, 21));
    }

    #[test]
    fn day_sixty_is_leap_day() {
        let leap = NationalId::parse("200006001234").unwrap();
        assert_eq!(leap.birth_date(), NaiveDate::from_ymd_opt(2000, 2, 29));

        let common = NationalId::parse("980601234V").unwrap();
        assert_eq!(common.birth_date(), None);

        let march_first = NationalId::parse("980611234V").unwrap();
        assert_eq!(march_first.birth_date(), NaiveDate::from_ymd_opt(1998, 3, 1));
    }

    #[test]
    fn day_code_500_has_no_gender() {
        let id = NationalId::parse("985001234V").unwrap();
        assert_eq!(id.gender(), None);
        assert_eq!(id.birth_date(), None);
    }
}
