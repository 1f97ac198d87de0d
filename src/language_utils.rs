use anyhow::{Result, anyhow};
use isolang::Language;

use crate::database::models::LanguageRecord;

/// Language utilities for ISO language code handling
///
/// Codes stored in the termbase are the `xml:lang` values of TBX files:
/// an ISO 639-1 or ISO 639-2 primary subtag, optionally followed by a
/// region or script subtag (`en`, `pt-BR`, `zh-Hant`).
/// Language code type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageCodeType {
    /// ISO 639-1 (2-letter) code
    Part1,
    /// ISO 639-2/T (3-letter) code
    Part2T,
    /// ISO 639-2/B (3-letter) code
    Part2B,
}

/// ISO 639-2/B codes that differ from their 639-2/T form
const BIBLIOGRAPHIC_CODES: [(&str, &str); 18] = [
    ("fre", "fra"),
    ("ger", "deu"),
    ("dut", "nld"),
    ("gre", "ell"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("ice", "isl"),
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("per", "fas"),
    ("geo", "kat"),
    ("may", "msa"),
    ("mac", "mkd"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

fn terminology_form(code: &str) -> Option<&'static str> {
    BIBLIOGRAPHIC_CODES
        .iter()
        .find(|(bibliographic, _)| *bibliographic == code)
        .map(|(_, terminology)| *terminology)
}

/// Split a language tag into its lowercase primary subtag and the rest
pub fn split_tag(code: &str) -> (String, Option<&str>) {
    let trimmed = code.trim();
    match trimmed.split_once(['-', '_']) {
        Some((primary, region)) => (primary.to_lowercase(), Some(region)),
        None => (trimmed.to_lowercase(), None),
    }
}

/// Validate the primary subtag of a language code against ISO 639-1 / 639-2
pub fn validate_language_code(code: &str) -> Result<LanguageCodeType> {
    let (primary, _) = split_tag(code);

    match primary.len() {
        2 if Language::from_639_1(&primary).is_some() => Ok(LanguageCodeType::Part1),
        3 if Language::from_639_3(&primary).is_some() => Ok(LanguageCodeType::Part2T),
        3 if terminology_form(&primary).is_some() => Ok(LanguageCodeType::Part2B),
        _ => Err(anyhow!("Invalid language code: {}", code)),
    }
}

/// Normalize the primary subtag of a language code to ISO 639-2/T
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    let (primary, _) = split_tag(code);

    let language = match validate_language_code(code)? {
        LanguageCodeType::Part1 => Language::from_639_1(&primary),
        LanguageCodeType::Part2T => Language::from_639_3(&primary),
        LanguageCodeType::Part2B => terminology_form(&primary).and_then(Language::from_639_3),
    };

    language
        .map(|l| l.to_639_3().to_string())
        .ok_or_else(|| anyhow!("Cannot normalize invalid language code: {}", code))
}

/// Normalize a language tag for storage
///
/// The primary subtag is lowercased, a region subtag of two letters is
/// uppercased, anything else after the separator is kept as written.
pub fn normalize_tag(code: &str) -> Result<String> {
    validate_language_code(code)?;
    let (primary, rest) = split_tag(code);

    Ok(match rest {
        Some(region) if region.len() == 2 => format!("{}-{}", primary, region.to_uppercase()),
        Some(subtag) => format!("{}-{}", primary, subtag),
        None => primary,
    })
}

/// Check if two language codes share the same primary language
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (normalize_to_part2t(code1), normalize_to_part2t(code2)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Get the English name of the primary language of a code
pub fn get_language_name(code: &str) -> Result<String> {
    let normalized = normalize_to_part2t(code)?;
    let lang = Language::from_639_3(&normalized)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", normalized))?;

    Ok(lang.to_name().to_string())
}

/// Build a language record, naming it after ISO 639 unless a name is given
pub fn language_record(code: &str, name: Option<&str>) -> Result<LanguageRecord> {
    let iso_code = normalize_tag(code)?;
    let name = match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => name.to_string(),
        None => {
            let base = get_language_name(code)?;
            match split_tag(&iso_code).1 {
                Some(region) => format!("{} ({})", base, region),
                None => base,
            }
        }
    };

    Ok(LanguageRecord { iso_code, name })
}
