/*!
 * Tests for language utility functions
 */

use termbase::language_utils::{
    LanguageCodeType, get_language_name, language_codes_match, language_record, normalize_tag,
    normalize_to_part2t, validate_language_code,
};

/// Test validation of language codes
#[test]
fn test_validateLanguageCode_withValidCodes_shouldReturnCorrectType() {
    assert_eq!(validate_language_code("en").unwrap(), LanguageCodeType::Part1);
    assert_eq!(validate_language_code("gl").unwrap(), LanguageCodeType::Part1);
    assert_eq!(validate_language_code("eng").unwrap(), LanguageCodeType::Part2T);
    assert_eq!(validate_language_code("fre").unwrap(), LanguageCodeType::Part2B);

    // Region subtags are ignored
    assert_eq!(validate_language_code("pt-BR").unwrap(), LanguageCodeType::Part1);
    assert_eq!(validate_language_code(" EN ").unwrap(), LanguageCodeType::Part1);

    assert!(validate_language_code("xyz").is_err());
    assert!(validate_language_code("123").is_err());
    assert!(validate_language_code("e").is_err());
    assert!(validate_language_code("").is_err());
}

/// Test normalization of language codes to ISO 639-2/T format
#[test]
fn test_normalizeToPart2t_withValidCodes_shouldNormalizeCorrectly() {
    assert_eq!(normalize_to_part2t("en").unwrap(), "eng");
    assert_eq!(normalize_to_part2t("fre").unwrap(), "fra");
    assert_eq!(normalize_to_part2t("ger").unwrap(), "deu");
    assert_eq!(normalize_to_part2t("zh-Hant").unwrap(), "zho");
    assert!(normalize_to_part2t("xx").is_err());
}

/// Test normalization of stored tags
#[test]
fn test_normalizeTag_shouldCaseSubtags() {
    assert_eq!(normalize_tag("EN").unwrap(), "en");
    assert_eq!(normalize_tag("pt-br").unwrap(), "pt-BR");
    assert_eq!(normalize_tag("pt_BR").unwrap(), "pt-BR");
    assert_eq!(normalize_tag("zh-Hant").unwrap(), "zh-Hant");
    assert!(normalize_tag("qq-XX").is_err());
}

/// Test matching of different language code formats
#[test]
fn test_languageCodesMatch_shouldCompareLanguages() {
    assert!(language_codes_match("en", "eng"));
    assert!(language_codes_match("fr", "fre"));
    assert!(language_codes_match("pt-BR", "pt"));
    assert!(!language_codes_match("en", "fr"));
    assert!(!language_codes_match("en", "invalid"));
}

/// Test language names
#[test]
fn test_getLanguageName_shouldUseEnglishNames() {
    assert_eq!(get_language_name("en").unwrap(), "English");
    assert_eq!(get_language_name("fra").unwrap(), "French");
    assert!(get_language_name("xx").is_err());
}

/// Test language records for registration
#[test]
fn test_languageRecord_shouldNameAfterIsoUnlessGiven() {
    let english = language_record("en", None).unwrap();
    assert_eq!(english.iso_code, "en");
    assert_eq!(english.name, "English");

    let brazilian = language_record("pt-br", None).unwrap();
    assert_eq!(brazilian.iso_code, "pt-BR");
    assert_eq!(brazilian.name, "Portuguese (BR)");

    let galician = language_record("gl", Some("Galego")).unwrap();
    assert_eq!(galician.name, "Galego");

    let blank = language_record("fr", Some("  ")).unwrap();
    assert_eq!(blank.name, "French");

    assert!(language_record("nope", None).is_err());
}
