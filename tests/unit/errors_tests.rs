/*!
 * Tests for error types
 */

use anyhow::anyhow;
use termbase::database::models::VocabularyKind;
use termbase::errors::{AppError, ExportError, ImportError, TbxError};

/// Test document errors keep their message through the import error
#[test]
fn test_importError_fromTbxError_shouldKeepMessage() {
    let error: ImportError = TbxError::MissingLanguage {
        concept: "\"c12\"".to_string(),
    }
    .into();

    assert_eq!(
        error.to_string(),
        "Missing language attribute in a language section of concept \"c12\""
    );
}

/// Test dangling references name both ends
#[test]
fn test_danglingReference_shouldNameSourceAndTarget() {
    let error = ImportError::DanglingReference {
        relation: "broader",
        source_key: "child".to_string(),
        target: "parent".to_string(),
    };

    let message = error.to_string();
    assert!(message.contains("child"));
    assert!(message.contains("broader"));
    assert!(message.contains("\"parent\""));
}

/// Test vocabulary errors name the vocabulary
#[test]
fn test_unknownVocabulary_shouldNameKind() {
    let error = ImportError::UnknownVocabulary {
        kind: VocabularyKind::GrammaticalGender,
        value: "epicene".to_string(),
        term: "casa".to_string(),
        language: "gl".to_string(),
        concept: "#1".to_string(),
    };

    let message = error.to_string();
    assert!(message.contains("Grammatical Gender"));
    assert!(message.contains("\"epicene\""));
    assert!(message.contains("\"casa\""));
}

/// Test conversion into the application error
#[test]
fn test_appError_conversions_shouldWrapSources() {
    let export: AppError = ExportError::NoGlossaries.into();
    assert_eq!(export.to_string(), "Export failed: No glossaries selected for export");

    let import: AppError = ImportError::GlossaryNotFound(3).into();
    assert_eq!(import.to_string(), "Import failed: Glossary 3 does not exist");

    let io: AppError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
    assert!(matches!(io, AppError::File(_)));

    let other: AppError = anyhow!("outer").context("wrapped").into();
    assert_eq!(other.to_string(), "Unknown error: wrapped: outer");
}

/// Test write failures become export errors
#[test]
fn test_exportError_fromIo_shouldBeWriteError() {
    let error: ExportError = std::io::Error::other("disk full").into();

    assert!(matches!(error, ExportError::Write(ref message) if message == "disk full"));
}
