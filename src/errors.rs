/*!
 * Error types for the termbase application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

use crate::database::models::VocabularyKind;

/// Errors found while scanning a TBX document
#[derive(Error, Debug)]
pub enum TbxError {
    /// The input is not well-formed XML
    #[error("Malformed TBX document: {0}")]
    Malformed(String),

    /// Two concept entries share the same local id
    #[error("Duplicate entry identifier \"{id}\"")]
    DuplicateEntryId {
        /// The repeated id
        id: String,
    },

    /// A language block has no xml:lang attribute
    #[error("Missing language attribute in a language section of concept {concept}")]
    MissingLanguage {
        /// Label of the concept (local id or ordinal)
        concept: String,
    },

    /// A language block uses a code that is not registered
    #[error("Unknown language code \"{code}\" in concept {concept}")]
    UnknownLanguage {
        /// The unregistered code
        code: String,
        /// Label of the concept (local id or ordinal)
        concept: String,
    },
}

/// Errors that abort a TBX import
#[derive(Error, Debug)]
pub enum ImportError {
    /// Structural problem in the document
    #[error(transparent)]
    Document(#[from] TbxError),

    /// A concept refers to a local id that no entry carries
    #[error("Concept {source_key} refers to unknown {relation} concept \"{target}\"")]
    DanglingReference {
        /// Relation being resolved (subject field, broader, related)
        relation: &'static str,
        /// Concept holding the reference
        source_key: String,
        /// Missing target key
        target: String,
    },

    /// A term note or link type value is not in the controlled vocabulary
    #[error("Unknown {} \"{value}\" for term \"{term}\" in language \"{language}\" of concept {concept}", .kind.label())]
    UnknownVocabulary {
        /// Vocabulary that was searched
        kind: VocabularyKind,
        /// Value that did not resolve
        value: String,
        /// Term text, or the resource address for link types
        term: String,
        /// Language block
        language: String,
        /// Label of the concept
        concept: String,
    },

    /// The target glossary does not exist
    #[error("Glossary {0} does not exist")]
    GlossaryNotFound(i64),

    /// Database failure
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Storage layer failure
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Errors that abort a TBX export
#[derive(Error, Debug)]
pub enum ExportError {
    /// Export called without any glossary
    #[error("No glossaries selected for export")]
    NoGlossaries,

    /// A requested glossary does not exist
    #[error("Unknown glossary: {0}")]
    UnknownGlossary(String),

    /// Writing the XML output failed
    #[error("Failed to write TBX output: {0}")]
    Write(String),

    /// Database failure
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Storage layer failure
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl From<quick_xml::Error> for ExportError {
    fn from(error: quick_xml::Error) -> Self {
        Self::Write(error.to_string())
    }
}

impl From<std::io::Error> for ExportError {
    fn from(error: std::io::Error) -> Self {
        Self::Write(error.to_string())
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from configuration handling
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from an import
    #[error("Import failed: {0}")]
    Import(#[from] ImportError),

    /// Error from an export
    #[error("Export failed: {0}")]
    Export(#[from] ExportError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(format!("{:#}", error))
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
