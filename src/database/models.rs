/*!
 * Database entity models.
 *
 * These structures map directly to database tables and provide
 * type-safe access to persisted terminology data.
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// TBX representation of the "preferred" administrative status
pub const STATUS_PREFERRED: &str = "preferredTerm-admn-sts";
/// TBX representation of the "admitted" administrative status
pub const STATUS_ADMITTED: &str = "admittedTerm-admn-sts";
/// TBX representation of the "not recommended" administrative status
pub const STATUS_NOT_RECOMMENDED: &str = "notRecommendedTerm-admn-sts";
/// TBX representation of the "superseded" administrative status
pub const STATUS_SUPERSEDED: &str = "supersededTerm-admn-sts";
/// TBX representation of the "deprecated" administrative status
pub const STATUS_DEPRECATED: &str = "deprecatedTerm-admn-sts";

/// Controlled vocabularies referenced from TBX files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VocabularyKind {
    /// Part of speech (also used for TBX term types)
    PartOfSpeech,
    /// Administrative status of a term
    AdministrativeStatus,
    /// Grammatical gender
    GrammaticalGender,
    /// Grammatical number
    GrammaticalNumber,
    /// Type of an external resource link
    ExternalLinkType,
}

impl VocabularyKind {
    /// All vocabulary kinds, in seeding order
    pub const ALL: [VocabularyKind; 5] = [
        VocabularyKind::PartOfSpeech,
        VocabularyKind::AdministrativeStatus,
        VocabularyKind::GrammaticalGender,
        VocabularyKind::GrammaticalNumber,
        VocabularyKind::ExternalLinkType,
    ];

    /// Table holding the vocabulary rows
    pub fn table(&self) -> &'static str {
        match self {
            VocabularyKind::PartOfSpeech => "parts_of_speech",
            VocabularyKind::AdministrativeStatus => "administrative_statuses",
            VocabularyKind::GrammaticalGender => "grammatical_genders",
            VocabularyKind::GrammaticalNumber => "grammatical_numbers",
            VocabularyKind::ExternalLinkType => "external_link_types",
        }
    }

    /// Human readable label used in error messages
    pub fn label(&self) -> &'static str {
        match self {
            VocabularyKind::PartOfSpeech => "Part of Speech",
            VocabularyKind::AdministrativeStatus => "Administrative Status",
            VocabularyKind::GrammaticalGender => "Grammatical Gender",
            VocabularyKind::GrammaticalNumber => "Grammatical Number",
            VocabularyKind::ExternalLinkType => "External Link Type",
        }
    }
}

impl fmt::Display for VocabularyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VocabularyKind::PartOfSpeech => write!(f, "part_of_speech"),
            VocabularyKind::AdministrativeStatus => write!(f, "administrative_status"),
            VocabularyKind::GrammaticalGender => write!(f, "grammatical_gender"),
            VocabularyKind::GrammaticalNumber => write!(f, "grammatical_number"),
            VocabularyKind::ExternalLinkType => write!(f, "external_link_type"),
        }
    }
}

impl std::str::FromStr for VocabularyKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "part_of_speech" => Ok(VocabularyKind::PartOfSpeech),
            "administrative_status" => Ok(VocabularyKind::AdministrativeStatus),
            "grammatical_gender" => Ok(VocabularyKind::GrammaticalGender),
            "grammatical_number" => Ok(VocabularyKind::GrammaticalNumber),
            "external_link_type" => Ok(VocabularyKind::ExternalLinkType),
            _ => Err(anyhow::anyhow!("Invalid vocabulary kind: {}", s)),
        }
    }
}

/// Which translations survive an export, by administrative status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TermFilter {
    /// Every translation
    #[default]
    #[serde(rename = "all")]
    All,
    /// Preferred terms only
    #[serde(rename = "preferred")]
    Preferred,
    /// Preferred and admitted terms
    #[serde(rename = "preferred+admitted")]
    PreferredAdmitted,
    /// Preferred, admitted and not recommended terms
    #[serde(rename = "preferred+admitted+not_recommended")]
    PreferredAdmittedNotRecommended,
}

impl TermFilter {
    /// Administrative statuses allowed by this filter, `None` meaning no filtering
    pub fn allowed_statuses(&self) -> Option<&'static [&'static str]> {
        match self {
            TermFilter::All => None,
            TermFilter::Preferred => Some(&[STATUS_PREFERRED]),
            TermFilter::PreferredAdmitted => Some(&[STATUS_PREFERRED, STATUS_ADMITTED]),
            TermFilter::PreferredAdmittedNotRecommended => {
                Some(&[STATUS_PREFERRED, STATUS_ADMITTED, STATUS_NOT_RECOMMENDED])
            }
        }
    }

    /// Check whether a translation with the given status survives
    pub fn accepts(&self, status: Option<&str>) -> bool {
        match self.allowed_statuses() {
            None => true,
            Some(allowed) => status.is_some_and(|s| allowed.contains(&s)),
        }
    }
}

impl fmt::Display for TermFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TermFilter::All => write!(f, "all"),
            TermFilter::Preferred => write!(f, "preferred"),
            TermFilter::PreferredAdmitted => write!(f, "preferred+admitted"),
            TermFilter::PreferredAdmittedNotRecommended => {
                write!(f, "preferred+admitted+not_recommended")
            }
        }
    }
}

impl std::str::FromStr for TermFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(TermFilter::All),
            "preferred" => Ok(TermFilter::Preferred),
            "preferred+admitted" => Ok(TermFilter::PreferredAdmitted),
            "preferred+admitted+not_recommended" => {
                Ok(TermFilter::PreferredAdmittedNotRecommended)
            }
            _ => Err(anyhow::anyhow!("Invalid term filter: {}", s)),
        }
    }
}

/// Language record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageRecord {
    /// ISO code (primary key)
    pub iso_code: String,
    /// Display name
    pub name: String,
}

impl fmt::Display for LanguageRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.iso_code)
    }
}

/// Controlled vocabulary row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyItem {
    /// Database ID
    pub id: i64,
    /// Display name
    pub name: String,
    /// Representation used in TBX files
    pub tbx_representation: String,
    /// Whether an administrative status reason may be attached (statuses only)
    pub allows_reason: bool,
}

/// Administrative status reason row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReasonRecord {
    /// Database ID
    pub id: i64,
    /// Reason name, matched case-insensitively on import
    pub name: String,
    /// Longer description
    pub description: String,
}

/// Glossary record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlossaryRecord {
    /// Database ID
    pub id: i64,
    /// Unique glossary name
    pub name: String,
    /// Free-text description
    pub description: String,
    /// Source language code
    pub source_language: String,
    /// Creation timestamp (ISO 8601)
    pub created_at: String,
}

impl GlossaryRecord {
    /// Create a new glossary record (without database ID)
    pub fn new(name: String, description: String, source_language: String) -> Self {
        Self {
            id: 0, // Will be assigned by database
            name,
            description,
            source_language,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Concept record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptRecord {
    /// Database ID
    pub id: i64,
    /// Owning glossary
    pub glossary_id: i64,
    /// Concept used as subject field (protected from deletion)
    pub subject_field_id: Option<i64>,
    /// Broader concept (protected from deletion)
    pub broader_concept_id: Option<i64>,
    /// Cached short representation built from source language terms
    pub repr_cache: Option<String>,
}

impl fmt::Display for ConceptRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr_cache {
            Some(repr) if !repr.is_empty() => write!(f, "{}", repr),
            _ => write!(f, "Concept #{}", self.id),
        }
    }
}

/// Translation (term) record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRecord {
    /// Database ID
    pub id: i64,
    /// Owning concept
    pub concept_id: i64,
    /// Language code
    pub language: String,
    /// Term text
    pub translation_text: String,
    /// Whether the term has been finalized
    pub is_finalized: bool,
    /// Administrative status
    pub administrative_status_id: Option<i64>,
    /// Administrative status reason (only if the status allows it)
    pub administrative_status_reason_id: Option<i64>,
    /// Part of speech
    pub part_of_speech_id: Option<i64>,
    /// Grammatical gender (only with a part of speech)
    pub grammatical_gender_id: Option<i64>,
    /// Grammatical number (only with a part of speech)
    pub grammatical_number_id: Option<i64>,
    /// Free-text note
    pub note: String,
}

impl TranslationRecord {
    /// Create a new translation record (without database ID)
    pub fn new(concept_id: i64, language: &str, translation_text: &str) -> Self {
        Self {
            concept_id,
            language: language.to_string(),
            translation_text: translation_text.to_string(),
            ..Default::default()
        }
    }

    /// Drop gender and number when no part of speech is set
    pub fn normalize_grammar(&mut self) {
        if self.part_of_speech_id.is_none()
            && (self.grammatical_gender_id.is_some() || self.grammatical_number_id.is_some())
        {
            self.grammatical_gender_id = None;
            self.grammatical_number_id = None;
        }
    }
}

/// Definition record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionRecord {
    /// Database ID
    pub id: i64,
    /// Owning concept
    pub concept_id: i64,
    /// Language code
    pub language: String,
    /// Definition text
    pub text: String,
    /// Whether the definition has been finalized
    pub is_finalized: bool,
    /// Source URL (empty when unknown)
    pub source: String,
}

/// External resource record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalResourceRecord {
    /// Database ID
    pub id: i64,
    /// Owning concept
    pub concept_id: i64,
    /// Language code, `None` for concept-level resources
    pub language: Option<String>,
    /// Resource address
    pub address: String,
    /// Link type id
    pub link_type_id: i64,
    /// Free-text description
    pub description: String,
}

/// Context sentence attached to a translation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextSentenceRecord {
    /// Database ID
    pub id: i64,
    /// Owning translation
    pub translation_id: i64,
    /// Sentence text
    pub text: String,
}

/// Corpus example attached to a translation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusExampleRecord {
    /// Database ID
    pub id: i64,
    /// Owning translation
    pub translation_id: i64,
    /// Address of the example
    pub address: String,
    /// Free-text description
    pub description: String,
}
