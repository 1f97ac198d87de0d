/*!
 * Controlled vocabulary lookups.
 *
 * TBX files name vocabulary rows by their representation string
 * (`noun`, `preferredTerm-admn-sts`, ...). Lookups are case-insensitive.
 */

use anyhow::Result;
use rusqlite::Connection;
use std::collections::{BTreeSet, HashMap};

use crate::database::models::{StatusReasonRecord, VocabularyItem, VocabularyKind};
use crate::database::repository;

/// Map from lowercased TBX representation to vocabulary row
pub type VocabularyLookup = HashMap<String, VocabularyItem>;

/// Build the lookup of one vocabulary
pub fn build_lookup(conn: &Connection, kind: VocabularyKind) -> Result<VocabularyLookup> {
    Ok(repository::list_vocabulary(conn, kind)?
        .into_iter()
        .map(|item| (item.tbx_representation.to_lowercase(), item))
        .collect())
}

/// Every lookup needed by one import, read once up front
#[derive(Debug, Clone, Default)]
pub struct VocabularySnapshot {
    lookups: HashMap<VocabularyKind, VocabularyLookup>,
    reasons: HashMap<String, StatusReasonRecord>,
    languages: BTreeSet<String>,
}

impl VocabularySnapshot {
    /// Read all vocabularies, status reasons and language codes
    pub fn load(conn: &Connection) -> Result<Self> {
        let mut lookups = HashMap::new();
        for kind in VocabularyKind::ALL {
            lookups.insert(kind, build_lookup(conn, kind)?);
        }

        let reasons = repository::list_status_reasons(conn)?
            .into_iter()
            .map(|reason| (reason.name.to_lowercase(), reason))
            .collect();

        Ok(Self {
            lookups,
            reasons,
            languages: repository::language_codes(conn)?,
        })
    }

    /// Find a vocabulary row by its TBX representation
    pub fn find(&self, kind: VocabularyKind, representation: &str) -> Option<&VocabularyItem> {
        self.lookups
            .get(&kind)
            .and_then(|lookup| lookup.get(&representation.trim().to_lowercase()))
    }

    /// Find an administrative status reason by name
    pub fn find_reason(&self, name: &str) -> Option<&StatusReasonRecord> {
        self.reasons.get(&name.trim().to_lowercase())
    }

    /// Registered language codes
    pub fn languages(&self) -> &BTreeSet<String> {
        &self.languages
    }
}
