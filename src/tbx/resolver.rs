/*!
 * Concept graph resolution.
 *
 * Entries may point at concepts that appear later in the file, so
 * concepts are created first and linked once the whole file is read.
 * The pool is an arena: entries are addressed by index and the
 * local-id map only stores indices.
 */

use log::{debug, warn};
use rusqlite::Connection;
use std::collections::HashMap;

use crate::database::repository;
use crate::errors::ImportError;

/// Raw relation keys of one created concept
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolEntry {
    /// Local id from the file
    pub local_id: String,
    /// Database id of the created concept
    pub concept_id: i64,
    /// Subject field key
    pub subject_field: Option<String>,
    /// Broader concept key
    pub broader: Option<String>,
    /// Related concept keys
    pub related: Vec<String>,
}

/// Arena of concepts created by an import, keyed by local id
#[derive(Debug, Default)]
pub struct ConceptPool {
    entries: Vec<PoolEntry>,
    index: HashMap<String, usize>,
}

impl ConceptPool {
    /// Create an empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry, returning its index
    ///
    /// Local ids are unique: the reader rejects duplicates before this point.
    pub fn insert(&mut self, entry: PoolEntry) -> usize {
        let position = self.entries.len();
        self.index.insert(entry.local_id.clone(), position);
        self.entries.push(entry);
        position
    }

    /// Look up the index of a local id
    pub fn position(&self, local_id: &str) -> Option<usize> {
        self.index.get(local_id).copied()
    }

    /// Database id of the concept with the given local id
    pub fn concept_id(&self, local_id: &str) -> Option<i64> {
        self.position(local_id).map(|i| self.entries[i].concept_id)
    }

    /// Entries in file order
    pub fn entries(&self) -> &[PoolEntry] {
        &self.entries
    }

    /// Number of pooled concepts
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the pool is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn resolve(
        &self,
        entry: &PoolEntry,
        relation: &'static str,
        key: &str,
    ) -> Result<i64, ImportError> {
        self.concept_id(key)
            .ok_or_else(|| ImportError::DanglingReference {
                relation,
                source_key: entry.local_id.clone(),
                target: key.to_string(),
            })
    }
}

/// Counts of links persisted by a resolution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolvedLinks {
    pub subject_fields: usize,
    pub broader_concepts: usize,
    pub related_concepts: usize,
}

/// Resolve and persist subject field, broader and related links
///
/// On failure the subject field and broader concept of every pooled
/// concept are cleared before the error is returned.
pub fn resolve_relations(conn: &Connection, pool: &ConceptPool) -> Result<ResolvedLinks, ImportError> {
    match link_all(conn, pool) {
        Ok(links) => {
            debug!(
                "Resolved {} subject fields, {} broader and {} related links",
                links.subject_fields, links.broader_concepts, links.related_concepts
            );
            Ok(links)
        }
        Err(error) => {
            warn!("Concept resolution failed, releasing protected links: {}", error);
            release_protected_links(conn, pool)?;
            Err(error)
        }
    }
}

/// Clear subject field and broader concept of every pooled concept
pub fn release_protected_links(conn: &Connection, pool: &ConceptPool) -> Result<usize, ImportError> {
    let ids: Vec<i64> = pool.entries().iter().map(|e| e.concept_id).collect();
    Ok(repository::clear_protected_links(conn, &ids)?)
}

fn link_all(conn: &Connection, pool: &ConceptPool) -> Result<ResolvedLinks, ImportError> {
    let mut links = ResolvedLinks::default();

    for entry in pool.entries() {
        let subject = entry
            .subject_field
            .as_deref()
            .map(|key| pool.resolve(entry, "subject field", key))
            .transpose()?;
        let broader = entry
            .broader
            .as_deref()
            .map(|key| pool.resolve(entry, "broader", key))
            .transpose()?;

        let related = entry
            .related
            .iter()
            .map(|key| pool.resolve(entry, "related", key))
            .collect::<Result<Vec<_>, _>>()?;

        if subject.is_some() || broader.is_some() {
            repository::update_concept_links(conn, entry.concept_id, subject, broader)?;
        }
        for target in related {
            repository::add_related_concept(conn, entry.concept_id, target)?;
        }

        links.subject_fields += usize::from(subject.is_some());
        links.broader_concepts += usize::from(broader.is_some());
        links.related_concepts += entry.related.len();
    }

    Ok(links)
}
