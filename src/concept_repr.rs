/*!
 * Concept representation cache.
 *
 * A concept is displayed through its best source-language terms:
 * terms are ranked by administrative status quality, the first four
 * are joined and prefixed with the concept id.
 */

use anyhow::{Context, Result};
use log::debug;
use rusqlite::Connection;
use std::cmp::Ordering;

use crate::database::models::{
    STATUS_ADMITTED, STATUS_DEPRECATED, STATUS_PREFERRED, STATUS_SUPERSEDED,
};
use crate::database::repository;

/// Maximum length of a cached representation, in characters
pub const MAX_REPR_LENGTH: usize = 200;

/// Number of terms shown in a representation
const REPR_TERM_COUNT: usize = 4;

/// Quality rank of an administrative status, lower is better
///
/// Statuses without a dedicated rank sort with unset ones.
pub fn quality_rank(administrative_status: Option<&str>) -> u8 {
    match administrative_status {
        Some(STATUS_PREFERRED) => 0,
        Some(STATUS_ADMITTED) => 2,
        Some(STATUS_SUPERSEDED) => 3,
        Some(STATUS_DEPRECATED) => 4,
        _ => 1,
    }
}

/// A term together with the status used to rank it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedTerm {
    /// Term text
    pub text: String,
    /// TBX representation of the administrative status
    pub administrative_status: Option<String>,
}

impl RankedTerm {
    /// Create a ranked term
    pub fn new(text: impl Into<String>, administrative_status: Option<&str>) -> Self {
        Self {
            text: text.into(),
            administrative_status: administrative_status.map(str::to_string),
        }
    }

    /// Compare by quality rank, then by lowercase text
    pub fn quality_cmp(&self, other: &Self) -> Ordering {
        quality_rank(self.administrative_status.as_deref())
            .cmp(&quality_rank(other.administrative_status.as_deref()))
            .then_with(|| self.text.to_lowercase().cmp(&other.text.to_lowercase()))
    }
}

/// Sort terms by quality rank, then lowercase text
pub fn sort_by_quality(terms: &mut [RankedTerm]) {
    terms.sort_by(RankedTerm::quality_cmp);
}

/// Build the cached representation of a concept, `None` without terms
pub fn repr_from(concept_id: i64, terms: &[RankedTerm]) -> Option<String> {
    if terms.is_empty() {
        return None;
    }

    let mut sorted = terms.to_vec();
    sort_by_quality(&mut sorted);

    let joined = sorted
        .iter()
        .take(REPR_TERM_COUNT)
        .map(|t| t.text.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let repr = format!("#{}: {}", concept_id, joined);
    Some(repr.chars().take(MAX_REPR_LENGTH).collect())
}

/// Source-language terms of a concept with their statuses
fn source_language_terms(conn: &Connection, concept_id: i64) -> Result<Vec<RankedTerm>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT t.translation_text, s.tbx_representation
        FROM translations t
        JOIN concepts c ON c.id = t.concept_id
        JOIN glossaries g ON g.id = c.glossary_id
        LEFT JOIN administrative_statuses s ON s.id = t.administrative_status_id
        WHERE t.concept_id = ?1 AND t.language = g.source_language
        "#,
    )?;
    let rows = stmt.query_map([concept_id], |row| {
        Ok(RankedTerm {
            text: row.get(0)?,
            administrative_status: row.get(1)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Recompute and store the representation cache of a concept
pub fn update_repr_cache(conn: &Connection, concept_id: i64) -> Result<Option<String>> {
    let terms = source_language_terms(conn, concept_id)
        .with_context(|| format!("Failed to load terms of concept {}", concept_id))?;
    let repr = repr_from(concept_id, &terms);

    repository::set_repr_cache(conn, concept_id, repr.as_deref())?;
    debug!("Concept {} representation: {:?}", concept_id, repr);
    Ok(repr)
}

/// Delete a translation and refresh its concept's representation
pub fn delete_translation(conn: &Connection, translation_id: i64) -> Result<bool> {
    let Some(translation) = repository::get_translation(conn, translation_id)? else {
        return Ok(false);
    };

    repository::remove_translation_row(conn, translation_id)?;
    update_repr_cache(conn, translation.concept_id)?;
    Ok(true)
}
