/*!
 * Repository layer for database operations.
 *
 * This module provides a high-level API for all database operations,
 * abstracting away the SQL details and providing type-safe access.
 *
 * The free functions take a plain `&Connection` so the import and export
 * engines can run them inside their own transaction (a `Transaction`
 * dereferences to a `Connection`). `Repository` wraps them for async callers.
 */

use anyhow::{Context, Result};
use log::debug;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

use super::connection::DatabaseConnection;
use super::models::{
    ConceptRecord, ContextSentenceRecord, CorpusExampleRecord, DefinitionRecord,
    ExternalResourceRecord, GlossaryRecord, LanguageRecord, StatusReasonRecord,
    TranslationRecord, VocabularyItem, VocabularyKind,
};

/// Largest number of bound parameters SQLite accepts per statement
pub const MAX_SQL_PARAMETERS: usize = 999;

/// Build a `?,?,?` placeholder list for an `IN (...)` clause
pub fn placeholders(count: usize) -> String {
    vec!["?"; count].join(",")
}

/// Hash text with SHA-256 and return the lowercase hex digest
pub fn hash_text(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

// =========================================================================
// Language Operations
// =========================================================================

/// Register a language, updating its name if the code already exists
pub fn upsert_language(conn: &Connection, language: &LanguageRecord) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO languages (iso_code, name) VALUES (?1, ?2)
        ON CONFLICT(iso_code) DO UPDATE SET name = excluded.name
        "#,
        params![language.iso_code, language.name],
    )
    .with_context(|| format!("Failed to register language {}", language.iso_code))?;
    Ok(())
}

/// List all registered languages ordered by code
pub fn list_languages(conn: &Connection) -> Result<Vec<LanguageRecord>> {
    let mut stmt = conn.prepare("SELECT iso_code, name FROM languages ORDER BY iso_code")?;
    let rows = stmt.query_map([], |row| {
        Ok(LanguageRecord {
            iso_code: row.get(0)?,
            name: row.get(1)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Set of registered language codes
pub fn language_codes(conn: &Connection) -> Result<BTreeSet<String>> {
    let mut stmt = conn.prepare("SELECT iso_code FROM languages")?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    Ok(rows.collect::<rusqlite::Result<BTreeSet<_>>>()?)
}

// =========================================================================
// Vocabulary Operations
// =========================================================================

/// All rows of a controlled vocabulary, ordered by id
pub fn list_vocabulary(conn: &Connection, kind: VocabularyKind) -> Result<Vec<VocabularyItem>> {
    let allows_reason = match kind {
        VocabularyKind::AdministrativeStatus => "allows_reason",
        _ => "0",
    };
    let sql = format!(
        "SELECT id, name, tbx_representation, {} FROM {} ORDER BY id",
        allows_reason,
        kind.table()
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| {
        Ok(VocabularyItem {
            id: row.get(0)?,
            name: row.get(1)?,
            tbx_representation: row.get(2)?,
            allows_reason: row.get(3)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Add a vocabulary row and return its id
pub fn insert_vocabulary_item(
    conn: &Connection,
    kind: VocabularyKind,
    name: &str,
    tbx_representation: &str,
    allows_reason: bool,
) -> Result<i64> {
    match kind {
        VocabularyKind::AdministrativeStatus => conn.execute(
            "INSERT INTO administrative_statuses (name, tbx_representation, allows_reason) VALUES (?1, ?2, ?3)",
            params![name, tbx_representation, allows_reason],
        ),
        _ => conn.execute(
            &format!(
                "INSERT INTO {} (name, tbx_representation) VALUES (?1, ?2)",
                kind.table()
            ),
            params![name, tbx_representation],
        ),
    }
    .with_context(|| format!("Failed to add {} '{}'", kind.label(), tbx_representation))?;
    Ok(conn.last_insert_rowid())
}

/// All administrative status reasons
pub fn list_status_reasons(conn: &Connection) -> Result<Vec<StatusReasonRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, description FROM administrative_status_reasons ORDER BY id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(StatusReasonRecord {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Add an administrative status reason and return its id
pub fn insert_status_reason(conn: &Connection, name: &str, description: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO administrative_status_reasons (name, description) VALUES (?1, ?2)",
        params![name, description],
    )
    .with_context(|| format!("Failed to add status reason '{}'", name))?;
    Ok(conn.last_insert_rowid())
}

// =========================================================================
// Glossary Operations
// =========================================================================

fn parse_glossary_row(row: &rusqlite::Row) -> rusqlite::Result<GlossaryRecord> {
    Ok(GlossaryRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        source_language: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Create a glossary and return its id
pub fn insert_glossary(conn: &Connection, glossary: &GlossaryRecord) -> Result<i64> {
    conn.execute(
        r#"
        INSERT INTO glossaries (name, description, source_language, created_at)
        VALUES (?1, ?2, ?3, ?4)
        "#,
        params![
            glossary.name,
            glossary.description,
            glossary.source_language,
            glossary.created_at,
        ],
    )
    .with_context(|| format!("Failed to create glossary '{}'", glossary.name))?;
    Ok(conn.last_insert_rowid())
}

/// Get a glossary by id
pub fn get_glossary(conn: &Connection, glossary_id: i64) -> Result<Option<GlossaryRecord>> {
    Ok(conn
        .query_row(
            "SELECT id, name, description, source_language, created_at FROM glossaries WHERE id = ?1",
            [glossary_id],
            parse_glossary_row,
        )
        .optional()?)
}

/// Get a glossary by its unique name
pub fn find_glossary_by_name(conn: &Connection, name: &str) -> Result<Option<GlossaryRecord>> {
    Ok(conn
        .query_row(
            "SELECT id, name, description, source_language, created_at FROM glossaries WHERE name = ?1",
            [name],
            parse_glossary_row,
        )
        .optional()?)
}

/// List all glossaries ordered by name
pub fn list_glossaries(conn: &Connection) -> Result<Vec<GlossaryRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, description, source_language, created_at FROM glossaries ORDER BY name",
    )?;
    let rows = stmt.query_map([], parse_glossary_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Languages of a glossary besides its source language
pub fn glossary_other_languages(conn: &Connection, glossary_id: i64) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT language FROM glossary_other_languages WHERE glossary_id = ?1 ORDER BY language",
    )?;
    let rows = stmt.query_map([glossary_id], |row| row.get::<_, String>(0))?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Add languages to a glossary's other languages, ignoring ones already present
pub fn add_glossary_other_languages<'a, I>(
    conn: &Connection,
    glossary_id: i64,
    languages: I,
) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO glossary_other_languages (glossary_id, language) VALUES (?1, ?2)",
    )?;
    for language in languages {
        stmt.execute(params![glossary_id, language])?;
    }
    Ok(())
}

/// Delete a glossary and everything under it
///
/// Protected self references between its concepts are cleared first,
/// otherwise the cascade would be refused.
pub fn delete_glossary(conn: &Connection, glossary_id: i64) -> Result<bool> {
    let cleared = clear_glossary_protected_links(conn, glossary_id)?;
    let deleted = conn
        .execute("DELETE FROM glossaries WHERE id = ?1", [glossary_id])
        .with_context(|| format!("Failed to delete glossary {}", glossary_id))?;

    debug!(
        "Deleted glossary {} ({} protected links cleared)",
        glossary_id, cleared
    );
    Ok(deleted > 0)
}

// =========================================================================
// Concept Operations
// =========================================================================

fn parse_concept_row(row: &rusqlite::Row) -> rusqlite::Result<ConceptRecord> {
    Ok(ConceptRecord {
        id: row.get(0)?,
        glossary_id: row.get(1)?,
        subject_field_id: row.get(2)?,
        broader_concept_id: row.get(3)?,
        repr_cache: row.get(4)?,
    })
}

/// Create a concept without relations and return its id
pub fn insert_concept(conn: &Connection, glossary_id: i64) -> Result<i64> {
    conn.execute(
        "INSERT INTO concepts (glossary_id) VALUES (?1)",
        [glossary_id],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Get a concept by id
pub fn get_concept(conn: &Connection, concept_id: i64) -> Result<Option<ConceptRecord>> {
    Ok(conn
        .query_row(
            r#"
            SELECT id, glossary_id, subject_field_id, broader_concept_id, repr_cache
            FROM concepts WHERE id = ?1
            "#,
            [concept_id],
            parse_concept_row,
        )
        .optional()?)
}

/// All concepts of a glossary ordered by id
pub fn list_concepts(conn: &Connection, glossary_id: i64) -> Result<Vec<ConceptRecord>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT id, glossary_id, subject_field_id, broader_concept_id, repr_cache
        FROM concepts WHERE glossary_id = ?1 ORDER BY id
        "#,
    )?;
    let rows = stmt.query_map([glossary_id], parse_concept_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Persist the subject field and broader concept of a concept
pub fn update_concept_links(
    conn: &Connection,
    concept_id: i64,
    subject_field_id: Option<i64>,
    broader_concept_id: Option<i64>,
) -> Result<()> {
    conn.execute(
        "UPDATE concepts SET subject_field_id = ?2, broader_concept_id = ?3 WHERE id = ?1",
        params![concept_id, subject_field_id, broader_concept_id],
    )?;
    Ok(())
}

/// Clear subject field and broader concept of the given concepts
pub fn clear_protected_links(conn: &Connection, concept_ids: &[i64]) -> Result<usize> {
    let mut cleared = 0;
    for chunk in concept_ids.chunks(MAX_SQL_PARAMETERS) {
        let sql = format!(
            r#"
            UPDATE concepts SET subject_field_id = NULL, broader_concept_id = NULL
            WHERE id IN ({})
              AND (subject_field_id IS NOT NULL OR broader_concept_id IS NOT NULL)
            "#,
            placeholders(chunk.len())
        );
        cleared += conn.execute(&sql, params_from_iter(chunk.iter()))?;
    }
    Ok(cleared)
}

/// Clear subject field and broader concept of every concept in a glossary
pub fn clear_glossary_protected_links(conn: &Connection, glossary_id: i64) -> Result<usize> {
    let cleared = conn.execute(
        r#"
        UPDATE concepts SET subject_field_id = NULL, broader_concept_id = NULL
        WHERE glossary_id = ?1
          AND (subject_field_id IS NOT NULL OR broader_concept_id IS NOT NULL)
        "#,
        [glossary_id],
    )?;
    Ok(cleared)
}

/// Link a concept to a related concept
pub fn add_related_concept(conn: &Connection, from_concept_id: i64, to_concept_id: i64) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO concept_related_concepts (from_concept_id, to_concept_id) VALUES (?1, ?2)",
        params![from_concept_id, to_concept_id],
    )?;
    Ok(())
}

/// Related concepts of a concept ordered by link id
pub fn related_concepts(conn: &Connection, concept_id: i64) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare(
        "SELECT to_concept_id FROM concept_related_concepts WHERE from_concept_id = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map([concept_id], |row| row.get::<_, i64>(0))?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Store the representation cache of a concept
pub fn set_repr_cache(conn: &Connection, concept_id: i64, repr: Option<&str>) -> Result<()> {
    conn.execute(
        "UPDATE concepts SET repr_cache = ?2 WHERE id = ?1",
        params![concept_id, repr],
    )?;
    Ok(())
}

// =========================================================================
// Translation Operations
// =========================================================================

fn parse_translation_row(row: &rusqlite::Row) -> rusqlite::Result<TranslationRecord> {
    Ok(TranslationRecord {
        id: row.get(0)?,
        concept_id: row.get(1)?,
        language: row.get(2)?,
        translation_text: row.get(3)?,
        is_finalized: row.get(4)?,
        administrative_status_id: row.get(5)?,
        administrative_status_reason_id: row.get(6)?,
        part_of_speech_id: row.get(7)?,
        grammatical_gender_id: row.get(8)?,
        grammatical_number_id: row.get(9)?,
        note: row.get(10)?,
    })
}

/// Insert a translation and return its id
///
/// Gender and number are dropped when no part of speech is set.
pub fn insert_translation(conn: &Connection, translation: &TranslationRecord) -> Result<i64> {
    let mut translation = translation.clone();
    translation.normalize_grammar();

    conn.execute(
        r#"
        INSERT INTO translations (
            concept_id, language, translation_text, is_finalized,
            administrative_status_id, administrative_status_reason_id,
            part_of_speech_id, grammatical_gender_id, grammatical_number_id, note
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
        params![
            translation.concept_id,
            translation.language,
            translation.translation_text,
            translation.is_finalized,
            translation.administrative_status_id,
            translation.administrative_status_reason_id,
            translation.part_of_speech_id,
            translation.grammatical_gender_id,
            translation.grammatical_number_id,
            translation.note,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Get a translation by id
pub fn get_translation(conn: &Connection, translation_id: i64) -> Result<Option<TranslationRecord>> {
    Ok(conn
        .query_row(
            r#"
            SELECT id, concept_id, language, translation_text, is_finalized,
                   administrative_status_id, administrative_status_reason_id,
                   part_of_speech_id, grammatical_gender_id, grammatical_number_id, note
            FROM translations WHERE id = ?1
            "#,
            [translation_id],
            parse_translation_row,
        )
        .optional()?)
}

/// Translations of a concept ordered by id
pub fn list_translations(conn: &Connection, concept_id: i64) -> Result<Vec<TranslationRecord>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT id, concept_id, language, translation_text, is_finalized,
               administrative_status_id, administrative_status_reason_id,
               part_of_speech_id, grammatical_gender_id, grammatical_number_id, note
        FROM translations WHERE concept_id = ?1 ORDER BY id
        "#,
    )?;
    let rows = stmt.query_map([concept_id], parse_translation_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Remove a translation row, returning whether it existed
pub(crate) fn remove_translation_row(conn: &Connection, translation_id: i64) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM translations WHERE id = ?1", [translation_id])?;
    Ok(deleted > 0)
}

// =========================================================================
// Definition and Resource Operations
// =========================================================================

/// Insert a definition and return its id
pub fn insert_definition(conn: &Connection, definition: &DefinitionRecord) -> Result<i64> {
    conn.execute(
        r#"
        INSERT INTO definitions (concept_id, language, text, is_finalized, source)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
        params![
            definition.concept_id,
            definition.language,
            definition.text,
            definition.is_finalized,
            definition.source,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Definitions of a concept ordered by id
pub fn list_definitions(conn: &Connection, concept_id: i64) -> Result<Vec<DefinitionRecord>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT id, concept_id, language, text, is_finalized, source
        FROM definitions WHERE concept_id = ?1 ORDER BY id
        "#,
    )?;
    let rows = stmt.query_map([concept_id], |row| {
        Ok(DefinitionRecord {
            id: row.get(0)?,
            concept_id: row.get(1)?,
            language: row.get(2)?,
            text: row.get(3)?,
            is_finalized: row.get(4)?,
            source: row.get(5)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Mark a definition as finalized
pub fn finalize_definition(conn: &Connection, definition_id: i64) -> Result<()> {
    conn.execute(
        "UPDATE definitions SET is_finalized = 1 WHERE id = ?1",
        [definition_id],
    )?;
    Ok(())
}

/// Insert an external resource and return its id
pub fn insert_external_resource(conn: &Connection, resource: &ExternalResourceRecord) -> Result<i64> {
    conn.execute(
        r#"
        INSERT INTO external_resources (concept_id, language, address, link_type_id, description)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
        params![
            resource.concept_id,
            resource.language,
            resource.address,
            resource.link_type_id,
            resource.description,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// External resources of a concept ordered by id
pub fn list_external_resources(
    conn: &Connection,
    concept_id: i64,
) -> Result<Vec<ExternalResourceRecord>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT id, concept_id, language, address, link_type_id, description
        FROM external_resources WHERE concept_id = ?1 ORDER BY id
        "#,
    )?;
    let rows = stmt.query_map([concept_id], |row| {
        Ok(ExternalResourceRecord {
            id: row.get(0)?,
            concept_id: row.get(1)?,
            language: row.get(2)?,
            address: row.get(3)?,
            link_type_id: row.get(4)?,
            description: row.get(5)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

// =========================================================================
// Context Sentence and Corpus Example Operations
// =========================================================================

/// Attach a context sentence, returning false when it already exists
pub fn insert_context_sentence(conn: &Connection, translation_id: i64, text: &str) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO context_sentences (translation_id, text) VALUES (?1, ?2)",
        params![translation_id, text],
    )?;
    Ok(inserted > 0)
}

/// Context sentences of a translation ordered by id
pub fn list_context_sentences(
    conn: &Connection,
    translation_id: i64,
) -> Result<Vec<ContextSentenceRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, translation_id, text FROM context_sentences WHERE translation_id = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map([translation_id], |row| {
        Ok(ContextSentenceRecord {
            id: row.get(0)?,
            translation_id: row.get(1)?,
            text: row.get(2)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Attach a corpus example, returning false when the address already exists
pub fn insert_corpus_example(
    conn: &Connection,
    translation_id: i64,
    address: &str,
    description: &str,
) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO corpus_examples (translation_id, address, description) VALUES (?1, ?2, ?3)",
        params![translation_id, address, description],
    )?;
    Ok(inserted > 0)
}

/// Corpus examples of a translation ordered by id
pub fn list_corpus_examples(
    conn: &Connection,
    translation_id: i64,
) -> Result<Vec<CorpusExampleRecord>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT id, translation_id, address, description
        FROM corpus_examples WHERE translation_id = ?1 ORDER BY id
        "#,
    )?;
    let rows = stmt.query_map([translation_id], |row| {
        Ok(CorpusExampleRecord {
            id: row.get(0)?,
            translation_id: row.get(1)?,
            address: row.get(2)?,
            description: row.get(3)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Repository for async database operations
#[derive(Clone)]
pub struct Repository {
    /// Database connection
    db: DatabaseConnection,
}

impl Repository {
    /// Create a new repository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a repository with the default database location
    pub fn new_default() -> Result<Self> {
        let db = DatabaseConnection::new_default()?;
        Ok(Self::new(db))
    }

    /// Create a repository with an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        let db = DatabaseConnection::new_in_memory()?;
        Ok(Self::new(db))
    }

    /// Underlying connection
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    // =========================================================================
    // Language Operations
    // =========================================================================

    /// Register a language
    pub async fn register_language(&self, language: LanguageRecord) -> Result<()> {
        self.db
            .execute_async(move |conn| upsert_language(conn, &language))
            .await
    }

    /// List registered languages
    pub async fn list_languages(&self) -> Result<Vec<LanguageRecord>> {
        self.db.execute_async(list_languages).await
    }

    // =========================================================================
    // Vocabulary Operations
    // =========================================================================

    /// List a controlled vocabulary
    pub async fn list_vocabulary(&self, kind: VocabularyKind) -> Result<Vec<VocabularyItem>> {
        self.db
            .execute_async(move |conn| list_vocabulary(conn, kind))
            .await
    }

    /// Register an administrative status reason
    pub async fn register_status_reason(&self, name: &str, description: &str) -> Result<i64> {
        let name = name.to_string();
        let description = description.to_string();
        self.db
            .execute_async(move |conn| insert_status_reason(conn, &name, &description))
            .await
    }

    // =========================================================================
    // Glossary Operations
    // =========================================================================

    /// Create a glossary
    pub async fn create_glossary(&self, glossary: GlossaryRecord) -> Result<i64> {
        self.db
            .execute_async(move |conn| insert_glossary(conn, &glossary))
            .await
    }

    /// Find a glossary by name
    pub async fn find_glossary(&self, name: &str) -> Result<Option<GlossaryRecord>> {
        let name = name.to_string();
        self.db
            .execute_async(move |conn| find_glossary_by_name(conn, &name))
            .await
    }

    /// List glossaries
    pub async fn list_glossaries(&self) -> Result<Vec<GlossaryRecord>> {
        self.db.execute_async(list_glossaries).await
    }

    /// Delete a glossary with the two-step teardown
    pub async fn delete_glossary(&self, glossary_id: i64) -> Result<bool> {
        self.db
            .transaction_async(move |tx| delete_glossary(tx, glossary_id))
            .await
    }

    /// List the concepts of a glossary
    pub async fn list_concepts(&self, glossary_id: i64) -> Result<Vec<ConceptRecord>> {
        self.db
            .execute_async(move |conn| list_concepts(conn, glossary_id))
            .await
    }
}
