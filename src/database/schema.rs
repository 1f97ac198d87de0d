/*!
 * Database schema definitions and migrations.
 *
 * This module contains the SQL schema for all terminology tables,
 * seeds the TBX-Basic controlled vocabulary on fresh databases
 * and handles schema migrations for version upgrades.
 */

use anyhow::{Context, Result};
use log::{debug, info};
use rusqlite::{Connection, params};

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Parts of speech seeded on a fresh database, term types included
const SEED_PARTS_OF_SPEECH: &[(&str, &str)] = &[
    ("Noun", "noun"),
    ("Verb", "verb"),
    ("Adjective", "adjective"),
    ("Adverb", "adverb"),
    ("Proper noun", "properNoun"),
    ("Other", "other"),
    ("Acronym", "acronym"),
    ("Abbreviation", "abbreviation"),
    ("Full form", "fullForm"),
    ("Short form", "shortForm"),
    ("Variant", "variant"),
    ("Phraseological unit", "phraseologicalUnit"),
];

/// Grammatical genders seeded on a fresh database
const SEED_GENDERS: &[(&str, &str)] = &[
    ("Masculine", "masculine"),
    ("Feminine", "feminine"),
    ("Neuter", "neuter"),
    ("Other", "other"),
];

/// Grammatical numbers seeded on a fresh database
const SEED_NUMBERS: &[(&str, &str)] = &[
    ("Singular", "singular"),
    ("Plural", "plural"),
    ("Dual", "dual"),
    ("Mass noun", "mass"),
    ("Other", "other"),
];

/// Administrative statuses: (name, representation, allows reason)
const SEED_STATUSES: &[(&str, &str, bool)] = &[
    ("Preferred", "preferredTerm-admn-sts", false),
    ("Admitted", "admittedTerm-admn-sts", false),
    ("Not recommended", "notRecommendedTerm-admn-sts", true),
    ("Deprecated", "deprecatedTerm-admn-sts", true),
    ("Superseded", "supersededTerm-admn-sts", true),
];

/// External link types seeded on a fresh database
const SEED_LINK_TYPES: &[(&str, &str)] = &[
    ("Cross reference", "externalCrossReference"),
    ("Image", "xGraphic"),
    ("Source", "xSource"),
];

/// Initialize the database schema
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    // Foreign keys are a per-connection setting
    conn.execute_batch("PRAGMA foreign_keys=ON;")
        .context("Failed to enable foreign keys")?;

    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        // Fresh database - create all tables
        info!("Initializing database schema v{}", SCHEMA_VERSION);
        create_all_tables(conn)?;
        seed_vocabulary(conn)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else if current_version < SCHEMA_VERSION {
        info!(
            "Migrating database schema from v{} to v{}",
            current_version, SCHEMA_VERSION
        );
        migrate_schema(conn, current_version)?;
    } else {
        debug!("Database schema is up to date (v{})", current_version);
    }

    Ok(())
}

/// Get the current schema version from the database
fn get_schema_version(conn: &Connection) -> Result<i32> {
    let table_exists: bool = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='schema_version'",
            [],
            |row| row.get(0),
        )
        .context("Failed to check schema_version table existence")?;

    if !table_exists {
        return Ok(0);
    }

    let version: i32 = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .unwrap_or(0);

    Ok(version)
}

/// Set the schema version in the database
fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_version (id, version, updated_at) VALUES (1, ?1, datetime('now'))",
        [version],
    )?;
    Ok(())
}

/// Create all database tables
fn create_all_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS languages (
            iso_code TEXT PRIMARY KEY CHECK (length(iso_code) <= 10),
            name TEXT NOT NULL
        );
        "#,
    )?;

    // Controlled vocabularies share one layout
    for table in [
        "parts_of_speech",
        "grammatical_genders",
        "grammatical_numbers",
        "external_link_types",
    ] {
        conn.execute_batch(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                tbx_representation TEXT NOT NULL UNIQUE COLLATE NOCASE
            );
            "#
        ))?;
    }

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS administrative_statuses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            tbx_representation TEXT NOT NULL UNIQUE COLLATE NOCASE,
            allows_reason INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS administrative_status_reasons (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE COLLATE NOCASE,
            description TEXT NOT NULL DEFAULT ''
        );
        "#,
    )?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS glossaries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            description TEXT NOT NULL DEFAULT '',
            source_language TEXT NOT NULL REFERENCES languages(iso_code),
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS glossary_other_languages (
            glossary_id INTEGER NOT NULL REFERENCES glossaries(id) ON DELETE CASCADE,
            language TEXT NOT NULL REFERENCES languages(iso_code),
            PRIMARY KEY (glossary_id, language)
        );
        "#,
    )?;

    // Subject field and broader concept block deletion while referenced
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS concepts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            glossary_id INTEGER NOT NULL REFERENCES glossaries(id) ON DELETE CASCADE,
            subject_field_id INTEGER REFERENCES concepts(id) ON DELETE RESTRICT,
            broader_concept_id INTEGER REFERENCES concepts(id) ON DELETE RESTRICT,
            repr_cache TEXT CHECK (repr_cache IS NULL OR length(repr_cache) <= 200)
        );

        CREATE INDEX IF NOT EXISTS idx_concepts_glossary ON concepts(glossary_id, id);
        CREATE INDEX IF NOT EXISTS idx_concepts_subject ON concepts(subject_field_id);
        CREATE INDEX IF NOT EXISTS idx_concepts_broader ON concepts(broader_concept_id);

        CREATE TABLE IF NOT EXISTS concept_related_concepts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            from_concept_id INTEGER NOT NULL REFERENCES concepts(id) ON DELETE CASCADE,
            to_concept_id INTEGER NOT NULL REFERENCES concepts(id) ON DELETE CASCADE,
            UNIQUE(from_concept_id, to_concept_id)
        );

        CREATE INDEX IF NOT EXISTS idx_related_to ON concept_related_concepts(to_concept_id);
        "#,
    )?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS translations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            concept_id INTEGER NOT NULL REFERENCES concepts(id) ON DELETE CASCADE,
            language TEXT NOT NULL REFERENCES languages(iso_code),
            translation_text TEXT NOT NULL,
            is_finalized INTEGER NOT NULL DEFAULT 0,
            administrative_status_id INTEGER REFERENCES administrative_statuses(id) ON DELETE SET NULL,
            administrative_status_reason_id INTEGER REFERENCES administrative_status_reasons(id) ON DELETE SET NULL,
            part_of_speech_id INTEGER REFERENCES parts_of_speech(id) ON DELETE SET NULL,
            grammatical_gender_id INTEGER REFERENCES grammatical_genders(id) ON DELETE SET NULL,
            grammatical_number_id INTEGER REFERENCES grammatical_numbers(id) ON DELETE SET NULL,
            note TEXT NOT NULL DEFAULT ''
        );

        CREATE INDEX IF NOT EXISTS idx_translations_concept ON translations(concept_id, language);

        CREATE TABLE IF NOT EXISTS definitions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            concept_id INTEGER NOT NULL REFERENCES concepts(id) ON DELETE CASCADE,
            language TEXT NOT NULL REFERENCES languages(iso_code),
            text TEXT NOT NULL,
            is_finalized INTEGER NOT NULL DEFAULT 0,
            source TEXT NOT NULL DEFAULT ''
        );

        CREATE INDEX IF NOT EXISTS idx_definitions_concept ON definitions(concept_id, language);

        CREATE TABLE IF NOT EXISTS external_resources (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            concept_id INTEGER NOT NULL REFERENCES concepts(id) ON DELETE CASCADE,
            language TEXT REFERENCES languages(iso_code),
            address TEXT NOT NULL,
            link_type_id INTEGER NOT NULL REFERENCES external_link_types(id),
            description TEXT NOT NULL DEFAULT ''
        );

        CREATE INDEX IF NOT EXISTS idx_resources_concept ON external_resources(concept_id);
        "#,
    )?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS context_sentences (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            translation_id INTEGER NOT NULL REFERENCES translations(id) ON DELETE CASCADE,
            text TEXT NOT NULL,
            UNIQUE(translation_id, text)
        );

        CREATE TABLE IF NOT EXISTS corpus_examples (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            translation_id INTEGER NOT NULL REFERENCES translations(id) ON DELETE CASCADE,
            address TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            UNIQUE(translation_id, address)
        );
        "#,
    )?;

    info!("Database schema created successfully");
    Ok(())
}

/// Seed the TBX-Basic controlled vocabulary
fn seed_vocabulary(conn: &Connection) -> Result<()> {
    let simple: [(&str, &[(&str, &str)]); 4] = [
        ("parts_of_speech", SEED_PARTS_OF_SPEECH),
        ("grammatical_genders", SEED_GENDERS),
        ("grammatical_numbers", SEED_NUMBERS),
        ("external_link_types", SEED_LINK_TYPES),
    ];

    for (table, rows) in simple {
        let mut stmt = conn.prepare(&format!(
            "INSERT OR IGNORE INTO {} (name, tbx_representation) VALUES (?1, ?2)",
            table
        ))?;
        for (name, representation) in rows {
            stmt.execute(params![name, representation])?;
        }
    }

    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO administrative_statuses (name, tbx_representation, allows_reason)
         VALUES (?1, ?2, ?3)",
    )?;
    for (name, representation, allows_reason) in SEED_STATUSES {
        stmt.execute(params![name, representation, allows_reason])?;
    }

    debug!("Seeded TBX-Basic controlled vocabulary");
    Ok(())
}

/// Migrate the schema from one version to another
fn migrate_schema(conn: &Connection, from_version: i32) -> Result<()> {
    let current = from_version;

    if current < SCHEMA_VERSION {
        // No released version predates v1
        return Err(anyhow::anyhow!(
            "Unknown schema version: {}. Cannot migrate.",
            current
        ));
    }

    set_schema_version(conn, SCHEMA_VERSION)?;
    info!("Schema migration completed to v{}", SCHEMA_VERSION);
    Ok(())
}
