/*!
 * Common test utilities for the termbase test suite
 */

use anyhow::Result;
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use termbase::app_controller::Controller;
use termbase::database::models::{GlossaryRecord, LanguageRecord};
use termbase::database::{repository, schema};

/// Languages registered by the fixtures
pub const TEST_LANGUAGES: [(&str, &str); 3] =
    [("en", "English"), ("fr", "French"), ("gl", "Galician")];

/// Route library logs to the test output, set `RUST_LOG` to see them
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// In-memory database with the test languages registered
pub fn setup_connection() -> Connection {
    init_logging();
    let conn = Connection::open_in_memory().expect("Failed to open database");
    schema::initialize_schema(&conn).expect("Failed to create schema");
    for (code, name) in TEST_LANGUAGES {
        repository::upsert_language(
            &conn,
            &LanguageRecord {
                iso_code: code.to_string(),
                name: name.to_string(),
            },
        )
        .expect("Failed to register language");
    }
    conn
}

/// Create an empty glossary with English as source language
pub fn create_glossary(conn: &Connection, name: &str) -> i64 {
    repository::insert_glossary(
        conn,
        &GlossaryRecord::new(name.to_string(), format!("{} glossary", name), "en".to_string()),
    )
    .expect("Failed to create glossary")
}

/// Controller on an in-memory database with the test languages registered
pub async fn setup_controller() -> Result<Controller> {
    init_logging();
    let controller = Controller::new_for_test()?;
    for (code, name) in TEST_LANGUAGES {
        controller.register_language(code, Some(name)).await?;
    }
    Ok(controller)
}

/// Wrap concept entries in a minimal TBX document
pub fn wrap_entries(title: &str, entries: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE martif SYSTEM "TBXcoreStructV02.dtd">
<martif type="TBX" xml:lang="en">
  <martifHeader>
    <fileDesc>
      <titleStmt><title>{}</title></titleStmt>
      <sourceDesc><p>Test terminology</p></sourceDesc>
    </fileDesc>
  </martifHeader>
  <text><body>{}</body></text>
</martif>"#,
        title, entries
    )
}

/// A kitchen glossary using every supported feature
///
/// `pan` is filed under the subject field `cooking`, has `cookware` as
/// broader concept and `lid` as related concept; both are defined later in
/// the file.
pub fn sample_tbx() -> String {
    wrap_entries(
        "Kitchen",
        r#"
    <termEntry id="pan">
      <descripGrp>
        <descrip type="subjectField">cooking</descrip>
        <ref type="conceptIdentifier" target="cooking"/>
      </descripGrp>
      <descrip type="broaderConceptGeneric" target="cookware">cookware</descrip>
      <ref type="crossReference" target="lid"/>
      <langSet xml:lang="en">
        <descripGrp>
          <descrip type="definition">A shallow container used for frying.</descrip>
          <xref type="xSource" target="http://example.com/pan">http://example.com/pan</xref>
        </descripGrp>
        <xref type="externalCrossReference" target="http://wiki/pan">Pan article</xref>
        <tig>
          <term>pan</term>
          <termNote type="partOfSpeech">noun</termNote>
          <termNote type="grammaticalNumber">singular</termNote>
          <termNote type="administrativeStatus">preferredTerm-admn-sts</termNote>
          <termNote type="processStatus">finalized</termNote>
          <descrip type="context">Heat the pan before adding oil.</descrip>
          <xref type="corpusTrace" target="http://corpus/1">Cooking corpus</xref>
          <note>everyday word</note>
        </tig>
        <tig>
          <term>skillet</term>
          <termNote type="administrativeStatus">admittedTerm-admn-sts</termNote>
        </tig>
        <tig>
          <term>frypan</term>
          <termGrp>
            <termNote type="administrativeStatus">notRecommendedTerm-admn-sts</termNote>
            <note>Regional</note>
          </termGrp>
        </tig>
      </langSet>
      <langSet xml:lang="fr">
        <tig>
          <term>poêle</term>
          <termNote type="partOfSpeech">noun</termNote>
          <termNote type="grammaticalGender">feminine</termNote>
          <termNote type="administrativeStatus">preferredTerm-admn-sts</termNote>
        </tig>
      </langSet>
    </termEntry>
    <termEntry id="cookware">
      <descripGrp>
        <descrip type="subjectField">cooking</descrip>
        <ref type="conceptIdentifier" target="cooking"/>
      </descripGrp>
      <langSet xml:lang="en">
        <tig><term>cookware</term></tig>
      </langSet>
    </termEntry>
    <termEntry id="lid">
      <ref type="crossReference" target="pan"/>
      <langSet xml:lang="en">
        <descrip type="definition">A cover for a pot or pan.</descrip>
        <tig><term>lid</term></tig>
      </langSet>
      <langSet xml:lang="gl">
        <tig><term>tapa</term></tig>
      </langSet>
    </termEntry>
    <termEntry id="cooking">
      <langSet xml:lang="en">
        <tig><term>cooking</term></tig>
      </langSet>
    </termEntry>
"#,
    )
}
