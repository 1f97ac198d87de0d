/*!
 * Integration tests for TBX export
 */

use anyhow::Result;
use rusqlite::Connection;
use termbase::app_controller::{ExportRequest, ImportRequest};
use termbase::database::models::{DefinitionRecord, TermFilter};
use termbase::database::repository;
use termbase::errors::ExportError;
use termbase::tbx::aggregator::MULTI_GLOSSARY_TITLE;
use termbase::tbx::reader::TbxDocument;
use termbase::tbx::{ExportOptions, export_tbx, import_tbx, suggested_filename};

use crate::common;

fn imported_kitchen() -> (Connection, i64) {
    let mut conn = common::setup_connection();
    let glossary_id = common::create_glossary(&conn, "Kitchen");
    import_tbx(&mut conn, glossary_id, &common::sample_tbx()).unwrap();
    (conn, glossary_id)
}

fn export(conn: &Connection, glossary_ids: &[i64], options: &ExportOptions) -> String {
    let mut out = Vec::new();
    export_tbx(conn, glossary_ids, options, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn test_exportTbx_defaultOptions_shouldWriteEveryTerm() {
    let (conn, glossary_id) = imported_kitchen();

    let xml = export(&conn, &[glossary_id], &ExportOptions::default());

    for term in ["pan", "skillet", "frypan", "poêle", "cookware", "lid", "tapa", "cooking"] {
        assert!(xml.contains(&format!("<term>{}</term>", term)), "missing {}", term);
    }
    assert!(xml.contains("<title>Kitchen</title>"));
    assert!(xml.contains(r#"<ref type="crossReference""#));
    assert!(xml.contains(r#"<descrip type="subjectField">"#));
    assert!(xml.contains(r#"<descrip type="broaderConceptGeneric""#));
    assert!(xml.contains(r#"<termNote type="processStatus">finalized</termNote>"#));

    let document = TbxDocument::parse(&xml).unwrap();
    assert_eq!(document.entry_count(), 4);
}

#[test]
fn test_exportTbx_preferredAdmittedFilter_shouldDropNotRecommended() {
    let (conn, glossary_id) = imported_kitchen();
    let options = ExportOptions {
        term_filter: TermFilter::PreferredAdmitted,
        ..ExportOptions::default()
    };

    let xml = export(&conn, &[glossary_id], &options);

    assert!(!xml.contains("<term>frypan</term>"));
    assert!(xml.contains("<term>skillet</term>"));
    assert!(xml.contains("<term>pan</term>"));
    assert!(!xml.contains("<term>tapa</term>"));
}

#[test]
fn test_exportTbx_unfinalizedDefinitions_shouldNeedAllDefinitions() {
    let (conn, glossary_id) = imported_kitchen();

    let finalized_only = export(&conn, &[glossary_id], &ExportOptions::default());
    assert!(!finalized_only.contains(r#"type="definition""#));

    let options = ExportOptions {
        all_definitions: true,
        ..ExportOptions::default()
    };
    let everything = export(&conn, &[glossary_id], &options);
    assert!(everything.contains("A shallow container used for frying."));
    assert!(everything.contains(r#"<xref type="xSource" target="http://example.com/pan">"#));
    assert!(everything.contains("A cover for a pot or pan."));
}

#[test]
fn test_exportTbx_twoDefinitionsInOneBucket_shouldKeepTheLatest() {
    let (conn, glossary_id) = imported_kitchen();
    let concept = &repository::list_concepts(&conn, glossary_id).unwrap()[0];
    for text in ["First wording.", "Second wording."] {
        let id = repository::insert_definition(
            &conn,
            &DefinitionRecord {
                concept_id: concept.id,
                language: "gl".to_string(),
                text: text.to_string(),
                ..Default::default()
            },
        )
        .unwrap();
        repository::finalize_definition(&conn, id).unwrap();
    }

    let xml = export(&conn, &[glossary_id], &ExportOptions::default());

    assert!(xml.contains("Second wording."));
    assert!(!xml.contains("First wording."));
}

#[test]
fn test_exportTbx_strictLanguages_shouldOnlyWriteDesired() {
    let (conn, glossary_id) = imported_kitchen();
    let options = ExportOptions {
        desired_languages: vec!["fr".to_string()],
        restrict_to_desired_languages: true,
        ..ExportOptions::default()
    };

    let xml = export(&conn, &[glossary_id], &options);

    assert!(xml.contains("<term>poêle</term>"));
    assert!(!xml.contains(r#"<langSet xml:lang="en">"#));
    assert!(!xml.contains(r#"<langSet xml:lang="gl">"#));
}

#[test]
fn test_exportTbx_desiredLanguagesWithoutStrict_shouldKeepEverything() {
    let (conn, glossary_id) = imported_kitchen();
    let options = ExportOptions {
        desired_languages: vec!["fr".to_string()],
        ..ExportOptions::default()
    };

    let xml = export(&conn, &[glossary_id], &options);

    assert!(xml.contains(r#"<langSet xml:lang="en">"#));
    assert!(xml.contains(r#"<langSet xml:lang="gl">"#));
}

#[test]
fn test_exportTbx_emptyGlossary_shouldWriteWellFormedDocument() {
    let conn = common::setup_connection();
    let glossary_id = common::create_glossary(&conn, "Empty");

    let xml = export(&conn, &[glossary_id], &ExportOptions::default());

    let document = TbxDocument::parse(&xml).unwrap();
    assert_eq!(document.entry_count(), 0);
    assert_eq!(document.header().title.as_deref(), Some("Empty"));
}

#[test]
fn test_exportTbx_severalGlossaries_shouldUseCombinedHeader() {
    let (conn, kitchen) = imported_kitchen();
    let empty = common::create_glossary(&conn, "Garden");

    let xml = export(&conn, &[kitchen, empty], &ExportOptions::default());

    assert!(xml.contains(&format!("<title>{}</title>", MULTI_GLOSSARY_TITLE)));
    assert!(xml.contains("Kitchen, Garden"));

    let glossaries = repository::list_glossaries(&conn).unwrap();
    assert_eq!(suggested_filename(&glossaries).filename, "exported_glossaries.tbx");
}

#[test]
fn test_exportTbx_withoutGlossaries_shouldFail() {
    let conn = common::setup_connection();
    let mut out = Vec::new();

    let error = export_tbx(&conn, &[], &ExportOptions::default(), &mut out).unwrap_err();

    assert!(matches!(error, ExportError::NoGlossaries));
}

#[test]
fn test_exportTbx_unknownGlossary_shouldFail() {
    let conn = common::setup_connection();
    let mut out = Vec::new();

    let error = export_tbx(&conn, &[42], &ExportOptions::default(), &mut out).unwrap_err();

    assert!(matches!(error, ExportError::UnknownGlossary(ref id) if id == "42"));
}

#[tokio::test]
async fn test_controller_exportToFile_shouldWriteSuggestedFilename() -> Result<()> {
    let controller = common::setup_controller().await?;
    controller
        .import_document(common::sample_tbx(), ImportRequest::default())
        .await?;
    let dir = common::create_temp_dir()?;

    let outcome = controller
        .export_to_file(ExportRequest {
            glossaries: vec!["Kitchen".to_string()],
            output: Some(dir.path().to_path_buf()),
            ..Default::default()
        })
        .await?;

    assert_eq!(outcome.path, dir.path().join("Kitchen.tbx"));
    assert_eq!(outcome.stats.concepts, 4);
    assert_eq!(outcome.stats.translations, 8);
    let written = std::fs::read_to_string(&outcome.path)?;
    assert!(written.starts_with("<?xml"));
    Ok(())
}

#[tokio::test]
async fn test_controller_exportToString_withTermOverride_shouldApplyFilter() -> Result<()> {
    let controller = common::setup_controller().await?;
    controller
        .import_document(common::sample_tbx(), ImportRequest::default())
        .await?;

    let xml = controller
        .export_to_string(ExportRequest {
            glossaries: vec!["Kitchen".to_string()],
            term_filter: Some(TermFilter::Preferred),
            ..Default::default()
        })
        .await?;

    assert!(xml.contains("<term>pan</term>"));
    assert!(!xml.contains("<term>skillet</term>"));
    Ok(())
}

#[tokio::test]
async fn test_controller_export_unknownGlossary_shouldFail() -> Result<()> {
    let controller = common::setup_controller().await?;

    let error = controller
        .export_to_string(ExportRequest {
            glossaries: vec!["Nowhere".to_string()],
            ..Default::default()
        })
        .await
        .unwrap_err();

    assert!(error.to_string().contains("Nowhere"));
    Ok(())
}

#[tokio::test]
async fn test_controller_strictLanguagesWithoutLanguages_shouldFail() -> Result<()> {
    let controller = common::setup_controller().await?;

    let request = ExportRequest {
        glossaries: vec!["Kitchen".to_string()],
        strict_languages: true,
        ..Default::default()
    };

    assert!(controller.export_options(&request).is_err());
    Ok(())
}
