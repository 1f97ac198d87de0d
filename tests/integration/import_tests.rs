/*!
 * Integration tests for TBX import
 */

use anyhow::Result;
use termbase::app_controller::ImportRequest;
use termbase::database::repository;
use termbase::errors::{ImportError, TbxError};
use termbase::tbx::import_tbx;

use crate::common;

/// Find the concept whose cached representation lists the given term first
fn concept_with_first_term(conn: &rusqlite::Connection, glossary_id: i64, term: &str) -> i64 {
    repository::list_concepts(conn, glossary_id)
        .unwrap()
        .into_iter()
        .find(|c| {
            c.repr_cache
                .as_deref()
                .is_some_and(|r| r.ends_with(&format!(": {}", term)) || r.contains(&format!(": {},", term)))
        })
        .map(|c| c.id)
        .unwrap_or_else(|| panic!("no concept for term {}", term))
}

#[test]
fn test_importTbx_withSampleGlossary_shouldCreateEverything() {
    let mut conn = common::setup_connection();
    let glossary_id = common::create_glossary(&conn, "Kitchen");

    let summary = import_tbx(&mut conn, glossary_id, &common::sample_tbx()).unwrap();

    assert_eq!(summary.concepts, 4);
    assert_eq!(summary.translations, 8);
    assert_eq!(summary.definitions, 2);
    assert_eq!(summary.resources, 1);
    assert_eq!(summary.context_sentences, 1);
    assert_eq!(summary.corpus_examples, 1);
    assert_eq!(summary.links.subject_fields, 2);
    assert_eq!(summary.links.broader_concepts, 1);
    assert_eq!(summary.links.related_concepts, 2);
    assert_eq!(summary.languages, vec!["en", "fr", "gl"]);
    assert_eq!(summary.checksum.len(), 64);

    assert_eq!(
        repository::glossary_other_languages(&conn, glossary_id).unwrap(),
        vec!["fr", "gl"]
    );
}

#[test]
fn test_importTbx_forwardReferences_shouldLinkConcepts() {
    let mut conn = common::setup_connection();
    let glossary_id = common::create_glossary(&conn, "Kitchen");
    import_tbx(&mut conn, glossary_id, &common::sample_tbx()).unwrap();

    let pan = concept_with_first_term(&conn, glossary_id, "pan");
    let cookware = concept_with_first_term(&conn, glossary_id, "cookware");
    let lid = concept_with_first_term(&conn, glossary_id, "lid");
    let cooking = concept_with_first_term(&conn, glossary_id, "cooking");

    let stored = repository::get_concept(&conn, pan).unwrap().unwrap();
    assert_eq!(stored.broader_concept_id, Some(cookware));
    assert_eq!(stored.subject_field_id, Some(cooking));
    assert_eq!(repository::related_concepts(&conn, pan).unwrap(), vec![lid]);
    assert_eq!(repository::related_concepts(&conn, lid).unwrap(), vec![pan]);
}

#[test]
fn test_importTbx_sourceTerms_shouldBuildReprByQuality() {
    let mut conn = common::setup_connection();
    let glossary_id = common::create_glossary(&conn, "Kitchen");
    import_tbx(&mut conn, glossary_id, &common::sample_tbx()).unwrap();

    let pan = concept_with_first_term(&conn, glossary_id, "pan");
    let stored = repository::get_concept(&conn, pan).unwrap().unwrap();

    // Not recommended ranks with unset statuses, ahead of admitted terms
    assert_eq!(
        stored.repr_cache.as_deref(),
        Some(format!("#{}: pan, frypan, skillet", pan).as_str())
    );
}

#[test]
fn test_importTbx_qualityOrdering_shouldPutPreferredFirst() {
    let mut conn = common::setup_connection();
    let glossary_id = common::create_glossary(&conn, "Letters");
    let xml = common::wrap_entries(
        "Letters",
        r#"<termEntry id="x"><langSet xml:lang="en">
             <tig><term>zz</term><termNote type="administrativeStatus">deprecatedTerm-admn-sts</termNote></tig>
             <tig><term>aa</term><termNote type="administrativeStatus">preferredTerm-admn-sts</termNote></tig>
             <tig><term>mm</term><termNote type="administrativeStatus">admittedTerm-admn-sts</termNote></tig>
             <tig><term>bb</term></tig>
           </langSet></termEntry>"#,
    );

    import_tbx(&mut conn, glossary_id, &xml).unwrap();

    let concept = &repository::list_concepts(&conn, glossary_id).unwrap()[0];
    assert_eq!(
        concept.repr_cache.as_deref(),
        Some(format!("#{}: aa, bb, mm, zz", concept.id).as_str())
    );
}

#[test]
fn test_importTbx_duplicateId_shouldLeaveNoGlossary() {
    let mut conn = common::setup_connection();
    let glossary_id = common::create_glossary(&conn, "Duplicates");
    let xml = common::wrap_entries(
        "Duplicates",
        r#"<termEntry id="a"><langSet xml:lang="en"><tig><term>one</term></tig></langSet></termEntry>
           <termEntry id="a"><langSet xml:lang="en"><tig><term>two</term></tig></langSet></termEntry>"#,
    );

    let error = import_tbx(&mut conn, glossary_id, &xml).unwrap_err();

    assert!(matches!(
        error,
        ImportError::Document(TbxError::DuplicateEntryId { ref id }) if id == "a"
    ));
    assert!(repository::get_glossary(&conn, glossary_id).unwrap().is_none());
    assert!(repository::list_concepts(&conn, glossary_id).unwrap().is_empty());
    let translations: i64 = conn
        .query_row("SELECT COUNT(*) FROM translations", [], |row| row.get(0))
        .unwrap();
    assert_eq!(translations, 0);
}

#[test]
fn test_importTbx_danglingBroader_shouldLeaveNoConcepts() {
    let mut conn = common::setup_connection();
    let glossary_id = common::create_glossary(&conn, "Dangling");
    let xml = common::wrap_entries(
        "Dangling",
        r#"<termEntry id="parent"><langSet xml:lang="en"><tig><term>parent</term></tig></langSet></termEntry>
           <termEntry id="child">
             <descrip type="broaderConceptGeneric" target="parent">parent</descrip>
             <langSet xml:lang="en"><tig><term>child</term></tig></langSet>
           </termEntry>
           <termEntry id="orphan">
             <descrip type="broaderConceptGeneric" target="nowhere">nowhere</descrip>
             <langSet xml:lang="en"><tig><term>orphan</term></tig></langSet>
           </termEntry>"#,
    );

    let error = import_tbx(&mut conn, glossary_id, &xml).unwrap_err();

    match error {
        ImportError::DanglingReference { relation, target, .. } => {
            assert_eq!(relation, "broader");
            assert_eq!(target, "nowhere");
        }
        other => panic!("unexpected error: {}", other),
    }
    let concepts: i64 = conn
        .query_row("SELECT COUNT(*) FROM concepts", [], |row| row.get(0))
        .unwrap();
    assert_eq!(concepts, 0);
    assert!(repository::get_glossary(&conn, glossary_id).unwrap().is_none());
}

#[test]
fn test_importTbx_danglingCrossReference_shouldRemoveGlossary() {
    let mut conn = common::setup_connection();
    let glossary_id = common::create_glossary(&conn, "Crossed");
    let xml = common::wrap_entries(
        "Crossed",
        r#"<termEntry id="lid">
             <ref type="crossReference" target="nope"/>
             <langSet xml:lang="en"><tig><term>lid</term></tig></langSet>
           </termEntry>"#,
    );

    let error = import_tbx(&mut conn, glossary_id, &xml).unwrap_err();

    match error {
        ImportError::DanglingReference { relation, source_key, target } => {
            assert_eq!(relation, "related");
            assert_eq!(source_key, "lid");
            assert_eq!(target, "nope");
        }
        other => panic!("unexpected error: {}", other),
    }
    let concepts: i64 = conn
        .query_row("SELECT COUNT(*) FROM concepts", [], |row| row.get(0))
        .unwrap();
    assert_eq!(concepts, 0);
    assert!(repository::get_glossary(&conn, glossary_id).unwrap().is_none());
    assert!(repository::list_glossaries(&conn).unwrap().is_empty());
}

#[test]
fn test_importTbx_unknownLanguage_shouldNameTheCode() {
    let mut conn = common::setup_connection();
    let glossary_id = common::create_glossary(&conn, "Unknown");
    let xml = common::wrap_entries(
        "Unknown",
        r#"<termEntry id="a"><langSet xml:lang="xx"><tig><term>one</term></tig></langSet></termEntry>"#,
    );

    let error = import_tbx(&mut conn, glossary_id, &xml).unwrap_err();

    assert!(error.to_string().contains("\"xx\""));
    assert!(repository::get_glossary(&conn, glossary_id).unwrap().is_none());
}

#[test]
fn test_importTbx_genderWithoutPartOfSpeech_shouldClearGrammar() {
    let mut conn = common::setup_connection();
    let glossary_id = common::create_glossary(&conn, "Grammar");
    let xml = common::wrap_entries(
        "Grammar",
        r#"<termEntry id="a"><langSet xml:lang="fr">
             <tig><term>maison</term>
               <termNote type="grammaticalGender">feminine</termNote>
               <termNote type="grammaticalNumber">singular</termNote>
             </tig>
           </langSet></termEntry>"#,
    );

    import_tbx(&mut conn, glossary_id, &xml).unwrap();

    let concept = &repository::list_concepts(&conn, glossary_id).unwrap()[0];
    let translation = &repository::list_translations(&conn, concept.id).unwrap()[0];
    assert_eq!(translation.translation_text, "maison");
    assert_eq!(translation.grammatical_gender_id, None);
    assert_eq!(translation.grammatical_number_id, None);
}

#[test]
fn test_importTbx_entryWithoutId_shouldImportWithoutLinks() {
    let mut conn = common::setup_connection();
    let glossary_id = common::create_glossary(&conn, "Anonymous");
    let xml = common::wrap_entries(
        "Anonymous",
        r#"<termEntry>
             <descrip type="broaderConceptGeneric" target="missing">missing</descrip>
             <langSet xml:lang="en"><tig><term>lonely</term></tig></langSet>
           </termEntry>"#,
    );

    let summary = import_tbx(&mut conn, glossary_id, &xml).unwrap();

    assert_eq!(summary.concepts, 1);
    assert_eq!(summary.links.broader_concepts, 0);
}

#[tokio::test]
async fn test_controller_importFile_shouldNameGlossaryAfterArgument() -> Result<()> {
    let controller = common::setup_controller().await?;
    let dir = common::create_temp_dir()?;
    let path = common::create_test_file(dir.path(), "kitchen.tbx", &common::sample_tbx())?;

    let summary = controller
        .import_file(
            &path,
            ImportRequest {
                name: Some("Cuisine".to_string()),
                ..Default::default()
            },
        )
        .await?;

    let glossaries = controller.list_glossaries().await?;
    assert_eq!(glossaries.len(), 1);
    assert_eq!(glossaries[0].name, "Cuisine");
    assert_eq!(glossaries[0].description, "Test terminology");
    assert_eq!(glossaries[0].id, summary.glossary_id);
    Ok(())
}

#[tokio::test]
async fn test_controller_importDocument_withoutName_shouldUseTitle() -> Result<()> {
    let controller = common::setup_controller().await?;

    controller
        .import_document(common::sample_tbx(), ImportRequest::default())
        .await?;

    let glossaries = controller.list_glossaries().await?;
    assert_eq!(glossaries[0].name, "Kitchen");
    assert_eq!(glossaries[0].source_language, "en");
    Ok(())
}

#[tokio::test]
async fn test_controller_importDocument_existingName_shouldFail() -> Result<()> {
    let controller = common::setup_controller().await?;
    controller
        .import_document(common::sample_tbx(), ImportRequest::default())
        .await?;

    let error = controller
        .import_document(common::sample_tbx(), ImportRequest::default())
        .await
        .unwrap_err();

    assert!(error.to_string().contains("already exists"));
    assert_eq!(controller.list_glossaries().await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_controller_failedImport_shouldNotKeepGlossary() -> Result<()> {
    let controller = common::setup_controller().await?;
    let xml = common::wrap_entries(
        "Broken",
        r#"<termEntry id="a"><langSet xml:lang="en">
             <tig><term>one</term><termNote type="partOfSpeech">gerundive</termNote></tig>
           </langSet></termEntry>"#,
    );

    let error = controller
        .import_document(xml, ImportRequest::default())
        .await
        .unwrap_err();

    assert!(format!("{:#}", error).contains("gerundive"));
    assert!(controller.list_glossaries().await?.is_empty());
    Ok(())
}
