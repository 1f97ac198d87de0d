/*!
 * Tests for the application controller
 */

use anyhow::Result;
use termbase::app_config::Config;
use termbase::app_controller::{Controller, ImportRequest};
use termbase::database::Repository;

use crate::common;

/// Test the controller initialization with default config
#[test]
fn test_newForTest_shouldUseDefaultConfig() -> Result<()> {
    let controller = Controller::new_for_test()?;

    assert_eq!(controller.config(), &Config::default());
    Ok(())
}

/// Test that an invalid configuration is refused
#[test]
fn test_withRepository_invalidConfig_shouldFail() -> Result<()> {
    let mut config = Config::default();
    config.export.batch_size = 0;

    let result = Controller::with_repository(config, Repository::new_in_memory()?);

    assert!(result.is_err());
    Ok(())
}

/// Test a database path from the configuration is used
#[test]
fn test_withConfig_databasePath_shouldCreateFile() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = dir.path().join("nested").join("terms.db");
    let mut config = Config::default();
    config.database.path = Some(path.clone());

    let controller = Controller::with_config(config)?;

    assert_eq!(controller.repository().connection().path(), path.as_path());
    assert!(path.exists());
    Ok(())
}

/// Test language registration and listing
#[tokio::test]
async fn test_registerLanguage_shouldListSortedLanguages() -> Result<()> {
    let controller = Controller::new_for_test()?;

    controller.register_language("fr", None).await?;
    controller.register_language("EN", None).await?;
    controller.register_language("pt-br", Some("Português")).await?;

    let languages = controller.list_languages().await?;
    let codes: Vec<&str> = languages.iter().map(|l| l.iso_code.as_str()).collect();
    assert_eq!(codes, vec!["en", "fr", "pt-BR"]);
    assert_eq!(languages[2].name, "Português");

    assert!(controller.register_language("zz", None).await.is_err());
    Ok(())
}

/// Test a glossary cannot use an unregistered source language
#[tokio::test]
async fn test_import_unregisteredSourceLanguage_shouldFail() -> Result<()> {
    let controller = common::setup_controller().await?;

    let error = controller
        .import_document(
            common::sample_tbx(),
            ImportRequest {
                source_language: Some("de".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert!(error.to_string().contains("\"de\" is not registered"));
    assert!(controller.list_glossaries().await?.is_empty());
    Ok(())
}

/// Test a document that does not parse leaves no glossary behind
#[tokio::test]
async fn test_import_malformedDocument_shouldCreateNoGlossary() -> Result<()> {
    let controller = common::setup_controller().await?;

    let error = controller
        .import_document("<martif><text>".to_string(), ImportRequest::default())
        .await
        .unwrap_err();

    assert!(error.to_string().contains("Malformed TBX document"));
    assert!(controller.list_glossaries().await?.is_empty());
    Ok(())
}

/// Test a failed import names the glossary and removes it
#[tokio::test]
async fn test_import_danglingReference_shouldNameAndRemoveGlossary() -> Result<()> {
    let controller = common::setup_controller().await?;
    let xml = common::wrap_entries(
        "Broken",
        r#"<termEntry id="a">
             <descrip type="broaderConceptGeneric" target="b">b</descrip>
             <langSet xml:lang="en"><tig><term>alone</term></tig></langSet>
           </termEntry>"#,
    );

    let error = controller
        .import_document(xml, ImportRequest::default())
        .await
        .unwrap_err();

    assert_eq!(error.to_string(), "Import into \"Broken\" failed");
    assert!(format!("{:#}", error).contains("unknown broader concept \"b\""));
    assert!(controller.list_glossaries().await?.is_empty());
    assert_eq!(controller.stats().await?.concept_count, 0);
    Ok(())
}

/// Test glossary deletion removes everything below it
#[tokio::test]
async fn test_deleteGlossary_shouldRemoveConcepts() -> Result<()> {
    let controller = common::setup_controller().await?;
    controller
        .import_document(common::sample_tbx(), ImportRequest::default())
        .await?;
    assert_eq!(controller.stats().await?.concept_count, 4);

    controller.delete_glossary("Kitchen").await?;

    let stats = controller.stats().await?;
    assert_eq!(stats.glossary_count, 0);
    assert_eq!(stats.concept_count, 0);
    assert_eq!(stats.translation_count, 0);
    assert_eq!(stats.language_count, 3);

    assert!(controller.delete_glossary("Kitchen").await.is_err());
    Ok(())
}
