/*!
 * Tests for application configuration functionality
 */

use anyhow::Result;
use std::path::PathBuf;
use termbase::app_config::{Config, LogLevel};
use termbase::database::models::TermFilter;

use crate::common;

/// Test default configuration values
#[test]
fn test_defaultConfig_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.database.path, None);
    assert_eq!(config.import.default_source_language, "en");
    assert_eq!(config.export.batch_size, 999);
    assert!(!config.export.all_definitions);
    assert_eq!(config.export.term_filter, TermFilter::All);
    assert_eq!(config.log_level, LogLevel::Info);
    assert!(config.validate().is_ok());
}

/// Test configuration validation
#[test]
fn test_configValidation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();

    config.export.batch_size = 0;
    assert!(config.validate().is_err());
    config.export.batch_size = 1000;
    assert!(config.validate().is_err());
    config.export.batch_size = 1;
    assert!(config.validate().is_ok());

    config.import.default_source_language = "xyz".to_string();
    assert!(config.validate().is_err());
    config.import.default_source_language = "fra".to_string();
    assert!(config.validate().is_ok());
}

/// Test partial JSON falls back to defaults
#[test]
fn test_configDeserialization_withPartialJson_shouldFillDefaults() -> Result<()> {
    let json = r#"{
        "database": { "path": "/tmp/terms.db" },
        "export": { "term_filter": "preferred+admitted" },
        "log_level": "debug"
    }"#;

    let config: Config = serde_json::from_str(json)?;

    assert_eq!(config.database.path, Some(PathBuf::from("/tmp/terms.db")));
    assert_eq!(config.export.term_filter, TermFilter::PreferredAdmitted);
    assert_eq!(config.export.batch_size, 999);
    assert_eq!(config.import.default_source_language, "en");
    assert_eq!(config.log_level, LogLevel::Debug);
    Ok(())
}

/// Test that a missing file is created with defaults
#[test]
fn test_loadOrCreate_withMissingFile_shouldWriteDefaults() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = dir.path().join("conf.json");

    let created = Config::load_or_create(&path)?;
    assert!(path.exists());
    assert_eq!(created, Config::default());

    let mut changed = created.clone();
    changed.export.all_definitions = true;
    changed.save(&path)?;

    let loaded = Config::load_or_create(&path)?;
    assert!(loaded.export.all_definitions);
    Ok(())
}

/// Test that invalid JSON is reported
#[test]
fn test_loadOrCreate_withInvalidJson_shouldFail() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = common::create_test_file(dir.path(), "conf.json", "{ not json")?;

    let error = Config::load_or_create(&path).unwrap_err();
    assert!(error.to_string().contains("Failed to parse config file"));
    Ok(())
}

/// Test export defaults become export options
#[test]
fn test_exportConfig_toOptions_shouldCarryDefaults() {
    let mut config = Config::default();
    config.export.batch_size = 10;
    config.export.all_definitions = true;
    config.export.term_filter = TermFilter::Preferred;

    let options = config.export.to_options();

    assert_eq!(options.batch_size, 10);
    assert!(options.all_definitions);
    assert_eq!(options.term_filter, TermFilter::Preferred);
    assert!(options.desired_languages.is_empty());
    assert!(!options.restrict_to_desired_languages);
}
