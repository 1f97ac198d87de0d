/*!
 * Tests for file utility functions
 */

use anyhow::Result;
use std::path::Path;
use termbase::file_utils::FileManager;

use crate::common;

/// Test that file_exists returns true for existing files
#[test]
fn test_fileExists_withExistingFile_shouldReturnTrue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let test_file = common::create_test_file(temp_dir.path(), "terms.tbx", "<martif/>")?;

    assert!(FileManager::file_exists(&test_file));
    assert!(!FileManager::dir_exists(&test_file));
    Ok(())
}

/// Test that file_exists returns false for non-existent files
#[test]
fn test_fileExists_withNonExistentFile_shouldReturnFalse() {
    assert!(!FileManager::file_exists("non_existent_file.tbx"));
}

/// Test that dir_exists tells directories apart
#[test]
fn test_dirExists_shouldDetectDirectories() {
    assert!(FileManager::dir_exists("."));
    assert!(!FileManager::dir_exists("./non_existent_directory_12345"));
}

/// Test reading an input file
#[test]
fn test_readToString_shouldReturnContentOrFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let test_file = common::create_test_file(temp_dir.path(), "kitchen.tbx", &common::sample_tbx())?;

    let content = FileManager::read_to_string(&test_file)?;
    assert!(content.contains("<title>Kitchen</title>"));

    let missing = FileManager::read_to_string(temp_dir.path().join("missing.tbx"));
    assert!(missing.unwrap_err().to_string().contains("does not exist"));
    Ok(())
}

/// Test nested directory creation
#[test]
fn test_ensureDir_shouldCreateNestedDirectories() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let nested = temp_dir.path().join("a").join("b");

    FileManager::ensure_dir(&nested)?;
    assert!(FileManager::dir_exists(&nested));

    // Existing directories are fine
    FileManager::ensure_dir(&nested)?;
    Ok(())
}

/// Test output paths without an explicit target
#[test]
fn test_resolveOutputPath_withoutOutput_shouldUseSuggestedName() {
    assert_eq!(
        FileManager::resolve_output_path(None, "Kitchen.tbx"),
        Path::new("Kitchen.tbx")
    );
    assert_eq!(
        FileManager::resolve_output_path(Some(Path::new("/no/such/dir/out.tbx")), "Kitchen.tbx"),
        Path::new("/no/such/dir/out.tbx")
    );
}
