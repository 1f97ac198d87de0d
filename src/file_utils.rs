use anyhow::{Context, Result, anyhow};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

// @module: File and directory utilities

/// Extension of TBX files
pub const TBX_EXTENSION: &str = "tbx";

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    /// Check whether a path carries the TBX extension
    pub fn is_tbx_file<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref()
            .extension()
            .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(TBX_EXTENSION))
    }

    /// Read a TBX file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        let path = path.as_ref();
        if !Self::file_exists(path) {
            return Err(anyhow!("Input file does not exist: {:?}", path));
        }

        fs::read_to_string(path).with_context(|| format!("Failed to read file: {:?}", path))
    }

    /// Where an export lands
    ///
    /// An existing directory receives the suggested filename, no output
    /// at all means the suggested filename in the current directory.
    pub fn resolve_output_path(output: Option<&Path>, suggested_filename: &str) -> PathBuf {
        match output {
            Some(path) if Self::dir_exists(path) => path.join(suggested_filename),
            Some(path) => path.to_path_buf(),
            None => PathBuf::from(suggested_filename),
        }
    }

    /// Write a file through a temporary sibling that replaces the target on success
    ///
    /// The target is left untouched when `write` fails.
    pub fn write_atomically<P, F, T>(path: P, write: F) -> Result<T>
    where
        P: AsRef<Path>,
        F: FnOnce(&mut BufWriter<&mut NamedTempFile>) -> Result<T>,
    {
        let path = path.as_ref();
        let parent = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => parent.to_path_buf(),
            None => PathBuf::from("."),
        };
        Self::ensure_dir(&parent)?;

        let mut temp = NamedTempFile::new_in(&parent)
            .with_context(|| format!("Failed to create temporary file in {:?}", parent))?;

        let result = {
            let mut writer = BufWriter::new(&mut temp);
            let result = write(&mut writer)?;
            writer.flush().context("Failed to flush output")?;
            result
        };

        temp.persist(path)
            .with_context(|| format!("Failed to write to file: {:?}", path))?;
        Ok(result)
    }

    /// Write a string to a file atomically
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        Self::write_atomically(path, |out| {
            out.write_all(content.as_bytes())?;
            Ok(())
        })
    }
}
