use anyhow::{Context, Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::database::models::{GlossaryRecord, LanguageRecord, TermFilter};
use crate::database::{DatabaseConnection, DatabaseStats, Repository, repository};
use crate::errors::ExportError;
use crate::file_utils::FileManager;
use crate::language_utils;
use crate::tbx::reader::{TbxDocument, TbxHeader};
use crate::tbx::{self, ExportOptions, ImportSummary, WriteStats};

// @module: Application controller for termbase operations

/// What to create when importing a file
#[derive(Debug, Clone, Default)]
pub struct ImportRequest {
    /// Glossary name, the document title (then the file stem) when absent
    pub name: Option<String>,
    /// Glossary description, the document description when absent
    pub description: Option<String>,
    /// Source language, the configured default when absent
    pub source_language: Option<String>,
}

/// What to export and where
#[derive(Debug, Clone, Default)]
pub struct ExportRequest {
    /// Names of the glossaries to export
    pub glossaries: Vec<String>,
    /// Languages of interest
    pub languages: Vec<String>,
    /// Export only the languages of interest
    pub strict_languages: bool,
    /// Include unfinalized definitions, the configured default when absent
    pub all_definitions: Option<bool>,
    /// Term filter, the configured default when absent
    pub term_filter: Option<TermFilter>,
    /// Output file or directory
    pub output: Option<PathBuf>,
}

/// Where an export was written
#[derive(Debug, Clone)]
pub struct ExportOutcome {
    pub path: PathBuf,
    pub stats: WriteStats,
}

/// Main application controller for terminology import and export
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Storage
    repository: Repository,
}

impl Controller {
    /// Create a new controller for test purposes with default configuration
    pub fn new_for_test() -> Result<Self> {
        Self::with_repository(Config::default(), Repository::new_in_memory()?)
    }

    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;

        let db = match &config.database.path {
            Some(path) => DatabaseConnection::new(path)?,
            None => DatabaseConnection::new_default()?,
        };

        Ok(Self {
            config,
            repository: Repository::new(db),
        })
    }

    /// Create a controller on an already opened repository
    pub fn with_repository(config: Config, repository: Repository) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        Ok(Self { config, repository })
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Underlying repository
    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    // =========================================================================
    // Import
    // =========================================================================

    /// Import a TBX file into a new glossary
    pub async fn import_file(&self, input_file: &Path, request: ImportRequest) -> Result<ImportSummary> {
        if !FileManager::is_tbx_file(input_file) {
            warn!("Input file {:?} does not have a .tbx extension", input_file);
        }
        let xml = FileManager::read_to_string(input_file)?;

        let fallback_name = input_file
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string());

        self.import_named(xml, request, fallback_name).await
    }

    /// Import a TBX document held in memory into a new glossary
    pub async fn import_document(&self, xml: String, request: ImportRequest) -> Result<ImportSummary> {
        self.import_named(xml, request, None).await
    }

    async fn import_named(
        &self,
        xml: String,
        request: ImportRequest,
        fallback_name: Option<String>,
    ) -> Result<ImportSummary> {
        let start_time = Instant::now();
        let default_language = self.config.import.default_source_language.clone();

        // One parse feeds both the glossary header and the import
        let spinner = spinner("Importing TBX document".to_string());
        let result = self
            .repository
            .connection()
            .execute_mut_async(move |conn| {
                let document = TbxDocument::parse(&xml)?;
                let glossary =
                    glossary_for(document.header(), request, fallback_name, &default_language)?;

                if repository::find_glossary_by_name(conn, &glossary.name)?.is_some() {
                    return Err(anyhow!("A glossary named \"{}\" already exists", glossary.name));
                }
                if !repository::language_codes(conn)?.contains(&glossary.source_language) {
                    return Err(anyhow!(
                        "Source language \"{}\" is not registered",
                        glossary.source_language
                    ));
                }

                let glossary_id = repository::insert_glossary(conn, &glossary)?;
                debug!("Created glossary {} ({})", glossary.name, glossary_id);

                let summary = tbx::import_document(conn, glossary_id, &document)
                    .with_context(|| format!("Import into \"{}\" failed", glossary.name))?;
                Ok((glossary.name, summary))
            })
            .await;
        spinner.finish_and_clear();

        let (glossary_name, summary) = result?;
        info!(
            "Imported \"{}\" in {:.2?}: {}",
            glossary_name,
            start_time.elapsed(),
            summary
        );
        Ok(summary)
    }

    // =========================================================================
    // Export
    // =========================================================================

    /// Export options for a request, with configured defaults filled in
    pub fn export_options(&self, request: &ExportRequest) -> Result<ExportOptions> {
        let mut options = self.config.export.to_options();
        options.desired_languages = request
            .languages
            .iter()
            .map(|code| language_utils::normalize_tag(code))
            .collect::<Result<Vec<_>>>()?;
        options.restrict_to_desired_languages = request.strict_languages;
        if let Some(all_definitions) = request.all_definitions {
            options.all_definitions = all_definitions;
        }
        if let Some(term_filter) = request.term_filter {
            options.term_filter = term_filter;
        }

        if options.restrict_to_desired_languages && options.desired_languages.is_empty() {
            return Err(anyhow!("Strict language export needs at least one language"));
        }
        Ok(options)
    }

    /// Export glossaries to a TBX file
    pub async fn export_to_file(&self, request: ExportRequest) -> Result<ExportOutcome> {
        let start_time = Instant::now();
        let options = self.export_options(&request)?;
        let glossaries = self.resolve_glossaries(&request.glossaries).await?;

        let names: Vec<&str> = glossaries.iter().map(|g| g.name.as_str()).collect();
        let filename = tbx::suggested_filename(&glossaries);
        let path = FileManager::resolve_output_path(request.output.as_deref(), &filename.filename);
        debug!("Export Content-Disposition: {}", filename.content_disposition);

        let ids: Vec<i64> = glossaries.iter().map(|g| g.id).collect();
        let target = path.clone();
        let spinner = spinner(format!("Exporting {}", names.join(", ")));
        let result = self
            .repository
            .connection()
            .execute_async(move |conn| {
                FileManager::write_atomically(&target, |out| {
                    Ok(tbx::export_tbx(conn, &ids, &options, out)?)
                })
            })
            .await;
        spinner.finish_and_clear();

        let stats = result?;
        info!(
            "Exported {} concepts to {:?} in {:.2?}",
            stats.concepts,
            path,
            start_time.elapsed()
        );
        Ok(ExportOutcome { path, stats })
    }

    /// Export glossaries to a TBX string
    pub async fn export_to_string(&self, request: ExportRequest) -> Result<String> {
        let options = self.export_options(&request)?;
        let glossaries = self.resolve_glossaries(&request.glossaries).await?;
        let ids: Vec<i64> = glossaries.iter().map(|g| g.id).collect();

        let bytes = self
            .repository
            .connection()
            .execute_async(move |conn| {
                let mut out = Vec::new();
                tbx::export_tbx(conn, &ids, &options, &mut out)?;
                Ok(out)
            })
            .await?;

        String::from_utf8(bytes).context("Exported document is not valid UTF-8")
    }

    async fn resolve_glossaries(&self, names: &[String]) -> Result<Vec<GlossaryRecord>> {
        if names.is_empty() {
            return Err(ExportError::NoGlossaries.into());
        }

        let mut glossaries = Vec::with_capacity(names.len());
        for name in names {
            let glossary = self
                .repository
                .find_glossary(name)
                .await?
                .ok_or_else(|| ExportError::UnknownGlossary(name.clone()))?;
            if glossaries.iter().all(|g: &GlossaryRecord| g.id != glossary.id) {
                glossaries.push(glossary);
            }
        }
        Ok(glossaries)
    }

    // =========================================================================
    // Languages and glossaries
    // =========================================================================

    /// Register a language, naming it after ISO 639 unless a name is given
    pub async fn register_language(&self, code: &str, name: Option<&str>) -> Result<LanguageRecord> {
        let language = language_utils::language_record(code, name)?;
        self.repository.register_language(language.clone()).await?;
        info!("Registered language {}", language);
        Ok(language)
    }

    /// Registered languages
    pub async fn list_languages(&self) -> Result<Vec<LanguageRecord>> {
        self.repository.list_languages().await
    }

    /// Stored glossaries
    pub async fn list_glossaries(&self) -> Result<Vec<GlossaryRecord>> {
        self.repository.list_glossaries().await
    }

    /// Delete a glossary by name
    pub async fn delete_glossary(&self, name: &str) -> Result<()> {
        let glossary = self
            .repository
            .find_glossary(name)
            .await?
            .ok_or_else(|| anyhow!("Unknown glossary: {}", name))?;

        if !self.repository.delete_glossary(glossary.id).await? {
            return Err(anyhow!("Glossary \"{}\" was not deleted", name));
        }
        info!("Deleted glossary \"{}\"", name);
        Ok(())
    }

    /// Database statistics
    pub async fn stats(&self) -> Result<DatabaseStats> {
        self.repository.connection().stats_async().await
    }
}

fn spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{elapsed_precise}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Glossary to create for an imported document
fn glossary_for(
    header: TbxHeader,
    request: ImportRequest,
    fallback_name: Option<String>,
    default_language: &str,
) -> Result<GlossaryRecord> {
    let name = request
        .name
        .or(header.title)
        .or(fallback_name)
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| anyhow!("A glossary name is required"))?;
    let description = request.description.or(header.description).unwrap_or_default();
    let source_language = request
        .source_language
        .unwrap_or_else(|| default_language.to_string());
    let source_language = language_utils::normalize_tag(&source_language)?;

    Ok(GlossaryRecord::new(name, description, source_language))
}
