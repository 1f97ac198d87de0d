/*!
 * # Termbase - terminology store with TBX exchange
 *
 * A Rust library for storing multilingual terminology in SQLite and
 * exchanging it as TBX (TermBase eXchange) documents.
 *
 * ## Features
 *
 * - Import TBX documents into a glossary in one transaction, with
 *   forward references between concepts resolved after all entries are read
 * - Export one or several glossaries to TBX:
 *   - language selection
 *   - term filtering by administrative status
 *   - finalized or all definitions
 * - Concept representation cache ordered by term quality
 * - ISO 639-1 and ISO 639-2 language code support
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `database`: SQLite storage:
 *   - `database::schema`: Tables, versioning and the seeded vocabularies
 *   - `database::repository`: Queries per entity
 *   - `database::connection`: Thread-safe connection handling
 * - `tbx`: TBX import and export:
 *   - `tbx::reader` and `tbx::importer`: Reading TBX into a glossary
 *   - `tbx::aggregator` and `tbx::writer`: Writing glossaries as TBX
 * - `concept_repr`: Concept representation cache
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod concept_repr;
pub mod database;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod tbx;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{Controller, ExportRequest, ImportRequest};
pub use database::{DatabaseConnection, Repository};
pub use errors::{AppError, ExportError, ImportError, TbxError};
pub use language_utils::{get_language_name, language_codes_match, normalize_to_part2t};
pub use tbx::{ExportOptions, ImportSummary, export_tbx, import_tbx};
