/*!
 * TBX (TermBase eXchange) import and export.
 *
 * - `vocabulary`: case-insensitive lookups of the controlled vocabularies
 * - `reader`: lazy scan of the concept entries of a TBX document
 * - `resolver`: two-phase linking of subject field, broader and related concepts
 * - `importer`: transactional import into a glossary
 * - `aggregator`: export grouping by concept and language
 * - `writer`: streaming TBX output
 */

pub mod aggregator;
pub mod importer;
pub mod reader;
pub mod resolver;
pub mod vocabulary;
pub mod writer;

use log::info;
use rusqlite::Connection;
use std::io::Write;

use crate::errors::ExportError;

pub use aggregator::{ExportOptions, aggregate};
pub use importer::{ImportSummary, import_document, import_tbx};
pub use writer::{ExportFilename, WriteStats, suggested_filename, write_document};

/// Export glossaries as TBX into the given writer
pub fn export_tbx<W: Write>(
    conn: &Connection,
    glossary_ids: &[i64],
    options: &ExportOptions,
    out: W,
) -> Result<WriteStats, ExportError> {
    let document = aggregate(conn, glossary_ids, options)?;
    let stats = write_document(document, out)?;

    info!(
        "Exported {} concepts with {} translations",
        stats.concepts, stats.translations
    );
    Ok(stats)
}
