/*!
 * TBX import.
 *
 * Reads a TBX document into an existing glossary. The whole import runs
 * in one transaction. When anything fails, the glossary is torn down
 * (protected concept links cleared, then the glossary deleted), the
 * teardown is committed and the error is returned.
 */

use log::{debug, error, info, warn};
use rusqlite::{Connection, Transaction};
use std::collections::BTreeSet;
use std::fmt;

use crate::concept_repr::{self, RankedTerm};
use crate::database::models::{
    DefinitionRecord, ExternalResourceRecord, GlossaryRecord, TranslationRecord, VocabularyKind,
};
use crate::database::repository;
use crate::errors::ImportError;
use crate::tbx::reader::{ConceptEntry, LanguageBlock, TbxDocument, TermGroup, TermNote};
use crate::tbx::resolver::{self, ConceptPool, PoolEntry, ResolvedLinks};
use crate::tbx::vocabulary::VocabularySnapshot;

/// What an import created
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Target glossary
    pub glossary_id: i64,
    /// Concepts created
    pub concepts: usize,
    /// Translations created
    pub translations: usize,
    /// Definitions created
    pub definitions: usize,
    /// External resources created
    pub resources: usize,
    /// Context sentences attached
    pub context_sentences: usize,
    /// Corpus examples attached
    pub corpus_examples: usize,
    /// Concept links persisted
    pub links: ResolvedLinks,
    /// Every language code seen in the file, sorted
    pub languages: Vec<String>,
    /// SHA-256 of the imported document
    pub checksum: String,
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} concepts, {} translations, {} definitions, {} resources ({} languages: {})",
            self.concepts,
            self.translations,
            self.definitions,
            self.resources,
            self.languages.len(),
            self.languages.join(", ")
        )
    }
}

/// Import a TBX document into a glossary
///
/// On error the glossary and everything under it is gone when this returns.
pub fn import_tbx(
    conn: &mut Connection,
    glossary_id: i64,
    xml: &str,
) -> Result<ImportSummary, ImportError> {
    match TbxDocument::parse(xml) {
        Ok(document) => import_document(conn, glossary_id, &document),
        Err(parse_error) => {
            let tx = conn.transaction()?;
            Err(abandon(tx, glossary_id, parse_error.into()))
        }
    }
}

/// Import an already parsed document into a glossary
///
/// Same teardown guarantee as `import_tbx`.
pub fn import_document(
    conn: &mut Connection,
    glossary_id: i64,
    document: &TbxDocument,
) -> Result<ImportSummary, ImportError> {
    let tx = conn.transaction()?;

    match run_import(&tx, glossary_id, document) {
        Ok(summary) => {
            tx.commit()?;
            info!("Imported TBX into glossary {}: {}", glossary_id, summary);
            Ok(summary)
        }
        Err(import_error) => Err(abandon(tx, glossary_id, import_error)),
    }
}

fn abandon(tx: Transaction, glossary_id: i64, import_error: ImportError) -> ImportError {
    error!("TBX import into glossary {} failed: {}", glossary_id, import_error);
    match teardown(tx, glossary_id) {
        Ok(()) => debug!("Glossary {} torn down", glossary_id),
        Err(teardown_error) => {
            error!("Teardown of glossary {} failed: {:#}", glossary_id, teardown_error)
        }
    }
    import_error
}

fn teardown(tx: Transaction, glossary_id: i64) -> anyhow::Result<()> {
    repository::delete_glossary(&tx, glossary_id)?;
    tx.commit()?;
    Ok(())
}

/// Per-import state
struct ImportRun<'a> {
    conn: &'a Connection,
    glossary: GlossaryRecord,
    vocabulary: VocabularySnapshot,
    pool: ConceptPool,
    languages: BTreeSet<String>,
    pending_reprs: Vec<(i64, String)>,
    summary: ImportSummary,
}

fn run_import(
    conn: &Connection,
    glossary_id: i64,
    document: &TbxDocument,
) -> Result<ImportSummary, ImportError> {
    let glossary =
        repository::get_glossary(conn, glossary_id)?.ok_or(ImportError::GlossaryNotFound(glossary_id))?;

    info!(
        "Importing {} concept entries into glossary '{}'",
        document.entry_count(),
        glossary.name
    );

    let mut run = ImportRun {
        conn,
        glossary,
        vocabulary: VocabularySnapshot::load(conn)?,
        pool: ConceptPool::new(),
        languages: BTreeSet::new(),
        pending_reprs: Vec::new(),
        summary: ImportSummary {
            glossary_id,
            checksum: repository::hash_text(document.text()),
            ..Default::default()
        },
    };

    // Scanning borrows the codes while the run is mutated
    let known_languages = run.vocabulary.languages().clone();
    for entry in document.entries(&known_languages) {
        run.import_entry(entry?)?;
    }

    run.finish()
}

impl ImportRun<'_> {
    fn import_entry(&mut self, entry: ConceptEntry) -> Result<(), ImportError> {
        let concept_id = repository::insert_concept(self.conn, self.glossary.id)?;
        let label = entry.label();
        debug!("Concept {} created as #{}", label, concept_id);
        self.summary.concepts += 1;

        let mut source_terms = Vec::new();
        for block in &entry.languages {
            self.languages.insert(block.language.clone());
            self.import_language(concept_id, &label, block, &mut source_terms)?;
        }

        if let Some(repr) = concept_repr::repr_from(concept_id, &source_terms) {
            self.pending_reprs.push((concept_id, repr));
        }

        match entry.local_id {
            Some(local_id) => {
                self.pool.insert(PoolEntry {
                    local_id,
                    concept_id,
                    subject_field: entry.subject_field,
                    broader: entry.broader,
                    related: entry.related,
                });
            }
            None if entry.subject_field.is_some()
                || entry.broader.is_some()
                || !entry.related.is_empty() =>
            {
                warn!("Concept {} has no id, its concept links are ignored", label);
            }
            None => {}
        }

        Ok(())
    }

    fn import_language(
        &mut self,
        concept_id: i64,
        label: &str,
        block: &LanguageBlock,
        source_terms: &mut Vec<RankedTerm>,
    ) -> Result<(), ImportError> {
        let language = block.language.as_str();

        if let Some(definition) = &block.definition {
            repository::insert_definition(
                self.conn,
                &DefinitionRecord {
                    concept_id,
                    language: language.to_string(),
                    text: definition.text.clone(),
                    is_finalized: false,
                    source: definition.source.clone().unwrap_or_default(),
                    ..Default::default()
                },
            )?;
            self.summary.definitions += 1;
        }

        for resource in &block.resources {
            let link_type = self
                .vocabulary
                .find(VocabularyKind::ExternalLinkType, &resource.link_type)
                .ok_or_else(|| ImportError::UnknownVocabulary {
                    kind: VocabularyKind::ExternalLinkType,
                    value: resource.link_type.clone(),
                    term: resource.target.clone(),
                    language: language.to_string(),
                    concept: label.to_string(),
                })?;

            if resource.target.is_empty() || resource.description.is_empty() {
                debug!(
                    "Skipping resource without target or description in concept {}",
                    label
                );
                continue;
            }

            repository::insert_external_resource(
                self.conn,
                &ExternalResourceRecord {
                    concept_id,
                    language: Some(language.to_string()),
                    address: resource.target.clone(),
                    link_type_id: link_type.id,
                    description: resource.description.clone(),
                    ..Default::default()
                },
            )?;
            self.summary.resources += 1;
        }

        for group in &block.terms {
            let (translation, status) = self.build_translation(concept_id, label, language, group)?;
            let translation_id = repository::insert_translation(self.conn, &translation)?;
            self.summary.translations += 1;

            for sentence in group.context_sentences.iter().filter(|s| !s.is_empty()) {
                if repository::insert_context_sentence(self.conn, translation_id, sentence)? {
                    self.summary.context_sentences += 1;
                }
            }
            for example in &group.corpus_examples {
                if repository::insert_corpus_example(
                    self.conn,
                    translation_id,
                    &example.address,
                    &example.description,
                )? {
                    self.summary.corpus_examples += 1;
                }
            }

            if language == self.glossary.source_language {
                source_terms.push(RankedTerm::new(group.term.clone(), status.as_deref()));
            }
        }

        Ok(())
    }

    /// Turn a term group into a translation row and its status representation
    fn build_translation(
        &self,
        concept_id: i64,
        label: &str,
        language: &str,
        group: &TermGroup,
    ) -> Result<(TranslationRecord, Option<String>), ImportError> {
        let mut translation = TranslationRecord::new(concept_id, language, &group.term);
        let mut status_repr = None;

        let lookup = |kind: VocabularyKind, value: &str| {
            self.vocabulary
                .find(kind, value)
                .ok_or_else(|| ImportError::UnknownVocabulary {
                    kind,
                    value: value.to_string(),
                    term: group.term.clone(),
                    language: language.to_string(),
                    concept: label.to_string(),
                })
        };

        for note in &group.notes {
            match note {
                TermNote::PartOfSpeech(value) | TermNote::TermType(value) => {
                    translation.part_of_speech_id =
                        Some(lookup(VocabularyKind::PartOfSpeech, value)?.id);
                }
                TermNote::GrammaticalGender(value) => {
                    translation.grammatical_gender_id =
                        Some(lookup(VocabularyKind::GrammaticalGender, value)?.id);
                }
                TermNote::GrammaticalNumber(value) => {
                    translation.grammatical_number_id =
                        Some(lookup(VocabularyKind::GrammaticalNumber, value)?.id);
                }
                TermNote::AdministrativeStatus { value, reason } => {
                    let status = lookup(VocabularyKind::AdministrativeStatus, value)?;
                    translation.administrative_status_id = Some(status.id);
                    translation.administrative_status_reason_id = None;
                    status_repr = Some(status.tbx_representation.clone());

                    if let (true, Some(reason)) = (status.allows_reason, reason) {
                        match self.vocabulary.find_reason(reason) {
                            Some(found) => {
                                translation.administrative_status_reason_id = Some(found.id)
                            }
                            None => warn!(
                                "Unknown administrative status reason \"{}\" for term \"{}\" in concept {}, skipped",
                                reason, group.term, label
                            ),
                        }
                    }
                }
                TermNote::ProcessStatus(value) => {
                    if value == "finalized" {
                        translation.is_finalized = true;
                    }
                }
                TermNote::Unsupported { kind } => {
                    debug!(
                        "Ignoring unsupported term note \"{}\" for term \"{}\" in concept {}",
                        kind, group.term, label
                    );
                }
            }
        }

        translation.note = group.note.clone().unwrap_or_default();
        translation.normalize_grammar();

        Ok((translation, status_repr))
    }

    fn finish(mut self) -> Result<ImportSummary, ImportError> {
        let source_language = self.glossary.source_language.clone();
        repository::add_glossary_other_languages(
            self.conn,
            self.glossary.id,
            self.languages
                .iter()
                .map(String::as_str)
                .filter(|code| *code != source_language),
        )?;

        self.summary.links = resolver::resolve_relations(self.conn, &self.pool)?;

        for (concept_id, repr) in &self.pending_reprs {
            repository::set_repr_cache(self.conn, *concept_id, Some(repr))?;
        }

        self.summary.languages = self.languages.into_iter().collect();
        Ok(self.summary)
    }
}
