/*!
 * Export aggregation.
 *
 * Collects the content of one or more glossaries into the nested
 * concept / language / term structure written to TBX. Concepts are
 * streamed in (glossary, id) order and loaded in keyset pages, with the
 * translations, definitions and resources of a page fetched together.
 *
 * A concept is exported when it has content or when an exported concept
 * links to it, so every written link points at a written entry.
 */

use log::debug;
use rusqlite::{Connection, ToSql, params_from_iter};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use crate::concept_repr::quality_rank;
use crate::database::models::{GlossaryRecord, TermFilter};
use crate::database::repository::{self, MAX_SQL_PARAMETERS, placeholders};
use crate::errors::ExportError;

/// Title used when several glossaries are exported together
pub const MULTI_GLOSSARY_TITLE: &str = "TBX exported glossary";

/// Export settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    /// Languages the caller is interested in
    pub desired_languages: Vec<String>,
    /// Export only the desired languages
    pub restrict_to_desired_languages: bool,
    /// Include definitions that are not finalized
    pub all_definitions: bool,
    /// Which translations survive, by administrative status
    pub term_filter: TermFilter,
    /// Concepts loaded per page
    pub batch_size: usize,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            desired_languages: Vec::new(),
            restrict_to_desired_languages: false,
            all_definitions: false,
            term_filter: TermFilter::All,
            batch_size: MAX_SQL_PARAMETERS,
        }
    }
}

/// Title and description of the exported file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportHeader {
    pub title: String,
    pub description: String,
}

impl ExportHeader {
    /// Header for the given glossaries
    pub fn for_glossaries(glossaries: &[GlossaryRecord]) -> Self {
        match glossaries {
            [single] => Self {
                title: single.name.clone(),
                description: single.description.clone(),
            },
            _ => Self {
                title: MULTI_GLOSSARY_TITLE.to_string(),
                description: format!(
                    "TBX file created by exporting the following glossaries: {}",
                    glossaries
                        .iter()
                        .map(|g| g.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            },
        }
    }
}

/// Another concept referenced by an exported concept
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConceptLink {
    pub id: i64,
    /// Display representation of the target
    pub repr: String,
}

impl ConceptLink {
    fn new(id: i64, repr_cache: Option<String>) -> Self {
        let repr = repr_cache
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| format!("Concept #{}", id));
        Self { id, repr }
    }
}

/// A concept with its per-language content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportConcept {
    pub id: i64,
    pub glossary_id: i64,
    pub subject_field: Option<ConceptLink>,
    pub broader: Option<ConceptLink>,
    /// Related concept ids, empty unless related links are exported
    pub related: Vec<i64>,
    /// Languages with content, ascending by code
    pub languages: Vec<ExportLanguage>,
}

/// Content of one (concept, language) bucket
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportLanguage {
    pub language: String,
    pub definition: Option<ExportDefinition>,
    pub resources: Vec<ExportResource>,
    /// Ordered by quality rank, then lowercase text
    pub translations: Vec<ExportTranslation>,
}

impl ExportLanguage {
    fn has_content(&self) -> bool {
        self.definition.is_some() || !self.resources.is_empty() || !self.translations.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDefinition {
    pub id: i64,
    pub text: String,
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResource {
    pub id: i64,
    /// TBX representation of the link type
    pub link_type: String,
    pub address: String,
    pub description: String,
}

/// A translation with its vocabulary resolved to TBX representations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportTranslation {
    pub id: i64,
    pub text: String,
    pub is_finalized: bool,
    pub part_of_speech: Option<String>,
    pub grammatical_gender: Option<String>,
    pub grammatical_number: Option<String>,
    pub administrative_status: Option<String>,
    /// Reason name, only present with a status
    pub administrative_status_reason: Option<String>,
    pub note: String,
    pub context_sentences: Vec<String>,
    /// (address, description) pairs
    pub corpus_examples: Vec<(String, String)>,
}

/// Everything needed to write a TBX file
pub struct ExportDocument<'c> {
    pub header: ExportHeader,
    /// Languages that carry content, ascending
    pub languages: Vec<String>,
    /// Whether any exported concept is the target of a related link
    pub use_related_concepts: bool,
    /// Concepts with content and the link targets they need, streamed
    pub concepts: ConceptStream<'c>,
}

/// Build the export of the given glossaries
pub fn aggregate<'c>(
    conn: &'c Connection,
    glossary_ids: &[i64],
    options: &ExportOptions,
) -> Result<ExportDocument<'c>, ExportError> {
    if glossary_ids.is_empty() {
        return Err(ExportError::NoGlossaries);
    }

    let mut glossaries = Vec::with_capacity(glossary_ids.len());
    for id in glossary_ids {
        let glossary = repository::get_glossary(conn, *id)?
            .ok_or_else(|| ExportError::UnknownGlossary(id.to_string()))?;
        glossaries.push(glossary);
    }

    let mut ids: Vec<i64> = glossaries.iter().map(|g| g.id).collect();
    ids.sort_unstable();
    ids.dedup();

    let languages = emitted_languages(conn, &ids, options)?;
    let use_related_concepts = uses_related_concepts(conn, &ids)?;
    let exported = exported_concepts(conn, &ids, options, &languages, use_related_concepts)?;

    for desired in &options.desired_languages {
        if !languages.contains(desired) {
            debug!("Desired language {} has no content in the export", desired);
        }
    }
    debug!(
        "Exporting glossaries {:?} in languages {:?} (related concepts: {})",
        ids, languages, use_related_concepts
    );

    Ok(ExportDocument {
        header: ExportHeader::for_glossaries(&glossaries),
        languages: languages.iter().cloned().collect(),
        use_related_concepts,
        concepts: ConceptStream {
            conn,
            glossary_ids: ids,
            options: options.clone(),
            batch_size: options.batch_size.clamp(1, MAX_SQL_PARAMETERS),
            languages,
            use_related_concepts,
            exported,
            cursor: (0, 0),
            buffer: VecDeque::new(),
            exhausted: false,
        },
    })
}

/// Languages with at least one surviving translation, definition or resource
fn emitted_languages(
    conn: &Connection,
    glossary_ids: &[i64],
    options: &ExportOptions,
) -> Result<BTreeSet<String>, ExportError> {
    let in_glossaries = placeholders(glossary_ids.len());
    let mut languages = BTreeSet::new();

    let mut stmt = conn.prepare(&format!(
        r#"
        SELECT DISTINCT t.language, s.tbx_representation
        FROM translations t
        JOIN concepts c ON c.id = t.concept_id
        LEFT JOIN administrative_statuses s ON s.id = t.administrative_status_id
        WHERE c.glossary_id IN ({})
        "#,
        in_glossaries
    ))?;
    let rows = stmt.query_map(params_from_iter(glossary_ids), |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
    })?;
    for row in rows {
        let (language, status) = row?;
        if options.term_filter.accepts(status.as_deref()) {
            languages.insert(language);
        }
    }

    let mut stmt = conn.prepare(&format!(
        r#"
        SELECT DISTINCT d.language, d.is_finalized
        FROM definitions d
        JOIN concepts c ON c.id = d.concept_id
        WHERE c.glossary_id IN ({})
        "#,
        in_glossaries
    ))?;
    let rows = stmt.query_map(params_from_iter(glossary_ids), |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, bool>(1)?))
    })?;
    for row in rows {
        let (language, finalized) = row?;
        if finalized || options.all_definitions {
            languages.insert(language);
        }
    }

    let mut stmt = conn.prepare(&format!(
        r#"
        SELECT DISTINCT r.language
        FROM external_resources r
        JOIN concepts c ON c.id = r.concept_id
        WHERE c.glossary_id IN ({}) AND r.language IS NOT NULL
        "#,
        in_glossaries
    ))?;
    let rows = stmt.query_map(params_from_iter(glossary_ids), |row| row.get::<_, String>(0))?;
    for row in rows {
        languages.insert(row?);
    }

    if options.restrict_to_desired_languages {
        languages.retain(|l| options.desired_languages.contains(l));
    }

    Ok(languages)
}

/// Whether any concept of the glossaries is the target of a related link
fn uses_related_concepts(conn: &Connection, glossary_ids: &[i64]) -> Result<bool, ExportError> {
    let sql = format!(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM concept_related_concepts r
            JOIN concepts c ON c.id = r.to_concept_id
            WHERE c.glossary_id IN ({})
        )
        "#,
        placeholders(glossary_ids.len())
    );
    Ok(conn.query_row(&sql, params_from_iter(glossary_ids), |row| row.get(0))?)
}

/// Concepts written by the export
///
/// Starts from the concepts with surviving content in an emitted language and
/// follows subject field, broader and (when used) related links inside the
/// exported glossaries. Only ids are held in memory.
fn exported_concepts(
    conn: &Connection,
    glossary_ids: &[i64],
    options: &ExportOptions,
    languages: &BTreeSet<String>,
    use_related_concepts: bool,
) -> Result<HashSet<i64>, ExportError> {
    let in_glossaries = placeholders(glossary_ids.len());
    let mut members = HashSet::new();
    let mut links: HashMap<i64, Vec<i64>> = HashMap::new();

    let mut stmt = conn.prepare(&format!(
        "SELECT id, subject_field_id, broader_concept_id FROM concepts WHERE glossary_id IN ({})",
        in_glossaries
    ))?;
    let rows = stmt.query_map(params_from_iter(glossary_ids), |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, Option<i64>>(1)?,
            row.get::<_, Option<i64>>(2)?,
        ))
    })?;
    for row in rows {
        let (id, subject_field, broader) = row?;
        members.insert(id);
        let targets = links.entry(id).or_default();
        targets.extend(subject_field);
        targets.extend(broader);
    }

    if use_related_concepts {
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT r.from_concept_id, r.to_concept_id
            FROM concept_related_concepts r
            JOIN concepts c ON c.id = r.from_concept_id
            WHERE c.glossary_id IN ({})
            "#,
            in_glossaries
        ))?;
        let rows = stmt.query_map(params_from_iter(glossary_ids), |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            let (from, to) = row?;
            links.entry(from).or_default().push(to);
        }
    }

    let mut with_content = HashSet::new();

    let mut stmt = conn.prepare(&format!(
        r#"
        SELECT t.concept_id, t.language, s.tbx_representation
        FROM translations t
        JOIN concepts c ON c.id = t.concept_id
        LEFT JOIN administrative_statuses s ON s.id = t.administrative_status_id
        WHERE c.glossary_id IN ({})
        "#,
        in_glossaries
    ))?;
    let rows = stmt.query_map(params_from_iter(glossary_ids), |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, Option<String>>(2)?,
        ))
    })?;
    for row in rows {
        let (concept_id, language, status) = row?;
        if languages.contains(&language) && options.term_filter.accepts(status.as_deref()) {
            with_content.insert(concept_id);
        }
    }

    let mut stmt = conn.prepare(&format!(
        r#"
        SELECT d.concept_id, d.language
        FROM definitions d
        JOIN concepts c ON c.id = d.concept_id
        WHERE c.glossary_id IN ({}) AND (d.is_finalized = 1 OR ?)
        UNION
        SELECT r.concept_id, r.language
        FROM external_resources r
        JOIN concepts c ON c.id = r.concept_id
        WHERE c.glossary_id IN ({}) AND r.language IS NOT NULL
        "#,
        in_glossaries, in_glossaries
    ))?;
    let mut values: Vec<&dyn ToSql> = glossary_ids.iter().map(|id| id as &dyn ToSql).collect();
    values.push(&options.all_definitions);
    values.extend(glossary_ids.iter().map(|id| id as &dyn ToSql));
    let rows = stmt.query_map(params_from_iter(values), |row| {
        Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
    })?;
    for row in rows {
        let (concept_id, language) = row?;
        if languages.contains(&language) {
            with_content.insert(concept_id);
        }
    }

    let mut exported = HashSet::with_capacity(with_content.len());
    let mut pending: Vec<i64> = with_content.into_iter().collect();
    while let Some(id) = pending.pop() {
        if !exported.insert(id) {
            continue;
        }
        for target in links.get(&id).into_iter().flatten() {
            if members.contains(target) && !exported.contains(target) {
                pending.push(*target);
            }
        }
    }

    Ok(exported)
}

/// Lazy sequence of exported concepts
pub struct ConceptStream<'c> {
    conn: &'c Connection,
    glossary_ids: Vec<i64>,
    options: ExportOptions,
    batch_size: usize,
    languages: BTreeSet<String>,
    use_related_concepts: bool,
    exported: HashSet<i64>,
    /// Last (glossary id, concept id) loaded
    cursor: (i64, i64),
    buffer: VecDeque<ExportConcept>,
    exhausted: bool,
}

impl Iterator for ConceptStream<'_> {
    type Item = Result<ExportConcept, ExportError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(concept) = self.buffer.pop_front() {
                return Some(Ok(concept));
            }
            if self.exhausted {
                return None;
            }
            if let Err(error) = self.load_page() {
                self.exhausted = true;
                return Some(Err(error));
            }
        }
    }
}

/// Concept row of a page, before its content is attached
struct PageConcept {
    id: i64,
    glossary_id: i64,
    subject_field: Option<ConceptLink>,
    broader: Option<ConceptLink>,
}

type BucketKey = (i64, String);

impl ConceptStream<'_> {
    fn load_page(&mut self) -> Result<(), ExportError> {
        let page = self.load_concepts()?;
        if page.len() < self.batch_size {
            self.exhausted = true;
        }
        let Some(last) = page.last() else {
            return Ok(());
        };
        self.cursor = (last.glossary_id, last.id);

        let ids: Vec<i64> = page.iter().map(|c| c.id).collect();
        let mut buckets: HashMap<BucketKey, ExportLanguage> = HashMap::new();

        self.load_translations(&ids, &mut buckets)?;
        self.load_definitions(&ids, &mut buckets)?;
        self.load_resources(&ids, &mut buckets)?;
        let mut related = if self.use_related_concepts {
            self.load_related(&ids)?
        } else {
            HashMap::new()
        };

        let loaded = page.len();
        for concept in page {
            let languages: Vec<ExportLanguage> = self
                .languages
                .iter()
                .filter_map(|language| buckets.remove(&(concept.id, language.clone())))
                .filter(ExportLanguage::has_content)
                .map(|mut bucket| {
                    bucket.translations.sort_by(|a, b| {
                        quality_rank(a.administrative_status.as_deref())
                            .cmp(&quality_rank(b.administrative_status.as_deref()))
                            .then_with(|| a.text.to_lowercase().cmp(&b.text.to_lowercase()))
                            .then_with(|| a.id.cmp(&b.id))
                    });
                    bucket
                })
                .collect();

            if !self.exported.contains(&concept.id) {
                debug!("Concept {} has no exportable content, skipped", concept.id);
                continue;
            }

            // Links leaving the export are dropped
            let mut related = related.remove(&concept.id).unwrap_or_default();
            related.retain(|id| self.exported.contains(id));

            self.buffer.push_back(ExportConcept {
                id: concept.id,
                glossary_id: concept.glossary_id,
                subject_field: concept.subject_field.filter(|l| self.exported.contains(&l.id)),
                broader: concept.broader.filter(|l| self.exported.contains(&l.id)),
                related,
                languages,
            });
        }

        debug!(
            "Loaded export page of {} concepts ({} with content)",
            loaded,
            self.buffer.len()
        );
        Ok(())
    }

    fn load_concepts(&self) -> Result<Vec<PageConcept>, ExportError> {
        let sql = format!(
            r#"
            SELECT c.id, c.glossary_id,
                   c.subject_field_id, sf.repr_cache,
                   c.broader_concept_id, bc.repr_cache
            FROM concepts c
            LEFT JOIN concepts sf ON sf.id = c.subject_field_id
            LEFT JOIN concepts bc ON bc.id = c.broader_concept_id
            WHERE c.glossary_id IN ({})
              AND (c.glossary_id > ? OR (c.glossary_id = ? AND c.id > ?))
            ORDER BY c.glossary_id, c.id
            LIMIT ?
            "#,
            placeholders(self.glossary_ids.len())
        );

        let mut values: Vec<i64> = self.glossary_ids.clone();
        values.extend([self.cursor.0, self.cursor.0, self.cursor.1, self.batch_size as i64]);

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), |row| {
            let link = |id: Option<i64>, repr: Option<String>| id.map(|id| ConceptLink::new(id, repr));
            Ok(PageConcept {
                id: row.get(0)?,
                glossary_id: row.get(1)?,
                subject_field: link(row.get(2)?, row.get(3)?),
                broader: link(row.get(4)?, row.get(5)?),
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn load_translations(
        &self,
        concept_ids: &[i64],
        buckets: &mut HashMap<BucketKey, ExportLanguage>,
    ) -> Result<(), ExportError> {
        let sql = format!(
            r#"
            SELECT t.id, t.concept_id, t.language, t.translation_text, t.is_finalized, t.note,
                   pos.tbx_representation, gen.tbx_representation, num.tbx_representation,
                   sts.tbx_representation, rsn.name
            FROM translations t
            LEFT JOIN parts_of_speech pos ON pos.id = t.part_of_speech_id
            LEFT JOIN grammatical_genders gen ON gen.id = t.grammatical_gender_id
            LEFT JOIN grammatical_numbers num ON num.id = t.grammatical_number_id
            LEFT JOIN administrative_statuses sts ON sts.id = t.administrative_status_id
            LEFT JOIN administrative_status_reasons rsn ON rsn.id = t.administrative_status_reason_id
            WHERE t.concept_id IN ({})
            ORDER BY t.id
            "#,
            placeholders(concept_ids.len())
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(concept_ids), |row| {
            let translation = ExportTranslation {
                id: row.get(0)?,
                text: row.get(3)?,
                is_finalized: row.get(4)?,
                note: row.get(5)?,
                part_of_speech: row.get(6)?,
                grammatical_gender: row.get(7)?,
                grammatical_number: row.get(8)?,
                administrative_status: row.get(9)?,
                administrative_status_reason: row.get(10)?,
                ..Default::default()
            };
            Ok((row.get::<_, i64>(1)?, row.get::<_, String>(2)?, translation))
        })?;

        let mut survivors = Vec::new();
        for row in rows {
            let (concept_id, language, translation) = row?;
            if !self.languages.contains(&language)
                || !self
                    .options
                    .term_filter
                    .accepts(translation.administrative_status.as_deref())
            {
                continue;
            }
            survivors.push((concept_id, language, translation));
        }

        let translation_ids: Vec<i64> = survivors.iter().map(|(_, _, t)| t.id).collect();
        let mut sentences = self.load_context_sentences(&translation_ids)?;
        let mut examples = self.load_corpus_examples(&translation_ids)?;

        for (concept_id, language, mut translation) in survivors {
            translation.context_sentences = sentences.remove(&translation.id).unwrap_or_default();
            translation.corpus_examples = examples.remove(&translation.id).unwrap_or_default();
            bucket(buckets, concept_id, language).translations.push(translation);
        }
        Ok(())
    }

    fn load_context_sentences(&self, translation_ids: &[i64]) -> Result<HashMap<i64, Vec<String>>, ExportError> {
        let mut sentences: HashMap<i64, Vec<String>> = HashMap::new();
        for chunk in translation_ids.chunks(MAX_SQL_PARAMETERS) {
            let sql = format!(
                "SELECT translation_id, text FROM context_sentences WHERE translation_id IN ({}) ORDER BY id",
                placeholders(chunk.len())
            );
            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(chunk), |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
            })?;
            for row in rows {
                let (translation_id, text) = row?;
                sentences.entry(translation_id).or_default().push(text);
            }
        }
        Ok(sentences)
    }

    fn load_corpus_examples(
        &self,
        translation_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<(String, String)>>, ExportError> {
        let mut examples: HashMap<i64, Vec<(String, String)>> = HashMap::new();
        for chunk in translation_ids.chunks(MAX_SQL_PARAMETERS) {
            let sql = format!(
                "SELECT translation_id, address, description FROM corpus_examples WHERE translation_id IN ({}) ORDER BY id",
                placeholders(chunk.len())
            );
            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(chunk), |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    (row.get::<_, String>(1)?, row.get::<_, String>(2)?),
                ))
            })?;
            for row in rows {
                let (translation_id, example) = row?;
                examples.entry(translation_id).or_default().push(example);
            }
        }
        Ok(examples)
    }

    fn load_definitions(
        &self,
        concept_ids: &[i64],
        buckets: &mut HashMap<BucketKey, ExportLanguage>,
    ) -> Result<(), ExportError> {
        let sql = format!(
            r#"
            SELECT id, concept_id, language, text, source
            FROM definitions
            WHERE concept_id IN ({}) AND (is_finalized = 1 OR ?)
            ORDER BY id
            "#,
            placeholders(concept_ids.len())
        );

        let mut values: Vec<&dyn ToSql> = concept_ids.iter().map(|id| id as &dyn ToSql).collect();
        values.push(&self.options.all_definitions);

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), |row| {
            let source: String = row.get(4)?;
            Ok((
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                ExportDefinition {
                    id: row.get(0)?,
                    text: row.get(3)?,
                    source: if source.is_empty() { None } else { Some(source) },
                },
            ))
        })?;

        // Rows come by ascending id, so the last one per bucket wins
        for row in rows {
            let (concept_id, language, definition) = row?;
            if self.languages.contains(&language) {
                bucket(buckets, concept_id, language).definition = Some(definition);
            }
        }
        Ok(())
    }

    fn load_resources(
        &self,
        concept_ids: &[i64],
        buckets: &mut HashMap<BucketKey, ExportLanguage>,
    ) -> Result<(), ExportError> {
        let sql = format!(
            r#"
            SELECT r.id, r.concept_id, r.language, lt.tbx_representation, r.address, r.description
            FROM external_resources r
            JOIN external_link_types lt ON lt.id = r.link_type_id
            WHERE r.concept_id IN ({}) AND r.language IS NOT NULL
            ORDER BY r.id
            "#,
            placeholders(concept_ids.len())
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(concept_ids), |row| {
            Ok((
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                ExportResource {
                    id: row.get(0)?,
                    link_type: row.get(3)?,
                    address: row.get(4)?,
                    description: row.get(5)?,
                },
            ))
        })?;

        for row in rows {
            let (concept_id, language, resource) = row?;
            if self.languages.contains(&language) {
                bucket(buckets, concept_id, language).resources.push(resource);
            }
        }
        Ok(())
    }

    fn load_related(&self, concept_ids: &[i64]) -> Result<HashMap<i64, Vec<i64>>, ExportError> {
        let sql = format!(
            r#"
            SELECT from_concept_id, to_concept_id FROM concept_related_concepts
            WHERE from_concept_id IN ({})
            ORDER BY id
            "#,
            placeholders(concept_ids.len())
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(concept_ids), |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut related: HashMap<i64, Vec<i64>> = HashMap::new();
        for row in rows {
            let (from, to) = row?;
            related.entry(from).or_default().push(to);
        }
        Ok(related)
    }
}

fn bucket(
    buckets: &mut HashMap<BucketKey, ExportLanguage>,
    concept_id: i64,
    language: String,
) -> &mut ExportLanguage {
    buckets
        .entry((concept_id, language.clone()))
        .or_insert_with(|| ExportLanguage {
            language,
            ..Default::default()
        })
}
