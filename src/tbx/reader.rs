/*!
 * TBX document reader.
 *
 * Parses a TBX (TermBase eXchange) document and yields its concept
 * entries one at a time. Only the subset of TBX-Basic written by the
 * exporter and commonly found in the wild is understood; anything else
 * is skipped.
 */

use log::debug;
use roxmltree::{Document, Node, ParsingOptions};
use std::collections::{BTreeSet, HashSet};

use crate::errors::TbxError;

/// Namespace bound to the `xml:` prefix
const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Title and description found in the martif header
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TbxHeader {
    /// Content of `titleStmt/title`
    pub title: Option<String>,
    /// Content of the first `sourceDesc/p`
    pub description: Option<String>,
}

/// One `termEntry`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConceptEntry {
    /// The `id` attribute, if present and non-empty
    pub local_id: Option<String>,
    /// 1-based position of the entry in the document
    pub ordinal: usize,
    /// Local id of the subject field concept
    pub subject_field: Option<String>,
    /// Local id of the broader concept
    pub broader: Option<String>,
    /// Local ids of related concepts, in document order
    pub related: Vec<String>,
    /// Language sections
    pub languages: Vec<LanguageBlock>,
}

impl ConceptEntry {
    /// Name used for this entry in messages
    pub fn label(&self) -> String {
        entry_label(self.local_id.as_deref(), self.ordinal)
    }
}

fn entry_label(local_id: Option<&str>, ordinal: usize) -> String {
    match local_id {
        Some(id) => format!("\"{}\"", id),
        None => format!("#{} (no id)", ordinal),
    }
}

/// One `langSet`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageBlock {
    /// Value of `xml:lang`
    pub language: String,
    /// First non-empty definition
    pub definition: Option<DefinitionText>,
    /// `xref` elements directly under the `langSet`
    pub resources: Vec<ResourceRef>,
    /// One group per `tig` with a term
    pub terms: Vec<TermGroup>,
}

/// A definition and where it comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionText {
    /// Definition text
    pub text: String,
    /// `target` of the first `xref` in the enclosing `descripGrp`
    pub source: Option<String>,
}

/// An external resource reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    /// The `type` attribute, naming an external link type
    pub link_type: String,
    /// The `target` attribute
    pub target: String,
    /// Element text
    pub description: String,
}

/// One `tig`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermGroup {
    /// Text of the first `term`
    pub term: String,
    /// Typed term notes in document order
    pub notes: Vec<TermNote>,
    /// Text of the first `note` directly under the `tig`
    pub note: Option<String>,
    /// `descrip type="context"` texts
    pub context_sentences: Vec<String>,
    /// `xref type="corpusTrace"` with both target and text
    pub corpus_examples: Vec<CorpusTrace>,
}

/// A corpus example reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusTrace {
    /// The `target` attribute
    pub address: String,
    /// Element text
    pub description: String,
}

/// A `termNote`, by its `type` attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermNote {
    PartOfSpeech(String),
    TermType(String),
    GrammaticalGender(String),
    GrammaticalNumber(String),
    /// Status, with the first `note` of the enclosing `termGrp` when nested
    AdministrativeStatus {
        value: String,
        reason: Option<String>,
    },
    ProcessStatus(String),
    /// Any other note type
    Unsupported {
        kind: String,
    },
}

/// A parsed TBX document
pub struct TbxDocument<'input> {
    document: Document<'input>,
}

impl<'input> TbxDocument<'input> {
    /// Parse the XML text; a DOCTYPE declaration is accepted
    pub fn parse(text: &'input str) -> Result<Self, TbxError> {
        let options = ParsingOptions {
            allow_dtd: true,
            ..ParsingOptions::default()
        };
        let document = Document::parse_with_options(text, options)
            .map_err(|e| TbxError::Malformed(e.to_string()))?;

        Ok(Self { document })
    }

    /// The XML text the document was parsed from
    pub fn text(&self) -> &'input str {
        self.document.input_text()
    }

    /// Title and description from the header
    pub fn header(&self) -> TbxHeader {
        let root = self.document.root();
        let title = find_descendant(root, "title").and_then(|n| non_empty(text_of(n)));
        let description = find_descendant(root, "sourceDesc")
            .and_then(|desc| find_descendant(desc, "p"))
            .and_then(|n| non_empty(text_of(n)));

        TbxHeader { title, description }
    }

    /// Number of concept entries in the document
    pub fn entry_count(&self) -> usize {
        self.document
            .descendants()
            .filter(|n| is_element(*n, "termEntry"))
            .count()
    }

    /// Lazily scan concept entries
    ///
    /// The iterator stops after the first error.
    pub fn entries<'a>(&'a self, known_languages: &'a BTreeSet<String>) -> ConceptEntries<'a, 'input> {
        ConceptEntries {
            nodes: self.document.descendants(),
            known_languages,
            seen_ids: HashSet::new(),
            ordinal: 0,
            failed: false,
        }
    }
}

/// Iterator over the concept entries of a document
pub struct ConceptEntries<'a, 'input> {
    nodes: roxmltree::Descendants<'a, 'input>,
    known_languages: &'a BTreeSet<String>,
    seen_ids: HashSet<String>,
    ordinal: usize,
    failed: bool,
}

impl Iterator for ConceptEntries<'_, '_> {
    type Item = Result<ConceptEntry, TbxError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let node = self.nodes.by_ref().find(|n| is_element(*n, "termEntry"))?;
        self.ordinal += 1;

        let result = self.read_entry(node);
        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }
}

impl ConceptEntries<'_, '_> {
    fn read_entry(&mut self, entry: Node) -> Result<ConceptEntry, TbxError> {
        let local_id = entry.attribute("id").and_then(|id| non_empty(id.to_string()));

        if let Some(id) = &local_id {
            if !self.seen_ids.insert(id.clone()) {
                return Err(TbxError::DuplicateEntryId { id: id.clone() });
            }
        }

        let label = entry_label(local_id.as_deref(), self.ordinal);
        let mut subject_field = None;
        let mut broader = None;

        for descrip in entry.descendants().filter(|n| is_element(*n, "descrip")) {
            match descrip.attribute("type") {
                Some("subjectField") => {
                    // The descrip text is ignored: the field is another concept
                    let group = descrip.parent().filter(|p| is_element(*p, "descripGrp"));
                    if let Some(target) = group
                        .and_then(|g| find_descendant(g, "ref"))
                        .and_then(|r| r.attribute("target"))
                        .filter(|t| !t.is_empty())
                    {
                        subject_field = Some(target.to_string());
                    }
                }
                Some("broaderConceptGeneric") => {
                    if let Some(target) = descrip.attribute("target").filter(|t| !t.is_empty()) {
                        broader = Some(target.to_string());
                    }
                }
                _ => {}
            }
        }

        let related = entry
            .children()
            .filter(|n| is_element(*n, "ref") && n.attribute("type") == Some("crossReference"))
            .filter_map(|n| n.attribute("target"))
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();

        let mut languages = Vec::new();
        for lang_set in entry.descendants().filter(|n| is_element(*n, "langSet")) {
            languages.push(self.read_language(lang_set, &label)?);
        }

        Ok(ConceptEntry {
            local_id,
            ordinal: self.ordinal,
            subject_field,
            broader,
            related,
            languages,
        })
    }

    fn read_language(&self, lang_set: Node, label: &str) -> Result<LanguageBlock, TbxError> {
        let language = lang_set
            .attribute((XML_NAMESPACE, "lang"))
            .filter(|l| !l.is_empty())
            .ok_or_else(|| TbxError::MissingLanguage {
                concept: label.to_string(),
            })?;

        if !self.known_languages.contains(language) {
            return Err(TbxError::UnknownLanguage {
                code: language.to_string(),
                concept: label.to_string(),
            });
        }

        // Only the first definition counts, even when it is empty
        let definition = lang_set
            .descendants()
            .find(|n| is_element(*n, "descrip") && n.attribute("type") == Some("definition"))
            .and_then(|descrip| {
                let text = non_empty(text_of(descrip))?;
                let source = descrip
                    .parent()
                    .filter(|p| is_element(*p, "descripGrp"))
                    .and_then(|g| find_descendant(g, "xref"))
                    .and_then(|x| x.attribute("target"))
                    .and_then(|t| non_empty(t.to_string()));
                Some(DefinitionText { text, source })
            });

        let resources = lang_set
            .children()
            .filter(|n| is_element(*n, "xref"))
            .map(|xref| ResourceRef {
                link_type: xref.attribute("type").unwrap_or_default().to_string(),
                target: xref.attribute("target").unwrap_or_default().to_string(),
                description: text_of(xref),
            })
            .collect();

        let terms = lang_set
            .descendants()
            .filter(|n| is_element(*n, "tig"))
            .filter_map(read_term_group)
            .collect();

        Ok(LanguageBlock {
            language: language.to_string(),
            definition,
            resources,
            terms,
        })
    }
}

fn read_term_group(tig: Node) -> Option<TermGroup> {
    let term = text_of(find_descendant(tig, "term")?);
    if term.is_empty() {
        debug!("Skipping tig with an empty term");
        return None;
    }

    let notes = tig
        .descendants()
        .filter(|n| is_element(*n, "termNote"))
        .map(|note| read_term_note(tig, note))
        .collect();

    let note = tig
        .children()
        .find(|n| is_element(*n, "note"))
        .and_then(|n| non_empty(text_of(n)));

    let context_sentences = tig
        .descendants()
        .filter(|n| is_element(*n, "descrip") && n.attribute("type") == Some("context"))
        .map(text_of)
        .collect();

    let corpus_examples = tig
        .descendants()
        .filter(|n| is_element(*n, "xref") && n.attribute("type") == Some("corpusTrace"))
        .filter_map(|xref| {
            let address = xref.attribute("target").filter(|t| !t.is_empty())?;
            let description = non_empty(text_of(xref))?;
            Some(CorpusTrace {
                address: address.to_string(),
                description,
            })
        })
        .collect();

    Some(TermGroup {
        term,
        notes,
        note,
        context_sentences,
        corpus_examples,
    })
}

fn read_term_note(tig: Node, note: Node) -> TermNote {
    let value = text_of(note);
    match note.attribute("type").unwrap_or_default() {
        "partOfSpeech" => TermNote::PartOfSpeech(value),
        "termType" => TermNote::TermType(value),
        "grammaticalGender" => TermNote::GrammaticalGender(value),
        "grammaticalNumber" => TermNote::GrammaticalNumber(value),
        "administrativeStatus" => {
            // A reason only exists inside a termGrp
            let reason = note
                .parent()
                .filter(|p| *p != tig)
                .and_then(|group| find_descendant(group, "note"))
                .map(text_of);
            TermNote::AdministrativeStatus { value, reason }
        }
        "processStatus" => TermNote::ProcessStatus(value),
        other => TermNote::Unsupported {
            kind: other.to_string(),
        },
    }
}

fn is_element(node: Node, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name
}

fn find_descendant<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.descendants().skip(1).find(|n| is_element(*n, name))
}

/// Concatenated direct text children, trimmed
fn text_of(node: Node) -> String {
    node.children()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect::<String>()
        .trim()
        .to_string()
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() { None } else { Some(text) }
}
