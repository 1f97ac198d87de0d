/*!
 * TBX document writer.
 *
 * Streams aggregated concepts to any `io::Write` as TBX-Basic. Output is
 * deterministic for identical input and can be read back by the importer.
 */

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io::Write;

use crate::database::models::GlossaryRecord;
use crate::errors::ExportError;
use crate::tbx::aggregator::{
    ExportConcept, ExportDocument, ExportHeader, ExportLanguage, ExportTranslation,
};

/// Document type declaration written at the top of every file
const DOCTYPE: &str = r#"martif SYSTEM "TBXcoreStructV02.dtd""#;

/// Constraint specification the files conform to
const XCS_NAME: &str = "TBXBasicXCSV02.xcs";

/// Filename used when several glossaries are exported together
pub const MULTI_GLOSSARY_FILENAME: &str = "exported_glossaries.tbx";

/// Counts of what was written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
    pub concepts: usize,
    pub translations: usize,
}

/// Suggested name for an exported file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFilename {
    /// File name, percent-encoded
    pub filename: String,
    /// Matching `Content-Disposition` header value
    pub content_disposition: String,
}

/// Suggested filename for the export of the given glossaries
pub fn suggested_filename(glossaries: &[GlossaryRecord]) -> ExportFilename {
    match glossaries {
        [single] => {
            let encoded = format!("{}.tbx", urlencoding::encode(&single.name));
            ExportFilename {
                content_disposition: format!(
                    "attachment; filename=\"{0}\"; filename*=UTF-8''{0}",
                    encoded
                ),
                filename: encoded,
            }
        }
        _ => ExportFilename {
            filename: MULTI_GLOSSARY_FILENAME.to_string(),
            content_disposition: format!("attachment; filename={}", MULTI_GLOSSARY_FILENAME),
        },
    }
}

/// Write an aggregated export
pub fn write_document<W: Write>(document: ExportDocument<'_>, out: W) -> Result<WriteStats, ExportError> {
    write_tbx(
        &document.header,
        &document.languages,
        document.use_related_concepts,
        document.concepts,
        out,
    )
}

/// Write a TBX file from its parts
///
/// Concepts are consumed one at a time; the first error stops the output.
pub fn write_tbx<W, I>(
    header: &ExportHeader,
    languages: &[String],
    use_related_concepts: bool,
    concepts: I,
    out: W,
) -> Result<WriteStats, ExportError>
where
    W: Write,
    I: IntoIterator<Item = Result<ExportConcept, ExportError>>,
{
    let mut tbx = TbxWriter {
        writer: Writer::new_with_indent(out, b' ', 2),
        use_related_concepts,
        stats: WriteStats::default(),
    };

    tbx.write_prologue(header, languages.first().map_or("en", String::as_str))?;
    for concept in concepts {
        tbx.write_concept(&concept?)?;
    }
    tbx.write_epilogue()?;

    tbx.writer.into_inner().flush()?;
    Ok(tbx.stats)
}

struct TbxWriter<W: Write> {
    writer: Writer<W>,
    use_related_concepts: bool,
    stats: WriteStats,
}

impl<W: Write> TbxWriter<W> {
    fn start(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<(), ExportError> {
        let mut element = BytesStart::new(name);
        for attribute in attributes {
            element.push_attribute(*attribute);
        }
        self.writer.write_event(Event::Start(element))?;
        Ok(())
    }

    fn end(&mut self, name: &str) -> Result<(), ExportError> {
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    fn empty(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<(), ExportError> {
        let mut element = BytesStart::new(name);
        for attribute in attributes {
            element.push_attribute(*attribute);
        }
        self.writer.write_event(Event::Empty(element))?;
        Ok(())
    }

    fn text_element(
        &mut self,
        name: &str,
        attributes: &[(&str, &str)],
        text: &str,
    ) -> Result<(), ExportError> {
        self.start(name, attributes)?;
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }

    fn write_prologue(&mut self, header: &ExportHeader, language: &str) -> Result<(), ExportError> {
        self.writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        self.writer
            .write_event(Event::DocType(BytesText::from_escaped(DOCTYPE)))?;

        self.start("martif", &[("type", "TBX"), ("xml:lang", language)])?;
        self.start("martifHeader", &[])?;
        self.start("fileDesc", &[])?;
        self.start("titleStmt", &[])?;
        self.text_element("title", &[], &header.title)?;
        self.end("titleStmt")?;
        self.start("sourceDesc", &[])?;
        self.text_element("p", &[], &header.description)?;
        self.end("sourceDesc")?;
        self.end("fileDesc")?;
        self.start("encodingDesc", &[])?;
        self.text_element("p", &[("type", "XCSURI")], XCS_NAME)?;
        self.end("encodingDesc")?;
        self.end("martifHeader")?;
        self.start("text", &[])?;
        self.start("body", &[])
    }

    fn write_epilogue(&mut self) -> Result<(), ExportError> {
        self.end("body")?;
        self.end("text")?;
        self.end("martif")
    }

    fn write_concept(&mut self, concept: &ExportConcept) -> Result<(), ExportError> {
        self.start("termEntry", &[("id", concept_key(concept.id).as_str())])?;

        if let Some(subject) = &concept.subject_field {
            self.start("descripGrp", &[])?;
            self.text_element("descrip", &[("type", "subjectField")], &subject.repr)?;
            self.empty(
                "ref",
                &[("type", "conceptIdentifier"), ("target", concept_key(subject.id).as_str())],
            )?;
            self.end("descripGrp")?;
        }

        if let Some(broader) = &concept.broader {
            self.text_element(
                "descrip",
                &[("type", "broaderConceptGeneric"), ("target", concept_key(broader.id).as_str())],
                &broader.repr,
            )?;
        }

        if self.use_related_concepts {
            for related in &concept.related {
                self.empty(
                    "ref",
                    &[("type", "crossReference"), ("target", concept_key(*related).as_str())],
                )?;
            }
        }

        for language in &concept.languages {
            self.write_language(language)?;
        }

        self.end("termEntry")?;
        self.stats.concepts += 1;
        Ok(())
    }

    fn write_language(&mut self, block: &ExportLanguage) -> Result<(), ExportError> {
        self.start("langSet", &[("xml:lang", block.language.as_str())])?;

        if let Some(definition) = &block.definition {
            match &definition.source {
                Some(source) => {
                    self.start("descripGrp", &[])?;
                    self.text_element("descrip", &[("type", "definition")], &definition.text)?;
                    self.text_element("xref", &[("type", "xSource"), ("target", source.as_str())], source)?;
                    self.end("descripGrp")?;
                }
                None => {
                    self.text_element("descrip", &[("type", "definition")], &definition.text)?;
                }
            }
        }

        for resource in &block.resources {
            self.text_element(
                "xref",
                &[("type", resource.link_type.as_str()), ("target", resource.address.as_str())],
                &resource.description,
            )?;
        }

        for translation in &block.translations {
            self.write_translation(translation)?;
        }

        self.end("langSet")
    }

    fn write_translation(&mut self, translation: &ExportTranslation) -> Result<(), ExportError> {
        self.start("tig", &[])?;
        self.text_element("term", &[], &translation.text)?;

        let grammar = [
            ("partOfSpeech", &translation.part_of_speech),
            ("grammaticalGender", &translation.grammatical_gender),
            ("grammaticalNumber", &translation.grammatical_number),
        ];
        for (kind, value) in grammar {
            if let Some(value) = value {
                self.text_element("termNote", &[("type", kind)], value)?;
            }
        }

        if let Some(status) = &translation.administrative_status {
            match &translation.administrative_status_reason {
                Some(reason) => {
                    self.start("termGrp", &[])?;
                    self.text_element("termNote", &[("type", "administrativeStatus")], status)?;
                    self.text_element("note", &[], reason)?;
                    self.end("termGrp")?;
                }
                None => {
                    self.text_element("termNote", &[("type", "administrativeStatus")], status)?;
                }
            }
        }

        if translation.is_finalized {
            self.text_element("termNote", &[("type", "processStatus")], "finalized")?;
        }

        for sentence in &translation.context_sentences {
            self.text_element("descrip", &[("type", "context")], sentence)?;
        }
        for (address, description) in &translation.corpus_examples {
            self.text_element(
                "xref",
                &[("type", "corpusTrace"), ("target", address.as_str())],
                description,
            )?;
        }

        if !translation.note.is_empty() {
            self.text_element("note", &[], &translation.note)?;
        }

        self.end("tig")?;
        self.stats.translations += 1;
        Ok(())
    }
}

/// Local id written for a concept
pub fn concept_key(concept_id: i64) -> String {
    format!("c{}", concept_id)
}
