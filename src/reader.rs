//! Streaming NUML reader built on quick-xml.
//!
//! The reader is a pull parser over the wire format's logical sections:
//! document envelope, `ontologyTerms`, `resultComponents`. It never fails for
//! recoverable problems; instead it accumulates diagnostics in an
//! [`ErrorLog`] and returns whatever document could be assembled. Only input
//! whose envelope cannot be established at all produces a `fatal` entry and a
//! partial-or-empty document.
//!
//! ```rust
//! use numl::reader::read_numl_from_str;
//! use numl::error_log::Severity;
//!
//! let (doc, log) = read_numl_from_str(
//!     r#"<numl xmlns="http://www.numl.org/numl/level1/version1" level="1" version="1"/>"#,
//! );
//! assert_eq!(log.count_at_or_above(Severity::Error), 0);
//! assert_eq!(doc.level(), 1);
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::{debug, warn};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::component::ResultComponent;
use crate::description::{
    AtomicDescription, CompositeDescription, DescriptionNode, IndexType, TupleDescription,
};
use crate::document::NumlDocument;
use crate::error::NumlError;
use crate::error_log::ErrorLog;
use crate::validator;
use crate::value::{AtomicValue, CompositeValue, Tuple, ValueNode};

/// Read a NUML document from any buffered byte source.
///
/// Always returns a document and a log; callers must check
/// [`ErrorLog::count_at_or_above`] before trusting the document.
pub fn read_numl<R: BufRead>(source: R) -> (NumlDocument, ErrorLog) {
    let mut xml_reader = Reader::from_reader(source);
    xml_reader.config_mut().trim_text(true);

    let mut parser = NumlParser {
        reader: xml_reader,
        document: NumlDocument::new(),
        log: ErrorLog::new(),
    };
    parser.run();
    debug!(
        "read {} ontology term(s), {} result component(s), {} diagnostic(s)",
        parser.document.num_ontology_terms(),
        parser.document.num_result_components(),
        parser.log.len()
    );
    (parser.document, parser.log)
}

/// Read a NUML document from an in-memory string.
pub fn read_numl_from_str(source: &str) -> (NumlDocument, ErrorLog) {
    read_numl(source.as_bytes())
}

/// Read a NUML document from a file path.
///
/// A file that cannot be opened yields an empty document with a `fatal`
/// entry, matching the in-stream failure contract.
pub fn read_numl_from_file<P: AsRef<Path>>(path: P) -> (NumlDocument, ErrorLog) {
    match File::open(path.as_ref()) {
        Ok(file) => read_numl(BufReader::new(file)),
        Err(err) => {
            let mut log = ErrorLog::new();
            log.fatal(format!(
                "cannot open `{}`: {err}",
                path.as_ref().display()
            ));
            (NumlDocument::new(), log)
        }
    }
}

struct NumlParser<R: BufRead> {
    reader: Reader<R>,
    document: NumlDocument,
    log: ErrorLog,
}

impl<R: BufRead> NumlParser<R> {
    fn run(&mut self) {
        if let Err(err) = self.parse_document() {
            // Anything propagated this far is unrecoverable parser state.
            self.log.fatal(format!(
                "malformed input near byte {}: {err}",
                self.reader.buffer_position()
            ));
        }
    }

    fn parse_document(&mut self) -> Result<(), NumlError> {
        let mut buf = Vec::new();
        let mut seen_envelope = false;

        // Locate the document envelope.
        loop {
            match self.reader.read_event_into(&mut buf)? {
                Event::Empty(ref e) if e.name().as_ref() == b"numl" => {
                    // Self-closing envelope: a valid, empty document.
                    self.parse_envelope(e)?;
                    return Ok(());
                }
                Event::Start(ref e) if e.name().as_ref() == b"numl" => {
                    self.parse_envelope(e)?;
                    seen_envelope = true;
                    break;
                }
                Event::Start(ref e) => {
                    // A different root element cannot be a NUML document.
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    self.log
                        .fatal(format!("root element is `{name}`, expected `numl`"));
                    return Ok(());
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }
        if !seen_envelope {
            self.log.fatal("input contains no numl element");
            return Ok(());
        }
        buf.clear();

        // Body: ontologyTerms then resultComponents, tolerating strays.
        loop {
            match self.reader.read_event_into(&mut buf)? {
                Event::Start(ref e) | Event::Empty(ref e)
                    if e.name().as_ref() == b"ontologyTerms"
                        || e.name().as_ref() == b"resultComponents" => {}
                Event::Start(ref e) if e.name().as_ref() == b"ontologyTerm" => {
                    self.parse_ontology_term(e)?;
                    let mut skip = Vec::new();
                    self.reader.read_to_end_into(e.to_end().name(), &mut skip)?;
                }
                Event::Empty(ref e) if e.name().as_ref() == b"ontologyTerm" => {
                    self.parse_ontology_term(e)?;
                }
                Event::Start(ref e) if e.name().as_ref() == b"resultComponent" => {
                    self.parse_result_component(e)?;
                }
                Event::Empty(ref e) if e.name().as_ref() == b"resultComponent" => {
                    // No description and no rows; still record it if it has an id.
                    self.parse_empty_result_component(e)?;
                }
                Event::Start(ref e) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    warn!("skipping unexpected element `{name}`");
                    self.log.warning(format!("skipping unexpected element `{name}`"));
                    let mut skip = Vec::new();
                    self.reader.read_to_end_into(e.to_end().name(), &mut skip)?;
                }
                Event::Empty(ref e) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    warn!("skipping unexpected element `{name}`");
                    self.log.warning(format!("skipping unexpected element `{name}`"));
                }
                Event::End(ref e) if e.name().as_ref() == b"numl" => break,
                Event::Eof => {
                    self.log
                        .warning("input ended before the numl element was closed");
                    break;
                }
                _ => {}
            }
            buf.clear();
        }
        Ok(())
    }

    fn parse_envelope(&mut self, e: &BytesStart<'_>) -> Result<(), NumlError> {
        let level = self.numeric_attribute(e, "level", crate::document::NUML_DEFAULT_LEVEL)?;
        let version =
            self.numeric_attribute(e, "version", crate::document::NUML_DEFAULT_VERSION)?;
        self.document = NumlDocument::with_level_version(level, version);
        Ok(())
    }

    fn numeric_attribute(
        &mut self,
        e: &BytesStart<'_>,
        name: &str,
        default: u32,
    ) -> Result<u32, NumlError> {
        match get_attribute(e, name)? {
            Some(text) => match text.parse::<u32>() {
                Ok(value) => Ok(value),
                Err(_) => {
                    self.log.error(format!(
                        "invalid {name} `{text}` on numl element, assuming {default}"
                    ));
                    Ok(default)
                }
            },
            None => Ok(default),
        }
    }

    fn parse_ontology_term(&mut self, e: &BytesStart<'_>) -> Result<(), NumlError> {
        let Some(id) = get_attribute(e, "id")?.filter(|id| !id.is_empty()) else {
            self.log.error("ontologyTerm without id attribute, skipped");
            return Ok(());
        };
        if self.document.ontology_term(&id).is_some() {
            self.log
                .error(format!("duplicate ontology term id `{id}`, keeping the first"));
            return Ok(());
        }
        let term_label = get_attribute(e, "term")?.unwrap_or_default();
        let source_term_id = get_attribute(e, "sourceTermId")?.unwrap_or_default();
        let ontology_uri = get_attribute(e, "ontologyURI")?.unwrap_or_default();
        match self.document.create_ontology_term(id) {
            Ok(term) => {
                term.set_term(term_label)
                    .set_source_term_id(source_term_id)
                    .set_ontology_uri(ontology_uri);
            }
            Err(err) => self.log.error(err.to_string()),
        }
        Ok(())
    }

    fn parse_empty_result_component(&mut self, e: &BytesStart<'_>) -> Result<(), NumlError> {
        let Some(id) = get_attribute(e, "id")?.filter(|id| !id.is_empty()) else {
            self.log.error("resultComponent without id attribute, skipped");
            return Ok(());
        };
        if self.document.result_component(&id).is_some() {
            self.log
                .error(format!("duplicate result component id `{id}`, keeping the first"));
            return Ok(());
        }
        self.document.push_component(ResultComponent::new(id));
        Ok(())
    }

    fn parse_result_component(&mut self, start: &BytesStart<'_>) -> Result<(), NumlError> {
        let id = get_attribute(start, "id")?.filter(|id| !id.is_empty());
        let duplicate = id
            .as_deref()
            .is_some_and(|id| self.document.result_component(id).is_some());
        let Some(id) = id else {
            self.log.error("resultComponent without id attribute, skipped");
            let mut skip = Vec::new();
            self.reader.read_to_end_into(start.to_end().name(), &mut skip)?;
            return Ok(());
        };
        if duplicate {
            self.log
                .error(format!("duplicate result component id `{id}`, keeping the first"));
            let mut skip = Vec::new();
            self.reader.read_to_end_into(start.to_end().name(), &mut skip)?;
            return Ok(());
        }

        let mut component = ResultComponent::new(&id);
        let mut buf = Vec::new();
        loop {
            match self.reader.read_event_into(&mut buf)? {
                Event::Start(ref e) if e.name().as_ref() == b"dimensionDescription" => {
                    self.parse_dimension_description(&mut component)?;
                }
                Event::Start(ref e) if e.name().as_ref() == b"dimension" => {
                    self.parse_dimension(&mut component)?;
                }
                Event::Start(ref e) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    self.log.warning(format!(
                        "skipping unexpected element `{name}` in result component `{id}`"
                    ));
                    let mut skip = Vec::new();
                    self.reader.read_to_end_into(e.to_end().name(), &mut skip)?;
                }
                Event::Empty(ref e) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    self.log.warning(format!(
                        "skipping unexpected element `{name}` in result component `{id}`"
                    ));
                }
                Event::End(ref e) if e.name().as_ref() == b"resultComponent" => break,
                Event::Eof => {
                    return Err(NumlError::MalformedInput(format!(
                        "unexpected end of input inside result component `{id}`"
                    )))
                }
                _ => {}
            }
            buf.clear();
        }

        self.enforce_conformance(&mut component);
        self.document.push_component(component);
        Ok(())
    }

    /// Parse the `dimensionDescription` section: one composite root.
    fn parse_dimension_description(
        &mut self,
        component: &mut ResultComponent,
    ) -> Result<(), NumlError> {
        let mut buf = Vec::new();
        loop {
            match self.reader.read_event_into(&mut buf)? {
                Event::Start(ref e) if e.name().as_ref() == b"compositeDescription" => {
                    let description = self.parse_composite_description(e)?;
                    if component.description().is_some() {
                        self.log.error(format!(
                            "result component `{}` has more than one description root, keeping the first",
                            component.id()
                        ));
                    } else {
                        component.set_description(description);
                    }
                }
                Event::Empty(ref e) if e.name().as_ref() == b"compositeDescription" => {
                    let description = self.composite_description_from_attrs(e)?;
                    if component.description().is_some() {
                        self.log.error(format!(
                            "result component `{}` has more than one description root, keeping the first",
                            component.id()
                        ));
                    } else {
                        component.set_description(description);
                    }
                }
                Event::Start(ref e) => {
                    self.warn_unexpected(e, "dimensionDescription");
                    let mut skip = Vec::new();
                    self.reader.read_to_end_into(e.to_end().name(), &mut skip)?;
                }
                Event::Empty(ref e) => self.warn_unexpected(e, "dimensionDescription"),
                Event::End(ref e) if e.name().as_ref() == b"dimensionDescription" => break,
                Event::Eof => {
                    return Err(NumlError::MalformedInput(
                        "unexpected end of input inside dimensionDescription".to_string(),
                    ))
                }
                _ => {}
            }
            buf.clear();
        }
        Ok(())
    }

    fn composite_description_from_attrs(
        &mut self,
        e: &BytesStart<'_>,
    ) -> Result<CompositeDescription, NumlError> {
        let mut description = CompositeDescription::default();
        if let Some(id) = get_attribute(e, "id")? {
            description.set_id(id);
        }
        description.set_name(get_attribute(e, "name")?.unwrap_or_default());
        description.set_index_type(self.index_type_attribute(e, "indexType")?);
        if let Some(term) = get_attribute(e, "ontologyTerm")? {
            description.set_ontology_term(term);
        }
        Ok(description)
    }

    fn parse_composite_description(
        &mut self,
        start: &BytesStart<'_>,
    ) -> Result<CompositeDescription, NumlError> {
        let mut description = self.composite_description_from_attrs(start)?;
        let mut buf = Vec::new();
        loop {
            match self.reader.read_event_into(&mut buf)? {
                Event::Start(ref e) if e.name().as_ref() == b"compositeDescription" => {
                    let child = self.parse_composite_description(e)?;
                    description.push_child(DescriptionNode::Composite(child));
                }
                Event::Empty(ref e) if e.name().as_ref() == b"compositeDescription" => {
                    let child = self.composite_description_from_attrs(e)?;
                    description.push_child(DescriptionNode::Composite(child));
                }
                Event::Start(ref e) if e.name().as_ref() == b"atomicDescription" => {
                    let leaf = self.parse_atomic_description(e)?;
                    description.push_child(DescriptionNode::Atomic(leaf));
                    let mut skip = Vec::new();
                    self.reader.read_to_end_into(e.to_end().name(), &mut skip)?;
                }
                Event::Empty(ref e) if e.name().as_ref() == b"atomicDescription" => {
                    let leaf = self.parse_atomic_description(e)?;
                    description.push_child(DescriptionNode::Atomic(leaf));
                }
                Event::Start(ref e) if e.name().as_ref() == b"tupleDescription" => {
                    let tuple = self.parse_tuple_description(e)?;
                    description.push_child(DescriptionNode::Tuple(tuple));
                }
                Event::Empty(ref e) if e.name().as_ref() == b"tupleDescription" => {
                    let tuple = self.tuple_description_from_attrs(e)?;
                    description.push_child(DescriptionNode::Tuple(tuple));
                }
                Event::Start(ref e) => {
                    self.warn_unexpected(e, "compositeDescription");
                    let mut skip = Vec::new();
                    self.reader.read_to_end_into(e.to_end().name(), &mut skip)?;
                }
                Event::Empty(ref e) => self.warn_unexpected(e, "compositeDescription"),
                Event::End(ref e) if e.name().as_ref() == b"compositeDescription" => break,
                Event::Eof => {
                    return Err(NumlError::MalformedInput(
                        "unexpected end of input inside compositeDescription".to_string(),
                    ))
                }
                _ => {}
            }
            buf.clear();
        }
        Ok(description)
    }

    fn tuple_description_from_attrs(
        &mut self,
        e: &BytesStart<'_>,
    ) -> Result<TupleDescription, NumlError> {
        let mut tuple = TupleDescription::default();
        if let Some(id) = get_attribute(e, "id")? {
            tuple.set_id(id);
        }
        tuple.set_name(get_attribute(e, "name")?.unwrap_or_default());
        if let Some(term) = get_attribute(e, "ontologyTerm")? {
            tuple.set_ontology_term(term);
        }
        Ok(tuple)
    }

    fn parse_tuple_description(
        &mut self,
        start: &BytesStart<'_>,
    ) -> Result<TupleDescription, NumlError> {
        let mut tuple = self.tuple_description_from_attrs(start)?;
        let mut buf = Vec::new();
        loop {
            match self.reader.read_event_into(&mut buf)? {
                Event::Start(ref e) if e.name().as_ref() == b"atomicDescription" => {
                    let member = self.parse_atomic_description(e)?;
                    tuple.push_child(member);
                    let mut skip = Vec::new();
                    self.reader.read_to_end_into(e.to_end().name(), &mut skip)?;
                }
                Event::Empty(ref e) if e.name().as_ref() == b"atomicDescription" => {
                    let member = self.parse_atomic_description(e)?;
                    tuple.push_child(member);
                }
                Event::Start(ref e) => {
                    self.warn_unexpected(e, "tupleDescription");
                    let mut skip = Vec::new();
                    self.reader.read_to_end_into(e.to_end().name(), &mut skip)?;
                }
                Event::Empty(ref e) => self.warn_unexpected(e, "tupleDescription"),
                Event::End(ref e) if e.name().as_ref() == b"tupleDescription" => break,
                Event::Eof => {
                    return Err(NumlError::MalformedInput(
                        "unexpected end of input inside tupleDescription".to_string(),
                    ))
                }
                _ => {}
            }
            buf.clear();
        }
        Ok(tuple)
    }

    fn parse_atomic_description(
        &mut self,
        e: &BytesStart<'_>,
    ) -> Result<AtomicDescription, NumlError> {
        let mut leaf = AtomicDescription::default();
        if let Some(meta_id) = get_attribute(e, "metaid")? {
            leaf.set_meta_id(meta_id);
        }
        leaf.set_name(get_attribute(e, "name")?.unwrap_or_default());
        leaf.set_value_type(self.index_type_attribute(e, "valueType")?);
        if let Some(term) = get_attribute(e, "ontologyTerm")? {
            leaf.set_ontology_term(term);
        }
        Ok(leaf)
    }

    fn index_type_attribute(
        &mut self,
        e: &BytesStart<'_>,
        attribute: &str,
    ) -> Result<IndexType, NumlError> {
        match get_attribute(e, attribute)? {
            Some(token) => match IndexType::from_token(&token) {
                Some(ty) => Ok(ty),
                None => {
                    self.log.error(format!(
                        "unknown {attribute} `{token}`, assuming string"
                    ));
                    Ok(IndexType::String)
                }
            },
            None => Ok(IndexType::String),
        }
    }

    fn warn_unexpected(&mut self, e: &BytesStart<'_>, context: &str) {
        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        warn!("skipping unexpected element `{name}` in {context}");
        self.log
            .warning(format!("skipping unexpected element `{name}` in {context}"));
    }

    /// Parse the `dimension` section: one compositeValue root per row.
    fn parse_dimension(&mut self, component: &mut ResultComponent) -> Result<(), NumlError> {
        let mut buf = Vec::new();
        loop {
            match self.reader.read_event_into(&mut buf)? {
                Event::Start(ref e) if e.name().as_ref() == b"compositeValue" => {
                    let row = self.parse_composite_value(e)?;
                    component.push_value(row);
                }
                Event::Empty(ref e) if e.name().as_ref() == b"compositeValue" => {
                    let row = self.composite_value_from_attrs(e)?;
                    component.push_value(row);
                }
                Event::Start(ref e) => {
                    self.warn_unexpected(e, "dimension");
                    let mut skip = Vec::new();
                    self.reader.read_to_end_into(e.to_end().name(), &mut skip)?;
                }
                Event::Empty(ref e) => self.warn_unexpected(e, "dimension"),
                Event::End(ref e) if e.name().as_ref() == b"dimension" => break,
                Event::Eof => {
                    return Err(NumlError::MalformedInput(
                        "unexpected end of input inside dimension".to_string(),
                    ))
                }
                _ => {}
            }
            buf.clear();
        }
        Ok(())
    }

    fn composite_value_from_attrs(
        &mut self,
        e: &BytesStart<'_>,
    ) -> Result<CompositeValue, NumlError> {
        // The wire `description` back-reference is derivable from position
        // and intentionally ignored.
        let mut value = CompositeValue::default();
        value.set_index_value(get_attribute(e, "indexValue")?.unwrap_or_default());
        Ok(value)
    }

    fn parse_composite_value(
        &mut self,
        start: &BytesStart<'_>,
    ) -> Result<CompositeValue, NumlError> {
        let mut value = self.composite_value_from_attrs(start)?;
        let mut buf = Vec::new();
        loop {
            match self.reader.read_event_into(&mut buf)? {
                Event::Start(ref e) if e.name().as_ref() == b"compositeValue" => {
                    let child = self.parse_composite_value(e)?;
                    value.push_child(ValueNode::Composite(child));
                }
                Event::Empty(ref e) if e.name().as_ref() == b"compositeValue" => {
                    let child = self.composite_value_from_attrs(e)?;
                    value.push_child(ValueNode::Composite(child));
                }
                Event::Start(ref e) if e.name().as_ref() == b"atomicValue" => {
                    let text = self.read_text_until_end(b"atomicValue")?;
                    let mut leaf = AtomicValue::default();
                    leaf.set_value(text);
                    value.push_child(ValueNode::Atomic(leaf));
                }
                Event::Empty(ref e) if e.name().as_ref() == b"atomicValue" => {
                    value.push_child(ValueNode::Atomic(AtomicValue::default()));
                }
                Event::Start(ref e) if e.name().as_ref() == b"tuple" => {
                    let tuple = self.parse_tuple()?;
                    value.push_child(ValueNode::Tuple(tuple));
                }
                Event::Empty(ref e) if e.name().as_ref() == b"tuple" => {
                    value.push_child(ValueNode::Tuple(Tuple::default()));
                }
                Event::Start(ref e) => {
                    self.warn_unexpected(e, "compositeValue");
                    let mut skip = Vec::new();
                    self.reader.read_to_end_into(e.to_end().name(), &mut skip)?;
                }
                Event::Empty(ref e) => self.warn_unexpected(e, "compositeValue"),
                Event::End(ref e) if e.name().as_ref() == b"compositeValue" => break,
                Event::Eof => {
                    return Err(NumlError::MalformedInput(
                        "unexpected end of input inside compositeValue".to_string(),
                    ))
                }
                _ => {}
            }
            buf.clear();
        }
        Ok(value)
    }

    fn parse_tuple(&mut self) -> Result<Tuple, NumlError> {
        let mut tuple = Tuple::default();
        let mut buf = Vec::new();
        loop {
            match self.reader.read_event_into(&mut buf)? {
                Event::Start(ref e) if e.name().as_ref() == b"atomicValue" => {
                    let text = self.read_text_until_end(b"atomicValue")?;
                    let mut member = AtomicValue::default();
                    member.set_value(text);
                    tuple.push_child(member);
                }
                Event::Empty(ref e) if e.name().as_ref() == b"atomicValue" => {
                    tuple.push_child(AtomicValue::default());
                }
                Event::Start(ref e) => {
                    self.warn_unexpected(e, "tuple");
                    let mut skip = Vec::new();
                    self.reader.read_to_end_into(e.to_end().name(), &mut skip)?;
                }
                Event::Empty(ref e) => self.warn_unexpected(e, "tuple"),
                Event::End(ref e) if e.name().as_ref() == b"tuple" => break,
                Event::Eof => {
                    return Err(NumlError::MalformedInput(
                        "unexpected end of input inside tuple".to_string(),
                    ))
                }
                _ => {}
            }
            buf.clear();
        }
        Ok(tuple)
    }

    fn read_text_until_end(&mut self, element: &[u8]) -> Result<String, NumlError> {
        let mut text = String::new();
        let mut buf = Vec::new();
        loop {
            match self.reader.read_event_into(&mut buf)? {
                Event::Text(t) => text.push_str(&t.unescape()?),
                Event::End(ref e) if e.name().as_ref() == element => break,
                Event::Eof => {
                    return Err(NumlError::MalformedInput(format!(
                        "unexpected end of input inside {}",
                        String::from_utf8_lossy(element)
                    )))
                }
                _ => {}
            }
            buf.clear();
        }
        Ok(text)
    }

    /// Post-parse conformance pass over one component: non-conformant rows
    /// are dropped (with their index logged); type mismatches are logged but
    /// the raw text is kept.
    fn enforce_conformance(&mut self, component: &mut ResultComponent) {
        let Some(description) = component.description() else {
            if component.num_values() > 0 {
                self.log.error(format!(
                    "result component `{}` has {} row(s) but no dimension description, rows dropped",
                    component.id(),
                    component.num_values()
                ));
                let drop_all = vec![false; component.num_values()];
                component.retain_values(&drop_all);
            }
            return;
        };

        for err in validator::collect_description_errors(&self.document, description, component.id())
        {
            self.log.error(err.to_string());
        }

        let mut keep = vec![true; component.num_values()];
        for (index, row) in component.values().iter().enumerate() {
            let path = format!("{}/row[{index}]", component.id());
            let errors = validator::collect_row_errors(description, row, &path);
            let shape = errors
                .iter()
                .find(|e| matches!(e, NumlError::ShapeMismatch { .. }));
            if let Some(err) = shape {
                self.log.error(format!(
                    "dropping row {index} of result component `{}`: {err}",
                    component.id()
                ));
                keep[index] = false;
                continue;
            }
            for err in errors {
                self.log.error(err.to_string());
            }
        }
        if keep.iter().any(|k| !k) {
            component.retain_values(&keep);
        }
    }
}

/// Helper to fetch an unescaped attribute value from a start tag.
fn get_attribute(e: &BytesStart<'_>, name: &str) -> Result<Option<String>, NumlError> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| NumlError::Xml(quick_xml::Error::from(err)))?;
        if attr.key.as_ref() == name.as_bytes() {
            let value = attr
                .unescape_value()
                .map_err(|err| NumlError::MalformedInput(err.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_log::Severity;

    const XMLNS: &str = "http://www.numl.org/numl/level1/version1";

    fn envelope(body: &str) -> String {
        format!(r#"<numl xmlns="{XMLNS}" level="1" version="1">{body}</numl>"#)
    }

    #[test]
    fn test_empty_document() {
        let (doc, log) = read_numl_from_str(&envelope(""));
        assert!(log.is_empty(), "{log}");
        assert_eq!(doc.level(), 1);
        assert_eq!(doc.version(), 1);
        assert_eq!(doc.num_ontology_terms(), 0);
    }

    #[test]
    fn test_garbage_input_is_fatal() {
        let (doc, log) = read_numl_from_str("<resultComponent id='x'/>");
        assert!(log.has_fatal());
        assert_eq!(doc.num_result_components(), 0);
    }

    #[test]
    fn test_unclosed_markup_is_fatal() {
        let (_, log) = read_numl_from_str(&envelope("<ontologyTerms><ontologyTerm"));
        assert!(log.has_fatal());
    }

    #[test]
    fn test_ontology_terms_are_parsed_in_order() {
        let body = r#"<ontologyTerms>
            <ontologyTerm id="term1" term="time" sourceTermId="SBO:0000345" ontologyURI="http://www.ebi.ac.uk/sbo/"/>
            <ontologyTerm id="term2" term="metabolite" sourceTermId="SBO:0000299" ontologyURI="http://www.ebi.ac.uk/sbo/"/>
        </ontologyTerms>"#;
        let (doc, log) = read_numl_from_str(&envelope(body));
        assert!(log.is_empty(), "{log}");
        assert_eq!(doc.num_ontology_terms(), 2);
        assert_eq!(doc.ontology_terms()[0].id(), "term1");
        assert_eq!(doc.ontology_terms()[1].term(), "metabolite");
    }

    #[test]
    fn test_duplicate_term_first_wins() {
        let body = r#"<ontologyTerms>
            <ontologyTerm id="term1" term="time"/>
            <ontologyTerm id="term1" term="concentration"/>
        </ontologyTerms>"#;
        let (doc, log) = read_numl_from_str(&envelope(body));
        assert_eq!(doc.num_ontology_terms(), 1);
        assert_eq!(doc.ontology_term("term1").map(|t| t.term()), Some("time"));
        assert_eq!(log.count_at_or_above(Severity::Error), 1);
    }

    #[test]
    fn test_term_without_id_is_skipped() {
        let body = r#"<ontologyTerms><ontologyTerm term="time"/></ontologyTerms>"#;
        let (doc, log) = read_numl_from_str(&envelope(body));
        assert_eq!(doc.num_ontology_terms(), 0);
        assert_eq!(log.count_at_or_above(Severity::Error), 1);
    }

    #[test]
    fn test_component_without_id_is_skipped() {
        let body = r#"<resultComponents><resultComponent>
            <dimensionDescription>
              <compositeDescription name="time" indexType="float">
                <atomicDescription name="value" valueType="double"/>
              </compositeDescription>
            </dimensionDescription>
        </resultComponent></resultComponents>"#;
        let (doc, log) = read_numl_from_str(&envelope(body));
        assert_eq!(doc.num_result_components(), 0);
        assert_eq!(log.count_at_or_above(Severity::Error), 1);
    }

    #[test]
    fn test_unknown_index_type_defaults_to_string() {
        let body = r#"<resultComponents><resultComponent id="result1">
            <dimensionDescription>
              <compositeDescription name="time" indexType="decimal">
                <atomicDescription name="value" valueType="double"/>
              </compositeDescription>
            </dimensionDescription>
        </resultComponent></resultComponents>"#;
        let (doc, log) = read_numl_from_str(&envelope(body));
        let component = doc.result_component("result1").expect("component kept");
        let description = component.description().expect("description kept");
        assert_eq!(description.index_type(), IndexType::String);
        assert_eq!(log.count_at_or_above(Severity::Error), 1);
    }

    #[test]
    fn test_nonconformant_row_is_dropped_with_index() {
        let body = r#"<resultComponents><resultComponent id="result1">
            <dimensionDescription>
              <compositeDescription name="time" indexType="float">
                <compositeDescription name="metabolite" indexType="string">
                  <atomicDescription name="concentration" valueType="float"/>
                </compositeDescription>
              </compositeDescription>
            </dimensionDescription>
            <dimension>
              <compositeValue indexValue="0">
                <compositeValue indexValue="BL"><atomicValue>0</atomicValue></compositeValue>
              </compositeValue>
              <compositeValue indexValue="0.2">
                <atomicValue>1.5</atomicValue>
              </compositeValue>
            </dimension>
        </resultComponent></resultComponents>"#;
        let (doc, log) = read_numl_from_str(&envelope(body));
        let component = doc.result_component("result1").expect("component kept");
        assert_eq!(component.num_values(), 1);
        assert_eq!(component.values()[0].index_value(), "0");
        assert_eq!(log.count_at_or_above(Severity::Error), 1);
        assert!(log.get(0).expect("entry").message.contains("row 1"));
    }

    #[test]
    fn test_type_mismatch_keeps_raw_text() {
        let body = r#"<resultComponents><resultComponent id="result1">
            <dimensionDescription>
              <compositeDescription name="time" indexType="float">
                <atomicDescription name="value" valueType="float"/>
              </compositeDescription>
            </dimensionDescription>
            <dimension>
              <compositeValue indexValue="abc"><atomicValue>1.0</atomicValue></compositeValue>
            </dimension>
        </resultComponent></resultComponents>"#;
        let (doc, log) = read_numl_from_str(&envelope(body));
        let component = doc.result_component("result1").expect("component kept");
        assert_eq!(component.num_values(), 1);
        assert_eq!(component.values()[0].index_value(), "abc");
        assert_eq!(log.count_at_or_above(Severity::Error), 1);
    }

    #[test]
    fn test_tuple_elements_are_parsed() {
        let body = r#"<resultComponents><resultComponent id="result1">
            <dimensionDescription>
              <compositeDescription name="sample" indexType="string">
                <tupleDescription name="statistics">
                  <atomicDescription name="mean" valueType="double"/>
                  <atomicDescription name="sd" valueType="double"/>
                </tupleDescription>
              </compositeDescription>
            </dimensionDescription>
            <dimension>
              <compositeValue indexValue="s1">
                <tuple>
                  <atomicValue>1.5</atomicValue>
                  <atomicValue>0.3</atomicValue>
                </tuple>
              </compositeValue>
            </dimension>
        </resultComponent></resultComponents>"#;
        let (doc, log) = read_numl_from_str(&envelope(body));
        assert!(log.is_empty(), "{log}");

        let component = doc.result_component("result1").expect("component kept");
        let description = component.description().expect("description kept");
        let tuple = description.children()[0].as_tuple().expect("tuple descriptor");
        assert_eq!(tuple.name(), "statistics");
        assert_eq!(tuple.children().len(), 2);
        assert_eq!(tuple.children()[0].name(), "mean");

        let row = &component.values()[0];
        let values = row.children()[0].as_tuple().expect("tuple values");
        assert_eq!(values.children().len(), 2);
        assert_eq!(values.children()[1].value(), "0.3");
    }

    #[test]
    fn test_tuple_arity_mismatch_drops_the_row() {
        let body = r#"<resultComponents><resultComponent id="result1">
            <dimensionDescription>
              <compositeDescription name="sample" indexType="string">
                <tupleDescription name="statistics">
                  <atomicDescription name="mean" valueType="double"/>
                  <atomicDescription name="sd" valueType="double"/>
                </tupleDescription>
              </compositeDescription>
            </dimensionDescription>
            <dimension>
              <compositeValue indexValue="s1">
                <tuple><atomicValue>1.5</atomicValue></tuple>
              </compositeValue>
            </dimension>
        </resultComponent></resultComponents>"#;
        let (doc, log) = read_numl_from_str(&envelope(body));
        let component = doc.result_component("result1").expect("component kept");
        assert_eq!(component.num_values(), 0);
        assert_eq!(log.count_at_or_above(Severity::Error), 1);
        assert!(log.get(0).expect("entry").message.contains("row 0"));
    }

    #[test]
    fn test_unexpected_empty_element_is_warned() {
        let body = r#"<annotation/>"#;
        let (doc, log) = read_numl_from_str(&envelope(body));
        assert_eq!(doc.num_result_components(), 0);
        assert_eq!(log.count_at_or_above(Severity::Warning), 1);
        assert_eq!(log.count_at_or_above(Severity::Error), 0);
        assert!(log.get(0).expect("entry").message.contains("annotation"));
    }

    #[test]
    fn test_dangling_reference_is_logged_but_kept() {
        let body = r#"<resultComponents><resultComponent id="result1">
            <dimensionDescription>
              <compositeDescription name="time" indexType="float" ontologyTerm="term9">
                <atomicDescription name="value" valueType="float"/>
              </compositeDescription>
            </dimensionDescription>
        </resultComponent></resultComponents>"#;
        let (doc, log) = read_numl_from_str(&envelope(body));
        let component = doc.result_component("result1").expect("component kept");
        let description = component.description().expect("description kept");
        assert_eq!(description.ontology_term(), Some("term9"));
        assert_eq!(log.count_at_or_above(Severity::Error), 1);
        assert!(log.get(0).expect("entry").message.contains("term9"));
    }
}
