//! Canonical NUML serialization built on quick-xml's event writer.
//!
//! Writing assumes a conformant in-memory tree: documents assembled through
//! the builder API normally satisfy conformance by construction, and callers
//! holding a document of untrusted provenance should run
//! [`validate`](crate::validator::validate) first. The writer re-checks each
//! result component and refuses non-conformant trees with
//! [`NumlError::NonconformantTree`] rather than emitting ambiguous output;
//! there is no partial-output mode.
//!
//! Serialization is deterministic: ontology terms and result components are
//! emitted in creation order, nested nodes in child order, and every textual
//! value verbatim, so `read(write(doc))` reproduces `doc` exactly.

use std::fs;
use std::io;
use std::path::Path;

use log::debug;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::description::{
    AtomicDescription, CompositeDescription, DescriptionNode, TupleDescription,
};
use crate::document::{NumlDocument, NUML_XMLNS_L1V1};
use crate::error::NumlError;
use crate::validator;
use crate::value::{CompositeValue, Tuple, ValueNode};

/// Serialize `document` to canonical NUML text.
pub fn write_numl(document: &NumlDocument) -> Result<String, NumlError> {
    for component in document.result_components() {
        validator::check_component(document, component).map_err(|err| {
            NumlError::NonconformantTree {
                component: component.id().to_string(),
                detail: err.to_string(),
            }
        })?;
    }

    let mut out = Vec::new();
    let mut writer = Writer::new_with_indent(&mut out, b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let level = document.level().to_string();
    let version = document.version().to_string();
    let mut root = BytesStart::new("numl");
    root.push_attribute(("xmlns", NUML_XMLNS_L1V1));
    root.push_attribute(("level", level.as_str()));
    root.push_attribute(("version", version.as_str()));
    writer.write_event(Event::Start(root))?;

    // Empty sections are omitted, as in the original implementation.
    if document.num_ontology_terms() > 0 {
        writer.write_event(Event::Start(BytesStart::new("ontologyTerms")))?;
        for term in document.ontology_terms() {
            let mut elem = BytesStart::new("ontologyTerm");
            elem.push_attribute(("id", term.id()));
            elem.push_attribute(("term", term.term()));
            elem.push_attribute(("sourceTermId", term.source_term_id()));
            elem.push_attribute(("ontologyURI", term.ontology_uri()));
            writer.write_event(Event::Empty(elem))?;
        }
        writer.write_event(Event::End(BytesEnd::new("ontologyTerms")))?;
    }

    if document.num_result_components() > 0 {
        writer.write_event(Event::Start(BytesStart::new("resultComponents")))?;
        for component in document.result_components() {
            let mut elem = BytesStart::new("resultComponent");
            elem.push_attribute(("id", component.id()));
            writer.write_event(Event::Start(elem))?;

            if let Some(description) = component.description() {
                writer.write_event(Event::Start(BytesStart::new("dimensionDescription")))?;
                write_composite_description(&mut writer, description)?;
                writer.write_event(Event::End(BytesEnd::new("dimensionDescription")))?;
            }
            if component.num_values() > 0 {
                writer.write_event(Event::Start(BytesStart::new("dimension")))?;
                for row in component.values() {
                    write_composite_value(&mut writer, row)?;
                }
                writer.write_event(Event::End(BytesEnd::new("dimension")))?;
            }

            writer.write_event(Event::End(BytesEnd::new("resultComponent")))?;
        }
        writer.write_event(Event::End(BytesEnd::new("resultComponents")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("numl")))?;

    debug!(
        "serialized document with {} ontology term(s) and {} result component(s)",
        document.num_ontology_terms(),
        document.num_result_components()
    );
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// Serialize `document` and write it to `path`.
pub fn write_numl_to_file<P: AsRef<Path>>(
    document: &NumlDocument,
    path: P,
) -> Result<(), NumlError> {
    let text = write_numl(document)?;
    fs::write(path, text)?;
    Ok(())
}

fn write_composite_description<W: io::Write>(
    writer: &mut Writer<W>,
    description: &CompositeDescription,
) -> io::Result<()> {
    let mut elem = BytesStart::new("compositeDescription");
    if let Some(id) = description.id() {
        elem.push_attribute(("id", id));
    }
    elem.push_attribute(("name", description.name()));
    if let Some(term) = description.ontology_term() {
        elem.push_attribute(("ontologyTerm", term));
    }
    elem.push_attribute(("indexType", description.index_type().as_token()));
    writer.write_event(Event::Start(elem))?;
    for child in description.children() {
        match child {
            DescriptionNode::Composite(c) => write_composite_description(writer, c)?,
            DescriptionNode::Atomic(a) => write_atomic_description(writer, a)?,
            DescriptionNode::Tuple(t) => write_tuple_description(writer, t)?,
        }
    }
    writer.write_event(Event::End(BytesEnd::new("compositeDescription")))
}

fn write_tuple_description<W: io::Write>(
    writer: &mut Writer<W>,
    tuple: &TupleDescription,
) -> io::Result<()> {
    let mut elem = BytesStart::new("tupleDescription");
    if let Some(id) = tuple.id() {
        elem.push_attribute(("id", id));
    }
    elem.push_attribute(("name", tuple.name()));
    if let Some(term) = tuple.ontology_term() {
        elem.push_attribute(("ontologyTerm", term));
    }
    writer.write_event(Event::Start(elem))?;
    for member in tuple.children() {
        write_atomic_description(writer, member)?;
    }
    writer.write_event(Event::End(BytesEnd::new("tupleDescription")))
}

fn write_atomic_description<W: io::Write>(
    writer: &mut Writer<W>,
    leaf: &AtomicDescription,
) -> io::Result<()> {
    let mut elem = BytesStart::new("atomicDescription");
    if let Some(meta_id) = leaf.meta_id() {
        elem.push_attribute(("metaid", meta_id));
    }
    elem.push_attribute(("name", leaf.name()));
    if let Some(term) = leaf.ontology_term() {
        elem.push_attribute(("ontologyTerm", term));
    }
    elem.push_attribute(("valueType", leaf.value_type().as_token()));
    writer.write_event(Event::Empty(elem))
}

fn write_composite_value<W: io::Write>(
    writer: &mut Writer<W>,
    value: &CompositeValue,
) -> io::Result<()> {
    let mut elem = BytesStart::new("compositeValue");
    elem.push_attribute(("indexValue", value.index_value()));
    writer.write_event(Event::Start(elem))?;
    for child in value.children() {
        match child {
            ValueNode::Composite(c) => write_composite_value(writer, c)?,
            ValueNode::Atomic(a) => write_atomic_value(writer, a.value())?,
            ValueNode::Tuple(t) => write_tuple(writer, t)?,
        }
    }
    writer.write_event(Event::End(BytesEnd::new("compositeValue")))
}

// The tuple wire element carries no attributes of its own.
fn write_tuple<W: io::Write>(writer: &mut Writer<W>, tuple: &Tuple) -> io::Result<()> {
    writer.write_event(Event::Start(BytesStart::new("tuple")))?;
    for member in tuple.children() {
        write_atomic_value(writer, member.value())?;
    }
    writer.write_event(Event::End(BytesEnd::new("tuple")))
}

fn write_atomic_value<W: io::Write>(writer: &mut Writer<W>, value: &str) -> io::Result<()> {
    writer.write_event(Event::Start(BytesStart::new("atomicValue")))?;
    writer.write_event(Event::Text(BytesText::new(value)))?;
    writer.write_event(Event::End(BytesEnd::new("atomicValue")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::IndexType;

    fn scenario_document() -> NumlDocument {
        let mut doc = NumlDocument::new();
        doc.create_ontology_term("term1")
            .expect("unique id")
            .set_term("time")
            .set_source_term_id("SBO:0000345")
            .set_ontology_uri("http://www.ebi.ac.uk/sbo/");

        let component = doc.create_result_component("result1").expect("unique id");
        let time = component.create_composite_description().expect("root");
        time.set_name("time")
            .set_index_type(IndexType::Float)
            .set_ontology_term("term1");
        time.create_atomic_child()
            .set_name("concentration")
            .set_value_type(IndexType::Float);

        let row = component.create_composite_value();
        row.set_index_value("0");
        row.create_atomic_child().set_value("1.66058");
        doc
    }

    #[test]
    fn test_output_is_canonical() {
        let doc = scenario_document();
        let text = write_numl(&doc).expect("conformant document");

        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(text.contains(
            r#"<numl xmlns="http://www.numl.org/numl/level1/version1" level="1" version="1">"#
        ));
        assert!(text.contains(
            r#"<ontologyTerm id="term1" term="time" sourceTermId="SBO:0000345" ontologyURI="http://www.ebi.ac.uk/sbo/"/>"#
        ));
        assert!(text.contains(r#"<compositeDescription name="time" ontologyTerm="term1" indexType="float">"#));
        assert!(text.contains("<atomicValue>1.66058</atomicValue>"));
    }

    #[test]
    fn test_output_is_deterministic() {
        let doc = scenario_document();
        let first = write_numl(&doc).expect("conformant document");
        let second = write_numl(&doc).expect("conformant document");
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_sections_are_omitted() {
        let doc = NumlDocument::new();
        let text = write_numl(&doc).expect("empty document");
        assert!(!text.contains("ontologyTerms"));
        assert!(!text.contains("resultComponents"));
    }

    #[test]
    fn test_tuple_elements_are_emitted() {
        let mut doc = NumlDocument::new();
        let component = doc.create_result_component("result1").expect("unique id");
        let root = component.create_composite_description().expect("root");
        root.set_name("sample").set_index_type(IndexType::String);
        let tuple = root.create_tuple_child();
        tuple.set_name("statistics");
        tuple
            .create_atomic_child()
            .set_name("mean")
            .set_value_type(IndexType::Double);
        tuple
            .create_atomic_child()
            .set_name("sd")
            .set_value_type(IndexType::Double);

        let row = component.create_composite_value();
        row.set_index_value("s1");
        let values = row.create_tuple_child();
        values.create_atomic_child().set_value("1.5");
        values.create_atomic_child().set_value("0.3");

        let text = write_numl(&doc).expect("conformant document");
        assert!(text.contains(r#"<tupleDescription name="statistics">"#), "{text}");
        assert!(text.contains("<tuple>"), "{text}");
        assert!(text.contains("</tuple>"), "{text}");
        assert!(text.contains("<atomicValue>0.3</atomicValue>"), "{text}");
    }

    #[test]
    fn test_nonconformant_tree_is_refused() {
        let mut doc = scenario_document();
        // Attach a row one level too deep.
        let component = doc.result_component_mut("result1").expect("component");
        let row = component.create_composite_value();
        row.set_index_value("1");
        row.create_composite_child()
            .set_index_value("extra")
            .create_atomic_child()
            .set_value("2.0");

        match write_numl(&doc) {
            Err(NumlError::NonconformantTree { component, detail }) => {
                assert_eq!(component, "result1");
                assert!(detail.contains("row[1]"), "{detail}");
            }
            other => panic!("expected NonconformantTree, got {other:?}"),
        }
    }

    #[test]
    fn test_dangling_reference_is_refused() {
        let mut doc = scenario_document();
        doc.result_component_mut("result1")
            .expect("component")
            .description_mut()
            .expect("root")
            .set_ontology_term("term9");

        assert!(matches!(
            write_numl(&doc),
            Err(NumlError::NonconformantTree { .. })
        ));
    }
}
