//! Conformance checking between description trees and value trees.
//!
//! The builders are deliberately permissive: rows can be assembled
//! incrementally and ontology references are stored verbatim. Conformance is
//! therefore established at the serialization boundaries instead:
//! [`validate`] walks a whole document and reports every violation in an
//! [`ErrorLog`], while the writer uses the first-offense variant
//! [`check_component`] to refuse non-conformant trees outright.
//!
//! Three families of checks are performed per result component:
//!
//! - **structure** — every composite description level has at least one
//!   child, and each value row mirrors the description's nesting: composite
//!   value nodes pair with composite description levels, atomic values with
//!   atomic leaves, tuple values with tuple descriptions (matched member-wise
//!   with exact arity). A level described by a single child descriptor admits any
//!   number of value children (variable fan-out); a level described by
//!   several descriptors is a tuple and requires exactly that many value
//!   children, matched positionally.
//! - **types** — every `indexValue` and leaf value must lexically match the
//!   declared index type of its description node.
//! - **references** — every ontology term reference must resolve against the
//!   document's registry.

use crate::component::ResultComponent;
use crate::description::{CompositeDescription, DescriptionNode, TupleDescription};
use crate::document::NumlDocument;
use crate::error::NumlError;
use crate::error_log::ErrorLog;
use crate::value::{CompositeValue, Tuple, ValueNode};

/// Check every result component of `document` and report all violations.
///
/// The document is not mutated. An empty log means the document is
/// conformant and safe to serialize.
pub fn validate(document: &NumlDocument) -> ErrorLog {
    let mut log = ErrorLog::new();
    for component in document.result_components() {
        for err in collect_component_errors(document, component) {
            log.error(err.to_string());
        }
    }
    log
}

/// First-offense check of a single component, used by the writer.
pub(crate) fn check_component(
    document: &NumlDocument,
    component: &ResultComponent,
) -> Result<(), NumlError> {
    match collect_component_errors(document, component).into_iter().next() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// All conformance violations of one component, in traversal order.
pub(crate) fn collect_component_errors(
    document: &NumlDocument,
    component: &ResultComponent,
) -> Vec<NumlError> {
    let mut errors = Vec::new();
    let base = component.id().to_string();

    let Some(description) = component.description() else {
        if component.num_values() > 0 {
            errors.push(NumlError::ShapeMismatch {
                path: base,
                detail: format!(
                    "{} value row(s) attached but no description tree",
                    component.num_values()
                ),
            });
        }
        return errors;
    };

    check_description(document, description, &base, &mut errors);
    for (row, value) in component.values().iter().enumerate() {
        let path = format!("{base}/row[{row}]");
        check_composite_pair(description, value, &path, &mut errors);
    }
    errors
}

/// Structural and reference violations of a description tree on its own.
pub(crate) fn collect_description_errors(
    document: &NumlDocument,
    description: &CompositeDescription,
    base: &str,
) -> Vec<NumlError> {
    let mut errors = Vec::new();
    check_description(document, description, base, &mut errors);
    errors
}

/// Conformance violations of a single row against a description tree.
pub(crate) fn collect_row_errors(
    description: &CompositeDescription,
    row: &CompositeValue,
    path: &str,
) -> Vec<NumlError> {
    let mut errors = Vec::new();
    check_composite_pair(description, row, path, &mut errors);
    errors
}

/// Structural and reference checks on the description tree itself.
fn check_description(
    document: &NumlDocument,
    description: &CompositeDescription,
    path: &str,
    errors: &mut Vec<NumlError>,
) {
    let path = join(path, description.name());
    if let Some(reference) = description.ontology_term() {
        if document.ontology_term(reference).is_none() {
            errors.push(NumlError::UnresolvedReference {
                reference: reference.to_string(),
                path: path.clone(),
            });
        }
    }
    if description.children().is_empty() {
        errors.push(NumlError::ShapeMismatch {
            path: path.clone(),
            detail: "composite description level has no children".to_string(),
        });
    }
    for child in description.children() {
        match child {
            DescriptionNode::Composite(c) => check_description(document, c, &path, errors),
            DescriptionNode::Atomic(a) => {
                if let Some(reference) = a.ontology_term() {
                    if document.ontology_term(reference).is_none() {
                        errors.push(NumlError::UnresolvedReference {
                            reference: reference.to_string(),
                            path: join(&path, a.name()),
                        });
                    }
                }
            }
            DescriptionNode::Tuple(t) => check_tuple_description(document, t, &path, errors),
        }
    }
}

fn check_tuple_description(
    document: &NumlDocument,
    tuple: &TupleDescription,
    path: &str,
    errors: &mut Vec<NumlError>,
) {
    let path = join(path, tuple.name());
    if let Some(reference) = tuple.ontology_term() {
        if document.ontology_term(reference).is_none() {
            errors.push(NumlError::UnresolvedReference {
                reference: reference.to_string(),
                path: path.clone(),
            });
        }
    }
    if tuple.children().is_empty() {
        errors.push(NumlError::ShapeMismatch {
            path: path.clone(),
            detail: "tuple description has no members".to_string(),
        });
    }
    for member in tuple.children() {
        if let Some(reference) = member.ontology_term() {
            if document.ontology_term(reference).is_none() {
                errors.push(NumlError::UnresolvedReference {
                    reference: reference.to_string(),
                    path: join(&path, member.name()),
                });
            }
        }
    }
}

fn check_composite_pair(
    description: &CompositeDescription,
    value: &CompositeValue,
    path: &str,
    errors: &mut Vec<NumlError>,
) {
    let path = join(path, description.name());
    if !description.index_type().accepts(value.index_value()) {
        errors.push(NumlError::TypeMismatch {
            expected: description.index_type(),
            found: value.index_value().to_string(),
            path: path.clone(),
        });
    }

    match description.children() {
        [] => {
            // Reported once by check_description; nothing to pair against.
        }
        // Single descriptor: variable fan-out, every child conforms to it.
        [descriptor] => {
            for child in value.children() {
                check_node_pair(descriptor, child, &path, errors);
            }
        }
        // Tuple of descriptors: positional match, arity must agree.
        descriptors => {
            if value.children().len() != descriptors.len() {
                errors.push(NumlError::ShapeMismatch {
                    path: path.clone(),
                    detail: format!(
                        "expected {} child value(s) for a tuple level, found {}",
                        descriptors.len(),
                        value.children().len()
                    ),
                });
                return;
            }
            for (descriptor, child) in descriptors.iter().zip(value.children()) {
                check_node_pair(descriptor, child, &path, errors);
            }
        }
    }
}

fn check_node_pair(
    descriptor: &DescriptionNode,
    value: &ValueNode,
    path: &str,
    errors: &mut Vec<NumlError>,
) {
    match (descriptor, value) {
        (DescriptionNode::Composite(d), ValueNode::Composite(v)) => {
            check_composite_pair(d, v, path, errors);
        }
        (DescriptionNode::Atomic(d), ValueNode::Atomic(v)) => {
            if !d.value_type().accepts(v.value()) {
                errors.push(NumlError::TypeMismatch {
                    expected: d.value_type(),
                    found: v.value().to_string(),
                    path: join(path, d.name()),
                });
            }
        }
        (DescriptionNode::Tuple(d), ValueNode::Tuple(v)) => {
            check_tuple_pair(d, v, path, errors);
        }
        (DescriptionNode::Composite(d), ValueNode::Atomic(_)) => {
            errors.push(NumlError::ShapeMismatch {
                path: join(path, d.name()),
                detail: "atomic value where a nested composite level is described".to_string(),
            });
        }
        (DescriptionNode::Composite(d), ValueNode::Tuple(_)) => {
            errors.push(NumlError::ShapeMismatch {
                path: join(path, d.name()),
                detail: "tuple value where a nested composite level is described".to_string(),
            });
        }
        (DescriptionNode::Atomic(d), ValueNode::Composite(_)) => {
            errors.push(NumlError::ShapeMismatch {
                path: join(path, d.name()),
                detail: "composite value where an atomic leaf is described".to_string(),
            });
        }
        (DescriptionNode::Atomic(d), ValueNode::Tuple(_)) => {
            errors.push(NumlError::ShapeMismatch {
                path: join(path, d.name()),
                detail: "tuple value where an atomic leaf is described".to_string(),
            });
        }
        (DescriptionNode::Tuple(d), ValueNode::Composite(_)) => {
            errors.push(NumlError::ShapeMismatch {
                path: join(path, d.name()),
                detail: "composite value where a tuple is described".to_string(),
            });
        }
        (DescriptionNode::Tuple(d), ValueNode::Atomic(_)) => {
            errors.push(NumlError::ShapeMismatch {
                path: join(path, d.name()),
                detail: "atomic value where a tuple is described".to_string(),
            });
        }
    }
}

fn check_tuple_pair(
    description: &TupleDescription,
    value: &Tuple,
    path: &str,
    errors: &mut Vec<NumlError>,
) {
    let path = join(path, description.name());
    if value.children().len() != description.children().len() {
        errors.push(NumlError::ShapeMismatch {
            path,
            detail: format!(
                "expected {} atomic value(s) in the tuple, found {}",
                description.children().len(),
                value.children().len()
            ),
        });
        return;
    }
    for (member, leaf) in description.children().iter().zip(value.children()) {
        if !member.value_type().accepts(leaf.value()) {
            errors.push(NumlError::TypeMismatch {
                expected: member.value_type(),
                found: leaf.value().to_string(),
                path: join(&path, member.name()),
            });
        }
    }
}

fn join(path: &str, segment: &str) -> String {
    if segment.is_empty() {
        format!("{path}/?")
    } else {
        format!("{path}/{segment}")
    }
}
