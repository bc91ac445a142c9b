//! Ontology term records.
//!
//! NUML gives semantic meaning to dimensions by referencing external
//! vocabulary entries (for example SBO or ChEBI terms). Terms live in a flat,
//! uniquely-keyed registry on the document; description nodes refer to them
//! by `id` only, so a reference may dangle during a partial parse without
//! being a memory-safety concern.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An external vocabulary entry referenced by description nodes.
///
/// Created through
/// [`NumlDocument::create_ontology_term`](crate::document::NumlDocument::create_ontology_term);
/// the document preserves creation order for serialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OntologyTerm {
    id: String,
    term: String,
    source_term_id: String,
    ontology_uri: String,
}

impl OntologyTerm {
    pub(crate) fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            term: String::new(),
            source_term_id: String::new(),
            ontology_uri: String::new(),
        }
    }

    /// Document-unique identifier of this term.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Human-readable label, e.g. `"concentration"`.
    pub fn term(&self) -> &str {
        &self.term
    }

    /// Identifier within the source ontology, e.g. `"SBO:0000196"`.
    pub fn source_term_id(&self) -> &str {
        &self.source_term_id
    }

    /// URI of the source ontology.
    pub fn ontology_uri(&self) -> &str {
        &self.ontology_uri
    }

    /// Set the human-readable label.
    pub fn set_term(&mut self, term: impl Into<String>) -> &mut Self {
        self.term = term.into();
        self
    }

    /// Set the source ontology identifier.
    pub fn set_source_term_id(&mut self, source_term_id: impl Into<String>) -> &mut Self {
        self.source_term_id = source_term_id.into();
        self
    }

    /// Set the source ontology URI.
    pub fn set_ontology_uri(&mut self, ontology_uri: impl Into<String>) -> &mut Self {
        self.ontology_uri = ontology_uri.into();
        self
    }
}

impl fmt::Display for OntologyTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.source_term_id.is_empty() {
            write!(f, "[{}: {}]", self.id, self.term)
        } else {
            write!(f, "[{}: {} ({})]", self.id, self.term, self.source_term_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_setters() {
        let mut term = OntologyTerm::new("term1");
        term.set_term("concentration")
            .set_source_term_id("SBO:0000196")
            .set_ontology_uri("http://www.ebi.ac.uk/sbo/");

        assert_eq!(term.id(), "term1");
        assert_eq!(term.term(), "concentration");
        assert_eq!(term.source_term_id(), "SBO:0000196");
        assert_eq!(term.ontology_uri(), "http://www.ebi.ac.uk/sbo/");
    }

    #[test]
    fn test_term_display() {
        let mut term = OntologyTerm::new("term1");
        term.set_term("time").set_source_term_id("SBO:0000345");
        assert_eq!(term.to_string(), "[term1: time (SBO:0000345)]");
    }
}
