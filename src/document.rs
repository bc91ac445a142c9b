//! The NUML document aggregate root.

use serde::{Deserialize, Serialize};

use crate::component::ResultComponent;
use crate::error::NumlError;
use crate::ontology::OntologyTerm;

/// XML namespace of NUML Level 1 Version 1 documents.
pub const NUML_XMLNS_L1V1: &str = "http://www.numl.org/numl/level1/version1";

/// Default NUML level for newly created documents.
pub const NUML_DEFAULT_LEVEL: u32 = 1;

/// Default NUML version for newly created documents.
pub const NUML_DEFAULT_VERSION: u32 = 1;

/// A complete NUML document: level/version, the ontology term registry, and
/// an ordered collection of result components.
///
/// The document exclusively owns every descendant entity; terms and
/// components are created through the `create_*` factory methods, which
/// enforce document-wide id uniqueness and preserve creation order for
/// serialization. Dropping the document drops its entire subtree.
///
/// ```rust
/// use numl::document::NumlDocument;
/// use numl::description::IndexType;
///
/// let mut doc = NumlDocument::new();
/// doc.create_ontology_term("term1")?.set_term("time");
/// let component = doc.create_result_component("result1")?;
/// component
///     .create_composite_description()?
///     .set_name("time")
///     .set_index_type(IndexType::Float)
///     .set_ontology_term("term1");
/// # Ok::<(), numl::error::NumlError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumlDocument {
    level: u32,
    version: u32,
    ontology_terms: Vec<OntologyTerm>,
    result_components: Vec<ResultComponent>,
}

impl Default for NumlDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl NumlDocument {
    /// Create an empty Level 1 Version 1 document.
    pub fn new() -> Self {
        Self::with_level_version(NUML_DEFAULT_LEVEL, NUML_DEFAULT_VERSION)
    }

    /// Create an empty document with an explicit level and version.
    pub fn with_level_version(level: u32, version: u32) -> Self {
        Self {
            level,
            version,
            ontology_terms: Vec::new(),
            result_components: Vec::new(),
        }
    }

    /// NUML level of this document.
    pub fn level(&self) -> u32 {
        self.level
    }

    /// NUML version of this document.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Register a new ontology term under `id`.
    ///
    /// Fails with [`NumlError::DuplicateId`] if the id is already registered;
    /// the existing term is unchanged.
    pub fn create_ontology_term(
        &mut self,
        id: impl Into<String>,
    ) -> Result<&mut OntologyTerm, NumlError> {
        let id = id.into();
        if self.ontology_term(&id).is_some() {
            return Err(NumlError::DuplicateId(id));
        }
        self.ontology_terms.push(OntologyTerm::new(id));
        match self.ontology_terms.last_mut() {
            Some(term) => Ok(term),
            None => unreachable!("just pushed a term"),
        }
    }

    /// Look up an ontology term by id.
    pub fn ontology_term(&self, id: &str) -> Option<&OntologyTerm> {
        self.ontology_terms.iter().find(|t| t.id() == id)
    }

    /// Mutable lookup of an ontology term by id.
    pub fn ontology_term_mut(&mut self, id: &str) -> Option<&mut OntologyTerm> {
        self.ontology_terms.iter_mut().find(|t| t.id() == id)
    }

    /// All ontology terms, in creation order.
    pub fn ontology_terms(&self) -> &[OntologyTerm] {
        &self.ontology_terms
    }

    /// Number of registered ontology terms.
    pub fn num_ontology_terms(&self) -> usize {
        self.ontology_terms.len()
    }

    /// Create a new result component under `id`.
    ///
    /// Fails with [`NumlError::DuplicateId`] if the id is already taken.
    pub fn create_result_component(
        &mut self,
        id: impl Into<String>,
    ) -> Result<&mut ResultComponent, NumlError> {
        let id = id.into();
        if self.result_component(&id).is_some() {
            return Err(NumlError::DuplicateId(id));
        }
        self.result_components.push(ResultComponent::new(id));
        match self.result_components.last_mut() {
            Some(component) => Ok(component),
            None => unreachable!("just pushed a component"),
        }
    }

    /// Look up a result component by id.
    pub fn result_component(&self, id: &str) -> Option<&ResultComponent> {
        self.result_components.iter().find(|c| c.id() == id)
    }

    /// Mutable lookup of a result component by id.
    pub fn result_component_mut(&mut self, id: &str) -> Option<&mut ResultComponent> {
        self.result_components.iter_mut().find(|c| c.id() == id)
    }

    /// All result components, in creation order.
    pub fn result_components(&self) -> &[ResultComponent] {
        &self.result_components
    }

    /// Number of result components.
    pub fn num_result_components(&self) -> usize {
        self.result_components.len()
    }

    pub(crate) fn push_component(&mut self, component: ResultComponent) {
        self.result_components.push(component);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NumlError;

    #[test]
    fn test_defaults_are_level1_version1() {
        let doc = NumlDocument::new();
        assert_eq!(doc.level(), 1);
        assert_eq!(doc.version(), 1);
        assert_eq!(doc.num_ontology_terms(), 0);
        assert_eq!(doc.num_result_components(), 0);
    }

    #[test]
    fn test_duplicate_term_id_is_rejected() {
        let mut doc = NumlDocument::new();
        doc.create_ontology_term("term1")
            .expect("first registration")
            .set_term("time");

        match doc.create_ontology_term("term1") {
            Err(NumlError::DuplicateId(id)) => assert_eq!(id, "term1"),
            other => panic!("expected DuplicateId, got {other:?}"),
        }
        // The original entry survives untouched.
        assert_eq!(doc.num_ontology_terms(), 1);
        assert_eq!(doc.ontology_term("term1").map(|t| t.term()), Some("time"));
    }

    #[test]
    fn test_duplicate_component_id_is_rejected() {
        let mut doc = NumlDocument::new();
        doc.create_result_component("result1").expect("first component");
        assert!(matches!(
            doc.create_result_component("result1"),
            Err(NumlError::DuplicateId(_))
        ));
        assert_eq!(doc.num_result_components(), 1);
    }

    #[test]
    fn test_creation_order_is_preserved() {
        let mut doc = NumlDocument::new();
        for id in ["term3", "term1", "term2"] {
            doc.create_ontology_term(id).expect("unique id");
        }
        let ids: Vec<_> = doc.ontology_terms().iter().map(|t| t.id()).collect();
        assert_eq!(ids, ["term3", "term1", "term2"]);
    }
}
