//! The description (schema) half of a result component.
//!
//! A description tree defines the dimensional nesting of a dataset: each
//! [`CompositeDescription`] level names a dimension and declares the lexical
//! type of its index; [`AtomicDescription`] leaves describe the measured
//! values themselves. Value trees attached to the same result component must
//! mirror this shape (see [`crate::validator`]).
//!
//! The original format expresses the Composite/Atomic duality through
//! inheritance; here it is the tagged [`DescriptionNode`] variant.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lexical type of an index or measured value.
///
/// The type constrains the *textual* form of values only; the model never
/// converts or reformats numbers, so round-trips preserve the original
/// tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexType {
    /// Free-form text; accepts anything.
    String,
    /// 32-bit signed integer token.
    Integer,
    /// 64-bit signed integer token.
    Long,
    /// Single-precision floating point token.
    Float,
    /// Double-precision floating point token.
    Double,
}

impl IndexType {
    /// Parse a wire-format token (`"string"`, `"integer"`, ...).
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "string" => Some(IndexType::String),
            "integer" => Some(IndexType::Integer),
            "long" => Some(IndexType::Long),
            "float" => Some(IndexType::Float),
            "double" => Some(IndexType::Double),
            _ => None,
        }
    }

    /// Wire-format token for this type.
    pub fn as_token(self) -> &'static str {
        match self {
            IndexType::String => "string",
            IndexType::Integer => "integer",
            IndexType::Long => "long",
            IndexType::Float => "float",
            IndexType::Double => "double",
        }
    }

    /// Whether `text` is a lexically valid value of this type.
    pub fn accepts(self, text: &str) -> bool {
        match self {
            IndexType::String => true,
            IndexType::Integer => text.parse::<i32>().is_ok(),
            IndexType::Long => text.parse::<i64>().is_ok(),
            IndexType::Float => text.parse::<f32>().is_ok(),
            IndexType::Double => text.parse::<f64>().is_ok(),
        }
    }
}

impl Default for IndexType {
    fn default() -> Self {
        IndexType::String
    }
}

impl fmt::Display for IndexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

/// A leaf of the description tree: describes the measured value at the end
/// of a dimension path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtomicDescription {
    meta_id: Option<String>,
    name: String,
    value_type: IndexType,
    ontology_term: Option<String>,
}

impl AtomicDescription {
    /// Optional `metaid` wire attribute.
    pub fn meta_id(&self) -> Option<&str> {
        self.meta_id.as_deref()
    }

    /// Dimension name, e.g. `"concentration"`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared lexical type of the measured values.
    pub fn value_type(&self) -> IndexType {
        self.value_type
    }

    /// Referenced ontology term id, if any.
    pub fn ontology_term(&self) -> Option<&str> {
        self.ontology_term.as_deref()
    }

    /// Set the `metaid` attribute.
    pub fn set_meta_id(&mut self, meta_id: impl Into<String>) -> &mut Self {
        self.meta_id = Some(meta_id.into());
        self
    }

    /// Set the dimension name.
    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = name.into();
        self
    }

    /// Set the declared lexical type.
    pub fn set_value_type(&mut self, value_type: IndexType) -> &mut Self {
        self.value_type = value_type;
        self
    }

    /// Store an ontology term reference by id. The id is kept verbatim and
    /// not dereferenced against the registry; dangling references are caught
    /// by validation or at write time.
    pub fn set_ontology_term(&mut self, term_id: impl Into<String>) -> &mut Self {
        self.ontology_term = Some(term_id.into());
        self
    }
}

/// A multi-measurement leaf group: several atomic descriptions read together
/// as one tuple per dimension path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TupleDescription {
    id: Option<String>,
    name: String,
    ontology_term: Option<String>,
    children: Vec<AtomicDescription>,
}

impl TupleDescription {
    /// Optional `id` wire attribute.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Tuple name, e.g. `"statistics"`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Referenced ontology term id, if any.
    pub fn ontology_term(&self) -> Option<&str> {
        self.ontology_term.as_deref()
    }

    /// Atomic member descriptions, in declaration order.
    pub fn children(&self) -> &[AtomicDescription] {
        &self.children
    }

    /// Set the `id` attribute.
    pub fn set_id(&mut self, id: impl Into<String>) -> &mut Self {
        self.id = Some(id.into());
        self
    }

    /// Set the tuple name.
    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = name.into();
        self
    }

    /// Store an ontology term reference by id, verbatim.
    pub fn set_ontology_term(&mut self, term_id: impl Into<String>) -> &mut Self {
        self.ontology_term = Some(term_id.into());
        self
    }

    /// Append an atomic member and return it for configuration.
    pub fn create_atomic_child(&mut self) -> &mut AtomicDescription {
        self.children.push(AtomicDescription::default());
        match self.children.last_mut() {
            Some(child) => child,
            None => unreachable!("just pushed an atomic member"),
        }
    }

    pub(crate) fn push_child(&mut self, child: AtomicDescription) {
        self.children.push(child);
    }
}

/// An inner level of the description tree: one nested dimension.
///
/// Must hold at least one child to be conformant; the builder is permissive
/// and the constraint is enforced at validation and serialization boundaries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeDescription {
    id: Option<String>,
    name: String,
    index_type: IndexType,
    ontology_term: Option<String>,
    children: Vec<DescriptionNode>,
}

impl CompositeDescription {
    /// Optional `id` wire attribute.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Dimension name, e.g. `"time"`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared lexical type of this dimension's index values.
    pub fn index_type(&self) -> IndexType {
        self.index_type
    }

    /// Referenced ontology term id, if any.
    pub fn ontology_term(&self) -> Option<&str> {
        self.ontology_term.as_deref()
    }

    /// Child description nodes, in declaration order.
    pub fn children(&self) -> &[DescriptionNode] {
        &self.children
    }

    /// Set the `id` attribute.
    pub fn set_id(&mut self, id: impl Into<String>) -> &mut Self {
        self.id = Some(id.into());
        self
    }

    /// Set the dimension name.
    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = name.into();
        self
    }

    /// Set the declared index type.
    pub fn set_index_type(&mut self, index_type: IndexType) -> &mut Self {
        self.index_type = index_type;
        self
    }

    /// Store an ontology term reference by id, verbatim.
    pub fn set_ontology_term(&mut self, term_id: impl Into<String>) -> &mut Self {
        self.ontology_term = Some(term_id.into());
        self
    }

    /// Append a nested composite dimension and return it for configuration.
    pub fn create_composite_child(&mut self) -> &mut CompositeDescription {
        self.children
            .push(DescriptionNode::Composite(CompositeDescription::default()));
        match self.children.last_mut() {
            Some(DescriptionNode::Composite(child)) => child,
            _ => unreachable!("just pushed a composite child"),
        }
    }

    /// Append an atomic leaf and return it for configuration.
    pub fn create_atomic_child(&mut self) -> &mut AtomicDescription {
        self.children
            .push(DescriptionNode::Atomic(AtomicDescription::default()));
        match self.children.last_mut() {
            Some(DescriptionNode::Atomic(child)) => child,
            _ => unreachable!("just pushed an atomic child"),
        }
    }

    /// Append a tuple of atomic leaves and return it for configuration.
    pub fn create_tuple_child(&mut self) -> &mut TupleDescription {
        self.children
            .push(DescriptionNode::Tuple(TupleDescription::default()));
        match self.children.last_mut() {
            Some(DescriptionNode::Tuple(child)) => child,
            _ => unreachable!("just pushed a tuple child"),
        }
    }

    pub(crate) fn push_child(&mut self, child: DescriptionNode) {
        self.children.push(child);
    }
}

/// A node of the description tree: a nested dimension, a leaf, or a tuple of
/// leaves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DescriptionNode {
    /// A nested dimension level.
    Composite(CompositeDescription),
    /// A terminal value description.
    Atomic(AtomicDescription),
    /// A group of terminal value descriptions read as one tuple.
    Tuple(TupleDescription),
}

impl DescriptionNode {
    /// The node's dimension name.
    pub fn name(&self) -> &str {
        match self {
            DescriptionNode::Composite(c) => c.name(),
            DescriptionNode::Atomic(a) => a.name(),
            DescriptionNode::Tuple(t) => t.name(),
        }
    }

    /// Borrow as a composite description, if this node is one.
    pub fn as_composite(&self) -> Option<&CompositeDescription> {
        match self {
            DescriptionNode::Composite(c) => Some(c),
            _ => None,
        }
    }

    /// Borrow as an atomic description, if this node is one.
    pub fn as_atomic(&self) -> Option<&AtomicDescription> {
        match self {
            DescriptionNode::Atomic(a) => Some(a),
            _ => None,
        }
    }

    /// Borrow as a tuple description, if this node is one.
    pub fn as_tuple(&self) -> Option<&TupleDescription> {
        match self {
            DescriptionNode::Tuple(t) => Some(t),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_type_tokens() {
        for token in ["string", "integer", "long", "float", "double"] {
            let ty = IndexType::from_token(token).expect("known token");
            assert_eq!(ty.as_token(), token);
        }
        assert!(IndexType::from_token("decimal").is_none());
    }

    #[test]
    fn test_index_type_accepts() {
        assert!(IndexType::Float.accepts("1.66058"));
        assert!(IndexType::Float.accepts("-3e2"));
        assert!(!IndexType::Float.accepts("abc"));
        assert!(IndexType::Integer.accepts("42"));
        assert!(!IndexType::Integer.accepts("4.2"));
        assert!(!IndexType::Integer.accepts("9999999999"));
        assert!(IndexType::Long.accepts("9999999999"));
        assert!(IndexType::String.accepts("anything at all"));
    }

    #[test]
    fn test_builder_appends_in_order() {
        let mut root = CompositeDescription::default();
        root.set_name("time").set_index_type(IndexType::Float);
        root.create_composite_child().set_name("metabolite");
        root.create_atomic_child().set_name("concentration");

        assert_eq!(root.children().len(), 2);
        assert_eq!(root.children()[0].name(), "metabolite");
        assert_eq!(root.children()[1].name(), "concentration");
        assert!(root.children()[1].as_atomic().is_some());
    }

    #[test]
    fn test_tuple_child_holds_atomic_members() {
        let mut root = CompositeDescription::default();
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

        let tuple = root.children()[0].as_tuple().expect("tuple child");
        assert_eq!(tuple.name(), "statistics");
        assert_eq!(tuple.children().len(), 2);
        assert_eq!(tuple.children()[1].name(), "sd");
    }
}
