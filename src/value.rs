//! The value (data) half of a result component.
//!
//! Each [`CompositeValue`] root attached to a result component is one row of
//! the dataset, shaped to mirror the component's description tree. Values are
//! stored as the textual tokens supplied at construction or found in the
//! source; the model never reformats them, so round-trips are lossless.

use serde::{Deserialize, Serialize};

/// A leaf value: the measured datum at the end of a dimension path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtomicValue {
    value: String,
}

impl AtomicValue {
    /// The textual value, verbatim.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Set the textual value, kept verbatim.
    pub fn set_value(&mut self, value: impl Into<String>) -> &mut Self {
        self.value = value.into();
        self
    }
}

/// A multi-measurement leaf group: the atomic values read together at the
/// end of one dimension path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tuple {
    children: Vec<AtomicValue>,
}

impl Tuple {
    /// Member values, in insertion order.
    pub fn children(&self) -> &[AtomicValue] {
        &self.children
    }

    /// Append an atomic member value and return it for configuration.
    pub fn create_atomic_child(&mut self) -> &mut AtomicValue {
        self.children.push(AtomicValue::default());
        match self.children.last_mut() {
            Some(child) => child,
            None => unreachable!("just pushed an atomic member"),
        }
    }

    pub(crate) fn push_child(&mut self, child: AtomicValue) {
        self.children.push(child);
    }
}

/// An inner value node: the index of one dimension level plus its children.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeValue {
    index_value: String,
    children: Vec<ValueNode>,
}

impl CompositeValue {
    /// Textual index of this node within its dimension.
    pub fn index_value(&self) -> &str {
        &self.index_value
    }

    /// Child value nodes, in insertion order.
    pub fn children(&self) -> &[ValueNode] {
        &self.children
    }

    /// Set the textual index, kept verbatim.
    pub fn set_index_value(&mut self, index_value: impl Into<String>) -> &mut Self {
        self.index_value = index_value.into();
        self
    }

    /// Append a nested composite value and return it for configuration.
    ///
    /// No conformance check happens here; rows may be built incrementally and
    /// are validated lazily, at [`validate`](crate::validator::validate) calls
    /// and at write time.
    pub fn create_composite_child(&mut self) -> &mut CompositeValue {
        self.children.push(ValueNode::Composite(CompositeValue::default()));
        match self.children.last_mut() {
            Some(ValueNode::Composite(child)) => child,
            _ => unreachable!("just pushed a composite child"),
        }
    }

    /// Append an atomic leaf value and return it for configuration.
    pub fn create_atomic_child(&mut self) -> &mut AtomicValue {
        self.children.push(ValueNode::Atomic(AtomicValue::default()));
        match self.children.last_mut() {
            Some(ValueNode::Atomic(child)) => child,
            _ => unreachable!("just pushed an atomic child"),
        }
    }

    /// Append a tuple of atomic leaf values and return it for configuration.
    pub fn create_tuple_child(&mut self) -> &mut Tuple {
        self.children.push(ValueNode::Tuple(Tuple::default()));
        match self.children.last_mut() {
            Some(ValueNode::Tuple(child)) => child,
            _ => unreachable!("just pushed a tuple child"),
        }
    }

    pub(crate) fn push_child(&mut self, child: ValueNode) {
        self.children.push(child);
    }
}

/// A node of a value tree: a nested index level, a leaf datum, or a tuple of
/// leaf data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueNode {
    /// A nested index level.
    Composite(CompositeValue),
    /// A terminal measured value.
    Atomic(AtomicValue),
    /// A group of terminal measured values read as one tuple.
    Tuple(Tuple),
}

impl ValueNode {
    /// Borrow as a composite value, if this node is one.
    pub fn as_composite(&self) -> Option<&CompositeValue> {
        match self {
            ValueNode::Composite(c) => Some(c),
            _ => None,
        }
    }

    /// Borrow as an atomic value, if this node is one.
    pub fn as_atomic(&self) -> Option<&AtomicValue> {
        match self {
            ValueNode::Atomic(a) => Some(a),
            _ => None,
        }
    }

    /// Borrow as a tuple value, if this node is one.
    pub fn as_tuple(&self) -> Option<&Tuple> {
        match self {
            ValueNode::Tuple(t) => Some(t),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_building_preserves_text() {
        let mut row = CompositeValue::default();
        row.set_index_value("0");
        let inner = row.create_composite_child();
        inner.set_index_value("BL");
        inner.create_atomic_child().set_value("1.66058");

        let inner = row.children()[0].as_composite().expect("composite child");
        assert_eq!(inner.index_value(), "BL");
        let leaf = inner.children()[0].as_atomic().expect("atomic leaf");
        assert_eq!(leaf.value(), "1.66058");
    }

    #[test]
    fn test_tuple_child_holds_atomic_members() {
        let mut row = CompositeValue::default();
        row.set_index_value("s1");
        let tuple = row.create_tuple_child();
        tuple.create_atomic_child().set_value("1.5");
        tuple.create_atomic_child().set_value("0.3");

        let tuple = row.children()[0].as_tuple().expect("tuple child");
        assert_eq!(tuple.children().len(), 2);
        assert_eq!(tuple.children()[1].value(), "0.3");
    }
}
