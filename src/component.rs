//! Result components: one description tree paired with zero or more rows.

use serde::{Deserialize, Serialize};

use crate::description::CompositeDescription;
use crate::error::NumlError;
use crate::value::CompositeValue;

/// One dataset within a document: an id, a single description (schema) tree,
/// and an ordered sequence of value (row) trees shaped against it.
///
/// Created through
/// [`NumlDocument::create_result_component`](crate::document::NumlDocument::create_result_component).
/// The description is typically built once before rows are appended; rows may
/// then be ingested incrementally, one
/// [`create_composite_value`](Self::create_composite_value) call per row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultComponent {
    id: String,
    description: Option<CompositeDescription>,
    values: Vec<CompositeValue>,
}

impl ResultComponent {
    pub(crate) fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: None,
            values: Vec::new(),
        }
    }

    /// Document-unique identifier of this component.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The description root, once created.
    pub fn description(&self) -> Option<&CompositeDescription> {
        self.description.as_ref()
    }

    /// Mutable access to the description root, once created.
    pub fn description_mut(&mut self) -> Option<&mut CompositeDescription> {
        self.description.as_mut()
    }

    /// Value rows, in insertion order.
    pub fn values(&self) -> &[CompositeValue] {
        &self.values
    }

    /// Number of value rows.
    pub fn num_values(&self) -> usize {
        self.values.len()
    }

    /// Establish the description root of this component.
    ///
    /// Fails with [`NumlError::AlreadyHasRoot`] if a root already exists.
    pub fn create_composite_description(
        &mut self,
    ) -> Result<&mut CompositeDescription, NumlError> {
        if self.description.is_some() {
            return Err(NumlError::AlreadyHasRoot(self.id.clone()));
        }
        Ok(self.description.insert(CompositeDescription::default()))
    }

    /// Start a new value row and return its root for population.
    ///
    /// Conformance against the description is not checked here; rows are
    /// validated lazily, at [`validate`](crate::validator::validate) calls and
    /// at write time.
    pub fn create_composite_value(&mut self) -> &mut CompositeValue {
        self.values.push(CompositeValue::default());
        match self.values.last_mut() {
            Some(row) => row,
            None => unreachable!("just pushed a row"),
        }
    }

    pub(crate) fn set_description(&mut self, description: CompositeDescription) {
        self.description = Some(description);
    }

    pub(crate) fn push_value(&mut self, row: CompositeValue) {
        self.values.push(row);
    }

    pub(crate) fn retain_values(&mut self, keep: &[bool]) {
        let mut index = 0;
        self.values.retain(|_| {
            let kept = keep.get(index).copied().unwrap_or(true);
            index += 1;
            kept
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::IndexType;
    use crate::error::NumlError;

    #[test]
    fn test_second_root_is_rejected() {
        let mut component = ResultComponent::new("comp1");
        component
            .create_composite_description()
            .expect("first root")
            .set_name("time")
            .set_index_type(IndexType::Float);

        match component.create_composite_description() {
            Err(NumlError::AlreadyHasRoot(id)) => assert_eq!(id, "comp1"),
            other => panic!("expected AlreadyHasRoot, got {other:?}"),
        }
        // The first root is untouched.
        assert_eq!(component.description().map(|d| d.name()), Some("time"));
    }

    #[test]
    fn test_each_root_value_call_starts_a_row() {
        let mut component = ResultComponent::new("comp1");
        component.create_composite_value().set_index_value("0");
        component.create_composite_value().set_index_value("0.2");

        assert_eq!(component.num_values(), 2);
        assert_eq!(component.values()[1].index_value(), "0.2");
    }
}
