//! Error taxonomy for builder, reader and writer operations.

use crate::description::IndexType;

/// Errors surfaced by the NUML document model.
///
/// Builder-time violations (`DuplicateId`, `AlreadyHasRoot`) indicate a
/// programming error in tree construction and are returned as hard failures.
/// The same variants describe problems the reader records in its
/// [`ErrorLog`](crate::error_log::ErrorLog) instead of failing, and the single
/// refusal the writer can produce (`NonconformantTree`).
#[derive(Debug, thiserror::Error)]
pub enum NumlError {
    /// An id already exists in the owning registry; the existing entity is
    /// unchanged.
    #[error("duplicate id `{0}`")]
    DuplicateId(String),

    /// A second description root was requested for a result component.
    #[error("result component `{0}` already has a description root")]
    AlreadyHasRoot(String),

    /// A description node references an ontology term id that is not in the
    /// document's registry.
    #[error("unresolved ontology term reference `{reference}` at {path}")]
    UnresolvedReference {
        /// The dangling term id.
        reference: String,
        /// Path of the referencing description node.
        path: String,
    },

    /// A textual value does not lexically match the declared index type.
    #[error("value `{found}` at {path} is not a valid {expected}")]
    TypeMismatch {
        /// The declared index type.
        expected: IndexType,
        /// The offending textual value.
        found: String,
        /// Path of the offending value node.
        path: String,
    },

    /// A value tree's depth or branching diverges from its description tree.
    #[error("value tree diverges from description at {path}: {detail}")]
    ShapeMismatch {
        /// Path of the first divergence.
        path: String,
        /// What diverged.
        detail: String,
    },

    /// Write-time refusal: the document contains a non-conformant result
    /// component and cannot be serialized unambiguously.
    #[error("result component `{component}` is not conformant: {detail}")]
    NonconformantTree {
        /// Id of the offending result component.
        component: String,
        /// First offending path and the nature of the violation.
        detail: String,
    },

    /// The input could not be parsed as a NUML document at all.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Error from the underlying XML parser.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// I/O error while reading a source or flushing a destination.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
