//! # numl - NUML Document Model and Serializer
//!
//! `numl` models NUML documents: self-describing, dimensioned numerical
//! datasets (such as time-course measurement series) in which every data
//! point is annotated by an ontology-backed schema. A document pairs a
//! recursive **description tree** (nested dimension descriptors with declared
//! index types) with **value trees** (one per row) that must mirror the
//! description's shape and types exactly, and the crate reads and writes that
//! paired structure losslessly to the NUML XML wire format.
//!
//! ## Building a document
//!
//! ```rust
//! use numl::prelude::*;
//!
//! let mut doc = NumlDocument::new();
//! doc.create_ontology_term("term1")?
//!     .set_term("time")
//!     .set_source_term_id("SBO:0000345")
//!     .set_ontology_uri("http://www.ebi.ac.uk/sbo/");
//!
//! let component = doc.create_result_component("result1")?;
//! let time = component.create_composite_description()?;
//! time.set_name("time")
//!     .set_index_type(IndexType::Float)
//!     .set_ontology_term("term1");
//! time.create_atomic_child()
//!     .set_name("concentration")
//!     .set_value_type(IndexType::Float);
//!
//! let row = component.create_composite_value();
//! row.set_index_value("0");
//! row.create_atomic_child().set_value("1.66058");
//!
//! let text = write_numl(&doc)?;
//! let (round_tripped, log) = read_numl_from_str(&text);
//! assert!(log.is_empty());
//! assert_eq!(round_tripped, doc);
//! # Ok::<(), numl::error::NumlError>(())
//! ```
//!
//! ## Reading untrusted input
//!
//! The reader never aborts on recoverable problems. It returns whatever
//! document could be assembled together with an
//! [`ErrorLog`](error_log::ErrorLog); the absence of
//! entries at `error` severity or above is the only green light:
//!
//! ```rust
//! use numl::prelude::*;
//!
//! let (doc, log) = read_numl_from_str("<numl level=\"1\" version=\"1\"/>");
//! if log.count_at_or_above(Severity::Error) == 0 {
//!     // doc is faithful to the source
//! }
//! # let _ = doc;
//! ```
//!
//! ## Conformance
//!
//! Builders are permissive: rows may be assembled incrementally and ontology
//! references are stored verbatim. Conformance between description and value
//! trees is checked lazily, by [`validator::validate`] and at write time;
//! [`writer::write_numl`] refuses non-conformant trees outright rather than
//! emitting ambiguous output.
//!
//! ## Architecture
//!
//! - [`document`]: the [`NumlDocument`](document::NumlDocument) aggregate
//!   root, owning the ontology term registry and all result components
//! - [`ontology`]: ontology term records
//! - [`description`]: the schema half (composite/atomic description nodes)
//! - [`value`]: the data half (composite/atomic value nodes)
//! - [`component`]: result components pairing one description with its rows
//! - [`validator`]: shape, type and reference conformance checks
//! - [`reader`] / [`writer`]: the XML wire format
//! - [`error`] / [`error_log`]: hard failures and accumulated diagnostics

#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod component;
pub mod description;
pub mod document;
pub mod error;
pub mod error_log;
pub mod ontology;
pub mod reader;
pub mod validator;
pub mod value;
pub mod writer;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::component::ResultComponent;
    pub use crate::description::{
        AtomicDescription, CompositeDescription, DescriptionNode, IndexType, TupleDescription,
    };
    pub use crate::document::{
        NumlDocument, NUML_DEFAULT_LEVEL, NUML_DEFAULT_VERSION, NUML_XMLNS_L1V1,
    };
    pub use crate::error::NumlError;
    pub use crate::error_log::{ErrorLog, LogEntry, Severity};
    pub use crate::ontology::OntologyTerm;
    pub use crate::reader::{read_numl, read_numl_from_file, read_numl_from_str};
    pub use crate::validator::validate;
    pub use crate::value::{AtomicValue, CompositeValue, Tuple, ValueNode};
    pub use crate::writer::{write_numl, write_numl_to_file};
}
