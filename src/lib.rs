//! # vsdx-shape-text
//!
//! Edit the text of a named shape inside a Visio (VSDX) package.
//!
//! ## Features
//!
//! - Walks the package relationship graph (root -> document -> pages -> page)
//!   instead of hardcoding part paths
//! - Round-trip preservation: untouched XML is written back byte for byte
//! - Only the edited part changes; every other archive entry is copied raw
//! - Exclusive lock on the container for the whole edit
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use vsdx_shape_text::ShapeTextEdit;
//!
//! // Replace the text of the shape named "Shape2" on the first page
//! let report = ShapeTextEdit::new("Shape2", "Danny Nguyen").apply("drawing.vsdx")?;
//! println!("rewrote {}", report.page);
//!
//! // Or walk the package yourself
//! use vsdx_shape_text::opc::{rel_types, Package, RelSource};
//! let pkg = Package::open("drawing.vsdx")?;
//! let doc = pkg.resolve_related_part(RelSource::Package, rel_types::VISIO_DOCUMENT)?;
//! println!("{} ({})", doc.uri(), doc.content_type());
//! ```

pub mod edit;
pub mod error;
pub mod opc;
pub mod shape;
pub mod xml;

pub use edit::{EditError, EditReport, EditState, ShapeTextEdit};
pub use error::{Error, Result};
pub use opc::{Package, Part, PartUri, RelSource, WriteMode};
pub use xml::{XmlDocument, XmlElement, XmlNode};
