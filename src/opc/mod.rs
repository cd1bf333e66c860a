//! Open Packaging Convention (OPC) implementation
//!
//! This module handles the ZIP-based package format used by VSDX files:
//! parts, their content types, and the typed relationships linking them.

mod content_types;
mod package;
mod part;
mod part_uri;
mod relationships;

pub use content_types::{ContentTypes, OCTET_STREAM, RELATIONSHIPS, VISIO_DRAWING, VISIO_PAGE, VISIO_PAGES, XML};
pub use package::{Package, RelSource, WriteMode};
pub use part::{Part, PartWriter};
pub use part_uri::{well_known, PartUri};
pub use relationships::{rel_types, Relationship, Relationships, TargetMode};
