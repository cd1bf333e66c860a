//! Relationships handling for OPC packages
//!
//! Parses `.rels` files into typed edges, kept in document order.

use crate::error::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::BufRead;

/// Collection of relationships owned by one source (a part or the package root)
#[derive(Clone, Debug, Default)]
pub struct Relationships {
    /// Relationships in document order
    items: Vec<Relationship>,
}

/// A single relationship
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship ID (e.g., "rId1")
    pub id: String,
    /// Relationship type URI
    pub rel_type: String,
    /// Target path (relative or absolute)
    pub target: String,
    /// Target mode
    pub target_mode: TargetMode,
}

/// Target mode for relationships
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TargetMode {
    /// Internal target (part within the package)
    #[default]
    Internal,
    /// External target (hyperlink, etc.)
    External,
}

impl Relationships {
    /// Create empty relationships
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from XML string
    pub fn from_xml(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        Self::from_reader(&mut reader)
    }

    /// Parse from a reader
    pub fn from_reader<R: BufRead>(reader: &mut Reader<R>) -> Result<Self> {
        let mut rels = Self::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Empty(e) | Event::Start(e) => {
                    let name = e.name();
                    if name.local_name().as_ref() == b"Relationship" {
                        let rel = parse_relationship(&e)?;
                        if rels.get(&rel.id).is_some() {
                            return Err(Error::InvalidRelationship(format!(
                                "duplicate relationship id '{}'",
                                rel.id
                            )));
                        }
                        rels.items.push(rel);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(rels)
    }

    /// Get a relationship by ID
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.items.iter().find(|r| r.id == id)
    }

    /// All relationships of a given type, in document order
    pub fn by_type<'a, 't>(
        &'a self,
        rel_type: &'t str,
    ) -> impl Iterator<Item = &'a Relationship> + use<'a, 't> {
        self.items.iter().filter(move |r| r.rel_type == rel_type)
    }

    /// The first relationship of a given type in document order.
    ///
    /// When a source carries several edges of the same type the earliest one
    /// wins; later duplicates are never consulted.
    pub fn first_by_type(&self, rel_type: &str) -> Option<&Relationship> {
        self.by_type(rel_type).next()
    }

    /// Iterate over all relationships
    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.items.iter()
    }

    /// Number of relationships
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Parse a single Relationship element
fn parse_relationship(element: &BytesStart) -> Result<Relationship> {
    let mut id = None;
    let mut rel_type = None;
    let mut target = None;
    let mut target_mode = TargetMode::Internal;

    for attr in element.attributes() {
        let attr = attr?;
        let key = attr.key.local_name();
        let value = attr.unescape_value()?.into_owned();

        match key.as_ref() {
            b"Id" => id = Some(value),
            b"Type" => rel_type = Some(value),
            b"Target" => target = Some(value),
            b"TargetMode" => {
                target_mode = match value.as_str() {
                    "External" => TargetMode::External,
                    "Internal" => TargetMode::Internal,
                    other => {
                        return Err(Error::InvalidRelationship(format!(
                            "unknown TargetMode '{}'",
                            other
                        )))
                    }
                }
            }
            _ => {}
        }
    }

    let missing = |attr: &str| Error::InvalidRelationship(format!("Relationship without {}", attr));

    Ok(Relationship {
        id: id.ok_or_else(|| missing("Id"))?,
        rel_type: rel_type.ok_or_else(|| missing("Type"))?,
        target: target.ok_or_else(|| missing("Target"))?,
        target_mode,
    })
}

/// Well-known relationship types
pub mod rel_types {
    /// Package root -> Visio document part
    pub const VISIO_DOCUMENT: &str = "http://schemas.microsoft.com/visio/2010/relationships/document";
    /// Document part -> pages collection part
    pub const VISIO_PAGES: &str = "http://schemas.microsoft.com/visio/2010/relationships/pages";
    /// Pages part -> individual page contents
    pub const VISIO_PAGE: &str = "http://schemas.microsoft.com/visio/2010/relationships/page";
}
