//! XML tree and part codec with round-trip preservation

mod document;
mod node;

pub use document::XmlDocument;
pub use node::{local_name, Descendants, ElementRef, NodePath, XmlElement, XmlNode, XmlText};

/// Visio 2012 drawing namespace
pub const VISIO_MAIN: &str = "http://schemas.microsoft.com/office/visio/2012/main";
