//! Content Types handling for OPC packages
//!
//! Parses `[Content_Types].xml`

use crate::error::{Error, Result};
use crate::opc::PartUri;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::BufRead;

/// Content types definition for an OPC package
#[derive(Clone, Debug, Default)]
pub struct ContentTypes {
    /// Default extension mappings (extension -> content type)
    defaults: HashMap<String, String>,
    /// Override mappings (case-folded part name -> content type)
    overrides: HashMap<String, String>,
}

impl ContentTypes {
    /// Parse from XML string
    pub fn from_xml(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        Self::from_reader(&mut reader)
    }

    /// Parse from a reader
    pub fn from_reader<R: BufRead>(reader: &mut Reader<R>) -> Result<Self> {
        let mut ct = Self::default();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Empty(e) | Event::Start(e) => {
                    let name = e.name();
                    match name.local_name().as_ref() {
                        b"Default" => {
                            let ext = get_attr(&e, "Extension")?;
                            let content_type = get_attr(&e, "ContentType")?;
                            ct.defaults.insert(ext.to_lowercase(), content_type);
                        }
                        b"Override" => {
                            let part_name = get_attr(&e, "PartName")?;
                            let content_type = get_attr(&e, "ContentType")?;
                            let uri = PartUri::new(&part_name)?;
                            ct.overrides.insert(uri.folded(), content_type);
                        }
                        _ => {}
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(ct)
    }

    /// Get the content type for a part
    pub fn get(&self, uri: &PartUri) -> Option<&str> {
        // Check overrides first
        if let Some(ct) = self.overrides.get(&uri.folded()) {
            return Some(ct);
        }

        // Fall back to extension default
        uri.extension()
            .and_then(|ext| self.defaults.get(&ext.to_lowercase()))
            .map(|s| s.as_str())
    }

    /// Content type for a part, `application/octet-stream` when undeclared
    pub fn get_or_default(&self, uri: &PartUri) -> &str {
        self.get(uri).unwrap_or(OCTET_STREAM)
    }
}

/// Get an attribute value from an XML element
fn get_attr(element: &BytesStart, name: &str) -> Result<String> {
    for attr in element.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == name.as_bytes() {
            return Ok(attr.unescape_value()?.into_owned());
        }
    }
    Err(Error::InvalidContentType(format!(
        "<{}> without {}",
        String::from_utf8_lossy(element.name().as_ref()),
        name
    )))
}

// Well-known content types
pub const RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";
pub const XML: &str = "application/xml";
pub const OCTET_STREAM: &str = "application/octet-stream";
pub const VISIO_DRAWING: &str = "application/vnd.ms-visio.drawing.main+xml";
pub const VISIO_PAGES: &str = "application/vnd.ms-visio.pages+xml";
pub const VISIO_PAGE: &str = "application/vnd.ms-visio.page+xml";
