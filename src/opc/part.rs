//! Part representation for OPC packages

use crate::opc::{PartUri, Relationships};
use std::cell::OnceCell;
use std::io::{self, Write};

/// A part within an OPC package.
///
/// The payload is only read from the archive the first time it is needed;
/// until then [`Part::data`] returns `None`.
#[derive(Clone, Debug)]
pub struct Part {
    /// Part URI
    uri: PartUri,
    /// Content type
    content_type: String,
    /// Outgoing relationships, read from the part's `.rels` on first use
    relationships: OnceCell<Relationships>,
    /// Materialized payload
    data: Option<Vec<u8>>,
    /// Whether the payload was replaced since the package was opened
    modified: bool,
}

impl Part {
    /// Create a part whose payload has not been read yet
    pub fn new(uri: PartUri, content_type: impl Into<String>) -> Self {
        Self {
            uri,
            content_type: content_type.into(),
            relationships: OnceCell::new(),
            data: None,
            modified: false,
        }
    }

    /// Get the part URI
    pub fn uri(&self) -> &PartUri {
        &self.uri
    }

    /// Get the content type
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// The payload, if it has been materialized
    pub fn data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    /// Whether the payload has been read from the archive
    pub fn is_loaded(&self) -> bool {
        self.data.is_some()
    }

    /// Store the payload read from the archive
    pub(crate) fn load(&mut self, data: Vec<u8>) {
        self.data = Some(data);
    }

    /// Replace the payload wholesale
    pub fn set_data(&mut self, data: Vec<u8>) {
        self.data = Some(data);
        self.modified = true;
    }

    /// Outgoing relationships, once the package has read them.
    ///
    /// Use [`Package::relationships`](crate::opc::Package::relationships) to
    /// read them on demand.
    pub fn relationships(&self) -> Option<&Relationships> {
        self.relationships.get()
    }

    pub(crate) fn relationships_cell(&self) -> &OnceCell<Relationships> {
        &self.relationships
    }

    /// Check if the part has been modified
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Get the relationships URI for this part
    pub fn relationships_uri(&self) -> PartUri {
        self.uri.relationships_uri()
    }
}

/// Buffered sink for a part's new payload.
///
/// Nothing reaches the part until [`PartWriter::commit`]; a writer dropped
/// without committing leaves the part as it was.
#[derive(Debug)]
pub struct PartWriter<'a> {
    part: &'a mut Part,
    buf: Vec<u8>,
}

impl<'a> PartWriter<'a> {
    pub(crate) fn new(part: &'a mut Part) -> Self {
        Self {
            part,
            buf: Vec::new(),
        }
    }

    /// Replace the part's payload with everything written so far
    pub fn commit(self) {
        log::trace!("replacing {} ({} bytes)", self.part.uri(), self.buf.len());
        self.part.set_data(self.buf);
    }
}

impl Write for PartWriter<'_> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
