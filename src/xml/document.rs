//! Whole-part XML decoding and encoding

use log::debug;
use quick_xml::events::Event;
use quick_xml::{Reader, Writer};
use std::io::{Read, Write};

use crate::error::{Error, Result};
use crate::opc::{Package, PartUri};
use crate::xml::{XmlElement, XmlNode, XmlText};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// A parsed XML part: the root element plus whatever surrounds it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XmlDocument {
    /// Source started with a UTF-8 byte order mark
    bom: bool,
    /// Declaration, comments, whitespace, ... before the root
    prolog: Vec<XmlNode>,
    root: XmlElement,
    /// Comments, whitespace, ... after the root
    epilog: Vec<XmlNode>,
}

impl XmlDocument {
    /// Document consisting of a single root element
    pub fn new(root: XmlElement) -> Self {
        Self {
            bom: false,
            prolog: Vec::new(),
            root,
            epilog: Vec::new(),
        }
    }

    /// Parse a complete document.
    ///
    /// Anything short of a single well-formed root element is rejected with
    /// [`Error::MalformedXml`]; no partial tree is ever returned.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let (bom, body) = match bytes.strip_prefix(UTF8_BOM) {
            Some(rest) => (true, rest),
            None => (false, bytes),
        };

        let mut reader = Reader::from_reader(body);
        let config = reader.config_mut();
        config.trim_text(false);
        config.check_end_names = true;
        config.check_comments = true;

        let mut tree = TreeBuilder::default();
        let mut buf = Vec::new();

        loop {
            let event = reader.read_event_into(&mut buf).map_err(|e| {
                Error::MalformedXml(format!("{} (at byte {})", e, reader.error_position()))
            })?;

            match event {
                Event::Start(e) => tree.open(XmlElement::from_start(&e, false)?)?,
                Event::Empty(e) => tree.push(XmlNode::Element(XmlElement::from_start(&e, true)?))?,
                Event::End(_) => tree.close()?,
                Event::Text(t) => tree.push(XmlNode::Text(XmlText::from_raw(std::str::from_utf8(&t)?)?))?,
                Event::CData(c) => tree.push(XmlNode::CData(std::str::from_utf8(&c)?.to_string()))?,
                Event::Comment(c) => tree.push(XmlNode::Comment(std::str::from_utf8(&c)?.to_string()))?,
                Event::PI(pi) => tree.push(XmlNode::ProcessingInstruction(
                    std::str::from_utf8(&pi)?.to_string(),
                ))?,
                Event::Decl(decl) => {
                    tree.push(XmlNode::Declaration(std::str::from_utf8(&decl)?.to_string()))?
                }
                Event::DocType(d) => tree.push(XmlNode::DocType(std::str::from_utf8(&d)?.to_string()))?,
                Event::Eof => break,
            }
            buf.clear();
        }

        let (prolog, root, epilog) = tree.finish()?;
        Ok(Self {
            bom,
            prolog,
            root,
            epilog,
        })
    }

    /// Parse everything a reader yields
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::decode(&bytes)
    }

    /// Serialize as UTF-8.
    ///
    /// Nodes that were not modified are written exactly as they were parsed.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_to(&mut buf)?;
        Ok(buf)
    }

    /// Serialize into a writer
    pub fn write_to<W: Write>(&self, mut out: W) -> Result<()> {
        if self.bom {
            out.write_all(UTF8_BOM)?;
        }

        let mut writer = Writer::new(out);
        for node in &self.prolog {
            node.write_to(&mut writer)?;
        }
        self.root.write_to(&mut writer)?;
        for node in &self.epilog {
            node.write_to(&mut writer)?;
        }

        Ok(())
    }

    /// Decode the payload of a package part
    pub fn read_part(package: &mut Package, uri: &PartUri) -> Result<Self> {
        let reader = package.part_reader(uri)?;
        Self::from_reader(reader).map_err(|e| match e {
            Error::MalformedXml(reason) => Error::MalformedXml(format!("{}: {}", uri, reason)),
            other => other,
        })
    }

    /// Encode into a package part, replacing its whole payload.
    ///
    /// Other parts are not touched.
    pub fn write_part(&self, package: &mut Package, uri: &PartUri) -> Result<()> {
        let mut writer = package.part_writer(uri)?;
        self.write_to(&mut writer)?;
        writer.commit();
        debug!("encoded {} back into its part", uri);
        Ok(())
    }

    /// Root element
    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    /// Root element, mutably
    pub fn root_mut(&mut self) -> &mut XmlElement {
        &mut self.root
    }
}

/// Assembles the tree from a flat event stream
#[derive(Default)]
struct TreeBuilder {
    /// Elements whose end tag has not been seen yet
    open: Vec<XmlElement>,
    prolog: Vec<XmlNode>,
    root: Option<XmlElement>,
    epilog: Vec<XmlNode>,
}

impl TreeBuilder {
    fn open(&mut self, element: XmlElement) -> Result<()> {
        if self.open.is_empty() && self.root.is_some() {
            return Err(malformed(format!("second root element <{}>", element.name())));
        }
        self.open.push(element);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let element = self
            .open
            .pop()
            .ok_or_else(|| malformed("end tag without start tag".into()))?;
        self.push(XmlNode::Element(element))
    }

    fn push(&mut self, node: XmlNode) -> Result<()> {
        if let Some(parent) = self.open.last_mut() {
            if matches!(node, XmlNode::Declaration(_) | XmlNode::DocType(_)) {
                return Err(malformed("declaration inside an element".into()));
            }
            parent.children.push(node);
            return Ok(());
        }

        match node {
            XmlNode::Element(element) => {
                if self.root.is_some() {
                    return Err(malformed(format!("second root element <{}>", element.name())));
                }
                self.root = Some(element);
            }
            XmlNode::Text(text) if !text.is_whitespace() => {
                return Err(malformed("text outside the root element".into()));
            }
            XmlNode::CData(_) => return Err(malformed("CDATA outside the root element".into())),
            XmlNode::Declaration(_) if !self.prolog.is_empty() || self.root.is_some() => {
                return Err(malformed("XML declaration is not at the start".into()));
            }
            XmlNode::DocType(_) if self.root.is_some() => {
                return Err(malformed("DOCTYPE after the root element".into()));
            }
            other if self.root.is_none() => self.prolog.push(other),
            other => self.epilog.push(other),
        }
        Ok(())
    }

    fn finish(self) -> Result<(Vec<XmlNode>, XmlElement, Vec<XmlNode>)> {
        if let Some(unclosed) = self.open.last() {
            return Err(malformed(format!("unclosed element <{}>", unclosed.name())));
        }
        let root = self.root.ok_or_else(|| malformed("no root element".into()))?;
        Ok((self.prolog, root, self.epilog))
    }
}

fn malformed(reason: String) -> Error {
    Error::MalformedXml(reason)
}
