//! Mutable XML tree with byte-stable re-serialization
//!
//! Every node remembers the text it was parsed from, so writing an untouched
//! tree reproduces its source.

use quick_xml::escape::{partial_escape, unescape};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;

use crate::error::Result;

/// XML node
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum XmlNode {
    /// Element node
    Element(XmlElement),
    /// Character data
    Text(XmlText),
    /// `<![CDATA[...]]>` section
    CData(String),
    /// Comment node
    Comment(String),
    /// Processing instruction (`<?target data?>`)
    ProcessingInstruction(String),
    /// XML declaration content (`xml version="1.0" ...`)
    Declaration(String),
    /// Document type declaration content
    DocType(String),
}

/// XML element with attributes and children
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XmlElement {
    /// Full element name (with prefix, e.g., "v:Shape")
    name: String,
    /// Attributes as (name, unescaped value) pairs
    attributes: Vec<(String, String)>,
    /// Child nodes
    pub children: Vec<XmlNode>,
    /// Whether this was a self-closing element
    self_closing: bool,
    /// Start tag text as parsed; dropped once attributes change
    raw_start: Option<String>,
}

/// Character data, kept both as written and decoded
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XmlText {
    raw: String,
    value: String,
}

/// Child indices leading from an element to one of its descendants
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodePath(Vec<usize>);

/// An element found in a tree, with the path that reaches it
#[derive(Clone, Debug)]
pub struct ElementRef<'a> {
    pub path: NodePath,
    pub element: &'a XmlElement,
}

impl XmlElement {
    /// Create a new empty element
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            self_closing: false,
            raw_start: None,
        }
    }

    /// Build an element from a parsed start (or empty) tag
    pub fn from_start(start: &BytesStart, self_closing: bool) -> Result<Self> {
        let name = std::str::from_utf8(start.name().as_ref())?.to_string();

        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr?;
            let key = std::str::from_utf8(attr.key.as_ref())?.to_string();
            let value = attr.unescape_value()?.into_owned();
            attributes.push((key, value));
        }

        Ok(Self {
            name,
            attributes,
            children: Vec::new(),
            self_closing,
            raw_start: Some(std::str::from_utf8(start)?.to_string()),
        })
    }

    /// Qualified name as written
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name without namespace prefix
    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    /// Attributes in source order
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Value of the attribute named exactly `name`
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set or add an attribute; the start tag is regenerated on output
    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((name.to_string(), value)),
        }
        self.raw_start = None;
    }

    /// Add an attribute
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self.raw_start = None;
        self
    }

    /// Add a child element
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    /// Add a text child
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Text(XmlText::new(text)));
        self
    }

    /// Direct child elements
    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(XmlNode::as_element)
    }

    /// First direct child element with the given local name
    pub fn child_element(&self, local: &str) -> Option<&XmlElement> {
        self.child_elements().find(|e| e.local_name() == local)
    }

    /// First direct child element with the given local name, mutably
    pub fn child_element_mut(&mut self, local: &str) -> Option<&mut XmlElement> {
        self.children.iter_mut().find_map(|node| match node {
            XmlNode::Element(e) if e.local_name() == local => Some(e),
            _ => None,
        })
    }

    /// Concatenated character data of the direct children
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                XmlNode::Text(t) => Some(t.value()),
                XmlNode::CData(c) => Some(c.as_str()),
                _ => None,
            })
            .collect()
    }

    /// This element and all elements below it, depth-first in document order
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            start: Some(self),
            stack: Vec::new(),
            path: Vec::new(),
        }
    }

    /// The element a path leads to
    pub fn element_at(&self, path: &NodePath) -> Option<&XmlElement> {
        let mut current = self;
        for &idx in path.indices() {
            current = current.children.get(idx)?.as_element()?;
        }
        Some(current)
    }

    /// The element a path leads to, mutably
    pub fn element_at_mut(&mut self, path: &NodePath) -> Option<&mut XmlElement> {
        let mut current = self;
        for &idx in path.indices() {
            current = match current.children.get_mut(idx)? {
                XmlNode::Element(e) => e,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Write element to XML writer
    pub fn write_to<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        let start = match &self.raw_start {
            Some(raw) => BytesStart::from_content(raw.as_str(), self.name.len()),
            None => {
                let mut start = BytesStart::new(self.name.as_str());
                for (key, value) in &self.attributes {
                    start.push_attribute((key.as_str(), value.as_str()));
                }
                start
            }
        };

        if self.children.is_empty() && self.self_closing {
            writer.write_event(Event::Empty(start))?;
        } else {
            writer.write_event(Event::Start(start))?;
            for child in &self.children {
                child.write_to(writer)?;
            }
            writer.write_event(Event::End(BytesEnd::new(self.name.as_str())))?;
        }

        Ok(())
    }
}

impl XmlText {
    /// Text from a decoded value
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            raw: partial_escape(&value).into_owned(),
            value,
        }
    }

    /// Text from its escaped source form; fails on bad entity references
    pub fn from_raw(raw: &str) -> Result<Self> {
        Ok(Self {
            value: unescape(raw)?.into_owned(),
            raw: raw.to_string(),
        })
    }

    /// Decoded value
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Escaped form written to output
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Replace the value
    pub fn set(&mut self, value: impl Into<String>) {
        *self = Self::new(value);
    }

    /// Only XML whitespace (space, tab, CR, LF)
    pub fn is_whitespace(&self) -> bool {
        self.raw
            .bytes()
            .all(|b| matches!(b, b' ' | b'\t' | b'\r' | b'\n'))
    }
}

impl XmlNode {
    /// The element, if this node is one
    pub fn as_element(&self) -> Option<&XmlElement> {
        match self {
            XmlNode::Element(e) => Some(e),
            _ => None,
        }
    }

    /// The text, if this node is character data
    pub fn as_text(&self) -> Option<&XmlText> {
        match self {
            XmlNode::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Write node to XML writer
    pub fn write_to<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        match self {
            XmlNode::Element(e) => return e.write_to(writer),
            XmlNode::Text(t) => writer.write_event(Event::Text(BytesText::from_escaped(t.raw())))?,
            XmlNode::CData(c) => writer.write_event(Event::CData(BytesCData::new(c.as_str())))?,
            XmlNode::Comment(c) => {
                writer.write_event(Event::Comment(BytesText::from_escaped(c.as_str())))?
            }
            XmlNode::ProcessingInstruction(pi) => {
                writer.write_event(Event::PI(BytesPI::new(pi.as_str())))?
            }
            XmlNode::Declaration(decl) => writer.write_event(Event::Decl(BytesDecl::from_start(
                BytesStart::from_content(decl.as_str(), 3),
            )))?,
            XmlNode::DocType(doctype) => {
                writer.write_event(Event::DocType(BytesText::from_escaped(doctype.as_str())))?
            }
        }
        Ok(())
    }
}

impl NodePath {
    /// Child indices from the top element down
    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    /// Nesting depth below the element the path starts from
    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

/// Lazy depth-first walk over an element subtree.
///
/// Elements come out in document order, each paired with its path from the
/// starting element. Only the chain of open ancestors is held in memory.
#[derive(Clone, Debug)]
pub struct Descendants<'a> {
    start: Option<&'a XmlElement>,
    stack: Vec<std::iter::Enumerate<std::slice::Iter<'a, XmlNode>>>,
    path: Vec<usize>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = ElementRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(start) = self.start.take() {
            self.stack.push(start.children.iter().enumerate());
            return Some(ElementRef {
                path: NodePath::default(),
                element: start,
            });
        }

        loop {
            let frame = self.stack.last_mut()?;
            match frame.next() {
                Some((idx, XmlNode::Element(element))) => {
                    self.path.push(idx);
                    let path = NodePath(self.path.clone());
                    self.stack.push(element.children.iter().enumerate());
                    return Some(ElementRef { path, element });
                }
                Some(_) => {}
                None => {
                    self.stack.pop();
                    self.path.pop();
                }
            }
        }
    }
}

/// Strip a namespace prefix (`v:Shape` -> `Shape`)
pub fn local_name(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}
