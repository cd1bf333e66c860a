//! Locating shapes in a page tree and rewriting their text
//!
//! A Visio shape keeps its label in a `Text` child: formatting markers
//! (`cp`, `pp`, `tp`) followed by the literal string. Editing replaces the
//! trailing node and leaves the markers alone.

use crate::error::{Error, Result};
use crate::xml::{ElementRef, XmlElement, XmlNode, XmlText};

/// Tag of the text container inside a shape
pub const TEXT_TAG: &str = "Text";

/// Every element below `root` (inclusive) whose local name is `tag`, lazily,
/// depth-first in document order.
///
/// The sequence can be cloned to walk it again.
pub fn find_descendants_by_tag<'a>(
    root: &'a XmlElement,
    tag: &'a str,
) -> impl Iterator<Item = ElementRef<'a>> + Clone + 'a {
    root.descendants()
        .filter(move |found| found.element.local_name() == tag)
}

/// The first element whose `attr` equals `value` (exact, case-sensitive).
///
/// Candidates are inspected in order and the scan stops at the first match,
/// so among duplicates the earliest one in the document wins. Reaching an
/// element that lacks `attr` altogether is an [`Error::AttributeMissing`].
/// An empty candidate sequence reports its tag as `*`.
pub fn filter_by_attribute<'a, I>(elements: I, attr: &str, value: &str) -> Result<ElementRef<'a>>
where
    I: IntoIterator<Item = ElementRef<'a>>,
{
    let mut tag = None;

    for found in elements {
        match found.element.attribute(attr) {
            Some(v) if v == value => return Ok(found),
            Some(_) => {}
            None => {
                return Err(Error::AttributeMissing {
                    element: describe(found.element),
                    attr: attr.to_string(),
                })
            }
        }
        tag.get_or_insert_with(|| found.element.local_name().to_string());
    }

    Err(Error::ElementNotFound {
        tag: tag.unwrap_or_else(|| "*".into()),
        attr: attr.to_string(),
        value: value.to_string(),
    })
}

/// The last node of the shape's first `Text` child
pub fn locate_text_run(shape: &XmlElement) -> Result<&XmlNode> {
    let text = shape
        .child_element(TEXT_TAG)
        .ok_or_else(|| Error::NoTextElement(describe(shape)))?;
    text.children
        .last()
        .ok_or_else(|| Error::EmptyTextElement(describe(shape)))
}

/// Mutable form of [`locate_text_run`]
pub fn locate_text_run_mut(shape: &mut XmlElement) -> Result<&mut XmlNode> {
    let label = describe(shape);
    let text = shape
        .child_element_mut(TEXT_TAG)
        .ok_or_else(|| Error::NoTextElement(label.clone()))?;
    text.children
        .last_mut()
        .ok_or(Error::EmptyTextElement(label))
}

/// Replace a located text run with `value`.
///
/// A text node keeps its place and only changes value; any other node kind
/// is swapped for a text node.
pub fn replace_text(run: &mut XmlNode, value: &str) {
    match run {
        XmlNode::Text(text) => text.set(value),
        other => *other = XmlNode::Text(XmlText::new(value)),
    }
}

/// `Shape[ID=5]`-style label for error messages
fn describe(element: &XmlElement) -> String {
    match element.attribute("ID") {
        Some(id) => format!("{}[ID={}]", element.name(), id),
        None => element.name().to_string(),
    }
}
