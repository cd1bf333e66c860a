//! End-to-end shape text edit: package root -> document -> pages -> page ->
//! shape -> text run -> write-back.

use log::{debug, info};
use std::fmt;
use std::path::Path;

use crate::error::{Error, Result};
use crate::opc::{rel_types, Package, PartUri, RelSource, WriteMode};
use crate::shape;
use crate::xml::XmlDocument;

/// Progress of a single edit
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum EditState {
    Opened,
    DocumentPartResolved,
    PagesPartResolved,
    PagePartResolved,
    PageXmlDecoded,
    ShapeLocated,
    TextReplaced,
    Written,
    Closed,
}

impl fmt::Display for EditState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EditState::Opened => "opening the container",
            EditState::DocumentPartResolved => "resolving the document part",
            EditState::PagesPartResolved => "resolving the pages part",
            EditState::PagePartResolved => "resolving the page part",
            EditState::PageXmlDecoded => "decoding the page XML",
            EditState::ShapeLocated => "locating the shape",
            EditState::TextReplaced => "replacing the text",
            EditState::Written => "encoding the page",
            EditState::Closed => "closing the container",
        };
        f.write_str(label)
    }
}

/// A failed edit: the last state reached and what went wrong after it.
///
/// The container is always unlocked by the time this is returned.
#[derive(Debug)]
pub struct EditError {
    /// `None` when the container could not be opened
    pub reached: Option<EditState>,
    pub error: Error,
}

impl std::error::Error for EditError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl fmt::Display for EditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reached {
            None => write!(f, "cannot open container: {}", self.error),
            Some(state) => write!(f, "edit aborted after {}: {}", state, self.error),
        }
    }
}

/// What a successful edit changed
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditReport {
    /// Page part that was rewritten
    pub page: PartUri,
    /// Trailing text of the shape before the edit (`None` if it was not text)
    pub previous_text: Option<String>,
}

/// Request to replace the text of one shape.
///
/// Defaults follow the Visio package layout: the first page reached through
/// `document` -> `pages` -> `page` relationships, shapes selected by `NameU`.
#[derive(Clone, Debug)]
pub struct ShapeTextEdit {
    document_rel: String,
    pages_rel: String,
    page_rel: String,
    tag: String,
    attribute: String,
    value: String,
    text: String,
    write_mode: WriteMode,
}

impl ShapeTextEdit {
    /// Set the text of the shape whose `NameU` is `value`
    pub fn new(value: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            document_rel: rel_types::VISIO_DOCUMENT.to_string(),
            pages_rel: rel_types::VISIO_PAGES.to_string(),
            page_rel: rel_types::VISIO_PAGE.to_string(),
            tag: "Shape".to_string(),
            attribute: "NameU".to_string(),
            value: value.into(),
            text: text.into(),
            write_mode: WriteMode::default(),
        }
    }

    /// Select shapes by a different attribute
    pub fn attribute(mut self, name: impl Into<String>) -> Self {
        self.attribute = name.into();
        self
    }

    /// Search elements with a different local name
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Relationship types followed from the root to the page
    pub fn relationship_types(
        mut self,
        document: impl Into<String>,
        pages: impl Into<String>,
        page: impl Into<String>,
    ) -> Self {
        self.document_rel = document.into();
        self.pages_rel = pages.into();
        self.page_rel = page.into();
        self
    }

    /// How the container is persisted
    pub fn write_mode(mut self, mode: WriteMode) -> Self {
        self.write_mode = mode;
        self
    }

    /// Open the container at `path` and apply the edit
    pub fn apply<P: AsRef<Path>>(&self, path: P) -> std::result::Result<EditReport, EditError> {
        let package = Package::open(path).map_err(|error| EditError {
            reached: None,
            error,
        })?;
        self.apply_to(package.with_write_mode(self.write_mode))
    }

    /// Apply the edit to an open package, then close it.
    ///
    /// On failure the package is dropped unsaved, which releases its lock.
    pub fn apply_to(&self, mut package: Package) -> std::result::Result<EditReport, EditError> {
        let mut state = EditState::Opened;
        debug!("{}: {:?}", package.path().display(), state);

        let report = self
            .run(&mut package, &mut state)
            .map_err(|error| EditError {
                reached: Some(state),
                error,
            })?;

        package.close().map_err(|error| EditError {
            reached: Some(EditState::Written),
            error,
        })?;
        advance(&mut state, EditState::Closed);

        info!(
            "set {}=\"{}\" text in {}",
            self.attribute, self.value, report.page
        );
        Ok(report)
    }

    fn run(&self, package: &mut Package, state: &mut EditState) -> Result<EditReport> {
        let document = package
            .resolve_related_part(RelSource::Package, &self.document_rel)?
            .uri()
            .clone();
        advance(state, EditState::DocumentPartResolved);

        let pages = package
            .resolve_related_part(RelSource::Part(&document), &self.pages_rel)?
            .uri()
            .clone();
        advance(state, EditState::PagesPartResolved);

        let page = package
            .resolve_related_part(RelSource::Part(&pages), &self.page_rel)?
            .uri()
            .clone();
        advance(state, EditState::PagePartResolved);

        let mut xml = XmlDocument::read_part(package, &page)?;
        advance(state, EditState::PageXmlDecoded);

        let path = shape::filter_by_attribute(
            shape::find_descendants_by_tag(xml.root(), &self.tag),
            &self.attribute,
            &self.value,
        )
        .map_err(|e| match e {
            // No element with the tag was scanned, so the error cannot name it
            Error::ElementNotFound { attr, value, .. } => Error::ElementNotFound {
                tag: self.tag.clone(),
                attr,
                value,
            },
            other => other,
        })?
        .path;
        let target = xml
            .root_mut()
            .element_at_mut(&path)
            .ok_or_else(|| Error::ElementNotFound {
                tag: self.tag.clone(),
                attr: self.attribute.clone(),
                value: self.value.clone(),
            })?;
        advance(state, EditState::ShapeLocated);

        let run = shape::locate_text_run_mut(target)?;
        let previous_text = run.as_text().map(|t| t.value().to_string());
        shape::replace_text(run, &self.text);
        advance(state, EditState::TextReplaced);

        xml.write_part(package, &page)?;
        advance(state, EditState::Written);

        Ok(EditReport {
            page,
            previous_text,
        })
    }
}

fn advance(state: &mut EditState, next: EditState) {
    debug!("{:?} -> {:?}", state, next);
    *state = next;
}
