//! Error types for vsdx-shape-text

use std::path::PathBuf;
use thiserror::Error;

/// Main error type
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Container not found: {}", .0.display())]
    ContainerNotFound(PathBuf),

    #[error("Container is locked by another writer: {}", .0.display())]
    ContainerLocked(PathBuf),

    #[error("Not a package: {}: {reason}", .path.display())]
    NotAPackage { path: PathBuf, reason: String },

    #[error("Part not found: {0}")]
    PartNotFound(String),

    #[error("No relationship of type '{rel_type}' on {owner}")]
    RelationshipNotFound { owner: String, rel_type: String },

    #[error("Invalid reference '{target}' from {base}: {reason}")]
    InvalidReference {
        base: String,
        target: String,
        reason: String,
    },

    #[error("Malformed XML: {0}")]
    MalformedXml(String),

    #[error("No <{tag}> element with {attr}=\"{value}\"")]
    ElementNotFound {
        tag: String,
        attr: String,
        value: String,
    },

    #[error("Missing attribute '{attr}' on element '{element}'")]
    AttributeMissing { element: String, attr: String },

    #[error("Shape {0} has no Text element")]
    NoTextElement(String),

    #[error("Text element of shape {0} is empty")]
    EmptyTextElement(String),

    #[error("Failed to write {}: {source}", .path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid part URI: {0}")]
    InvalidPartUri(String),

    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    #[error("Invalid relationship: {0}")]
    InvalidRelationship(String),
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        match err {
            quick_xml::Error::Io(io) => Error::Io(std::io::Error::new(io.kind(), io.to_string())),
            other => Error::MalformedXml(other.to_string()),
        }
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::MalformedXml(err.to_string())
    }
}

impl From<quick_xml::escape::EscapeError> for Error {
    fn from(err: quick_xml::escape::EscapeError) -> Self {
        Error::MalformedXml(err.to_string())
    }
}

impl From<quick_xml::encoding::EncodingError> for Error {
    fn from(err: quick_xml::encoding::EncodingError) -> Self {
        Error::MalformedXml(err.to_string())
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(err: std::str::Utf8Error) -> Self {
        Error::MalformedXml(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
