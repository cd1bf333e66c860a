//! Part URI handling for OPC packages

use crate::error::{Error, Result};
use std::fmt;

/// Represents a URI to a part within an OPC package.
///
/// Part URIs are always absolute paths starting with '/'.
/// Example: `/visio/pages/page1.xml`. The package root itself is `/`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartUri {
    path: String,
}

impl PartUri {
    /// Create a new PartUri from a string.
    ///
    /// The path will be normalized (leading '/' ensured, no trailing '/').
    pub fn new(path: &str) -> Result<Self> {
        let path = path.trim();

        if path.is_empty() {
            return Err(Error::InvalidPartUri("empty path".into()));
        }

        let normalized = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };

        let normalized = normalized.trim_end_matches('/').to_string();
        if normalized.is_empty() {
            return Ok(Self::root());
        }

        if normalized.contains("//") {
            return Err(Error::InvalidPartUri(format!(
                "invalid path '{}': contains double slashes",
                path
            )));
        }

        if normalized
            .split('/')
            .any(|segment| segment == "." || segment == "..")
        {
            return Err(Error::InvalidPartUri(format!(
                "invalid path '{}': contains dot segments",
                path
            )));
        }

        Ok(Self { path: normalized })
    }

    /// The package root pseudo-URI `/`
    pub fn root() -> Self {
        Self { path: "/".into() }
    }

    /// Build the URI of a ZIP entry (`visio/document.xml` -> `/visio/document.xml`)
    pub fn from_entry_name(name: &str) -> Result<Self> {
        Self::new(&format!("/{}", name))
    }

    /// Whether this is the package root
    pub fn is_root(&self) -> bool {
        self.path == "/"
    }

    /// Get the path as a string slice
    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// Form used to compare part names, which ignore ASCII case
    pub fn folded(&self) -> String {
        self.path.to_ascii_lowercase()
    }

    /// The ZIP entry name (path without the leading '/')
    pub fn entry_name(&self) -> &str {
        &self.path[1..]
    }

    /// Get the file name portion
    pub fn file_name(&self) -> Option<&str> {
        self.path.rsplit('/').next().filter(|name| !name.is_empty())
    }

    /// Get the file extension
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name()?;
        let (_, ext) = name.rsplit_once('.')?;
        Some(ext).filter(|ext| !ext.is_empty())
    }

    /// Get the parent directory URI
    pub fn parent(&self) -> Option<PartUri> {
        let pos = self.path.rfind('/')?;
        if self.is_root() {
            None
        } else if pos == 0 {
            Some(PartUri::root())
        } else {
            Some(PartUri {
                path: self.path[..pos].to_string(),
            })
        }
    }

    /// Get the relationships URI for this part.
    ///
    /// For `/visio/document.xml`, returns `/visio/_rels/document.xml.rels`.
    /// For the package root, returns `/_rels/.rels`.
    pub fn relationships_uri(&self) -> PartUri {
        if self.is_root() {
            return PartUri {
                path: "/_rels/.rels".into(),
            };
        }

        let file_name = self.file_name().unwrap_or("");
        let parent = match self.parent() {
            Some(p) if !p.is_root() => p.path,
            _ => String::new(),
        };

        PartUri {
            path: format!("{}/_rels/{}.rels", parent, file_name),
        }
    }

    /// Resolve a relationship target against this URI as the source location.
    ///
    /// Relative targets are resolved against the directory holding this part
    /// (the root itself for `/`), absolute targets replace the path.
    /// For `/visio/pages/page1.xml` and `../media/page1.xml`, returns
    /// `/visio/media/page1.xml`.
    ///
    /// A target that climbs above the package root, carries a URI scheme or
    /// authority, or contains empty segments is an [`Error::InvalidReference`].
    pub fn resolve(&self, target: &str) -> Result<PartUri> {
        let invalid = |reason: &str| Error::InvalidReference {
            base: self.path.clone(),
            target: target.to_string(),
            reason: reason.to_string(),
        };

        // Fragments never address a different part
        let reference = target.split('#').next().unwrap_or("");
        if reference.is_empty() {
            return Err(invalid("empty target"));
        }
        if reference.contains('?') {
            return Err(invalid("query components are not part names"));
        }
        if reference.starts_with("//") {
            return Err(invalid("network-path references leave the package"));
        }
        if has_scheme(reference) {
            return Err(invalid("absolute URI outside the package"));
        }

        let base_dir = match self.parent() {
            Some(parent) if !reference.starts_with('/') => parent.path,
            _ => String::new(),
        };
        let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();

        let body = reference.strip_prefix('/').unwrap_or(reference);
        let mut pieces = body.split('/').peekable();
        while let Some(segment) = pieces.next() {
            match segment {
                "." => continue,
                ".." => {
                    if segments.pop().is_none() {
                        return Err(invalid("resolves above the package root"));
                    }
                }
                "" if pieces.peek().is_none() => {
                    return Err(invalid("target names a directory, not a part"))
                }
                "" => return Err(invalid("empty path segment")),
                s => segments.push(s),
            }
        }

        if segments.is_empty() {
            return Err(invalid("target resolves to the package root"));
        }

        PartUri::new(&format!("/{}", segments.join("/")))
    }

    /// Check if this URI points to a relationships file
    pub fn is_relationships(&self) -> bool {
        self.path.contains("/_rels/") && self.path.ends_with(".rels")
    }
}

/// `scheme ":"` prefix per RFC 3986 (letter followed by letters, digits, `+-.`)
fn has_scheme(reference: &str) -> bool {
    let Some((scheme, _)) = reference.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        && !scheme.contains('/')
}

impl fmt::Display for PartUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)
    }
}

impl std::str::FromStr for PartUri {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        PartUri::new(s)
    }
}

/// Well-known part URIs
pub mod well_known {
    use super::PartUri;

    pub fn content_types() -> PartUri {
        PartUri {
            path: "/[Content_Types].xml".into(),
        }
    }

    pub fn package_rels() -> PartUri {
        PartUri::root().relationships_uri()
    }
}
