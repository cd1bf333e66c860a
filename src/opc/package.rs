//! OPC Package implementation
//!
//! Opens a ZIP container for exclusive read-write access, walks its
//! relationship graph and writes modified parts back on close.

use crate::error::{Error, Result};
use crate::opc::part::PartWriter;
use crate::opc::{well_known, ContentTypes, Part, PartUri, Relationship, Relationships, TargetMode};
use log::{debug, info, trace, warn};
use std::cell::{OnceCell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::fs::{File, OpenOptions, TryLockError};
use std::io::{self, BufReader, Cursor, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use zip::read::ZipArchive;
use zip::result::ZipError;
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::CompressionMethod;

type Archive = ZipArchive<BufReader<File>>;

/// How [`Package::close`] persists modified parts
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WriteMode {
    /// Truncate and rewrite the locked file itself.
    ///
    /// An I/O failure half way through leaves the container damaged.
    #[default]
    InPlace,
    /// Write a sibling temporary file, then rename it over the container
    Atomic,
}

/// The owner of a set of relationships
#[derive(Clone, Copy, Debug)]
pub enum RelSource<'a> {
    /// Package-level relationships (`/_rels/.rels`)
    Package,
    /// Relationships of a part
    Part(&'a PartUri),
}

impl RelSource<'_> {
    /// Location relationship targets are resolved against
    fn base_uri(&self) -> PartUri {
        match self {
            RelSource::Package => PartUri::root(),
            RelSource::Part(uri) => (*uri).clone(),
        }
    }
}

impl fmt::Display for RelSource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelSource::Package => write!(f, "package root"),
            RelSource::Part(uri) => write!(f, "{}", uri),
        }
    }
}

/// An OPC package (ZIP-based container for VSDX, DOCX, XLSX, ...) held open
/// for exclusive editing.
///
/// The container file stays locked until the package is closed or dropped.
/// Dropping without [`Package::close`] discards every modification.
#[derive(Debug)]
pub struct Package {
    /// Container location
    path: PathBuf,
    /// Locked handle used for in-place writes
    file: File,
    /// Reader over the original archive
    archive: RefCell<Archive>,
    /// Content types ([Content_Types].xml)
    content_types: ContentTypes,
    /// Package-level relationships (/_rels/.rels), read on first use
    relationships: OnceCell<Relationships>,
    /// Content parts in archive order
    parts: Vec<Part>,
    /// Case-folded part name -> position in `parts`
    index: HashMap<String, usize>,
    write_mode: WriteMode,
    /// Set once modifications reached the disk
    flushed: bool,
}

impl Package {
    /// Open a package from a file path for exclusive read-write access
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => Error::ContainerNotFound(path.clone()),
                _ => Error::Io(e),
            })?;

        match file.try_lock() {
            Ok(()) => {}
            Err(TryLockError::WouldBlock) => return Err(Error::ContainerLocked(path)),
            Err(TryLockError::Error(e)) => return Err(Error::Io(e)),
        }

        let reader = BufReader::new(file.try_clone()?);
        let archive = ZipArchive::new(reader).map_err(|e| Error::NotAPackage {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        let mut package = Self {
            path,
            file,
            archive: RefCell::new(archive),
            content_types: ContentTypes::default(),
            relationships: OnceCell::new(),
            parts: Vec::new(),
            index: HashMap::new(),
            write_mode: WriteMode::default(),
            flushed: false,
        };

        // Step 1: Read [Content_Types].xml
        package.read_content_types()?;

        // Step 2: Enumerate content parts; `.rels` files are parsed on demand
        package.read_parts()?;

        debug!(
            "opened {} ({} parts)",
            package.path.display(),
            package.parts.len()
        );

        Ok(package)
    }

    /// Choose how modifications are persisted on close
    pub fn with_write_mode(mut self, mode: WriteMode) -> Self {
        self.write_mode = mode;
        self
    }

    /// Container location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Content parts in archive order (relationship and content-type
    /// entries are not parts)
    pub fn parts(&self) -> impl Iterator<Item = &Part> {
        self.parts.iter()
    }

    /// URI and content type of every content part, in archive order
    pub fn list_parts(&self) -> impl Iterator<Item = (&PartUri, &str)> {
        self.parts.iter().map(|p| (p.uri(), p.content_type()))
    }

    /// Get a part by URI; part names ignore ASCII case
    pub fn part(&self, uri: &PartUri) -> Result<&Part> {
        Ok(&self.parts[self.position(uri)?])
    }

    /// Get content types
    pub fn content_types(&self) -> &ContentTypes {
        &self.content_types
    }

    /// Relationships owned by `source`.
    ///
    /// Only the source's own `.rels` entry is read, the first time it is
    /// asked for; a missing entry means no relationships.
    pub fn relationships(&self, source: RelSource<'_>) -> Result<&Relationships> {
        let (cell, rels_uri) = match source {
            RelSource::Package => (&self.relationships, well_known::package_rels()),
            RelSource::Part(uri) => {
                let part = self.part(uri)?;
                (part.relationships_cell(), part.relationships_uri())
            }
        };

        if let Some(rels) = cell.get() {
            return Ok(rels);
        }
        let rels = self.read_relationships(&rels_uri)?.unwrap_or_default();
        trace!("read {} ({} relationships)", rels_uri, rels.len());
        Ok(cell.get_or_init(|| rels))
    }

    /// Relationships of `source` with exactly `rel_type`, in document order.
    ///
    /// No match is an empty vector, not an error.
    pub fn relationships_by_type(
        &self,
        source: RelSource<'_>,
        rel_type: &str,
    ) -> Result<Vec<&Relationship>> {
        Ok(self.relationships(source)?.by_type(rel_type).collect())
    }

    /// First relationship of `source` with `rel_type`.
    ///
    /// Several edges of the same type are legal; the earliest in document
    /// order is always chosen and the rest are ignored.
    pub fn first_relationship_by_type(
        &self,
        source: RelSource<'_>,
        rel_type: &str,
    ) -> Result<Option<&Relationship>> {
        Ok(self.relationships(source)?.first_by_type(rel_type))
    }

    /// Follow the first `rel_type` edge out of `source` to the part it targets
    pub fn resolve_related_part(&self, source: RelSource<'_>, rel_type: &str) -> Result<&Part> {
        let rel = self
            .first_relationship_by_type(source, rel_type)?
            .ok_or_else(|| Error::RelationshipNotFound {
                owner: source.to_string(),
                rel_type: rel_type.to_string(),
            })?;

        let base = source.base_uri();
        if rel.target_mode == TargetMode::External {
            return Err(Error::InvalidReference {
                base: base.to_string(),
                target: rel.target.clone(),
                reason: "external targets are not package parts".into(),
            });
        }

        let uri = base.resolve(&rel.target)?;
        debug!("{} --[{}]--> {} ({})", source, rel_type, uri, rel.id);
        self.part(&uri)
    }

    /// The payload of a part, read from the archive on first access
    pub fn read_part(&mut self, uri: &PartUri) -> Result<&[u8]> {
        let idx = self.position(uri)?;
        let part = &mut self.parts[idx];

        if !part.is_loaded() {
            // The archive spelling of the name, which may differ in case from `uri`
            let data = read_entry(self.archive.get_mut(), part.uri().entry_name())?
                .ok_or_else(|| Error::PartNotFound(uri.to_string()))?;
            trace!("materialized {} ({} bytes)", part.uri(), data.len());
            part.load(data);
        }

        Ok(self.parts[idx].data().unwrap_or_default())
    }

    /// A byte stream over the part's payload
    pub fn part_reader(&mut self, uri: &PartUri) -> Result<Cursor<&[u8]>> {
        Ok(Cursor::new(self.read_part(uri)?))
    }

    /// A byte sink that replaces the part's payload wholesale once committed
    pub fn part_writer(&mut self, uri: &PartUri) -> Result<PartWriter<'_>> {
        let idx = self.position(uri)?;
        Ok(PartWriter::new(&mut self.parts[idx]))
    }

    /// Persist modified parts and release the lock
    pub fn close(mut self) -> Result<()> {
        self.flush()?;
        self.file.unlock()?;
        debug!("closed {}", self.path.display());
        Ok(())
    }

    // === Private methods ===

    fn position(&self, uri: &PartUri) -> Result<usize> {
        self.index
            .get(&uri.folded())
            .copied()
            .ok_or_else(|| Error::PartNotFound(uri.to_string()))
    }

    fn read_content_types(&mut self) -> Result<()> {
        let uri = well_known::content_types();
        let not_a_package = |reason: String| Error::NotAPackage {
            path: self.path.clone(),
            reason,
        };

        let data = read_entry(self.archive.get_mut(), uri.entry_name())?
            .ok_or_else(|| not_a_package("missing [Content_Types].xml".into()))?;
        let content_types = std::str::from_utf8(&data)
            .map_err(Error::from)
            .and_then(ContentTypes::from_xml)
            .map_err(|e| not_a_package(format!("unreadable [Content_Types].xml: {}", e)))?;

        self.content_types = content_types;
        Ok(())
    }

    fn read_relationships(&self, rels_uri: &PartUri) -> Result<Option<Relationships>> {
        let mut archive = self.archive.borrow_mut();
        let Some(name) = entry_name_ignoring_case(&archive, rels_uri.entry_name()) else {
            return Ok(None);
        };
        let Some(data) = read_entry(&mut archive, &name)? else {
            return Ok(None);
        };

        std::str::from_utf8(&data)
            .map_err(Error::from)
            .and_then(Relationships::from_xml)
            .map(Some)
            .map_err(|e| match e {
                Error::InvalidRelationship(reason) => {
                    Error::InvalidRelationship(format!("{}: {}", rels_uri, reason))
                }
                other => other,
            })
    }

    fn read_parts(&mut self) -> Result<()> {
        let archive = self.archive.get_mut();

        for i in 0..archive.len() {
            let entry = archive.by_index_raw(i)?;
            let name = entry.name().to_string();

            // Skip directories
            if entry.is_dir() {
                continue;
            }
            drop(entry);

            let Ok(uri) = PartUri::from_entry_name(&name) else {
                warn!("skipping archive entry with unusable name '{}'", name);
                continue;
            };

            // Not parts: content types and relationship metadata
            if uri == well_known::content_types() || uri.is_relationships() {
                continue;
            }

            let key = uri.folded();
            if self.index.contains_key(&key) {
                warn!("skipping '{}': part name differs from another only in case", name);
                continue;
            }

            let content_type = self.content_types.get_or_default(&uri).to_string();
            self.index.insert(key, self.parts.len());
            self.parts.push(Part::new(uri, content_type));
        }

        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        let modified = self.parts.iter().filter(|p| p.is_modified()).count();
        if modified == 0 {
            self.flushed = true;
            return Ok(());
        }

        let written = self.rebuild().and_then(|bytes| match self.write_mode {
            WriteMode::InPlace => self.overwrite_in_place(&bytes),
            WriteMode::Atomic => self.replace_atomically(&bytes),
        });
        written.map_err(|source| Error::WriteFailure {
            path: self.path.clone(),
            source,
        })?;

        self.flushed = true;
        info!(
            "rewrote {} ({} modified part(s), {:?})",
            self.path.display(),
            modified,
            self.write_mode
        );
        Ok(())
    }

    /// Copy every archive entry into a new archive, swapping in modified payloads.
    ///
    /// Untouched entries are copied raw, so their compressed bytes, order and
    /// metadata stay identical.
    fn rebuild(&mut self) -> io::Result<Vec<u8>> {
        let Self {
            archive,
            parts,
            index,
            ..
        } = self;
        let (parts, index) = (&*parts, &*index);
        let archive = archive.get_mut();

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

        for i in 0..archive.len() {
            let entry = archive.by_index_raw(i)?;

            let replacement = PartUri::from_entry_name(entry.name())
                .ok()
                .and_then(|uri| index.get(&uri.folded()))
                .map(|&idx| &parts[idx])
                .filter(|part| part.is_modified())
                .and_then(|part| part.data());

            match replacement {
                Some(data) => {
                    let method = match entry.compression() {
                        CompressionMethod::Stored => CompressionMethod::Stored,
                        _ => CompressionMethod::Deflated,
                    };
                    let options = SimpleFileOptions::default().compression_method(method);
                    let name = entry.name().to_string();
                    drop(entry);

                    trace!("writing {} ({} bytes)", name, data.len());
                    zip.start_file(name, options)?;
                    zip.write_all(data)?;
                }
                None => zip.raw_copy_file(entry)?,
            }
        }

        Ok(zip.finish()?.into_inner())
    }

    fn overwrite_in_place(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(bytes)?;
        self.file.set_len(bytes.len() as u64)?;
        self.file.sync_all()
    }

    fn replace_atomically(&self, bytes: &[u8]) -> io::Result<()> {
        let dir = self
            .path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or(Path::new("."));

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(bytes)?;
        tmp.as_file()
            .set_permissions(self.file.metadata()?.permissions())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl Drop for Package {
    fn drop(&mut self) {
        let pending = self.parts.iter().filter(|p| p.is_modified()).count();
        if pending > 0 && !self.flushed {
            warn!(
                "{} released with {} unsaved part(s); changes discarded",
                self.path.display(),
                pending
            );
        }
    }
}

/// The archive's spelling of `name`, matching ASCII case-insensitively when
/// there is no exact entry
fn entry_name_ignoring_case(archive: &Archive, name: &str) -> Option<String> {
    if archive.index_for_name(name).is_some() {
        return Some(name.to_string());
    }
    archive
        .file_names()
        .find(|candidate| candidate.eq_ignore_ascii_case(name))
        .map(str::to_string)
}

/// Read a whole entry; `None` when the archive has no such entry
fn read_entry(archive: &mut Archive, name: &str) -> Result<Option<Vec<u8>>> {
    match archive.by_name(name) {
        Ok(mut file) => {
            let mut data = Vec::new();
            file.read_to_end(&mut data)?;
            Ok(Some(data))
        }
        Err(ZipError::FileNotFound) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opc::rel_types;
    use zip::write::SimpleFileOptions;

    const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/visio/document.xml" ContentType="application/vnd.ms-visio.drawing.main+xml"/>
</Types>"#;

    const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.microsoft.com/visio/2010/relationships/document" Target="visio/document.xml"/>
  <Relationship Id="rId2" Type="http://example.com/link" Target="https://example.com" TargetMode="External"/>
  <Relationship Id="rId3" Type="http://example.com/escape" Target="../outside.xml"/>
  <Relationship Id="rId4" Type="http://example.com/dangling" Target="visio/missing.xml"/>
</Relationships>"#;

    fn write_package(dir: &Path, entries: &[(&str, &str)]) -> PathBuf {
        let path = dir.join("drawing.vsdx");
        let mut zip = ZipWriter::new(File::create(&path).unwrap());
        for (name, body) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
        path
    }

    fn sample(dir: &Path) -> PathBuf {
        write_package(
            dir,
            &[
                ("[Content_Types].xml", CONTENT_TYPES),
                ("_rels/.rels", ROOT_RELS),
                ("visio/document.xml", "<VisioDocument/>"),
                ("visio/media/image1.emf", "EMF"),
            ],
        )
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Package::open(dir.path().join("nope.vsdx")).unwrap_err();
        assert!(matches!(err, Error::ContainerNotFound(_)));
    }

    #[test]
    fn test_open_not_a_zip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.vsdx");
        std::fs::write(&path, b"definitely not a zip").unwrap();
        assert!(matches!(Package::open(&path), Err(Error::NotAPackage { .. })));
    }

    #[test]
    fn test_open_zip_without_content_types() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_package(dir.path(), &[("visio/document.xml", "<VisioDocument/>")]);
        assert!(matches!(Package::open(&path), Err(Error::NotAPackage { .. })));
    }

    #[test]
    fn test_second_open_is_locked() {
        let dir = tempfile::tempdir().unwrap();
        let path = sample(dir.path());

        let pkg = Package::open(&path).unwrap();
        assert!(matches!(Package::open(&path), Err(Error::ContainerLocked(_))));

        pkg.close().unwrap();
        Package::open(&path).unwrap();
    }

    #[test]
    fn test_drop_releases_lock() {
        let dir = tempfile::tempdir().unwrap();
        let path = sample(dir.path());

        drop(Package::open(&path).unwrap());
        assert!(Package::open(&path).is_ok());
    }

    #[test]
    fn test_list_parts_excludes_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = Package::open(sample(dir.path())).unwrap();

        let listed: Vec<(String, String)> = pkg
            .list_parts()
            .map(|(uri, ct)| (uri.to_string(), ct.to_string()))
            .collect();
        assert_eq!(
            listed,
            [
                (
                    "/visio/document.xml".to_string(),
                    "application/vnd.ms-visio.drawing.main+xml".to_string()
                ),
                (
                    "/visio/media/image1.emf".to_string(),
                    "application/octet-stream".to_string()
                ),
            ]
        );
    }

    #[test]
    fn test_parts_are_lazy() {
        let dir = tempfile::tempdir().unwrap();
        let mut pkg = Package::open(sample(dir.path())).unwrap();
        let uri = PartUri::new("/visio/document.xml").unwrap();

        assert!(!pkg.part(&uri).unwrap().is_loaded());
        assert_eq!(pkg.read_part(&uri).unwrap(), b"<VisioDocument/>");
        assert!(pkg.part(&uri).unwrap().is_loaded());
    }

    #[test]
    fn test_resolve_related_part_from_root() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = Package::open(sample(dir.path())).unwrap();

        let part = pkg
            .resolve_related_part(RelSource::Package, rel_types::VISIO_DOCUMENT)
            .unwrap();
        assert_eq!(part.uri().as_str(), "/visio/document.xml");
    }

    #[test]
    fn test_resolve_related_part_errors() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = Package::open(sample(dir.path())).unwrap();

        assert!(matches!(
            pkg.resolve_related_part(RelSource::Package, rel_types::VISIO_PAGES),
            Err(Error::RelationshipNotFound { .. })
        ));
        assert!(matches!(
            pkg.resolve_related_part(RelSource::Package, "http://example.com/link"),
            Err(Error::InvalidReference { .. })
        ));
        assert!(matches!(
            pkg.resolve_related_part(RelSource::Package, "http://example.com/escape"),
            Err(Error::InvalidReference { .. })
        ));
        assert!(matches!(
            pkg.resolve_related_part(RelSource::Package, "http://example.com/dangling"),
            Err(Error::PartNotFound(_))
        ));
    }

    #[test]
    fn test_relationships_by_type_missing_source_part() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = Package::open(sample(dir.path())).unwrap();
        let ghost = PartUri::new("/visio/ghost.xml").unwrap();

        assert!(matches!(
            pkg.relationships_by_type(RelSource::Part(&ghost), rel_types::VISIO_PAGES),
            Err(Error::PartNotFound(_))
        ));

        let doc = PartUri::new("/visio/document.xml").unwrap();
        assert!(pkg
            .relationships_by_type(RelSource::Part(&doc), rel_types::VISIO_PAGES)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_broken_rels_only_fail_their_own_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_package(
            dir.path(),
            &[
                ("[Content_Types].xml", CONTENT_TYPES),
                ("_rels/.rels", ROOT_RELS),
                ("visio/document.xml", "<VisioDocument/>"),
                ("visio/masters/masters.xml", "<Masters/>"),
                (
                    "visio/masters/_rels/masters.xml.rels",
                    r#"<Relationships><Relationship Id="rId1" Type="t"/></Relationships>"#,
                ),
            ],
        );

        let pkg = Package::open(&path).expect("unrelated .rels is not read on open");
        assert!(pkg
            .resolve_related_part(RelSource::Package, rel_types::VISIO_DOCUMENT)
            .is_ok());

        let masters = PartUri::new("/visio/masters/masters.xml").unwrap();
        assert!(pkg.part(&masters).unwrap().relationships().is_none());
        match pkg.relationships(RelSource::Part(&masters)) {
            Err(Error::InvalidRelationship(reason)) => {
                assert!(reason.starts_with("/visio/masters/_rels/masters.xml.rels"), "{reason}")
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_relationships_are_cached_after_first_read() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = Package::open(sample(dir.path())).unwrap();

        let first = pkg.relationships(RelSource::Package).unwrap() as *const Relationships;
        let second = pkg.relationships(RelSource::Package).unwrap() as *const Relationships;
        assert_eq!(first, second);
    }

    #[test]
    fn test_part_names_ignore_ascii_case() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_package(
            dir.path(),
            &[
                ("[Content_Types].xml", CONTENT_TYPES),
                (
                    "_rels/.rels",
                    r#"<Relationships><Relationship Id="rId1" Type="http://schemas.microsoft.com/visio/2010/relationships/document" Target="Visio/Document.XML"/></Relationships>"#,
                ),
                ("visio/document.xml", "<VisioDocument/>"),
                ("visio/_rels/document.xml.rels", r#"<Relationships/>"#),
            ],
        );
        let mut pkg = Package::open(&path).unwrap();

        let part = pkg
            .resolve_related_part(RelSource::Package, rel_types::VISIO_DOCUMENT)
            .unwrap();
        assert_eq!(part.uri().as_str(), "/visio/document.xml");
        assert_eq!(part.content_type(), "application/vnd.ms-visio.drawing.main+xml");

        let mixed = PartUri::new("/VISIO/document.xml").unwrap();
        assert_eq!(pkg.read_part(&mixed).unwrap(), b"<VisioDocument/>");
        assert!(pkg.relationships(RelSource::Part(&mixed)).unwrap().is_empty());
    }

    #[test]
    fn test_part_names_differing_only_in_case_keep_the_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_package(
            dir.path(),
            &[
                ("[Content_Types].xml", CONTENT_TYPES),
                ("visio/document.xml", "<VisioDocument/>"),
                ("Visio/Document.xml", "<Shadow/>"),
            ],
        );
        let mut pkg = Package::open(&path).unwrap();

        assert_eq!(pkg.parts().count(), 1);
        let uri = PartUri::new("/visio/DOCUMENT.xml").unwrap();
        assert_eq!(pkg.read_part(&uri).unwrap(), b"<VisioDocument/>");
    }

    #[test]
    fn test_unreadable_content_types_is_not_a_package() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_package(
            dir.path(),
            &[("[Content_Types].xml", r#"<Types><Override PartName="/a.xml"/></Types>"#)],
        );
        assert!(matches!(Package::open(&path), Err(Error::NotAPackage { .. })));
    }

    #[test]
    fn test_close_without_changes_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = sample(dir.path());
        let before = std::fs::read(&path).unwrap();

        let mut pkg = Package::open(&path).unwrap();
        let uri = PartUri::new("/visio/document.xml").unwrap();
        pkg.read_part(&uri).unwrap();
        pkg.close().unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[test]
    fn test_uncommitted_writer_discards() {
        let dir = tempfile::tempdir().unwrap();
        let mut pkg = Package::open(sample(dir.path())).unwrap();
        let uri = PartUri::new("/visio/document.xml").unwrap();

        {
            let mut writer = pkg.part_writer(&uri).unwrap();
            writer.write_all(b"<Other/>").unwrap();
        }
        assert!(!pkg.part(&uri).unwrap().is_modified());
        assert_eq!(pkg.read_part(&uri).unwrap(), b"<VisioDocument/>");
    }

    #[test]
    fn test_write_back_in_place_and_atomic() {
        for mode in [WriteMode::InPlace, WriteMode::Atomic] {
            let dir = tempfile::tempdir().unwrap();
            let path = sample(dir.path());
            let uri = PartUri::new("/visio/document.xml").unwrap();

            let mut pkg = Package::open(&path).unwrap().with_write_mode(mode);
            let mut writer = pkg.part_writer(&uri).unwrap();
            writer.write_all(b"<VisioDocument><Changed/></VisioDocument>").unwrap();
            writer.commit();
            pkg.close().unwrap();

            let mut pkg = Package::open(&path).unwrap();
            assert_eq!(
                pkg.read_part(&uri).unwrap(),
                b"<VisioDocument><Changed/></VisioDocument>",
                "{mode:?}"
            );
            let media = PartUri::new("/visio/media/image1.emf").unwrap();
            assert_eq!(pkg.read_part(&media).unwrap(), b"EMF");
            assert_eq!(pkg.relationships(RelSource::Package).unwrap().len(), 4);
        }
    }
}
