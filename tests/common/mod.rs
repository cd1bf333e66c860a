//! Shared fixtures: small VSDX-shaped packages built on the fly

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="png" ContentType="image/png"/><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/visio/document.xml" ContentType="application/vnd.ms-visio.drawing.main+xml"/><Override PartName="/visio/pages/pages.xml" ContentType="application/vnd.ms-visio.pages+xml"/><Override PartName="/visio/pages/page1.xml" ContentType="application/vnd.ms-visio.page+xml"/><Override PartName="/visio/pages/page2.xml" ContentType="application/vnd.ms-visio.page+xml"/></Types>"#;

pub const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/><Relationship Id="rId1" Type="http://schemas.microsoft.com/visio/2010/relationships/document" Target="visio/document.xml"/></Relationships>"#;

pub const APP: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties"><Application>Microsoft Visio</Application></Properties>"#;

pub const DOCUMENT: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<VisioDocument xmlns="http://schemas.microsoft.com/office/visio/2012/main"><DocumentSettings TopPage="0"/></VisioDocument>"#;

pub const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.microsoft.com/visio/2010/relationships/pages" Target="pages/pages.xml"/></Relationships>"#;

pub const PAGES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Pages xmlns="http://schemas.microsoft.com/office/visio/2012/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><Page ID="0" NameU="Page-1" Name="Page-1"><Rel r:id="rId1"/></Page><Page ID="4" NameU="Page-2" Name="Page-2"><Rel r:id="rId2"/></Page></Pages>"#;

/// Two page edges with an unrelated edge between them
pub const PAGES_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.microsoft.com/visio/2010/relationships/page" Target="page1.xml"/><Relationship Id="rId3" Type="http://example.com/relationships/annotation" Target="../media/image1.png"/><Relationship Id="rId2" Type="http://schemas.microsoft.com/visio/2010/relationships/page" Target="page2.xml"/></Relationships>"#;

pub const PAGE1: &str = "<?xml version='1.0' encoding='utf-8' ?>\r\n<PageContents xmlns='http://schemas.microsoft.com/office/visio/2012/main' xmlns:r='http://schemas.openxmlformats.org/officeDocument/2006/relationships' xml:space='preserve'><Shapes><Shape ID='1' NameU='Shape1' Type='Shape' LineStyle='3' FillStyle='3' TextStyle='3'><Cell N='PinX' V='1.5'/><Cell N='PinY' V='2'/><Text><cp IX='0'/>First</Text></Shape><Shape ID='2' NameU='Shape2' Name='Shape2' Type='Shape'><Cell N='PinX' V='3.25'/><Section N='Character'><Row IX='0'><Cell N='Size' V='0.1666666666666667' U='PT'/></Row></Section><Text><cp IX='0'/><pp IX='0'/><run>Old</run></Text></Shape><Shape ID='3' NameU='Dup' Type='Shape'><Text><cp IX='0'/>one</Text></Shape><Shape ID='4' NameU='Dup' Type='Shape'><Text><cp IX='0'/>two</Text></Shape></Shapes></PageContents>";

pub const PAGE2: &str = "<?xml version='1.0' encoding='utf-8' ?>\r\n<PageContents xmlns='http://schemas.microsoft.com/office/visio/2012/main' xml:space='preserve'><Shapes><Shape ID='1' NameU='Shape2' Type='Shape'><Text>Second page</Text></Shape></Shapes></PageContents>";

pub const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

/// Archive entries, in the order they will be written
pub struct Fixture {
    entries: Vec<(String, Vec<u8>, CompressionMethod)>,
}

impl Fixture {
    /// A two-page drawing reachable through document -> pages -> page
    pub fn drawing() -> Self {
        let mut fixture = Self {
            entries: Vec::new(),
        };
        fixture
            .entry("[Content_Types].xml", CONTENT_TYPES)
            .entry("_rels/.rels", ROOT_RELS)
            .entry("docProps/app.xml", APP)
            .entry("visio/document.xml", DOCUMENT)
            .entry("visio/_rels/document.xml.rels", DOCUMENT_RELS)
            .entry("visio/pages/pages.xml", PAGES)
            .entry("visio/pages/_rels/pages.xml.rels", PAGES_RELS)
            .entry("visio/pages/page1.xml", PAGE1)
            .entry("visio/pages/page2.xml", PAGE2);
        fixture.entries.push((
            "visio/media/image1.png".into(),
            PNG.to_vec(),
            CompressionMethod::Stored,
        ));
        fixture
    }

    /// Add or replace an entry (deflated)
    pub fn entry(&mut self, name: &str, body: impl AsRef<[u8]>) -> &mut Self {
        let body = body.as_ref().to_vec();
        match self.entries.iter_mut().find(|(n, _, _)| n == name) {
            Some(existing) => existing.1 = body,
            None => self
                .entries
                .push((name.to_string(), body, CompressionMethod::Deflated)),
        }
        self
    }

    /// Drop an entry
    pub fn without(&mut self, name: &str) -> &mut Self {
        self.entries.retain(|(n, _, _)| n != name);
        self
    }

    /// Write the archive as `dir/drawing.vsdx`
    pub fn write(&self, dir: &Path) -> PathBuf {
        let path = dir.join("drawing.vsdx");
        let mut zip = ZipWriter::new(File::create(&path).expect("create fixture"));
        for (name, body, method) in &self.entries {
            let options = SimpleFileOptions::default().compression_method(*method);
            zip.start_file(name.as_str(), options).expect("start entry");
            zip.write_all(body).expect("write entry");
        }
        zip.finish().expect("finish fixture");
        path
    }
}

/// Every entry's uncompressed bytes, keyed by entry name
pub fn entries(path: &Path) -> BTreeMap<String, Vec<u8>> {
    let mut archive = ZipArchive::new(File::open(path).expect("open archive")).expect("read archive");
    let mut out = BTreeMap::new();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i).expect("entry");
        let mut data = Vec::new();
        file.read_to_end(&mut data).expect("read entry");
        out.insert(file.name().to_string(), data);
    }
    out
}

/// Entry names in archive order
pub fn entry_names(path: &Path) -> Vec<String> {
    let archive = ZipArchive::new(File::open(path).expect("open archive")).expect("read archive");
    archive.file_names().map(str::to_string).collect()
}

/// Entry content as text
pub fn entry_text(path: &Path, name: &str) -> String {
    let data = entries(path).remove(name).expect("entry present");
    String::from_utf8(data).expect("UTF-8 entry")
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
