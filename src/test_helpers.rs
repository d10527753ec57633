//! Shared test utilities for the photo-report test suite.
//!
//! Everything is built in-process: images are encoded with the `image`
//! crate, archives and `.docx` templates are written with the `zip` crate.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let archive = tmp.path().join("survey.zip");
//! write_zip(&archive, &[
//!     ("root/A/img1.png", png_bytes(400, 300)),
//!     ("root/B/img3.jpg", jpeg_bytes(400, 300)),
//! ]);
//!
//! let template = tmp.path().join("model.docx");
//! write_docx(&template, &paragraph("{{start_here}}"));
//! ```

use image::{ImageEncoder, RgbImage};
use std::io::{Read, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;

// =========================================================================
// Images
// =========================================================================

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

/// Encode a small valid JPEG with the given dimensions.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = gradient(width, height);
    let mut bytes = Vec::new();
    image::codecs::jpeg::JpegEncoder::new(&mut bytes)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    bytes
}

/// Encode a small valid PNG with the given dimensions.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = gradient(width, height);
    let mut bytes = Vec::new();
    image::codecs::png::PngEncoder::new(&mut bytes)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    bytes
}

pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    std::fs::write(path, jpeg_bytes(width, height)).unwrap();
}

pub fn create_test_png(path: &Path, width: u32, height: u32) {
    std::fs::write(path, png_bytes(width, height)).unwrap();
}

// =========================================================================
// Zip archives
// =========================================================================

/// Write a zip archive. Names ending in `/` become directory entries.
pub fn write_zip<B: AsRef<[u8]>>(path: &Path, entries: &[(&str, B)]) {
    let file = std::fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default();
    for (name, data) in entries {
        if name.ends_with('/') {
            zip.add_directory(*name, options).unwrap();
        } else {
            zip.start_file(*name, options).unwrap();
            zip.write_all(data.as_ref()).unwrap();
        }
    }
    zip.finish().unwrap();
}

/// Read one entry of a zip archive (e.g. a part of a `.docx`).
pub fn read_zip_entry(path: &Path, name: &str) -> Vec<u8> {
    let file = std::fs::File::open(path).unwrap();
    let mut zip = zip::ZipArchive::new(file).unwrap();
    let mut entry = zip
        .by_name(name)
        .unwrap_or_else(|_| panic!("entry '{name}' not found in {}", path.display()));
    let mut out = Vec::new();
    entry.read_to_end(&mut out).unwrap();
    out
}

pub fn read_zip_text(path: &Path, name: &str) -> String {
    String::from_utf8(read_zip_entry(path, name)).unwrap()
}

/// All entry names of a zip archive, in archive order.
pub fn zip_entry_names(path: &Path) -> Vec<String> {
    let file = std::fs::File::open(path).unwrap();
    let zip = zip::ZipArchive::new(file).unwrap();
    zip.file_names().map(String::from).collect()
}

// =========================================================================
// Word templates
// =========================================================================

pub const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// A plain body paragraph with a single run.
pub fn paragraph(text: &str) -> String {
    format!("<w:p><w:r><w:t xml:space=\"preserve\">{text}</w:t></w:r></w:p>")
}

pub fn document_xml(body: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <w:document xmlns:w=\"{W_NS}\" \
         xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\">\
         <w:body>{body}<w:sectPr><w:pgSz w:w=\"11906\" w:h=\"16838\"/></w:sectPr></w:body>\
         </w:document>"
    )
}

const CONTENT_TYPES: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
<Default Extension=\"xml\" ContentType=\"application/xml\"/>\
<Override PartName=\"/word/document.xml\" \
ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml\"/>\
</Types>";

const PACKAGE_RELS: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
<Relationship Id=\"rId1\" \
Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" \
Target=\"word/document.xml\"/>\
</Relationships>";

const DOCUMENT_RELS: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
<Relationship Id=\"rId1\" \
Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles\" \
Target=\"styles.xml\"/>\
</Relationships>";

/// Write a minimal `.docx` whose body holds `body` (raw WordprocessingML).
pub fn write_docx(path: &Path, body: &str) {
    write_docx_with_parts(path, body, &[]);
}

/// Like [`write_docx`], plus extra parts such as `word/header1.xml`.
pub fn write_docx_with_parts(path: &Path, body: &str, extra: &[(&str, String)]) {
    let document = document_xml(body);
    let mut entries: Vec<(&str, Vec<u8>)> = vec![
        ("[Content_Types].xml", CONTENT_TYPES.as_bytes().to_vec()),
        ("_rels/.rels", PACKAGE_RELS.as_bytes().to_vec()),
        ("word/document.xml", document.into_bytes()),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS.as_bytes().to_vec()),
    ];
    for (name, content) in extra {
        entries.push((name, content.as_bytes().to_vec()));
    }
    write_zip(path, &entries);
}

/// A header part with one paragraph of text.
pub fn header_xml(text: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <w:hdr xmlns:w=\"{W_NS}\">{}</w:hdr>",
        paragraph(text)
    )
}
