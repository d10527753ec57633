//! In-memory OOXML package.
//!
//! A `.docx` is a zip of XML parts and media. The whole package is read into
//! memory, a handful of parts are rewritten, and the result is written back
//! out with every untouched part copied byte for byte.

use super::ComposeError;
use std::io::{Read, Write};
use std::path::Path;
use zip::ZipArchive;
use zip::write::SimpleFileOptions;

pub const DOCUMENT_PART: &str = "word/document.xml";
pub const DOCUMENT_RELS_PART: &str = "word/_rels/document.xml.rels";
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

#[derive(Debug, Clone, Default)]
pub struct Package {
    /// Parts in archive order; added parts are appended.
    parts: Vec<(String, Vec<u8>)>,
}

impl Package {
    /// Read every entry of a template into memory.
    pub fn read(path: &Path) -> Result<Self, ComposeError> {
        let file = std::fs::File::open(path)?;
        let mut zip = ZipArchive::new(std::io::BufReader::new(file)).map_err(|e| {
            ComposeError::InvalidTemplate(format!("{}: {}", path.display(), e))
        })?;

        let mut parts = Vec::with_capacity(zip.len());
        for i in 0..zip.len() {
            let mut entry = zip.by_index(i).map_err(|e| {
                ComposeError::InvalidTemplate(format!("{}: {}", path.display(), e))
            })?;
            if entry.is_dir() {
                continue;
            }
            let mut data = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut data)?;
            parts.push((entry.name().to_string(), data));
        }

        let package = Self { parts };
        if !package.contains(DOCUMENT_PART) {
            return Err(ComposeError::InvalidTemplate(format!(
                "{}: missing {DOCUMENT_PART}",
                path.display()
            )));
        }
        Ok(package)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parts.iter().any(|(n, _)| n == name)
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.as_slice())
    }

    /// Replace a part's content, or append it when absent.
    pub fn put(&mut self, name: &str, data: Vec<u8>) {
        match self.parts.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = data,
            None => self.parts.push((name.to_string(), data)),
        }
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|(n, _)| n.as_str())
    }

    /// Parts whose text takes placeholder substitution: the main document
    /// plus every header and footer.
    pub fn text_part_names(&self) -> Vec<String> {
        self.part_names()
            .filter(|name| is_text_part(name))
            .map(String::from)
            .collect()
    }

    /// Write the package as a zip file.
    pub fn write(&self, path: &Path) -> Result<(), ComposeError> {
        let write_err = |e: &dyn std::fmt::Display| {
            ComposeError::DocumentWrite(format!("{}: {}", path.display(), e))
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| write_err(&e))?;
        }
        let file = std::fs::File::create(path).map_err(|e| write_err(&e))?;
        let mut zip = zip::ZipWriter::new(std::io::BufWriter::new(file));
        let options = SimpleFileOptions::default();

        for (name, data) in &self.parts {
            zip.start_file(name.as_str(), options)
                .map_err(|e| write_err(&e))?;
            zip.write_all(data).map_err(|e| write_err(&e))?;
        }
        let mut writer = zip.finish().map_err(|e| write_err(&e))?;
        writer.flush().map_err(|e| write_err(&e))?;
        Ok(())
    }
}

fn is_text_part(name: &str) -> bool {
    if name == DOCUMENT_PART {
        return true;
    }
    let Some(file) = name.strip_prefix("word/") else {
        return false;
    };
    !file.contains('/')
        && file.ends_with(".xml")
        && (file.starts_with("header") || file.starts_with("footer"))
}
