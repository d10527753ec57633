//! Document composition.
//!
//! Final stage of the pipeline. Takes a `.docx` template, a Content Sequence
//! and a placeholder map, and writes the finished report.
//!
//! ## Steps
//!
//! 1. Read the template package into memory (the template file is never written).
//! 2. Substitute placeholders in the body, tables, headers and footers.
//! 3. Classify every image and fold runs of small ones into group tables.
//! 4. Resize and re-encode all images in parallel.
//! 5. Emit headings, images, tables and page breaks in sequence order and
//!    splice them in at the insertion marker (or at the end of the body).
//! 6. Register the new media parts and write the package to the output path.
//!
//! ## Output Structure
//!
//! ```text
//! report.docx
//! ├── [Content_Types].xml          # + Default jpeg
//! ├── word/document.xml            # substituted + generated content
//! ├── word/_rels/document.xml.rels # + one image relationship per embed
//! ├── word/header1.xml             # substituted
//! └── word/media/
//!     ├── report_image1.jpeg
//!     └── ...
//! ```
//!
//! Missing or zero-length images and images that fail to decode are skipped
//! with a warning. Every embedded scratch image is deleted once its bytes are
//! in the package.

mod layout;
mod markup;
mod package;
mod xml;

pub use layout::plan_layout;
pub use xml::{InsertionPoint, replace_tokens};

use crate::config::ReportConfig;
use crate::imaging::{
    ImageBackend, ImageClass, Placement, PreparedImage, RustBackend, SizingRules, classify,
    prepare_embed,
};
use crate::metadata::PlaceholderMap;
use crate::naming::is_normal_text_section;
use crate::scratch;
use crate::types::ContentItem;
use log::{debug, info, warn};
use markup::EmbeddedImage;
use package::{CONTENT_TYPES_PART, DOCUMENT_PART, DOCUMENT_RELS_PART, Package};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;
use xml::ImageRelationship;

#[derive(Error, Debug)]
pub enum ComposeError {
    #[error("Template not found: {0}")]
    TemplateNotFound(PathBuf),
    #[error("Invalid template: {0}")]
    InvalidTemplate(String),
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("Failed to write document: {0}")]
    DocumentWrite(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// First `wp:docPr` id used for generated drawings.
const DRAWING_ID_BASE: usize = 10_000;

/// Layout and styling settings for composition.
#[derive(Debug, Clone)]
pub struct ComposeOptions {
    pub insertion_marker: String,
    pub max_group_size: usize,
    /// Section titles that render as bold body text instead of headings.
    pub normal_text: Vec<String>,
    pub sizing: SizingRules,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self::from(&ReportConfig::default())
    }
}

impl From<&ReportConfig> for ComposeOptions {
    fn from(config: &ReportConfig) -> Self {
        Self {
            insertion_marker: config.layout.insertion_marker.clone(),
            max_group_size: config.layout.max_group_size,
            normal_text: config.folders.normal_text.clone(),
            sizing: config.images.sizing_rules(),
        }
    }
}

/// Compose a report with the default image backend.
pub fn compose(
    template: &Path,
    sequence: &[ContentItem],
    placeholders: &PlaceholderMap,
    output: &Path,
    options: &ComposeOptions,
) -> Result<usize, ComposeError> {
    let backend = RustBackend::new();
    compose_with_backend(&backend, template, sequence, placeholders, output, options)
}

/// Compose a report using a specific backend (allows testing with mock).
///
/// Returns the number of images embedded; members of a group table count
/// individually.
pub fn compose_with_backend(
    backend: &impl ImageBackend,
    template: &Path,
    sequence: &[ContentItem],
    placeholders: &PlaceholderMap,
    output: &Path,
    options: &ComposeOptions,
) -> Result<usize, ComposeError> {
    if !template.is_file() {
        return Err(ComposeError::TemplateNotFound(template.to_path_buf()));
    }
    let mut package = Package::read(template)?;

    for part in package.text_part_names() {
        let Some(data) = package.get(&part) else {
            continue;
        };
        let (rewritten, changed) = xml::substitute_placeholders(data, placeholders)?;
        if changed > 0 {
            debug!("Substituted {changed} text node(s) in {part}");
            package.put(&part, rewritten);
        }
    }

    let classes = classify_all(backend, sequence, &options.sizing);
    let laid_out = plan_layout(sequence, options.max_group_size, |path| {
        classes.get(path).copied().unwrap_or(ImageClass::Large)
    });

    let jobs = embed_jobs(&laid_out);
    let prepared: Vec<Option<PreparedImage>> = jobs
        .par_iter()
        .map(|(path, placement)| prepare(backend, path, *placement, &options.sizing))
        .collect();

    let mut media = MediaAllocator::new(&package)?;
    let mut prepared = prepared.into_iter();
    let mut content = String::new();
    let mut embedded = 0;

    for item in &laid_out {
        match item {
            ContentItem::Heading { text, level } => {
                let normal = is_normal_text_section(text, &options.normal_text);
                content.push_str(&markup::heading(text, *level, normal));
            }
            ContentItem::ImageRef { path } => {
                if let Some(image) = prepared.next().flatten() {
                    let image = media.store(&mut package, path, image);
                    content.push_str(&markup::single_image(&image));
                    embedded += 1;
                    scratch::discard(path);
                }
            }
            ContentItem::ImageGroup { paths } => {
                let mut members = Vec::with_capacity(paths.len());
                for path in paths {
                    if let Some(image) = prepared.next().flatten() {
                        members.push(media.store(&mut package, path, image));
                        scratch::discard(path);
                    }
                }
                if !members.is_empty() {
                    embedded += members.len();
                    content.push_str(&markup::image_group(&members));
                }
            }
            ContentItem::PageBreak => content.push_str(markup::page_break()),
        }
    }

    let document = package.get(DOCUMENT_PART).unwrap_or_default();
    let (document, point) = xml::insert_content(document, &options.insertion_marker, &content)?;
    if point == InsertionPoint::BodyEnd {
        warn!(
            "Insertion marker {} not found in {}; appending content at the end",
            options.insertion_marker,
            template.display()
        );
    }
    package.put(DOCUMENT_PART, document);

    if !media.relationships.is_empty() {
        let rels = xml::add_relationships(package.get(DOCUMENT_RELS_PART), &media.relationships)?;
        package.put(DOCUMENT_RELS_PART, rels);

        let content_types = package.get(CONTENT_TYPES_PART).ok_or_else(|| {
            ComposeError::InvalidTemplate(format!("missing {CONTENT_TYPES_PART}"))
        })?;
        let content_types =
            xml::ensure_default_content_type(content_types, "jpeg", "image/jpeg")?;
        package.put(CONTENT_TYPES_PART, content_types);
    }

    package.write(output)?;
    info!(
        "Wrote {} with {} embedded image(s)",
        output.display(),
        embedded
    );
    Ok(embedded)
}

/// Classify every distinct image in parallel. Unreadable images are left out
/// and fall back to single placement (where they are skipped later).
fn classify_all(
    backend: &impl ImageBackend,
    sequence: &[ContentItem],
    rules: &SizingRules,
) -> HashMap<PathBuf, ImageClass> {
    let mut seen = HashSet::new();
    let paths: Vec<&PathBuf> = sequence
        .iter()
        .filter_map(|item| match item {
            ContentItem::ImageRef { path } => Some(path),
            _ => None,
        })
        .filter(|path| seen.insert(path.as_path()))
        .collect();

    paths
        .par_iter()
        .filter_map(|path| match classify(backend, path, rules) {
            Ok(class) => Some(((*path).clone(), class)),
            Err(e) => {
                debug!("Could not classify {}: {}", path.display(), e);
                None
            }
        })
        .collect()
}

/// Every image to prepare, in emission order.
fn embed_jobs(laid_out: &[ContentItem]) -> Vec<(PathBuf, Placement)> {
    let mut jobs = Vec::new();
    for item in laid_out {
        match item {
            ContentItem::ImageRef { path } => jobs.push((path.clone(), Placement::Single)),
            ContentItem::ImageGroup { paths } => {
                jobs.extend(paths.iter().map(|p| (p.clone(), Placement::Grouped)));
            }
            ContentItem::Heading { .. } | ContentItem::PageBreak => {}
        }
    }
    jobs
}

/// Resize one image for embedding; `None` means skip it.
fn prepare(
    backend: &impl ImageBackend,
    path: &Path,
    placement: Placement,
    rules: &SizingRules,
) -> Option<PreparedImage> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.len() > 0 => {}
        Ok(_) => {
            warn!("Skipping empty image {}", path.display());
            return None;
        }
        Err(_) => {
            warn!("Skipping missing image {}", path.display());
            return None;
        }
    }
    match prepare_embed(backend, path, placement, rules) {
        Ok(image) => Some(image),
        Err(e) => {
            warn!("Skipping image {}: {}", path.display(), e);
            None
        }
    }
}

/// Hands out media part names and relationship ids that do not collide
/// with anything already in the template.
struct MediaAllocator {
    taken_ids: HashSet<String>,
    next: usize,
    relationships: Vec<ImageRelationship>,
}

impl MediaAllocator {
    fn new(package: &Package) -> Result<Self, ComposeError> {
        let taken_ids = match package.get(DOCUMENT_RELS_PART) {
            Some(rels) => xml::relationship_ids(rels)?,
            None => HashSet::new(),
        };
        Ok(Self {
            taken_ids,
            next: 1,
            relationships: Vec::new(),
        })
    }

    /// Add the image bytes as a media part and return its reference.
    fn store(&mut self, package: &mut Package, source: &Path, image: PreparedImage) -> EmbeddedImage {
        let (n, file_name, id) = loop {
            let n = self.next;
            self.next += 1;
            let file_name = format!("report_image{n}.jpeg");
            let id = format!("rIdReport{n}");
            if !package.contains(&format!("word/media/{file_name}")) && !self.taken_ids.contains(&id) {
                break (n, file_name, id);
            }
        };

        debug!("Embedding {} as {}", source.display(), file_name);
        package.put(&format!("word/media/{file_name}"), image.jpeg);
        self.taken_ids.insert(id.clone());
        self.relationships.push(ImageRelationship {
            id: id.clone(),
            target: format!("media/{file_name}"),
        });

        EmbeddedImage {
            relationship_id: id,
            drawing_id: DRAWING_ID_BASE + n,
            name: file_name,
            size: image.size,
        }
    }
}
