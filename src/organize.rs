//! Archive organization.
//!
//! Turns an uploaded survey archive into either a Content Sequence (for the
//! report) or a Folder Tree (for the interactive preview). Both come from the
//! same pre-order walk of the extracted archive.
//!
//! ## Archive Layout
//!
//! ```text
//! survey.zip
//! └── Agência Centro/              # single enclosing folder → traversal root
//!     ├── - Área externa/          # Heading level 0
//!     │   ├── fachada.jpg          # images in capture order
//!     │   └── Telhado/             # Heading level 1
//!     │       └── calha.png
//!     └── - Detalhes/              # Heading level 0
//!         └── quadro.JPG
//! ```
//!
//! When the archive holds exactly one top-level entry and it is a directory,
//! that directory is the traversal root; otherwise the extraction directory
//! is. Images sitting directly in the root have no heading and are ignored.
//!
//! ## Ordering
//!
//! Within a directory, image files come before subdirectories. Images are
//! ordered by creation time (modification time where the filesystem has no
//! birth time), then by name. Subdirectories follow the configured
//! [`PriorityOrder`], then alphabetical order.
//!
//! ## Output
//!
//! ```text
//! [Heading("- Área externa", 0), Image(fachada), PageBreak,
//!  Heading("Telhado", 1), Image(calha), PageBreak,
//!  Heading("- Detalhes", 0), Image(quadro), PageBreak]
//! ```
//!
//! A `PageBreak` closes every folder that contributed at least one image.
//! Image paths point at copies in the caller's [`ImageStore`]; the
//! extraction directory itself is removed before returning, on every path.

use crate::config::{ImagesConfig, ReportConfig};
use crate::imaging::{self, ImageBackend, Quality};
use crate::naming::PriorityOrder;
use crate::scratch::{ImageStore, scratch_dir};
use crate::types::{ContentItem, FlatItem, FolderNode, FolderTree, ImageDescriptor};
use log::{debug, info, warn};
use std::cmp::Ordering;
use std::fs;
use std::io::BufReader;
use std::path::{Component, Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tempfile::TempDir;
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};
use zip::ZipArchive;
use zip::result::ZipError;

#[derive(Error, Debug)]
pub enum OrganizeError {
    #[error("Corrupt archive: {0}")]
    CorruptArchive(String),
    #[error("Extraction failed: {0}")]
    Extraction(#[from] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
}

pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// True for `.png`, `.jpg` and `.jpeg` files, case-insensitively.
pub fn is_image(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Archiver droppings and hidden files never become content.
fn is_ignored(name: &str) -> bool {
    name.starts_with('.') || name == "__MACOSX"
}

/// One step of the pre-order archive walk.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Visit {
    Folder { name: String, level: usize },
    Image(PathBuf),
}

/// Build the Content Sequence for an archive.
pub fn organize(
    archive: &Path,
    store: &ImageStore,
    config: &ReportConfig,
) -> Result<Vec<ContentItem>, OrganizeError> {
    let extracted = extract(archive, config.scratch_root.as_deref())?;
    let root = resolve_root(extracted.path())?;
    let visits = walk(&root, &config.folders.priority_order())?;

    let mut sequence = Vec::with_capacity(visits.len());
    let mut run = 0usize;
    for visit in visits {
        match visit {
            Visit::Folder { name, level } => {
                close_run(&mut sequence, &mut run);
                sequence.push(ContentItem::heading(name, level));
            }
            Visit::Image(path) => {
                let copy = store.adopt(&path)?;
                debug!("Queued {} as {}", path.display(), copy.display());
                sequence.push(ContentItem::image(copy));
                run += 1;
            }
        }
    }
    close_run(&mut sequence, &mut run);

    let images = sequence.iter().filter(|i| i.is_image()).count();
    info!(
        "Organized {}: {} items, {} images",
        archive.display(),
        sequence.len(),
        images
    );
    Ok(sequence)
}

fn close_run(sequence: &mut Vec<ContentItem>, run: &mut usize) {
    if *run > 0 {
        sequence.push(ContentItem::PageBreak);
        *run = 0;
    }
}

/// Build the preview Folder Tree for an archive, with a thumbnail per image.
///
/// Thumbnail failures are not fatal: the image keeps `thumbnail_path: None`
/// and a warning is logged.
pub fn preview(
    archive: &Path,
    store: &ImageStore,
    backend: &impl ImageBackend,
    config: &ReportConfig,
    project_name: &str,
) -> Result<FolderTree, OrganizeError> {
    let extracted = extract(archive, config.scratch_root.as_deref())?;
    let root = resolve_root(extracted.path())?;
    let visits = walk(&root, &config.folders.priority_order())?;

    let mut tree = FolderTree {
        project_name: project_name.to_string(),
        ..FolderTree::default()
    };
    let mut stack: Vec<FolderNode> = Vec::new();

    for visit in visits {
        match visit {
            Visit::Folder { name, level } => {
                unwind_to(&mut stack, level, &mut tree.folders);
                stack.push(FolderNode {
                    title: name,
                    level,
                    images: Vec::new(),
                    children: Vec::new(),
                });
            }
            Visit::Image(path) => {
                let descriptor = describe(&path, store, backend, &config.images)?;
                tree.total_images += 1;
                if let Some(node) = stack.last_mut() {
                    node.images.push(descriptor);
                }
            }
        }
    }
    unwind_to(&mut stack, 0, &mut tree.folders);

    let missing = tree.missing_thumbnails().len();
    if missing > 0 {
        warn!("{missing} of {} thumbnails could not be created", tree.total_images);
    }
    info!(
        "Previewed {}: {} top-level folders, {} images",
        archive.display(),
        tree.folders.len(),
        tree.total_images
    );
    Ok(tree)
}

/// Pop nodes deeper than `level`, attaching each to its parent (or to the
/// top-level list once the stack is empty).
fn unwind_to(stack: &mut Vec<FolderNode>, level: usize, roots: &mut Vec<FolderNode>) {
    while stack.len() > level {
        if let Some(node) = stack.pop() {
            match stack.last_mut() {
                Some(parent) => parent.children.push(node),
                None => roots.push(node),
            }
        }
    }
}

fn describe(
    path: &Path,
    store: &ImageStore,
    backend: &impl ImageBackend,
    images: &ImagesConfig,
) -> Result<ImageDescriptor, OrganizeError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let source_path = store.adopt(path)?;
    let thumb = store.derived_path("thumb", "jpg");

    let thumbnail_path = match imaging::create_thumbnail(
        backend,
        &source_path,
        &thumb,
        images.thumbnail_height,
        Quality::new(images.quality),
    ) {
        Ok(()) => Some(thumb),
        Err(e) => {
            warn!("Thumbnail failed for {name}: {e}");
            None
        }
    };

    Ok(ImageDescriptor {
        name,
        source_path,
        thumbnail_path,
    })
}

/// Flat, reorderable listing of an archive for a reorder UI.
///
/// Image paths are relative to the traversal root, so the listing stays
/// meaningful after the extraction directory is gone. Feed an edited copy
/// back through [`resolve_listing`].
pub fn listing(archive: &Path, config: &ReportConfig) -> Result<Vec<FlatItem>, OrganizeError> {
    let extracted = extract(archive, config.scratch_root.as_deref())?;
    let root = resolve_root(extracted.path())?;
    let visits = walk(&root, &config.folders.priority_order())?;

    Ok(visits
        .into_iter()
        .map(|visit| match visit {
            Visit::Folder { name, level } => FlatItem::heading(name, level),
            Visit::Image(path) => {
                let relative = path.strip_prefix(&root).unwrap_or(&path).to_path_buf();
                FlatItem::image(relative)
            }
        })
        .collect())
}

/// Resolve a user-ordered listing against the archive.
///
/// Archive-relative image paths are copied into `store` and rewritten to the
/// copies. Entries naming a file that is not an image inside the archive are
/// dropped with a warning; headings pass through unchanged.
pub fn resolve_listing(
    archive: &Path,
    store: &ImageStore,
    items: &[FlatItem],
    config: &ReportConfig,
) -> Result<Vec<FlatItem>, OrganizeError> {
    let extracted = extract(archive, config.scratch_root.as_deref())?;
    let root = resolve_root(extracted.path())?;

    let mut resolved = Vec::with_capacity(items.len());
    for item in items {
        let Some(relative) = item.path.as_deref() else {
            resolved.push(item.clone());
            continue;
        };
        let inside = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        let source = root.join(relative);
        if !inside || !source.is_file() || !is_image(&source) {
            warn!("Dropping {}: not an image in {}", relative.display(), archive.display());
            continue;
        }
        resolved.push(FlatItem {
            path: Some(store.adopt(&source)?),
            ..item.clone()
        });
    }
    debug!("Resolved {} of {} listing entries", resolved.len(), items.len());
    Ok(resolved)
}

// =============================================================================
// Extraction and traversal
// =============================================================================

fn corrupt(archive: &Path, reason: impl std::fmt::Display) -> OrganizeError {
    OrganizeError::CorruptArchive(format!("{}: {}", archive.display(), reason))
}

/// Unpack `archive` into a fresh scratch directory, removed when dropped.
fn extract(archive: &Path, scratch_root: Option<&Path>) -> Result<TempDir, OrganizeError> {
    let file = fs::File::open(archive).map_err(|e| corrupt(archive, e))?;
    let mut zip = ZipArchive::new(BufReader::new(file)).map_err(|e| corrupt(archive, e))?;

    let dir = scratch_dir(scratch_root, "photo-report-extract-")?;
    zip.extract(dir.path()).map_err(|e| match e {
        ZipError::Io(io) => OrganizeError::Extraction(io),
        other => corrupt(archive, other),
    })?;
    debug!(
        "Extracted {} entries from {} into {}",
        zip.len(),
        archive.display(),
        dir.path().display()
    );
    Ok(dir)
}

/// A single enclosing directory becomes the root.
fn resolve_root(extracted: &Path) -> Result<PathBuf, OrganizeError> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(extracted)? {
        let entry = entry?;
        if !is_ignored(&entry.file_name().to_string_lossy()) {
            entries.push(entry.path());
        }
    }
    Ok(match entries.as_slice() {
        [only] if only.is_dir() => only.clone(),
        _ => extracted.to_path_buf(),
    })
}

fn capture_time(entry: &DirEntry) -> SystemTime {
    entry
        .metadata()
        .ok()
        .and_then(|m| m.created().or_else(|_| m.modified()).ok())
        .unwrap_or(UNIX_EPOCH)
}

/// Sibling order: files before directories; files by capture time then
/// name; directories by priority rank then name.
fn sibling_order(order: &PriorityOrder, a: &DirEntry, b: &DirEntry) -> Ordering {
    match (a.file_type().is_dir(), b.file_type().is_dir()) {
        (false, true) => Ordering::Less,
        (true, false) => Ordering::Greater,
        (true, true) => order.compare(
            &a.file_name().to_string_lossy(),
            &b.file_name().to_string_lossy(),
        ),
        (false, false) => capture_time(a)
            .cmp(&capture_time(b))
            .then_with(|| a.file_name().cmp(b.file_name())),
    }
}

fn walk(root: &Path, order: &PriorityOrder) -> Result<Vec<Visit>, OrganizeError> {
    let order = order.clone();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .sort_by(move |a, b| sibling_order(&order, a, b))
        .into_iter()
        .filter_entry(|e| !is_ignored(&e.file_name().to_string_lossy()));

    let mut visits = Vec::new();
    for entry in walker {
        let entry = entry?;
        let depth = entry.depth();
        if entry.file_type().is_dir() {
            visits.push(Visit::Folder {
                name: entry.file_name().to_string_lossy().to_string(),
                level: depth - 1,
            });
        } else if depth > 1 && entry.file_type().is_file() && is_image(entry.path()) {
            visits.push(Visit::Image(entry.path().to_path_buf()));
        }
    }
    Ok(visits)
}
