//! Shared types passed between the organizer, the customizer and the composer.
//!
//! The Content Sequence is the single hand-off format of the pipeline:
//!
//! ```text
//! organize  archive.zip  →  Vec<ContentItem>   (headings, images, page breaks)
//! rebuild   Vec<FlatItem> →  Vec<ContentItem>  (user reordering, optional)
//! compose   Vec<ContentItem> + template  →  report.docx
//! ```
//!
//! `ContentItem::ImageGroup` never leaves the composer: it is produced by the
//! column-layout pre-pass and consumed by the insertion pass.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One entry of a report body, in reading order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentItem {
    /// A folder title. `level` is the folder depth below the archive root,
    /// so direct children of the root are level 0.
    Heading { text: String, level: usize },
    /// A scratch copy of a source image, consumed (deleted) once embedded.
    ImageRef { path: PathBuf },
    /// Explicit page boundary closing a folder's image run.
    PageBreak,
    /// Up to `max_group_size` small images laid out side by side in one table row.
    ImageGroup { paths: Vec<PathBuf> },
}

impl ContentItem {
    pub fn heading(text: impl Into<String>, level: usize) -> Self {
        Self::Heading {
            text: text.into(),
            level,
        }
    }

    pub fn image(path: impl Into<PathBuf>) -> Self {
        Self::ImageRef { path: path.into() }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, Self::ImageRef { .. })
    }
}

/// Kind tag of a user-submitted reorder entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlatKind {
    Heading,
    Image,
}

/// One positional entry of a user-edited ordering (e.g. from a drag-and-drop
/// preview). Headings carry `title` + `level`, images carry `path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatItem {
    pub kind: FlatKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl FlatItem {
    pub fn heading(title: impl Into<String>, level: usize) -> Self {
        Self {
            kind: FlatKind::Heading,
            title: Some(title.into()),
            level: Some(level),
            path: None,
        }
    }

    pub fn image(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: FlatKind::Image,
            title: None,
            level: None,
            path: Some(path.into()),
        }
    }
}

/// An image shown in the interactive preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageDescriptor {
    /// Original file name inside the archive.
    pub name: String,
    /// Scratch copy that survives the extraction directory.
    pub source_path: PathBuf,
    /// `None` when thumbnail generation failed for this image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_path: Option<PathBuf>,
}

/// Folder node of the preview tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderNode {
    pub title: String,
    pub level: usize,
    pub images: Vec<ImageDescriptor>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FolderNode>,
}

/// Preview representation of an organized archive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FolderTree {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub project_name: String,
    pub folders: Vec<FolderNode>,
    pub total_images: usize,
}

impl FolderTree {
    /// Images whose thumbnail could not be produced, in traversal order.
    pub fn missing_thumbnails(&self) -> Vec<&ImageDescriptor> {
        fn walk<'a>(nodes: &'a [FolderNode], out: &mut Vec<&'a ImageDescriptor>) {
            for node in nodes {
                out.extend(node.images.iter().filter(|i| i.thumbnail_path.is_none()));
                walk(&node.children, out);
            }
        }
        let mut out = Vec::new();
        walk(&self.folders, &mut out);
        out
    }
}
