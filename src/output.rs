//! CLI output formatting for every command.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. Folders are shown by
//! positional index and title, images by the name they had in the archive;
//! scratch and output paths appear only as indented context lines.
//!
//! # Output Format
//!
//! ## Organize
//!
//! ```text
//! 001 - Área externa (2 photos)
//!     001 fachada.jpg
//!     002 lateral.jpg
//!     001 Telhado (1 photo)
//!         001 calha.png
//! 002 - Detalhes (1 photo)
//!     001 quadro.JPG
//!
//! 3 folders, 4 images, 3 page breaks
//! ```
//!
//! ## Preview
//!
//! ```text
//! Agência Centro
//! 001 - Área externa (1 photo)
//!     001 fachada.jpg
//!         Thumbnail: /tmp/photo-report-images-x/thumb_ab12cd34.jpg
//!
//! 1 image, 0 thumbnails missing
//! ```
//!
//! ## Build
//!
//! ```text
//! Embedded 4 images
//!     Output: out/RELATÓRIO FOTOGRÁFICO - Agência Centro - LEVANTAMENTO PREVENTIVO.docx
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::config::TemplatesConfig;
use crate::metadata::STATES;
use crate::pipeline::ReportOutcome;
use crate::scratch::original_name;
use crate::types::{ContentItem, FolderNode, FolderTree};

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn photos(n: usize) -> String {
    if n == 1 {
        "1 photo".to_string()
    } else {
        format!("{n} photos")
    }
}

fn plural(n: usize, singular: &str, plural: &str) -> String {
    format!("{n} {}", if n == 1 { singular } else { plural })
}

/// Folder header: positional index + title + photo count.
///
/// ```text
/// 001 - Área externa (2 photos)
/// ```
fn folder_header(index: usize, title: &str, count: usize) -> String {
    format!("{} {} ({})", format_index(index), title, photos(count))
}

/// Positional indices per nesting level; entering a shallower level resets
/// the deeper counters.
#[derive(Default)]
struct LevelCounter {
    counts: Vec<usize>,
}

impl LevelCounter {
    fn next(&mut self, level: usize) -> usize {
        self.counts.truncate(level + 1);
        self.counts.resize(level + 1, 0);
        self.counts[level] += 1;
        self.counts[level]
    }
}

// ============================================================================
// Organize
// ============================================================================

/// Format a Content Sequence as a folder/image inventory.
pub fn format_sequence(sequence: &[ContentItem]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut headings = LevelCounter::default();
    let mut image_depth = 0;
    let mut image_index = 0;
    let (mut folders, mut images, mut breaks) = (0, 0, 0);

    for (pos, item) in sequence.iter().enumerate() {
        match item {
            ContentItem::Heading { text, level } => {
                let count = sequence[pos + 1..]
                    .iter()
                    .take_while(|i| !matches!(i, ContentItem::Heading { .. }))
                    .map(|i| match i {
                        ContentItem::ImageRef { .. } => 1,
                        ContentItem::ImageGroup { paths } => paths.len(),
                        _ => 0,
                    })
                    .sum();
                lines.push(format!(
                    "{}{}",
                    indent(*level),
                    folder_header(headings.next(*level), text, count)
                ));
                image_depth = level + 1;
                image_index = 0;
                folders += 1;
            }
            ContentItem::ImageRef { path } => {
                image_index += 1;
                images += 1;
                lines.push(format!(
                    "{}{} {}",
                    indent(image_depth),
                    format_index(image_index),
                    original_name(path)
                ));
            }
            ContentItem::ImageGroup { paths } => {
                for path in paths {
                    image_index += 1;
                    images += 1;
                    lines.push(format!(
                        "{}{} {}",
                        indent(image_depth),
                        format_index(image_index),
                        original_name(path)
                    ));
                }
            }
            ContentItem::PageBreak => breaks += 1,
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "{}, {}, {}",
        plural(folders, "folder", "folders"),
        plural(images, "image", "images"),
        plural(breaks, "page break", "page breaks")
    ));
    lines
}

pub fn print_sequence(sequence: &[ContentItem]) {
    for line in format_sequence(sequence) {
        println!("{}", line);
    }
}

// ============================================================================
// Preview
// ============================================================================

fn format_folder(node: &FolderNode, index: usize, lines: &mut Vec<String>) {
    let depth = node.level;
    lines.push(format!(
        "{}{}",
        indent(depth),
        folder_header(index, &node.title, node.images.len())
    ));
    for (i, image) in node.images.iter().enumerate() {
        lines.push(format!("{}{} {}", indent(depth + 1), format_index(i + 1), image.name));
        match &image.thumbnail_path {
            Some(thumb) => lines.push(format!(
                "{}Thumbnail: {}",
                indent(depth + 2),
                thumb.display()
            )),
            None => lines.push(format!("{}Thumbnail: unavailable", indent(depth + 2))),
        }
    }
    for (i, child) in node.children.iter().enumerate() {
        format_folder(child, i + 1, lines);
    }
}

/// Format the preview Folder Tree.
pub fn format_tree(tree: &FolderTree) -> Vec<String> {
    let mut lines = Vec::new();
    if !tree.project_name.is_empty() {
        lines.push(tree.project_name.clone());
    }
    for (i, node) in tree.folders.iter().enumerate() {
        format_folder(node, i + 1, &mut lines);
    }
    lines.push(String::new());
    lines.push(format!(
        "{}, {}",
        plural(tree.total_images, "image", "images"),
        plural(
            tree.missing_thumbnails().len(),
            "thumbnail missing",
            "thumbnails missing"
        )
    ));
    lines
}

pub fn print_tree(tree: &FolderTree) {
    for line in format_tree(tree) {
        println!("{}", line);
    }
}

// ============================================================================
// Build
// ============================================================================

pub fn format_report(outcome: &ReportOutcome) -> Vec<String> {
    vec![
        format!(
            "Embedded {}",
            plural(outcome.embedded_images, "image", "images")
        ),
        format!("{}Output: {}", indent(1), outcome.output.display()),
    ]
}

pub fn print_report(outcome: &ReportOutcome) {
    for line in format_report(outcome) {
        println!("{}", line);
    }
}

// ============================================================================
// Reference data
// ============================================================================

/// Format the template registry.
///
/// ```text
/// modelo_0908 Modelo 0908 - São Paulo
///     Source: models/modelo_0908.docx
/// ```
pub fn format_templates(templates: &TemplatesConfig) -> Vec<String> {
    let mut lines = Vec::new();
    for (id, label) in &templates.available {
        lines.push(format!("{} {}", id, label));
        lines.push(format!(
            "{}Source: {}",
            indent(1),
            templates.resolve(id).display()
        ));
    }
    if lines.is_empty() {
        lines.push("No templates registered".to_string());
    }
    lines
}

pub fn print_templates(templates: &TemplatesConfig) {
    for line in format_templates(templates) {
        println!("{}", line);
    }
}

pub fn format_states() -> Vec<String> {
    vec![STATES.join(" ")]
}

pub fn print_states() {
    for line in format_states() {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ImageDescriptor;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn format_index_single_digit() {
        assert_eq!(format_index(1), "001");
    }

    #[test]
    fn format_index_three_digits() {
        assert_eq!(format_index(123), "123");
    }

    #[test]
    fn indent_levels() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    #[test]
    fn photos_singular_and_plural() {
        assert_eq!(photos(1), "1 photo");
        assert_eq!(photos(0), "0 photos");
        assert_eq!(photos(3), "3 photos");
    }

    #[test]
    fn level_counter_resets_deeper_levels() {
        let mut c = LevelCounter::default();
        assert_eq!(c.next(0), 1);
        assert_eq!(c.next(1), 1);
        assert_eq!(c.next(1), 2);
        assert_eq!(c.next(0), 2);
        assert_eq!(c.next(1), 1);
    }

    // =========================================================================
    // Organize
    // =========================================================================

    #[test]
    fn sequence_inventory() {
        let sequence = vec![
            ContentItem::heading("A", 0),
            ContentItem::image("/s/img_0123abcd_img1.png"),
            ContentItem::image("/s/img_89abcdef_img2.png"),
            ContentItem::PageBreak,
            ContentItem::heading("Sub", 1),
            ContentItem::heading("B", 0),
            ContentItem::image("/s/img_00000000_img3.jpg"),
            ContentItem::PageBreak,
        ];
        assert_eq!(
            format_sequence(&sequence),
            vec![
                "001 A (2 photos)",
                "    001 img1.png",
                "    002 img2.png",
                "    001 Sub (0 photos)",
                "002 B (1 photo)",
                "    001 img3.jpg",
                "",
                "3 folders, 3 images, 2 page breaks",
            ]
        );
    }

    #[test]
    fn empty_sequence_has_summary_only() {
        assert_eq!(
            format_sequence(&[]),
            vec!["", "0 folders, 0 images, 0 page breaks"]
        );
    }

    // =========================================================================
    // Preview
    // =========================================================================

    fn descriptor(name: &str, thumb: Option<&str>) -> ImageDescriptor {
        ImageDescriptor {
            name: name.to_string(),
            source_path: PathBuf::from(format!("/s/{name}")),
            thumbnail_path: thumb.map(PathBuf::from),
        }
    }

    #[test]
    fn tree_shows_thumbnails_and_failures() {
        let tree = FolderTree {
            project_name: "Agência Centro".to_string(),
            folders: vec![FolderNode {
                title: "A".to_string(),
                level: 0,
                images: vec![
                    descriptor("a.jpg", Some("/t/a.jpg")),
                    descriptor("b.jpg", None),
                ],
                children: vec![FolderNode {
                    title: "Sub".to_string(),
                    level: 1,
                    images: vec![],
                    children: vec![],
                }],
            }],
            total_images: 2,
        };

        assert_eq!(
            format_tree(&tree),
            vec![
                "Agência Centro",
                "001 A (2 photos)",
                "    001 a.jpg",
                "        Thumbnail: /t/a.jpg",
                "    002 b.jpg",
                "        Thumbnail: unavailable",
                "    001 Sub (0 photos)",
                "",
                "2 images, 1 thumbnail missing",
            ]
        );
    }

    // =========================================================================
    // Build and reference data
    // =========================================================================

    #[test]
    fn report_summary() {
        let outcome = ReportOutcome {
            output: PathBuf::from("out/report.docx"),
            embedded_images: 1,
        };
        assert_eq!(
            format_report(&outcome),
            vec!["Embedded 1 image", "    Output: out/report.docx"]
        );
    }

    #[test]
    fn templates_listing() {
        let templates = TemplatesConfig {
            dir: PathBuf::from("models"),
            available: BTreeMap::from([("modelo_1".to_string(), "Modelo 1".to_string())]),
        };
        assert_eq!(
            format_templates(&templates),
            vec!["modelo_1 Modelo 1", "    Source: models/modelo_1.docx"]
        );
    }

    #[test]
    fn templates_listing_empty() {
        let templates = TemplatesConfig {
            dir: PathBuf::from("models"),
            available: BTreeMap::new(),
        };
        assert_eq!(format_templates(&templates), vec!["No templates registered"]);
    }

    #[test]
    fn states_listed_on_one_line() {
        let lines = format_states();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("AC AL AP"));
        assert_eq!(lines[0].split(' ').count(), 27);
    }
}
