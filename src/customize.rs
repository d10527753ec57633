//! User-driven reordering of a Content Sequence.
//!
//! A preview UI edits the report as a flat list of headings and images
//! ([`FlatItem`]). [`rebuild`] turns that list back into a Content Sequence;
//! [`flatten`] is its inverse.
//!
//! Page breaks are never taken from the input. They are re-derived from the
//! final order: every maximal run of consecutive images is closed by exactly
//! one `PageBreak`, placed before the next heading or at the end.
//!
//! ```text
//! [H(A,0), I1, H(B,1), I2, I3]  →  [H(A,0), I1, |, H(B,1), I2, I3, |]
//! ```

use crate::naming::parse_marker_title;
use crate::types::{ContentItem, FlatItem, FlatKind};
use log::{debug, warn};

/// Rebuild a Content Sequence from a user-ordered flat list.
///
/// Heading titles may still carry nesting-marker glyphs (e.g. `"»»Telhado"`);
/// the glyphs are stripped and, when `level` is absent, their count is used
/// as the level. Entries missing their title or path are dropped.
pub fn rebuild(items: &[FlatItem]) -> Vec<ContentItem> {
    let mut sequence = Vec::with_capacity(items.len() + items.len() / 2);
    let mut in_run = false;

    for (index, item) in items.iter().enumerate() {
        match item.kind {
            FlatKind::Heading => {
                let Some(marked) = item.title.as_deref() else {
                    warn!("Dropping heading #{index} without a title");
                    continue;
                };
                let (title, marker_level) = parse_marker_title(marked);
                let level = item.level.unwrap_or(marker_level);
                if in_run {
                    sequence.push(ContentItem::PageBreak);
                    in_run = false;
                }
                sequence.push(ContentItem::heading(title.trim(), level));
            }
            FlatKind::Image => {
                let Some(path) = item.path.as_ref() else {
                    warn!("Dropping image #{index} without a path");
                    continue;
                };
                sequence.push(ContentItem::image(path.clone()));
                in_run = true;
            }
        }
    }
    if in_run {
        sequence.push(ContentItem::PageBreak);
    }

    debug!("Rebuilt {} flat items into {} content items", items.len(), sequence.len());
    sequence
}

/// Flatten a Content Sequence into reorderable entries.
///
/// Page breaks are dropped (they are structural); group members become
/// individual images.
pub fn flatten(sequence: &[ContentItem]) -> Vec<FlatItem> {
    let mut items = Vec::with_capacity(sequence.len());
    for item in sequence {
        match item {
            ContentItem::Heading { text, level } => items.push(FlatItem::heading(text.clone(), *level)),
            ContentItem::ImageRef { path } => items.push(FlatItem::image(path.clone())),
            ContentItem::ImageGroup { paths } => {
                items.extend(paths.iter().cloned().map(FlatItem::image));
            }
            ContentItem::PageBreak => {}
        }
    }
    items
}
