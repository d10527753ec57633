//! Column-layout pre-pass.
//!
//! Folds runs of consecutive small images into [`ContentItem::ImageGroup`]s
//! of at most `max_group_size` members. Large images, headings and page
//! breaks flush the pending group, so a group never spans two folders.

use crate::imaging::ImageClass;
use crate::types::ContentItem;
use std::path::{Path, PathBuf};

pub fn plan_layout(
    sequence: &[ContentItem],
    max_group_size: usize,
    class_of: impl Fn(&Path) -> ImageClass,
) -> Vec<ContentItem> {
    let max = max_group_size.max(1);
    let mut out = Vec::with_capacity(sequence.len());
    let mut pending: Vec<PathBuf> = Vec::with_capacity(max);

    fn flush(pending: &mut Vec<PathBuf>, out: &mut Vec<ContentItem>) {
        if !pending.is_empty() {
            out.push(ContentItem::ImageGroup {
                paths: std::mem::take(pending),
            });
        }
    }

    for item in sequence {
        match item {
            ContentItem::ImageRef { path } if class_of(path) == ImageClass::Small => {
                pending.push(path.clone());
                if pending.len() == max {
                    flush(&mut pending, &mut out);
                }
            }
            other => {
                flush(&mut pending, &mut out);
                out.push(other.clone());
            }
        }
    }
    flush(&mut pending, &mut out);
    out
}
