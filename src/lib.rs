//! # Photo Report
//!
//! Turns a zipped folder tree of site-survey photographs into a formatted
//! Word report. The archive's folders become headings, its photos become
//! embedded images, and the project's metadata fills the template's
//! `{{placeholder}}` fields.
//!
//! # Architecture: Three-Stage Pipeline
//!
//! ```text
//! 1. Organize   archive.zip      →  Content Sequence   (folders → headings, images, page breaks)
//! 2. Customize  flat listing     →  Content Sequence   (optional user reordering)
//! 3. Compose    sequence + .docx →  report.docx        (placeholders, layout, embedded images)
//! ```
//!
//! The Content Sequence ([`types::ContentItem`]) is the only hand-off format.
//! It can be printed, serialized to JSON, flattened for a reorder UI and
//! rebuilt, so each stage is testable on its own.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`organize`] | Stage 1: extracts the archive, walks folders in priority order, emits the Content Sequence or the preview Folder Tree |
//! | [`customize`] | Stage 2: rebuilds a Content Sequence from a user-ordered flat listing, re-deriving page breaks |
//! | [`compose`] | Stage 3: substitutes placeholders, groups small images into tables, embeds resized JPEGs at the insertion marker |
//! | [`pipeline`] | Runs the stages for one submission inside its own scratch space |
//! | [`imaging`] | Image classification (small/large by physical width), resizing and thumbnails |
//! | [`metadata`] | Project metadata, the placeholder vocabulary, state codes, report file name |
//! | [`config`] | `report.toml` loading, validation and merging over stock defaults |
//! | [`naming`] | Folder priority ranking, nesting markers, heading title cleanup |
//! | [`scratch`] | Uniquely named scratch directories and the per-run image store |
//! | [`types`] | Shared types: `ContentItem`, `FlatItem`, `FolderTree` |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Templates Are Edited, Not Regenerated
//!
//! A template carries styles, headers, footers, logos and numbering that the
//! report must keep. The composer therefore treats the `.docx` as a zip of
//! XML parts: it rewrites only the document body, its relationships, the
//! content types and header/footer text, and copies every other part
//! untouched. XML is rewritten as an event stream, so markup it does not
//! understand passes through unchanged.
//!
//! ## Parallel Preparation, Ordered Insertion
//!
//! Classifying and re-encoding photos dominates the run time and each image
//! is independent, so both run on a rayon pool. Generated markup is then
//! emitted strictly in sequence order.
//!
//! ## Skip, Don't Abort
//!
//! A missing, empty or undecodable photo is logged and skipped. Only a bad
//! archive, a missing template or a failed write stops a report.

pub mod compose;
pub mod config;
pub mod customize;
pub mod imaging;
pub mod metadata;
pub mod naming;
pub mod organize;
pub mod output;
pub mod pipeline;
pub mod scratch;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
