//! End-to-end report generation.
//!
//! ```text
//! archive.zip ──organize──▶ Content Sequence ──compose──▶ report.docx
//!      │                          ▲
//!      └──resolve_listing──rebuild┘   (when the user reordered the content)
//! ```
//!
//! One [`ImageStore`] per run holds the scratch image copies. The composer
//! deletes each copy as it embeds it; the store removes the rest when the run
//! ends, whether it succeeded or not.

use crate::compose::{self, ComposeError, ComposeOptions};
use crate::config::{ConfigError, ReportConfig};
use crate::customize;
use crate::imaging::ImageBackend;
use crate::metadata::{MetadataError, PlaceholderMap, ProjectMetadata, report_file_name};
use crate::organize::{self, OrganizeError};
use crate::scratch::ImageStore;
use crate::types::FlatItem;
use log::info;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Organize(#[from] OrganizeError),
    #[error(transparent)]
    Compose(#[from] ComposeError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything one report needs.
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub archive: PathBuf,
    pub template: PathBuf,
    pub metadata: ProjectMetadata,
    /// User-edited listing (see [`organize::listing`]). `None` keeps the
    /// archive's own order.
    pub order: Option<Vec<FlatItem>>,
    /// Output file, or an existing directory to place the default file name in.
    pub output: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOutcome {
    pub output: PathBuf,
    pub embedded_images: usize,
}

/// Where the report is written: `output` itself, or the default file name
/// inside it when it is a directory.
pub fn output_path(output: &Path, metadata: &ProjectMetadata) -> PathBuf {
    if output.is_dir() {
        output.join(report_file_name(metadata))
    } else {
        output.to_path_buf()
    }
}

/// Run organize → (rebuild) → compose for one submission.
pub fn generate_report(
    backend: &impl ImageBackend,
    request: &ReportRequest,
    config: &ReportConfig,
) -> Result<ReportOutcome, PipelineError> {
    if !request.template.is_file() {
        return Err(ComposeError::TemplateNotFound(request.template.clone()).into());
    }

    let store = ImageStore::new(config.scratch_root.as_deref())?;
    let sequence = match &request.order {
        Some(items) => {
            let resolved = organize::resolve_listing(&request.archive, &store, items, config)?;
            customize::rebuild(&resolved)
        }
        None => organize::organize(&request.archive, &store, config)?,
    };

    let placeholders = PlaceholderMap::build(&request.metadata, &config.organization);
    let output = output_path(&request.output, &request.metadata);
    let embedded_images = compose::compose_with_backend(
        backend,
        &request.template,
        &sequence,
        &placeholders,
        &output,
        &ComposeOptions::from(config),
    )?;

    info!(
        "Report for {:?} written to {} ({} images)",
        request.metadata.project_name,
        output.display(),
        embedded_images
    );
    Ok(ReportOutcome {
        output,
        embedded_images,
    })
}
