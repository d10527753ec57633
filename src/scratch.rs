//! Per-submission scratch space.
//!
//! Every submission works inside its own uniquely named directory so that
//! concurrent runs never collide in the shared filesystem namespace. Two
//! kinds of scratch area exist:
//!
//! - **Extraction directories** hold the unpacked archive for the duration of
//!   one organizer call and are removed when it returns, on every path.
//! - The **image store** holds the per-image copies referenced by the Content
//!   Sequence. The composer deletes each copy after embedding it; whatever is
//!   left is removed when the store is dropped.
//!
//! Both are backed by [`tempfile::TempDir`], so release happens on drop and
//! removal errors never surface.

use log::{debug, warn};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use uuid::Uuid;

/// Create a uniquely named directory under `root` (the OS temp dir when `None`).
pub fn scratch_dir(root: Option<&Path>, prefix: &str) -> io::Result<TempDir> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(prefix);
    let dir = match root {
        Some(root) => {
            std::fs::create_dir_all(root)?;
            builder.tempdir_in(root)?
        }
        None => builder.tempdir()?,
    };
    debug!("Created scratch directory {}", dir.path().display());
    Ok(dir)
}

/// Owner of the scratch image copies handed to the composer.
#[derive(Debug)]
pub struct ImageStore {
    dir: TempDir,
}

impl ImageStore {
    pub fn new(root: Option<&Path>) -> io::Result<Self> {
        Ok(Self {
            dir: scratch_dir(root, "photo-report-images-")?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Copy `source` into the store under a collision-free name that keeps
    /// the original file name as a suffix.
    pub fn adopt(&self, source: &Path) -> io::Result<PathBuf> {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let id = Uuid::new_v4().simple().to_string();
        let target = self.dir.path().join(format!("img_{}_{}", &id[..8], name));
        std::fs::copy(source, &target)?;
        Ok(target)
    }

    /// Path for a derived file (e.g. a thumbnail) inside the store.
    pub fn derived_path(&self, stem: &str, extension: &str) -> PathBuf {
        let id = Uuid::new_v4().simple().to_string();
        self.dir
            .path()
            .join(format!("{}_{}.{}", stem, &id[..8], extension))
    }
}

/// File name of an image as it was in the archive, without the store's
/// `img_<id>_` prefix.
pub fn original_name(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let stripped = name
        .strip_prefix("img_")
        .and_then(|rest| rest.split_once('_'))
        .filter(|(id, _)| id.len() == 8 && id.chars().all(|c| c.is_ascii_hexdigit()))
        .map(|(_, original)| original.to_string());
    stripped.unwrap_or(name)
}

/// Delete a consumed scratch file. Failures are logged and swallowed.
pub fn discard(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        warn!("Could not remove scratch file {}: {}", path.display(), e);
    }
}
