//! Report configuration module.
//!
//! Handles loading, validating, and merging `report.toml`. Stock defaults are
//! the base layer; a user file overrides only the keys it names.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! # scratch_root = "/var/tmp/photo-report"   # Parent of per-run scratch dirs
//!
//! [organization]
//! preparer = "Ygor Augusto Fernandes"
//! company = "MAFFENG - Engenharia e Manutenção Profissional"
//!
//! [folders]
//! priority = ["- Área externa", "- Área interna", "- Segundo piso", "- Detalhes", "- Vista ampla"]
//! normal_text = ["- Detalhes", "- Vista ampla"]
//!
//! [layout]
//! insertion_marker = "{{start_here}}"
//! max_group_size = 3
//!
//! [images]
//! pixels_per_cm = 37.79527559055118   # 96 dpi
//! small_width_cm = 7.5
//! single_height_cm = 10.0
//! grouped_height_cm = 6.0
//! max_single_width_cm = 15.0
//! quality = 90
//! thumbnail_height = 200
//!
//! [templates]
//! dir = "models"
//! [templates.available]
//! modelo_3575 = "Modelo 3575 - Mato Grosso"
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{PIXELS_PER_CM_96DPI, Quality, SizingRules};
use crate::naming::PriorityOrder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Report configuration loaded from `report.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    /// Parent directory for per-run scratch directories (OS temp dir when absent).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scratch_root: Option<PathBuf>,
    /// Constant organizational placeholder values.
    pub organization: OrganizationConfig,
    /// Section folder ordering and styling.
    pub folders: FoldersConfig,
    /// Insertion point and column grouping.
    pub layout: LayoutConfig,
    /// Image classification and embed sizes.
    pub images: ImagesConfig,
    /// Template registry.
    pub templates: TemplatesConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl ReportConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.images.quality) {
            return Err(ConfigError::Validation(
                "images.quality must be 1-100".into(),
            ));
        }
        let lengths = [
            ("images.pixels_per_cm", self.images.pixels_per_cm),
            ("images.small_width_cm", self.images.small_width_cm),
            ("images.single_height_cm", self.images.single_height_cm),
            ("images.grouped_height_cm", self.images.grouped_height_cm),
            ("images.max_single_width_cm", self.images.max_single_width_cm),
        ];
        for (key, value) in lengths {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ConfigError::Validation(format!("{key} must be positive")));
            }
        }
        if self.images.thumbnail_height == 0 {
            return Err(ConfigError::Validation(
                "images.thumbnail_height must be non-zero".into(),
            ));
        }
        if self.layout.max_group_size == 0 {
            return Err(ConfigError::Validation(
                "layout.max_group_size must be at least 1".into(),
            ));
        }
        if self.layout.insertion_marker.trim().is_empty() {
            return Err(ConfigError::Validation(
                "layout.insertion_marker must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Constant fields merged into every placeholder map.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrganizationConfig {
    /// Value of `{{elaborado_por}}`.
    pub preparer: String,
    /// Value of `{{empresa}}`.
    pub company: String,
}

impl Default for OrganizationConfig {
    fn default() -> Self {
        Self {
            preparer: "Ygor Augusto Fernandes".to_string(),
            company: "MAFFENG - Engenharia e Manutenção Profissional".to_string(),
        }
    }
}

/// Section folder conventions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FoldersConfig {
    /// Ranking of known sibling folder names; unlisted names sort after these.
    pub priority: Vec<String>,
    /// Sections rendered as bold body text instead of a heading style.
    pub normal_text: Vec<String>,
}

impl Default for FoldersConfig {
    fn default() -> Self {
        Self {
            priority: [
                "- Área externa",
                "- Área interna",
                "- Segundo piso",
                "- Detalhes",
                "- Vista ampla",
            ]
            .map(String::from)
            .to_vec(),
            normal_text: ["- Detalhes", "- Vista ampla"].map(String::from).to_vec(),
        }
    }
}

impl FoldersConfig {
    pub fn priority_order(&self) -> PriorityOrder {
        PriorityOrder::new(self.priority.iter().cloned())
    }
}

/// Insertion point and table grouping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    /// Token marking where generated content begins in the template.
    pub insertion_marker: String,
    /// Maximum number of small images sharing one table row.
    pub max_group_size: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            insertion_marker: "{{start_here}}".to_string(),
            max_group_size: 3,
        }
    }
}

/// Image classification and embed sizes. Lengths are centimetres.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Pixel-to-length conversion used for classification and resizing.
    pub pixels_per_cm: f64,
    /// Images at or below this width are grouped into tables.
    pub small_width_cm: f64,
    /// Height of a standalone image.
    pub single_height_cm: f64,
    /// Height of an image inside a group table cell.
    pub grouped_height_cm: f64,
    /// Width cap for standalone images (wide panoramas shrink to fit).
    pub max_single_width_cm: f64,
    /// JPEG encoding quality (1 = worst, 100 = best).
    pub quality: u32,
    /// Preview thumbnail height in pixels.
    pub thumbnail_height: u32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            pixels_per_cm: PIXELS_PER_CM_96DPI,
            small_width_cm: 7.5,
            single_height_cm: 10.0,
            grouped_height_cm: 6.0,
            max_single_width_cm: 15.0,
            quality: 90,
            thumbnail_height: 200,
        }
    }
}

impl ImagesConfig {
    pub fn sizing_rules(&self) -> SizingRules {
        SizingRules {
            pixels_per_cm: self.pixels_per_cm,
            small_width_cm: self.small_width_cm,
            single_height_cm: self.single_height_cm,
            grouped_height_cm: self.grouped_height_cm,
            max_single_width_cm: self.max_single_width_cm,
            quality: Quality::new(self.quality),
        }
    }
}

/// Template registry: identifiers mapped to display labels, with the
/// template file for `id` stored as `{dir}/{id}.docx`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemplatesConfig {
    pub dir: PathBuf,
    pub available: BTreeMap<String, String>,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        let available = [
            ("modelo_3575", "Modelo 3575 - Mato Grosso"),
            ("modelo_6122", "Modelo 6122 - Mato Grosso do Sul"),
            ("modelo_0908", "Modelo 0908 - São Paulo"),
            ("modelo_2056", "Modelo 2056 - Divinópolis"),
            ("modelo_2057", "Modelo 2057 - Varginha"),
        ]
        .into_iter()
        .map(|(id, label)| (id.to_string(), label.to_string()))
        .collect();
        Self {
            dir: PathBuf::from("models"),
            available,
        }
    }
}

impl TemplatesConfig {
    /// Path of a registered template, or `id` itself taken as a path.
    ///
    /// Existence is not checked here; the composer reports a missing file.
    pub fn resolve(&self, id: &str) -> PathBuf {
        if self.available.contains_key(id) {
            self.dir.join(format!("{id}.docx"))
        } else {
            PathBuf::from(id)
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(ReportConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ReportConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ReportConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the given `report.toml` path.
///
/// A missing file yields the stock defaults. User values are merged on top
/// of stock defaults, unknown keys rejected, and the result validated.
pub fn load_config(path: &Path) -> Result<ReportConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `report.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Photo Report Configuration
# ==========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# Parent directory for per-run scratch directories.
# Omit to use the system temporary directory.
# scratch_root = "/var/tmp/photo-report"

# ---------------------------------------------------------------------------
# Organization constants ({{elaborado_por}} and {{empresa}})
# ---------------------------------------------------------------------------
[organization]
preparer = "Ygor Augusto Fernandes"
company = "MAFFENG - Engenharia e Manutenção Profissional"

# ---------------------------------------------------------------------------
# Section folders
# ---------------------------------------------------------------------------
[folders]
# Sibling folders sort by position in this list; unlisted names come after
# every listed one, alphabetically.
priority = ["- Área externa", "- Área interna", "- Segundo piso", "- Detalhes", "- Vista ampla"]

# Folders whose title contains one of these render as bold body text
# instead of a heading style.
normal_text = ["- Detalhes", "- Vista ampla"]

# ---------------------------------------------------------------------------
# Layout
# ---------------------------------------------------------------------------
[layout]
# Token in the template where generated content starts. When the template
# has no such paragraph, content goes to the end of the document.
insertion_marker = "{{start_here}}"

# Maximum number of small images placed side by side in one table row.
max_group_size = 3

# ---------------------------------------------------------------------------
# Images (lengths in centimetres)
# ---------------------------------------------------------------------------
[images]
# Pixel-to-length conversion (96 dpi).
pixels_per_cm = 37.79527559055118

# Images at most this wide are grouped into tables.
small_width_cm = 7.5

# Height of standalone and grouped images.
single_height_cm = 10.0
grouped_height_cm = 6.0

# Standalone images wider than this shrink to fit.
max_single_width_cm = 15.0

# JPEG encoding quality (1 = worst, 100 = best).
quality = 90

# Preview thumbnail height in pixels.
thumbnail_height = 200

# ---------------------------------------------------------------------------
# Templates: the file for id X is {dir}/X.docx
# ---------------------------------------------------------------------------
[templates]
dir = "models"

[templates.available]
modelo_3575 = "Modelo 3575 - Mato Grosso"
modelo_6122 = "Modelo 6122 - Mato Grosso do Sul"
modelo_0908 = "Modelo 0908 - São Paulo"
modelo_2056 = "Modelo 2056 - Divinópolis"
modelo_2057 = "Modelo 2057 - Varginha"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel image-processing workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
