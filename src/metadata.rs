//! Project metadata and the placeholder map built from it.
//!
//! A submission's metadata is read from a TOML or JSON file and merged with
//! the organization constants from [`OrganizationConfig`] into a
//! [`PlaceholderMap`], the token → value table the composer substitutes into
//! the template:
//!
//! | Token | Source |
//! |-------|--------|
//! | `{{nome_projeto}}` | `project_name` |
//! | `{{numero_contrato}}` | `contract_number` |
//! | `{{ordem_servico}}` | `service_order` |
//! | `{{data_elaboracao}}`, `{{data_atendimento}}` | `elaboration_date` as `dd/mm/yyyy` |
//! | `{{tipo_atendimento}}` | `service_type` |
//! | `{{prefixo_sb}}` | `agency_prefix` |
//! | `{{nome_ag}}` | `agency_name` |
//! | `{{uf}}` | `state` |
//! | `{{endereco_dependencia}}` | `address` |
//! | `{{responsavel_dependencia}}` | `dependency_responsible` |
//! | `{{responsavel_tecnico}}` | `technical_responsible` |
//! | `{{elaborado_por}}` | `organization.preparer` |
//! | `{{empresa}}` | `organization.company` |
//!
//! Unset optional fields map to the empty string.

use crate::config::OrganizationConfig;
use chrono::NaiveDate;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Brazilian federative unit codes accepted for `{{uf}}`.
pub const STATES: [&str; 27] = [
    "AC", "AL", "AP", "AM", "BA", "CE", "DF", "ES", "GO", "MA", "MT", "MS", "MG", "PA", "PB",
    "PR", "PE", "PI", "RJ", "RN", "RS", "RO", "RR", "SC", "SP", "SE", "TO",
];

pub fn is_known_state(code: &str) -> bool {
    STATES.contains(&code)
}

pub const DEFAULT_SERVICE_TYPE: &str = "LEVANTAMENTO PREVENTIVO";

fn default_service_type() -> String {
    DEFAULT_SERVICE_TYPE.to_string()
}

/// Per-submission project data. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectMetadata {
    pub project_name: String,
    pub contract_number: Option<String>,
    pub service_order: Option<String>,
    /// ISO `YYYY-MM-DD` in the input file.
    pub elaboration_date: Option<NaiveDate>,
    #[serde(default = "default_service_type")]
    pub service_type: String,
    pub agency_prefix: Option<String>,
    pub agency_name: Option<String>,
    pub state: Option<String>,
    pub address: Option<String>,
    pub dependency_responsible: Option<String>,
    pub technical_responsible: Option<String>,
}

impl Default for ProjectMetadata {
    fn default() -> Self {
        Self {
            project_name: String::new(),
            contract_number: None,
            service_order: None,
            elaboration_date: None,
            service_type: default_service_type(),
            agency_prefix: None,
            agency_name: None,
            state: None,
            address: None,
            dependency_responsible: None,
            technical_responsible: None,
        }
    }
}

/// Load metadata from `.json` (by extension) or TOML (anything else).
pub fn load_metadata(path: &Path) -> Result<ProjectMetadata, MetadataError> {
    let content = std::fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    let metadata = if is_json {
        serde_json::from_str(&content)?
    } else {
        toml::from_str(&content)?
    };
    Ok(metadata)
}

/// Token → replacement table used for template substitution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceholderMap {
    values: BTreeMap<String, String>,
}

impl PlaceholderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the full placeholder vocabulary for one submission.
    pub fn build(metadata: &ProjectMetadata, organization: &OrganizationConfig) -> Self {
        if let Some(state) = metadata.state.as_deref().filter(|s| !s.is_empty()) {
            if !is_known_state(state) {
                warn!("Unrecognised state code {state:?}");
            }
        }

        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        let date = metadata
            .elaboration_date
            .map(|d| d.format("%d/%m/%Y").to_string())
            .unwrap_or_default();

        let mut map = Self::new();
        map.insert("{{nome_projeto}}", metadata.project_name.clone());
        map.insert("{{numero_contrato}}", text(&metadata.contract_number));
        map.insert("{{ordem_servico}}", text(&metadata.service_order));
        map.insert("{{data_elaboracao}}", date.clone());
        map.insert("{{data_atendimento}}", date);
        map.insert("{{tipo_atendimento}}", metadata.service_type.clone());
        map.insert("{{prefixo_sb}}", text(&metadata.agency_prefix));
        map.insert("{{nome_ag}}", text(&metadata.agency_name));
        map.insert("{{uf}}", text(&metadata.state));
        map.insert("{{endereco_dependencia}}", text(&metadata.address));
        map.insert(
            "{{responsavel_dependencia}}",
            text(&metadata.dependency_responsible),
        );
        map.insert(
            "{{responsavel_tecnico}}",
            text(&metadata.technical_responsible),
        );
        map.insert("{{elaborado_por}}", organization.preparer.clone());
        map.insert("{{empresa}}", organization.company.clone());
        map
    }

    pub fn insert(&mut self, token: impl Into<String>, value: impl Into<String>) {
        self.values.insert(token.into(), value.into());
    }

    pub fn get(&self, token: &str) -> Option<&str> {
        self.values.get(token).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PlaceholderMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// Characters that are invalid in file names on at least one major platform.
fn is_invalid_file_char(c: char) -> bool {
    matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*') || c.is_control()
}

fn sanitize_file_component(s: &str) -> String {
    s.chars()
        .map(|c| if is_invalid_file_char(c) { '_' } else { c })
        .collect()
}

/// `RELATÓRIO FOTOGRÁFICO - {project} - {service type}.docx`
pub fn report_file_name(metadata: &ProjectMetadata) -> String {
    format!(
        "RELATÓRIO FOTOGRÁFICO - {} - {}.docx",
        sanitize_file_component(metadata.project_name.trim()),
        sanitize_file_component(metadata.service_type.trim())
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> ProjectMetadata {
        ProjectMetadata {
            project_name: "Agência Centro".into(),
            contract_number: Some("CT-42".into()),
            elaboration_date: NaiveDate::from_ymd_opt(2025, 3, 7),
            state: Some("MT".into()),
            ..ProjectMetadata::default()
        }
    }

    #[test]
    fn states_are_the_27_units() {
        assert_eq!(STATES.len(), 27);
        assert!(is_known_state("SP"));
        assert!(is_known_state("DF"));
        assert!(!is_known_state("XX"));
        assert!(!is_known_state("sp"));
    }

    #[test]
    fn placeholder_map_covers_vocabulary() {
        let map = PlaceholderMap::build(&sample(), &OrganizationConfig::default());
        assert_eq!(map.len(), 14);
        assert_eq!(map.get("{{nome_projeto}}"), Some("Agência Centro"));
        assert_eq!(map.get("{{numero_contrato}}"), Some("CT-42"));
        assert_eq!(map.get("{{uf}}"), Some("MT"));
        assert_eq!(map.get("{{elaborado_por}}"), Some("Ygor Augusto Fernandes"));
    }

    #[test]
    fn dates_render_day_month_year() {
        let map = PlaceholderMap::build(&sample(), &OrganizationConfig::default());
        assert_eq!(map.get("{{data_elaboracao}}"), Some("07/03/2025"));
        assert_eq!(map.get("{{data_atendimento}}"), Some("07/03/2025"));
    }

    #[test]
    fn unset_fields_map_to_empty() {
        let map = PlaceholderMap::build(&ProjectMetadata::default(), &OrganizationConfig::default());
        assert_eq!(map.get("{{ordem_servico}}"), Some(""));
        assert_eq!(map.get("{{data_elaboracao}}"), Some(""));
        assert_eq!(map.get("{{tipo_atendimento}}"), Some(DEFAULT_SERVICE_TYPE));
    }

    #[test]
    fn organization_constants_come_from_config() {
        let org = OrganizationConfig {
            preparer: "Fulana".into(),
            company: "ACME".into(),
        };
        let map = PlaceholderMap::build(&sample(), &org);
        assert_eq!(map.get("{{elaborado_por}}"), Some("Fulana"));
        assert_eq!(map.get("{{empresa}}"), Some("ACME"));
    }

    #[test]
    fn load_metadata_from_toml() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("project.toml");
        std::fs::write(
            &path,
            r#"
project_name = "Agência Centro"
elaboration_date = "2025-03-07"
state = "SP"
"#,
        )
        .unwrap();

        let metadata = load_metadata(&path).unwrap();
        assert_eq!(metadata.project_name, "Agência Centro");
        assert_eq!(metadata.elaboration_date, NaiveDate::from_ymd_opt(2025, 3, 7));
        assert_eq!(metadata.service_type, DEFAULT_SERVICE_TYPE);
    }

    #[test]
    fn load_metadata_from_json() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("project.json");
        std::fs::write(
            &path,
            r#"{"project_name": "P1", "service_type": "VISTORIA", "agency_prefix": "1234"}"#,
        )
        .unwrap();

        let metadata = load_metadata(&path).unwrap();
        assert_eq!(metadata.service_type, "VISTORIA");
        assert_eq!(metadata.agency_prefix.as_deref(), Some("1234"));
    }

    #[test]
    fn load_metadata_rejects_unknown_fields() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("project.toml");
        std::fs::write(&path, "project_nmae = \"typo\"").unwrap();
        assert!(matches!(load_metadata(&path), Err(MetadataError::Toml(_))));
    }

    #[test]
    fn report_file_name_uses_project_and_service() {
        assert_eq!(
            report_file_name(&sample()),
            "RELATÓRIO FOTOGRÁFICO - Agência Centro - LEVANTAMENTO PREVENTIVO.docx"
        );
    }

    #[test]
    fn report_file_name_replaces_invalid_chars() {
        let metadata = ProjectMetadata {
            project_name: "Obra 1/2: \"Sede\"".into(),
            ..ProjectMetadata::default()
        };
        assert_eq!(
            report_file_name(&metadata),
            "RELATÓRIO FOTOGRÁFICO - Obra 1_2_ _Sede_ - LEVANTAMENTO PREVENTIVO.docx"
        );
    }

    #[test]
    fn placeholder_map_collects_from_pairs() {
        let map: PlaceholderMap = [("{{a}}", "1"), ("{{b}}", "2")].into_iter().collect();
        assert_eq!(map.get("{{b}}"), Some("2"));
        assert_eq!(map.iter().count(), 2);
    }
}
