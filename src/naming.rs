//! Folder-name conventions shared by the organizer, customizer and composer.
//!
//! ## Section Priority
//!
//! Survey archives use a small vocabulary of section folders. Siblings are
//! ordered by their position in a ranking table; names outside the table
//! come after every listed name, and ties fall back to alphabetical order:
//!
//! ```text
//! ["zeta", "- Área externa", "- Detalhes"]  →  ["- Área externa", "- Detalhes", "zeta"]
//! ```
//!
//! ## Nesting Markers
//!
//! Flat (one-string) heading representations encode their nesting level as a
//! prefix of `»` glyphs: `"Fachada"` is level 0, `"»»Fachada"` is level 2.
//!
//! ## Display Titles
//!
//! Report headings strip marker glyphs, collapse a doubled leading `"- -"`
//! into `"-"`, and end with a colon:
//! - `"»- Área externa"` → `"- Área externa:"`
//! - `"- - Fachada"` → `"- Fachada:"`

use std::cmp::Ordering;

/// Glyph repeated once per nesting level in flat heading strings.
pub const NESTING_MARKER: char = '»';

/// Ranking table for sibling folders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorityOrder {
    names: Vec<String>,
}

impl PriorityOrder {
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Position in the table, or `len()` for unlisted names.
    pub fn rank(&self, name: &str) -> usize {
        self.names
            .iter()
            .position(|n| n == name)
            .unwrap_or(self.names.len())
    }

    /// Rank first, then plain string order.
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        self.rank(a).cmp(&self.rank(b)).then_with(|| a.cmp(b))
    }
}

/// Decode a flat marker string back into `(title, level)`.
pub fn parse_marker_title(marked: &str) -> (String, usize) {
    let level = marked.chars().filter(|&c| c == NESTING_MARKER).count();
    (marked.replace(NESTING_MARKER, ""), level)
}

/// Heading text as it appears in the report.
pub fn display_title(title: &str) -> String {
    let stripped = title.replace(NESTING_MARKER, "");
    let mut cleaned = stripped.trim();
    if cleaned.starts_with("- -") {
        cleaned = cleaned[2..].trim();
    }
    format!("{cleaned}:")
}

/// True when `title` names a section that renders as bold body text
/// instead of a heading style.
pub fn is_normal_text_section(title: &str, normal_text: &[String]) -> bool {
    normal_text.iter().any(|name| title.contains(name.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn survey_order() -> PriorityOrder {
        PriorityOrder::new([
            "- Área externa",
            "- Área interna",
            "- Segundo piso",
            "- Detalhes",
            "- Vista ampla",
        ])
    }

    fn sorted(order: &PriorityOrder, names: &[&str]) -> Vec<String> {
        let mut names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        names.sort_by(|a, b| order.compare(a, b));
        names
    }

    #[test]
    fn listed_names_follow_table_position() {
        let names = sorted(
            &survey_order(),
            &["- Vista ampla", "- Área interna", "- Área externa"],
        );
        assert_eq!(names, vec!["- Área externa", "- Área interna", "- Vista ampla"]);
    }

    #[test]
    fn listed_name_precedes_unlisted() {
        let names = sorted(&survey_order(), &["zeta", "- Área externa", "- Detalhes"]);
        assert_eq!(names, vec!["- Área externa", "- Detalhes", "zeta"]);
    }

    #[test]
    fn unlisted_names_sort_alphabetically() {
        let names = sorted(&survey_order(), &["Telhado", "Fachada", "Muro"]);
        assert_eq!(names, vec!["Fachada", "Muro", "Telhado"]);
    }

    #[test]
    fn rank_of_unlisted_is_table_length() {
        let order = survey_order();
        assert_eq!(order.rank("- Área externa"), 0);
        assert_eq!(order.rank("- Vista ampla"), 4);
        assert_eq!(order.rank("Garagem"), 5);
    }

    #[test]
    fn empty_table_is_plain_alphabetical() {
        let order = PriorityOrder::new(Vec::<String>::new());
        assert_eq!(order.compare("b", "a"), Ordering::Greater);
        assert_eq!(order.compare("a", "a"), Ordering::Equal);
    }

    #[test]
    fn parse_marker_title_counts_glyphs() {
        assert_eq!(parse_marker_title("»»Fachada"), ("Fachada".to_string(), 2));
        assert_eq!(parse_marker_title("Fachada"), ("Fachada".to_string(), 0));
    }

    #[test]
    fn display_title_appends_colon() {
        assert_eq!(display_title("- Área externa"), "- Área externa:");
    }

    #[test]
    fn display_title_strips_markers_and_whitespace() {
        assert_eq!(display_title("»» Fachada "), "Fachada:");
    }

    #[test]
    fn display_title_collapses_doubled_hyphen() {
        assert_eq!(display_title("- - Fachada"), "- Fachada:");
    }

    #[test]
    fn normal_text_sections_match_by_containment() {
        let normal = vec!["- Detalhes".to_string(), "- Vista ampla".to_string()];
        assert!(is_normal_text_section("- Detalhes:", &normal));
        assert!(is_normal_text_section("- Vista ampla", &normal));
        assert!(!is_normal_text_section("- Área externa:", &normal));
    }
}
