//! BibTeX rendering

/// Citation fields of one entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BibEntry {
    pub key: String,
    pub title: String,
    pub authors: Vec<String>,
    pub year: Option<i32>,
    pub venue: Option<String>,
    pub doi: Option<String>,
}

impl BibEntry {
    /// Render as an `@article` entry
    pub fn render(&self) -> String {
        let year = self
            .year
            .map(|y| y.to_string())
            .unwrap_or_else(|| "n.d.".to_string());

        format!(
            "@article{{{key},\n  title = {{{title}}},\n  author = {{{authors}}},\n  year = {{{year}}},\n  journal = {{{journal}}},\n  doi = {{{doi}}}\n}}",
            key = self.key,
            title = self.title,
            authors = self.authors.join(" and "),
            year = year,
            journal = self.venue.as_deref().unwrap_or("Unknown"),
            doi = self.doi.as_deref().unwrap_or_default(),
        )
    }
}

/// Render entries separated by a blank line
pub fn render_all(entries: &[BibEntry]) -> String {
    entries
        .iter()
        .map(BibEntry::render)
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_entry() {
        let entry = BibEntry {
            key: "W2741809807".to_string(),
            title: "The state of OA".to_string(),
            authors: vec!["Heather Piwowar".to_string(), "Jason Priem".to_string()],
            year: Some(2018),
            venue: Some("PeerJ".to_string()),
            doi: Some("10.7717/peerj.4375".to_string()),
        };

        assert_eq!(
            entry.render(),
            "@article{W2741809807,\n  title = {The state of OA},\n  author = {Heather Piwowar and Jason Priem},\n  year = {2018},\n  journal = {PeerJ},\n  doi = {10.7717/peerj.4375}\n}"
        );
    }

    #[test]
    fn test_missing_fields_use_placeholders() {
        let entry = BibEntry { key: "W1".to_string(), title: "Untitled".to_string(), ..Default::default() };
        let text = entry.render();

        assert!(text.contains("year = {n.d.}"));
        assert!(text.contains("journal = {Unknown}"));
        assert!(text.contains("author = {}"));
        assert!(text.contains("doi = {}"));
    }

    #[test]
    fn test_entries_joined_by_blank_line() {
        let a = BibEntry { key: "W1".to_string(), ..Default::default() };
        let b = BibEntry { key: "W2".to_string(), ..Default::default() };

        let text = render_all(&[a, b]);
        assert!(text.contains("}\n\n@article{W2,"));
        assert_eq!(render_all(&[]), "");
    }
}
