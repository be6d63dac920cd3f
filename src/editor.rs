//! Text editors for the whitelist and the user filter.
//!
//! Both panels edit a plain rule list; the whitelist additionally normalises
//! every line to a bare domain before it is sent to the backend.

use once_cell::sync::Lazy;
use regex::Regex;

static DOMAIN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\*\.)?([a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?\.)*[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?$")
        .expect("domain regex is valid")
});

/// Editable rule list with a saved snapshot for dirty tracking.
#[derive(Debug, Clone, Default)]
pub struct RulesEditor {
    text: String,
    saved: String,
    loaded: bool,
}

impl RulesEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the buffer with content fetched from the backend.
    pub fn load<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let text = lines
            .into_iter()
            .map(|l| l.as_ref().to_string())
            .collect::<Vec<_>>()
            .join("\n");
        self.saved = text.clone();
        self.text = text;
        self.loaded = true;
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn text_mut(&mut self) -> &mut String {
        &mut self.text
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn is_dirty(&self) -> bool {
        self.text != self.saved
    }

    /// Drop unsaved edits.
    pub fn revert(&mut self) {
        self.text = self.saved.clone();
    }

    pub fn mark_saved(&mut self) {
        self.saved = self.text.clone();
    }

    /// Append imported text below the current content.
    pub fn append(&mut self, imported: &str) {
        let imported = imported.trim_end();
        if imported.is_empty() {
            return;
        }
        if !self.text.is_empty() && !self.text.ends_with('\n') {
            self.text.push('\n');
        }
        self.text.push_str(imported);
    }

    /// Trimmed, non-empty, de-duplicated lines in their original order.
    pub fn lines(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .filter(|l| seen.insert(l.to_string()))
            .map(str::to_string)
            .collect()
    }
}

/// Result of parsing the whitelist buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WhitelistParse {
    pub domains: Vec<String>,
    /// (1-based line number, original text)
    pub invalid: Vec<(usize, String)>,
}

impl WhitelistParse {
    pub fn is_valid(&self) -> bool {
        self.invalid.is_empty()
    }
}

/// Reduce a whitelist line to a bare lowercase domain.
///
/// Accepts full URLs (`https://Example.com/path`), host:port and `www.` forms.
pub fn normalize_domain(line: &str) -> Option<String> {
    let mut host = line.trim().to_lowercase();
    if let Some(pos) = host.find("://") {
        host = host[pos + 3..].to_string();
    }
    if let Some(pos) = host.find(|c| c == '/' || c == '?' || c == '#') {
        host.truncate(pos);
    }
    if let Some(pos) = host.rfind('@') {
        host = host[pos + 1..].to_string();
    }
    if let Some(pos) = host.find(':') {
        host.truncate(pos);
    }
    let host = host.trim_end_matches('.').to_string();
    if !host.is_empty() && DOMAIN_RE.is_match(&host) {
        Some(host)
    } else {
        None
    }
}

/// Parse whitelist text: one domain per line, blank lines ignored.
pub fn parse_whitelist(text: &str) -> WhitelistParse {
    let mut result = WhitelistParse::default();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        match normalize_domain(line) {
            Some(domain) => {
                if !result.domains.contains(&domain) {
                    result.domains.push(domain);
                }
            }
            None => result.invalid.push((idx + 1, line.to_string())),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirty_tracking() {
        let mut editor = RulesEditor::new();
        editor.load(["example.com", "example.org"]);
        assert!(!editor.is_dirty());
        editor.text_mut().push_str("\nexample.net");
        assert!(editor.is_dirty());
        editor.mark_saved();
        assert!(!editor.is_dirty());
        editor.text_mut().clear();
        editor.revert();
        assert_eq!(editor.lines().len(), 3);
    }

    #[test]
    fn test_lines_are_trimmed_and_deduplicated() {
        let mut editor = RulesEditor::new();
        editor.load(["  ||ads.example^ ", "", "||ads.example^", "@@||good.example^"]);
        assert_eq!(editor.lines(), vec!["||ads.example^", "@@||good.example^"]);
    }

    #[test]
    fn test_append_adds_separator() {
        let mut editor = RulesEditor::new();
        editor.load(["a.com"]);
        editor.append("b.com\n");
        assert_eq!(editor.text(), "a.com\nb.com");
    }

    #[test]
    fn test_normalize_domain_variants() {
        assert_eq!(normalize_domain("https://WWW.Example.com/path?q=1").as_deref(), Some("www.example.com"));
        assert_eq!(normalize_domain("example.com:8080").as_deref(), Some("example.com"));
        assert_eq!(normalize_domain("*.example.com").as_deref(), Some("*.example.com"));
        assert_eq!(normalize_domain("not a domain"), None);
        assert_eq!(normalize_domain("-bad-.com"), None);
    }

    #[test]
    fn test_parse_whitelist_reports_invalid_lines() {
        let parsed = parse_whitelist("example.com\n\nbad domain\nhttp://example.com/\nexample.org");
        assert_eq!(parsed.domains, vec!["example.com", "example.org"]);
        assert_eq!(parsed.invalid, vec![(3, "bad domain".to_string())]);
        assert!(!parsed.is_valid());
    }
}
