// ============================================================
// Layer 3 — Article Domain Type
// ============================================================
// One article of a Wikipedia-style corpus: the header line
// `= Title =` followed by every line up to the next header.
//
// Lines are stored exactly as read, terminators included,
// so writing the lines back out reproduces the source bytes.
//
// Reference: Rust Book §5 (Structs and Methods)

use serde::{Deserialize, Serialize};

/// An ordered run of raw corpus lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// Raw lines including their trailing '\n' (if any)
    pub lines: Vec<String>,
}

impl Article {
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    /// The article title taken from the header line,
    /// e.g. " = Valkyria Chronicles III = \n" → "Valkyria Chronicles III".
    /// None for a preamble that does not start with a header.
    pub fn title(&self) -> Option<String> {
        let first = self.lines.first()?;
        if !is_article_header(first) {
            return None;
        }
        let tokens: Vec<&str> = first.split_whitespace().collect();
        Some(tokens[1..tokens.len() - 1].join(" "))
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// True when every line is whitespace only
    pub fn is_blank(&self) -> bool {
        self.lines.iter().all(|l| l.trim().is_empty())
    }
}

/// Does this line open a new top-level article?
///
/// The whitespace tokens must number at least two, start and end
/// with a lone `=`, and the second token must not be `=`; that
/// last rule keeps `= = Section = =` sub-headers inside the article.
pub fn is_article_header(line: &str) -> bool {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    tokens.len() >= 2
        && tokens[0] == "="
        && tokens[tokens.len() - 1] == "="
        && tokens[1] != "="
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_level_header() {
        assert!(is_article_header(" = Robert Boulter = \n"));
        assert!(is_article_header("= A ="));
    }

    #[test]
    fn test_section_header_is_not_article() {
        assert!(!is_article_header(" = = Career = = \n"));
        assert!(!is_article_header(" = = = 2000 – 2005 = = = \n"));
    }

    #[test]
    fn test_plain_lines_are_not_headers() {
        assert!(!is_article_header(" \n"));
        assert!(!is_article_header("="));
        assert!(!is_article_header(" Robert Boulter is an English actor . \n"));
        assert!(!is_article_header(" = incomplete \n"));
    }

    #[test]
    fn test_title() {
        let a = Article::new(vec![" = Robert Boulter = \n".into(), " text \n".into()]);
        assert_eq!(a.title().as_deref(), Some("Robert Boulter"));

        let preamble = Article::new(vec!["intro\n".into()]);
        assert_eq!(preamble.title(), None);
    }
}
