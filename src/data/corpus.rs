// ============================================================
// Layer 4 — Wikitext Corpus Reader / Writer
// ============================================================
// Reads a flat text corpus (wikitext-103 layout) and groups
// its lines into articles. A new article begins at every
// top-level header line `= Title =`; sub-section headers
// `= = Section = =` stay inside the current article.
//
// Lines before the first header form a preamble:
//   - blank-only preamble  → dropped (each output file starts
//                            with its own synthetic blank line)
//   - preamble with text   → kept as an article of its own
//
// Lines are read with read_line() so every terminator is kept
// and the output bytes match the input bytes.
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use std::{
    fs::File,
    io::{BufRead, BufReader, Write},
    path::{Path, PathBuf},
};

use crate::domain::article::{is_article_header, Article};
use crate::domain::traits::ArticleSource;

/// Progress is logged every this many written articles
const LOG_EVERY: usize = 5000;

/// Reads articles from a wikitext file on disk.
/// Implements the ArticleSource trait from Layer 3.
pub struct WikitextReader {
    path: PathBuf,
}

impl WikitextReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ArticleSource for WikitextReader {
    fn read_articles(&self) -> Result<Vec<Article>> {
        let file = File::open(&self.path)
            .with_context(|| format!("Cannot open corpus '{}'", self.path.display()))?;
        parse_articles(BufReader::new(file))
            .with_context(|| format!("Cannot read corpus '{}'", self.path.display()))
    }
}

/// Group the lines of `reader` into articles.
pub fn parse_articles<R: BufRead>(mut reader: R) -> Result<Vec<Article>> {
    let mut articles = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut seen_header = false;

    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            break;
        }

        if is_article_header(&line) {
            if !current.is_empty() {
                flush_article(&mut articles, std::mem::take(&mut current), seen_header);
            }
            seen_header = true;
        }
        current.push(line);
    }

    if !current.is_empty() {
        flush_article(&mut articles, current, seen_header);
    }

    Ok(articles)
}

/// Push a finished article, applying the preamble policy to the
/// lines that came before the first header.
fn flush_article(articles: &mut Vec<Article>, lines: Vec<String>, after_header: bool) {
    let article = Article::new(lines);
    if !after_header && article.is_blank() {
        tracing::debug!("Dropping blank preamble of {} lines", article.line_count());
        return;
    }
    if !after_header {
        tracing::warn!(
            "Corpus does not start with an article header; keeping {} leading lines as an article",
            article.line_count()
        );
    }
    articles.push(article);
}

/// Write one split: a synthetic leading blank line followed by every
/// article's lines, verbatim.
pub fn write_articles<W: Write>(mut out: W, articles: &[Article], label: &str) -> Result<()> {
    out.write_all(b"\n")?;
    for (i, article) in articles.iter().enumerate() {
        if i % LOG_EVERY == 0 {
            tracing::info!("[{}] writing article {}", label, i);
        }
        for line in &article.lines {
            out.write_all(line.as_bytes())?;
        }
    }
    out.flush()?;
    Ok(())
}

/// Create `path` and write the split into it.
pub fn write_articles_to(path: &Path, articles: &[Article], label: &str) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Cannot create '{}'", path.display()))?;
    write_articles(std::io::BufWriter::new(file), articles, label)
        .with_context(|| format!("Cannot write '{}'", path.display()))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const CORPUS: &str = " \n = Alpha = \n \n Alpha body . \n = = History = = \n more alpha \n = Beta = \n beta body \n = Gamma = \n gamma";

    #[test]
    fn test_groups_lines_into_articles() {
        let articles = parse_articles(Cursor::new(CORPUS)).unwrap();
        assert_eq!(articles.len(), 3);
        assert_eq!(articles[0].title().as_deref(), Some("Alpha"));
        // sub-section header stays inside Alpha
        assert_eq!(articles[0].lines.len(), 5);
        assert_eq!(articles[2].lines, vec![" = Gamma = \n", " gamma"]);
    }

    #[test]
    fn test_blank_preamble_is_dropped() {
        let articles = parse_articles(Cursor::new(CORPUS)).unwrap();
        let rebuilt: String = articles.iter().flat_map(|a| a.lines.iter().cloned()).collect();
        // everything except the leading " \n"
        assert_eq!(rebuilt, &CORPUS[2..]);
    }

    #[test]
    fn test_text_preamble_is_kept() {
        let text = "stray intro line\n = Alpha = \n body \n";
        let articles = parse_articles(Cursor::new(text)).unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].lines, vec!["stray intro line\n"]);
        assert_eq!(articles[0].title(), None);
    }

    #[test]
    fn test_leading_header_has_no_preamble() {
        let text = " = Alpha = \n body \n";
        let articles = parse_articles(Cursor::new(text)).unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].lines.len(), 2);
    }

    #[test]
    fn test_empty_input() {
        let articles = parse_articles(Cursor::new("")).unwrap();
        assert!(articles.is_empty());
    }

    #[test]
    fn test_write_prepends_blank_line() {
        let articles = parse_articles(Cursor::new(" = A = \n a \n = B = \n b \n")).unwrap();
        let mut out = Vec::new();
        write_articles(&mut out, &articles, "test").unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "\n = A = \n a \n = B = \n b \n");
    }

    #[test]
    fn test_missing_file_fails() {
        let reader = WikitextReader::new("/definitely/not/here/wiki.train.tokens");
        let err = reader.read_articles().unwrap_err();
        assert!(format!("{err:#}").contains("Cannot open corpus"));
    }
}
