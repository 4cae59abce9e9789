// ============================================================
// Layer 4 — N-gram History Counter
// ============================================================
// Counts how often every n-gram history (the tokens preceding
// a position, up to `order` of them) occurs in a text corpus.
// These counts are the raw material for the `freq` feature
// vectors of the hypothesis records.
//
// The stream starts with a sentence boundary `</s>`, and one is
// appended after every line, so histories cross line breaks
// the same way the language model sees them.
//
// Example with order=2 over "a b":
//   before "a": history [</s>]       → "</s>"
//   before "b": history [</s>, a]    → "a", "</s> a"
//
// Reference: Rust Book §8 (Hash Maps)

use anyhow::{ensure, Result};
use std::{
    collections::{HashMap, VecDeque},
    io::{BufRead, Write},
};

/// Sentence boundary marker
pub const BOUNDARY: &str = "</s>";

/// Progress is logged every this many lines
const LOG_EVERY: usize = 100_000;

/// Count all history suffixes of length 1..=order before every token.
pub fn count_histories<R: BufRead>(reader: R, order: usize) -> Result<HashMap<String, u64>> {
    ensure!(order >= 1, "n-gram order must be at least 1");

    let mut counts: HashMap<String, u64> = HashMap::new();
    let mut history: VecDeque<String> = VecDeque::with_capacity(order + 1);
    history.push_back(BOUNDARY.to_string());

    for (i, line) in reader.lines().enumerate() {
        if i % LOG_EVERY == 0 {
            tracing::info!("processed {} lines", i);
        }
        let line = line?;

        for tok in line.split_whitespace() {
            for len in 1..=history.len() {
                let start = history.len() - len;
                let key = history
                    .range(start..)
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(" ");
                *counts.entry(key).or_insert(0) += 1;
            }
            push_capped(&mut history, tok.to_string(), order);
        }
        push_capped(&mut history, BOUNDARY.to_string(), order);
    }

    tracing::info!("Counted {} distinct histories", counts.len());
    Ok(counts)
}

fn push_capped(history: &mut VecDeque<String>, tok: String, order: usize) {
    history.push_back(tok);
    while history.len() > order {
        history.pop_front();
    }
}

/// Write counts as `history\tcount`, most frequent first
/// (ties broken alphabetically so the output is stable).
pub fn write_counts<W: Write>(mut out: W, counts: &HashMap<String, u64>) -> Result<()> {
    let mut rows: Vec<(&String, &u64)> = counts.iter().collect();
    rows.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

    for (history, count) in rows {
        writeln!(out, "{history}\t{count}")?;
    }
    out.flush()?;
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_counts_histories_before_each_token() {
        let counts = count_histories(Cursor::new("a b\n"), 2).unwrap();
        assert_eq!(counts["</s>"], 1);
        assert_eq!(counts["a"], 1);
        assert_eq!(counts["</s> a"], 1);
        // the final token is never a history
        assert!(!counts.contains_key("b"));
        assert_eq!(counts.len(), 3);
    }

    #[test]
    fn test_histories_cross_line_boundaries() {
        let counts = count_histories(Cursor::new("a\na\n"), 3).unwrap();
        // second "a" sees history [</s>, a, </s>]
        assert_eq!(counts["</s>"], 2);
        assert_eq!(counts["a </s>"], 1);
        assert_eq!(counts["</s> a </s>"], 1);
    }

    #[test]
    fn test_history_is_capped_at_order() {
        let counts = count_histories(Cursor::new("a b c d"), 2).unwrap();
        assert!(counts.keys().all(|k| k.split(' ').count() <= 2));
        assert_eq!(counts["b c"], 1);
    }

    #[test]
    fn test_zero_order_rejected() {
        assert!(count_histories(Cursor::new("a"), 0).is_err());
    }

    #[test]
    fn test_write_counts_sorted() {
        let counts = count_histories(Cursor::new("x x x\n"), 1).unwrap();
        let mut out = Vec::new();
        write_counts(&mut out, &counts).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "x\t2\n</s>\t1\n");
    }
}
