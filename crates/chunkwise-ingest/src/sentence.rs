//! Sentence boundary detection.
//!
//! The semantic chunker only sees sentences through `SentenceSplitter`, so a
//! heavier detector can be dropped in without touching chunking logic. The
//! bundled `RegexSentenceSplitter` handles the abbreviations common in credit
//! agreements ("Sec.", "U.S.", "No.", "Art.") and treats blank lines as hard
//! breaks.

use std::collections::HashSet;

use chunkwise_core::SourceSpan;
use once_cell::sync::Lazy;
use regex::Regex;

/// Splits text into ordered, non-overlapping sentence spans.
///
/// Spans are byte ranges into the input and must cover every
/// non-whitespace character.
pub trait SentenceSplitter: Send + Sync {
    fn split(&self, text: &str) -> Vec<SourceSpan>;
}

static BOUNDARY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[.!?]+["'\u{201D}\u{2019})\]]*\s+|\n[ \t\r]*\n\s*"#)
        .expect("sentence boundary regex is valid")
});

const DEFAULT_ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "no", "nos", "sec", "secs", "art",
    "para", "cl", "vs", "etc", "e.g", "i.e", "approx",
    "jan", "feb", "mar", "apr", "jun", "jul", "aug", "sep", "sept", "oct", "nov", "dec",
];

/// Punctuation-driven splitter with an abbreviation list.
pub struct RegexSentenceSplitter {
    abbreviations: HashSet<String>,
}

impl RegexSentenceSplitter {
    pub fn new() -> Self {
        Self {
            abbreviations: DEFAULT_ABBREVIATIONS.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Add extra abbreviations (case-insensitive, without the trailing period).
    pub fn with_abbreviations<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for a in extra {
            self.abbreviations
                .insert(a.as_ref().trim_end_matches('.').to_lowercase());
        }
        self
    }

    /// Whether the period ending at `dot` belongs to an abbreviation or initial.
    fn is_abbreviation(&self, text: &str, dot: usize) -> bool {
        let before = &text[..dot];
        let word_start = before
            .rfind(|c: char| c.is_whitespace() || c == '(' || c == '"')
            .map(|i| i + 1)
            .unwrap_or(0);
        let word = &before[word_start..];
        if word.is_empty() {
            return false;
        }
        let lower = word.to_lowercase();
        if self.abbreviations.contains(&lower) {
            return true;
        }
        // Initials and dotted acronyms: "J." or "U.S."
        let single_letter = word.chars().count() == 1 && word.chars().all(char::is_alphabetic);
        single_letter || word.contains('.')
    }
}

impl Default for RegexSentenceSplitter {
    fn default() -> Self {
        Self::new()
    }
}

impl SentenceSplitter for RegexSentenceSplitter {
    fn split(&self, text: &str) -> Vec<SourceSpan> {
        let mut spans = Vec::new();
        let mut start = text.len() - text.trim_start().len();

        for m in BOUNDARY_RE.find_iter(text) {
            if m.start() < start {
                continue;
            }
            let matched = m.as_str();
            let terminator_len = matched.trim_end().len();

            if terminator_len > 0 {
                // A single period may be an abbreviation; "?" / "!" / "..." always end.
                let only_period = matched[..terminator_len].trim_end_matches(|c: char| {
                    matches!(c, '"' | '\'' | '\u{201D}' | '\u{2019}' | ')' | ']')
                }) == ".";
                if only_period && self.is_abbreviation(text, m.start()) {
                    continue;
                }
                let next_lower = text[m.end()..]
                    .chars()
                    .next()
                    .map(|c| c.is_lowercase())
                    .unwrap_or(false);
                if only_period && next_lower {
                    continue;
                }
            }

            let end = m.start() + terminator_len;
            push_trimmed(&mut spans, text, start, end);
            start = m.end();
        }

        push_trimmed(&mut spans, text, start, text.len());
        spans
    }
}

fn push_trimmed(spans: &mut Vec<SourceSpan>, text: &str, start: usize, end: usize) {
    if start >= end {
        return;
    }
    let slice = &text[start..end];
    let lead = slice.len() - slice.trim_start().len();
    let trimmed_len = slice.trim().len();
    if trimmed_len == 0 {
        return;
    }
    spans.push(SourceSpan::new(start + lead, start + lead + trimmed_len));
}
