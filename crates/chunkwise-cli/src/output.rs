//! Plain-text tables for the terminal.

use std::fmt::Write;

use chunkwise_core::Document;
use chunkwise_eval::EvaluationReport;
use chunkwise_ingest::ChunkStats;
use chunkwise_resolve::RetrievedChunk;

/// One strategy's chunking outcome for `compare`.
pub struct ComparisonRow {
    pub strategy: String,
    pub stats: ChunkStats,
    pub parents: usize,
}

pub fn render_comparison(document: &Document, doc_tokens: usize, rows: &[ComparisonRow]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Chunking Comparison ===");
    let _ = writeln!(out, "Document:  {}", document.source);
    let _ = writeln!(out, "Pages:     {}", document.page_count());
    let _ = writeln!(out, "Tokens:    {}", doc_tokens);
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{:<26} {:>7} {:>8} {:>8} {:>6} {:>6} {:>8}",
        "Strategy", "Chunks", "Tokens", "Avg", "Min", "Max", "Parents"
    );
    for row in rows {
        let _ = writeln!(
            out,
            "{:<26} {:>7} {:>8} {:>8.1} {:>6} {:>6} {:>8}",
            row.strategy,
            row.stats.num_chunks,
            row.stats.total_tokens,
            row.stats.avg_tokens,
            row.stats.min_tokens,
            row.stats.max_tokens,
            row.parents
        );
    }
    out
}

pub fn render_results(
    document: &Document,
    strategy: &str,
    question: &str,
    results: &[RetrievedChunk],
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== {} ===", strategy);
    let _ = writeln!(out, "Query: {}", question);
    for (rank, r) in results.iter().enumerate() {
        let _ = writeln!(out);
        let _ = write!(
            out,
            "#{} {} (p. {}, score {:.3}, {} tokens)",
            rank + 1,
            r.id,
            document.page_at(r.source_span.start),
            r.score,
            r.token_count
        );
        if let Some(child) = &r.matched_child {
            let _ = write!(out, " via {}", child);
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", preview(&r.text, 240));
    }
    if results.is_empty() {
        let _ = writeln!(out, "(no results)");
    }
    out
}

pub fn render_report(report: &EvaluationReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Chunkwise Evaluation Report ===");
    let _ = writeln!(out);
    let _ = writeln!(out, "Document:  {} ({})", report.source, report.document_id);
    let _ = writeln!(out, "Mode:      {}", report.mode);
    let _ = writeln!(out, "Model:     {}", report.model);
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{:<26} {:<11} {:>7} {:>9} {:>8} {:>10} {:>8} {:>8}",
        "Strategy", "Status", "Chunks", "Retrieved", "Input", "Cost", "Savings", "Defects"
    );
    let summaries = report.summaries();
    for s in &summaries {
        let savings = s
            .savings_pct
            .map(|p| format!("{:.1}%", p))
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "{:<26} {:<11} {:>7} {:>9} {:>8} {:>10} {:>8} {:>8}",
            s.strategy,
            format!("{:?}", s.status).to_lowercase(),
            s.chunk_count,
            s.retrieved_chunk_count,
            s.input_tokens,
            format!("${:.4}", s.total_cost),
            savings,
            s.field_defects
        );
    }

    let errors: Vec<_> = summaries
        .iter()
        .filter_map(|s| s.error.as_ref().map(|e| (&s.strategy, e)))
        .collect();
    if !errors.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Errors:");
        for (strategy, e) in errors {
            let _ = writeln!(out, "  - {}: {}", strategy, e);
        }
    }

    let _ = writeln!(out);
    match report.best_strategy() {
        Some(best) => {
            let _ = writeln!(out, "Best strategy: {}", best.strategy);
        }
        None => {
            let _ = writeln!(out, "Best strategy: none completed");
        }
    }
    out
}

/// First `max_chars` characters on one line.
fn preview(text: &str, max_chars: usize) -> String {
    let flat: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let cut: String = flat.chars().take(max_chars).collect();
    format!("{}...", cut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chunkwise_core::{PageBoundary, SourceSpan};
    use chunkwise_eval::{EvaluationMode, RunStatus, StrategyRun};

    #[test]
    fn test_preview_flattens_and_cuts() {
        assert_eq!(preview("a\n\nb   c", 10), "a b c");
        assert_eq!(preview("abcdef", 3), "abc...");
    }

    #[test]
    fn test_results_show_parent_expansion() {
        let doc = Document::from_text("agreement.txt", "The Borrower is TALF LLC.");
        let results = vec![RetrievedChunk {
            id: "doc:hierarchical_1000_300:parent:0".into(),
            text: "The Borrower is TALF LLC.".into(),
            token_count: 6,
            position: 0,
            source_span: SourceSpan::new(0, 25),
            score: 0.5,
            matched_child: Some("doc:hierarchical_1000_300:2".into()),
        }];
        let text = render_results(&doc, "hierarchical_1000_300", "Who is the borrower?", &results);
        assert!(text.contains("#1 doc:hierarchical_1000_300:parent:0 (p. 1,"));
        assert!(text.contains("via doc:hierarchical_1000_300:2"));
        assert!(render_results(&doc, "x", "q", &[]).contains("(no results)"));
    }

    #[test]
    fn test_results_show_source_page() {
        let doc = Document::new(
            "agreement.pdf",
            "Cover page.\n\nThe Lender is FRBNY.",
            vec![
                PageBoundary { page_number: 1, char_offset: 0 },
                PageBoundary { page_number: 2, char_offset: 13 },
            ],
        );
        let hit = |id: &str, start: usize, end: usize| RetrievedChunk {
            id: id.into(),
            text: doc.text()[start..end].into(),
            token_count: 4,
            position: 0,
            source_span: SourceSpan::new(start, end),
            score: 0.7,
            matched_child: None,
        };
        let results = vec![hit("doc:fixed_300_20:1", 13, 33), hit("doc:fixed_300_20:0", 0, 11)];
        let text = render_results(&doc, "fixed_300_20", "Who is the lender?", &results);
        assert!(text.contains("#1 doc:fixed_300_20:1 (p. 2, score 0.700"));
        assert!(text.contains("#2 doc:fixed_300_20:0 (p. 1,"));
    }

    #[test]
    fn test_report_lists_errors_and_best() {
        let doc = Document::from_text("agreement.txt", "The Borrower is TALF LLC.");
        let mut failed = StrategyRun::new("semantic_500");
        failed.status = RunStatus::Failed;
        failed.error = Some("Invalid parameters: max_tokens must be > 0".into());
        let report = EvaluationReport::new(
            &doc,
            EvaluationMode::PerField,
            "test-model",
            StrategyRun::new("baseline"),
            vec![failed],
        );
        let text = render_report(&report);
        assert!(text.contains("semantic_500"));
        assert!(text.contains("failed"));
        assert!(text.contains("Errors:"));
        assert!(text.contains("Best strategy: none completed"));
    }
}
