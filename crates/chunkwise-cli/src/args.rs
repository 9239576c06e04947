//! Command-line definition.

use std::path::PathBuf;

use clap::builder::RangedU64ValueParser;
use clap::{Args, Parser, Subcommand};

use chunkwise_eval::EvaluationMode;

/// Compare chunking strategies for retrieval-augmented extraction.
#[derive(Parser, Debug)]
#[command(name = "chunkwise", version, about = "Chunking strategy evaluation for RAG extraction")]
pub struct Cli {
    /// JSON configuration file (missing keys keep defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Root for the vector database and result files
    #[arg(long, global = true, env = "CHUNKWISE_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Chunks retrieved per query (overrides configuration)
    #[arg(long, global = true, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    pub top_k: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Chunk with each strategy and show statistics
    Compare(DocumentArgs),
    /// Build persistent indexes for each strategy
    Build(DocumentArgs),
    /// Retrieve from an index built by `build`
    Query(QueryArgs),
    /// Run the extraction cost evaluation
    Evaluate(EvaluateArgs),
}

#[derive(Args, Debug)]
pub struct DocumentArgs {
    /// Document to load (.txt, .md or .json)
    pub document: PathBuf,

    /// Comma-separated strategy kinds: fixed,semantic,hierarchical
    #[arg(long, value_delimiter = ',')]
    pub strategies: Option<Vec<String>>,
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Document the index was built from
    pub document: PathBuf,

    /// Strategy kind: fixed, semantic or hierarchical
    pub strategy: String,

    /// Question text
    #[arg(required = true, num_args = 1..)]
    pub question: Vec<String>,
}

impl QueryArgs {
    pub fn question(&self) -> String {
        self.question.join(" ")
    }
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    #[command(flatten)]
    pub input: DocumentArgs,

    /// per_field (one call per field) or combined (one call in total)
    #[arg(long, default_value = "per_field", value_parser = EvaluationMode::parse)]
    pub mode: EvaluationMode,

    /// Summary file (default: <data>/results/evaluation_<doc>_<time>.json)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Evaluate against the SQLite store instead of memory
    #[arg(long)]
    pub persist: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_evaluate_flags() {
        let cli = Cli::try_parse_from([
            "chunkwise",
            "evaluate",
            "agreement.txt",
            "--mode",
            "combined",
            "--strategies",
            "fixed,semantic",
            "--top-k",
            "5",
            "--persist",
        ])
        .unwrap();
        assert_eq!(cli.top_k, Some(5));
        match cli.command {
            Command::Evaluate(args) => {
                assert_eq!(args.input.document, PathBuf::from("agreement.txt"));
                assert_eq!(args.mode, EvaluationMode::Combined);
                assert_eq!(
                    args.input.strategies,
                    Some(vec!["fixed".to_string(), "semantic".to_string()])
                );
                assert!(args.persist);
                assert!(args.output.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_query_joins_question_words() {
        let cli = Cli::try_parse_from([
            "chunkwise",
            "query",
            "agreement.txt",
            "hierarchical",
            "Who",
            "is",
            "the",
            "borrower?",
        ])
        .unwrap();
        match cli.command {
            Command::Query(args) => {
                assert_eq!(args.strategy, "hierarchical");
                assert_eq!(args.question(), "Who is the borrower?");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Cli::try_parse_from(["chunkwise", "compare", "a.txt", "--top-k", "0"]).is_err());
        assert!(Cli::try_parse_from(["chunkwise", "compare", "a.txt", "--top-k", "many"]).is_err());
        assert!(Cli::try_parse_from(["chunkwise", "evaluate", "a.txt", "--mode", "batch"]).is_err());
        assert!(Cli::try_parse_from(["chunkwise", "query", "a.txt", "fixed"]).is_err());
        assert!(Cli::try_parse_from(["chunkwise", "compare"]).is_err());
    }
}
