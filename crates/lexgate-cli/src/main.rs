mod display;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use lexgate_ai::JurisdictionClassifier;
use lexgate_core::{CitationValidator, Registry};
use lexgate_host::{Pipeline, PipelineConfig, QueryRequest};
use lexgate_store::{IndexBackend, RemoteIndex, RouterConfig, load_corpus};

#[derive(Parser)]
#[command(name = "lexgate", version, about = "Jurisdiction-aware, risk-gated legal question answering")]
struct Cli {
    /// Registry JSON file (defaults to the built-in Spanish registry)
    #[arg(long, env = "LEXGATE_REGISTRY", global = true)]
    registry: Option<PathBuf>,

    /// Print machine-readable JSON instead of a card
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a question, or refuse with a rationale
    Ask {
        /// The question
        query: String,
        /// Jurisdiction code or free-text place
        #[arg(long)]
        hint: Option<String>,
        /// Corpus file (.json documents or .parquet)
        #[arg(long, env = "LEXGATE_CORPUS")]
        corpus: Option<PathBuf>,
        /// Base URL of a remote index service (takes precedence over --corpus)
        #[arg(long, env = "LEXGATE_REMOTE")]
        remote: Option<String>,
        /// Per-level search timeout in milliseconds
        #[arg(long, default_value_t = 2000)]
        timeout_ms: u64,
        /// Maximum hits kept per chain level
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Stop the chain once a level yields a hit scoring at least this
        #[arg(long)]
        early_exit: Option<f32>,
        /// Search all chain levels concurrently
        #[arg(long)]
        parallel: bool,
    },
    /// Classify a question's jurisdiction without retrieval
    Classify {
        query: String,
        #[arg(long)]
        hint: Option<String>,
    },
    /// Check a drafted answer against a jurisdiction's citation rule
    Validate {
        /// Jurisdiction code, e.g. ES-AN
        #[arg(long)]
        jurisdiction: String,
        /// Answer text
        text: String,
    },
    /// List registered jurisdictions and their retrieval chains
    Registry,
}

fn load_registry(path: Option<&PathBuf>) -> anyhow::Result<Arc<Registry>> {
    let registry = match path {
        Some(path) => Registry::load(path)?,
        None => Registry::builtin()?,
    };
    Ok(Arc::new(registry))
}

fn backend(corpus: Option<PathBuf>, remote: Option<String>) -> anyhow::Result<Arc<dyn IndexBackend>> {
    match (corpus, remote) {
        (_, Some(url)) => {
            tracing::info!(url = %url, "using remote index service");
            Ok(Arc::new(RemoteIndex::new(url)))
        }
        (Some(path), None) => {
            let index = load_corpus(&path)
                .with_context(|| format!("loading corpus {}", path.display()))?;
            Ok(Arc::new(index))
        }
        (None, None) => bail!("no index backend: pass --corpus or --remote (or set LEXGATE_CORPUS)"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::debug!("lexgate v{}", env!("CARGO_PKG_VERSION"));
    let registry = load_registry(cli.registry.as_ref())?;

    match cli.command {
        Commands::Ask {
            query,
            hint,
            corpus,
            remote,
            timeout_ms,
            limit,
            early_exit,
            parallel,
        } => {
            let config = PipelineConfig {
                router: RouterConfig {
                    level_timeout: Duration::from_millis(timeout_ms),
                    limit_per_level: limit,
                    early_exit,
                    parallel,
                },
                ..PipelineConfig::default()
            };
            let pipeline = Pipeline::new(Arc::clone(&registry), backend(corpus, remote)?, config)?;

            let mut request = QueryRequest::new(query);
            request.jurisdiction_hint = hint;
            let outcome = pipeline.answer(&request).await?;

            if cli.json {
                println!("{}", outcome.response.to_json()?);
            } else {
                display::print_outcome_card(&outcome);
            }
        }
        Commands::Classify { query, hint } => {
            let classifier = JurisdictionClassifier::new(Arc::clone(&registry));
            let classification = classifier.classify(&query, hint.as_deref())?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&classification)?);
            } else {
                display::print_classification(&classification);
            }
        }
        Commands::Validate { jurisdiction, text } => {
            let code = registry
                .resolve(&jurisdiction)
                .with_context(|| format!("unknown jurisdiction {jurisdiction}"))?;
            let validator = CitationValidator::from_registry(&registry)?;
            let result = validator.validate(&text, &code);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                display::print_validation(code.as_str(), validator.has_specific_rule(&code), &result);
            }
        }
        Commands::Registry => display::print_registry(&registry),
    }

    Ok(())
}
