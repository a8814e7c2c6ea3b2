use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tenet::config::Config;
use tenet::db::{Database, GraphStore, LibSqlBackend};
use tenet::embeddings::EmbeddingProvider;
use tenet::intelligence::{
    AuthorComparator, BeliefConsolidator, ClaimClassifier, ClaimEmbedder, ClaimExtractor,
    DomainProjector, DriftDetector, ProfileBuilder, RelationBuilder, TopicNormalizer,
};
use tenet::llm::{LlmBackend, LlmProvider};
use tenet::models::Author;
use tenet::services::BeliefPipeline;

#[derive(Parser)]
#[command(name = "tenet")]
#[command(about = "Belief graph engine for newsletter archives")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract claim occurrences from analyzed posts
    Backfill {
        /// Author name or id; every author when omitted
        #[arg(long)]
        author: Option<String>,
    },

    /// Classify pending claims as ADVANCED, DISCUSSED or META
    Classify,

    /// Embed pending claims
    Embed,

    /// Cluster each author's claims into canonical beliefs
    Consolidate {
        /// Author name or id; every author when omitted
        #[arg(long)]
        author: Option<String>,
    },

    /// Rebuild the relation set over each author's belief pairs
    Relate {
        /// Author name or id; every author when omitted
        #[arg(long)]
        author: Option<String>,
    },

    /// Print one author's belief spans and drift records
    Evolution {
        /// Author name or id
        #[arg(long)]
        author: String,
    },

    /// Materialize cached author profiles
    Profile {
        /// Author name or id; every author when omitted
        #[arg(long)]
        author: Option<String>,
    },

    /// Compare two authors' topics and beliefs
    Compare {
        /// First author name or id
        #[arg(long)]
        author_a: String,
        /// Second author name or id
        #[arg(long)]
        author_b: String,
    },

    /// Deduplicate an author's topic labels and map them onto the domain vocabulary
    NormalizeTopics {
        /// Author name or id
        #[arg(long)]
        author: String,
    },

    /// Run the full pipeline: backfill, classify, embed, consolidate, relate, profile
    Run {
        /// Author name or id; every author when omitted
        #[arg(long)]
        author: Option<String>,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tenet=info".into());

    let json_logs = std::env::var("LOG_FORMAT")
        .map(|value| value.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn resolve_author(store: &Arc<dyn GraphStore>, key: &str) -> anyhow::Result<Author> {
    if let Some(author) = store.get_author_by_name(key).await? {
        return Ok(author);
    }
    if let Some(author) = store.get_author_by_id(key).await? {
        return Ok(author);
    }
    anyhow::bail!("No author named or keyed '{key}'")
}

async fn target_authors(
    store: &Arc<dyn GraphStore>,
    author: Option<&str>,
) -> anyhow::Result<Vec<Author>> {
    match author {
        Some(key) => Ok(vec![resolve_author(store, key).await?]),
        None => Ok(store.list_authors().await?),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env();

    let db = Database::new(&config.database).await?;
    let store: Arc<dyn GraphStore> = Arc::new(LibSqlBackend::new(db));

    let llm = LlmProvider::new(config.llm.as_ref());
    if let LlmBackend::Unavailable { reason } = llm.backend() {
        tracing::warn!(
            %reason,
            "LLM disabled, classification and relation stages will leave their work for a later run"
        );
    }

    match args.command {
        Command::Backfill { author } => {
            let extractor = ClaimExtractor::new(store.clone());
            for author in target_authors(&store, author.as_deref()).await? {
                let inserted = extractor.backfill_author(&author.id).await?;
                println!("{}: {inserted} claims extracted", author.name);
            }
        }

        Command::Classify => {
            let classifier = ClaimClassifier::new(
                store.clone(),
                llm.clone(),
                config.analysis.classify_batch_size,
            );
            let classified = classifier.classify_missing().await?;
            println!("{classified} claims classified");
        }

        Command::Embed => {
            let embeddings = EmbeddingProvider::new(&config.embeddings)?;
            let embedder = ClaimEmbedder::new(
                store.clone(),
                embeddings,
                config.analysis.classify_batch_size,
            );
            let embedded = embedder.embed_missing().await?;
            println!("{embedded} claims embedded");
        }

        Command::Consolidate { author } => {
            let consolidator = BeliefConsolidator::new(
                store.clone(),
                config.analysis.belief_similarity_threshold,
            );
            for author in target_authors(&store, author.as_deref()).await? {
                let written = consolidator.consolidate_author(&author.id).await?;
                println!("{}: {written} beliefs", author.name);
            }
        }

        Command::Relate { author } => {
            let relations = RelationBuilder::new(store.clone(), llm.clone());
            for author in target_authors(&store, author.as_deref()).await? {
                let written = relations.build_for_author(&author.id).await?;
                println!("{}: {written} relations", author.name);
            }
        }

        Command::Evolution { author } => {
            let author = resolve_author(&store, &author).await?;
            let report = DriftDetector::new(store.clone())
                .detect_author(&author.id)
                .await?;

            println!(
                "{}: {} beliefs tracked, {} drifts",
                author.name,
                report.spans.len(),
                report.drifts.len()
            );
            for span in &report.spans {
                println!("  {} [{} .. {}]", span.claim, span.first_seen, span.last_seen);
            }
            for drift in &report.drifts {
                println!(
                    "  drift ({:.2}): {} -> {}",
                    drift.confidence, drift.earlier, drift.later
                );
            }
        }

        Command::Profile { author } => {
            let profiles = ProfileBuilder::new(store.clone(), llm.clone(), &config.analysis);
            for author in target_authors(&store, author.as_deref()).await? {
                match profiles.build_for_author(&author.id).await? {
                    Some(profile) => println!(
                        "{}: {} beliefs, {} tensions, {} topics",
                        author.name,
                        profile.beliefs.len(),
                        profile.tensions.len(),
                        profile.topics.len()
                    ),
                    None => println!("{}: no beliefs yet, skipped", author.name),
                }
            }
        }

        Command::Compare { author_a, author_b } => {
            let a = resolve_author(&store, &author_a).await?;
            let b = resolve_author(&store, &author_b).await?;
            let comparison = AuthorComparator::new(store.clone())
                .compare(&a.id, &b.id)
                .await?;

            println!("shared topics: {}", comparison.shared_topics.join(", "));
            println!("unique to {}: {}", a.name, comparison.unique_to_a.join(", "));
            println!("unique to {}: {}", b.name, comparison.unique_to_b.join(", "));
            for disagreement in &comparison.disagreements {
                println!(
                    "  disagree: {} / {}",
                    disagreement.claim_a, disagreement.claim_b
                );
            }
        }

        Command::NormalizeTopics { author } => {
            let author = resolve_author(&store, &author).await?;
            let embeddings = EmbeddingProvider::new(&config.embeddings)?;

            let mut labels = Vec::new();
            for (_, analysis) in store.get_analyzed_posts(&author.id).await? {
                labels.extend(analysis.topics);
            }

            let normalizer = TopicNormalizer::new(
                embeddings.clone(),
                config.analysis.topic_similarity_threshold,
            );
            let canonical = normalizer.normalize(&labels).await?;

            let projector =
                DomainProjector::new(embeddings, config.analysis.anchor_similarity_threshold);
            let domains = projector.project(&canonical).await?;

            println!(
                "{}: {} labels, {} canonical, {} domains",
                author.name,
                labels.len(),
                canonical.len(),
                domains.len()
            );
            println!("canonical: {}", canonical.join(", "));
            println!("domains: {}", domains.join(", "));
        }

        Command::Run { author } => {
            let embeddings = EmbeddingProvider::new(&config.embeddings)?;
            let pipeline =
                BeliefPipeline::new(store.clone(), embeddings, llm.clone(), &config.analysis);

            for author in target_authors(&store, author.as_deref()).await? {
                let report = pipeline.run_for_author(&author.id).await?;
                println!(
                    "{}: {} extracted, {} classified, {} embedded, {} beliefs, {} relations{}",
                    author.name,
                    report.claims_extracted,
                    report.claims_classified,
                    report.claims_embedded,
                    report.beliefs_written,
                    report.relations_written,
                    if report.profile_written {
                        ", profile updated"
                    } else {
                        ""
                    }
                );
            }
        }
    }

    Ok(())
}
