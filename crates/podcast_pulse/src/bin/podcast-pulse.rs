use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use clap::{Parser, Subcommand};
use podcast_datastore::{DataStore, PgDataStore};
use podcast_pulse::{
    api::{self, AppState},
    config::AiConfig,
    ingest::PodcastIngestHandler,
    openai::OpenAIClient,
    progress::{wait_for_terminal, DEFAULT_INTERVAL, DEFAULT_TIMEOUT},
    tracing::init_tracing_subscriber,
    xyz::scraper::Scraper,
    EpisodeProcessor, EpisodeProcessorBuilder, ProcessOutcome, SkipTranscriber,
};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

type Processor = EpisodeProcessor<PgDataStore, Scraper, OpenAIClient, SkipTranscriber>;
type IngestHandler = PodcastIngestHandler<PgDataStore, Scraper, Arc<Processor>>;

#[derive(Parser)]
#[command(
    name = "podcast-pulse",
    about = "Xiaoyuzhou podcast ingestion and AI summaries"
)]
struct Cli {
    /// Database connection URL
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    #[command(flatten)]
    ai: AiConfig,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP entrypoints
    Serve {
        #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8080")]
        bind: SocketAddr,
    },
    /// Subscribe to a podcast by its homepage link and ingest it
    Subscribe {
        /// e.g. https://www.xiaoyuzhoufm.com/podcast/5e280fab418a84a0461fc579
        url: String,
        /// Return as soon as ingestion finishes instead of waiting for a first summary
        #[arg(long)]
        no_wait: bool,
    },
    /// Ingest a podcast for an existing creator
    Ingest { podcast_id: String, creator_id: String },
    /// Process a single episode
    Process { episode_id: Uuid },
    /// Print the stored summary of an episode
    Show { episode_id: Uuid },
}

fn build_pipeline(
    store: PgDataStore,
    ai: &AiConfig,
) -> anyhow::Result<(IngestHandler, Arc<Processor>)> {
    let scraper = Scraper::new().context("Failed to build http client")?;

    let processor = Arc::new(
        EpisodeProcessorBuilder::new()
            .store(store.clone())
            .page_fetcher(scraper.clone())
            .summarizer(OpenAIClient::from_config(ai))
            .transcriber(SkipTranscriber)
            .build(),
    );

    if !processor.provider().key_configured {
        tracing::warn!("OPENAI_API_KEY is not set, episode processing will fail");
    }

    let ingest = PodcastIngestHandler::new(store, scraper, Arc::clone(&processor));
    Ok((ingest, processor))
}

async fn serve(
    bind: SocketAddr,
    ingest: IngestHandler,
    processor: Arc<Processor>,
) -> anyhow::Result<()> {
    let app = api::router(AppState {
        ingest: Arc::new(ingest),
        dispatcher: processor,
    });

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    tracing::info!(%bind, "Listening");

    let token = CancellationToken::new();
    let shutdown = token.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = ?e, "Failed to listen for shutdown signal");
        }
        tracing::info!("Received Ctrl-C, starting graceful shutdown");
        shutdown.cancel();
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(token.cancelled_owned())
        .await
        .context("Server error")?;

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

async fn subscribe(ingest: &IngestHandler, url: &str, no_wait: bool) -> anyhow::Result<()> {
    let creator = ingest.register_creator(url).await?;
    let report = ingest
        .ingest(&creator.platform_id, &creator.id.to_string())
        .await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if no_wait {
        return Ok(());
    }

    let finished =
        wait_for_terminal(ingest.store(), creator.id, DEFAULT_TIMEOUT, DEFAULT_INTERVAL).await?;
    match finished {
        Some(episodes) => {
            for episode in episodes {
                println!("{}\t{}\t{}", episode.id, episode.status, episode.title);
            }
        }
        None => println!("Episodes are still processing, check back later"),
    }

    Ok(())
}

async fn show(store: &PgDataStore, episode_id: Uuid) -> anyhow::Result<()> {
    let record = store
        .find_episode(episode_id)
        .await?
        .with_context(|| format!("Episode not found: {episode_id}"))?;
    println!("{} [{}]", record.episode.title, record.episode.status);
    if let Some(error) = &record.episode.error_message {
        println!("error: {error}");
    }

    let Some(summary) = store.find_summary(episode_id).await? else {
        println!("No summary yet");
        return Ok(());
    };

    println!("\n{}\n", summary.summary);
    for point in &summary.key_points {
        println!("- {point}");
    }
    if !summary.keywords.is_empty() {
        println!("\n#{}", summary.keywords.join(" #"));
    }
    println!();
    for mark in &summary.timestamps {
        println!("{}  {}  {}", mark.clock(), mark.topic, mark.summary);
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let _guard = sentry::init((
        std::env::var("SENTRY_DSN").unwrap_or_default(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some("production".into()),
            ..Default::default()
        },
    ));

    let cli = Cli::parse();
    init_tracing_subscriber()?;

    let store = PgDataStore::init(&cli.database_url).await?;

    match cli.command {
        Command::Serve { bind } => {
            let (ingest, processor) = build_pipeline(store, &cli.ai)?;
            serve(bind, ingest, processor).await?;
        }
        Command::Subscribe { url, no_wait } => {
            let (ingest, _) = build_pipeline(store, &cli.ai)?;
            subscribe(&ingest, &url, no_wait).await?;
        }
        Command::Ingest {
            podcast_id,
            creator_id,
        } => {
            let (ingest, _) = build_pipeline(store, &cli.ai)?;
            let report = ingest.ingest(&podcast_id, &creator_id).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Process { episode_id } => {
            let (_, processor) = build_pipeline(store, &cli.ai)?;
            match processor.run(episode_id).await {
                ProcessOutcome::Success { episode_id } => println!("Processed {episode_id}"),
                ProcessOutcome::Failed { error, debug: provider } => {
                    tracing::error!(?provider, "Processing failed");
                    return Err(error.into());
                }
            }
        }
        Command::Show { episode_id } => show(&store, episode_id).await?,
    }

    Ok(())
}
