use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "podcast_pulse=info,podcast_datastore=info,tower_http=info";

/// Bunyan JSON logs on stdout, with events and spans forwarded to sentry.
pub fn init_tracing_subscriber() -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(JsonStorageLayer)
        .with(BunyanFormattingLayer::new(
            env!("CARGO_PKG_NAME").into(),
            std::io::stdout,
        ))
        .with(sentry_tracing::layer())
        .try_init()?;

    Ok(())
}
