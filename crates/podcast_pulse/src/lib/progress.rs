//! Advisory progress polling after an ingest.

use std::time::Duration;

use podcast_datastore::{DataStore, Episode};
use uuid::Uuid;

use crate::error::Error;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Polls a creator's episodes until at least one reaches a terminal status.
///
/// Returns the episode list as last observed, or `None` if the timeout elapsed first.
/// Processing carries on server-side either way.
#[tracing::instrument(skip(store))]
pub async fn wait_for_terminal<D>(
    store: &D,
    creator_id: Uuid,
    timeout: Duration,
    interval: Duration,
) -> Result<Option<Vec<Episode>>, Error>
where
    D: DataStore + Send + Sync,
{
    let deadline = tokio::time::Instant::now() + timeout;

    loop {
        let episodes = store.list_episodes(creator_id).await?;
        if episodes.iter().any(|e| e.status.is_terminal()) {
            return Ok(Some(episodes));
        }

        if tokio::time::Instant::now() + interval > deadline {
            tracing::info!(
                pending = episodes.len(),
                "No episode finished before the timeout"
            );
            return Ok(None);
        }
        tokio::time::sleep(interval).await;
    }
}
