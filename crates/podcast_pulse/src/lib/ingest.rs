//! Podcast ingestion: scrape a homepage, refresh the creator, upsert the newest
//! episodes and hand them to processing.

use podcast_datastore::{Creator, CreatorProfile, DataStore, NewCreator, NewEpisode, Platform};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    error::Error,
    extract::{ExtractionChain, MAX_EPISODES},
    processor::{EpisodeDispatcher, ProcessOutcome},
    types::{EpisodeInfo, PodcastInfo},
    xyz::{parse_podcast_url, PageFetcher},
};

/// Characters of the podcast id shown in a freshly subscribed creator's name.
const PLACEHOLDER_ID_CHARS: usize = 6;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub podcast: PodcastInfo,
    /// Episodes discovered on the page, after capping.
    pub episodes_count: usize,
    /// Episodes handed to the processor, whatever their outcome.
    pub processed_count: usize,
}

pub struct PodcastIngestHandler<D, F, P>
where
    D: DataStore + Send + Sync + 'static,
    F: PageFetcher + Send + Sync + 'static,
    P: EpisodeDispatcher + Send + Sync + 'static,
{
    store: D,
    page_fetcher: F,
    dispatcher: P,
    extraction: ExtractionChain,
}

impl<D, F, P> PodcastIngestHandler<D, F, P>
where
    D: DataStore + Send + Sync + 'static,
    F: PageFetcher + Send + Sync + 'static,
    P: EpisodeDispatcher + Send + Sync + 'static,
{
    pub fn new(store: D, page_fetcher: F, dispatcher: P) -> Self {
        Self {
            store,
            page_fetcher,
            dispatcher,
            extraction: ExtractionChain::default(),
        }
    }

    pub fn store(&self) -> &D {
        &self.store
    }

    /// Finds the creator behind a homepage link, creating a placeholder one if needed.
    /// The real name is filled in by the next ingestion.
    #[tracing::instrument(skip(self))]
    pub async fn register_creator(&self, homepage_url: &str) -> Result<Creator, Error> {
        let podcast_id = parse_podcast_url(homepage_url)?;

        if let Some(creator) = self
            .store
            .find_creator_by_platform_id(Platform::Xiaoyuzhou, &podcast_id)
            .await?
        {
            tracing::debug!(creator_id = %creator.id, "Creator already subscribed");
            return Ok(creator);
        }

        let short_id = podcast_id
            .chars()
            .take(PLACEHOLDER_ID_CHARS)
            .collect::<String>();

        let creator = self
            .store
            .upsert_creator(&NewCreator {
                platform: Platform::Xiaoyuzhou,
                name: format!("播客 {short_id}..."),
                homepage_url: F::podcast_url(&podcast_id),
                platform_id: podcast_id,
            })
            .await?;

        tracing::info!(creator_id = %creator.id, "Created creator");
        Ok(creator)
    }

    fn new_episode(creator_id: Uuid, episode: &EpisodeInfo) -> NewEpisode {
        NewEpisode {
            creator_id,
            platform: Platform::Xiaoyuzhou,
            platform_episode_id: episode.id.clone(),
            title: episode.title.clone(),
            original_url: F::episode_url(&episode.id),
            duration: episode.duration,
            published_at: episode.published_at,
            thumbnail_url: episode.thumbnail_url.clone(),
            audio_url: episode.audio_url.clone(),
        }
    }

    /// Only input validation, an unknown creator and a failed page fetch are errors.
    /// Everything after the fetch degrades per item and is logged.
    #[tracing::instrument(skip(self))]
    pub async fn ingest(&self, podcast_id: &str, creator_id: &str) -> Result<IngestReport, Error> {
        let podcast_id = podcast_id.trim();
        if podcast_id.is_empty() || creator_id.trim().is_empty() {
            return Err(Error::InvalidRequest(
                "Missing podcastId or creatorId".to_string(),
            ));
        }
        let creator_id = Uuid::parse_str(creator_id.trim())
            .map_err(|_| Error::InvalidRequest(format!("Invalid creatorId: {creator_id}")))?;

        self.store
            .find_creator(creator_id)
            .await?
            .ok_or_else(|| Error::not_found("creator", creator_id))?;

        let doc = self
            .page_fetcher
            .fetch_page(&F::podcast_url(podcast_id))
            .await?;
        let page = self.extraction.podcast_page(&doc, podcast_id);
        tracing::info!(
            podcast = %page.podcast.name,
            episodes = page.episodes.len(),
            "Found podcast"
        );

        let profile = CreatorProfile {
            name: page.podcast.name.clone(),
            description: page.podcast.description.clone(),
            avatar_url: page.podcast.avatar.clone(),
        };
        if let Err(e) = self.store.update_creator_profile(creator_id, &profile).await {
            tracing::error!(error = ?e, "Failed to update creator");
        }

        let mut episode_ids = Vec::with_capacity(page.episodes.len());
        for episode in &page.episodes {
            match self
                .store
                .upsert_episode(&Self::new_episode(creator_id, episode))
                .await
            {
                Ok(id) => episode_ids.push(id),
                Err(e) => {
                    tracing::error!(error = ?e, episode = %episode.id, "Failed to upsert episode")
                }
            }
        }
        tracing::info!(count = episode_ids.len(), "Upserted episodes");

        // one at a time, so a batch never puts more than one request on the AI endpoint
        let to_dispatch = &episode_ids[..episode_ids.len().min(MAX_EPISODES)];
        for &episode_id in to_dispatch {
            match self.dispatcher.dispatch(episode_id).await {
                ProcessOutcome::Success { .. } => {
                    tracing::info!(%episode_id, "Episode processed successfully")
                }
                ProcessOutcome::Failed { error, .. } => {
                    tracing::error!(%episode_id, error = %error, "Failed to process episode")
                }
            }
        }

        Ok(IngestReport {
            episodes_count: page.episodes.len(),
            processed_count: to_dispatch.len(),
            podcast: page.podcast,
        })
    }
}
