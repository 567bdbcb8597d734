use std::future::Future;

use uuid::Uuid;

use crate::domain::{
    Creator, CreatorProfile, Episode, EpisodeRecord, EpisodeStatus, NewCreator, NewEpisode,
    Platform, Summary,
};

pub mod postgres;

/// Persistence seam over the creator / episode / summary tables.
///
/// Every write is a single atomic statement; nothing here spans a transaction.
pub trait DataStore {
    fn find_creator(
        &self,
        creator_id: Uuid,
    ) -> impl Future<Output = anyhow::Result<Option<Creator>>> + Send;

    fn find_creator_by_platform_id(
        &self,
        platform: Platform,
        platform_id: &str,
    ) -> impl Future<Output = anyhow::Result<Option<Creator>>> + Send;

    /// Inserts a creator, or returns the existing one for the same `(platform, platform_id)`.
    fn upsert_creator(
        &self,
        creator: &NewCreator,
    ) -> impl Future<Output = anyhow::Result<Creator>> + Send;

    fn update_creator_profile(
        &self,
        creator_id: Uuid,
        profile: &CreatorProfile,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;

    /// Inserts or refreshes an episode keyed by `(platform, platform_episode_id)`.
    /// The status is reset to `pending` and any previous error is cleared.
    fn upsert_episode(
        &self,
        episode: &NewEpisode,
    ) -> impl Future<Output = anyhow::Result<Uuid>> + Send;

    fn find_episode(
        &self,
        episode_id: Uuid,
    ) -> impl Future<Output = anyhow::Result<Option<EpisodeRecord>>> + Send;

    fn set_episode_status(
        &self,
        episode_id: Uuid,
        status: EpisodeStatus,
        error_message: Option<&str>,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;

    /// Episodes of a creator, most recently published first.
    fn list_episodes(
        &self,
        creator_id: Uuid,
    ) -> impl Future<Output = anyhow::Result<Vec<Episode>>> + Send;

    /// Inserts or overwrites the summary of `summary.episode_id`.
    fn upsert_summary(&self, summary: &Summary)
        -> impl Future<Output = anyhow::Result<()>> + Send;

    fn find_summary(
        &self,
        episode_id: Uuid,
    ) -> impl Future<Output = anyhow::Result<Option<Summary>>> + Send;
}

impl<T: DataStore + Send + Sync> DataStore for &T {
    async fn find_creator(&self, creator_id: Uuid) -> anyhow::Result<Option<Creator>> {
        (**self).find_creator(creator_id).await
    }

    async fn find_creator_by_platform_id(
        &self,
        platform: Platform,
        platform_id: &str,
    ) -> anyhow::Result<Option<Creator>> {
        (**self)
            .find_creator_by_platform_id(platform, platform_id)
            .await
    }

    async fn upsert_creator(&self, creator: &NewCreator) -> anyhow::Result<Creator> {
        (**self).upsert_creator(creator).await
    }

    async fn update_creator_profile(
        &self,
        creator_id: Uuid,
        profile: &CreatorProfile,
    ) -> anyhow::Result<()> {
        (**self).update_creator_profile(creator_id, profile).await
    }

    async fn upsert_episode(&self, episode: &NewEpisode) -> anyhow::Result<Uuid> {
        (**self).upsert_episode(episode).await
    }

    async fn find_episode(&self, episode_id: Uuid) -> anyhow::Result<Option<EpisodeRecord>> {
        (**self).find_episode(episode_id).await
    }

    async fn set_episode_status(
        &self,
        episode_id: Uuid,
        status: EpisodeStatus,
        error_message: Option<&str>,
    ) -> anyhow::Result<()> {
        (**self)
            .set_episode_status(episode_id, status, error_message)
            .await
    }

    async fn list_episodes(&self, creator_id: Uuid) -> anyhow::Result<Vec<Episode>> {
        (**self).list_episodes(creator_id).await
    }

    async fn upsert_summary(&self, summary: &Summary) -> anyhow::Result<()> {
        (**self).upsert_summary(summary).await
    }

    async fn find_summary(&self, episode_id: Uuid) -> anyhow::Result<Option<Summary>> {
        (**self).find_summary(episode_id).await
    }
}
