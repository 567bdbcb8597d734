use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use chrono::Utc;
use podcast_datastore::{
    Creator, CreatorProfile, DataStore, Episode, EpisodeRecord, EpisodeStatus, NewCreator,
    NewEpisode, Platform, Summary,
};
use uuid::Uuid;

#[derive(Default)]
pub struct State {
    pub creators: Vec<Creator>,
    pub episodes: Vec<Episode>,
    pub summaries: HashMap<Uuid, Summary>,
    /// Every status write, in order.
    pub status_history: Vec<(Uuid, EpisodeStatus, Option<String>)>,
    pub summary_writes: usize,
}

/// In-memory store with the same upsert keys as the postgres schema.
/// Clones share state.
#[derive(Clone, Default)]
pub struct MockDataStore {
    pub state: Arc<Mutex<State>>,
    pub fail_summary_with: Option<String>,
    pub fail_profile_with: Option<String>,
    pub fail_episode_upsert_for: Option<String>,
}

impl MockDataStore {
    pub fn with_creator(platform_id: &str) -> (Self, Uuid) {
        let store = Self::default();
        let id = Uuid::new_v4();
        store.state.lock().unwrap().creators.push(Creator {
            id,
            platform: Platform::Xiaoyuzhou,
            platform_id: platform_id.to_string(),
            name: format!("播客 {platform_id}..."),
            avatar_url: None,
            homepage_url: format!("https://www.xiaoyuzhoufm.com/podcast/{platform_id}"),
            description: None,
            created_at: Utc::now(),
        });
        (store, id)
    }

    pub fn failing_summaries(mut self, msg: &str) -> Self {
        self.fail_summary_with = Some(msg.to_string());
        self
    }

    pub fn failing_profile_updates(mut self, msg: &str) -> Self {
        self.fail_profile_with = Some(msg.to_string());
        self
    }

    pub fn failing_episode_upsert(mut self, platform_episode_id: &str) -> Self {
        self.fail_episode_upsert_for = Some(platform_episode_id.to_string());
        self
    }

    pub fn creator(&self, id: Uuid) -> Option<Creator> {
        self.state
            .lock()
            .unwrap()
            .creators
            .iter()
            .find(|c| c.id == id)
            .cloned()
    }

    pub fn episodes(&self) -> Vec<Episode> {
        self.state.lock().unwrap().episodes.clone()
    }

    pub fn episode(&self, id: Uuid) -> Option<Episode> {
        self.episodes().into_iter().find(|e| e.id == id)
    }

    pub fn summary(&self, episode_id: Uuid) -> Option<Summary> {
        self.state
            .lock()
            .unwrap()
            .summaries
            .get(&episode_id)
            .cloned()
    }

    pub fn statuses_of(&self, episode_id: Uuid) -> Vec<EpisodeStatus> {
        self.state
            .lock()
            .unwrap()
            .status_history
            .iter()
            .filter(|(id, ..)| *id == episode_id)
            .map(|(_, status, _)| *status)
            .collect()
    }

    /// Inserts an episode directly, bypassing ingestion.
    pub fn seed_episode(&self, creator_id: Uuid, platform_episode_id: &str, title: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.state.lock().unwrap().episodes.push(Episode {
            id,
            creator_id,
            platform: Platform::Xiaoyuzhou,
            platform_episode_id: platform_episode_id.to_string(),
            title: title.to_string(),
            original_url: format!("https://xyz.mock/episode/{platform_episode_id}"),
            duration: Some(1800),
            published_at: Some(Utc::now()),
            thumbnail_url: None,
            audio_url: None,
            status: EpisodeStatus::Pending,
            error_message: None,
            created_at: Utc::now(),
        });
        id
    }

    pub fn update_episode(&self, id: Uuid, f: impl FnOnce(&mut Episode)) {
        let mut state = self.state.lock().unwrap();
        if let Some(episode) = state.episodes.iter_mut().find(|e| e.id == id) {
            f(episode);
        }
    }
}

impl DataStore for MockDataStore {
    async fn find_creator(&self, creator_id: Uuid) -> anyhow::Result<Option<Creator>> {
        Ok(self.creator(creator_id))
    }

    async fn find_creator_by_platform_id(
        &self,
        platform: Platform,
        platform_id: &str,
    ) -> anyhow::Result<Option<Creator>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .creators
            .iter()
            .find(|c| c.platform == platform && c.platform_id == platform_id)
            .cloned())
    }

    async fn upsert_creator(&self, creator: &NewCreator) -> anyhow::Result<Creator> {
        let mut state = self.state.lock().unwrap();
        if let Some(existing) = state
            .creators
            .iter()
            .find(|c| c.platform == creator.platform && c.platform_id == creator.platform_id)
        {
            return Ok(existing.clone());
        }

        let created = Creator {
            id: Uuid::new_v4(),
            platform: creator.platform,
            platform_id: creator.platform_id.clone(),
            name: creator.name.clone(),
            avatar_url: None,
            homepage_url: creator.homepage_url.clone(),
            description: None,
            created_at: Utc::now(),
        };
        state.creators.push(created.clone());
        Ok(created)
    }

    async fn update_creator_profile(
        &self,
        creator_id: Uuid,
        profile: &CreatorProfile,
    ) -> anyhow::Result<()> {
        if let Some(ref msg) = self.fail_profile_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        let mut state = self.state.lock().unwrap();
        if let Some(creator) = state.creators.iter_mut().find(|c| c.id == creator_id) {
            creator.name = profile.name.clone();
            creator.description = Some(profile.description.clone());
            creator.avatar_url = Some(profile.avatar_url.clone());
        }
        Ok(())
    }

    async fn upsert_episode(&self, episode: &NewEpisode) -> anyhow::Result<Uuid> {
        if self.fail_episode_upsert_for.as_deref() == Some(episode.platform_episode_id.as_str()) {
            return Err(anyhow::anyhow!("constraint violation"));
        }

        let mut state = self.state.lock().unwrap();
        if let Some(existing) = state.episodes.iter_mut().find(|e| {
            e.platform == episode.platform && e.platform_episode_id == episode.platform_episode_id
        }) {
            existing.creator_id = episode.creator_id;
            existing.title = episode.title.clone();
            existing.original_url = episode.original_url.clone();
            existing.duration = Some(episode.duration);
            existing.published_at = Some(episode.published_at);
            existing.thumbnail_url = Some(episode.thumbnail_url.clone());
            existing.audio_url = Some(episode.audio_url.clone());
            existing.status = EpisodeStatus::Pending;
            existing.error_message = None;
            return Ok(existing.id);
        }

        let id = Uuid::new_v4();
        state.episodes.push(Episode {
            id,
            creator_id: episode.creator_id,
            platform: episode.platform,
            platform_episode_id: episode.platform_episode_id.clone(),
            title: episode.title.clone(),
            original_url: episode.original_url.clone(),
            duration: Some(episode.duration),
            published_at: Some(episode.published_at),
            thumbnail_url: Some(episode.thumbnail_url.clone()),
            audio_url: Some(episode.audio_url.clone()),
            status: EpisodeStatus::Pending,
            error_message: None,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn find_episode(&self, episode_id: Uuid) -> anyhow::Result<Option<EpisodeRecord>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .episodes
            .iter()
            .find(|e| e.id == episode_id)
            .map(|episode| EpisodeRecord {
                creator_name: state
                    .creators
                    .iter()
                    .find(|c| c.id == episode.creator_id)
                    .map(|c| c.name.clone()),
                episode: episode.clone(),
            }))
    }

    async fn set_episode_status(
        &self,
        episode_id: Uuid,
        status: EpisodeStatus,
        error_message: Option<&str>,
    ) -> anyhow::Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(episode) = state.episodes.iter_mut().find(|e| e.id == episode_id) {
            episode.status = status;
            episode.error_message = error_message.map(str::to_string);
        }
        state
            .status_history
            .push((episode_id, status, error_message.map(str::to_string)));
        Ok(())
    }

    async fn list_episodes(&self, creator_id: Uuid) -> anyhow::Result<Vec<Episode>> {
        let mut episodes = self
            .episodes()
            .into_iter()
            .filter(|e| e.creator_id == creator_id)
            .collect::<Vec<_>>();
        episodes.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        Ok(episodes)
    }

    async fn upsert_summary(&self, summary: &Summary) -> anyhow::Result<()> {
        if let Some(ref msg) = self.fail_summary_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        let mut state = self.state.lock().unwrap();
        state.summary_writes += 1;
        state.summaries.insert(summary.episode_id, summary.clone());
        Ok(())
    }

    async fn find_summary(&self, episode_id: Uuid) -> anyhow::Result<Option<Summary>> {
        Ok(self.summary(episode_id))
    }
}
