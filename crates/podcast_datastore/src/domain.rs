use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Content platforms a creator can be subscribed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Xiaoyuzhou,
    Bilibili,
    Youtube,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Xiaoyuzhou => "xiaoyuzhou",
            Platform::Bilibili => "bilibili",
            Platform::Youtube => "youtube",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "xiaoyuzhou" => Ok(Platform::Xiaoyuzhou),
            "bilibili" => Ok(Platform::Bilibili),
            "youtube" => Ok(Platform::Youtube),
            other => Err(UnknownVariant {
                kind: "platform",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Processing state of an episode.
///
/// `Downloading` is reserved for an audio download stage and is never entered by the
/// current pipeline. `Completed` and `Failed` end a processing run; the only way out of
/// them is a re-arm back to `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EpisodeStatus {
    #[default]
    Pending,
    Downloading,
    Transcribing,
    Summarizing,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal episode status transition: {from} -> {to}")]
pub struct TransitionError {
    pub from: EpisodeStatus,
    pub to: EpisodeStatus,
}

impl EpisodeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EpisodeStatus::Pending => "pending",
            EpisodeStatus::Downloading => "downloading",
            EpisodeStatus::Transcribing => "transcribing",
            EpisodeStatus::Summarizing => "summarizing",
            EpisodeStatus::Completed => "completed",
            EpisodeStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, EpisodeStatus::Completed | EpisodeStatus::Failed)
    }

    /// The transition table.
    pub fn can_transition_to(&self, next: EpisodeStatus) -> bool {
        use EpisodeStatus::*;

        match (self, next) {
            (Pending, Downloading | Transcribing | Failed) => true,
            (Downloading, Transcribing | Failed) => true,
            (Transcribing, Summarizing | Failed) => true,
            (Summarizing, Completed | Failed) => true,
            // re-arm for reprocessing, including records left mid-step by a crash
            (Downloading | Transcribing | Summarizing | Completed | Failed, Pending) => true,
            _ => false,
        }
    }

    pub fn transition(self, next: EpisodeStatus) -> Result<EpisodeStatus, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError {
                from: self,
                to: next,
            })
        }
    }
}

impl fmt::Display for EpisodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EpisodeStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(EpisodeStatus::Pending),
            "downloading" => Ok(EpisodeStatus::Downloading),
            "transcribing" => Ok(EpisodeStatus::Transcribing),
            "summarizing" => Ok(EpisodeStatus::Summarizing),
            "completed" => Ok(EpisodeStatus::Completed),
            "failed" => Ok(EpisodeStatus::Failed),
            other => Err(UnknownVariant {
                kind: "episode status",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Creator {
    pub id: Uuid,
    pub platform: Platform,
    pub platform_id: String,
    pub name: String,
    pub avatar_url: Option<String>,
    pub homepage_url: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCreator {
    pub platform: Platform,
    pub platform_id: String,
    pub name: String,
    pub homepage_url: String,
}

/// Scraped metadata written back onto a creator after ingestion.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CreatorProfile {
    pub name: String,
    pub description: String,
    pub avatar_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Episode {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub platform: Platform,
    pub platform_episode_id: String,
    pub title: String,
    pub original_url: String,
    pub duration: Option<u32>,
    pub published_at: Option<DateTime<Utc>>,
    pub thumbnail_url: Option<String>,
    pub audio_url: Option<String>,
    pub status: EpisodeStatus,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Upsert payload keyed by `(platform, platform_episode_id)`.
#[derive(Debug, Clone)]
pub struct NewEpisode {
    pub creator_id: Uuid,
    pub platform: Platform,
    pub platform_episode_id: String,
    pub title: String,
    pub original_url: String,
    pub duration: u32,
    pub published_at: DateTime<Utc>,
    pub thumbnail_url: String,
    pub audio_url: String,
}

/// An episode together with the display name of the creator that owns it.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeRecord {
    pub episode: Episode,
    pub creator_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub episode_id: Uuid,
    pub transcript: String,
    pub summary: String,
    pub key_points: Vec<String>,
    pub keywords: Vec<String>,
    pub timestamps: Vec<Timestamp>,
}

/// A topic marker inside an episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamp {
    #[serde(deserialize_with = "deserialize_seconds")]
    pub time: u32,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub summary: String,
}

impl Timestamp {
    /// Renders the offset as `MM:SS`, or `H:MM:SS` past the first hour.
    pub fn clock(&self) -> String {
        let hours = self.time / 3600;
        let minutes = (self.time % 3600) / 60;
        let secs = self.time % 60;

        if hours > 0 {
            format!("{hours}:{minutes:02}:{secs:02}")
        } else {
            format!("{minutes:02}:{secs:02}")
        }
    }
}

/// Whether the markers are in non-decreasing time order.
pub fn is_chronological(timestamps: &[Timestamp]) -> bool {
    timestamps.windows(2).all(|w| w[0].time <= w[1].time)
}

// Models are loose with number formatting: accept ints, floats and numeric strings.
fn deserialize_seconds<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value = serde_json::Value::deserialize(deserializer)?;
    let seconds = match &value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| D::Error::custom(format!("invalid timestamp time: {value}")))?;

    Ok(seconds.max(0.0).round().min(u32::MAX as f64) as u32)
}
