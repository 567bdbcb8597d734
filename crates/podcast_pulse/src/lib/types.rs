//! Shapes of the `__NEXT_DATA__` payload embedded in xiaoyuzhou pages, and the
//! normalized records extracted from them.
//!
//! Every field is optional: the site changes its payload without notice and a
//! missing or mistyped field must never sink a whole entry. Fields of the wrong
//! shape read as absent.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPodcast {
    #[serde(default, deserialize_with = "lenient")]
    pub pid: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub image: Option<RawImage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawImage {
    #[serde(default, deserialize_with = "lenient")]
    pub pic_url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub small_pic_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEpisode {
    #[serde(default, deserialize_with = "lenient")]
    pub eid: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_seconds")]
    pub duration: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub pub_date: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub published_at: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub shownotes: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub enclosure: Option<RawEnclosure>,
    #[serde(default, deserialize_with = "lenient")]
    pub media: Option<RawMedia>,
    #[serde(default, deserialize_with = "lenient")]
    pub image: Option<RawImage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEnclosure {
    #[serde(default, deserialize_with = "lenient")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMedia {
    #[serde(default, deserialize_with = "lenient")]
    pub source: Option<RawEnclosure>,
}

/// Podcast metadata as returned to ingest callers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PodcastInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub avatar: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeInfo {
    pub id: String,
    pub title: String,
    pub duration: u32,
    pub published_at: DateTime<Utc>,
    pub audio_url: String,
    pub thumbnail_url: String,
    pub shownotes: String,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Seconds as a number or a numeric string.
fn lenient_seconds<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

/// First candidate that is present and not blank.
pub(crate) fn first_non_empty<'a>(
    candidates: impl IntoIterator<Item = Option<&'a str>>,
) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

impl RawImage {
    pub fn best_url(&self) -> Option<String> {
        first_non_empty([self.pic_url.as_deref(), self.small_pic_url.as_deref()])
    }
}

impl RawPodcast {
    pub fn into_info(self, fallback_id: &str) -> PodcastInfo {
        PodcastInfo {
            id: first_non_empty([self.pid.as_deref()]).unwrap_or_else(|| fallback_id.to_string()),
            name: first_non_empty([self.title.as_deref(), self.name.as_deref()])
                .unwrap_or_else(|| synthesized_name(fallback_id)),
            description: self.description.unwrap_or_default(),
            avatar: self
                .image
                .as_ref()
                .and_then(RawImage::best_url)
                .unwrap_or_default(),
        }
    }
}

impl RawEpisode {
    /// Normalizes a listing entry. Entries without an id cannot be keyed and are dropped.
    pub fn normalize(self, fallback_thumbnail: &str, now: DateTime<Utc>) -> Option<EpisodeInfo> {
        let id = first_non_empty([self.eid.as_deref()])?;

        let published_at = first_non_empty([self.pub_date.as_deref(), self.published_at.as_deref()])
            .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or(now);

        let audio_url = first_non_empty([
            self.enclosure.as_ref().and_then(|e| e.url.as_deref()),
            self.media
                .as_ref()
                .and_then(|m| m.source.as_ref())
                .and_then(|s| s.url.as_deref()),
        ])
        .unwrap_or_default();

        let thumbnail_url = self
            .image
            .as_ref()
            .and_then(RawImage::best_url)
            .unwrap_or_else(|| fallback_thumbnail.to_string());

        let duration = self
            .duration
            .filter(|d| d.is_finite() && *d > 0.0)
            .map(|d| d.round().min(u32::MAX as f64) as u32)
            .unwrap_or(0);

        Some(EpisodeInfo {
            title: self.title.unwrap_or_default(),
            shownotes: first_non_empty([self.shownotes.as_deref(), self.description.as_deref()])
                .unwrap_or_default(),
            id,
            duration,
            published_at,
            audio_url,
            thumbnail_url,
        })
    }
}

pub fn synthesized_name(podcast_id: &str) -> String {
    format!("播客 {podcast_id}")
}
