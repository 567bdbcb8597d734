use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::{migrate::Migrator, postgres::PgPoolOptions, types::Json, PgPool};
use uuid::Uuid;

use crate::{
    datastore::DataStore,
    domain::{
        Creator, CreatorProfile, Episode, EpisodeRecord, EpisodeStatus, NewCreator, NewEpisode,
        Platform, Summary, Timestamp,
    },
};

static MIGRATOR: Migrator = sqlx::migrate!();

const EPISODE_COLUMNS: &str = r#"
    e.id, e.creator_id, e.platform, e.platform_episode_id, e.title, e.original_url,
    e.duration, e.published_at, e.thumbnail_url, e.audio_url, e.status, e.error_message,
    e.created_at, c.name AS creator_name
"#;

#[derive(Debug, Clone)]
pub struct PgDataStore {
    pub pool: PgPool,
}

impl PgDataStore {
    /// Establish connection to database and bring the schema up to date
    pub async fn init(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .inspect_err(
                |e| tracing::error!(error = ?e, "Failed to establish connection to database"),
            )
            .context("Failed to connect to postgres database")?;

        MIGRATOR
            .run(&pool)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to run database migrations"))
            .context("Failed to run database migrations")?;

        Ok(PgDataStore { pool })
    }
}

#[derive(sqlx::FromRow)]
struct CreatorRow {
    id: Uuid,
    platform: String,
    platform_id: String,
    name: String,
    avatar_url: Option<String>,
    homepage_url: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<CreatorRow> for Creator {
    type Error = anyhow::Error;

    fn try_from(row: CreatorRow) -> Result<Self, Self::Error> {
        Ok(Creator {
            id: row.id,
            platform: row.platform.parse()?,
            platform_id: row.platform_id,
            name: row.name,
            avatar_url: row.avatar_url,
            homepage_url: row.homepage_url,
            description: row.description,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct EpisodeRow {
    id: Uuid,
    creator_id: Uuid,
    platform: String,
    platform_episode_id: String,
    title: String,
    original_url: String,
    duration: Option<i32>,
    published_at: Option<DateTime<Utc>>,
    thumbnail_url: Option<String>,
    audio_url: Option<String>,
    status: String,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
    creator_name: Option<String>,
}

impl TryFrom<EpisodeRow> for EpisodeRecord {
    type Error = anyhow::Error;

    fn try_from(row: EpisodeRow) -> Result<Self, Self::Error> {
        let episode = Episode {
            id: row.id,
            creator_id: row.creator_id,
            platform: row.platform.parse()?,
            platform_episode_id: row.platform_episode_id,
            title: row.title,
            original_url: row.original_url,
            duration: row.duration.map(|d| d.max(0) as u32),
            published_at: row.published_at,
            thumbnail_url: row.thumbnail_url,
            audio_url: row.audio_url,
            status: row
                .status
                .parse::<EpisodeStatus>()
                .with_context(|| format!("Corrupt status on episode {}", row.id))?,
            error_message: row.error_message,
            created_at: row.created_at,
        };

        Ok(EpisodeRecord {
            episode,
            creator_name: row.creator_name,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SummaryRow {
    episode_id: Uuid,
    transcript: Option<String>,
    summary: Option<String>,
    key_points: Vec<String>,
    keywords: Vec<String>,
    timestamps: Json<Vec<Timestamp>>,
}

impl From<SummaryRow> for Summary {
    fn from(row: SummaryRow) -> Self {
        Summary {
            episode_id: row.episode_id,
            transcript: row.transcript.unwrap_or_default(),
            summary: row.summary.unwrap_or_default(),
            key_points: row.key_points,
            keywords: row.keywords,
            timestamps: row.timestamps.0,
        }
    }
}

impl DataStore for PgDataStore {
    async fn find_creator(&self, creator_id: Uuid) -> anyhow::Result<Option<Creator>> {
        sqlx::query_as::<_, CreatorRow>("SELECT * FROM creators WHERE id = $1")
            .bind(creator_id)
            .fetch_optional(&self.pool)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, %creator_id, "Failed to fetch creator"))
            .context("Failed to fetch creator")?
            .map(Creator::try_from)
            .transpose()
    }

    async fn find_creator_by_platform_id(
        &self,
        platform: Platform,
        platform_id: &str,
    ) -> anyhow::Result<Option<Creator>> {
        sqlx::query_as::<_, CreatorRow>(
            "SELECT * FROM creators WHERE platform = $1 AND platform_id = $2",
        )
        .bind(platform.as_str())
        .bind(platform_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch creator by platform id")?
        .map(Creator::try_from)
        .transpose()
    }

    async fn upsert_creator(&self, creator: &NewCreator) -> anyhow::Result<Creator> {
        // the no-op update makes RETURNING yield the existing row on conflict
        let row = sqlx::query_as::<_, CreatorRow>(
            r#"
            INSERT INTO creators (id, platform, platform_id, name, homepage_url)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (platform, platform_id)
            DO UPDATE SET platform_id = EXCLUDED.platform_id
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(creator.platform.as_str())
        .bind(&creator.platform_id)
        .bind(&creator.name)
        .bind(&creator.homepage_url)
        .fetch_one(&self.pool)
        .await
        .inspect_err(|err| {
            tracing::error!(
                error = ?err,
                platform_id = %creator.platform_id,
                "Failed to upsert creator"
            )
        })
        .context("Failed to upsert creator")?;

        row.try_into()
    }

    async fn update_creator_profile(
        &self,
        creator_id: Uuid,
        profile: &CreatorProfile,
    ) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE creators SET name = $2, description = $3, avatar_url = $4 WHERE id = $1",
        )
        .bind(creator_id)
        .bind(&profile.name)
        .bind(&profile.description)
        .bind(&profile.avatar_url)
        .execute(&self.pool)
        .await
        .context("Failed to update creator profile")?;

        Ok(())
    }

    async fn upsert_episode(&self, episode: &NewEpisode) -> anyhow::Result<Uuid> {
        let (id,) = sqlx::query_as::<_, (Uuid,)>(
            r#"
            INSERT INTO episodes (
                id, creator_id, platform, platform_episode_id, title, original_url,
                duration, published_at, thumbnail_url, audio_url, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'pending')
            ON CONFLICT (platform, platform_episode_id)
            DO UPDATE SET
                creator_id = EXCLUDED.creator_id,
                title = EXCLUDED.title,
                original_url = EXCLUDED.original_url,
                duration = EXCLUDED.duration,
                published_at = EXCLUDED.published_at,
                thumbnail_url = EXCLUDED.thumbnail_url,
                audio_url = EXCLUDED.audio_url,
                status = 'pending',
                error_message = NULL
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(episode.creator_id)
        .bind(episode.platform.as_str())
        .bind(&episode.platform_episode_id)
        .bind(&episode.title)
        .bind(&episode.original_url)
        .bind(i32::try_from(episode.duration).unwrap_or(i32::MAX))
        .bind(episode.published_at)
        .bind(&episode.thumbnail_url)
        .bind(&episode.audio_url)
        .fetch_one(&self.pool)
        .await
        .inspect_err(|err| {
            tracing::error!(
                error = ?err,
                platform_episode_id = %episode.platform_episode_id,
                "Failed to upsert episode"
            )
        })
        .context("Failed to upsert episode")?;

        Ok(id)
    }

    async fn find_episode(&self, episode_id: Uuid) -> anyhow::Result<Option<EpisodeRecord>> {
        let query = format!(
            "SELECT {EPISODE_COLUMNS} FROM episodes e \
             LEFT JOIN creators c ON c.id = e.creator_id WHERE e.id = $1"
        );

        sqlx::query_as::<_, EpisodeRow>(&query)
            .bind(episode_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch episode")?
            .map(EpisodeRecord::try_from)
            .transpose()
    }

    async fn set_episode_status(
        &self,
        episode_id: Uuid,
        status: EpisodeStatus,
        error_message: Option<&str>,
    ) -> anyhow::Result<()> {
        sqlx::query("UPDATE episodes SET status = $2, error_message = $3 WHERE id = $1")
            .bind(episode_id)
            .bind(status.as_str())
            .bind(error_message)
            .execute(&self.pool)
            .await
            .inspect_err(|err| {
                tracing::error!(
                    error = ?err,
                    %episode_id,
                    %status,
                    "Failed to update episode status"
                )
            })
            .context("Failed to update episode status")?;

        Ok(())
    }

    async fn list_episodes(&self, creator_id: Uuid) -> anyhow::Result<Vec<Episode>> {
        let query = format!(
            "SELECT {EPISODE_COLUMNS} FROM episodes e \
             LEFT JOIN creators c ON c.id = e.creator_id \
             WHERE e.creator_id = $1 ORDER BY e.published_at DESC NULLS LAST"
        );

        sqlx::query_as::<_, EpisodeRow>(&query)
            .bind(creator_id)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list episodes")?
            .into_iter()
            .map(|row| EpisodeRecord::try_from(row).map(|record| record.episode))
            .collect()
    }

    async fn upsert_summary(&self, summary: &Summary) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO summaries (id, episode_id, transcript, summary, key_points, keywords, timestamps)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (episode_id)
            DO UPDATE SET
                transcript = EXCLUDED.transcript,
                summary = EXCLUDED.summary,
                key_points = EXCLUDED.key_points,
                keywords = EXCLUDED.keywords,
                timestamps = EXCLUDED.timestamps,
                updated_at = now()
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(summary.episode_id)
        .bind(&summary.transcript)
        .bind(&summary.summary)
        .bind(&summary.key_points)
        .bind(&summary.keywords)
        .bind(Json(&summary.timestamps))
        .execute(&self.pool)
        .await
        .inspect_err(|err| {
            tracing::error!(
                error = ?err,
                episode_id = %summary.episode_id,
                "Failed to save summary"
            )
        })
        .context("Failed to save summary")?;

        Ok(())
    }

    async fn find_summary(&self, episode_id: Uuid) -> anyhow::Result<Option<Summary>> {
        let row = sqlx::query_as::<_, SummaryRow>(
            r#"
            SELECT episode_id, transcript, summary, key_points, keywords, timestamps
            FROM summaries WHERE episode_id = $1
            "#,
        )
        .bind(episode_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch summary")?;

        Ok(row.map(Summary::from))
    }
}
