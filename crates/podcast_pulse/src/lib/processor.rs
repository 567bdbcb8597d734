pub mod builder;

use std::{future::Future, sync::Arc};

use podcast_datastore::{is_chronological, DataStore, EpisodeRecord, EpisodeStatus, Summary};
use uuid::Uuid;

use crate::{
    error::Error,
    extract::ExtractionChain,
    llm::{
        prompt::{
            build_prompt, count_tokens, describe_anchors, timestamp_anchors, truncate_chars,
            PromptInput,
        },
        reply::parse_reply,
        summarizer::ProviderInfo,
    },
    xyz::PageFetcher,
    Summarizer, Transcriber,
};

/// Texts shorter than this are not trusted as a transcript.
pub const MIN_TRANSCRIPT_CHARS: usize = 100;
pub const TRANSCRIPT_STORE_CHARS: usize = 10_000;

const UNKNOWN_CREATOR_FILLER: &str = "未知播主";
const ASR_SKIPPED_MARKER: &str = "(音频转写未执行) ";
const ASR_FAILED_MARKER: &str = "(音频转写失败) ";

/// Text the summary is generated from, plus whether it came from a real source.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub text: String,
    pub low_confidence: bool,
}

impl Transcript {
    fn filler(title: &str, creator_name: Option<&str>) -> Self {
        let creator = creator_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(UNKNOWN_CREATOR_FILLER);

        Transcript {
            text: format!(
                "播客标题: {title}\n\n这是一期来自 {creator} 的播客内容。由于暂时无法获取完整的语音转录，系统将基于已有信息生成摘要。"
            ),
            low_confidence: true,
        }
    }
}

/// Result of a processing run, as reported to callers.
#[derive(Debug)]
pub enum ProcessOutcome {
    Success { episode_id: Uuid },
    Failed { error: Error, debug: ProviderInfo },
}

impl ProcessOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ProcessOutcome::Success { .. })
    }
}

/// Where ingestion hands episodes off for processing.
pub trait EpisodeDispatcher {
    /// The AI endpoint behind processing, reported alongside any processing error.
    fn provider(&self) -> ProviderInfo;

    fn dispatch(&self, episode_id: Uuid) -> impl Future<Output = ProcessOutcome> + Send;
}

/// Turns a pending episode into a stored summary.
#[derive(Debug)]
pub struct EpisodeProcessor<D, F, S, T>
where
    D: DataStore + Send + Sync + 'static,
    F: PageFetcher + Send + Sync + 'static,
    S: Summarizer + Send + Sync + 'static,
    T: Transcriber + Send + Sync + 'static,
{
    store: D,
    page_fetcher: F,
    summarizer: S,
    transcriber: T,
    extraction: ExtractionChain,
}

impl<D, F, S, T> EpisodeProcessor<D, F, S, T>
where
    D: DataStore + Send + Sync + 'static,
    F: PageFetcher + Send + Sync + 'static,
    S: Summarizer + Send + Sync + 'static,
    T: Transcriber + Send + Sync + 'static,
{
    pub fn provider(&self) -> ProviderInfo {
        self.summarizer.provider()
    }

    /// Validates and persists a status change before the work of that step begins.
    async fn advance(
        &self,
        episode_id: Uuid,
        current: EpisodeStatus,
        next: EpisodeStatus,
    ) -> Result<EpisodeStatus, Error> {
        let next = current.transition(next)?;
        self.store
            .set_episode_status(episode_id, next, None)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, status = %next, "Failed to persist status"))?;
        tracing::debug!(from = %current, to = %next, "Episode status changed");
        Ok(next)
    }

    /// Shownotes scraped from the episode page stand in for a transcript.
    #[tracing::instrument(skip_all, fields(url = %record.episode.original_url))]
    async fn gather_transcript(&self, record: &EpisodeRecord) -> Transcript {
        let scraped = match self
            .page_fetcher
            .fetch_page(&record.episode.original_url)
            .await
        {
            Ok(doc) => self.extraction.shownotes(&doc),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch episode page");
                None
            }
        };

        match scraped {
            Some(text) if text.chars().count() >= MIN_TRANSCRIPT_CHARS => Transcript {
                text,
                low_confidence: false,
            },
            other => {
                tracing::info!(
                    scraped_chars = other.as_deref().map(|t| t.chars().count()).unwrap_or(0),
                    "Scraped text too short, using filler transcript"
                );
                Transcript::filler(&record.episode.title, record.creator_name.as_deref())
            }
        }
    }

    /// Speech-to-text hook for low-confidence transcripts of episodes with audio.
    #[tracing::instrument(skip_all)]
    async fn transcribe_audio(&self, record: &EpisodeRecord, transcript: Transcript) -> Transcript {
        let audio_url = match record.episode.audio_url.as_deref() {
            Some(url) if transcript.low_confidence && !url.trim().is_empty() => url,
            _ => return transcript,
        };

        match self.transcriber.transcribe(audio_url).await {
            Ok(Some(text)) if !text.trim().is_empty() => Transcript {
                text,
                low_confidence: false,
            },
            Ok(_) => Transcript {
                text: format!(
                    "{ASR_SKIPPED_MARKER}标题: {}。 描述: {}",
                    record.episode.title, transcript.text
                ),
                low_confidence: true,
            },
            Err(e) => {
                tracing::error!(error = ?e, "Transcription failed");
                Transcript {
                    text: format!("{ASR_FAILED_MARKER}{}", transcript.text),
                    low_confidence: true,
                }
            }
        }
    }

    fn prompt_for(&self, record: &EpisodeRecord, transcript: &Transcript) -> Result<String, Error> {
        let input = PromptInput {
            title: &record.episode.title,
            creator_name: record.creator_name.as_deref(),
            duration_secs: record.episode.duration,
            transcript: &transcript.text,
        };
        let prompt = build_prompt(&input);

        let anchors = timestamp_anchors(input.effective_duration());
        match count_tokens(&prompt) {
            Some(tokens) if tokens > S::CONTEXT_WINDOW_LIMIT => {
                return Err(Error::Configuration(format!(
                    "Prompt of {tokens} tokens exceeds the context window of {}",
                    S::CONTEXT_WINDOW_LIMIT
                )));
            }
            tokens => tracing::debug!(
                ?tokens,
                anchors = %describe_anchors(&anchors),
                "Built summary prompt"
            ),
        }

        Ok(prompt)
    }

    /// Runs the full pipeline for one episode. Errors leave the status where the
    /// failing step put it; [`Self::run`] handles the failure transition.
    #[tracing::instrument(skip(self))]
    pub async fn process(&self, episode_id: Uuid) -> Result<(), Error> {
        let record = self
            .store
            .find_episode(episode_id)
            .await?
            .ok_or_else(|| Error::not_found("episode", episode_id))?;

        let mut status = record.episode.status;
        if status != EpisodeStatus::Pending {
            tracing::info!(%status, "Re-arming episode for reprocessing");
            status = self
                .advance(episode_id, status, EpisodeStatus::Pending)
                .await?;
        }

        status = self
            .advance(episode_id, status, EpisodeStatus::Transcribing)
            .await?;
        let transcript = self.gather_transcript(&record).await;

        status = self
            .advance(episode_id, status, EpisodeStatus::Summarizing)
            .await?;
        let transcript = self.transcribe_audio(&record, transcript).await;

        let prompt = self.prompt_for(&record, &transcript)?;
        let reply = self
            .summarizer
            .summarize(&prompt)
            .await
            .map_err(Into::<Error>::into)?;

        let payload = parse_reply(&reply.content);
        if !is_chronological(&payload.timestamps) {
            tracing::warn!("Model returned timestamps out of order");
        }

        self.store
            .upsert_summary(&Summary {
                episode_id,
                transcript: truncate_chars(&transcript.text, TRANSCRIPT_STORE_CHARS).to_string(),
                summary: payload.summary,
                key_points: payload.key_points,
                keywords: payload.keywords,
                timestamps: payload.timestamps,
            })
            .await
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to save summary"))?;

        self.advance(episode_id, status, EpisodeStatus::Completed)
            .await?;
        tracing::info!(low_confidence = transcript.low_confidence, "Episode processed");

        Ok(())
    }

    /// [`Self::process`], with failures recorded on the episode and reported as an outcome.
    #[tracing::instrument(skip(self))]
    pub async fn run(&self, episode_id: Uuid) -> ProcessOutcome {
        let error = match self.process(episode_id).await {
            Ok(()) => return ProcessOutcome::Success { episode_id },
            Err(e) => e,
        };

        tracing::error!(error = %error, "Episode processing failed");

        // nothing was touched for these
        if !matches!(error, Error::NotFound { .. } | Error::InvalidRequest(_)) {
            let message = error.to_string();
            if let Err(e) = self
                .store
                .set_episode_status(episode_id, EpisodeStatus::Failed, Some(&message))
                .await
            {
                tracing::error!(error = ?e, "Failed to mark episode as failed");
            }
        }

        ProcessOutcome::Failed {
            error,
            debug: self.provider(),
        }
    }
}

impl<D, F, S, T> EpisodeDispatcher for EpisodeProcessor<D, F, S, T>
where
    D: DataStore + Send + Sync + 'static,
    F: PageFetcher + Send + Sync + 'static,
    S: Summarizer + Send + Sync + 'static,
    T: Transcriber + Send + Sync + 'static,
{
    fn provider(&self) -> ProviderInfo {
        EpisodeProcessor::provider(self)
    }

    async fn dispatch(&self, episode_id: Uuid) -> ProcessOutcome {
        self.run(episode_id).await
    }
}

impl<P: EpisodeDispatcher + Send + Sync> EpisodeDispatcher for Arc<P> {
    fn provider(&self) -> ProviderInfo {
        (**self).provider()
    }

    async fn dispatch(&self, episode_id: Uuid) -> ProcessOutcome {
        (**self).dispatch(episode_id).await
    }
}
