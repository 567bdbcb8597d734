use std::{fmt::Debug, future::Future};

/// Speech-to-text over an episode's remote audio.
///
/// `Ok(None)` means no transcription was performed.
pub trait Transcriber {
    type Error: Into<crate::Error> + Debug;

    fn transcribe(
        &self,
        audio_url: &str,
    ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send;
}

/// The shipped transcriber: no provider is wired up, so audio is never sent anywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipTranscriber;

impl Transcriber for SkipTranscriber {
    type Error = crate::Error;

    async fn transcribe(&self, audio_url: &str) -> Result<Option<String>, Self::Error> {
        tracing::info!(%audio_url, "Speech-to-text is not configured, skipping transcription");
        Ok(None)
    }
}
