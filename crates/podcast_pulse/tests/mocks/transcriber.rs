use std::sync::{Arc, Mutex};

use podcast_pulse::{Error, Transcriber};

#[derive(Clone, Default)]
pub struct MockTranscriber {
    pub text: Option<String>,
    pub calls: Arc<Mutex<Vec<String>>>,
    pub fail_with: Option<String>,
}

impl MockTranscriber {
    pub fn new(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            ..Default::default()
        }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Default::default()
        }
    }
}

impl Transcriber for MockTranscriber {
    type Error = Error;

    async fn transcribe(&self, audio_url: &str) -> Result<Option<String>, Self::Error> {
        self.calls.lock().unwrap().push(audio_url.to_string());
        if let Some(ref msg) = self.fail_with {
            return Err(Error::Configuration(msg.clone()));
        }
        Ok(self.text.clone())
    }
}
