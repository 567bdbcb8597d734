use std::sync::{Arc, Mutex};

use podcast_pulse::{EpisodeDispatcher, Error, ProcessOutcome, ProviderInfo};
use uuid::Uuid;

/// Records dispatched ids; fails the ones at the given call positions.
#[derive(Clone, Default)]
pub struct RecordingDispatcher {
    pub calls: Arc<Mutex<Vec<Uuid>>>,
    pub fail_positions: Vec<usize>,
}

impl RecordingDispatcher {
    pub fn failing_at(positions: &[usize]) -> Self {
        Self {
            fail_positions: positions.to_vec(),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<Uuid> {
        self.calls.lock().unwrap().clone()
    }
}

fn mock_provider() -> ProviderInfo {
    ProviderInfo {
        base_url: "https://mock.ai/v1".to_string(),
        model: "mock-gpt".to_string(),
        key_configured: true,
    }
}

impl EpisodeDispatcher for RecordingDispatcher {
    fn provider(&self) -> ProviderInfo {
        mock_provider()
    }

    async fn dispatch(&self, episode_id: Uuid) -> ProcessOutcome {
        let position = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(episode_id);
            calls.len() - 1
        };

        if self.fail_positions.contains(&position) {
            ProcessOutcome::Failed {
                error: Error::UpstreamAi {
                    status: 500,
                    body: "boom".to_string(),
                },
                debug: mock_provider(),
            }
        } else {
            ProcessOutcome::Success { episode_id }
        }
    }
}
