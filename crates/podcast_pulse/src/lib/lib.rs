pub mod api;
pub mod config;
mod error;
pub mod extract;
pub mod ingest;
mod llm;
pub mod parser;
mod processor;
pub mod progress;
pub mod tracing;
pub mod types;
pub mod xyz;

pub use error::Error;
pub use llm::{openai, prompt, reply};
pub use llm::{
    summarizer::{ProviderInfo, Summarizer, SummaryResponse},
    transcriber::{SkipTranscriber, Transcriber},
};
pub use processor::{
    builder::EpisodeProcessorBuilder, EpisodeDispatcher, EpisodeProcessor, ProcessOutcome,
    Transcript, MIN_TRANSCRIPT_CHARS, TRANSCRIPT_STORE_CHARS,
};
