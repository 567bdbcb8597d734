pub mod openai;
pub mod prompt;
pub mod reply;
pub mod summarizer;
pub mod transcriber;
