//! Prompt construction for episode summaries.

use std::sync::LazyLock;

use another_tiktoken_rs::CoreBPE;
use itertools::Itertools;
use regex::{Captures, Regex};

pub const TRANSCRIPT_PROMPT_CHARS: usize = 3000;
pub const DEFAULT_DURATION_SECS: u32 = 3600;
pub const UNKNOWN_CREATOR: &str = "未知";

/// Points in the episode, as percentages of its duration, seeded into the prompt as
/// formatting guidance for the `timestamps` field.
pub const ANCHOR_PERCENTAGES: [u32; 6] = [0, 10, 30, 50, 70, 90];

const EPISODE_SUMMARY_TEMPLATE: &str = include_str!("./prompts/episode_summary.txt");

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\{(\w+)\}\}").unwrap());

static CL100K: LazyLock<Option<CoreBPE>> = LazyLock::new(|| {
    another_tiktoken_rs::cl100k_base()
        .inspect_err(|e| tracing::warn!(error = %e, "Tokenizer unavailable"))
        .ok()
});

#[derive(Debug, Clone)]
pub struct PromptInput<'a> {
    pub title: &'a str,
    pub creator_name: Option<&'a str>,
    /// Episode length in seconds; missing or zero falls back to an hour.
    pub duration_secs: Option<u32>,
    pub transcript: &'a str,
}

impl PromptInput<'_> {
    pub fn effective_duration(&self) -> u32 {
        self.duration_secs
            .filter(|d| *d > 0)
            .unwrap_or(DEFAULT_DURATION_SECS)
    }
}

/// Seconds offsets for each of [`ANCHOR_PERCENTAGES`], rounded half up.
pub fn timestamp_anchors(duration_secs: u32) -> [u32; 6] {
    ANCHOR_PERCENTAGES.map(|pct| ((duration_secs as u64 * pct as u64 + 50) / 100) as u32)
}

/// Longest prefix of `text` holding at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Fills the template in a single pass, so substituted values are never re-scanned
/// for placeholders.
pub fn build_prompt(input: &PromptInput<'_>) -> String {
    let duration = input.effective_duration();
    let minutes = ((duration + 30) / 60).to_string();
    let anchors = timestamp_anchors(duration);
    let creator = input
        .creator_name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or(UNKNOWN_CREATOR);
    let transcript = truncate_chars(input.transcript, TRANSCRIPT_PROMPT_CHARS);

    PLACEHOLDER_RE
        .replace_all(EPISODE_SUMMARY_TEMPLATE, |caps: &Captures<'_>| match &caps[1] {
            "title" => input.title.to_string(),
            "creator" => creator.to_string(),
            "minutes" => minutes.clone(),
            "transcript" => transcript.to_string(),
            key => key
                .strip_prefix('t')
                .and_then(|pct| pct.parse::<u32>().ok())
                .and_then(|pct| ANCHOR_PERCENTAGES.iter().position(|p| *p == pct))
                .map(|i| anchors[i].to_string())
                .unwrap_or_else(|| caps[0].to_string()),
        })
        .into_owned()
}

/// Token count under the cl100k vocabulary, or `None` if the tokenizer fails to load.
pub fn count_tokens(text: &str) -> Option<usize> {
    CL100K
        .as_ref()
        .map(|bpe| bpe.encode_with_special_tokens(text).len())
}

/// Human readable anchor list, used in logs.
pub fn describe_anchors(anchors: &[u32]) -> String {
    anchors.iter().join(",")
}
