//! Per-request document context: cleaned text split into chunks.

use std::collections::HashSet;

use tracing::debug;

use super::summarize::{ModelUnavailable, Summarizer, SummaryMode};

pub const DEFAULT_CHUNK_SIZE: usize = 2000;
const TOP_K: usize = 3;

#[derive(Debug, Clone)]
pub struct DocumentSession {
    text: String,
    chunks: Vec<String>,
}

/// Collapses whitespace and drops control characters.
pub fn clean_text(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| word.chars().filter(|c| !c.is_control()).collect::<String>())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Splits on word boundaries into chunks of at most `size` chars. A single
/// word longer than `size` becomes its own chunk.
pub fn chunk_text(text: &str, size: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut len = 0;
    for word in text.split_whitespace() {
        let word_len = word.chars().count() + 1;
        if len + word_len > size && !current.is_empty() {
            chunks.push(current.join(" "));
            current.clear();
            len = 0;
        }
        current.push(word);
        len += word_len;
    }
    if !current.is_empty() {
        chunks.push(current.join(" "));
    }
    chunks
}

fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() > 2)
        .map(str::to_lowercase)
        .collect()
}

impl DocumentSession {
    pub fn new(raw: &str, chunk_size: usize) -> Self {
        let text = clean_text(raw);
        let chunks = chunk_text(&text, chunk_size.max(1));
        debug!(chars = text.len(), chunks = chunks.len(), "document session ready");
        Self { text, chunks }
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Summarizes every chunk, then the joined partial summaries.
    pub async fn summarize(
        &self,
        summarizer: &dyn Summarizer,
        mode: SummaryMode,
    ) -> Result<String, ModelUnavailable> {
        match self.chunks.as_slice() {
            [] => Err(ModelUnavailable("nothing to summarize".into())),
            [only] => summarizer.summarize(only, mode).await,
            many => {
                let mut partials = Vec::with_capacity(many.len());
                for chunk in many {
                    partials.push(summarizer.summarize(chunk, mode).await?);
                }
                summarizer.summarize(&partials.join("\n"), mode).await
            }
        }
    }

    /// Chunks ranked by how many question terms they share, best first.
    /// Ties keep document order.
    pub fn relevant_chunks(&self, question: &str) -> Vec<&str> {
        let wanted = terms(question);
        let mut scored: Vec<(usize, usize)> = self
            .chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| (i, terms(chunk).intersection(&wanted).count()))
            .collect();
        scored.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        scored
            .into_iter()
            .take(TOP_K)
            .map(|(i, _)| self.chunks[i].as_str())
            .collect()
    }

    pub async fn ask(
        &self,
        summarizer: &dyn Summarizer,
        question: &str,
    ) -> Result<(String, usize), ModelUnavailable> {
        let picked = self.relevant_chunks(question);
        let used = picked.len();
        let answer = summarizer.answer(&picked.join("\n\n"), question).await?;
        Ok((answer, used))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::summarize::ScriptedSummarizer;

    #[test]
    fn cleaning_collapses_whitespace() {
        assert_eq!(clean_text("  Hb\t13.2 \n\n g/dL\u{7}  "), "Hb 13.2 g/dL");
    }

    #[test]
    fn chunks_respect_word_boundaries() {
        let chunks = chunk_text("alpha beta gamma delta", 12);
        assert_eq!(chunks, vec!["alpha beta", "gamma delta"]);
        assert!(chunk_text("", 10).is_empty());
        assert_eq!(chunk_text("supercalifragilistic", 5), vec!["supercalifragilistic"]);
    }

    #[test]
    fn ranking_prefers_overlapping_chunks() {
        let session = DocumentSession::new(
            "cholesterol normal range today. patient sleeps well nightly. \
             glucose fasting elevated sugar. blood pressure stable reading.",
            32,
        );
        assert!(session.chunks().len() >= 4);
        let top = session.relevant_chunks("Is the fasting glucose elevated?");
        assert_eq!(top.len(), 3);
        assert!(top[0].contains("glucose"));
    }

    #[tokio::test]
    async fn long_text_is_summarized_in_two_passes() {
        let summarizer = ScriptedSummarizer::default();
        let session = DocumentSession::new("one two three four five six", 12);
        assert_eq!(session.chunks().len(), 3);

        let summary = session
            .summarize(&summarizer, SummaryMode::Short)
            .await
            .unwrap();
        assert!(summary.starts_with("short: "));
        assert_eq!(summarizer.calls().len(), 4);
    }

    #[tokio::test]
    async fn single_chunk_is_summarized_once() {
        let summarizer = ScriptedSummarizer::default();
        let session = DocumentSession::new("short note", DEFAULT_CHUNK_SIZE);
        session
            .summarize(&summarizer, SummaryMode::Medium)
            .await
            .unwrap();
        assert_eq!(summarizer.calls(), vec!["short note".to_string()]);
    }
}
