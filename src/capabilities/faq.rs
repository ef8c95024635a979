use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::capabilities::CapabilityError;

#[derive(Debug, Clone, PartialEq)]
pub struct FaqMatch {
    pub question: String,
    pub answer: String,
    pub score: f32,
}

/// Finds the stored question closest to what the user asked.
pub trait AnswerMatcher: Send + Sync {
    /// Best candidate regardless of score, or `None` when there is nothing
    /// to compare against.
    fn best_match(&self, question: &str) -> Result<Option<FaqMatch>, CapabilityError>;
}

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "can", "do", "does", "for", "from", "how",
    "i", "if", "in", "is", "it", "my", "of", "on", "or", "should", "the", "to", "what", "when",
    "which", "why", "with", "you", "your",
];

struct Entry {
    question: String,
    answer: String,
    terms: HashMap<String, f32>,
    norm: f32,
}

/// Bag-of-words cosine similarity over a fixed question/answer set.
pub struct FaqMatcher {
    entries: Vec<Entry>,
}

impl FaqMatcher {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        let entries = pairs
            .into_iter()
            .map(|(question, answer)| {
                let terms = term_frequencies(&question);
                let norm = norm(&terms);
                Entry {
                    question,
                    answer,
                    terms,
                    norm,
                }
            })
            .collect();
        Self { entries }
    }

    /// Loads a JSON object mapping questions to answers. A missing file
    /// yields an empty matcher so the service still starts.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CapabilityError> {
        let path = path.as_ref();
        if !path.exists() {
            warn!("FAQ file {} not found, FAQ answers disabled", path.display());
            return Ok(Self::new(Vec::new()));
        }
        let raw = fs::read_to_string(path)
            .map_err(|e| CapabilityError::InvalidResponse(format!("FAQ read failed: {}", e)))?;
        let faq: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&raw)
            .map_err(|e| CapabilityError::InvalidResponse(format!("FAQ parse failed: {}", e)))?;

        let pairs: Vec<(String, String)> = faq
            .into_iter()
            .filter_map(|(q, a)| a.as_str().map(|a| (q, a.to_string())))
            .collect();
        info!("Loaded {} FAQ entries from {}", pairs.len(), path.display());
        Ok(Self::new(pairs))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl AnswerMatcher for FaqMatcher {
    fn best_match(&self, question: &str) -> Result<Option<FaqMatch>, CapabilityError> {
        let query = term_frequencies(question);
        let query_norm = norm(&query);

        let best = self
            .entries
            .iter()
            .map(|entry| {
                let score = if query_norm == 0.0 || entry.norm == 0.0 {
                    0.0
                } else {
                    let dot: f32 = query
                        .iter()
                        .filter_map(|(term, w)| entry.terms.get(term).map(|v| v * w))
                        .sum();
                    dot / (query_norm * entry.norm)
                };
                (entry, score)
            })
            .max_by(|a, b| a.1.total_cmp(&b.1));

        Ok(best.map(|(entry, score)| FaqMatch {
            question: entry.question.clone(),
            answer: entry.answer.clone(),
            score,
        }))
    }
}

fn term_frequencies(text: &str) -> HashMap<String, f32> {
    let mut terms = HashMap::new();
    for token in text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty() && !STOPWORDS.contains(t))
    {
        *terms.entry(normalize_plural(token)).or_insert(0.0) += 1.0;
    }
    terms
}

fn normalize_plural(token: &str) -> String {
    if token.len() > 3 && token.ends_with('s') && !token.ends_with("ss") {
        token[..token.len() - 1].to_string()
    } else {
        token.to_string()
    }
}

fn norm(terms: &HashMap<String, f32>) -> f32 {
    terms.values().map(|v| v * v).sum::<f32>().sqrt()
}
