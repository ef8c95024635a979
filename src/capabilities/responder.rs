use std::sync::Arc;

use tracing::{debug, warn};

use crate::capabilities::faq::AnswerMatcher;
use crate::llm::models::{ChatOptions, Message};
use crate::llm::LlmProvider;
use crate::session::ChatTurn;

pub const GENERIC_ANSWER: &str = "I’m not fully sure about that. Could you rephrase your question or provide a few more details? \
For urgent or severe symptoms, please contact a veterinarian.";

pub const APOLOGY_ANSWER: &str = "Sorry, I couldn’t process your request. Please try again.";

#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub answer: String,
    pub matched_question: String,
    pub score: f32,
}

impl Answer {
    fn fallback(answer: &str, score: f32) -> Self {
        Self {
            answer: answer.to_string(),
            matched_question: String::new(),
            score,
        }
    }
}

/// Picks an answer for a user question: a confident FAQ hit first, then the
/// LLM when one is configured, then a generic reply. Never fails.
pub struct ChatResponder {
    matcher: Arc<dyn AnswerMatcher>,
    llm: Option<Arc<dyn LlmProvider>>,
    min_score: f32,
    history_window: usize,
    system_prompt: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl ChatResponder {
    pub fn new(matcher: Arc<dyn AnswerMatcher>, min_score: f32) -> Self {
        Self {
            matcher,
            llm: None,
            min_score,
            history_window: 6,
            system_prompt: String::new(),
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_llm(
        mut self,
        llm: Arc<dyn LlmProvider>,
        system_prompt: impl Into<String>,
        history_window: usize,
    ) -> Self {
        self.llm = Some(llm);
        self.system_prompt = system_prompt.into();
        self.history_window = history_window;
        self
    }

    pub fn with_sampling(mut self, temperature: Option<f32>, max_tokens: Option<u32>) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    pub async fn answer(&self, question: &str, history: &[ChatTurn], location: Option<&str>) -> Answer {
        let best = match self.matcher.best_match(question) {
            Ok(best) => best,
            Err(e) => {
                warn!("FAQ matcher failed: {}", e);
                return Answer::fallback(APOLOGY_ANSWER, 0.0);
            }
        };
        let best_score = best.as_ref().map_or(0.0, |m| m.score);

        if let Some(hit) = best.filter(|m| m.score >= self.min_score) {
            debug!("FAQ hit '{}' ({:.3})", hit.question, hit.score);
            return Answer {
                answer: hit.answer,
                matched_question: hit.question,
                score: hit.score,
            };
        }

        let Some(llm) = &self.llm else {
            return Answer::fallback(GENERIC_ANSWER, best_score);
        };

        let messages = self.build_messages(question, history, location);
        let options = ChatOptions {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            system_prompt: Some(self.system_prompt.clone()),
        };
        match llm.chat(&messages, options).await {
            Ok(response) if !response.content.is_empty() => {
                debug!("Answered by {} ({})", llm.name(), response.model);
                Answer::fallback(&response.content, best_score)
            }
            Ok(_) => {
                warn!("{} returned an empty answer", llm.name());
                Answer::fallback(APOLOGY_ANSWER, 0.0)
            }
            Err(e) => {
                warn!("{} failed to answer: {}", llm.name(), e);
                Answer::fallback(APOLOGY_ANSWER, 0.0)
            }
        }
    }

    /// Recent turns mapped onto chat-completion roles, then the question
    /// itself with the location appended.
    fn build_messages(&self, question: &str, history: &[ChatTurn], location: Option<&str>) -> Vec<Message> {
        let start = history.len().saturating_sub(self.history_window);
        let mut messages: Vec<Message> = history[start..]
            .iter()
            .filter_map(|turn| {
                let text = turn.text()?;
                let role = match turn.role() {
                    Some("bot") | Some("assistant") => "assistant",
                    _ => "user",
                };
                Some(Message::new(role, text))
            })
            .collect();

        let mut content = question.to_string();
        if let Some(location) = location {
            content.push_str(&format!("\n(Location: {})", location));
        }
        messages.push(Message::new("user", content));
        messages
    }
}
