//! External capability seams and their default providers.

pub mod enrichment;
pub mod faq;
pub mod quality;
pub mod responder;
pub mod vision;

use thiserror::Error;

pub use enrichment::{Enricher, LocationAdvisor, NutrientAdvisor};
pub use faq::{AnswerMatcher, FaqMatch, FaqMatcher};
pub use quality::{QualityAnalyzer, QualityReport};
pub use responder::{Answer, ChatResponder};
pub use vision::{DogDetection, HttpImageClassifier, ImageClassifier, Prediction, UnconfiguredClassifier};

#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("Network Error: {0}")]
    Network(String),
    #[error("API Error: {0}")]
    Api(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("{0} is not configured")]
    Unavailable(String),
}
