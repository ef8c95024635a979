use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::{ChatTurn, ImageRecord};

#[derive(Debug, Deserialize, Default)]
pub struct StartSessionQuery {
    pub existing_session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct StartSessionResponse {
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub question: String,
    /// Free text or a `{latitude, longitude}` object.
    #[serde(default)]
    pub location: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ChatAnswer {
    pub answer: String,
    pub matched_question: String,
    pub score: f32,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ImageAnalysisResponse {
    pub image_id: String,
    pub breed: String,
    pub breed_confidence: f64,
    pub brightness: f64,
    pub clarity: f64,
    pub color_balance: f64,
    pub summary: String,
    pub nutrition_tips: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EndSessionResponse {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub chat_summary: Vec<ChatTurn>,
    pub image_analyses: Vec<ImageRecord>,
    pub report_url: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ReportResponse {
    pub session_id: String,
    pub report_url: String,
    pub chat_count: usize,
    pub image_count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}
