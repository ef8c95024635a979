use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

/// One entry of a session's chat history.
///
/// New turns are always written as `RoleText`. The other shapes exist so
/// snapshot files produced by older clients still load and render. Shapes
/// are recognized in order: a bare string, an object with a `question`
/// key, any other object. Anything else is kept as `Other`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChatTurn {
    Plain(String),
    QaPair { question: String, answer: String },
    RoleText { role: String, text: String },
    Other(Value),
}

impl<'de> Deserialize<'de> for ChatTurn {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(ChatTurn::from_value)
    }
}

/// Scalars print bare, everything else as compact JSON.
fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl ChatTurn {
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(text) => ChatTurn::Plain(text),
            Value::Object(map) => match map.get("question") {
                Some(question) => ChatTurn::QaPair {
                    question: display(question),
                    answer: map.get("answer").map(display).unwrap_or_default(),
                },
                None => ChatTurn::RoleText {
                    role: map
                        .get("role")
                        .map(display)
                        .unwrap_or_else(|| "Unknown".to_string()),
                    // `text` wins whenever present; `content` is the fallback.
                    text: map
                        .get("text")
                        .or_else(|| map.get("content"))
                        .map(display)
                        .unwrap_or_default(),
                },
            },
            other => ChatTurn::Other(other),
        }
    }

    pub fn new(role: impl Into<String>, text: impl Into<String>) -> Self {
        ChatTurn::RoleText {
            role: role.into(),
            text: text.into(),
        }
    }

    pub fn role(&self) -> Option<&str> {
        match self {
            ChatTurn::RoleText { role, .. } => Some(role),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            ChatTurn::RoleText { text, .. } => Some(text),
            ChatTurn::Plain(text) => Some(text),
            ChatTurn::QaPair { question, .. } => Some(question),
            ChatTurn::Other(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub breed: String,
    pub breed_confidence: f64,
    pub brightness: f64,
    pub clarity: f64,
    pub color_balance: f64,
    pub summary: String,
    pub nutrition_tips: String,
}

impl AnalysisResult {
    /// Field name/value pairs in declaration order, as shown in reports.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("breed", self.breed.clone()),
            ("breed_confidence", self.breed_confidence.to_string()),
            ("brightness", self.brightness.to_string()),
            ("clarity", self.clarity.to_string()),
            ("color_balance", self.color_balance.to_string()),
            ("summary", self.summary.clone()),
            ("nutrition_tips", self.nutrition_tips.clone()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub filename: String,
    pub analysis: AnalysisResult,
}

/// A live session as held by the store. Serializes to the snapshot layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub created_at: DateTime<Utc>,
    pub chat_history: Vec<ChatTurn>,
    pub image_history: Vec<ImageRecord>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            created_at: Utc::now(),
            chat_history: Vec::new(),
            image_history: Vec::new(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Session data as read back from disk.
///
/// Unlike [`Session`], nothing here is mandatory: whatever part of the file
/// is missing or malformed comes back empty.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionSnapshot {
    pub created_at: Option<DateTime<Utc>>,
    pub chat_history: Vec<ChatTurn>,
    pub image_history: Vec<ImageRecord>,
}

impl SessionSnapshot {
    pub fn from_value(value: Value) -> Self {
        let created_at = value
            .get("created_at")
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse::<DateTime<Utc>>().ok());

        let chat_history = match value.get("chat_history") {
            Some(Value::Array(items)) => items.iter().cloned().map(ChatTurn::from_value).collect(),
            _ => Vec::new(),
        };

        let image_history = match value.get("image_history") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| match serde_json::from_value(item.clone()) {
                    Ok(record) => Some(record),
                    Err(e) => {
                        warn!("Skipping malformed image record in snapshot: {}", e);
                        None
                    }
                })
                .collect(),
            _ => Vec::new(),
        };

        Self {
            created_at,
            chat_history,
            image_history,
        }
    }
}

impl From<Session> for SessionSnapshot {
    fn from(session: Session) -> Self {
        Self {
            created_at: Some(session.created_at),
            chat_history: session.chat_history,
            image_history: session.image_history,
        }
    }
}
