use chrono::{ DateTime, NaiveDateTime, Utc };
use serde::{ Serialize, Deserialize };
use std::collections::HashMap;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: Option<DateTime<Utc>>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into(), timestamp: Some(Utc::now()) }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into(), timestamp: Some(Utc::now()) }
    }
}

/// One stored exchange as returned by `GET /history/:id`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HistoryRecord {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub assistant: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl HistoryRecord {
    /// Expands the record into its user message followed by the assistant reply.
    pub fn into_messages(self) -> [ChatMessage; 2] {
        let timestamp = self.timestamp.as_deref().and_then(parse_timestamp);
        [
            ChatMessage { role: Role::User, content: self.user, timestamp },
            ChatMessage { role: Role::Assistant, content: self.assistant, timestamp },
        ]
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub history: Vec<HistoryRecord>,
}

impl HistoryResponse {
    pub fn into_messages(self) -> Vec<ChatMessage> {
        self.history.into_iter().flat_map(HistoryRecord::into_messages).collect()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationList {
    #[serde(default)]
    pub conversations: Vec<String>,
    #[serde(default)]
    pub titles: HashMap<String, String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub conversation_id: String,
    pub user_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

/// Accepts RFC 3339 as well as the offset-less ISO form some backends emit, read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}
