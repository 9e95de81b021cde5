use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::conversation::{ChatMessage, Step};

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub session_id: Uuid,
    /// Entries appended by this request only.
    pub messages: Vec<ChatMessage>,
    pub step: Step,
    pub quick_replies: &'static [&'static str],
}

#[derive(Debug, Serialize)]
pub struct ChatLogResponse {
    pub session_id: Uuid,
    pub messages: Vec<ChatMessage>,
    pub step: Step,
    pub quick_replies: &'static [&'static str],
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
    pub session_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub output: String,
    pub session_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub use_case: String,
    pub budget: String,
    pub specificity: String,
}
