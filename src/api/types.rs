use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl PredictRequest {
    /// `text` wins when non-empty, otherwise `message`.
    pub fn into_text(self) -> Option<String> {
        self.text
            .filter(|t| !t.trim().is_empty())
            .or(self.message)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PredictQuery {
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub backend: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "userId")]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emotions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChatResponse {
    pub fn ok(reply: String, emotions: Vec<String>) -> Self {
        Self {
            success: true,
            reply: Some(reply),
            emotions: Some(emotions),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            reply: None,
            emotions: None,
            error: Some(message.into()),
        }
    }
}
