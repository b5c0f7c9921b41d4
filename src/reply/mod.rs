use serde::Serialize;
use std::{fmt, str::FromStr};

use crate::catalog::{LabelEntry, ReplyTemplates, Task};

pub const PROMPT_FOR_INPUT: &str = "Please tell me how you feel.";
pub const MAX_TASKS: usize = 2;
pub const TASK_BULLET: &str = "•";
/// Chat renderers collapse or escape line breaks, so lines join on a space.
pub const LINE_SEPARATOR: &str = " ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyMode {
    /// Opening line plus task bullets as one line of plain text.
    #[default]
    Text,
    /// Resolved emotion names only.
    Emotions,
    /// Text reply together with the chosen emotion and its tasks.
    Json,
}

impl FromStr for ReplyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "emotions" | "names" | "labels" => Ok(Self::Emotions),
            "json" | "detailed" => Ok(Self::Json),
            other => Err(format!("unknown reply mode '{other}'")),
        }
    }
}

impl fmt::Display for ReplyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::Emotions => "emotions",
            Self::Json => "json",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedReply {
    pub code: String,
    pub emotion: String,
    pub opening_line: String,
    pub tasks: Vec<Task>,
}

impl ResolvedReply {
    pub fn from_entry(entry: &LabelEntry, templates: &ReplyTemplates) -> Self {
        Self {
            code: entry.code.clone(),
            emotion: entry.emotion.clone(),
            opening_line: templates.opening_for(&entry.emotion).to_string(),
            tasks: entry.tasks.iter().take(MAX_TASKS).cloned().collect(),
        }
    }

    pub fn to_text(&self) -> String {
        let mut lines = Vec::with_capacity(1 + self.tasks.len());
        lines.push(self.opening_line.clone());
        for task in &self.tasks {
            lines.push(format!("{TASK_BULLET} {}", task.description));
        }
        lines.join(LINE_SEPARATOR)
    }
}

/// Structured payload for clients that turn suggested tasks into to-dos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailedReply {
    pub emotion: String,
    pub code: String,
    pub reply: String,
    pub tasks: Vec<Task>,
    pub emotions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Emotions(Vec<String>),
    Json(DetailedReply),
}

pub fn compose_text(entry: &LabelEntry, templates: &ReplyTemplates) -> String {
    ResolvedReply::from_entry(entry, templates).to_text()
}
