pub mod decision;
pub mod normalize;
pub mod resolve;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use decision::{Decision, DecisionMode};
pub use resolve::{resolve_label, resolve_names, resolve_primary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProblemType {
    MultiLabel,
    SingleLabel,
}

impl ProblemType {
    /// Accepts the HuggingFace `problem_type` spellings plus short forms.
    /// Anything else (including `regression`) counts as undeclared.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "multi_label_classification" | "multi_label" | "multi" => Some(Self::MultiLabel),
            "single_label_classification" | "single_label" | "single" => Some(Self::SingleLabel),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelMetadata {
    pub class_count: usize,
    pub problem_type: Option<ProblemType>,
    pub id_to_name: BTreeMap<usize, String>,
}

impl ModelMetadata {
    /// Label token for a class index: the model's own name when it has one,
    /// otherwise the canonical `LABEL_{idx}` code.
    pub fn label_for_index(&self, idx: usize) -> String {
        self.id_to_name
            .get(&idx)
            .filter(|name| !name.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| format!("LABEL_{idx}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreScale {
    /// Raw pre-activation outputs.
    Logits,
    /// Already activated, each value in [0, 1].
    Probabilities,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawScores {
    pub scale: ScoreScale,
    pub values: Vec<f32>,
}

impl RawScores {
    pub fn logits(values: Vec<f32>) -> Self {
        Self {
            scale: ScoreScale::Logits,
            values,
        }
    }

    pub fn probabilities(values: Vec<f32>) -> Self {
        Self {
            scale: ScoreScale::Probabilities,
            values,
        }
    }
}

/// What an emotion classifier hands back for one input text.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifierOutput {
    /// One score per class index.
    Scores(RawScores),
    /// Post-hoc labels in whatever shape the backend produced.
    Labels(serde_json::Value),
}

/// Boundary to the model that turns text into emotion predictions.
///
/// Calls are synchronous and may block; async callers should run them on a
/// blocking thread.
pub trait EmotionClassifier: Send + Sync {
    fn name(&self) -> &str;

    fn metadata(&self) -> &ModelMetadata;

    fn classify(&self, text: &str) -> Result<ClassifierOutput>;
}
