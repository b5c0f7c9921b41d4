use tracing::{debug, info, warn};

use crate::{
    catalog::{LabelCatalog, LabelEntry, ReplyTemplates},
    classifier::{
        decision::{decide, Decision},
        normalize::normalize_labels,
        resolve_names, resolve_primary, ClassifierOutput, EmotionClassifier, ModelMetadata,
    },
    reply::{DetailedReply, Reply, ReplyMode, ResolvedReply},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestState {
    /// No usable text; answered with the fixed prompt, classifier untouched.
    AwaitingText,
    Resolved(Outcome),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Reply(Reply),
    /// Classifier failure, carrying a short diagnostic.
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct Interpretation<'a> {
    /// Candidate label tokens in priority order.
    pub labels: Vec<String>,
    /// Present when the classifier returned per-class scores.
    pub decision: Option<Decision>,
    pub primary: &'a LabelEntry,
}

/// Turns classifier output into replies. Holds only read-only catalog data,
/// so one instance is shared by every request.
#[derive(Debug, Clone)]
pub struct MoodEngine {
    catalog: LabelCatalog,
    templates: ReplyTemplates,
}

impl MoodEngine {
    pub fn new(catalog: LabelCatalog, templates: ReplyTemplates) -> Self {
        Self { catalog, templates }
    }

    pub fn catalog(&self) -> &LabelCatalog {
        &self.catalog
    }

    pub fn templates(&self) -> &ReplyTemplates {
        &self.templates
    }

    pub fn interpret(&self, output: &ClassifierOutput, metadata: &ModelMetadata) -> Interpretation<'_> {
        let (labels, decision) = match output {
            ClassifierOutput::Scores(scores) => {
                let decision = decide(scores, metadata);
                debug!(
                    mode = ?decision.mode,
                    indices = ?decision.indices,
                    fell_back = decision.fell_back,
                    "decision applied"
                );
                let labels = decision
                    .indices
                    .iter()
                    .map(|&idx| metadata.label_for_index(idx))
                    .collect();
                (labels, Some(decision))
            }
            ClassifierOutput::Labels(raw) => (normalize_labels(raw), None),
        };

        if labels.is_empty() {
            debug!("no usable prediction, using default entry");
        }
        let primary = resolve_primary(&labels, &self.catalog);

        Interpretation {
            labels,
            decision,
            primary,
        }
    }

    pub fn render(&self, interpretation: &Interpretation<'_>, mode: ReplyMode) -> Reply {
        match mode {
            ReplyMode::Text => {
                Reply::Text(ResolvedReply::from_entry(interpretation.primary, &self.templates).to_text())
            }
            ReplyMode::Emotions => Reply::Emotions(resolve_names(&interpretation.labels, &self.catalog)),
            ReplyMode::Json => {
                let resolved = ResolvedReply::from_entry(interpretation.primary, &self.templates);
                Reply::Json(DetailedReply {
                    reply: resolved.to_text(),
                    emotion: resolved.emotion,
                    code: resolved.code,
                    tasks: resolved.tasks,
                    emotions: resolve_names(&interpretation.labels, &self.catalog),
                })
            }
        }
    }

    pub fn reply_for(&self, output: &ClassifierOutput, metadata: &ModelMetadata, mode: ReplyMode) -> Reply {
        let interpretation = self.interpret(output, metadata);
        self.render(&interpretation, mode)
    }

    /// Runs one request to completion. Blocks for as long as the classifier does.
    pub fn process(
        &self,
        classifier: &dyn EmotionClassifier,
        text: Option<&str>,
        mode: ReplyMode,
    ) -> RequestState {
        let text = match text.map(str::trim).filter(|t| !t.is_empty()) {
            Some(text) => text,
            None => return RequestState::AwaitingText,
        };

        let output = match classifier.classify(text) {
            Ok(output) => output,
            Err(err) => {
                warn!(classifier = classifier.name(), error = %err, "classification failed");
                return RequestState::Resolved(Outcome::Failed(err.to_string()));
            }
        };

        let interpretation = self.interpret(&output, classifier.metadata());
        info!(
            labels = ?interpretation.labels,
            emotion = interpretation.primary.emotion.as_str(),
            %mode,
            "emotion resolved"
        );
        RequestState::Resolved(Outcome::Reply(self.render(&interpretation, mode)))
    }
}
