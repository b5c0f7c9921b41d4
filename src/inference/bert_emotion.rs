use anyhow::{anyhow, bail, Context, Result};
use candle::{DType, Device, IndexOp, Module, Tensor};
use candle_nn::{Linear, VarBuilder};
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use serde::Deserialize;
use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::Path,
};
use tokenizers::Tokenizer;
use tracing::debug;

use super::{build_device, build_var_builder, find_model_weights};
use crate::classifier::{ClassifierOutput, EmotionClassifier, ModelMetadata, ProblemType, RawScores};

/// Fields of a HuggingFace `config.json` that describe the classification head.
#[derive(Deserialize, Default)]
struct HeadConfig {
    #[serde(default)]
    id2label: HashMap<String, String>,
    #[serde(default)]
    num_labels: Option<usize>,
    #[serde(default)]
    problem_type: Option<String>,
}

struct ClassificationHead {
    pooler: Linear,
    classifier: Linear,
}

impl ClassificationHead {
    fn load(vb: &VarBuilder, hidden_size: usize, class_count: usize) -> Result<Self> {
        let pooler = candle_nn::linear(hidden_size, hidden_size, vb.pp("bert.pooler.dense"))
            .context("pooler weights missing")?;
        let classifier = candle_nn::linear(hidden_size, class_count, vb.pp("classifier"))
            .context("classifier head weights missing")?;
        Ok(Self { pooler, classifier })
    }

    fn forward(&self, cls: &Tensor) -> candle::Result<Tensor> {
        let pooled = self.pooler.forward(cls)?.tanh()?;
        self.classifier.forward(&pooled)
    }
}

/// BERT sequence classifier (`BertForSequenceClassification` layout) that
/// returns raw per-class logits.
pub struct BertEmotionClassifier {
    model: BertModel,
    head: ClassificationHead,
    tokenizer: Tokenizer,
    device: Device,
    max_len: usize,
    metadata: ModelMetadata,
}

impl BertEmotionClassifier {
    pub fn load(snapshot: &Path, device: Option<&str>, max_len: usize) -> Result<Self> {
        if !snapshot.is_dir() {
            bail!("model directory not found: {}", snapshot.display());
        }

        let tokenizer_path = snapshot.join("tokenizer.json");
        if !tokenizer_path.exists() {
            bail!("tokenizer.json not found under {}", snapshot.display());
        }
        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Tokenizer load failed ({}): {e}", tokenizer_path.display()))?;
        tokenizer.with_padding(None);
        let _ = tokenizer.with_truncation(None);

        let config_path = snapshot.join("config.json");
        let raw_config = fs::read(&config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        let config: BertConfig = serde_json::from_slice(&raw_config)
            .with_context(|| format!("failed to parse {}", config_path.display()))?;
        let head_config: HeadConfig = serde_json::from_slice(&raw_config)
            .with_context(|| format!("failed to parse {}", config_path.display()))?;
        let metadata = metadata_from_config(head_config)?;

        let weights_path = find_model_weights(snapshot)
            .ok_or_else(|| anyhow!("no model weights found under {}", snapshot.display()))?;

        let device = build_device(device)?;
        let vb = build_var_builder(&weights_path, DType::F32, &device)?;
        let model = BertModel::load(vb.pp("bert"), &config)?;
        let head = ClassificationHead::load(&vb, config.hidden_size, metadata.class_count)?;

        let max_len = max_len.min(config.max_position_embeddings).max(8);

        Ok(Self {
            model,
            head,
            tokenizer,
            device,
            max_len,
            metadata,
        })
    }

    fn logits(&self, text: &str) -> Result<Vec<f32>> {
        let enc = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow!("Tokenizer encode error: {e}"))?;
        let mut ids = enc.get_ids().to_vec();
        if ids.len() > self.max_len {
            ids.truncate(self.max_len);
        }
        if ids.is_empty() {
            ids.push(0);
        }
        let seq_len = ids.len();

        let input = Tensor::new(ids.as_slice(), &self.device)?.unsqueeze(0)?;
        let token_type_ids = input.zeros_like()?;
        let mask = Tensor::ones((1, seq_len), DType::I64, &self.device)?;

        let hidden = self
            .model
            .forward(&input, &token_type_ids, Some(&mask))
            .context("emotion classifier forward pass failed")?;
        let cls = hidden.i((.., 0))?;
        let logits = self.head.forward(&cls)?;

        logits
            .to_dtype(DType::F32)?
            .to_vec2::<f32>()
            .map_err(|e| anyhow!("failed to decode logits: {e}"))?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("logits tensor missing batch dimension"))
    }
}

impl EmotionClassifier for BertEmotionClassifier {
    fn name(&self) -> &str {
        "bert-sequence-classifier"
    }

    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    fn classify(&self, text: &str) -> Result<ClassifierOutput> {
        let logits = self.logits(text)?;
        debug!(classes = logits.len(), "logits computed");
        Ok(ClassifierOutput::Scores(RawScores::logits(logits)))
    }
}

fn metadata_from_config(head: HeadConfig) -> Result<ModelMetadata> {
    let id_to_name: BTreeMap<usize, String> = head
        .id2label
        .into_iter()
        .filter_map(|(k, v)| Some((k.trim().parse::<usize>().ok()?, v)))
        .collect();

    let class_count = head
        .num_labels
        .filter(|&n| n > 0)
        .or_else(|| id_to_name.keys().next_back().map(|max| max + 1))
        .ok_or_else(|| anyhow!("config.json has neither num_labels nor id2label"))?;

    Ok(ModelMetadata {
        class_count,
        problem_type: head.problem_type.as_deref().and_then(ProblemType::parse),
        id_to_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn head_config(raw: &str) -> HeadConfig {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn metadata_from_goemotions_config() {
        let metadata = metadata_from_config(head_config(
            r#"{
                "id2label": {"0": "LABEL_0", "1": "LABEL_1", "27": "LABEL_27"},
                "problem_type": "multi_label_classification",
                "hidden_size": 768
            }"#,
        ))
        .unwrap();
        assert_eq!(metadata.class_count, 28);
        assert_eq!(metadata.problem_type, Some(ProblemType::MultiLabel));
        assert_eq!(metadata.label_for_index(1), "LABEL_1");
        assert_eq!(metadata.label_for_index(5), "LABEL_5");
    }

    #[test]
    fn num_labels_wins_over_id2label() {
        let metadata = metadata_from_config(head_config(
            r#"{"num_labels": 3, "id2label": {"0": "joy", "x": "ignored"}}"#,
        ))
        .unwrap();
        assert_eq!(metadata.class_count, 3);
        assert_eq!(metadata.problem_type, None);
        assert_eq!(metadata.id_to_name.len(), 1);
    }

    #[test]
    fn config_without_labels_is_rejected() {
        assert!(metadata_from_config(HeadConfig::default()).is_err());
    }

    #[test]
    fn run_emotion_classification() {
        let snapshot = PathBuf::from("model_output");
        if !snapshot.join("model.safetensors").exists() {
            eprintln!(
                "emotion model snapshot missing under {}, skipping test",
                snapshot.display()
            );
            return;
        }
        let classifier = BertEmotionClassifier::load(&snapshot, Some("cpu"), 128)
            .expect("failed to load emotion model");
        let output = classifier
            .classify("I am feeling very happy today!")
            .expect("emotion inference failed");
        let ClassifierOutput::Scores(scores) = output else {
            panic!("expected raw scores");
        };
        assert_eq!(scores.values.len(), classifier.metadata().class_count);
    }
}
