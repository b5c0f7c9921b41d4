pub mod bert_emotion;

use anyhow::{anyhow, Result};
use candle::{DType, Device};
use candle_nn::VarBuilder;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{info, warn};

use crate::classifier::{ClassifierOutput, EmotionClassifier, ModelMetadata};

pub use bert_emotion::BertEmotionClassifier;

/// Stand-in used when the model could not be loaded at startup. Every call
/// fails with the load diagnostic so requests still get an error reply.
pub struct UnavailableClassifier {
    reason: String,
    metadata: ModelMetadata,
}

impl UnavailableClassifier {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            metadata: ModelMetadata::default(),
        }
    }
}

impl EmotionClassifier for UnavailableClassifier {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    fn classify(&self, _text: &str) -> Result<ClassifierOutput> {
        Err(anyhow!("{}", self.reason))
    }
}

/// Loads the BERT snapshot, or an [`UnavailableClassifier`] carrying the error.
pub fn load_classifier(
    model_dir: &Path,
    device: Option<&str>,
    max_len: usize,
) -> Arc<dyn EmotionClassifier> {
    match BertEmotionClassifier::load(model_dir, device, max_len) {
        Ok(classifier) => {
            info!(
                model_dir = %model_dir.display(),
                classes = classifier.metadata().class_count,
                problem_type = ?classifier.metadata().problem_type,
                "emotion classifier loaded"
            );
            Arc::new(classifier)
        }
        Err(err) => {
            warn!(
                model_dir = %model_dir.display(),
                error = %err,
                "emotion classifier unavailable, requests will get an error reply"
            );
            Arc::new(UnavailableClassifier::new(format!("{err:#}")))
        }
    }
}

pub(crate) fn find_model_weights(snapshot: &Path) -> Option<PathBuf> {
    let candidates = ["model.safetensors", "pytorch_model.bin", "model.bin"];
    candidates
        .iter()
        .map(|candidate| snapshot.join(candidate))
        .find(|path| path.exists())
}

pub(crate) fn build_var_builder(
    path: &Path,
    dtype: DType,
    device: &Device,
) -> Result<VarBuilder<'static>> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    if ext == "safetensors" {
        let files = vec![path.to_path_buf()];
        // SAFETY: the weights file is mapped read-only and not modified while loaded.
        unsafe {
            VarBuilder::from_mmaped_safetensors(&files, dtype, device)
                .map_err(|e| anyhow!("failed to load {}: {e}", path.display()))
        }
    } else {
        VarBuilder::from_pth(path, dtype, device)
            .map_err(|e| anyhow!("failed to load {}: {e}", path.display()))
    }
}

pub(crate) fn build_device(preference: Option<&str>) -> Result<Device> {
    match preference.map(str::trim).filter(|s| !s.is_empty()) {
        Some(pref) => parse_device_preference(pref),
        None => Ok(auto_device()),
    }
}

fn parse_device_preference(value: &str) -> Result<Device> {
    let lower = value.to_ascii_lowercase();
    if lower == "cpu" {
        Ok(Device::Cpu)
    } else if lower.starts_with("cuda") || lower.starts_with("gpu") {
        let ordinal = value
            .split(':')
            .nth(1)
            .and_then(|part| part.parse::<usize>().ok())
            .unwrap_or(0);
        Device::new_cuda(ordinal).map_err(|err| {
            anyhow!(
                "requested CUDA device {} but initialization failed: {err}. Build with the \
                 `classifier-cuda` feature and ensure CUDA libraries are available.",
                ordinal
            )
        })
    } else {
        warn!(value, "unrecognized MOODBOT_DEVICE value, defaulting to auto");
        Ok(auto_device())
    }
}

fn auto_device() -> Device {
    #[cfg(feature = "classifier-cuda")]
    {
        if let Ok(device) = Device::new_cuda(0) {
            return device;
        }
        warn!("CUDA requested at build time but unavailable, using CPU");
    }
    Device::Cpu
}
