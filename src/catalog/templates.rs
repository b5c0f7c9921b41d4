use anyhow::{Context, Result};
use serde::Deserialize;
use std::{collections::HashMap, fs, path::Path};

use super::labels::LabelCatalog;

pub const GENERIC_OPENING: &str = "I hear you. Here are a couple of small things you can try:";

#[derive(Deserialize)]
struct TemplateFile {
    #[serde(default)]
    default: Option<String>,
    templates: HashMap<String, String>,
}

/// Opening line per emotion name.
#[derive(Debug, Clone)]
pub struct ReplyTemplates {
    default_opening: String,
    openings: HashMap<String, String>,
}

macro_rules! reply_templates_file {
    ($lang:literal) => {
        include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/lang/",
            $lang,
            "/reply_templates.json"
        ))
    };
}

impl ReplyTemplates {
    pub fn builtin() -> Result<Self> {
        Self::from_json(reply_templates_file!("en")).context("embedded reply templates are invalid")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("failed to load {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let parsed: TemplateFile =
            serde_json::from_str(raw).context("invalid reply template json")?;
        let openings = parsed
            .templates
            .into_iter()
            .map(|(emotion, line)| (emotion.trim().to_lowercase(), line))
            .collect();
        Ok(Self {
            default_opening: parsed
                .default
                .filter(|line| !line.trim().is_empty())
                .unwrap_or_else(|| GENERIC_OPENING.to_string()),
            openings,
        })
    }

    pub fn opening_for(&self, emotion: &str) -> &str {
        self.openings
            .get(emotion)
            .map(String::as_str)
            .unwrap_or(self.default_opening.as_str())
    }

    /// Catalog emotions with no opening line of their own.
    pub fn missing_for<'a>(&self, catalog: &'a LabelCatalog) -> Vec<&'a str> {
        catalog
            .entries()
            .iter()
            .map(|e| e.emotion.as_str())
            .filter(|emotion| !self.openings.contains_key(*emotion))
            .collect()
    }
}
