use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::Path};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "task")]
    pub description: String,
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelEntry {
    pub code: String,
    pub emotion: String,
    pub tasks: Vec<Task>,
}

#[derive(Deserialize)]
struct LabelCatalogFile {
    default_code: String,
    entries: Vec<LabelEntryFile>,
}

#[derive(Deserialize)]
struct LabelEntryFile {
    code: String,
    emotion: String,
    #[serde(default)]
    tasks: Vec<Task>,
}

/// Read-only registry of emotion codes, names and suggested tasks.
///
/// Built once at startup; lookups never allocate and never fail, a miss is
/// reported as `None` and callers fall back to [`LabelCatalog::default_entry`].
#[derive(Debug, Clone)]
pub struct LabelCatalog {
    entries: Vec<LabelEntry>,
    by_code: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
    default_idx: usize,
}

macro_rules! label_catalog_file {
    ($lang:literal) => {
        include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/lang/",
            $lang,
            "/label_catalog.json"
        ))
    };
}

impl LabelCatalog {
    pub fn builtin() -> Result<Self> {
        Self::from_json(label_catalog_file!("en")).context("embedded label catalog is invalid")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("failed to load {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let parsed: LabelCatalogFile =
            serde_json::from_str(raw).context("invalid label catalog json")?;

        let mut entries = Vec::with_capacity(parsed.entries.len());
        let mut by_code = HashMap::new();
        let mut by_name = HashMap::new();

        for (idx, raw_entry) in parsed.entries.into_iter().enumerate() {
            let code = raw_entry.code.trim().to_string();
            let emotion = raw_entry.emotion.trim().to_lowercase();
            if code.is_empty() || emotion.is_empty() {
                bail!("catalog entry #{idx} has an empty code or emotion name");
            }
            if let Some(task) = raw_entry.tasks.iter().find(|t| t.points == 0) {
                bail!(
                    "task '{}' of {code} must be worth at least one point",
                    task.description
                );
            }
            if by_code.insert(code.clone(), idx).is_some() {
                bail!("duplicate emotion code {code}");
            }
            if by_name.insert(emotion.clone(), idx).is_some() {
                bail!("duplicate emotion name {emotion}");
            }
            entries.push(LabelEntry {
                code,
                emotion,
                tasks: raw_entry.tasks,
            });
        }

        let default_idx = *by_code
            .get(parsed.default_code.trim())
            .ok_or_else(|| anyhow!("default code {} has no entry", parsed.default_code))?;

        Ok(Self {
            entries,
            by_code,
            by_name,
            default_idx,
        })
    }

    pub fn by_code(&self, code: &str) -> Option<&LabelEntry> {
        self.by_code.get(code).map(|&idx| &self.entries[idx])
    }

    /// Case-insensitive match on the emotion name.
    pub fn by_name(&self, name: &str) -> Option<&LabelEntry> {
        self.by_name
            .get(name.trim().to_lowercase().as_str())
            .map(|&idx| &self.entries[idx])
    }

    pub fn default_entry(&self) -> &LabelEntry {
        &self.entries[self.default_idx]
    }

    pub fn is_default(&self, entry: &LabelEntry) -> bool {
        entry.code == self.default_entry().code
    }

    pub fn entries(&self) -> &[LabelEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_has_goemotions_labels() {
        let catalog = LabelCatalog::builtin().unwrap();
        assert_eq!(catalog.len(), 28);
        assert_eq!(catalog.default_entry().emotion, "neutral");
        assert_eq!(catalog.default_entry().code, "LABEL_27");
        assert_eq!(catalog.by_code("LABEL_19").unwrap().emotion, "nervousness");
        assert!(catalog.entries().iter().all(|e| e.tasks.len() >= 2));
    }

    #[test]
    fn name_lookup_ignores_case() {
        let catalog = LabelCatalog::builtin().unwrap();
        let joy = catalog.by_name("joy").unwrap();
        assert_eq!(catalog.by_name("Joy"), Some(joy));
        assert_eq!(catalog.by_name("JOY"), Some(joy));
        assert_eq!(joy.code, "LABEL_17");
    }

    #[test]
    fn code_lookup_is_exact() {
        let catalog = LabelCatalog::builtin().unwrap();
        assert!(catalog.by_code("label_17").is_none());
        assert!(catalog.by_code("LABEL_99").is_none());
    }

    #[test]
    fn rejects_missing_default() {
        let raw = r#"{"default_code":"X","entries":[{"code":"A","emotion":"joy","tasks":[]}]}"#;
        assert!(LabelCatalog::from_json(raw).is_err());
    }

    #[test]
    fn rejects_duplicate_names() {
        let raw = r#"{"default_code":"A","entries":[
            {"code":"A","emotion":"Joy"},
            {"code":"B","emotion":"joy"}
        ]}"#;
        let err = LabelCatalog::from_json(raw).unwrap_err();
        assert!(err.to_string().contains("duplicate emotion name"));
    }

    #[test]
    fn rejects_zero_point_tasks() {
        let raw = r#"{"default_code":"A","entries":[
            {"code":"A","emotion":"neutral","tasks":[{"task":"rest","points":0}]}
        ]}"#;
        assert!(LabelCatalog::from_json(raw).is_err());
    }
}
