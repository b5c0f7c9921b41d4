use std::path::PathBuf;
use tracing::warn;

use crate::reply::ReplyMode;

pub const DEFAULT_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_MODEL_DIR: &str = "model_output";
pub const DEFAULT_SEQ_LEN: usize = 128;

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub addr: String,
    pub model_dir: PathBuf,
    /// `cpu`, `cuda` or `cuda:N`; unset means pick automatically.
    pub device: Option<String>,
    pub seq_len: usize,
    pub reply_mode: ReplyMode,
    pub catalog_path: Option<PathBuf>,
    pub templates_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
            device: None,
            seq_len: DEFAULT_SEQ_LEN,
            reply_mode: ReplyMode::default(),
            catalog_path: None,
            templates_path: None,
        }
    }
}

impl ServerConfig {
    /// Reads `.env` (if present) and the process environment.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| dotenvy::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let seq_len = match get("MOODBOT_SEQ_LEN") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(len) if len >= 8 => len,
                _ => {
                    warn!(value = raw.as_str(), "invalid MOODBOT_SEQ_LEN, using default");
                    defaults.seq_len
                }
            },
            None => defaults.seq_len,
        };

        let reply_mode = match get("MOODBOT_REPLY_MODE") {
            Some(raw) => raw.parse::<ReplyMode>().unwrap_or_else(|err| {
                warn!(error = err.as_str(), "invalid MOODBOT_REPLY_MODE, using text");
                defaults.reply_mode
            }),
            None => defaults.reply_mode,
        };

        Self {
            addr: get("MOODBOT_ADDR").unwrap_or(defaults.addr),
            model_dir: get("MOODBOT_MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_dir),
            device: get("MOODBOT_DEVICE"),
            seq_len,
            reply_mode,
            catalog_path: get("MOODBOT_CATALOG_PATH").map(PathBuf::from),
            templates_path: get("MOODBOT_TEMPLATES_PATH").map(PathBuf::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        assert_eq!(config_from(&[]), ServerConfig::default());
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("MOODBOT_ADDR", "127.0.0.1:9000"),
            ("MOODBOT_MODEL_DIR", "/models/goemotions"),
            ("MOODBOT_DEVICE", "cpu"),
            ("MOODBOT_SEQ_LEN", "256"),
            ("MOODBOT_REPLY_MODE", "emotions"),
            ("MOODBOT_CATALOG_PATH", "catalog.json"),
        ]);
        assert_eq!(config.addr, "127.0.0.1:9000");
        assert_eq!(config.model_dir, PathBuf::from("/models/goemotions"));
        assert_eq!(config.device.as_deref(), Some("cpu"));
        assert_eq!(config.seq_len, 256);
        assert_eq!(config.reply_mode, ReplyMode::Emotions);
        assert_eq!(config.catalog_path, Some(PathBuf::from("catalog.json")));
        assert_eq!(config.templates_path, None);
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = config_from(&[
            ("MOODBOT_SEQ_LEN", "tiny"),
            ("MOODBOT_REPLY_MODE", "xml"),
            ("MOODBOT_DEVICE", "  "),
        ]);
        assert_eq!(config.seq_len, DEFAULT_SEQ_LEN);
        assert_eq!(config.reply_mode, ReplyMode::Text);
        assert_eq!(config.device, None);
    }
}
