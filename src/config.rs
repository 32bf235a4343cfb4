//! Locale configuration.
//!
//! Configs are loaded from JSON files in the config directory
//! (`HIERARCHY_TREE_CONFIG_DIR`, default `configs/`). When the directory is
//! missing the built-in French and English configs are used.

use crate::parser::ParseError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub const DEFAULT_LOCALE: &str = "fr";

/// Wording and layout for one locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub messages: Messages,
    /// Left padding of each children list, in pixels.
    #[serde(default = "default_indent_px")]
    pub indent_px: u32,
    /// Text between own status and manager status.
    #[serde(default = "default_status_separator")]
    pub status_separator: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Messages {
    /// Shown when the data parameter is empty.
    pub no_data: String,
    /// Prefix of the in-place parse error.
    pub parse_error: String,
}

fn default_indent_px() -> u32 {
    50
}

fn default_status_separator() -> String {
    "|".to_string()
}

impl Messages {
    /// Text to put in the container instead of a tree.
    pub fn describe(&self, error: &ParseError) -> String {
        match error {
            ParseError::NoData => self.no_data.clone(),
            ParseError::ParseFailure { raw, reason } => {
                let quoted = serde_json::to_string(raw).unwrap_or_else(|_| raw.clone());
                format!("{} {} ({})", self.parse_error, quoted, reason)
            }
        }
    }
}

/// All loaded locale configs.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    configs: HashMap<String, Arc<LocaleConfig>>,
    default_config: Arc<LocaleConfig>,
}

impl ConfigStore {
    /// Load all configs from the specified directory.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        if !dir.exists() {
            anyhow::bail!("Config directory does not exist: {:?}", dir);
        }

        let mut configs = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();

            if path.extension().is_some_and(|e| e == "json") {
                let content = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config: {:?}", path))?;

                let config: LocaleConfig = serde_json::from_str(&content)
                    .with_context(|| format!("Failed to parse config: {:?}", path))?;

                info!("Loaded locale config: {} from {:?}", config.name, path);
                configs.push(config);
            }
        }

        Self::from_configs(configs).with_context(|| format!("No configs found in {:?}", dir))
    }

    /// Load from `dir` when it exists, otherwise fall back to built-ins.
    pub fn load_or_builtin(dir: &Path) -> Result<Self> {
        if dir.exists() {
            Self::load_from_dir(dir)
        } else {
            info!("Config directory {:?} not found, using built-in locales", dir);
            Ok(Self::builtin())
        }
    }

    pub fn builtin() -> Self {
        let fr = Arc::new(create_default_config());
        let en = Arc::new(create_english_config());
        let configs = HashMap::from([
            (fr.name.clone(), Arc::clone(&fr)),
            (en.name.clone(), en),
        ]);
        Self {
            configs,
            default_config: fr,
        }
    }

    pub fn from_configs(configs: Vec<LocaleConfig>) -> Result<Self> {
        if configs.is_empty() {
            anyhow::bail!("No configs provided");
        }

        let configs: HashMap<String, Arc<LocaleConfig>> = configs
            .into_iter()
            .map(|c| (c.name.clone(), Arc::new(c)))
            .collect();

        let default_config = Self::pick_default(&configs)
            .context("No configs provided")?;

        Ok(Self {
            configs,
            default_config,
        })
    }

    pub fn get(&self, name: &str) -> Option<Arc<LocaleConfig>> {
        self.configs.get(name).cloned()
    }

    pub fn default_config(&self) -> Arc<LocaleConfig> {
        Arc::clone(&self.default_config)
    }

    /// The named config, or the default one when no name is given.
    pub fn resolve(&self, name: Option<&str>) -> Option<Arc<LocaleConfig>> {
        match name {
            Some(name) => self.get(name),
            None => Some(self.default_config()),
        }
    }

    /// Config names, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.configs.keys().cloned().collect();
        names.sort();
        names
    }

    fn pick_default(configs: &HashMap<String, Arc<LocaleConfig>>) -> Option<Arc<LocaleConfig>> {
        configs.get(DEFAULT_LOCALE).cloned().or_else(|| {
            configs
                .iter()
                .min_by(|a, b| a.0.cmp(b.0))
                .map(|(_, config)| Arc::clone(config))
        })
    }
}

/// French wording, the one the hosting forms ship with.
pub fn create_default_config() -> LocaleConfig {
    LocaleConfig {
        name: DEFAULT_LOCALE.to_string(),
        description: "Français".to_string(),
        messages: Messages {
            no_data: "Aucune donnée.".to_string(),
            parse_error: "Erreur de parsing JSON.".to_string(),
        },
        indent_px: default_indent_px(),
        status_separator: default_status_separator(),
    }
}

pub fn create_english_config() -> LocaleConfig {
    LocaleConfig {
        name: "en".to_string(),
        description: "English".to_string(),
        messages: Messages {
            no_data: "No data.".to_string(),
            parse_error: "JSON parsing error.".to_string(),
        },
        indent_px: default_indent_px(),
        status_separator: default_status_separator(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_defaults_to_french() {
        let store = ConfigStore::builtin();
        assert_eq!(store.list(), vec!["en".to_string(), "fr".to_string()]);
        assert_eq!(store.default_config().messages.no_data, "Aucune donnée.");
        assert_eq!(store.resolve(Some("en")).unwrap().messages.no_data, "No data.");
        assert!(store.resolve(Some("de")).is_none());
        assert_eq!(store.resolve(None).unwrap().name, "fr");
    }

    #[test]
    fn test_describe_parse_failure() {
        let messages = create_default_config().messages;
        let err = ParseError::ParseFailure {
            raw: "{not json".to_string(),
            reason: "EOF".to_string(),
        };
        assert_eq!(
            messages.describe(&err),
            "Erreur de parsing JSON. \"{not json\" (EOF)"
        );
        assert_eq!(messages.describe(&ParseError::NoData), "Aucune donnée.");
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("de.json"),
            r#"{"name": "de",
                "messages": {"no_data": "Keine Daten.", "parse_error": "JSON-Fehler."}}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let store = ConfigStore::load_from_dir(dir.path()).unwrap();
        assert_eq!(store.list(), vec!["de".to_string()]);
        let de = store.default_config();
        assert_eq!(de.indent_px, 50);
        assert_eq!(de.status_separator, "|");
        assert_eq!(de.messages.no_data, "Keine Daten.");
    }

    #[test]
    fn test_load_from_empty_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ConfigStore::load_from_dir(dir.path()).is_err());
    }

    #[test]
    fn test_bad_config_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.json"), "{").unwrap();
        let err = ConfigStore::load_from_dir(dir.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("broken.json"));
    }

    #[test]
    fn test_missing_dir_falls_back() {
        let store = ConfigStore::load_or_builtin(Path::new("/nonexistent/hierarchy-tree")).unwrap();
        assert_eq!(store.default_config().name, "fr");
    }
}
