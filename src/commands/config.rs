use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConvertError, Result};
use crate::mapper::ScriptExtension;

/// How many past conversions are remembered.
pub const MAX_HISTORY: usize = 20;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub input: String,
    pub output: String,
    pub converted_at: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConverterConfig {
    pub version: u32,
    #[serde(default)]
    pub script_extension: ScriptExtension,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_output_dir: Option<String>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            version: 1,
            script_extension: ScriptExtension::default(),
            history: vec![],
            last_output_dir: None,
        }
    }
}

impl ConverterConfig {
    /// Records a finished conversion, replacing any earlier one with the same output.
    pub fn record(&mut self, entry: HistoryEntry) {
        self.history.retain(|e| e.output != entry.output);
        let parent = Path::new(&entry.output)
            .parent()
            .map(|p| p.to_string_lossy().to_string());
        if let Some(parent) = parent.filter(|p| !p.is_empty()) {
            self.last_output_dir = Some(parent);
        }
        self.history.push(entry);
        if self.history.len() > MAX_HISTORY {
            let excess = self.history.len() - MAX_HISTORY;
            self.history.drain(..excess);
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".rbxmx-to-rojo").join("config.json"))
}

/// Loads the config at `path`; a missing or unreadable file yields defaults.
pub fn load_config_from(path: &Path) -> ConverterConfig {
    let Ok(content) = std::fs::read_to_string(path) else {
        return ConverterConfig::default();
    };
    match serde_json::from_str(&content) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Ignoring unreadable config {}: {e}", path.display());
            ConverterConfig::default()
        }
    }
}

pub fn load_config() -> ConverterConfig {
    config_path()
        .map(|path| load_config_from(&path))
        .unwrap_or_default()
}

pub fn save_config_to(path: &Path, config: &ConverterConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConvertError::fs(parent, e))?;
    }
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json).map_err(|e| ConvertError::fs(path, e))
}

/// Appends a conversion to the user's history file.
pub fn save_conversion(entry: HistoryEntry) -> Result<ConverterConfig> {
    let path = config_path()
        .ok_or_else(|| ConvertError::Custom("Cannot find home directory".into()))?;
    let mut config = load_config_from(&path);
    config.record(entry);
    save_config_to(&path, &config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(output: &str, at: u64) -> HistoryEntry {
        HistoryEntry {
            input: "/tmp/place.rbxlx".into(),
            output: output.into(),
            converted_at: at,
        }
    }

    #[test]
    fn test_missing_config_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("config.json"));
        assert_eq!(config, ConverterConfig::default());
        assert_eq!(config.script_extension, ScriptExtension::Lua);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"version":1,"scriptExtension":"luau"}"#).unwrap();

        let config = load_config_from(&path);
        assert_eq!(config.script_extension, ScriptExtension::Luau);
        assert!(config.history.is_empty());
    }

    #[test]
    fn test_corrupt_config_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(load_config_from(&path), ConverterConfig::default());
    }

    #[test]
    fn test_record_upserts_and_caps() {
        let mut config = ConverterConfig::default();
        config.record(entry("/out/a", 1));
        config.record(entry("/out/b", 2));
        config.record(entry("/out/a", 3));

        let outputs: Vec<&str> = config.history.iter().map(|e| e.output.as_str()).collect();
        assert_eq!(outputs, vec!["/out/b", "/out/a"]);
        assert_eq!(config.history[1].converted_at, 3);
        assert_eq!(config.last_output_dir.as_deref(), Some("/out"));

        for i in 0..30 {
            config.record(entry(&format!("/many/{i}"), i));
        }
        assert_eq!(config.history.len(), MAX_HISTORY);
        assert_eq!(config.history.last().unwrap().output, "/many/29");
    }

    #[test]
    fn test_save_roundtrip_uses_camel_case() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut config = ConverterConfig::default();
        config.record(entry("/out/game", 7));
        save_config_to(&path, &config).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"scriptExtension\": \"lua\""));
        assert!(text.contains("\"convertedAt\": 7"));
        assert_eq!(load_config_from(&path), config);
    }
}
