use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::backend::BackendKind;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendKind,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub lmstudio: LmStudioConfig,
    #[serde(default)]
    pub window: WindowConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OllamaConfig {
    pub host: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        OllamaConfig {
            host: "http://localhost:11434".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LmStudioConfig {
    pub host: String,
}

impl Default for LmStudioConfig {
    fn default() -> Self {
        LmStudioConfig {
            host: "http://localhost:1234/v1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig {
            width: 800,
            height: 600,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            backend: BackendKind::default(),
            model: String::new(),
            ollama: OllamaConfig::default(),
            lmstudio: LmStudioConfig::default(),
            window: WindowConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Self {
        let config_path = Self::get_config_path();

        if config_path.exists() {
            match fs::read_to_string(&config_path) {
                Ok(contents) => {
                    match toml::from_str(&contents) {
                        Ok(config) => return config,
                        Err(e) => eprintln!("Error parsing config.toml: {}. Using defaults.", e),
                    }
                }
                Err(e) => eprintln!("Error reading config.toml: {}. Using defaults.", e),
            }
        } else {
            // Create config directory if it doesn't exist
            if let Some(parent) = config_path.parent() {
                let _ = fs::create_dir_all(parent);
            }
        }

        Config::default()
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::get_config_path();
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        fs::write(&config_path, contents)?;
        Ok(())
    }

    pub fn get_config_path() -> PathBuf {
        Self::get_config_dir().join("config.toml")
    }

    pub fn get_config_dir() -> PathBuf {
        if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home).join(".config/scribe-bar")
        } else {
            PathBuf::from(".")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_round_trip() {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();

        assert_eq!(parsed.backend, BackendKind::Ollama);
        assert_eq!(parsed.model, "");
        assert_eq!(parsed.ollama.host, "http://localhost:11434");
        assert_eq!(parsed.lmstudio.host, "http://localhost:1234/v1");
        assert_eq!(parsed.window.width, 800);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let parsed: Config = toml::from_str("backend = \"lmstudio\"\nmodel = \"qwen2.5\"\n").unwrap();
        assert_eq!(parsed.backend, BackendKind::Lmstudio);
        assert_eq!(parsed.model, "qwen2.5");
        assert_eq!(parsed.ollama.host, "http://localhost:11434");
        assert_eq!(parsed.window.height, 600);
    }
}
