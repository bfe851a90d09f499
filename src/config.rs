use crate::mover::DEFAULT_MAX_PROBES;
use crate::sanitizer::DEFAULT_FALLBACK_STEM;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub rename: RenameConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Base URL of the Gemini `models` collection
    pub endpoint: String,
    pub model: String,
    /// Instruction sent alongside every image
    pub prompt: String,
    /// Marker preceding the description in the model's answer (matched case-insensitively)
    pub description_marker: String,
    /// Marker preceding the suggested file name
    pub name_marker: String,
    pub temperature: f64,
    pub max_output_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta/models".to_string(),
            model: "gemini-1.5-flash".to_string(),
            prompt: "Analyze this photo in detail and describe it. Then suggest a file name \
                     that reflects the photo's content. Do not use punctuation or special \
                     characters in the file name. Answer in this format: DESCRIPTION: \
                     [detailed description of the photo] SUGGESTED_FILENAME: [suggested file name]"
                .to_string(),
            description_marker: "DESCRIPTION:".to_string(),
            name_marker: "SUGGESTED_FILENAME:".to_string(),
            temperature: 0.4,
            max_output_tokens: 800,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenameConfig {
    /// Stem used when the model gives no usable name
    pub fallback_stem: String,
    /// How many `_n` suffixes to try before reporting a collision error
    pub max_collision_probes: usize,
}

impl Default for RenameConfig {
    fn default() -> Self {
        Self {
            fallback_stem: DEFAULT_FALLBACK_STEM.to_string(),
            max_collision_probes: DEFAULT_MAX_PROBES,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Upper bound on simultaneous analyses; unbounded when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrent: Option<usize>,
}

impl Config {
    /// Load configuration from the default location
    /// If the config file doesn't exist, create it with default values
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            log::info!("Config file not found, creating default config at {:?}", config_path);
            let default_config = Config::default();
            default_config.save_to(config_path)?;
            return Ok(default_config);
        }

        let contents = fs::read_to_string(config_path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;

        log::info!("Loaded config from {:?}", config_path);
        Ok(config)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(config_path, contents).context("Failed to write config file")?;

        log::info!("Saved config to {:?}", config_path);
        Ok(())
    }

    fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not determine config directory")?;
        Ok(config_dir.join("photo-renamer").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_creates_defaults() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path)?;

        assert!(path.exists());
        assert_eq!(config.rename.fallback_stem, "new_photo");
        assert_eq!(config.rename.max_collision_probes, 10_000);
        assert_eq!(config.analysis.max_concurrent, None);
        Ok(())
    }

    #[test]
    fn test_partial_file_keeps_defaults() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            "[ai]\nmodel = \"gemini-2.0-flash\"\n\n[analysis]\nmax_concurrent = 4\n",
        )?;

        let config = Config::load_from(&path)?;

        assert_eq!(config.ai.model, "gemini-2.0-flash");
        assert_eq!(config.ai.max_output_tokens, 800);
        assert_eq!(config.ai.name_marker, "SUGGESTED_FILENAME:");
        assert_eq!(config.analysis.max_concurrent, Some(4));
        assert_eq!(config.rename.fallback_stem, "new_photo");
        Ok(())
    }

    #[test]
    fn test_round_trip_through_disk() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("config.toml");
        let mut config = Config::default();
        config.rename.fallback_stem = "untitled".to_string();
        config.save_to(&path)?;

        let loaded = Config::load_from(&path)?;
        assert_eq!(loaded.rename.fallback_stem, "untitled");
        Ok(())
    }
}
