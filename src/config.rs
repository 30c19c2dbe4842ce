use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub server: ServerConfig,
  #[serde(default)]
  pub ai: AiConfig,
  #[serde(default)]
  pub offline: OfflineConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  /// Origin of the hosted app shell, e.g. https://fridge.example.com
  pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
  /// Generative model name
  #[serde(default = "default_model")]
  pub model: String,
}

impl Default for AiConfig {
  fn default() -> Self {
    Self {
      model: default_model(),
    }
  }
}

fn default_model() -> String {
  "gemini-2.5-flash".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct OfflineConfig {
  /// Current cache generation tag
  #[serde(default = "default_cache_version")]
  pub cache_version: String,
  /// Minutes between shell update checks
  #[serde(default = "default_update_interval")]
  pub update_interval_minutes: u64,
}

impl Default for OfflineConfig {
  fn default() -> Self {
    Self {
      cache_version: default_cache_version(),
      update_interval_minutes: default_update_interval(),
    }
  }
}

fn default_cache_version() -> String {
  "eco-fridge-v1".to_string()
}

fn default_update_interval() -> u64 {
  60
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./ecofridge.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/ecofridge/config.yaml
  /// 4. ~/.config/ecofridge/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/ecofridge/config.yaml\n\
                 See config.example.yaml for the format."
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("ecofridge.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("ecofridge").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Get the generative model API key from environment variables.
  ///
  /// Checks ECOFRIDGE_GEMINI_KEY first, then GOOGLE_GEMINI_API_KEY as
  /// fallback.
  pub fn get_api_key() -> Result<String> {
    std::env::var("ECOFRIDGE_GEMINI_KEY")
      .or_else(|_| std::env::var("GOOGLE_GEMINI_API_KEY"))
      .map_err(|_| {
        eyre!(
          "Model API key not found. Set ECOFRIDGE_GEMINI_KEY or GOOGLE_GEMINI_API_KEY environment variable."
        )
      })
  }
}
