use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::cache::CacheOptions;
use crate::catalog::Endpoint;
use crate::sync::ListProfile;

const DEFAULT_API_URL: &str = "http://localhost:8000/api";
const DEFAULT_WEB_URL: &str = "http://localhost:3000/";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
  pub api: ApiConfig,
  /// Root of the address bar; locations are resolved against it
  pub web_url: String,
  pub cache: CacheConfig,
  /// Page size overrides keyed by endpoint (e.g. `videos: 40`)
  pub page_sizes: BTreeMap<String, u32>,
  /// Directory for log files (defaults to the platform data dir)
  pub log_dir: Option<PathBuf>,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      api: ApiConfig::default(),
      web_url: DEFAULT_WEB_URL.to_string(),
      cache: CacheConfig::default(),
      page_sizes: BTreeMap::new(),
      log_dir: None,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
  pub base_url: String,
  /// Request timeout in seconds
  pub timeout_secs: u64,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: DEFAULT_API_URL.to_string(),
      timeout_secs: 30,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  /// Seconds an entry without subscribers is kept
  pub keep_unused_secs: u64,
  pub max_entries: usize,
}

impl Default for CacheConfig {
  fn default() -> Self {
    let options = CacheOptions::default();
    Self {
      keep_unused_secs: options.keep_unused_for.as_secs(),
      max_entries: options.max_entries,
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided (must exist)
  /// 2. ./cosview.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/cosview/config.yaml
  ///
  /// Without a file the built-in defaults are used.
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
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("cosview.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("cosview").join("config.yaml");
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

  /// API base URL from the environment (COSVIEW_API_URL), if set.
  pub fn api_url_from_env() -> Option<String> {
    std::env::var("COSVIEW_API_URL")
      .ok()
      .filter(|v| !v.trim().is_empty())
  }

  /// Replace the API base URL when an override is given.
  pub fn with_api_url(self, api_url: Option<String>) -> Self {
    match api_url {
      Some(base_url) => Config {
        api: ApiConfig {
          base_url,
          ..self.api
        },
        ..self
      },
      None => self,
    }
  }

  /// Parsed address-bar root, always ending in `/`.
  pub fn web_base(&self) -> Result<Url> {
    let mut url = Url::parse(&self.web_url)
      .map_err(|e| eyre!("Invalid web_url '{}': {}", self.web_url, e))?;
    if !url.path().ends_with('/') {
      let path = format!("{}/", url.path());
      url.set_path(&path);
    }
    Ok(url)
  }

  pub fn cache_options(&self) -> CacheOptions {
    CacheOptions {
      keep_unused_for: Duration::from_secs(self.cache.keep_unused_secs),
      max_entries: self.cache.max_entries.max(1),
    }
  }

  /// List page defaults for an endpoint, with configured page size applied.
  pub fn profile(&self, endpoint: Endpoint) -> ListProfile {
    let profile = ListProfile::for_endpoint(endpoint);
    match self.page_sizes.get(endpoint.key()) {
      Some(&size) if size > 0 => profile.with_page_size(size),
      _ => profile,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  #[test]
  fn test_defaults_without_file_content() {
    let config = Config::default();
    assert_eq!(config.api.base_url, "http://localhost:8000/api");
    assert_eq!(config.cache_options(), CacheOptions::default());
    assert_eq!(config.profile(Endpoint::Videos).page_size, 20);
  }

  #[test]
  fn test_load_partial_yaml() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
      file,
      "api:\n  base_url: https://cos.example.com/api\ncache:\n  max_entries: 10\npage_sizes:\n  groups: 24\n"
    )
    .unwrap();

    let config = Config::load(Some(file.path())).unwrap();
    assert_eq!(config.api.base_url, "https://cos.example.com/api");
    assert_eq!(config.api.timeout_secs, 30);
    assert_eq!(config.cache.max_entries, 10);
    assert_eq!(config.cache.keep_unused_secs, 60);
    assert_eq!(config.profile(Endpoint::Groups).page_size, 24);
    assert_eq!(config.profile(Endpoint::Competitions).page_size, 12);
  }

  #[test]
  fn test_explicit_missing_path_is_an_error() {
    let result = Config::load(Some(Path::new("/nonexistent/cosview.yaml")));
    assert!(result.is_err());
  }

  #[test]
  fn test_invalid_yaml_is_an_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "api: [not, a, map").unwrap();
    assert!(Config::load(Some(file.path())).is_err());
  }

  #[test]
  fn test_api_url_override() {
    let config = Config::default().with_api_url(Some("http://10.0.0.2/api".to_string()));
    assert_eq!(config.api.base_url, "http://10.0.0.2/api");
    assert_eq!(config.api.timeout_secs, 30);

    let unchanged = Config::default().with_api_url(None);
    assert_eq!(unchanged.api.base_url, DEFAULT_API_URL);
  }

  #[test]
  fn test_web_base_gets_trailing_slash() {
    let config = Config {
      web_url: "https://cos.example.com/app".to_string(),
      ..Config::default()
    };
    assert_eq!(
      config.web_base().unwrap().as_str(),
      "https://cos.example.com/app/"
    );
  }

  #[test]
  fn test_zero_page_size_override_is_ignored() {
    let mut config = Config::default();
    config.page_sizes.insert("tags".to_string(), 0);
    assert_eq!(config.profile(Endpoint::Tags).page_size, 50);
  }
}
