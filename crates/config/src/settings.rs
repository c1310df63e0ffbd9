// Importer settings
// Loaded from ~/.config/mainsite/config.toml (or --config / $MAINSITE_CONFIG)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_ENV: &str = "MAINSITE_CONFIG";
pub const SEARCH_URL_ENV: &str = "MAINSITE_SEARCH_URL";
pub const CATALOG_URL_ENV: &str = "MAINSITE_CATALOG_URL";
pub const RESEARCH_URL_ENV: &str = "MAINSITE_RESEARCH_URL";
pub const STORE_ENV: &str = "MAINSITE_STORE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("cannot read {}: {message}", .path.display())]
    Io { path: PathBuf, message: String },

    #[error("invalid config {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("no {name} configured")]
    Missing { name: String, flag: String, env: Option<String> },
}

impl ConfigError {
    /// What the operator can do about it.
    pub fn hint(&self) -> Option<String> {
        match self {
            ConfigError::Missing { flag, env: Some(env), .. } => Some(format!("pass {flag} or set {env}")),
            ConfigError::Missing { flag, env: None, .. } => Some(format!("pass {flag}")),
            ConfigError::NotFound(_) => Some(format!("check --config or ${CONFIG_ENV}")),
            _ => None,
        }
    }
}

/// First non-empty value, else a [`ConfigError::Missing`] naming the flag.
pub fn required(value: Option<&str>, name: &str, flag: &str, env: Option<&str>) -> Result<String, ConfigError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .ok_or_else(|| ConfigError::Missing {
            name: name.to_string(),
            flag: flag.to_string(),
            env: env.map(String::from),
        })
}

/// Search service (degrees, colleges)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self { base_url: None, timeout_secs: 15 }
    }
}

/// Undergraduate catalog document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    pub url: Option<String>,
}

/// Research service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchSettings {
    pub api_url: Option<String>,
    /// Extra query parameters for the researcher listing.
    pub params: BTreeMap<String, String>,
    pub timeout_secs: u64,
    /// Parallel citation sub-fetches.
    pub workers: usize,
}

impl Default for ResearchSettings {
    fn default() -> Self {
        Self { api_url: None, params: BTreeMap::new(), timeout_secs: 10, workers: 4 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpertSettings {
    pub csv_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ExpertSettings {
    fn default() -> Self {
        Self { csv_url: None, timeout_secs: 10 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailSettings {
    /// Site the export came from, when the export does not say.
    pub base_url: Option<String>,
    /// Postmeta holding the person's email.
    pub meta_key: String,
}

impl Default for ThumbnailSettings {
    fn default() -> Self {
        Self { base_url: None, meta_key: "person_email".to_string() }
    }
}

/// Content repository snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub search: SearchSettings,
    pub catalog: CatalogSettings,
    pub research: ResearchSettings,
    pub experts: ExpertSettings,
    pub thumbnails: ThumbnailSettings,
    pub store: StoreSettings,
}

impl Settings {
    /// Default config file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mainsite")
            .join("config.toml")
    }

    /// Load settings from `--config`, `$MAINSITE_CONFIG` or the default
    /// path, then apply environment overrides.
    ///
    /// A missing default file means defaults; a missing file that was
    /// asked for explicitly is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(explicit, |key| std::env::var(key).ok())
    }

    /// [`Settings::load`] with an injectable environment.
    pub fn load_with(explicit: Option<&Path>, env: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let (path, must_exist) = match (explicit, env(CONFIG_ENV).filter(|p| !p.trim().is_empty())) {
            (Some(path), _) => (path.to_path_buf(), true),
            (None, Some(path)) => (PathBuf::from(path), true),
            (None, None) => (Self::config_path(), false),
        };

        let mut settings = Self::from_file(&path, must_exist)?;
        settings.apply_env(env);
        Ok(settings)
    }

    fn from_file(path: &Path, must_exist: bool) -> Result<Self, ConfigError> {
        if !path.exists() {
            return if must_exist { Err(ConfigError::NotFound(path.to_path_buf())) } else { Ok(Self::default()) };
        }
        let contents = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io { path: path.to_path_buf(), message: e.to_string() })?;
        Self::from_toml(&contents).map_err(|message| ConfigError::Parse { path: path.to_path_buf(), message })
    }

    pub fn from_toml(contents: &str) -> Result<Self, String> {
        toml::from_str(contents).map_err(|e| e.to_string())
    }

    /// Environment values win over the file.
    pub fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| env(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(url) = get(SEARCH_URL_ENV) {
            self.search.base_url = Some(url);
        }
        if let Some(url) = get(CATALOG_URL_ENV) {
            self.catalog.url = Some(url);
        }
        if let Some(url) = get(RESEARCH_URL_ENV) {
            self.research.api_url = Some(url);
        }
        if let Some(path) = get(STORE_ENV) {
            self.store.path = Some(PathBuf::from(path));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn empty_file_gives_defaults() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.search.timeout_secs, 15);
        assert_eq!(settings.research.workers, 4);
        assert_eq!(settings.thumbnails.meta_key, "person_email");
    }

    #[test]
    fn parses_sections() {
        let settings = Settings::from_toml(
            r#"
            [search]
            base_url = "https://search.example.edu/api/v1/"

            [research]
            api_url = "https://research.example.edu/api/"
            workers = 8

            [research.params]
            college = "Sciences"

            [store]
            path = "/var/lib/mainsite/store.json"
            "#,
        )
        .unwrap();

        assert_eq!(settings.search.base_url.as_deref(), Some("https://search.example.edu/api/v1/"));
        assert_eq!(settings.search.timeout_secs, 15);
        assert_eq!(settings.research.workers, 8);
        assert_eq!(settings.research.params.get("college").map(String::as_str), Some("Sciences"));
        assert_eq!(settings.store.path, Some(PathBuf::from("/var/lib/mainsite/store.json")));
    }

    #[test]
    fn unknown_types_are_rejected() {
        assert!(Settings::from_toml("[search]\ntimeout_secs = \"soon\"").is_err());
    }

    #[test]
    fn env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[search]\nbase_url = \"https://file.example.edu/\"\n").unwrap();

        let env: HashMap<&str, &str> = [(SEARCH_URL_ENV, "https://env.example.edu/"), (STORE_ENV, "  ")].into();
        let settings = Settings::load_with(Some(path.as_path()), |k| env.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(settings.search.base_url.as_deref(), Some("https://env.example.edu/"));
        assert_eq!(settings.store.path, None);
    }

    #[test]
    fn config_path_from_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.toml");
        fs::write(&path, "[catalog]\nurl = \"https://catalog.example.edu/programs.json\"\n").unwrap();

        let path_str = path.to_string_lossy().to_string();
        let settings = Settings::load_with(None, |k| (k == CONFIG_ENV).then(|| path_str.clone())).unwrap();
        assert_eq!(settings.catalog.url.as_deref(), Some("https://catalog.example.edu/programs.json"));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::load_with(Some(dir.path().join("nope.toml").as_path()), no_env).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
        assert!(err.hint().is_some());
    }

    #[test]
    fn broken_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[search\n").unwrap();
        let err = Settings::load_with(Some(path.as_path()), no_env).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn required_values() {
        assert_eq!(required(Some(" x "), "search URL", "--search-url", None).unwrap(), "x");
        let err = required(Some(""), "search URL", "--search-url", Some(SEARCH_URL_ENV)).unwrap_err();
        assert_eq!(err.to_string(), "no search URL configured");
        assert_eq!(err.hint().as_deref(), Some("pass --search-url or set MAINSITE_SEARCH_URL"));
    }
}
