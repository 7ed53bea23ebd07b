//! Persistent configuration: a small TOML file of defaults.
//!
//! The file lives in the platform config directory
//! (`~/.config/docparse/config.toml` on Linux) and holds the API key plus
//! default output settings, editable through `docparse config set`. All keys
//! are plain strings; values with a closed set are validated on `set`, and
//! again when they are actually used, so a hand-edited file fails loudly at
//! the point of use rather than silently falling back.
//!
//! Environment always wins over the file: `UPSTAGE_API_KEY` overrides the
//! stored key, and `DOCPARSE_CONFIG_PATH` relocates the file itself.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::types::{OcrStrategy, ParseMode};
use crate::error::DocParseError;
use crate::format::OutputFormat;

/// Environment variable that overrides the stored API key.
pub const ENV_API_KEY: &str = "UPSTAGE_API_KEY";

/// Environment variable that relocates the config file.
pub const ENV_CONFIG_PATH: &str = "DOCPARSE_CONFIG_PATH";

/// The recognized `config set`/`get` keys, in listing order.
pub const CONFIG_KEYS: &[&str] = &[
    "api-key",
    "default-format",
    "default-mode",
    "default-ocr",
    "output-dir",
];

/// On-disk configuration. Field values are the raw strings the user set;
/// empty means unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: String,
    pub default_format: String,
    pub default_mode: String,
    pub default_ocr: String,
    pub output_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            default_format: "markdown".to_string(),
            default_mode: "standard".to_string(),
            default_ocr: "auto".to_string(),
            output_dir: String::new(),
        }
    }
}

impl Config {
    /// Set `key` to `value`, validating closed-set values.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), DocParseError> {
        match key {
            "api-key" => self.api_key = value.to_string(),
            "default-format" => {
                if !matches!(value, "html" | "markdown" | "text") {
                    return Err(DocParseError::InvalidConfigValue {
                        key: "format",
                        allowed: "html, markdown, or text",
                    });
                }
                self.default_format = value.to_string();
            }
            "default-mode" => {
                value.parse::<ParseMode>()?;
                self.default_mode = value.to_string();
            }
            "default-ocr" => {
                value.parse::<OcrStrategy>()?;
                self.default_ocr = value.to_string();
            }
            "output-dir" => self.output_dir = value.to_string(),
            _ => {
                return Err(DocParseError::UnknownConfigKey {
                    key: key.to_string(),
                })
            }
        }
        Ok(())
    }

    /// The raw stored value for `key`. Callers mask `api-key` for display.
    pub fn get(&self, key: &str) -> Result<String, DocParseError> {
        match key {
            "api-key" => Ok(self.api_key.clone()),
            "default-format" => Ok(self.default_format.clone()),
            "default-mode" => Ok(self.default_mode.clone()),
            "default-ocr" => Ok(self.default_ocr.clone()),
            "output-dir" => Ok(self.output_dir.clone()),
            _ => Err(DocParseError::UnknownConfigKey {
                key: key.to_string(),
            }),
        }
    }

    /// All key/value pairs in [`CONFIG_KEYS`] order, values unmasked.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        CONFIG_KEYS
            .iter()
            .map(|key| (*key, self.get(key).unwrap_or_default()))
            .collect()
    }

    /// The stored default format, parsed. Errors on a hand-edited value
    /// outside the closed set.
    pub fn format(&self) -> Result<OutputFormat, DocParseError> {
        self.default_format.parse()
    }

    /// The stored default parse mode, parsed.
    pub fn mode(&self) -> Result<ParseMode, DocParseError> {
        self.default_mode.parse()
    }

    /// The stored default OCR strategy, parsed.
    pub fn ocr(&self) -> Result<OcrStrategy, DocParseError> {
        self.default_ocr.parse()
    }

    /// Overwrite the stored API key with `UPSTAGE_API_KEY` when it is set
    /// and non-empty.
    pub fn apply_env(&mut self) {
        if let Ok(key) = env::var(ENV_API_KEY) {
            if !key.is_empty() {
                self.api_key = key;
            }
        }
    }

    /// Load from `path`; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Config, DocParseError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no config file at {}, using defaults", path.display());
                return Ok(Config::default());
            }
            Err(source) => {
                return Err(DocParseError::ConfigRead {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        toml::from_str(&text).map_err(|source| DocParseError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write to `path`, creating parent directories. The file holds the API
    /// key, so it is created with `0600` permissions from the start.
    pub fn save_to(&self, path: &Path) -> Result<(), DocParseError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| DocParseError::ConfigDirCreate {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let text =
            toml::to_string_pretty(self).map_err(|source| DocParseError::ConfigEncode { source })?;
        write_private(path, &text).map_err(|source| DocParseError::ConfigWrite {
            path: path.to_path_buf(),
            source,
        })?;

        debug!("config saved to {}", path.display());
        Ok(())
    }

    /// Where the config file lives: `DOCPARSE_CONFIG_PATH` when set,
    /// otherwise the platform config directory.
    pub fn default_path() -> Result<PathBuf, DocParseError> {
        if let Ok(path) = env::var(ENV_CONFIG_PATH) {
            if !path.is_empty() {
                return Ok(PathBuf::from(path));
            }
        }
        let dirs =
            ProjectDirs::from("", "", "docparse").ok_or(DocParseError::ConfigDirUnavailable)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// Create or truncate `path` owner-readable only; no instant exists where
/// the contents are on disk with wider permissions.
#[cfg(unix)]
fn write_private(path: &Path, contents: &str) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(contents.as_bytes())
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &str) -> std::io::Result<()> {
    fs::write(path, contents)
}

/// Delete the config file; a file that never existed counts as deleted.
pub fn remove_config_file(path: &Path) -> Result<(), DocParseError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(DocParseError::ConfigWrite {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Mask an API key for display: all but the last few characters hidden, and
/// short keys hidden entirely.
pub fn mask_api_key(key: &str) -> String {
    if key.is_empty() {
        return String::new();
    }
    let len = key.chars().count();
    if len <= 4 {
        return "*".repeat(len);
    }
    let visible = (len - 4).min(12);
    let tail: String = key.chars().skip(len - visible).collect();
    format!("****{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = Config::default();
        assert_eq!(cfg.api_key, "");
        assert_eq!(cfg.default_format, "markdown");
        assert_eq!(cfg.default_mode, "standard");
        assert_eq!(cfg.default_ocr, "auto");
        assert_eq!(cfg.output_dir, "");
    }

    #[test]
    fn set_then_get_round_trips_every_key() {
        let mut cfg = Config::default();
        cfg.set("api-key", "up_secret").unwrap();
        cfg.set("default-format", "html").unwrap();
        cfg.set("default-mode", "enhanced").unwrap();
        cfg.set("default-ocr", "force").unwrap();
        cfg.set("output-dir", "/tmp/out").unwrap();

        assert_eq!(cfg.get("api-key").unwrap(), "up_secret");
        assert_eq!(cfg.get("default-format").unwrap(), "html");
        assert_eq!(cfg.get("default-mode").unwrap(), "enhanced");
        assert_eq!(cfg.get("default-ocr").unwrap(), "force");
        assert_eq!(cfg.get("output-dir").unwrap(), "/tmp/out");
    }

    #[test]
    fn unknown_key_is_rejected_on_set_and_get() {
        let mut cfg = Config::default();
        let err = cfg.set("favorite-color", "red").unwrap_err();
        assert_eq!(err.to_string(), "unknown configuration key: favorite-color");
        let err = cfg.get("favorite-color").unwrap_err();
        assert_eq!(err.to_string(), "unknown configuration key: favorite-color");
    }

    #[test]
    fn closed_set_values_are_validated() {
        let mut cfg = Config::default();

        let err = cfg.set("default-format", "yaml").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid format: must be html, markdown, or text"
        );

        let err = cfg.set("default-mode", "fast").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid mode: must be standard, enhanced, or auto"
        );

        let err = cfg.set("default-ocr", "never").unwrap_err();
        assert_eq!(err.to_string(), "invalid ocr: must be auto or force");

        // Failed sets leave the previous values in place.
        assert_eq!(cfg.default_format, "markdown");
        assert_eq!(cfg.default_mode, "standard");
        assert_eq!(cfg.default_ocr, "auto");
    }

    #[test]
    fn json_is_not_a_persistable_default_format() {
        // `--json` exists per-invocation; the stored default stays one of the
        // three document renderings.
        let mut cfg = Config::default();
        assert!(cfg.set("default-format", "json").is_err());
    }

    #[test]
    fn entries_follow_key_listing_order() {
        let cfg = Config::default();
        let keys: Vec<&str> = cfg.entries().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, CONFIG_KEYS);
    }

    #[test]
    fn save_and_load_round_trip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/dir/config.toml");

        let mut cfg = Config::default();
        cfg.set("api-key", "up_secret").unwrap();
        cfg.set("default-format", "text").unwrap();
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, cfg);
    }

    #[cfg(unix)]
    #[test]
    fn save_creates_the_file_owner_readable_only() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");

        let mut cfg = Config::default();
        cfg.set("api-key", "up_secret").unwrap();
        cfg.save_to(&path).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        // Saving over the existing file keeps it private.
        cfg.set("default-format", "html").unwrap();
        cfg.save_to(&path).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn missing_file_loads_as_defaults() {
        let tmp = TempDir::new().unwrap();
        let cfg = Config::load_from(&tmp.path().join("absent.toml")).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_keys() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "api_key = \"up_secret\"\n").unwrap();

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.api_key, "up_secret");
        assert_eq!(cfg.default_format, "markdown");
        assert_eq!(cfg.default_mode, "standard");
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "][ not toml").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, DocParseError::ConfigParse { .. }));
        assert!(err.to_string().starts_with("failed to parse config file"));
    }

    #[test]
    fn typed_getters_parse_stored_strings() {
        let mut cfg = Config::default();
        assert_eq!(cfg.format().unwrap(), OutputFormat::Markdown);
        assert_eq!(cfg.mode().unwrap(), ParseMode::Standard);
        assert_eq!(cfg.ocr().unwrap(), OcrStrategy::Auto);

        cfg.default_format = "html".into();
        assert_eq!(cfg.format().unwrap(), OutputFormat::Html);

        // A hand-edited file can hold anything; using it surfaces the error.
        cfg.default_format = "docx".into();
        assert!(cfg.format().is_err());
    }

    #[test]
    fn remove_ignores_a_missing_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        remove_config_file(&path).unwrap();

        fs::write(&path, "api_key = \"x\"\n").unwrap();
        remove_config_file(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn env_api_key_overrides_the_stored_key() {
        let mut cfg = Config::default();
        cfg.api_key = "file-key".into();

        env::set_var(ENV_API_KEY, "env-key");
        cfg.apply_env();
        env::remove_var(ENV_API_KEY);

        assert_eq!(cfg.api_key, "env-key");
    }

    #[test]
    fn mask_hides_short_keys_entirely() {
        assert_eq!(mask_api_key(""), "");
        assert_eq!(mask_api_key("abc"), "***");
        assert_eq!(mask_api_key("abcd"), "****");
    }

    #[test]
    fn mask_shows_at_most_twelve_trailing_characters() {
        assert_eq!(mask_api_key("abcde"), "****e");
        assert_eq!(mask_api_key("0123456789abcdef"), "****456789abcdef");
        let long = "up_0123456789abcdef0123456789abcdef";
        assert_eq!(mask_api_key(long), "****456789abcdef");
        assert_eq!(mask_api_key(long).len(), 4 + 12);
    }
}
