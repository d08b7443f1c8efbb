// Settings file (rhfill.toml)

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Where fetched documents come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// HTTP download from a URL template (Google Drive by default).
    #[default]
    Http,
    /// Copy from a local mirror directory.
    Dir,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub kind: StoreKind,

    /// Download URL with an `{id}` placeholder
    pub url_template: String,

    /// Environment variable holding the bearer token. Tokens are never
    /// stored in this file.
    pub token_env: String,

    /// Per-document request timeout
    pub timeout_secs: u64,

    /// Mirror directory for `kind = "dir"`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mirror_dir: Option<PathBuf>,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            kind: StoreKind::Http,
            url_template: "https://www.googleapis.com/drive/v3/files/{id}?alt=media".to_string(),
            token_env: "RHFILL_DRIVE_TOKEN".to_string(),
            timeout_secs: 30,
            mirror_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobSettings {
    /// Directory holding one subdirectory per job
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,

    /// Hours a job stays usable after creation
    pub ttl_hours: u64,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self { root: None, ttl_hours: 24 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfSettings {
    /// `pdftotext` program name or path
    pub pdftotext: String,

    /// Pass `-layout` to pdftotext
    pub layout: bool,
}

impl Default for PdfSettings {
    fn default() -> Self {
        Self { pdftotext: "pdftotext".to_string(), layout: false }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub store: StoreSettings,
    pub jobs: JobSettings,
    pub pdf: PdfSettings,
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rhfill")
            .join("rhfill.toml")
    }

    /// Load the user settings file, or defaults when there is none.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = Self::config_path();
        if !path.exists() {
            log::debug!("no settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    /// Load an explicit settings file. Unlike [`load_default`](Self::load_default)
    /// a missing file is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ConfigError::Read { path: path.to_path_buf(), message: e.to_string() })?;
        let settings: Self = toml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: Some(path.to_path_buf()),
            message: e.to_string(),
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse { path: None, message: e.to_string() })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.store.kind {
            StoreKind::Http if !self.store.url_template.contains("{id}") => {
                return Err(ConfigError::Invalid(format!(
                    "store.url_template '{}' has no {{id}} placeholder",
                    self.store.url_template
                )));
            }
            StoreKind::Dir if self.store.mirror_dir.is_none() => {
                return Err(ConfigError::Invalid(
                    "store.kind = \"dir\" requires store.mirror_dir".to_string(),
                ));
            }
            _ => {}
        }
        if self.store.timeout_secs == 0 {
            return Err(ConfigError::Invalid("store.timeout_secs must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.store.timeout_secs)
    }

    /// Job root: configured, else the user cache directory.
    pub fn jobs_root(&self) -> PathBuf {
        self.jobs.root.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("rhfill")
                .join("jobs")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.store.token_env, "RHFILL_DRIVE_TOKEN");
        assert_eq!(settings.timeout(), Duration::from_secs(30));
        assert_eq!(settings.jobs.ttl_hours, 24);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let settings = Settings::from_toml(
            r#"
            [store]
            kind = "dir"
            mirror_dir = "/srv/mirror"

            [pdf]
            layout = true
            "#,
        )
        .unwrap();
        assert_eq!(settings.store.kind, StoreKind::Dir);
        assert_eq!(settings.store.mirror_dir, Some(PathBuf::from("/srv/mirror")));
        assert_eq!(settings.store.timeout_secs, 30);
        assert!(settings.pdf.layout);
        assert_eq!(settings.pdf.pdftotext, "pdftotext");
    }

    #[test]
    fn rejects_inconsistent_store() {
        let err = Settings::from_toml("[store]\nkind = \"dir\"\n").unwrap_err();
        assert!(err.to_string().contains("mirror_dir"));

        let err = Settings::from_toml("[store]\nurl_template = \"https://x/files\"\n").unwrap_err();
        assert!(err.to_string().contains("{id}"));

        let err = Settings::from_toml("[store]\ntimeout_secs = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn parse_errors_name_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rhfill.toml");
        fs::write(&path, "[store\n").unwrap();
        let err = Settings::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { path: Some(_), .. }));

        let err = Settings::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn toml_roundtrip() {
        let mut settings = Settings::default();
        settings.jobs.root = Some(PathBuf::from("/var/tmp/rhfill"));
        let back = Settings::from_toml(&settings.to_toml().unwrap()).unwrap();
        assert_eq!(back, settings);
        assert_eq!(back.jobs_root(), PathBuf::from("/var/tmp/rhfill"));
    }
}
