// File: src/config.rs
// Purpose: Configuration parsing from waypost.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use waypost_codegen::Options;

pub const CONFIG_FILE: &str = "waypost.toml";

/// Generator configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub app: AppConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub imports: ImportsConfig,
}

/// Where the application sources live
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory scanned for route/page/middleware files (default: "app")
    #[serde(default = "default_app_dir")]
    pub dir: PathBuf,
}

/// Generated module settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: PathBuf,

    /// Crate the generated code registers against (default: "waypost")
    #[serde(default = "default_runtime_crate")]
    pub runtime_crate: String,
}

/// Import sanitizing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportsConfig {
    /// Link irregular directories into `staging_dir` (default: true)
    #[serde(default = "default_true")]
    pub materialize: bool,

    #[serde(default = "default_staging_dir")]
    pub staging_dir: PathBuf,
}

// Default values
fn default_app_dir() -> PathBuf {
    PathBuf::from("app")
}

fn default_output_path() -> PathBuf {
    PathBuf::from("src/routes_gen.rs")
}

fn default_runtime_crate() -> String {
    "waypost".to_string()
}

fn default_staging_dir() -> PathBuf {
    PathBuf::from(".waypost/imports")
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dir: default_app_dir(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            runtime_crate: default_runtime_crate(),
        }
    }
}

impl Default for ImportsConfig {
    fn default() -> Self {
        Self {
            materialize: true,
            staging_dir: default_staging_dir(),
        }
    }
}

impl Config {
    /// Load configuration from a waypost.toml; a missing or empty file means defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(config)
    }

    /// Pipeline options with every path resolved against `root`
    pub fn to_options(&self, root: &Path) -> Options {
        Options {
            app_dir: self.app.dir.clone(),
            output: self.output.path.clone(),
            runtime_crate: self.output.runtime_crate.clone(),
            materialize: self.imports.materialize,
            staging_dir: self.imports.staging_dir.clone(),
        }
        .rooted(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.app.dir, PathBuf::from("app"));
        assert_eq!(config.output.path, PathBuf::from("src/routes_gen.rs"));
        assert_eq!(config.output.runtime_crate, "waypost");
        assert!(config.imports.materialize);
        assert_eq!(config.imports.staging_dir, PathBuf::from(".waypost/imports"));
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [app]
            dir = "routes"

            [imports]
            materialize = false
            "#,
        )
        .unwrap();

        assert_eq!(config.app.dir, PathBuf::from("routes"));
        assert!(!config.imports.materialize);
        assert_eq!(config.imports.staging_dir, PathBuf::from(".waypost/imports"));
        assert_eq!(config.output.runtime_crate, "waypost");
    }

    #[test]
    fn test_missing_and_empty_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = Config::load(dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(missing.output.path, PathBuf::from("src/routes_gen.rs"));

        let empty = dir.path().join(CONFIG_FILE);
        fs::write(&empty, "  \n").unwrap();
        assert_eq!(Config::load(&empty).unwrap().app.dir, PathBuf::from("app"));
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[app\ndir = 3").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_options_are_rooted() {
        let options = Config::default().to_options(Path::new("/srv/site"));
        assert_eq!(options.app_dir, PathBuf::from("/srv/site/app"));
        assert_eq!(options.output, PathBuf::from("/srv/site/src/routes_gen.rs"));
        assert_eq!(options.staging_dir, PathBuf::from("/srv/site/.waypost/imports"));
    }
}
