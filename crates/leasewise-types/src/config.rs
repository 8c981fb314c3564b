//! Configuration schema and loading.
//!
//! Configuration comes from an optional `leasewise.toml` file with
//! environment-variable overrides layered on top:
//!
//! - `LEASEWISE_DATASET` -- path to the VM dataset CSV
//! - `LEASEWISE_OUTPUT_DIR` -- directory holding the savings ledger
//! - `EXA_API_KEY` -- credential for the external search bridge
//!
//! Unknown TOML fields are silently ignored for forward compatibility.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Name of the savings ledger file inside the output directory.
pub const LEDGER_FILE_NAME: &str = "savings_report.csv";

/// Environment variable carrying the search credential.
pub const SEARCH_KEY_ENV: &str = "EXA_API_KEY";

// ── Root config ──────────────────────────────────────────────────────────

/// Root configuration for the leasewise advisor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the VM dataset CSV snapshot.
    #[serde(default = "default_dataset_path")]
    pub dataset_path: PathBuf,

    /// Directory where the savings ledger is written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// External search bridge settings.
    #[serde(default)]
    pub search: SearchConfig,
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from("cloud_cluster_dataset.csv")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dataset_path: default_dataset_path(),
            output_dir: default_output_dir(),
            search: SearchConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from an optional TOML file, then apply
    /// environment overrides.
    ///
    /// A missing file is not an error -- defaults are used. A present
    /// but malformed file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) if p.is_file() => {
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content)?
            }
            _ => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Overlay environment variables on top of the file values.
    fn apply_env(&mut self) {
        if let Ok(path) = std::env::var("LEASEWISE_DATASET")
            && !path.is_empty()
        {
            self.dataset_path = PathBuf::from(path);
        }
        if let Ok(dir) = std::env::var("LEASEWISE_OUTPUT_DIR")
            && !dir.is_empty()
        {
            self.output_dir = PathBuf::from(dir);
        }
        if self.search.api_key.is_none()
            && let Ok(key) = std::env::var(SEARCH_KEY_ENV)
            && !key.is_empty()
        {
            self.search.api_key = Some(key);
        }
    }

    /// Full path of the savings ledger file.
    pub fn ledger_path(&self) -> PathBuf {
        self.output_dir.join(LEDGER_FILE_NAME)
    }
}

// ── Search bridge ────────────────────────────────────────────────────────

/// Settings for the subprocess-backed search bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Search credential. `None` disables the bridge entirely.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Program used to launch the search server.
    #[serde(default = "default_search_command")]
    pub command: String,

    /// Arguments passed to the search server program.
    #[serde(default = "default_search_args")]
    pub args: Vec<String>,
}

fn default_search_command() -> String {
    "npx".into()
}

fn default_search_args() -> Vec<String> {
    vec!["-y".into(), "exa-mcp-server".into()]
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            command: default_search_command(),
            args: default_search_args(),
        }
    }
}

impl SearchConfig {
    /// Whether the search credential is configured.
    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.dataset_path, PathBuf::from("cloud_cluster_dataset.csv"));
        assert_eq!(config.ledger_path(), PathBuf::from("output/savings_report.csv"));
        assert_eq!(config.search.command, "npx");
        assert!(!config.search.is_configured());
    }

    #[test]
    fn load_missing_file_uses_defaults() {
        let config = Config::load(Some(Path::new("/nonexistent/leasewise.toml"))).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("output"));
    }

    #[test]
    fn load_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leasewise.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(
            f,
            "dataset_path = \"/data/fleet.csv\"\n\n[search]\napi_key = \"k-123\""
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.dataset_path, PathBuf::from("/data/fleet.csv"));
        assert!(config.search.is_configured());
        // Unset fields fall back to defaults.
        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert_eq!(config.search.args, vec!["-y", "exa-mcp-server"]);
    }

    #[test]
    fn load_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leasewise.toml");
        std::fs::write(&path, "dataset_path = [not toml").unwrap();
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn empty_api_key_is_not_configured() {
        let search = SearchConfig {
            api_key: Some(String::new()),
            ..SearchConfig::default()
        };
        assert!(!search.is_configured());
    }
}
