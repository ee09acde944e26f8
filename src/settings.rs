use std::collections::HashMap;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::{AsshError, Result};

/// Operator configuration: where private keys live, keyed by AWS profile and
/// keypair name.
///
/// ```json
/// {
///   "profiles": { "work": { "testkey": "~/.ssh/work-testkey.pem" } },
///   "default-keypairs": { "testkey": "~/.ssh/testkey.pem" },
///   "default-key": "~/.ssh/id_ed25519"
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Settings {
    /// Per-profile keypair-name to key-path overrides.
    pub profiles: HashMap<String, HashMap<String, String>>,
    /// Keypair-name to key-path defaults, any profile.
    pub default_keypairs: HashMap<String, String>,
    /// Last-resort key path.
    pub default_key: Option<String>,
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "assh").map(|dirs| dirs.config_dir().join("config.json"))
    }

    pub fn load() -> Result<Self> {
        let path = Self::config_path()
            .ok_or_else(|| AsshError::Config("cannot determine config directory".to_string()))?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&content)
            .map_err(|e| AsshError::Config(format!("failed to parse {}: {e}", path.display())))?;

        Ok(settings)
    }

    /// Identity-file lookup chain, first match wins: per-profile-per-keyname,
    /// global per-keyname, global default key. The default key applies even
    /// when the instance carries no keyname.
    pub fn identity_file(&self, profile: Option<&str>, keyname: Option<&str>) -> Option<&str> {
        profile
            .and_then(|p| self.profiles.get(p))
            .and_then(|keys| keyname.and_then(|k| keys.get(k)))
            .or_else(|| keyname.and_then(|k| self.default_keypairs.get(k)))
            .or(self.default_key.as_ref())
            .map(String::as_str)
    }
}
