//! On-disk daemon configuration (JSON).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::platform::Platform;
use crate::registry::{ErrorPolicy, HotkeyRegistry, RegistryError, RegistryOptions};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One configured hotkey. Without an id the registry assigns the next free one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotkeyBinding {
    pub spec: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i16>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotkeyConfig {
    /// `false` forwards presses to the focused window unless the owner has
    /// focus. The daemon owns the root window, which never has focus, so
    /// `hotkeyd run` ignores `false` (see [`HotkeyConfig::root_options`]).
    #[serde(default = "default_global")]
    pub global: bool,
    #[serde(default)]
    pub suppress_errors: bool,
    #[serde(default)]
    pub no_repeat: bool,
    #[serde(default)]
    pub hotkeys: Vec<HotkeyBinding>,
}

fn default_global() -> bool {
    true
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            global: true,
            suppress_errors: false,
            no_repeat: false,
            hotkeys: Vec::new(),
        }
    }
}

impl HotkeyConfig {
    /// `<config dir>/hotkeyd/config.json`, falling back to the working
    /// directory when the platform has no config dir.
    pub fn default_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        base.join("hotkeyd").join("config.json")
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&data)?;
        tracing::debug!(path = %path.display(), "loaded hotkey config");
        Ok(config)
    }

    /// Load `path`, or return the defaults when it does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data).map_err(io_err)
    }

    pub fn options(&self) -> RegistryOptions {
        RegistryOptions {
            global: self.global,
            policy: if self.suppress_errors {
                ErrorPolicy::Lenient
            } else {
                ErrorPolicy::Strict
            },
            no_repeat: self.no_repeat,
        }
    }

    /// Options for a registry owned by the root window. Window-scoped
    /// dispatch would forward every press, so `global` is forced on.
    pub fn root_options(&self) -> RegistryOptions {
        if !self.global {
            tracing::warn!("global = false has no effect for a root-window owner, firing globally");
        }
        RegistryOptions {
            global: true,
            ..self.options()
        }
    }

    /// Bulk-add the configured hotkeys.
    ///
    /// When every binding carries an id the list goes through `add_many`
    /// with explicit ids. Otherwise the bindings with ids are added first
    /// and the id-less ones after them, each group in file order, so an
    /// auto-assigned id never takes one the file asks for.
    pub fn apply<P: Platform>(&self, registry: &mut HotkeyRegistry<P>) -> Result<(), RegistryError> {
        let specs: Vec<&str> = self.hotkeys.iter().map(|h| h.spec.as_str()).collect();
        let ids: Option<Vec<i16>> = self.hotkeys.iter().map(|h| h.id).collect();

        match ids {
            Some(ids) if !ids.is_empty() => registry.add_many(&specs, Some(ids.as_slice()), false),
            _ if self.hotkeys.iter().all(|h| h.id.is_none()) => {
                registry.add_many(&specs, None, false)
            }
            _ => {
                let (explicit, auto): (Vec<_>, Vec<_>) =
                    self.hotkeys.iter().partition(|h| h.id.is_some());
                for binding in explicit.into_iter().chain(auto) {
                    registry.add(&binding.spec, binding.id)?;
                }
                Ok(())
            }
        }
    }
}
