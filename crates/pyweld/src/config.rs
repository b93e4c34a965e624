//! Generator configuration
//!
//! Settings come from defaults, an optional `pyweld.toml`, and finally the
//! builder setters (which the CLI uses for its flags).
//!
//! ```toml
//! source_root = "venues/src"
//! output_dir = "python-bindings/src/generated"
//! source_marker = "venues/src"
//! source_crate = "venues"
//! package = "ccrxt"
//! ```

use crate::error::{WeldError, WeldResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "pyweld.toml";

/// Configuration for a generation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Directory scanned for source files
    pub source_root: PathBuf,
    /// Directory receiving the generated modules
    pub output_dir: PathBuf,
    /// Path segments after which the namespace segment follows
    pub source_marker: String,
    /// Crate name the generated code imports source types from
    pub source_crate: String,
    /// Name of the top-level Python package
    pub package: String,
    /// Extension of scanned source files, without the dot
    pub extension: String,
    /// Also emit declarations whose namespace could not be derived
    pub emit_unknown: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            source_root: PathBuf::from("venues/src"),
            output_dir: PathBuf::from("python-bindings/src/generated"),
            source_marker: "venues/src".to_string(),
            source_crate: "venues".to_string(),
            package: "ccrxt".to_string(),
            extension: "rs".to_string(),
            emit_unknown: false,
        }
    }
}

impl GeneratorConfig {
    /// Create a configuration with default paths
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> WeldResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| WeldError::io(path, e))?;
        Self::from_toml(&content)
            .map_err(|e| WeldError::config(format!("{}: {}", path.display(), e)))
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> WeldResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| WeldError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that would make every generated file unusable
    pub fn validate(&self) -> WeldResult<()> {
        if !is_identifier(&self.package) {
            return Err(WeldError::config(format!(
                "package `{}` is not a valid module name",
                self.package
            )));
        }
        if !is_identifier(&self.source_crate) {
            return Err(WeldError::config(format!(
                "source_crate `{}` is not a valid crate name",
                self.source_crate
            )));
        }
        if self.marker_components().is_empty() {
            return Err(WeldError::config("source_marker must not be empty"));
        }
        if self.extension.is_empty() || self.extension.starts_with('.') {
            return Err(WeldError::config(
                "extension must be non-empty and given without a leading dot",
            ));
        }
        Ok(())
    }

    /// Set the source root
    pub fn source_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_root = path.into();
        self
    }

    /// Set the output directory
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = path.into();
        self
    }

    /// Set the namespace marker (e.g. "venues/src")
    pub fn source_marker(mut self, marker: impl Into<String>) -> Self {
        self.source_marker = marker.into();
        self
    }

    /// Set the crate the source types live in
    pub fn source_crate(mut self, name: impl Into<String>) -> Self {
        self.source_crate = name.into();
        self
    }

    /// Set the Python package name
    pub fn package(mut self, name: impl Into<String>) -> Self {
        self.package = name.into();
        self
    }

    /// Set the scanned file extension
    pub fn extension(mut self, ext: impl Into<String>) -> Self {
        self.extension = ext.into();
        self
    }

    /// Emit the `unknown` namespace too
    pub fn emit_unknown(mut self, emit: bool) -> Self {
        self.emit_unknown = emit;
        self
    }

    /// Marker split into path components
    pub fn marker_components(&self) -> Vec<String> {
        Path::new(&self.source_marker)
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect()
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
