//! Namespace derivation from source paths

use serde::{Deserialize, Serialize};
use std::path::{Component, Path};

/// Namespace used when a path has no segment after the marker
pub const UNKNOWN_NAMESPACE: &str = "unknown";

/// File stems that do not add a module path segment
const TRANSPARENT_STEMS: &[&str] = &["mod", "lib", "main"];

/// Where a source file sits in the venue crate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceInfo {
    /// Namespace (venue) name, a valid Rust identifier
    pub name: String,
    /// Module path below the crate root, namespace first
    pub module_path: Vec<String>,
}

impl NamespaceInfo {
    fn unknown() -> Self {
        Self {
            name: UNKNOWN_NAMESPACE.to_string(),
            module_path: Vec::new(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.name == UNKNOWN_NAMESPACE
    }
}

/// Derive the namespace of `path` from the first directory after `marker`.
///
/// `venues/src/binance/spot/rest/client.rs` with marker `[venues, src]`
/// gives namespace `binance` and module path `binance::spot::rest::client`.
pub fn derive_namespace(path: &Path, marker: &[String]) -> NamespaceInfo {
    let parts: Vec<String> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if marker.is_empty() || parts.len() <= marker.len() {
        return NamespaceInfo::unknown();
    }

    let Some(start) = parts
        .windows(marker.len())
        .position(|window| window == marker)
    else {
        return NamespaceInfo::unknown();
    };

    let rest = &parts[start + marker.len()..];
    // The namespace must be a directory, not the file itself
    if rest.len() < 2 {
        return NamespaceInfo::unknown();
    }

    let mut module_path: Vec<String> = rest[..rest.len() - 1]
        .iter()
        .map(|s| sanitize_identifier(s))
        .collect();

    let file = Path::new(&rest[rest.len() - 1]);
    if let Some(stem) = file.file_stem().map(|s| s.to_string_lossy()) {
        if !TRANSPARENT_STEMS.contains(&stem.as_ref()) {
            module_path.push(sanitize_identifier(&stem));
        }
    }

    NamespaceInfo {
        name: module_path[0].clone(),
        module_path,
    }
}

/// Turn a path segment into a Rust identifier
pub fn sanitize_identifier(segment: &str) -> String {
    let mut ident: String = segment
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    ident
}
