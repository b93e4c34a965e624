//! Outcome of a generation run

use crate::error::WeldResult;
use crate::ir::{Collision, Namespace};
use serde::Serialize;
use std::path::PathBuf;

/// A source file left out of the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// One written namespace module
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamespaceOutput {
    pub name: String,
    pub path: PathBuf,
    pub records: usize,
    pub enumerations: usize,
    pub methods: usize,
}

impl NamespaceOutput {
    /// `methods` counts the wrappers actually written, not the methods held
    pub(crate) fn new(namespace: &Namespace, path: PathBuf, methods: usize) -> Self {
        Self {
            name: namespace.name.clone(),
            path,
            records: namespace.records.len(),
            enumerations: namespace.enumerations.len(),
            methods,
        }
    }

    /// Diagnostic line printed by the CLI for this namespace
    pub fn summary_line(&self) -> String {
        format!(
            "Generated bindings for venue: {} ({} records, {} enumerations, {} methods)",
            self.name, self.records, self.enumerations, self.methods
        )
    }
}

/// Everything a run produced or left out
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    /// Source files yielded by the scanner
    pub files_scanned: usize,
    /// Written namespace modules, in name order
    pub namespaces: Vec<NamespaceOutput>,
    pub skipped: Vec<SkippedFile>,
    pub collisions: Vec<Collision>,
    /// Previously generated files deleted before writing
    pub removed: Vec<PathBuf>,
    /// Path of the written `mod.rs`
    pub index_path: PathBuf,
}

impl GenerationReport {
    /// Serialize the report as pretty JSON
    pub fn to_json(&self) -> WeldResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Look up a written namespace
    pub fn namespace(&self, name: &str) -> Option<&NamespaceOutput> {
        self.namespaces.iter().find(|ns| ns.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_line() {
        let output = NamespaceOutput {
            name: "alpha".to_string(),
            path: PathBuf::from("out/alpha.rs"),
            records: 2,
            enumerations: 1,
            methods: 4,
        };
        assert_eq!(
            output.summary_line(),
            "Generated bindings for venue: alpha (2 records, 1 enumerations, 4 methods)"
        );
    }

    #[test]
    fn test_report_json() {
        let report = GenerationReport {
            files_scanned: 3,
            skipped: vec![SkippedFile {
                path: PathBuf::from("venues/src/alpha/bad.rs"),
                reason: "stream did not contain valid UTF-8".to_string(),
            }],
            index_path: PathBuf::from("out/mod.rs"),
            ..Default::default()
        };

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["files_scanned"], 3);
        assert_eq!(json["skipped"][0]["path"], "venues/src/alpha/bad.rs");
        assert_eq!(json["index_path"], "out/mod.rs");
        assert!(report.namespace("alpha").is_none());
    }
}
