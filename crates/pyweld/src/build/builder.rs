//! BindingBuilder drives a complete generation run
//!
//! scan -> extract -> classify -> bundle -> emit. Only missing input, bad
//! configuration and output failures abort a run; everything else is
//! recorded in the [`GenerationReport`].

use crate::build::report::{GenerationReport, NamespaceOutput, SkippedFile};
use crate::classify::ExposureClassifier;
use crate::codegen::{is_generated, BindingGenerator, BindingOptions, IndexGenerator, GENERATED_MARKER};
use crate::config::GeneratorConfig;
use crate::error::{WeldError, WeldResult};
use crate::extract::DeclarationExtractor;
use crate::ir::{Declaration, NamespaceBundle};
use crate::scan::SourceScanner;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the generated index module
pub const INDEX_FILE_NAME: &str = "mod.rs";

/// Declarations gathered from the source tree, ready for emission
#[derive(Debug, Default)]
pub struct CollectedSources {
    pub bundle: NamespaceBundle,
    pub files_scanned: usize,
    pub skipped: Vec<SkippedFile>,
}

/// Builder for binding generation runs
///
/// # Example
/// ```ignore
/// use pyweld::{BindingBuilder, GeneratorConfig};
///
/// let config = GeneratorConfig::new()
///     .source_root("../venues/src")
///     .output_dir("src/generated");
/// let report = BindingBuilder::new(config).build()?;
/// for ns in &report.namespaces {
///     println!("{}", ns.summary_line());
/// }
/// ```
pub struct BindingBuilder {
    config: GeneratorConfig,
    classifier: ExposureClassifier,
}

impl BindingBuilder {
    /// Create a builder using the default allow-lists
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            classifier: ExposureClassifier::default(),
        }
    }

    /// Use a different exposure classifier
    pub fn classifier(mut self, classifier: ExposureClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Scan, extract and classify without touching the output directory
    pub fn collect(&self) -> WeldResult<CollectedSources> {
        self.config.validate()?;

        let scanner = SourceScanner::new(&self.config.source_root, &self.config.extension);
        let extractor = DeclarationExtractor::new(self.config.marker_components());
        let mut collected = CollectedSources::default();

        for path in scanner.scan()? {
            collected.files_scanned += 1;

            let info = extractor.namespace_of(&path);
            if info.is_unknown() && !self.config.emit_unknown {
                tracing::debug!("no namespace for {}, skipping", path.display());
                continue;
            }

            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                Err(err) => {
                    skip(&mut collected.skipped, path, err.to_string());
                    continue;
                }
            };

            let declarations = match extractor.extract(&path, &content) {
                Ok(declarations) => declarations,
                Err(err) => {
                    skip(&mut collected.skipped, path, err.to_string());
                    continue;
                }
            };

            for declaration in declarations {
                if let Some(declaration) = self.admit(declaration) {
                    collected.bundle.insert(declaration);
                }
            }
        }

        Ok(collected)
    }

    /// Apply exposure rules; collections keep only wrappable methods
    fn admit(&self, declaration: Declaration) -> Option<Declaration> {
        if !self.classifier.should_expose(&declaration) {
            return None;
        }
        match declaration {
            Declaration::MethodCollection(mut collection) => {
                collection
                    .methods
                    .retain(|m| self.classifier.should_wrap(m));
                if collection.methods.is_empty() {
                    return None;
                }
                Some(Declaration::MethodCollection(collection))
            }
            other => Some(other),
        }
    }

    /// Run the pipeline and write every output file
    pub fn build(&self) -> WeldResult<GenerationReport> {
        let collected = self.collect()?;
        let output_dir = &self.config.output_dir;

        fs::create_dir_all(output_dir).map_err(|e| WeldError::io(output_dir, e))?;
        let removed = remove_generated(output_dir)?;

        let options = BindingOptions::from(&self.config);
        let mut namespaces = Vec::new();
        for namespace in collected.bundle.namespaces() {
            if namespace.is_empty() {
                continue;
            }
            if format!("{}.rs", namespace.name) == INDEX_FILE_NAME {
                tracing::warn!(
                    "namespace `{}` would overwrite the index module, skipping",
                    namespace.name
                );
                continue;
            }

            let path = output_dir.join(format!("{}.rs", namespace.name));
            let generator = BindingGenerator::new(namespace, &options);
            fs::write(&path, generator.generate()).map_err(|e| WeldError::io(&path, e))?;

            let output = NamespaceOutput::new(namespace, path, generator.method_count());
            tracing::info!(
                namespace = %output.name,
                records = output.records,
                enumerations = output.enumerations,
                methods = output.methods,
                "wrote {}",
                output.path.display()
            );
            namespaces.push(output);
        }

        let index_path = output_dir.join(INDEX_FILE_NAME);
        let index = IndexGenerator::new(
            &self.config.package,
            namespaces.iter().map(|ns| ns.name.as_str()),
        )
        .generate();
        fs::write(&index_path, index).map_err(|e| WeldError::io(&index_path, e))?;

        Ok(GenerationReport {
            files_scanned: collected.files_scanned,
            namespaces,
            skipped: collected.skipped,
            collisions: collected.bundle.collisions(),
            removed,
            index_path,
        })
    }
}

fn skip(skipped: &mut Vec<SkippedFile>, path: PathBuf, reason: String) {
    tracing::warn!("skipping {}: {}", path.display(), reason);
    skipped.push(SkippedFile { path, reason });
}

/// Delete files in `dir` (not below it) that start with the generated
/// marker. Hand-written files are left alone.
fn remove_generated(dir: &Path) -> WeldResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| WeldError::io(dir, e))?;
    let mut removed = Vec::new();

    for entry in entries {
        let path = entry.map_err(|e| WeldError::io(dir, e))?.path();
        if !path.is_file() {
            continue;
        }

        let Ok(bytes) = fs::read(&path) else {
            continue;
        };
        let generated = std::str::from_utf8(&bytes[..bytes.len().min(GENERATED_MARKER.len())])
            .is_ok_and(is_generated);
        if generated {
            fs::remove_file(&path).map_err(|e| {
                WeldError::output(format!("cannot remove {}: {}", path.display(), e))
            })?;
            tracing::debug!("removed previously generated {}", path.display());
            removed.push(path);
        }
    }

    removed.sort();
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn config(temp: &TempDir) -> GeneratorConfig {
        GeneratorConfig::new()
            .source_root(temp.path().join("venues/src"))
            .output_dir(temp.path().join("out"))
    }

    #[test]
    fn test_collect_filters_declarations() {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            "venues/src/alpha/client.rs",
            r#"
            pub struct RestClient { base_url: String }
            impl RestClient {
                pub fn new() -> Self { todo!() }
                fn sign(&self) {}
            }
            pub struct Signer;
            pub struct TickerData { pub last: f64 }
            "#,
        );

        let collected = BindingBuilder::new(config(&temp)).collect().unwrap();
        let alpha = collected.bundle.get("alpha").unwrap();

        assert_eq!(collected.files_scanned, 1);
        let records: Vec<_> = alpha.records.keys().cloned().collect();
        assert_eq!(records, vec!["RestClient", "TickerData"]);
        // Neither `new` nor private `sign` are wrappable
        assert!(alpha.collections.is_empty());
    }

    #[test]
    fn test_unknown_namespace_needs_opt_in() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "venues/src/lib.rs", "pub struct SharedConfig { pub retries: u32 }");

        let collected = BindingBuilder::new(config(&temp)).collect().unwrap();
        assert_eq!(collected.files_scanned, 1);
        assert!(collected.bundle.is_empty());

        let collected = BindingBuilder::new(config(&temp).emit_unknown(true))
            .collect()
            .unwrap();
        assert!(collected.bundle.get("unknown").is_some());
    }

    #[test]
    fn test_parse_failure_is_skipped() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "venues/src/alpha/broken.rs", "pub struct OrderInfo {");
        write(temp.path(), "venues/src/alpha/ok.rs", "pub struct OrderInfo { pub id: u64 }");

        let report = BindingBuilder::new(config(&temp)).build().unwrap();
        assert_eq!(report.skipped.len(), 1);
        assert!(report.skipped[0].path.ends_with("broken.rs"));
        assert_eq!(report.namespace("alpha").unwrap().records, 1);
    }

    #[test]
    fn test_invalid_config_is_fatal() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "venues/src/alpha/ok.rs", "");
        let result = BindingBuilder::new(config(&temp).package("not-a-module")).build();
        assert!(matches!(result, Err(WeldError::Config(_))));
    }

    #[test]
    fn test_remove_generated_only_touches_marked_files() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "old.rs", "// @generated by pyweld. Do not edit by hand.\n");
        write(temp.path(), "helpers.rs", "//! Hand-written\n");
        write(temp.path(), "nested/deep.rs", "// @generated by pyweld\n");

        let removed = remove_generated(temp.path()).unwrap();
        assert_eq!(removed, vec![temp.path().join("old.rs")]);
        assert!(temp.path().join("helpers.rs").exists());
        assert!(temp.path().join("nested/deep.rs").exists());
    }
}
