//! # pyweld
//!
//! Python binding generator for venue crates.
//!
//! pyweld reads the Rust sources of a venue library as text, picks the
//! records, enumerations and client methods worth exposing, and writes one
//! PyO3 module per venue plus an index module that registers them all.
//!
//! ## Pipeline
//!
//! - [`scan`]: walks the source root in a stable order
//! - [`extract`]: parses files with `syn` and derives each file's namespace
//! - [`classify`]: versioned allow-lists decide what is exposed
//! - [`ir`]: declarations, the type mapping and the per-namespace bundle
//! - [`codegen`]: renders binding modules and the index module
//! - [`build`]: runs everything and writes the output directory
//!
//! ## Example
//!
//! ```ignore
//! use pyweld::{BindingBuilder, GeneratorConfig};
//!
//! let config = GeneratorConfig::load("pyweld.toml")?;
//! let report = BindingBuilder::new(config).build()?;
//! println!("{} namespaces written", report.namespaces.len());
//! ```

pub mod build;
pub mod classify;
pub mod codegen;
pub mod config;
pub mod error;
pub mod extract;
pub mod ir;
pub mod scan;

pub use build::{BindingBuilder, GenerationReport, NamespaceOutput, SkippedFile};
pub use classify::{AllowList, ExposureClassifier, OWNER_TERMS_V1, RECORD_TERMS_V1};
pub use codegen::{BindingGenerator, BindingOptions, IndexGenerator, GENERATED_MARKER};
pub use config::{GeneratorConfig, CONFIG_FILE_NAME};
pub use error::{WeldError, WeldResult};
pub use extract::{derive_namespace, DeclarationExtractor, NamespaceInfo};
pub use ir::{map_type, Declaration, MappedType, NamespaceBundle, ScalarKind};
pub use scan::SourceScanner;
