//! Generation runs
//!
//! This module provides:
//! - [`BindingBuilder`], which drives the whole pipeline and writes output
//! - [`GenerationReport`], what a run produced and what it left out

pub mod builder;
pub mod report;

pub use builder::{BindingBuilder, CollectedSources, INDEX_FILE_NAME};
pub use report::{GenerationReport, NamespaceOutput, SkippedFile};
