//! Code generation for Python bindings
//!
//! This module provides generators for:
//! - one PyO3 binding module per namespace (`<ns>.rs`)
//! - the top-level index module registering every namespace (`mod.rs`)

pub mod binding;
pub mod index;

pub use binding::{BindingGenerator, BindingOptions};
pub use index::IndexGenerator;

/// First line of every generated file. Files starting with it are owned by
/// the generator and may be deleted on regeneration.
pub const GENERATED_MARKER: &str = "// @generated by pyweld";

/// Full header line written at the top of generated files
pub fn header_line() -> String {
    format!("{}. Do not edit by hand.\n", GENERATED_MARKER)
}

/// Whether generated text starts with the marker
pub fn is_generated(content: &str) -> bool {
    content.starts_with(GENERATED_MARKER)
}

/// Escape an identifier that collides with a Rust keyword (`type` -> `r#type`)
pub fn escape_ident(name: &str) -> String {
    if name.starts_with("r#") || syn::parse_str::<syn::Ident>(name).is_ok() {
        name.to_string()
    } else {
        format!("r#{}", name)
    }
}

/// Path of a source item as seen from the binding crate
pub fn source_path(source_crate: &str, module_path: &[String], name: &str) -> String {
    let mut path = vec![source_crate.to_string()];
    path.extend(module_path.iter().map(|s| escape_ident(s)));
    path.push(escape_ident(name));
    path.join("::")
}
