//! Top-level index module generator
//!
//! Declares every namespace module and exposes them as submodules of the
//! Python package.

use crate::codegen::{escape_ident, header_line};

/// Generator for the generated `mod.rs`
pub struct IndexGenerator<'a> {
    package: &'a str,
    namespaces: Vec<&'a str>,
}

impl<'a> IndexGenerator<'a> {
    /// Create a new index generator; namespaces are registered in the
    /// order given
    pub fn new(package: &'a str, namespaces: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            package,
            namespaces: namespaces.into_iter().collect(),
        }
    }

    pub fn generate(&self) -> String {
        let mut output = header_line();
        output.push_str(&format!(
            "//! Python package `{}`, one submodule per namespace.\n\n",
            self.package
        ));
        output.push_str("use pyo3::prelude::*;\n\n");

        for ns in &self.namespaces {
            output.push_str(&format!("pub mod {};\n", escape_ident(ns)));
        }
        if !self.namespaces.is_empty() {
            output.push('\n');
        }

        output.push_str(&format!(
            "/// Python entry point for the `{}` package\n",
            self.package
        ));
        output.push_str("#[pymodule]\n");
        output.push_str(&format!(
            "fn {}(py: Python<'_>, m: &PyModule) -> PyResult<()> {{\n",
            self.package
        ));
        output.push_str("    m.add(\"__version__\", env!(\"CARGO_PKG_VERSION\"))?;\n");
        for ns in &self.namespaces {
            output.push_str(&format!(
                "    m.add_submodule({}::create_module(py)?)?;\n",
                escape_ident(ns)
            ));
        }
        output.push_str("    Ok(())\n}\n");
        output
    }
}
