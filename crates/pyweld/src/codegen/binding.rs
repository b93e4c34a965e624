//! PyO3 binding module generator
//!
//! Renders one Rust source file per namespace. Every exposed record becomes
//! a `#[pyclass]` wrapper holding the source value, every enumeration a
//! fieldless `#[pyclass]` enum, and method collections turn into wrapper
//! methods on the type that owns them.

use crate::codegen::{escape_ident, header_line, source_path};
use crate::config::GeneratorConfig;
use crate::extract::type_text;
use crate::ir::{
    map_syn_type, Enumeration, MappedType, Method, MethodCollection, Namespace, Param, Receiver,
    Record,
};
use std::collections::HashSet;
use syn::{GenericArgument, PathArguments, Type};

/// Names a wrapper method must not take
const RESERVED_MEMBERS: &[&str] = &["__repr__", "new", "from_inner"];

/// Identifiers used inside generated wrapper bodies
const RESERVED_LOCALS: &[&str] = &["py", "inner", "value", "self"];

/// Settings shared by every generated module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingOptions {
    /// Top-level Python package name
    pub package: String,
    /// Crate the wrapped types are imported from
    pub source_crate: String,
}

impl BindingOptions {
    pub fn new(package: impl Into<String>, source_crate: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            source_crate: source_crate.into(),
        }
    }
}

impl From<&GeneratorConfig> for BindingOptions {
    fn from(config: &GeneratorConfig) -> Self {
        Self::new(config.package.clone(), config.source_crate.clone())
    }
}

/// Generator for one namespace module
pub struct BindingGenerator<'a> {
    namespace: &'a Namespace,
    options: &'a BindingOptions,
}

impl<'a> BindingGenerator<'a> {
    /// Create a new binding generator for a namespace
    pub fn new(namespace: &'a Namespace, options: &'a BindingOptions) -> Self {
        Self { namespace, options }
    }

    /// Generate the complete module source
    pub fn generate(&self) -> String {
        let mut output = self.generate_header();

        for record in self.namespace.records.values() {
            output.push('\n');
            output.push_str(&self.generate_record(record));
        }

        for enumeration in self.namespace.enumerations.values() {
            output.push('\n');
            output.push_str(&self.generate_enumeration(enumeration));
        }

        for collection in self.namespace.standalone_collections() {
            if self.namespace.enumerations.contains_key(&collection.owner_name) {
                tracing::debug!(
                    "methods of {} not wrapped: name taken by an enumeration",
                    collection.owner_name
                );
                continue;
            }
            output.push('\n');
            output.push_str(&self.generate_standalone(collection));
        }

        output.push('\n');
        output.push_str(&self.generate_create_module());
        output
    }

    /// Python-visible names of the wrapped types, in emission order
    pub fn class_names(&self) -> Vec<&str> {
        self.namespace
            .records
            .keys()
            .chain(self.namespace.enumerations.keys())
            .map(String::as_str)
            .chain(self.standalone_collections().map(|c| c.owner_name.as_str()))
            .collect()
    }

    /// Number of method wrappers the module contains
    pub fn method_count(&self) -> usize {
        let namespace = self.namespace;
        namespace
            .records
            .keys()
            .filter_map(|name| namespace.collection_for(name))
            .chain(self.standalone_collections())
            .map(|collection| self.wrapped_methods(collection).len())
            .sum()
    }

    /// Collections without an emitted record to attach to
    fn standalone_collections(&self) -> impl Iterator<Item = &'a MethodCollection> {
        let namespace = self.namespace;
        namespace
            .standalone_collections()
            .filter(move |c| !namespace.enumerations.contains_key(&c.owner_name))
    }

    fn generate_header(&self) -> String {
        let mut output = header_line();
        output.push_str(&format!(
            "//! Python bindings for the `{}` namespace.\n",
            self.namespace.name
        ));
        output.push_str("//!\n");
        output.push_str("//! Regenerate with `pyweld`; changes made here are overwritten.\n\n");
        output.push_str("#![allow(clippy::all, unused_imports, unused_variables, dead_code)]\n\n");
        output.push_str("use pyo3::exceptions::PyRuntimeError;\n");
        output.push_str("use pyo3::prelude::*;\n\n");
        output.push_str("fn to_py_err(err: impl std::fmt::Display) -> PyErr {\n");
        output.push_str("    PyRuntimeError::new_err(err.to_string())\n");
        output.push_str("}\n");
        output
    }

    fn generate_record(&self, record: &Record) -> String {
        let inner_path = self.path_of(&record.module_path, &record.name);
        let mut output = self.generate_wrapper_struct(&record.name, &inner_path);

        output.push_str("#[pymethods]\n");
        output.push_str(&format!("impl Py{} {{\n", record.name));
        output.push_str(&self.generate_constructor(&record.name));
        output.push_str(&generate_repr());

        for field in record.fields.iter().filter(|f| f.visibility.is_public()) {
            let mapped = field.mapped_type();
            let ident = escape_ident(&field.name);
            output.push_str(&format!(
                "\n    #[getter]\n    fn {}(&self) -> {} {{\n        {}\n    }}\n",
                ident,
                mapped.to_rust(),
                mapped.conversion(&format!("self.inner.{}", ident), false)
            ));
        }

        if let Some(collection) = self.namespace.collection_for(&record.name) {
            output.push_str(&self.generate_methods(&inner_path, collection));
        }
        output.push_str("}\n\n");

        output.push_str(&generate_conversions(&record.name, &inner_path));
        output
    }

    fn generate_standalone(&self, collection: &MethodCollection) -> String {
        let inner_path = self.path_of(&collection.module_path, &collection.owner_name);
        let mut output = self.generate_wrapper_struct(&collection.owner_name, &inner_path);

        output.push_str("#[pymethods]\n");
        output.push_str(&format!("impl Py{} {{\n", collection.owner_name));
        output.push_str(&self.generate_constructor(&collection.owner_name));
        output.push_str(&generate_repr());
        output.push_str(&self.generate_methods(&inner_path, collection));
        output.push_str("}\n\n");

        output.push_str(&generate_conversions(&collection.owner_name, &inner_path));
        output
    }

    fn generate_wrapper_struct(&self, name: &str, inner_path: &str) -> String {
        format!(
            "#[pyclass(name = \"{name}\", module = \"{package}.{ns}\")]\n\
             #[derive(Clone)]\n\
             pub struct Py{name} {{\n    pub(crate) inner: {inner_path},\n}}\n\n",
            name = name,
            package = self.options.package,
            ns = self.namespace.name,
            inner_path = inner_path,
        )
    }

    /// Zero-argument constructor for request types
    fn generate_constructor(&self, name: &str) -> String {
        if !name.ends_with("Request") {
            return String::new();
        }
        "    #[new]\n    fn new() -> Self {\n        Self {\n            inner: Default::default(),\n        }\n    }\n\n"
            .to_string()
    }

    fn generate_enumeration(&self, enumeration: &Enumeration) -> String {
        let source = self.path_of(&enumeration.module_path, &enumeration.name);
        let mut output = String::new();

        output.push_str(&format!(
            "#[pyclass(name = \"{}\", module = \"{}.{}\")]\n",
            enumeration.name, self.options.package, self.namespace.name
        ));
        output.push_str("#[derive(Clone, Copy, Debug, PartialEq, Eq)]\n");
        output.push_str(&format!("pub enum Py{} {{\n", enumeration.name));
        for variant in &enumeration.variants {
            output.push_str(&format!("    {},\n", escape_ident(variant)));
        }
        output.push_str("}\n\n");

        output.push_str(&format!("impl From<&{}> for Py{} {{\n", source, enumeration.name));
        output.push_str(&format!("    fn from(value: &{}) -> Self {{\n", source));
        output.push_str("        match value {\n");
        for variant in &enumeration.variants {
            let variant = escape_ident(variant);
            output.push_str(&format!(
                "            {}::{} {{ .. }} => Py{}::{},\n",
                source, variant, enumeration.name, variant
            ));
        }
        output.push_str("        }\n    }\n}\n");

        if enumeration.unit_only {
            output.push('\n');
            output.push_str(&format!("impl From<Py{}> for {} {{\n", enumeration.name, source));
            output.push_str(&format!("    fn from(value: Py{}) -> Self {{\n", enumeration.name));
            output.push_str("        match value {\n");
            for variant in &enumeration.variants {
                let variant = escape_ident(variant);
                output.push_str(&format!(
                    "            Py{}::{} => {}::{},\n",
                    enumeration.name, variant, source, variant
                ));
            }
            output.push_str("        }\n    }\n}\n");
        }
        output
    }

    /// Members every wrapper of `owner` already defines
    fn generated_members(&self, owner: &str) -> HashSet<String> {
        let mut members: HashSet<String> =
            RESERVED_MEMBERS.iter().map(|s| s.to_string()).collect();
        if let Some(record) = self.namespace.records.get(owner) {
            members.extend(
                record
                    .fields
                    .iter()
                    .filter(|f| f.visibility.is_public())
                    .map(|f| f.name.trim_start_matches("r#").to_string()),
            );
        }
        members
    }

    /// Methods of a collection that get a wrapper, in source order
    fn wrapped_methods<'c>(&self, collection: &'c MethodCollection) -> Vec<&'c Method> {
        let members = self.generated_members(&collection.owner_name);
        collection
            .methods
            .iter()
            .filter(|method| {
                let clashes = members.contains(&method.name);
                if clashes {
                    tracing::debug!(
                        "method {}::{} not wrapped: clashes with a generated member",
                        collection.owner_name,
                        method.name
                    );
                }
                !clashes
            })
            .collect()
    }

    fn generate_methods(&self, owner_path: &str, collection: &MethodCollection) -> String {
        let mut output = String::new();
        for method in self.wrapped_methods(collection) {
            output.push('\n');
            output.push_str(&self.generate_method(owner_path, method));
        }
        output
    }

    fn generate_method(&self, owner_path: &str, method: &Method) -> String {
        let plans: Vec<ParamPlan> = method
            .params
            .iter()
            .map(|p| self.plan_param(p))
            .collect();

        let ident = escape_ident(&method.name);
        let args = plans
            .iter()
            .map(|p| p.call_arg.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let decls: String = plans
            .iter()
            .map(|p| format!("        {}\n", p.binding))
            .collect();

        let mut signature_parts = Vec::new();
        if method.receiver != Receiver::None {
            signature_parts.push("$self".to_string());
        }
        signature_parts.extend(
            plans
                .iter()
                .map(|p| format!("{}: {}", p.ident.trim_start_matches("r#"), p.hint)),
        );

        let mut output = String::new();
        if method.receiver == Receiver::None {
            output.push_str("    #[staticmethod]\n");
        }
        output.push_str(&format!(
            "    #[pyo3(text_signature = \"({})\")]\n",
            signature_parts.join(", ")
        ));

        let self_param = match method.receiver {
            Receiver::None => "",
            Receiver::RefMut if !method.is_async => "&mut self, ",
            _ => "&self, ",
        };
        let py_params = plans
            .iter()
            .map(|p| format!("{}: &PyAny", p.ident))
            .collect::<Vec<_>>();

        if method.is_async {
            let mut params = vec!["py: Python<'py>".to_string()];
            params.extend(py_params);
            output.push_str(&format!(
                "    fn {}<'py>({}{}) -> PyResult<&'py PyAny> {{\n",
                ident,
                self_param,
                params.join(", ")
            ));
            output.push_str(&decls);

            // The future owns a clone; `&mut self` changes stay on that clone
            let call = match method.receiver {
                Receiver::None => format!("{}::{}({}).await", owner_path, ident, args),
                Receiver::RefMut => {
                    output.push_str("        let mut inner = self.inner.clone();\n");
                    format!("inner.{}({}).await", ident, args)
                }
                _ => {
                    output.push_str("        let inner = self.inner.clone();\n");
                    format!("inner.{}({}).await", ident, args)
                }
            };

            output.push_str("        pyo3_asyncio::tokio::future_into_py(py, async move {\n");
            output.push_str(&self.generate_async_body(method, &call));
            output.push_str("        })\n");
        } else {
            output.push_str(&format!(
                "    fn {}({}{}) -> PyResult<()> {{\n",
                ident,
                self_param,
                py_params.join(", ")
            ));
            output.push_str(&decls);

            let call = match method.receiver {
                Receiver::None => format!("{}::{}({})", owner_path, ident, args),
                Receiver::Value => format!("self.inner.clone().{}({})", ident, args),
                _ => format!("self.inner.{}({})", ident, args),
            };
            if method.returns_result() {
                output.push_str(&format!("        {}.map_err(to_py_err)?;\n", call));
            } else {
                output.push_str(&format!("        let _ = {};\n", call));
            }
            output.push_str("        Ok(())\n");
        }

        output.push_str("    }\n");
        output
    }

    /// Body of the future handed to the runtime; resolves to the call result
    fn generate_async_body(&self, method: &Method, call: &str) -> String {
        let indent = "            ";
        let call = if method.returns_result() {
            format!("{}.map_err(to_py_err)?", call)
        } else {
            call.to_string()
        };

        let value_type = return_value_type(method);
        let Some(value_type) = value_type.filter(|ty| !is_unit(ty)) else {
            return format!("{indent}{call};\n{indent}Ok::<_, PyErr>(())\n");
        };

        let converted = match self.exposed_name(&value_type) {
            Some(Exposed::Record(name)) => format!("Py{}::from_inner(value)", name),
            Some(Exposed::Enumeration(name)) => format!("Py{}::from(&value)", name),
            None => {
                let mapped: MappedType = map_syn_type(&value_type);
                return format!(
                    "{indent}let value = {call};\n{indent}let value: {} = {};\n{indent}Ok::<_, PyErr>(value)\n",
                    mapped.to_rust(),
                    mapped.conversion("value", false)
                );
            }
        };
        format!("{indent}let value = {call};\n{indent}Ok::<_, PyErr>({converted})\n")
    }

    fn plan_param(&self, param: &Param) -> ParamPlan {
        let ident = if RESERVED_LOCALS.contains(&param.name.as_str()) {
            format!("{}_arg", param.name)
        } else {
            escape_ident(&param.name)
        };

        let parsed = syn::parse_str::<Type>(&param.raw_type).ok();
        let (owned, reference) = match &parsed {
            Some(Type::Reference(r)) => (Some(&*r.elem), Some(r.mutability.is_some())),
            Some(ty) => (Some(ty), None),
            None => (None, None),
        };

        // Enumerations with payloads have no way back from Python
        let exposed = owned
            .and_then(|ty| self.exposed_name(ty))
            .filter(|exposed| match exposed {
                Exposed::Enumeration(name) => self
                    .namespace
                    .enumerations
                    .get(name)
                    .is_some_and(|e| e.unit_only),
                Exposed::Record(_) => true,
            });
        let hint = match &exposed {
            Some(Exposed::Record(name)) | Some(Exposed::Enumeration(name)) => name.clone(),
            None => param.mapped_type().to_python(),
        };

        let mutability = if reference == Some(true) { "mut " } else { "" };
        let binding = match (&exposed, reference, owned) {
            (Some(Exposed::Record(name)), _, _) => {
                format!("let {mutability}{ident} = {ident}.extract::<Py{name}>()?.inner;")
            }
            (Some(Exposed::Enumeration(name)), _, _) => format!(
                "let {mutability}{ident}: {} = {ident}.extract::<Py{name}>()?.into();",
                self.enumeration_path(name)
            ),
            (_, Some(_), Some(ty)) => format!(
                "let {mutability}{ident}: {} = {ident}.extract()?;",
                owned_type_text(ty)
            ),
            _ => format!("let {ident} = {ident}.extract()?;"),
        };

        let call_arg = match reference {
            Some(true) => format!("&mut {}", ident),
            Some(false) => format!("&{}", ident),
            None => ident.clone(),
        };

        ParamPlan {
            ident,
            binding,
            call_arg,
            hint,
        }
    }

    /// Emitted wrapper a source type resolves to, matched by last segment
    fn exposed_name(&self, ty: &Type) -> Option<Exposed> {
        let Type::Path(path) = ty else {
            return None;
        };
        let segment = path.path.segments.last()?;
        if !segment.arguments.is_empty() {
            return None;
        }
        let name = segment.ident.to_string();
        if self.namespace.records.contains_key(&name) {
            Some(Exposed::Record(name))
        } else if self.namespace.enumerations.contains_key(&name) {
            Some(Exposed::Enumeration(name))
        } else {
            None
        }
    }

    fn generate_create_module(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "/// Build the `{}` submodule with every wrapped type registered\n",
            self.namespace.name
        ));
        output.push_str("pub fn create_module(py: Python<'_>) -> PyResult<&PyModule> {\n");
        output.push_str(&format!(
            "    let m = PyModule::new(py, \"{}\")?;\n",
            self.namespace.name
        ));
        for name in self.class_names() {
            output.push_str(&format!("    m.add_class::<Py{}>()?;\n", name));
        }
        output.push_str("    Ok(m)\n}\n");
        output
    }

    fn enumeration_path(&self, name: &str) -> String {
        match self.namespace.enumerations.get(name) {
            Some(enumeration) => self.path_of(&enumeration.module_path, name),
            None => name.to_string(),
        }
    }

    fn path_of(&self, module_path: &[String], name: &str) -> String {
        source_path(&self.options.source_crate, module_path, name)
    }
}

/// How one source parameter is received and forwarded
struct ParamPlan {
    /// Wrapper argument name
    ident: String,
    /// Statement extracting the Python value
    binding: String,
    /// Expression passed to the wrapped call
    call_arg: String,
    /// Python type hint for the text signature
    hint: String,
}

enum Exposed {
    Record(String),
    Enumeration(String),
}

fn generate_repr() -> String {
    "    fn __repr__(&self) -> String {\n        format!(\"{:?}\", self.inner)\n    }\n".to_string()
}

fn generate_conversions(name: &str, inner_path: &str) -> String {
    format!(
        "impl Py{name} {{\n    pub fn from_inner(inner: {path}) -> Self {{\n        Self {{ inner }}\n    }}\n}}\n\n\
         impl From<{path}> for Py{name} {{\n    fn from(inner: {path}) -> Self {{\n        Self::from_inner(inner)\n    }}\n}}\n",
        name = name,
        path = inner_path,
    )
}

/// Owned counterpart of a borrowed parameter type (`str` -> `String`)
fn owned_type_text(ty: &Type) -> String {
    match ty {
        Type::Path(path) if path.path.is_ident("str") => "String".to_string(),
        Type::Slice(slice) => format!("Vec<{}>", type_text(&slice.elem)),
        other => type_text(other),
    }
}

/// Type the call produces once a `Result`-like wrapper is unwrapped
fn return_value_type(method: &Method) -> Option<Type> {
    let ty = syn::parse_str::<Type>(&method.raw_return_type).ok()?;
    if !method.returns_result() {
        return Some(ty);
    }
    let Type::Path(path) = ty else {
        return None;
    };
    match &path.path.segments.last()?.arguments {
        PathArguments::AngleBracketed(args) => args.args.iter().find_map(|arg| match arg {
            GenericArgument::Type(inner) => Some(inner.clone()),
            _ => None,
        }),
        _ => None,
    }
}

fn is_unit(ty: &Type) -> bool {
    matches!(ty, Type::Tuple(tuple) if tuple.elems.is_empty())
}
