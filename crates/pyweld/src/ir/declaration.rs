//! Declaration metadata extracted from venue sources
//!
//! These structures describe the records, enumerations and method
//! collections found in a source file. They are created once by the
//! extractor and never mutated afterwards.

use crate::ir::{map_type, MappedType};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Declared visibility of an item, field or method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Visibility {
    /// `pub`
    Public,
    /// `pub(crate)`, `pub(super)`, `pub(in path)`
    Restricted,
    /// No modifier
    #[default]
    Private,
}

impl Visibility {
    /// Only plain `pub` crosses the binding boundary
    pub fn is_public(&self) -> bool {
        matches!(self, Visibility::Public)
    }
}

impl From<&syn::Visibility> for Visibility {
    fn from(vis: &syn::Visibility) -> Self {
        match vis {
            syn::Visibility::Public(_) => Visibility::Public,
            syn::Visibility::Restricted(_) => Visibility::Restricted,
            syn::Visibility::Inherited => Visibility::Private,
        }
    }
}

/// A named field of a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Field name as written (raw identifiers keep their `r#`)
    pub name: String,
    /// Normalized type text
    pub raw_type: String,
    /// Field visibility
    pub visibility: Visibility,
}

impl Field {
    /// Create a new field
    pub fn new(name: impl Into<String>, raw_type: impl Into<String>, visibility: Visibility) -> Self {
        Self {
            name: name.into(),
            raw_type: raw_type.into(),
            visibility,
        }
    }

    /// Resolve the binding type of this field
    pub fn mapped_type(&self) -> MappedType {
        map_type(&self.raw_type)
    }
}

/// Layout of a record body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RecordShape {
    /// `struct X { a: T }`
    #[default]
    Named,
    /// `struct X(T);` passed through without accessors
    Tuple,
    /// `struct X;`
    Unit,
}

/// A data record (struct)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub name: String,
    /// Named fields in declaration order (empty for tuple and unit shapes)
    pub fields: Vec<Field>,
    pub shape: RecordShape,
    pub namespace: String,
    /// Rust module path below the source crate root
    pub module_path: Vec<String>,
    pub visibility: Visibility,
    /// File the record was read from
    pub source: PathBuf,
}

/// An enumeration with its variant names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enumeration {
    pub name: String,
    /// Variant names only; payloads are not carried across
    pub variants: Vec<String>,
    /// Every variant is a bare name, so values convert both ways
    pub unit_only: bool,
    pub namespace: String,
    pub module_path: Vec<String>,
    pub visibility: Visibility,
    pub source: PathBuf,
}

/// How a method takes `self`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Receiver {
    /// Associated function, no `self`
    #[default]
    None,
    /// `&self`
    Ref,
    /// `&mut self`
    RefMut,
    /// `self`
    Value,
}

/// A method parameter after the receiver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub raw_type: String,
}

impl Param {
    /// Create a new parameter
    pub fn new(name: impl Into<String>, raw_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            raw_type: raw_type.into(),
        }
    }

    /// Resolve the binding type of this parameter
    pub fn mapped_type(&self) -> MappedType {
        map_type(&self.raw_type)
    }
}

/// A method of an inherent impl block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    /// Declared return type text, `()` when omitted
    pub raw_return_type: String,
    pub is_async: bool,
    pub visibility: Visibility,
    pub receiver: Receiver,
    pub params: Vec<Param>,
    pub source: PathBuf,
}

impl Method {
    /// Whether the declared return type is a `Result` or a `Result` alias
    /// such as `RestResult<T>`
    pub fn returns_result(&self) -> bool {
        let Ok(ty) = syn::parse_str::<syn::Type>(&self.raw_return_type) else {
            return false;
        };
        match ty {
            syn::Type::Path(path) => path
                .path
                .segments
                .last()
                .is_some_and(|seg| seg.ident.to_string().ends_with("Result")),
            _ => false,
        }
    }
}

/// All inherent methods of one owner type within a namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodCollection {
    /// Owner type name (last path segment of the impl self type)
    pub owner_name: String,
    pub methods: Vec<Method>,
    pub namespace: String,
    /// Module path of the first impl block seen for this owner
    pub module_path: Vec<String>,
    pub source: PathBuf,
}

/// Kind tag for declarations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeclarationKind {
    Record,
    Enumeration,
    MethodCollection,
    Method,
}

impl DeclarationKind {
    /// Get display name
    pub fn display(&self) -> &'static str {
        match self {
            DeclarationKind::Record => "record",
            DeclarationKind::Enumeration => "enumeration",
            DeclarationKind::MethodCollection => "method collection",
            DeclarationKind::Method => "method",
        }
    }
}

/// Any extracted declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Declaration {
    Record(Record),
    Enumeration(Enumeration),
    MethodCollection(MethodCollection),
}

impl Declaration {
    /// Declared name (owner name for method collections)
    pub fn name(&self) -> &str {
        match self {
            Declaration::Record(r) => &r.name,
            Declaration::Enumeration(e) => &e.name,
            Declaration::MethodCollection(c) => &c.owner_name,
        }
    }

    /// Namespace the declaration belongs to
    pub fn namespace(&self) -> &str {
        match self {
            Declaration::Record(r) => &r.namespace,
            Declaration::Enumeration(e) => &e.namespace,
            Declaration::MethodCollection(c) => &c.namespace,
        }
    }

    pub fn kind(&self) -> DeclarationKind {
        match self {
            Declaration::Record(_) => DeclarationKind::Record,
            Declaration::Enumeration(_) => DeclarationKind::Enumeration,
            Declaration::MethodCollection(_) => DeclarationKind::MethodCollection,
        }
    }
}
