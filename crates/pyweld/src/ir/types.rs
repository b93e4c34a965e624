//! Type system for pyweld
//!
//! This module maps Rust field, parameter and return types onto the small
//! set of types the Python binding layer understands.
//!
//! # Type Mapping Overview
//!
//! Rules are checked in order and the first match wins:
//!
//! | Rust Type | MappedType | Binding type | Python hint |
//! |-----------|------------|--------------|-------------|
//! | `String`, `str`, `char` | `Text` | `String` | `str` |
//! | `u8` .. `u64`, `usize` | `Scalar(U64)` | `u64` | `int` |
//! | `i8` .. `i64`, `isize` | `Scalar(I64)` | `i64` | `int` |
//! | `f32`, `f64` | `Scalar(F64)` | `f64` | `float` |
//! | `bool` | `Scalar(Bool)` | `bool` | `bool` |
//! | `Decimal`, `u128`, `i128` | `Text` | `String` | `str` |
//! | `Option<T>` | `Optional(T)` | `Option<T>` | `T \| None` |
//! | `Vec<T>`, `VecDeque<T>`, `[T]`, `[T; N]` | `Sequence(T)` | `Vec<T>` | `list[T]` |
//! | anything else | `Opaque` | `String` (Debug text) | `object` |
//!
//! `Decimal` and the 128-bit integers go through their string form because
//! no native Python-facing scalar holds them losslessly.
//!
//! References, parentheses and macro groups are looked through, so `&str`
//! maps like `str` and `&[u8]` like `[u8]`.
//!
//! Mapping never fails. Text that does not parse as a Rust type is `Opaque`.

use serde::{Deserialize, Serialize};
use std::fmt;
use syn::{GenericArgument, PathArguments, Type};

/// Scalar kinds supported by the binding layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarKind {
    /// Every unsigned integer up to 64 bits
    U64,
    /// Every signed integer up to 64 bits
    I64,
    /// Every float width
    F64,
    Bool,
}

impl ScalarKind {
    /// Binding-layer Rust type
    pub fn to_rust(&self) -> &'static str {
        match self {
            ScalarKind::U64 => "u64",
            ScalarKind::I64 => "i64",
            ScalarKind::F64 => "f64",
            ScalarKind::Bool => "bool",
        }
    }

    /// Python type hint
    pub fn to_python(&self) -> &'static str {
        match self {
            ScalarKind::U64 | ScalarKind::I64 => "int",
            ScalarKind::F64 => "float",
            ScalarKind::Bool => "bool",
        }
    }

    /// Parse from a primitive Rust type name
    pub fn from_rust_type(s: &str) -> Option<Self> {
        match s {
            "u8" | "u16" | "u32" | "u64" | "usize" => Some(ScalarKind::U64),
            "i8" | "i16" | "i32" | "i64" | "isize" => Some(ScalarKind::I64),
            "f32" | "f64" => Some(ScalarKind::F64),
            "bool" => Some(ScalarKind::Bool),
            _ => None,
        }
    }
}

/// Resolved binding-layer type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MappedType {
    /// Widened scalar
    Scalar(ScalarKind),

    /// String-like value (also used for precision-preserving numbers)
    Text,

    /// Option<T> -> T | None
    Optional(Box<MappedType>),

    /// Vec<T> and friends -> list[T]
    Sequence(Box<MappedType>),

    /// No rule matched
    #[default]
    Opaque,
}

impl MappedType {
    /// Create an Optional type
    pub fn optional(inner: MappedType) -> Self {
        MappedType::Optional(Box::new(inner))
    }

    /// Create a Sequence type
    pub fn sequence(inner: MappedType) -> Self {
        MappedType::Sequence(Box::new(inner))
    }

    /// Check if this is the Opaque fallback
    pub fn is_opaque(&self) -> bool {
        matches!(self, MappedType::Opaque)
    }

    /// Binding-layer Rust type used as an accessor return type
    pub fn to_rust(&self) -> String {
        match self {
            MappedType::Scalar(kind) => kind.to_rust().to_string(),
            MappedType::Text | MappedType::Opaque => "String".to_string(),
            MappedType::Optional(inner) => format!("Option<{}>", inner.to_rust()),
            MappedType::Sequence(inner) => format!("Vec<{}>", inner.to_rust()),
        }
    }

    /// Python type hint used in generated text signatures
    pub fn to_python(&self) -> String {
        match self {
            MappedType::Scalar(kind) => kind.to_python().to_string(),
            MappedType::Text => "str".to_string(),
            MappedType::Optional(inner) => format!("{} | None", inner.to_python()),
            MappedType::Sequence(inner) => format!("list[{}]", inner.to_python()),
            MappedType::Opaque => "object".to_string(),
        }
    }

    /// Rust expression converting a source value into the binding type.
    ///
    /// `expr` names the value; `by_ref` says whether it is a reference
    /// (as inside iterator closures) rather than a place expression.
    pub fn conversion(&self, expr: &str, by_ref: bool) -> String {
        match self {
            MappedType::Scalar(kind) => {
                let deref = if by_ref { "*" } else { "" };
                format!("({}{}) as {}", deref, expr, kind.to_rust())
            }
            MappedType::Text => format!("{}.to_string()", expr),
            MappedType::Optional(inner) => format!(
                "{}.as_ref().map(|v| {})",
                expr,
                inner.conversion("v", true)
            ),
            MappedType::Sequence(inner) => format!(
                "{}.iter().map(|v| {}).collect()",
                expr,
                inner.conversion("v", true)
            ),
            MappedType::Opaque => format!("format!(\"{{:?}}\", {})", expr),
        }
    }
}

impl fmt::Display for MappedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_rust())
    }
}

/// Map a raw Rust type expression to its binding type.
///
/// Total: text that is not a valid type resolves to [`MappedType::Opaque`].
pub fn map_type(raw: &str) -> MappedType {
    match syn::parse_str::<Type>(raw) {
        Ok(ty) => map_syn_type(&ty),
        Err(_) => MappedType::Opaque,
    }
}

/// Map an already parsed type
pub fn map_syn_type(ty: &Type) -> MappedType {
    match ty {
        Type::Path(type_path) => map_path_type(type_path),
        Type::Reference(type_ref) => map_syn_type(&type_ref.elem),
        Type::Paren(type_paren) => map_syn_type(&type_paren.elem),
        Type::Group(type_group) => map_syn_type(&type_group.elem),
        Type::Slice(type_slice) => MappedType::sequence(map_syn_type(&type_slice.elem)),
        Type::Array(type_array) => MappedType::sequence(map_syn_type(&type_array.elem)),
        _ => MappedType::Opaque,
    }
}

fn map_path_type(type_path: &syn::TypePath) -> MappedType {
    // Qualified self types (<T as Trait>::Assoc) have no mapping
    if type_path.qself.is_some() {
        return MappedType::Opaque;
    }

    let Some(last_seg) = type_path.path.segments.last() else {
        return MappedType::Opaque;
    };
    let ident = last_seg.ident.to_string();

    match ident.as_str() {
        "String" | "str" | "char" => return MappedType::Text,
        "Decimal" | "u128" | "i128" => return MappedType::Text,
        _ => {}
    }

    if let Some(kind) = ScalarKind::from_rust_type(&ident) {
        return MappedType::Scalar(kind);
    }

    let Some(inner) = first_type_argument(&last_seg.arguments) else {
        return MappedType::Opaque;
    };

    match ident.as_str() {
        "Option" => MappedType::optional(map_syn_type(inner)),
        "Vec" | "VecDeque" => MappedType::sequence(map_syn_type(inner)),
        _ => MappedType::Opaque,
    }
}

fn first_type_argument(arguments: &PathArguments) -> Option<&Type> {
    if let PathArguments::AngleBracketed(args) = arguments {
        args.args.iter().find_map(|arg| match arg {
            GenericArgument::Type(inner) => Some(inner),
            _ => None,
        })
    } else {
        None
    }
}
