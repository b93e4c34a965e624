//! Intermediate Representation (IR) for pyweld
//!
//! This module provides the declaration metadata read from venue sources,
//! the binding type system and the per-namespace bundle consumed by codegen.

pub mod bundle;
pub mod declaration;
pub mod types;

pub use bundle::*;
pub use declaration::*;
pub use types::*;
