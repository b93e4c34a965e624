//! Exposure classification
//!
//! Decides which extracted declarations cross the binding boundary. The
//! decision is a plain substring test against versioned allow-lists so a
//! venue author can predict it from a type name alone.

use crate::extract::ERROR_TERM;
use crate::ir::{Declaration, Method};
use serde::Serialize;

/// A named, versioned set of name fragments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AllowList {
    pub version: u32,
    pub terms: &'static [&'static str],
}

impl AllowList {
    /// Whether `name` contains any term of the list
    pub fn matches(&self, name: &str) -> bool {
        self.terms.iter().any(|term| name.contains(term))
    }
}

/// Record name fragments worth exposing
pub const RECORD_TERMS_V1: AllowList = AllowList {
    version: 1,
    terms: &[
        "Request", "Response", "Client", "Error", "Info", "Data", "Order", "Trade", "Account",
        "Balance", "Position", "Ticker", "Kline", "Depth", "Symbol", "Filter", "RateLimit",
        "Status", "Config", "Params", "Result", "Entry", "History", "Stats",
    ],
};

/// Owner name fragments whose impl blocks get method wrappers
pub const OWNER_TERMS_V1: AllowList = AllowList {
    version: 1,
    terms: &["Client", "Request", "Builder"],
};

/// Predicate deciding what gets bindings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExposureClassifier {
    records: AllowList,
    owners: AllowList,
}

impl Default for ExposureClassifier {
    fn default() -> Self {
        Self::new(RECORD_TERMS_V1, OWNER_TERMS_V1)
    }
}

impl ExposureClassifier {
    pub fn new(records: AllowList, owners: AllowList) -> Self {
        Self { records, owners }
    }

    /// Record allow-list in use
    pub fn records(&self) -> &AllowList {
        &self.records
    }

    /// Owner allow-list in use
    pub fn owners(&self) -> &AllowList {
        &self.owners
    }

    /// Whether a declaration gets a binding
    pub fn should_expose(&self, declaration: &Declaration) -> bool {
        match declaration {
            Declaration::Record(r) => r.visibility.is_public() && self.records.matches(&r.name),
            Declaration::Enumeration(e) => {
                e.visibility.is_public() && !e.name.contains(ERROR_TERM)
            }
            Declaration::MethodCollection(c) => self.owners.matches(&c.owner_name),
        }
    }

    /// Whether a method of an exposed collection gets a wrapper.
    ///
    /// `new` is left out: constructors are generated separately.
    pub fn should_wrap(&self, method: &Method) -> bool {
        method.visibility.is_public() && method.name != "new"
    }
}
