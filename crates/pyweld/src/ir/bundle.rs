//! Namespace bundle
//!
//! Groups exposed declarations by namespace. Records and enumerations share
//! one name space per namespace because both become wrapped types; method
//! collections are merged by owner. A recurring name replaces the earlier
//! declaration in place and is reported as a [`Collision`].

use crate::ir::{Declaration, DeclarationKind, Enumeration, MethodCollection, Record};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A declaration name that occurred twice in one namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collision {
    pub namespace: String,
    /// Declaration name, or `Owner::method` for methods
    pub name: String,
    /// Kind of the declaration that won
    pub kind: DeclarationKind,
    /// Where the replaced declaration came from
    pub previous: PathBuf,
    /// Where the winning declaration came from
    pub replacement: PathBuf,
}

/// Exposed declarations of a single namespace
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    pub name: String,
    pub records: IndexMap<String, Record>,
    pub enumerations: IndexMap<String, Enumeration>,
    pub collections: IndexMap<String, MethodCollection>,
    pub collisions: Vec<Collision>,
}

impl Namespace {
    /// Create an empty namespace
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Insert a record; last write wins
    pub fn insert_record(&mut self, record: Record) {
        let previous = self
            .records
            .get(&record.name)
            .map(|r| r.source.clone())
            .or_else(|| {
                self.enumerations
                    .shift_remove(&record.name)
                    .map(|e| e.source)
            });
        if let Some(previous) = previous {
            self.report(&record.name, DeclarationKind::Record, previous, &record.source);
        }
        self.records.insert(record.name.clone(), record);
    }

    /// Insert an enumeration; last write wins
    pub fn insert_enumeration(&mut self, enumeration: Enumeration) {
        let previous = self
            .enumerations
            .get(&enumeration.name)
            .map(|e| e.source.clone())
            .or_else(|| {
                self.records
                    .shift_remove(&enumeration.name)
                    .map(|r| r.source)
            });
        if let Some(previous) = previous {
            self.report(
                &enumeration.name,
                DeclarationKind::Enumeration,
                previous,
                &enumeration.source,
            );
        }
        self.enumerations
            .insert(enumeration.name.clone(), enumeration);
    }

    /// Merge a method collection into the one already held for its owner.
    ///
    /// Method names are deduplicated on every insertion, including the
    /// first, so two impl blocks of one file cannot yield two wrappers.
    pub fn insert_collection(&mut self, collection: MethodCollection) {
        let MethodCollection {
            owner_name,
            methods,
            namespace,
            module_path,
            source,
        } = collection;

        let existing = self
            .collections
            .entry(owner_name.clone())
            .or_insert_with(|| MethodCollection {
                owner_name,
                methods: Vec::new(),
                namespace,
                module_path,
                source,
            });

        let mut replaced = Vec::new();
        for method in methods {
            if let Some(slot) = existing.methods.iter_mut().find(|m| m.name == method.name) {
                replaced.push((slot.source.clone(), method.source.clone(), method.name.clone()));
                *slot = method;
            } else {
                existing.methods.push(method);
            }
        }

        let owner = existing.owner_name.clone();
        for (previous, replacement, method) in replaced {
            self.report(
                &format!("{}::{}", owner, method),
                DeclarationKind::Method,
                previous,
                &replacement,
            );
        }
    }

    fn report(&mut self, name: &str, kind: DeclarationKind, previous: PathBuf, replacement: &Path) {
        tracing::warn!(
            namespace = %self.name,
            "{} `{}` declared twice: {} replaced by {}",
            kind.display(),
            name,
            previous.display(),
            replacement.display()
        );
        self.collisions.push(Collision {
            namespace: self.name.clone(),
            name: name.to_string(),
            kind,
            previous,
            replacement: replacement.to_path_buf(),
        });
    }

    /// Collection owned by a type, if any
    pub fn collection_for(&self, owner: &str) -> Option<&MethodCollection> {
        self.collections.get(owner)
    }

    /// Collections whose owner is not an exposed record
    pub fn standalone_collections(&self) -> impl Iterator<Item = &MethodCollection> {
        self.collections
            .values()
            .filter(|c| !self.records.contains_key(&c.owner_name))
    }

    /// Total number of wrappable methods held
    pub fn method_count(&self) -> usize {
        self.collections.values().map(|c| c.methods.len()).sum()
    }

    /// Whether nothing was exposed
    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.enumerations.is_empty() && self.collections.is_empty()
    }
}

/// All namespaces of a run, ordered by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceBundle {
    namespaces: BTreeMap<String, Namespace>,
}

impl NamespaceBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an (already classified) declaration to its namespace
    pub fn insert(&mut self, declaration: Declaration) {
        let namespace = self
            .namespaces
            .entry(declaration.namespace().to_string())
            .or_insert_with_key(|name| Namespace::new(name.clone()));

        match declaration {
            Declaration::Record(r) => namespace.insert_record(r),
            Declaration::Enumeration(e) => namespace.insert_enumeration(e),
            Declaration::MethodCollection(c) => namespace.insert_collection(c),
        }
    }

    /// Look up a namespace
    pub fn get(&self, name: &str) -> Option<&Namespace> {
        self.namespaces.get(name)
    }

    /// Iterate namespaces in name order
    pub fn namespaces(&self) -> impl Iterator<Item = &Namespace> {
        self.namespaces.values()
    }

    /// All collisions across namespaces
    pub fn collisions(&self) -> Vec<Collision> {
        self.namespaces
            .values()
            .flat_map(|ns| ns.collisions.iter().cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.namespaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Method, Receiver, RecordShape, Visibility};

    fn record(name: &str, file: &str) -> Record {
        Record {
            name: name.to_string(),
            fields: vec![],
            shape: RecordShape::Named,
            namespace: "alpha".to_string(),
            module_path: vec!["alpha".to_string()],
            visibility: Visibility::Public,
            source: PathBuf::from(file),
        }
    }

    fn method(name: &str, file: &str) -> Method {
        Method {
            name: name.to_string(),
            raw_return_type: "()".to_string(),
            is_async: false,
            visibility: Visibility::Public,
            receiver: Receiver::Ref,
            params: vec![],
            source: PathBuf::from(file),
        }
    }

    fn collection(methods: Vec<Method>, file: &str) -> MethodCollection {
        MethodCollection {
            owner_name: "RestClient".to_string(),
            methods,
            namespace: "alpha".to_string(),
            module_path: vec!["alpha".to_string()],
            source: PathBuf::from(file),
        }
    }

    #[test]
    fn test_record_collision_last_write_wins() {
        let mut bundle = NamespaceBundle::new();
        bundle.insert(Declaration::Record(record("OrderInfo", "a.rs")));
        bundle.insert(Declaration::Record(record("TradeInfo", "a.rs")));
        bundle.insert(Declaration::Record(record("OrderInfo", "b.rs")));

        let ns = bundle.get("alpha").unwrap();
        let names: Vec<_> = ns.records.keys().cloned().collect();
        assert_eq!(names, vec!["OrderInfo", "TradeInfo"]);
        assert_eq!(ns.records["OrderInfo"].source, PathBuf::from("b.rs"));

        let collisions = bundle.collisions();
        assert_eq!(collisions.len(), 1);
        assert_eq!(collisions[0].name, "OrderInfo");
        assert_eq!(collisions[0].previous, PathBuf::from("a.rs"));
        assert_eq!(collisions[0].replacement, PathBuf::from("b.rs"));
    }

    #[test]
    fn test_record_replaces_enumeration_of_same_name() {
        let mut ns = Namespace::new("alpha");
        ns.insert_enumeration(Enumeration {
            name: "OrderStatus".to_string(),
            variants: vec!["New".to_string()],
            unit_only: true,
            namespace: "alpha".to_string(),
            module_path: vec![],
            visibility: Visibility::Public,
            source: PathBuf::from("a.rs"),
        });
        ns.insert_record(record("OrderStatus", "b.rs"));

        assert!(ns.enumerations.is_empty());
        assert!(ns.records.contains_key("OrderStatus"));
        assert_eq!(ns.collisions.len(), 1);
    }

    #[test]
    fn test_collections_merge_by_owner() {
        let mut ns = Namespace::new("alpha");
        ns.insert_collection(collection(vec![method("get_depth", "depth.rs")], "depth.rs"));
        ns.insert_collection(collection(vec![method("get_ticker", "ticker.rs")], "ticker.rs"));
        ns.insert_collection(collection(vec![method("get_depth", "depth_v2.rs")], "depth_v2.rs"));

        let merged = ns.collection_for("RestClient").unwrap();
        let names: Vec<_> = merged.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["get_depth", "get_ticker"]);
        assert_eq!(merged.methods[0].source, PathBuf::from("depth_v2.rs"));
        assert_eq!(ns.method_count(), 2);
        assert_eq!(ns.collisions.len(), 1);
        assert_eq!(ns.collisions[0].name, "RestClient::get_depth");
    }

    #[test]
    fn test_duplicate_methods_within_one_collection() {
        // Two impl blocks of one file arrive as a single collection
        let mut ns = Namespace::new("alpha");
        let mut second = method("ping", "client.rs");
        second.params = vec![crate::ir::Param::new("n", "u32")];
        ns.insert_collection(collection(
            vec![method("ping", "client.rs"), method("get_time", "client.rs"), second],
            "client.rs",
        ));

        let merged = ns.collection_for("RestClient").unwrap();
        let names: Vec<_> = merged.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["ping", "get_time"]);
        assert_eq!(merged.methods[0].params.len(), 1);
        assert_eq!(ns.collisions.len(), 1);
        assert_eq!(ns.collisions[0].name, "RestClient::ping");
        assert_eq!(ns.collisions[0].kind, DeclarationKind::Method);
    }

    #[test]
    fn test_namespaces_are_partitioned() {
        let mut bundle = NamespaceBundle::new();
        let mut beta = record("OrderInfo", "b.rs");
        beta.namespace = "beta".to_string();
        bundle.insert(Declaration::Record(record("OrderInfo", "a.rs")));
        bundle.insert(Declaration::Record(beta));

        assert_eq!(bundle.len(), 2);
        assert!(bundle.collisions().is_empty());
        let names: Vec<_> = bundle.namespaces().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "beta"]);
    }
}
