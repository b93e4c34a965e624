//! Declaration extraction
//!
//! Parses a source file with `syn` and collects the records, enumerations
//! and inherent method collections it declares. Items the binding layer
//! cannot represent (generics, trait impls, error enums) are dropped one by
//! one; only a file that does not parse at all is reported as an error.

pub mod namespace;

pub use namespace::{derive_namespace, sanitize_identifier, NamespaceInfo, UNKNOWN_NAMESPACE};

use crate::error::{WeldError, WeldResult};
use crate::ir::{
    Declaration, Enumeration, Field, Method, MethodCollection, Param, Receiver, Record,
    RecordShape, Visibility,
};
use indexmap::IndexMap;
use quote::ToTokens;
use std::path::{Path, PathBuf};
use syn::meta::ParseNestedMeta;
use syn::{Fields, FnArg, ImplItem, Item, ItemEnum, ItemImpl, ItemMod, ItemStruct, Pat, ReturnType, Type};

/// Enumerations containing this term are never extracted; error types need
/// hand-written conversions
pub const ERROR_TERM: &str = "Error";

/// Extracts declarations from source files
pub struct DeclarationExtractor {
    /// Path components preceding the namespace segment
    marker: Vec<String>,
}

impl DeclarationExtractor {
    /// Create a new extractor for a namespace marker
    pub fn new(marker: Vec<String>) -> Self {
        Self { marker }
    }

    /// Namespace of a source path
    pub fn namespace_of(&self, path: &Path) -> NamespaceInfo {
        derive_namespace(path, &self.marker)
    }

    /// Extract all declarations of a file
    pub fn extract(&self, path: &Path, content: &str) -> WeldResult<Vec<Declaration>> {
        let file = syn::parse_file(content).map_err(|e| WeldError::parse(path, &e))?;
        let info = self.namespace_of(path);

        let mut ctx = FileContext {
            source: path.to_path_buf(),
            namespace: info.name,
            declarations: Vec::new(),
            collections: IndexMap::new(),
        };
        ctx.visit_items(&file.items, &info.module_path);

        let FileContext {
            mut declarations,
            collections,
            ..
        } = ctx;
        declarations.extend(collections.into_values().map(Declaration::MethodCollection));
        Ok(declarations)
    }
}

/// Per-file extraction state
struct FileContext {
    source: PathBuf,
    namespace: String,
    declarations: Vec<Declaration>,
    /// Impl blocks of this file grouped by owner
    collections: IndexMap<String, MethodCollection>,
}

impl FileContext {
    fn visit_items(&mut self, items: &[Item], module_path: &[String]) {
        for item in items {
            match item {
                Item::Struct(s) => {
                    if let Some(record) = self.record(s, module_path) {
                        self.declarations.push(Declaration::Record(record));
                    }
                }
                Item::Enum(e) => {
                    if let Some(enumeration) = self.enumeration(e, module_path) {
                        self.declarations
                            .push(Declaration::Enumeration(enumeration));
                    }
                }
                Item::Impl(i) => self.impl_block(i, module_path),
                Item::Mod(m) => self.inline_module(m, module_path),
                _ => {}
            }
        }
    }

    fn record(&self, s: &ItemStruct, module_path: &[String]) -> Option<Record> {
        let name = s.ident.to_string();
        if !s.generics.params.is_empty() {
            tracing::debug!("skipping generic struct {} in {}", name, self.source.display());
            return None;
        }

        let (shape, fields) = match &s.fields {
            Fields::Named(named) => {
                let fields = named
                    .named
                    .iter()
                    .filter_map(|f| {
                        let ident = f.ident.as_ref()?;
                        Some(Field::new(
                            ident.to_string(),
                            type_text(&f.ty),
                            Visibility::from(&f.vis),
                        ))
                    })
                    .collect();
                (RecordShape::Named, fields)
            }
            Fields::Unnamed(_) => (RecordShape::Tuple, Vec::new()),
            Fields::Unit => (RecordShape::Unit, Vec::new()),
        };

        Some(Record {
            name,
            fields,
            shape,
            namespace: self.namespace.clone(),
            module_path: module_path.to_vec(),
            visibility: Visibility::from(&s.vis),
            source: self.source.clone(),
        })
    }

    fn enumeration(&self, e: &ItemEnum, module_path: &[String]) -> Option<Enumeration> {
        let name = e.ident.to_string();
        if name.contains(ERROR_TERM) {
            return None;
        }
        if !e.generics.params.is_empty() || e.variants.is_empty() {
            tracing::debug!(
                "skipping enum {} in {}: generic or without variants",
                name,
                self.source.display()
            );
            return None;
        }

        Some(Enumeration {
            name,
            variants: e.variants.iter().map(|v| v.ident.to_string()).collect(),
            unit_only: e.variants.iter().all(|v| matches!(v.fields, Fields::Unit)),
            namespace: self.namespace.clone(),
            module_path: module_path.to_vec(),
            visibility: Visibility::from(&e.vis),
            source: self.source.clone(),
        })
    }

    fn impl_block(&mut self, i: &ItemImpl, module_path: &[String]) {
        if i.trait_.is_some() || !i.generics.params.is_empty() {
            return;
        }
        let Some(owner) = owner_name(&i.self_ty) else {
            return;
        };

        let methods: Vec<Method> = i
            .items
            .iter()
            .filter_map(|item| match item {
                ImplItem::Fn(f) => self.method(f),
                _ => None,
            })
            .collect();

        let collection = self
            .collections
            .entry(owner.clone())
            .or_insert_with(|| MethodCollection {
                owner_name: owner,
                methods: Vec::new(),
                namespace: self.namespace.clone(),
                module_path: module_path.to_vec(),
                source: self.source.clone(),
            });
        collection.methods.extend(methods);
    }

    fn method(&self, f: &syn::ImplItemFn) -> Option<Method> {
        let sig = &f.sig;
        let name = sig.ident.to_string();
        if sig
            .generics
            .params
            .iter()
            .any(|p| !matches!(p, syn::GenericParam::Lifetime(_)))
        {
            tracing::debug!("skipping generic method {} in {}", name, self.source.display());
            return None;
        }

        let receiver = match sig.receiver() {
            None => Receiver::None,
            Some(r) if r.reference.is_none() => Receiver::Value,
            Some(r) if r.mutability.is_some() => Receiver::RefMut,
            Some(_) => Receiver::Ref,
        };

        let params = sig
            .inputs
            .iter()
            .filter_map(|arg| match arg {
                FnArg::Typed(pat_type) => Some(pat_type),
                FnArg::Receiver(_) => None,
            })
            .enumerate()
            .map(|(index, pat_type)| {
                let name = match &*pat_type.pat {
                    Pat::Ident(ident) => ident.ident.to_string(),
                    _ => format!("arg{}", index),
                };
                Param::new(name, type_text(&pat_type.ty))
            })
            .collect();

        let raw_return_type = match &sig.output {
            ReturnType::Default => "()".to_string(),
            ReturnType::Type(_, ty) => type_text(ty),
        };

        Some(Method {
            name,
            raw_return_type,
            is_async: sig.asyncness.is_some(),
            visibility: Visibility::from(&f.vis),
            receiver,
            params,
            source: self.source.clone(),
        })
    }

    fn inline_module(&mut self, m: &ItemMod, module_path: &[String]) {
        let Some((_, items)) = &m.content else {
            return;
        };
        if is_cfg_test(&m.attrs) {
            return;
        }

        let mut nested = module_path.to_vec();
        nested.push(m.ident.to_string());
        self.visit_items(items, &nested);
    }
}

/// Last path segment of an impl self type
fn owner_name(ty: &Type) -> Option<String> {
    match ty {
        Type::Path(type_path) if type_path.qself.is_none() => type_path
            .path
            .segments
            .last()
            .map(|seg| seg.ident.to_string()),
        Type::Paren(paren) => owner_name(&paren.elem),
        Type::Group(group) => owner_name(&group.elem),
        _ => None,
    }
}

/// Whether a `#[cfg(..)]` predicate requires `test`, looking inside
/// `all(..)` and `any(..)` but not `not(..)`
fn is_cfg_test(attrs: &[syn::Attribute]) -> bool {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident("cfg"))
        .any(|attr| {
            let mut found = false;
            // A predicate syn cannot walk is treated as not test-only
            let _ = attr.parse_nested_meta(|meta| visit_cfg(meta, &mut found));
            found
        })
}

fn visit_cfg(meta: ParseNestedMeta<'_>, found: &mut bool) -> syn::Result<()> {
    if meta.path.is_ident("test") {
        *found = true;
        return Ok(());
    }
    if meta.input.peek(syn::token::Paren) {
        if meta.path.is_ident("not") {
            // Consume the group without looking inside
            return meta.parse_nested_meta(|inner| visit_cfg(inner, &mut false));
        }
        return meta.parse_nested_meta(|inner| visit_cfg(inner, found));
    }
    if meta.input.peek(syn::Token![=]) {
        meta.value()?.parse::<syn::Lit>()?;
    }
    Ok(())
}

/// Render a type as compact source text (`Option<Vec<u32>>`, `&'a str`)
pub fn type_text(ty: &Type) -> String {
    normalize_tokens(&ty.to_token_stream().to_string())
}

/// Drop the spaces token printing puts between punctuation.
///
/// A space is kept between two word characters (`mut T`, `dyn Trait`)
/// and after a comma.
pub fn normalize_tokens(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let is_word = |c: char| c.is_alphanumeric() || c == '_' || c == '\'';

    for (i, &c) in chars.iter().enumerate() {
        if c != ' ' {
            out.push(c);
            continue;
        }
        let prev = out.chars().last();
        let next = chars.get(i + 1).copied();
        let keep = match (prev, next) {
            (Some(','), Some(n)) => n != ' ',
            (Some(p), Some(n)) => is_word(p) && is_word(n),
            _ => false,
        };
        if keep {
            out.push(' ');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> DeclarationExtractor {
        DeclarationExtractor::new(vec!["venues".to_string(), "src".to_string()])
    }

    fn extract(source: &str) -> Vec<Declaration> {
        extractor()
            .extract(Path::new("venues/src/alpha/rest/orders.rs"), source)
            .unwrap()
    }

    #[test]
    fn test_records_and_fields() {
        let decls = extract(
            r#"
            #[derive(Debug, Clone, Default)]
            pub struct AlphaOrderRequest {
                pub price: f64,
                pub qty: u32,
                pub tags: Option<Vec<String>>,
                secret: String,
                pub(crate) internal: u8,
            }
            "#,
        );

        assert_eq!(decls.len(), 1);
        let Declaration::Record(record) = &decls[0] else {
            panic!("expected record");
        };
        assert_eq!(record.name, "AlphaOrderRequest");
        assert_eq!(record.namespace, "alpha");
        assert_eq!(record.module_path, vec!["alpha", "rest", "orders"]);
        assert_eq!(record.visibility, Visibility::Public);

        let fields: Vec<_> = record
            .fields
            .iter()
            .map(|f| (f.name.as_str(), f.raw_type.as_str(), f.visibility))
            .collect();
        assert_eq!(
            fields,
            vec![
                ("price", "f64", Visibility::Public),
                ("qty", "u32", Visibility::Public),
                ("tags", "Option<Vec<String>>", Visibility::Public),
                ("secret", "String", Visibility::Private),
                ("internal", "u8", Visibility::Restricted),
            ]
        );
    }

    #[test]
    fn test_tuple_and_unit_records_pass_through() {
        let decls = extract("pub struct OrderId(pub u64);\npub struct PingResponse;");
        let shapes: Vec<_> = decls
            .iter()
            .map(|d| match d {
                Declaration::Record(r) => (r.shape, r.fields.len()),
                _ => panic!("expected record"),
            })
            .collect();
        assert_eq!(shapes, vec![(RecordShape::Tuple, 0), (RecordShape::Unit, 0)]);
    }

    #[test]
    fn test_error_enums_excluded() {
        let decls = extract(
            r#"
            pub enum AlphaOrderError { NotFound, Timeout }
            pub enum OrderSide { Buy, Sell }
            enum InternalState { Idle }
            pub enum Message { Text(String), Close { code: u16 } }
            pub enum Never {}
            "#,
        );

        let names: Vec<_> = decls.iter().map(|d| d.name().to_string()).collect();
        assert_eq!(names, vec!["OrderSide", "InternalState", "Message"]);

        let Declaration::Enumeration(message) = &decls[2] else {
            panic!("expected enumeration");
        };
        assert_eq!(message.variants, vec!["Text", "Close"]);
        assert!(!message.unit_only);

        let Declaration::Enumeration(side) = &decls[0] else {
            panic!("expected enumeration");
        };
        assert!(side.unit_only);
    }

    #[test]
    fn test_method_collections() {
        let decls = extract(
            r#"
            impl RestClient {
                pub fn new(base_url: &str) -> Self { todo!() }
                pub async fn get_depth(&self, request: GetDepthRequest) -> RestResult<GetDepthResponse> { todo!() }
                pub fn reset(&mut self) { }
                fn sign(&self, payload: &[u8]) -> String { todo!() }
                pub fn parse<T: DeserializeOwned>(&self) -> T { todo!() }
            }

            impl RestClient {
                pub async fn ping(self) -> Result<(), Errors> { todo!() }
            }

            impl std::fmt::Display for RestClient {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { todo!() }
            }
            "#,
        );

        assert_eq!(decls.len(), 1);
        let Declaration::MethodCollection(collection) = &decls[0] else {
            panic!("expected method collection");
        };
        assert_eq!(collection.owner_name, "RestClient");

        let summary: Vec<_> = collection
            .methods
            .iter()
            .map(|m| (m.name.as_str(), m.is_async, m.receiver, m.visibility))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("new", false, Receiver::None, Visibility::Public),
                ("get_depth", true, Receiver::Ref, Visibility::Public),
                ("reset", false, Receiver::RefMut, Visibility::Public),
                ("sign", false, Receiver::Ref, Visibility::Private),
                ("ping", true, Receiver::Value, Visibility::Public),
            ]
        );

        let get_depth = &collection.methods[1];
        assert_eq!(get_depth.raw_return_type, "RestResult<GetDepthResponse>");
        assert_eq!(get_depth.params, vec![Param::new("request", "GetDepthRequest")]);
        assert_eq!(collection.methods[2].raw_return_type, "()");
        assert_eq!(collection.methods[3].params[0].raw_type, "&[u8]");
    }

    #[test]
    fn test_inline_modules() {
        let decls = extract(
            r#"
            pub mod types {
                pub struct TickerData { pub last: Decimal }
            }

            #[cfg(test)]
            mod tests {
                pub struct TestOrderRequest { pub id: u64 }
            }
            "#,
        );

        assert_eq!(decls.len(), 1);
        let Declaration::Record(record) = &decls[0] else {
            panic!("expected record");
        };
        assert_eq!(record.module_path, vec!["alpha", "rest", "orders", "types"]);
    }

    #[test]
    fn test_compound_cfg_test_modules() {
        let decls = extract(
            r#"
            #[cfg(all(test, feature = "live"))]
            mod live_tests {
                pub struct LiveOrderRequest { pub id: u64 }
            }

            #[cfg(any(feature = "mock", test))]
            mod mocks {
                pub struct MockClient;
            }

            #[cfg(not(test))]
            pub mod runtime {
                pub struct RuntimeConfig { pub retries: u32 }
            }

            #[cfg(feature = "ws")]
            pub mod ws {
                pub struct WsConfig { pub url: String }
            }
            "#,
        );

        let names: Vec<_> = decls.iter().map(|d| d.name().to_string()).collect();
        assert_eq!(names, vec!["RuntimeConfig", "WsConfig"]);
    }

    #[test]
    fn test_duplicate_impl_blocks_share_one_collection() {
        let decls = extract(
            r#"
            impl RestClient { pub fn ping(&self) {} }
            impl RestClient { pub fn ping(&self, n: u32) {} }
            "#,
        );

        // Deduplication happens when the collection enters its namespace
        assert_eq!(decls.len(), 1);
        let Declaration::MethodCollection(collection) = &decls[0] else {
            panic!("expected method collection");
        };
        assert_eq!(collection.methods.len(), 2);
    }

    #[test]
    fn test_generic_items_skipped() {
        let decls = extract(
            r#"
            pub struct PageResponse<T> { pub items: Vec<T> }
            pub enum Either<L, R> { Left(L), Right(R) }
            impl<T> PageResponse<T> { pub fn len(&self) -> usize { 0 } }
            "#,
        );
        assert!(decls.is_empty());
    }

    #[test]
    fn test_unparsable_file() {
        let result = extractor().extract(Path::new("venues/src/alpha/bad.rs"), "pub struct {");
        assert!(matches!(result, Err(WeldError::Parse { .. })));
    }

    #[test]
    fn test_normalize_tokens() {
        assert_eq!(normalize_tokens("Option < Vec < u32 > >"), "Option<Vec<u32>>");
        assert_eq!(normalize_tokens("HashMap < String , u64 >"), "HashMap<String, u64>");
        assert_eq!(normalize_tokens("& 'a str"), "&'a str");
        assert_eq!(normalize_tokens("& mut Vec < u8 >"), "&mut Vec<u8>");
        assert_eq!(normalize_tokens("Box < dyn Fn () + Send >"), "Box<dyn Fn()+Send>");
        assert_eq!(normalize_tokens("std :: string :: String"), "std::string::String");
    }
}
