//! Symbol table over parsed Rust sources.
//!
//! Struct, enum and type alias definitions are indexed by name up front.
//! Field types are reduced to [`TypeRef`]s and serde `rename`, `rename_all`
//! and `skip` attributes are applied, so model property names match the JSON
//! the handler actually produces. Newtype structs index as aliases of their
//! inner type.

use super::SourceTree;
use crate::model_resolver::{FieldDef, SymbolTable, TypeRef, TypeShape};
use log::debug;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use syn::meta::ParseNestedMeta;
use syn::visit::{self, Visit};

pub struct SourceSymbolTable {
    definitions: HashMap<String, Vec<(PathBuf, TypeShape)>>,
}

impl SourceSymbolTable {
    pub fn new(tree: &SourceTree) -> Self {
        let mut indexer = Indexer {
            file: Path::new(""),
            definitions: HashMap::new(),
        };
        for file in tree.files() {
            indexer.file = &file.path;
            indexer.visit_file(&file.syntax_tree);
        }
        debug!("Indexed {} type names", indexer.definitions.len());
        Self {
            definitions: indexer.definitions,
        }
    }
}

impl SourceSymbolTable {
    /// The definition in `context` if there is one, else the first indexed.
    fn definition(&self, name: &str, context: Option<&Path>) -> Option<&(PathBuf, TypeShape)> {
        let candidates = self.definitions.get(name)?;
        context
            .and_then(|ctx| candidates.iter().find(|(path, _)| path == ctx))
            .or_else(|| candidates.first())
    }
}

impl SymbolTable for SourceSymbolTable {
    fn lookup(&self, name: &str, context: Option<&Path>) -> Option<TypeShape> {
        self.definition(name, context).map(|(_, shape)| shape.clone())
    }

    fn origin(&self, name: &str, context: Option<&Path>) -> Option<PathBuf> {
        self.definition(name, context).map(|(path, _)| path.clone())
    }
}

struct Indexer<'i> {
    file: &'i Path,
    definitions: HashMap<String, Vec<(PathBuf, TypeShape)>>,
}

impl Indexer<'_> {
    fn insert(&mut self, name: String, shape: TypeShape) {
        self.definitions
            .entry(name)
            .or_default()
            .push((self.file.to_path_buf(), shape));
    }
}

impl<'ast> Visit<'ast> for Indexer<'_> {
    fn visit_item_struct(&mut self, item: &'ast syn::ItemStruct) {
        let shape = match &item.fields {
            syn::Fields::Named(named) => {
                let container = SerdeAttrs::parse(&item.attrs);
                let mut fields = Vec::new();
                for field in &named.named {
                    let Some(ident) = &field.ident else { continue };
                    let attrs = SerdeAttrs::parse(&field.attrs);
                    if attrs.skip {
                        continue;
                    }
                    let raw_name = ident.to_string();
                    let raw_name = raw_name.trim_start_matches("r#");
                    let name = attrs
                        .rename
                        .unwrap_or_else(|| container.rename_all.apply(raw_name));
                    let (ty, optional) = type_ref(&field.ty);
                    fields.push(FieldDef::new(name, ty, optional));
                }
                TypeShape::Struct(fields)
            }
            syn::Fields::Unnamed(unnamed) if unnamed.unnamed.len() == 1 => {
                let target = type_ref(&unnamed.unnamed[0].ty).0;
                debug!("Newtype {} serializes as {:?}", item.ident, target);
                TypeShape::Alias(target)
            }
            // Tuple structs serialize as arrays of mixed elements.
            syn::Fields::Unnamed(_) => TypeShape::Alias(TypeRef::array(TypeRef::named("object"))),
            syn::Fields::Unit => TypeShape::Struct(Vec::new()),
        };

        self.insert(item.ident.to_string(), shape);
        visit::visit_item_struct(self, item);
    }

    fn visit_item_type(&mut self, item: &'ast syn::ItemType) {
        let target = type_ref(&item.ty).0;
        self.insert(item.ident.to_string(), TypeShape::Alias(target));
        visit::visit_item_type(self, item);
    }

    fn visit_item_enum(&mut self, item: &'ast syn::ItemEnum) {
        let unit_only = item
            .variants
            .iter()
            .all(|v| matches!(v.fields, syn::Fields::Unit));

        let shape = if unit_only {
            let container = SerdeAttrs::parse(&item.attrs);
            let variants = item
                .variants
                .iter()
                .filter_map(|v| {
                    let attrs = SerdeAttrs::parse(&v.attrs);
                    if attrs.skip {
                        return None;
                    }
                    Some(
                        attrs
                            .rename
                            .unwrap_or_else(|| container.rename_all.apply(&v.ident.to_string())),
                    )
                })
                .collect();
            TypeShape::Enum(variants)
        } else {
            debug!("Enum {} carries data, indexing it as an opaque object", item.ident);
            TypeShape::Struct(Vec::new())
        };

        self.insert(item.ident.to_string(), shape);
        visit::visit_item_enum(self, item);
    }
}

/// Reduce a field type to a [`TypeRef`]; the flag is true for `Option<T>`.
fn type_ref(ty: &syn::Type) -> (TypeRef, bool) {
    match ty {
        syn::Type::Reference(reference) => type_ref(&reference.elem),
        syn::Type::Paren(paren) => type_ref(&paren.elem),
        syn::Type::Group(group) => type_ref(&group.elem),
        syn::Type::Slice(slice) => (TypeRef::array(type_ref(&slice.elem).0), false),
        syn::Type::Array(array) => (TypeRef::array(type_ref(&array.elem).0), false),
        syn::Type::Path(type_path) => {
            let Some(segment) = type_path.path.segments.last() else {
                return (TypeRef::named("object"), false);
            };
            let name = segment.ident.to_string();
            let first_arg = match &segment.arguments {
                syn::PathArguments::AngleBracketed(args) => args.args.iter().find_map(|a| match a {
                    syn::GenericArgument::Type(inner) => Some(inner),
                    _ => None,
                }),
                _ => None,
            };

            match (name.as_str(), first_arg) {
                ("Option", Some(inner)) => (type_ref(inner).0, true),
                ("Vec" | "VecDeque" | "LinkedList" | "HashSet" | "BTreeSet", Some(inner)) => {
                    (TypeRef::array(type_ref(inner).0), false)
                }
                ("Box" | "Rc" | "Arc" | "Cow" | "RefCell" | "Cell", Some(inner)) => type_ref(inner),
                ("HashMap" | "BTreeMap" | "IndexMap" | "Value" | "Map", _) => {
                    (TypeRef::named("object"), false)
                }
                _ => (TypeRef::Named(name), false),
            }
        }
        _ => (TypeRef::named("object"), false),
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum RenameRule {
    #[default]
    None,
    Lower,
    Upper,
    Pascal,
    Camel,
    Snake,
    ScreamingSnake,
    Kebab,
}

impl RenameRule {
    fn parse(rule: &str) -> Self {
        match rule {
            "lowercase" => Self::Lower,
            "UPPERCASE" => Self::Upper,
            "PascalCase" => Self::Pascal,
            "camelCase" => Self::Camel,
            "snake_case" => Self::Snake,
            "SCREAMING_SNAKE_CASE" => Self::ScreamingSnake,
            "kebab-case" => Self::Kebab,
            _ => Self::None,
        }
    }

    /// Apply to a Rust identifier (snake_case field or PascalCase variant).
    fn apply(self, ident: &str) -> String {
        let words = split_words(ident);
        match self {
            Self::None => ident.to_string(),
            Self::Lower => ident.to_lowercase(),
            Self::Upper => ident.to_uppercase(),
            Self::Snake => words.join("_"),
            Self::ScreamingSnake => words.join("_").to_uppercase(),
            Self::Kebab => words.join("-"),
            Self::Pascal => words.iter().map(|w| capitalize(w)).collect(),
            Self::Camel => words
                .iter()
                .enumerate()
                .map(|(i, w)| if i == 0 { w.clone() } else { capitalize(w) })
                .collect(),
        }
    }
}

/// Lowercase words of a snake_case or PascalCase identifier.
fn split_words(ident: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    for c in ident.chars() {
        if c == '_' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
        } else if c.is_uppercase() && !current.is_empty() {
            words.push(std::mem::take(&mut current));
            current.extend(c.to_lowercase());
        } else {
            current.extend(c.to_lowercase());
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Default)]
struct SerdeAttrs {
    rename: Option<String>,
    rename_all: RenameRule,
    skip: bool,
}

impl SerdeAttrs {
    fn parse(attrs: &[syn::Attribute]) -> Self {
        let mut parsed = SerdeAttrs::default();
        for attr in attrs.iter().filter(|a| a.path().is_ident("serde")) {
            let result = attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") && meta.input.peek(syn::Token![=]) {
                    let value: syn::LitStr = meta.value()?.parse()?;
                    parsed.rename = Some(value.value());
                } else if meta.path.is_ident("rename_all") && meta.input.peek(syn::Token![=]) {
                    let value: syn::LitStr = meta.value()?.parse()?;
                    parsed.rename_all = RenameRule::parse(&value.value());
                } else if meta.path.is_ident("skip") || meta.path.is_ident("skip_serializing") {
                    parsed.skip = true;
                } else {
                    skip_value(&meta)?;
                }
                Ok(())
            });
            if let Err(e) = result {
                debug!("Ignoring unparsable serde attribute: {}", e);
            }
        }
        parsed
    }
}

/// Consume `= value` or `(...)` after a serde key we do not interpret.
fn skip_value(meta: &ParseNestedMeta) -> syn::Result<()> {
    if meta.input.peek(syn::Token![=]) {
        let _: syn::Expr = meta.value()?.parse()?;
    } else if meta.input.peek(syn::token::Paren) {
        meta.parse_nested_meta(|inner| skip_value(&inner))?;
    }
    Ok(())
}
