//! Resolves type references named in annotations into Swagger models.
//!
//! The resolver never reads source code itself. It asks a [`SymbolTable`]
//! for the shape of a composite type, builds a [`Model`] for it and walks
//! every non-primitive field type in turn. Completed models are cached for
//! the whole generation pass, so resolving the same type twice yields the
//! same model and recursive types terminate.

use crate::error::AnnotationError;
use crate::model::{Model, ModelProperty, OperationItems};
use log::{debug, trace};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// Primitive names with their Swagger `(type, format)`.
const PRIMITIVES: &[(&str, &str, Option<&str>)] = &[
    ("bool", "boolean", None),
    ("boolean", "boolean", None),
    ("char", "string", None),
    ("str", "string", None),
    ("String", "string", None),
    ("string", "string", None),
    ("i8", "integer", Some("int32")),
    ("i16", "integer", Some("int32")),
    ("i32", "integer", Some("int32")),
    ("u8", "integer", Some("int32")),
    ("u16", "integer", Some("int32")),
    ("u32", "integer", Some("int32")),
    ("int", "integer", Some("int32")),
    ("integer", "integer", Some("int32")),
    ("i64", "integer", Some("int64")),
    ("u64", "integer", Some("int64")),
    ("i128", "integer", Some("int64")),
    ("u128", "integer", Some("int64")),
    ("isize", "integer", Some("int64")),
    ("usize", "integer", Some("int64")),
    ("long", "integer", Some("int64")),
    ("f32", "number", Some("float")),
    ("float", "number", Some("float")),
    ("f64", "number", Some("double")),
    ("double", "number", Some("double")),
    ("number", "number", Some("double")),
    ("byte", "string", Some("byte")),
    ("date", "string", Some("date")),
    ("dateTime", "string", Some("date-time")),
    ("object", "object", None),
];

/// A type reference as it appears in a field or an annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    /// A single named type; the name is unqualified.
    Named(String),
    /// A sequence of the inner type.
    Array(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn array(inner: TypeRef) -> Self {
        Self::Array(Box::new(inner))
    }

    /// Parse an annotation type token such as `Pet`, `models::Pet`,
    /// `models.Pet`, `Vec<Pet>`, `[]Pet` or `[Pet]`.
    ///
    /// Sequence types become [`TypeRef::Array`] and transparent wrappers
    /// (`Option`, `Box`, `Rc`, `Arc`, `Cow`, `Json`) are unwrapped. Any other
    /// generic type, e.g. `Page<Pet>`, yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Some(inner) = raw.strip_prefix("[]") {
            return Self::parse(inner).map(Self::array);
        }
        if let Some(inner) = raw.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
            return Self::parse(inner).map(Self::array);
        }
        if let Some(open) = raw.find('<') {
            let inner = raw[open + 1..].strip_suffix('>')?;
            return match unqualified(&raw[..open]) {
                "Vec" | "VecDeque" | "HashSet" | "BTreeSet" => Self::parse(inner).map(Self::array),
                "Option" | "Box" | "Rc" | "Arc" | "Cow" | "Json" => Self::parse(inner),
                _ => None,
            };
        }
        Some(Self::Named(unqualified(raw).to_string()))
    }

    /// The innermost named type.
    pub fn element_name(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::Array(inner) => inner.element_name(),
        }
    }
}

/// Strip `::` or `.` qualification from a type name.
pub fn unqualified(name: &str) -> &str {
    let name = name.rsplit("::").next().unwrap_or(name);
    name.rsplit('.').next().unwrap_or(name)
}

/// One field of a composite type, as reported by the symbol table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    /// Serialized field name
    pub name: String,
    pub ty: TypeRef,
    /// Whether the field may be absent (e.g. `Option<T>`)
    pub optional: bool,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, ty: TypeRef, optional: bool) -> Self {
        Self {
            name: name.into(),
            ty,
            optional,
        }
    }
}

/// The shape of a named type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeShape {
    Struct(Vec<FieldDef>),
    /// Unit-only enum, serialized as one of its variant names
    Enum(Vec<String>),
    /// Serialized as another type: `type` aliases and newtype structs
    Alias(TypeRef),
}

/// Read-only lookup of type definitions.
///
/// `context` is the source file of the handler being documented; an
/// implementation should prefer a definition from that file when a name is
/// defined more than once.
pub trait SymbolTable {
    fn lookup(&self, name: &str, context: Option<&Path>) -> Option<TypeShape>;

    /// File holding the definition `lookup` returns for the same arguments.
    /// Tables that cannot tell return `None`, and then every definition of a
    /// name is treated as the same one.
    fn origin(&self, _name: &str, _context: Option<&Path>) -> Option<PathBuf> {
        None
    }
}

/// Immutable resolver configuration.
#[derive(Debug, Clone, Default)]
pub struct ResolverConfig {
    aliases: BTreeMap<String, String>,
}

impl ResolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat `type_name` (an external wrapper type) as the primitive `primitive`.
    pub fn with_alias(mut self, type_name: impl Into<String>, primitive: impl Into<String>) -> Self {
        self.aliases.insert(type_name.into(), primitive.into());
        self
    }

    pub fn alias(&self, type_name: &str) -> Option<&str> {
        self.aliases.get(type_name).map(String::as_str)
    }

    pub fn aliases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Result of resolving a type reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// No model; use this primitive name directly.
    Primitive(String),
    /// The root model id plus the transitive closure of models, root first.
    Composite { id: String, models: Vec<Model> },
    /// A sequence of the inner resolution.
    Array(Box<Resolution>),
}

impl Resolution {
    /// Every model this resolution carries, through any array layers.
    pub fn into_models(self) -> Vec<Model> {
        match self {
            Resolution::Primitive(_) => Vec::new(),
            Resolution::Composite { models, .. } => models,
            Resolution::Array(inner) => inner.into_models(),
        }
    }
}

/// A definition is identified by its name and the file it comes from.
type ModelKey = (String, Option<PathBuf>);

struct Resolved {
    model: Model,
    /// Definitions this model's properties point at
    refs: Vec<ModelKey>,
}

enum Walked {
    Model(ModelKey),
    InProgress(ModelKey),
    Enum(Vec<String>),
    /// Target type plus the alias' own key
    Alias(TypeRef, ModelKey),
    /// Alias that refers back to itself
    Opaque,
}

pub struct ModelResolver<'a> {
    symbols: &'a dyn SymbolTable,
    config: ResolverConfig,
    completed: BTreeMap<ModelKey, Resolved>,
    in_progress: HashSet<ModelKey>,
    expanding: HashSet<ModelKey>,
}

impl<'a> ModelResolver<'a> {
    pub fn new(symbols: &'a dyn SymbolTable, config: ResolverConfig) -> Self {
        debug!(
            "Initializing ModelResolver with {} type aliases",
            config.aliases.len()
        );
        for (type_name, primitive) in config.aliases() {
            trace!("Alias {} -> {}", type_name, primitive);
        }
        Self {
            symbols,
            config,
            completed: BTreeMap::new(),
            in_progress: HashSet::new(),
            expanding: HashSet::new(),
        }
    }

    /// The primitive a type name stands for, after alias substitution.
    pub fn primitive_name(&self, type_name: &str) -> Option<String> {
        let name = unqualified(type_name.trim());
        if let Some(target) = self.config.alias(name) {
            return Some(target.to_string());
        }
        PRIMITIVES
            .iter()
            .any(|(p, _, _)| *p == name)
            .then(|| name.to_string())
    }

    pub fn is_primitive(&self, type_name: &str) -> bool {
        self.primitive_name(type_name).is_some()
    }

    /// Resolve a type reference to a model and everything it references.
    ///
    /// `Vec<Pet>`, `[Pet]` and aliases of sequences resolve to
    /// [`Resolution::Array`].
    ///
    /// # Errors
    ///
    /// - [`AnnotationError::UnsupportedTypeReference`] for generic types other
    ///   than sequences and transparent wrappers such as `Option` or `Box`
    /// - [`AnnotationError::UnresolvedTypeReference`] if a composite type is
    ///   not in the symbol table
    pub fn resolve(
        &mut self,
        type_ref: &str,
        context: Option<&Path>,
    ) -> Result<Resolution, AnnotationError> {
        let parsed = TypeRef::parse(type_ref).ok_or_else(|| {
            AnnotationError::UnsupportedTypeReference {
                type_ref: type_ref.trim().to_string(),
            }
        })?;
        debug!("Resolving type reference {} as {:?}", type_ref, parsed);
        self.resolve_ref(&parsed, context)
    }

    fn resolve_ref(
        &mut self,
        type_ref: &TypeRef,
        context: Option<&Path>,
    ) -> Result<Resolution, AnnotationError> {
        let name = match type_ref {
            TypeRef::Array(inner) => {
                return Ok(Resolution::Array(Box::new(self.resolve_ref(inner, context)?)))
            }
            TypeRef::Named(name) => name,
        };

        if let Some(primitive) = self.primitive_name(name) {
            return Ok(Resolution::Primitive(primitive));
        }

        match self.walk(name, context)? {
            Walked::Enum(_) => Ok(Resolution::Primitive("string".to_string())),
            Walked::Opaque => Ok(Resolution::Primitive("object".to_string())),
            Walked::Alias(target, key) => {
                self.expanding.insert(key.clone());
                let resolved = self.resolve_ref(&target, key.1.as_deref().or(context));
                self.expanding.remove(&key);
                resolved
            }
            Walked::Model(key) | Walked::InProgress(key) => Ok(Resolution::Composite {
                models: self.closure(&key),
                id: name.clone(),
            }),
        }
    }

    /// Number of distinct definitions resolved so far.
    pub fn model_count(&self) -> usize {
        self.completed.len()
    }

    fn walk(&mut self, id: &str, context: Option<&Path>) -> Result<Walked, AnnotationError> {
        let key: ModelKey = (id.to_string(), self.symbols.origin(id, context));
        if self.completed.contains_key(&key) {
            trace!("Model {} already resolved", id);
            return Ok(Walked::Model(key));
        }
        if self.in_progress.contains(&key) {
            debug!("Model {} is being resolved, not re-entering", id);
            return Ok(Walked::InProgress(key));
        }

        let shape = self
            .symbols
            .lookup(id, context)
            .ok_or_else(|| AnnotationError::UnresolvedTypeReference {
                type_ref: id.to_string(),
            })?;

        match shape {
            TypeShape::Enum(variants) => Ok(Walked::Enum(variants)),
            TypeShape::Alias(_) if self.expanding.contains(&key) => {
                debug!("Alias {} refers to itself, documenting it as an object", id);
                Ok(Walked::Opaque)
            }
            TypeShape::Alias(target) => {
                trace!("{} is an alias of {:?}", id, target);
                Ok(Walked::Alias(target, key))
            }
            TypeShape::Struct(fields) => {
                self.in_progress.insert(key.clone());
                // Field types are looked up from the file defining the struct.
                let origin = key.1.clone();
                let built = self.build_model(id, &fields, origin.as_deref().or(context));
                self.in_progress.remove(&key);

                let resolved = built?;
                debug!(
                    "Resolved model {} with {} properties",
                    id,
                    resolved.model.properties.len()
                );
                self.completed.insert(key.clone(), resolved);
                Ok(Walked::Model(key))
            }
        }
    }

    fn build_model(
        &mut self,
        id: &str,
        fields: &[FieldDef],
        context: Option<&Path>,
    ) -> Result<Resolved, AnnotationError> {
        let mut properties = BTreeMap::new();
        let mut required = Vec::new();
        let mut refs = Vec::new();

        for field in fields {
            let property = self.property_for(&field.ty, context, &mut refs)?;
            properties.insert(field.name.clone(), property);
            if !field.optional {
                required.push(field.name.clone());
            }
        }

        Ok(Resolved {
            model: Model {
                id: id.to_string(),
                required,
                properties,
            },
            refs,
        })
    }

    fn property_for(
        &mut self,
        ty: &TypeRef,
        context: Option<&Path>,
        refs: &mut Vec<ModelKey>,
    ) -> Result<ModelProperty, AnnotationError> {
        let name = match ty {
            TypeRef::Array(inner) => {
                let element = self.property_for(inner, context, refs)?;
                let items = match element.reference {
                    Some(reference) => OperationItems {
                        reference: Some(reference),
                        item_type: None,
                    },
                    None => OperationItems {
                        reference: None,
                        item_type: element.property_type,
                    },
                };
                return Ok(ModelProperty {
                    property_type: Some("array".to_string()),
                    items: Some(items),
                    ..Default::default()
                });
            }
            TypeRef::Named(name) => name,
        };

        if let Some(primitive) = self.primitive_name(name) {
            let (ty, format) = swagger_type(&primitive);
            return Ok(ModelProperty {
                property_type: Some(ty.to_string()),
                format: format.map(str::to_string),
                ..Default::default()
            });
        }
        match self.walk(name, context)? {
            Walked::Enum(variants) => Ok(ModelProperty {
                property_type: Some("string".to_string()),
                enum_values: Some(variants),
                ..Default::default()
            }),
            Walked::Opaque => Ok(ModelProperty {
                property_type: Some("object".to_string()),
                ..Default::default()
            }),
            Walked::Alias(target, key) => {
                self.expanding.insert(key.clone());
                let property = self.property_for(&target, key.1.as_deref().or(context), refs);
                self.expanding.remove(&key);
                property
            }
            Walked::Model(key) | Walked::InProgress(key) => {
                if !refs.contains(&key) {
                    refs.push(key);
                }
                Ok(ModelProperty {
                    reference: Some(name.clone()),
                    ..Default::default()
                })
            }
        }
    }

    /// Depth-first closure over completed models, root first.
    fn closure(&self, root: &ModelKey) -> Vec<Model> {
        let mut visited = HashSet::new();
        let mut out = Vec::new();
        self.collect(root, &mut visited, &mut out);
        out
    }

    fn collect(&self, key: &ModelKey, visited: &mut HashSet<ModelKey>, out: &mut Vec<Model>) {
        if !visited.insert(key.clone()) {
            return;
        }
        if let Some(resolved) = self.completed.get(key) {
            out.push(resolved.model.clone());
            for next in &resolved.refs {
                self.collect(next, visited, out);
            }
        }
    }
}

/// Swagger `(type, format)` for a primitive name. Unknown names are passed
/// through as the type.
pub fn swagger_type(primitive: &str) -> (&str, Option<&'static str>) {
    PRIMITIVES
        .iter()
        .find(|(p, _, _)| *p == primitive)
        .map(|(_, ty, format)| (*ty, *format))
        .unwrap_or((primitive, None))
}
