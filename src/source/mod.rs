//! Source-tree collaborator: finds Rust files, parses them and hands out the
//! doc-comment blocks of handler functions.
//!
//! Which functions count as handlers is decided by an injected
//! [`HandlerPredicate`], so the annotation parser never depends on a naming
//! convention.

pub mod symbols;

use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use syn::visit::{self, Visit};
use walkdir::WalkDir;

/// A parsed Rust source file.
#[derive(Debug)]
pub struct SourceFile {
    pub path: PathBuf,
    pub syntax_tree: syn::File,
}

impl SourceFile {
    /// Parse in-memory source, mainly for tests and embedding.
    pub fn parse(path: impl Into<PathBuf>, content: &str) -> Result<Self> {
        let path = path.into();
        let syntax_tree = syn::parse_file(content)
            .with_context(|| format!("Failed to parse Rust syntax in file: {}", path.display()))?;
        Ok(Self { path, syntax_tree })
    }
}

/// All Rust files below one directory.
pub struct SourceTree {
    files: Vec<SourceFile>,
}

/// What a handler predicate gets to see about a function.
pub struct FunctionSignature<'s> {
    pub signature: &'s syn::Signature,
    /// Self type of the enclosing `impl` block, if any
    pub self_type: Option<&'s str>,
}

impl FunctionSignature<'_> {
    pub fn name(&self) -> String {
        self.signature.ident.to_string()
    }
}

/// Decides whether a function's comments should be parsed as an operation.
pub trait HandlerPredicate {
    fn is_handler(&self, function: &FunctionSignature<'_>) -> bool;
}

impl<F> HandlerPredicate for F
where
    F: Fn(&FunctionSignature<'_>) -> bool,
{
    fn is_handler(&self, function: &FunctionSignature<'_>) -> bool {
        self(function)
    }
}

/// Every function is a candidate.
pub struct AnyFunction;

impl HandlerPredicate for AnyFunction {
    fn is_handler(&self, _function: &FunctionSignature<'_>) -> bool {
        true
    }
}

/// Methods whose `impl` self type contains the given substring.
pub struct ReceiverContains(pub String);

impl HandlerPredicate for ReceiverContains {
    fn is_handler(&self, function: &FunctionSignature<'_>) -> bool {
        function
            .self_type
            .map_or(false, |self_type| self_type.contains(self.0.as_str()))
    }
}

/// A function selected by the predicate, with its raw comment lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerCandidate {
    pub name: String,
    pub file: PathBuf,
    pub comment_lines: Vec<String>,
}

impl SourceTree {
    /// Scan `root` recursively for `.rs` files (skipping `target` and hidden
    /// directories) and parse them in path order.
    ///
    /// Files with syntax errors are skipped with a warning; unreadable files
    /// are an error.
    pub fn load(root: &Path) -> Result<Self> {
        debug!("Scanning {}", root.display());
        let mut paths = Vec::new();

        let walker = WalkDir::new(root).into_iter().filter_entry(|e| {
            if e.path() == root {
                return true;
            }
            let name = e.file_name().to_string_lossy();
            !name.starts_with('.') && name != "target"
        });
        for entry in walker {
            let entry =
                entry.with_context(|| format!("Failed to walk directory: {}", root.display()))?;
            let path = entry.path();
            if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("rs") {
                paths.push(path.to_path_buf());
            }
        }
        paths.sort();

        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read file: {}", path.display()))?;
            match SourceFile::parse(path.clone(), &content) {
                Ok(file) => files.push(file),
                Err(e) => warn!("Skipping {}: {:#}", path.display(), e),
            }
        }

        debug!("Parsed {} source files", files.len());
        Ok(Self { files })
    }

    pub fn from_files(files: Vec<SourceFile>) -> Self {
        Self { files }
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    /// Functions accepted by `predicate`, in file then source order.
    pub fn handler_candidates(&self, predicate: &dyn HandlerPredicate) -> Vec<HandlerCandidate> {
        let mut collector = CandidateCollector {
            predicate,
            file: Path::new(""),
            self_type: None,
            candidates: Vec::new(),
        };
        for file in &self.files {
            collector.file = &file.path;
            collector.visit_file(&file.syntax_tree);
        }
        debug!("Found {} handler candidates", collector.candidates.len());
        collector.candidates
    }
}

struct CandidateCollector<'c> {
    predicate: &'c dyn HandlerPredicate,
    file: &'c Path,
    self_type: Option<String>,
    candidates: Vec<HandlerCandidate>,
}

impl CandidateCollector<'_> {
    fn consider(&mut self, signature: &syn::Signature, attrs: &[syn::Attribute]) {
        let function = FunctionSignature {
            signature,
            self_type: self.self_type.as_deref(),
        };
        if !self.predicate.is_handler(&function) {
            return;
        }
        self.candidates.push(HandlerCandidate {
            name: function.name(),
            file: self.file.to_path_buf(),
            comment_lines: doc_lines(attrs),
        });
    }
}

impl<'ast> Visit<'ast> for CandidateCollector<'_> {
    fn visit_item_fn(&mut self, item: &'ast syn::ItemFn) {
        self.consider(&item.sig, &item.attrs);
        visit::visit_item_fn(self, item);
    }

    fn visit_item_impl(&mut self, item: &'ast syn::ItemImpl) {
        let outer = self.self_type.replace(type_name(&item.self_ty));
        visit::visit_item_impl(self, item);
        self.self_type = outer;
    }

    fn visit_impl_item_fn(&mut self, item: &'ast syn::ImplItemFn) {
        self.consider(&item.sig, &item.attrs);
        visit::visit_impl_item_fn(self, item);
    }
}

fn type_name(ty: &syn::Type) -> String {
    match ty {
        syn::Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .map(|s| s.ident.to_string())
            .unwrap_or_default(),
        syn::Type::Reference(reference) => type_name(&reference.elem),
        _ => String::new(),
    }
}

/// Doc-comment text of `attrs`, one entry per line.
pub fn doc_lines(attrs: &[syn::Attribute]) -> Vec<String> {
    let mut lines = Vec::new();
    for attr in attrs {
        if !attr.path().is_ident("doc") {
            continue;
        }
        if let syn::Meta::NameValue(name_value) = &attr.meta {
            if let syn::Expr::Lit(syn::ExprLit {
                lit: syn::Lit::Str(text),
                ..
            }) = &name_value.value
            {
                lines.extend(text.value().lines().map(str::to_string));
            }
        }
    }
    lines
}
