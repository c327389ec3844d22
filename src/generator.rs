//! One generation pass: handler comments in, [`ApiDescription`] out.

use crate::annotation::general::ApiInfo;
use crate::annotation::TagParser;
use crate::api_builder::{ApiDescription, ApiDescriptionBuilder};
use crate::error::AnnotationError;
use crate::model_resolver::{ModelResolver, ResolverConfig};
use crate::source::symbols::SourceSymbolTable;
use crate::source::{HandlerPredicate, SourceTree};
use anyhow::{Context, Result};
use log::{debug, info, warn};

/// Inputs of a generation pass besides the source tree.
pub struct GenerateOptions<'p> {
    pub info: ApiInfo,
    /// Overrides `@BasePath` when set
    pub base_path: Option<String>,
    pub resolver: ResolverConfig,
    pub predicate: &'p dyn HandlerPredicate,
}

/// Counts reported after a pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationSummary {
    pub candidates: usize,
    pub documented: usize,
    pub skipped: usize,
}

#[derive(Debug)]
pub struct Generation {
    pub description: ApiDescription,
    pub summary: GenerationSummary,
}

/// Parse every handler candidate in `tree` and aggregate the operations.
///
/// Functions without annotations or without `@router` are skipped. Any other
/// annotation error, or a model conflict, aborts the pass.
///
/// # Errors
///
/// Returns an error naming the function and file whose annotations failed.
pub fn generate(tree: &SourceTree, options: GenerateOptions<'_>) -> Result<Generation> {
    let symbols = SourceSymbolTable::new(tree);
    let mut resolver = ModelResolver::new(&symbols, options.resolver);
    let mut builder = ApiDescriptionBuilder::new(options.info);
    if let Some(base_path) = options.base_path {
        builder = builder.with_base_path(base_path);
    }

    let candidates = tree.handler_candidates(options.predicate);
    let mut summary = GenerationSummary {
        candidates: candidates.len(),
        ..Default::default()
    };

    for candidate in &candidates {
        let parsed = TagParser::new(&mut resolver, Some(candidate.file.as_path()))
            .parse(&candidate.comment_lines);
        let operation = match parsed {
            Ok(operation) => operation,
            Err(AnnotationError::NotDocumented) => {
                debug!("Skipping undocumented function {}", candidate.name);
                summary.skipped += 1;
                continue;
            }
            Err(e) if e.is_skip() => {
                warn!(
                    "Skipping {} in {}: {}",
                    candidate.name,
                    candidate.file.display(),
                    e
                );
                summary.skipped += 1;
                continue;
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!(
                        "Invalid annotations on {} in {}",
                        candidate.name,
                        candidate.file.display()
                    )
                });
            }
        };

        debug!(
            "{} -> {} {}",
            candidate.name, operation.http_method, operation.path
        );
        builder.add_operation(operation).with_context(|| {
            format!(
                "Failed to add operation {} from {}",
                candidate.name,
                candidate.file.display()
            )
        })?;
        summary.documented += 1;
    }

    info!(
        "Documented {} of {} functions ({} skipped), {} models",
        summary.documented,
        summary.candidates,
        summary.skipped,
        resolver.model_count()
    );
    Ok(Generation {
        description: builder.build(),
        summary,
    })
}
