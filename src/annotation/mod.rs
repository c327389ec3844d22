//! Doc-comment annotation parsing.
//!
//! A handler's comment block is scanned line by line. Each line that starts
//! with a known [`Directive`] tag is handed to that directive's parser, which
//! fills in part of the [`Operation`] under construction. Lines without a
//! known tag are ignored.
//!
//! ```text
//! /// @Title getPet
//! /// @Description Fetch a single pet
//! /// @Param id path int true "pet id"
//! /// @Success 200 {object} Pet
//! /// @Failure 404 Pet not found
//! /// @router /pets/{id} [get]
//! ```
//!
//! The general API information (`@APIVersion`, `@APITitle`, ...) lives in a
//! separate block and is handled by [`general`].

pub mod directives;
pub mod general;

use crate::error::AnnotationError;
use crate::model::Operation;
use crate::model_resolver::ModelResolver;
use log::trace;
use std::path::Path;

/// The closed set of operation directives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Directive {
    Router,
    Title,
    Description,
    Success,
    Param,
    Failure,
    Accept,
}

/// Signature shared by all directive parsers. The `&str` is the text after the tag.
pub type DirectiveParser = fn(&mut Pending<'_, '_>, &str) -> Result<(), AnnotationError>;

impl Directive {
    pub const ALL: [Directive; 7] = [
        Directive::Router,
        Directive::Title,
        Directive::Description,
        Directive::Success,
        Directive::Param,
        Directive::Failure,
        Directive::Accept,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            Directive::Router => "@router",
            Directive::Title => "@Title",
            Directive::Description => "@Description",
            Directive::Success => "@Success",
            Directive::Param => "@Param",
            Directive::Failure => "@Failure",
            Directive::Accept => "@Accept",
        }
    }

    pub fn parser(self) -> DirectiveParser {
        match self {
            Directive::Router => directives::parse_router,
            Directive::Title => directives::parse_title,
            Directive::Description => directives::parse_description,
            Directive::Success => directives::parse_success,
            Directive::Param => directives::parse_param,
            Directive::Failure => directives::parse_failure,
            Directive::Accept => directives::parse_accept,
        }
    }

    /// Match a stripped comment line, returning the directive and the text after its tag.
    pub fn match_line(line: &str) -> Option<(Directive, &str)> {
        Self::ALL
            .iter()
            .find_map(|&directive| match_tag(line, directive.tag()).map(|rest| (directive, rest)))
    }
}

/// Text after `tag` if `line` starts with it as a whole word.
pub(crate) fn match_tag<'l>(line: &'l str, tag: &str) -> Option<&'l str> {
    let rest = line.strip_prefix(tag)?;
    (rest.is_empty() || rest.starts_with(char::is_whitespace)).then_some(rest)
}

/// Strip comment markers (`//`, `///`, `//!`, `/*`, `*`) and surrounding whitespace.
pub fn strip_comment(line: &str) -> &str {
    line.trim_start()
        .trim_start_matches(|c: char| c == '/' || c == '!' || c == '*')
        .trim()
}

/// An operation under construction plus what its directives may need.
pub struct Pending<'p, 'a> {
    pub operation: Operation,
    pub resolver: &'p mut ModelResolver<'a>,
    /// Source file of the handler, used to scope type lookups
    pub context: Option<&'p Path>,
}

/// Turns one comment block into an [`Operation`].
pub struct TagParser<'p, 'a> {
    resolver: &'p mut ModelResolver<'a>,
    context: Option<&'p Path>,
}

impl<'p, 'a> TagParser<'p, 'a> {
    pub fn new(resolver: &'p mut ModelResolver<'a>, context: Option<&'p Path>) -> Self {
        Self { resolver, context }
    }

    /// Parse a comment block. Fails on the first malformed directive.
    ///
    /// # Errors
    ///
    /// - [`AnnotationError::NotDocumented`] if no line carries a directive
    /// - [`AnnotationError::MissingRoute`] if directives exist but none is `@router`
    /// - any error reported by a directive parser
    pub fn parse<I, S>(&mut self, lines: I) -> Result<Operation, AnnotationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut pending = Pending {
            operation: Operation::default(),
            resolver: &mut *self.resolver,
            context: self.context,
        };
        let mut directives_seen = 0usize;

        for raw in lines {
            let line = strip_comment(raw.as_ref());
            if let Some((directive, rest)) = Directive::match_line(line) {
                trace!("{} {}", directive.tag(), rest.trim());
                directives_seen += 1;
                (directive.parser())(&mut pending, rest)?;
            }
        }

        if directives_seen == 0 {
            return Err(AnnotationError::NotDocumented);
        }
        if pending.operation.path.is_empty() {
            return Err(AnnotationError::MissingRoute);
        }
        Ok(pending.operation)
    }
}
