//! Swagger 1.2 generator driven by comment annotations.
//!
//! Handlers document themselves with `@`-directives in their doc comments:
//!
//! ```text
//! /// @Title getPet
//! /// @Param id path int true "pet id"
//! /// @Success 200 {object} Pet
//! /// @Failure 404 pet not found
//! /// @router /pets/{id} [get]
//! ```
//!
//! A pass scans a source tree ([`source`]), parses each comment block into an
//! operation ([`annotation`]), resolves referenced types into models
//! ([`model_resolver`]), groups operations into resources ([`api_builder`])
//! and renders the result ([`serializer`]). [`generator::generate`] runs the
//! whole pass.

pub mod annotation;
pub mod api_builder;
pub mod cli;
pub mod error;
pub mod generator;
pub mod model;
pub mod model_resolver;
pub mod serializer;
pub mod source;
