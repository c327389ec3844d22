use thiserror::Error;

/// Errors raised while turning one handler's comment block into an operation.
///
/// Any of these aborts the current comment block. [`AnnotationError::is_skip`]
/// tells the caller whether the function should simply be left out of the
/// generated document or whether the whole run has to stop.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnnotationError {
    #[error("malformed {directive} directive: {line:?}")]
    MalformedDirective { directive: &'static str, line: String },

    #[error("{directive} status code must be an integer, got {code:?}")]
    NonIntegerCode { directive: &'static str, code: String },

    #[error("{directive} status code {code} is not a valid HTTP status (100-599)")]
    InvalidStatusCode { directive: &'static str, code: i64 },

    #[error("comment block has no @router directive")]
    MissingRoute,

    #[error("no API annotations found")]
    NotDocumented,

    #[error("{directive} {{object}}/{{array}} must name a type")]
    MissingModelTypeRef { directive: &'static str },

    #[error("cannot resolve type reference `{type_ref}`")]
    UnresolvedTypeReference { type_ref: String },

    #[error("generic type `{type_ref}` cannot be documented; name a concrete type")]
    UnsupportedTypeReference { type_ref: String },
}

impl AnnotationError {
    /// True when the function is not a documented operation and should be
    /// skipped rather than failing the run.
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::MissingRoute | Self::NotDocumented)
    }
}

/// Errors raised while aggregating operations into API declarations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("model `{id}` is defined twice with different properties")]
    ConflictingModel { id: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_classification() {
        assert!(AnnotationError::MissingRoute.is_skip());
        assert!(AnnotationError::NotDocumented.is_skip());
        assert!(!AnnotationError::MissingModelTypeRef { directive: "@Success" }.is_skip());
        assert!(!AnnotationError::UnresolvedTypeReference {
            type_ref: "Pet".to_string()
        }
        .is_skip());
    }

    #[test]
    fn test_messages_name_the_directive() {
        let err = AnnotationError::NonIntegerCode {
            directive: "@Failure",
            code: "abc".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "@Failure status code must be an integer, got \"abc\""
        );

        let err = AnnotationError::InvalidStatusCode {
            directive: "@Failure",
            code: 70000,
        };
        assert_eq!(
            err.to_string(),
            "@Failure status code 70000 is not a valid HTTP status (100-599)"
        );
        assert!(!err.is_skip());

        let err = AnnotationError::MissingModelTypeRef { directive: "@Success" };
        assert_eq!(err.to_string(), "@Success {object}/{array} must name a type");
    }
}
