//! Parsers for the individual operation directives.
//!
//! Each function receives the text that followed its tag and updates the
//! pending operation.

use super::Pending;
use crate::error::AnnotationError;
use crate::model::{
    ParamType, Parameter, ResponseMessage, CONTENT_TYPE_HTML, CONTENT_TYPE_JSON,
    CONTENT_TYPE_PLAIN, CONTENT_TYPE_XML,
};
use crate::model_resolver::Resolution;
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;

// name  paramType  dataType  required  "description"
static PARAM_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(\w+)\s+(\w+)\s+(\w+)\s+(\w+)\s+"([^"]+)""#).expect("valid @Param regex")
});

/// Split off the first whitespace-delimited token; the rest is left-trimmed.
fn split_token(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(end) => (&s[..end], s[end..].trim_start()),
        None => (s, ""),
    }
}

fn parse_code(directive: &'static str, token: &str) -> Result<u16, AnnotationError> {
    let code: i64 = token.parse().map_err(|_| AnnotationError::NonIntegerCode {
        directive,
        code: token.to_string(),
    })?;
    match u16::try_from(code) {
        Ok(code) if (100..=599).contains(&code) => Ok(code),
        _ => Err(AnnotationError::InvalidStatusCode { directive, code }),
    }
}

/// `@router <path> [<METHOD>]`
pub fn parse_router(pending: &mut Pending<'_, '_>, rest: &str) -> Result<(), AnnotationError> {
    let (path, after_path) = split_token(rest);
    if path.is_empty() {
        return Err(AnnotationError::MalformedDirective {
            directive: "@router",
            line: rest.trim().to_string(),
        });
    }

    let (method, _) = split_token(after_path);
    let method = method.trim_matches(|c: char| c == '[' || c == ']');

    let operation = &mut pending.operation;
    operation.path = path.to_string();
    operation.http_method = if method.is_empty() {
        "GET".to_string()
    } else {
        method.to_uppercase()
    };
    Ok(())
}

/// `@Title <text>`
pub fn parse_title(pending: &mut Pending<'_, '_>, rest: &str) -> Result<(), AnnotationError> {
    pending.operation.nickname = rest.trim().to_string();
    Ok(())
}

/// `@Description <text>`
pub fn parse_description(pending: &mut Pending<'_, '_>, rest: &str) -> Result<(), AnnotationError> {
    pending.operation.summary = rest.trim().to_string();
    Ok(())
}

/// `@Success <code> {object|array} <type>` or `@Success <code> <literal> [<message>]`
pub fn parse_success(pending: &mut Pending<'_, '_>, rest: &str) -> Result<(), AnnotationError> {
    let (code, after_code) = split_token(rest);
    if code.is_empty() {
        return Err(AnnotationError::MalformedDirective {
            directive: "@Success",
            line: rest.to_string(),
        });
    }
    let code = parse_code("@Success", code)?;
    let (kind, after_kind) = split_token(after_code);

    let response = match kind {
        "" => ResponseMessage {
            code,
            message: None,
            response_model: None,
        },
        "{object}" | "{array}" => {
            let (type_ref, _) = split_token(after_kind);
            if type_ref.is_empty() {
                return Err(AnnotationError::MissingModelTypeRef {
                    directive: "@Success",
                });
            }
            let (element, is_array) = match pending.resolver.resolve(type_ref, pending.context)? {
                Resolution::Array(inner) => (*inner, true),
                other => (other, kind == "{array}"),
            };
            let operation = &mut pending.operation;

            match element {
                Resolution::Primitive(name) => {
                    if is_array {
                        operation.response_type = "array".to_string();
                        operation.set_items(&name, true);
                    } else {
                        operation.response_type = name;
                    }
                    ResponseMessage {
                        code,
                        message: None,
                        response_model: None,
                    }
                }
                Resolution::Composite { id, models } => {
                    debug!("@Success {} references {} model(s)", id, models.len());
                    if is_array {
                        operation.response_type = "array".to_string();
                        operation.set_items(&id, false);
                    } else {
                        operation.response_type = id.clone();
                    }
                    operation.add_models(models);
                    ResponseMessage::with_model(code, id)
                }
                nested @ Resolution::Array(_) => {
                    // Swagger 1.2 items cannot nest; the element type is "array".
                    operation.response_type = "array".to_string();
                    operation.set_items("array", true);
                    operation.add_models(nested.into_models());
                    ResponseMessage {
                        code,
                        message: None,
                        response_model: None,
                    }
                }
            }
        }
        literal => {
            let message = after_kind.trim();
            ResponseMessage::with_message(code, if message.is_empty() { literal } else { message })
        }
    };

    pending.operation.response_messages.push(response);
    Ok(())
}

/// `@Failure <code> <message...>`
pub fn parse_failure(pending: &mut Pending<'_, '_>, rest: &str) -> Result<(), AnnotationError> {
    let (code, message) = split_token(rest);
    let code = parse_code("@Failure", code)?;
    let message = message.trim();

    pending.operation.response_messages.push(ResponseMessage {
        code,
        message: (!message.is_empty()).then(|| message.to_string()),
        response_model: None,
    });
    Ok(())
}

/// `@Param <name> <paramType> <dataType> <required> "<description>"`
pub fn parse_param(pending: &mut Pending<'_, '_>, rest: &str) -> Result<(), AnnotationError> {
    let malformed = || AnnotationError::MalformedDirective {
        directive: "@Param",
        line: rest.trim().to_string(),
    };

    let captures = PARAM_REGEX.captures(rest.trim()).ok_or_else(malformed)?;
    let param_type = ParamType::parse(&captures[2]).ok_or_else(malformed)?;
    let data_type = captures[3].to_string();

    if param_type == ParamType::Body && !pending.resolver.is_primitive(&data_type) {
        let models = pending
            .resolver
            .resolve(&data_type, pending.context)?
            .into_models();
        pending.operation.add_models(models);
    }

    pending.operation.parameters.push(Parameter {
        name: captures[1].to_string(),
        param_type,
        param_data_type: data_type.clone(),
        data_type,
        required: captures[4].eq_ignore_ascii_case("true"),
        description: captures[5].to_string(),
    });
    Ok(())
}

/// `@Accept <token>[,<token>...]` with tokens from `json`, `xml`, `plain`, `html`.
pub fn parse_accept(pending: &mut Pending<'_, '_>, rest: &str) -> Result<(), AnnotationError> {
    let operation = &mut pending.operation;
    for token in rest.split(',').map(str::trim) {
        let content_type = match token {
            "json" => CONTENT_TYPE_JSON,
            "xml" => CONTENT_TYPE_XML,
            "plain" => CONTENT_TYPE_PLAIN,
            "html" => CONTENT_TYPE_HTML,
            "" => continue,
            other => {
                warn!("Skipping unrecognized @Accept token {:?}", other);
                continue;
            }
        };
        operation.consumes.push(content_type.to_string());
        operation.produces.push(content_type.to_string());
    }
    Ok(())
}
