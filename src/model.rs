//! Swagger 1.2 data model produced by the annotation parser.
//!
//! Every optional field is skipped during serialization when it is empty so
//! the JSON stays compatible with Swagger 1.2 consumers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_XML: &str = "application/xml";
pub const CONTENT_TYPE_PLAIN: &str = "text/plain";
pub const CONTENT_TYPE_HTML: &str = "text/html";

/// One documented handler function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub http_method: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub nickname: String,
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub response_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<OperationItems>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub summary: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub response_messages: Vec<ResponseMessage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub consumes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub produces: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authorizations: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub protocols: Vec<String>,
    pub path: String,
    /// Models discovered while parsing this operation, owned until merged.
    #[serde(skip)]
    pub models: Vec<Model>,
}

impl Default for Operation {
    fn default() -> Self {
        Self {
            http_method: "GET".to_string(),
            nickname: String::new(),
            response_type: String::new(),
            items: None,
            summary: String::new(),
            notes: String::new(),
            parameters: Vec::new(),
            response_messages: Vec::new(),
            consumes: Vec::new(),
            produces: Vec::new(),
            authorizations: Vec::new(),
            protocols: Vec::new(),
            path: String::new(),
            models: Vec::new(),
        }
    }
}

impl Operation {
    /// Set the element type of an array response.
    pub fn set_items(&mut self, element: &str, primitive: bool) {
        self.items = Some(if primitive {
            OperationItems {
                item_type: Some(element.to_string()),
                reference: None,
            }
        } else {
            OperationItems {
                item_type: None,
                reference: Some(element.to_string()),
            }
        });
    }

    /// Add models, keeping the first copy of each id.
    pub fn add_models(&mut self, models: impl IntoIterator<Item = Model>) {
        for model in models {
            if !self.models.iter().any(|m| m.id == model.id) {
                self.models.push(model);
            }
        }
    }
}

/// Element reference for `type == "array"` operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationItems {
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,
}

/// Where a parameter is taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    Query,
    Form,
    Path,
    Body,
    Header,
}

impl ParamType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "query" => Some(Self::Query),
            "form" => Some(Self::Form),
            "path" => Some(Self::Path),
            "body" => Some(Self::Body),
            "header" => Some(Self::Header),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,
    pub param_type: ParamType,
    #[serde(rename = "type")]
    pub param_data_type: String,
    /// Same value as `type`; Swagger 1.2 readers disagree on which one they read.
    pub data_type: String,
    pub required: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMessage {
    pub code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_model: Option<String>,
}

impl ResponseMessage {
    pub fn with_message(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: Some(message.into()),
            response_model: None,
        }
    }

    pub fn with_model(code: u16, model: impl Into<String>) -> Self {
        Self {
            code,
            message: None,
            response_model: Some(model.into()),
        }
    }
}

/// A named schema for a composite type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    pub properties: BTreeMap<String, ModelProperty>,
}

impl Model {
    /// Ids of the composite models this model's properties point at.
    pub fn referenced_ids(&self) -> Vec<&str> {
        let mut ids = Vec::new();
        for property in self.properties.values() {
            let target = property
                .reference
                .as_deref()
                .or_else(|| property.items.as_ref().and_then(|i| i.reference.as_deref()));
            if let Some(id) = target {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
        ids
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelProperty {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub property_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<OperationItems>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
