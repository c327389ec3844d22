use crate::annotation::general::ApiInfo;
use crate::error::BuildError;
use crate::model::{Model, Operation};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

pub const SWAGGER_VERSION: &str = "1.2";
pub const DEFAULT_BASE_PATH: &str = "http://127.0.0.1:3000";
pub const DEFAULT_API_VERSION: &str = "1.0.0";

/// Groups operations into resources and builds the Swagger 1.2 documents.
pub struct ApiDescriptionBuilder {
    info: ApiInfo,
    base_path: String,
    /// Resource key -> declaration under construction
    resources: BTreeMap<String, ResourceDraft>,
}

#[derive(Default)]
struct ResourceDraft {
    apis: Vec<ApiRef>,
    models: BTreeMap<String, Model>,
}

/// Top-level resource listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceListing {
    pub api_version: String,
    pub swagger_version: String,
    pub base_path: String,
    pub apis: Vec<ResourceSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<ListingInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSummary {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms_of_service_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_url: Option<String>,
}

/// Full declaration of one resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDeclaration {
    pub api_version: String,
    pub swagger_version: String,
    pub base_path: String,
    pub resource_path: String,
    pub apis: Vec<ApiRef>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub models: BTreeMap<String, Model>,
}

/// All operations sharing one path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiRef {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub operations: Vec<Operation>,
}

/// Output of one generation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDescription {
    pub resource_listing: ResourceListing,
    /// Resource key -> declaration, sorted by key
    pub api_declarations: BTreeMap<String, ApiDeclaration>,
}

impl ApiDescriptionBuilder {
    pub fn new(info: ApiInfo) -> Self {
        let base_path = info
            .base_path
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_PATH.to_string());
        debug!("Initializing ApiDescriptionBuilder with base path {}", base_path);
        Self {
            info,
            base_path,
            resources: BTreeMap::new(),
        }
    }

    /// Override the base path from the annotations.
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// Resource an operation path belongs to: its first non-empty segment.
    pub fn resource_key(path: &str) -> String {
        path.split('/')
            .find(|segment| !segment.is_empty())
            .unwrap_or("root")
            .to_string()
    }

    /// Add one parsed operation and merge its models into its resource.
    ///
    /// # Errors
    ///
    /// [`BuildError::ConflictingModel`] if a model id is already registered
    /// for the resource with different properties.
    pub fn add_operation(&mut self, mut operation: Operation) -> Result<(), BuildError> {
        operation.path = Self::convert_path_format(&operation.path);
        let key = Self::resource_key(&operation.path);
        debug!(
            "Adding {} {} to resource {}",
            operation.http_method, operation.path, key
        );

        let resource = self.resources.entry(key).or_default();
        let models = std::mem::take(&mut operation.models);
        for model in &models {
            if let Some(existing) = resource.models.get(&model.id) {
                if existing != model {
                    return Err(BuildError::ConflictingModel {
                        id: model.id.clone(),
                    });
                }
            }
        }
        for model in models {
            if let Entry::Vacant(slot) = resource.models.entry(model.id.clone()) {
                slot.insert(model);
            }
        }

        match resource.apis.iter().position(|api| api.path == operation.path) {
            Some(index) => resource.apis[index].operations.push(operation),
            None => resource.apis.push(ApiRef {
                path: operation.path.clone(),
                description: None,
                operations: vec![operation],
            }),
        }
        Ok(())
    }

    /// Convert `:param` segments to `{param}`.
    fn convert_path_format(path: &str) -> String {
        path.split('/')
            .map(|part| match part.strip_prefix(':') {
                Some(name) => format!("{{{}}}", name),
                None => part.to_string(),
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    fn api_version(&self) -> String {
        self.info
            .api_version
            .clone()
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_string())
    }

    fn listing_info(&self) -> Option<ListingInfo> {
        let info = ListingInfo {
            title: self.info.title.clone(),
            description: self.info.description.clone(),
            contact: self.info.contact.clone(),
            terms_of_service_url: self.info.terms_of_service_url.clone(),
            license: self.info.license.clone(),
            license_url: self.info.license_url.clone(),
        };
        let empty = info.title.is_none()
            && info.description.is_none()
            && info.contact.is_none()
            && info.terms_of_service_url.is_none()
            && info.license.is_none()
            && info.license_url.is_none();
        (!empty).then_some(info)
    }

    pub fn build(self) -> ApiDescription {
        let api_version = self.api_version();
        let info = self.listing_info();

        let apis = self
            .resources
            .keys()
            .map(|key| ResourceSummary {
                path: format!("/{}", key),
                description: None,
            })
            .collect();

        let resource_listing = ResourceListing {
            api_version: api_version.clone(),
            swagger_version: SWAGGER_VERSION.to_string(),
            base_path: self.base_path.clone(),
            apis,
            info,
        };

        let api_declarations = self
            .resources
            .into_iter()
            .map(|(key, draft)| {
                let declaration = ApiDeclaration {
                    api_version: api_version.clone(),
                    swagger_version: SWAGGER_VERSION.to_string(),
                    base_path: self.base_path.clone(),
                    resource_path: format!("/{}", key),
                    apis: draft.apis,
                    models: draft.models,
                };
                (key, declaration)
            })
            .collect();

        debug!("Built API description");
        ApiDescription {
            resource_listing,
            api_declarations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelProperty;
    use pretty_assertions::assert_eq;

    fn model(id: &str, property: &str) -> Model {
        let mut properties = BTreeMap::new();
        properties.insert(
            property.to_string(),
            ModelProperty {
                property_type: Some("string".to_string()),
                ..Default::default()
            },
        );
        Model {
            id: id.to_string(),
            required: vec![],
            properties,
        }
    }

    fn operation(method: &str, path: &str, models: Vec<Model>) -> Operation {
        Operation {
            http_method: method.to_string(),
            path: path.to_string(),
            models,
            ..Default::default()
        }
    }

    #[test]
    fn test_resource_key() {
        assert_eq!(ApiDescriptionBuilder::resource_key("/pets/{id}"), "pets");
        assert_eq!(ApiDescriptionBuilder::resource_key("pets"), "pets");
        assert_eq!(ApiDescriptionBuilder::resource_key("//store/order"), "store");
        assert_eq!(ApiDescriptionBuilder::resource_key("/"), "root");
    }

    #[test]
    fn test_convert_path_format() {
        assert_eq!(
            ApiDescriptionBuilder::convert_path_format("/pets/:id/toys/:toy"),
            "/pets/{id}/toys/{toy}"
        );
        assert_eq!(ApiDescriptionBuilder::convert_path_format("/pets/{id}"), "/pets/{id}");
    }

    #[test]
    fn test_groups_by_resource_and_path() {
        let mut builder = ApiDescriptionBuilder::new(ApiInfo::default());
        builder.add_operation(operation("GET", "/pets", vec![])).unwrap();
        builder.add_operation(operation("POST", "/pets", vec![])).unwrap();
        builder.add_operation(operation("GET", "/pets/{id}", vec![])).unwrap();
        builder.add_operation(operation("GET", "/store/inventory", vec![])).unwrap();

        let description = builder.build();
        let keys: Vec<&str> = description.api_declarations.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["pets", "store"]);

        let pets = &description.api_declarations["pets"];
        assert_eq!(pets.resource_path, "/pets");
        assert_eq!(pets.apis.len(), 2);
        assert_eq!(pets.apis[0].path, "/pets");
        assert_eq!(pets.apis[0].operations.len(), 2);
        assert_eq!(pets.apis[1].path, "/pets/{id}");

        let listing_paths: Vec<&str> = description
            .resource_listing
            .apis
            .iter()
            .map(|a| a.path.as_str())
            .collect();
        assert_eq!(listing_paths, vec!["/pets", "/store"]);
    }

    #[test]
    fn test_model_merge_is_idempotent() {
        let mut builder = ApiDescriptionBuilder::new(ApiInfo::default());
        builder
            .add_operation(operation("GET", "/pets", vec![model("Pet", "name")]))
            .unwrap();
        builder
            .add_operation(operation("GET", "/pets/{id}", vec![model("Pet", "name")]))
            .unwrap();

        let description = builder.build();
        let models = &description.api_declarations["pets"].models;
        assert_eq!(models.len(), 1);
        assert_eq!(models["Pet"], model("Pet", "name"));
    }

    #[test]
    fn test_conflicting_model_is_rejected() {
        let mut builder = ApiDescriptionBuilder::new(ApiInfo::default());
        builder
            .add_operation(operation("GET", "/pets", vec![model("Pet", "name")]))
            .unwrap();
        let err = builder
            .add_operation(operation("GET", "/pets/{id}", vec![model("Pet", "label")]))
            .unwrap_err();
        assert_eq!(err, BuildError::ConflictingModel { id: "Pet".to_string() });
    }

    #[test]
    fn test_models_are_scoped_per_resource() {
        let mut builder = ApiDescriptionBuilder::new(ApiInfo::default());
        builder
            .add_operation(operation("GET", "/pets", vec![model("Pet", "name")]))
            .unwrap();
        builder
            .add_operation(operation("GET", "/store", vec![model("Pet", "name")]))
            .unwrap();
        builder.add_operation(operation("GET", "/health", vec![])).unwrap();

        let description = builder.build();
        assert!(description.api_declarations["pets"].models.contains_key("Pet"));
        assert!(description.api_declarations["store"].models.contains_key("Pet"));
        assert!(description.api_declarations["health"].models.is_empty());
    }

    #[test]
    fn test_listing_metadata() {
        let info = ApiInfo {
            api_version: Some("2.0".to_string()),
            title: Some("Petstore".to_string()),
            base_path: Some("http://api.example.com".to_string()),
            ..Default::default()
        };
        let description = ApiDescriptionBuilder::new(info).build();
        let listing = &description.resource_listing;

        assert_eq!(listing.api_version, "2.0");
        assert_eq!(listing.swagger_version, "1.2");
        assert_eq!(listing.base_path, "http://api.example.com");
        assert_eq!(listing.info.as_ref().unwrap().title.as_deref(), Some("Petstore"));
        assert!(listing.apis.is_empty());
    }

    #[test]
    fn test_defaults_and_override() {
        let description = ApiDescriptionBuilder::new(ApiInfo::default()).build();
        assert_eq!(description.resource_listing.base_path, DEFAULT_BASE_PATH);
        assert_eq!(description.resource_listing.api_version, DEFAULT_API_VERSION);
        assert!(description.resource_listing.info.is_none());

        let info = ApiInfo {
            base_path: Some("http://from-annotation".to_string()),
            ..Default::default()
        };
        let description = ApiDescriptionBuilder::new(info)
            .with_base_path("http://override")
            .build();
        assert_eq!(description.resource_listing.base_path, "http://override");
    }

    #[test]
    fn test_declaration_json_shape() {
        let mut builder = ApiDescriptionBuilder::new(ApiInfo::default());
        builder.add_operation(operation("GET", "/pets", vec![])).unwrap();
        let description = builder.build();

        let json = serde_json::to_value(&description.api_declarations["pets"]).unwrap();
        assert_eq!(json["swaggerVersion"], "1.2");
        assert_eq!(json["resourcePath"], "/pets");
        assert_eq!(json["apis"][0]["operations"][0]["httpMethod"], "GET");
        assert!(json.get("models").is_none());
    }
}
