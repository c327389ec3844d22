//! Rendering of an [`ApiDescription`] into its output artifacts.
//!
//! The default artifact is a Rust module holding the resource listing and one
//! self-contained JSON declaration per resource as string constants, so a
//! server can embed it with `include!` and serve each document verbatim. JSON
//! and YAML renderings of the whole description are available as a single
//! nested bundle.

use crate::api_builder::ApiDescription;
use anyhow::{Context, Result};
use log::debug;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

/// Render the generated Rust module.
///
/// Entries of `API_DESCRIPTIONS` are sorted by resource key.
///
/// # Errors
///
/// Returns an error if a document fails to serialize.
pub fn render_module(description: &ApiDescription) -> Result<String> {
    debug!(
        "Rendering module with {} API declarations",
        description.api_declarations.len()
    );
    let listing = serde_json::to_string_pretty(&description.resource_listing)
        .context("Failed to serialize resource listing to JSON")?;

    let mut out = String::new();
    writeln!(out, "// Code generated by swagger-from-comments. DO NOT EDIT.")?;
    writeln!(out)?;
    writeln!(
        out,
        "pub const RESOURCE_LISTING: &str = {};",
        raw_string_literal(&listing)
    )?;
    writeln!(out)?;
    writeln!(out, "pub const API_DESCRIPTIONS: &[(&str, &str)] = &[")?;
    for (key, declaration) in &description.api_declarations {
        let json = serde_json::to_string_pretty(declaration)
            .with_context(|| format!("Failed to serialize API declaration for {}", key))?;
        writeln!(
            out,
            "    ({}, {}),",
            raw_string_literal(key),
            raw_string_literal(&json)
        )?;
    }
    writeln!(out, "];")?;
    writeln!(out)?;
    writeln!(
        out,
        "/// JSON declaration of `resource`, if it was generated."
    )?;
    writeln!(
        out,
        "pub fn api_description(resource: &str) -> Option<&'static str> {{"
    )?;
    writeln!(out, "    API_DESCRIPTIONS")?;
    writeln!(out, "        .iter()")?;
    writeln!(out, "        .find(|(key, _)| *key == resource)")?;
    writeln!(out, "        .map(|(_, json)| *json)")?;
    writeln!(out, "}}")?;
    Ok(out)
}

/// Wrap `text` in a raw string literal whose fence is longer than any `"#...`
/// run inside it.
pub fn raw_string_literal(text: &str) -> String {
    let mut longest = 0;
    let mut run: Option<usize> = None;
    for c in text.chars() {
        run = match (c, run) {
            ('"', _) => Some(0),
            ('#', Some(n)) => {
                longest = longest.max(n + 1);
                Some(n + 1)
            }
            _ => None,
        };
    }
    let fence = "#".repeat(longest + 1);
    format!("r{fence}\"{text}\"{fence}")
}

/// Serialize the description as one pretty-printed JSON bundle.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_json(description: &ApiDescription) -> Result<String> {
    debug!("Serializing API description to JSON");
    serde_json::to_string_pretty(description).context("Failed to serialize API description to JSON")
}

/// Serialize the description as one YAML bundle.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_yaml(description: &ApiDescription) -> Result<String> {
    debug!("Serializing API description to YAML");
    serde_yaml::to_string(description).context("Failed to serialize API description to YAML")
}

/// Write `content` to `path`, creating parent directories.
///
/// The content goes to a temporary sibling first and is renamed into place,
/// so `path` never holds a truncated artifact.
///
/// # Errors
///
/// Returns an error if a directory cannot be created or either the write or
/// the rename fails.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }

    let temp_path = temp_sibling(path);
    fs::write(&temp_path, content)
        .with_context(|| format!("Failed to write to file: {}", temp_path.display()))?;
    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e).with_context(|| format!("Failed to write to file: {}", path.display()));
    }

    debug!("Successfully wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::general::ApiInfo;
    use crate::api_builder::ApiDescriptionBuilder;
    use crate::model::Operation;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn create_test_description() -> ApiDescription {
        let info = ApiInfo {
            api_version: Some("1.0.0".to_string()),
            title: Some("Test API".to_string()),
            ..Default::default()
        };
        let mut builder = ApiDescriptionBuilder::new(info);
        for path in ["/store/order", "/pets", "/pets/{id}"] {
            builder
                .add_operation(Operation {
                    path: path.to_string(),
                    nickname: "op".to_string(),
                    ..Default::default()
                })
                .unwrap();
        }
        builder.build()
    }

    #[test]
    fn test_raw_string_literal_fences() {
        assert_eq!(raw_string_literal("plain"), "r#\"plain\"#");
        assert_eq!(raw_string_literal(r#"{"a":"b"}"#), "r#\"{\"a\":\"b\"}\"#");
        assert_eq!(
            raw_string_literal(r##"{"notes":"#tag"}"##),
            "r##\"{\"notes\":\"#tag\"}\"##"
        );
        assert_eq!(raw_string_literal("x\"###"), "r####\"x\"###\"####");
        // '#' not preceded by a quote cannot close the literal
        assert_eq!(raw_string_literal("a ## b"), "r#\"a ## b\"#");
    }

    #[test]
    fn test_render_module_constants() {
        let description = create_test_description();
        let module = render_module(&description).unwrap();

        assert!(module.contains("pub const RESOURCE_LISTING: &str = r#\""));
        assert!(module.contains("pub const API_DESCRIPTIONS: &[(&str, &str)] = &["));
        assert!(module.contains("pub fn api_description(resource: &str) -> Option<&'static str>"));

        let listing = serde_json::to_string_pretty(&description.resource_listing).unwrap();
        assert!(module.contains(&listing));
        for declaration in description.api_declarations.values() {
            let json = serde_json::to_string_pretty(declaration).unwrap();
            assert!(module.contains(&json));
            let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed["swaggerVersion"], "1.2");
        }
    }

    #[test]
    fn test_render_module_sorted_entries() {
        let module = render_module(&create_test_description()).unwrap();
        let pets = module.find("(r#\"pets\"#,").unwrap();
        let store = module.find("(r#\"store\"#,").unwrap();
        assert!(pets < store);
    }

    #[test]
    fn test_render_module_survives_quote_hash() {
        let mut builder = ApiDescriptionBuilder::new(ApiInfo::default());
        builder
            .add_operation(Operation {
                path: "/tags".to_string(),
                summary: "match \"#tag\" literally".to_string(),
                ..Default::default()
            })
            .unwrap();
        let module = render_module(&builder.build()).unwrap();
        assert!(module.contains("r##\"{"));
        assert!(module.contains("}\"##),"));
    }

    #[test]
    fn test_serialize_json_bundle() {
        let description = create_test_description();
        let json = serialize_json(&description).unwrap();

        assert!(json.contains('\n'));
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["resourceListing"]["swaggerVersion"], "1.2");
        assert_eq!(parsed["resourceListing"]["info"]["title"], "Test API");
        assert_eq!(parsed["apiDeclarations"]["pets"]["resourcePath"], "/pets");
        assert_eq!(
            parsed["apiDeclarations"]["store"]["apis"][0]["path"],
            "/store/order"
        );
    }

    #[test]
    fn test_serialize_yaml_bundle() {
        let yaml = serialize_yaml(&create_test_description()).unwrap();
        assert!(yaml.contains("resourceListing:"));
        assert!(yaml.contains("apiDeclarations:"));

        let parsed: ApiDescription = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, create_test_description());
    }

    #[test]
    fn test_write_to_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("docs.rs");

        write_to_file("test content", &file_path).unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "test content");
        assert!(!temp_dir.path().join(".docs.rs.tmp").exists());
    }

    #[test]
    fn test_write_to_file_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("subdir").join("nested").join("docs.rs");

        write_to_file("test content", &file_path).unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "test content");
    }

    #[test]
    fn test_write_to_file_overwrites_existing() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("docs.rs");

        write_to_file("initial content", &file_path).unwrap();
        write_to_file("new content", &file_path).unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "new content");
    }

    #[test]
    fn test_write_to_directory_path_fails() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("taken");
        fs::create_dir_all(dir.join("inner")).unwrap();

        assert!(write_to_file("content", &dir).is_err());
        assert!(!temp_dir.path().join(".taken.tmp").exists());
    }
}
