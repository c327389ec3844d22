//! Command-line interface and the main generation workflow.

use crate::annotation::general::ApiInfo;
use crate::generator::{generate, GenerateOptions};
use crate::model_resolver::ResolverConfig;
use crate::serializer::{render_module, serialize_json, serialize_yaml, write_to_file};
use crate::source::{AnyFunction, HandlerPredicate, ReceiverContains, SourceTree};
use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, ValueEnum};
use log::{debug, info};
use std::path::PathBuf;

/// Command-line arguments for the Swagger 1.2 generator.
#[derive(Parser, Debug)]
#[command(name = "swagger-from-comments")]
#[command(author, version, about = "Generate Swagger 1.2 documents from handler comments", long_about = None)]
pub struct CliArgs {
    /// Directory containing the annotated handlers
    #[arg(long = "api-package", value_name = "DIR")]
    pub api_package: Option<PathBuf>,

    /// File carrying the general API information (@APIVersion, @APITitle, ...)
    #[arg(long = "main-api-file", value_name = "FILE")]
    pub main_api_file: Option<PathBuf>,

    /// Base path of the API; overrides @BasePath
    #[arg(long = "base-path", value_name = "URL")]
    pub base_path: Option<String>,

    /// Output file
    #[arg(short = 'o', long = "output", value_name = "FILE", default_value = "docs.rs")]
    pub output_path: PathBuf,

    /// Output format
    #[arg(short = 'f', long = "format", value_enum, default_value = "rust")]
    pub output_format: OutputFormat,

    /// Treat an external type as a primitive, e.g. `Uuid=string`
    #[arg(long = "alias", value_name = "TYPE=PRIMITIVE", value_parser = parse_alias)]
    pub aliases: Vec<(String, String)>,

    /// Only document methods whose impl type name contains this text
    #[arg(long = "receiver", value_name = "SUBSTR")]
    pub receiver: Option<String>,

    /// Enable verbose logging
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Rust module with the documents as string constants
    Rust,
    Json,
    Yaml,
}

/// External types documented as primitives unless overridden.
const DEFAULT_ALIASES: &[(&str, &str)] = &[
    ("Uuid", "string"),
    ("NaiveDate", "date"),
    ("NaiveDateTime", "dateTime"),
    ("DateTime", "dateTime"),
    ("Decimal", "double"),
    ("PathBuf", "string"),
];

fn parse_alias(s: &str) -> Result<(String, String), String> {
    let (type_name, primitive) = s
        .split_once('=')
        .ok_or_else(|| format!("expected TYPE=PRIMITIVE, got `{}`", s))?;
    let (type_name, primitive) = (type_name.trim(), primitive.trim());
    if type_name.is_empty() || primitive.is_empty() {
        return Err(format!("expected TYPE=PRIMITIVE, got `{}`", s));
    }
    Ok((type_name.to_string(), primitive.to_string()))
}

impl CliArgs {
    /// Resolver configuration: the default aliases plus any given on the
    /// command line, which win on conflict.
    pub fn resolver_config(&self) -> ResolverConfig {
        let defaults = DEFAULT_ALIASES
            .iter()
            .map(|(t, p)| (t.to_string(), p.to_string()));
        defaults
            .chain(self.aliases.iter().cloned())
            .fold(ResolverConfig::new(), |config, (type_name, primitive)| {
                config.with_alias(type_name, primitive)
            })
    }

    fn predicate(&self) -> Box<dyn HandlerPredicate> {
        match &self.receiver {
            Some(receiver) => Box::new(ReceiverContains(receiver.clone())),
            None => Box::new(AnyFunction),
        }
    }
}

/// Run the generator.
///
/// Prints usage and returns successfully when `--api-package` or
/// `--main-api-file` is missing. Nothing is written unless the whole pass
/// succeeds.
///
/// # Errors
///
/// Returns an error if the sources cannot be read, an annotation is invalid,
/// or the output cannot be written.
pub fn run(args: CliArgs) -> Result<()> {
    debug!("Parsed arguments: {:?}", args);

    let (api_package, main_api_file) = match (&args.api_package, &args.main_api_file) {
        (Some(package), Some(main)) => (package.clone(), main.clone()),
        _ => {
            CliArgs::command()
                .print_help()
                .context("Failed to print usage")?;
            println!();
            return Ok(());
        }
    };

    if !api_package.is_dir() {
        anyhow::bail!(
            "API package is not a directory: {}",
            api_package.display()
        );
    }

    info!("API package: {}", api_package.display());
    info!("Main API file: {}", main_api_file.display());
    info!("Output: {} ({:?})", args.output_path.display(), args.output_format);

    let info_tags = ApiInfo::from_file(&main_api_file)?;

    info!("Scanning sources...");
    let tree = SourceTree::load(&api_package)?;
    info!("Parsed {} Rust files", tree.files().len());

    let predicate = args.predicate();
    let generation = generate(
        &tree,
        GenerateOptions {
            info: info_tags,
            base_path: args.base_path.clone(),
            resolver: args.resolver_config(),
            predicate: predicate.as_ref(),
        },
    )?;

    let content = match args.output_format {
        OutputFormat::Rust => render_module(&generation.description)?,
        OutputFormat::Json => serialize_json(&generation.description)?,
        OutputFormat::Yaml => serialize_yaml(&generation.description)?,
    };

    write_to_file(&content, &args.output_path)?;
    info!(
        "Wrote {} resources to {}",
        generation.description.api_declarations.len(),
        args.output_path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let args = CliArgs::try_parse_from(["swagger-from-comments"]).unwrap();
        assert_eq!(args.api_package, None);
        assert_eq!(args.output_path, PathBuf::from("docs.rs"));
        assert_eq!(args.output_format, OutputFormat::Rust);
        assert!(args.aliases.is_empty());
        assert!(!args.verbose);
    }

    #[test]
    fn test_full_arguments() {
        let args = CliArgs::try_parse_from([
            "swagger-from-comments",
            "--api-package",
            "src/handlers",
            "--main-api-file",
            "src/main.rs",
            "--base-path",
            "http://api.example.com",
            "-o",
            "out/docs.json",
            "-f",
            "json",
            "--alias",
            "Money=double",
            "--alias",
            "Uuid = integer",
            "--receiver",
            "Controller",
            "-v",
        ])
        .unwrap();

        assert_eq!(args.api_package, Some(PathBuf::from("src/handlers")));
        assert_eq!(args.main_api_file, Some(PathBuf::from("src/main.rs")));
        assert_eq!(args.base_path.as_deref(), Some("http://api.example.com"));
        assert_eq!(args.output_format, OutputFormat::Json);
        assert_eq!(
            args.aliases,
            vec![
                ("Money".to_string(), "double".to_string()),
                ("Uuid".to_string(), "integer".to_string()),
            ]
        );
        assert_eq!(args.receiver.as_deref(), Some("Controller"));
        assert!(args.verbose);
    }

    #[test]
    fn test_invalid_alias() {
        assert!(CliArgs::try_parse_from(["swagger-from-comments", "--alias", "Uuid"]).is_err());
        assert!(CliArgs::try_parse_from(["swagger-from-comments", "--alias", "=string"]).is_err());
    }

    #[test]
    fn test_resolver_config_merges_aliases() {
        let args =
            CliArgs::try_parse_from(["swagger-from-comments", "--alias", "Uuid=integer"]).unwrap();
        let config = args.resolver_config();
        assert_eq!(config.alias("Uuid"), Some("integer"));
        assert_eq!(config.alias("NaiveDate"), Some("date"));
        assert_eq!(config.alias("Pet"), None);
        assert_eq!(config.aliases().count(), DEFAULT_ALIASES.len());
        assert!(config.aliases().any(|alias| alias == ("Uuid", "integer")));
    }

    #[test]
    fn test_missing_inputs_is_not_an_error() {
        let args = CliArgs::try_parse_from(["swagger-from-comments", "--api-package", "src"]).unwrap();
        assert!(run(args).is_ok());
    }
}
