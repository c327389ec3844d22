//! swagger-from-comments - generate Swagger 1.2 documents from `@`-directives
//! in handler doc comments.
//!
//! # Usage
//!
//! ```bash
//! swagger-from-comments --api-package src/handlers --main-api-file src/main.rs
//! ```
//!
//! Write a JSON bundle instead of the Rust module:
//! ```bash
//! swagger-from-comments --api-package src --main-api-file src/main.rs -f json -o docs.json
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use swagger_from_comments::cli::{self, CliArgs};

fn main() -> Result<()> {
    let args = CliArgs::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("swagger-from-comments starting...");
    cli::run(args)?;

    Ok(())
}
