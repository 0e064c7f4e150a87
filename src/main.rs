//! openapi-from-comments - Command-line OpenAPI documentation extractor.
//!
//! Scans a source tree for `@api` doc comments and writes an OpenAPI 3.0
//! document.
//!
//! # Usage
//!
//! ```bash
//! openapi-from-comments [OPTIONS] --lang <LANG> <DIR>
//! ```
//!
//! # Examples
//!
//! Generate YAML documentation for a Go service:
//! ```bash
//! openapi-from-comments ./my-service --lang go -r -o openapi.yaml
//! ```
//!
//! Generate JSON instead:
//! ```bash
//! openapi-from-comments ./my-service --lang go -f json -o openapi.json
//! ```
//!
//! List the supported languages:
//! ```bash
//! openapi-from-comments --list-languages
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;

use openapi_from_comments::cli;

fn main() -> Result<()> {
    // Parse args first so the verbose flag can pick the log level.
    let args = cli::CliArgs::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    let args = cli::parse_args_from_parsed(args)?;
    cli::run(args)?;

    info!("done");
    Ok(())
}
