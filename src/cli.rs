use anyhow::Result;
use clap::{Parser, ValueEnum};
use log::{debug, info};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::input::{Input, ParseConfig};
use crate::lang;
use crate::message::{Message, MessageHandler, MessageKey, MessageKind};
use crate::scheduler;
use crate::serializer::{serialize_json, serialize_yaml, write_to_file};

/// Generate OpenAPI documentation from @api comments in source code
#[derive(Parser, Debug)]
#[command(name = "openapi-from-comments")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to the source directory to scan
    #[arg(value_name = "DIR", required_unless_present = "list_languages")]
    pub dir: Option<PathBuf>,

    /// Source language of the directory (see --list-languages)
    #[arg(short = 'l', long = "lang", required_unless_present = "list_languages")]
    pub lang: Option<String>,

    /// Walk subdirectories
    #[arg(short = 'r', long = "recursive")]
    pub recursive: bool,

    /// Extension filter; may be given multiple times. Defaults to the
    /// language's extensions
    #[arg(short = 'e', long = "ext", value_name = "EXT")]
    pub exts: Vec<String>,

    /// IANA charset of the source files (default UTF-8)
    #[arg(long = "encoding", value_name = "CHARSET")]
    pub encoding: Option<String>,

    /// Output format (yaml or json)
    #[arg(short = 'f', long = "format", value_enum, default_value = "yaml")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// List supported languages and exit
    #[arg(long = "list-languages")]
    pub list_languages: bool,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// YAML format
    Yaml,
    /// JSON format
    Json,
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("parsed arguments: {:?}", args);

    if args.list_languages {
        return Ok(args);
    }

    let dir = match args.dir.as_ref() {
        Some(dir) => dir,
        None => anyhow::bail!("a source directory is required"),
    };
    if !dir.exists() {
        anyhow::bail!("source path does not exist: {}", dir.display());
    }
    if !dir.is_dir() {
        anyhow::bail!("source path is not a directory: {}", dir.display());
    }

    info!("source path: {}", dir.display());
    info!("output format: {:?}", args.output_format);
    if let Some(ref output) = args.output_path {
        info!("output file: {}", output.display());
    } else {
        info!("output: stdout");
    }

    Ok(args)
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    if args.list_languages {
        print_languages();
        return Ok(());
    }

    let (dir, language) = match (args.dir.clone(), args.lang.clone()) {
        (Some(dir), Some(lang)) => (dir, lang),
        _ => anyhow::bail!("a source directory and --lang are required"),
    };

    let mut input = Input::new(language, dir);
    input.recursive = args.recursive;
    input.exts = args.exts.clone();
    input.encoding = args.encoding.clone();

    let mut config = ParseConfig {
        inputs: vec![input],
    };
    config.sanitize()?;

    info!("extracting API documentation...");

    let error_count = Arc::new(AtomicUsize::new(0));
    let errors = Arc::clone(&error_count);
    let handler = MessageHandler::new(move |msg: &Message| {
        if msg.kind == MessageKind::Error {
            errors.fetch_add(1, Ordering::Relaxed);
        }
        print_message(msg);
    });

    let document = scheduler::run(&config, &handler)?;
    handler.success(
        MessageKey::Complete,
        vec![format!("{} path(s)", document.paths.len())],
    );
    handler.stop();

    info!("document built: {} path(s)", document.paths.len());

    let content = match args.output_format {
        OutputFormat::Yaml => serialize_yaml(&document)?,
        OutputFormat::Json => serialize_json(&document)?,
    };

    if let Some(output_path) = &args.output_path {
        write_to_file(&content, output_path)?;
        info!("wrote {}", output_path.display());
    } else {
        println!("{}", content);
    }

    let failures = error_count.load(Ordering::Relaxed);
    if failures > 0 {
        anyhow::bail!("{} error(s) during extraction", failures);
    }
    Ok(())
}

/// Route one diagnostic to the console: errors and warnings to stderr,
/// the rest to stdout.
fn print_message(msg: &Message) {
    let text = msg.key.render(&msg.args);
    let location = if msg.file.is_empty() {
        String::new()
    } else if msg.line == 0 {
        format!("{}: ", msg.file)
    } else {
        format!("{}:{}: ", msg.file, msg.line)
    };
    match msg.kind {
        MessageKind::Error => eprintln!("error: {}{}", location, text),
        MessageKind::Warning => eprintln!("warning: {}{}", location, text),
        MessageKind::Info => println!("info: {}{}", location, text),
        MessageKind::Success => println!("{}{}", location, text),
    }
}

/// Print the supported-language table, one row per language.
fn print_languages() {
    let langs = lang::languages();
    let name_width = langs.iter().map(|l| l.name.len()).max().unwrap_or(0) + 3;
    let display_width = langs
        .iter()
        .map(|l| l.display_name.len())
        .max()
        .unwrap_or(0)
        + 3;

    for l in langs {
        println!(
            "{:name_width$}{:display_width$}{}",
            l.name,
            l.display_name,
            l.exts.join(", "),
            name_width = name_width,
            display_width = display_width,
        );
    }
}
