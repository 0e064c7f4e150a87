//! openapi-from-comments - OpenAPI documentation from source comments.
//!
//! This library extracts `@api` doc comments from source trees in many
//! programming languages and assembles them into an OpenAPI 3.0 document.
//! Extraction is language-aware: strings, raw strings and here-documents
//! are recognized so comment markers inside them are never misread.
//!
//! # Architecture
//!
//! The pipeline is organized into modules that work together:
//!
//! 1. [`input`] - Validates the configuration and discovers source files
//! 2. [`source`] - Reads files and decodes them with a named charset
//! 3. [`lang`] - Per-language block recognizers and the comment lexer
//! 4. [`tag`] - Splits comment blocks into `@tag` tokens
//! 5. [`api`] - Parses tag streams into endpoint descriptions
//! 6. [`openapi`] - The document model and the single-writer builder
//! 7. [`scheduler`] - Fans files out to workers and serializes building
//! 8. [`message`] - Routes diagnostics to a consumer in order
//! 9. [`serializer`] - Writes the finished document as YAML or JSON
//!
//! # Example Usage
//!
//! ```no_run
//! use openapi_from_comments::input::{Input, ParseConfig};
//!
//! let mut input = Input::new("go", "./my-service");
//! input.recursive = true;
//!
//! let config = ParseConfig { inputs: vec![input] };
//! let (document, messages) = openapi_from_comments::parse(config).unwrap();
//!
//! for message in &messages {
//!     eprintln!("{}:{}: {}", message.file, message.line, message.key.render(&message.args));
//! }
//! let yaml = openapi_from_comments::serializer::serialize_yaml(&document).unwrap();
//! println!("{}", yaml);
//! ```

pub mod api;
pub mod cli;
pub mod error;
pub mod input;
pub mod lang;
pub mod message;
pub mod openapi;
pub mod scheduler;
pub mod schema;
pub mod serializer;
pub mod source;
pub mod tag;

use std::sync::{Arc, Mutex, PoisonError};

use crate::error::Result;
use crate::input::ParseConfig;
use crate::message::{Message, MessageHandler};
use crate::openapi::Document;

/// Run the whole pipeline over `config` and collect every diagnostic.
///
/// The pipeline never aborts on a per-file or per-block error; it always
/// completes to drain. Inspect the returned messages for Error-kind
/// entries to decide whether to keep the document.
pub fn parse(mut config: ParseConfig) -> Result<(Document, Vec<Message>)> {
    config.sanitize()?;

    let collected = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&collected);
    let handler = MessageHandler::new(move |msg: &Message| {
        sink.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(msg.clone());
    });

    let document = scheduler::run(&config, &handler)?;
    handler.stop();

    let messages = collected
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    Ok((document, messages))
}
