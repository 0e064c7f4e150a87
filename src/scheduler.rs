//! Fan-out/fan-in orchestration.
//!
//! Each source file is lexed by a worker-pool task; the comment blocks
//! flow over one bounded channel to a single consumer that runs the tag
//! splitter, the API parser, and the document builder in order. Many
//! producers, one consumer: the document only ever has one writer.
//!
//! A failing file reports its diagnostic and is abandoned; the pipeline
//! always completes to drain. Callers decide from the collected messages
//! whether to keep the document.

use std::sync::mpsc;
use std::thread;

use encoding_rs::Encoding;
use log::{debug, info};
use rayon::prelude::*;

use crate::api;
use crate::error::Result;
use crate::input::ParseConfig;
use crate::lang::{extract_blocks, Language};
use crate::message::MessageHandler;
use crate::openapi::{DocBuilder, Document};
use crate::source::{RawBlock, Uri};
use crate::tag::{split_block, TagStream};

/// Upper bound on comment blocks in flight between lexers and the
/// consumer.
const BLOCK_CHANNEL_CAP: usize = 64;

struct Job {
    uri: Uri,
    language: &'static Language,
    charset: &'static Encoding,
}

/// Run the pipeline over a sanitized configuration, reporting every
/// diagnostic through `handler`, and return the assembled document.
pub fn run(config: &ParseConfig, handler: &MessageHandler) -> Result<Document> {
    let mut jobs = Vec::new();
    for input in &config.inputs {
        let language = match input.language() {
            Some(language) => language,
            // sanitize() already rejected unknown languages
            None => continue,
        };
        for uri in input.files() {
            jobs.push(Job {
                uri,
                language,
                charset: input.charset(),
            });
        }
    }
    info!("scheduling {} file(s)", jobs.len());

    let builder = DocBuilder::new();
    let builder_ref = &builder;
    let (tx, rx) = mpsc::sync_channel::<RawBlock>(BLOCK_CHANNEL_CAP);

    thread::scope(|scope| {
        // The receiver moves into the consumer task; the builder is only
        // ever touched from there.
        let consumer = scope.spawn(move || {
            for block in rx.iter() {
                consume(block, builder_ref, handler);
            }
        });

        jobs.par_iter().for_each_with(tx.clone(), |tx, job| {
            produce(job, tx, handler);
        });
        drop(tx);

        if consumer.join().is_err() {
            debug!("consumer task panicked");
        }
    });

    if let Err(err) = builder.check_refs() {
        handler.error(err);
    }
    Ok(builder.finish())
}

/// Producer side: read and decode one file, lex it, push its blocks.
fn produce(job: &Job, tx: &mpsc::SyncSender<RawBlock>, handler: &MessageHandler) {
    let text = match job.uri.read(job.charset) {
        Ok(text) => text,
        Err(err) => {
            handler.error(err);
            return;
        }
    };

    for block in extract_blocks(&job.uri, &text, job.language, handler) {
        // The consumer only disappears if the pipeline is tearing down.
        if tx.send(block).is_err() {
            return;
        }
    }
}

/// Consumer side: split tags, parse the endpoint, hand it to the builder.
fn consume(block: RawBlock, builder: &DocBuilder, handler: &MessageHandler) {
    let tags = split_block(&block);
    if tags.is_empty() {
        return;
    }

    let mut stream = TagStream::new(tags);
    match api::parse(&mut stream, handler) {
        Ok(Some(api)) => {
            debug!("{}: {} {}", block.file, api.method.as_str(), api.path);
            if let Err(err) = builder.add(api) {
                handler.error(err);
            }
        }
        Ok(None) => {}
        Err(err) => handler.error(err),
    }
}
