//! Diagnostic message sink.
//!
//! Every stage of the pipeline reports through a [`MessageHandler`]. The
//! handler serializes delivery with an internal lock, so messages produced
//! sequentially by one task (one source file is always owned by one task)
//! arrive at the consumer in production order.

use std::sync::Mutex;

use crate::error::Error;

/// Severity of a diagnostic message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Error,
    Warning,
    Info,
    Success,
}

/// Identifier of a diagnostic, resolved to human text by the consumer.
///
/// The pipeline itself never formats these; it only attaches arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKey {
    ErrIO,
    ErrEncoding,
    ErrNotFoundEndFlag,
    ErrInvalidFormat,
    ErrInvalidTag,
    ErrInvalidValue,
    ErrDuplicateTag,
    ErrDuplicateRoute,
    ErrTagArgNotEnough,
    ErrCyclicRef,
    WarnDeprecated,
    Complete,
}

impl MessageKey {
    /// Default English rendering. This is the table a console consumer
    /// applies; library callers are free to map keys to their own text.
    pub fn render(&self, args: &[String]) -> String {
        let joined = args.join(", ");
        match self {
            MessageKey::ErrIO => format!("i/o error: {}", joined),
            MessageKey::ErrEncoding => format!("encoding error: {}", joined),
            MessageKey::ErrNotFoundEndFlag => "block terminator not found".to_string(),
            MessageKey::ErrInvalidFormat => format!("invalid format for {}", joined),
            MessageKey::ErrInvalidTag => format!("unrecognized tag {}", joined),
            MessageKey::ErrInvalidValue => format!("invalid value: {}", joined),
            MessageKey::ErrDuplicateTag => format!("duplicate tag {}", joined),
            MessageKey::ErrDuplicateRoute => format!("duplicate route: {}", joined),
            MessageKey::ErrTagArgNotEnough => format!("not enough arguments for {}", joined),
            MessageKey::ErrCyclicRef => format!("cyclic schema reference: {}", joined),
            MessageKey::WarnDeprecated => format!("endpoint is deprecated: {}", joined),
            MessageKey::Complete => format!("complete: {}", joined),
        }
    }
}

/// A single diagnostic routed through the sink.
///
/// `line` is 1-indexed (0 means "no line", e.g. file-level i/o errors).
#[derive(Debug, Clone)]
pub struct Message {
    pub kind: MessageKind,
    pub file: String,
    pub line: usize,
    pub key: MessageKey,
    pub args: Vec<String>,
}

type HandlerFunc = Box<dyn FnMut(&Message) + Send>;

/// Routes messages from any task to a single consumer callback.
///
/// The callback is serialized with an internal lock. [`stop`] closes the
/// sink; sends after `stop` are dropped silently.
///
/// [`stop`]: MessageHandler::stop
pub struct MessageHandler {
    consumer: Mutex<Option<HandlerFunc>>,
}

impl MessageHandler {
    pub fn new<F>(consumer: F) -> Self
    where
        F: FnMut(&Message) + Send + 'static,
    {
        MessageHandler {
            consumer: Mutex::new(Some(Box::new(consumer))),
        }
    }

    /// Deliver one message. Dropped silently once the sink is stopped.
    pub fn message(&self, msg: Message) {
        let mut guard = self
            .consumer
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        if let Some(consumer) = guard.as_mut() {
            consumer(&msg);
        }
    }

    /// Report a pipeline error as an Error-kind message.
    pub fn error(&self, err: Error) {
        self.message(err.into_message());
    }

    pub fn warning(&self, file: impl Into<String>, line: usize, key: MessageKey, args: Vec<String>) {
        self.message(Message {
            kind: MessageKind::Warning,
            file: file.into(),
            line: line + 1,
            key,
            args,
        });
    }

    pub fn info(&self, key: MessageKey, args: Vec<String>) {
        self.message(Message {
            kind: MessageKind::Info,
            file: String::new(),
            line: 0,
            key,
            args,
        });
    }

    pub fn success(&self, key: MessageKey, args: Vec<String>) {
        self.message(Message {
            kind: MessageKind::Success,
            file: String::new(),
            line: 0,
            key,
            args,
        });
    }

    /// Flush and close the consumer. Idempotent.
    pub fn stop(&self) {
        let mut guard = self
            .consumer
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        guard.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn collecting() -> (Arc<Mutex<Vec<Message>>>, MessageHandler) {
        let collected = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&collected);
        let handler = MessageHandler::new(move |msg: &Message| {
            sink.lock().unwrap().push(msg.clone());
        });
        (collected, handler)
    }

    #[test]
    fn test_delivery_order() {
        let (collected, handler) = collecting();

        for line in 0..5 {
            handler.warning("a.go", line, MessageKey::WarnDeprecated, vec![]);
        }

        let msgs = collected.lock().unwrap();
        let lines: Vec<usize> = msgs.iter().map(|m| m.line).collect();
        assert_eq!(lines, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_messages_after_stop_are_dropped() {
        let (collected, handler) = collecting();

        handler.info(MessageKey::Complete, vec!["one".to_string()]);
        handler.stop();
        handler.info(MessageKey::Complete, vec!["two".to_string()]);
        handler.stop();

        assert_eq!(collected.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_error_message_is_one_indexed() {
        let (collected, handler) = collecting();

        handler.error(Error::syntax(
            "x.go",
            0,
            MessageKey::ErrNotFoundEndFlag,
            vec![],
        ));

        let msgs = collected.lock().unwrap();
        assert_eq!(msgs[0].kind, MessageKind::Error);
        assert_eq!(msgs[0].line, 1);
    }
}
