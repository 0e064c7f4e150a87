//! OpenAPI document model and builder.
//!
//! The [`DocBuilder`] is the single writer of the [`Document`]: the
//! consumer task feeds it one parsed endpoint at a time, and every
//! mutation happens under its lock. Route uniqueness is enforced here:
//! the first endpoint to occupy a `(path, method)` slot wins.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

use crate::api::Api;
use crate::error::{Error, Result};
use crate::message::MessageKey;
use crate::schema::Schema;

/// HTTP methods a documented endpoint may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
    Trace,
}

impl HttpMethod {
    /// Parse an `@api` verb, any casing.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            "PUT" => Some(HttpMethod::Put),
            "DELETE" => Some(HttpMethod::Delete),
            "PATCH" => Some(HttpMethod::Patch),
            "OPTIONS" => Some(HttpMethod::Options),
            "HEAD" => Some(HttpMethod::Head),
            "TRACE" => Some(HttpMethod::Trace),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Trace => "TRACE",
        }
    }
}

/// OpenAPI Info object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Info {
    pub title: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// OpenAPI Server object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// OpenAPI Parameter object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    /// Parameter location: query, path, header or cookie
    #[serde(rename = "in")]
    pub location: String,
    pub required: bool,
    pub schema: Schema,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// OpenAPI MediaType object
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaType {
    pub schema: Schema,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

/// OpenAPI RequestBody object
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestBody {
    pub content: HashMap<String, MediaType>,
}

/// OpenAPI Header object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Header {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub schema: Schema,
}

/// OpenAPI Response object
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Response {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, Header>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<HashMap<String, MediaType>>,
}

/// OpenAPI Operation object - one documented endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub deprecated: bool,
    #[serde(rename = "x-version", skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<Parameter>>,
    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    pub responses: HashMap<String, Response>,
}

/// OpenAPI PathItem object - up to one operation per HTTP method
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<Operation>,
}

impl PathItem {
    fn slot(&mut self, method: HttpMethod) -> &mut Option<Operation> {
        match method {
            HttpMethod::Get => &mut self.get,
            HttpMethod::Post => &mut self.post,
            HttpMethod::Put => &mut self.put,
            HttpMethod::Delete => &mut self.delete,
            HttpMethod::Patch => &mut self.patch,
            HttpMethod::Options => &mut self.options,
            HttpMethod::Head => &mut self.head,
            HttpMethod::Trace => &mut self.trace,
        }
    }

    /// The operation registered for `method`, if any.
    pub fn operation(&self, method: HttpMethod) -> Option<&Operation> {
        match method {
            HttpMethod::Get => self.get.as_ref(),
            HttpMethod::Post => self.post.as_ref(),
            HttpMethod::Put => self.put.as_ref(),
            HttpMethod::Delete => self.delete.as_ref(),
            HttpMethod::Patch => self.patch.as_ref(),
            HttpMethod::Options => self.options.as_ref(),
            HttpMethod::Head => self.head.as_ref(),
            HttpMethod::Trace => self.trace.as_ref(),
        }
    }
}

/// OpenAPI Components object
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Components {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schemas: Option<HashMap<String, Schema>>,
}

/// Complete OpenAPI document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub openapi: String,
    pub info: Info,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub servers: Option<Vec<Server>>,
    pub paths: HashMap<String, PathItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,
}

impl Default for Document {
    fn default() -> Self {
        Document {
            openapi: "3.0.0".to_string(),
            info: Info {
                title: "Generated API".to_string(),
                version: "1.0.0".to_string(),
                description: Some("API documentation generated from source comments".to_string()),
            },
            servers: None,
            paths: HashMap::new(),
            components: None,
        }
    }
}

/// Accumulates parsed endpoints into a [`Document`].
pub struct DocBuilder {
    doc: Mutex<Document>,
}

impl DocBuilder {
    pub fn new() -> Self {
        DocBuilder {
            doc: Mutex::new(Document::default()),
        }
    }

    pub fn with_info(title: String, version: String, description: Option<String>) -> Self {
        let builder = DocBuilder::new();
        {
            let mut doc = builder.lock();
            doc.info = Info {
                title,
                version,
                description,
            };
        }
        builder
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Document> {
        self.doc.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Install one endpoint. Fails with `ErrDuplicateRoute` if the
    /// `(path, method)` slot is already occupied; the earlier endpoint
    /// stays in place.
    pub fn add(&self, api: Api) -> Result<()> {
        let mut doc = self.lock();
        let item = doc.paths.entry(api.path.clone()).or_default();
        let slot = item.slot(api.method);
        if slot.is_some() {
            return Err(Error::syntax(
                api.file.to_string(),
                api.line,
                MessageKey::ErrDuplicateRoute,
                vec![api.method.as_str().to_string(), api.path],
            ));
        }
        *slot = Some(api.into_operation());
        Ok(())
    }

    /// Verify that schema `$ref` chains in the components section are
    /// acyclic. Runs as a post-pass once the consumer has drained.
    pub fn check_refs(&self) -> Result<()> {
        let doc = self.lock();
        let schemas = match doc.components.as_ref().and_then(|c| c.schemas.as_ref()) {
            Some(schemas) => schemas,
            None => return Ok(()),
        };

        let mut done = HashSet::new();
        for name in schemas.keys() {
            let mut trail = Vec::new();
            visit_refs(name, schemas, &mut trail, &mut done)?;
        }
        Ok(())
    }

    /// Return the accumulated document.
    pub fn finish(self) -> Document {
        self.doc
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for DocBuilder {
    fn default() -> Self {
        DocBuilder::new()
    }
}

/// Depth-first walk of the component reference graph. A name reappearing
/// on the active trail is a cycle.
fn visit_refs(
    name: &str,
    schemas: &HashMap<String, Schema>,
    trail: &mut Vec<String>,
    done: &mut HashSet<String>,
) -> Result<()> {
    if done.contains(name) {
        return Ok(());
    }
    if trail.iter().any(|n| n == name) {
        return Err(Error::Document {
            key: MessageKey::ErrCyclicRef,
            args: vec![name.to_string()],
        });
    }
    trail.push(name.to_string());
    if let Some(schema) = schemas.get(name) {
        for reference in collect_refs(schema) {
            visit_refs(&reference, schemas, trail, done)?;
        }
    }
    trail.pop();
    done.insert(name.to_string());
    Ok(())
}

/// Component names referenced from anywhere inside `schema`.
fn collect_refs(schema: &Schema) -> Vec<String> {
    let mut refs = Vec::new();
    walk_refs(schema, &mut refs);
    refs
}

fn walk_refs(schema: &Schema, refs: &mut Vec<String>) {
    if let Some(reference) = &schema.reference {
        if let Some(name) = reference.strip_prefix("#/components/schemas/") {
            refs.push(name.to_string());
        }
    }
    if let Some(items) = &schema.items {
        walk_refs(items, refs);
    }
    if let Some(properties) = &schema.properties {
        for child in properties.values() {
            walk_refs(child, refs);
        }
    }
}
