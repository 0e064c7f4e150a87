//! Endpoint assembly from tag streams.
//!
//! A comment block is parsed into at most one [`Api`]. The grammar is a
//! two-level recursive descent: top-level tags describe the endpoint,
//! `@apiRequest` / `@apiResponse` open subtrees whose tags describe one
//! body. An unknown tag inside a subtree is not an error; it closes the
//! subtree and is handed back to the outer level through the stream's
//! one-token lookahead.

use std::collections::HashMap;
use std::sync::LazyLock;

use log::debug;
use regex::Regex;

use crate::error::{Error, Result};
use crate::message::{MessageHandler, MessageKey};
use crate::openapi::{Header, HttpMethod, MediaType, Operation, Parameter, RequestBody, Response};
use crate::schema::{self, Schema};
use crate::source::Uri;
use crate::tag::{split_args, Tag, TagStream};

/// SemVer 2.0.0: MAJOR.MINOR.PATCH with optional pre-release and build.
static SEMVER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(0|[1-9]\d*)\.(0|[1-9]\d*)\.(0|[1-9]\d*)(?:-(?:0|[1-9]\d*|\d*[A-Za-z-][0-9A-Za-z-]*)(?:\.(?:0|[1-9]\d*|\d*[A-Za-z-][0-9A-Za-z-]*))*)?(?:\+[0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*)?$",
    )
    .unwrap()
});

/// An endpoint under construction, produced by [`parse`] and consumed by
/// the document builder.
#[derive(Debug, Clone)]
pub struct Api {
    pub method: HttpMethod,
    /// URL template with `{name}` holes
    pub path: String,
    pub summary: String,
    pub group: Option<String>,
    pub tags: Vec<String>,
    pub version: Option<String>,
    pub deprecated: bool,
    pub parameters: Vec<Parameter>,
    pub request: Option<RequestBody>,
    /// Keyed by HTTP status; `"default"` allowed
    pub responses: HashMap<String, Response>,
    /// Location of the `@api` tag, for diagnostics
    pub file: Uri,
    pub line: usize,
}

impl Api {
    fn new(method: HttpMethod, path: &str, summary: &str, opener: &Tag) -> Self {
        Api {
            method,
            path: path.to_string(),
            summary: summary.to_string(),
            group: None,
            tags: Vec::new(),
            version: None,
            deprecated: false,
            parameters: Vec::new(),
            request: None,
            responses: HashMap::new(),
            file: opener.file.clone(),
            line: opener.line,
        }
    }

    /// Convert into the OpenAPI operation installed under a path item.
    /// The group becomes the leading operation tag.
    pub fn into_operation(self) -> Operation {
        let mut tags = Vec::new();
        if let Some(group) = self.group {
            tags.push(group);
        }
        for tag in self.tags {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }

        Operation {
            summary: Some(self.summary),
            tags: if tags.is_empty() { None } else { Some(tags) },
            deprecated: self.deprecated,
            version: self.version,
            parameters: if self.parameters.is_empty() {
                None
            } else {
                Some(self.parameters)
            },
            request_body: self.request,
            responses: self.responses,
        }
    }
}

fn tag_error(tag: &Tag, key: MessageKey, args: Vec<String>) -> Error {
    Error::syntax(tag.file.to_string(), tag.line, key, args)
}

fn not_enough(tag: &Tag) -> Error {
    tag_error(tag, MessageKey::ErrTagArgNotEnough, vec![tag.name.clone()])
}

fn duplicate(tag: &Tag) -> Error {
    tag_error(tag, MessageKey::ErrDuplicateTag, vec![tag.name.clone()])
}

/// Parse one block's tag stream into an endpoint.
///
/// A block whose first tag is not `@api` carries no endpoint and yields
/// `None` without a diagnostic; plain prose never reaches this far.
pub fn parse(stream: &mut TagStream, handler: &MessageHandler) -> Result<Option<Api>> {
    let opener = match stream.next() {
        Some(tag) => tag,
        None => return Ok(None),
    };
    if opener.name != "@api" {
        debug!("{}:{}: block without @api skipped", opener.file, opener.line);
        return Ok(None);
    }

    let args = split_args(&opener.data, 3);
    if args.len() != 3 {
        return Err(not_enough(&opener));
    }
    let method = HttpMethod::parse(args[0]).ok_or_else(|| {
        tag_error(
            &opener,
            MessageKey::ErrInvalidValue,
            vec![opener.name.clone(), args[0].to_string()],
        )
    })?;
    let mut api = Api::new(method, args[1], args[2], &opener);
    let mut seen_tags = false;

    while let Some(tag) = stream.next() {
        match tag.name.as_str() {
            "@api" => return Err(duplicate(&tag)),
            "@apigroup" => {
                if api.group.is_some() {
                    return Err(duplicate(&tag));
                }
                if tag.data.is_empty() {
                    return Err(not_enough(&tag));
                }
                api.group = Some(tag.data.clone());
            }
            "@apitags" => {
                if seen_tags {
                    return Err(duplicate(&tag));
                }
                seen_tags = true;
                api.tags = tag
                    .data
                    .split(',')
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect();
                if api.tags.is_empty() {
                    return Err(not_enough(&tag));
                }
            }
            "@apiversion" => {
                if api.version.is_some() {
                    return Err(duplicate(&tag));
                }
                if !SEMVER.is_match(&tag.data) {
                    return Err(tag_error(
                        &tag,
                        MessageKey::ErrInvalidFormat,
                        vec![tag.name.clone()],
                    ));
                }
                api.version = Some(tag.data.clone());
            }
            "@apideprecated" => {
                if api.deprecated {
                    return Err(duplicate(&tag));
                }
                api.deprecated = true;
                handler.warning(
                    tag.file.to_string(),
                    tag.line,
                    MessageKey::WarnDeprecated,
                    vec![api.path.clone()],
                );
            }
            "@apiquery" => api.parameters.push(parse_parameter(&tag, "query", false)?),
            "@apiparam" => api.parameters.push(parse_parameter(&tag, "path", true)?),
            "@apiheader" => {
                let args = split_args(&tag.data, 2);
                if args.len() != 2 {
                    return Err(not_enough(&tag));
                }
                api.parameters.push(Parameter {
                    name: args[0].to_string(),
                    location: "header".to_string(),
                    required: false,
                    schema: Schema::of_type("string"),
                    description: Some(args[1].to_string()),
                });
            }
            "@apirequest" => parse_request(stream, &tag, &mut api)?,
            "@apiresponse" => parse_response(stream, &tag, &mut api)?,
            _ => {
                return Err(tag_error(
                    &tag,
                    MessageKey::ErrInvalidTag,
                    vec![tag.name.clone()],
                ))
            }
        }
    }

    Ok(Some(api))
}

/// Top-level `@apiQuery` / `@apiParam`: `NAME TYPE DEFAULT DESC`.
fn parse_parameter(tag: &Tag, location: &str, required: bool) -> Result<Parameter> {
    let args = split_args(&tag.data, 4);
    if args.len() != 4 {
        return Err(not_enough(tag));
    }

    let mut schema = Schema::from_type_arg(tag, args[1])?;
    schema.default = Some(args[2].to_string());
    let (description, enum_values) = schema::split_enum(args[3]);
    schema.enum_values = enum_values;

    Ok(Parameter {
        name: args[0].to_string(),
        location: location.to_string(),
        required,
        schema,
        description: Some(description),
    })
}

/// `@apiRequest MIMETYPE TYPE` plus its subtree.
fn parse_request(stream: &mut TagStream, tag: &Tag, api: &mut Api) -> Result<()> {
    let args = split_args(&tag.data, 2);
    if args.len() != 2 {
        return Err(tag_error(
            tag,
            MessageKey::ErrInvalidFormat,
            vec![tag.name.clone()],
        ));
    }
    let mime = args[0].to_string();
    let mut schema = Schema::from_type_arg(tag, args[1])?;

    let mut headers = HashMap::new();
    let mut examples = HashMap::new();
    parse_media_tags(stream, &mut schema, &mut headers, &mut examples)?;

    let request = api.request.get_or_insert_with(RequestBody::default);
    if request.content.contains_key(&mime) {
        return Err(duplicate(tag));
    }
    request.content.insert(
        mime.clone(),
        MediaType {
            schema,
            example: take_example(&mut examples, &mime),
        },
    );
    Ok(())
}

/// `@apiResponse STATUS MIMETYPE TYPE` plus its subtree.
fn parse_response(stream: &mut TagStream, tag: &Tag, api: &mut Api) -> Result<()> {
    let args = split_args(&tag.data, 3);
    if args.len() != 3 {
        return Err(tag_error(
            tag,
            MessageKey::ErrInvalidFormat,
            vec![tag.name.clone()],
        ));
    }
    let status = args[0];
    let valid_status = status == "default"
        || (status.len() == 3 && status.bytes().all(|b| b.is_ascii_digit()));
    if !valid_status {
        return Err(tag_error(
            tag,
            MessageKey::ErrInvalidValue,
            vec![tag.name.clone(), status.to_string()],
        ));
    }
    let mime = args[1].to_string();
    let mut schema = Schema::from_type_arg(tag, args[2])?;

    let mut headers = HashMap::new();
    let mut examples = HashMap::new();
    parse_media_tags(stream, &mut schema, &mut headers, &mut examples)?;

    let response = api.responses.entry(status.to_string()).or_default();
    let content = response.content.get_or_insert_with(HashMap::new);
    if content.contains_key(&mime) {
        return Err(duplicate(tag));
    }
    content.insert(
        mime.clone(),
        MediaType {
            schema,
            example: take_example(&mut examples, &mime),
        },
    );
    if !headers.is_empty() {
        response
            .headers
            .get_or_insert_with(HashMap::new)
            .extend(headers);
    }
    Ok(())
}

/// The shared body subtree: `@apiParam`, `@apiHeader` and `@apiExample`
/// until a tag that belongs to the outer level, which is pushed back.
fn parse_media_tags(
    stream: &mut TagStream,
    schema: &mut Schema,
    headers: &mut HashMap<String, Header>,
    examples: &mut HashMap<String, String>,
) -> Result<()> {
    while let Some(tag) = stream.next() {
        match tag.name.as_str() {
            "@apiparam" => {
                let args = split_args(&tag.data, 4);
                if args.len() != 4 {
                    return Err(not_enough(&tag));
                }
                let mut property = Schema::from_type_arg(&tag, args[1])?;
                let required = match args[2].to_ascii_lowercase().as_str() {
                    "required" | "must" => true,
                    "optional" => false,
                    other => {
                        return Err(tag_error(
                            &tag,
                            MessageKey::ErrInvalidValue,
                            vec![tag.name.clone(), other.to_string()],
                        ))
                    }
                };
                let (description, enum_values) = schema::split_enum(args[3]);
                property.description = Some(description);
                property.enum_values = enum_values;
                schema.set_property(&tag, args[0], property, required)?;
            }
            "@apiheader" => {
                let args = split_args(&tag.data, 2);
                if args.len() != 2 {
                    return Err(not_enough(&tag));
                }
                headers.insert(
                    args[0].to_string(),
                    Header {
                        description: Some(args[1].to_string()),
                        schema: Schema::of_type("string"),
                    },
                );
            }
            "@apiexample" => {
                let args = split_args(&tag.data, 2);
                if args.len() != 2 {
                    return Err(not_enough(&tag));
                }
                let mime = args[0].to_string();
                if examples.contains_key(&mime) {
                    return Err(duplicate(&tag));
                }
                examples.insert(mime, args[1].to_string());
            }
            _ => {
                stream.push_back(tag);
                break;
            }
        }
    }
    Ok(())
}

/// Pick the example for a media type: an exact mime match, or the only
/// example given.
fn take_example(examples: &mut HashMap<String, String>, mime: &str) -> Option<String> {
    if let Some(example) = examples.remove(mime) {
        return Some(example);
    }
    if examples.len() == 1 {
        let key = examples.keys().next().cloned();
        return key.and_then(|k| examples.remove(&k));
    }
    None
}
