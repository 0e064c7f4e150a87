//! OpenAPI schema model.
//!
//! Schemas are built incrementally while parsing `@apiParam` tags: a
//! dotted name like `list.id` walks (and creates) the object property
//! chain under the enclosing media type schema.

use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::message::MessageKey;
use crate::tag::Tag;

const TYPE_OBJECT: &str = "object";
const TYPE_ARRAY: &str = "array";

const SCALAR_TYPES: &[&str] = &["string", "integer", "number", "boolean"];

/// OpenAPI Schema object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// The type of the schema (string, integer, object, array, ...)
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    /// Items schema for array types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    /// Properties for object types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<HashMap<String, Schema>>,
    /// Required property names for object types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    /// Allowed values
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    /// Default value, kept verbatim from the tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Unresolved reference to another schema. Resolution is deferred to
    /// a post-pass that also detects cycles.
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl Schema {
    pub fn of_type(schema_type: &str) -> Self {
        Schema {
            schema_type: Some(schema_type.to_string()),
            ..Schema::default()
        }
    }

    /// Parse a tag's type argument: `T`, `object`, `array.T`, or
    /// `array.object`, where `T` is a scalar OpenAPI type.
    pub fn from_type_arg(tag: &Tag, arg: &str) -> Result<Self> {
        if let Some(item_type) = arg.strip_prefix("array.") {
            let mut schema = Schema::of_type(TYPE_ARRAY);
            schema.items = Some(Box::new(Schema::from_scalar_or_object(tag, item_type)?));
            return Ok(schema);
        }
        if arg == TYPE_ARRAY {
            // Bare `array` defaults its items to strings.
            let mut schema = Schema::of_type(TYPE_ARRAY);
            schema.items = Some(Box::new(Schema::of_type("string")));
            return Ok(schema);
        }
        Schema::from_scalar_or_object(tag, arg)
    }

    fn from_scalar_or_object(tag: &Tag, arg: &str) -> Result<Self> {
        if arg == TYPE_OBJECT || SCALAR_TYPES.contains(&arg) {
            Ok(Schema::of_type(arg))
        } else {
            Err(Error::syntax(
                tag.file.to_string(),
                tag.line,
                MessageKey::ErrInvalidValue,
                vec![tag.name.clone(), arg.to_string()],
            ))
        }
    }

    /// Install `schema` at the dotted `name` under `self`, creating
    /// intermediate object properties as needed. Walking descends into
    /// `items` when it meets an array.
    pub fn set_property(
        &mut self,
        tag: &Tag,
        name: &str,
        schema: Schema,
        required: bool,
    ) -> Result<()> {
        let mut node: &mut Schema = self;
        let segments: Vec<&str> = name.split('.').collect();

        for segment in &segments[..segments.len() - 1] {
            node = node.child(segment);
        }

        let last = segments[segments.len() - 1];
        if last.is_empty() {
            return Err(Error::syntax(
                tag.file.to_string(),
                tag.line,
                MessageKey::ErrInvalidFormat,
                vec![tag.name.clone()],
            ));
        }

        let node = node.enter_items();
        if required {
            let list = node.required.get_or_insert_with(Vec::new);
            if !list.contains(&last.to_string()) {
                list.push(last.to_string());
            }
        }
        match node
            .properties
            .get_or_insert_with(HashMap::new)
            .entry(last.to_string())
        {
            Entry::Occupied(mut occupied) => {
                let prior = occupied.insert(schema);
                keep_children(occupied.get_mut(), prior);
            }
            Entry::Vacant(vacant) => {
                vacant.insert(schema);
            }
        }
        Ok(())
    }

    /// Descend into the named property, creating an object placeholder if
    /// it does not exist yet.
    fn child(&mut self, segment: &str) -> &mut Schema {
        let node = self.enter_items();
        node.properties
            .get_or_insert_with(HashMap::new)
            .entry(segment.to_string())
            .or_insert_with(|| Schema::of_type(TYPE_OBJECT))
    }

    /// For arrays, property names address the element schema.
    fn enter_items(&mut self) -> &mut Schema {
        if self.schema_type.as_deref() == Some(TYPE_ARRAY) {
            self.items
                .get_or_insert_with(|| Box::new(Schema::of_type(TYPE_OBJECT)))
        } else {
            self
        }
    }
}

/// A property may be redeclared after dotted names already hung children
/// under it. The redeclaration wins on type, description and the like,
/// but must not discard those children.
fn keep_children(current: &mut Schema, prior: Schema) {
    if current.schema_type.as_deref() == Some(TYPE_ARRAY) {
        let items = current
            .items
            .get_or_insert_with(|| Box::new(Schema::of_type(TYPE_OBJECT)));
        if items.properties.is_none() {
            if let Some(prior_items) = prior.items.filter(|i| i.properties.is_some()) {
                items.properties = prior_items.properties;
                items.required = prior_items.required;
            } else if prior.properties.is_some() {
                items.properties = prior.properties;
                items.required = prior.required;
            }
        }
    } else if current.properties.is_none() {
        current.properties = prior.properties;
        if current.required.is_none() {
            current.required = prior.required;
        }
    }
}

/// Split an optional trailing enum list off a description: either
/// `{key:desc,key2:desc2}` (keys become the values) or `[v1,v2,v3]`.
pub fn split_enum(desc: &str) -> (String, Option<Vec<String>>) {
    let trimmed = desc.trim_end();

    if let Some(values) = trailing_list(trimmed, '{', '}') {
        let keys: Vec<String> = values
            .iter()
            .map(|v| v.split(':').next().unwrap_or(v).trim().to_string())
            .filter(|v| !v.is_empty())
            .collect();
        if !keys.is_empty() {
            let rest = trimmed[..trimmed.rfind('{').unwrap_or(0)].trim_end();
            return (rest.to_string(), Some(keys));
        }
    }

    if let Some(values) = trailing_list(trimmed, '[', ']') {
        let vals: Vec<String> = values
            .iter()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect();
        if !vals.is_empty() {
            let rest = trimmed[..trimmed.rfind('[').unwrap_or(0)].trim_end();
            return (rest.to_string(), Some(vals));
        }
    }

    (trimmed.to_string(), None)
}

fn trailing_list(desc: &str, open: char, close: char) -> Option<Vec<String>> {
    if !desc.ends_with(close) {
        return None;
    }
    let start = desc.rfind(open)?;
    let inner = &desc[start + open.len_utf8()..desc.len() - close.len_utf8()];
    Some(inner.split(',').map(|s| s.to_string()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Uri;

    fn tag() -> Tag {
        Tag {
            name: "@apiparam".to_string(),
            data: String::new(),
            file: Uri::new("test.go"),
            line: 0,
        }
    }

    #[test]
    fn test_type_arg_scalar() {
        let schema = Schema::from_type_arg(&tag(), "string").unwrap();
        assert_eq!(schema.schema_type.as_deref(), Some("string"));
    }

    #[test]
    fn test_type_arg_array_of_scalar() {
        let schema = Schema::from_type_arg(&tag(), "array.integer").unwrap();
        assert_eq!(schema.schema_type.as_deref(), Some("array"));
        assert_eq!(
            schema.items.unwrap().schema_type.as_deref(),
            Some("integer")
        );
    }

    #[test]
    fn test_type_arg_rejects_unknown() {
        assert!(Schema::from_type_arg(&tag(), "uuid").is_err());
        assert!(Schema::from_type_arg(&tag(), "array.uuid").is_err());
    }

    #[test]
    fn test_set_property_flat() {
        let mut root = Schema::of_type("object");
        root.set_property(&tag(), "name", Schema::of_type("string"), true)
            .unwrap();

        let props = root.properties.as_ref().unwrap();
        assert_eq!(props["name"].schema_type.as_deref(), Some("string"));
        assert_eq!(root.required.as_ref().unwrap(), &vec!["name".to_string()]);
    }

    #[test]
    fn test_set_property_nested_creates_chain() {
        let mut root = Schema::of_type("object");
        root.set_property(&tag(), "addr.city", Schema::of_type("string"), false)
            .unwrap();

        let addr = &root.properties.as_ref().unwrap()["addr"];
        assert_eq!(addr.schema_type.as_deref(), Some("object"));
        let city = &addr.properties.as_ref().unwrap()["city"];
        assert_eq!(city.schema_type.as_deref(), Some("string"));
    }

    #[test]
    fn test_set_property_descends_into_array_items() {
        let mut root = Schema::of_type("object");
        root.set_property(&tag(), "list", Schema::from_type_arg(&tag(), "array.object").unwrap(), true)
            .unwrap();
        root.set_property(&tag(), "list.id", Schema::of_type("integer"), true)
            .unwrap();

        let list = &root.properties.as_ref().unwrap()["list"];
        let items = list.items.as_ref().unwrap();
        let id = &items.properties.as_ref().unwrap()["id"];
        assert_eq!(id.schema_type.as_deref(), Some("integer"));
        assert_eq!(items.required.as_ref().unwrap(), &vec!["id".to_string()]);
    }

    #[test]
    fn test_parent_redeclared_after_child_keeps_object_children() {
        let mut root = Schema::of_type("object");
        root.set_property(&tag(), "addr.city", Schema::of_type("string"), true)
            .unwrap();
        let mut redeclared = Schema::of_type("object");
        redeclared.description = Some("the address".to_string());
        root.set_property(&tag(), "addr", redeclared, true).unwrap();

        let addr = &root.properties.as_ref().unwrap()["addr"];
        assert_eq!(addr.description.as_deref(), Some("the address"));
        let city = &addr.properties.as_ref().unwrap()["city"];
        assert_eq!(city.schema_type.as_deref(), Some("string"));
        assert_eq!(addr.required.as_ref().unwrap(), &vec!["city".to_string()]);
    }

    #[test]
    fn test_parent_redeclared_as_array_adopts_children_as_items() {
        let mut root = Schema::of_type("object");
        root.set_property(&tag(), "list.id", Schema::of_type("integer"), true)
            .unwrap();
        root.set_property(
            &tag(),
            "list",
            Schema::from_type_arg(&tag(), "array.object").unwrap(),
            true,
        )
        .unwrap();

        let list = &root.properties.as_ref().unwrap()["list"];
        assert_eq!(list.schema_type.as_deref(), Some("array"));
        let items = list.items.as_ref().unwrap();
        assert!(items.properties.as_ref().unwrap().contains_key("id"));
        assert_eq!(items.required.as_ref().unwrap(), &vec!["id".to_string()]);
    }

    #[test]
    fn test_array_redeclared_keeps_item_children() {
        let mut root = Schema::of_type("object");
        root.set_property(
            &tag(),
            "list",
            Schema::from_type_arg(&tag(), "array.object").unwrap(),
            true,
        )
        .unwrap();
        root.set_property(&tag(), "list.id", Schema::of_type("integer"), true)
            .unwrap();
        root.set_property(
            &tag(),
            "list",
            Schema::from_type_arg(&tag(), "array.object").unwrap(),
            false,
        )
        .unwrap();

        let list = &root.properties.as_ref().unwrap()["list"];
        let items = list.items.as_ref().unwrap();
        assert!(items.properties.as_ref().unwrap().contains_key("id"));
    }

    #[test]
    fn test_split_enum_keyed() {
        let (desc, values) = split_enum("state of the user {normal:ok,locked:bad}");
        assert_eq!(desc, "state of the user");
        assert_eq!(values.unwrap(), vec!["normal", "locked"]);
    }

    #[test]
    fn test_split_enum_bracketed() {
        let (desc, values) = split_enum("sizes [s,m,l]");
        assert_eq!(desc, "sizes");
        assert_eq!(values.unwrap(), vec!["s", "m", "l"]);
    }

    #[test]
    fn test_split_enum_absent() {
        let (desc, values) = split_enum("plain description");
        assert_eq!(desc, "plain description");
        assert!(values.is_none());
    }
}
