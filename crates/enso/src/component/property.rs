//! Component property schema.
//!
//! A property is either a plain reactive value or one mirrored by an
//! attribute on the host element. Attribute properties carry a type that
//! decides how values cross the string-only attribute boundary:
//!
//! | Type | attribute → property | property → attribute |
//! |------|----------------------|----------------------|
//! | `Boolean` | present and not `"false"` | `""` when truthy, removed otherwise |
//! | `Number` | parsed as a number, `null` if unparsable | number text, removed for `null` |
//! | `String` | as is | as is, removed for `null` |
//!
//! A non-forced attribute property always starts at `null` so that an absent
//! attribute and the default agree. `force` adds the attribute on connect even
//! when nobody set it; it is ignored for a `Boolean` without a default.

use std::fmt;
use std::str::FromStr;

use serde_json::{Number, Value};

use crate::error::DefinitionError;

/// Value type of an attribute-backed property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    Boolean,
    Number,
    String,
}

impl FromStr for AttributeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Boolean" | "boolean" | "bool" => Ok(AttributeType::Boolean),
            "Number" | "number" => Ok(AttributeType::Number),
            "String" | "string" => Ok(AttributeType::String),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttributeType::Boolean => "Boolean",
            AttributeType::Number => "Number",
            AttributeType::String => "String",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKind {
    Value,
    Attribute { ty: AttributeType, force: bool },
}

/// Declared shape of one property, before resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertySpec {
    pub value: Value,
    pub kind: PropertyKind,
}

impl PropertySpec {
    /// A plain reactive property with a default.
    pub fn value(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            kind: PropertyKind::Value,
        }
    }

    /// A property mirrored by a host attribute.
    pub fn attribute(ty: AttributeType, value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            kind: PropertyKind::Attribute { ty, force: false },
        }
    }

    /// Marks an attribute property as always present on the host.
    pub fn forced(mut self) -> Self {
        if let PropertyKind::Attribute { force, .. } = &mut self.kind {
            *force = true;
        }
        self
    }

    /// Like [`attribute`](Self::attribute), with the type given by name.
    pub fn attribute_named(
        property: &str,
        ty: &str,
        value: impl Into<Value>,
    ) -> Result<Self, DefinitionError> {
        let ty = ty
            .parse()
            .map_err(|ty| DefinitionError::UnsupportedAttributeType {
                property: property.to_string(),
                ty,
            })?;
        Ok(Self::attribute(ty, value))
    }
}

/// Converts between attribute text and property values for one type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeConverter {
    pub ty: AttributeType,
    pub force: bool,
}

impl AttributeConverter {
    /// Attribute text (or its absence) to a property value.
    pub fn to_prop(&self, raw: Option<&str>) -> Value {
        match (self.ty, raw) {
            (AttributeType::Boolean, raw) => Value::Bool(raw.is_some_and(|v| v != "false")),
            (_, None) => Value::Null,
            (AttributeType::Number, Some(raw)) => parse_number(raw),
            (AttributeType::String, Some(raw)) => Value::String(raw.to_string()),
        }
    }

    /// Property value to attribute text; `None` removes the attribute.
    pub fn to_attr(&self, value: &Value) -> Option<String> {
        match (self.ty, value) {
            (AttributeType::Boolean, value) => is_truthy(value).then(String::new),
            (_, Value::Null) => None,
            (_, Value::String(text)) => Some(text.clone()),
            (_, other) => Some(other.to_string()),
        }
    }
}

/// A property after resolution: default plus optional converter.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub default: Value,
    pub attribute: Option<AttributeConverter>,
}

impl Property {
    pub fn resolve(name: &str, spec: PropertySpec) -> Self {
        match spec.kind {
            PropertyKind::Value => Self {
                name: name.to_string(),
                default: spec.value,
                attribute: None,
            },
            PropertyKind::Attribute { ty, force } => {
                let force = force && !(spec.value.is_null() && ty == AttributeType::Boolean);
                Self {
                    name: name.to_string(),
                    default: if force { spec.value } else { Value::Null },
                    attribute: Some(AttributeConverter { ty, force }),
                }
            }
        }
    }

    pub fn is_forced(&self) -> bool {
        self.attribute.is_some_and(|attr| attr.force)
    }
}

fn parse_number(raw: &str) -> Value {
    let raw = raw.trim();
    if let Ok(int) = raw.parse::<i64>() {
        return Value::Number(int.into());
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Truthiness of a json value, as templates see it.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
