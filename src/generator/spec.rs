use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::GenerationError;

const DEFAULT_INT_MIN: i64 = 0;
const DEFAULT_INT_MAX: i64 = 100;
const DEFAULT_STRING_LENGTH: usize = 10;
const DEFAULT_ARRAY_MIN: usize = 1;
const DEFAULT_ARRAY_MAX: usize = 5;
const DEFAULT_INT_FORMAT: &str = "{}";

/// Upper bound for `randomString` lengths and `array` lengths.
pub(crate) const MAX_GENERATED_LENGTH: usize = 1_000_000;

/// Declarative description of how to produce one value.
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratorSpec {
    Static(Value),
    RandomInt {
        min: i64,
        max: i64,
    },
    FormattedInt {
        min: i64,
        max: i64,
        format: String,
    },
    Choice {
        values: Vec<Value>,
        weights: Option<Vec<f64>>,
    },
    RandomString {
        length: usize,
        charset: Charset,
    },
    Template {
        text: String,
        parameters: BTreeMap<String, GeneratorSpec>,
    },
    Object {
        properties: BTreeMap<String, GeneratorSpec>,
    },
    Array {
        min_length: usize,
        max_length: usize,
        element: Box<GeneratorSpec>,
    },
    Reference {
        name: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    Alpha,
    AlphaLower,
    AlphaUpper,
    Numeric,
    Alphanumeric,
    Hex,
}

impl Charset {
    /// Resolves a charset name. Unknown names fall back to alphanumeric.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "alpha" => Self::Alpha,
            "alpha_lower" => Self::AlphaLower,
            "alpha_upper" => Self::AlphaUpper,
            "numeric" => Self::Numeric,
            "hex" => Self::Hex,
            _ => Self::Alphanumeric,
        }
    }

    #[must_use]
    pub const fn symbols(self) -> &'static [u8] {
        match self {
            Self::Alpha => b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ",
            Self::AlphaLower => b"abcdefghijklmnopqrstuvwxyz",
            Self::AlphaUpper => b"ABCDEFGHIJKLMNOPQRSTUVWXYZ",
            Self::Numeric => b"0123456789",
            Self::Alphanumeric => {
                b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789"
            }
            Self::Hex => b"0123456789abcdef",
        }
    }
}

impl GeneratorSpec {
    /// Decodes an untyped definition into a spec tree.
    ///
    /// A bare string is a static value, `{ "$ref": name }` is a reference and
    /// any other mapping is dispatched on its `type` field.
    ///
    /// # Errors
    ///
    /// Returns a [`GenerationError`] when the definition has an unknown
    /// `type`, lacks a required field, or is not a string or mapping.
    pub fn decode(definition: &Value) -> Result<Self, GenerationError> {
        match definition {
            Value::String(text) => Ok(Self::Static(Value::String(text.clone()))),
            Value::Object(fields) => decode_mapping(fields),
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::Array(_) => {
                Err(GenerationError::InvalidDefinition {
                    reason: format!("expected a string or a mapping, got {}", definition),
                })
            }
        }
    }

    /// Calls `visit` with the name of every reference in this tree.
    pub(crate) fn for_each_reference<'spec, F>(&'spec self, visit: &mut F)
    where
        F: FnMut(&'spec str),
    {
        match self {
            Self::Reference { name } => visit(name.as_str()),
            Self::Template { parameters, .. } => {
                for child in parameters.values() {
                    child.for_each_reference(visit);
                }
            }
            Self::Object { properties } => {
                for child in properties.values() {
                    child.for_each_reference(visit);
                }
            }
            Self::Array { element, .. } => element.for_each_reference(visit),
            Self::Static(_)
            | Self::RandomInt { .. }
            | Self::FormattedInt { .. }
            | Self::Choice { .. }
            | Self::RandomString { .. } => {}
        }
    }
}

fn decode_mapping(fields: &Map<String, Value>) -> Result<GeneratorSpec, GenerationError> {
    if let Some(target) = fields.get("$ref") {
        return target
            .as_str()
            .map(|name| GeneratorSpec::Reference {
                name: name.to_owned(),
            })
            .ok_or_else(|| GenerationError::InvalidDefinition {
                reason: "$ref value must be a string".to_owned(),
            });
    }

    let kind = fields
        .get("type")
        .and_then(Value::as_str)
        .ok_or(GenerationError::MissingType)?;

    match kind {
        "static" => Ok(GeneratorSpec::Static(
            fields.get("value").cloned().unwrap_or(Value::Null),
        )),
        "randomInt" => {
            let min = int_field(fields, "min", DEFAULT_INT_MIN);
            let max = int_field(fields, "max", DEFAULT_INT_MAX);
            match str_field(fields, "format") {
                Some(format) if !format.is_empty() => Ok(GeneratorSpec::FormattedInt {
                    min,
                    max,
                    format: format.to_owned(),
                }),
                Some(_) | None => Ok(GeneratorSpec::RandomInt { min, max }),
            }
        }
        "formattedInt" => {
            let format = str_field(fields, "format").unwrap_or(DEFAULT_INT_FORMAT);
            if format.is_empty() {
                return Err(GenerationError::MissingField {
                    kind: "formattedInt",
                    field: "format",
                });
            }
            Ok(GeneratorSpec::FormattedInt {
                min: int_field(fields, "min", DEFAULT_INT_MIN),
                max: int_field(fields, "max", DEFAULT_INT_MAX),
                format: format.to_owned(),
            })
        }
        "choice" => {
            let values = fields
                .get("values")
                .and_then(Value::as_array)
                .cloned()
                .ok_or(GenerationError::MissingField {
                    kind: "choice",
                    field: "values",
                })?;
            let weights = fields.get("weights").and_then(Value::as_array).map(|raw| {
                raw.iter()
                    .map(|weight| float_value(weight).unwrap_or(0.0))
                    .collect()
            });
            Ok(GeneratorSpec::Choice { values, weights })
        }
        "randomString" => Ok(GeneratorSpec::RandomString {
            length: length_field(fields, "length", DEFAULT_STRING_LENGTH)?,
            charset: Charset::from_name(str_field(fields, "charset").unwrap_or("alphanumeric")),
        }),
        "template" => {
            let text = str_field(fields, "template").unwrap_or_default();
            if text.is_empty() {
                return Err(GenerationError::MissingField {
                    kind: "template",
                    field: "template",
                });
            }
            let parameters = decode_children(fields.get("parameters"), "template parameter")?;
            Ok(GeneratorSpec::Template {
                text: text.to_owned(),
                parameters,
            })
        }
        "object" => Ok(GeneratorSpec::Object {
            properties: decode_children(fields.get("properties"), "object property")?,
        }),
        "array" => {
            let element_definition =
                fields
                    .get("elementGenerator")
                    .ok_or(GenerationError::MissingField {
                        kind: "array",
                        field: "elementGenerator",
                    })?;
            let element = GeneratorSpec::decode(element_definition).map_err(|err| {
                GenerationError::nested("array element generator", err)
            })?;
            Ok(GeneratorSpec::Array {
                min_length: length_field(fields, "minLength", DEFAULT_ARRAY_MIN)?,
                max_length: length_field(fields, "maxLength", DEFAULT_ARRAY_MAX)?,
                element: Box::new(element),
            })
        }
        other => Err(GenerationError::UnsupportedType {
            kind: other.to_owned(),
        }),
    }
}

fn decode_children(
    raw: Option<&Value>,
    context: &str,
) -> Result<BTreeMap<String, GeneratorSpec>, GenerationError> {
    let Some(raw) = raw else {
        return Ok(BTreeMap::new());
    };
    let children = raw
        .as_object()
        .ok_or_else(|| GenerationError::InvalidDefinition {
            reason: format!("{}s must be a mapping", context),
        })?;
    children
        .iter()
        .map(|(name, definition)| {
            GeneratorSpec::decode(definition)
                .map(|child| (name.clone(), child))
                .map_err(|err| GenerationError::nested(format!("{} {}", context, name), err))
        })
        .collect()
}

fn str_field<'map>(fields: &'map Map<String, Value>, key: &str) -> Option<&'map str> {
    fields.get(key).and_then(Value::as_str)
}

/// Integers may arrive as numbers, floats or numeric strings depending on
/// the config format. Anything else keeps the default.
fn int_field(fields: &Map<String, Value>, key: &str, default: i64) -> i64 {
    match fields.get(key) {
        Some(Value::Number(number)) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float as i64))
            .unwrap_or(default),
        Some(Value::String(text)) => text.trim().parse().unwrap_or(default),
        Some(_) | None => default,
    }
}

fn usize_field(fields: &Map<String, Value>, key: &str, default: usize) -> usize {
    let fallback = i64::try_from(default).unwrap_or(i64::MAX);
    usize::try_from(int_field(fields, key, fallback).max(0)).unwrap_or(default)
}

fn length_field(
    fields: &Map<String, Value>,
    key: &str,
    default: usize,
) -> Result<usize, GenerationError> {
    let length = usize_field(fields, key, default);
    check_length(key, length)?;
    Ok(length)
}

pub(crate) fn check_length(field: &str, length: usize) -> Result<(), GenerationError> {
    if length > MAX_GENERATED_LENGTH {
        return Err(GenerationError::InvalidDefinition {
            reason: format!(
                "{} {} exceeds the maximum of {}",
                field, length, MAX_GENERATED_LENGTH
            ),
        });
    }
    Ok(())
}

fn float_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
    }
}
