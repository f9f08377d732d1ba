use std::collections::BTreeMap;

use rand::rngs::{OsRng, StdRng};
use rand::seq::SliceRandom;
use rand::{CryptoRng, Rng, SeedableRng};
use serde_json::{Map, Value};

use crate::error::GenerationError;

use super::spec::check_length;
use super::{GeneratorRegistry, GeneratorSpec, render_template, weighted_index};

/// Creates a fresh cryptographically strong generator seeded from the OS.
///
/// # Errors
///
/// Returns [`GenerationError::Entropy`] when the OS entropy source fails.
pub fn seeded_rng() -> Result<StdRng, GenerationError> {
    StdRng::from_rng(OsRng).map_err(|err| GenerationError::Entropy {
        reason: err.to_string(),
    })
}

/// Evaluates `spec` with freshly seeded randomness.
///
/// # Errors
///
/// Returns a [`GenerationError`] when the spec (or anything it references)
/// cannot produce a value.
pub fn evaluate(spec: &GeneratorSpec, registry: &GeneratorRegistry) -> Result<Value, GenerationError> {
    let mut rng = seeded_rng()?;
    evaluate_with(spec, registry, &mut rng)
}

/// Evaluates `spec`, drawing from `rng`.
///
/// Children of templates, objects and arrays are evaluated independently
/// against the same registry. References are looked up on every call.
///
/// # Errors
///
/// Returns [`GenerationError::NotFound`] for unresolved references,
/// [`GenerationError::EmptyChoice`] for a choice without values, and wraps
/// child failures with the name of the failing child.
pub fn evaluate_with<R>(
    spec: &GeneratorSpec,
    registry: &GeneratorRegistry,
    rng: &mut R,
) -> Result<Value, GenerationError>
where
    R: Rng + CryptoRng + ?Sized,
{
    match spec {
        GeneratorSpec::Static(value) => Ok(value.clone()),
        GeneratorSpec::RandomInt { min, max } => Ok(Value::from(draw_int(*min, *max, rng))),
        GeneratorSpec::FormattedInt { min, max, format } => {
            let drawn = draw_int(*min, *max, rng);
            Ok(Value::String(format.replace("{}", &drawn.to_string())))
        }
        GeneratorSpec::Choice { values, weights } => choose(values, weights.as_deref(), rng),
        GeneratorSpec::RandomString { length, charset } => {
            check_length("length", *length)?;
            let symbols = charset.symbols();
            let text: String = (0..*length)
                .filter_map(|_| symbols.choose(rng).map(|symbol| char::from(*symbol)))
                .collect();
            Ok(Value::String(text))
        }
        GeneratorSpec::Template { text, parameters } => {
            let mut vars = BTreeMap::new();
            for (name, child) in parameters {
                let value = evaluate_with(child, registry, rng).map_err(|err| {
                    GenerationError::nested(format!("template parameter {}", name), err)
                })?;
                vars.insert(name.clone(), display_value(&value));
            }
            Ok(Value::String(render_template(text, &vars)))
        }
        GeneratorSpec::Object { properties } => {
            let mut object = Map::new();
            for (name, child) in properties {
                let value = evaluate_with(child, registry, rng).map_err(|err| {
                    GenerationError::nested(format!("object field {}", name), err)
                })?;
                object.insert(name.clone(), value);
            }
            Ok(Value::Object(object))
        }
        GeneratorSpec::Array {
            min_length,
            max_length,
            element,
        } => {
            check_length("maxLength", *max_length)?;
            let lower = (*min_length).min(*max_length);
            let length = rng.gen_range(lower..=*max_length);
            let mut items = Vec::with_capacity(length);
            for index in 0..length {
                let value = evaluate_with(element, registry, rng).map_err(|err| {
                    GenerationError::nested(format!("array element {}", index), err)
                })?;
                items.push(value);
            }
            Ok(Value::Array(items))
        }
        GeneratorSpec::Reference { name } => {
            let target = registry
                .get(name)
                .ok_or_else(|| GenerationError::NotFound { name: name.clone() })?;
            evaluate_with(target, registry, rng)
        }
    }
}

/// String form used for path segments, query values and template slots.
#[must_use]
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::Array(_) | Value::Object(_) => {
            value.to_string()
        }
    }
}

fn draw_int<R>(min: i64, max: i64, rng: &mut R) -> i64
where
    R: Rng + ?Sized,
{
    if min >= max {
        return min;
    }
    rng.gen_range(min..=max)
}

fn choose<R>(values: &[Value], weights: Option<&[f64]>, rng: &mut R) -> Result<Value, GenerationError>
where
    R: Rng + ?Sized,
{
    let first = values.first().ok_or(GenerationError::EmptyChoice)?;
    let picked = match weights {
        Some(weights) if weights.len() == values.len() => weighted_index(weights, rng)
            .and_then(|index| values.get(index))
            .unwrap_or(first),
        Some(_) | None => values.choose(rng).unwrap_or(first),
    };
    Ok(picked.clone())
}
