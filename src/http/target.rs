use std::collections::BTreeMap;

use rand::{CryptoRng, Rng};
use url::Url;

use crate::config::ParamSpec;
use crate::error::RequestError;
use crate::generator::{GeneratorRegistry, display_value};

/// Substitutes every `{name}` in `path` with its generated value.
pub(crate) fn resolve_path<R>(
    path: &str,
    parameters: &BTreeMap<String, ParamSpec>,
    registry: &GeneratorRegistry,
    rng: &mut R,
) -> Result<String, RequestError>
where
    R: Rng + CryptoRng + ?Sized,
{
    let mut resolved = path.to_owned();
    for (name, spec) in parameters {
        let value = spec
            .evaluate_with(registry, rng)
            .map_err(|err| RequestError::PathParameter {
                name: name.clone(),
                source: err,
            })?;
        resolved = resolved.replace(&format!("{{{}}}", name), &display_value(&value));
    }
    Ok(resolved)
}

/// Joins a base URL and a path with exactly one `/` between them.
pub(crate) fn join_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let tail = path.trim_start_matches('/');
    format!("{}/{}", base, tail)
}

/// Parses `url` and appends one generated pair per query parameter.
pub(crate) fn with_query<R>(
    url: &str,
    parameters: &BTreeMap<String, ParamSpec>,
    registry: &GeneratorRegistry,
    rng: &mut R,
) -> Result<Url, RequestError>
where
    R: Rng + CryptoRng + ?Sized,
{
    let mut parsed = Url::parse(url).map_err(|err| RequestError::InvalidUrl { source: err })?;
    if parameters.is_empty() {
        return Ok(parsed);
    }

    let mut pairs = Vec::with_capacity(parameters.len());
    for (name, spec) in parameters {
        let value = spec
            .evaluate_with(registry, rng)
            .map_err(|err| RequestError::QueryParameter {
                name: name.clone(),
                source: err,
            })?;
        pairs.push((name.as_str(), display_value(&value)));
    }
    parsed.query_pairs_mut().extend_pairs(pairs);
    Ok(parsed)
}
