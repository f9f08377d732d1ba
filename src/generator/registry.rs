use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use crate::error::ConfigError;

use super::GeneratorSpec;

/// Immutable name -> spec table shared by every evaluation.
///
/// References are resolved against this table at evaluation time. Cycles
/// between named specs are rejected when the registry is built.
#[derive(Debug, Clone, Default)]
pub struct GeneratorRegistry {
    specs: BTreeMap<String, GeneratorSpec>,
}

impl GeneratorRegistry {
    /// Builds a registry from already decoded specs.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReferenceCycle`] when following references from
    /// any named spec leads back to itself. References to names that are not
    /// registered are allowed here and fail at evaluation time.
    pub fn new(specs: BTreeMap<String, GeneratorSpec>) -> Result<Self, ConfigError> {
        let registry = Self { specs };
        registry.check_cycles()?;
        Ok(registry)
    }

    /// Decodes raw definitions from the configuration and builds a registry.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidGenerator`] for a malformed definition
    /// and [`ConfigError::ReferenceCycle`] for cyclic references.
    pub fn from_definitions(definitions: &BTreeMap<String, Value>) -> Result<Self, ConfigError> {
        let specs = definitions
            .iter()
            .map(|(name, definition)| {
                GeneratorSpec::decode(definition)
                    .map(|spec| (name.clone(), spec))
                    .map_err(|err| ConfigError::InvalidGenerator {
                        name: name.clone(),
                        source: err,
                    })
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;
        Self::new(specs)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&GeneratorSpec> {
        self.specs.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.specs.keys().map(String::as_str)
    }

    fn check_cycles(&self) -> Result<(), ConfigError> {
        let mut finished: BTreeSet<&str> = BTreeSet::new();
        for name in self.specs.keys() {
            let mut path: Vec<&str> = Vec::new();
            self.visit(name, &mut path, &mut finished)?;
        }
        Ok(())
    }

    fn visit<'reg>(
        &'reg self,
        name: &'reg str,
        path: &mut Vec<&'reg str>,
        finished: &mut BTreeSet<&'reg str>,
    ) -> Result<(), ConfigError> {
        if finished.contains(name) {
            return Ok(());
        }
        if let Some(start) = path.iter().position(|seen| *seen == name) {
            let mut cycle: Vec<&str> = path.get(start..).map(<[&str]>::to_vec).unwrap_or_default();
            cycle.push(name);
            return Err(ConfigError::ReferenceCycle {
                path: cycle.join(" -> "),
            });
        }
        let Some(spec) = self.specs.get(name) else {
            return Ok(());
        };

        let mut targets: Vec<&'reg str> = Vec::new();
        spec.for_each_reference(&mut |target| targets.push(target));

        path.push(name);
        for target in targets {
            self.visit(target, path, finished)?;
        }
        path.pop();
        finished.insert(name);
        Ok(())
    }
}
