use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("{kind} generator requires '{field}' field")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },
    #[error("generator type not specified")]
    MissingType,
    #[error("unsupported generator type: {kind}")]
    UnsupportedType { kind: String },
    #[error("invalid generator definition: {reason}")]
    InvalidDefinition { reason: String },
    #[error("referenced generator '{name}' not found")]
    NotFound { name: String },
    #[error("no values provided for choice generator")]
    EmptyChoice,
    #[error("failed to seed random source: {reason}")]
    Entropy { reason: String },
    #[error("failed to generate {context}: {source}")]
    Nested {
        context: String,
        #[source]
        source: Box<GenerationError>,
    },
}

impl GenerationError {
    pub(crate) fn nested(context: impl Into<String>, source: Self) -> Self {
        Self::Nested {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Innermost error, skipping the nesting context.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::Nested { source, .. } => source.root(),
            Self::MissingField { .. }
            | Self::MissingType
            | Self::UnsupportedType { .. }
            | Self::InvalidDefinition { .. }
            | Self::NotFound { .. }
            | Self::EmptyChoice
            | Self::Entropy { .. } => self,
        }
    }
}
