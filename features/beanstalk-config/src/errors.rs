use beanstalk_context::{DynError, TypeInfo};

/// Errors when looking up or converting a property
#[derive(thiserror::Error, Debug)]
pub enum PropertyError {
    /// A required property has no value and no default
    #[error("Property '{0}' not found")]
    NotFound(String),

    /// No converter is registered for the target type
    #[error("Unsupported value type: '{0}'")]
    UnsupportedType(TypeInfo),

    #[error("Cannot convert '{value}' to '{target}' - error: {source}")]
    Conversion {
        value: String,
        target: TypeInfo,
        source: DynError,
    },

    /// Values referring to each other without end
    #[error("Property '{0}' is nested too deeply, it may refer to itself")]
    TooDeep(String),

    #[error("Invalid TOML document: {0}")]
    Toml(#[from] toml::de::Error),
}
