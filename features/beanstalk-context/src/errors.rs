use thiserror::Error;

use crate::types::{DynError, TypeInfo};

/// Configuration errors - the declared metadata can not describe a valid container
#[derive(Error, Debug)]
pub enum DefinitionError {
    #[error("Class '{0}' is not registered in the catalog")]
    UnknownClass(String),
    #[error("Class '{0}' has been registered twice")]
    DuplicateClass(&'static str),
    #[error("Duplicate bean name: '{0}'")]
    DuplicateBeanName(String),
    #[error("Duplicate marker {marker} found on '{owner}'")]
    DuplicateMarker { marker: String, owner: String },

    #[error("Component class '{0}' must not be abstract")]
    AbstractComponent(&'static str),
    #[error("Component class '{0}' must be public")]
    NonPublicComponent(&'static str),
    #[error("No constructor found in class '{0}'")]
    NoConstructor(&'static str),
    #[error("More than one constructor found in class '{0}'")]
    MultipleConstructors(&'static str),
    #[error("More than one public constructor found in class '{0}'")]
    MultiplePublicConstructors(&'static str),

    #[error("Bean method '{class}::{method}' {reason}")]
    InvalidBeanMethod {
        class: &'static str,
        method: &'static str,
        reason: &'static str,
    },
    #[error("Method '{method}' marked {marker} must not have arguments: {class}")]
    HookWithArguments {
        class: &'static str,
        method: &'static str,
        marker: &'static str,
    },
    #[error("Multiple methods marked {marker} found on class '{class}'")]
    MultipleHooks {
        class: &'static str,
        marker: &'static str,
    },
    #[error("Method '{method}' not found on '{class}'")]
    HookNotFound { class: &'static str, method: String },

    #[error("Cannot specify both autowired and value markers on {target} of bean '{bean}'")]
    BothMarkers { bean: String, target: String },
    #[error("Must specify an autowired or value marker on {target} of bean '{bean}'")]
    MissingMarker { bean: String, target: String },
    #[error("Cannot autowire {target} of configuration bean '{bean}'")]
    AutowiredInConfiguration { bean: String, target: String },
    #[error("Cannot autowire {target} of post processor '{bean}'")]
    AutowiredInPostProcessor { bean: String, target: String },
    #[error("Member '{member}' in class '{class}' must not be static")]
    StaticMember { class: &'static str, member: &'static str },
    #[error("Field '{field}' in class '{class}' must not be final")]
    FinalField { class: &'static str, field: &'static str },
    #[error("Cannot inject a non-setter method '{method}' for bean '{bean}'")]
    NotASetter { bean: String, method: &'static str },

    #[error("Post processor '{processor}' returned no instance when processing bean '{bean}'")]
    PostProcessorReturnedNone { bean: String, processor: String },
}

/// Errors when trying to require a certain bean
#[derive(Error, Debug, Clone)]
pub enum RequireError {
    #[error("No bean defined with name '{0}'")]
    NameMissing(String),
    #[error("No bean defined with type '{0}'")]
    TypeMissing(TypeInfo),
    #[error("Multiple beans with type '{0}' found, but no primary specified")]
    NoPrimary(TypeInfo),
    #[error("Multiple beans with type '{0}' found, and multiple primaries specified")]
    MultiplePrimaries(TypeInfo),
    #[error("Required type '{required}' but bean '{bean}' has actual type '{actual}'")]
    NotOfRequiredType {
        bean: String,
        required: &'static str,
        actual: &'static str,
    },
    #[error("Bean '{0}' has no instance yet")]
    InstanceMissing(String),
}

/// Errors while initiating the container
///
/// Every variant aborts the start of the container.
#[derive(Error, Debug)]
pub enum InitError {
    #[error(transparent)]
    Definition(#[from] DefinitionError),
    #[error(transparent)]
    Require(#[from] RequireError),

    #[error("Unsatisfied dependency of type '{dependency}' on {target} of bean '{bean}'")]
    UnsatisfiedDependency {
        bean: String,
        target: String,
        dependency: &'static str,
    },
    #[error("Cannot resolve value '{expression}' for bean '{bean}' - error: {source}")]
    Value {
        bean: String,
        expression: String,
        source: DynError,
    },
    #[error("Circular dependency detected when creating bean '{0}'")]
    CircularDependency(String),
    #[error("Exception when creating bean '{bean}' - error: {source}")]
    Creation { bean: String, source: DynError },
}

impl InitError {
    pub(crate) fn creation(bean: &str, source: impl Into<DynError>) -> Self {
        InitError::Creation {
            bean: bean.to_string(),
            source: source.into(),
        }
    }
}

/// Errors while extracting typed arguments for constructors, methods and fields
#[derive(Error, Debug, Clone)]
pub enum ArgumentError {
    #[error("No argument at position {0}")]
    Missing(usize),
    #[error("Argument at position {0} was already taken")]
    Taken(usize),
    #[error("Argument at position {index} is not a '{expected}'")]
    TypeMismatch { index: usize, expected: &'static str },
    #[error("Injection target is not a '{expected}'")]
    TargetMismatch { expected: &'static str },
}
