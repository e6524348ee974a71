use beanstalk_context::TypeInfo;

/// Errors when creating a proxy
#[derive(thiserror::Error, Debug)]
pub enum AopError {
    #[error("{marker} on bean '{bean}' must name its invocation handler")]
    MissingHandlerName { marker: String, bean: String },

    #[error("{marker} proxy handler '{handler}' not found")]
    HandlerNotFound { marker: String, handler: String },

    #[error("{marker} proxy handler '{handler}' is not an invocation handler")]
    NotAHandler { marker: String, handler: String },

    /// No wrapper type is registered for the runtime type of the bean
    #[error("No proxy type registered for '{0}'")]
    NoProxyType(TypeInfo),

    #[error("Proxy expected a '{expected}' but the bean is a '{actual}'")]
    TargetMismatch {
        expected: &'static str,
        actual: TypeInfo,
    },
}
