use crate::types::{DynError, TypeInfo};

pub mod arg;

pub use arg::{Argument, Args, FromArgument, PropertyValue};

/// Resolves `${key}` style expressions into typed configuration values
///
/// The returned value must be boxed as the requested `target` type.
pub trait ValueResolver: Send + Sync {
    /// Fails if the expression can not be resolved or converted
    fn resolve_required(&self, expression: &str, target: TypeInfo)
        -> Result<PropertyValue, DynError>;
}

/// Resolver used when the container has no configuration
///
/// Every expression fails to resolve.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyValues;

impl ValueResolver for EmptyValues {
    fn resolve_required(
        &self,
        expression: &str,
        target: TypeInfo,
    ) -> Result<PropertyValue, DynError> {
        Err(format!("no configuration available to resolve '{expression}' as '{target}'").into())
    }
}
