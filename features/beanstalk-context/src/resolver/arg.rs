use std::{
    any::{type_name, Any},
    sync::Arc,
};

use crate::{errors::ArgumentError, types::Instance};

/// A resolved configuration value, boxed as the target type
pub type PropertyValue = Box<dyn Any + Send + Sync>;

/// One resolved argument for a constructor, method or field
pub enum Argument {
    /// Produced by the value resolver
    Value(PropertyValue),
    /// The current instance of another bean
    Bean(Instance),
    /// Optional dependency that could not be found
    Absent,
}
impl std::fmt::Debug for Argument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Argument::Value(_) => f.write_str("Value(..)"),
            Argument::Bean(instance) => f.debug_tuple("Bean").field(instance).finish(),
            Argument::Absent => f.write_str("Absent"),
        }
    }
}

impl Argument {
    /// Unboxes a configuration value
    pub fn into_value<T: 'static>(self, index: usize) -> Result<T, ArgumentError> {
        match self {
            Argument::Value(value) => value
                .downcast::<T>()
                .map(|value| *value)
                .map_err(|_| ArgumentError::TypeMismatch {
                    index,
                    expected: type_name::<T>(),
                }),
            Argument::Absent => Err(ArgumentError::Missing(index)),
            Argument::Bean(_) => Err(ArgumentError::TypeMismatch {
                index,
                expected: type_name::<T>(),
            }),
        }
    }
}

/// Conversion of an [Argument] into the type a constructor or setter expects
pub trait FromArgument: Sized {
    fn from_argument(argument: Argument, index: usize) -> Result<Self, ArgumentError>;
}

impl<T: ?Sized + 'static> FromArgument for Arc<T> {
    fn from_argument(argument: Argument, index: usize) -> Result<Self, ArgumentError> {
        match argument {
            Argument::Bean(instance) => {
                instance
                    .view::<T>()
                    .ok_or_else(|| ArgumentError::TypeMismatch {
                        index,
                        expected: type_name::<T>(),
                    })
            }
            Argument::Absent => Err(ArgumentError::Missing(index)),
            // Shared configuration values may be handed out as Arc as well
            value @ Argument::Value(_) => value.into_value::<Arc<T>>(index),
        }
    }
}

impl<Resolvable: FromArgument> FromArgument for Option<Resolvable> {
    fn from_argument(argument: Argument, index: usize) -> Result<Self, ArgumentError> {
        match argument {
            // Optional dependencies which are not registered don't fail
            Argument::Absent => Ok(None),
            other => Resolvable::from_argument(other, index).map(Some),
        }
    }
}

/// Resolved arguments of one invocation
///
/// Each position can be taken exactly once.
#[derive(Debug, Default)]
pub struct Args {
    slots: Vec<Option<Argument>>,
}

impl Args {
    pub fn new(arguments: Vec<Argument>) -> Self {
        Args {
            slots: arguments.into_iter().map(Some).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Takes the raw argument at `index`
    pub fn take(&mut self, index: usize) -> Result<Argument, ArgumentError> {
        self.slots
            .get_mut(index)
            .ok_or(ArgumentError::Missing(index))?
            .take()
            .ok_or(ArgumentError::Taken(index))
    }

    /// Takes a bean argument, e.g. `args.get::<Arc<Repo>>(0)?`
    pub fn get<A: FromArgument>(&mut self, index: usize) -> Result<A, ArgumentError> {
        let argument = self.take(index)?;
        A::from_argument(argument, index)
    }

    /// Takes a configuration value, e.g. `args.value::<u16>(1)?`
    pub fn value<T: 'static>(&mut self, index: usize) -> Result<T, ArgumentError> {
        self.take(index)?.into_value(index)
    }
}
