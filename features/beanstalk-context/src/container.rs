use std::{
    fmt::Debug,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use crate::{
    definition::BeanDefinition,
    errors::{InitError, RequireError},
    factory::BeanFactory,
    lifecycle::invoke_hook,
    types::{Instance, TypeInfo},
};

/// Container holding all initiated beans
///
/// Cheap to clone, every clone refers to the same beans.
#[derive(Clone)]
pub struct ApplicationContext(pub Arc<ApplicationContextInner>);
pub struct ApplicationContextInner {
    factory: BeanFactory,
    closed: AtomicBool,
}
impl Debug for ApplicationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_struct("ApplicationContext");
        for definition in self.0.factory.registry().iter() {
            map.field(definition.name(), &definition.info().type_name);
        }
        map.finish()
    }
}

impl ApplicationContext {
    pub(crate) fn new(factory: BeanFactory) -> Self {
        Self(Arc::new(ApplicationContextInner {
            factory,
            closed: AtomicBool::new(false),
        }))
    }

    pub fn contains_bean(&self, name: &str) -> bool {
        self.0.factory.registry().contains(name)
    }

    pub fn find_bean_definition(&self, name: &str) -> Option<&BeanDefinition> {
        self.0.factory.registry().get(name)
    }

    /// All definitions assignable to `ty`, sorted by order then name
    pub fn find_bean_definitions(&self, ty: TypeInfo) -> Vec<&BeanDefinition> {
        self.0.factory.registry().find_all(ty)
    }

    /// The single definition assignable to `ty`, preferring the primary one
    pub fn find_bean_definition_by_type(
        &self,
        ty: TypeInfo,
    ) -> Result<Option<&BeanDefinition>, RequireError> {
        self.0.factory.registry().find_by_type(ty)
    }

    /// Current instance of bean `name`
    pub fn get_instance(&self, name: &str) -> Result<Instance, RequireError> {
        self.0.factory.get_instance(name)
    }

    pub fn get_instance_by_type(&self, ty: TypeInfo) -> Result<Instance, RequireError> {
        let definition = self
            .find_bean_definition_by_type(ty)?
            .ok_or(RequireError::TypeMissing(ty))?;
        definition.required_instance().cloned()
    }

    /// Attempts to get bean `name` as `T`
    pub fn get_bean<T: ?Sized + 'static>(&self, name: &str) -> Result<Arc<T>, RequireError> {
        let instance = self.get_instance(name)?;
        instance
            .view::<T>()
            .ok_or_else(|| RequireError::NotOfRequiredType {
                bean: name.to_string(),
                required: std::any::type_name::<T>(),
                actual: instance.info().type_name,
            })
    }

    /// Attempts to get the single bean of type `T`
    pub fn get_bean_by_type<T: ?Sized + 'static>(&self) -> Result<Arc<T>, RequireError> {
        let ty = TypeInfo::of::<T>();
        let definition = self
            .find_bean_definition_by_type(ty)?
            .ok_or(RequireError::TypeMissing(ty))?;
        self.get_bean(definition.name())
    }

    /// Every bean of type `T`, sorted by order then name
    pub fn get_beans<T: ?Sized + 'static>(&self) -> Result<Vec<Arc<T>>, RequireError> {
        self.find_bean_definitions(TypeInfo::of::<T>())
            .into_iter()
            .map(|definition| self.get_bean(definition.name()))
            .collect()
    }

    /// Runs all destroy hooks, in reverse order
    ///
    /// Failing hooks don't stop the others, the first failure is returned.
    /// Only the first call has any effect.
    pub fn close(&self) -> Result<(), InitError> {
        if self.0.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let factory = &self.0.factory;
        let mut first_error = None;
        for name in factory.registry().sorted_names(|_| true).iter().rev() {
            let result = factory
                .injection_target(name)
                .map_err(InitError::from)
                .and_then(|target| match factory.registry().get(name) {
                    Some(definition) => {
                        invoke_hook(factory.catalog(), name, definition.destroy_hook(), &target)
                    }
                    None => Ok(()),
                });

            if let Err(error) = result {
                tracing::error!("Failed to destroy bean '{name}': {error}");
                first_error.get_or_insert(error);
            }
        }

        tracing::info!("Application context closed");
        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// The factory the beans were created with
    pub fn factory(&self) -> &BeanFactory {
        &self.0.factory
    }
}
