use std::any::Any;

use tracing::{debug, warn};

use crate::{
    errors::{DefinitionError, InitError},
    factory::{BeanFactory, Resolution},
    metadata::{ClassMeta, FieldMeta, InjectMarkers, MethodMeta, Modifiers},
    resolver::{Argument, Args},
    types::TypeInfo,
};

/// Field and setter injection, run once every bean has an instance
pub(crate) struct PropertyInjector<'f> {
    factory: &'f BeanFactory,
}

impl<'f> PropertyInjector<'f> {
    pub(crate) fn new(factory: &'f BeanFactory) -> Self {
        PropertyInjector { factory }
    }

    /// Injects all marked fields and setters of bean `name`
    ///
    /// Properties land on the object the post processors point to, which is the original
    /// object for beans replaced by a proxy.
    pub(crate) fn inject(&self, name: &str) -> Result<(), InitError> {
        let target = self.factory.injection_target(name)?;
        let declared = match self.factory.registry().get(name) {
            Some(definition) => definition.info(),
            None => return Ok(()),
        };

        // Factory products may be plain types without metadata
        let Some(class) = self.factory.catalog().by_type(declared.type_id) else {
            return Ok(());
        };
        self.inject_class(name, class, &**target.raw())
    }

    /// Injects the members of `class`, then those of its ancestors
    fn inject_class(
        &self,
        bean: &str,
        class: &ClassMeta,
        object: &(dyn Any + Send + Sync),
    ) -> Result<(), InitError> {
        for field in &class.fields {
            self.inject_field(bean, class, field, object)?;
        }
        for method in &class.methods {
            self.inject_method(bean, class, method, object)?;
        }

        let Some(superclass) = &class.superclass else {
            return Ok(());
        };
        let parent_class = self
            .factory
            .catalog()
            .by_type(superclass.info.type_id)
            .ok_or_else(|| DefinitionError::UnknownClass(superclass.info.type_name.to_string()))?;
        let parent = superclass.project(object).ok_or_else(|| {
            InitError::creation(
                bean,
                format!("injection target is not a '{}'", class.name()),
            )
        })?;

        self.inject_class(bean, parent_class, parent)
    }

    fn inject_field(
        &self,
        bean: &str,
        class: &ClassMeta,
        field: &FieldMeta,
        object: &(dyn Any + Send + Sync),
    ) -> Result<(), InitError> {
        if field.inject.is_empty() {
            return Ok(());
        }

        if field.modifiers.contains(Modifiers::STATIC) {
            return Err(DefinitionError::StaticMember {
                class: class.name(),
                member: field.name,
            }
            .into());
        }
        if field.modifiers.contains(Modifiers::FINAL) {
            return Err(DefinitionError::FinalField {
                class: class.name(),
                field: field.name,
            }
            .into());
        }

        let target = format!("field '{}.{}'", class.info().simple_name(), field.name);
        let Some(argument) = self.resolve(bean, &target, &field.inject, field.info)? else {
            return Ok(());
        };
        debug!("Field injection: {}.{} of bean '{bean}'", class.name(), field.name);
        field
            .set(object, argument)
            .map_err(|error| InitError::creation(bean, error))
    }

    fn inject_method(
        &self,
        bean: &str,
        class: &ClassMeta,
        method: &MethodMeta,
        object: &(dyn Any + Send + Sync),
    ) -> Result<(), InitError> {
        if method.inject.is_empty() {
            return Ok(());
        }

        if method.modifiers.contains(Modifiers::STATIC) {
            return Err(DefinitionError::StaticMember {
                class: class.name(),
                member: method.name,
            }
            .into());
        }
        if method.modifiers.contains(Modifiers::FINAL) {
            warn!(
                "Inject final method '{}' in class '{}' with care, it is not called on the target when the bean is proxied",
                method.name,
                class.name()
            );
        }
        let [param] = method.params.as_slice() else {
            return Err(DefinitionError::NotASetter {
                bean: bean.to_string(),
                method: method.name,
            }
            .into());
        };

        let target = format!("method '{}.{}'", class.info().simple_name(), method.name);
        let Some(argument) = self.resolve(bean, &target, &method.inject, param.info)? else {
            return Ok(());
        };
        debug!("Setter injection: {}.{}(..) of bean '{bean}'", class.name(), method.name);
        method
            .invoke(object, &mut Args::new(vec![argument]))
            .map(|_| ())
            .map_err(|error| InitError::creation(bean, error))
    }

    /// `None` if the target is an optional dependency which is missing
    fn resolve(
        &self,
        bean: &str,
        target: &str,
        inject: &InjectMarkers,
        ty: TypeInfo,
    ) -> Result<Option<Argument>, InitError> {
        match Resolution::of(inject, bean, target)? {
            Some(Resolution::Value(expression)) => {
                self.factory.resolve_value(bean, expression, ty).map(Some)
            }
            Some(Resolution::Dependency { name, required }) => {
                match self.factory.find_dependency(bean, target, name, required, ty)? {
                    Some(dependency) => {
                        let instance = self.factory.get_instance(&dependency)?;
                        Ok(Some(Argument::Bean(instance)))
                    }
                    None => Ok(None),
                }
            }
            None => Ok(None),
        }
    }
}
