use std::{collections::HashSet, sync::Arc};

use crate::{
    definition::Construction,
    errors::{DefinitionError, InitError, RequireError},
    metadata::{Catalog, InjectMarkers},
    post_processor::BeanPostProcessor,
    registry::Registry,
    resolver::{Argument, Args, ValueResolver},
    types::{Instance, TypeInfo},
};

/// How a parameter or property gets its value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Resolution<'a> {
    Value(&'a str),
    Dependency { name: &'a str, required: bool },
}
impl<'a> Resolution<'a> {
    /// `None` if the target carries neither marker
    pub(crate) fn of(
        inject: &'a InjectMarkers,
        bean: &str,
        target: &str,
    ) -> Result<Option<Self>, DefinitionError> {
        match (inject.value(), inject.autowired()) {
            (Some(_), Some(_)) => Err(DefinitionError::BothMarkers {
                bean: bean.to_string(),
                target: target.to_string(),
            }),
            (Some(expression), None) => Ok(Some(Resolution::Value(expression))),
            (None, Some((name, required))) => Ok(Some(Resolution::Dependency { name, required })),
            (None, None) => Ok(None),
        }
    }
}

/// Creates bean instances from their definitions
///
/// Construction is depth first: dependencies without an instance are constructed on
/// demand, beans currently under construction are tracked to detect cycles.
pub struct BeanFactory {
    catalog: Catalog,
    registry: Registry,
    resolver: Arc<dyn ValueResolver>,
    post_processors: Vec<(String, Arc<dyn BeanPostProcessor>)>,
    creating: HashSet<String>,
}
impl std::fmt::Debug for BeanFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let processors: Vec<_> = self.post_processors.iter().map(|(name, _)| name).collect();
        f.debug_struct("BeanFactory")
            .field("registry", &self.registry)
            .field("post_processors", &processors)
            .field("creating", &self.creating)
            .finish()
    }
}

impl BeanFactory {
    pub fn new(catalog: Catalog, registry: Registry, resolver: Arc<dyn ValueResolver>) -> Self {
        BeanFactory {
            catalog,
            registry,
            resolver,
            post_processors: Vec::new(),
            creating: HashSet::new(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The active post processor chain, in the order it is applied
    pub fn post_processors(&self) -> impl DoubleEndedIterator<Item = &Arc<dyn BeanPostProcessor>> {
        self.post_processors.iter().map(|(_, processor)| processor)
    }

    /// Appends a processor to the chain
    ///
    /// It applies to every bean constructed afterwards, never to earlier ones.
    pub fn add_post_processor(&mut self, bean_name: &str, processor: Arc<dyn BeanPostProcessor>) {
        tracing::debug!("Add post processor '{bean_name}'");
        self.post_processors.push((bean_name.to_string(), processor));
    }

    /// The current instance of bean `name`, which may have been replaced by a post processor
    pub fn get_instance(&self, name: &str) -> Result<Instance, RequireError> {
        let definition = self
            .registry
            .get(name)
            .ok_or_else(|| RequireError::NameMissing(name.to_string()))?;
        definition.required_instance().cloned()
    }

    /// Returns the instance of bean `name`, constructing it first if it has none
    ///
    /// Calling this again for a bean which is still under construction is a
    /// circular dependency.
    pub fn construct_early_singleton(&mut self, name: &str) -> Result<Instance, InitError> {
        let definition = self
            .registry
            .get(name)
            .ok_or_else(|| RequireError::NameMissing(name.to_string()))?;
        if let Some(instance) = definition.instance() {
            return Ok(instance.clone());
        }

        tracing::debug!(
            "Try create bean '{name}' as early singleton: {}",
            definition.info()
        );
        if !self.creating.insert(name.to_string()) {
            return Err(InitError::CircularDependency(name.to_string()));
        }

        let instance = self.create(name)?;
        self.creating.remove(name);
        Ok(instance)
    }

    fn create(&mut self, name: &str) -> Result<Instance, InitError> {
        let definition = self
            .registry
            .get(name)
            .ok_or_else(|| RequireError::NameMissing(name.to_string()))?;
        let construction = definition.construction().clone();
        let configuration = definition.is_configuration();
        let post_processor = definition.is_post_processor();
        let shape = definition.shape().clone();

        // Resolve every parameter
        let mut arguments = Vec::with_capacity(construction.params().len());
        for param in construction.params() {
            let target = format!("parameter '{}'", param.name);
            let autowired = param.inject.autowired().is_some();
            if configuration && autowired {
                return Err(DefinitionError::AutowiredInConfiguration {
                    bean: name.to_string(),
                    target,
                }
                .into());
            }
            if post_processor && autowired {
                return Err(DefinitionError::AutowiredInPostProcessor {
                    bean: name.to_string(),
                    target,
                }
                .into());
            }

            let argument = match Resolution::of(&param.inject, name, &target)? {
                Some(Resolution::Value(expression)) => {
                    self.resolve_value(name, expression, param.info)?
                }
                Some(Resolution::Dependency {
                    name: dependency_name,
                    required,
                }) => {
                    match self.find_dependency(name, &target, dependency_name, required, param.info)? {
                        Some(dependency) => Argument::Bean(self.construct_early_singleton(&dependency)?),
                        None => Argument::Absent,
                    }
                }
                None => {
                    return Err(DefinitionError::MissingMarker {
                        bean: name.to_string(),
                        target,
                    }
                    .into())
                }
            };
            arguments.push(argument);
        }
        let mut args = Args::new(arguments);

        // Create the raw object
        let raw = match &construction {
            Construction::Constructor(constructor) => constructor
                .create(&mut args)
                .map_err(|error| InitError::creation(name, error))?,
            Construction::FactoryMethod {
                factory_bean,
                method,
            } => {
                let owner = self.construct_early_singleton(factory_bean)?;
                method
                    .invoke(&**owner.raw(), &mut args)
                    .map_err(|error| InitError::creation(name, error))?
                    .ok_or_else(|| {
                        InitError::creation(
                            name,
                            format!("factory method '{factory_bean}.{}' returned nothing", method.name),
                        )
                    })?
            }
        };
        let mut current = shape.instantiate(raw);
        self.set_instance(name, current.clone())?;

        // Run the chain, as it is right now
        let processors = self.post_processors.clone();
        for (processor_name, processor) in processors {
            let processed = processor
                .post_process_before_initialization(current.clone(), name, self)
                .map_err(|error| InitError::creation(name, error))?
                .ok_or_else(|| DefinitionError::PostProcessorReturnedNone {
                    bean: name.to_string(),
                    processor: processor_name.clone(),
                })?;

            if !processed.same(&current) {
                tracing::debug!("Bean '{name}' was replaced by post processor '{processor_name}'");
                current = processed;
                self.set_instance(name, current.clone())?;
            }
        }

        Ok(current)
    }

    fn set_instance(&mut self, name: &str, instance: Instance) -> Result<(), RequireError> {
        self.registry
            .get_mut(name)
            .ok_or_else(|| RequireError::NameMissing(name.to_string()))?
            .set_instance(instance);
        Ok(())
    }

    pub(crate) fn resolve_value(
        &self,
        bean: &str,
        expression: &str,
        target: TypeInfo,
    ) -> Result<Argument, InitError> {
        self.resolver
            .resolve_required(expression, target)
            .map(Argument::Value)
            .map_err(|source| InitError::Value {
                bean: bean.to_string(),
                expression: expression.to_string(),
                source,
            })
    }

    /// Name of the bean satisfying a dependency, `None` if it is optional and missing
    pub(crate) fn find_dependency(
        &self,
        bean: &str,
        target: &str,
        name: &str,
        required: bool,
        ty: TypeInfo,
    ) -> Result<Option<String>, InitError> {
        let found = self.registry.find(name, ty)?;
        match found {
            Some(definition) => Ok(Some(definition.name().to_string())),
            None if required => Err(InitError::UnsatisfiedDependency {
                bean: bean.to_string(),
                target: target.to_string(),
                dependency: ty.type_name,
            }),
            None => Ok(None),
        }
    }

    /// The object properties of bean `name` are injected into
    ///
    /// Asks the chain in reverse order, each processor seeing the result of the one after it.
    /// If the answer is not of the declared type, e.g. a proxy no processor redirected,
    /// the instance as constructed is used.
    pub fn injection_target(&self, name: &str) -> Result<Instance, RequireError> {
        let definition = self
            .registry
            .get(name)
            .ok_or_else(|| RequireError::NameMissing(name.to_string()))?;
        let mut target = definition.required_instance()?.clone();
        for (processor_name, processor) in self.post_processors.iter().rev() {
            let restored = processor.post_process_on_set_property(target.clone(), name);
            if !restored.same(&target) {
                tracing::debug!(
                    "Post processor '{processor_name}' redirected injection of '{name}' from {} to {}",
                    target.info().simple_name(),
                    restored.info().simple_name()
                );
                target = restored;
            }
        }

        let foreign = target.info().type_id != definition.info().type_id;
        match definition.original() {
            Some(original) if foreign && !original.same(&target) => {
                tracing::debug!(
                    "Inject '{name}' into the constructed {} instead of {}",
                    original.info().simple_name(),
                    target.info().simple_name()
                );
                Ok(original.clone())
            }
            _ => Ok(target),
        }
    }
}
