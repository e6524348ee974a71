use std::collections::BTreeSet;

use tracing::debug;

use crate::{
    definition::{BeanDefinition, Construction, LifecycleHook},
    errors::DefinitionError,
    metadata::{
        catalog::method_bean_name, Catalog, ClassMeta, ConstructorMeta, Marker, MarkerKind,
        MethodMeta, Modifiers,
    },
    registry::Registry,
    types::TypeShape,
};

/// Turns the scanned class names into bean definitions
pub struct GraphBuilder<'c> {
    catalog: &'c Catalog,
}

impl<'c> GraphBuilder<'c> {
    pub fn new(catalog: &'c Catalog) -> Self {
        GraphBuilder { catalog }
    }

    /// Registers every component among `class_names` and the products of its `Bean` methods
    ///
    /// Fails on the first invalid class or duplicate bean name.
    pub fn build(&self, class_names: &BTreeSet<&'static str>) -> Result<Registry, DefinitionError> {
        let mut registry = Registry::new();

        for name in class_names {
            let class = self
                .catalog
                .get(name)
                .ok_or_else(|| DefinitionError::UnknownClass(name.to_string()))?;

            // Annotations, interfaces, enums and records only carry metadata
            if !class.kind.is_instantiable() {
                continue;
            }

            let component =
                self.catalog
                    .find_marker(&class.markers, MarkerKind::Component, class.name())?;
            if component.is_none() {
                continue;
            }
            debug!("Found component: {}", class.name());

            let bean_name = self.define_component(class, &mut registry)?;

            let configuration =
                self.catalog
                    .find_marker(&class.markers, MarkerKind::Configuration, class.name())?;
            if configuration.is_some() {
                self.define_factory_methods(&bean_name, class, &mut registry)?;
            }
        }

        Ok(registry)
    }

    fn define_component(
        &self,
        class: &ClassMeta,
        registry: &mut Registry,
    ) -> Result<String, DefinitionError> {
        if class.is_abstract() {
            return Err(DefinitionError::AbstractComponent(class.name()));
        }
        if !class.is_public() {
            return Err(DefinitionError::NonPublicComponent(class.name()));
        }

        let bean_name = self.catalog.bean_name(class)?;
        let constructor = suitable_constructor(class)?;
        let configuration = self
            .catalog
            .find_marker(&class.markers, MarkerKind::Configuration, class.name())?
            .is_some();

        let definition = BeanDefinition::new(
            bean_name.clone(),
            class.shape.clone(),
            Construction::Constructor(constructor),
        )
        .with_order(order(&class.markers))
        .with_primary(is_primary(&class.markers))
        .with_configuration(configuration)
        .with_hooks(
            find_hook(class, MarkerKind::PostConstruct, "@PostConstruct")?,
            find_hook(class, MarkerKind::PreDestroy, "@PreDestroy")?,
        );

        registry.insert(definition)?;
        Ok(bean_name)
    }

    fn define_factory_methods(
        &self,
        factory_bean: &str,
        class: &ClassMeta,
        registry: &mut Registry,
    ) -> Result<(), DefinitionError> {
        for method in class.methods_with(MarkerKind::Bean) {
            let shape = check_bean_method(class, method)?;

            let (init, destroy) = match method.markers.iter().find(|m| m.kind() == MarkerKind::Bean) {
                Some(Marker::Bean {
                    init_method,
                    destroy_method,
                    ..
                }) => (named_hook(init_method), named_hook(destroy_method)),
                _ => (LifecycleHook::None, LifecycleHook::None),
            };

            let definition = BeanDefinition::new(
                method_bean_name(method),
                shape,
                Construction::FactoryMethod {
                    factory_bean: factory_bean.to_string(),
                    method: method.clone(),
                },
            )
            .with_order(order(&method.markers))
            .with_primary(is_primary(&method.markers))
            .with_hooks(init, destroy);

            registry.insert(definition)?;
        }

        Ok(())
    }
}

/// The single public constructor, or the only constructor if none is public
fn suitable_constructor(class: &ClassMeta) -> Result<ConstructorMeta, DefinitionError> {
    let public: Vec<_> = class
        .constructors
        .iter()
        .filter(|constructor| constructor.is_public())
        .collect();

    match public.as_slice() {
        [constructor] => Ok((*constructor).clone()),
        [] => match class.constructors.as_slice() {
            [constructor] => Ok(constructor.clone()),
            [] => Err(DefinitionError::NoConstructor(class.name())),
            _ => Err(DefinitionError::MultipleConstructors(class.name())),
        },
        _ => Err(DefinitionError::MultiplePublicConstructors(class.name())),
    }
}

/// Validates a `Bean` method and returns the shape of its product
fn check_bean_method(
    class: &ClassMeta,
    method: &MethodMeta,
) -> Result<TypeShape, DefinitionError> {
    let invalid = |reason| DefinitionError::InvalidBeanMethod {
        class: class.name(),
        method: method.name,
        reason,
    };

    if method.modifiers.contains(Modifiers::ABSTRACT) {
        return Err(invalid("must not be abstract"));
    }
    if method.modifiers.contains(Modifiers::FINAL) {
        return Err(invalid("must not be final"));
    }
    if method.modifiers.contains(Modifiers::PRIVATE) {
        return Err(invalid("must not be private"));
    }

    match &method.returns {
        None => Err(invalid("must not return nothing")),
        Some(shape) if shape.info().is_primitive() => Err(invalid("must not return a primitive type")),
        Some(shape) => Ok(shape.clone()),
    }
}

/// The single zero argument method carrying `kind`
fn find_hook(
    class: &ClassMeta,
    kind: MarkerKind,
    marker: &'static str,
) -> Result<LifecycleHook, DefinitionError> {
    let hooks: Vec<_> = class.methods_with(kind).collect();
    for method in &hooks {
        if !method.params.is_empty() {
            return Err(DefinitionError::HookWithArguments {
                class: class.name(),
                method: method.name,
                marker,
            });
        }
    }

    let hook = match hooks.as_slice() {
        [] => return Ok(LifecycleHook::None),
        [hook] => *hook,
        _ => {
            return Err(DefinitionError::MultipleHooks {
                class: class.name(),
                marker,
            })
        }
    };

    Ok(LifecycleHook::Method(hook.clone()))
}

fn named_hook(name: &str) -> LifecycleHook {
    match name.is_empty() {
        true => LifecycleHook::None,
        false => LifecycleHook::Named(name.to_string()),
    }
}

fn order(markers: &[Marker]) -> i32 {
    markers
        .iter()
        .find_map(|marker| match marker {
            Marker::Order(order) => Some(*order),
            _ => None,
        })
        .unwrap_or(i32::MAX)
}

fn is_primary(markers: &[Marker]) -> bool {
    markers.iter().any(|marker| *marker == Marker::Primary)
}
