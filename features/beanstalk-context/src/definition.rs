use std::{any::TypeId, cmp::Ordering};

use crate::{
    errors::RequireError,
    metadata::{ConstructorMeta, MethodMeta, ParamMeta},
    post_processor::BeanPostProcessor,
    types::{Instance, TypeInfo, TypeShape},
};

/// How the instance of a bean is created
#[derive(Debug, Clone)]
pub enum Construction {
    Constructor(ConstructorMeta),
    /// A `Bean` method invoked on the instance of `factory_bean`
    FactoryMethod {
        factory_bean: String,
        method: MethodMeta,
    },
}
impl Construction {
    pub fn params(&self) -> &[ParamMeta] {
        match self {
            Construction::Constructor(constructor) => &constructor.params,
            Construction::FactoryMethod { method, .. } => &method.params,
        }
    }
}

/// An init or destroy hook
#[derive(Debug, Clone, Default)]
pub enum LifecycleHook {
    #[default]
    None,
    /// Marked method of a component class
    Method(MethodMeta),
    /// Method name given on a `Bean` marker, looked up on the runtime type
    Named(String),
}

/// Describes one bean and holds its instance once created
#[derive(Debug, Clone)]
pub struct BeanDefinition {
    name: String,
    shape: TypeShape,
    instance: Option<Instance>,
    /// The instance as constructed, before any post processor replaced it
    original: Option<Instance>,
    construction: Construction,
    order: i32,
    primary: bool,
    configuration: bool,
    init: LifecycleHook,
    destroy: LifecycleHook,
}

impl BeanDefinition {
    pub fn new(name: String, shape: TypeShape, construction: Construction) -> Self {
        BeanDefinition {
            name,
            shape,
            instance: None,
            original: None,
            construction,
            order: i32::MAX,
            primary: false,
            configuration: false,
            init: LifecycleHook::None,
            destroy: LifecycleHook::None,
        }
    }

    pub(crate) fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub(crate) fn with_primary(mut self, primary: bool) -> Self {
        self.primary = primary;
        self
    }

    pub(crate) fn with_configuration(mut self, configuration: bool) -> Self {
        self.configuration = configuration;
        self
    }

    pub(crate) fn with_hooks(mut self, init: LifecycleHook, destroy: LifecycleHook) -> Self {
        self.init = init;
        self.destroy = destroy;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared type used for lookups by type
    pub fn info(&self) -> TypeInfo {
        self.shape.info()
    }

    pub fn shape(&self) -> &TypeShape {
        &self.shape
    }

    pub fn is_assignable_to(&self, type_id: TypeId) -> bool {
        self.shape.is_assignable_to(type_id)
    }

    pub fn instance(&self) -> Option<&Instance> {
        self.instance.as_ref()
    }

    pub fn required_instance(&self) -> Result<&Instance, RequireError> {
        self.instance
            .as_ref()
            .ok_or_else(|| RequireError::InstanceMissing(self.name.clone()))
    }

    /// The object the constructor or factory method returned
    pub fn original(&self) -> Option<&Instance> {
        self.original.as_ref()
    }

    pub(crate) fn set_instance(&mut self, instance: Instance) {
        if self.original.is_none() {
            self.original = Some(instance.clone());
        }
        self.instance = Some(instance);
    }

    pub fn construction(&self) -> &Construction {
        &self.construction
    }

    pub fn order(&self) -> i32 {
        self.order
    }

    pub fn is_primary(&self) -> bool {
        self.primary
    }

    /// Declared by a class carrying the `Configuration` marker
    pub fn is_configuration(&self) -> bool {
        self.configuration
    }

    pub fn is_post_processor(&self) -> bool {
        self.is_assignable_to(TypeId::of::<dyn BeanPostProcessor>())
    }

    pub fn init_hook(&self) -> &LifecycleHook {
        &self.init
    }

    pub fn destroy_hook(&self) -> &LifecycleHook {
        &self.destroy
    }

    /// Ordering by `order`, then by name
    pub fn cmp_order(&self, other: &BeanDefinition) -> Ordering {
        self.order
            .cmp(&other.order)
            .then_with(|| self.name.cmp(&other.name))
    }
}

impl std::fmt::Display for BeanDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let order = match self.order {
            i32::MAX => "none".to_string(),
            order => order.to_string(),
        };
        let construction = match &self.construction {
            Construction::Constructor(_) => "constructor".to_string(),
            Construction::FactoryMethod {
                factory_bean,
                method,
            } => format!("{factory_bean}.{}", method.name),
        };

        write!(
            f,
            "BeanDefinition [name={}, type={}, created by {construction}, order={order}, primary={}, instance={}]",
            self.name,
            self.info(),
            self.primary,
            self.instance.is_some(),
        )
    }
}
