use std::sync::Arc;

use crate::{
    container::ApplicationContext,
    errors::{DefinitionError, InitError},
    factory::BeanFactory,
    graph::GraphBuilder,
    injector::PropertyInjector,
    lifecycle::invoke_hook,
    metadata::Catalog,
    post_processor::BeanPostProcessor,
    resolver::ValueResolver,
    scan::ClassScanner,
    types::TypeInfo,
};

/// Initiates the ApplicationContext
///
/// Everything happens on the calling thread, the first error aborts the start.
pub(crate) struct Initiator {
    catalog: Catalog,
    resolver: Arc<dyn ValueResolver>,
    scanner: Box<dyn ClassScanner>,
}

impl Initiator {
    pub(crate) fn new(
        catalog: Catalog,
        resolver: Arc<dyn ValueResolver>,
        scanner: Box<dyn ClassScanner>,
    ) -> Self {
        Initiator {
            catalog,
            resolver,
            scanner,
        }
    }

    pub(crate) fn initiate(self, root: TypeInfo) -> Result<ApplicationContext, InitError> {
        let Initiator {
            catalog,
            resolver,
            scanner,
        } = self;

        let root_class = catalog
            .by_type(root.type_id)
            .ok_or_else(|| DefinitionError::UnknownClass(root.type_name.to_string()))?;
        let class_names = scanner.scan(&catalog, root_class)?;
        let registry = GraphBuilder::new(&catalog).build(&class_names)?;

        tracing::debug!(
            "Initializing application with {} classes and {} bean definitions",
            class_names.len(),
            registry.len()
        );

        let mut factory = BeanFactory::new(catalog, registry, resolver);

        // Configuration beans first, they only depend on values
        for name in factory.registry().sorted_names(|definition| definition.is_configuration()) {
            factory.construct_early_singleton(&name)?;
        }

        // Post processors, each one applies to all beans created after it
        for name in factory.registry().sorted_names(|definition| definition.is_post_processor()) {
            let instance = factory.construct_early_singleton(&name)?;
            let processor = instance
                .view::<dyn BeanPostProcessor>()
                .ok_or_else(|| {
                    InitError::creation(&name, "instance does not expose the post processor trait")
                })?;
            factory.add_post_processor(&name, processor);
        }

        // Everything else - dependencies may have been created on the way
        for name in factory
            .registry()
            .sorted_names(|definition| definition.instance().is_none())
        {
            factory.construct_early_singleton(&name)?;
        }

        let names = factory.registry().sorted_names(|_| true);
        for name in &names {
            if let Some(definition) = factory.registry().get(name) {
                tracing::debug!("Bean initialized: {definition}");
            }
        }

        // Field and setter injection
        let injector = PropertyInjector::new(&factory);
        for name in &names {
            injector.inject(name)?;
        }

        // Init hooks run on the object properties were injected into
        for definition in names.iter().filter_map(|name| factory.registry().get(name)) {
            let target = factory.injection_target(definition.name())?;
            invoke_hook(
                factory.catalog(),
                definition.name(),
                definition.init_hook(),
                &target,
            )?;
        }

        tracing::info!("Application context started with {} beans", factory.registry().len());
        Ok(ApplicationContext::new(factory))
    }
}
