use std::sync::Arc;

use crate::{
    container::ApplicationContext,
    errors::InitError,
    initiator::Initiator,
    metadata::Catalog,
    resolver::{EmptyValues, ValueResolver},
    scan::{ClassScanner, ModuleScanner},
    types::TypeInfo,
};

/// Collects everything needed to start an [ApplicationContext]
///
/// ```ignore
/// let context = ContextBuilder::new(catalog)
///     .with_resolver(properties)
///     .build::<Application>()?;
/// ```
pub struct ContextBuilder {
    catalog: Catalog,
    resolver: Arc<dyn ValueResolver>,
    scanner: Box<dyn ClassScanner>,
}

impl ContextBuilder {
    pub fn new(catalog: Catalog) -> Self {
        ContextBuilder {
            catalog,
            resolver: Arc::new(EmptyValues),
            scanner: Box::new(ModuleScanner),
        }
    }

    pub fn with_resolver(mut self, resolver: impl ValueResolver + 'static) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    pub fn with_scanner(mut self, scanner: impl ClassScanner + 'static) -> Self {
        self.scanner = Box::new(scanner);
        self
    }

    /// Scans from `Entry`, creates and wires all beans
    pub fn build<Entry: 'static>(self) -> Result<ApplicationContext, InitError> {
        self.build_from(TypeInfo::of::<Entry>())
    }

    pub fn build_from(self, root: TypeInfo) -> Result<ApplicationContext, InitError> {
        Initiator::new(self.catalog, self.resolver, self.scanner).initiate(root)
    }
}
