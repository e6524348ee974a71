use beanstalk_context::{ApplicationContext, Catalog, ClassMeta, ContextBuilder, InitError, ValueResolver};

/// Starts a context from `Entry` over `classes`
pub fn start<Entry: 'static>(
    classes: Vec<ClassMeta>,
    resolver: impl ValueResolver + 'static,
) -> Result<ApplicationContext, InitError> {
    let catalog = Catalog::new().with(classes)?;
    ContextBuilder::new(catalog)
        .with_resolver(resolver)
        .build::<Entry>()
}
