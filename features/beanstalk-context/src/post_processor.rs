use crate::{factory::BeanFactory, types::{DynError, Instance}};

/// Hook into the creation of every bean constructed after this processor
///
/// Processors are beans themselves. They are created before all other components and
/// only apply to beans created after them, in `(order, name)` order.
///
/// To be recognised, the class must declare that it implements the trait:
/// ```ignore
/// ClassMeta::builder::<Tracer>()
///     .implements::<dyn BeanPostProcessor>(|tracer| tracer)
/// ```
pub trait BeanPostProcessor: Send + Sync {
    /// Called right after the bean was created
    ///
    /// Returning a different instance replaces the bean, e.g. with a proxy. Returning
    /// `None` aborts the start of the container. Other beans can be constructed on
    /// demand through `factory`.
    fn post_process_before_initialization(
        &self,
        bean: Instance,
        bean_name: &str,
        factory: &mut BeanFactory,
    ) -> Result<Option<Instance>, DynError> {
        let _ = (bean_name, factory);
        Ok(Some(bean))
    }

    /// Chooses the object properties of `bean` are injected into
    ///
    /// A processor which replaced a bean returns the original here, so injection
    /// lands on the object the replacement forwards to. If no processor answers with
    /// an object of the declared type, the instance as constructed is used.
    fn post_process_on_set_property(&self, bean: Instance, bean_name: &str) -> Instance {
        let _ = bean_name;
        bean
    }
}
