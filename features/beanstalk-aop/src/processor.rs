use std::{
    any::TypeId,
    collections::HashMap,
    marker::PhantomData,
    sync::{Arc, Mutex},
};

use beanstalk_context::{
    BeanFactory, BeanPostProcessor, DynError, Instance, MarkerKind, Shape, TypeInfo,
};
use tracing::debug;

use crate::{
    errors::AopError,
    handler::InvocationHandler,
    proxy::{ProxyFactory, ProxyTarget},
};

/// Marker type for beans whose calls run through the handler bean named by the marker
///
/// ```ignore
/// ClassMeta::builder::<OriginBean>()
///     .marker(Marker::component(""))
///     .marker(Marker::annotation::<Around>("aroundInvocationHandler"))
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Around;

/// Proxies every bean marked with `Around`
pub type AroundProxyPostProcessor = AnnotationProxyPostProcessor<Around>;

/// Replaces beans carrying the marker type `A` with proxies
///
/// The marker value names the handler bean, which is constructed on demand. The
/// original object is remembered, so properties are injected into it and not into
/// the proxy.
pub struct AnnotationProxyPostProcessor<A> {
    proxies: Arc<dyn ProxyFactory>,
    originals: Mutex<HashMap<String, Instance>>,
    _marker: PhantomData<fn() -> A>,
}

impl<A: 'static> AnnotationProxyPostProcessor<A> {
    pub fn new(proxies: impl ProxyFactory + 'static) -> Self {
        AnnotationProxyPostProcessor {
            proxies: Arc::new(proxies),
            originals: Mutex::new(HashMap::new()),
            _marker: PhantomData,
        }
    }

    /// Shape to declare the processor with, e.g. as the product of a `Bean` method
    pub fn shape() -> Shape<Self> {
        Shape::<Self>::of().implements::<dyn BeanPostProcessor>(|processor| processor)
    }

    fn marker_name() -> String {
        format!("@{}", TypeInfo::of::<A>().simple_name())
    }

    /// Name of the handler if the bean's class carries the marker
    fn handler_name(
        &self,
        bean: &Instance,
        bean_name: &str,
        factory: &BeanFactory,
    ) -> Result<Option<String>, DynError> {
        let Some(class) = factory.catalog().by_type(bean.info().type_id) else {
            return Ok(None);
        };

        let kind = MarkerKind::Annotation(TypeId::of::<A>());
        let Some(marker) = factory
            .catalog()
            .find_marker(&class.markers, kind, class.name())?
        else {
            return Ok(None);
        };

        match marker.value() {
            Some(handler) if !handler.is_empty() => Ok(Some(handler.to_string())),
            _ => Err(AopError::MissingHandlerName {
                marker: Self::marker_name(),
                bean: bean_name.to_string(),
            }
            .into()),
        }
    }

    fn handler(
        &self,
        handler_name: &str,
        factory: &mut BeanFactory,
    ) -> Result<Arc<dyn InvocationHandler>, DynError> {
        if !factory.registry().contains(handler_name) {
            return Err(AopError::HandlerNotFound {
                marker: Self::marker_name(),
                handler: handler_name.to_string(),
            }
            .into());
        }

        let handler = factory.construct_early_singleton(handler_name)?;
        handler
            .view::<dyn InvocationHandler>()
            .ok_or_else(|| {
                AopError::NotAHandler {
                    marker: Self::marker_name(),
                    handler: handler_name.to_string(),
                }
                .into()
            })
    }
}

impl<A: 'static> BeanPostProcessor for AnnotationProxyPostProcessor<A> {
    fn post_process_before_initialization(
        &self,
        bean: Instance,
        bean_name: &str,
        factory: &mut BeanFactory,
    ) -> Result<Option<Instance>, DynError> {
        let Some(handler_name) = self.handler_name(&bean, bean_name, factory)? else {
            return Ok(Some(bean));
        };

        let methods = factory
            .catalog()
            .by_type(bean.info().type_id)
            .map(|class| ProxyTarget::method_markers(&class.methods))
            .unwrap_or_default();
        let handler = self.handler(&handler_name, factory)?;

        debug!("Proxy bean '{bean_name}' with handler '{handler_name}'");
        let proxy = self.proxies.wrap(ProxyTarget {
            bean: bean_name.to_string(),
            original: bean.clone(),
            methods: Arc::new(methods),
            handler,
        })?;

        self.originals
            .lock()
            .map_err(|_| "proxy originals poisoned")?
            .insert(bean_name.to_string(), bean);
        Ok(Some(proxy))
    }

    fn post_process_on_set_property(&self, bean: Instance, bean_name: &str) -> Instance {
        let original = match self.originals.lock() {
            Ok(originals) => originals.get(bean_name).cloned(),
            Err(_) => None,
        };
        original.unwrap_or(bean)
    }
}
