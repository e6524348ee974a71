use std::{
    any::{type_name, TypeId},
    collections::HashMap,
    sync::Arc,
};

use beanstalk_context::{Injectable, Instance, Marker, MethodMeta, TypeInfo};

use crate::{
    errors::AopError,
    handler::{Invocation, InvocationHandler},
};

/// Markers of each method of the proxied class, by method name
pub type MethodMarkers = HashMap<&'static str, Vec<Marker>>;

/// Everything a proxy is built from
#[derive(Clone)]
pub struct ProxyTarget {
    pub bean: String,
    /// The object being replaced
    pub original: Instance,
    pub methods: Arc<MethodMarkers>,
    pub handler: Arc<dyn InvocationHandler>,
}

impl ProxyTarget {
    /// Collects the method markers of a class
    pub fn method_markers<'m>(methods: impl IntoIterator<Item = &'m MethodMeta>) -> MethodMarkers {
        methods
            .into_iter()
            .map(|method| (method.name, method.markers.clone()))
            .collect()
    }
}

/// The inside of a proxy: the original object and the handler around its calls
///
/// Proxy types wrap one of these and forward every method through [Proxied::call]:
/// ```ignore
/// pub struct GreeterProxy(Proxied<EnglishGreeter>);
/// impl Greeter for GreeterProxy {
///     fn hello(&self, name: &str) -> String {
///         self.0.call("hello", |greeter| greeter.hello(name))
///     }
/// }
/// ```
pub struct Proxied<T: ?Sized> {
    bean: String,
    info: TypeInfo,
    target: Arc<T>,
    methods: Arc<MethodMarkers>,
    handler: Arc<dyn InvocationHandler>,
}

impl<T: ?Sized + 'static> Proxied<T> {
    pub fn new(target: ProxyTarget) -> Result<Self, AopError> {
        let info = target.original.info();
        let object = target
            .original
            .view::<T>()
            .ok_or(AopError::TargetMismatch {
                expected: type_name::<T>(),
                actual: info,
            })?;

        Ok(Proxied {
            bean: target.bean,
            info,
            target: object,
            methods: target.methods,
            handler: target.handler,
        })
    }

    /// The original object, calls on it bypass the handler
    pub fn target(&self) -> &Arc<T> {
        &self.target
    }

    pub fn bean_name(&self) -> &str {
        &self.bean
    }

    /// Calls `method` on the original between the handler's `before` and `after`
    pub fn call<R: 'static>(&self, method: &str, call: impl FnOnce(&T) -> R) -> R {
        let markers = self.methods.get(method).map(Vec::as_slice).unwrap_or_default();
        let invocation = Invocation {
            bean: &self.bean,
            target: self.info,
            method,
            markers,
        };

        self.handler.before(&invocation);
        let mut returned = call(self.target.as_ref());
        self.handler.after(&invocation, &mut returned);
        returned
    }
}

/// Creates objects of the same shape as the original, routing calls through a handler
pub trait ProxyFactory: Send + Sync {
    fn wrap(&self, target: ProxyTarget) -> Result<Instance, AopError>;
}

type WrapFn = Arc<dyn Fn(ProxyTarget) -> Result<Instance, AopError> + Send + Sync>;

/// [ProxyFactory] over registered proxy types, chosen by the runtime type of the original
///
/// ```ignore
/// let proxies = ProxyResolver::new().register(|proxied: Proxied<EnglishGreeter>| {
///     let proxy = Arc::new(GreeterProxy(proxied));
///     Instance::builder(proxy.clone()).view::<dyn Greeter>(proxy).build()
/// });
/// ```
#[derive(Clone, Default)]
pub struct ProxyResolver {
    wrappers: HashMap<TypeId, (TypeInfo, WrapFn)>,
}
impl std::fmt::Debug for ProxyResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set()
            .entries(self.wrappers.values().map(|(info, _)| info.type_name))
            .finish()
    }
}

impl ProxyResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers how beans of runtime type `C` are proxied
    pub fn register<C, F>(mut self, wrap: F) -> Self
    where
        C: Injectable,
        F: Fn(Proxied<C>) -> Instance + Send + Sync + 'static,
    {
        let wrap: WrapFn = Arc::new(move |target: ProxyTarget| Ok(wrap(Proxied::new(target)?)));
        self.wrappers
            .insert(TypeId::of::<C>(), (TypeInfo::of::<C>(), wrap));
        self
    }

    pub fn supports(&self, type_id: TypeId) -> bool {
        self.wrappers.contains_key(&type_id)
    }
}

impl ProxyFactory for ProxyResolver {
    fn wrap(&self, target: ProxyTarget) -> Result<Instance, AopError> {
        let info = target.original.info();
        let (_, wrap) = self
            .wrappers
            .get(&info.type_id)
            .ok_or(AopError::NoProxyType(info))?;

        tracing::debug!("Create proxy for bean '{}' of type {info}", target.bean);
        wrap(target)
    }
}
