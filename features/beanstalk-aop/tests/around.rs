use std::{
    any::Any,
    sync::{Arc, OnceLock},
};

use beanstalk_aop::{
    AopError, Around, AroundProxyPostProcessor, Invocation, InvocationHandler, Proxied,
    ProxyResolver,
};
use beanstalk_config::PropertyResolver;
use beanstalk_context::{
    ApplicationContext, Catalog, ClassMeta, ConstructorMeta, ContextBuilder, FieldMeta, InitError,
    Instance, Marker, MethodMeta, ParamMeta,
};
use pretty_assertions::assert_eq;

pub struct Application;

/// Methods whose greeting should end politely
pub struct Polite;

pub trait Greeter: Send + Sync {
    fn hello(&self) -> String;
    fn morning(&self) -> String;
}

#[derive(Default)]
pub struct OriginBean {
    name: OnceLock<String>,
}
impl OriginBean {
    fn name(&self) -> &str {
        self.name.get().map(String::as_str).unwrap_or("nobody")
    }
}
impl Greeter for OriginBean {
    fn hello(&self) -> String {
        format!("Hello, {}.", self.name())
    }

    fn morning(&self) -> String {
        format!("Morning, {}.", self.name())
    }
}

pub struct OriginProxy(Proxied<OriginBean>);
impl Greeter for OriginProxy {
    fn hello(&self) -> String {
        self.0.call("hello", |origin| origin.hello())
    }

    fn morning(&self) -> String {
        self.0.call("morning", |origin| origin.morning())
    }
}

pub struct OtherBean {
    origin: Arc<dyn Greeter>,
}

/// Replaces the trailing dot of polite methods
pub struct PoliteHandler;
impl InvocationHandler for PoliteHandler {
    fn after(&self, invocation: &Invocation<'_>, returned: &mut dyn Any) {
        if !invocation.is_marked::<Polite>() {
            return;
        }
        if let Some(greeting) = returned.downcast_mut::<String>() {
            if greeting.ends_with('.') {
                greeting.pop();
                greeting.push('!');
            }
        }
    }
}

pub struct Clock;

pub struct AopConfiguration;

fn proxies() -> ProxyResolver {
    ProxyResolver::new().register(|proxied: Proxied<OriginBean>| {
        let proxy = Arc::new(OriginProxy(proxied));
        Instance::builder(proxy.clone()).view::<dyn Greeter>(proxy).build()
    })
}

fn catalog(handler: &str) -> Catalog {
    Catalog::new()
        .with(vec![
            ClassMeta::builder::<Application>().build(),
            ClassMeta::builder::<OriginBean>()
                .marker(Marker::component(""))
                .marker(Marker::annotation::<Around>(handler))
                .implements::<dyn Greeter>(|origin| origin)
                .constructor(ConstructorMeta::new(|_| Ok(OriginBean::default())))
                .field(
                    FieldMeta::property("name", |origin: &OriginBean, name: String| {
                        let _ = origin.name.set(name);
                    })
                    .value("${customer.name}"),
                )
                .method(
                    MethodMeta::action("hello", |_: &OriginBean, _| Ok(()))
                        .marker(Marker::annotation::<Polite>("")),
                )
                .method(MethodMeta::action("morning", |_: &OriginBean, _| Ok(())))
                .build(),
            ClassMeta::builder::<OtherBean>()
                .marker(Marker::component(""))
                .marker(Marker::Order(0))
                .constructor(
                    ConstructorMeta::new(|args| Ok(OtherBean { origin: args.get(0)? }))
                        .param(ParamMeta::of::<dyn Greeter>("origin").autowired()),
                )
                .build(),
            ClassMeta::builder::<PoliteHandler>()
                .marker(Marker::component(""))
                .implements::<dyn InvocationHandler>(|handler| handler)
                .constructor(ConstructorMeta::new(|_| Ok(PoliteHandler)))
                .build(),
            ClassMeta::builder::<Clock>()
                .marker(Marker::component(""))
                .constructor(ConstructorMeta::new(|_| Ok(Clock)))
                .build(),
            ClassMeta::builder::<AopConfiguration>()
                .marker(Marker::configuration(""))
                .constructor(ConstructorMeta::new(|_| Ok(AopConfiguration)))
                .method(MethodMeta::bean(
                    "aroundProxyPostProcessor",
                    AroundProxyPostProcessor::shape(),
                    |_: &AopConfiguration, _| Ok(AroundProxyPostProcessor::new(proxies())),
                ))
                .build(),
        ])
        .unwrap()
}

fn start(handler: &str) -> Result<ApplicationContext, InitError> {
    let properties = PropertyResolver::new().with_property("customer.name", "Bob");
    ContextBuilder::new(catalog(handler))
        .with_resolver(properties)
        .build::<Application>()
}

fn aop_error(err: InitError) -> (String, AopError) {
    match err {
        InitError::Creation { bean, source } => match source.downcast::<AopError>() {
            Ok(aop) => (bean, *aop),
            Err(other) => panic!("unexpected source: {other}"),
        },
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn marked_beans_are_proxied() {
    let context = start("politeHandler").unwrap();

    let origin = context.get_bean::<dyn Greeter>("originBean").unwrap();
    assert!(context.get_bean::<OriginProxy>("originBean").is_ok());
    assert_eq!(origin.hello(), "Hello, Bob!");
    assert_eq!(origin.morning(), "Morning, Bob.");
}

#[test]
fn dependents_receive_the_proxy() {
    let context = start("politeHandler").unwrap();

    let other = context.get_bean::<OtherBean>("otherBean").unwrap();
    let origin = context.get_bean::<dyn Greeter>("originBean").unwrap();
    assert!(Arc::ptr_eq(&other.origin, &origin));
    assert_eq!(other.origin.hello(), "Hello, Bob!");
}

#[test]
fn properties_are_injected_into_the_original() {
    let context = start("politeHandler").unwrap();

    let target = context.factory().injection_target("originBean").unwrap();
    let original = target.view::<OriginBean>().unwrap();
    assert_eq!(original.name.get().map(String::as_str), Some("Bob"));
    // Calls on the original bypass the handler
    assert_eq!(original.hello(), "Hello, Bob.");
}

#[test]
fn the_handler_must_exist() {
    let (bean, err) = aop_error(start("rudeHandler").unwrap_err());
    assert_eq!(bean, "originBean");
    match err {
        AopError::HandlerNotFound { marker, handler } => {
            assert_eq!(marker, "@Around");
            assert_eq!(handler, "rudeHandler");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn the_handler_must_handle_invocations() {
    let (bean, err) = aop_error(start("clock").unwrap_err());
    assert_eq!(bean, "originBean");
    assert!(matches!(err, AopError::NotAHandler { handler, .. } if handler == "clock"));
}

#[test]
fn the_handler_must_be_named() {
    let (bean, err) = aop_error(start("").unwrap_err());
    assert_eq!(bean, "originBean");
    assert!(matches!(err, AopError::MissingHandlerName { bean, .. } if bean == "originBean"));
}
