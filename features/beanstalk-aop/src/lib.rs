//! Beanstalk AOP replaces marked beans with proxies running an invocation handler
//! around each call.
//!
//! Rust has no runtime subclassing, so the proxy type is written by hand: it wraps
//! a [Proxied] and forwards every trait method through [Proxied::call]. A
//! [ProxyResolver] knows which proxy type belongs to which bean type, and an
//! [AnnotationProxyPostProcessor] swaps the beans during construction. Everything
//! depending on a proxied bean receives the proxy, while properties are still
//! injected into the original object.
//!
//! ```ignore
//! ClassMeta::builder::<Processors>()
//!     .marker(Marker::configuration(""))
//!     .method(MethodMeta::bean(
//!         "aroundProxyPostProcessor",
//!         AroundProxyPostProcessor::shape(),
//!         |_: &Processors, _| Ok(AroundProxyPostProcessor::new(proxies())),
//!     ))
//! ```

pub mod errors;
pub mod handler;
pub mod processor;
pub mod proxy;

pub use errors::AopError;
pub use handler::{AfterReturning, BeforeInvocation, Invocation, InvocationHandler};
pub use processor::{AnnotationProxyPostProcessor, Around, AroundProxyPostProcessor};
pub use proxy::{MethodMarkers, Proxied, ProxyFactory, ProxyResolver, ProxyTarget};
