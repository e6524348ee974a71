//! Beanstalk Config provides the application properties injected through `value` markers.
//!
//! Beanstalk Config is split into three parts:
//! 1. PropertyResolver: holds the properties from maps, the environment and TOML documents,
//!    and resolves `${key}` / `${key:default}` expressions
//! 2. Converters: turn property strings into typed values
//! 3. Errors: for lookup and conversion errors
//!
//! The resolver plugs into the container as its value resolver:
//!
//! ```rust
//! use beanstalk_config::PropertyResolver;
//! use beanstalk_context::{Catalog, ClassMeta, ConstructorMeta, ContextBuilder, Marker, ParamMeta};
//!
//! pub struct Server {
//!     port: u16,
//! }
//!
//! let catalog = Catalog::new()
//!     .with(vec![ClassMeta::builder::<Server>()
//!         .marker(Marker::component(""))
//!         .constructor(
//!             ConstructorMeta::new(|args| Ok(Server { port: args.value(0)? }))
//!                 .param(ParamMeta::of::<u16>("port").value("${server.port:8080}")),
//!         )
//!         .build()])
//!     .unwrap();
//!
//! let properties = PropertyResolver::from_toml_str("server.port = 9000").unwrap();
//! let context = ContextBuilder::new(catalog)
//!     .with_resolver(properties)
//!     .build::<Server>()
//!     .unwrap();
//!
//! assert_eq!(context.get_bean::<Server>("server").unwrap().port, 9000);
//! ```

pub mod convert;
pub mod errors;
pub mod expr;
pub mod resolver;

pub use convert::Converters;
pub use errors::PropertyError;
pub use expr::PropertyExpr;
pub use resolver::PropertyResolver;
