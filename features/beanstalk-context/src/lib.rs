//! Beanstalk Context creates and wires the beans of an application.
//!
//! Classes are described once in a [Catalog] of [ClassMeta] tables: their markers,
//! constructor, methods, fields and parent. Starting from an entry class the context:
//!
//! 1. Scans for candidate classes ([ModuleScanner] by default)
//! 2. Builds a [BeanDefinition] per component and per `Bean` method of configuration classes
//! 3. Constructs configuration beans, then [BeanPostProcessor]s, then everything else,
//!    resolving constructor dependencies depth first and failing on cycles
//! 4. Injects marked fields and setters, on the original object of proxied beans
//! 5. Invokes init hooks
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use beanstalk_context::{Catalog, ClassMeta, ConstructorMeta, ContextBuilder, Marker, ParamMeta};
//!
//! pub struct Repo;
//! pub struct Service {
//!     repo: Arc<Repo>,
//! }
//!
//! let catalog = Catalog::new()
//!     .with(vec![
//!         ClassMeta::builder::<Repo>()
//!             .marker(Marker::component(""))
//!             .constructor(ConstructorMeta::new(|_| Ok(Repo)))
//!             .build(),
//!         ClassMeta::builder::<Service>()
//!             .marker(Marker::component(""))
//!             .constructor(
//!                 ConstructorMeta::new(|args| Ok(Service { repo: args.get(0)? }))
//!                     .param(ParamMeta::of::<Repo>("repo").autowired()),
//!             )
//!             .build(),
//!     ])
//!     .unwrap();
//!
//! let context = ContextBuilder::new(catalog).build::<Repo>().unwrap();
//! let service = context.get_bean_by_type::<Service>().unwrap();
//! let repo = context.get_bean::<Repo>("repo").unwrap();
//! assert!(Arc::ptr_eq(&service.repo, &repo));
//! ```

pub mod builder;
pub mod container;
pub mod definition;
pub mod errors;
pub mod factory;
pub mod graph;
mod initiator;
mod injector;
mod lifecycle;
pub mod metadata;
pub mod post_processor;
pub mod registry;
pub mod resolver;
pub mod scan;
pub mod types;

pub use builder::ContextBuilder;
pub use container::ApplicationContext;
pub use definition::{BeanDefinition, Construction, LifecycleHook};
pub use errors::{ArgumentError, DefinitionError, InitError, RequireError};
pub use factory::BeanFactory;
pub use metadata::{
    Catalog, ClassMeta, ConstructorMeta, FieldMeta, InjectMarker, Marker, MarkerKind, MethodMeta,
    Modifiers, ParamMeta, TypeKind,
};
pub use post_processor::BeanPostProcessor;
pub use resolver::{Argument, Args, EmptyValues, FromArgument, PropertyValue, ValueResolver};
pub use scan::{ClassScanner, ModuleScanner};
pub use types::{AnyArc, DynError, Injectable, Instance, Shape, TypeInfo, TypeShape};
