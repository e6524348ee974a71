//! Explicit metadata tables describing bean classes
//!
//! Rust has no runtime reflection, so everything the container needs to know about a
//! class - its markers, constructor, methods, fields and ancestors - is declared once
//! in a [ClassMeta] and registered in a [Catalog].

use std::any::TypeId;

use bitflags::bitflags;

use crate::types::TypeInfo;

pub mod catalog;
pub mod class;
pub mod member;

pub use catalog::Catalog;
pub use class::{ClassBuilder, ClassMeta, Superclass};
pub use member::{ConstructorMeta, FieldMeta, MethodMeta, ParamMeta};

bitflags! {
    /// Declared modifiers of a class or member
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const PUBLIC = 1;
        const PRIVATE = 1 << 1;
        const ABSTRACT = 1 << 2;
        const STATIC = 1 << 3;
        const FINAL = 1 << 4;
    }
}
impl Default for Modifiers {
    fn default() -> Self {
        Modifiers::PUBLIC
    }
}

/// What kind of declaration a catalog entry is
///
/// Only [TypeKind::Class] entries can become beans, the others only carry metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeKind {
    #[default]
    Class,
    Interface,
    Annotation,
    Enum,
    Record,
}
impl TypeKind {
    pub fn is_instantiable(self) -> bool {
        matches!(self, TypeKind::Class)
    }
}

/// Declarative marker attached to a class or method
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    /// Registers the class as a bean, optionally with an explicit name
    Component { name: String },
    /// A component whose `Bean` methods produce further beans
    Configuration { name: String },
    Primary,
    Order(i32),
    /// Packages (module paths) to scan, relative to nothing - full paths
    ComponentScan(Vec<String>),
    /// Classes to register even though they are outside the scanned packages
    Import(Vec<TypeInfo>),
    /// Marks a factory method on a configuration class
    Bean {
        name: String,
        init_method: String,
        destroy_method: String,
    },
    PostConstruct,
    PreDestroy,
    /// Usage of a user declared marker type, whose own markers are looked up in the catalog
    Annotation { ty: TypeInfo, value: String },
}

impl Marker {
    pub fn component(name: impl Into<String>) -> Self {
        Marker::Component { name: name.into() }
    }

    pub fn configuration(name: impl Into<String>) -> Self {
        Marker::Configuration { name: name.into() }
    }

    pub fn bean(name: impl Into<String>) -> Self {
        Marker::Bean {
            name: name.into(),
            init_method: String::new(),
            destroy_method: String::new(),
        }
    }

    pub fn bean_with_hooks(
        name: impl Into<String>,
        init_method: impl Into<String>,
        destroy_method: impl Into<String>,
    ) -> Self {
        Marker::Bean {
            name: name.into(),
            init_method: init_method.into(),
            destroy_method: destroy_method.into(),
        }
    }

    pub fn annotation<A: 'static>(value: impl Into<String>) -> Self {
        Marker::Annotation {
            ty: TypeInfo::of::<A>(),
            value: value.into(),
        }
    }

    pub fn scan<S: Into<String>>(packages: impl IntoIterator<Item = S>) -> Self {
        Marker::ComponentScan(packages.into_iter().map(Into::into).collect())
    }

    pub fn kind(&self) -> MarkerKind {
        match self {
            Marker::Component { .. } => MarkerKind::Component,
            Marker::Configuration { .. } => MarkerKind::Configuration,
            Marker::Primary => MarkerKind::Primary,
            Marker::Order(_) => MarkerKind::Order,
            Marker::ComponentScan(_) => MarkerKind::ComponentScan,
            Marker::Import(_) => MarkerKind::Import,
            Marker::Bean { .. } => MarkerKind::Bean,
            Marker::PostConstruct => MarkerKind::PostConstruct,
            Marker::PreDestroy => MarkerKind::PreDestroy,
            Marker::Annotation { ty, .. } => MarkerKind::Annotation(ty.type_id),
        }
    }

    /// The value given on this usage of the marker, if it carries one
    pub fn value(&self) -> Option<&str> {
        match self {
            Marker::Component { name }
            | Marker::Configuration { name }
            | Marker::Bean { name, .. } => Some(name),
            Marker::Annotation { value, .. } => Some(value),
            _ => None,
        }
    }
}

/// Discriminant of a [Marker], used for queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    Component,
    Configuration,
    Primary,
    Order,
    ComponentScan,
    Import,
    Bean,
    PostConstruct,
    PreDestroy,
    Annotation(TypeId),
}
impl std::fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarkerKind::Annotation(type_id) => write!(f, "@{type_id:?}"),
            other => write!(f, "@{other:?}"),
        }
    }
}

/// Injection marker on a parameter, field or setter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectMarker {
    /// Resolved through the value resolver, e.g. `${server.port:8080}`
    Value(String),
    /// Resolved by type, narrowed by name if one is given
    Autowired { name: String, required: bool },
}

/// The injection markers of one target
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InjectMarkers(Vec<InjectMarker>);

impl InjectMarkers {
    pub fn push(&mut self, marker: InjectMarker) {
        self.0.push(marker);
    }

    pub fn value(&self) -> Option<&str> {
        self.0.iter().find_map(|marker| match marker {
            InjectMarker::Value(expression) => Some(expression.as_str()),
            _ => None,
        })
    }

    /// Returns the (name, required) of the autowired marker
    pub fn autowired(&self) -> Option<(&str, bool)> {
        self.0.iter().find_map(|marker| match marker {
            InjectMarker::Autowired { name, required } => Some((name.as_str(), *required)),
            _ => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn set_autowired_name(&mut self, bean: &str) {
        match self.autowired_mut() {
            Some((name, _)) => *name = bean.to_string(),
            None => self.0.push(InjectMarker::Autowired {
                name: bean.to_string(),
                required: true,
            }),
        }
    }

    pub(crate) fn set_optional(&mut self) {
        match self.autowired_mut() {
            Some((_, required)) => *required = false,
            None => self.0.push(InjectMarker::Autowired {
                name: String::new(),
                required: false,
            }),
        }
    }

    fn autowired_mut(&mut self) -> Option<(&mut String, &mut bool)> {
        self.0.iter_mut().find_map(|marker| match marker {
            InjectMarker::Autowired { name, required } => Some((name, required)),
            _ => None,
        })
    }
}

/// Builder methods shared by everything that carries [InjectMarkers]
macro_rules! inject_marker_methods {
    () => {
        /// Resolve through the value resolver
        pub fn value(mut self, expression: impl Into<String>) -> Self {
            self.inject
                .push($crate::metadata::InjectMarker::Value(expression.into()));
            self
        }

        /// Resolve by type
        pub fn autowired(mut self) -> Self {
            self.inject.push($crate::metadata::InjectMarker::Autowired {
                name: String::new(),
                required: true,
            });
            self
        }

        /// Resolve by name, the bean must still match the type
        pub fn named(mut self, bean: &str) -> Self {
            self.inject.set_autowired_name(bean);
            self
        }

        /// Don't fail if no bean matches
        pub fn optional(mut self) -> Self {
            self.inject.set_optional();
            self
        }
    };
}
pub(crate) use inject_marker_methods;
