use std::{any::Any, marker::PhantomData, sync::Arc};

use crate::{
    metadata::{
        ConstructorMeta, FieldMeta, Marker, MarkerKind, MethodMeta, Modifiers, TypeKind,
    },
    types::{Injectable, Shape, TypeInfo, TypeShape},
};

type Projection = Arc<
    dyn for<'a> Fn(&'a (dyn Any + Send + Sync)) -> Option<&'a (dyn Any + Send + Sync)>
        + Send
        + Sync,
>;

/// Pins the higher ranked signature of a projection closure
fn projection<F>(project: F) -> F
where
    F: for<'a> Fn(&'a (dyn Any + Send + Sync)) -> Option<&'a (dyn Any + Send + Sync)>,
{
    project
}

/// The parent part of a class
///
/// Rust composes instead of inheriting, so a child exposes its parent by projecting
/// to the embedded parent value. The parent's members are injected through it.
#[derive(Clone)]
pub struct Superclass {
    pub info: TypeInfo,
    project: Projection,
}
impl std::fmt::Debug for Superclass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Superclass").field(&self.info.type_name).finish()
    }
}
impl Superclass {
    /// The embedded parent of `child`, `None` if `child` is not of the declaring type
    pub fn project<'a>(&self, child: &'a (dyn Any + Send + Sync)) -> Option<&'a (dyn Any + Send + Sync)> {
        (self.project)(child)
    }
}

/// Everything known about one declared type
#[derive(Debug, Clone)]
pub struct ClassMeta {
    pub shape: TypeShape,
    pub kind: TypeKind,
    pub modifiers: Modifiers,
    pub markers: Vec<Marker>,
    pub constructors: Vec<ConstructorMeta>,
    pub methods: Vec<MethodMeta>,
    pub fields: Vec<FieldMeta>,
    pub superclass: Option<Superclass>,
}

impl ClassMeta {
    pub fn builder<C: Injectable>() -> ClassBuilder<C> {
        ClassBuilder {
            shape: Shape::of(),
            kind: TypeKind::Class,
            modifiers: Modifiers::default(),
            markers: Vec::new(),
            constructors: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
            superclass: None,
            _marker: PhantomData,
        }
    }

    /// A user declared marker type, e.g. one carrying `Component` so its usages register beans
    pub fn annotation<A: Injectable>() -> ClassBuilder<A> {
        Self::builder::<A>().kind(TypeKind::Annotation)
    }

    pub fn info(&self) -> TypeInfo {
        self.shape.info()
    }

    /// Fully qualified name
    pub fn name(&self) -> &'static str {
        self.shape.info().type_name
    }

    pub fn is_abstract(&self) -> bool {
        self.modifiers.contains(Modifiers::ABSTRACT)
    }

    pub fn is_public(&self) -> bool {
        self.modifiers.contains(Modifiers::PUBLIC)
    }

    /// Methods carrying a marker of `kind` directly
    pub fn methods_with(&self, kind: MarkerKind) -> impl Iterator<Item = &MethodMeta> {
        self.methods.iter().filter(move |method| method.has_marker(kind))
    }

    pub fn method(&self, name: &str) -> Option<&MethodMeta> {
        self.methods.iter().find(|method| method.name == name)
    }
}

pub struct ClassBuilder<C> {
    shape: Shape<C>,
    kind: TypeKind,
    modifiers: Modifiers,
    markers: Vec<Marker>,
    constructors: Vec<ConstructorMeta>,
    methods: Vec<MethodMeta>,
    fields: Vec<FieldMeta>,
    superclass: Option<Superclass>,
    _marker: PhantomData<fn() -> C>,
}

impl<C: Injectable> ClassBuilder<C> {
    pub fn marker(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }

    pub fn modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn kind(mut self, kind: TypeKind) -> Self {
        self.kind = kind;
        self
    }

    /// See [Shape::implements]
    pub fn implements<R: ?Sized + Send + Sync + 'static>(mut self, cast: fn(Arc<C>) -> Arc<R>) -> Self {
        self.shape = self.shape.implements(cast);
        self
    }

    pub fn constructor(mut self, constructor: ConstructorMeta) -> Self {
        self.constructors.push(constructor);
        self
    }

    pub fn method(mut self, method: MethodMeta) -> Self {
        self.methods.push(method);
        self
    }

    pub fn field(mut self, field: FieldMeta) -> Self {
        self.fields.push(field);
        self
    }

    /// Declares `P` as parent, embedded in `C` and reached through `project`
    pub fn extends<P: Injectable>(mut self, project: fn(&C) -> &P) -> Self {
        let project = projection(move |child| {
            child
                .downcast_ref::<C>()
                .map(|child| project(child) as &(dyn Any + Send + Sync))
        });

        self.superclass = Some(Superclass {
            info: TypeInfo::of::<P>(),
            project: Arc::new(project),
        });
        self
    }

    /// Zero argument init hook
    pub fn post_construct<F>(self, name: &'static str, hook: F) -> Self
    where
        F: Fn(&C) -> Result<(), crate::types::DynError> + Send + Sync + 'static,
    {
        self.method(MethodMeta::action(name, move |bean: &C, _| hook(bean)).marker(Marker::PostConstruct))
    }

    /// Zero argument destroy hook
    pub fn pre_destroy<F>(self, name: &'static str, hook: F) -> Self
    where
        F: Fn(&C) -> Result<(), crate::types::DynError> + Send + Sync + 'static,
    {
        self.method(MethodMeta::action(name, move |bean: &C, _| hook(bean)).marker(Marker::PreDestroy))
    }

    pub fn build(self) -> ClassMeta {
        ClassMeta {
            shape: self.shape.erase(),
            kind: self.kind,
            modifiers: self.modifiers,
            markers: self.markers,
            constructors: self.constructors,
            methods: self.methods,
            fields: self.fields,
            superclass: self.superclass,
        }
    }
}
