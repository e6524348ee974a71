use std::{
    any::{Any, TypeId},
    marker::PhantomData,
    sync::Arc,
};

/// All errors crossing user code must be Send + Sync
pub type DynError = Box<dyn std::error::Error + Send + Sync>;

/// Type-erased shared pointer to a bean object
pub type AnyArc = Arc<dyn Any + Send + Sync + 'static>;

/// A typed view of an object, boxed as `Arc<T>`
type BoxedView = Box<dyn Any + Send + Sync + 'static>;

/// Produces a view of the erased object, if it has the expected concrete type
type Upcast = Arc<dyn Fn(&AnyArc) -> Option<BoxedView> + Send + Sync>;

/// The container is built on one thread, but the finished context can be shared.
/// So anything managed needs to be Send + Sync + 'static
pub trait Injectable: Send + Sync + 'static {}
impl<T: Send + Sync + 'static> Injectable for T {}

/// Type Name and Type Id
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct TypeInfo {
    pub type_name: &'static str,
    pub type_id: TypeId,
}
impl std::fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name)
    }
}
impl TypeInfo {
    pub fn of<T: 'static + ?Sized>() -> TypeInfo {
        TypeInfo {
            type_name: std::any::type_name::<T>(),
            type_id: TypeId::of::<T>(),
        }
    }

    /// Type name without generic arguments or a leading `dyn`
    fn base_name(&self) -> &'static str {
        let name = self.type_name.trim_start_matches("dyn ");
        match name.find('<') {
            Some(idx) => &name[..idx],
            None => name,
        }
    }

    /// Last path segment, e.g. `OriginBean` for `app::scan::OriginBean`
    pub fn simple_name(&self) -> &'static str {
        let base = self.base_name();
        match base.rfind("::") {
            Some(idx) => &base[idx + 2..],
            None => base,
        }
    }

    /// Module the type was declared in, e.g. `app::scan` for `app::scan::OriginBean`
    pub fn module_path(&self) -> &'static str {
        let base = self.base_name();
        match base.rfind("::") {
            Some(idx) => &base[..idx],
            None => "",
        }
    }

    /// Whether this is a language primitive (or the unit type)
    pub fn is_primitive(&self) -> bool {
        [
            TypeId::of::<()>(),
            TypeId::of::<bool>(),
            TypeId::of::<char>(),
            TypeId::of::<i8>(),
            TypeId::of::<i16>(),
            TypeId::of::<i32>(),
            TypeId::of::<i64>(),
            TypeId::of::<i128>(),
            TypeId::of::<isize>(),
            TypeId::of::<u8>(),
            TypeId::of::<u16>(),
            TypeId::of::<u32>(),
            TypeId::of::<u64>(),
            TypeId::of::<u128>(),
            TypeId::of::<usize>(),
            TypeId::of::<f32>(),
            TypeId::of::<f64>(),
        ]
        .contains(&self.type_id)
    }
}

/// A live bean object
///
/// Besides the erased object itself, an instance carries every *view* it can be
/// injected as - its own type and any trait objects it was declared to implement.
/// A proxy is simply another instance exposing the same views.
#[derive(Clone)]
pub struct Instance {
    info: TypeInfo,
    raw: AnyArc,
    views: Arc<Vec<(TypeInfo, BoxedView)>>,
}
impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let views: Vec<_> = self.views.iter().map(|(info, _)| info.type_name).collect();
        f.debug_struct("Instance")
            .field("type", &self.info.type_name)
            .field("views", &views)
            .finish()
    }
}

impl Instance {
    /// Instance exposing only its own concrete type
    pub fn new<T: Injectable>(value: Arc<T>) -> Self {
        Self::builder(value).build()
    }

    pub fn builder<T: Injectable>(value: Arc<T>) -> InstanceBuilder {
        let raw: AnyArc = value.clone();
        InstanceBuilder {
            info: TypeInfo::of::<T>(),
            raw,
            views: vec![(TypeInfo::of::<T>(), Box::new(value))],
        }
    }

    /// Runtime type of the object
    pub fn info(&self) -> TypeInfo {
        self.info
    }

    pub fn raw(&self) -> &AnyArc {
        &self.raw
    }

    /// Returns the object as `Arc<T>`, if it exposes a view of `T`
    pub fn view<T: ?Sized + 'static>(&self) -> Option<Arc<T>> {
        let type_id = TypeId::of::<T>();
        self.views
            .iter()
            .find(|(info, _)| info.type_id == type_id)
            .and_then(|(_, view)| view.downcast_ref::<Arc<T>>())
            .cloned()
    }

    pub fn exposes(&self, type_id: TypeId) -> bool {
        self.views.iter().any(|(info, _)| info.type_id == type_id)
    }

    /// All types this object can be viewed as
    pub fn views(&self) -> impl Iterator<Item = TypeInfo> + '_ {
        self.views.iter().map(|(info, _)| *info)
    }

    /// Identity comparison - true if both refer to the same object
    pub fn same(&self, other: &Instance) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.raw).cast::<()>(),
            Arc::as_ptr(&other.raw).cast::<()>(),
        )
    }
}

pub struct InstanceBuilder {
    info: TypeInfo,
    raw: AnyArc,
    views: Vec<(TypeInfo, BoxedView)>,
}
impl InstanceBuilder {
    /// Expose the object as `T`, usually a `dyn Trait` it implements
    pub fn view<T: ?Sized + Send + Sync + 'static>(mut self, view: Arc<T>) -> Self {
        let info = TypeInfo::of::<T>();
        self.views.retain(|(existing, _)| existing.type_id != info.type_id);
        self.views.push((info, Box::new(view)));
        self
    }

    pub fn build(self) -> Instance {
        Instance {
            info: self.info,
            raw: self.raw,
            views: Arc::new(self.views),
        }
    }
}

/// The declared type of a bean and every type it may be looked up as
#[derive(Clone)]
pub struct TypeShape {
    info: TypeInfo,
    upcasts: Vec<(TypeInfo, Upcast)>,
}
impl std::fmt::Debug for TypeShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let assignable: Vec<_> = self.assignable().map(|info| info.type_name).collect();
        f.debug_struct("TypeShape")
            .field("type", &self.info.type_name)
            .field("assignable", &assignable)
            .finish()
    }
}

impl TypeShape {
    pub fn info(&self) -> TypeInfo {
        self.info
    }

    /// Declared type first, then each implemented type in declaration order
    pub fn assignable(&self) -> impl Iterator<Item = TypeInfo> + '_ {
        self.upcasts.iter().map(|(info, _)| *info)
    }

    pub fn is_assignable_to(&self, type_id: TypeId) -> bool {
        self.upcasts.iter().any(|(info, _)| info.type_id == type_id)
    }

    /// Wraps an erased object into an [Instance] with all views of this shape
    ///
    /// Views whose up-cast does not accept the object are left out.
    pub fn instantiate(&self, raw: AnyArc) -> Instance {
        let views = self
            .upcasts
            .iter()
            .filter_map(|(info, upcast)| upcast(&raw).map(|view| (*info, view)))
            .collect();

        Instance {
            info: self.info,
            raw,
            views: Arc::new(views),
        }
    }
}

/// Typed builder for a [TypeShape]
pub struct Shape<T> {
    shape: TypeShape,
    _marker: PhantomData<fn() -> T>,
}
impl<T: Injectable> Default for Shape<T> {
    fn default() -> Self {
        Self::of()
    }
}
impl<T: Injectable> Shape<T> {
    pub fn of() -> Self {
        let identity: Upcast = Arc::new(|raw: &AnyArc| {
            raw.clone()
                .downcast::<T>()
                .ok()
                .map(|value| Box::new(value) as BoxedView)
        });

        Shape {
            shape: TypeShape {
                info: TypeInfo::of::<T>(),
                upcasts: vec![(TypeInfo::of::<T>(), identity)],
            },
            _marker: PhantomData,
        }
    }

    /// Declares that `T` can be injected as `R`
    ///
    /// ```ignore
    /// Shape::<SmtpMailer>::of().implements::<dyn Mailer>(|mailer| mailer)
    /// ```
    pub fn implements<R: ?Sized + Send + Sync + 'static>(mut self, cast: fn(Arc<T>) -> Arc<R>) -> Self {
        let upcast: Upcast = Arc::new(move |raw: &AnyArc| {
            raw.clone()
                .downcast::<T>()
                .ok()
                .map(|value| Box::new(cast(value)) as BoxedView)
        });

        let info = TypeInfo::of::<R>();
        self.shape
            .upcasts
            .retain(|(existing, _)| existing.type_id != info.type_id);
        self.shape.upcasts.push((info, upcast));
        self
    }

    pub fn erase(self) -> TypeShape {
        self.shape
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct English;
    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".to_string()
        }
    }

    #[test]
    fn names_are_split_from_the_type_path() {
        let info = TypeInfo::of::<English>();
        assert_eq!(info.simple_name(), "English");
        assert!(info.module_path().ends_with("types::tests"));

        let info = TypeInfo::of::<dyn Greeter>();
        assert_eq!(info.simple_name(), "Greeter");

        let info = TypeInfo::of::<Vec<English>>();
        assert_eq!(info.simple_name(), "Vec");
    }

    #[test]
    fn primitives_are_recognised() {
        assert!(TypeInfo::of::<u32>().is_primitive());
        assert!(TypeInfo::of::<()>().is_primitive());
        assert!(!TypeInfo::of::<String>().is_primitive());
    }

    #[test]
    fn shape_produces_trait_views() {
        let shape = Shape::<English>::of()
            .implements::<dyn Greeter>(|english| english)
            .erase();

        assert!(shape.is_assignable_to(TypeId::of::<dyn Greeter>()));

        let instance = shape.instantiate(Arc::new(English));
        let greeter = instance.view::<dyn Greeter>().unwrap();
        assert_eq!(greeter.greet(), "hello");
        assert!(instance.view::<English>().is_some());
        assert!(instance.view::<String>().is_none());
    }

    #[test]
    fn identity_ignores_views() {
        let first = Instance::new(Arc::new(English));
        let clone = first.clone();
        let other = Instance::new(Arc::new(English));

        assert!(first.same(&clone));
        assert!(!first.same(&other));
    }
}
