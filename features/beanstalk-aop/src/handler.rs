use std::{any::Any, marker::PhantomData};

use beanstalk_context::{Marker, MarkerKind, TypeInfo};

/// One call going through a proxy
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    /// Name of the proxied bean
    pub bean: &'a str,
    /// Runtime type of the original object
    pub target: TypeInfo,
    pub method: &'a str,
    /// Markers declared on the method in the catalog
    pub markers: &'a [Marker],
}

impl Invocation<'_> {
    pub fn has_marker(&self, kind: MarkerKind) -> bool {
        self.markers.iter().any(|marker| marker.kind() == kind)
    }

    /// True if the method carries the user declared marker type `A`
    pub fn is_marked<A: 'static>(&self) -> bool {
        self.has_marker(MarkerKind::Annotation(TypeInfo::of::<A>().type_id))
    }
}

/// Runs around every call of a proxied bean
///
/// Handlers are beans themselves, registered with a view of this trait:
/// ```ignore
/// ClassMeta::builder::<Polite>()
///     .marker(Marker::component(""))
///     .implements::<dyn InvocationHandler>(|polite| polite)
/// ```
pub trait InvocationHandler: Send + Sync {
    /// Called before the call reaches the original object
    fn before(&self, invocation: &Invocation<'_>) {
        let _ = invocation;
    }

    /// Called with the value the original returned, which may be replaced in place
    fn after(&self, invocation: &Invocation<'_>, returned: &mut dyn Any) {
        let _ = (invocation, returned);
    }
}

/// Handler only running code before each call
pub struct BeforeInvocation<F> {
    before: F,
}

impl<F> BeforeInvocation<F>
where
    F: Fn(&Invocation<'_>) + Send + Sync,
{
    pub fn new(before: F) -> Self {
        BeforeInvocation { before }
    }
}

impl<F> InvocationHandler for BeforeInvocation<F>
where
    F: Fn(&Invocation<'_>) + Send + Sync,
{
    fn before(&self, invocation: &Invocation<'_>) {
        (self.before)(invocation)
    }
}

/// Handler adjusting return values of type `R`, other return types pass untouched
pub struct AfterReturning<R, F> {
    after: F,
    _marker: PhantomData<fn(&mut R)>,
}

impl<R, F> AfterReturning<R, F>
where
    R: 'static,
    F: Fn(&Invocation<'_>, &mut R) + Send + Sync,
{
    pub fn new(after: F) -> Self {
        AfterReturning {
            after,
            _marker: PhantomData,
        }
    }
}

impl<R, F> InvocationHandler for AfterReturning<R, F>
where
    R: 'static,
    F: Fn(&Invocation<'_>, &mut R) + Send + Sync,
{
    fn after(&self, invocation: &Invocation<'_>, returned: &mut dyn Any) {
        if let Some(returned) = returned.downcast_mut::<R>() {
            (self.after)(invocation, returned);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;

    use super::*;

    struct Polite;
    struct Target;

    fn invocation<'a>(markers: &'a [Marker]) -> Invocation<'a> {
        Invocation {
            bean: "target",
            target: TypeInfo::of::<Target>(),
            method: "hello",
            markers,
        }
    }

    #[test]
    fn before_adapters_see_the_call() {
        let calls = Mutex::new(Vec::new());
        let handler = BeforeInvocation::new(|invocation: &Invocation<'_>| {
            calls
                .lock()
                .unwrap()
                .push(format!("{}.{}", invocation.bean, invocation.method));
        });

        handler.before(&invocation(&[]));
        handler.after(&invocation(&[]), &mut 1u8);
        assert_eq!(*calls.lock().unwrap(), vec!["target.hello".to_string()]);
    }

    #[test]
    fn after_adapters_only_touch_their_type() {
        let handler = AfterReturning::new(|_: &Invocation<'_>, greeting: &mut String| {
            greeting.push('!');
        });

        let mut greeting = String::from("Hello");
        handler.after(&invocation(&[]), &mut greeting);
        assert_eq!(greeting, "Hello!");

        let mut count = 3u32;
        handler.after(&invocation(&[]), &mut count);
        assert_eq!(count, 3);
    }

    #[test]
    fn markers_of_the_method() {
        let markers = [Marker::annotation::<Polite>("")];
        assert!(invocation(&markers).is_marked::<Polite>());
        assert!(!invocation(&[]).is_marked::<Polite>());
    }
}
