use std::{
    any::{type_name, Any},
    sync::Arc,
};

use crate::{
    errors::ArgumentError,
    metadata::{inject_marker_methods, InjectMarkers, Marker, MarkerKind, Modifiers},
    resolver::{Argument, Args},
    types::{AnyArc, DynError, Injectable, Shape, TypeInfo, TypeShape},
};

type CreateFn = Arc<dyn Fn(&mut Args) -> Result<AnyArc, DynError> + Send + Sync>;
type InvokeFn =
    Arc<dyn Fn(&(dyn Any + Send + Sync), &mut Args) -> Result<Option<AnyArc>, DynError> + Send + Sync>;
type SetFn = Arc<dyn Fn(&(dyn Any + Send + Sync), Argument) -> Result<(), DynError> + Send + Sync>;

fn downcast_target<C: 'static>(target: &(dyn Any + Send + Sync)) -> Result<&C, ArgumentError> {
    target
        .downcast_ref::<C>()
        .ok_or(ArgumentError::TargetMismatch {
            expected: type_name::<C>(),
        })
}

/// A parameter of a constructor or method
#[derive(Debug, Clone)]
pub struct ParamMeta {
    pub name: &'static str,
    pub info: TypeInfo,
    pub inject: InjectMarkers,
}

impl ParamMeta {
    /// Unmarked parameter of type `T`, mark it with [ParamMeta::value] or [ParamMeta::autowired]
    pub fn of<T: ?Sized + 'static>(name: &'static str) -> Self {
        ParamMeta {
            name,
            info: TypeInfo::of::<T>(),
            inject: InjectMarkers::default(),
        }
    }

    inject_marker_methods!();
}

/// A constructor with its parameters
#[derive(Clone)]
pub struct ConstructorMeta {
    pub modifiers: Modifiers,
    pub params: Vec<ParamMeta>,
    create: CreateFn,
}
impl std::fmt::Debug for ConstructorMeta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstructorMeta")
            .field("modifiers", &self.modifiers)
            .field("params", &self.params)
            .finish()
    }
}

impl ConstructorMeta {
    pub fn new<C, F>(create: F) -> Self
    where
        C: Injectable,
        F: Fn(&mut Args) -> Result<C, DynError> + Send + Sync + 'static,
    {
        ConstructorMeta {
            modifiers: Modifiers::default(),
            params: Vec::new(),
            create: Arc::new(move |args: &mut Args| {
                let created: AnyArc = Arc::new(create(args)?);
                Ok(created)
            }),
        }
    }

    pub fn param(mut self, param: ParamMeta) -> Self {
        self.params.push(param);
        self
    }

    pub fn modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn is_public(&self) -> bool {
        self.modifiers.contains(Modifiers::PUBLIC)
    }

    pub fn create(&self, args: &mut Args) -> Result<AnyArc, DynError> {
        (self.create)(args)
    }
}

/// A method of a class
///
/// Depending on how it is marked it is a factory method (`Bean`), a lifecycle hook
/// (`PostConstruct`, `PreDestroy`, named hooks) or a setter (inject markers).
#[derive(Clone)]
pub struct MethodMeta {
    pub name: &'static str,
    pub owner: TypeInfo,
    pub modifiers: Modifiers,
    pub markers: Vec<Marker>,
    pub params: Vec<ParamMeta>,
    /// Markers on the method itself, used for setter injection
    pub inject: InjectMarkers,
    /// `None` if the method returns nothing
    pub returns: Option<TypeShape>,
    invoke: InvokeFn,
}
impl std::fmt::Debug for MethodMeta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodMeta")
            .field("name", &self.name)
            .field("owner", &self.owner.type_name)
            .field("modifiers", &self.modifiers)
            .field("markers", &self.markers)
            .field("params", &self.params)
            .field("inject", &self.inject)
            .field("returns", &self.returns.as_ref().map(|shape| shape.info().type_name))
            .finish()
    }
}

impl MethodMeta {
    fn with_invoker<C: 'static>(
        name: &'static str,
        returns: Option<TypeShape>,
        invoke: InvokeFn,
    ) -> Self {
        MethodMeta {
            name,
            owner: TypeInfo::of::<C>(),
            modifiers: Modifiers::default(),
            markers: Vec::new(),
            params: Vec::new(),
            inject: InjectMarkers::default(),
            returns,
            invoke,
        }
    }

    /// Factory method on a configuration class producing an `R`
    ///
    /// Carries a `Bean` marker without explicit name, use [MethodMeta::bean_name] and
    /// [MethodMeta::hooks] to adjust it.
    pub fn bean<C, R, F>(name: &'static str, shape: Shape<R>, produce: F) -> Self
    where
        C: Injectable,
        R: Injectable,
        F: Fn(&C, &mut Args) -> Result<R, DynError> + Send + Sync + 'static,
    {
        let invoke: InvokeFn = Arc::new(move |target: &(dyn Any + Send + Sync), args: &mut Args| {
            let owner = downcast_target::<C>(target)?;
            let produced: AnyArc = Arc::new(produce(owner, args)?);
            Ok(Some(produced))
        });

        let mut method = Self::with_invoker::<C>(name, Some(shape.erase()), invoke);
        method.markers.push(Marker::bean(""));
        method
    }

    /// Method returning nothing, e.g. a lifecycle hook
    pub fn action<C, F>(name: &'static str, action: F) -> Self
    where
        C: Injectable,
        F: Fn(&C, &mut Args) -> Result<(), DynError> + Send + Sync + 'static,
    {
        let invoke: InvokeFn = Arc::new(move |target: &(dyn Any + Send + Sync), args: &mut Args| {
            action(downcast_target::<C>(target)?, args)?;
            Ok(None)
        });

        Self::with_invoker::<C>(name, None, invoke)
    }

    /// Setter taking a configuration value
    pub fn setter<C, T, F>(name: &'static str, set: F) -> Self
    where
        C: Injectable,
        T: 'static,
        F: Fn(&C, T) -> Result<(), DynError> + Send + Sync + 'static,
    {
        let invoke: InvokeFn = Arc::new(move |target: &(dyn Any + Send + Sync), args: &mut Args| {
            set(downcast_target::<C>(target)?, args.value::<T>(0)?)?;
            Ok(None)
        });

        Self::with_invoker::<C>(name, None, invoke).param(ParamMeta::of::<T>(name))
    }

    /// Setter taking another bean, viewed as `R`
    pub fn bean_setter<C, R, F>(name: &'static str, set: F) -> Self
    where
        C: Injectable,
        R: ?Sized + 'static,
        F: Fn(&C, Arc<R>) -> Result<(), DynError> + Send + Sync + 'static,
    {
        let invoke: InvokeFn = Arc::new(move |target: &(dyn Any + Send + Sync), args: &mut Args| {
            set(downcast_target::<C>(target)?, args.get::<Arc<R>>(0)?)?;
            Ok(None)
        });

        Self::with_invoker::<C>(name, None, invoke).param(ParamMeta::of::<R>(name))
    }

    pub fn marker(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }

    pub fn param(mut self, param: ParamMeta) -> Self {
        self.params.push(param);
        self
    }

    pub fn modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Explicit name of the produced bean
    pub fn bean_name(mut self, bean: &str) -> Self {
        for marker in &mut self.markers {
            if let Marker::Bean { name, .. } = marker {
                *name = bean.to_string();
            }
        }
        self
    }

    /// Named init and destroy methods of the produced bean, empty for none
    pub fn hooks(mut self, init: &str, destroy: &str) -> Self {
        for marker in &mut self.markers {
            if let Marker::Bean {
                init_method,
                destroy_method,
                ..
            } = marker
            {
                *init_method = init.to_string();
                *destroy_method = destroy.to_string();
            }
        }
        self
    }

    inject_marker_methods!();

    pub fn has_marker(&self, kind: MarkerKind) -> bool {
        self.markers.iter().any(|marker| marker.kind() == kind)
    }

    pub fn invoke(
        &self,
        target: &(dyn Any + Send + Sync),
        args: &mut Args,
    ) -> Result<Option<AnyArc>, DynError> {
        (self.invoke)(target, args)
    }
}

/// A field which may be injected after construction
///
/// Rust fields can not be assigned through a shared reference, so the setter works on
/// whatever interior mutability the bean uses, usually a `OnceLock`.
#[derive(Clone)]
pub struct FieldMeta {
    pub name: &'static str,
    pub info: TypeInfo,
    pub modifiers: Modifiers,
    pub inject: InjectMarkers,
    set: SetFn,
}
impl std::fmt::Debug for FieldMeta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldMeta")
            .field("name", &self.name)
            .field("type", &self.info.type_name)
            .field("modifiers", &self.modifiers)
            .field("inject", &self.inject)
            .finish()
    }
}

impl FieldMeta {
    /// Field holding a configuration value
    pub fn property<C, T, F>(name: &'static str, set: F) -> Self
    where
        C: Injectable,
        T: 'static,
        F: Fn(&C, T) + Send + Sync + 'static,
    {
        FieldMeta {
            name,
            info: TypeInfo::of::<T>(),
            modifiers: Modifiers::default(),
            inject: InjectMarkers::default(),
            set: Arc::new(move |target: &(dyn Any + Send + Sync), argument: Argument| {
                set(downcast_target::<C>(target)?, argument.into_value::<T>(0)?);
                Ok(())
            }),
        }
    }

    /// Field holding another bean, viewed as `R`
    pub fn reference<C, R, F>(name: &'static str, set: F) -> Self
    where
        C: Injectable,
        R: ?Sized + 'static,
        F: Fn(&C, Arc<R>) + Send + Sync + 'static,
    {
        FieldMeta {
            name,
            info: TypeInfo::of::<R>(),
            modifiers: Modifiers::default(),
            inject: InjectMarkers::default(),
            set: Arc::new(move |target: &(dyn Any + Send + Sync), argument: Argument| {
                let bean = match argument {
                    Argument::Bean(instance) => {
                        instance
                            .view::<R>()
                            .ok_or_else(|| ArgumentError::TypeMismatch {
                                index: 0,
                                expected: type_name::<R>(),
                            })?
                    }
                    _ => {
                        return Err(ArgumentError::TypeMismatch {
                            index: 0,
                            expected: type_name::<R>(),
                        }
                        .into())
                    }
                };
                set(downcast_target::<C>(target)?, bean);
                Ok(())
            }),
        }
    }

    pub fn modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    inject_marker_methods!();

    pub fn set(&self, target: &(dyn Any + Send + Sync), argument: Argument) -> Result<(), DynError> {
        (self.set)(target, argument)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::OnceLock;

    use super::*;

    #[derive(Default)]
    struct Server {
        port: OnceLock<u16>,
    }

    #[test]
    fn markers_are_collected() {
        let param = ParamMeta::of::<u16>("port").value("${server.port:8080}");
        assert_eq!(param.inject.value(), Some("${server.port:8080}"));
        assert_eq!(param.inject.autowired(), None);

        let param = ParamMeta::of::<Server>("server").named("mainServer").optional();
        assert_eq!(param.inject.autowired(), Some(("mainServer", false)));
    }

    #[test]
    fn constructors_create_erased_objects() {
        let constructor = ConstructorMeta::new(|args| {
            let server = Server::default();
            let _ = server.port.set(args.value::<u16>(0)?);
            Ok(server)
        })
        .param(ParamMeta::of::<u16>("port").value("${port}"));

        let mut args = Args::new(vec![Argument::Value(Box::new(9000u16))]);
        let created = constructor.create(&mut args).unwrap();
        let server = created.downcast::<Server>().unwrap();
        assert_eq!(server.port.get(), Some(&9000));
    }

    #[test]
    fn fields_are_set_through_the_setter() {
        let field = FieldMeta::property("port", |server: &Server, port: u16| {
            let _ = server.port.set(port);
        })
        .value("${port}");

        let server = Server::default();
        field.set(&server, Argument::Value(Box::new(1234u16))).unwrap();
        assert_eq!(server.port.get(), Some(&1234));

        let err = field.set(&"not a server".to_string(), Argument::Value(Box::new(1u16)));
        assert!(err.is_err());
    }

    #[test]
    fn bean_methods_keep_their_marker() {
        let method = MethodMeta::bean("createServer", Shape::<Server>::of(), |_: &Server, _| {
            Ok(Server::default())
        })
        .bean_name("server")
        .hooks("start", "stop");

        assert!(method.has_marker(MarkerKind::Bean));
        assert_eq!(
            method.markers,
            vec![Marker::bean_with_hooks("server", "start", "stop")]
        );
    }
}
