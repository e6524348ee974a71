mod common;

use std::sync::Arc;

use beanstalk_config::PropertyResolver;
use beanstalk_context::{
    ClassMeta, ConstructorMeta, DefinitionError, InitError, Marker, MethodMeta, ParamMeta, Shape,
};
use common::start;
use pretty_assertions::assert_eq;

pub struct Application;

pub struct Repo;

pub struct Service {
    repo: Arc<Repo>,
}

pub struct Server {
    port: u16,
    name: String,
}

pub struct PoolConfig {
    prefix: String,
}

pub struct Pool {
    name: String,
    size: u32,
}

pub struct Dao {
    pool: Arc<Pool>,
}

pub struct Cache;

pub struct Reporter {
    cache: Option<Arc<Cache>>,
}

pub struct Broken;

fn application() -> ClassMeta {
    ClassMeta::builder::<Application>().build()
}

fn repo() -> ClassMeta {
    ClassMeta::builder::<Repo>()
        .marker(Marker::component(""))
        .constructor(ConstructorMeta::new(|_| Ok(Repo)))
        .build()
}

fn service() -> ClassMeta {
    ClassMeta::builder::<Service>()
        .marker(Marker::component(""))
        // Created before the repo it depends on
        .marker(Marker::Order(0))
        .constructor(
            ConstructorMeta::new(|args| Ok(Service { repo: args.get(0)? }))
                .param(ParamMeta::of::<Repo>("repo").autowired()),
        )
        .build()
}

fn server() -> ClassMeta {
    ClassMeta::builder::<Server>()
        .marker(Marker::component(""))
        .constructor(
            ConstructorMeta::new(|args| {
                Ok(Server {
                    port: args.value(0)?,
                    name: args.value(1)?,
                })
            })
            .param(ParamMeta::of::<u16>("port").value("${server.port:8080}"))
            .param(ParamMeta::of::<String>("name").value("${server.name}")),
        )
        .build()
}

fn pool_config() -> ClassMeta {
    ClassMeta::builder::<PoolConfig>()
        .marker(Marker::configuration(""))
        .constructor(
            ConstructorMeta::new(|args| Ok(PoolConfig { prefix: args.value(0)? }))
                .param(ParamMeta::of::<String>("prefix").value("${pool.prefix:db}")),
        )
        .method(
            MethodMeta::bean("createPool", Shape::<Pool>::of(), |config: &PoolConfig, args| {
                Ok(Pool {
                    name: format!("{}-pool", config.prefix),
                    size: args.value(0)?,
                })
            })
            .bean_name("pool")
            .param(ParamMeta::of::<u32>("size").value("${pool.size:4}")),
        )
        .build()
}

fn dao() -> ClassMeta {
    ClassMeta::builder::<Dao>()
        .marker(Marker::component(""))
        .constructor(
            ConstructorMeta::new(|args| Ok(Dao { pool: args.get(0)? }))
                .param(ParamMeta::of::<Pool>("pool").autowired()),
        )
        .build()
}

fn reporter(cache: ParamMeta) -> ClassMeta {
    ClassMeta::builder::<Reporter>()
        .marker(Marker::component(""))
        .constructor(
            ConstructorMeta::new(|args| Ok(Reporter { cache: args.get(0)? })).param(cache),
        )
        .build()
}

#[test]
fn dependencies_are_shared_singletons() {
    let context = start::<Application>(
        vec![application(), repo(), service()],
        PropertyResolver::default(),
    )
    .unwrap();

    let service = context.get_bean::<Service>("service").unwrap();
    let repo = context.get_bean::<Repo>("repo").unwrap();
    assert!(Arc::ptr_eq(&service.repo, &repo));
    assert!(context.get_instance("service").unwrap().same(&context.get_instance("service").unwrap()));
}

#[test]
fn unmarked_classes_are_not_beans() {
    let context = start::<Application>(vec![application(), repo()], PropertyResolver::default()).unwrap();

    assert!(context.contains_bean("repo"));
    assert!(!context.contains_bean("application"));
}

#[test]
fn values_use_defaults_when_missing() {
    let context = start::<Application>(
        vec![application(), server()],
        PropertyResolver::from_map([("server.name", "demo")]),
    )
    .unwrap();

    let server = context.get_bean::<Server>("server").unwrap();
    assert_eq!(server.port, 8080);
    assert_eq!(server.name, "demo");
}

#[test]
fn values_come_from_toml_documents() {
    let properties = PropertyResolver::from_toml_str("[server]\nport = 9090\nname = \"toml\"").unwrap();
    let context = start::<Application>(vec![application(), server()], properties).unwrap();

    let server = context.get_bean::<Server>("server").unwrap();
    assert_eq!(server.port, 9090);
    assert_eq!(server.name, "toml");
}

#[test]
fn missing_value_names_bean_and_expression() {
    let err = start::<Application>(vec![application(), server()], PropertyResolver::default()).unwrap_err();

    match err {
        InitError::Value {
            bean, expression, ..
        } => {
            assert_eq!(bean, "server");
            assert_eq!(expression, "${server.name}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn factory_methods_produce_beans() {
    let context = start::<Application>(
        vec![application(), pool_config(), dao()],
        PropertyResolver::from_map([("pool.size", "16")]),
    )
    .unwrap();

    let pool = context.get_bean::<Pool>("pool").unwrap();
    assert_eq!(pool.name, "db-pool");
    assert_eq!(pool.size, 16);

    let dao = context.get_bean_by_type::<Dao>().unwrap();
    assert!(Arc::ptr_eq(&dao.pool, &pool));
    assert!(context.find_bean_definition("poolConfig").unwrap().is_configuration());
}

#[test]
fn configuration_constructors_only_take_values() {
    let config = ClassMeta::builder::<PoolConfig>()
        .marker(Marker::configuration(""))
        .constructor(
            ConstructorMeta::new(|_| {
                Ok(PoolConfig {
                    prefix: String::new(),
                })
            })
            .param(ParamMeta::of::<Repo>("repo").autowired()),
        )
        .build();

    let err = start::<Application>(vec![application(), repo(), config], PropertyResolver::default())
        .unwrap_err();
    assert!(matches!(
        err,
        InitError::Definition(DefinitionError::AutowiredInConfiguration { ref bean, .. }) if bean == "poolConfig"
    ));
}

#[test]
fn parameters_need_exactly_one_marker() {
    let unmarked = ClassMeta::builder::<Service>()
        .marker(Marker::component(""))
        .constructor(
            ConstructorMeta::new(|args| Ok(Service { repo: args.get(0)? }))
                .param(ParamMeta::of::<Repo>("repo")),
        )
        .build();
    let err = start::<Application>(vec![application(), repo(), unmarked], PropertyResolver::default())
        .unwrap_err();
    assert!(matches!(
        err,
        InitError::Definition(DefinitionError::MissingMarker { .. })
    ));

    let both = ClassMeta::builder::<Service>()
        .marker(Marker::component(""))
        .constructor(
            ConstructorMeta::new(|args| Ok(Service { repo: args.get(0)? }))
                .param(ParamMeta::of::<Repo>("repo").autowired().value("${repo}")),
        )
        .build();
    let err = start::<Application>(vec![application(), repo(), both], PropertyResolver::default())
        .unwrap_err();
    assert!(matches!(
        err,
        InitError::Definition(DefinitionError::BothMarkers { .. })
    ));
}

#[test]
fn optional_dependencies_may_be_missing() {
    let context = start::<Application>(
        vec![
            application(),
            reporter(ParamMeta::of::<Cache>("cache").autowired().optional()),
        ],
        PropertyResolver::default(),
    )
    .unwrap();

    let reporter = context.get_bean::<Reporter>("reporter").unwrap();
    assert!(reporter.cache.is_none());
}

#[test]
fn required_dependencies_must_exist() {
    let err = start::<Application>(
        vec![
            application(),
            reporter(ParamMeta::of::<Cache>("cache").autowired()),
        ],
        PropertyResolver::default(),
    )
    .unwrap_err();

    match err {
        InitError::UnsatisfiedDependency {
            bean, dependency, ..
        } => {
            assert_eq!(bean, "reporter");
            assert_eq!(dependency, std::any::type_name::<Cache>());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn bean_names_are_unique_across_classes_and_methods() {
    // `Repo` and the factory method both claim the name "repo"
    let config = ClassMeta::builder::<PoolConfig>()
        .marker(Marker::configuration(""))
        .constructor(ConstructorMeta::new(|_| {
            Ok(PoolConfig {
                prefix: String::new(),
            })
        }))
        .method(
            MethodMeta::bean("createRepo", Shape::<Pool>::of(), |_: &PoolConfig, _| {
                Ok(Pool {
                    name: String::new(),
                    size: 0,
                })
            })
            .bean_name("repo"),
        )
        .build();

    let err = start::<Application>(vec![application(), repo(), config], PropertyResolver::default())
        .unwrap_err();
    assert!(matches!(
        err,
        InitError::Definition(DefinitionError::DuplicateBeanName(ref name)) if name == "repo"
    ));
}

#[test]
fn constructor_failures_name_the_bean() {
    let broken = ClassMeta::builder::<Broken>()
        .marker(Marker::component(""))
        .constructor(ConstructorMeta::new(|_| -> Result<Broken, _> {
            Err("disk full".into())
        }))
        .build();

    let err = start::<Application>(vec![application(), broken], PropertyResolver::default()).unwrap_err();
    match err {
        InitError::Creation { bean, source } => {
            assert_eq!(bean, "broken");
            assert_eq!(source.to_string(), "disk full");
        }
        other => panic!("unexpected error: {other}"),
    }
}
