use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use beanstalk_aop::{
    Around, AroundProxyPostProcessor, Invocation, InvocationHandler, Proxied, ProxyResolver,
};
use beanstalk_config::PropertyResolver;
use beanstalk_context::{
    Catalog, ClassMeta, ConstructorMeta, ContextBuilder, DynError, FieldMeta, Instance, Marker,
    MethodMeta, ParamMeta,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

const CONFIG: &str = r#"
[shop]
name = "Corner Store"
restock = "15m"

[greeting]
customer = "Alice"
"#;

pub struct Application;

/// Methods worth an audit line
pub struct Audited;

pub trait Shop: Send + Sync {
    fn sell(&self, item: &str) -> Result<u32, String>;
    fn stock(&self, item: &str) -> u32;
}

pub struct Store {
    name: String,
    restock: Duration,
    items: Mutex<Vec<(String, u32)>>,
}

impl Store {
    fn open(&self) -> Result<(), DynError> {
        info!("{} opens, restocking every {:?}", self.name, self.restock);
        Ok(())
    }

    fn shut(&self) -> Result<(), DynError> {
        info!("{} closes", self.name);
        Ok(())
    }
}

impl Shop for Store {
    fn sell(&self, item: &str) -> Result<u32, String> {
        let mut items = self.items.lock().map_err(|_| "stock poisoned".to_string())?;
        let (_, count) = items
            .iter_mut()
            .find(|(name, _)| name == item)
            .ok_or_else(|| format!("{item} is not sold here"))?;
        *count = count
            .checked_sub(1)
            .ok_or_else(|| format!("{item} is sold out"))?;
        Ok(*count)
    }

    fn stock(&self, item: &str) -> u32 {
        self.items
            .lock()
            .ok()
            .and_then(|items| items.iter().find(|(name, _)| name == item).map(|(_, count)| *count))
            .unwrap_or_default()
    }
}

pub struct StoreProxy(Proxied<Store>);
impl Shop for StoreProxy {
    fn sell(&self, item: &str) -> Result<u32, String> {
        self.0.call("sell", |store| store.sell(item))
    }

    fn stock(&self, item: &str) -> u32 {
        self.0.call("stock", |store| store.stock(item))
    }
}

pub struct AuditHandler;
impl InvocationHandler for AuditHandler {
    fn before(&self, invocation: &Invocation<'_>) {
        if invocation.is_marked::<Audited>() {
            info!("audit: {}.{}", invocation.bean, invocation.method);
        }
    }
}

pub struct Cashier {
    shop: Arc<dyn Shop>,
    customer: Mutex<String>,
}

impl Cashier {
    fn serve(&self, item: &str) {
        let customer = self
            .customer
            .lock()
            .map(|customer| customer.clone())
            .unwrap_or_default();
        match self.shop.sell(item) {
            Ok(left) => println!("{customer} bought {item}, {left} left"),
            Err(reason) => println!("{customer} could not buy {item}: {reason}"),
        }
    }
}

pub struct ShopConfiguration;

fn catalog() -> Result<Catalog, DynError> {
    let catalog = Catalog::new().with(vec![
        ClassMeta::builder::<Application>().build(),
        ClassMeta::builder::<ShopConfiguration>()
            .marker(Marker::configuration(""))
            .constructor(ConstructorMeta::new(|_| Ok(ShopConfiguration)))
            .method(MethodMeta::bean(
                "aroundProxyPostProcessor",
                AroundProxyPostProcessor::shape(),
                |_: &ShopConfiguration, _| {
                    let proxies = ProxyResolver::new().register(|proxied: Proxied<Store>| {
                        let proxy = Arc::new(StoreProxy(proxied));
                        Instance::builder(proxy.clone()).view::<dyn Shop>(proxy).build()
                    });
                    Ok(AroundProxyPostProcessor::new(proxies))
                },
            ))
            .build(),
        ClassMeta::builder::<Store>()
            .marker(Marker::component(""))
            .marker(Marker::annotation::<Around>("auditHandler"))
            .implements::<dyn Shop>(|store| store)
            .constructor(
                ConstructorMeta::new(|args| {
                    Ok(Store {
                        name: args.value(0)?,
                        restock: args.value(1)?,
                        items: Mutex::new(vec![("apple".to_string(), 2), ("pear".to_string(), 1)]),
                    })
                })
                .param(ParamMeta::of::<String>("name").value("${shop.name}"))
                .param(ParamMeta::of::<Duration>("restock").value("${shop.restock:1h}")),
            )
            .method(MethodMeta::action("sell", |_: &Store, _| Ok(())).marker(Marker::annotation::<Audited>("")))
            .method(MethodMeta::action("stock", |_: &Store, _| Ok(())))
            .post_construct("open", Store::open)
            .pre_destroy("shut", Store::shut)
            .build(),
        ClassMeta::builder::<AuditHandler>()
            .marker(Marker::component(""))
            .implements::<dyn InvocationHandler>(|handler| handler)
            .constructor(ConstructorMeta::new(|_| Ok(AuditHandler)))
            .build(),
        ClassMeta::builder::<Cashier>()
            .marker(Marker::component(""))
            .constructor(
                ConstructorMeta::new(|args| {
                    Ok(Cashier {
                        shop: args.get(0)?,
                        customer: Mutex::new(String::new()),
                    })
                })
                .param(ParamMeta::of::<dyn Shop>("shop").autowired()),
            )
            .field(
                FieldMeta::property("customer", |cashier: &Cashier, customer: String| {
                    if let Ok(mut current) = cashier.customer.lock() {
                        *current = customer;
                    }
                })
                .value("${greeting.customer:stranger}"),
            )
            .build(),
    ])?;
    Ok(catalog)
}

fn main() -> Result<(), DynError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let properties = PropertyResolver::from_toml_str(CONFIG)?.with_env();
    let context = ContextBuilder::new(catalog()?)
        .with_resolver(properties)
        .build::<Application>()?;

    let cashier = context.get_bean_by_type::<Cashier>()?;
    for item in ["apple", "pear", "pear", "plum"] {
        cashier.serve(item);
    }

    let shop = context.get_bean::<dyn Shop>("store")?;
    println!("apples left: {}", shop.stock("apple"));

    context.close()?;
    Ok(())
}
