use std::collections::HashMap;

use beanstalk_context::{DynError, PropertyValue, TypeInfo, ValueResolver};
use tracing::{debug, warn};

use crate::{convert::Converters, errors::PropertyError, expr::PropertyExpr};

/// How often a value may refer to another value before giving up
const MAX_NESTING: usize = 32;

/// Holds the application properties and answers lookups with typed values
///
/// Lookups accept:
/// 1. plain keys: `app.title`
/// 2. required expressions: `${app.title}`
/// 3. expressions with a default: `${app.title:Beanstalk}`, the default may be an
///    expression itself, e.g. `${app.title:${APP_NAME:Beanstalk}}`
///
/// Stored values which are expressions are resolved as well. Composite values such as
/// `jdbc:mysql://${DB_HOST}:3306` are taken as they are.
///
/// # Example
/// ```rust
/// use std::time::Duration;
/// use beanstalk_config::PropertyResolver;
///
/// let properties = PropertyResolver::from_toml_str(
///     r#"
///     [server]
///     port = 8080
///     timeout = "30s"
///     "#,
/// )
/// .unwrap();
///
/// assert_eq!(properties.get_required::<u16>("${server.port}").unwrap(), 8080);
/// assert_eq!(
///     properties.get_required::<Duration>("server.timeout").unwrap(),
///     Duration::from_secs(30)
/// );
/// assert_eq!(properties.get_property("${server.host:localhost}").unwrap().as_deref(), Some("localhost"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct PropertyResolver {
    properties: HashMap<String, String>,
    converters: Converters,
}

impl PropertyResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map<K, V>(properties: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::new().with_properties(properties)
    }

    /// Parses a TOML document, nested tables become dotted keys
    pub fn from_toml_str(document: &str) -> Result<Self, PropertyError> {
        Self::new().with_toml_str(document)
    }

    /// Adds or overrides a single property
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_properties<K, V>(mut self, properties: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.properties.extend(
            properties
                .into_iter()
                .map(|(key, value)| (key.into(), value.into())),
        );
        self
    }

    /// Adds the process environment, overriding properties of the same name
    pub fn with_env(self) -> Self {
        let resolver = self.with_properties(std::env::vars());
        debug!("Properties after adding environment: {}", resolver.len());
        resolver
    }

    /// Adds a TOML document, overriding properties of the same name
    ///
    /// Arrays of plain values are joined with `,`, arrays of tables are keyed by index.
    pub fn with_toml_str(mut self, document: &str) -> Result<Self, PropertyError> {
        let table: toml::Table = toml::from_str(document)?;
        let before = self.properties.len();
        flatten_table("", &table, &mut self.properties);
        debug!(
            "Loaded TOML document, {} properties added",
            self.properties.len().saturating_sub(before)
        );
        Ok(self)
    }

    /// Replaces the converters, e.g. with [Converters::empty] plus custom ones
    pub fn with_converters(mut self, converters: Converters) -> Self {
        self.converters = converters;
        self
    }

    /// Adds or replaces the converter for `T`
    pub fn register_converter<T, F>(&mut self, convert: F)
    where
        T: Send + Sync + 'static,
        F: Fn(&str) -> Result<T, DynError> + Send + Sync + 'static,
    {
        self.converters.register(convert);
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    /// Looks up a plain key or an expression
    ///
    /// `Ok(None)` if a plain key is missing, an error if a required expression or a
    /// nested reference can not be resolved.
    pub fn get_property(&self, key: &str) -> Result<Option<String>, PropertyError> {
        self.lookup(key, 0)
    }

    /// Like [PropertyResolver::get_property], falling back to `default`
    pub fn get_property_or(&self, key: &str, default: &str) -> Result<String, PropertyError> {
        self.lookup_or(key, default, 0)
    }

    pub fn get_required_property(&self, key: &str) -> Result<String, PropertyError> {
        self.lookup_required(key, 0)
    }

    /// Looks up and converts to `T`, `Ok(None)` if missing
    pub fn get<T: 'static>(&self, key: &str) -> Result<Option<T>, PropertyError> {
        self.get_property(key)?
            .map(|value| self.converters.convert_to::<T>(&value))
            .transpose()
    }

    pub fn get_or<T: 'static>(&self, key: &str, default: T) -> Result<T, PropertyError> {
        Ok(self.get(key)?.unwrap_or(default))
    }

    pub fn get_required<T: 'static>(&self, key: &str) -> Result<T, PropertyError> {
        let value = self.get_required_property(key)?;
        self.converters.convert_to::<T>(&value)
    }

    /// Looks up and converts to a type only known at runtime
    pub fn get_required_as(&self, key: &str, target: TypeInfo) -> Result<PropertyValue, PropertyError> {
        let value = self.get_required_property(key)?;
        self.converters.convert(&value, target)
    }

    fn lookup(&self, key: &str, depth: usize) -> Result<Option<String>, PropertyError> {
        if depth > MAX_NESTING {
            return Err(PropertyError::TooDeep(key.to_string()));
        }

        if let Some(expr) = PropertyExpr::parse(key) {
            return match expr.default {
                Some(default) => self.lookup_or(expr.key, default, depth + 1).map(Some),
                None => self.lookup_required(expr.key, depth + 1).map(Some),
            };
        }

        match self.properties.get(key) {
            Some(value) => self.parse_value(value, depth + 1).map(Some),
            None => Ok(None),
        }
    }

    fn lookup_or(&self, key: &str, default: &str, depth: usize) -> Result<String, PropertyError> {
        match self.lookup(key, depth)? {
            Some(value) => Ok(value),
            None => self.parse_value(default, depth + 1),
        }
    }

    fn lookup_required(&self, key: &str, depth: usize) -> Result<String, PropertyError> {
        self.lookup(key, depth)?
            .ok_or_else(|| PropertyError::NotFound(key.to_string()))
    }

    /// Resolves `value` if it is an expression
    fn parse_value(&self, value: &str, depth: usize) -> Result<String, PropertyError> {
        match PropertyExpr::parse(value) {
            Some(_) => self.lookup_required(value, depth),
            None => Ok(value.to_string()),
        }
    }
}

impl ValueResolver for PropertyResolver {
    fn resolve_required(&self, expression: &str, target: TypeInfo) -> Result<PropertyValue, DynError> {
        Ok(self.get_required_as(expression, target)?)
    }
}

fn join_key(prefix: &str, key: &str) -> String {
    match prefix.is_empty() {
        true => key.to_string(),
        false => format!("{prefix}.{key}"),
    }
}

fn flatten_table(prefix: &str, table: &toml::Table, properties: &mut HashMap<String, String>) {
    for (key, value) in table {
        flatten_value(&join_key(prefix, key), value, properties);
    }
}

fn flatten_value(key: &str, value: &toml::Value, properties: &mut HashMap<String, String>) {
    match value {
        toml::Value::Table(table) => flatten_table(key, table, properties),
        toml::Value::Array(items) if items.iter().any(toml::Value::is_table) => {
            for (index, item) in items.iter().enumerate() {
                flatten_value(&join_key(key, &index.to_string()), item, properties);
            }
        }
        toml::Value::Array(items) => {
            let joined: Vec<String> = items.iter().filter_map(|item| scalar(key, item)).collect();
            properties.insert(key.to_string(), joined.join(","));
        }
        scalar_value => {
            if let Some(value) = scalar(key, scalar_value) {
                properties.insert(key.to_string(), value);
            }
        }
    }
}

fn scalar(key: &str, value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(value) => Some(value.clone()),
        toml::Value::Integer(value) => Some(value.to_string()),
        toml::Value::Float(value) => Some(value.to_string()),
        toml::Value::Boolean(value) => Some(value.to_string()),
        toml::Value::Datetime(value) => Some(value.to_string()),
        toml::Value::Array(_) | toml::Value::Table(_) => {
            warn!("Ignoring nested value in array '{key}'");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn resolver() -> PropertyResolver {
        PropertyResolver::from_map([
            ("app.title", "Beanstalk"),
            ("app.version", "1.2"),
            ("app.alias", "${app.title}"),
            ("app.fallback", "${app.subtitle:none}"),
            ("APP_NAME", "from-env"),
            ("loop.a", "${loop.b}"),
            ("loop.b", "${loop.a}"),
        ])
    }

    #[test]
    fn plain_keys() {
        let properties = resolver();
        assert_eq!(properties.get_property("app.title").unwrap().as_deref(), Some("Beanstalk"));
        assert_eq!(properties.get_property("app.missing").unwrap(), None);
        assert_eq!(properties.get_property_or("app.missing", "x").unwrap(), "x");
    }

    #[test]
    fn expressions() {
        let properties = resolver();
        assert_eq!(properties.get_required_property("${app.title}").unwrap(), "Beanstalk");
        assert_eq!(properties.get_required_property("${app.subtitle:}").unwrap(), "");
        assert!(matches!(
            properties.get_property("${app.subtitle}"),
            Err(PropertyError::NotFound(ref key)) if key == "app.subtitle"
        ));
    }

    #[test]
    fn nested_defaults() {
        let properties = resolver();
        assert_eq!(
            properties.get_required_property("${app.subtitle:${APP_NAME:Beanstalk}}").unwrap(),
            "from-env"
        );
        assert_eq!(
            properties.get_required_property("${app.subtitle:${APP_LABEL:Beanstalk}}").unwrap(),
            "Beanstalk"
        );
    }

    #[test]
    fn values_referring_to_other_values() {
        let properties = resolver();
        assert_eq!(properties.get_required_property("app.alias").unwrap(), "Beanstalk");
        assert_eq!(properties.get_required_property("${app.fallback}").unwrap(), "none");
        assert!(matches!(
            properties.get_property("loop.a"),
            Err(PropertyError::TooDeep(_))
        ));
    }

    #[test]
    fn typed_lookups() {
        let properties = resolver();
        assert_eq!(properties.get::<f32>("app.version").unwrap(), Some(1.2));
        assert_eq!(properties.get::<u32>("app.missing").unwrap(), None);
        assert_eq!(properties.get_or::<u32>("app.missing", 7).unwrap(), 7);
        assert!(matches!(
            properties.get_required::<u32>("app.title"),
            Err(PropertyError::Conversion { .. })
        ));
    }

    #[test]
    fn later_sources_override() {
        let properties = resolver()
            .with_property("app.title", "Sprout")
            .with_properties([("app.version", "2.0")]);
        assert_eq!(properties.get_required_property("app.alias").unwrap(), "Sprout");
        assert_eq!(properties.get_required::<f64>("app.version").unwrap(), 2.0);
    }

    #[test]
    fn toml_documents_are_flattened() {
        let properties = PropertyResolver::from_toml_str(
            r#"
            name = "demo"

            [server]
            port = 8080
            secure = false
            ratio = 0.75
            hosts = ["a.example", "b.example"]

            [server.limits]
            timeout = "1m"

            [[listeners]]
            port = 80

            [[listeners]]
            port = 443
            "#,
        )
        .unwrap();

        assert_eq!(properties.get_required::<String>("name").unwrap(), "demo");
        assert_eq!(properties.get_required::<u16>("server.port").unwrap(), 8080);
        assert!(!properties.get_required::<bool>("server.secure").unwrap());
        assert_eq!(properties.get_required::<f64>("server.ratio").unwrap(), 0.75);
        assert_eq!(
            properties.get_required_property("server.hosts").unwrap(),
            "a.example,b.example"
        );
        assert_eq!(
            properties.get_required::<std::time::Duration>("server.limits.timeout").unwrap(),
            std::time::Duration::from_secs(60)
        );
        assert_eq!(properties.get_required::<u16>("listeners.1.port").unwrap(), 443);
    }

    #[test]
    fn invalid_toml_is_rejected() {
        let err = PropertyResolver::from_toml_str("server = [").unwrap_err();
        assert!(matches!(err, PropertyError::Toml(_)));
    }

    #[test]
    fn custom_converters() {
        #[derive(Debug, PartialEq)]
        struct Port(u16);

        let mut properties = PropertyResolver::from_map([("port", "http")]);
        properties.register_converter(|value: &str| match value {
            "http" => Ok(Port(80)),
            "https" => Ok(Port(443)),
            other => Err(format!("unknown scheme '{other}'").into()),
        });
        assert_eq!(properties.get_required::<Port>("port").unwrap(), Port(80));
    }

    #[test]
    fn resolves_values_for_the_container() {
        let properties = resolver();
        let value = properties
            .resolve_required("${app.version:0}", TypeInfo::of::<f64>())
            .unwrap();
        assert_eq!(*value.downcast::<f64>().unwrap(), 1.2);

        assert!(properties
            .resolve_required("${app.port}", TypeInfo::of::<u16>())
            .is_err());
    }
}
