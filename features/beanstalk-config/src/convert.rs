use std::{
    any::TypeId, collections::HashMap, error::Error, path::PathBuf, str::FromStr, sync::Arc,
    time::Duration,
};

use beanstalk_context::{DynError, PropertyValue, TypeInfo};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

use crate::errors::PropertyError;

type ConvertFn = Arc<dyn Fn(&str) -> Result<PropertyValue, DynError> + Send + Sync>;

/// Converters from property strings to typed values, keyed by target type
///
/// The default set covers `String`, `bool`, `char`, every integer and float primitive,
/// `PathBuf`, `Duration` (humantime syntax, e.g. `1h 30m`) and the chrono date and
/// time types. `DateTime<FixedOffset>` expects RFC 3339.
#[derive(Clone)]
pub struct Converters {
    by_type: HashMap<TypeId, (TypeInfo, ConvertFn)>,
}
impl std::fmt::Debug for Converters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set()
            .entries(self.by_type.values().map(|(info, _)| info.type_name))
            .finish()
    }
}

impl Default for Converters {
    fn default() -> Self {
        let mut converters = Self::empty();
        converters.register(|value: &str| Ok(value.to_string()));
        converters.parsed::<bool>();
        converters.parsed::<char>();

        converters.parsed::<i8>();
        converters.parsed::<i16>();
        converters.parsed::<i32>();
        converters.parsed::<i64>();
        converters.parsed::<i128>();
        converters.parsed::<isize>();
        converters.parsed::<u8>();
        converters.parsed::<u16>();
        converters.parsed::<u32>();
        converters.parsed::<u64>();
        converters.parsed::<u128>();
        converters.parsed::<usize>();
        converters.parsed::<f32>();
        converters.parsed::<f64>();

        converters.parsed::<PathBuf>();
        converters.register(|value: &str| Ok(humantime::parse_duration(value.trim())?));
        converters.parsed::<NaiveDate>();
        converters.parsed::<NaiveTime>();
        converters.parsed::<NaiveDateTime>();
        converters.register(|value: &str| Ok(DateTime::parse_from_rfc3339(value.trim())?));
        converters
    }
}

impl Converters {
    /// No converters at all, not even for `String`
    pub fn empty() -> Self {
        Converters {
            by_type: HashMap::new(),
        }
    }

    /// Adds or replaces the converter for `T`
    pub fn register<T, F>(&mut self, convert: F)
    where
        T: Send + Sync + 'static,
        F: Fn(&str) -> Result<T, DynError> + Send + Sync + 'static,
    {
        let convert: ConvertFn = Arc::new(move |value: &str| {
            let converted: PropertyValue = Box::new(convert(value)?);
            Ok(converted)
        });
        self.by_type
            .insert(TypeId::of::<T>(), (TypeInfo::of::<T>(), convert));
    }

    fn parsed<T>(&mut self)
    where
        T: FromStr + Send + Sync + 'static,
        T::Err: Error + Send + Sync + 'static,
    {
        self.register(|value: &str| Ok(value.trim().parse::<T>()?));
    }

    pub fn supports(&self, target: TypeInfo) -> bool {
        self.by_type.contains_key(&target.type_id)
    }

    pub fn convert(&self, value: &str, target: TypeInfo) -> Result<PropertyValue, PropertyError> {
        let (_, convert) = self
            .by_type
            .get(&target.type_id)
            .ok_or(PropertyError::UnsupportedType(target))?;

        convert(value).map_err(|source| PropertyError::Conversion {
            value: value.to_string(),
            target,
            source,
        })
    }

    /// Converts and unboxes in one go
    pub fn convert_to<T: 'static>(&self, value: &str) -> Result<T, PropertyError> {
        let target = TypeInfo::of::<T>();
        let converted = self.convert(value, target)?;
        converted
            .downcast::<T>()
            .map(|converted| *converted)
            .map_err(|_| PropertyError::Conversion {
                value: value.to_string(),
                target,
                source: "converter produced a different type".into(),
            })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, Timelike};
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn primitives() {
        let converters = Converters::default();
        assert_eq!(converters.convert_to::<String>(" spaced ").unwrap(), " spaced ");
        assert!(converters.convert_to::<bool>("true").unwrap());
        assert_eq!(converters.convert_to::<char>("x").unwrap(), 'x');
        assert_eq!(converters.convert_to::<u16>(" 8080").unwrap(), 8080);
        assert_eq!(converters.convert_to::<i64>("-42").unwrap(), -42);
        assert_eq!(converters.convert_to::<f64>("0.5").unwrap(), 0.5);
        assert_eq!(
            converters.convert_to::<PathBuf>("/var/log").unwrap(),
            PathBuf::from("/var/log")
        );
    }

    #[test]
    fn durations_and_dates() {
        let converters = Converters::default();
        assert_eq!(
            converters.convert_to::<Duration>("1h 30m").unwrap(),
            Duration::from_secs(90 * 60)
        );
        assert_eq!(
            converters.convert_to::<NaiveDate>("2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert_eq!(converters.convert_to::<NaiveTime>("08:15:00").unwrap().hour(), 8);
        assert!(converters
            .convert_to::<NaiveDateTime>("2024-02-29T08:15:00")
            .is_ok());

        let zoned = converters
            .convert_to::<DateTime<FixedOffset>>("2024-02-29T08:15:00+02:00")
            .unwrap();
        assert_eq!(zoned.offset().local_minus_utc(), 2 * 3600);
    }

    #[test]
    fn failures_name_value_and_type() {
        let converters = Converters::default();

        let err = converters.convert_to::<u8>("300").unwrap_err();
        assert!(matches!(
            err,
            PropertyError::Conversion { ref value, target, .. }
                if value == "300" && target == TypeInfo::of::<u8>()
        ));

        struct Unknown;
        let err = converters.convert("x", TypeInfo::of::<Unknown>()).unwrap_err();
        assert!(matches!(err, PropertyError::UnsupportedType(_)));
    }

    #[test]
    fn custom_converters() {
        #[derive(Debug, PartialEq)]
        struct Level(u8);

        let mut converters = Converters::empty();
        assert!(!converters.supports(TypeInfo::of::<String>()));

        converters.register(|value: &str| match value {
            "low" => Ok(Level(1)),
            "high" => Ok(Level(9)),
            other => Err(format!("unknown level '{other}'").into()),
        });
        assert_eq!(converters.convert_to::<Level>("high").unwrap(), Level(9));
        assert!(converters.convert_to::<Level>("medium").is_err());
    }
}
