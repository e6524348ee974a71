use std::collections::BTreeMap;

use tracing::debug;

use crate::{
    definition::BeanDefinition,
    errors::{DefinitionError, RequireError},
    types::TypeInfo,
};

/// Store of all bean definitions, keyed by bean name
#[derive(Debug, Default, Clone)]
pub struct Registry {
    definitions: BTreeMap<String, BeanDefinition>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a definition, names must be unique
    pub fn insert(&mut self, definition: BeanDefinition) -> Result<(), DefinitionError> {
        if self.definitions.contains_key(definition.name()) {
            return Err(DefinitionError::DuplicateBeanName(
                definition.name().to_string(),
            ));
        }

        debug!("Define bean: {definition}");
        self.definitions
            .insert(definition.name().to_string(), definition);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&BeanDefinition> {
        self.definitions.get(name)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut BeanDefinition> {
        self.definitions.get_mut(name)
    }

    /// All definitions, by name
    pub fn iter(&self) -> impl Iterator<Item = &BeanDefinition> {
        self.definitions.values()
    }

    /// Names of the definitions matching `filter`, sorted by order then name
    pub fn sorted_names(&self, filter: impl Fn(&BeanDefinition) -> bool) -> Vec<String> {
        let mut matching: Vec<_> = self.iter().filter(|definition| filter(definition)).collect();
        matching.sort_by(|a, b| a.cmp_order(b));
        matching
            .into_iter()
            .map(|definition| definition.name().to_string())
            .collect()
    }

    /// Every definition assignable to `ty`, sorted by order then name
    pub fn find_all(&self, ty: TypeInfo) -> Vec<&BeanDefinition> {
        let mut matching: Vec<_> = self
            .iter()
            .filter(|definition| definition.is_assignable_to(ty.type_id))
            .collect();
        matching.sort_by(|a, b| a.cmp_order(b));
        matching
    }

    /// The single definition assignable to `ty`
    ///
    /// With more than one match exactly one of them must be primary.
    pub fn find_by_type(&self, ty: TypeInfo) -> Result<Option<&BeanDefinition>, RequireError> {
        let matching = self.find_all(ty);
        if matching.len() <= 1 {
            return Ok(matching.into_iter().next());
        }

        let mut primaries = matching.into_iter().filter(|definition| definition.is_primary());
        match (primaries.next(), primaries.next()) {
            (Some(primary), None) => Ok(Some(primary)),
            (None, _) => Err(RequireError::NoPrimary(ty)),
            (Some(_), Some(_)) => Err(RequireError::MultiplePrimaries(ty)),
        }
    }

    /// The definition called `name`, which must be assignable to `ty`
    pub fn find_named(&self, name: &str, ty: TypeInfo) -> Result<Option<&BeanDefinition>, RequireError> {
        let Some(definition) = self.get(name) else {
            return Ok(None);
        };

        if !definition.is_assignable_to(ty.type_id) {
            return Err(RequireError::NotOfRequiredType {
                bean: name.to_string(),
                required: ty.type_name,
                actual: definition.info().type_name,
            });
        }
        Ok(Some(definition))
    }

    /// Lookup by name if one is given, by type otherwise
    pub fn find(&self, name: &str, ty: TypeInfo) -> Result<Option<&BeanDefinition>, RequireError> {
        match name.is_empty() {
            true => self.find_by_type(ty),
            false => self.find_named(name, ty),
        }
    }
}
