use std::{
    any::TypeId,
    collections::{BTreeMap, HashMap, HashSet},
};

use crate::{
    errors::DefinitionError,
    metadata::{ClassMeta, Marker, MarkerKind, MethodMeta, TypeKind},
};

/// All known classes, by qualified name and by type
///
/// This is what the container reads instead of reflecting on types.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    classes: BTreeMap<&'static str, ClassMeta>,
    by_type: HashMap<TypeId, &'static str>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, class: ClassMeta) -> Result<(), DefinitionError> {
        let name = class.name();
        if self.classes.contains_key(name) {
            return Err(DefinitionError::DuplicateClass(name));
        }

        self.by_type.insert(class.info().type_id, name);
        self.classes.insert(name, class);
        Ok(())
    }

    /// Registers all classes, failing on the first duplicate
    pub fn with(mut self, classes: impl IntoIterator<Item = ClassMeta>) -> Result<Self, DefinitionError> {
        for class in classes {
            self.register(class)?;
        }
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&ClassMeta> {
        self.classes.get(name)
    }

    pub fn by_type(&self, type_id: TypeId) -> Option<&ClassMeta> {
        self.by_type
            .get(&type_id)
            .and_then(|name| self.classes.get(name))
    }

    /// All classes, ordered by qualified name
    pub fn classes(&self) -> impl Iterator<Item = &ClassMeta> {
        self.classes.values()
    }

    /// Finds the marker of `kind`, either directly in `markers` or through the markers
    /// of the user declared marker types used there.
    ///
    /// Finding it more than once is an error.
    pub fn find_marker(
        &self,
        markers: &[Marker],
        kind: MarkerKind,
        owner: &str,
    ) -> Result<Option<Marker>, DefinitionError> {
        Ok(self
            .find_marker_usage(markers, kind, owner)?
            .map(|(_, found)| found))
    }

    /// Like [Catalog::find_marker], but also returns the usage in `markers` that led to it
    pub fn find_marker_usage<'m>(
        &self,
        markers: &'m [Marker],
        kind: MarkerKind,
        owner: &str,
    ) -> Result<Option<(&'m Marker, Marker)>, DefinitionError> {
        let mut result: Option<(&'m Marker, Marker)> = None;
        for usage in markers {
            let found = if usage.kind() == kind {
                Some(usage.clone())
            } else {
                let mut visited = HashSet::new();
                self.find_meta(usage, kind, owner, &mut visited)?
            };

            if let Some(found) = found {
                if result.is_some() {
                    return Err(self.duplicate(kind, owner));
                }
                result = Some((usage, found));
            }
        }

        Ok(result)
    }

    /// Searches the meta chain behind a single marker usage
    fn find_meta(
        &self,
        usage: &Marker,
        kind: MarkerKind,
        owner: &str,
        visited: &mut HashSet<TypeId>,
    ) -> Result<Option<Marker>, DefinitionError> {
        let ty = match usage {
            // Configuration classes are components
            Marker::Configuration { .. } if kind == MarkerKind::Component => {
                return Ok(Some(Marker::component("")));
            }
            Marker::Annotation { ty, .. } => ty,
            _ => return Ok(None),
        };

        if !visited.insert(ty.type_id) {
            return Ok(None);
        }
        let Some(declaration) = self
            .by_type(ty.type_id)
            .filter(|class| class.kind == TypeKind::Annotation)
        else {
            return Ok(None);
        };

        let mut result = None;
        for meta in &declaration.markers {
            let found = if meta.kind() == kind {
                Some(meta.clone())
            } else {
                self.find_meta(meta, kind, owner, visited)?
            };

            if let Some(found) = found {
                if result.is_some() {
                    return Err(self.duplicate(kind, owner));
                }
                result = Some(found);
            }
        }

        Ok(result)
    }

    fn duplicate(&self, kind: MarkerKind, owner: &str) -> DefinitionError {
        let marker = match kind {
            MarkerKind::Annotation(type_id) => match self.by_type(type_id) {
                Some(declaration) => format!("@{}", declaration.info().simple_name()),
                None => kind.to_string(),
            },
            _ => kind.to_string(),
        };

        DefinitionError::DuplicateMarker {
            marker,
            owner: owner.to_string(),
        }
    }

    /// Bean name of a component class
    ///
    /// The value of the `Component` marker, or of the marker usage carrying it, or the
    /// simple type name with a lower case first letter.
    pub fn bean_name(&self, class: &ClassMeta) -> Result<String, DefinitionError> {
        let name = self
            .find_marker_usage(&class.markers, MarkerKind::Component, class.name())?
            .and_then(|(usage, _)| usage.value())
            .unwrap_or_default();

        if name.is_empty() {
            return Ok(lower_first(class.info().simple_name()));
        }
        Ok(name.to_string())
    }
}

/// Bean name of a factory method, the `Bean` marker value or the method name
pub fn method_bean_name(method: &MethodMeta) -> String {
    let explicit = method.markers.iter().find_map(|marker| match marker {
        Marker::Bean { name, .. } if !name.is_empty() => Some(name.as_str()),
        _ => None,
    });

    match explicit {
        Some(name) => name.to_string(),
        None => lower_first(method.name),
    }
}

fn lower_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
