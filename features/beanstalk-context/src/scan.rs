use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::{
    errors::DefinitionError,
    metadata::{Catalog, ClassMeta, Marker, MarkerKind},
};

/// Turns an entry class into the qualified names of all candidate classes
pub trait ClassScanner {
    fn scan(&self, catalog: &Catalog, root: &ClassMeta) -> Result<BTreeSet<&'static str>, DefinitionError>;
}

/// Selects catalog entries by module path
///
/// Packages come from the root's `ComponentScan` marker, defaulting to the module the
/// root is declared in. Classes named by the root's `Import` marker are added as well.
#[derive(Debug, Default, Clone, Copy)]
pub struct ModuleScanner;

impl ModuleScanner {
    fn packages(catalog: &Catalog, root: &ClassMeta) -> Result<Vec<String>, DefinitionError> {
        let scan = catalog.find_marker(&root.markers, MarkerKind::ComponentScan, root.name())?;
        match scan {
            Some(Marker::ComponentScan(packages)) if !packages.is_empty() => Ok(packages),
            _ => Ok(vec![root.info().module_path().to_string()]),
        }
    }
}

fn in_package(module_path: &str, package: &str) -> bool {
    module_path == package
        || module_path
            .strip_prefix(package)
            .is_some_and(|rest| rest.starts_with("::"))
}

impl ClassScanner for ModuleScanner {
    fn scan(&self, catalog: &Catalog, root: &ClassMeta) -> Result<BTreeSet<&'static str>, DefinitionError> {
        let packages = Self::packages(catalog, root)?;
        info!("Component scan in packages: {packages:?}");

        let mut names = BTreeSet::new();
        for package in &packages {
            debug!("Scan package: {package}");
            for class in catalog.classes() {
                if in_package(class.info().module_path(), package) {
                    debug!("Class found by scan: {}", class.name());
                    names.insert(class.name());
                }
            }
        }

        let imports = root.markers.iter().filter_map(|marker| match marker {
            Marker::Import(types) => Some(types),
            _ => None,
        });
        for imported in imports.flatten() {
            let class = catalog
                .by_type(imported.type_id)
                .ok_or_else(|| DefinitionError::UnknownClass(imported.type_name.to_string()))?;

            if names.insert(class.name()) {
                debug!("Class found by import: {}", class.name());
            } else {
                warn!("Ignore import: {} as it is already scanned", class.name());
            }
        }

        Ok(names)
    }
}
