use crate::{
    definition::LifecycleHook,
    errors::{DefinitionError, InitError},
    metadata::Catalog,
    resolver::Args,
    types::Instance,
};

/// Invokes an init or destroy hook on `target`
///
/// Named hooks are looked up on the runtime type of `target` and must not take arguments.
pub(crate) fn invoke_hook(
    catalog: &Catalog,
    bean: &str,
    hook: &LifecycleHook,
    target: &Instance,
) -> Result<(), InitError> {
    let method = match hook {
        LifecycleHook::None => return Ok(()),
        LifecycleHook::Method(method) => method,
        LifecycleHook::Named(name) => {
            let runtime = target.info();
            catalog
                .by_type(runtime.type_id)
                .and_then(|class| class.method(name))
                .filter(|method| method.params.is_empty())
                .ok_or_else(|| DefinitionError::HookNotFound {
                    class: runtime.type_name,
                    method: name.clone(),
                })?
        }
    };

    tracing::debug!("Invoke hook '{}' of bean '{bean}'", method.name);
    method
        .invoke(&**target.raw(), &mut Args::default())
        .map(|_| ())
        .map_err(|error| InitError::creation(bean, error))
}
