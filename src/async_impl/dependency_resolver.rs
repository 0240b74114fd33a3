use super::teardown::AsyncTeardownGuard;
use crate::{
    any::TypeInfo,
    arguments::Arguments,
    chain::Chain,
    context::ActiveContext,
    dependency::{Dependencies, Dependency},
    dependency_resolver::select_candidate,
    errors::ResolveErrorKind,
};

#[inline]
pub(crate) async fn resolve_dependency(
    chain: &Chain,
    dependency: &Dependency,
    path: &[TypeInfo],
) -> Result<ActiveContext, ResolveErrorKind> {
    let type_info = select_candidate(chain, dependency)?;
    ActiveContext::acquire_async_in(chain.clone(), type_info, path.to_vec()).await
}

/// Async counterpart of [`crate::dependency_resolver::resolve_dependencies`].
pub(crate) async fn resolve_dependencies(
    chain: &Chain,
    dependencies: &Dependencies,
    arguments: &mut Arguments,
    opened: &mut AsyncTeardownGuard,
) -> Result<(), ResolveErrorKind> {
    for dependency in dependencies {
        if arguments.contains(dependency.name) {
            continue;
        }

        let context = resolve_dependency(chain, dependency, &[]).await?;
        arguments.insert_any(dependency.name, context.type_info, context.value_any());
        opened.push(context);
    }
    Ok(())
}
