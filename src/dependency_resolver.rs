use tracing::error;

use crate::{
    any::TypeInfo,
    arguments::Arguments,
    chain::Chain,
    context::ActiveContext,
    dependency::{Dependencies, Dependency},
    errors::ResolveErrorKind,
    teardown::TeardownGuard,
};

/// Picks the candidate type of a dependency: the first one with a live value or an active binding on the chain.
///
/// # Errors
/// - Returns the lookup error of the only candidate if the dependency isn't a union
/// - Returns [`ResolveErrorKind::NoActiveCandidate`] if no candidate of a union is available
pub(crate) fn select_candidate(chain: &Chain, dependency: &Dependency) -> Result<TypeInfo, ResolveErrorKind> {
    if let Some(type_info) = dependency
        .candidates
        .iter()
        .copied()
        .find(|type_info| chain.is_available(*type_info))
    {
        return Ok(type_info);
    }

    let err = match &*dependency.candidates {
        [type_info] => match chain.lookup(*type_info) {
            Ok(_) => return Ok(*type_info),
            Err(err) => err,
        },
        candidates => ResolveErrorKind::NoActiveCandidate {
            name: dependency.name,
            candidates: candidates.into(),
        },
    };
    error!("{}", err);
    Err(err)
}

/// Acquires the selected candidate of a dependency, `path` holds the types being resolved above it.
#[inline]
pub(crate) fn resolve_dependency(chain: &Chain, dependency: &Dependency, path: &[TypeInfo]) -> Result<ActiveContext, ResolveErrorKind> {
    ActiveContext::acquire_in(chain, select_candidate(chain, dependency)?, path)
}

/// Resolves every declared dependency the caller didn't supply, recording the opened contexts in `opened`.
pub(crate) fn resolve_dependencies(
    chain: &Chain,
    dependencies: &Dependencies,
    arguments: &mut Arguments,
    opened: &mut TeardownGuard,
) -> Result<(), ResolveErrorKind> {
    for dependency in dependencies {
        if arguments.contains(dependency.name) {
            continue;
        }

        let context = resolve_dependency(chain, dependency, &[])?;
        arguments.insert_any(dependency.name, context.type_info, context.value_any());
        opened.push(context);
    }
    Ok(())
}
