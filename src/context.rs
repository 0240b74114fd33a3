use alloc::{boxed::Box, sync::Arc, vec::Vec};
use core::{
    fmt::{self, Debug, Formatter},
    mem,
};
use tracing::{debug, debug_span, error};

use crate::{
    any::{RcAny, TypeInfo},
    arguments::Arguments,
    chain::Chain,
    dependency_resolver::resolve_dependency,
    errors::{FinalizeErrorKind, ResolveErrorKind},
    provider::Provider,
    service::Service as _,
    teardown::{close_all, TeardownGuard},
};

/// One realized provider invocation on a chain.
///
/// A context is either shared, when the chain already had a live value of its type and releasing it does nothing,
/// or active, when it acquired the value itself and owns the contexts of the provider's dependencies.
/// Releasing an active context restores the live value it displaced, finalizes its value and releases its children.
pub struct ActiveContext {
    pub(crate) type_info: TypeInfo,
    pub(crate) state: State,
}

pub(crate) enum State {
    Shared {
        value: RcAny,
    },
    Active {
        value: RcAny,
        provider: Provider,
        chain: Chain,
        installed: Option<Installed>,
        children: Vec<ActiveContext>,
    },
    Closed,
}

/// Id of a live value installed on the chain.
pub(crate) struct Installed {
    pub(crate) id: u64,
}

impl ActiveContext {
    /// Acquires a value of the type on the sync path.
    ///
    /// # Errors
    /// - Returns [`ResolveErrorKind::CyclicDependency`] if the provider depends on its own type through its dependencies
    /// - Returns [`ResolveErrorKind::NoProvider`] or [`ResolveErrorKind::NoActiveProvider`] if there is no provider to call
    /// - Returns [`ResolveErrorKind::AsyncInSyncContext`] if the active provider is async
    /// - Returns [`ResolveErrorKind::Dependency`] if a dependency of the provider can't be resolved
    /// - Returns [`ResolveErrorKind::Instantiate`] if the provider fails
    #[inline]
    pub fn acquire(chain: &Chain, type_info: TypeInfo) -> Result<Self, ResolveErrorKind> {
        Self::acquire_in(chain, type_info, &[])
    }

    /// Acquires a value of the type for a provider being resolved, `path` holds the types resolved above it.
    pub(crate) fn acquire_in(chain: &Chain, type_info: TypeInfo, path: &[TypeInfo]) -> Result<Self, ResolveErrorKind> {
        let span = debug_span!("resolve", dependency = type_info.name);
        let _guard = span.enter();

        if let Some(value) = chain.live(type_info) {
            debug!("Found in chain");
            return Ok(Self::shared(type_info, value));
        }
        debug!("Not found in chain");

        let path = extend_path(path, type_info).inspect_err(|err| error!("{}", err))?;
        let provider = chain.lookup(type_info).inspect_err(|err| error!("{}", err))?;
        let Some(mut instantiator) = provider.sync_instantiator() else {
            let err = ResolveErrorKind::AsyncInSyncContext { type_info };
            error!("{}", err);
            return Err(err);
        };

        let mut children = TeardownGuard::new();
        let mut arguments = Arguments::new();
        for dependency in provider.dependencies() {
            match resolve_dependency(chain, dependency, &path) {
                Ok(context) => {
                    arguments.insert_any(dependency.name, context.type_info, context.value_any());
                    children.push(context);
                }
                Err(source) => {
                    let err = ResolveErrorKind::Dependency {
                        name: dependency.name,
                        source: Box::new(source),
                    };
                    error!("{}", err);
                    if let Err(err) = children.close() {
                        error!("Failed to release dependencies: {}", err);
                    }
                    return Err(err);
                }
            }
        }

        let value = match instantiator.call(arguments) {
            Ok(value) => value,
            Err(source) => {
                let err = ResolveErrorKind::Instantiate { type_info, source };
                error!("{}", err);
                if let Err(err) = children.close() {
                    error!("Failed to release dependencies: {}", err);
                }
                return Err(err);
            }
        };
        debug!("Acquired");

        Ok(Self::active(chain, type_info, value, provider, children.into_inner()))
    }

    #[inline]
    #[must_use]
    pub(crate) fn shared(type_info: TypeInfo, value: RcAny) -> Self {
        Self {
            type_info,
            state: State::Shared { value },
        }
    }

    pub(crate) fn active(chain: &Chain, type_info: TypeInfo, value: RcAny, provider: Provider, children: Vec<ActiveContext>) -> Self {
        let installed = if provider.config().cache_provides {
            let id = chain.install(type_info, value.clone());
            debug!(id, "Installed");
            Some(Installed { id })
        } else {
            None
        };

        Self {
            type_info,
            state: State::Active {
                value,
                provider,
                chain: chain.clone(),
                installed,
                children,
            },
        }
    }

    #[inline]
    #[must_use]
    pub fn type_info(&self) -> TypeInfo {
        self.type_info
    }

    /// Returns the value, or `None` once released or if it isn't a `T`.
    #[must_use]
    pub fn value<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        match &self.state {
            State::Shared { value } | State::Active { value, .. } => value.clone().downcast().ok(),
            State::Closed => None,
        }
    }

    /// # Panics
    /// If the context is already released
    pub(crate) fn value_any(&self) -> RcAny {
        match &self.state {
            State::Shared { value } | State::Active { value, .. } => value.clone(),
            State::Closed => unreachable!("Value of a released context requested"),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_shared(&self) -> bool {
        matches!(self.state, State::Shared { .. })
    }

    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self.state, State::Closed)
    }

    /// Returns `true` if releasing this context or one of its children needs the async path.
    #[must_use]
    pub fn needs_async(&self) -> bool {
        match &self.state {
            State::Active { provider, children, .. } => provider.has_async_finalizer() || children.iter().any(Self::needs_async),
            State::Shared { .. } | State::Closed => false,
        }
    }

    /// Releases the context on the sync path. Releasing a closed or shared context does nothing.
    ///
    /// Every step runs even if an earlier one fails, the first error is returned.
    ///
    /// # Errors
    /// - Returns [`FinalizeErrorKind::AsyncInSyncContext`] if the provider or a child has an async finalizer
    /// - Returns [`FinalizeErrorKind::Custom`] if a finalizer fails
    pub fn release(&mut self) -> Result<(), FinalizeErrorKind> {
        let State::Active {
            value,
            provider,
            chain,
            installed,
            children,
        } = mem::replace(&mut self.state, State::Closed)
        else {
            return Ok(());
        };

        let span = debug_span!("release", dependency = self.type_info.name);
        let _guard = span.enter();

        if let Some(Installed { id }) = installed {
            chain.uninstall(self.type_info, id);
        }

        let finalized = provider.finalize(value);
        let children_closed = close_all(children);
        debug!("Released");

        merge_results(finalized, children_closed)
    }
}

impl Debug for ActiveContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let state = match &self.state {
            State::Shared { .. } => "shared",
            State::Active { .. } => "active",
            State::Closed => "closed",
        };
        f.debug_struct("ActiveContext")
            .field("type_info", &self.type_info)
            .field("state", &state)
            .finish()
    }
}

/// Appends `type_info` to the path of types being resolved by one acquisition.
///
/// # Errors
/// Returns [`ResolveErrorKind::CyclicDependency`] if the type is already on the path
pub(crate) fn extend_path(path: &[TypeInfo], type_info: TypeInfo) -> Result<Vec<TypeInfo>, ResolveErrorKind> {
    if let Some(index) = path.iter().position(|resolving| *resolving == type_info) {
        let mut cycle = path[index..].to_vec();
        cycle.push(type_info);
        return Err(ResolveErrorKind::CyclicDependency {
            path: cycle.into_boxed_slice(),
        });
    }

    let mut path = path.to_vec();
    path.push(type_info);
    Ok(path)
}

/// Keeps the first error, logging the second one.
pub(crate) fn merge_results(first: Result<(), FinalizeErrorKind>, second: Result<(), FinalizeErrorKind>) -> Result<(), FinalizeErrorKind> {
    match (first, second) {
        (Err(err), Err(suppressed)) => {
            error!("Teardown error suppressed: {}", suppressed);
            Err(err)
        }
        (Err(err), Ok(())) | (Ok(()), Err(err)) => Err(err),
        (Ok(()), Ok(())) => Ok(()),
    }
}
