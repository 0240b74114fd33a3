use alloc::{boxed::Box, vec::Vec};
use core::mem;
use tracing::{debug, debug_span, error, Instrument as _};

use super::{dependency_resolver::resolve_dependency, teardown::AsyncTeardownGuard};
use crate::{
    any::TypeInfo,
    arguments::Arguments,
    chain::Chain,
    context::{extend_path, merge_results, ActiveContext, Installed, State},
    errors::{FinalizeErrorKind, ResolveErrorKind},
    utils::future::BoxFuture,
};

impl ActiveContext {
    /// Acquires a value of the type on the async path. Both sync and async providers can be used.
    ///
    /// Dropping the future before it completes releases the dependencies already acquired for it.
    ///
    /// # Errors
    /// Same as [`ActiveContext::acquire`], except that async providers are accepted
    #[inline]
    pub fn acquire_async(chain: Chain, type_info: TypeInfo) -> BoxFuture<'static, Result<Self, ResolveErrorKind>> {
        Self::acquire_async_in(chain, type_info, Vec::new())
    }

    pub(crate) fn acquire_async_in(
        chain: Chain,
        type_info: TypeInfo,
        path: Vec<TypeInfo>,
    ) -> BoxFuture<'static, Result<Self, ResolveErrorKind>> {
        let span = debug_span!("resolve", dependency = type_info.name);

        Box::pin(
            async move {
                if let Some(value) = chain.live(type_info) {
                    debug!("Found in chain");
                    return Ok(Self::shared(type_info, value));
                }
                debug!("Not found in chain");

                let path = extend_path(&path, type_info).inspect_err(|err| error!("{}", err))?;
                let provider = chain.lookup(type_info).inspect_err(|err| error!("{}", err))?;

                let mut children = AsyncTeardownGuard::new();
                let mut arguments = Arguments::new();
                for dependency in provider.dependencies() {
                    match resolve_dependency(&chain, dependency, &path).await {
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
                            if let Err(err) = children.close().await {
                                error!("Failed to release dependencies: {}", err);
                            }
                            return Err(err);
                        }
                    }
                }

                let value = match provider.instantiate_async(arguments).await {
                    Ok(value) => value,
                    Err(source) => {
                        let err = ResolveErrorKind::Instantiate { type_info, source };
                        error!("{}", err);
                        if let Err(err) = children.close().await {
                            error!("Failed to release dependencies: {}", err);
                        }
                        return Err(err);
                    }
                };
                debug!("Acquired");

                Ok(Self::active(&chain, type_info, value, provider, children.into_inner()))
            }
            .instrument(span),
        )
    }

    /// Releases the context on the async path, awaiting async finalizers.
    ///
    /// The context is marked closed right away. If the returned future is dropped before it completes,
    /// the children not released yet are closed in the background.
    ///
    /// # Errors
    /// Returns the first error of the finalizer of this context and the ones of its children
    pub fn release_async(&mut self) -> BoxFuture<'static, Result<(), FinalizeErrorKind>> {
        let type_info = self.type_info;
        let State::Active {
            value,
            provider,
            chain,
            installed,
            children,
        } = mem::replace(&mut self.state, State::Closed)
        else {
            return Box::pin(async { Ok::<_, FinalizeErrorKind>(()) });
        };
        let children = AsyncTeardownGuard::from(children);
        let span = debug_span!("release", dependency = type_info.name);

        Box::pin(
            async move {
                if let Some(Installed { id }) = installed {
                    chain.uninstall(type_info, id);
                }

                let finalized = provider.finalize_async(value).await;
                let children_closed = children.close().await;
                debug!("Released");

                merge_results(finalized, children_closed)
            }
            .instrument(span),
        )
    }
}
