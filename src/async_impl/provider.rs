use super::{
    finalizer::{boxed_finalizer_factory, AsyncFinalizer},
    instantiator::{boxed_instantiator_factory, AsyncInstantiator},
    service::Service as _,
};
use crate::{
    any::{RcAny, TypeInfo},
    arguments::Arguments,
    dependency::Dependencies,
    errors::{DeclarationErrorKind, FinalizeErrorKind, InstantiateErrorKind},
    provider::{Provider, ProviderKind},
    service::Service as _,
};

impl Provider {
    /// Creates a provider whose value can only be acquired on the async path.
    ///
    /// # Errors
    /// Returns [`DeclarationErrorKind::SelfDependency`] if the provided type is one of the dependencies
    pub fn new_async<Inst>(dependencies: Dependencies, instantiator: Inst) -> Result<Self, DeclarationErrorKind>
    where
        Inst: AsyncInstantiator,
    {
        Self::from_kind(
            TypeInfo::of::<Inst::Provides>(),
            dependencies,
            ProviderKind::Async {
                instantiator: boxed_instantiator_factory(instantiator),
                finalizer: None,
            },
        )
    }

    /// Like [`Provider::new_async`], with a finalizer awaited with the value when the owning call is torn down.
    ///
    /// # Errors
    /// Returns [`DeclarationErrorKind::SelfDependency`] if the provided type is one of the dependencies
    pub fn with_async_finalizer<Inst, Fin>(
        dependencies: Dependencies,
        instantiator: Inst,
        finalizer: Fin,
    ) -> Result<Self, DeclarationErrorKind>
    where
        Inst: AsyncInstantiator,
        Fin: AsyncFinalizer<Inst::Provides>,
    {
        Self::from_kind(
            TypeInfo::of::<Inst::Provides>(),
            dependencies,
            ProviderKind::Async {
                instantiator: boxed_instantiator_factory(instantiator),
                finalizer: Some(boxed_finalizer_factory(finalizer)),
            },
        )
    }

    pub(crate) async fn instantiate_async(&self, arguments: Arguments) -> Result<RcAny, InstantiateErrorKind> {
        match &self.inner.kind {
            ProviderKind::Sync { instantiator, .. } => instantiator.clone().call(arguments),
            ProviderKind::Async { instantiator, .. } => {
                let future = instantiator.clone().call(arguments);
                future.await
            }
        }
    }

    pub(crate) async fn finalize_async(&self, value: RcAny) -> Result<(), FinalizeErrorKind> {
        match &self.inner.kind {
            ProviderKind::Async {
                finalizer: Some(finalizer),
                ..
            } => {
                let future = finalizer.clone().call(value);
                future.await
            }
            _ => self.finalize(value),
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::sync::Arc;
    use core::sync::atomic::{AtomicU8, Ordering};

    use crate::{
        arguments::Arguments,
        dependencies,
        errors::{DeclarationErrorKind, FinalizeErrorKind, InstantiateErrorKind},
        provider::Provider,
    };

    struct Connection(u8);

    #[tokio::test]
    async fn test_async_provider() {
        let closed = Arc::new(AtomicU8::new(0));
        let provider = Provider::with_async_finalizer(
            dependencies! {}.unwrap(),
            |_arguments: Arguments| async { Ok::<_, InstantiateErrorKind>(Connection(7)) },
            {
                let closed = closed.clone();
                move |connection: Arc<Connection>| {
                    let closed = closed.clone();
                    async move {
                        closed.store(connection.0, Ordering::SeqCst);
                        Ok::<_, FinalizeErrorKind>(())
                    }
                }
            },
        )
        .unwrap();

        assert!(provider.is_async());
        assert!(provider.sync_instantiator().is_none());

        let value = provider.instantiate_async(Arguments::new()).await.unwrap();
        assert!(matches!(
            provider.finalize(value.clone()),
            Err(FinalizeErrorKind::AsyncInSyncContext { .. })
        ));
        assert_eq!(closed.load(Ordering::SeqCst), 0);

        provider.finalize_async(value).await.unwrap();
        assert_eq!(closed.load(Ordering::SeqCst), 7);
    }

    #[tokio::test]
    async fn test_sync_provider_on_async_path() {
        let provider = Provider::instance(Connection(1));

        let value = provider.instantiate_async(Arguments::new()).await.unwrap();
        assert!(provider.finalize_async(value.clone()).await.is_ok());
        assert_eq!(value.downcast::<Connection>().unwrap().0, 1);
    }

    #[test]
    fn test_async_self_dependency() {
        let err = Provider::new_async(dependencies! { connection: Connection }.unwrap(), |_arguments: Arguments| async {
            Ok::<_, InstantiateErrorKind>(Connection(1))
        })
        .unwrap_err();

        assert!(matches!(err, DeclarationErrorKind::SelfDependency { .. }));
    }
}
