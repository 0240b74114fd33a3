use alloc::sync::Arc;
use core::fmt::{self, Debug, Formatter};

use crate::{
    any::{RcAny, TypeInfo},
    chain::Chain,
    config::Config,
    dependency::Dependencies,
    errors::{DeclarationErrorKind, FinalizeErrorKind},
    finalizer::{boxed_finalizer_factory, BoxedCloneFinalizer, Finalizer},
    instantiator::{boxed_instance_factory, boxed_instantiator_factory, BoxedCloneInstantiator, Instantiator},
    registry::Registration,
    service::Service as _,
};

#[cfg(feature = "async")]
use crate::async_impl::{finalizer::BoxedCloneFinalizer as BoxedCloneAsyncFinalizer, instantiator::BoxedCloneInstantiator as BoxedCloneAsyncInstantiator};

/// A producer of one dependency type.
///
/// Cloning is cheap, clones share the same producer.
/// A provider does nothing until it's registered on a [`Chain`] with [`Provider::scope`] or [`Chain::with_provider`].
#[derive(Clone)]
pub struct Provider {
    pub(crate) inner: Arc<ProviderInner>,
}

#[derive(Clone)]
pub(crate) struct ProviderInner {
    pub(crate) type_info: TypeInfo,
    pub(crate) dependencies: Dependencies,
    pub(crate) config: Config,
    pub(crate) kind: ProviderKind,
}

#[derive(Clone)]
pub(crate) enum ProviderKind {
    Sync {
        instantiator: BoxedCloneInstantiator,
        finalizer: Option<BoxedCloneFinalizer>,
    },
    #[cfg(feature = "async")]
    Async {
        instantiator: BoxedCloneAsyncInstantiator,
        finalizer: Option<BoxedCloneAsyncFinalizer>,
    },
}

impl Provider {
    /// Creates a provider of `Inst::Provides` that needs `dependencies` to be resolved first.
    ///
    /// # Errors
    /// Returns [`DeclarationErrorKind::SelfDependency`] if the provided type is one of the dependencies
    pub fn new<Inst>(dependencies: Dependencies, instantiator: Inst) -> Result<Self, DeclarationErrorKind>
    where
        Inst: Instantiator,
    {
        Self::from_kind(
            TypeInfo::of::<Inst::Provides>(),
            dependencies,
            ProviderKind::Sync {
                instantiator: boxed_instantiator_factory(instantiator),
                finalizer: None,
            },
        )
    }

    /// Like [`Provider::new`], with a finalizer called with the value when the owning call is torn down.
    ///
    /// # Errors
    /// Returns [`DeclarationErrorKind::SelfDependency`] if the provided type is one of the dependencies
    pub fn with_finalizer<Inst, Fin>(dependencies: Dependencies, instantiator: Inst, finalizer: Fin) -> Result<Self, DeclarationErrorKind>
    where
        Inst: Instantiator,
        Fin: Finalizer<Inst::Provides>,
    {
        Self::from_kind(
            TypeInfo::of::<Inst::Provides>(),
            dependencies,
            ProviderKind::Sync {
                instantiator: boxed_instantiator_factory(instantiator),
                finalizer: Some(boxed_finalizer_factory(finalizer)),
            },
        )
    }

    /// Provides an externally created value. Every acquisition shares it, nothing is finalized.
    #[must_use]
    pub fn instance<T: Send + Sync + 'static>(value: T) -> Self {
        Self {
            inner: Arc::new(ProviderInner {
                type_info: TypeInfo::of::<T>(),
                dependencies: Dependencies::new(),
                config: Config::default(),
                kind: ProviderKind::Sync {
                    instantiator: boxed_instance_factory(Arc::new(value)),
                    finalizer: None,
                },
            }),
        }
    }

    pub(crate) fn from_kind(type_info: TypeInfo, dependencies: Dependencies, kind: ProviderKind) -> Result<Self, DeclarationErrorKind> {
        dependencies.ensure_not_provides(type_info)?;

        Ok(Self {
            inner: Arc::new(ProviderInner {
                type_info,
                dependencies,
                config: Config::default(),
                kind,
            }),
        })
    }

    #[must_use]
    pub fn with_config(self, config: Config) -> Self {
        let mut inner = Arc::unwrap_or_clone(self.inner);
        inner.config = config;
        Self { inner: Arc::new(inner) }
    }

    /// Makes this provider current for its type on `chain` until the returned registration is dropped.
    #[inline]
    pub fn scope(&self, chain: &Chain) -> Registration {
        chain.register(self)
    }

    #[inline]
    #[must_use]
    pub fn type_info(&self) -> TypeInfo {
        self.inner.type_info
    }

    #[inline]
    #[must_use]
    pub fn dependencies(&self) -> &Dependencies {
        &self.inner.dependencies
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> Config {
        self.inner.config
    }

    /// Returns `true` if the value can only be acquired on the async path.
    #[inline]
    #[must_use]
    pub fn is_async(&self) -> bool {
        match self.inner.kind {
            ProviderKind::Sync { .. } => false,
            #[cfg(feature = "async")]
            ProviderKind::Async { .. } => true,
        }
    }

    #[inline]
    #[must_use]
    pub(crate) fn has_async_finalizer(&self) -> bool {
        match &self.inner.kind {
            ProviderKind::Sync { .. } => false,
            #[cfg(feature = "async")]
            ProviderKind::Async { finalizer, .. } => finalizer.is_some(),
        }
    }

    /// Returns `None` for async providers.
    #[inline]
    #[must_use]
    pub(crate) fn sync_instantiator(&self) -> Option<BoxedCloneInstantiator> {
        match &self.inner.kind {
            ProviderKind::Sync { instantiator, .. } => Some(instantiator.clone()),
            #[cfg(feature = "async")]
            ProviderKind::Async { .. } => None,
        }
    }

    pub(crate) fn finalize(&self, value: RcAny) -> Result<(), FinalizeErrorKind> {
        match &self.inner.kind {
            ProviderKind::Sync { finalizer: None, .. } => Ok(()),
            ProviderKind::Sync {
                finalizer: Some(finalizer),
                ..
            } => finalizer.clone().call(value),
            #[cfg(feature = "async")]
            ProviderKind::Async { finalizer: None, .. } => Ok(()),
            #[cfg(feature = "async")]
            ProviderKind::Async { finalizer: Some(_), .. } => Err(FinalizeErrorKind::AsyncInSyncContext {
                type_info: self.inner.type_info,
            }),
        }
    }
}

impl Debug for Provider {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("type_info", &self.inner.type_info)
            .field("dependencies", &self.inner.dependencies)
            .field("config", &self.inner.config)
            .field("is_async", &self.is_async())
            .finish_non_exhaustive()
    }
}
