use alloc::{collections::BTreeMap, sync::Arc, vec::Vec};
use core::fmt::{self, Debug, Formatter};
use parking_lot::Mutex;
use tracing::debug;

use crate::{
    any::{RcAny, TypeInfo},
    current::Current,
    errors::ResolveErrorKind,
    provider::Provider,
    registry::{self, Registration, Registry},
};

/// Handle of a logical call chain.
///
/// A chain owns the active provider bindings and the live values produced for them.
/// Clones share the same chain, so nested and sequential calls made with a clone see the same bindings and values.
/// Use [`Chain::fork`] for flows that run concurrently and must not observe each other.
#[derive(Clone, Default)]
pub struct Chain {
    inner: Arc<Mutex<ChainState>>,
}

#[derive(Default)]
struct ChainState {
    registry: Registry,
    values: Values,
}

/// Live values of a chain: a stack per type, the top one is current.
#[derive(Clone, Default)]
struct Values {
    stacks: BTreeMap<TypeInfo, Vec<(u64, RcAny)>>,
    next_id: u64,
}

impl Values {
    fn get(&self, type_info: TypeInfo) -> Option<&RcAny> {
        self.stacks.get(&type_info).and_then(|stack| stack.last()).map(|(_, value)| value)
    }

    fn push(&mut self, type_info: TypeInfo, value: RcAny) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.stacks.entry(type_info).or_default().push((id, value));
        id
    }

    fn remove(&mut self, type_info: TypeInfo, id: u64) {
        let Some(stack) = self.stacks.get_mut(&type_info) else {
            return;
        };
        stack.retain(|(installed, _)| *installed != id);
        if stack.is_empty() {
            self.stacks.remove(&type_info);
        }
    }
}

impl Chain {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an independent chain starting from a snapshot of this chain's bindings and live values.
    #[must_use]
    pub fn fork(&self) -> Self {
        let state = self.inner.lock();
        Self {
            inner: Arc::new(Mutex::new(ChainState {
                registry: state.registry.clone(),
                values: state.values.clone(),
            })),
        }
    }

    /// Makes `provider` current for its type on this chain.
    pub fn register(&self, provider: &Provider) -> Registration {
        let type_info = provider.type_info();
        registry::declare(type_info);

        let id = self.inner.lock().registry.push(provider.clone());
        debug!(dependency = type_info.name, id, "Registered");

        Registration::new(self.clone(), type_info, id)
    }

    /// Runs `f` with `provider` registered, restoring the previous binding afterwards, even if `f` panics.
    pub fn with_provider<R>(&self, provider: &Provider, f: impl FnOnce(&Chain) -> R) -> R {
        let registration = self.register(provider);
        let result = f(self);
        registration.unregister();
        result
    }

    /// Gets the active provider of a type.
    ///
    /// # Errors
    /// - Returns [`ResolveErrorKind::NoProvider`] if no provider of the type was ever registered
    /// - Returns [`ResolveErrorKind::NoActiveProvider`] if no provider of the type is bound on this chain
    pub fn lookup(&self, type_info: TypeInfo) -> Result<Provider, ResolveErrorKind> {
        if let Some(provider) = self.inner.lock().registry.active(type_info) {
            return Ok(provider.clone());
        }

        if registry::is_declared(type_info) {
            Err(ResolveErrorKind::NoActiveProvider { type_info })
        } else {
            Err(ResolveErrorKind::NoProvider { type_info })
        }
    }

    /// Returns the live value of `T` on this chain, if any call currently holds one.
    #[must_use]
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.live(TypeInfo::of::<T>()).and_then(|value| value.downcast().ok())
    }

    /// Returns `true` if a provider of `T` is bound on this chain.
    #[must_use]
    pub fn is_bound<T: 'static>(&self) -> bool {
        self.inner.lock().registry.active(TypeInfo::of::<T>()).is_some()
    }

    /// Creates a scoped accessor of the current value of `T`.
    #[inline]
    #[must_use]
    pub fn current<T: Send + Sync + 'static>(&self) -> Current<T> {
        Current::new(self.clone())
    }

    #[inline]
    #[must_use]
    pub(crate) fn live(&self, type_info: TypeInfo) -> Option<RcAny> {
        self.inner.lock().values.get(type_info).cloned()
    }

    /// Returns `true` if the type has a live value or an active binding.
    #[must_use]
    pub(crate) fn is_available(&self, type_info: TypeInfo) -> bool {
        let state = self.inner.lock();
        state.values.get(type_info).is_some() || state.registry.active(type_info).is_some()
    }

    /// Installs a live value over the current one and returns its id.
    #[inline]
    pub(crate) fn install(&self, type_info: TypeInfo, value: RcAny) -> u64 {
        self.inner.lock().values.push(type_info, value)
    }

    /// Removes the live value installed with `id`. Values installed over it stay current.
    #[inline]
    pub(crate) fn uninstall(&self, type_info: TypeInfo, id: u64) {
        self.inner.lock().values.remove(type_info, id);
    }

    #[inline]
    pub(crate) fn unbind(&self, type_info: TypeInfo, id: u64) -> bool {
        self.inner.lock().registry.remove(type_info, id)
    }
}

impl Debug for Chain {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("Chain")
            .field("values", &state.values.stacks.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
