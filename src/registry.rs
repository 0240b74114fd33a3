use alloc::{collections::BTreeMap, collections::BTreeSet, vec::Vec};
use parking_lot::{const_mutex, Mutex};
use tracing::debug;

use crate::{any::TypeInfo, chain::Chain, provider::Provider};

/// Types that had a provider registered on any chain of the process.
/// Lets a lookup tell a missing declaration from an inactive one.
static DECLARED: Mutex<BTreeSet<TypeInfo>> = const_mutex(BTreeSet::new());

#[inline]
pub(crate) fn declare(type_info: TypeInfo) {
    DECLARED.lock().insert(type_info);
}

#[inline]
#[must_use]
pub(crate) fn is_declared(type_info: TypeInfo) -> bool {
    DECLARED.lock().contains(&type_info)
}

/// Bindings of one chain: a stack of providers per type, the top one is active.
///
/// Every pushed provider gets an id, so a registration removes its own binding
/// even after the stack changed under it.
#[derive(Clone, Default)]
pub(crate) struct Registry {
    bindings: BTreeMap<TypeInfo, Vec<(u64, Provider)>>,
    next_id: u64,
}

impl Registry {
    /// Pushes the provider and returns the id of its binding.
    pub(crate) fn push(&mut self, provider: Provider) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.bindings.entry(provider.type_info()).or_default().push((id, provider));
        id
    }

    /// Removes the binding with `id` and every binding of the type pushed after it.
    /// Returns `false` if the binding was already removed.
    pub(crate) fn remove(&mut self, type_info: TypeInfo, id: u64) -> bool {
        let Some(stack) = self.bindings.get_mut(&type_info) else {
            return false;
        };
        let Some(index) = stack.iter().position(|(binding, _)| *binding == id) else {
            return false;
        };
        stack.truncate(index);
        if stack.is_empty() {
            self.bindings.remove(&type_info);
        }
        true
    }

    #[inline]
    #[must_use]
    pub(crate) fn active(&self, type_info: TypeInfo) -> Option<&Provider> {
        self.bindings.get(&type_info).and_then(|stack| stack.last()).map(|(_, provider)| provider)
    }
}

/// Undo token of a registration.
///
/// Unregistering (or dropping) removes the binding of the registration,
/// together with every registration of the same type made after it that is still bound.
/// A token whose binding was already removed that way does nothing.
#[must_use = "the provider is unregistered as soon as the registration is dropped"]
pub struct Registration {
    chain: Chain,
    type_info: TypeInfo,
    id: u64,
}

impl Registration {
    #[inline]
    pub(crate) const fn new(chain: Chain, type_info: TypeInfo, id: u64) -> Self {
        Self { chain, type_info, id }
    }

    #[inline]
    #[must_use]
    pub fn type_info(&self) -> TypeInfo {
        self.type_info
    }

    #[inline]
    pub fn unregister(self) {}
}

impl Drop for Registration {
    fn drop(&mut self) {
        if self.chain.unbind(self.type_info, self.id) {
            debug!(dependency = self.type_info.name, id = self.id, "Unregistered");
        } else {
            debug!(dependency = self.type_info.name, id = self.id, "Already unbound");
        }
    }
}
