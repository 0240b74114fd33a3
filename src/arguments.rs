use alloc::{collections::BTreeMap, sync::Arc};

use crate::{
    any::{RcAny, TypeInfo},
    errors::ArgumentErrorKind,
};

/// A value passed to a consumer or a provider under a parameter name.
#[derive(Clone)]
pub struct Argument {
    pub type_info: TypeInfo,
    pub(crate) value: RcAny,
}

impl Argument {
    #[inline]
    #[must_use]
    pub fn new<T: Send + Sync + 'static>(value: T) -> Self {
        Self::new_rc(Arc::new(value))
    }

    #[inline]
    #[must_use]
    pub fn new_rc<T: Send + Sync + 'static>(value: Arc<T>) -> Self {
        Self {
            type_info: TypeInfo::of::<T>(),
            value,
        }
    }

    /// Returns the value if it has type `T`.
    /// Useful for parameters declared with several candidate types.
    #[inline]
    #[must_use]
    pub fn downcast<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.value.clone().downcast().ok()
    }

    #[inline]
    #[must_use]
    pub fn is<T: 'static>(&self) -> bool {
        self.type_info == TypeInfo::of::<T>()
    }
}

/// Named arguments of an injected call.
///
/// Entries supplied by the caller are kept as is, missing declared dependencies are filled in by the injector.
#[derive(Clone, Default)]
pub struct Arguments {
    entries: BTreeMap<&'static str, Argument>,
}

impl Arguments {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self { entries: BTreeMap::new() }
    }

    #[inline]
    #[must_use]
    pub fn with<T: Send + Sync + 'static>(mut self, name: &'static str, value: T) -> Self {
        self.insert(name, value);
        self
    }

    #[inline]
    pub fn insert<T: Send + Sync + 'static>(&mut self, name: &'static str, value: T) -> Option<Argument> {
        self.entries.insert(name, Argument::new(value))
    }

    #[inline]
    pub fn insert_rc<T: Send + Sync + 'static>(&mut self, name: &'static str, value: Arc<T>) -> Option<Argument> {
        self.entries.insert(name, Argument::new_rc(value))
    }

    #[inline]
    pub(crate) fn insert_any(&mut self, name: &'static str, type_info: TypeInfo, value: RcAny) {
        self.entries.insert(name, Argument { type_info, value });
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    #[inline]
    #[must_use]
    pub fn argument(&self, name: &str) -> Option<&Argument> {
        self.entries.get(name)
    }

    /// Gets a typed argument.
    ///
    /// # Errors
    /// - Returns [`ArgumentErrorKind::Missing`] if there is no argument with the name
    /// - Returns [`ArgumentErrorKind::IncorrectType`] if the argument has another type
    pub fn get<T: Send + Sync + 'static>(&self, name: &'static str) -> Result<Arc<T>, ArgumentErrorKind> {
        let Some(argument) = self.entries.get(name) else {
            return Err(ArgumentErrorKind::Missing { name });
        };
        argument.downcast().ok_or(ArgumentErrorKind::IncorrectType {
            name,
            expected: TypeInfo::of::<T>(),
            actual: argument.type_info,
        })
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Argument)> {
        self.entries.iter().map(|(name, argument)| (*name, argument))
    }
}
