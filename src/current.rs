use alloc::sync::Arc;
use tracing::{debug, error};

use crate::{
    any::TypeInfo,
    chain::Chain,
    context::ActiveContext,
    errors::{CurrentErrorKind, FinalizeErrorKind, ReuseErrorKind, ResolveErrorKind},
};

/// Scoped accessor of the current value of `T` on a chain.
///
/// Entering acquires the value like an injected call would and keeps it live on the chain until exit,
/// so calls made in between share it. Entering again before exiting is an error.
/// Dropping an entered accessor exits it.
pub struct Current<T> {
    chain: Chain,
    default: Option<Arc<T>>,
    entered: Option<Entered>,
}

enum Entered {
    Context(ActiveContext),
    Default,
}

impl<T: Send + Sync + 'static> Current<T> {
    #[inline]
    #[must_use]
    pub(crate) const fn new(chain: Chain) -> Self {
        Self {
            chain,
            default: None,
            entered: None,
        }
    }

    /// Sets the value returned on enter when no provider of `T` is registered or bound on the chain.
    #[must_use]
    pub fn with_default(mut self, value: T) -> Self {
        self.default = Some(Arc::new(value));
        self
    }

    #[inline]
    #[must_use]
    pub fn is_entered(&self) -> bool {
        self.entered.is_some()
    }

    /// Returns the value while entered.
    #[must_use]
    pub fn get(&self) -> Option<Arc<T>> {
        match self.entered.as_ref()? {
            Entered::Context(context) => context.value(),
            Entered::Default => self.default.clone(),
        }
    }

    /// # Errors
    /// - Returns [`ReuseErrorKind::AlreadyEntered`] if entered again before exit
    /// - Returns a [`ResolveErrorKind`] if the value can't be acquired and there is no default
    pub fn enter(&mut self) -> Result<Arc<T>, CurrentErrorKind> {
        self.ensure_not_entered()?;
        let acquired = ActiveContext::acquire(&self.chain, TypeInfo::of::<T>());
        self.finish_enter(acquired)
    }

    /// Exits, releasing the value if this accessor acquired it. Exiting a not entered accessor does nothing.
    ///
    /// # Errors
    /// Returns a release error, including [`FinalizeErrorKind::AsyncInSyncContext`] for values with async finalizers
    pub fn exit(&mut self) -> Result<(), FinalizeErrorKind> {
        match self.entered.take() {
            Some(Entered::Context(mut context)) => {
                debug!(dependency = context.type_info().name, "Exit");
                context.release()
            }
            Some(Entered::Default) | None => Ok(()),
        }
    }

    fn ensure_not_entered(&self) -> Result<(), ReuseErrorKind> {
        if self.entered.is_some() {
            let err = ReuseErrorKind::AlreadyEntered {
                type_info: TypeInfo::of::<T>(),
            };
            error!("{}", err);
            return Err(err);
        }
        Ok(())
    }

    fn finish_enter(&mut self, acquired: Result<ActiveContext, ResolveErrorKind>) -> Result<Arc<T>, CurrentErrorKind> {
        match acquired {
            Ok(context) => {
                let Some(value) = context.value() else {
                    unreachable!("Value of {} has another type", context.type_info().name);
                };
                self.entered = Some(Entered::Context(context));
                Ok(value)
            }
            Err(err @ (ResolveErrorKind::NoProvider { .. } | ResolveErrorKind::NoActiveProvider { .. })) => match self.default.clone() {
                Some(value) => {
                    debug!(dependency = TypeInfo::of::<T>().name, "Default used");
                    self.entered = Some(Entered::Default);
                    Ok(value)
                }
                None => Err(err.into()),
            },
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(feature = "async")]
impl<T: Send + Sync + 'static> Current<T> {
    /// Async counterpart of [`Current::enter`], async providers are accepted.
    ///
    /// # Errors
    /// Same as [`Current::enter`]
    pub async fn enter_async(&mut self) -> Result<Arc<T>, CurrentErrorKind> {
        self.ensure_not_entered()?;
        let acquired = ActiveContext::acquire_async(self.chain.clone(), TypeInfo::of::<T>()).await;
        self.finish_enter(acquired)
    }

    /// Async counterpart of [`Current::exit`].
    ///
    /// # Errors
    /// Returns a release error
    pub async fn exit_async(&mut self) -> Result<(), FinalizeErrorKind> {
        match self.entered.take() {
            Some(Entered::Context(mut context)) => {
                debug!(dependency = context.type_info().name, "Exit");
                context.release_async().await
            }
            Some(Entered::Default) | None => Ok(()),
        }
    }
}

impl<T> Drop for Current<T> {
    fn drop(&mut self) {
        let Some(Entered::Context(mut context)) = self.entered.take() else {
            return;
        };

        #[cfg(feature = "async")]
        {
            if context.needs_async() {
                crate::async_impl::teardown::spawn_close(alloc::vec![context]);
                return;
            }
        }

        if let Err(err) = context.release() {
            error!("Failed to release dropped accessor value: {}", err);
        }
    }
}
