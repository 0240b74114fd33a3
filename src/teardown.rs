//! Release of the contexts opened by one call.
//!
//! Contexts are closed in reverse order of acquisition. A failing close never skips the remaining ones:
//! the first error in closing order is returned, later ones are logged and dropped.

use alloc::vec::Vec;
use core::mem;
use tracing::error;

use crate::{context::ActiveContext, errors::FinalizeErrorKind};

/// Closes `contexts` on the sync path, last acquired first.
///
/// # Errors
/// Returns the first error in closing order
pub fn close_all(contexts: Vec<ActiveContext>) -> Result<(), FinalizeErrorKind> {
    TeardownGuard::from(contexts).close()
}

/// Owns the contexts opened by a call and closes them when dropped.
#[derive(Debug, Default)]
pub struct TeardownGuard {
    contexts: Vec<ActiveContext>,
}

impl From<Vec<ActiveContext>> for TeardownGuard {
    fn from(contexts: Vec<ActiveContext>) -> Self {
        Self { contexts }
    }
}

impl TeardownGuard {
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { contexts: Vec::new() }
    }

    #[inline]
    pub fn push(&mut self, context: ActiveContext) {
        self.contexts.push(context);
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// Takes the contexts out without closing them.
    #[inline]
    #[must_use]
    pub fn into_inner(mut self) -> Vec<ActiveContext> {
        mem::take(&mut self.contexts)
    }

    /// Closes every owned context.
    ///
    /// # Errors
    /// Returns the first error in closing order
    pub fn close(mut self) -> Result<(), FinalizeErrorKind> {
        self.close_in_place()
    }

    fn close_in_place(&mut self) -> Result<(), FinalizeErrorKind> {
        let mut result = Ok(());
        while let Some(mut context) = self.contexts.pop() {
            if let Err(err) = context.release() {
                if result.is_ok() {
                    result = Err(err);
                } else {
                    error!("Teardown error suppressed: {}", err);
                }
            }
        }
        result
    }
}

impl Drop for TeardownGuard {
    fn drop(&mut self) {
        if self.contexts.is_empty() {
            return;
        }

        #[cfg(feature = "async")]
        {
            if self.contexts.iter().any(ActiveContext::needs_async) {
                crate::async_impl::teardown::spawn_close(mem::take(&mut self.contexts));
                return;
            }
        }

        if let Err(err) = self.close_in_place() {
            error!("Failed to close dropped contexts: {}", err);
        }
    }
}
