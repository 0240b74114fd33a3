//! Wrappers of consumers that declare their dependencies.
//!
//! Each call resolves the declared dependencies the caller didn't supply, runs the body with them
//! and releases every context it opened once the body is done.

use core::fmt::{self, Debug, Formatter};
use tracing::{debug, debug_span, error};

use crate::{
    arguments::Arguments,
    chain::Chain,
    dependency::Dependencies,
    dependency_resolver::resolve_dependencies,
    errors::{FinalizeErrorKind, InjectErrorKind, ResolveErrorKind},
    teardown::TeardownGuard,
};

/// Wraps a plain function.
#[inline]
#[must_use]
pub fn function<F, R>(dependencies: Dependencies, f: F) -> InjectFn<F>
where
    F: Fn(&Chain, Arguments) -> R,
{
    InjectFn { dependencies, f }
}

/// Wraps a function returning a lazy sequence.
/// The dependencies stay open until the sequence is exhausted, closed or dropped.
#[inline]
#[must_use]
pub fn iterator<F, I>(dependencies: Dependencies, f: F) -> InjectIter<F>
where
    F: Fn(&Chain, Arguments) -> I,
    I: IntoIterator,
{
    InjectIter { dependencies, f }
}

#[derive(Clone)]
pub struct InjectFn<F> {
    dependencies: Dependencies,
    f: F,
}

impl<F> InjectFn<F> {
    #[inline]
    #[must_use]
    pub fn dependencies(&self) -> &Dependencies {
        &self.dependencies
    }

    /// Resolves the missing dependencies, calls the body and releases what was opened for the call.
    ///
    /// The body isn't called if resolution fails.
    /// Opened contexts are released even if the body panics.
    ///
    /// # Errors
    /// - Returns [`InjectErrorKind::Resolve`] if a dependency can't be resolved
    /// - Returns [`InjectErrorKind::Finalize`] if releasing a dependency fails after the body returned
    pub fn call<R>(&self, chain: &Chain, mut arguments: Arguments) -> Result<R, InjectErrorKind>
    where
        F: Fn(&Chain, Arguments) -> R,
    {
        let span = debug_span!("inject", dependencies = self.dependencies.len());
        let _guard = span.enter();

        let mut opened = TeardownGuard::new();
        if let Err(err) = resolve_dependencies(chain, &self.dependencies, &mut arguments, &mut opened) {
            if let Err(err) = opened.close() {
                error!("Failed to release dependencies: {}", err);
            }
            return Err(err.into());
        }
        debug!(opened = opened.len(), "Dependencies resolved");

        let output = (self.f)(chain, arguments);
        opened.close()?;

        Ok(output)
    }
}

impl<F> Debug for InjectFn<F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectFn").field("dependencies", &self.dependencies).finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct InjectIter<F> {
    dependencies: Dependencies,
    f: F,
}

impl<F> InjectIter<F> {
    #[inline]
    #[must_use]
    pub fn dependencies(&self) -> &Dependencies {
        &self.dependencies
    }

    /// Resolves the missing dependencies once and creates the sequence.
    ///
    /// # Errors
    /// Returns an error if a dependency can't be resolved. The body isn't called then.
    pub fn call<I>(&self, chain: &Chain, mut arguments: Arguments) -> Result<Injected<I::IntoIter>, ResolveErrorKind>
    where
        F: Fn(&Chain, Arguments) -> I,
        I: IntoIterator,
    {
        let span = debug_span!("inject", dependencies = self.dependencies.len());
        let _guard = span.enter();

        let mut opened = TeardownGuard::new();
        if let Err(err) = resolve_dependencies(chain, &self.dependencies, &mut arguments, &mut opened) {
            if let Err(err) = opened.close() {
                error!("Failed to release dependencies: {}", err);
            }
            return Err(err);
        }
        debug!(opened = opened.len(), "Dependencies resolved");

        Ok(Injected {
            iter: (self.f)(chain, arguments).into_iter(),
            opened: Some(opened),
            error: None,
        })
    }
}

impl<F> Debug for InjectIter<F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectIter").field("dependencies", &self.dependencies).finish_non_exhaustive()
    }
}

/// Sequence produced by an [`InjectIter`] call.
///
/// Dependencies are released when the sequence is exhausted, on [`Injected::close`] or on drop.
/// A release error at exhaustion is kept for [`Injected::take_error`] and [`Injected::close`],
/// release errors on drop are logged.
pub struct Injected<I> {
    iter: I,
    opened: Option<TeardownGuard>,
    error: Option<FinalizeErrorKind>,
}

impl<I> Injected<I> {
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.opened.is_none()
    }

    #[inline]
    pub fn take_error(&mut self) -> Option<FinalizeErrorKind> {
        self.error.take()
    }

    /// Stops the sequence and releases its dependencies.
    ///
    /// # Errors
    /// Returns the release error, including one kept from exhaustion
    pub fn close(mut self) -> Result<(), FinalizeErrorKind> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        match self.opened.take() {
            Some(opened) => opened.close(),
            None => Ok(()),
        }
    }
}

impl<I: Iterator> Iterator for Injected<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        let opened = self.opened.as_ref()?;
        if let Some(item) = self.iter.next() {
            return Some(item);
        }
        debug!(opened = opened.len(), "Sequence exhausted");

        if let Some(Err(err)) = self.opened.take().map(TeardownGuard::close) {
            error!("{}", err);
            self.error = Some(err);
        }
        None
    }
}

impl<I> Drop for Injected<I> {
    fn drop(&mut self) {
        if let Some(err) = self.error.take() {
            error!("Release error of a dropped sequence: {}", err);
        }
    }
}
