//! Async wrappers of consumers that declare their dependencies.
//!
//! Dropping a call before it completes still releases every context it opened, in the background.

use alloc::boxed::Box;
use core::{
    fmt::{self, Debug, Formatter},
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};
use futures_core::Stream;
use tracing::{debug, debug_span, error, Instrument as _};

use super::{dependency_resolver::resolve_dependencies, teardown::AsyncTeardownGuard};
use crate::{
    arguments::Arguments,
    chain::Chain,
    dependency::Dependencies,
    errors::{FinalizeErrorKind, InjectErrorKind, ResolveErrorKind},
    utils::future::BoxFuture,
};

/// Wraps an async function.
#[inline]
#[must_use]
pub fn function<F, Fut>(dependencies: Dependencies, f: F) -> InjectAsyncFn<F>
where
    F: Fn(Chain, Arguments) -> Fut,
    Fut: Future,
{
    InjectAsyncFn { dependencies, f }
}

/// Wraps a function returning a stream.
/// The dependencies stay open until the stream is exhausted, closed or dropped.
#[inline]
#[must_use]
pub fn stream<F, S>(dependencies: Dependencies, f: F) -> InjectStream<F>
where
    F: Fn(Chain, Arguments) -> S,
    S: Stream,
{
    InjectStream { dependencies, f }
}

async fn open(chain: &Chain, dependencies: &Dependencies, arguments: &mut Arguments) -> Result<AsyncTeardownGuard, ResolveErrorKind> {
    let mut opened = AsyncTeardownGuard::new();
    if let Err(err) = resolve_dependencies(chain, dependencies, arguments, &mut opened).await {
        if let Err(err) = opened.close().await {
            error!("Failed to release dependencies: {}", err);
        }
        return Err(err);
    }
    debug!(opened = opened.len(), "Dependencies resolved");

    Ok(opened)
}

#[derive(Clone)]
pub struct InjectAsyncFn<F> {
    dependencies: Dependencies,
    f: F,
}

impl<F> InjectAsyncFn<F> {
    #[inline]
    #[must_use]
    pub fn dependencies(&self) -> &Dependencies {
        &self.dependencies
    }

    /// Resolves the missing dependencies, awaits the body and releases what was opened for the call.
    ///
    /// The body isn't called if resolution fails.
    /// If the returned future is dropped early, opened contexts are released in the background.
    ///
    /// # Errors
    /// - Returns [`InjectErrorKind::Resolve`] if a dependency can't be resolved
    /// - Returns [`InjectErrorKind::Finalize`] if releasing a dependency fails after the body completed
    pub async fn call<Fut>(&self, chain: &Chain, mut arguments: Arguments) -> Result<Fut::Output, InjectErrorKind>
    where
        F: Fn(Chain, Arguments) -> Fut,
        Fut: Future,
    {
        let span = debug_span!("inject", dependencies = self.dependencies.len());

        async move {
            let opened = open(chain, &self.dependencies, &mut arguments).await?;
            let output = (self.f)(chain.clone(), arguments).await;
            opened.close().await?;

            Ok::<_, InjectErrorKind>(output)
        }
        .instrument(span)
        .await
    }
}

impl<F> Debug for InjectAsyncFn<F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectAsyncFn").field("dependencies", &self.dependencies).finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct InjectStream<F> {
    dependencies: Dependencies,
    f: F,
}

impl<F> InjectStream<F> {
    #[inline]
    #[must_use]
    pub fn dependencies(&self) -> &Dependencies {
        &self.dependencies
    }

    /// Resolves the missing dependencies once and creates the stream.
    ///
    /// # Errors
    /// Returns an error if a dependency can't be resolved. The body isn't called then.
    pub async fn call<S>(&self, chain: &Chain, mut arguments: Arguments) -> Result<InjectedStream<S>, ResolveErrorKind>
    where
        F: Fn(Chain, Arguments) -> S,
        S: Stream,
    {
        let span = debug_span!("inject", dependencies = self.dependencies.len());
        let opened = open(chain, &self.dependencies, &mut arguments).instrument(span).await?;

        Ok(InjectedStream {
            stream: Box::pin((self.f)(chain.clone(), arguments)),
            opened: Some(opened),
            closing: None,
            error: None,
        })
    }
}

impl<F> Debug for InjectStream<F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectStream").field("dependencies", &self.dependencies).finish_non_exhaustive()
    }
}

/// Stream produced by an [`InjectStream`] call.
///
/// Dependencies are released when the stream is exhausted, on [`InjectedStream::close`] or on drop.
/// A release error at exhaustion is kept for [`InjectedStream::take_error`] and [`InjectedStream::close`],
/// release errors on drop are logged.
pub struct InjectedStream<S> {
    stream: Pin<Box<S>>,
    opened: Option<AsyncTeardownGuard>,
    closing: Option<BoxFuture<'static, Result<(), FinalizeErrorKind>>>,
    error: Option<FinalizeErrorKind>,
}

impl<S> InjectedStream<S> {
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.opened.is_none() && self.closing.is_none()
    }

    #[inline]
    pub fn take_error(&mut self) -> Option<FinalizeErrorKind> {
        self.error.take()
    }

    /// Stops the stream and releases its dependencies.
    ///
    /// # Errors
    /// Returns the release error, including one kept from exhaustion
    pub async fn close(mut self) -> Result<(), FinalizeErrorKind> {
        if let Some(closing) = self.closing.take() {
            if let Err(err) = closing.await {
                self.error.get_or_insert(err);
            }
        }
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        match self.opened.take() {
            Some(opened) => opened.close().await,
            None => Ok(()),
        }
    }
}

impl<S: Stream> Stream for InjectedStream<S> {
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if let Some(closing) = this.closing.as_mut() {
            let result = match closing.as_mut().poll(cx) {
                Poll::Ready(result) => result,
                Poll::Pending => return Poll::Pending,
            };
            this.closing = None;
            if let Err(err) = result {
                error!("{}", err);
                this.error = Some(err);
            }
            return Poll::Ready(None);
        }

        let Some(opened) = this.opened.as_ref() else {
            return Poll::Ready(None);
        };
        match this.stream.as_mut().poll_next(cx) {
            Poll::Ready(None) => {}
            poll => return poll,
        }
        debug!(opened = opened.len(), "Stream exhausted");

        if let Some(opened) = this.opened.take() {
            this.closing = Some(Box::pin(opened.close()));
        }
        Pin::new(this).poll_next(cx)
    }
}

impl<S> Drop for InjectedStream<S> {
    fn drop(&mut self) {
        if let Some(err) = self.error.take() {
            error!("Release error of a dropped stream: {}", err);
        }
    }
}
