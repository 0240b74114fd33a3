use alloc::vec::Vec;
use core::mem;
use tracing::{error, warn};

use crate::{context::ActiveContext, errors::FinalizeErrorKind, teardown::TeardownGuard};

/// Closes `contexts` on the async path, last acquired first.
///
/// # Errors
/// Returns the first error in closing order
pub async fn close_all_async(mut contexts: Vec<ActiveContext>) -> Result<(), FinalizeErrorKind> {
    let mut result = Ok(());
    while let Some(mut context) = contexts.pop() {
        if let Err(err) = context.release_async().await {
            if result.is_ok() {
                result = Err(err);
            } else {
                error!("Teardown error suppressed: {}", err);
            }
        }
    }
    result
}

/// Async counterpart of [`TeardownGuard`].
///
/// Dropping the guard with open contexts closes them synchronously when none of them needs the async path.
/// Otherwise the teardown is spawned on the current tokio runtime,
/// or driven on a temporary current-thread runtime when none is running.
#[derive(Debug, Default)]
pub struct AsyncTeardownGuard {
    contexts: Vec<ActiveContext>,
}

impl From<Vec<ActiveContext>> for AsyncTeardownGuard {
    fn from(contexts: Vec<ActiveContext>) -> Self {
        Self { contexts }
    }
}

impl AsyncTeardownGuard {
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

    #[inline]
    #[must_use]
    pub fn into_inner(mut self) -> Vec<ActiveContext> {
        mem::take(&mut self.contexts)
    }

    /// Closes every owned context, last acquired first.
    ///
    /// If the future is dropped before it completes, the contexts not closed yet are closed in the background.
    ///
    /// # Errors
    /// Returns the first error in closing order
    pub async fn close(mut self) -> Result<(), FinalizeErrorKind> {
        let mut result = Ok(());
        while let Some(mut context) = self.contexts.pop() {
            if let Err(err) = context.release_async().await {
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

impl Drop for AsyncTeardownGuard {
    fn drop(&mut self) {
        if self.contexts.is_empty() {
            return;
        }

        let contexts = mem::take(&mut self.contexts);
        if contexts.iter().any(ActiveContext::needs_async) {
            spawn_close(contexts);
        } else if let Err(err) = TeardownGuard::from(contexts).close() {
            error!("Failed to close dropped contexts: {}", err);
        }
    }
}

/// Closes contexts dropped outside of an awaited teardown, e.g. by a cancelled future.
pub(crate) fn spawn_close(contexts: Vec<ActiveContext>) {
    warn!("Spawning teardown of {} dropped contexts", contexts.len());

    let close = async move {
        if let Err(err) = close_all_async(contexts).await {
            error!("Failed to close dropped contexts: {}", err);
        }
    };

    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            drop(handle.spawn(close));
        }
        Err(_) => match tokio::runtime::Builder::new_current_thread().enable_all().build() {
            Ok(runtime) => runtime.block_on(close),
            Err(err) => error!("Failed to build a runtime for teardown, contexts are leaked: {}", err),
        },
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::{format, sync::Arc, vec::Vec};
    use parking_lot::Mutex;
    use tracing_test::traced_test;

    use super::{close_all_async, AsyncTeardownGuard};
    use crate::{
        any::TypeInfo,
        arguments::Arguments,
        chain::Chain,
        context::ActiveContext,
        dependency::Dependencies,
        errors::{FinalizeErrorKind, InstantiateErrorKind},
        provider::Provider,
        registry::Registration,
    };

    struct Resource<const N: usize>;

    fn register<const N: usize>(chain: &Chain, closed: &Arc<Mutex<Vec<usize>>>, fail: bool) -> Registration {
        let closed = closed.clone();
        Provider::with_async_finalizer(
            Dependencies::new(),
            |_arguments: Arguments| async { Ok::<_, InstantiateErrorKind>(Resource::<N>) },
            move |_resource: Arc<Resource<N>>| {
                let closed = closed.clone();
                async move {
                    tokio::task::yield_now().await;
                    closed.lock().push(N);
                    if fail {
                        Err(FinalizeErrorKind::Custom(anyhow::anyhow!("close {} failed", N)))
                    } else {
                        Ok(())
                    }
                }
            },
        )
        .unwrap()
        .scope(chain)
    }

    async fn open<const N: usize>(chain: &Chain) -> ActiveContext {
        ActiveContext::acquire_async(chain.clone(), TypeInfo::of::<Resource<N>>())
            .await
            .unwrap()
    }

    #[tokio::test]
    #[traced_test]
    async fn test_close_all_async_first_error_wins() {
        let chain = Chain::new();
        let closed = Arc::new(Mutex::new(Vec::new()));
        let _registrations = (
            register::<0>(&chain, &closed, true),
            register::<1>(&chain, &closed, false),
            register::<2>(&chain, &closed, true),
        );

        let contexts = [open::<0>(&chain).await, open::<1>(&chain).await, open::<2>(&chain).await].into();
        let err = close_all_async(contexts).await.unwrap_err();

        assert_eq!(format!("{err}"), "close 2 failed");
        assert_eq!(*closed.lock(), [2, 1, 0]);
        assert!(logs_contain("close 0 failed"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_guard_close() {
        let chain = Chain::new();
        let closed = Arc::new(Mutex::new(Vec::new()));
        let _registrations = (register::<0>(&chain, &closed, false), register::<1>(&chain, &closed, false));

        let mut guard = AsyncTeardownGuard::new();
        guard.push(open::<0>(&chain).await);
        guard.push(open::<1>(&chain).await);
        guard.close().await.unwrap();

        assert_eq!(*closed.lock(), [1, 0]);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_guard_drop_spawns_teardown() {
        let chain = Chain::new();
        let closed = Arc::new(Mutex::new(Vec::new()));
        let _registration = register::<0>(&chain, &closed, false);

        let mut guard = AsyncTeardownGuard::new();
        guard.push(open::<0>(&chain).await);
        drop(guard);

        assert!(logs_contain("Spawning teardown of 1 dropped contexts"));
        for _ in 0..100 {
            if !closed.lock().is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(*closed.lock(), [0]);
        assert!(chain.get::<Resource<0>>().is_none());
    }

    #[test]
    fn test_guard_drop_without_runtime() {
        let chain = Chain::new();
        let closed = Arc::new(Mutex::new(Vec::new()));
        let _registration = register::<0>(&chain, &closed, false);

        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let context = runtime.block_on(open::<0>(&chain));
        drop(runtime);

        drop(AsyncTeardownGuard::from(Vec::from([context])));
        assert_eq!(*closed.lock(), [0]);
    }
}
