use alloc::sync::Arc;
use core::future::Future;
use tracing::error;

use super::service::{service_fn, BoxCloneService};
use crate::{any::RcAny, errors::FinalizeErrorKind};

/// Async release routine of a provider, awaited once with the value it produced.
pub trait AsyncFinalizer<Dep>: Clone + Send + Sync + 'static {
    type Error: Into<FinalizeErrorKind>;
    type Future: Future<Output = Result<(), Self::Error>> + Send + 'static;

    fn finalize(&mut self, dependency: Arc<Dep>) -> Self::Future;
}

impl<F, Fut, Dep, Err> AsyncFinalizer<Dep> for F
where
    F: FnMut(Arc<Dep>) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<(), Err>> + Send + 'static,
    Err: Into<FinalizeErrorKind>,
{
    type Error = Err;
    type Future = Fut;

    #[inline]
    fn finalize(&mut self, dependency: Arc<Dep>) -> Self::Future {
        self(dependency)
    }
}

pub(crate) type BoxedCloneFinalizer = BoxCloneService<RcAny, (), FinalizeErrorKind>;

#[must_use]
pub(crate) fn boxed_finalizer_factory<Dep, Fin>(finalizer: Fin) -> BoxedCloneFinalizer
where
    Dep: Send + Sync + 'static,
    Fin: AsyncFinalizer<Dep>,
{
    BoxCloneService::new(service_fn(move |dependency: RcAny| {
        let dependency = match dependency.downcast::<Dep>() {
            Ok(dependency) => dependency,
            Err(incorrect_type) => {
                error!("Incorrect finalizer dependency type: {incorrect_type:?}");
                unreachable!("Incorrect finalizer dependency type: {incorrect_type:?}");
            }
        };
        let future = finalizer.clone().finalize(dependency);
        async move { future.await.map_err(Into::<FinalizeErrorKind>::into) }
    }))
}
