use alloc::sync::Arc;
use tracing::error;

use crate::{
    any::RcAny,
    errors::FinalizeErrorKind,
    service::{service_fn, BoxCloneService},
};

/// Release routine of a provider, called once with the value it produced.
pub trait Finalizer<Dep>: Clone + Send + Sync + 'static {
    type Error: Into<FinalizeErrorKind>;

    fn finalize(&mut self, dependency: Arc<Dep>) -> Result<(), Self::Error>;
}

impl<F, Dep, Err> Finalizer<Dep> for F
where
    F: FnMut(Arc<Dep>) -> Result<(), Err> + Clone + Send + Sync + 'static,
    Err: Into<FinalizeErrorKind>,
{
    type Error = Err;

    #[inline]
    fn finalize(&mut self, dependency: Arc<Dep>) -> Result<(), Self::Error> {
        self(dependency)
    }
}

pub(crate) type BoxedCloneFinalizer = BoxCloneService<RcAny, (), FinalizeErrorKind>;

#[must_use]
pub(crate) fn boxed_finalizer_factory<Dep, Fin>(finalizer: Fin) -> BoxedCloneFinalizer
where
    Dep: Send + Sync + 'static,
    Fin: Finalizer<Dep>,
{
    BoxCloneService::new(service_fn(move |dependency: RcAny| {
        let dependency = match dependency.downcast::<Dep>() {
            Ok(dependency) => dependency,
            Err(incorrect_type) => {
                error!("Incorrect finalizer dependency type: {incorrect_type:?}");
                unreachable!("Incorrect finalizer dependency type: {incorrect_type:?}");
            }
        };
        finalizer.clone().finalize(dependency).map_err(Into::<FinalizeErrorKind>::into)
    }))
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::sync::Arc;
    use core::sync::atomic::{AtomicU8, Ordering};

    use super::boxed_finalizer_factory;
    use crate::{any::RcAny, errors::FinalizeErrorKind, service::Service as _};

    struct Connection(u8);

    #[test]
    fn test_boxed_finalizer_factory() {
        let closed = Arc::new(AtomicU8::new(0));

        let mut finalizer = boxed_finalizer_factory({
            let closed = closed.clone();
            move |connection: Arc<Connection>| {
                closed.fetch_add(connection.0, Ordering::SeqCst);
                Ok::<_, FinalizeErrorKind>(())
            }
        });

        finalizer.call(Arc::new(Connection(2)) as RcAny).unwrap();
        finalizer.call(Arc::new(Connection(3)) as RcAny).unwrap();

        assert_eq!(closed.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_finalizer_error() {
        let mut finalizer = boxed_finalizer_factory(|_connection: Arc<Connection>| Err::<(), _>(anyhow::anyhow!("close failed")));

        let err = finalizer.call(Arc::new(Connection(1)) as RcAny).unwrap_err();
        assert!(matches!(err, FinalizeErrorKind::Custom(_)));
        assert_eq!(alloc::string::ToString::to_string(&err), "close failed");
    }
}
