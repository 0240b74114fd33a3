use alloc::sync::Arc;
use core::future::Future;

use super::service::{service_fn, BoxCloneService};
use crate::{any::RcAny, arguments::Arguments, errors::InstantiateErrorKind};

/// Acquisition routine of an async provider.
///
/// Implemented for every `FnMut(Arguments) -> Fut` closure where `Fut` resolves to `Result<T, E>`.
pub trait AsyncInstantiator: Clone + Send + Sync + 'static {
    type Provides: Send + Sync + 'static;
    type Error: Into<InstantiateErrorKind>;
    type Future: Future<Output = Result<Self::Provides, Self::Error>> + Send + 'static;

    fn instantiate(&mut self, arguments: Arguments) -> Self::Future;
}

impl<F, Fut, Response, Err> AsyncInstantiator for F
where
    F: FnMut(Arguments) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, Err>> + Send + 'static,
    Response: Send + Sync + 'static,
    Err: Into<InstantiateErrorKind>,
{
    type Provides = Response;
    type Error = Err;
    type Future = Fut;

    #[inline]
    fn instantiate(&mut self, arguments: Arguments) -> Self::Future {
        self(arguments)
    }
}

pub(crate) type BoxedCloneInstantiator = BoxCloneService<Arguments, RcAny, InstantiateErrorKind>;

#[must_use]
pub(crate) fn boxed_instantiator_factory<Inst>(instantiator: Inst) -> BoxedCloneInstantiator
where
    Inst: AsyncInstantiator,
{
    BoxCloneService::new(service_fn(move |arguments: Arguments| {
        let future = instantiator.clone().instantiate(arguments);
        async move {
            let dependency = future.await.map_err(Into::<InstantiateErrorKind>::into)?;
            Ok::<_, InstantiateErrorKind>(Arc::new(dependency) as RcAny)
        }
    }))
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::sync::Arc;
    use core::sync::atomic::{AtomicU8, Ordering};
    use tracing::debug;
    use tracing_test::traced_test;

    use super::boxed_instantiator_factory;
    use crate::{
        arguments::Arguments,
        async_impl::service::Service as _,
        errors::{ArgumentErrorKind, InstantiateErrorKind},
    };

    struct Port(u16);
    struct Address(u16);

    #[tokio::test]
    #[traced_test]
    async fn test_boxed_instantiator_factory() {
        let call_count = Arc::new(AtomicU8::new(0));

        let mut instantiator = boxed_instantiator_factory({
            let call_count = call_count.clone();
            move |arguments: Arguments| {
                let call_count = call_count.clone();
                async move {
                    call_count.fetch_add(1, Ordering::SeqCst);

                    debug!("Call async instantiator");
                    Ok::<_, InstantiateErrorKind>(Address(arguments.get::<Port>("port")?.0))
                }
            }
        });

        let address = instantiator.call(Arguments::new().with("port", Port(443))).await.unwrap();
        assert_eq!(address.downcast::<Address>().unwrap().0, 443);

        let Err(err) = instantiator.call(Arguments::new()).await else {
            panic!("expected an error");
        };
        assert!(matches!(
            err,
            InstantiateErrorKind::Argument(ArgumentErrorKind::Missing { name: "port" })
        ));
        assert_eq!(call_count.load(Ordering::SeqCst), 2);
    }
}
