use alloc::sync::Arc;

use crate::{
    any::RcAny,
    arguments::Arguments,
    errors::InstantiateErrorKind,
    service::{service_fn, BoxCloneService},
};

/// Acquisition routine of a provider.
///
/// Receives the provider's resolved dependencies by name and returns the provided value.
/// Implemented for every `FnMut(Arguments) -> Result<T, E>` closure.
pub trait Instantiator: Clone + Send + Sync + 'static {
    type Provides: Send + Sync + 'static;
    type Error: Into<InstantiateErrorKind>;

    fn instantiate(&mut self, arguments: Arguments) -> Result<Self::Provides, Self::Error>;
}

impl<F, Response, Err> Instantiator for F
where
    F: FnMut(Arguments) -> Result<Response, Err> + Clone + Send + Sync + 'static,
    Response: Send + Sync + 'static,
    Err: Into<InstantiateErrorKind>,
{
    type Provides = Response;
    type Error = Err;

    #[inline]
    fn instantiate(&mut self, arguments: Arguments) -> Result<Self::Provides, Self::Error> {
        self(arguments)
    }
}

pub(crate) type BoxedCloneInstantiator = BoxCloneService<Arguments, RcAny, InstantiateErrorKind>;

#[must_use]
pub(crate) fn boxed_instantiator_factory<Inst>(instantiator: Inst) -> BoxedCloneInstantiator
where
    Inst: Instantiator,
{
    BoxCloneService::new(service_fn(move |arguments: Arguments| {
        let dependency = instantiator.clone().instantiate(arguments).map_err(Into::<InstantiateErrorKind>::into)?;
        Ok::<_, InstantiateErrorKind>(Arc::new(dependency) as RcAny)
    }))
}

/// Instantiator of an externally created value.
#[must_use]
pub(crate) fn boxed_instance_factory<T>(value: Arc<T>) -> BoxedCloneInstantiator
where
    T: Send + Sync + 'static,
{
    BoxCloneService::new(service_fn(move |_arguments: Arguments| {
        Ok::<_, InstantiateErrorKind>(value.clone() as RcAny)
    }))
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::sync::Arc;
    use core::sync::atomic::{AtomicU8, Ordering};
    use tracing::debug;
    use tracing_test::traced_test;

    use super::{boxed_instance_factory, boxed_instantiator_factory, Instantiator};
    use crate::{
        arguments::Arguments,
        errors::{ArgumentErrorKind, InstantiateErrorKind},
        service::Service as _,
    };

    struct Port(u16);
    struct Address(u16);

    #[test]
    #[allow(dead_code)]
    fn test_factory_helper() {
        fn instantiator<F: Instantiator>(_f: F) {}

        instantiator(|_arguments: Arguments| Ok::<_, InstantiateErrorKind>(()));
        instantiator(|arguments: Arguments| Ok::<_, InstantiateErrorKind>(Address(arguments.get::<Port>("port")?.0)));
    }

    #[test]
    #[traced_test]
    fn test_boxed_instantiator_factory() {
        let call_count = Arc::new(AtomicU8::new(0));

        let mut instantiator = boxed_instantiator_factory({
            let call_count = call_count.clone();
            move |arguments: Arguments| {
                call_count.fetch_add(1, Ordering::SeqCst);

                debug!("Call instantiator");
                Ok::<_, InstantiateErrorKind>(Address(arguments.get::<Port>("port")?.0))
            }
        });

        let address = instantiator.call(Arguments::new().with("port", Port(8080))).unwrap();
        assert_eq!(address.downcast::<Address>().unwrap().0, 8080);

        let err = instantiator.call(Arguments::new()).unwrap_err();
        assert!(matches!(
            err,
            InstantiateErrorKind::Argument(ArgumentErrorKind::Missing { name: "port" })
        ));
        assert_eq!(call_count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_boxed_instance_factory() {
        let value = Arc::new(Port(1));
        let mut instantiator = boxed_instance_factory(value.clone());

        let first = instantiator.call(Arguments::new()).unwrap().downcast::<Port>().unwrap();
        let second = instantiator.call(Arguments::new()).unwrap().downcast::<Port>().unwrap();

        assert!(Arc::ptr_eq(&first, &value));
        assert!(Arc::ptr_eq(&first, &second));
    }
}
