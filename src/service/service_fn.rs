use super::base::Service;

#[inline]
#[must_use]
pub(crate) const fn service_fn<T>(f: T) -> ServiceFn<T> {
    ServiceFn { f }
}

#[derive(Clone)]
pub(crate) struct ServiceFn<T> {
    f: T,
}

impl<F, Request, Response, Error> Service<Request> for ServiceFn<F>
where
    F: FnMut(Request) -> Result<Response, Error>,
{
    type Response = Response;
    type Error = Error;

    #[inline]
    fn call(&mut self, request: Request) -> Result<Self::Response, Self::Error> {
        (self.f)(request)
    }
}

#[cfg(test)]
mod tests {
    use core::convert::Infallible;

    use super::{service_fn, Service as _};
    use crate::service::BoxCloneService;

    #[derive(Clone, Copy)]
    struct Request(u8);
    struct Response(u8);

    #[test]
    fn test_service() {
        let mut service = service_fn(|Request(val)| Ok::<_, Infallible>(Response(val + 1)));

        assert_eq!(service.call(Request(1)).unwrap().0, 2);
    }

    #[test]
    fn test_boxed_clone_service() {
        let service = BoxCloneService::new(service_fn(|Request(val)| Ok::<_, Infallible>(Response(val * 2))));
        let mut cloned = service.clone();

        assert_eq!(cloned.call(Request(3)).unwrap().0, 6);
    }
}
