use core::future::Future;

use super::Service;

/// Service whose future is transformed by `f` after each call.
#[derive(Clone)]
pub(crate) struct MapFuture<S, F> {
    inner: S,
    f: F,
}

impl<S, F> MapFuture<S, F> {
    #[inline]
    pub(crate) const fn new(inner: S, f: F) -> Self {
        Self { inner, f }
    }
}

impl<Request, S, F, Response, Error, Fut> Service<Request> for MapFuture<S, F>
where
    S: Service<Request>,
    F: FnMut(S::Future) -> Fut,
    Error: From<S::Error>,
    Fut: Future<Output = Result<Response, Error>>,
{
    type Response = Response;
    type Error = Error;
    type Future = Fut;

    #[inline]
    fn call(&mut self, request: Request) -> Self::Future {
        (self.f)(self.inner.call(request))
    }
}
