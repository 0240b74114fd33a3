//! Async path: async providers, acquisition and release that await, and the async call shapes.

pub(crate) mod context;
pub(crate) mod dependency_resolver;
pub(crate) mod finalizer;
pub mod inject;
pub(crate) mod instantiator;
pub(crate) mod provider;
pub(crate) mod service;
pub mod teardown;

pub use finalizer::AsyncFinalizer;
pub use instantiator::AsyncInstantiator;
pub use teardown::{close_all_async, AsyncTeardownGuard};
