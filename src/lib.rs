#![cfg_attr(not(test), no_std)]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

#[macro_use]
pub(crate) mod macros;

pub(crate) mod any;
pub(crate) mod arguments;
pub(crate) mod chain;
pub(crate) mod config;
pub(crate) mod context;
pub(crate) mod current;
pub(crate) mod dependency;
pub(crate) mod dependency_resolver;
pub(crate) mod errors;
pub(crate) mod finalizer;
pub mod inject;
pub(crate) mod instantiator;
pub(crate) mod provider;
pub(crate) mod registry;
pub(crate) mod service;
pub mod teardown;
pub(crate) mod utils;

#[cfg(feature = "async")]
#[cfg_attr(docsrs, doc(cfg(feature = "async")))]
pub mod async_impl;

pub use any::TypeInfo;
pub use arguments::{Argument, Arguments};
pub use chain::Chain;
pub use config::Config;
pub use context::ActiveContext;
pub use current::Current;
pub use dependency::{Dependencies, DependenciesBuilder, Dependency};
pub use errors::{
    ArgumentErrorKind, CurrentErrorKind, DeclarationErrorKind, FinalizeErrorKind, InjectErrorKind, InstantiateErrorKind,
    ResolveErrorKind, ReuseErrorKind,
};
pub use finalizer::Finalizer;
pub use instantiator::Instantiator;
pub use provider::Provider;
pub use registry::Registration;
pub use teardown::{close_all, TeardownGuard};

#[cfg(feature = "async")]
pub use async_impl::{close_all_async, AsyncFinalizer, AsyncInstantiator, AsyncTeardownGuard};
