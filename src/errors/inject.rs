use super::{dependency_resolver::ResolveErrorKind, finalize::FinalizeErrorKind};

#[derive(thiserror::Error, Debug)]
pub enum InjectErrorKind {
    #[error(transparent)]
    Resolve(#[from] ResolveErrorKind),
    #[error(transparent)]
    Finalize(#[from] FinalizeErrorKind),
}
