use super::dependency_resolver::ResolveErrorKind;
use crate::any::TypeInfo;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ReuseErrorKind {
    #[error("Accessor of {} is already entered. Exit it before entering again", type_info.name)]
    AlreadyEntered { type_info: TypeInfo },
}

#[derive(thiserror::Error, Debug)]
pub enum CurrentErrorKind {
    #[error(transparent)]
    Reuse(#[from] ReuseErrorKind),
    #[error(transparent)]
    Resolve(#[from] ResolveErrorKind),
}
