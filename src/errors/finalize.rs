use crate::any::TypeInfo;

#[derive(thiserror::Error, Debug)]
pub enum FinalizeErrorKind {
    #[error("Async finalizer of {} can't be called in a sync context", type_info.name)]
    AsyncInSyncContext { type_info: TypeInfo },
    #[error(transparent)]
    Custom(#[from] anyhow::Error),
}
