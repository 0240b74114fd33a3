use super::argument::ArgumentErrorKind;

#[derive(thiserror::Error, Debug)]
pub enum InstantiateErrorKind {
    #[error(transparent)]
    Argument(#[from] ArgumentErrorKind),
    #[error(transparent)]
    Custom(#[from] anyhow::Error),
}
