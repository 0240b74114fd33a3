use crate::any::TypeInfo;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgumentErrorKind {
    #[error("Argument `{name}` not found")]
    Missing { name: &'static str },
    #[error("Incorrect type of argument `{name}`. Actual: {}, expected: {}", actual.name, expected.name)]
    IncorrectType {
        name: &'static str,
        expected: TypeInfo,
        actual: TypeInfo,
    },
}
