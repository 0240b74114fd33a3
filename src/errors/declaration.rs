use crate::any::TypeInfo;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DeclarationErrorKind {
    #[error("Invalid dependency parameter name {name:?}. Expected a non-empty identifier")]
    InvalidName { name: &'static str },
    #[error("Dependency parameter `{name}` declared more than once")]
    DuplicateName { name: &'static str },
    #[error("Dependency parameter `{name}` has no candidate types")]
    NoCandidates { name: &'static str },
    #[error("Provider of {} can't depend on its own type (parameter `{name}`)", type_info.name)]
    SelfDependency { name: &'static str, type_info: TypeInfo },
}
