mod argument;
mod current;
mod declaration;
mod dependency_resolver;
mod finalize;
mod inject;
mod instantiate;

pub use argument::ArgumentErrorKind;
pub use current::{CurrentErrorKind, ReuseErrorKind};
pub use declaration::DeclarationErrorKind;
pub use dependency_resolver::ResolveErrorKind;
pub use finalize::FinalizeErrorKind;
pub use inject::InjectErrorKind;
pub use instantiate::InstantiateErrorKind;
