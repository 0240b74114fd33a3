use alloc::boxed::Box;
use core::fmt::{self, Display, Formatter};

use super::instantiate::InstantiateErrorKind;
use crate::any::TypeInfo;

#[derive(thiserror::Error, Debug)]
pub enum ResolveErrorKind {
    #[error("No provider declared for {}", type_info.name)]
    NoProvider { type_info: TypeInfo },
    #[error("No active provider for {} in the current chain", type_info.name)]
    NoActiveProvider { type_info: TypeInfo },
    #[error("No active provider for any candidate of `{name}`: {}", Candidates(candidates))]
    NoActiveCandidate { name: &'static str, candidates: Box<[TypeInfo]> },
    #[error("Async provider of {} can't be used in a sync context", type_info.name)]
    AsyncInSyncContext { type_info: TypeInfo },
    #[error("Cyclic dependency detected: {}", Path(path))]
    CyclicDependency { path: Box<[TypeInfo]> },
    #[error("Failed to resolve dependency `{name}`: {source}")]
    Dependency {
        name: &'static str,
        #[source]
        source: Box<ResolveErrorKind>,
    },
    #[error("Provider of {} failed: {source}", type_info.name)]
    Instantiate {
        type_info: TypeInfo,
        #[source]
        source: InstantiateErrorKind,
    },
}

impl ResolveErrorKind {
    /// Returns `true` if the type was never registered with any provider.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        match self {
            Self::NoProvider { .. } => true,
            Self::Dependency { source, .. } => source.is_configuration(),
            _ => false,
        }
    }

    /// Returns `true` if a provider exists but can't be activated in the current chain.
    #[must_use]
    pub fn is_activation(&self) -> bool {
        match self {
            Self::NoActiveProvider { .. } | Self::NoActiveCandidate { .. } | Self::AsyncInSyncContext { .. } => true,
            Self::Dependency { source, .. } => source.is_activation(),
            _ => false,
        }
    }
}

struct Candidates<'a>(&'a [TypeInfo]);

impl Display for Candidates<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (index, type_info) in self.0.iter().enumerate() {
            if index > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{}", type_info.name)?;
        }
        Ok(())
    }
}

struct Path<'a>(&'a [TypeInfo]);

impl Display for Path<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (index, type_info) in self.0.iter().enumerate() {
            if index > 0 {
                write!(f, " -> ")?;
            }
            write!(f, "{}", type_info.name)?;
        }
        Ok(())
    }
}
