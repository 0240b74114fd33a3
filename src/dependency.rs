use alloc::{boxed::Box, sync::Arc, vec::Vec};

use crate::{any::TypeInfo, errors::DeclarationErrorKind};

/// A declared dependency parameter: its name and the ordered candidate types.
///
/// At resolution the first candidate with a live value or an active provider wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub name: &'static str,
    pub candidates: Box<[TypeInfo]>,
}

impl Dependency {
    #[inline]
    #[must_use]
    pub fn is_union(&self) -> bool {
        self.candidates.len() > 1
    }
}

/// Normalized dependency set of a consumer or a provider, built once at declaration time.
#[derive(Debug, Clone, Default)]
pub struct Dependencies {
    items: Arc<[Dependency]>,
}

impl Dependencies {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn builder() -> DependenciesBuilder {
        DependenciesBuilder::new()
    }

    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Dependency> {
        self.items.iter().find(|dependency| dependency.name == name)
    }

    #[inline]
    pub fn iter(&self) -> core::slice::Iter<'_, Dependency> {
        self.items.iter()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn ensure_not_provides(&self, type_info: TypeInfo) -> Result<(), DeclarationErrorKind> {
        match self.items.iter().find(|dependency| dependency.candidates.contains(&type_info)) {
            Some(dependency) => Err(DeclarationErrorKind::SelfDependency {
                name: dependency.name,
                type_info,
            }),
            None => Ok(()),
        }
    }
}

impl<'a> IntoIterator for &'a Dependencies {
    type Item = &'a Dependency;
    type IntoIter = core::slice::Iter<'a, Dependency>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Default)]
pub struct DependenciesBuilder {
    items: Vec<(&'static str, Vec<TypeInfo>)>,
}

impl DependenciesBuilder {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn dependency<T: ?Sized + 'static>(self, name: &'static str) -> Self {
        self.union(name, [TypeInfo::of::<T>()])
    }

    /// Declares a parameter accepting any of `candidates`, tried in the given order.
    #[must_use]
    pub fn union(mut self, name: &'static str, candidates: impl IntoIterator<Item = TypeInfo>) -> Self {
        self.items.push((name, candidates.into_iter().collect()));
        self
    }

    /// Validates and normalizes the declaration.
    ///
    /// # Errors
    /// - Returns [`DeclarationErrorKind::InvalidName`] if a name is empty or isn't an identifier
    /// - Returns [`DeclarationErrorKind::DuplicateName`] if a name is declared twice
    /// - Returns [`DeclarationErrorKind::NoCandidates`] if a parameter has no candidate types
    pub fn build(self) -> Result<Dependencies, DeclarationErrorKind> {
        let mut items: Vec<Dependency> = Vec::with_capacity(self.items.len());
        for (name, candidates) in self.items {
            if !is_identifier(name) {
                return Err(DeclarationErrorKind::InvalidName { name });
            }
            if items.iter().any(|dependency| dependency.name == name) {
                return Err(DeclarationErrorKind::DuplicateName { name });
            }

            let mut normalized = Vec::with_capacity(candidates.len());
            for candidate in candidates {
                if !normalized.contains(&candidate) {
                    normalized.push(candidate);
                }
            }
            if normalized.is_empty() {
                return Err(DeclarationErrorKind::NoCandidates { name });
            }

            items.push(Dependency {
                name,
                candidates: normalized.into_boxed_slice(),
            });
        }

        Ok(Dependencies { items: items.into() })
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first == '_' || first.is_alphabetic() => chars.all(|char| char == '_' || char.is_alphanumeric()),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::Dependencies;
    use crate::{any::TypeInfo, dependencies, errors::DeclarationErrorKind};

    struct Database;
    struct Greeting;
    struct Fallback;

    #[test]
    fn test_build() {
        let dependencies = Dependencies::builder()
            .dependency::<Database>("db")
            .union("greeting", [TypeInfo::of::<Greeting>(), TypeInfo::of::<Fallback>()])
            .build()
            .unwrap();

        assert_eq!(dependencies.len(), 2);
        assert!(!dependencies.get("db").unwrap().is_union());
        assert_eq!(
            &*dependencies.get("greeting").unwrap().candidates,
            &[TypeInfo::of::<Greeting>(), TypeInfo::of::<Fallback>()]
        );
    }

    #[test]
    fn test_union_normalized() {
        let dependencies = Dependencies::builder()
            .union(
                "greeting",
                [TypeInfo::of::<Greeting>(), TypeInfo::of::<Fallback>(), TypeInfo::of::<Greeting>()],
            )
            .build()
            .unwrap();

        assert_eq!(
            &*dependencies.get("greeting").unwrap().candidates,
            &[TypeInfo::of::<Greeting>(), TypeInfo::of::<Fallback>()]
        );
    }

    #[test]
    fn test_declaration_errors() {
        assert_eq!(
            Dependencies::builder().dependency::<Database>("").build().unwrap_err(),
            DeclarationErrorKind::InvalidName { name: "" }
        );
        assert_eq!(
            Dependencies::builder().dependency::<Database>("1db").build().unwrap_err(),
            DeclarationErrorKind::InvalidName { name: "1db" }
        );
        assert_eq!(
            Dependencies::builder()
                .dependency::<Database>("db")
                .dependency::<Greeting>("db")
                .build()
                .unwrap_err(),
            DeclarationErrorKind::DuplicateName { name: "db" }
        );
        assert_eq!(
            Dependencies::builder().union("greeting", []).build().unwrap_err(),
            DeclarationErrorKind::NoCandidates { name: "greeting" }
        );
    }

    #[test]
    fn test_self_dependency() {
        let dependencies = Dependencies::builder().dependency::<Database>("db").build().unwrap();

        assert!(dependencies.ensure_not_provides(TypeInfo::of::<Greeting>()).is_ok());
        assert!(matches!(
            dependencies.ensure_not_provides(TypeInfo::of::<Database>()),
            Err(DeclarationErrorKind::SelfDependency { name: "db", .. })
        ));
    }

    #[test]
    fn test_macro() {
        let dependencies = dependencies! {
            db: Database,
            greeting: Greeting | Fallback,
        }
        .unwrap();

        assert_eq!(dependencies.len(), 2);
        assert!(dependencies.get("greeting").unwrap().is_union());

        let empty = dependencies! {}.unwrap();
        assert!(empty.is_empty());
    }
}
