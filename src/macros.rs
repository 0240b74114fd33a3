/// Declares a dependency set.
///
/// Each entry is `name: Type` or `name: First | Second | ...` for a parameter accepting several
/// candidate types, tried in the written order.
///
/// Expands to [`crate::DependenciesBuilder::build`], so declaration errors are returned right away.
///
/// # Examples
/// ```rust
/// use infuse::dependencies;
///
/// struct Database;
/// struct Greeting;
/// struct Fallback;
///
/// let dependencies = dependencies! {
///     db: Database,
///     greeting: Greeting | Fallback,
/// }
/// .unwrap();
///
/// assert_eq!(dependencies.len(), 2);
/// ```
#[macro_export]
macro_rules! dependencies {
    (
        $( $name:ident : $first:ty $( | $rest:ty )* ),* $(,)?
    ) => {{
        $crate::Dependencies::builder()
            $(
                .union(
                    stringify!($name),
                    [$crate::TypeInfo::of::<$first>() $(, $crate::TypeInfo::of::<$rest>() )*],
                )
            )*
            .build()
    }};
}
