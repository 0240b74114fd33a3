/// Config for a provider
/// ## Fields
/// - `cache_provides`:
///   If `true`, the provided value becomes the chain's current value for its type,
///   so every later request in the chain shares it until the owning call is torn down.
///
///   If `false`, the dependency is transient: each request acquires a new value,
///   and each value is still finalized with the call that requested it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub cache_provides: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self { cache_provides: true }
    }
}

impl Config {
    #[inline]
    #[must_use]
    pub const fn transient() -> Self {
        Self { cache_provides: false }
    }
}
