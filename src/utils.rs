#[cfg(feature = "async")]
pub(crate) mod future;
