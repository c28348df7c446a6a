//! Error types for the data-view engine.

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur at the data-source boundary.
///
/// None of these are fatal. The engine recovers every one of them locally by
/// treating the requested operation as a no-op; they surface in the public
/// API only as `None`/`false` returns. The typed form exists so internal
/// layers can report *why* a lookup failed before the boundary converts it.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The data source reported fewer children than the requested index.
    ///
    /// Happens when the source shrinks between cache population and lookup.
    #[error("child index {index} is out of range for a container with {len} children")]
    ChildOutOfRange { index: usize, len: usize },

    /// The item is no longer reachable from the current data source.
    #[error("item is not reachable from the current data source")]
    ItemUnreachable,

    /// No data source has been attached to the controller.
    #[error("no data source has been attached")]
    NoSource,
}

impl Error {
    /// Create an out-of-range error.
    pub fn child_out_of_range(index: usize, len: usize) -> Self {
        Self::ChildOutOfRange { index, len }
    }
}
