//! Logging facilities for the data-view engine.
//!
//! Trellis uses the `tracing` crate for instrumentation. To see logs, install
//! a tracing subscriber in your application:
//!
//! ```ignore
//! use tracing_subscriber;
//!
//! fn main() {
//!     tracing_subscriber::fmt::init();
//!
//!     // Your application code...
//! }
//! ```

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem, e.g.
/// `RUST_LOG=trellis::expansion=trace`.
pub mod targets {
    /// Identity cache operations (wrapper creation, invalidation).
    pub const CACHE: &str = "trellis::cache";
    /// Expand/collapse transitions and the persistence walk.
    pub const EXPANSION: &str = "trellis::expansion";
    /// Row arithmetic and model/view mapping.
    pub const MAPPING: &str = "trellis::mapping";
    /// Selection reconciliation.
    pub const SELECTION: &str = "trellis::selection";
    /// Full and partial reloads.
    pub const RELOAD: &str = "trellis::reload";
}
