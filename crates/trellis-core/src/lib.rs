//! Core systems for Trellis.
//!
//! This crate provides the foundational mechanisms used by the Trellis
//! data-view engine:
//!
//! - **Signal/Slot System**: Type-safe change notification
//! - **Suppression Scopes**: RAII re-entrancy guards for callback storms
//!
//! Everything here is synchronous. The engine built on top of this crate
//! runs on a single UI/event-dispatch thread, so signals invoke their slots
//! directly and suppression is a plain counter rather than a lock.
//!
//! # Signal/Slot Example
//!
//! ```
//! use trellis_core::Signal;
//!
//! // Create a signal that notifies when a value changes
//! let value_changed = Signal::<i32>::new();
//!
//! // Connect a slot to handle the signal
//! let conn_id = value_changed.connect(|value| {
//!     println!("Value changed to: {}", value);
//! });
//!
//! // Emit the signal
//! value_changed.emit(42);
//!
//! // Disconnect when done
//! value_changed.disconnect(conn_id);
//! ```
//!
//! # Suppression Example
//!
//! ```
//! use trellis_core::Suppression;
//!
//! let suppression = Suppression::new();
//! assert!(!suppression.is_active());
//! {
//!     let _scope = suppression.enter();
//!     assert!(suppression.is_active());
//! }
//! // The guard restored the counter on drop
//! assert!(!suppression.is_active());
//! ```

mod signal;
mod suppress;

pub use signal::{ConnectionGuard, ConnectionId, Signal};
pub use suppress::{SuppressGuard, Suppression};
