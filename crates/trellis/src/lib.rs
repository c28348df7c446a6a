//! Trellis: a model/view virtualization engine for tree and grid controls.
//!
//! Native list-rendering widgets want a flat run of rows; applications have
//! hierarchical or flat data stores, sorted and filtered views of them, and
//! selection that should mean "these items", not "these row numbers". This
//! crate is the layer between the two: it projects an arbitrary, possibly
//! infinite-depth data source onto the row model a host control expects,
//! keeps a stable identity wrapper per logical item so expand/collapse and
//! selection survive reloads, and reconciles application-issued commands
//! with the host's own callbacks without notification storms.
//!
//! # Core Types
//!
//! - [`TreeController`]: the engine for hierarchical hosts - identity
//!   cache, expansion state machine, row resolution, selection, reloads
//! - [`GridController`]: the engine for flat hosts - model/view index
//!   mapping under sort/filter, selection synchronization, reloads
//! - [`TreeHost`] / [`GridHost`]: the command surface a native widget
//!   adapter implements
//! - [`source`]: the capability traits a data source implements
//! - [`node`]: ready-made sources for applications and tests
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────┐  pull rows / notify   ┌──────────────────┐
//! │ Host control│◄─────────────────────►│  TreeController  │
//! │ (native     │   expand / select /   │  GridController  │
//! │  widget)    │   reload commands     └──────────────────┘
//! └─────────────┘                          │            │
//!                                  wrappers│            │signals
//!                                          ▼            ▼
//!                                 ┌──────────────┐  ┌─────────────┐
//!                                 │ Data source  │  │ Application │
//!                                 │ (TreeItem /  │  │  slots      │
//!                                 │  GridSource) │  └─────────────┘
//!                                 └──────────────┘
//! ```
//!
//! The host pulls children and row counts from the controller; the
//! application pushes selection and expansion changes into it; both paths
//! agree on row numbers through the flattened-row arithmetic in [`rows`]
//! and the index projection in [`mapping`].
//!
//! # Threading
//!
//! Everything is synchronous and intended for a single UI thread: every
//! operation runs to completion before control returns, and re-entrant host
//! callbacks are serialized by guard counters, not locks. A controller and
//! its caches are exclusively owned by one control instance. The types are
//! nonetheless `Send + Sync` so a controller can live behind `Arc` in
//! whatever structure owns the widget.

pub mod error;
pub mod grid;
pub mod host;
pub mod logging;
pub mod mapping;
pub mod node;
pub mod rows;
pub mod selection;
pub mod source;
pub mod tree;
mod wrapper;

pub use error::{Error, Result};
pub use grid::{GridController, GridSignals};
pub use host::{ExpandEvent, GridHost, TreeHost};
pub use mapping::{CompareFn, FilterFn, ViewMapping};
pub use selection::SelectionPhase;
pub use source::{
    GridItem, GridItemRef, GridSource, HasChildren, HasImage, HasText, ImageId, ItemKey, TreeItem,
    TreeItemRef, same_item,
};
pub use tree::{TreeController, TreeSignals};
pub use wrapper::{ExpandState, WrapperKey};
