//! Two-dimensional track-based layout.
//!
//! The crate is split along the same seam the algorithm has:
//!
//! - [`track`]: declarative row/column definitions ([`TrackLength`],
//!   [`TrackDefinition`], [`TrackList`]) with min/max clamps and a revision
//!   counter for cache invalidation.
//! - [`solver`]: the stateless per-axis engine. Resolves a track list plus
//!   spanned cell contributions into concrete lengths, with weighted star
//!   distribution and clamp-driven redistribution.
//! - [`grid`]: the [`Grid`] orchestrator. Runs the column solver, then the
//!   row solver with column-dependent heights, memoizes child measurements
//!   within a pass, and arranges children into cumulative-offset cells.
//! - [`scope`]: cross-grid size sharing. Grids in one
//!   [`SharedSizeScope`] agree on per-position track sizes; the
//!   [`ScopeRegistry`] resolves which scope a node belongs to.
//!
//! Geometry and the child protocol ([`Element`], [`Size`], [`Rect`]) come
//! from `trellis-core` and are re-exported here.
//!
//! ```
//! use trellis_layout::{Grid, Placement, TrackDefinition, TrackLength};
//! use trellis_core::{ProbeElement, Size};
//!
//! # fn main() -> Result<(), trellis_layout::LayoutError> {
//! let mut grid = Grid::new();
//! grid.columns_mut().push(TrackDefinition::fixed(80.0)?);
//! grid.columns_mut().push(TrackDefinition::new(TrackLength::STAR)?);
//!
//! let (label, _) = ProbeElement::new(40.0, 16.0);
//! grid.add_child(Box::new(label), Placement::at(0, 0)?);
//!
//! let desired = grid.measure(Size::new(200.0, 50.0));
//! grid.arrange(Size::new(200.0, desired.height));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod grid;
pub mod scope;
pub mod solver;
pub mod track;

pub use error::LayoutError;
pub use grid::{Grid, GridId, Placement};
pub use scope::{ScopeRegistry, SharedSizeScope};
pub use solver::{ArrangeResult, CellSpan, MeasureResult};
pub use track::{TrackDefinition, TrackLength, TrackList};

pub use trellis_core::{Axis, Element, NodeId, Point, Rect, Size, VisualTree};
