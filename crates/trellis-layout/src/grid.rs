//! The grid orchestrator.
//!
//! A [`Grid`] owns its column and row [`TrackList`]s plus a set of children
//! with [`Placement`]s, and drives the per-axis solver through the standard
//! two-pass protocol: `measure` resolves both axes against the incoming
//! constraint and caches the results, `arrange` re-apportions toward the
//! final size, places every child into the rectangle implied by cumulative
//! track offsets, and writes each track's `actual_length` back for external
//! consumers.
//!
//! Out-of-range placements are coerced, never rejected: a child declared
//! outside the defined tracks is pulled back inside and its span truncated
//! so layout always produces a valid, non-negative result.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::trace;
use trellis_core::{Axis, Element, Rect, Size};

use crate::error::LayoutError;
use crate::scope::SharedSizeScope;
use crate::solver::{self, CellSpan, MeasureResult};
use crate::track::{TrackDefinition, TrackList};

/// Process-unique identity of a grid, used as the key for shared-size scope
/// membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GridId(u64);

impl GridId {
    /// Raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Where a child sits in the grid: starting column/row and span counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    column: i32,
    row: i32,
    column_span: i32,
    row_span: i32,
}

impl Default for Placement {
    fn default() -> Self {
        Self::new()
    }
}

impl Placement {
    /// Cell (0, 0) with span 1x1.
    pub const fn new() -> Self {
        Self {
            column: 0,
            row: 0,
            column_span: 1,
            row_span: 1,
        }
    }

    /// Placement at the given cell, span 1x1.
    pub fn at(column: i32, row: i32) -> Result<Self, LayoutError> {
        let mut placement = Self::new();
        placement.set_column(column)?;
        placement.set_row(row)?;
        Ok(placement)
    }

    /// Extend this placement across multiple tracks.
    pub fn with_span(mut self, column_span: i32, row_span: i32) -> Result<Self, LayoutError> {
        self.set_column_span(column_span)?;
        self.set_row_span(row_span)?;
        Ok(self)
    }

    /// Construct from raw values without validation.
    ///
    /// Out-of-range values (negative indices, oversized spans) are legal
    /// here and degrade gracefully through coercion at layout time; use the
    /// checked setters when rejecting bad input early is preferable.
    pub const fn raw(column: i32, row: i32, column_span: i32, row_span: i32) -> Self {
        Self {
            column,
            row,
            column_span,
            row_span,
        }
    }

    /// Starting column.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Starting row.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Number of columns covered.
    #[must_use]
    pub const fn column_span(&self) -> i32 {
        self.column_span
    }

    /// Number of rows covered.
    #[must_use]
    pub const fn row_span(&self) -> i32 {
        self.row_span
    }

    /// Set the starting column, rejecting negatives.
    pub fn set_column(&mut self, column: i32) -> Result<(), LayoutError> {
        if column < 0 {
            return Err(LayoutError::NegativeIndex { value: column });
        }
        self.column = column;
        Ok(())
    }

    /// Set the starting row, rejecting negatives.
    pub fn set_row(&mut self, row: i32) -> Result<(), LayoutError> {
        if row < 0 {
            return Err(LayoutError::NegativeIndex { value: row });
        }
        self.row = row;
        Ok(())
    }

    /// Set the column span, rejecting values below one.
    pub fn set_column_span(&mut self, span: i32) -> Result<(), LayoutError> {
        if span < 1 {
            return Err(LayoutError::InvalidSpan { value: span });
        }
        self.column_span = span;
        Ok(())
    }

    /// Set the row span, rejecting values below one.
    pub fn set_row_span(&mut self, span: i32) -> Result<(), LayoutError> {
        if span < 1 {
            return Err(LayoutError::InvalidSpan { value: span });
        }
        self.row_span = span;
        Ok(())
    }

    fn cell(&self, axis: Axis, track_count: usize) -> CellSpan {
        match axis {
            Axis::Horizontal => coerce(self.column, self.column_span, track_count),
            Axis::Vertical => coerce(self.row, self.row_span, track_count),
        }
    }
}

/// Coerce a raw (index, span) pair into tracks `[0, track_count)`.
///
/// A negative index is absorbed into a reduced span (never below 1), an
/// index past the end snaps to the last track, and an overshooting span is
/// truncated so `index + span <= track_count`.
fn coerce(index: i32, span: i32, track_count: usize) -> CellSpan {
    if track_count == 0 {
        return CellSpan { index: 0, span: 0 };
    }
    let count = track_count as i64;
    let mut span = i64::from(span).max(1);
    let mut index = i64::from(index);
    if index < 0 {
        span = (span + index).max(1);
        index = 0;
    }
    if index >= count {
        index = count - 1;
    }
    span = span.min(count - index);
    CellSpan {
        index: index as usize,
        span: span as usize,
    }
}

struct GridChild {
    element: Box<dyn Element>,
    placement: Placement,
}

struct MeasureCaches {
    constraint: Size,
    column_revision: u64,
    row_revision: u64,
    columns: MeasureResult,
    rows: MeasureResult,
    column_cells: Vec<CellSpan>,
    row_cells: Vec<CellSpan>,
}

/// Per-pass measurement memo: each child is measured at most once per
/// distinct constraint, so neither solver pass nor the final span-sized
/// re-measure repeats identical work.
struct ChildMemo {
    entries: Vec<Vec<(Size, Size)>>,
}

impl ChildMemo {
    fn new(child_count: usize) -> Self {
        Self {
            entries: vec![Vec::new(); child_count],
        }
    }

    fn measure(&mut self, children: &mut [GridChild], index: usize, constraint: Size) -> Size {
        if let Some(&(_, desired)) = self.entries[index].iter().find(|(c, _)| *c == constraint) {
            return desired;
        }
        let desired = children[index].element.measure(constraint);
        self.entries[index].push((constraint, desired));
        desired
    }
}

/// A two-dimensional layout container with fixed/auto/star tracks.
pub struct Grid {
    id: GridId,
    columns: TrackList,
    rows: TrackList,
    children: Vec<GridChild>,
    bound: bool,
    desired: Size,
    caches: Option<MeasureCaches>,
    scope: Option<Weak<RefCell<SharedSizeScope>>>,
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}

impl Grid {
    /// Create an empty grid with no track definitions.
    ///
    /// With zero definitions on both axes the grid behaves as a simple
    /// container: children get the full available space.
    pub fn new() -> Self {
        Self {
            id: GridId::next(),
            columns: TrackList::new(),
            rows: TrackList::new(),
            children: Vec::new(),
            bound: false,
            desired: Size::ZERO,
            caches: None,
            scope: None,
        }
    }

    /// This grid's identity.
    #[must_use]
    pub const fn id(&self) -> GridId {
        self.id
    }

    /// Replace the column definitions.
    ///
    /// Definitions bind once: after the first measure pass the list can
    /// still be edited in place, but not swapped wholesale.
    pub fn set_columns(&mut self, columns: TrackList) -> Result<(), LayoutError> {
        if self.bound {
            return Err(LayoutError::DefinitionsBound);
        }
        self.columns = columns;
        Ok(())
    }

    /// Replace the row definitions. Same bind-once rule as [`set_columns`].
    ///
    /// [`set_columns`]: Self::set_columns
    pub fn set_rows(&mut self, rows: TrackList) -> Result<(), LayoutError> {
        if self.bound {
            return Err(LayoutError::DefinitionsBound);
        }
        self.rows = rows;
        Ok(())
    }

    /// Column definitions.
    #[must_use]
    pub const fn columns(&self) -> &TrackList {
        &self.columns
    }

    /// Row definitions.
    #[must_use]
    pub const fn rows(&self) -> &TrackList {
        &self.rows
    }

    /// Mutable column definitions; edits invalidate cached measurements.
    pub const fn columns_mut(&mut self) -> &mut TrackList {
        &mut self.columns
    }

    /// Mutable row definitions; edits invalidate cached measurements.
    pub const fn rows_mut(&mut self) -> &mut TrackList {
        &mut self.rows
    }

    /// Add a child with the given placement. Returns the child's index.
    pub fn add_child(&mut self, element: Box<dyn Element>, placement: Placement) -> usize {
        self.children.push(GridChild { element, placement });
        self.children.len() - 1
    }

    /// Number of children.
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// A child's placement.
    #[must_use]
    pub fn placement(&self, index: usize) -> Option<Placement> {
        self.children.get(index).map(|c| c.placement)
    }

    /// Mutable access to a child's placement.
    ///
    /// Takes effect on the next measure pass; placements are re-coerced
    /// every pass rather than cached across configuration changes.
    pub fn placement_mut(&mut self, index: usize) -> Option<&mut Placement> {
        self.children.get_mut(index).map(|c| &mut c.placement)
    }

    /// Desired size from the most recent measure pass.
    #[must_use]
    pub const fn desired_size(&self) -> Size {
        self.desired
    }

    /// Join a shared size scope, leaving any current one first. Idempotent
    /// for the scope the grid is already in.
    pub fn join_scope(&mut self, host: &Rc<RefCell<SharedSizeScope>>) {
        if let Some(current) = &self.scope
            && current.ptr_eq(&Rc::downgrade(host))
        {
            return;
        }
        self.leave_scope();
        host.borrow_mut().register(self.id);
        self.scope = Some(Rc::downgrade(host));
    }

    /// Leave the current shared size scope, if any. Idempotent.
    pub fn leave_scope(&mut self) {
        if let Some(weak) = self.scope.take()
            && let Some(host) = weak.upgrade()
        {
            host.borrow_mut().unregister(self.id);
        }
    }

    /// The live scope host, pruning a dropped or disposed one.
    fn active_scope(&mut self) -> Option<Rc<RefCell<SharedSizeScope>>> {
        let weak = self.scope.as_ref()?;
        match weak.upgrade() {
            Some(host) if !host.borrow().is_disposed() => Some(host),
            _ => {
                // Host gone: the grid is unscoped until it re-resolves.
                self.scope = None;
                None
            }
        }
    }

    fn is_fast_path(&self) -> bool {
        self.columns.is_empty() && self.rows.is_empty()
    }

    /// Measure the grid under the given constraint.
    ///
    /// Runs both axis solvers with a memoized per-child measurer, re-measures
    /// every child at its resolved span size, caches the results for the
    /// upcoming arrange, and notifies the shared size scope (advisory; the
    /// notification never changes this pass's return value).
    pub fn measure(&mut self, constraint: Size) -> Size {
        self.bound = true;
        trace!(
            grid = self.id.get(),
            width = constraint.width,
            height = constraint.height,
            "grid measure"
        );

        if self.is_fast_path() {
            let mut max = Size::ZERO;
            for child in &mut self.children {
                max = max.max(child.element.measure(constraint));
            }
            self.desired = max.min(constraint);
            self.caches = None;
            return self.desired;
        }

        let implicit = [TrackDefinition::implicit_star()];
        let column_tracks: &[TrackDefinition] = if self.columns.is_empty() {
            &implicit
        } else {
            self.columns.tracks()
        };
        let row_tracks: &[TrackDefinition] = if self.rows.is_empty() {
            &implicit
        } else {
            self.rows.tracks()
        };
        let children = &mut self.children;

        let column_cells: Vec<CellSpan> = children
            .iter()
            .map(|c| c.placement.cell(Axis::Horizontal, column_tracks.len()))
            .collect();
        let row_cells: Vec<CellSpan> = children
            .iter()
            .map(|c| c.placement.cell(Axis::Vertical, row_tracks.len()))
            .collect();

        let mut memo = ChildMemo::new(children.len());

        let columns = {
            let mut measurer = |child: usize, length: f64| {
                memo.measure(children, child, Size::new(length, constraint.height))
                    .width
            };
            solver::measure(column_tracks, &column_cells, constraint.width, &mut measurer)
        };
        let rows = {
            let mut measurer = |child: usize, length: f64| {
                let width = columns.span_length(column_cells[child]);
                memo.measure(children, child, Size::new(width, length)).height
            };
            solver::measure(row_tracks, &row_cells, constraint.height, &mut measurer)
        };

        // Final pass: every child sees its resolved span size. The memo
        // skips children already measured with a matching constraint.
        for (index, cell) in column_cells.iter().enumerate() {
            let span_size = Size::new(
                columns.span_length(*cell),
                rows.span_length(row_cells[index]),
            );
            memo.measure(children, index, span_size);
        }

        self.desired = Size::new(columns.desired_length, rows.desired_length);
        let caches = MeasureCaches {
            constraint,
            column_revision: self.columns.revision(),
            row_revision: self.rows.revision(),
            columns,
            rows,
            column_cells,
            row_cells,
        };
        if let Some(scope) = self.active_scope() {
            scope.borrow_mut().record_measure(
                self.id,
                caches.columns.lean_lengths.clone(),
                caches.rows.lean_lengths.clone(),
            );
        }
        self.caches = Some(caches);
        self.desired
    }

    /// Arrange the grid into its final size.
    ///
    /// If the grid participates in a shared size scope, the scope's
    /// governing lean lengths are pinned as per-track floors so shared
    /// tracks across sibling grids converge. Children are placed at the
    /// cumulative offsets of their spans and each track's `actual_length`
    /// is recorded. A grid always consumes exactly the size it is given.
    pub fn arrange(&mut self, final_size: Size) -> Size {
        trace!(
            grid = self.id.get(),
            width = final_size.width,
            height = final_size.height,
            "grid arrange"
        );

        if self.is_fast_path() {
            let rect = Rect::from_size(final_size);
            for child in &mut self.children {
                child.element.arrange(rect);
            }
            return final_size;
        }

        // Guard against configuration changes between measure and arrange:
        // stale or missing caches force a fresh measure pass.
        let stale = match &self.caches {
            None => true,
            Some(c) => {
                c.column_revision != self.columns.revision()
                    || c.row_revision != self.rows.revision()
            }
        };
        if stale {
            let constraint = self
                .caches
                .as_ref()
                .map(|c| c.constraint)
                .unwrap_or(final_size);
            self.measure(constraint);
        }

        let governing = self
            .active_scope()
            .map(|scope| scope.borrow().handle_arrange(self.id));

        let implicit = [TrackDefinition::implicit_star()];
        let column_tracks: &[TrackDefinition] = if self.columns.is_empty() {
            &implicit
        } else {
            self.columns.tracks()
        };
        let row_tracks: &[TrackDefinition] = if self.rows.is_empty() {
            &implicit
        } else {
            self.rows.tracks()
        };
        let Some(caches) = &self.caches else {
            return final_size;
        };

        let arranged_columns = solver::arrange(
            column_tracks,
            &caches.columns,
            final_size.width,
            governing.as_ref().map(|g| g.0.as_slice()),
        );
        let arranged_rows = solver::arrange(
            row_tracks,
            &caches.rows,
            final_size.height,
            governing.as_ref().map(|g| g.1.as_slice()),
        );

        // Placements are recomputed rather than trusted from the measure
        // pass; they may have changed in between.
        for child in &mut self.children {
            let column_cell = child.placement.cell(Axis::Horizontal, column_tracks.len());
            let row_cell = child.placement.cell(Axis::Vertical, row_tracks.len());
            let rect = Rect::new(
                arranged_columns.offset(column_cell.index),
                arranged_rows.offset(row_cell.index),
                arranged_columns.span_length(column_cell),
                arranged_rows.span_length(row_cell),
            );
            child.element.arrange(rect);
        }

        for index in 0..self.columns.len() {
            self.columns
                .set_actual_length(index, arranged_columns.lengths[index]);
        }
        for index in 0..self.rows.len() {
            self.rows.set_actual_length(index, arranged_rows.lengths[index]);
        }

        final_size
    }
}

impl Drop for Grid {
    fn drop(&mut self) {
        self.leave_scope();
    }
}

impl Element for Grid {
    fn measure(&mut self, constraint: Size) -> Size {
        Grid::measure(self, constraint)
    }

    fn arrange(&mut self, rect: Rect) {
        Grid::arrange(self, rect.size());
    }

    fn desired_size(&self) -> Size {
        self.desired
    }
}
