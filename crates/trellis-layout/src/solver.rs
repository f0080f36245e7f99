//! The per-axis track solver.
//!
//! Stateless, pure functions over `(track definitions, child spans, a
//! measurement callback)`. The grid orchestrator calls [`measure`] once per
//! axis to resolve track lengths against an available length, then
//! [`arrange`] to re-apportion toward the final length handed down by the
//! parent. Neither function keeps state between calls, so historical inputs
//! can be replayed without side effects.
//!
//! Resolution order per axis:
//!
//! 1. Fixed tracks clamp their declared value.
//! 2. Auto tracks size to the children whose span lies entirely within
//!    auto/fixed tracks; a spanning child's length, less the fixed tracks it
//!    crosses, is split equally across the auto tracks in its span. Children
//!    that also cover a star track are deferred to star apportionment so
//!    auto and star sizing cannot depend on each other.
//! 3. Star tracks share the remaining space by weight, with a clamp-driven
//!    redistribution fixpoint: a track pinned by its min/max leaves the
//!    proportional pool and the rest re-divide the freed space. The pool
//!    shrinks every round, so this terminates in at most one round per star
//!    track.

use crate::track::{TrackDefinition, TrackLength};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tolerance for deciding that a clamp changed a proportional share.
const CLAMP_EPSILON: f64 = 1e-9;

/// A child's coerced placement along one axis: starting track and number of
/// consecutive tracks covered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellSpan {
    /// First track index.
    pub index: usize,
    /// Number of tracks covered, `index + span <= track count`.
    pub span: usize,
}

impl CellSpan {
    /// Tracks covered, as a range.
    #[inline]
    pub const fn range(&self) -> std::ops::Range<usize> {
        self.index..self.index + self.span
    }
}

/// Resolved track lengths for one axis after a measure pass.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MeasureResult {
    /// Per-track resolved length, one entry per track.
    pub lengths: Vec<f64>,
    /// Sum of all resolved lengths. May exceed the available length when
    /// fixed/auto minimums are large; the caller decides how to overflow.
    pub desired_length: f64,
    /// Per-track minimal/intrinsic length with star tracks at their minimum.
    /// Independent of the available length, which makes it the common basis
    /// for shared-size negotiation across grids measured under different
    /// constraints.
    pub lean_lengths: Vec<f64>,
}

impl MeasureResult {
    /// Sum of resolved lengths across a span.
    #[must_use]
    pub fn span_length(&self, cell: CellSpan) -> f64 {
        self.lengths[cell.range()].iter().sum()
    }
}

/// Final track lengths for one axis after an arrange pass.
///
/// Lengths sum to at most the target length handed to [`arrange`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ArrangeResult {
    /// Per-track final length.
    pub lengths: Vec<f64>,
}

impl ArrangeResult {
    /// Offset of the given track from the axis origin.
    #[must_use]
    pub fn offset(&self, index: usize) -> f64 {
        self.lengths[..index].iter().sum()
    }

    /// Sum of final lengths across a span.
    #[must_use]
    pub fn span_length(&self, cell: CellSpan) -> f64 {
        self.lengths[cell.range()].iter().sum()
    }
}

/// Resolve track lengths for one axis.
///
/// `cells` carries one coerced span per child. `measurer` is called with
/// `(child index, axis constraint)` and returns the child's natural length
/// along this axis under that constraint; the solver calls it at most once
/// per child.
pub fn measure<F>(
    tracks: &[TrackDefinition],
    cells: &[CellSpan],
    available: f64,
    measurer: &mut F,
) -> MeasureResult
where
    F: FnMut(usize, f64) -> f64,
{
    let n = tracks.len();
    let mut lengths = vec![0.0; n];

    for (i, track) in tracks.iter().enumerate() {
        if let TrackLength::Fixed(value) = track.length() {
            lengths[i] = track.clamp(value);
        }
    }

    // Content estimates for auto tracks, from children that never touch a
    // star track.
    let mut auto_content = vec![0.0f64; n];
    for (child, cell) in cells.iter().enumerate() {
        let Some(range) = clip_range(cell, n) else {
            continue;
        };
        if tracks[range.clone()].iter().any(|t| t.length().is_star()) {
            continue;
        }
        let auto_count = tracks[range.clone()]
            .iter()
            .filter(|t| t.length().is_auto())
            .count();
        if auto_count == 0 {
            continue;
        }
        let natural = measurer(child, f64::INFINITY);
        let fixed_sum: f64 = range.clone().map(|i| lengths[i]).sum();
        let share = (natural - fixed_sum).max(0.0) / auto_count as f64;
        for i in range {
            if tracks[i].length().is_auto() {
                auto_content[i] = auto_content[i].max(share);
            }
        }
    }
    for (i, track) in tracks.iter().enumerate() {
        if track.length().is_auto() {
            lengths[i] = track.clamp(auto_content[i]);
        }
    }

    let pool: Vec<usize> = tracks
        .iter()
        .enumerate()
        .filter(|(_, t)| t.length().is_star())
        .map(|(i, _)| i)
        .collect();
    if !pool.is_empty() {
        let non_star: f64 = lengths.iter().sum();
        let remaining = (available - non_star).max(0.0);
        if remaining.is_finite() {
            distribute_stars(tracks, &mut lengths, &pool, remaining, |i| {
                tracks[i].min_length()
            });
        } else {
            // Unconstrained axis: proportional shares are meaningless, so
            // star tracks fall back to sizing by the content that covers
            // them, like auto tracks.
            let mut star_content = vec![0.0f64; n];
            for (child, cell) in cells.iter().enumerate() {
                let Some(range) = clip_range(cell, n) else {
                    continue;
                };
                let star_count = tracks[range.clone()]
                    .iter()
                    .filter(|t| t.length().is_star())
                    .count();
                if star_count == 0 {
                    continue;
                }
                let natural = measurer(child, f64::INFINITY);
                let resolved: f64 = range.clone().map(|i| lengths[i]).sum();
                let share = (natural - resolved).max(0.0) / star_count as f64;
                for i in range {
                    if tracks[i].length().is_star() {
                        star_content[i] = star_content[i].max(share);
                    }
                }
            }
            for &i in &pool {
                lengths[i] = tracks[i].clamp(star_content[i]);
            }
        }
    }

    let desired_length = lengths.iter().sum();
    let lean_lengths = tracks
        .iter()
        .enumerate()
        .map(|(i, t)| {
            if t.length().is_star() {
                t.clamp(0.0)
            } else {
                lengths[i]
            }
        })
        .collect();

    MeasureResult {
        lengths,
        desired_length,
        lean_lengths,
    }
}

/// Re-apportion track lengths toward an exact final length.
///
/// Fixed and auto tracks keep their measured lengths; star tracks re-divide
/// whatever remains of `final_length`. When `lean_override` is supplied
/// (shared-size case), each entry acts as a forced minimum floor for the
/// corresponding track for this call only - the original definitions are not
/// touched. The result never sums to more than `final_length`.
pub fn arrange(
    tracks: &[TrackDefinition],
    measured: &MeasureResult,
    final_length: f64,
    lean_override: Option<&[f64]>,
) -> ArrangeResult {
    let n = tracks.len();
    debug_assert_eq!(measured.lengths.len(), n);

    let floor = |i: usize| {
        let base = tracks[i].min_length();
        match lean_override.and_then(|o| o.get(i)) {
            Some(&pinned) => base.max(pinned),
            None => base,
        }
    };

    let mut lengths = vec![0.0; n];
    let mut pool = Vec::new();
    for (i, track) in tracks.iter().enumerate() {
        if track.length().is_star() {
            pool.push(i);
        } else {
            lengths[i] = measured.lengths[i].max(floor(i)).min(track.max_length());
        }
    }

    if !pool.is_empty() {
        let non_star: f64 = lengths.iter().sum();
        let remaining = (final_length - non_star).max(0.0);
        distribute_stars(tracks, &mut lengths, &pool, remaining, floor);
    }

    // Conservation: the reported lengths never total more than the target,
    // even when fixed/auto minimums alone exceed it.
    let mut consumed = 0.0;
    for length in &mut lengths {
        let available = (final_length - consumed).max(0.0);
        if *length > available {
            *length = available;
        }
        consumed += *length;
    }

    ArrangeResult { lengths }
}

/// Proportional distribution with clamp-driven redistribution.
///
/// Tracks whose weighted share lands outside `[floor, max]` are pinned at
/// the violated bound and leave the pool; the survivors re-divide the rest.
/// Terminates because every extra round removes at least one track.
fn distribute_stars(
    tracks: &[TrackDefinition],
    lengths: &mut [f64],
    pool: &[usize],
    mut remaining: f64,
    floor: impl Fn(usize) -> f64,
) {
    let weight = |i: usize| match tracks[i].length() {
        TrackLength::Star(w) => w.max(0.0),
        _ => 0.0,
    };
    let clamp = |i: usize, value: f64| value.max(floor(i)).min(tracks[i].max_length());

    let mut pool: Vec<usize> = pool.to_vec();
    while !pool.is_empty() {
        let total_weight: f64 = pool.iter().map(|&i| weight(i)).sum();
        if total_weight <= 0.0 {
            for &i in &pool {
                lengths[i] = clamp(i, 0.0);
            }
            return;
        }

        let mut pinned = Vec::new();
        for &i in &pool {
            let ideal = remaining * weight(i) / total_weight;
            let resolved = clamp(i, ideal);
            if (resolved - ideal).abs() > CLAMP_EPSILON {
                pinned.push((i, resolved));
            } else {
                lengths[i] = ideal;
            }
        }

        if pinned.is_empty() {
            return;
        }
        for &(i, resolved) in &pinned {
            lengths[i] = resolved;
            remaining = (remaining - resolved).max(0.0);
        }
        pool.retain(|i| !pinned.iter().any(|&(p, _)| p == *i));
    }
}

fn clip_range(cell: &CellSpan, track_count: usize) -> Option<std::ops::Range<usize>> {
    if cell.span == 0 || cell.index >= track_count {
        return None;
    }
    Some(cell.index..(cell.index + cell.span).min(track_count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::TrackDefinition;
    use proptest::prelude::*;

    fn star(weight: f64) -> TrackDefinition {
        TrackDefinition::star(weight).unwrap()
    }

    fn fixed(value: f64) -> TrackDefinition {
        TrackDefinition::fixed(value).unwrap()
    }

    fn no_children(_: usize, _: f64) -> f64 {
        panic!("measurer must not be called without children")
    }

    #[test]
    fn star_apportionment_by_weight() {
        let tracks = [star(1.0), star(1.0), star(2.0)];
        let result = measure(&tracks, &[], 400.0, &mut no_children);
        assert_eq!(result.lengths, vec![100.0, 100.0, 200.0]);
        assert_eq!(result.desired_length, 400.0);
    }

    #[test]
    fn redistribution_when_max_clamp_binds() {
        let tracks = [star(1.0).with_max_length(20.0).unwrap(), star(1.0)];
        let result = measure(&tracks, &[], 100.0, &mut no_children);
        assert_eq!(result.lengths, vec![20.0, 80.0]);
    }

    #[test]
    fn redistribution_when_min_clamp_binds() {
        let tracks = [star(1.0).with_min_length(80.0).unwrap(), star(1.0)];
        let result = measure(&tracks, &[], 100.0, &mut no_children);
        assert_eq!(result.lengths, vec![80.0, 20.0]);
    }

    #[test]
    fn all_clamped_stars_terminate() {
        let tracks = [
            star(1.0).with_max_length(10.0).unwrap(),
            star(1.0).with_max_length(10.0).unwrap(),
        ];
        let result = measure(&tracks, &[], 1000.0, &mut no_children);
        assert_eq!(result.lengths, vec![10.0, 10.0]);
    }

    #[test]
    fn zero_weight_stars_resolve_to_min() {
        let tracks = [star(0.0).with_min_length(5.0).unwrap(), star(0.0)];
        let result = measure(&tracks, &[], 100.0, &mut no_children);
        assert_eq!(result.lengths, vec![5.0, 0.0]);
    }

    #[test]
    fn zero_available_resolves_to_minimums() {
        let tracks = [star(1.0).with_min_length(7.0).unwrap(), TrackDefinition::auto()];
        let result = measure(&tracks, &[], 0.0, &mut |_, _| 0.0);
        assert_eq!(result.lengths, vec![7.0, 0.0]);
    }

    #[test]
    fn fixed_tracks_clamp_their_value() {
        let tracks = [
            fixed(50.0).with_max_length(30.0).unwrap(),
            fixed(5.0).with_min_length(10.0).unwrap(),
        ];
        let result = measure(&tracks, &[], 100.0, &mut no_children);
        assert_eq!(result.lengths, vec![30.0, 10.0]);
    }

    #[test]
    fn auto_track_sizes_to_largest_child() {
        let tracks = [TrackDefinition::auto()];
        let cells = [CellSpan { index: 0, span: 1 }, CellSpan { index: 0, span: 1 }];
        let naturals = [30.0, 45.0];
        let result = measure(&tracks, &cells, 100.0, &mut |child, _| naturals[child]);
        assert_eq!(result.lengths, vec![45.0]);
    }

    #[test]
    fn spanning_child_splits_remainder_across_auto_tracks() {
        let tracks = [fixed(10.0), TrackDefinition::auto(), TrackDefinition::auto()];
        let cells = [CellSpan { index: 0, span: 3 }];
        let result = measure(&tracks, &cells, 200.0, &mut |_, _| 70.0);
        // 70 less the fixed 10, split between the two auto tracks.
        assert_eq!(result.lengths, vec![10.0, 30.0, 30.0]);
    }

    #[test]
    fn auto_ignores_children_that_cover_a_star_track() {
        let tracks = [TrackDefinition::auto(), star(1.0)];
        let cells = [CellSpan { index: 0, span: 2 }];
        let mut calls = 0;
        let result = measure(&tracks, &cells, 100.0, &mut |_, _| {
            calls += 1;
            90.0
        });
        // The spanning child defers to star apportionment; the auto track
        // stays at content zero and the star absorbs the full width.
        assert_eq!(result.lengths, vec![0.0, 100.0]);
        assert_eq!(calls, 0);
    }

    #[test]
    fn measurer_called_at_most_once_per_child() {
        let tracks = [TrackDefinition::auto(), TrackDefinition::auto()];
        let cells = [
            CellSpan { index: 0, span: 1 },
            CellSpan { index: 0, span: 2 },
            CellSpan { index: 1, span: 1 },
        ];
        let mut calls = [0usize; 3];
        measure(&tracks, &cells, 100.0, &mut |child, _| {
            calls[child] += 1;
            10.0
        });
        assert_eq!(calls, [1, 1, 1]);
    }

    #[test]
    fn desired_length_may_overflow_available() {
        let tracks = [fixed(100.0), fixed(100.0)];
        let result = measure(&tracks, &[], 50.0, &mut no_children);
        assert_eq!(result.desired_length, 200.0);
    }

    #[test]
    fn unconstrained_stars_size_to_content() {
        let tracks = [star(1.0), star(1.0)];
        let cells = [CellSpan { index: 0, span: 1 }, CellSpan { index: 1, span: 1 }];
        let naturals = [40.0, 25.0];
        let result = measure(&tracks, &cells, f64::INFINITY, &mut |child, _| {
            naturals[child]
        });
        assert_eq!(result.lengths, vec![40.0, 25.0]);
        assert_eq!(result.desired_length, 65.0);
    }

    #[test]
    fn lean_lengths_ignore_available_length() {
        let tracks = [
            fixed(20.0),
            TrackDefinition::auto(),
            star(1.0).with_min_length(5.0).unwrap(),
        ];
        let cells = [CellSpan { index: 1, span: 1 }];
        let narrow = measure(&tracks, &cells, 100.0, &mut |_, _| 33.0);
        let wide = measure(&tracks, &cells, 500.0, &mut |_, _| 33.0);
        assert_eq!(narrow.lean_lengths, wide.lean_lengths);
        assert_eq!(narrow.lean_lengths, vec![20.0, 33.0, 5.0]);
    }

    #[test]
    fn measure_is_deterministic() {
        let tracks = [fixed(10.0), TrackDefinition::auto(), star(2.0)];
        let cells = [CellSpan { index: 1, span: 1 }];
        let a = measure(&tracks, &cells, 300.0, &mut |_, _| 42.0);
        let b = measure(&tracks, &cells, 300.0, &mut |_, _| 42.0);
        assert_eq!(a, b);
    }

    #[test]
    fn arrange_fills_final_length_exactly() {
        let tracks = [fixed(30.0), star(1.0), star(1.0)];
        let measured = measure(&tracks, &[], 100.0, &mut no_children);
        let arranged = arrange(&tracks, &measured, 130.0, None);
        assert_eq!(arranged.lengths, vec![30.0, 50.0, 50.0]);
        assert_eq!(arranged.lengths.iter().sum::<f64>(), 130.0);
    }

    #[test]
    fn arrange_override_floors_tracks_without_mutating_definitions() {
        let tracks = [TrackDefinition::auto(), star(1.0)];
        let cells = [CellSpan { index: 0, span: 1 }];
        let measured = measure(&tracks, &cells, 100.0, &mut |_, _| 50.0);
        let arranged = arrange(&tracks, &measured, 100.0, Some(&[70.0, 0.0]));
        assert_eq!(arranged.lengths, vec![70.0, 30.0]);
        assert_eq!(tracks[0].min_length(), 0.0);
    }

    #[test]
    fn arrange_never_exceeds_final_length() {
        let tracks = [fixed(80.0), fixed(80.0)];
        let measured = measure(&tracks, &[], 100.0, &mut no_children);
        let arranged = arrange(&tracks, &measured, 100.0, None);
        assert_eq!(arranged.lengths.iter().sum::<f64>(), 100.0);
        assert_eq!(arranged.lengths, vec![80.0, 20.0]);
    }

    #[test]
    fn arrange_offsets_are_prefix_sums() {
        let tracks = [fixed(10.0), fixed(20.0), fixed(30.0)];
        let measured = measure(&tracks, &[], 60.0, &mut no_children);
        let arranged = arrange(&tracks, &measured, 60.0, None);
        assert_eq!(arranged.offset(0), 0.0);
        assert_eq!(arranged.offset(1), 10.0);
        assert_eq!(arranged.offset(2), 30.0);
        assert_eq!(arranged.span_length(CellSpan { index: 1, span: 2 }), 50.0);
    }

    #[test]
    fn empty_track_list_produces_empty_results() {
        let result = measure(&[], &[], 100.0, &mut no_children);
        assert!(result.lengths.is_empty());
        assert_eq!(result.desired_length, 0.0);
        let arranged = arrange(&[], &result, 100.0, None);
        assert!(arranged.lengths.is_empty());
    }

    proptest! {
        #[test]
        fn clamp_invariant_holds_for_star_tracks(
            specs in prop::collection::vec((0.0f64..8.0, 0.0f64..40.0, 0.0f64..80.0), 1..6),
            available in 0.0f64..1500.0,
        ) {
            let tracks: Vec<TrackDefinition> = specs
                .iter()
                .map(|&(weight, min, extra)| {
                    star(weight)
                        .with_max_length(min + extra)
                        .unwrap()
                        .with_min_length(min)
                        .unwrap()
                })
                .collect();
            let measured = measure(&tracks, &[], available, &mut no_children);
            for (track, &len) in tracks.iter().zip(&measured.lengths) {
                prop_assert!(len >= track.min_length() - 1e-6);
                prop_assert!(len <= track.max_length() + 1e-6);
            }
        }

        #[test]
        fn arrange_conserves_final_length(
            specs in prop::collection::vec((0.0f64..8.0, 0.0f64..40.0), 1..6),
            final_length in 0.0f64..1000.0,
        ) {
            let tracks: Vec<TrackDefinition> = specs
                .iter()
                .map(|&(weight, min)| star(weight).with_min_length(min).unwrap())
                .collect();
            let measured = measure(&tracks, &[], final_length, &mut no_children);
            let arranged = arrange(&tracks, &measured, final_length, None);
            let total: f64 = arranged.lengths.iter().sum();
            prop_assert!(total <= final_length + 1e-6);
        }
    }
}
