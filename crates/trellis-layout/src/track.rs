//! Track definitions and the observable track list.
//!
//! A track is one row or column slot. Its size policy is a [`TrackLength`]
//! plus a min/max clamp; the resolved size from the most recent arrange pass
//! is readable as `actual_length`. Tracks live in a [`TrackList`], an ordered
//! sequence whose every mutation bumps a revision counter - the owning grid
//! compares revisions to know when cached measurements are stale.

use crate::error::LayoutError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Size policy for a single track.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TrackLength {
    /// An exact length in logical units.
    Fixed(f64),
    /// Sized to the content of the children placed in the track.
    Auto,
    /// A weighted share of the space left after fixed and auto tracks.
    Star(f64),
}

impl TrackLength {
    /// A star track with weight 1.
    pub const STAR: Self = Self::Star(1.0);

    fn validate(self) -> Result<(), LayoutError> {
        match self {
            Self::Fixed(value) if !value.is_finite() || value < 0.0 => {
                Err(LayoutError::InvalidLength { value })
            }
            Self::Star(value) if !value.is_finite() || value < 0.0 => {
                Err(LayoutError::InvalidWeight { value })
            }
            _ => Ok(()),
        }
    }

    /// Whether this is a star (proportional) track.
    #[must_use]
    pub const fn is_star(&self) -> bool {
        matches!(self, Self::Star(_))
    }

    /// Whether this is an auto (content-sized) track.
    #[must_use]
    pub const fn is_auto(&self) -> bool {
        matches!(self, Self::Auto)
    }
}

/// One row or column definition: length policy, clamp, and resolved size.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrackDefinition {
    length: TrackLength,
    min_length: f64,
    max_length: f64,
    actual_length: f64,
}

impl TrackDefinition {
    /// Create a definition with the given length policy and an open clamp.
    pub fn new(length: TrackLength) -> Result<Self, LayoutError> {
        length.validate()?;
        Ok(Self {
            length,
            min_length: 0.0,
            max_length: f64::INFINITY,
            actual_length: 0.0,
        })
    }

    /// Fixed-length track.
    pub fn fixed(value: f64) -> Result<Self, LayoutError> {
        Self::new(TrackLength::Fixed(value))
    }

    /// Content-sized track.
    pub fn auto() -> Self {
        Self {
            length: TrackLength::Auto,
            min_length: 0.0,
            max_length: f64::INFINITY,
            actual_length: 0.0,
        }
    }

    /// Proportional track with the given weight.
    pub fn star(weight: f64) -> Result<Self, LayoutError> {
        Self::new(TrackLength::Star(weight))
    }

    /// Set the minimum length, keeping `min <= max`.
    pub fn with_min_length(mut self, min: f64) -> Result<Self, LayoutError> {
        self.set_min_length(min)?;
        Ok(self)
    }

    /// Set the maximum length, keeping `min <= max`.
    pub fn with_max_length(mut self, max: f64) -> Result<Self, LayoutError> {
        self.set_max_length(max)?;
        Ok(self)
    }

    /// Replace the length policy.
    pub fn set_length(&mut self, length: TrackLength) -> Result<(), LayoutError> {
        length.validate()?;
        self.length = length;
        Ok(())
    }

    /// Replace the minimum length.
    pub fn set_min_length(&mut self, min: f64) -> Result<(), LayoutError> {
        if !min.is_finite() || min < 0.0 || min > self.max_length {
            return Err(LayoutError::InvalidClamp {
                min,
                max: self.max_length,
            });
        }
        self.min_length = min;
        Ok(())
    }

    /// Replace the maximum length. `f64::INFINITY` means unbounded.
    pub fn set_max_length(&mut self, max: f64) -> Result<(), LayoutError> {
        if max.is_nan() || max < self.min_length {
            return Err(LayoutError::InvalidClamp {
                min: self.min_length,
                max,
            });
        }
        self.max_length = max;
        Ok(())
    }

    /// The length policy.
    #[must_use]
    pub const fn length(&self) -> TrackLength {
        self.length
    }

    /// Minimum resolved length.
    #[must_use]
    pub const fn min_length(&self) -> f64 {
        self.min_length
    }

    /// Maximum resolved length.
    #[must_use]
    pub const fn max_length(&self) -> f64 {
        self.max_length
    }

    /// Resolved length from the most recent arrange pass.
    #[must_use]
    pub const fn actual_length(&self) -> f64 {
        self.actual_length
    }

    /// Single weight-1 star track used for an axis with no definitions.
    pub(crate) const fn implicit_star() -> Self {
        Self {
            length: TrackLength::STAR,
            min_length: 0.0,
            max_length: f64::INFINITY,
            actual_length: 0.0,
        }
    }

    /// Clamp a candidate length into this track's bounds.
    #[inline]
    pub(crate) fn clamp(&self, value: f64) -> f64 {
        value.max(self.min_length).min(self.max_length)
    }

    pub(crate) fn set_actual_length(&mut self, value: f64) {
        self.actual_length = value;
    }
}

/// Ordered, index-addressable list of track definitions.
///
/// Structural changes and item edits go through this list so the revision
/// counter stays accurate. Writing `actual_length` after arrange deliberately
/// does not count as a change: it is an output, not configuration.
#[derive(Debug, Clone, Default)]
pub struct TrackList {
    tracks: Vec<TrackDefinition>,
    revision: u64,
}

impl TrackList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Whether the list has no tracks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Revision counter, bumped on every mutation.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Append a track.
    pub fn push(&mut self, track: TrackDefinition) {
        self.tracks.push(track);
        self.revision += 1;
    }

    /// Insert a track at `index`, shifting later tracks.
    ///
    /// # Panics
    /// Panics if `index > len`, like `Vec::insert`.
    pub fn insert(&mut self, index: usize, track: TrackDefinition) {
        self.tracks.insert(index, track);
        self.revision += 1;
    }

    /// Remove and return the track at `index`, or `None` if out of range.
    pub fn remove(&mut self, index: usize) -> Option<TrackDefinition> {
        if index >= self.tracks.len() {
            return None;
        }
        self.revision += 1;
        Some(self.tracks.remove(index))
    }

    /// Shared access to the track at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&TrackDefinition> {
        self.tracks.get(index)
    }

    /// Edit the track at `index` in place.
    ///
    /// Returns the closure's result, or `None` if out of range. Counts as a
    /// mutation regardless of what the closure does.
    pub fn update<R>(
        &mut self,
        index: usize,
        edit: impl FnOnce(&mut TrackDefinition) -> R,
    ) -> Option<R> {
        let track = self.tracks.get_mut(index)?;
        self.revision += 1;
        Some(edit(track))
    }

    /// Iterate over the tracks in order.
    pub fn iter(&self) -> std::slice::Iter<'_, TrackDefinition> {
        self.tracks.iter()
    }

    pub(crate) fn tracks(&self) -> &[TrackDefinition] {
        &self.tracks
    }

    pub(crate) fn set_actual_length(&mut self, index: usize, value: f64) {
        if let Some(track) = self.tracks.get_mut(index) {
            track.set_actual_length(value);
        }
    }
}

impl FromIterator<TrackDefinition> for TrackList {
    fn from_iter<I: IntoIterator<Item = TrackDefinition>>(iter: I) -> Self {
        let tracks: Vec<_> = iter.into_iter().collect();
        let revision = tracks.len() as u64;
        Self { tracks, revision }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_fixed_length_rejected() {
        assert_eq!(
            TrackDefinition::fixed(-1.0),
            Err(LayoutError::InvalidLength { value: -1.0 })
        );
    }

    #[test]
    fn negative_star_weight_rejected() {
        assert_eq!(
            TrackDefinition::star(-0.5),
            Err(LayoutError::InvalidWeight { value: -0.5 })
        );
        assert!(TrackDefinition::star(0.0).is_ok());
    }

    #[test]
    fn non_finite_lengths_rejected() {
        assert!(TrackDefinition::fixed(f64::NAN).is_err());
        assert!(TrackDefinition::star(f64::INFINITY).is_err());
    }

    #[test]
    fn clamp_pair_must_be_ordered() {
        let track = TrackDefinition::auto().with_min_length(10.0).unwrap();
        assert_eq!(
            track.with_max_length(5.0),
            Err(LayoutError::InvalidClamp { min: 10.0, max: 5.0 })
        );
    }

    #[test]
    fn clamp_applies_both_bounds() {
        let track = TrackDefinition::auto()
            .with_min_length(10.0)
            .unwrap()
            .with_max_length(20.0)
            .unwrap();
        assert_eq!(track.clamp(5.0), 10.0);
        assert_eq!(track.clamp(15.0), 15.0);
        assert_eq!(track.clamp(50.0), 20.0);
    }

    #[test]
    fn failed_edit_leaves_track_usable() {
        let mut track = TrackDefinition::fixed(10.0).unwrap();
        assert!(track.set_min_length(-1.0).is_err());
        assert_eq!(track.min_length(), 0.0);
        assert!(track.set_min_length(2.0).is_ok());
    }

    #[test]
    fn list_mutations_bump_revision() {
        let mut list = TrackList::new();
        let r0 = list.revision();
        list.push(TrackDefinition::auto());
        assert!(list.revision() > r0);

        let r1 = list.revision();
        list.update(0, |t| t.set_min_length(5.0)).unwrap().unwrap();
        assert!(list.revision() > r1);

        let r2 = list.revision();
        list.remove(0).unwrap();
        assert!(list.revision() > r2);
    }

    #[test]
    fn actual_length_write_does_not_bump_revision() {
        let mut list: TrackList = [TrackDefinition::auto()].into_iter().collect();
        let r = list.revision();
        list.set_actual_length(0, 42.0);
        assert_eq!(list.revision(), r);
        assert_eq!(list.get(0).unwrap().actual_length(), 42.0);
    }

    #[test]
    fn remove_out_of_range_is_none() {
        let mut list = TrackList::new();
        assert!(list.remove(0).is_none());
    }
}
