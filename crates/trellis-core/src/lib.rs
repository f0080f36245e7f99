#![forbid(unsafe_code)]

//! Core primitives for the Trellis layout system.
//!
//! This crate provides the pieces the layout solver is built on but that are
//! not themselves layout policy:
//!
//! - [`geometry`] - points, sizes, and rectangles in logical (`f64`) units
//! - [`element`] - the measure/arrange capability implemented by layoutable
//!   children
//! - [`tree`] - an arena-backed visual hierarchy used for ancestor walks
//!   (scope resolution) without coupling to any rendering layer

pub mod element;
pub mod geometry;
pub mod tree;

pub use element::Element;
pub use geometry::{Axis, Point, Rect, Size};
pub use tree::{NodeId, VisualTree};

#[cfg(any(test, feature = "test-helpers"))]
pub use element::{ProbeElement, ProbeState};
