//! The element layout capability.
//!
//! A layout container does not know what its children are, only that they can
//! negotiate size in two passes: `measure` asks "how big do you want to be
//! under this constraint", `arrange` tells the child the rectangle it was
//! given. Both are synchronous and must be idempotent when repeated with
//! identical arguments.

use crate::geometry::{Rect, Size};

/// A child that participates in measure/arrange layout.
pub trait Element {
    /// Measure the element under the given constraint.
    ///
    /// The constraint may be infinite along either axis, meaning
    /// "unconstrained". The returned desired size must be finite and
    /// non-negative, and repeated calls with the same constraint must return
    /// the same size.
    fn measure(&mut self, constraint: Size) -> Size;

    /// Place the element into its final rectangle.
    fn arrange(&mut self, rect: Rect);

    /// The desired size reported by the most recent `measure` call.
    fn desired_size(&self) -> Size;
}

#[cfg(any(test, feature = "test-helpers"))]
pub use probe::{ProbeElement, ProbeState};

#[cfg(any(test, feature = "test-helpers"))]
mod probe {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::Element;
    use crate::geometry::{Rect, Size};

    /// Observed layout traffic for a [`ProbeElement`].
    #[derive(Debug, Clone, Default)]
    pub struct ProbeState {
        /// Number of `measure` calls so far.
        pub measure_count: usize,
        /// Constraint passed to the most recent `measure`.
        pub last_constraint: Option<Size>,
        /// Rectangle passed to the most recent `arrange`.
        pub last_rect: Option<Rect>,
        /// Desired size from the most recent `measure`.
        pub desired: Size,
    }

    /// Test element with a fixed natural size that records every layout call.
    ///
    /// Desired size is the natural size capped by the constraint, so an
    /// unconstrained measure reports the natural size unchanged.
    #[derive(Debug)]
    pub struct ProbeElement {
        natural: Size,
        state: Rc<RefCell<ProbeState>>,
    }

    impl ProbeElement {
        /// Create a probe with the given natural size and a handle to its
        /// recorded state.
        pub fn new(width: f64, height: f64) -> (Self, Rc<RefCell<ProbeState>>) {
            let state = Rc::new(RefCell::new(ProbeState::default()));
            (
                Self {
                    natural: Size::new(width, height),
                    state: state.clone(),
                },
                state,
            )
        }
    }

    impl Element for ProbeElement {
        fn measure(&mut self, constraint: Size) -> Size {
            let desired = self.natural.min(constraint);
            let mut state = self.state.borrow_mut();
            state.measure_count += 1;
            state.last_constraint = Some(constraint);
            state.desired = desired;
            desired
        }

        fn arrange(&mut self, rect: Rect) {
            self.state.borrow_mut().last_rect = Some(rect);
        }

        fn desired_size(&self) -> Size {
            self.state.borrow().desired
        }
    }
}
