//! Trigger-design solver.
//!
//! Derives the event-trigger parameters (feedback gain K and the two
//! positive-definite trigger matrices Ξ, Ψ) from the linearized plant by
//! solving a small semidefinite program: minimize a weighted trace objective
//! subject to a 6×6 linear matrix inequality.
//!
//! The solve is a hand-rolled primal log-det-barrier interior-point method
//! over the 11 scalar unknowns, with exact gradients and Hessians obtained
//! from the affine structure of the constraint matrix. A Phase-I slack
//! minimization finds a strictly feasible start; the recovered certificate
//! is verified before a design is returned.

pub mod barrier;
pub mod design;
pub mod error;
pub mod lmi;

pub use design::{
    DesignOptions, TriggerDesign, format_matrix, solve_trigger_design, solve_trigger_design_with,
};
pub use error::{DesignError, DesignResult};
