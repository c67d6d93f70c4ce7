//! Static state-feedback controller.

use nalgebra::{RowVector2, Vector2};

use crate::error::{ControlError, ControlResult};
use tg_core::Real;

/// Stateless state feedback: duty-cycle perturbation = K · x̂.
#[derive(Debug, Clone, PartialEq)]
pub struct StateFeedback {
    k: RowVector2<Real>,
}

impl StateFeedback {
    pub fn new(k: RowVector2<Real>) -> ControlResult<Self> {
        if k.iter().any(|e| !e.is_finite()) {
            return Err(ControlError::InvalidArg {
                what: "feedback gain must be finite",
            });
        }
        Ok(Self { k })
    }

    /// Control command for the held state estimate.
    pub fn command(&self, estimate: &Vector2<Real>) -> Real {
        (self.k * estimate)[0]
    }

    pub fn gain(&self) -> RowVector2<Real> {
        self.k
    }
}
