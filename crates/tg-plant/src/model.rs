//! Plant variants behind one capability trait.
//!
//! The closed-loop composer only sees [`PlantModel`]; the three concrete
//! variants differ in coordinates:
//! - [`NonlinearBuck`]: absolute states (i_L, v_C), absolute inputs
//! - [`ShiftedBuck`]: perturbation states (δi_L, δv_C) around the operating
//!   point, exact nonlinear dynamics
//! - [`LinearizedBuck`]: perturbation states, linearized dynamics

use nalgebra::Vector2;

use crate::error::{PlantError, PlantResult};
use crate::linearize::LinearModel;
use crate::params::PlantParams;
use tg_core::Real;

/// Plant input pair: duty-cycle channel and constant-power-load channel.
///
/// Whether the values are absolute or perturbations depends on the plant
/// variant they are fed to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlantInput {
    pub duty: Real,
    pub p_cpl: Real,
}

/// Capability interface over the plant variants.
pub trait PlantModel {
    /// Number of continuous states (two for every buck variant).
    fn state_dim(&self) -> usize {
        2
    }

    /// Compute the state derivative at (t, x, u).
    fn derivative(
        &self,
        t: Real,
        x: &Vector2<Real>,
        u: &PlantInput,
        params: &PlantParams,
    ) -> PlantResult<Vector2<Real>>;

    /// Compute the measured output at (t, x, u). All buck variants expose
    /// the full state.
    fn output(&self, _t: Real, x: &Vector2<Real>, _u: &PlantInput, _params: &PlantParams) -> Vector2<Real> {
        *x
    }
}

fn ensure_state_finite(dx: Vector2<Real>) -> PlantResult<Vector2<Real>> {
    if dx[0].is_finite() && dx[1].is_finite() {
        Ok(dx)
    } else {
        Err(PlantError::NonPhysical {
            what: "plant derivative is not finite",
        })
    }
}

/// Nonlinear buck converter in absolute coordinates.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonlinearBuck;

impl PlantModel for NonlinearBuck {
    fn derivative(
        &self,
        _t: Real,
        x: &Vector2<Real>,
        u: &PlantInput,
        params: &PlantParams,
    ) -> PlantResult<Vector2<Real>> {
        let circuit = &params.circuit;
        let (i_l, v_c) = (x[0], x[1]);

        let di_l = (circuit.v_in / circuit.l) * u.duty - (circuit.r_l / circuit.l) * i_l
            - v_c / circuit.l;
        let dv_c =
            i_l / circuit.c - v_c / (circuit.c * circuit.r_c) - u.p_cpl / (circuit.c * v_c);

        ensure_state_finite(Vector2::new(di_l, dv_c))
    }
}

/// Exact nonlinear dynamics shifted to perturbation coordinates.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShiftedBuck;

impl PlantModel for ShiftedBuck {
    fn derivative(
        &self,
        _t: Real,
        x: &Vector2<Real>,
        u: &PlantInput,
        params: &PlantParams,
    ) -> PlantResult<Vector2<Real>> {
        let circuit = &params.circuit;
        let op = &params.op;
        let (di_l, dv_c) = (x[0], x[1]);

        let ddi_l = -(circuit.r_l / circuit.l) * di_l - dv_c / circuit.l
            + (circuit.v_in / circuit.l) * u.duty;
        let ddv_c = -dv_c / (circuit.c * circuit.r_c) + di_l / circuit.c
            + (op.p_cpl * dv_c - op.v_c * u.p_cpl) / (circuit.c * op.v_c * (op.v_c + dv_c));

        ensure_state_finite(Vector2::new(ddi_l, ddv_c))
    }
}

/// Linearized dynamics in perturbation coordinates.
#[derive(Debug, Clone)]
pub struct LinearizedBuck {
    model: LinearModel,
}

impl LinearizedBuck {
    pub fn new(params: &PlantParams) -> Self {
        Self {
            model: LinearModel::from_params(params),
        }
    }

    pub fn model(&self) -> &LinearModel {
        &self.model
    }
}

impl PlantModel for LinearizedBuck {
    fn derivative(
        &self,
        _t: Real,
        x: &Vector2<Real>,
        u: &PlantInput,
        _params: &PlantParams,
    ) -> PlantResult<Vector2<Real>> {
        let input = Vector2::new(u.duty, u.p_cpl);
        ensure_state_finite(self.model.a * x + self.model.b * input)
    }
}
