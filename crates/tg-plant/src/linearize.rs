//! Linear model extraction around the operating point.

use nalgebra::{Matrix2, Vector2};

use crate::params::PlantParams;
use tg_core::Real;

/// State-space matrices of the plant linearized at the operating point.
///
/// States are (δi_L, δv_C). Input column 0 is the duty-cycle actuation
/// channel; column 1 couples the constant-power-load disturbance.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    pub a: Matrix2<Real>,
    pub b: Matrix2<Real>,
}

impl LinearModel {
    /// Linearize the buck converter dynamics at the operating point.
    pub fn from_params(params: &PlantParams) -> Self {
        let circuit = &params.circuit;
        let op = &params.op;

        let a11 = -(circuit.r_l / circuit.l);
        let a12 = -(1.0 / circuit.l);
        let a21 = 1.0 / circuit.c;
        let a22 = (1.0 / circuit.c) * (op.p_cpl / (op.v_c * op.v_c) - 1.0 / circuit.r_c);

        let b11 = circuit.v_in / circuit.l;
        let b12 = 0.0;
        let b21 = 0.0;
        let b22 = -1.0 / (circuit.c * op.v_c);

        Self {
            a: Matrix2::new(a11, a12, a21, a22),
            b: Matrix2::new(b11, b12, b21, b22),
        }
    }

    /// The duty-cycle actuation column of B.
    pub fn actuation_column(&self) -> Vector2<Real> {
        self.b.column(0).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{CircuitParams, PlantParams};

    fn test_params() -> PlantParams {
        let circuit = CircuitParams::from_si(48.0, 0.11, 100.0, 4.7e-3, 1.1e-3).unwrap();
        PlantParams::new(circuit, 50.0, 24.0).unwrap()
    }

    #[test]
    fn matrix_entries_match_closed_form() {
        let params = test_params();
        let model = LinearModel::from_params(&params);

        assert!((model.a[(0, 0)] - (-0.11 / 4.7e-3)).abs() < 1e-9);
        assert!((model.a[(0, 1)] - (-1.0 / 4.7e-3)).abs() < 1e-9);
        assert!((model.a[(1, 0)] - (1.0 / 1.1e-3)).abs() < 1e-9);
        let a22 = (1.0 / 1.1e-3) * (50.0 / (24.0 * 24.0) - 1.0 / 100.0);
        assert!((model.a[(1, 1)] - a22).abs() < 1e-9);

        assert!((model.b[(0, 0)] - 48.0 / 4.7e-3).abs() < 1e-9);
        assert_eq!(model.b[(0, 1)], 0.0);
        assert_eq!(model.b[(1, 0)], 0.0);
        assert!((model.b[(1, 1)] - (-1.0 / (1.1e-3 * 24.0))).abs() < 1e-9);
    }

    #[test]
    fn actuation_column_is_first_column() {
        let model = LinearModel::from_params(&test_params());
        let bu = model.actuation_column();
        assert_eq!(bu[0], model.b[(0, 0)]);
        assert_eq!(bu[1], model.b[(1, 0)]);
    }
}
