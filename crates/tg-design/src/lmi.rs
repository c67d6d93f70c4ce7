//! Affine structure of the trigger-design LMI.
//!
//! The constraint matrix is the symmetric 6×6 block matrix
//!
//! ```text
//! [ A·X+B·K̃+X·Aᵗ+K̃ᵗ·Bᵗ   B·K̃     X   ]
//! [ K̃ᵗ·Bᵗ                -Ξ̃       0   ]
//! [ X                     0       -Ψ̃  ]
//! ```
//!
//! which must be negative semidefinite. Every block is linear in the
//! unknowns, so M(v) = Σ_i v_i·G_i with constant symmetric basis matrices
//! G_i. The interior-point solve relies on this: gradients and Hessians of
//! the log-det barriers are exact trace formulas over the G_i.
//!
//! Sign conventions and block placement must match the layout above
//! exactly; a sign slip still yields a "feasible" but wrong design.

use nalgebra::{DMatrix, DVector, Matrix2, RowVector2, Vector2};

use tg_core::Real;

/// Number of scalar unknowns: X (3) + Ξ̃ (3) + Ψ̃ (3) + K̃ (2).
pub const NUM_VARS: usize = 11;

/// Side length of the block constraint matrix.
pub const LMI_DIM: usize = 6;

pub const X_OFFSET: usize = 0;
pub const XI_OFFSET: usize = 3;
pub const PSI_OFFSET: usize = 6;
pub const GAIN_OFFSET: usize = 9;

/// Conditioning bounds 1e-9·I ⪯ Ξ̃, Ψ̃ ⪯ 1e9·I keeping the solve well-posed.
pub const BOUND_LOWER: Real = 1e-9;
pub const BOUND_UPPER: Real = 1e9;

/// Symmetric 2×2 basis: E_0 = e11, E_1 = e12 + e21, E_2 = e22.
pub fn sym_basis(i: usize) -> Matrix2<Real> {
    match i {
        0 => Matrix2::new(1.0, 0.0, 0.0, 0.0),
        1 => Matrix2::new(0.0, 1.0, 1.0, 0.0),
        2 => Matrix2::new(0.0, 0.0, 0.0, 1.0),
        _ => unreachable!("symmetric 2x2 basis has three elements"),
    }
}

/// Unpack a symmetric 2×2 matrix from three packed scalars.
pub fn unpack_sym(v: &DVector<Real>, offset: usize) -> Matrix2<Real> {
    Matrix2::new(v[offset], v[offset + 1], v[offset + 1], v[offset + 2])
}

/// Unpack the 1×2 gain variable.
pub fn unpack_gain(v: &DVector<Real>) -> RowVector2<Real> {
    RowVector2::new(v[GAIN_OFFSET], v[GAIN_OFFSET + 1])
}

fn add_block(m: &mut DMatrix<Real>, row: usize, col: usize, block: &Matrix2<Real>) {
    for i in 0..2 {
        for j in 0..2 {
            m[(row + i, col + j)] += block[(i, j)];
        }
    }
}

/// The constant basis matrices G_i = ∂M/∂v_i for a given plant (A, b).
#[derive(Debug, Clone)]
pub struct LmiStructure {
    basis: Vec<DMatrix<Real>>,
}

impl LmiStructure {
    /// Build the basis for state matrix `a` and actuation column `b`.
    pub fn new(a: &Matrix2<Real>, b: &Vector2<Real>) -> Self {
        let mut basis = Vec::with_capacity(NUM_VARS);

        // X variables: block (0,0) gets A·E + E·Aᵗ, blocks (0,2)/(2,0) get E.
        for i in 0..3 {
            let e = sym_basis(i);
            let mut g = DMatrix::zeros(LMI_DIM, LMI_DIM);
            add_block(&mut g, 0, 0, &(a * e + e * a.transpose()));
            add_block(&mut g, 0, 4, &e);
            add_block(&mut g, 4, 0, &e);
            basis.push(g);
        }

        // Ξ̃ variables: block (1,1) gets -E.
        for i in 0..3 {
            let e = sym_basis(i);
            let mut g = DMatrix::zeros(LMI_DIM, LMI_DIM);
            add_block(&mut g, 2, 2, &(-e));
            basis.push(g);
        }

        // Ψ̃ variables: block (2,2) gets -E.
        for i in 0..3 {
            let e = sym_basis(i);
            let mut g = DMatrix::zeros(LMI_DIM, LMI_DIM);
            add_block(&mut g, 4, 4, &(-e));
            basis.push(g);
        }

        // K̃ components: B·K̃ has column j equal to b, so ∂(B·K̃)/∂K̃_j = b·e_jᵗ.
        for j in 0..2 {
            let mut bk = Matrix2::zeros();
            bk[(0, j)] = b[0];
            bk[(1, j)] = b[1];
            let mut g = DMatrix::zeros(LMI_DIM, LMI_DIM);
            add_block(&mut g, 0, 0, &(bk + bk.transpose()));
            add_block(&mut g, 0, 2, &bk);
            add_block(&mut g, 2, 0, &bk.transpose());
            basis.push(g);
        }

        debug_assert_eq!(basis.len(), NUM_VARS);
        Self { basis }
    }

    /// Assemble M(v) = Σ_i v_i·G_i.
    pub fn assemble(&self, v: &DVector<Real>) -> DMatrix<Real> {
        let mut m = DMatrix::zeros(LMI_DIM, LMI_DIM);
        for (value, g) in v.iter().zip(&self.basis) {
            m += g * *value;
        }
        m
    }

    pub fn basis(&self) -> &[DMatrix<Real>] {
        &self.basis
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_lmi(
        a: &Matrix2<Real>,
        b: &Vector2<Real>,
        x: &Matrix2<Real>,
        xi: &Matrix2<Real>,
        psi: &Matrix2<Real>,
        k: &RowVector2<Real>,
    ) -> DMatrix<Real> {
        let bk = b * k;
        let m11 = a * x + bk + x * a.transpose() + bk.transpose();
        let mut m = DMatrix::zeros(LMI_DIM, LMI_DIM);
        add_block(&mut m, 0, 0, &m11);
        add_block(&mut m, 0, 2, &bk);
        add_block(&mut m, 2, 0, &bk.transpose());
        add_block(&mut m, 0, 4, x);
        add_block(&mut m, 4, 0, x);
        add_block(&mut m, 2, 2, &(-*xi));
        add_block(&mut m, 4, 4, &(-*psi));
        m
    }

    #[test]
    fn assemble_matches_direct_block_construction() {
        let a = Matrix2::new(-2.0, -1.5, 3.0, 0.5);
        let b = Vector2::new(4.0, -0.25);
        let structure = LmiStructure::new(&a, &b);

        let x = Matrix2::new(2.0, 0.3, 0.3, 1.5);
        let xi = Matrix2::new(1.0, -0.2, -0.2, 0.8);
        let psi = Matrix2::new(0.5, 0.1, 0.1, 0.9);
        let k = RowVector2::new(-1.0, 0.7);

        let mut v = DVector::zeros(NUM_VARS);
        v[X_OFFSET] = x[(0, 0)];
        v[X_OFFSET + 1] = x[(0, 1)];
        v[X_OFFSET + 2] = x[(1, 1)];
        v[XI_OFFSET] = xi[(0, 0)];
        v[XI_OFFSET + 1] = xi[(0, 1)];
        v[XI_OFFSET + 2] = xi[(1, 1)];
        v[PSI_OFFSET] = psi[(0, 0)];
        v[PSI_OFFSET + 1] = psi[(0, 1)];
        v[PSI_OFFSET + 2] = psi[(1, 1)];
        v[GAIN_OFFSET] = k[0];
        v[GAIN_OFFSET + 1] = k[1];

        let assembled = structure.assemble(&v);
        let reference = reference_lmi(&a, &b, &x, &xi, &psi, &k);

        for i in 0..LMI_DIM {
            for j in 0..LMI_DIM {
                assert!(
                    (assembled[(i, j)] - reference[(i, j)]).abs() < 1e-12,
                    "mismatch at ({i},{j}): {} vs {}",
                    assembled[(i, j)],
                    reference[(i, j)]
                );
            }
        }
    }

    #[test]
    fn basis_matrices_are_symmetric() {
        let a = Matrix2::new(-2.0, -1.5, 3.0, 0.5);
        let b = Vector2::new(4.0, -0.25);
        let structure = LmiStructure::new(&a, &b);
        for g in structure.basis() {
            for i in 0..LMI_DIM {
                for j in 0..LMI_DIM {
                    assert!((g[(i, j)] - g[(j, i)]).abs() < 1e-14);
                }
            }
        }
    }

    #[test]
    fn unpack_round_trips() {
        let mut v = DVector::zeros(NUM_VARS);
        v[XI_OFFSET] = 1.0;
        v[XI_OFFSET + 1] = 2.0;
        v[XI_OFFSET + 2] = 3.0;
        let m = unpack_sym(&v, XI_OFFSET);
        assert_eq!(m, Matrix2::new(1.0, 2.0, 2.0, 3.0));

        v[GAIN_OFFSET] = -4.0;
        v[GAIN_OFFSET + 1] = 5.0;
        assert_eq!(unpack_gain(&v), RowVector2::new(-4.0, 5.0));
    }
}
