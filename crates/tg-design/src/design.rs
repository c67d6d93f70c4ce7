//! Trigger design: problem setup, two-phase solve, recovery, verification.

use nalgebra::{DMatrix, DVector, Dim, Matrix, Matrix2, RowVector2, base::storage::RawStorage};
use tracing::debug;

use crate::barrier::{AffineBarrier, BarrierProblem, InteriorPointConfig};
use crate::error::{DesignError, DesignResult};
use crate::lmi::{
    BOUND_LOWER, BOUND_UPPER, LMI_DIM, LmiStructure, NUM_VARS, PSI_OFFSET, X_OFFSET, XI_OFFSET,
    sym_basis, unpack_gain, unpack_sym,
};
use tg_core::Real;
use tg_plant::LinearModel;

/// Solved event-trigger parameters.
///
/// `xi` and `psi` are symmetric positive definite; `k` renders the
/// closed loop A + b·K Hurwitz. Consumed read-only for the lifetime of a
/// simulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerDesign {
    /// Static feedback gain (1×2).
    pub k: RowVector2<Real>,
    /// Transmission-error sensitivity matrix Ξ.
    pub xi: Matrix2<Real>,
    /// State sensitivity matrix Ψ.
    pub psi: Matrix2<Real>,
}

/// Options for the trigger-design solve.
#[derive(Debug, Clone, Default)]
pub struct DesignOptions {
    pub interior_point: InteriorPointConfig,
}

/// Solve the trigger-design problem for weight `rho` in [0, 1].
///
/// Minimizes trace(ρ·Ξ̃ + (1−ρ)·Ψ̃) subject to the 6×6 block LMI and the
/// conditioning bounds, then recovers K = K̃·X⁻¹, Ξ = X⁻¹·Ξ̃·X⁻¹, Ψ = Ψ̃⁻¹.
///
/// Returns [`DesignError::Infeasible`] when no strictly feasible point
/// exists; callers skip that configuration and continue.
pub fn solve_trigger_design(model: &LinearModel, rho: Real) -> DesignResult<TriggerDesign> {
    solve_trigger_design_with(model, rho, &DesignOptions::default())
}

/// [`solve_trigger_design`] with explicit solver options.
pub fn solve_trigger_design_with(
    model: &LinearModel,
    rho: Real,
    options: &DesignOptions,
) -> DesignResult<TriggerDesign> {
    if !(0.0..=1.0).contains(&rho) {
        return Err(DesignError::InvalidArg {
            what: "rho must lie in [0, 1]",
        });
    }

    let structure = LmiStructure::new(&model.a, &model.actuation_column());
    let config = &options.interior_point;

    let v_feasible = phase_one(&structure, config)?;
    let v_optimal = phase_two(&structure, rho, v_feasible, config)?;

    recover(&structure, &v_optimal)
}

fn to_dynamic(m: &Matrix2<Real>) -> DMatrix<Real> {
    DMatrix::from_fn(2, 2, |i, j| m[(i, j)])
}

/// Box barriers shared by both phases: X ≻ 0 and 1e-9·I ⪯ Ξ̃, Ψ̃ ⪯ 1e9·I.
///
/// `n` is the full variable count (11, plus one slack in Phase I).
fn variable_barriers(n: usize) -> Vec<AffineBarrier> {
    let zero_coeffs = || vec![DMatrix::<Real>::zeros(2, 2); n];

    let mut x_coeffs = zero_coeffs();
    for i in 0..3 {
        x_coeffs[X_OFFSET + i] = to_dynamic(&sym_basis(i));
    }
    let x_pd = AffineBarrier::new(DMatrix::zeros(2, 2), x_coeffs);

    let bounded = |offset: usize| {
        let mut lower_coeffs = zero_coeffs();
        let mut upper_coeffs = zero_coeffs();
        for i in 0..3 {
            lower_coeffs[offset + i] = to_dynamic(&sym_basis(i));
            upper_coeffs[offset + i] = to_dynamic(&(-sym_basis(i)));
        }
        let lower = AffineBarrier::new(
            DMatrix::identity(2, 2) * (-BOUND_LOWER),
            lower_coeffs,
        );
        let upper = AffineBarrier::new(DMatrix::identity(2, 2) * BOUND_UPPER, upper_coeffs);
        [lower, upper]
    };

    let mut barriers = vec![x_pd];
    barriers.extend(bounded(XI_OFFSET));
    barriers.extend(bounded(PSI_OFFSET));
    barriers
}

/// Phase I: minimize a slack s with M(v) ⪯ s·I until s is strictly
/// negative, proving strict feasibility of the LMI.
fn phase_one(structure: &LmiStructure, config: &InteriorPointConfig) -> DesignResult<DVector<Real>> {
    let n = NUM_VARS + 1;
    let slack = NUM_VARS;

    // s·I − M(v) ≻ 0
    let mut s_coeffs: Vec<DMatrix<Real>> = structure.basis().iter().map(|g| g * -1.0).collect();
    s_coeffs.push(DMatrix::identity(LMI_DIM, LMI_DIM));
    let slack_barrier = AffineBarrier::new(DMatrix::zeros(LMI_DIM, LMI_DIM), s_coeffs);

    let mut barriers = vec![slack_barrier];
    barriers.extend(variable_barriers(n));

    let mut objective = DVector::zeros(n);
    objective[slack] = 1.0;

    let problem = BarrierProblem {
        objective,
        barriers,
    };

    // Start at X = Ξ̃ = Ψ̃ = I, K̃ = 0, with the slack lifted above λ_max(M).
    let mut v = DVector::zeros(n);
    v[X_OFFSET] = 1.0;
    v[X_OFFSET + 2] = 1.0;
    v[XI_OFFSET] = 1.0;
    v[XI_OFFSET + 2] = 1.0;
    v[PSI_OFFSET] = 1.0;
    v[PSI_OFFSET + 2] = 1.0;

    let m0 = structure.assemble(&v.rows(0, NUM_VARS).into_owned());
    let lambda_max = m0
        .symmetric_eigen()
        .eigenvalues
        .iter()
        .fold(Real::NEG_INFINITY, |acc, &e| acc.max(e));
    let s0 = lambda_max + 1.0;
    v[slack] = s0;

    if !problem.is_interior(&v) {
        return Err(DesignError::Numeric {
            what: "Phase I start is not strictly feasible".to_string(),
        });
    }

    let margin = 1e-6 * (1.0 + s0.abs());
    let total_dim = problem.total_dim() as Real;
    let mut t = config.t_init;
    loop {
        v = problem.center(t, v, config)?;
        if v[slack] < -margin {
            debug!(slack = v[slack], "Phase I found a strictly feasible point");
            return Ok(v.rows(0, NUM_VARS).into_owned());
        }
        if total_dim / t < config.gap_tol {
            return Err(DesignError::Infeasible { slack: v[slack] });
        }
        t *= config.mu;
    }
}

/// Phase II: minimize trace(ρ·Ξ̃ + (1−ρ)·Ψ̃) with M(v) ⪯ 0 from a strictly
/// feasible start.
fn phase_two(
    structure: &LmiStructure,
    rho: Real,
    v0: DVector<Real>,
    config: &InteriorPointConfig,
) -> DesignResult<DVector<Real>> {
    // −M(v) ≻ 0
    let m_coeffs: Vec<DMatrix<Real>> = structure.basis().iter().map(|g| g * -1.0).collect();
    let lmi_barrier = AffineBarrier::new(DMatrix::zeros(LMI_DIM, LMI_DIM), m_coeffs);

    let mut barriers = vec![lmi_barrier];
    barriers.extend(variable_barriers(NUM_VARS));

    let mut objective = DVector::zeros(NUM_VARS);
    objective[XI_OFFSET] = rho;
    objective[XI_OFFSET + 2] = rho;
    objective[PSI_OFFSET] = 1.0 - rho;
    objective[PSI_OFFSET + 2] = 1.0 - rho;

    let problem = BarrierProblem {
        objective,
        barriers,
    };

    problem.minimize(v0, config)
}

/// Recover (K, Ξ, Ψ) from the optimizer and verify the certificate.
fn recover(structure: &LmiStructure, v: &DVector<Real>) -> DesignResult<TriggerDesign> {
    let x = unpack_sym(v, X_OFFSET);
    let xi_tilde = unpack_sym(v, XI_OFFSET);
    let psi_tilde = unpack_sym(v, PSI_OFFSET);
    let k_tilde = unpack_gain(v);

    let x_inv = x.try_inverse().ok_or_else(|| DesignError::Numeric {
        what: "X is numerically singular".to_string(),
    })?;
    let psi = psi_tilde.try_inverse().ok_or_else(|| DesignError::Numeric {
        what: "Ψ̃ is numerically singular".to_string(),
    })?;

    let xi = x_inv * xi_tilde * x_inv;
    let k = k_tilde * x_inv;

    verify_certificate(structure, v, &xi, &psi, &k)?;

    debug!("{}", format_matrix("K", &k));
    debug!("{}", format_matrix("Ξ", &xi));
    debug!("{}", format_matrix("Ψ", &psi));

    Ok(TriggerDesign { k, xi, psi })
}

fn min_symmetric_eigenvalue(m: &Matrix2<Real>) -> Real {
    let sym = (m + m.transpose()) * 0.5;
    sym.symmetric_eigen()
        .eigenvalues
        .iter()
        .fold(Real::INFINITY, |acc, &e| acc.min(e))
}

/// Reject solutions whose certificate does not hold numerically: the LMI
/// must be negative semidefinite and the recovered Ξ, Ψ positive definite.
fn verify_certificate(
    structure: &LmiStructure,
    v: &DVector<Real>,
    xi: &Matrix2<Real>,
    psi: &Matrix2<Real>,
    k: &RowVector2<Real>,
) -> DesignResult<()> {
    if !(k[0].is_finite() && k[1].is_finite()) {
        return Err(DesignError::Numeric {
            what: "recovered gain is not finite".to_string(),
        });
    }

    let m = structure.assemble(v);
    let scale = m.iter().fold(0.0_f64, |acc, &e| acc.max(e.abs()));
    let lambda_max = m
        .symmetric_eigen()
        .eigenvalues
        .iter()
        .fold(Real::NEG_INFINITY, |acc, &e| acc.max(e));
    if lambda_max > 1e-6 * (1.0 + scale) {
        return Err(DesignError::ConvergenceFailed {
            what: format!("LMI certificate violated (λ_max = {lambda_max:.3e})"),
        });
    }

    if min_symmetric_eigenvalue(xi) <= 0.0 {
        return Err(DesignError::ConvergenceFailed {
            what: "recovered Ξ is not positive definite".to_string(),
        });
    }
    if min_symmetric_eigenvalue(psi) <= 0.0 {
        return Err(DesignError::ConvergenceFailed {
            what: "recovered Ψ is not positive definite".to_string(),
        });
    }

    Ok(())
}

/// Format a matrix with aligned scientific-notation entries for logging.
pub fn format_matrix<R, C, S>(name: &str, m: &Matrix<Real, R, C, S>) -> String
where
    R: Dim,
    C: Dim,
    S: RawStorage<Real, R, C>,
{
    let formatted: Vec<Vec<String>> = (0..m.nrows())
        .map(|i| (0..m.ncols()).map(|j| format!("{:.3e}", m[(i, j)])).collect())
        .collect();
    let width = formatted
        .iter()
        .flatten()
        .map(String::len)
        .max()
        .unwrap_or(0);

    let mut out = format!("{name} =");
    for row in &formatted {
        out.push_str("\n    [ ");
        let cells: Vec<String> = row.iter().map(|c| format!("{c:>width$}")).collect();
        out.push_str(&cells.join("  "));
        out.push_str(" ]");
    }
    out
}
