//! Log-det barrier machinery for small affine matrix inequalities.
//!
//! Each barrier guards one affine matrix value C + Σ_i v_i·F_i that must
//! stay positive definite. Because the value is affine in v, the barrier
//! gradient and Hessian are exact:
//!
//! ```text
//! φ(v)      = -log det V(v)
//! ∂φ/∂v_i   = -tr(V⁻¹·F_i)
//! ∂²φ/∂v_i∂v_j = tr(V⁻¹·F_i·V⁻¹·F_j)
//! ```
//!
//! The centering step is a damped Newton iteration with backtracking line
//! search that keeps every barrier matrix strictly positive definite,
//! following the same damped-Newton-with-line-search shape as the steady
//! network solver.

use nalgebra::{DMatrix, DVector};

use crate::error::{DesignError, DesignResult};
use tg_core::Real;

/// One positive-definiteness barrier over an affine matrix value.
#[derive(Debug, Clone)]
pub struct AffineBarrier {
    constant: DMatrix<Real>,
    coeffs: Vec<DMatrix<Real>>,
}

impl AffineBarrier {
    /// Create a barrier for V(v) = constant + Σ_i v_i·coeffs[i] ≻ 0.
    ///
    /// `coeffs` must have one (possibly zero) matrix per unknown.
    pub fn new(constant: DMatrix<Real>, coeffs: Vec<DMatrix<Real>>) -> Self {
        Self { constant, coeffs }
    }

    /// Barrier dimension (side length of the guarded matrix).
    pub fn dim(&self) -> usize {
        self.constant.nrows()
    }

    fn value(&self, v: &DVector<Real>) -> DMatrix<Real> {
        let mut m = self.constant.clone();
        for (x, f) in v.iter().zip(&self.coeffs) {
            m += f * *x;
        }
        m
    }

    /// -log det V(v), or None when V(v) is not positive definite.
    fn log_barrier(&self, v: &DVector<Real>) -> Option<Real> {
        let chol = self.value(v).cholesky()?;
        let l = chol.l();
        let mut log_det = 0.0;
        for i in 0..l.nrows() {
            let d = l[(i, i)];
            if d <= 0.0 || !d.is_finite() {
                return None;
            }
            log_det += 2.0 * d.ln();
        }
        Some(-log_det)
    }

    /// Accumulate gradient and Hessian contributions at `v`.
    ///
    /// Returns false when the barrier matrix is not positive definite.
    fn accumulate(
        &self,
        v: &DVector<Real>,
        grad: &mut DVector<Real>,
        hess: &mut DMatrix<Real>,
    ) -> bool {
        let Some(chol) = self.value(v).cholesky() else {
            return false;
        };
        let inv = chol.inverse();

        // Q_i = V⁻¹·F_i; grad_i = -tr(Q_i); hess_ij = tr(Q_i·Q_j).
        let q: Vec<DMatrix<Real>> = self.coeffs.iter().map(|f| &inv * f).collect();
        for (i, qi) in q.iter().enumerate() {
            grad[i] -= qi.trace();
            for (j, qj) in q.iter().enumerate().skip(i) {
                let mut t = 0.0;
                for a in 0..qi.nrows() {
                    for b in 0..qi.ncols() {
                        t += qi[(a, b)] * qj[(b, a)];
                    }
                }
                hess[(i, j)] += t;
                if j != i {
                    hess[(j, i)] += t;
                }
            }
        }
        true
    }
}

/// Interior-point configuration.
#[derive(Debug, Clone)]
pub struct InteriorPointConfig {
    /// Initial barrier weight
    pub t_init: Real,
    /// Geometric growth factor of the barrier weight
    pub mu: Real,
    /// Duality-gap target: iterate until (total barrier dim)/t < gap_tol
    pub gap_tol: Real,
    /// Newton decrement tolerance (λ²/2) for each centering step
    pub newton_tol: Real,
    /// Maximum Newton iterations per centering step
    pub max_newton_iters: usize,
    /// Line search backtracking factor
    pub line_search_beta: Real,
    /// Maximum line search iterations
    pub max_line_search_iters: usize,
}

impl Default for InteriorPointConfig {
    fn default() -> Self {
        Self {
            t_init: 1.0,
            mu: 10.0,
            gap_tol: 1e-6,
            newton_tol: 1e-9,
            max_newton_iters: 60,
            line_search_beta: 0.5,
            max_line_search_iters: 60,
        }
    }
}

/// Minimize a linear objective cᵗv over the intersection of affine
/// positive-definiteness constraints.
#[derive(Debug, Clone)]
pub struct BarrierProblem {
    pub objective: DVector<Real>,
    pub barriers: Vec<AffineBarrier>,
}

impl BarrierProblem {
    /// Total barrier dimension, which bounds the duality gap as dim/t.
    pub fn total_dim(&self) -> usize {
        self.barriers.iter().map(AffineBarrier::dim).sum()
    }

    /// True when every barrier matrix is strictly positive definite at `v`.
    pub fn is_interior(&self, v: &DVector<Real>) -> bool {
        self.barriers.iter().all(|b| b.log_barrier(v).is_some())
    }

    /// t·cᵗv + Σ barriers, or None outside the interior.
    fn merit(&self, t: Real, v: &DVector<Real>) -> Option<Real> {
        let mut f = t * self.objective.dot(v);
        for b in &self.barriers {
            f += b.log_barrier(v)?;
        }
        Some(f)
    }

    /// Center at barrier weight `t` starting from the interior point `v`.
    pub fn center(
        &self,
        t: Real,
        mut v: DVector<Real>,
        config: &InteriorPointConfig,
    ) -> DesignResult<DVector<Real>> {
        let n = v.len();

        for _ in 0..config.max_newton_iters {
            let mut grad = &self.objective * t;
            let mut hess = DMatrix::zeros(n, n);
            for b in &self.barriers {
                if !b.accumulate(&v, &mut grad, &mut hess) {
                    return Err(DesignError::Numeric {
                        what: "centering iterate left the feasible interior".to_string(),
                    });
                }
            }

            let step = solve_damped(&hess, &grad)?;
            let decrement = grad.dot(&step);
            // step solves H·d = -g, so gᵗd = -λ²; converged when λ²/2 small.
            if -decrement / 2.0 < config.newton_tol {
                break;
            }

            let f0 = self.merit(t, &v).ok_or_else(|| DesignError::Numeric {
                what: "merit function undefined at current iterate".to_string(),
            })?;

            let mut alpha = 1.0;
            let mut accepted = false;
            for _ in 0..config.max_line_search_iters {
                let candidate = &v + &step * alpha;
                if let Some(f) = self.merit(t, &candidate) {
                    if f <= f0 + 1e-4 * alpha * decrement {
                        v = candidate;
                        accepted = true;
                        break;
                    }
                }
                alpha *= config.line_search_beta;
            }
            if !accepted {
                // Stalled at numerical precision; keep the current center.
                break;
            }
        }

        Ok(v)
    }

    /// Follow the central path from `v0` until the gap target is met.
    pub fn minimize(
        &self,
        v0: DVector<Real>,
        config: &InteriorPointConfig,
    ) -> DesignResult<DVector<Real>> {
        if !self.is_interior(&v0) {
            return Err(DesignError::Numeric {
                what: "interior-point start is not strictly feasible".to_string(),
            });
        }

        let m = self.total_dim() as Real;
        let mut t = config.t_init;
        let mut v = v0;
        loop {
            v = self.center(t, v, config)?;
            if m / t < config.gap_tol {
                return Ok(v);
            }
            t *= config.mu;
        }
    }
}

/// Solve H·d = -g with Cholesky, adding diagonal damping on failure.
fn solve_damped(hess: &DMatrix<Real>, grad: &DVector<Real>) -> DesignResult<DVector<Real>> {
    let n = hess.nrows();
    let scale = hess.trace().abs().max(1.0) / n as Real;
    let mut damping = 0.0;

    for _ in 0..16 {
        let mut h = hess.clone();
        if damping > 0.0 {
            for i in 0..n {
                h[(i, i)] += damping;
            }
        }
        if let Some(chol) = h.cholesky() {
            return Ok(chol.solve(&(-grad)));
        }
        damping = if damping == 0.0 {
            scale * 1e-12
        } else {
            damping * 100.0
        };
    }

    Err(DesignError::Numeric {
        what: "Newton system is numerically singular".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimize v subject to v·I(1×1) ≻ 0 and (2 - v)·I ≻ 0, i.e. 0 < v < 2.
    fn scalar_box_problem() -> BarrierProblem {
        let lower = AffineBarrier::new(
            DMatrix::zeros(1, 1),
            vec![DMatrix::from_element(1, 1, 1.0)],
        );
        let upper = AffineBarrier::new(
            DMatrix::from_element(1, 1, 2.0),
            vec![DMatrix::from_element(1, 1, -1.0)],
        );
        BarrierProblem {
            objective: DVector::from_element(1, 1.0),
            barriers: vec![lower, upper],
        }
    }

    #[test]
    fn scalar_box_minimum_is_at_lower_bound() {
        let problem = scalar_box_problem();
        let config = InteriorPointConfig::default();
        let v = problem
            .minimize(DVector::from_element(1, 1.0), &config)
            .unwrap();
        // Gap bound: m/t < 1e-6, so the iterate sits within ~1e-6 of 0.
        assert!(v[0] > 0.0);
        assert!(v[0] < 1e-5, "v = {}", v[0]);
    }

    #[test]
    fn rejects_infeasible_start() {
        let problem = scalar_box_problem();
        let config = InteriorPointConfig::default();
        assert!(
            problem
                .minimize(DVector::from_element(1, 3.0), &config)
                .is_err()
        );
    }

    #[test]
    fn psd_constraint_2x2() {
        // Minimize x11 + x22 subject to X ⪰ I (shifted: X - I ≻ 0) with
        // X = [[x11, 0], [0, x22]]. Optimum approaches x11 = x22 = 1.
        let coeffs = vec![
            DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 0.0]),
            DMatrix::from_row_slice(2, 2, &[0.0, 0.0, 0.0, 1.0]),
        ];
        let barrier = AffineBarrier::new(-DMatrix::identity(2, 2), coeffs);
        let problem = BarrierProblem {
            objective: DVector::from_vec(vec![1.0, 1.0]),
            barriers: vec![barrier],
        };
        let config = InteriorPointConfig::default();
        let v = problem
            .minimize(DVector::from_vec(vec![5.0, 3.0]), &config)
            .unwrap();
        assert!((v[0] - 1.0).abs() < 1e-4, "x11 = {}", v[0]);
        assert!((v[1] - 1.0).abs() < 1e-4, "x22 = {}", v[1]);
    }
}
