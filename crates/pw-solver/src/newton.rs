//! Newton solver with bound projection and backtracking.

use crate::jacobian::central_difference_jacobian;
use crate::pattern::{ConvergencePattern, ResidualHistory};
use crate::problem::ClosureProblem;
use nalgebra::{Const, DimMin, SVector};

/// Newton solver configuration.
#[derive(Clone, Copy, Debug)]
pub struct NewtonConfig {
    /// Maximum iterations (hard ceiling, zero allowed)
    pub max_iterations: usize,
    /// Line search backtracking factor
    pub line_search_beta: f64,
    /// Maximum line search iterations
    pub max_line_search_iters: usize,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            max_iterations: 25,
            line_search_beta: 0.5,
            max_line_search_iters: 8,
        }
    }
}

/// Newton iteration result.
#[derive(Clone, Copy, Debug)]
pub struct NewtonResult<const N: usize> {
    /// Final iterate (the best the solver reached, converged or not)
    pub x: SVector<f64, N>,
    /// Unscaled residual at `x`
    pub residual: SVector<f64, N>,
    /// Number of Newton steps taken
    pub iterations: usize,
    pub converged: bool,
    pub pattern: ConvergencePattern,
    pub history: ResidualHistory,
}

fn finite<const N: usize>(v: &SVector<f64, N>) -> bool {
    v.iter().all(|x| x.is_finite())
}

fn scaled<const N: usize>(r: &SVector<f64, N>, tol: &SVector<f64, N>) -> SVector<f64, N> {
    r.component_div(tol)
}

/// Newton solver with line search and box constraints.
///
/// Converged means every residual is within its tolerance. The loop never
/// runs more than `max_iterations` steps; with a zero budget the result is
/// always unconverged.
pub fn newton_solve<const N: usize, P: ClosureProblem<N>>(
    problem: &P,
    x0: SVector<f64, N>,
    config: &NewtonConfig,
) -> NewtonResult<N>
where
    Const<N>: DimMin<Const<N>, Output = Const<N>>,
{
    let tol = problem.tolerances();
    let mut history = ResidualHistory::default();
    let mut x = problem.project(&x0);
    let mut r = problem.residual(&x);

    let fail = |x: SVector<f64, N>,
                r: SVector<f64, N>,
                iterations: usize,
                pattern: ConvergencePattern,
                history: ResidualHistory| NewtonResult {
        x,
        residual: r,
        iterations,
        converged: false,
        pattern,
        history,
    };

    if !finite(&r) {
        return fail(x, r, 0, ConvergencePattern::EvaluationFailed, history);
    }
    let mut norm = scaled(&r, &tol).amax();
    history.push(norm);

    for iter in 0..config.max_iterations {
        if norm <= 1.0 {
            return NewtonResult {
                x,
                residual: r,
                iterations: iter,
                converged: true,
                pattern: history.classify(true, iter),
                history,
            };
        }

        let jac = central_difference_jacobian(problem, &x);
        if !jac.iter().all(|v| v.is_finite()) {
            return fail(x, r, iter, ConvergencePattern::EvaluationFailed, history);
        }

        // Solve J * dx = -r
        let Some(dx) = jac.lu().solve(&(-r)) else {
            return fail(x, r, iter, ConvergencePattern::Singular, history);
        };

        // Backtrack on the scaled 2-norm; the last trial is taken if none
        // improves so the iteration keeps moving toward the bounds.
        let merit = scaled(&r, &tol).norm();
        let mut alpha = 1.0;
        let mut x_new = problem.project(&(x + dx * alpha));
        let mut r_new = problem.residual(&x_new);
        for _ in 0..config.max_line_search_iters {
            if finite(&r_new) && scaled(&r_new, &tol).norm() < merit {
                break;
            }
            alpha *= config.line_search_beta;
            x_new = problem.project(&(x + dx * alpha));
            r_new = problem.residual(&x_new);
        }
        if !finite(&r_new) {
            return fail(x, r, iter + 1, ConvergencePattern::EvaluationFailed, history);
        }

        x = x_new;
        r = r_new;
        norm = scaled(&r, &tol).amax();
        history.push(norm);
    }

    if config.max_iterations > 0 && norm <= 1.0 {
        return NewtonResult {
            x,
            residual: r,
            iterations: config.max_iterations,
            converged: true,
            pattern: history.classify(true, config.max_iterations),
            history,
        };
    }

    let pattern = history.classify(false, config.max_iterations);
    fail(x, r, config.max_iterations, pattern, history)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Sqrt4;

    impl ClosureProblem<1> for Sqrt4 {
        fn residual(&self, x: &SVector<f64, 1>) -> SVector<f64, 1> {
            SVector::<f64, 1>::new(x[0] * x[0] - 4.0)
        }
        fn tolerances(&self) -> SVector<f64, 1> {
            SVector::<f64, 1>::new(1e-8)
        }
        fn lower_bounds(&self) -> SVector<f64, 1> {
            SVector::<f64, 1>::new(0.0)
        }
        fn upper_bounds(&self) -> SVector<f64, 1> {
            SVector::<f64, 1>::new(10.0)
        }
    }

    #[test]
    fn simple_quadratic() {
        let x0 = SVector::<f64, 1>::new(3.0);
        let result = newton_solve(&Sqrt4, x0, &NewtonConfig::default());

        assert!(result.converged);
        assert!((result.x[0] - 2.0).abs() < 1e-9);
        assert_eq!(result.pattern, ConvergencePattern::Quadratic);
    }

    #[test]
    fn zero_budget_never_converges() {
        let x0 = SVector::<f64, 1>::new(2.0);
        let config = NewtonConfig {
            max_iterations: 0,
            ..NewtonConfig::default()
        };
        let result = newton_solve(&Sqrt4, x0, &config);

        assert!(!result.converged);
        assert_eq!(result.iterations, 0);
        assert_eq!(result.pattern, ConvergencePattern::BudgetExhausted);
    }

    #[test]
    fn already_solved_is_immediate() {
        let x0 = SVector::<f64, 1>::new(2.0);
        let result = newton_solve(&Sqrt4, x0, &NewtonConfig::default());
        assert!(result.converged);
        assert_eq!(result.iterations, 0);
        assert_eq!(result.pattern, ConvergencePattern::Immediate);
    }

    struct Flat;

    impl ClosureProblem<1> for Flat {
        fn residual(&self, _x: &SVector<f64, 1>) -> SVector<f64, 1> {
            SVector::<f64, 1>::new(1.0)
        }
        fn tolerances(&self) -> SVector<f64, 1> {
            SVector::<f64, 1>::new(1e-6)
        }
        fn lower_bounds(&self) -> SVector<f64, 1> {
            SVector::<f64, 1>::new(-1.0)
        }
        fn upper_bounds(&self) -> SVector<f64, 1> {
            SVector::<f64, 1>::new(1.0)
        }
    }

    #[test]
    fn flat_residual_is_singular() {
        let result = newton_solve(&Flat, SVector::<f64, 1>::new(0.0), &NewtonConfig::default());
        assert!(!result.converged);
        assert_eq!(result.pattern, ConvergencePattern::Singular);
    }

    struct NanAbove;

    impl ClosureProblem<1> for NanAbove {
        fn residual(&self, x: &SVector<f64, 1>) -> SVector<f64, 1> {
            SVector::<f64, 1>::new(if x[0] > 5.0 { f64::NAN } else { x[0] - 1.0 })
        }
        fn tolerances(&self) -> SVector<f64, 1> {
            SVector::<f64, 1>::new(1e-9)
        }
        fn lower_bounds(&self) -> SVector<f64, 1> {
            SVector::<f64, 1>::new(0.0)
        }
        fn upper_bounds(&self) -> SVector<f64, 1> {
            SVector::<f64, 1>::new(10.0)
        }
    }

    #[test]
    fn nan_start_reports_evaluation_failure() {
        let result = newton_solve(&NanAbove, SVector::<f64, 1>::new(7.0), &NewtonConfig::default());
        assert!(!result.converged);
        assert_eq!(result.pattern, ConvergencePattern::EvaluationFailed);
    }
}
