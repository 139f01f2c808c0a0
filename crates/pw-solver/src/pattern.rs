//! Convergence diagnostics.

/// Capacity of the residual history kept per solve.
pub const HISTORY_LEN: usize = 32;

/// How a solve behaved, for forensics and telemetry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConvergencePattern {
    /// Initial guess already satisfied the tolerances.
    Immediate,
    /// Residual fell faster than linearly near the end.
    Quadratic,
    /// Converged with a roughly constant contraction ratio.
    Linear,
    /// Residual norm alternated up and down without settling.
    Oscillating,
    /// Steps stopped reducing the residual.
    Stalled,
    /// Jacobian could not be factored.
    Singular,
    /// Iteration ceiling reached while still making progress (or a zero budget).
    BudgetExhausted,
    /// Residual evaluation produced a non-finite value.
    EvaluationFailed,
}

impl ConvergencePattern {
    pub fn as_tag(&self) -> &'static str {
        match self {
            ConvergencePattern::Immediate => "immediate",
            ConvergencePattern::Quadratic => "quadratic",
            ConvergencePattern::Linear => "linear",
            ConvergencePattern::Oscillating => "oscillating",
            ConvergencePattern::Stalled => "stalled",
            ConvergencePattern::Singular => "singular",
            ConvergencePattern::BudgetExhausted => "budget_exhausted",
            ConvergencePattern::EvaluationFailed => "evaluation_failed",
        }
    }

    pub fn is_failure(&self) -> bool {
        !matches!(
            self,
            ConvergencePattern::Immediate
                | ConvergencePattern::Quadratic
                | ConvergencePattern::Linear
        )
    }
}

/// Scaled residual norms, one per iterate, in a fixed array.
#[derive(Clone, Copy, Debug)]
pub struct ResidualHistory {
    norms: [f64; HISTORY_LEN],
    len: usize,
}

impl Default for ResidualHistory {
    fn default() -> Self {
        Self {
            norms: [0.0; HISTORY_LEN],
            len: 0,
        }
    }
}

impl ResidualHistory {
    /// Record a norm; once full the last slot is overwritten so the final
    /// value is always available.
    pub fn push(&mut self, norm: f64) {
        if self.len < HISTORY_LEN {
            self.norms[self.len] = norm;
            self.len += 1;
        } else {
            self.norms[HISTORY_LEN - 1] = norm;
        }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.norms[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn last(&self) -> Option<f64> {
        self.as_slice().last().copied()
    }

    /// Classify a finished solve that did not fail hard (singular or
    /// evaluation failure are decided by the caller).
    pub fn classify(&self, converged: bool, iterations: usize) -> ConvergencePattern {
        let h = self.as_slice();
        if converged {
            if iterations == 0 {
                return ConvergencePattern::Immediate;
            }
            if h.len() >= 3 {
                let n = h.len();
                let (a, b, c) = (h[n - 3], h[n - 2], h[n - 1]);
                let r1 = ratio(b, a);
                let r2 = ratio(c, b);
                if r2 < 0.5 * r1 || r2 < 1e-2 {
                    return ConvergencePattern::Quadratic;
                }
                return ConvergencePattern::Linear;
            }
            return ConvergencePattern::Quadratic;
        }

        if h.len() >= 4 {
            let tail = &h[h.len() - 4..];
            let ups = tail.windows(2).filter(|w| w[1] > w[0]).count();
            let alternating = tail
                .windows(3)
                .all(|w| (w[1] - w[0]).signum() != (w[2] - w[1]).signum());
            if alternating && ups >= 1 {
                return ConvergencePattern::Oscillating;
            }
        }
        if h.len() >= 2 {
            let n = h.len();
            if ratio(h[n - 1], h[n - 2]) > 0.95 {
                return ConvergencePattern::Stalled;
            }
        }
        ConvergencePattern::BudgetExhausted
    }
}

fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 { num / den } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(values: &[f64]) -> ResidualHistory {
        let mut h = ResidualHistory::default();
        for v in values {
            h.push(*v);
        }
        h
    }

    #[test]
    fn immediate_when_no_iterations() {
        let h = history(&[0.5]);
        assert_eq!(h.classify(true, 0), ConvergencePattern::Immediate);
    }

    #[test]
    fn quadratic_tail() {
        let h = history(&[100.0, 10.0, 0.1, 1e-5]);
        assert_eq!(h.classify(true, 3), ConvergencePattern::Quadratic);
    }

    #[test]
    fn linear_tail() {
        let h = history(&[100.0, 50.0, 25.0, 12.5, 6.25, 3.1, 1.5, 0.8]);
        assert_eq!(h.classify(true, 7), ConvergencePattern::Linear);
    }

    #[test]
    fn oscillation_detected() {
        let h = history(&[10.0, 5.0, 8.0, 4.0, 7.0]);
        assert_eq!(h.classify(false, 4), ConvergencePattern::Oscillating);
    }

    #[test]
    fn stall_detected() {
        let h = history(&[10.0, 5.0, 4.9, 4.88, 4.87]);
        assert_eq!(h.classify(false, 4), ConvergencePattern::Stalled);
    }

    #[test]
    fn zero_budget_is_exhausted() {
        let h = history(&[3.0]);
        assert_eq!(h.classify(false, 0), ConvergencePattern::BudgetExhausted);
    }

    #[test]
    fn history_keeps_last_value_when_full() {
        let mut h = ResidualHistory::default();
        for i in 0..(HISTORY_LEN + 5) {
            h.push(i as f64);
        }
        assert_eq!(h.len(), HISTORY_LEN);
        assert_eq!(h.last(), Some((HISTORY_LEN + 4) as f64));
    }

    #[test]
    fn tags_are_snake_case() {
        assert_eq!(ConvergencePattern::BudgetExhausted.as_tag(), "budget_exhausted");
        assert!(ConvergencePattern::Singular.is_failure());
        assert!(!ConvergencePattern::Linear.is_failure());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn converged_solve_is_never_a_failure(
                norms in prop::collection::vec(0.0f64..1.0e6, 0..48),
                iterations in 0usize..60,
            ) {
                let h = history(&norms);
                prop_assert!(!h.classify(true, iterations).is_failure());
            }

            #[test]
            fn unconverged_solve_is_always_a_failure(
                norms in prop::collection::vec(0.0f64..1.0e6, 0..48),
                iterations in 0usize..60,
            ) {
                let h = history(&norms);
                prop_assert!(h.classify(false, iterations).is_failure());
            }

            #[test]
            fn history_is_bounded_and_keeps_final_norm(
                norms in prop::collection::vec(0.0f64..1.0e6, 1..80),
            ) {
                let h = history(&norms);
                prop_assert_eq!(h.len(), norms.len().min(HISTORY_LEN));
                prop_assert_eq!(h.last(), norms.last().copied());
            }
        }
    }
}
