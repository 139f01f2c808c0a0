use crate::PwError;

/// Floating point type used throughout system
pub type Real = f64;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, PwError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(PwError::NonFinite { what, value: v })
    }
}

/// Finite and strictly positive.
pub fn ensure_positive(v: Real, what: &'static str) -> Result<Real, PwError> {
    let v = ensure_finite(v, what)?;
    if v > 0.0 {
        Ok(v)
    } else {
        Err(PwError::InvalidArg { what })
    }
}

pub fn ensure_in_range(v: Real, min: Real, max: Real, what: &'static str) -> Result<Real, PwError> {
    let v = ensure_finite(v, what)?;
    if (min..=max).contains(&v) {
        Ok(v)
    } else {
        Err(PwError::OutOfRange {
            what,
            value: v,
            min,
            max,
        })
    }
}

/// Linear interpolation, `t = 0` gives `a`, `t = 1` gives `b`.
#[inline]
pub fn lerp(a: Real, b: Real, t: Real) -> Real {
    a + (b - a) * t
}

#[inline]
pub fn clamp01(v: Real) -> Real {
    v.clamp(0.0, 1.0)
}

/// Neumaier compensated summation.
///
/// The mass ledger integrates hundreds of thousands of small boundary deltas
/// against a total near 1e6 lb; a plain running sum loses the low-order bits.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CompensatedSum {
    sum: Real,
    compensation: Real,
}

impl CompensatedSum {
    pub const fn new(initial: Real) -> Self {
        Self {
            sum: initial,
            compensation: 0.0,
        }
    }

    pub fn add(&mut self, v: Real) {
        let t = self.sum + v;
        if self.sum.abs() >= v.abs() {
            self.compensation += (self.sum - t) + v;
        } else {
            self.compensation += (v - t) + self.sum;
        }
        self.sum = t;
    }

    #[inline]
    pub fn value(&self) -> Real {
        self.sum + self.compensation
    }
}
