//! Pressurizer partition closure solver.
//!
//! Given total primary mass, compartment energies, and geometry, find the
//! pressure (and, once a steam bubble exists, the steam mass) that makes the
//! RCS and pressurizer volumes and the pressurizer energy self-consistent.
//! Unknowns live in fixed-size `nalgebra` vectors so one solve never touches
//! the heap, and every solve has a hard iteration ceiling.

pub mod closure;
pub mod error;
pub mod jacobian;
pub mod newton;
pub mod pattern;
pub mod problem;
pub mod solve;

pub use closure::{SolidClosure, Surge, TwoPhaseClosure};
pub use error::{SolverError, SolverResult};
pub use newton::{NewtonConfig, NewtonResult};
pub use pattern::{ConvergencePattern, ResidualHistory};
pub use problem::ClosureProblem;
pub use solve::{
    ClosureConfig, ClosureResult, SolidSolution, TwoPhaseSolution, solve_solid, solve_two_phase,
};
