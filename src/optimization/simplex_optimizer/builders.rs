//! Builders for the Nelder–Mead solver and its initial simplex.
//!
//! The simplex is the start point plus one vertex per coordinate, each
//! perturbing that coordinate by `rel_step · x` (or `zero_step` when the
//! coordinate is zero). The solver stops on the spread of vertex costs.
use crate::optimization::{
    errors::OptResult,
    simplex_optimizer::{
        traits::SimplexOptions,
        types::{NelderMeadSolver, Simplex, Theta},
    },
};
use argmin::solver::neldermead::NelderMead;

/// Coordinates with magnitude below this are treated as zero.
const ZERO_COORD: f64 = 1e-12;

/// Build the `n + 1` vertices of the initial simplex around `theta0`.
pub fn initial_simplex(theta0: &Theta, opts: &SimplexOptions) -> Simplex {
    let mut vertices = Vec::with_capacity(theta0.len() + 1);
    vertices.push(theta0.clone());
    for i in 0..theta0.len() {
        let mut vertex = theta0.clone();
        let x = theta0[i];
        vertex[i] = if x.abs() < ZERO_COORD { opts.zero_step } else { x * (1.0 + opts.rel_step) };
        vertices.push(vertex);
    }
    vertices
}

/// Construct a Nelder–Mead solver seeded at `theta0`.
///
/// # Errors
/// Propagates argmin's validation of the cost-spread tolerance.
pub fn build_nelder_mead(theta0: &Theta, opts: &SimplexOptions) -> OptResult<NelderMeadSolver> {
    let solver = NelderMead::new(initial_simplex(theta0, opts))
        .with_sd_tolerance(opts.tols.tol_cost)?;
    Ok(solver)
}
