//! phylo::birthdeath — per-branch transition probabilities of the linear
//! birth–death process.
//!
//! For a branch of length `t` with birth rate `λ` and death rate `μ`, the
//! probability that a family of size `s` at the parent has size `c` at the
//! child is
//!
//! ```text
//! P(s→c) = Σ_{j=0}^{min(s,c)} C(s,j) · C(s+c−j−1, s−1) · α^{s−j} · β^{c−j} · (1−α−β)^j
//! ```
//!
//! with `α = μ(e^{(λ−μ)t} − 1)/(λe^{(λ−μ)t} − μ)`, `β = (λ/μ)·α`, and
//! `α = β = λt/(1 + λt)` when `λ = μ`. Size 0 is absorbing.
//!
//! [`populate_transitions`] fills every non-root node's matrix list (one
//! matrix per rate cluster) after rates have been assigned.
use crate::{
    phylo::{
        errors::{PhyloError, PhyloResult},
        tree::PhyloTree,
    },
    rates::decode::BranchRates,
};
use ndarray::Array2;
use statrs::function::factorial::ln_factorial;
use std::collections::HashMap;

/// Rates closer than this are treated as equal.
const EQUAL_RATES_EPS: f64 = 1e-12;

/// `ln k!` for `k = 0..=n`.
#[derive(Debug, Clone)]
pub struct LogFactorials {
    table: Vec<f64>,
}

impl LogFactorials {
    pub fn new(n: usize) -> Self {
        Self { table: (0..=n as u64).map(ln_factorial).collect() }
    }

    /// `ln C(n, k)` for `k ≤ n` within the table.
    pub fn ln_choose(&self, n: usize, k: usize) -> f64 {
        self.table[n] - self.table[k] - self.table[n - k]
    }
}

/// `(α, β)` of the birth–death generating function for one branch.
pub fn alpha_beta(rates: BranchRates, t: f64) -> (f64, f64) {
    let lambda = rates.lambda;
    let mu = rates.mu.unwrap_or(lambda);
    if (lambda - mu).abs() < EQUAL_RATES_EPS {
        let a = lambda * t / (1.0 + lambda * t);
        return (a, a);
    }
    let growth = ((lambda - mu) * t).exp();
    let denom = lambda * growth - mu;
    (mu * (growth - 1.0) / denom, lambda * (growth - 1.0) / denom)
}

/// Transition matrix `P[s, c]` for sizes `0..=max`.
pub fn transition_probabilities(
    rates: BranchRates, t: f64, max: usize, lnf: &LogFactorials,
) -> Array2<f64> {
    let (alpha, beta) = alpha_beta(rates, t);
    let gamma = 1.0 - alpha - beta;
    let mut p = Array2::zeros((max + 1, max + 1));
    p[[0, 0]] = 1.0;
    for s in 1..=max {
        for c in 0..=max {
            let mut total = 0.0;
            for j in 0..=s.min(c) {
                let log_coeff = lnf.ln_choose(s, j) + lnf.ln_choose(s + c - j - 1, s - 1);
                total += log_coeff.exp()
                    * alpha.powi((s - j) as i32)
                    * beta.powi((c - j) as i32)
                    * gamma.powi(j as i32);
            }
            p[[s, c]] = total.max(0.0);
        }
    }
    p
}

/// Compute every non-root node's per-cluster transition matrices.
///
/// Branches sharing rates and length share one computation.
///
/// # Errors
/// - [`PhyloError::RatesNotAssigned`] if a node has no rates.
/// - [`PhyloError::MissingBranchLength`] if a node has no branch length.
pub fn populate_transitions(tree: &mut PhyloTree) -> PhyloResult<()> {
    let max = tree.range().max;
    let lnf = LogFactorials::new(2 * max.max(1));
    let mut memo: HashMap<(u64, u64, u64), Array2<f64>> = HashMap::new();
    let root = tree.root();
    for (index, node) in tree.nodes_mut().iter_mut().enumerate() {
        if index == root {
            node.transitions.clear();
            continue;
        }
        let t = node.branch_length.ok_or(PhyloError::MissingBranchLength { node: index })?;
        let clusters = node.birth_death.clusters();
        if clusters.is_empty() {
            return Err(PhyloError::RatesNotAssigned { node: index });
        }
        let mut matrices = Vec::with_capacity(clusters.len());
        for rates in clusters {
            let key = (
                rates.lambda.to_bits(),
                rates.mu.unwrap_or(rates.lambda).to_bits(),
                t.to_bits(),
            );
            let matrix = memo
                .entry(key)
                .or_insert_with(|| transition_probabilities(*rates, t, max, &lnf))
                .clone();
            matrices.push(matrix);
        }
        node.transitions = matrices;
    }
    Ok(())
}
