//! Start-vector generation for multi-start searches.
//!
//! A [`StartSampler`] draws one fresh starting point per restart from a
//! caller-owned RNG. [`UnimodalStart`] produces band-shaped starts for
//! misclassification models: `n` uniforms on `[0, 1/n]`, sorted, and laid out
//! so the largest value sits at the peak of the band.
use crate::optimization::simplex_optimizer::Theta;
use rand::Rng;

/// Source of starting points for a multi-start search.
pub trait StartSampler {
    /// Draw one start vector.
    fn sample<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Theta;
}

/// Where the mass of a band-shaped start vector sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartShape {
    /// Index 0 is the peak; values decrease with the index.
    Symmetric,
    /// Index `half_width` is the peak; values decrease outward on both sides.
    Asymmetric { half_width: usize },
}

/// Sorted-uniform starts for unimodal band parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnimodalStart {
    pub n_params: usize,
    pub shape: StartShape,
}

impl UnimodalStart {
    pub fn new(n_params: usize, shape: StartShape) -> Self {
        Self { n_params, shape }
    }
}

impl StartSampler for UnimodalStart {
    fn sample<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Theta {
        let n = self.n_params;
        let mut draws: Vec<f64> = (0..n).map(|_| rng.random::<f64>() / n as f64).collect();
        draws.sort_by(|a, b| a.total_cmp(b));

        let mut theta = Theta::zeros(n);
        match self.shape {
            StartShape::Symmetric => {
                for (i, value) in draws.iter().rev().enumerate() {
                    theta[i] = *value;
                }
            }
            StartShape::Asymmetric { half_width } => {
                let mut largest_first = draws.into_iter().rev();
                if let Some(peak) = largest_first.next() {
                    theta[half_width] = peak;
                }
                for offset in 1..=half_width {
                    if let Some(left) = largest_first.next() {
                        theta[half_width - offset] = left;
                    }
                    if let Some(right) = largest_first.next() {
                        theta[half_width + offset] = right;
                    }
                }
            }
        }
        theta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // Shape and range of sorted-uniform start vectors.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Symmetric starts are non-increasing and bounded by `1/n`.
    //
    // Given
    // -----
    // - `n = 4`, seeded RNG.
    //
    // Expect
    // ------
    // - `θ[i] ≥ θ[i+1]`, all in `[0, 0.25)`.
    fn symmetric_start_is_descending() {
        // Arrange
        let mut rng = StdRng::seed_from_u64(7);
        let mut sampler = UnimodalStart::new(4, StartShape::Symmetric);

        // Act
        let theta = sampler.sample(&mut rng);

        // Assert
        for i in 0..3 {
            assert!(theta[i] >= theta[i + 1]);
        }
        assert!(theta.iter().all(|&v| (0.0..0.25).contains(&v)));
    }

    #[test]
    // Purpose
    // -------
    // Asymmetric starts peak at the centre and decrease outward.
    //
    // Given
    // -----
    // - `half_width = 2` (5 parameters), seeded RNG.
    //
    // Expect
    // ------
    // - Centre is the maximum; each side is non-increasing moving away.
    fn asymmetric_start_peaks_at_centre() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut sampler = UnimodalStart::new(5, StartShape::Asymmetric { half_width: 2 });

        let theta = sampler.sample(&mut rng);

        let max = theta.iter().cloned().fold(f64::MIN, f64::max);
        assert_eq!(theta[2], max);
        assert!(theta[1] >= theta[0]);
        assert!(theta[3] >= theta[4]);
    }
}
