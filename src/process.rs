//! Stochastic processes used to sample inter-event durations (arrivals, cold
//! service time, warm service time). Every process is parameterized by a rate
//! `λ` with mean `1/λ`, and owns no RNG state itself — callers thread an
//! explicit `rand::RngCore` through `sample()` so a whole simulation run is
//! reproducible from a single seed (see the engine's `StdRng`).

use crate::error::{SimError, SimResult};
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Contract shared by all inter-event duration samplers.
///
/// `pdf`/`cdf` are only used by validation tooling (e.g. comparing an
/// empirical histogram of samples against the closed-form density) and are
/// not required to be implemented by every variant.
pub trait StochasticProcess: std::fmt::Debug + Send + Sync {
    /// Draws one non-negative duration.
    fn sample(&self, rng: &mut dyn rand::RngCore) -> f64;

    fn has_pdf(&self) -> bool {
        false
    }

    fn has_cdf(&self) -> bool {
        false
    }

    fn pdf(&self, _x: f64) -> Option<f64> {
        None
    }

    fn cdf(&self, _x: f64) -> Option<f64> {
        None
    }

    fn rate(&self) -> f64;
}

/// Memoryless inter-arrival/service time: `Exp(λ)`, mean `1/λ`.
#[derive(Debug, Clone, Copy)]
pub struct ExpProcess {
    rate: f64,
}

impl ExpProcess {
    pub fn new(rate: f64) -> SimResult<Self> {
        if !(rate > 0.0) {
            return Err(SimError::InvalidConfiguration(format!(
                "exponential process rate must be > 0, got {rate}"
            )));
        }
        Ok(Self { rate })
    }
}

impl StochasticProcess for ExpProcess {
    fn sample(&self, rng: &mut dyn rand::RngCore) -> f64 {
        // Inverse-CDF sampling: -ln(1-U)/rate, U ~ Uniform(0,1).
        let u: f64 = rng.gen_range(f64::EPSILON..1.0);
        -u.ln() / self.rate
    }

    fn has_pdf(&self) -> bool {
        true
    }

    fn has_cdf(&self) -> bool {
        true
    }

    fn pdf(&self, x: f64) -> Option<f64> {
        if x < 0.0 {
            return Some(0.0);
        }
        Some(self.rate * (-self.rate * x).exp())
    }

    fn cdf(&self, x: f64) -> Option<f64> {
        if x < 0.0 {
            return Some(0.0);
        }
        Some(1.0 - (-self.rate * x).exp())
    }

    fn rate(&self) -> f64 {
        self.rate
    }
}

/// Deterministic inter-event duration: always `1/λ`.
#[derive(Debug, Clone, Copy)]
pub struct ConstProcess {
    rate: f64,
}

impl ConstProcess {
    pub fn new(rate: f64) -> SimResult<Self> {
        if !(rate > 0.0) {
            return Err(SimError::InvalidConfiguration(format!(
                "constant process rate must be > 0, got {rate}"
            )));
        }
        Ok(Self { rate })
    }
}

impl StochasticProcess for ConstProcess {
    fn sample(&self, _rng: &mut dyn rand::RngCore) -> f64 {
        1.0 / self.rate
    }

    fn rate(&self) -> f64 {
        self.rate
    }
}

/// Truncated Gaussian: `max(0, N(1/λ, σ))`. Truncation is by clamping, not
/// rejection, so the realized mean is slightly above `1/λ` whenever σ is
/// large relative to `1/λ`.
#[derive(Debug, Clone, Copy)]
pub struct GaussianProcess {
    rate: f64,
    std_dev: f64,
}

impl GaussianProcess {
    pub fn new(rate: f64, std_dev: f64) -> SimResult<Self> {
        if !(rate > 0.0) {
            return Err(SimError::InvalidConfiguration(format!(
                "gaussian process rate must be > 0, got {rate}"
            )));
        }
        if !(std_dev >= 0.0) {
            return Err(SimError::InvalidConfiguration(format!(
                "gaussian process std_dev must be >= 0, got {std_dev}"
            )));
        }
        Ok(Self { rate, std_dev })
    }
}

impl StochasticProcess for GaussianProcess {
    fn sample(&self, rng: &mut dyn rand::RngCore) -> f64 {
        let mean = 1.0 / self.rate;
        if self.std_dev == 0.0 {
            return mean.max(0.0);
        }
        let normal = Normal::new(mean, self.std_dev).expect("validated std_dev >= 0");
        normal.sample(rng).max(0.0)
    }

    fn rate(&self) -> f64 {
        self.rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn exp_process_rejects_nonpositive_rate() {
        assert!(ExpProcess::new(0.0).is_err());
        assert!(ExpProcess::new(-1.0).is_err());
        assert!(ExpProcess::new(1.0).is_ok());
    }

    #[test]
    fn exp_process_empirical_mean_matches_theoretical_within_5_percent() {
        let proc = ExpProcess::new(2.0).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let n = 20_000;
        let sum: f64 = (0..n).map(|_| proc.sample(&mut rng)).sum();
        let mean = sum / n as f64;
        let expected = 1.0 / 2.0;
        assert!(
            (mean - expected).abs() / expected < 0.05,
            "empirical mean {mean} too far from expected {expected}"
        );
    }

    #[test]
    fn const_process_always_returns_period() {
        let proc = ConstProcess::new(4.0).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..10 {
            assert_eq!(proc.sample(&mut rng), 0.25);
        }
    }

    #[test]
    fn gaussian_process_is_lower_clamped_at_zero() {
        // Huge std_dev relative to the mean will frequently draw negative
        // raw normals; every sample must still be clamped to >= 0.
        let proc = GaussianProcess::new(10.0, 100.0).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1_000 {
            assert!(proc.sample(&mut rng) >= 0.0);
        }
    }

    #[test]
    fn exp_process_pdf_cdf_are_consistent_with_closed_form() {
        let proc = ExpProcess::new(1.5).unwrap();
        assert!((proc.pdf(0.0).unwrap() - 1.5).abs() < 1e-9);
        assert!((proc.cdf(0.0).unwrap()).abs() < 1e-9);
        assert!(proc.cdf(1e6).unwrap() > 0.999);
    }

    #[test]
    fn const_process_has_no_pdf_or_cdf() {
        let proc = ConstProcess::new(1.0).unwrap();
        assert!(!proc.has_pdf());
        assert!(!proc.has_cdf());
        assert!(proc.pdf(0.25).is_none());
    }
}
