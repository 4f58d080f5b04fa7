//! Histogram-to-density conversion, used to validate that samples drawn
//! from a `StochasticProcess` track its closed-form `pdf`/`cdf` (where
//! known) without pulling in a plotting crate — only the numeric curve is
//! produced, never a rendered image.

/// Bins `values` into `num_bins` equal-width buckets over `[min(values),
/// max(values)]` and returns `(bin_centers, density, cumulative)`, each of
/// length `num_bins + 2`: two leading zero/origin points followed by one
/// entry per bin, so the returned curves start at the origin the way a
/// plotted density usually does.
///
/// - `density`: each bin's count normalized so the curve integrates to
///   (approximately) 1 — divided by total sample count, then by bin width.
/// - `cumulative`: the running fraction of samples at or below each bin's
///   lower edge.
pub fn histogram_to_density(values: &[f64], num_bins: usize) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    assert!(num_bins > 0, "num_bins must be >= 1");
    if values.is_empty() {
        return (vec![0.0, 0.0], vec![0.0, 0.0], vec![0.0, 0.0]);
    }

    let lo = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let hi = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let bin_size = if hi > lo {
        (hi - lo) / num_bins as f64
    } else {
        0.0
    };

    let mut counts = vec![0u64; num_bins];
    for &v in values {
        let idx = if bin_size > 0.0 {
            (((v - lo) / bin_size) as usize).min(num_bins - 1)
        } else {
            0
        };
        counts[idx] += 1;
    }

    let total_count: u64 = counts.iter().sum();
    let density_scale = if total_count > 0 { total_count as f64 } else { 1.0 };

    let mut base = vec![0.0, lo];
    let mut density = vec![0.0, 0.0];
    let mut cumulative = vec![0.0, 0.0];

    let mut running = 0u64;
    for i in 0..num_bins {
        base.push(lo + i as f64 * bin_size);

        let mut d = counts[i] as f64 / density_scale;
        if bin_size > 0.0 {
            d /= bin_size;
        }
        density.push(d);

        running += counts[i];
        cumulative.push(running as f64 / density_scale);
    }

    for b in base.iter_mut() {
        *b += bin_size / 2.0;
    }

    (base, density, cumulative)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{ExpProcess, StochasticProcess};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn cumulative_is_nondecreasing_and_ends_near_one() {
        let proc = ExpProcess::new(1.0).unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        let samples: Vec<f64> = (0..5000).map(|_| proc.sample(&mut rng)).collect();
        let (_, _, cumulative) = histogram_to_density(&samples, 40);
        for w in cumulative.windows(2) {
            assert!(w[1] + 1e-9 >= w[0]);
        }
        assert!((cumulative.last().unwrap() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn density_integrates_to_approximately_one() {
        let proc = ExpProcess::new(2.0).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let samples: Vec<f64> = (0..20_000).map(|_| proc.sample(&mut rng)).collect();
        let (base, density, _) = histogram_to_density(&samples, 60);
        let lengths: Vec<f64> = base.windows(2).map(|w| w[1] - w[0]).collect();
        let integral: f64 = lengths
            .iter()
            .zip(density.iter().skip(1))
            .map(|(len, d)| len * d)
            .sum();
        assert!((integral - 1.0).abs() < 0.15, "integral={integral}");
    }

    #[test]
    fn empty_input_returns_degenerate_zero_curve() {
        let (base, density, cumulative) = histogram_to_density(&[], 10);
        assert_eq!(base, vec![0.0, 0.0]);
        assert_eq!(density, vec![0.0, 0.0]);
        assert_eq!(cumulative, vec![0.0, 0.0]);
    }
}
