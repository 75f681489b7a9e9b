/// Descriptive statistics over `f64` samples. Every helper returns 0 for an empty slice.
pub struct StatsHelper;

impl StatsHelper {
    pub fn mean(samples: &[f64]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        samples.iter().sum::<f64>() / samples.len() as f64
    }

    /// Population standard deviation (divides by `n`).
    pub fn std_dev(samples: &[f64]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        let mean = Self::mean(samples);
        let var = samples.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / samples.len() as f64;
        var.sqrt()
    }

    pub fn max(samples: &[f64]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        samples.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Percentile with linear interpolation between closest ranks:
    /// `rank = p/100 · (n − 1)`, value = `x[floor] + frac · (x[ceil] − x[floor])`
    /// over the ascending-sorted samples. `p` is clamped to [0, 100].
    pub fn percentile(samples: &[f64], p: f64) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        let mut sorted = samples.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let rank = p.clamp(0.0, 100.0) / 100.0 * (sorted.len() - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = rank.ceil() as usize;
        let frac = rank - lower as f64;
        sorted[lower] + frac * (sorted[upper] - sorted[lower])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_to_ten() -> Vec<f64> {
        (1..=10).map(f64::from).collect()
    }

    #[test]
    fn empty_sequences_yield_zero() {
        assert_eq!(StatsHelper::mean(&[]), 0.0);
        assert_eq!(StatsHelper::std_dev(&[]), 0.0);
        assert_eq!(StatsHelper::max(&[]), 0.0);
        assert_eq!(StatsHelper::percentile(&[], 95.0), 0.0);
    }

    #[test]
    fn percentile_uses_linear_interpolation() {
        let values = one_to_ten();
        assert!((StatsHelper::percentile(&values, 50.0) - 5.5).abs() < 1e-12);
        assert!((StatsHelper::percentile(&values, 90.0) - 9.1).abs() < 1e-12);
        assert_eq!(StatsHelper::percentile(&values, 0.0), 1.0);
        assert_eq!(StatsHelper::percentile(&values, 100.0), 10.0);
    }

    #[test]
    fn percentile_ignores_input_order() {
        let values = vec![9.0, 1.0, 5.0, 3.0, 7.0];
        assert_eq!(StatsHelper::percentile(&values, 50.0), 5.0);
    }

    #[test]
    fn std_dev_is_population_form() {
        assert_eq!(StatsHelper::std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), 2.0);
        assert_eq!(StatsHelper::mean(&[4.0]), 4.0);
    }
}
