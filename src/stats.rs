use crate::truncate::BitWidth;

/// Summary of the iteration counts recorded for one phase of a trial.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseStats {
    pub width: BitWidth,
    pub samples: usize,
    pub total: u64,
    pub min: Option<u64>,
    pub max: Option<u64>,
    pub mean: Option<f64>,
}

impl PhaseStats {
    pub fn from_iterations(width: BitWidth, iterations: &[u64]) -> Self {
        let total = iterations.iter().sum::<u64>();
        let mean = if iterations.is_empty() {
            None
        } else {
            Some(total as f64 / iterations.len() as f64)
        };
        Self {
            width,
            samples: iterations.len(),
            total,
            min: iterations.iter().copied().min(),
            max: iterations.iter().copied().max(),
            mean,
        }
    }

    /// Expected draws per sample for a linear search against a fixed target.
    pub fn expected(&self) -> f64 {
        // Each draw hits with p = 2^-w, so draws are geometric with mean 1/p.
        2.0_f64.powi(self.width.bits() as i32)
    }

    /// Observed mean divided by the expected mean.
    pub fn ratio(&self) -> Option<f64> {
        self.mean.map(|mean| mean / self.expected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarizes_iterations() {
        let stats = PhaseStats::from_iterations(BitWidth::new(8).unwrap(), &[100, 300, 500]);
        assert_eq!(stats.samples, 3);
        assert_eq!(stats.total, 900);
        assert_eq!(stats.min, Some(100));
        assert_eq!(stats.max, Some(500));
        assert_eq!(stats.mean, Some(300.0));
        assert_eq!(stats.expected(), 256.0);
        assert_eq!(stats.ratio(), Some(300.0 / 256.0));
    }

    #[test]
    fn empty_phase_has_no_mean() {
        let stats = PhaseStats::from_iterations(BitWidth::new(10).unwrap(), &[]);
        assert_eq!(stats.samples, 0);
        assert_eq!(stats.mean, None);
        assert_eq!(stats.ratio(), None);
        assert_eq!(stats.expected(), 1024.0);
    }
}
