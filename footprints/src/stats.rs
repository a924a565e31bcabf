//! Robust background statistics for choosing detection thresholds.

use thiserror::Error;

use crate::raster::Raster;

/// Scale from median absolute deviation to standard deviation for
/// normally distributed noise.
pub const MAD_TO_SIGMA: f64 = 1.4826;

/// Errors from noise statistics.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    /// No finite samples to estimate from.
    #[error("raster has no finite samples ({total} total)")]
    EmptyRaster {
        /// Number of samples inspected, NaNs included.
        total: usize,
    },
}

/// Background level and noise of a raster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseStats {
    pub mean: f64,
    pub median: f64,
    /// Robust standard deviation, `1.4826 * MAD` when estimated.
    pub stdev: f64,
}

impl NoiseStats {
    /// Noise statistics known up front, e.g. from a calibration.
    pub fn new(mean: f64, median: f64, stdev: f64) -> Self {
        Self {
            mean,
            median,
            stdev,
        }
    }

    /// Estimates mean, median and robust standard deviation over every
    /// finite sample of `raster`.
    ///
    /// The MAD estimator keeps bright sources from inflating the noise.
    pub fn estimate<R: Raster + ?Sized>(raster: &R) -> Result<Self, StatsError> {
        let (nrows, ncols) = raster.shape();
        let mut values = Vec::with_capacity(nrows * ncols);
        for r in 0..nrows {
            for c in 0..ncols {
                let value = raster.sample(r, c);
                if value.is_finite() {
                    values.push(value);
                }
            }
        }
        if values.is_empty() {
            return Err(StatsError::EmptyRaster {
                total: nrows * ncols,
            });
        }

        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let median = median_in_place(&mut values);
        for v in values.iter_mut() {
            *v = (*v - median).abs();
        }
        let mad = median_in_place(&mut values);

        let stats = Self::new(mean, median, MAD_TO_SIGMA * mad);
        log::debug!(
            "NoiseStats::estimate: {} samples, mean={:.3}, median={:.3}, stdev={:.3}",
            values.len(),
            stats.mean,
            stats.median,
            stats.stdev
        );
        Ok(stats)
    }
}

/// Median of finite, non-empty `values`. Reorders the slice.
fn median_in_place(values: &mut [f64]) -> f64 {
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}
