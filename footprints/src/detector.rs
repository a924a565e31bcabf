//! A configured detection pass: threshold, scan, peaks, culling.

use std::sync::Arc;
use std::time::Instant;

use crate::collection::OwnedVec;
use crate::config::{ConfigError, DetectionConfig};
use crate::error::DetectionError;
use crate::footprint::{Footprint, FootprintIds};
use crate::mask::{Mask, DETECTED};
use crate::peaks::{cull_peaks_many, find_peaks};
use crate::raster::Raster;
use crate::scan::find_footprints;
use crate::stats::NoiseStats;

/// Runs detection passes with one configuration and one id counter.
///
/// Detectors sharing an `Arc<FootprintIds>` hand out ids that are unique
/// across all of them, and may run on different threads.
#[derive(Debug, Clone)]
pub struct Detector {
    config: DetectionConfig,
    ids: Arc<FootprintIds>,
}

impl Detector {
    /// A detector with its own id counter starting at 1.
    pub fn new(config: DetectionConfig) -> Result<Self, ConfigError> {
        Self::with_ids(config, Arc::new(FootprintIds::new()))
    }

    pub fn with_ids(config: DetectionConfig, ids: Arc<FootprintIds>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, ids })
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    pub fn ids(&self) -> &Arc<FootprintIds> {
        &self.ids
    }

    /// Detects footprints in `raster` against known background `noise`.
    ///
    /// With peak finding enabled every returned footprint is normalized and
    /// carries its surviving peaks, brightest first.
    pub fn detect<R: Raster + ?Sized>(
        &self,
        raster: &R,
        noise: &NoiseStats,
    ) -> Result<OwnedVec<Footprint>, DetectionError> {
        let start_time = Instant::now();
        let threshold = self.config.threshold.resolve(noise);

        let mut footprints = find_footprints(raster, threshold, self.config.npix_min, &self.ids)?;

        let mut npeaks = 0;
        let mut culled = 0;
        if self.config.find_peaks {
            for footprint in footprints.iter_mut() {
                npeaks += find_peaks(raster, footprint, threshold)?;
            }
            culled = cull_peaks_many(
                raster,
                noise.stdev,
                &mut footprints,
                self.config.nsigma_delta,
                self.config.min_threshold,
                &self.ids,
            )?;
        }

        log::debug!(
            "Detector::detect: threshold={:.3}, footprints={}, peaks={}, culled={}, duration={:.3}ms",
            threshold,
            footprints.len(),
            npeaks,
            culled,
            start_time.elapsed().as_secs_f64() * 1000.0
        );
        Ok(footprints)
    }

    /// [`Detector::detect`], then flags every detected pixel `DETECTED` in
    /// `mask`. Other mask bits are left alone.
    ///
    /// # Errors
    /// `MaskMismatch` if `mask` does not have the raster's frame, checked
    /// before any detection work.
    pub fn detect_with_mask<R: Raster + ?Sized>(
        &self,
        raster: &R,
        noise: &NoiseStats,
        mask: &mut Mask,
    ) -> Result<OwnedVec<Footprint>, DetectionError> {
        if !mask.matches(raster) {
            return Err(DetectionError::MaskMismatch {
                mask: mask.region(),
                raster: raster.region(),
            });
        }
        let footprints = self.detect(raster, noise)?;
        for footprint in footprints.iter() {
            mask.set_footprint(footprint, DETECTED);
        }
        Ok(footprints)
    }

    /// Estimates the background from `raster` itself, then runs [`Detector::detect`].
    pub fn detect_estimating_noise<R: Raster + ?Sized>(
        &self,
        raster: &R,
    ) -> Result<OwnedVec<Footprint>, DetectionError> {
        raster.check_encoding()?;
        let noise = NoiseStats::estimate(raster)?;
        self.detect(raster, &noise)
    }
}
