//! Footprint detection for astronomical rasters.
//!
//! A footprint is a connected region of pixels at or above a detection
//! threshold, stored as horizontal spans together with the peaks found
//! inside it. The crate provides:
//!
//! - [`find_footprints`]: a single-pass scan labeling every 8-connected
//!   region of a raster.
//! - [`find_footprint_at_point`]: a local flood-fill growing one region from
//!   a seed pixel, optionally halting at stop pixels.
//! - [`find_peaks`] and [`cull_peaks`]: locating local maxima and dropping
//!   those not separated from a brighter peak by a significant saddle.
//! - [`stamp_one`] and [`stamp_many`]: painting footprint ids into a label
//!   image.
//! - [`Detector`]: the whole pass driven by a [`DetectionConfig`].
//!
//! ```
//! use footprints::{find_footprints, FootprintIds, ImageRaster};
//! use ndarray::array;
//!
//! let image = array![[0.0, 5.0, 0.0], [0.0, 0.0, 5.0], [5.0, 0.0, 0.0]];
//! let ids = FootprintIds::new();
//! let found = find_footprints(&ImageRaster::new(image.view()), 1.0, 1, &ids).unwrap();
//! assert_eq!(found.len(), 2);
//! ```

pub mod collection;
pub mod config;
pub mod detector;
pub mod error;
pub mod flood;
pub mod footprint;
pub mod mask;
pub mod peaks;
pub mod raster;
pub mod scan;
pub mod stamp;
pub mod stats;

#[cfg(test)]
mod test_util;

pub use collection::{AllocationError, OwnedVec};
pub use config::{ConfigError, DetectionConfig, Threshold};
pub use detector::Detector;
pub use error::DetectionError;
pub use flood::{find_footprint_at_point, find_footprint_at_point_with_mask, Direction};
pub use footprint::{BBox, Footprint, FootprintId, FootprintIds, Peak, Span};
pub use mask::Mask;
pub use peaks::{cull_peaks, cull_peaks_many, find_peaks};
pub use raster::{ImageRaster, Raster, Sample, SampleType};
pub use scan::find_footprints;
pub use stamp::{stamp_many, stamp_one, LabelImage};
pub use stats::{NoiseStats, StatsError};
