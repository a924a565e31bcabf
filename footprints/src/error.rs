//! Errors reported by the detection engine.

use thiserror::Error;

use crate::collection::AllocationError;
use crate::footprint::{BBox, FootprintId};
use crate::raster::SampleType;
use crate::stats::StatsError;

/// Errors from footprint detection, flood-fill and peak culling.
///
/// Every detection entry point is all-or-nothing: when one of these is
/// returned no partially built footprint escapes.
#[derive(Error, Debug)]
pub enum DetectionError {
    /// Raster samples are stored in an encoding detection cannot read.
    #[error("unsupported sample encoding {0:?}, expected integer or floating-point samples")]
    UnsupportedSampleEncoding(SampleType),

    /// A seed or peak pixel lies outside the raster.
    #[error("pixel (row {row}, col {col}) lies outside raster region {region}")]
    OutOfBounds {
        /// Absolute row of the offending pixel.
        row: i32,
        /// Absolute column of the offending pixel.
        col: i32,
        /// Raster frame the pixel was checked against.
        region: BBox,
    },

    /// A caller-supplied scratch mask does not cover the raster frame.
    #[error("scratch mask frame {mask} does not match raster frame {raster}")]
    MaskMismatch {
        /// Frame of the mask.
        mask: BBox,
        /// Frame of the raster.
        raster: BBox,
    },

    /// A collection could not grow. Not retryable.
    #[error(transparent)]
    AllocationFailure(#[from] AllocationError),

    /// Peak culling failed on one footprint of a batch.
    #[error("peak culling failed on footprint {index} (id {id}): {source}")]
    CullFailed {
        /// Position of the footprint in the batch.
        index: usize,
        /// Id of the failing footprint.
        id: FootprintId,
        #[source]
        source: Box<DetectionError>,
    },

    /// Noise statistics could not be computed.
    #[error("noise statistics: {0}")]
    Stats(#[from] StatsError),
}
