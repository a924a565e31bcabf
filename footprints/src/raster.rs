//! Read-only pixel rasters consumed by the detection engine.
//!
//! Detection only ever needs one capability from an image: read a sample at
//! a pixel as `f64`. [`Raster`] captures that together with the image's
//! origin in the parent frame and a [`SampleType`] tag describing how the
//! samples are stored. [`ImageRaster`] adapts any `ndarray` view of a
//! [`Sample`] type.
//!
//! Coordinates passed to [`Raster::sample`] are local (0-based) indices;
//! everything else in the crate uses absolute coordinates, i.e. local index
//! plus the raster origin.

use ndarray::ArrayView2;

use crate::error::DetectionError;
use crate::footprint::BBox;

/// Storage encoding of raster samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleType {
    /// 8-bit unsigned, used for mask planes.
    U8,
    /// 16-bit unsigned sensor counts.
    U16,
    /// 32-bit signed integers.
    I32,
    /// 32-bit IEEE float.
    F32,
    /// 64-bit IEEE float.
    F64,
}

impl SampleType {
    /// Whether detection accepts rasters stored in this encoding.
    ///
    /// Science rasters are integer counts or floating point; 8-bit planes are
    /// bookkeeping masks and are rejected.
    pub fn is_supported(self) -> bool {
        matches!(
            self,
            SampleType::U16 | SampleType::I32 | SampleType::F32 | SampleType::F64
        )
    }
}

/// A numeric pixel type that can back an [`ImageRaster`].
pub trait Sample: Copy {
    const SAMPLE_TYPE: SampleType;

    fn to_f64(self) -> f64;
}

impl Sample for u8 {
    const SAMPLE_TYPE: SampleType = SampleType::U8;

    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl Sample for u16 {
    const SAMPLE_TYPE: SampleType = SampleType::U16;

    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl Sample for i32 {
    const SAMPLE_TYPE: SampleType = SampleType::I32;

    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl Sample for f32 {
    const SAMPLE_TYPE: SampleType = SampleType::F32;

    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl Sample for f64 {
    const SAMPLE_TYPE: SampleType = SampleType::F64;

    fn to_f64(self) -> f64 {
        self
    }
}

/// Read-only 2-D image with an origin offset.
pub trait Raster {
    /// Absolute `(row0, col0)` of local pixel `(0, 0)`.
    fn origin(&self) -> (i32, i32);

    /// `(nrows, ncols)`.
    fn shape(&self) -> (usize, usize);

    fn sample_type(&self) -> SampleType;

    /// Sample at local indices. Callers guarantee the indices are in range.
    fn sample(&self, row: usize, col: usize) -> f64;

    fn row0(&self) -> i32 {
        self.origin().0
    }

    fn col0(&self) -> i32 {
        self.origin().1
    }

    fn nrows(&self) -> usize {
        self.shape().0
    }

    fn ncols(&self) -> usize {
        self.shape().1
    }

    fn is_empty(&self) -> bool {
        let (nrows, ncols) = self.shape();
        nrows == 0 || ncols == 0
    }

    /// The raster frame in absolute coordinates.
    fn region(&self) -> BBox {
        let (row0, col0) = self.origin();
        let (nrows, ncols) = self.shape();
        if nrows == 0 || ncols == 0 {
            return BBox::EMPTY;
        }
        BBox {
            x0: col0,
            x1: col0 + ncols as i32 - 1,
            y0: row0,
            y1: row0 + nrows as i32 - 1,
        }
    }

    /// Local indices of an absolute pixel, or `None` if it lies outside.
    fn local_index(&self, row: i32, col: i32) -> Option<(usize, usize)> {
        let (row0, col0) = self.origin();
        let (nrows, ncols) = self.shape();
        let r = i64::from(row) - i64::from(row0);
        let c = i64::from(col) - i64::from(col0);
        if r < 0 || c < 0 || r >= nrows as i64 || c >= ncols as i64 {
            None
        } else {
            Some((r as usize, c as usize))
        }
    }

    /// Sample at an absolute pixel, or `None` if it lies outside.
    fn value_at(&self, row: i32, col: i32) -> Option<f64> {
        self.local_index(row, col).map(|(r, c)| self.sample(r, c))
    }

    /// Fails with `UnsupportedSampleEncoding` unless detection can read this raster.
    fn check_encoding(&self) -> Result<(), DetectionError> {
        let sample_type = self.sample_type();
        if sample_type.is_supported() {
            Ok(())
        } else {
            Err(DetectionError::UnsupportedSampleEncoding(sample_type))
        }
    }
}

/// `ndarray` view adapted to [`Raster`].
#[derive(Debug, Clone, Copy)]
pub struct ImageRaster<'a, T: Sample> {
    data: ArrayView2<'a, T>,
    row0: i32,
    col0: i32,
}

impl<'a, T: Sample> ImageRaster<'a, T> {
    /// Wraps a view with its origin at `(0, 0)`.
    pub fn new(data: ArrayView2<'a, T>) -> Self {
        Self {
            data,
            row0: 0,
            col0: 0,
        }
    }

    /// Places local pixel `(0, 0)` at absolute `(row0, col0)`.
    pub fn with_origin(mut self, row0: i32, col0: i32) -> Self {
        self.row0 = row0;
        self.col0 = col0;
        self
    }

    pub fn data(&self) -> &ArrayView2<'a, T> {
        &self.data
    }
}

impl<'a, T: Sample> From<ArrayView2<'a, T>> for ImageRaster<'a, T> {
    fn from(data: ArrayView2<'a, T>) -> Self {
        Self::new(data)
    }
}

impl<T: Sample> Raster for ImageRaster<'_, T> {
    fn origin(&self) -> (i32, i32) {
        (self.row0, self.col0)
    }

    fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    fn sample_type(&self) -> SampleType {
        T::SAMPLE_TYPE
    }

    fn sample(&self, row: usize, col: usize) -> f64 {
        self.data[[row, col]].to_f64()
    }
}
