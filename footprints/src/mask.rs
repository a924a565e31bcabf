//! Per-pixel bit planes used for detection bookkeeping.
//!
//! A [`Mask`] shares the shape and origin of the raster it annotates. The
//! flood-fill uses it to remember visited pixels and to flag stop pixels;
//! callers can use it to record which pixels ended up in a footprint.

use ndarray::Array2;

use crate::footprint::{BBox, Footprint};
use crate::raster::Raster;

/// Pixel already claimed by the current flood-fill.
pub const VISITED: u8 = 0x01;
/// Flood-fill halts expansion at a span containing this pixel.
pub const STOP: u8 = 0x02;
/// Pixel belongs to a detected footprint.
pub const DETECTED: u8 = 0x04;

/// Bit plane with an origin in absolute coordinates.
#[derive(Debug, Clone)]
pub struct Mask {
    bits: Array2<u8>,
    row0: i32,
    col0: i32,
}

impl Mask {
    /// An all-clear mask covering `nrows x ncols` pixels from `(row0, col0)`.
    pub fn new(row0: i32, col0: i32, nrows: usize, ncols: usize) -> Self {
        Self {
            bits: Array2::zeros((nrows, ncols)),
            row0,
            col0,
        }
    }

    /// An all-clear mask with the raster's shape and origin.
    pub fn for_raster<R: Raster + ?Sized>(raster: &R) -> Self {
        let (row0, col0) = raster.origin();
        let (nrows, ncols) = raster.shape();
        Self::new(row0, col0, nrows, ncols)
    }

    pub fn origin(&self) -> (i32, i32) {
        (self.row0, self.col0)
    }

    pub fn shape(&self) -> (usize, usize) {
        self.bits.dim()
    }

    /// The mask frame in absolute coordinates.
    pub fn region(&self) -> BBox {
        let (nrows, ncols) = self.bits.dim();
        if nrows == 0 || ncols == 0 {
            return BBox::EMPTY;
        }
        BBox {
            x0: self.col0,
            x1: self.col0 + ncols as i32 - 1,
            y0: self.row0,
            y1: self.row0 + nrows as i32 - 1,
        }
    }

    /// True if the mask has the same frame as `raster`.
    pub fn matches<R: Raster + ?Sized>(&self, raster: &R) -> bool {
        self.origin() == raster.origin() && self.shape() == raster.shape()
    }

    fn index(&self, row: i32, col: i32) -> Option<[usize; 2]> {
        let r = i64::from(row) - i64::from(self.row0);
        let c = i64::from(col) - i64::from(self.col0);
        let (nrows, ncols) = self.bits.dim();
        if r < 0 || c < 0 || r >= nrows as i64 || c >= ncols as i64 {
            None
        } else {
            Some([r as usize, c as usize])
        }
    }

    /// Whether any of `bits` is set at the absolute pixel. Pixels outside
    /// the mask read as clear.
    pub fn is_set(&self, row: i32, col: i32, bits: u8) -> bool {
        self.index(row, col)
            .map(|ix| self.bits[ix] & bits != 0)
            .unwrap_or(false)
    }

    /// Sets `bits` at the absolute pixel. Returns false if it lies outside.
    pub fn set(&mut self, row: i32, col: i32, bits: u8) -> bool {
        match self.index(row, col) {
            Some(ix) => {
                self.bits[ix] |= bits;
                true
            }
            None => false,
        }
    }

    /// Clears `bits` at the absolute pixel. Returns false if it lies outside.
    pub fn clear(&mut self, row: i32, col: i32, bits: u8) -> bool {
        match self.index(row, col) {
            Some(ix) => {
                self.bits[ix] &= !bits;
                true
            }
            None => false,
        }
    }

    /// Sets `bits` on `x0..=x1` of `row`, clipped to the mask.
    pub fn set_span(&mut self, row: i32, x0: i32, x1: i32, bits: u8) {
        for col in x0..=x1 {
            self.set(row, col, bits);
        }
    }

    /// Sets `bits` on every footprint pixel inside the mask.
    pub fn set_footprint(&mut self, footprint: &Footprint, bits: u8) {
        for span in footprint.spans() {
            self.set_span(span.row, span.x0, span.x1, bits);
        }
    }

    /// Clears `bits` on every footprint pixel inside the mask.
    pub fn clear_footprint(&mut self, footprint: &Footprint, bits: u8) {
        for (row, col) in footprint.pixels() {
            self.clear(row, col, bits);
        }
    }

    /// Clears `bits` everywhere.
    pub fn clear_all(&mut self, bits: u8) {
        self.bits.mapv_inplace(|v| v & !bits);
    }

    /// Number of pixels with any of `bits` set.
    pub fn count(&self, bits: u8) -> usize {
        self.bits.iter().filter(|&&v| v & bits != 0).count()
    }
}
