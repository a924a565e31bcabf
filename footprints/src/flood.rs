//! Local incremental flood-fill.
//!
//! Finds the single 8-connected region of pixels at or above a threshold
//! that contains a seed pixel, touching only that region and its immediate
//! border instead of scanning the whole raster.
//!
//! # Algorithm
//!
//! Work items are *frontier spans*: runs already added to the footprint
//! whose neighboring row still has to be scanned. Each carries a
//! [`Direction`]:
//!
//! - `Down` / `Up`: scan the next row in that direction over
//!   `x0 - 1 ..= x1 + 1`.
//! - `Restart`: the span sticks out past the span that found it, so both
//!   neighboring rows need scanning. Expands into a `Down` and an `Up` copy.
//! - `Done`: nothing left to scan (raster edge).
//!
//! Scanning a row picks up the run overhanging the frontier's left edge,
//! runs under the frontier, and the run overhanging its right edge. Each
//! newly found run is added to the footprint and pushed as a frontier:
//! `Restart` if it overhangs the frontier, otherwise it keeps the frontier's
//! direction. The driver pops frontiers from an explicit stack until none is
//! pending, so stack depth does not grow with region size.
//!
//! A `VISITED` bit in the scratch [`Mask`] stops a pixel from being claimed
//! twice, which bounds the work by the region size. A run containing a
//! `STOP` pixel is added to the footprint but never expanded.

use std::time::Instant;

use crate::error::DetectionError;
use crate::footprint::{Footprint, FootprintIds, Peak};
use crate::mask::{Mask, STOP, VISITED};
use crate::raster::Raster;

/// Scan state of a frontier span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Scan the row below.
    Down,
    /// Scan the row above.
    Up,
    /// Scan both neighboring rows.
    Restart,
    /// Nothing left to scan.
    Done,
}

/// A claimed run awaiting expansion, in local raster coordinates.
#[derive(Debug, Clone, Copy)]
struct Frontier {
    row: i32,
    x0: i32,
    x1: i32,
    direction: Direction,
    /// The run contains a stop pixel and must not be expanded.
    stop: bool,
}

struct FloodFill<'a, R: Raster + ?Sized> {
    raster: &'a R,
    threshold: f64,
    mask: &'a mut Mask,
    row0: i32,
    col0: i32,
    nrows: i32,
    ncols: i32,
}

impl<R: Raster + ?Sized> FloodFill<'_, R> {
    /// Significant and not yet claimed. Local coordinates, in range.
    fn is_open(&self, r: i32, c: i32) -> bool {
        let value = self.raster.sample(r as usize, c as usize);
        // NaN never passes.
        value >= self.threshold && !self.mask.is_set(self.row0 + r, self.col0 + c, VISITED)
    }

    /// Maximal open run through the open pixel `(r, c)`.
    fn run_through(&self, r: i32, c: i32) -> (i32, i32) {
        let mut x0 = c;
        while x0 > 0 && self.is_open(r, x0 - 1) {
            x0 -= 1;
        }
        let mut x1 = c;
        while x1 + 1 < self.ncols && self.is_open(r, x1 + 1) {
            x1 += 1;
        }
        (x0, x1)
    }

    /// Marks a run visited and adds it to the footprint.
    ///
    /// Returns whether the run contains a stop pixel.
    fn claim(
        &mut self,
        footprint: &mut Footprint,
        r: i32,
        x0: i32,
        x1: i32,
    ) -> Result<bool, DetectionError> {
        let row = self.row0 + r;
        // Only spans in the footprint get their bits cleared afterwards.
        footprint.add_span(row, self.col0 + x0, self.col0 + x1)?;
        let mut stop = false;
        for c in x0..=x1 {
            let col = self.col0 + c;
            self.mask.set(row, col, VISITED);
            stop |= self.mask.is_set(row, col, STOP);
        }
        Ok(stop)
    }

    /// Direction for a run found while scanning in `direction` that lies
    /// entirely within its frontier's columns.
    fn continuation(&self, direction: Direction, r: i32) -> Direction {
        let next = match direction {
            Direction::Down => r + 1,
            Direction::Up => r - 1,
            other => return other,
        };
        if next < 0 || next >= self.nrows {
            Direction::Done
        } else {
            direction
        }
    }

    /// Scans the row next to `frontier` and pushes every newly claimed run.
    fn expand(
        &mut self,
        frontier: &Frontier,
        footprint: &mut Footprint,
        stack: &mut Vec<Frontier>,
    ) -> Result<(), DetectionError> {
        let r = match frontier.direction {
            Direction::Down => frontier.row + 1,
            Direction::Up => frontier.row - 1,
            Direction::Restart | Direction::Done => return Ok(()),
        };
        if r < 0 || r >= self.nrows {
            return Ok(());
        }

        let hi = (frontier.x1 + 1).min(self.ncols - 1);
        let mut c = (frontier.x0 - 1).max(0);
        while c <= hi {
            if !self.is_open(r, c) {
                c += 1;
                continue;
            }

            // May reach left of x0 - 1 (left overhang) or right of x1 + 1.
            let (x0, x1) = self.run_through(r, c);
            let stop = self.claim(footprint, r, x0, x1)?;
            let direction = if x0 < frontier.x0 || x1 > frontier.x1 {
                Direction::Restart
            } else {
                self.continuation(frontier.direction, r)
            };

            stack.push(Frontier {
                row: r,
                x0,
                x1,
                direction,
                stop,
            });
            c = x1 + 1;
        }
        Ok(())
    }

    /// Claims the seed run and drives the frontier stack until empty.
    ///
    /// Returns the number of directional scans performed.
    fn run(&mut self, footprint: &mut Footprint, r: i32, c: i32) -> Result<usize, DetectionError> {
        let (x0, x1) = self.run_through(r, c);
        let stop = self.claim(footprint, r, x0, x1)?;

        let mut stack = vec![Frontier {
            row: r,
            x0,
            x1,
            direction: Direction::Restart,
            stop,
        }];
        let mut scans = 0;

        while let Some(frontier) = stack.pop() {
            if frontier.stop {
                continue;
            }
            match frontier.direction {
                // Reached the raster edge.
                Direction::Done => {}
                Direction::Restart => {
                    stack.push(Frontier {
                        direction: Direction::Up,
                        ..frontier
                    });
                    stack.push(Frontier {
                        direction: Direction::Down,
                        ..frontier
                    });
                }
                Direction::Down | Direction::Up => {
                    scans += 1;
                    self.expand(&frontier, footprint, &mut stack)?;
                }
            }
        }
        Ok(scans)
    }
}

/// Find the region of pixels `>= threshold` 8-connected to `(row, col)`.
///
/// `row` and `col` are absolute coordinates. Runs containing the pixel of
/// any of `stop_peaks` are included but not expanded past. The result is
/// not normalized; spans are in discovery order.
///
/// # Errors
/// * `UnsupportedSampleEncoding` if the raster cannot be read as numbers.
/// * `OutOfBounds` if the seed lies outside the raster.
///
/// A seed below threshold is not an error: it yields an empty footprint.
pub fn find_footprint_at_point<R: Raster + ?Sized>(
    raster: &R,
    threshold: f64,
    stop_peaks: &[Peak],
    row: i32,
    col: i32,
    ids: &FootprintIds,
) -> Result<Footprint, DetectionError> {
    raster.check_encoding()?;
    let mut mask = Mask::for_raster(raster);
    find_footprint_at_point_with_mask(raster, threshold, stop_peaks, row, col, ids, &mut mask)
}

/// [`find_footprint_at_point`] using a caller-owned scratch mask.
///
/// The mask must have the raster's frame. Pixels already flagged `VISITED`
/// are treated as claimed and excluded; pixels already flagged `STOP` act as
/// extra stop pixels. Bits set by this call are cleared before it returns,
/// so the mask can be reused for the next seed.
#[allow(clippy::too_many_arguments)]
pub fn find_footprint_at_point_with_mask<R: Raster + ?Sized>(
    raster: &R,
    threshold: f64,
    stop_peaks: &[Peak],
    row: i32,
    col: i32,
    ids: &FootprintIds,
    mask: &mut Mask,
) -> Result<Footprint, DetectionError> {
    raster.check_encoding()?;
    let region = raster.region();
    let Some((r, c)) = raster.local_index(row, col) else {
        return Err(DetectionError::OutOfBounds { row, col, region });
    };
    if !mask.matches(raster) {
        return Err(DetectionError::MaskMismatch {
            mask: mask.region(),
            raster: region,
        });
    }

    let start_time = Instant::now();
    let (row0, col0) = raster.origin();
    let (nrows, ncols) = raster.shape();
    let mut footprint = Footprint::new(ids, region);

    let mut fill = FloodFill {
        raster,
        threshold,
        mask,
        row0,
        col0,
        nrows: nrows as i32,
        ncols: ncols as i32,
    };
    let (r, c) = (r as i32, c as i32);
    if !fill.is_open(r, c) {
        log::trace!("find_footprint_at_point: seed ({row}, {col}) below threshold {threshold}");
        return Ok(footprint);
    }

    let mut flagged = Vec::with_capacity(stop_peaks.len());
    for peak in stop_peaks {
        if !fill.mask.is_set(peak.row, peak.col, STOP) && fill.mask.set(peak.row, peak.col, STOP) {
            flagged.push((peak.row, peak.col));
        }
    }

    let result = fill.run(&mut footprint, r, c);

    fill.mask.clear_footprint(&footprint, VISITED);
    for (row, col) in flagged {
        fill.mask.clear(row, col, STOP);
    }

    let scans = result?;
    log::trace!(
        "find_footprint_at_point: seed=({}, {}), threshold={}, spans={}, npix={}, scans={}, duration={:.3}ms",
        row,
        col,
        threshold,
        footprint.spans().len(),
        footprint.npix(),
        scans,
        start_time.elapsed().as_secs_f64() * 1000.0
    );
    Ok(footprint)
}
