//! Peak finding and pruning inside footprints.
//!
//! A footprint often contains more than one local maximum. Some are real
//! neighboring sources, others are noise bumps on the flank of a brighter
//! source. [`cull_peaks`] keeps a peak only if it is separated from every
//! brighter peak by a saddle that is significantly below it: it floods from
//! the peak down to `value - nsigma_delta * stdev` and culls the peak if
//! that region reaches a brighter one.

use std::time::Instant;

use crate::error::DetectionError;
use crate::flood::find_footprint_at_point;
use crate::footprint::{Footprint, FootprintIds, Peak};
use crate::raster::Raster;
use crate::stamp::{stamp_one, BACKGROUND};

const NEIGHBORS: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

fn value_or_out_of_bounds<R: Raster + ?Sized>(
    raster: &R,
    row: i32,
    col: i32,
) -> Result<f64, DetectionError> {
    raster
        .value_at(row, col)
        .ok_or_else(|| DetectionError::OutOfBounds {
            row,
            col,
            region: raster.region(),
        })
}

/// Adds a peak at every local maximum of `footprint` whose value is at
/// least `min_significance`, then normalizes the footprint.
///
/// A pixel is a local maximum if no 8-neighbor inside the footprint is
/// brighter. On a plateau of equal values only the first pixel in row-major
/// order qualifies. The pixel value is used as the peak significance.
///
/// Returns the number of peaks added.
///
/// # Errors
/// * `UnsupportedSampleEncoding` if the raster cannot be read as numbers.
/// * `OutOfBounds` if a footprint pixel lies outside the raster.
pub fn find_peaks<R: Raster + ?Sized>(
    raster: &R,
    footprint: &mut Footprint,
    min_significance: f64,
) -> Result<usize, DetectionError> {
    raster.check_encoding()?;
    if !footprint.is_normalized() {
        footprint.normalize();
    }

    let mut found = Vec::new();
    for (row, col) in footprint.pixels() {
        let value = value_or_out_of_bounds(raster, row, col)?;
        // NaN never qualifies.
        if !(value >= min_significance) {
            continue;
        }

        let is_max = NEIGHBORS.iter().all(|&(dr, dc)| {
            let (nr, nc) = (row + dr, col + dc);
            if !footprint.contains(nr, nc) {
                return true;
            }
            match raster.value_at(nr, nc) {
                Some(neighbor) if neighbor > value => false,
                // Earlier in scan order wins the tie.
                Some(neighbor) if neighbor == value => (nr, nc) > (row, col),
                _ => true,
            }
        });
        if is_max {
            found.push(Peak::new(row, col, value));
        }
    }

    for peak in &found {
        footprint.add_peak(peak.row, peak.col, peak.significance)?;
    }
    footprint.normalize();

    log::trace!(
        "find_peaks: footprint {} npix={} peaks={}",
        footprint.id(),
        footprint.npix(),
        found.len()
    );
    Ok(found.len())
}

/// Removes peaks of `footprint` that are not separated from a brighter peak
/// by a significant saddle. Returns the number of peaks removed.
///
/// The footprint is normalized first if needed, so `peaks()[0]` is the
/// brightest peak and always survives. Each later peak `p` is culled if
/// `coll = value(p) - nsigma_delta * stdev` is below `min_threshold`, or if
/// the region of pixels at or above `coll` around `p` reaches a strictly
/// brighter peak. Brighter peaks act as stop pixels for that flood-fill.
///
/// # Errors
/// * `UnsupportedSampleEncoding` if the raster cannot be read as numbers.
/// * `OutOfBounds` if a peak lies outside the raster.
/// * `AllocationFailure` if a scratch footprint could not grow.
///
/// On error no peak has been removed.
pub fn cull_peaks<R: Raster + ?Sized>(
    raster: &R,
    stdev: f64,
    footprint: &mut Footprint,
    nsigma_delta: f64,
    min_threshold: f64,
    ids: &FootprintIds,
) -> Result<usize, DetectionError> {
    raster.check_encoding()?;
    if !(stdev > 0.0) {
        log::warn!(
            "cull_peaks: non-positive noise stdev {} on footprint {}, saddle test degenerates to value >= peak",
            stdev,
            footprint.id()
        );
    }
    if !footprint.is_normalized() {
        footprint.normalize();
    }

    // Decide on a copy; the footprint is only touched once every peak passed.
    let peaks = footprint.peaks().to_vec();
    let mut keep = vec![true; peaks.len()];
    for (i, peak) in peaks.iter().enumerate().skip(1) {
        let value = value_or_out_of_bounds(raster, peak.row, peak.col)?;
        let coll = value - nsigma_delta * stdev;

        if coll < min_threshold {
            log::trace!(
                "cull_peaks: footprint {} peak ({}, {}) culled, coll {} below floor {}",
                footprint.id(),
                peak.row,
                peak.col,
                coll,
                min_threshold
            );
            keep[i] = false;
            continue;
        }

        let brighter: Vec<Peak> = peaks[..i]
            .iter()
            .zip(&keep)
            .filter(|&(p, &kept)| kept && p.significance > peak.significance)
            .map(|(p, _)| *p)
            .collect();
        if brighter.is_empty() {
            continue;
        }

        let local = find_footprint_at_point(raster, coll, &brighter, peak.row, peak.col, ids)?;
        let sentinel = local.id();
        debug_assert_ne!(sentinel, BACKGROUND);
        let labels = stamp_one(&local, sentinel);
        let reached = brighter
            .iter()
            .find(|p| labels.get(p.row, p.col) == Some(sentinel));

        match reached {
            Some(other) => {
                log::trace!(
                    "cull_peaks: footprint {} peak ({}, {}) culled, reaches ({}, {}) at coll {}",
                    footprint.id(),
                    peak.row,
                    peak.col,
                    other.row,
                    other.col,
                    coll
                );
                keep[i] = false;
            }
            None => {
                log::trace!(
                    "cull_peaks: footprint {} peak ({}, {}) kept, isolated at coll {} ({} px)",
                    footprint.id(),
                    peak.row,
                    peak.col,
                    coll,
                    local.npix()
                );
            }
        }
    }

    let mut culled = 0;
    for i in (1..peaks.len()).rev() {
        if !keep[i] {
            footprint.remove_peak(i);
            culled += 1;
        }
    }
    Ok(culled)
}

/// Applies [`cull_peaks`] to each footprint in turn.
///
/// Returns the total number of peaks removed. An empty batch is a no-op.
///
/// # Errors
/// Stops at the first failing footprint with `CullFailed`, wrapping the
/// underlying error. Footprints before it have already been culled; the
/// failing one keeps all of its peaks.
pub fn cull_peaks_many<R: Raster + ?Sized>(
    raster: &R,
    stdev: f64,
    footprints: &mut [Footprint],
    nsigma_delta: f64,
    min_threshold: f64,
    ids: &FootprintIds,
) -> Result<usize, DetectionError> {
    if footprints.is_empty() {
        log::debug!("cull_peaks_many: no footprints to cull");
        return Ok(0);
    }

    let start_time = Instant::now();
    let mut culled = 0;
    for (index, footprint) in footprints.iter_mut().enumerate() {
        culled += cull_peaks(raster, stdev, footprint, nsigma_delta, min_threshold, ids).map_err(
            |source| DetectionError::CullFailed {
                index,
                id: footprint.id(),
                source: Box::new(source),
            },
        )?;
    }

    log::debug!(
        "cull_peaks_many: footprints={}, culled={}, nsigma_delta={}, duration={:.3}ms",
        footprints.len(),
        culled,
        nsigma_delta,
        start_time.elapsed().as_secs_f64() * 1000.0
    );
    Ok(culled)
}
