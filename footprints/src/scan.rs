//! Global connected-component scan.
//!
//! Partitions every pixel at or above a threshold into maximal 8-connected
//! regions in a single top-to-bottom pass over the raster.
//!
//! # Algorithm
//! 1. **Labeling pass**: each significant pixel inherits a provisional label
//!    from its left neighbor, else from the first labeled of above-left,
//!    above and above-right. Unlabeled pixels mint a fresh label. Any other
//!    labeled neighbor carrying a different label is recorded as an alias.
//! 2. **Runs**: each maximal horizontal run is recorded as
//!    `(label, row, x0, x1)` while scanning.
//! 3. **Resolution**: aliases are resolved to a fixed point with union-find,
//!    runs are stably sorted by canonical label and each group becomes one
//!    footprint.
//!
//! Only two label rows are kept in memory, each padded by one column on
//! either side so neighbor lookups need no edge checks.

use std::time::Instant;

use crate::collection::OwnedVec;
use crate::error::DetectionError;
use crate::footprint::{Footprint, FootprintIds};
use crate::raster::Raster;

/// A maximal run of one provisional label in one row (absolute coordinates).
#[derive(Debug, Clone, Copy)]
struct Run {
    label: usize,
    row: i32,
    x0: i32,
    x1: i32,
}

/// Find the root label in a disjoint-set (union-find) data structure
///
/// # Arguments
/// * `aliases` - The array of label parent pointers
/// * `label` - The label to find the root for
///
/// # Returns
/// * The root label
fn find_root(aliases: &mut [usize], label: usize) -> usize {
    let mut current = label;

    while current != aliases[current] {
        // Path halving: point at the grandparent while walking up
        aliases[current] = aliases[aliases[current]];
        current = aliases[current];
    }

    current
}

/// Union two labels, making the smaller root the representative.
///
/// # Returns
/// * The root label of the merged set
fn union_labels(aliases: &mut [usize], label1: usize, label2: usize) -> usize {
    let root1 = find_root(aliases, label1);
    let root2 = find_root(aliases, label2);

    if root1 < root2 {
        aliases[root2] = root1;
        root1
    } else {
        aliases[root1] = root2;
        root2
    }
}

/// Point every label directly at its root.
fn resolve_aliases(aliases: &mut [usize]) {
    for label in 1..aliases.len() {
        let root = find_root(aliases, label);
        aliases[label] = root;
    }
}

fn is_significant(value: f64, threshold: f64) -> bool {
    // NaN never passes.
    value >= threshold
}

/// Find all 8-connected regions of pixels with `value >= threshold`.
///
/// Returns normalized footprints, pairwise pixel-disjoint, each with at least
/// `npix_min` pixels, ordered by their first pixel in raster scan order.
/// Ids are drawn from `ids` only for footprints that are returned.
///
/// # Errors
/// * `UnsupportedSampleEncoding` if the raster cannot be read as numbers.
/// * `AllocationFailure` if the output could not grow.
pub fn find_footprints<R: Raster + ?Sized>(
    raster: &R,
    threshold: f64,
    npix_min: usize,
    ids: &FootprintIds,
) -> Result<OwnedVec<Footprint>, DetectionError> {
    raster.check_encoding()?;
    let start_time = Instant::now();

    let mut footprints = OwnedVec::new(0)?;
    if raster.is_empty() {
        log::debug!("find_footprints: empty raster, nothing to scan");
        return Ok(footprints);
    }

    let (nrows, ncols) = raster.shape();
    let (row0, col0) = raster.origin();
    let region = raster.region();

    // Label 0 is background.
    let mut aliases: Vec<usize> = vec![0];
    let mut runs: Vec<Run> = Vec::new();
    let mut prev = vec![0usize; ncols + 2];
    let mut curr = vec![0usize; ncols + 2];

    for r in 0..nrows {
        curr.fill(0);
        let row = row0 + r as i32;
        let mut open_run: Option<(usize, usize)> = None;

        for c in 0..ncols {
            // Padded index: buffer column i holds raster column i - 1.
            let i = c + 1;

            if !is_significant(raster.sample(r, c), threshold) {
                if let Some((label, x0)) = open_run.take() {
                    runs.push(Run {
                        label,
                        row,
                        x0: col0 + x0 as i32,
                        x1: col0 + c as i32 - 1,
                    });
                }
                continue;
            }

            let above = [prev[i - 1], prev[i], prev[i + 1]];
            let label = if curr[i - 1] != 0 {
                curr[i - 1]
            } else if let Some(&inherited) = above.iter().find(|&&l| l != 0) {
                inherited
            } else {
                let fresh = aliases.len();
                aliases.push(fresh);
                fresh
            };
            curr[i] = label;

            for neighbor in above {
                if neighbor != 0 && neighbor != label {
                    union_labels(&mut aliases, label, neighbor);
                }
            }

            if open_run.is_none() {
                open_run = Some((label, c));
            }
        }

        if let Some((label, x0)) = open_run {
            runs.push(Run {
                label,
                row,
                x0: col0 + x0 as i32,
                x1: col0 + ncols as i32 - 1,
            });
        }

        std::mem::swap(&mut prev, &mut curr);
    }

    resolve_aliases(&mut aliases);
    for run in runs.iter_mut() {
        run.label = aliases[run.label];
    }
    // Stable: runs of one region stay in (row, x0) order.
    runs.sort_by_key(|run| run.label);

    let mut discarded = 0usize;
    for group in runs.chunk_by(|a, b| a.label == b.label) {
        let npix: usize = group.iter().map(|run| (run.x1 - run.x0 + 1) as usize).sum();
        if npix < npix_min {
            discarded += 1;
            continue;
        }

        let mut footprint = Footprint::with_capacity(ids, region, group.len())?;
        for run in group {
            footprint.add_span(run.row, run.x0, run.x1)?;
        }
        footprint.normalize();
        footprints.append(footprint)?;
    }

    log::debug!(
        "find_footprints: threshold={}, npix_min={}, labels={}, runs={}, footprints={}, discarded={}, duration={:.3}ms",
        threshold,
        npix_min,
        aliases.len() - 1,
        runs.len(),
        footprints.len(),
        discarded,
        start_time.elapsed().as_secs_f64() * 1000.0
    );

    Ok(footprints)
}
