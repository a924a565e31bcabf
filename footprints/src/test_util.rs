//! Fixtures shared by the unit tests.

use ndarray::Array2;

use crate::footprint::Footprint;

/// Builds an image from rows of integers so fixtures can be drawn inline.
pub fn image_from_pattern(pattern: &[&[i32]]) -> Array2<f64> {
    let height = pattern.len();
    let width = pattern.first().map(|row| row.len()).unwrap_or(0);

    let mut image = Array2::zeros((height, width));
    for (i, row) in pattern.iter().enumerate() {
        for (j, &value) in row.iter().enumerate() {
            image[[i, j]] = value as f64;
        }
    }
    image
}

/// Paints footprints into a grid using their 1-based position in `footprints`.
///
/// Assumes the footprints were detected in a raster with origin `(0, 0)`.
pub fn label_grid<'a, I>(footprints: I, height: usize, width: usize) -> Array2<i32>
where
    I: IntoIterator<Item = &'a Footprint>,
{
    let mut grid = Array2::zeros((height, width));
    for (n, fp) in footprints.into_iter().enumerate() {
        for (row, col) in fp.pixels() {
            grid[[row as usize, col as usize]] = n as i32 + 1;
        }
    }
    grid
}

/// Asserts a label grid matches the expected pattern cell by cell.
pub fn assert_labels_match(labeled: &Array2<i32>, expected: &[&[i32]]) {
    for (i, row) in expected.iter().enumerate() {
        for (j, &value) in row.iter().enumerate() {
            assert_eq!(
                labeled[[i, j]],
                value,
                "Mismatch at position [{}, {}]: expected {}, got {}",
                i,
                j,
                value,
                labeled[[i, j]]
            );
        }
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
