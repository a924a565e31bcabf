//! Label stamping: paint footprint ids into an image.
//!
//! Used for visualization and for bookkeeping such as checking which
//! footprint a pixel ended up in.

use ndarray::{Array2, ArrayView2};

use crate::footprint::{BBox, Footprint};

/// Label value of pixels outside every stamped footprint.
pub const BACKGROUND: u32 = 0;

/// An image of footprint labels with an origin in absolute coordinates.
#[derive(Debug, Clone)]
pub struct LabelImage {
    labels: Array2<u32>,
    row0: i32,
    col0: i32,
}

impl LabelImage {
    /// A label image covering `region`, every pixel set to `initial`.
    pub fn new(region: BBox, initial: u32) -> Self {
        if region.is_empty() {
            return Self {
                labels: Array2::from_elem((0, 0), initial),
                row0: 0,
                col0: 0,
            };
        }
        Self {
            labels: Array2::from_elem((region.height(), region.width()), initial),
            row0: region.y0,
            col0: region.x0,
        }
    }

    pub fn region(&self) -> BBox {
        let (nrows, ncols) = self.labels.dim();
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

    /// Label at the absolute pixel, or `None` outside the image.
    pub fn get(&self, row: i32, col: i32) -> Option<u32> {
        let r = i64::from(row) - i64::from(self.row0);
        let c = i64::from(col) - i64::from(self.col0);
        let (nrows, ncols) = self.labels.dim();
        if r < 0 || c < 0 || r >= nrows as i64 || c >= ncols as i64 {
            None
        } else {
            Some(self.labels[[r as usize, c as usize]])
        }
    }

    pub fn labels(&self) -> ArrayView2<'_, u32> {
        self.labels.view()
    }

    pub fn into_array(self) -> Array2<u32> {
        self.labels
    }

    /// Sets `id` on every footprint pixel that falls inside the image.
    pub fn stamp(&mut self, footprint: &Footprint, id: u32) {
        let (nrows, ncols) = self.labels.dim();
        for span in footprint.spans() {
            let r = i64::from(span.row) - i64::from(self.row0);
            if r < 0 || r >= nrows as i64 {
                continue;
            }
            let c0 = (i64::from(span.x0) - i64::from(self.col0)).max(0);
            let c1 = (i64::from(span.x1) - i64::from(self.col0)).min(ncols as i64 - 1);
            for c in c0..=c1 {
                self.labels[[r as usize, c as usize]] = id;
            }
        }
    }
}

/// Stamps one footprint with `id` into a label image sized to its bbox.
pub fn stamp_one(footprint: &Footprint, id: u32) -> LabelImage {
    let mut image = LabelImage::new(footprint.bbox(), BACKGROUND);
    image.stamp(footprint, id);
    image
}

/// Stamps every footprint into a label image sized to their combined bbox.
///
/// With `use_relative_ids` the labels are 1-based positions in `footprints`;
/// otherwise each footprint's own id. Later footprints overwrite earlier ones
/// where they overlap.
pub fn stamp_many(footprints: &[Footprint], use_relative_ids: bool) -> LabelImage {
    let region = footprints
        .iter()
        .map(Footprint::bbox)
        .fold(BBox::EMPTY, |acc, bbox| acc.union(&bbox));

    let mut image = LabelImage::new(region, BACKGROUND);
    for (n, footprint) in footprints.iter().enumerate() {
        let id = if use_relative_ids {
            n as u32 + 1
        } else {
            footprint.id()
        };
        image.stamp(footprint, id);
    }
    log::debug!(
        "stamp_many: {} footprints into {}x{} labels",
        footprints.len(),
        region.height(),
        region.width()
    );
    image
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::footprint::FootprintIds;

    fn footprint(ids: &FootprintIds, spans: &[(i32, i32, i32)]) -> Footprint {
        let mut fp = Footprint::new(ids, BBox::EMPTY);
        for &(row, x0, x1) in spans {
            fp.add_span(row, x0, x1).unwrap();
        }
        fp
    }

    #[test]
    fn test_stamp_one_round_trip() {
        let ids = FootprintIds::starting_at(7);
        let fp = footprint(&ids, &[(10, 4, 6), (11, 5, 5), (12, 3, 7)]);

        let labels = stamp_one(&fp, 42);
        assert_eq!(labels.region(), fp.bbox());

        let bbox = fp.bbox();
        for row in bbox.y0..=bbox.y1 {
            for col in bbox.x0..=bbox.x1 {
                let expected = if fp.contains(row, col) { 42 } else { BACKGROUND };
                assert_eq!(labels.get(row, col), Some(expected), "({row}, {col})");
            }
        }
        assert_eq!(labels.get(9, 4), None);
    }

    #[test]
    fn test_stamp_many_ids() {
        let ids = FootprintIds::starting_at(100);
        let footprints = vec![
            footprint(&ids, &[(0, 0, 1)]),
            footprint(&ids, &[(3, 4, 4), (4, 4, 5)]),
        ];

        let own = stamp_many(&footprints, false);
        assert_eq!(
            own.region(),
            BBox {
                x0: 0,
                x1: 5,
                y0: 0,
                y1: 4
            }
        );
        assert_eq!(own.get(0, 1), Some(100));
        assert_eq!(own.get(4, 5), Some(101));
        assert_eq!(own.get(2, 2), Some(BACKGROUND));

        let relative = stamp_many(&footprints, true);
        assert_eq!(relative.get(0, 0), Some(1));
        assert_eq!(relative.get(3, 4), Some(2));
    }

    #[test]
    fn test_stamp_clips_to_image() {
        let ids = FootprintIds::new();
        let fp = footprint(&ids, &[(0, -3, 3), (5, 0, 0)]);

        let mut labels = LabelImage::new(
            BBox {
                x0: 0,
                x1: 1,
                y0: 0,
                y1: 1,
            },
            9,
        );
        labels.stamp(&fp, 1);
        assert_eq!(labels.labels(), ndarray::array![[1u32, 1], [9, 9]]);
    }

    #[test]
    fn test_stamp_empty() {
        let labels = stamp_many(&[], true);
        assert!(labels.region().is_empty());
        assert_eq!(labels.into_array().len(), 0);
    }
}
