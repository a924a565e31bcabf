//! Footprints: connected pixel regions described as horizontal spans.
//!
//! A [`Footprint`] owns its [`Span`]s and [`Peak`]s and keeps two derived
//! quantities consistent with them: the pixel count and the bounding box.
//! All coordinates are absolute (raster origin already applied).

use std::cmp::Ordering;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering as AtomicOrdering};

use serde::{Deserialize, Serialize};

use crate::collection::{AllocationError, OwnedVec};

/// Identifier assigned to every footprint at construction.
pub type FootprintId = u32;

/// Source of unique footprint ids.
///
/// Every detection call takes the counter explicitly. Tests use a private
/// counter for reproducible ids; long-running processes can share
/// [`FootprintIds::global`] (or an `Arc<FootprintIds>`) across threads.
#[derive(Debug)]
pub struct FootprintIds {
    next: AtomicU32,
}

impl FootprintIds {
    /// A counter whose first id is 1.
    pub const fn new() -> Self {
        Self::starting_at(1)
    }

    pub const fn starting_at(first: FootprintId) -> Self {
        Self {
            next: AtomicU32::new(first),
        }
    }

    /// Process-wide counter.
    pub fn global() -> &'static FootprintIds {
        static GLOBAL: FootprintIds = FootprintIds::new();
        &GLOBAL
    }

    /// Hands out the next id.
    pub fn next_id(&self) -> FootprintId {
        self.next.fetch_add(1, AtomicOrdering::Relaxed)
    }

    /// The id the next call to [`next_id`](Self::next_id) will return.
    pub fn peek(&self) -> FootprintId {
        self.next.load(AtomicOrdering::Relaxed)
    }
}

impl Default for FootprintIds {
    fn default() -> Self {
        Self::new()
    }
}

/// Inclusive rectangle in absolute pixel coordinates.
///
/// `x` is the column axis, `y` the row axis. [`BBox::EMPTY`] marks a box
/// that contains nothing; growing it with the first pixel yields a 1x1 box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BBox {
    pub x0: i32,
    pub x1: i32,
    pub y0: i32,
    pub y1: i32,
}

impl BBox {
    pub const EMPTY: BBox = BBox {
        x0: i32::MAX,
        x1: i32::MIN,
        y0: i32::MAX,
        y1: i32::MIN,
    };

    pub fn is_empty(&self) -> bool {
        self.x0 > self.x1 || self.y0 > self.y1
    }

    pub fn width(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.x1 - self.x0 + 1) as usize
        }
    }

    pub fn height(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.y1 - self.y0 + 1) as usize
        }
    }

    pub fn contains(&self, row: i32, col: i32) -> bool {
        row >= self.y0 && row <= self.y1 && col >= self.x0 && col <= self.x1
    }

    /// Grow to include a span.
    pub fn include_span(&mut self, span: &Span) {
        self.x0 = self.x0.min(span.x0);
        self.x1 = self.x1.max(span.x1);
        self.y0 = self.y0.min(span.row);
        self.y1 = self.y1.max(span.row);
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            x0: self.x0.min(other.x0),
            x1: self.x1.max(other.x1),
            y0: self.y0.min(other.y0),
            y1: self.y1.max(other.y1),
        }
    }
}

impl fmt::Display for BBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "[empty]")
        } else {
            write!(
                f,
                "[cols {}..={}, rows {}..={}]",
                self.x0, self.x1, self.y0, self.y1
            )
        }
    }
}

/// A horizontal run of pixels `x0..=x1` in one row.
///
/// The derived ordering is `(row, x0, x1)`, which is the normalized span
/// order of a footprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Span {
    pub row: i32,
    pub x0: i32,
    pub x1: i32,
}

impl Span {
    pub fn new(row: i32, x0: i32, x1: i32) -> Self {
        debug_assert!(x0 <= x1, "span x0 {x0} must be <= x1 {x1}");
        Self { row, x0, x1 }
    }

    /// Number of pixels in the span.
    pub fn len(&self) -> usize {
        (self.x1 - self.x0 + 1) as usize
    }

    pub fn contains(&self, row: i32, col: i32) -> bool {
        self.row == row && col >= self.x0 && col <= self.x1
    }
}

/// A local maximum inside a footprint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    pub row: i32,
    pub col: i32,
    /// Ranking value, e.g. peak amplitude or S/N. Larger is brighter.
    pub significance: f64,
}

impl Peak {
    pub fn new(row: i32, col: i32, significance: f64) -> Self {
        Self {
            row,
            col,
            significance,
        }
    }
}

/// Brightest first.
fn by_descending_significance(a: &Peak, b: &Peak) -> Ordering {
    b.significance
        .partial_cmp(&a.significance)
        .unwrap_or(Ordering::Equal)
}

/// A connected region of pixels together with the peaks found in it.
#[derive(Debug, Clone)]
pub struct Footprint {
    id: FootprintId,
    spans: OwnedVec<Span>,
    bbox: BBox,
    npix: usize,
    peaks: OwnedVec<Peak>,
    source_region: BBox,
    normalized: bool,
}

impl Footprint {
    /// An empty footprint detected in a raster covering `source_region`.
    pub fn new(ids: &FootprintIds, source_region: BBox) -> Self {
        Self {
            id: ids.next_id(),
            spans: OwnedVec::default(),
            bbox: BBox::EMPTY,
            npix: 0,
            peaks: OwnedVec::default(),
            source_region,
            normalized: false,
        }
    }

    /// An empty footprint with room for `nspans` spans.
    pub fn with_capacity(
        ids: &FootprintIds,
        source_region: BBox,
        nspans: usize,
    ) -> Result<Self, AllocationError> {
        let spans = OwnedVec::new(nspans)?;
        Ok(Self {
            spans,
            ..Self::new(ids, source_region)
        })
    }

    pub fn id(&self) -> FootprintId {
        self.id
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn peaks(&self) -> &[Peak] {
        &self.peaks
    }

    pub fn bbox(&self) -> BBox {
        self.bbox
    }

    pub fn npix(&self) -> usize {
        self.npix
    }

    /// Frame of the raster this footprint was detected in.
    pub fn source_region(&self) -> BBox {
        self.source_region
    }

    pub fn is_normalized(&self) -> bool {
        self.normalized
    }

    /// True if the footprint has no spans.
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Appends a span, updating npix and bbox.
    pub fn add_span(&mut self, row: i32, x0: i32, x1: i32) -> Result<(), AllocationError> {
        let span = Span::new(row, x0, x1);
        self.spans.append(span)?;
        self.npix += span.len();
        self.bbox.include_span(&span);
        self.normalized = false;
        Ok(())
    }

    pub fn add_peak(&mut self, row: i32, col: i32, significance: f64) -> Result<(), AllocationError> {
        self.peaks.append(Peak::new(row, col, significance))?;
        self.normalized = false;
        Ok(())
    }

    /// Removes the peak at `index`, keeping the order of the rest.
    pub fn remove_peak(&mut self, index: usize) -> Option<Peak> {
        self.peaks.remove_at(index)
    }

    /// Recomputes the pixel count from the spans and returns it.
    pub fn set_npix(&mut self) -> usize {
        self.npix = self.spans.iter().map(Span::len).sum();
        self.npix
    }

    /// Recomputes the bounding box from the spans.
    pub fn set_bbox(&mut self) {
        let mut bbox = BBox::EMPTY;
        for span in self.spans.iter() {
            bbox.include_span(span);
        }
        self.bbox = bbox;
    }

    /// Sorts spans by `(row, x0, x1)` and peaks brightest first.
    ///
    /// Peak culling relies on this order: `peaks()[0]` is the peak that is
    /// never culled.
    pub fn normalize(&mut self) -> &mut Self {
        self.spans.sort_by(Span::cmp);
        self.peaks.sort_by(by_descending_significance);
        self.normalized = true;
        self
    }

    /// Whether the absolute pixel `(row, col)` belongs to the footprint.
    pub fn contains(&self, row: i32, col: i32) -> bool {
        if !self.bbox.contains(row, col) {
            return false;
        }
        if self.normalized {
            let start = self.spans.partition_point(|s| s.row < row);
            self.spans[start..]
                .iter()
                .take_while(|s| s.row == row)
                .any(|s| s.contains(row, col))
        } else {
            self.spans.iter().any(|s| s.contains(row, col))
        }
    }

    /// Every pixel as `(row, col)`, span by span.
    pub fn pixels(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.spans
            .iter()
            .flat_map(|s| (s.x0..=s.x1).map(move |col| (s.row, col)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region() -> BBox {
        BBox {
            x0: 0,
            x1: 99,
            y0: 0,
            y1: 99,
        }
    }

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let ids = FootprintIds::starting_at(10);
        let a = Footprint::new(&ids, region());
        let b = Footprint::new(&ids, region());
        assert_eq!(a.id(), 10);
        assert_eq!(b.id(), 11);
        assert_eq!(ids.peek(), 12);
    }

    #[test]
    fn test_empty_footprint() {
        let ids = FootprintIds::new();
        let fp = Footprint::new(&ids, region());
        assert!(fp.is_empty());
        assert_eq!(fp.npix(), 0);
        assert!(fp.bbox().is_empty());
        assert_eq!(fp.bbox(), BBox::EMPTY);
        assert!(!fp.contains(0, 0));
    }

    #[test]
    fn test_add_span_keeps_npix_and_bbox() {
        let ids = FootprintIds::new();
        let mut fp = Footprint::new(&ids, region());
        fp.add_span(5, 3, 7).unwrap();
        fp.add_span(4, 6, 6).unwrap();
        fp.add_span(6, 1, 2).unwrap();

        assert_eq!(fp.npix(), 5 + 1 + 2);
        assert_eq!(
            fp.bbox(),
            BBox {
                x0: 1,
                x1: 7,
                y0: 4,
                y1: 6
            }
        );
        assert_eq!(fp.set_npix(), 8);

        let before = fp.bbox();
        fp.set_bbox();
        assert_eq!(fp.bbox(), before);
    }

    #[test]
    fn test_normalize_orders_spans_and_peaks() {
        let ids = FootprintIds::new();
        let mut fp = Footprint::new(&ids, region());
        fp.add_span(2, 5, 6).unwrap();
        fp.add_span(1, 0, 3).unwrap();
        fp.add_span(2, 0, 1).unwrap();
        fp.add_peak(1, 1, 10.0).unwrap();
        fp.add_peak(2, 5, 50.0).unwrap();
        fp.add_peak(2, 0, 20.0).unwrap();
        assert!(!fp.is_normalized());

        fp.normalize();
        assert!(fp.is_normalized());
        assert_eq!(
            fp.spans(),
            &[Span::new(1, 0, 3), Span::new(2, 0, 1), Span::new(2, 5, 6)]
        );
        let sig: Vec<f64> = fp.peaks().iter().map(|p| p.significance).collect();
        assert_eq!(sig, vec![50.0, 20.0, 10.0]);

        fp.add_span(0, 0, 0).unwrap();
        assert!(!fp.is_normalized());
    }

    #[test]
    fn test_contains_and_pixels() {
        let ids = FootprintIds::new();
        let mut fp = Footprint::new(&ids, region());
        fp.add_span(3, 2, 4).unwrap();
        fp.add_span(4, 3, 3).unwrap();

        for normalized in [false, true] {
            if normalized {
                fp.normalize();
            }
            assert!(fp.contains(3, 2));
            assert!(fp.contains(3, 4));
            assert!(fp.contains(4, 3));
            assert!(!fp.contains(4, 2));
            assert!(!fp.contains(5, 3));
        }

        let pixels: Vec<(i32, i32)> = fp.pixels().collect();
        assert_eq!(pixels, vec![(3, 2), (3, 3), (3, 4), (4, 3)]);
    }

    #[test]
    fn test_remove_peak() {
        let ids = FootprintIds::new();
        let mut fp = Footprint::new(&ids, region());
        fp.add_peak(0, 0, 3.0).unwrap();
        fp.add_peak(0, 1, 2.0).unwrap();
        let removed = fp.remove_peak(0).unwrap();
        assert_eq!(removed.significance, 3.0);
        assert_eq!(fp.peaks().len(), 1);
        assert!(fp.remove_peak(5).is_none());
    }

    #[test]
    fn test_bbox_display() {
        assert_eq!(BBox::EMPTY.to_string(), "[empty]");
        assert_eq!(region().to_string(), "[cols 0..=99, rows 0..=99]");
        assert_eq!(region().width(), 100);
        assert_eq!(BBox::EMPTY.height(), 0);
    }
}
