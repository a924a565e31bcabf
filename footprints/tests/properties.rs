//! Randomized checks of detection invariants on noise rasters.

use std::collections::{BTreeSet, VecDeque};

use footprints::{
    cull_peaks, find_footprint_at_point, find_footprints, find_peaks, stamp_many, Footprint,
    FootprintIds, ImageRaster, Raster,
};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SEEDS: [u64; 4] = [1, 7, 42, 2024];
const THRESHOLD: f64 = 0.6;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn noise_image(seed: u64, nrows: usize, ncols: usize) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    Array2::from_shape_fn((nrows, ncols), |_| rng.random::<f64>())
}

fn pixel_set(footprint: &Footprint) -> BTreeSet<(i32, i32)> {
    footprint.pixels().collect()
}

fn is_neighbor(a: (i32, i32), b: (i32, i32)) -> bool {
    a != b && (a.0 - b.0).abs() <= 1 && (a.1 - b.1).abs() <= 1
}

fn is_connected(pixels: &BTreeSet<(i32, i32)>) -> bool {
    let Some(&start) = pixels.iter().next() else {
        return true;
    };
    let mut seen = BTreeSet::from([start]);
    let mut queue = VecDeque::from([start]);
    while let Some((r, c)) = queue.pop_front() {
        for dr in -1..=1 {
            for dc in -1..=1 {
                let next = (r + dr, c + dc);
                if pixels.contains(&next) && seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
    }
    seen.len() == pixels.len()
}

#[test]
fn scan_partitions_significant_pixels() {
    init_logging();
    for seed in SEEDS {
        let image = noise_image(seed, 40, 50);
        let raster = ImageRaster::new(image.view()).with_origin(-7, 13);
        let ids = FootprintIds::new();
        let footprints = find_footprints(&raster, THRESHOLD, 1, &ids).unwrap();

        let sets: Vec<_> = footprints.iter().map(pixel_set).collect();
        let mut covered = BTreeSet::new();
        for set in &sets {
            assert!(is_connected(set), "seed {seed}: footprint not 8-connected");
            for &pixel in set {
                assert!(covered.insert(pixel), "seed {seed}: {pixel:?} in two footprints");
                let value = raster.value_at(pixel.0, pixel.1).unwrap();
                assert!(value >= THRESHOLD);
            }
        }

        let significant: BTreeSet<_> = (0..40)
            .flat_map(|r| (0..50).map(move |c| (r, c)))
            .filter(|&(r, c)| image[[r, c]] >= THRESHOLD)
            .map(|(r, c)| (r as i32 - 7, c as i32 + 13))
            .collect();
        assert_eq!(covered, significant, "seed {seed}");

        // No two footprints touch, otherwise they would be one.
        for (i, a) in sets.iter().enumerate() {
            for b in &sets[i + 1..] {
                assert!(!a.iter().any(|&p| b.iter().any(|&q| is_neighbor(p, q))));
            }
        }
    }
}

#[test]
fn derived_quantities_match_spans() {
    for seed in SEEDS {
        let image = noise_image(seed, 30, 30);
        let ids = FootprintIds::new();
        let mut footprints =
            find_footprints(&ImageRaster::new(image.view()), THRESHOLD, 1, &ids).unwrap();

        for footprint in footprints.iter_mut() {
            let npix = footprint.npix();
            let bbox = footprint.bbox();
            assert_eq!(npix, footprint.pixels().count());
            assert_eq!(footprint.set_npix(), npix);
            footprint.set_bbox();
            assert_eq!(footprint.bbox(), bbox);

            let rows: Vec<i32> = footprint.spans().iter().map(|s| s.row).collect();
            let mut sorted = rows.clone();
            sorted.sort_unstable();
            assert_eq!(rows, sorted, "scan output should be row-ordered");
        }
    }
}

#[test]
fn flood_fill_matches_scan() {
    init_logging();
    for seed in SEEDS {
        let image = noise_image(seed, 35, 45);
        let raster = ImageRaster::new(image.view()).with_origin(100, -20);
        let ids = FootprintIds::new();
        let footprints = find_footprints(&raster, THRESHOLD, 1, &ids).unwrap();

        for footprint in footprints.iter() {
            let expected = pixel_set(footprint);
            // Seed from the last pixel to exercise upward growth.
            let &(row, col) = expected.iter().next_back().unwrap();
            let local = find_footprint_at_point(&raster, THRESHOLD, &[], row, col, &ids).unwrap();
            assert_eq!(pixel_set(&local), expected, "seed {seed} at ({row}, {col})");
            assert_eq!(local.npix(), footprint.npix());
            assert_eq!(local.bbox(), footprint.bbox());
        }
    }
}

#[test]
fn npix_min_only_drops_small_footprints() {
    for seed in SEEDS {
        let image = noise_image(seed, 40, 40);
        let raster = ImageRaster::new(image.view());
        let all = find_footprints(&raster, THRESHOLD, 1, &FootprintIds::new()).unwrap();
        let large = find_footprints(&raster, THRESHOLD, 5, &FootprintIds::new()).unwrap();

        let expected: Vec<_> = all
            .iter()
            .filter(|fp| fp.npix() >= 5)
            .map(pixel_set)
            .collect();
        let actual: Vec<_> = large.iter().map(pixel_set).collect();
        assert_eq!(actual, expected, "seed {seed}");
    }
}

#[test]
fn brightest_peak_survives_culling() {
    init_logging();
    for seed in SEEDS {
        let image = noise_image(seed, 40, 40);
        let raster = ImageRaster::new(image.view());
        let ids = FootprintIds::new();
        let mut footprints = find_footprints(&raster, 0.3, 1, &ids).unwrap();

        for footprint in footprints.iter_mut() {
            find_peaks(&raster, footprint, 0.3).unwrap();
            let before: Vec<_> = footprint.peaks().to_vec();
            let brightest = before
                .iter()
                .map(|p| p.significance)
                .fold(f64::NEG_INFINITY, f64::max);

            let culled = cull_peaks(&raster, 0.1, footprint, 1.0, 0.0, &ids).unwrap();
            let after = footprint.peaks();
            assert_eq!(after.len() + culled, before.len());
            assert!(!after.is_empty());
            assert_eq!(after[0].significance, brightest);
            assert!(after.iter().all(|p| before.contains(p)));
        }
    }
}

#[test]
fn stamp_labels_every_pixel_once() {
    let image = noise_image(99, 25, 25);
    let ids = FootprintIds::new();
    let footprints = find_footprints(&ImageRaster::new(image.view()), THRESHOLD, 1, &ids).unwrap();
    let labels = stamp_many(&footprints, true);

    for (n, footprint) in footprints.iter().enumerate() {
        for (row, col) in footprint.pixels() {
            assert_eq!(labels.get(row, col), Some(n as u32 + 1));
        }
    }
    let labeled = labels.labels().iter().filter(|&&v| v != 0).count();
    let total: usize = footprints.iter().map(Footprint::npix).sum();
    assert_eq!(labeled, total);
}
