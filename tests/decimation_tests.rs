use glam::DVec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use viewbox_pipeline::config::DecimationConfig;
use viewbox_pipeline::data_types::{DataSeries, ImageGrid, Sample};
use viewbox_pipeline::decimation::{
    auto_factor, block_factor, clip_to_view, decimate_grid, decimate_peak, downsample, find_extrema_indices_f64,
    reduce_for_display, BucketGrid, DownsampleMethod, DynamicRangeLimiter, GridPolicy, GridValues,
    IncrementalDecimator, PixelCells, ReductionOptions,
};
use viewbox_pipeline::view_range::{AxisRange, ViewRange, Viewport};

fn sine_series(n: usize, x_max: f64) -> DataSeries {
    let x: Vec<f64> = (0..n).map(|i| i as f64 * x_max / (n - 1) as f64).collect();
    let y: Vec<f64> = x.iter().map(|v| v.sin()).collect();
    DataSeries::new(x, y)
}

/// Straightforward per-column min/max used as a reference.
fn brute_force(series: &DataSeries, grid: &BucketGrid) -> Vec<Option<(f64, f64)>> {
    let mut out = vec![None; grid.columns];
    for (&x, &y) in series.x().iter().zip(series.y().iter()) {
        if let Some(c) = grid.column_of(x) {
            let e = out[c].get_or_insert((y, y));
            e.0 = e.0.min(y);
            e.1 = e.1.max(y);
        }
    }
    out
}

#[test]
fn test_million_points_into_500_columns() {
    let series = sine_series(1_000_000, 1000.0);
    let config = DecimationConfig::default();
    let d = decimate_peak(&series, AxisRange::new(0.0, 1000.0), 500, &config).unwrap();

    assert!(d.len() <= 1000, "emitted {} points", d.len());
    assert_eq!(d.buckets().len(), 500);

    let reference = brute_force(&series, d.grid());
    for bucket in d.buckets() {
        let (lo, hi) = reference[bucket.column].unwrap();
        assert_eq!(bucket.min.y, lo);
        assert_eq!(bucket.max.y, hi);
    }

    // Every bucket extreme is present in the output.
    let ys: Vec<f64> = d.points().iter().map(|s| s.y).collect();
    for bucket in d.buckets() {
        assert!(ys.contains(&bucket.min.y));
        assert!(ys.contains(&bucket.max.y));
    }
}

#[test]
fn test_million_random_points_into_500_columns() {
    let mut rng = StdRng::seed_from_u64(17);
    let x: Vec<f64> = (0..1_000_000).map(|i| i as f64 * 1e-3).collect();
    let y: Vec<f64> = (0..1_000_000).map(|_| rng.random_range(-1.0..1.0)).collect();
    let series = DataSeries::new(x, y);
    let d = decimate_peak(&series, AxisRange::new(0.0, 1000.0), 500, &DecimationConfig::default()).unwrap();

    // Two extremes per column, plus the first and last sample of the series
    // kept verbatim even when they are not extremes of their column.
    assert!(d.len() <= 2 * 500 + 2, "emitted {} points", d.len());
    let points = d.points();
    assert_eq!(points[0], series.first().unwrap());
    assert_eq!(*points.last().unwrap(), series.last().unwrap());

    let reference = brute_force(&series, d.grid());
    for bucket in d.buckets() {
        let (lo, hi) = reference[bucket.column].unwrap();
        assert_eq!((bucket.min.y, bucket.max.y), (lo, hi));
    }
}

#[test]
fn test_output_bounded_by_columns() {
    let mut rng = StdRng::seed_from_u64(3);
    let y: Vec<f64> = (0..200_000).map(|_| rng.random_range(-1.0..1.0)).collect();
    let series = DataSeries::from_y(y);
    let d = decimate_peak(&series, AxisRange::new(0.0, 199_999.0), 300, &DecimationConfig::default()).unwrap();
    assert!(d.len() <= 2 * 300 + 2);
}

#[test]
fn test_deterministic_output() {
    let series = sine_series(100_000, 50.0);
    let config = DecimationConfig::default();
    let range = AxisRange::new(3.0, 41.5);
    let a = decimate_peak(&series, range, 777, &config).unwrap();
    let b = decimate_peak(&series, range, 777, &config).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_boundary_samples_verbatim() {
    let mut rng = StdRng::seed_from_u64(5);
    let y: Vec<f64> = (0..50_000).map(|_| rng.random_range(-10.0..10.0)).collect();
    let series = DataSeries::from_y(y);
    let d = decimate_peak(&series, AxisRange::new(-10.0, 60_000.0), 100, &DecimationConfig::default()).unwrap();
    let first = series.first().unwrap();
    let last = series.last().unwrap();
    assert!(d.points().contains(&first));
    assert!(d.points().contains(&last));
    assert_eq!(d.points()[0], first);
    assert_eq!(*d.points().last().unwrap(), last);
}

#[test]
fn test_temporal_order_within_bucket() {
    let x = vec![0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7];
    // Max comes before min in the first bucket.
    let y = vec![0.0, 9.0, 1.0, -9.0, 0.5, 0.5, 0.5, 0.5];
    let series = DataSeries::new(x, y);
    let d = decimate_peak(&series, AxisRange::new(0.05, 0.65), 1, &DecimationConfig::default()).unwrap();
    let ys: Vec<f64> = d.points().iter().map(|s| s.y).collect();
    assert_eq!(ys, vec![9.0, -9.0]);
    let indices: Vec<usize> = d.points().iter().map(|s| s.index).collect();
    assert!(indices.windows(2).all(|w| w[0] < w[1]));

    // Neighbours just outside the view are kept for line continuity.
    let (lead_in, lead_out) = d.neighbors();
    assert_eq!(lead_in.map(|s| s.index), Some(0));
    assert_eq!(lead_out.map(|s| s.index), Some(7));
}

#[test]
fn test_sparse_buckets_emit_raw_samples() {
    let series = DataSeries::new(vec![0.0, 0.5, 10.1, 10.2, 10.4, 10.6], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    let d = decimate_peak(&series, AxisRange::new(0.0, 11.0), 11, &DecimationConfig::default()).unwrap();
    let ys: Vec<f64> = d.points().iter().map(|s| s.y).collect();
    // Column 0 holds two samples (emitted as is); column 10 holds four
    // (min, max, plus the pinned last sample).
    assert_eq!(ys, vec![1.0, 2.0, 3.0, 6.0]);
}

#[test]
fn test_non_finite_samples() {
    let x = vec![0.0, 1.0, f64::NAN, 3.0, 4.0, 5.0, 6.0, 7.0];
    let y = vec![0.0, f64::NAN, 100.0, -5.0, 5.0, 1.0, 2.0, 3.0];
    let series = DataSeries::new(x, y);
    let d = decimate_peak(&series, AxisRange::new(0.0, 7.0), 1, &DecimationConfig::default()).unwrap();
    let b = d.buckets()[0];
    // The NaN-x sample is ignored, the NaN-y sample counts but is not an extreme.
    assert_eq!(b.count, 7);
    assert_eq!(b.finite, 6);
    assert_eq!(b.min.y, -5.0);
    assert_eq!(b.max.y, 5.0);
}

#[test]
fn test_unsorted_matches_brute_force() {
    let mut rng = StdRng::seed_from_u64(9);
    let x: Vec<f64> = (0..20_000).map(|_| rng.random_range(0.0..100.0)).collect();
    let y: Vec<f64> = (0..20_000).map(|_| rng.random_range(-1.0..1.0)).collect();
    let series = DataSeries::new(x, y);
    assert!(!series.is_monotonic_x());
    let d = decimate_peak(&series, AxisRange::new(10.0, 90.0), 64, &DecimationConfig::default()).unwrap();
    let reference = brute_force(&series, d.grid());
    for bucket in d.buckets() {
        let (lo, hi) = reference[bucket.column].unwrap();
        assert_eq!((bucket.min.y, bucket.max.y), (lo, hi));
    }
    assert_eq!(d.neighbors(), (None, None));
}

#[test]
fn test_sorted_and_scan_paths_agree() {
    // The same samples once with monotonic x and once with a NaN x, which
    // forces the linear scan.
    let n = 150_000;
    let x: Vec<f64> = (0..n).map(|i| i as f64 * 0.01).collect();
    let y: Vec<f64> = x.iter().map(|v| (v * 3.0).cos() * v).collect();
    let sorted = DataSeries::new(x.clone(), y.clone());

    let mut x2 = x.clone();
    x2.push(f64::NAN);
    let mut y2 = y.clone();
    y2.push(0.0);
    let scanned = DataSeries::new(x2, y2);

    let range = AxisRange::new(100.0, 1200.0);
    let config = DecimationConfig::default();
    let a = decimate_peak(&sorted, range, 640, &config).unwrap();
    let b = decimate_peak(&scanned, range, 640, &config).unwrap();
    assert_eq!(a.buckets(), b.buckets());
    assert_eq!(a.neighbors(), b.neighbors());
}

#[test]
fn test_incremental_equals_full() {
    let config = DecimationConfig::default();
    let range = AxisRange::new(0.0, 500.0);
    let mut series = DataSeries::new(Vec::new(), Vec::new());
    let mut inc = IncrementalDecimator::new(config.occupancy_threshold);

    let mut rng = StdRng::seed_from_u64(1);
    let mut t = 0.0;
    for _ in 0..40 {
        let chunk = rng.random_range(1..2_000);
        let xs: Vec<f64> = (0..chunk).map(|i| t + i as f64 * 0.01).collect();
        let ys: Vec<f64> = (0..chunk).map(|_| rng.random_range(-1.0..1.0)).collect();
        t += chunk as f64 * 0.01;
        series.extend(&xs, &ys);

        let incremental = inc.update(&series, range, 320).unwrap();
        let full = decimate_peak(&series, range, 320, &config).unwrap();
        assert_eq!(incremental, full);
        assert_eq!(inc.last_folded(), chunk);
    }
    assert_eq!(inc.rebuilds(), 1);
}

#[test]
fn test_incremental_rebuilds_on_change() {
    let mut series = sine_series(1000, 10.0);
    let mut inc = IncrementalDecimator::new(2);
    inc.update(&series, AxisRange::new(0.0, 10.0), 100).unwrap();
    inc.update(&series, AxisRange::new(0.0, 10.0), 100).unwrap();
    assert_eq!(inc.rebuilds(), 1);
    assert_eq!(inc.last_folded(), 0);

    // Pan.
    inc.update(&series, AxisRange::new(1.0, 11.0), 100).unwrap();
    assert_eq!(inc.rebuilds(), 2);

    // Replaced data.
    series.set_data(vec![0.0, 1.0], vec![5.0, 6.0]);
    let d = inc.update(&series, AxisRange::new(1.0, 11.0), 100).unwrap();
    assert_eq!(inc.rebuilds(), 3);
    assert_eq!(d.points(), &[Sample { index: 1, x: 1.0, y: 6.0 }]);
}

#[test]
fn test_append_order_checked_across_nan_x() {
    let mut series = DataSeries::new(vec![1.0, 2.0], vec![0.0, 0.0]);
    series.push(f64::NAN, 1.0);
    series.push(f64::NAN, 1.0);
    series.push(3.0, 1.0);
    assert!(series.is_monotonic_x());
    series.push(f64::NAN, 1.0);
    series.push(2.5, 1.0);
    assert!(!series.is_monotonic_x());
}

#[test]
fn test_rolling_window_slack() {
    let mut series = DataSeries::default().with_max_len(80);
    assert_eq!(series.max_len(), Some(80));
    for i in 0..90 {
        series.push(i as f64, 0.0);
    }
    // An eighth of the limit is tolerated before the front is dropped.
    assert_eq!(series.len(), 90);
    series.push(90.0, 0.0);
    assert_eq!(series.len(), 80);
    assert_eq!(series.first().unwrap().x, 11.0);
}

#[test]
fn test_rolling_series_rebuilds() {
    let mut series = DataSeries::new(Vec::new(), Vec::new()).with_max_len(100);
    let mut inc = IncrementalDecimator::new(2);
    let range = AxisRange::new(0.0, 1000.0);
    for i in 0..1000 {
        series.push(i as f64, (i % 7) as f64);
        let d = inc.update(&series, range, 50).unwrap();
        let full = decimate_peak(&series, range, 50, &DecimationConfig::default()).unwrap();
        assert_eq!(d, full);
    }
    assert!(series.len() <= 100 + 100 / 8);
    assert!(inc.rebuilds() > 1);
}

#[test]
fn test_grid_policies() {
    // 4x2 grid reduced by 2x2 blocks into 2x1.
    let values = vec![
        1.0, 2.0, 10.0, f64::NAN, //
        3.0, 4.0, 30.0, 20.0,
    ];
    let grid = ImageGrid::new(4, 2, values, ViewRange::new(0.0, 4.0, 0.0, 2.0));

    let mean = decimate_grid(&grid, 2, 1, GridPolicy::Mean);
    assert_eq!((mean.cols, mean.rows, mean.block), (2, 1, (2, 2)));
    assert_eq!(mean.values, GridValues::Single(vec![2.5, 20.0]));

    let max = decimate_grid(&grid, 2, 1, GridPolicy::Max);
    assert_eq!(max.values, GridValues::Single(vec![4.0, 30.0]));

    let min = decimate_grid(&grid, 2, 1, GridPolicy::Min);
    assert_eq!(min.values, GridValues::Single(vec![1.0, 10.0]));

    let env = decimate_grid(&grid, 2, 1, GridPolicy::MinMax);
    assert_eq!(
        env.values,
        GridValues::Envelope {
            min: vec![1.0, 10.0],
            max: vec![4.0, 30.0],
        }
    );

    let sub = decimate_grid(&grid, 2, 1, GridPolicy::Subsample);
    assert_eq!(sub.values, GridValues::Single(vec![1.0, 10.0]));
    assert_eq!(sub.rect, grid.rect());
}

#[test]
fn test_grid_partial_blocks_and_empty_blocks() {
    let grid = ImageGrid::new(3, 1, vec![f64::NAN, f64::NAN, 7.0], ViewRange::new(0.0, 3.0, 0.0, 1.0));
    assert_eq!(block_factor(3, 2), 2);
    let d = decimate_grid(&grid, 2, 1, GridPolicy::Mean);
    assert_eq!(d.cols, 2);
    assert!(d.get(0, 0).unwrap().is_nan());
    assert_eq!(d.get(1, 0), Some(7.0));

    // Already small enough: unchanged.
    let same = decimate_grid(&grid, 10, 10, GridPolicy::Max);
    assert_eq!(same.block, (1, 1));
    assert_eq!(same.cols, 3);
}

#[test]
fn test_fixed_factor_methods() {
    let x: Vec<f64> = (0..10).map(|i| i as f64).collect();
    let y = vec![0.0, 5.0, 1.0, 2.0, -3.0, 4.0, 6.0, 0.0, 9.0, 9.0];

    let sub = downsample(&x, &y, 3, DownsampleMethod::Subsample);
    assert_eq!(sub.x, vec![0.0, 3.0, 6.0, 9.0]);
    assert_eq!(sub.y, vec![0.0, 2.0, 6.0, 9.0]);

    let mean = downsample(&x, &y, 3, DownsampleMethod::Mean);
    assert_eq!(mean.x, vec![1.0, 4.0, 7.0]);
    assert_eq!(mean.y, vec![2.0, 1.0, 5.0]);

    let peak = downsample(&x, &y, 3, DownsampleMethod::Peak);
    assert_eq!(peak.x, vec![1.0, 1.0, 4.0, 4.0, 7.0, 7.0]);
    assert_eq!(peak.y, vec![5.0, 0.0, 4.0, -3.0, 9.0, 0.0]);

    let identity = downsample(&x, &y, 1, DownsampleMethod::Peak);
    assert_eq!(identity.y, y);
}

#[test]
fn test_auto_factor() {
    let x: Vec<f64> = (0..100_001).map(|i| i as f64).collect();
    // 10_000 visible samples over 100 px at 5 samples per px.
    assert_eq!(auto_factor(&x, &AxisRange::new(0.0, 10_000.0), 100.0, 5.0), 20);
    assert_eq!(auto_factor(&x, &AxisRange::new(0.0, 100.0), 100.0, 5.0), 1);
    assert_eq!(auto_factor(&[1.0], &AxisRange::new(0.0, 1.0), 100.0, 5.0), 1);
}

#[test]
fn test_clip_to_view_keeps_neighbours() {
    let x: Vec<f64> = (0..100).map(|i| i as f64).collect();
    let window = clip_to_view(&x, &AxisRange::new(10.5, 20.5), 1);
    assert_eq!(window, 10..22);
    assert_eq!(clip_to_view(&x, &AxisRange::new(-50.0, 500.0), 3), 0..100);
    assert_eq!(clip_to_view(&x, &AxisRange::new(200.0, 300.0), 1), 99..100);
}

#[test]
fn test_dynamic_range_limit() {
    let mut limiter = DynamicRangeLimiter::new(1e6, 3.0);
    let view = AxisRange::new(0.0, 1.0);

    // Data within the extended limit is never clipped.
    assert_eq!(limiter.window(&AxisRange::new(-1e3, 1e3), &view), None);
    // Data entirely off-screen is not clipped either.
    assert_eq!(limiter.window(&AxisRange::new(1e8, 1e12), &view), None);

    let huge = AxisRange::new(-1e15, 1e15);
    let w = limiter.window(&huge, &view).unwrap();
    assert_eq!((w.min, w.max), (-1e6, 1e6 + 1.0));

    // A small pan reuses the previous window.
    let panned = AxisRange::new(0.25, 1.25);
    assert_eq!(limiter.window(&huge, &panned), Some(w));

    // Zooming in by a lot moves it.
    let zoomed = AxisRange::new(0.0, 1e-3);
    let w2 = limiter.window(&huge, &zoomed).unwrap();
    assert_ne!(w2, w);
    assert!((w2.max - 1e3 - 1e-3).abs() < 1e-6);
}

#[test]
fn test_clip_y_applies_window() {
    let series = DataSeries::new(vec![0.0, 1.0, 2.0], vec![-1e300, 0.5, 1e300]);
    let mut d = decimate_peak(&series, AxisRange::new(0.0, 2.0), 3, &DecimationConfig::default()).unwrap();
    d.clip_y(&AxisRange::new(-10.0, 10.0));
    let ys: Vec<f64> = d.points().iter().map(|s| s.y).collect();
    assert_eq!(ys, vec![-10.0, 0.5, 10.0]);
}

#[test]
fn test_find_extrema_indices() {
    assert_eq!(find_extrema_indices_f64(&[3.0, f64::NAN, -1.0, 7.0, 7.0]), Some((2, 3)));
    assert_eq!(find_extrema_indices_f64(&[f64::NAN]), None);
}

#[test]
fn test_reduce_for_display_clips_then_downsamples() {
    let x: Vec<f64> = (0..1000).map(|i| i as f64).collect();
    let series = DataSeries::new(x.clone(), x);
    let options = ReductionOptions {
        factor: 4,
        method: DownsampleMethod::Subsample,
        clip_to_view: true,
        ..ReductionOptions::default()
    };
    let view = AxisRange::new(100.0, 200.0);
    let config = DecimationConfig::default();

    // Clipped to 96..204 (one run beyond each edge), then every 4th sample.
    let out = reduce_for_display(&series, &view, 500.0, &options, &config);
    assert_eq!(out.len(), 27);
    assert_eq!(out.first().unwrap().x, 96.0);
    assert_eq!(out.last().unwrap().x, 200.0);

    let unsorted = DataSeries::new(vec![5.0, 150.0, 1.0, 300.0], vec![0.0; 4]);
    let kept = reduce_for_display(
        &unsorted,
        &view,
        500.0,
        &ReductionOptions {
            clip_to_view: true,
            ..ReductionOptions::default()
        },
        &config,
    );
    assert_eq!(kept.x(), unsorted.x());
}

#[test]
fn test_pixel_cells_one_point_per_cell() {
    let mut cells = PixelCells::new(&Viewport::new(10.0, 20.0, 4.0, 3.0), 1.0);
    assert_eq!(cells.capacity(), 12);
    let mut points = vec![
        DVec2::new(10.2, 20.2),
        DVec2::new(10.8, 20.9),
        DVec2::new(11.5, 20.5),
        DVec2::new(f64::NAN, 21.0),
        // Past the edges: clamped into the corner cells.
        DVec2::new(5.0, 5.0),
        DVec2::new(14.0, 23.0),
        DVec2::new(13.5, 22.5),
    ];
    cells.thin(&mut points);
    assert_eq!(
        points,
        vec![DVec2::new(10.2, 20.2), DVec2::new(11.5, 20.5), DVec2::new(14.0, 23.0)]
    );

    cells.reset(&Viewport::new(10.0, 20.0, 4.0, 3.0), 1.0);
    assert!(cells.insert(DVec2::new(10.2, 20.2)));
}
