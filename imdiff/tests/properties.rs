//! Metric properties over deterministic synthetic images.

mod common;

use common::assert_close;
use common::generators::{
    distort_border, distort_noise, distort_offset, gen_checkerboard, gen_gradient, gen_noise,
};
use imdiff::{
    BasicMetrics, CompareParams, Comparison, Metric, MetricError, MssimStatus, PlanarImage,
    basic_metrics, compute_mssim, make_difference_image,
};

const SIZES: [(usize, usize); 4] = [(11, 11), (16, 16), (23, 31), (64, 40)];

#[test]
fn identity() {
    for (seed, &(w, h)) in SIZES.iter().enumerate() {
        let a = gen_noise(w, h, 3, seed as u64);
        let m = basic_metrics(&a, &a, w, h, 3, 0).unwrap();
        assert_eq!(m, BasicMetrics { max: 0.0, mse: 0.0 });
        assert_eq!(m.psnr(), f64::INFINITY);

        let mssim = compute_mssim(&a, &a, w, h, 3, 0).unwrap();
        assert_close(mssim, 1.0, 1e-5, &format!("mssim {w}x{h}"));
    }
}

#[test]
fn symmetry() {
    let (w, h) = (40, 28);
    let a = gen_gradient(w, h, 3);
    let b = distort_noise(&a, 0.1, 7);

    for pad in [0, 2, 6] {
        let ab = basic_metrics(&a, &b, w, h, 3, pad).unwrap();
        let ba = basic_metrics(&b, &a, w, h, 3, pad).unwrap();
        assert_eq!(ab, ba, "pad {pad}");

        let ab = compute_mssim(&a, &b, w, h, 3, pad).unwrap();
        let ba = compute_mssim(&b, &a, w, h, 3, pad).unwrap();
        assert_close(ab, ba, 1e-9, &format!("mssim pad {pad}"));
    }
}

#[test]
fn mssim_range() {
    let (w, h) = (32, 32);
    let cases = [
        (gen_noise(w, h, 1, 1), gen_noise(w, h, 1, 2)),
        (
            gen_checkerboard(w, h, 1, 2, 0.0, 1.0),
            gen_checkerboard(w, h, 1, 2, 1.0, 0.0),
        ),
        (gen_gradient(w, h, 1), vec![0.5; w * h]),
        (vec![0.0; w * h], vec![1.0; w * h]),
    ];
    for (i, (a, b)) in cases.iter().enumerate() {
        let mssim = compute_mssim(a, b, w, h, 1, 0).unwrap();
        assert!(mssim.is_finite(), "case {i}: {mssim}");
        assert!((-1.0..=1.0).contains(&mssim), "case {i}: {mssim}");
    }
}

#[test]
fn more_noise_lowers_mssim() {
    let (w, h) = (48, 48);
    let a = gen_gradient(w, h, 3);
    let mut last = 1.0;
    for amplitude in [0.02, 0.05, 0.1, 0.2] {
        let b = distort_noise(&a, amplitude, 3);
        let mssim = compute_mssim(&a, &b, w, h, 3, 0).unwrap();
        assert!(mssim < last, "amplitude {amplitude}: {mssim} >= {last}");
        last = mssim;
    }
}

#[test]
fn psnr_infinite_only_for_zero_mse() {
    let (w, h) = (8, 8);
    let a = gen_noise(w, h, 1, 5);
    let mut b = a.clone();
    b[27] = if b[27] > 0.5 { b[27] - 0.1 } else { b[27] + 0.1 };
    let m = basic_metrics(&a, &b, w, h, 1, 0).unwrap();
    assert!(m.mse > 0.0);
    assert!(m.psnr().is_finite());
}

#[test]
fn pad_excludes_border_damage() {
    let (w, h) = (30, 30);
    let a = gen_gradient(w, h, 3);
    let b = distort_border(&a, w, h, 3, 1.0);

    let damaged = basic_metrics(&a, &b, w, h, 3, 2).unwrap();
    assert!(damaged.max > 0.0);
    let clean = basic_metrics(&a, &b, w, h, 3, 3).unwrap();
    assert_eq!(clean, BasicMetrics::default());

    // The window reaches 5 pixels past the pad
    assert!(compute_mssim(&a, &b, w, h, 3, 2).unwrap() < 1.0);
    let mssim = compute_mssim(&a, &b, w, h, 3, 3).unwrap();
    assert_close(mssim, 1.0, 1e-5, "mssim pad 3");
}

#[test]
fn boundary_rejection() {
    let (w, h) = (12, 12);
    let a = gen_noise(w, h, 3, 9);

    assert!(basic_metrics(&a, &a, w, h, 3, 5).is_ok());
    assert_eq!(
        basic_metrics(&a, &a, w, h, 3, 6),
        Err(MetricError::PadTooLarge {
            pad: 6,
            width: 12,
            height: 12
        })
    );

    assert!(compute_mssim(&a, &a, w, h, 3, 0).is_ok());
    assert!(matches!(
        compute_mssim(&a, &a, w, h, 3, 1),
        Err(MetricError::WindowTooLarge { pad: 1, .. })
    ));
}

#[test]
fn difference_image_of_equal_inputs_is_mid_gray() {
    let (w, h) = (9, 7);
    let b = gen_noise(w, h, 3, 11);
    for d in [0.25f32, 1.0, 20.0, 1000.0] {
        let mut a = b.clone();
        make_difference_image(&mut a, &b, w, h, 3, d).unwrap();
        assert!(a.iter().all(|&v| v == 0.5), "d = {d}");
    }
}

#[test]
fn offset_scenario_4x4() {
    let a = gen_noise(4, 4, 1, 13)
        .iter()
        .map(|v| v * 0.5)
        .collect::<Vec<_>>();
    for delta in [0.25f32, -0.125, 0.0625] {
        let b = distort_offset(&a, delta);
        let m = basic_metrics(&a, &b, 4, 4, 1, 0).unwrap();
        assert_close(f64::from(m.max), f64::from(delta.abs()), 1e-6, "max");
        assert_close(f64::from(m.mse), f64::from(delta * delta), 1e-6, "mse");
    }
}

#[test]
fn comparison_matches_engine() {
    let (w, h) = (20, 18);
    let a = PlanarImage::from_vec(gen_gradient(w, h, 3), w, h, 3).unwrap();
    let b = PlanarImage::from_vec(distort_noise(a.data(), 0.08, 21), w, h, 3).unwrap();

    let cmp = Comparison::compute(&a, &b, &CompareParams::new()).unwrap();

    let all = basic_metrics(a.data(), b.data(), w, h, 3, 0).unwrap();
    assert_eq!(cmp.combined.max, all.max);
    // Mean of per-channel MSEs equals the MSE over all samples
    assert_close(f64::from(cmp.combined.mse), f64::from(all.mse), 1e-6, "mse");

    let mssim = compute_mssim(a.data(), b.data(), w, h, 3, 0).unwrap();
    assert_eq!(cmp.mssim, MssimStatus::Value(mssim));

    let psnr_only = CompareParams::new().with_metric(Metric::Psnr);
    let cmp = Comparison::compute(&a, &b, &psnr_only).unwrap();
    assert_eq!(cmp.mssim, MssimStatus::Skipped);
}
