//! Lifecycle contract tests.
//!
//! The native library may or may not be present on the test host; both
//! configurations are supported, so each test branches on
//! `is_available()` and asserts the contract of whichever state it
//! finds.

use buffer::{Complex64, Error, NdView, NdViewMut, source::Source};
use fftw::{
    Direction, FftwAlloc, FftwArray, PlannerFlags, is_available, plan_dft, plan_dft_c2r,
    plan_dft_r2c, version, wisdom,
};

const TOLERANCE: f64 = 1e-9;

#[test]
fn disabled_state_reports_unavailable_everywhere() {
    if is_available() {
        return;
    }
    assert_eq!(version(), None);
    assert_eq!(
        FftwArray::<f64>::with_alloc(FftwAlloc, &[8]).err(),
        Some(Error::LibraryUnavailable)
    );
    assert_eq!(wisdom::forget(), Err(Error::LibraryUnavailable));
    assert_eq!(wisdom::export_string(), Err(Error::LibraryUnavailable));

    let mut a = buffer::SliceArrayOwned::<Complex64>::alloc(&[8]).unwrap();
    let mut b = buffer::SliceArrayOwned::<Complex64>::alloc(&[8]).unwrap();
    let planned = plan_dft(&mut a, &mut b, Direction::Forward, PlannerFlags::ESTIMATE);
    assert!(matches!(planned, Err(Error::LibraryUnavailable)));
}

#[test]
fn version_looks_like_a_version() {
    let Some(v) = version() else {
        assert!(!is_available());
        return;
    };
    assert!(v.starts_with(|c: char| c.is_ascii_digit()), "version: {v}");
}

#[test]
fn complex_roundtrip_recovers_the_signal() {
    if !is_available() {
        return;
    }
    let n = 64usize;
    let mut signal = vec![Complex64::ZERO; n];
    Source::new([7u8; 32]).fill_complex(&mut signal, -1.0, 1.0);

    let mut time = FftwArray::<Complex64>::with_alloc(FftwAlloc, &[n]).unwrap();
    let mut freq = FftwArray::<Complex64>::with_alloc(FftwAlloc, &[n]).unwrap();
    time.as_mut_slice().copy_from_slice(&signal);

    plan_dft(&mut time, &mut freq, Direction::Forward, PlannerFlags::ESTIMATE)
        .unwrap()
        .unwrap()
        .execute();
    plan_dft(&mut freq, &mut time, Direction::Backward, PlannerFlags::ESTIMATE)
        .unwrap()
        .unwrap()
        .execute();

    // The native transform is unnormalized: forward then backward
    // scales by n.
    let scale = n as f64;
    for (got, expected) in time.as_slice().iter().zip(&signal) {
        assert!((got.re / scale - expected.re).abs() < TOLERANCE);
        assert!((got.im / scale - expected.im).abs() < TOLERANCE);
    }
}

#[test]
fn real_transform_uses_the_half_spectrum() {
    if !is_available() {
        return;
    }
    let n = 32usize;
    let mut signal = vec![0.0f64; n];
    Source::new([9u8; 32]).fill_f64(&mut signal, -1.0, 1.0);

    let mut time = FftwArray::<f64>::with_alloc(FftwAlloc, &[n]).unwrap();
    let mut freq = FftwArray::<Complex64>::with_alloc(FftwAlloc, &[n / 2 + 1]).unwrap();
    time.as_mut_slice().copy_from_slice(&signal);

    plan_dft_r2c(&mut time, &mut freq, PlannerFlags::ESTIMATE)
        .unwrap()
        .unwrap()
        .execute();
    // Bin 0 of a real signal is the (real) sum of the samples.
    let sum: f64 = signal.iter().sum();
    assert!((freq[0].re - sum).abs() < TOLERANCE);
    assert!(freq[0].im.abs() < TOLERANCE);

    let mut back = FftwArray::<f64>::with_alloc(FftwAlloc, &[n]).unwrap();
    plan_dft_c2r(&mut freq, &mut back, PlannerFlags::ESTIMATE)
        .unwrap()
        .unwrap()
        .execute();
    let scale = n as f64;
    for (got, expected) in back.as_slice().iter().zip(&signal) {
        assert!((got / scale - expected).abs() < TOLERANCE);
    }
}

#[test]
fn mismatched_shapes_are_rejected_before_planning() {
    if !is_available() {
        return;
    }
    let mut a = FftwArray::<Complex64>::with_alloc(FftwAlloc, &[8]).unwrap();
    let mut b = FftwArray::<Complex64>::with_alloc(FftwAlloc, &[9]).unwrap();
    let planned = plan_dft(&mut a, &mut b, Direction::Forward, PlannerFlags::ESTIMATE);
    assert!(matches!(planned, Err(Error::LengthMismatch { .. })));

    let mut real = FftwArray::<f64>::with_alloc(FftwAlloc, &[8]).unwrap();
    let mut halfspec = FftwArray::<Complex64>::with_alloc(FftwAlloc, &[8]).unwrap();
    let planned = plan_dft_r2c(&mut real, &mut halfspec, PlannerFlags::ESTIMATE);
    assert!(matches!(planned, Err(Error::LengthMismatch { .. })));
}

#[test]
fn wisdom_survives_a_string_roundtrip() {
    if !is_available() {
        return;
    }
    // Deposit some wisdom first so the export has content.
    let mut a = FftwArray::<Complex64>::with_alloc(FftwAlloc, &[16]).unwrap();
    let mut b = FftwArray::<Complex64>::with_alloc(FftwAlloc, &[16]).unwrap();
    plan_dft(&mut a, &mut b, Direction::Forward, PlannerFlags::MEASURE)
        .unwrap()
        .unwrap()
        .execute();

    let exported = wisdom::export_string().unwrap();
    assert!(exported.contains("fftw_wisdom"), "exported: {exported}");

    wisdom::forget().unwrap();
    assert!(wisdom::import_from_string(&exported).unwrap());

    // With wisdom restored, a wisdom-only probe for the same geometry
    // succeeds without planning work.
    let probed = plan_dft(
        &mut a,
        &mut b,
        Direction::Forward,
        PlannerFlags::MEASURE | PlannerFlags::WISDOM_ONLY,
    )
    .unwrap();
    assert!(probed.is_some());
}
