//! Simple threshold-based floating point asserts.
//!
//! We could grab various crates for this but we generally want thresholds bigger than epsilon, and this is both small
//! and simple.  Public so that the renderer's tests can compare whole signals.

#[track_caller]
pub fn close_floats64(a: f64, b: f64, threshold: f64) {
    let diff = (a - b).abs();
    assert!(
        diff < threshold,
        "{} vs {}, difference {} is greater than threshold {}",
        a,
        b,
        diff,
        threshold
    );
}

/// Compare two slices sample by sample.  Lengths must match exactly.
#[track_caller]
pub fn close_slices64(a: &[f64], b: &[f64], threshold: f64) {
    assert_eq!(a.len(), b.len(), "Slices differ in length");
    for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
        let diff = (x - y).abs();
        assert!(
            diff < threshold,
            "At index {}: {} vs {}, difference {} is greater than threshold {}",
            i,
            x,
            y,
            diff,
            threshold
        );
    }
}
