use crate::foundation::core::FrameIndex;

/// Loop progress in `[0, 1)` for a frame: `(frame mod total_steps) / total_steps`.
///
/// A zero `total_steps` is rejected by config validation; here it maps to `0.0`.
pub fn progress(frame: FrameIndex, total_steps: u64) -> f64 {
    if total_steps == 0 {
        return 0.0;
    }
    (frame.0 % total_steps) as f64 / total_steps as f64
}

/// Same as [`progress`] for a fractional frame time (used by motion-blur sub-samples).
pub fn progress_at(time: f64, total_steps: u64) -> f64 {
    if total_steps == 0 || !time.is_finite() {
        return 0.0;
    }
    let total = total_steps as f64;
    let p = time.rem_euclid(total) / total;
    // rem_euclid can round up to `total` for tiny negative inputs.
    if p >= 1.0 { 0.0 } else { p }
}

/// Sub-frame sample times for motion blur: `frame + k * spread / samples` for `k in 0..samples`.
///
/// `samples == 0` means motion blur is off and yields the frame time alone.
pub fn subframe_times(frame: FrameIndex, samples: u32, spread: f64) -> Vec<f64> {
    let base = frame.0 as f64;
    if samples == 0 {
        return vec![base];
    }
    let n = f64::from(samples);
    (0..samples)
        .map(|k| base + f64::from(k) * spread / n)
        .collect()
}
