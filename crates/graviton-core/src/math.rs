//! Numeric hygiene helpers for the audio path.
//!
//! The audio callback must never propagate a NaN or infinity: a single bad
//! sample poisons every feedback structure downstream. Values crossing a
//! trust boundary (host parameter reads, preset floats) pass through
//! [`sanitize`] before use.

/// Replace non-finite values with a fallback.
///
/// Host automation and preset files are untrusted inputs; a NaN written
/// into a comb filter never leaves it. Used on every parameter snapshot.
#[inline]
pub fn sanitize(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}

/// Linear interpolation between `a` and `b` by `t` in [0, 1].
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Convert decibels to linear gain.
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    libm::powf(10.0, db / 20.0)
}

/// Flush denormal floats to zero.
///
/// Denormals cause 100x slowdowns on some CPUs when feedback paths decay
/// toward zero. Applied at feedback points in the routing modules.
#[inline]
pub fn flush_denormal(value: f32) -> f32 {
    if value.abs() < 1e-20 { 0.0 } else { value }
}
