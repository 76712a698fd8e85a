use crate::error::{AppError, Result};
use rand::Rng;

const START_FRACTION: f64 = 0.2;
const END_FRACTION: f64 = 0.8;

/// Pick `count` random whole-second offsets in `[floor(0.2 * duration), floor(0.8 * duration))`.
///
/// Offsets are drawn independently, so repeats are possible.
pub fn sample_timestamps<R: Rng>(
    duration: f64,
    count: usize,
    rng: &mut R,
) -> Result<Vec<u64>> {
    if !duration.is_finite() || duration <= 0.0 {
        return Err(AppError::VideoTooShort(duration));
    }

    let start = (duration * START_FRACTION).floor() as u64;
    let end = (duration * END_FRACTION).floor() as u64;
    if end <= start {
        return Err(AppError::VideoTooShort(duration));
    }

    Ok((0..count).map(|_| rng.gen_range(start..end)).collect())
}
