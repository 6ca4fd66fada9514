use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Number of samples produced for `iterations` halvings: `2^iterations + 1`.
///
/// # Panics
///
/// If `2^iterations` does not fit in a `usize`. [`HeightFieldConfig`]
/// validation caps iterations at [`MAX_ITERATIONS`].
///
/// [`HeightFieldConfig`]: crate::HeightFieldConfig
/// [`MAX_ITERATIONS`]: crate::MAX_ITERATIONS
pub fn sample_count(iterations: u32) -> usize {
    match 1usize.checked_shl(iterations) {
        Some(span) => span + 1,
        None => panic!("{iterations} midpoint iterations overflow usize"),
    }
}

/// Generate a 1D height profile by recursive midpoint displacement.
///
/// Returns `2^iterations + 1` values. The endpoints are exactly `first_y` and
/// `last_y`. Every interval with an interior index gets its midpoint set to
/// the mean of its endpoints plus an offset drawn by `sampler`, which receives
/// the current amplitude and should return a value in `[-amplitude, amplitude]`.
/// The top-level amplitude is `range / 2`; each halving multiplies it by
/// `roughness`. Recursion depth is bounded by `iterations`.
///
/// # Panics
///
/// Under the same condition as [`sample_count`].
pub fn midpoint_displacement_with<F>(
    iterations: u32,
    range: f32,
    first_y: f32,
    last_y: f32,
    roughness: f32,
    mut sampler: F,
) -> Vec<f32>
where
    F: FnMut(f32) -> f32,
{
    let count = sample_count(iterations);
    let mut values = vec![0.0; count];
    values[0] = first_y;
    values[count - 1] = last_y;
    displace(&mut values, 0, count - 1, range / 2.0, roughness, &mut sampler);
    values
}

/// Midpoint displacement with offsets drawn uniformly from `rng`.
pub fn midpoint_displacement<R: Rng + ?Sized>(
    iterations: u32,
    range: f32,
    first_y: f32,
    last_y: f32,
    roughness: f32,
    rng: &mut R,
) -> Vec<f32> {
    midpoint_displacement_with(iterations, range, first_y, last_y, roughness, |amplitude| {
        uniform_offset(rng, amplitude)
    })
}

/// Seeded midpoint displacement. The same arguments always yield the same values.
pub fn generate(
    iterations: u32,
    range: f32,
    first_y: f32,
    last_y: f32,
    roughness: f32,
    seed: u64,
) -> Vec<f32> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    midpoint_displacement(iterations, range, first_y, last_y, roughness, &mut rng)
}

/// Uniform value in `[-amplitude, amplitude)`. Zero amplitude draws nothing.
pub(crate) fn uniform_offset<R: Rng + ?Sized>(rng: &mut R, amplitude: f32) -> f32 {
    if amplitude <= 0.0 {
        return 0.0;
    }
    -amplitude + rng.r#gen::<f32>() * 2.0 * amplitude
}

fn displace<F>(
    values: &mut [f32],
    first: usize,
    last: usize,
    amplitude: f32,
    roughness: f32,
    sampler: &mut F,
) where
    F: FnMut(f32) -> f32,
{
    if last - first < 2 {
        return;
    }
    let mid = first + (last - first) / 2;
    values[mid] = (values[first] + values[last]) / 2.0 + sampler(amplitude);

    let next = amplitude * roughness;
    displace(values, first, mid, next, roughness, sampler);
    displace(values, mid, last, next, roughness, sampler);
}
