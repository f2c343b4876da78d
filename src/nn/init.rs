//! Weight initialization functions.
//!
//! Hypernetwork layers default to a truncated normal with stddev 0.1; the
//! SIREN stack uses the frequency-aware uniform schemes from the
//! literature.
//!
//! # References
//!
//! - Sitzmann, V., et al. (2020). Implicit neural representations with
//!   periodic activation functions. `NeurIPS`.

use crate::tensor::Tensor;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Truncated normal initialization.
///
/// Samples from N(0, std) and resamples anything beyond two standard
/// deviations — the hypernetwork default (stddev 0.1).
///
/// # Arguments
///
/// * `shape` - Shape of the tensor to initialize
/// * `std` - Standard deviation before truncation
/// * `seed` - Optional random seed for reproducibility
#[must_use]
pub fn truncated_normal(shape: &[usize], std: f32, seed: Option<u64>) -> Tensor {
    let numel: usize = shape.iter().product();
    let mut rng = seeded(seed);

    let data: Vec<f32> = (0..numel)
        .map(|_| loop {
            let z = sample_normal(&mut rng) * std;
            if z.abs() <= 2.0 * std {
                break z;
            }
        })
        .collect();

    Tensor::new(&data, shape)
}

/// SIREN first-layer initialization: U(-1/fan_in, 1/fan_in).
#[must_use]
pub fn siren_first_uniform(shape: &[usize], fan_in: usize, seed: Option<u64>) -> Tensor {
    let bound = 1.0 / fan_in as f32;
    uniform(shape, -bound, bound, seed)
}

/// SIREN hidden-layer initialization: U(-b, b) with
/// b = sqrt(6 / fan_in) / omega_0.
///
/// The omega_0 division keeps post-activation distributions stable as the
/// frequency scale grows.
#[must_use]
pub fn siren_uniform(shape: &[usize], fan_in: usize, omega_0: f32, seed: Option<u64>) -> Tensor {
    let bound = (6.0 / fan_in as f32).sqrt() / omega_0;
    uniform(shape, -bound, bound, seed)
}

/// Uniform distribution initialization.
///
/// Samples from U(low, high).
pub(crate) fn uniform(shape: &[usize], low: f32, high: f32, seed: Option<u64>) -> Tensor {
    let numel: usize = shape.iter().product();
    let mut rng = seeded(seed);

    let data: Vec<f32> = (0..numel).map(|_| rng.gen_range(low..high)).collect();

    Tensor::new(&data, shape)
}

fn seeded(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

/// One standard-normal draw via Box-Muller.
fn sample_normal(rng: &mut StdRng) -> f32 {
    let u1: f32 = rng.gen_range(0.0001_f32..1.0_f32);
    let u2: f32 = rng.gen_range(0.0_f32..1.0_f32);
    (-2.0_f32 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos()
}
