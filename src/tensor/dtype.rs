//! Numeric precision boundary.
//!
//! Internal computation is always `f32`; callers may declare a lower
//! *variable* precision for inputs and outputs. Casting to `F16` rounds
//! every element through IEEE half precision, so downstream consumers see
//! exactly the values a half-precision store would hold.

use half::f16;

use super::Tensor;

/// Numeric dtype at the crate boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DType {
    /// IEEE 754 half precision.
    F16,
    /// IEEE 754 single precision (the internal compute type).
    #[default]
    F32,
}

/// Variable/compute dtype pair for a model.
///
/// Mirrors a mixed-precision policy: variables (inputs, outputs, stored
/// parameters) may be half precision while all contractions run in `f32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MixedPolicy {
    /// Externally visible dtype of inputs and outputs.
    pub variable: DType,
    /// Internal contraction dtype. Always `F32` in this crate.
    pub compute: DType,
}

impl MixedPolicy {
    /// Full single precision on both sides of the boundary.
    #[must_use]
    pub fn float32() -> Self {
        Self {
            variable: DType::F32,
            compute: DType::F32,
        }
    }

    /// Half-precision variables with `f32` compute.
    #[must_use]
    pub fn mixed_float16() -> Self {
        Self {
            variable: DType::F16,
            compute: DType::F32,
        }
    }

    /// Cast an external input up to the compute dtype.
    ///
    /// Storage is `f32`, so this is a value-preserving widening; it exists
    /// so both ends of the precision boundary are explicit in evaluator
    /// code.
    #[must_use]
    pub fn cast_to_compute(&self, t: &Tensor) -> Tensor {
        t.clone()
    }

    /// Cast a result down to the declared variable dtype.
    #[must_use]
    pub fn cast_to_variable(&self, t: &Tensor) -> Tensor {
        t.cast(self.variable)
    }
}

impl Tensor {
    /// Cast the tensor to the given dtype.
    ///
    /// `F32` is the identity. `F16` rounds every element through half
    /// precision and widens back, so the result is exactly representable
    /// in `f16`.
    #[must_use]
    pub fn cast(&self, dtype: DType) -> Tensor {
        match dtype {
            DType::F32 => self.clone(),
            DType::F16 => {
                let data: Vec<f32> = self
                    .data()
                    .iter()
                    .map(|&v| f16::from_f32(v).to_f32())
                    .collect();
                Tensor::new(&data, self.shape())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cast_f32_is_identity() {
        let t = Tensor::from_slice(&[0.1, 0.2, 0.3]);
        assert_eq!(t.cast(DType::F32).data(), t.data());
    }

    #[test]
    fn test_cast_f16_rounds() {
        // 0.1 is not representable in f16; the cast must move the value.
        let t = Tensor::from_slice(&[0.1]);
        let c = t.cast(DType::F16);
        assert_ne!(c.data()[0], 0.1_f32);
        assert!((c.data()[0] - 0.1).abs() < 1e-3);
    }

    #[test]
    fn test_cast_f16_idempotent() {
        let t = Tensor::from_slice(&[0.1, -2.7, 1000.5]);
        let once = t.cast(DType::F16);
        let twice = once.cast(DType::F16);
        assert_eq!(once.data(), twice.data());
    }

    #[test]
    fn test_policy_variable_cast() {
        let p = MixedPolicy::mixed_float16();
        let t = Tensor::from_slice(&[0.1]);
        assert_ne!(p.cast_to_variable(&t).data()[0], 0.1_f32);

        let full = MixedPolicy::float32();
        assert_eq!(full.cast_to_variable(&t).data()[0], 0.1_f32);
    }
}
