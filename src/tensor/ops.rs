//! Tensor operations.
//!
//! All operations are pure: they compute a fresh result tensor and leave
//! their operands untouched. The batched contractions at the bottom are the
//! workhorses of hypernetwork evaluation — every sample in the batch is
//! contracted against its *own* weight tensor, expressed as a loop of
//! ordinary 2-D products over the leading batch axis so the host can
//! parallelize internally.

use super::Tensor;

// ============================================================================
// Element-wise Operations
// ============================================================================

impl Tensor {
    /// Element-wise addition: z = self + other
    #[must_use]
    pub fn add(&self, other: &Tensor) -> Tensor {
        assert_eq!(
            self.shape(),
            other.shape(),
            "add shape mismatch: {:?} vs {:?}",
            self.shape(),
            other.shape()
        );
        let data: Vec<f32> = self
            .data()
            .iter()
            .zip(other.data().iter())
            .map(|(&a, &b)| a + b)
            .collect();

        Tensor::new(&data, self.shape())
    }

    /// Element-wise subtraction: z = self - other
    #[must_use]
    pub fn sub(&self, other: &Tensor) -> Tensor {
        assert_eq!(
            self.shape(),
            other.shape(),
            "sub shape mismatch: {:?} vs {:?}",
            self.shape(),
            other.shape()
        );
        let data: Vec<f32> = self
            .data()
            .iter()
            .zip(other.data().iter())
            .map(|(&a, &b)| a - b)
            .collect();

        Tensor::new(&data, self.shape())
    }

    /// Element-wise multiplication: z = self * other
    #[must_use]
    pub fn mul(&self, other: &Tensor) -> Tensor {
        assert_eq!(
            self.shape(),
            other.shape(),
            "mul shape mismatch: {:?} vs {:?}",
            self.shape(),
            other.shape()
        );
        let data: Vec<f32> = self
            .data()
            .iter()
            .zip(other.data().iter())
            .map(|(&a, &b)| a * b)
            .collect();

        Tensor::new(&data, self.shape())
    }

    /// Scalar multiplication: z = self * scalar
    #[must_use]
    pub fn mul_scalar(&self, scalar: f32) -> Tensor {
        let data: Vec<f32> = self.data().iter().map(|&a| a * scalar).collect();
        Tensor::new(&data, self.shape())
    }
}

// ============================================================================
// Activations
// ============================================================================

impl Tensor {
    /// Rectified linear unit: max(0, x)
    #[must_use]
    pub fn relu(&self) -> Tensor {
        let data: Vec<f32> = self.data().iter().map(|&a| a.max(0.0)).collect();
        Tensor::new(&data, self.shape())
    }

    /// Logistic sigmoid: 1 / (1 + exp(-x))
    #[must_use]
    pub fn sigmoid(&self) -> Tensor {
        let data: Vec<f32> = self
            .data()
            .iter()
            .map(|&a| 1.0 / (1.0 + (-a).exp()))
            .collect();
        Tensor::new(&data, self.shape())
    }

    /// Hyperbolic tangent.
    #[must_use]
    pub fn tanh_(&self) -> Tensor {
        let data: Vec<f32> = self.data().iter().map(|&a| a.tanh()).collect();
        Tensor::new(&data, self.shape())
    }

    /// Gaussian error linear unit (tanh approximation).
    #[must_use]
    pub fn gelu(&self) -> Tensor {
        let data: Vec<f32> = self
            .data()
            .iter()
            .map(|&a| {
                let inner = (2.0_f32 / std::f32::consts::PI).sqrt() * (a + 0.044_715 * a.powi(3));
                0.5 * a * (1.0 + inner.tanh())
            })
            .collect();
        Tensor::new(&data, self.shape())
    }

    /// Element-wise sine.
    ///
    /// Combined with an `omega_0` pre-activation scale this is the
    /// implicit-representation nonlinearity (Sitzmann et al., 2020).
    #[must_use]
    pub fn sin(&self) -> Tensor {
        let data: Vec<f32> = self.data().iter().map(|&a| a.sin()).collect();
        Tensor::new(&data, self.shape())
    }
}

// ============================================================================
// Linear Algebra
// ============================================================================

impl Tensor {
    /// Matrix multiplication: z = self @ other
    ///
    /// 2-D tensors only; for batched per-sample contraction see
    /// [`Tensor::batched_vecmat`] and [`Tensor::batched_matvec`].
    #[must_use]
    pub fn matmul(&self, other: &Tensor) -> Tensor {
        assert_eq!(self.ndim(), 2, "matmul requires 2D tensors");
        assert_eq!(other.ndim(), 2, "matmul requires 2D tensors");

        let (m, k1) = (self.shape()[0], self.shape()[1]);
        let (k2, n) = (other.shape()[0], other.shape()[1]);
        assert_eq!(k1, k2, "matmul dimension mismatch: {k1} vs {k2}");

        let a = self.data();
        let b = other.data();
        let mut data = vec![0.0f32; m * n];
        for i in 0..m {
            for k in 0..k1 {
                let aik = a[i * k1 + k];
                if aik == 0.0 {
                    continue;
                }
                for j in 0..n {
                    data[i * n + j] += aik * b[k * n + j];
                }
            }
        }

        Tensor::new(&data, &[m, n])
    }

    /// Transpose a 2D tensor.
    #[must_use]
    pub fn transpose(&self) -> Tensor {
        assert_eq!(self.ndim(), 2, "transpose requires 2D tensor");

        let (rows, cols) = (self.shape()[0], self.shape()[1]);
        let mut data = vec![0.0; rows * cols];

        for i in 0..rows {
            for j in 0..cols {
                data[j * rows + i] = self.data()[i * cols + j];
            }
        }

        Tensor::new(&data, &[cols, rows])
    }

    /// Broadcast addition: z = matrix + vector (broadcasts over rows).
    ///
    /// # Shape
    ///
    /// - self: `[N, M]` (2D matrix)
    /// - other: `[M]` (1D vector)
    /// - output: `[N, M]`
    #[must_use]
    pub fn broadcast_add(&self, other: &Tensor) -> Tensor {
        assert_eq!(self.ndim(), 2, "broadcast_add requires 2D matrix");
        assert_eq!(other.ndim(), 1, "broadcast_add requires 1D vector");
        assert_eq!(
            self.shape()[1],
            other.shape()[0],
            "Matrix columns {} must match vector length {}",
            self.shape()[1],
            other.shape()[0]
        );

        let (rows, cols) = (self.shape()[0], self.shape()[1]);
        let mut data = vec![0.0; rows * cols];

        for i in 0..rows {
            for j in 0..cols {
                data[i * cols + j] = self.data()[i * cols + j] + other.data()[j];
            }
        }

        Tensor::new(&data, self.shape())
    }

    /// Reshape tensor to a new shape (view).
    ///
    /// The total number of elements must remain the same.
    #[must_use]
    pub fn view(&self, new_shape: &[usize]) -> Tensor {
        let old_numel: usize = self.shape().iter().product();
        let new_numel: usize = new_shape.iter().product();
        assert_eq!(
            old_numel, new_numel,
            "view: number of elements must match ({old_numel} vs {new_numel})"
        );

        Tensor::new(self.data(), new_shape)
    }

    /// Slice a contiguous column range out of a 2D tensor.
    ///
    /// Returns `[rows, end - start]`. This is how a flat per-sample
    /// parameter matrix `[batch, po_dim]` is carved into named slices.
    #[must_use]
    pub fn slice_cols(&self, start: usize, end: usize) -> Tensor {
        assert_eq!(self.ndim(), 2, "slice_cols requires 2D tensor");
        let (rows, cols) = (self.shape()[0], self.shape()[1]);
        assert!(
            start <= end && end <= cols,
            "slice_cols range {start}..{end} out of bounds for {cols} columns"
        );

        let width = end - start;
        let mut data = Vec::with_capacity(rows * width);
        for r in 0..rows {
            data.extend_from_slice(&self.data()[r * cols + start..r * cols + end]);
        }

        Tensor::new(&data, &[rows, width])
    }
}

// ============================================================================
// Batched Contractions
// ============================================================================

impl Tensor {
    /// Per-sample vector-matrix contraction (`ai,aij->aj`).
    ///
    /// Sample `a`'s input row is multiplied by sample `a`'s own weight
    /// matrix — the defining operation of a hypernetwork-conditioned layer.
    ///
    /// # Shape
    ///
    /// - self: `[batch, i]`
    /// - weights: `[batch, i, j]`
    /// - output: `[batch, j]`
    #[must_use]
    pub fn batched_vecmat(&self, weights: &Tensor) -> Tensor {
        assert_eq!(self.ndim(), 2, "batched_vecmat input must be [batch, i]");
        assert_eq!(
            weights.ndim(),
            3,
            "batched_vecmat weights must be [batch, i, j]"
        );
        let (batch, i) = (self.shape()[0], self.shape()[1]);
        assert_eq!(
            weights.shape()[0],
            batch,
            "batch mismatch: {} vs {}",
            weights.shape()[0],
            batch
        );
        assert_eq!(
            weights.shape()[1],
            i,
            "contraction dim mismatch: {} vs {}",
            weights.shape()[1],
            i
        );

        let j = weights.shape()[2];
        let x = self.data();
        let w = weights.data();
        let mut data = vec![0.0f32; batch * j];
        for a in 0..batch {
            let x_row = &x[a * i..(a + 1) * i];
            let w_mat = &w[a * i * j..(a + 1) * i * j];
            let out_row = &mut data[a * j..(a + 1) * j];
            for (k, &xk) in x_row.iter().enumerate() {
                if xk == 0.0 {
                    continue;
                }
                for (out, &wkj) in out_row.iter_mut().zip(&w_mat[k * j..(k + 1) * j]) {
                    *out += xk * wkj;
                }
            }
        }

        Tensor::new(&data, &[batch, j])
    }

    /// Per-sample matrix-vector contraction (`aij,aj->ai`).
    ///
    /// Contracts a per-sample basis matrix against a per-sample coefficient
    /// vector over the trailing axis.
    ///
    /// # Shape
    ///
    /// - self: `[batch, i, j]`
    /// - coeffs: `[batch, j]`
    /// - output: `[batch, i]`
    #[must_use]
    pub fn batched_matvec(&self, coeffs: &Tensor) -> Tensor {
        assert_eq!(self.ndim(), 3, "batched_matvec input must be [batch, i, j]");
        assert_eq!(coeffs.ndim(), 2, "batched_matvec coeffs must be [batch, j]");
        let (batch, i, j) = (self.shape()[0], self.shape()[1], self.shape()[2]);
        assert_eq!(
            coeffs.shape()[0],
            batch,
            "batch mismatch: {} vs {}",
            coeffs.shape()[0],
            batch
        );
        assert_eq!(
            coeffs.shape()[1],
            j,
            "contraction dim mismatch: {} vs {}",
            coeffs.shape()[1],
            j
        );

        let m = self.data();
        let c = coeffs.data();
        let mut data = vec![0.0f32; batch * i];
        for a in 0..batch {
            let c_row = &c[a * j..(a + 1) * j];
            for r in 0..i {
                let m_row = &m[a * i * j + r * j..a * i * j + (r + 1) * j];
                data[a * i + r] = m_row.iter().zip(c_row).map(|(&mv, &cv)| mv * cv).sum();
            }
        }

        Tensor::new(&data, &[batch, i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_sub_mul() {
        let a = Tensor::new(&[1.0, 2.0, 3.0, 4.0], &[2, 2]);
        let b = Tensor::new(&[10.0, 20.0, 30.0, 40.0], &[2, 2]);

        assert_eq!(a.add(&b).data(), &[11.0, 22.0, 33.0, 44.0]);
        assert_eq!(b.sub(&a).data(), &[9.0, 18.0, 27.0, 36.0]);
        assert_eq!(a.mul(&b).data(), &[10.0, 40.0, 90.0, 160.0]);
        assert_eq!(a.mul_scalar(0.5).data(), &[0.5, 1.0, 1.5, 2.0]);
    }

    #[test]
    fn test_relu() {
        let t = Tensor::from_slice(&[-1.0, 0.0, 2.0]);
        assert_eq!(t.relu().data(), &[0.0, 0.0, 2.0]);
    }

    #[test]
    fn test_sigmoid_midpoint() {
        let t = Tensor::from_slice(&[0.0]);
        assert!((t.sigmoid().data()[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_sin() {
        let t = Tensor::from_slice(&[0.0, std::f32::consts::FRAC_PI_2]);
        let s = t.sin();
        assert!(s.data()[0].abs() < 1e-6);
        assert!((s.data()[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_matmul_2x2() {
        let a = Tensor::new(&[1.0, 2.0, 3.0, 4.0], &[2, 2]);
        let b = Tensor::new(&[5.0, 6.0, 7.0, 8.0], &[2, 2]);
        let c = a.matmul(&b);

        // [[1*5+2*7, 1*6+2*8], [3*5+4*7, 3*6+4*8]]
        assert_eq!(c.data(), &[19.0, 22.0, 43.0, 50.0]);
    }

    #[test]
    fn test_transpose() {
        let a = Tensor::new(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
        let t = a.transpose();
        assert_eq!(t.shape(), &[3, 2]);
        assert_eq!(t.data(), &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }

    #[test]
    fn test_broadcast_add() {
        let m = Tensor::new(&[1.0, 2.0, 3.0, 4.0], &[2, 2]);
        let v = Tensor::from_slice(&[10.0, 20.0]);
        assert_eq!(m.broadcast_add(&v).data(), &[11.0, 22.0, 13.0, 24.0]);
    }

    #[test]
    fn test_view() {
        let a = Tensor::new(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
        let b = a.view(&[3, 2]);
        assert_eq!(b.shape(), &[3, 2]);
        assert_eq!(b.data(), a.data());
    }

    #[test]
    fn test_slice_cols() {
        let a = Tensor::new(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
        let s = a.slice_cols(1, 3);
        assert_eq!(s.shape(), &[2, 2]);
        assert_eq!(s.data(), &[2.0, 3.0, 5.0, 6.0]);
    }

    #[test]
    fn test_slice_cols_empty() {
        let a = Tensor::new(&[1.0, 2.0, 3.0, 4.0], &[2, 2]);
        let s = a.slice_cols(1, 1);
        assert_eq!(s.shape(), &[2, 0]);
    }

    #[test]
    fn test_batched_vecmat_identity() {
        // Two samples, each with its own 2x2 weight matrix.
        let x = Tensor::new(&[1.0, 2.0, 3.0, 4.0], &[2, 2]);
        // Sample 0: identity; sample 1: swap.
        let w = Tensor::new(
            &[1.0, 0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0],
            &[2, 2, 2],
        );
        let y = x.batched_vecmat(&w);

        assert_eq!(y.shape(), &[2, 2]);
        assert_eq!(&y.data()[0..2], &[1.0, 2.0]); // identity
        assert_eq!(&y.data()[2..4], &[4.0, 3.0]); // swapped
    }

    #[test]
    fn test_batched_vecmat_differs_per_sample() {
        // Same input row for both samples, different weights: outputs differ.
        let x = Tensor::new(&[1.0, 1.0, 1.0, 1.0], &[2, 2]);
        let w = Tensor::new(
            &[1.0, 0.0, 0.0, 1.0, 2.0, 0.0, 0.0, 2.0],
            &[2, 2, 2],
        );
        let y = x.batched_vecmat(&w);
        assert_eq!(&y.data()[0..2], &[1.0, 1.0]);
        assert_eq!(&y.data()[2..4], &[2.0, 2.0]);
    }

    #[test]
    fn test_batched_matvec() {
        // basis [1, 2, 3] with matrix [[1,0,1],[0,1,0]], coeffs [1,2,3]
        let phi = Tensor::new(&[1.0, 0.0, 1.0, 0.0, 1.0, 0.0], &[1, 2, 3]);
        let c = Tensor::new(&[1.0, 2.0, 3.0], &[1, 3]);
        let u = phi.batched_matvec(&c);

        assert_eq!(u.shape(), &[1, 2]);
        assert_eq!(u.data(), &[4.0, 2.0]);
    }

    #[test]
    fn test_contraction_agreement() {
        // batched_vecmat(x, W) equals batched_matvec(W^T, x) per sample.
        let x = Tensor::new(&[0.5, -1.0], &[1, 2]);
        let w = Tensor::new(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[1, 2, 3]);
        let a = x.batched_vecmat(&w);

        let wt = Tensor::new(&[1.0, 4.0, 2.0, 5.0, 3.0, 6.0], &[1, 3, 2]);
        let b = wt.batched_matvec(&x);

        for (&u, &v) in a.data().iter().zip(b.data().iter()) {
            assert!((u - v).abs() < 1e-6);
        }
    }
}
