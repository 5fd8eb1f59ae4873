// Dense f32 kernels for the fused feature space.
// Results must be bit-identical across machines (restored models rank ties
// the same way), so there is no runtime CPU-feature dispatch here.

/// Dot product of two equal-length slices.
///
/// Returns 0.0 on a length mismatch.
#[inline]
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let mut dot0 = 0.0f32;
    let mut dot1 = 0.0f32;

    let a_chunks = a.chunks_exact(8);
    let b_chunks = b.chunks_exact(8);
    let tail = a.len() - a_chunks.remainder().len();

    for (x, y) in a_chunks.zip(b_chunks) {
        dot0 += x[0] * y[0] + x[1] * y[1] + x[2] * y[2] + x[3] * y[3];
        dot1 += x[4] * y[4] + x[5] * y[5] + x[6] * y[6] + x[7] * y[7];
    }

    for i in tail..a.len() {
        dot0 += a[i] * b[i];
    }

    dot0 + dot1
}

#[inline]
pub fn norm_squared(v: &[f32]) -> f32 {
    dot_product(v, v)
}

#[inline]
pub fn norm(v: &[f32]) -> f32 {
    norm_squared(v).sqrt()
}

/// Scale `v` to unit length in place.
///
/// A zero vector is left untouched.
#[inline]
pub fn normalize_in_place(v: &mut [f32]) {
    let n = norm(v);
    if n > 0.0 {
        let inv = 1.0 / n;
        for x in v.iter_mut() {
            *x *= inv;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_product_matches_naive() {
        let a: Vec<f32> = (0..37).map(|i| i as f32 * 0.25).collect();
        let b: Vec<f32> = (0..37).map(|i| 1.0 - i as f32 * 0.1).collect();
        let naive: f32 = a.iter().zip(&b).map(|(x, y)| x * y).sum();
        assert!((dot_product(&a, &b) - naive).abs() < 1e-3);
    }

    #[test]
    fn test_dot_product_length_mismatch() {
        assert_eq!(dot_product(&[1.0, 2.0], &[1.0]), 0.0);
    }

    #[test]
    fn test_normalize_zero_vector_is_noop() {
        let mut v = vec![0.0f32; 5];
        normalize_in_place(&mut v);
        assert!(v.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_normalize_unit_length() {
        let mut v = vec![3.0f32, 4.0];
        normalize_in_place(&mut v);
        assert!((norm(&v) - 1.0).abs() < 1e-6);
        assert!((v[0] - 0.6).abs() < 1e-6);
    }
}
