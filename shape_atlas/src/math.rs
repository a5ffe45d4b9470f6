// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mathematical helper functions.

use crate::kurbo::{Affine, Rect};

#[cfg(not(feature = "std"))]
use crate::kurbo::common::FloatFuncs as _;

// From <https://github.com/linebender/tiny-skia/blob/68b198a7210a6bbf752b43d6bc4db62445730313/path/src/scalar.rs#L12>
const SCALAR_NEARLY_ZERO: f64 = 1.0 / (1 << 12) as f64;

/// A number of useful methods for f64 numbers.
pub(crate) trait FloatExt: Sized {
    /// Whether the number is approximately 0.
    fn is_nearly_zero(self) -> bool;

    /// The fractional part, always in `[0, 1)`, also for negative numbers.
    fn positive_fract(self) -> Self;
}

impl FloatExt for f64 {
    #[inline(always)]
    fn is_nearly_zero(self) -> bool {
        self.abs() <= SCALAR_NEARLY_ZERO
    }

    #[inline(always)]
    fn positive_fract(self) -> Self {
        self - self.floor()
    }
}

/// The minimum and maximum factor by which `transform` scales a vector.
///
/// These are the singular values of the linear part of the transform. Returns `None` if the
/// coefficients are not finite.
pub(crate) fn min_max_scales(transform: &Affine) -> Option<(f64, f64)> {
    let [a, b, c, d, _, _] = transform.as_coeffs();
    if ![a, b, c, d].iter().all(|v| v.is_finite()) {
        return None;
    }

    // Eigenvalues of Mᵀ·M.
    let p = a * a + b * b;
    let q = c * c + d * d;
    let r = a * c + b * d;
    let half_sum = 0.5 * (p + q);
    let half_diff = 0.5 * (p - q);
    let root = (half_diff * half_diff + r * r).sqrt();
    let min = (half_sum - root).max(0.0).sqrt();
    let max = (half_sum + root).sqrt();
    Some((min, max))
}

/// The maximum scale factor of `transform`, `None` if it can't be computed.
#[inline]
pub(crate) fn max_scale(transform: &Affine) -> Option<f64> {
    min_max_scales(transform).map(|(_, max)| max)
}

/// Whether the transform only scales and translates.
#[inline]
pub(crate) fn is_scale_translate(transform: &Affine) -> bool {
    let [_, b, c, _, _, _] = transform.as_coeffs();
    b == 0.0 && c == 0.0
}

/// Whether the transform preserves angles (uniform scale, rotation, translation, no skew).
pub(crate) fn is_similarity(transform: &Affine) -> bool {
    let [a, b, c, d, _, _] = transform.as_coeffs();
    // Orthogonal columns of equal length, with or without reflection.
    let rotation = (a - d).is_nearly_zero() && (b + c).is_nearly_zero();
    let reflection = (a + d).is_nearly_zero() && (b - c).is_nearly_zero();
    (rotation || reflection) && !(a * d - b * c).is_nearly_zero()
}

/// Rounds a rectangle outwards to integer coordinates.
#[inline]
pub(crate) fn round_out(rect: Rect) -> Rect {
    Rect::new(
        rect.x0.floor(),
        rect.y0.floor(),
        rect.x1.ceil(),
        rect.y1.ceil(),
    )
}

/// Bit pattern of a coefficient where `-0.0` and `0.0` are the same value.
#[inline]
pub(crate) fn canonical_bits(value: f64) -> u64 {
    if value == 0.0 { 0 } else { value.to_bits() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_of_uniform_scale() {
        let (min, max) = min_max_scales(&Affine::scale(3.0)).unwrap();
        assert!((min - 3.0).abs() < 1e-9, "min was {min}");
        assert!((max - 3.0).abs() < 1e-9, "max was {max}");
    }

    #[test]
    fn scales_of_non_uniform_rotated() {
        let t = Affine::rotate(0.7) * Affine::scale_non_uniform(2.0, 5.0);
        let (min, max) = min_max_scales(&t).unwrap();
        assert!((min - 2.0).abs() < 1e-9, "min was {min}");
        assert!((max - 5.0).abs() < 1e-9, "max was {max}");
    }

    #[test]
    fn similarity_detection() {
        assert!(is_similarity(&(Affine::rotate(1.0) * Affine::scale(2.0))));
        assert!(is_similarity(&Affine::FLIP_X));
        assert!(!is_similarity(&Affine::scale_non_uniform(1.0, 2.0)));
        assert!(!is_similarity(&Affine::skew(0.3, 0.0)));
        assert!(is_scale_translate(&Affine::scale_non_uniform(1.0, 2.0)));
        assert!(!is_scale_translate(&Affine::rotate(0.5)));
    }

    #[test]
    fn fract_of_negative() {
        assert_eq!((-1.25_f64).positive_fract(), 0.75);
        assert_eq!(2.5_f64.positive_fract(), 0.5);
    }

    #[test]
    fn negative_zero_is_canonical() {
        assert_eq!(canonical_bits(-0.0), canonical_bits(0.0));
        assert_ne!(canonical_bits(1.0), canonical_bits(-1.0));
    }
}
