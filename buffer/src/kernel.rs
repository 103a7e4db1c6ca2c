//! In-place pairwise complex multiplication over packed (re, im) buffers.

use crate::complex::Complex64;
use crate::error::{Error, Result};
use crate::view::{NdView, NdViewMut};

/// Pairwise in-place product: `left[i] = left[i] * right[i]`.
///
/// `right` must be at least as long as `left`; excess elements on the
/// right are ignored. A shorter `right` fails with
/// [`Error::LengthMismatch`] before anything is written.
///
/// The bulk runs on AVX2 when the host supports it, two complex elements
/// per 256-bit lane; a trailing odd element, and every element on other
/// hosts, goes through the scalar path.
pub fn cmul_inplace(left: &mut [Complex64], right: &[Complex64]) -> Result<()> {
    if right.len() < left.len() {
        return Err(Error::LengthMismatch {
            left: left.len(),
            right: right.len(),
        });
    }

    #[cfg(target_arch = "x86_64")]
    if std::is_x86_feature_detected!("avx2") {
        unsafe { cmul_inplace_avx2(left, right) };
        return Ok(());
    }

    cmul_scalar(left, right);
    Ok(())
}

fn cmul_scalar(left: &mut [Complex64], right: &[Complex64]) {
    for (l, r) in left.iter_mut().zip(right) {
        *l = *l * *r;
    }
}

/// Two complex elements per lane. The element-wise product corrected by an
/// alternating-sign vector pair-sums into the real parts; the cross term,
/// with re/im swapped inside each pair, pair-sums into the imaginary
/// parts. `_mm256_hadd_pd` interleaves the two back into (re, im) order.
///
/// # Safety
///
/// Caller must ensure the CPU supports AVX2 and `right.len() >= left.len()`.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn cmul_inplace_avx2(left: &mut [Complex64], right: &[Complex64]) {
    use std::arch::x86_64::{
        __m256d, _mm256_hadd_pd, _mm256_loadu_pd, _mm256_mul_pd, _mm256_permute_pd,
        _mm256_setr_pd, _mm256_storeu_pd,
    };

    let pairs: usize = left.len() >> 1;

    unsafe {
        let sign: __m256d = _mm256_setr_pd(1.0, -1.0, 1.0, -1.0);
        let mut ll: *mut f64 = left.as_mut_ptr() as *mut f64;
        let mut rr: *const f64 = right.as_ptr() as *const f64;

        for _ in 0..pairs {
            let l: __m256d = _mm256_loadu_pd(ll);
            let r: __m256d = _mm256_loadu_pd(rr);
            let re: __m256d = _mm256_mul_pd(_mm256_mul_pd(l, r), sign);
            let im: __m256d = _mm256_mul_pd(l, _mm256_permute_pd(r, 0b0101));
            _mm256_storeu_pd(ll, _mm256_hadd_pd(re, im));
            ll = ll.add(4);
            rr = rr.add(4);
        }
    }

    let tail: usize = pairs << 1;
    cmul_scalar(&mut left[tail..], &right[tail..]);
}

/// In-place complex product over any complex-valued array variant.
pub trait MulInplace: NdViewMut<Elem = Complex64> {
    fn mul_inplace<R>(&mut self, right: &R) -> Result<()>
    where
        R: NdView<Elem = Complex64> + ?Sized,
    {
        cmul_inplace(self.as_mut_slice(), right.as_slice())
    }
}

impl<V: NdViewMut<Elem = Complex64>> MulInplace for V {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Source;
    use itertools::izip;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    #[test]
    fn even_length_worked_example() {
        let mut left = vec![c(1.0, 2.0), c(3.0, 4.0)];
        let right = vec![c(5.0, 6.0), c(7.0, 8.0)];
        cmul_inplace(&mut left, &right).unwrap();
        assert_eq!(left, vec![c(-7.0, 16.0), c(-11.0, 52.0)]);
    }

    #[test]
    fn odd_length_takes_the_scalar_remainder() {
        let mut left = vec![c(1.0, 0.0), c(0.0, 1.0), c(2.0, -1.0)];
        let right = vec![c(2.0, 0.0), c(0.0, 2.0), c(1.0, 1.0)];
        cmul_inplace(&mut left, &right).unwrap();
        assert_eq!(left, vec![c(2.0, 0.0), c(-2.0, 0.0), c(3.0, 1.0)]);
    }

    #[test]
    fn unit_length_is_pure_scalar() {
        let mut left = vec![c(0.0, 1.0)];
        let right = vec![c(0.0, 1.0)];
        cmul_inplace(&mut left, &right).unwrap();
        assert_eq!(left, vec![c(-1.0, 0.0)]);
    }

    #[test]
    fn shorter_right_operand_is_rejected() {
        let mut left = vec![c(1.0, 1.0); 4];
        let right = vec![c(1.0, 1.0); 3];
        assert_eq!(
            cmul_inplace(&mut left, &right),
            Err(Error::LengthMismatch { left: 4, right: 3 })
        );
    }

    #[test]
    fn longer_right_operand_leaves_the_tail_alone() {
        let mut left = vec![c(1.0, 0.0); 2];
        let right = vec![c(3.0, 0.0); 5];
        cmul_inplace(&mut left, &right).unwrap();
        assert_eq!(left, vec![c(3.0, 0.0); 2]);
    }

    #[test]
    fn vector_path_matches_scalar_path() {
        let mut source = Source::new([17u8; 32]);
        let mut left = vec![Complex64::ZERO; 33];
        let mut right = vec![Complex64::ZERO; 33];
        source.fill_complex(&mut left, -4.0, 4.0);
        source.fill_complex(&mut right, -4.0, 4.0);

        let mut expected = left.clone();
        cmul_scalar(&mut expected, &right);
        cmul_inplace(&mut left, &right).unwrap();

        for (i, (got, want)) in izip!(&left, &expected).enumerate() {
            assert!(
                (got.re - want.re).abs() < 1e-12 && (got.im - want.im).abs() < 1e-12,
                "element {i}: {got:?} != {want:?}"
            );
        }
    }

    #[test]
    fn works_through_array_views() {
        use crate::adopted::SliceArrayOwned;
        use crate::pinned::PinnedArray;

        let mut left = PinnedArray::<Complex64>::new(&[2, 2]).unwrap();
        let mut right = SliceArrayOwned::<Complex64>::alloc(&[2, 2]).unwrap();
        for i in 0..2 {
            for j in 0..2 {
                left[(i, j)] = c(1.0, 1.0);
                right[(i, j)] = c(0.0, (i + j) as f64);
            }
        }
        left.mul_inplace(&right).unwrap();
        assert_eq!(left[(0, 0)], c(0.0, 0.0));
        assert_eq!(left[(1, 1)], c(-2.0, 2.0));
    }
}
