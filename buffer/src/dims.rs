//! Dimension-vector arithmetic: total element counts and row-major offsets.

use crate::error::{Error, Result};

/// Returns the total element count of a dimension vector.
///
/// Fails with [`Error::InvalidDimension`] when the vector is empty, an
/// entry is zero, or the product overflows `usize`.
pub fn total_size(dims: &[usize]) -> Result<usize> {
    if dims.is_empty() {
        return Err(Error::InvalidDimension);
    }
    let mut total: usize = 1;
    for &n in dims {
        if n == 0 {
            return Err(Error::InvalidDimension);
        }
        total = total.checked_mul(n).ok_or(Error::InvalidDimension)?;
    }
    Ok(total)
}

/// Row-major linear offset of `indices` within `dims`.
///
/// This is the checked generic path: every entry is validated against its
/// axis bound. The rank-1/2/3 accessors on the view traits inline the same
/// formula without per-axis checks.
pub fn linear_index(dims: &[usize], indices: &[usize]) -> Result<usize> {
    if indices.len() != dims.len() {
        return Err(Error::RankMismatch {
            expected: dims.len(),
            got: indices.len(),
        });
    }
    let mut offset: usize = 0;
    for (axis, (&len, &index)) in dims.iter().zip(indices).enumerate() {
        if index >= len {
            return Err(Error::IndexOutOfRange { axis, index, len });
        }
        offset = offset * len + index;
    }
    Ok(offset)
}
