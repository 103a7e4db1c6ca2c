use bytemuck::Pod;

use crate::dims;
use crate::error::Result;

/// Shape metadata shared by every array variant.
pub trait NdInfo {
    /// Per-axis lengths, row-major (last axis varies fastest in memory).
    fn dims(&self) -> &[usize];

    /// Total element count, cached at construction.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn rank(&self) -> usize {
        self.dims().len()
    }

    /// Length of a single axis.
    fn dim_len(&self, axis: usize) -> usize {
        self.dims()[axis]
    }

    /// Defensive copy of the dimension vector. Callers may mutate the
    /// result freely without corrupting the array's shape.
    fn shape(&self) -> Vec<usize> {
        self.dims().to_vec()
    }
}

/// Read access over the flat row-major buffer.
///
/// The rank-1/2/3 accessors inline the row-major offset with no per-axis
/// bounds checks; staying inside each axis bound is the caller's contract.
/// The generic [`NdView::get`] path validates everything and is the right
/// entry point for arbitrary rank.
pub trait NdView: NdInfo {
    type Elem: Pod;

    /// Base address of the buffer, valid until the array is disposed or
    /// dropped. This is the single interop boundary: native calls receive
    /// this pointer together with the dimension vector.
    fn as_ptr(&self) -> *const Self::Elem;

    /// Zero-copy flat view of all elements.
    fn as_slice(&self) -> &[Self::Elem] {
        unsafe { std::slice::from_raw_parts(self.as_ptr(), self.len()) }
    }

    /// Rank-1 read without bounds checks.
    ///
    /// # Safety
    ///
    /// `i1 < dims()[0]`; an out-of-range index reads foreign memory.
    unsafe fn get1_unchecked(&self, i1: usize) -> Self::Elem {
        unsafe { self.as_ptr().add(i1).read() }
    }

    /// Rank-2 read without bounds checks.
    ///
    /// # Safety
    ///
    /// Both indices must be inside their axis bounds.
    unsafe fn get2_unchecked(&self, i1: usize, i2: usize) -> Self::Elem {
        let offset = i2 + self.dims()[1] * i1;
        unsafe { self.as_ptr().add(offset).read() }
    }

    /// Rank-3 read without bounds checks.
    ///
    /// # Safety
    ///
    /// All three indices must be inside their axis bounds.
    unsafe fn get3_unchecked(&self, i1: usize, i2: usize, i3: usize) -> Self::Elem {
        let d = self.dims();
        let offset = i3 + d[2] * (i2 + d[1] * i1);
        unsafe { self.as_ptr().add(offset).read() }
    }

    /// Checked element read for arbitrary rank.
    fn get(&self, indices: &[usize]) -> Result<Self::Elem> {
        let offset = dims::linear_index(self.dims(), indices)?;
        Ok(self.as_slice()[offset])
    }
}

/// Mutable access over the flat row-major buffer.
pub trait NdViewMut: NdView {
    fn as_mut_ptr(&mut self) -> *mut Self::Elem;

    /// Zero-copy mutable flat view of all elements.
    fn as_mut_slice(&mut self) -> &mut [Self::Elem] {
        let len = self.len();
        unsafe { std::slice::from_raw_parts_mut(self.as_mut_ptr(), len) }
    }

    /// Rank-1 write without bounds checks.
    ///
    /// # Safety
    ///
    /// `i1 < dims()[0]`.
    unsafe fn set1_unchecked(&mut self, i1: usize, value: Self::Elem) {
        unsafe { self.as_mut_ptr().add(i1).write(value) }
    }

    /// Rank-2 write without bounds checks.
    ///
    /// # Safety
    ///
    /// Both indices must be inside their axis bounds.
    unsafe fn set2_unchecked(&mut self, i1: usize, i2: usize, value: Self::Elem) {
        let offset = i2 + self.dims()[1] * i1;
        unsafe { self.as_mut_ptr().add(offset).write(value) }
    }

    /// Rank-3 write without bounds checks.
    ///
    /// # Safety
    ///
    /// All three indices must be inside their axis bounds.
    unsafe fn set3_unchecked(&mut self, i1: usize, i2: usize, i3: usize, value: Self::Elem) {
        let d = self.dims();
        let offset = i3 + d[2] * (i2 + d[1] * i1);
        unsafe { self.as_mut_ptr().add(offset).write(value) }
    }

    /// Checked element write for arbitrary rank.
    fn set(&mut self, indices: &[usize], value: Self::Elem) -> Result<()> {
        let offset = dims::linear_index(self.dims(), indices)?;
        self.as_mut_slice()[offset] = value;
        Ok(())
    }
}
