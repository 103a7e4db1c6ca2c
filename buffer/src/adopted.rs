use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

use bytemuck::Pod;

use crate::dims;
use crate::error::{Error, Result};
use crate::view::{NdInfo, NdView, NdViewMut};

/// Array view adopting storage owned elsewhere, without copying.
///
/// The container type decides the adoption flavor:
///
/// - `D = Vec<T>` ([`SliceArrayOwned`]): a buffer leased from the global
///   allocator for the view's lifetime.
/// - `D = &mut [T]` ([`SliceArrayMut`]): a caller-owned slice pinned in
///   place for the borrow's duration. Writes through the view are writes
///   to the original storage.
///
/// In both cases the buffer address is fixed while the view exists (the
/// container is never resized), so [`NdView::as_ptr`] can be handed to
/// native code. Dropping the view, or [`SliceArray::into_inner`], releases
/// only the adoption; the bytes belong to the container.
pub struct SliceArray<T: Pod, D> {
    data: D,
    dims: Vec<usize>,
    len: usize,
    _marker: PhantomData<T>,
}

pub type SliceArrayOwned<T> = SliceArray<T, Vec<T>>;
pub type SliceArrayMut<'a, T> = SliceArray<T, &'a mut [T]>;

impl<T: Pod> SliceArrayOwned<T> {
    /// Leases a zero-filled buffer of `total_size(dims)` elements.
    pub fn alloc(dims: &[usize]) -> Result<Self> {
        let len = dims::total_size(dims)?;
        Ok(Self {
            data: vec![T::zeroed(); len],
            dims: dims.to_vec(),
            len,
            _marker: PhantomData,
        })
    }
}

impl<T: Pod, D: AsRef<[T]>> SliceArray<T, D> {
    /// Adopts `data` in place with explicit per-axis lengths.
    ///
    /// Fails with [`Error::LengthMismatch`] when the container does not
    /// hold exactly `total_size(dims)` elements.
    pub fn adopt(data: D, dims: &[usize]) -> Result<Self> {
        let len = dims::total_size(dims)?;
        let have = data.as_ref().len();
        if have != len {
            return Err(Error::LengthMismatch {
                left: len,
                right: have,
            });
        }
        Ok(Self {
            data,
            dims: dims.to_vec(),
            len,
            _marker: PhantomData,
        })
    }

    /// Adopts `data` as a rank-1 view, recovering its own length.
    pub fn adopt_flat(data: D) -> Result<Self> {
        let dims = [data.as_ref().len()];
        Self::adopt(data, &dims)
    }

    /// Releases the adoption and returns the underlying container.
    pub fn into_inner(self) -> D {
        self.data
    }
}

impl<'a, T: Pod> SliceArrayMut<'a, T> {
    /// Adopts a raw byte buffer, reinterpreting it as elements of `T`.
    ///
    /// Fails with [`Error::TypeMismatch`] when the bytes are misaligned
    /// for `T` or their count is not a whole number of elements.
    pub fn adopt_bytes(bytes: &'a mut [u8], dims: &[usize]) -> Result<Self> {
        let data: &mut [T] =
            bytemuck::try_cast_slice_mut(bytes).map_err(|_| Error::TypeMismatch)?;
        Self::adopt(data, dims)
    }
}

impl<T: Pod, D> NdInfo for SliceArray<T, D> {
    fn dims(&self) -> &[usize] {
        &self.dims
    }

    fn len(&self) -> usize {
        self.len
    }
}

impl<T: Pod, D: AsRef<[T]>> NdView for SliceArray<T, D> {
    type Elem = T;

    fn as_ptr(&self) -> *const T {
        self.data.as_ref().as_ptr()
    }
}

impl<T: Pod, D: AsRef<[T]> + AsMut<[T]>> NdViewMut for SliceArray<T, D> {
    fn as_mut_ptr(&mut self) -> *mut T {
        self.data.as_mut().as_mut_ptr()
    }
}

impl<T: Pod, D: AsRef<[T]>> Index<usize> for SliceArray<T, D> {
    type Output = T;

    #[inline]
    fn index(&self, i1: usize) -> &T {
        &self.data.as_ref()[i1]
    }
}

impl<T: Pod, D: AsRef<[T]> + AsMut<[T]>> IndexMut<usize> for SliceArray<T, D> {
    #[inline]
    fn index_mut(&mut self, i1: usize) -> &mut T {
        &mut self.data.as_mut()[i1]
    }
}

impl<T: Pod, D: AsRef<[T]>> Index<(usize, usize)> for SliceArray<T, D> {
    type Output = T;

    #[inline]
    fn index(&self, (i1, i2): (usize, usize)) -> &T {
        let offset = i2 + self.dims[1] * i1;
        &self.data.as_ref()[offset]
    }
}

impl<T: Pod, D: AsRef<[T]> + AsMut<[T]>> IndexMut<(usize, usize)> for SliceArray<T, D> {
    #[inline]
    fn index_mut(&mut self, (i1, i2): (usize, usize)) -> &mut T {
        let offset = i2 + self.dims[1] * i1;
        &mut self.data.as_mut()[offset]
    }
}

impl<T: Pod, D: AsRef<[T]>> Index<(usize, usize, usize)> for SliceArray<T, D> {
    type Output = T;

    #[inline]
    fn index(&self, (i1, i2, i3): (usize, usize, usize)) -> &T {
        let offset = i3 + self.dims[2] * (i2 + self.dims[1] * i1);
        &self.data.as_ref()[offset]
    }
}

impl<T: Pod, D: AsRef<[T]> + AsMut<[T]>> IndexMut<(usize, usize, usize)> for SliceArray<T, D> {
    #[inline]
    fn index_mut(&mut self, (i1, i2, i3): (usize, usize, usize)) -> &mut T {
        let offset = i3 + self.dims[2] * (i2 + self.dims[1] * i1);
        &mut self.data.as_mut()[offset]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adopt_preserves_lengths_and_aliases_storage() {
        let mut backing = vec![0.0f64; 6];
        backing[5] = 42.0;
        {
            let mut view = SliceArrayMut::adopt(backing.as_mut_slice(), &[2, 3]).unwrap();
            assert_eq!(view.dims(), &[2, 3]);
            // Pre-existing data is visible: no copy was made.
            assert_eq!(view[(1, 2)], 42.0);
            view[(0, 1)] = 7.0;
        }
        // Writes through the view are visible in the original.
        assert_eq!(backing[1], 7.0);
    }

    #[test]
    fn adopt_validates_total_size() {
        let backing = vec![0u32; 5];
        assert_eq!(
            SliceArray::adopt(backing, &[2, 3]).err(),
            Some(Error::LengthMismatch { left: 6, right: 5 })
        );
    }

    #[test]
    fn adopt_flat_recovers_length() {
        let view = SliceArrayOwned::adopt_flat(vec![1i16, 2, 3]).unwrap();
        assert_eq!(view.dims(), &[3]);
        assert_eq!(view[2], 3);
    }

    #[test]
    fn into_inner_returns_the_container() {
        let mut view = SliceArrayOwned::<u8>::alloc(&[4]).unwrap();
        view[1] = 9;
        let backing = view.into_inner();
        assert_eq!(backing, vec![0, 9, 0, 0]);
    }

    #[test]
    fn adopt_bytes_checks_element_compatibility() {
        // A byte count that is not a whole number of f64 elements.
        let mut bytes = [0u8; 12];
        assert_eq!(
            SliceArrayMut::<f64>::adopt_bytes(&mut bytes, &[1]).err(),
            Some(Error::TypeMismatch)
        );

        // A start address that is misaligned for f64 by construction.
        let mut raw = [0u8; 40];
        let base = raw.as_ptr() as usize;
        let skew = (8 - base % 8) % 8 + 1;
        let slice = &mut raw[skew..skew + 16];
        assert_eq!(
            SliceArrayMut::<f64>::adopt_bytes(slice, &[2]).err(),
            Some(Error::TypeMismatch)
        );
    }

    #[test]
    fn adopt_bytes_round_trips() {
        // u64 backing guarantees the byte buffer is aligned for f64.
        let mut words = [0u64; 4];
        let bytes: &mut [u8] = bytemuck::cast_slice_mut(&mut words);
        let mut view = SliceArrayMut::<f64>::adopt_bytes(bytes, &[2, 2]).unwrap();
        view.set(&[1, 1], 2.5).unwrap();
        assert_eq!(view.get(&[1, 1]), Ok(2.5));
    }
}
