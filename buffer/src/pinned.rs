use std::alloc::Layout;
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};
use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, Ordering};

use bytemuck::Pod;

use crate::alloc::{BufAlloc, HeapAlloc};
use crate::dims;
use crate::error::{Error, Result};
use crate::view::{NdInfo, NdView, NdViewMut};

/// Fixed-address array owning its buffer through an allocation strategy.
///
/// The buffer is allocated once at construction and its address never
/// changes, so it can be handed to native code for the array's whole
/// lifetime. Exactly one owner exists: the type is neither `Clone` nor
/// `Copy`, since a duplicated handle would release the buffer twice.
///
/// Release happens exactly once, through [`PinnedArray::dispose`] or
/// `Drop`, whichever runs first; the other path observes the disposed
/// flag and becomes a no-op. After disposal the checked accessors return
/// [`Error::UseAfterDispose`] and the raw/flat accessors panic: handing
/// out a dangling pointer or slice from safe code is not an option, so
/// the disposed check on those paths is unconditional. The `unsafe`
/// unchecked accessors take their base address through the same guarded
/// path, so they fail fast on a disposed buffer too; their contract
/// covers the indices only.
pub struct PinnedArray<T: Pod, A: BufAlloc = HeapAlloc> {
    ptr: NonNull<T>,
    len: usize,
    dims: Vec<usize>,
    layout: Layout,
    alloc: A,
    disposed: AtomicBool,
    _marker: PhantomData<T>,
}

unsafe impl<T: Pod, A: BufAlloc + Send> Send for PinnedArray<T, A> {}
unsafe impl<T: Pod, A: BufAlloc + Sync> Sync for PinnedArray<T, A> {}

impl<T: Pod> PinnedArray<T, HeapAlloc> {
    /// Allocates a zeroed buffer of `total_size(dims)` elements at the
    /// element's natural alignment.
    pub fn new(dims: &[usize]) -> Result<Self> {
        Self::with_alloc(HeapAlloc, dims)
    }
}

impl<T: Pod, A: BufAlloc> PinnedArray<T, A> {
    /// Allocates through an explicit ownership strategy.
    pub fn with_alloc(alloc: A, dims: &[usize]) -> Result<Self> {
        let len = dims::total_size(dims)?;
        let layout = Layout::array::<T>(len).map_err(|_| Error::InvalidDimension)?;
        let ptr = alloc.alloc(layout)?.cast::<T>();
        Ok(Self {
            ptr,
            len,
            dims: dims.to_vec(),
            layout,
            alloc,
            disposed: AtomicBool::new(false),
            _marker: PhantomData,
        })
    }

    /// True once the buffer has been released.
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Releases the buffer. Idempotent: a second call, or the eventual
    /// `Drop`, observes the disposed flag and does nothing.
    pub fn dispose(&mut self) {
        self.release_once();
    }

    fn release_once(&mut self) {
        if !self.disposed.swap(true, Ordering::AcqRel) {
            unsafe { self.alloc.free(self.ptr.cast::<u8>(), self.layout) }
        }
    }

    fn live_ptr(&self) -> *const T {
        assert!(!self.is_disposed(), "buffer accessed after dispose");
        self.ptr.as_ptr()
    }
}

impl<T: Pod, A: BufAlloc> Drop for PinnedArray<T, A> {
    fn drop(&mut self) {
        self.release_once();
    }
}

impl<T: Pod, A: BufAlloc> NdInfo for PinnedArray<T, A> {
    fn dims(&self) -> &[usize] {
        &self.dims
    }

    fn len(&self) -> usize {
        self.len
    }
}

impl<T: Pod, A: BufAlloc> NdView for PinnedArray<T, A> {
    type Elem = T;

    fn as_ptr(&self) -> *const T {
        self.live_ptr()
    }

    fn get(&self, indices: &[usize]) -> Result<T> {
        if self.is_disposed() {
            return Err(Error::UseAfterDispose);
        }
        let offset = dims::linear_index(&self.dims, indices)?;
        Ok(unsafe { self.ptr.as_ptr().add(offset).read() })
    }
}

impl<T: Pod, A: BufAlloc> NdViewMut for PinnedArray<T, A> {
    fn as_mut_ptr(&mut self) -> *mut T {
        self.live_ptr() as *mut T
    }

    fn set(&mut self, indices: &[usize], value: T) -> Result<()> {
        if self.is_disposed() {
            return Err(Error::UseAfterDispose);
        }
        let offset = dims::linear_index(&self.dims, indices)?;
        unsafe { self.ptr.as_ptr().add(offset).write(value) };
        Ok(())
    }
}

impl<T: Pod, A: BufAlloc> Index<usize> for PinnedArray<T, A> {
    type Output = T;

    #[inline]
    fn index(&self, i1: usize) -> &T {
        &self.as_slice()[i1]
    }
}

impl<T: Pod, A: BufAlloc> IndexMut<usize> for PinnedArray<T, A> {
    #[inline]
    fn index_mut(&mut self, i1: usize) -> &mut T {
        &mut self.as_mut_slice()[i1]
    }
}

impl<T: Pod, A: BufAlloc> Index<(usize, usize)> for PinnedArray<T, A> {
    type Output = T;

    #[inline]
    fn index(&self, (i1, i2): (usize, usize)) -> &T {
        let offset = i2 + self.dims[1] * i1;
        &self.as_slice()[offset]
    }
}

impl<T: Pod, A: BufAlloc> IndexMut<(usize, usize)> for PinnedArray<T, A> {
    #[inline]
    fn index_mut(&mut self, (i1, i2): (usize, usize)) -> &mut T {
        let offset = i2 + self.dims[1] * i1;
        &mut self.as_mut_slice()[offset]
    }
}

impl<T: Pod, A: BufAlloc> Index<(usize, usize, usize)> for PinnedArray<T, A> {
    type Output = T;

    #[inline]
    fn index(&self, (i1, i2, i3): (usize, usize, usize)) -> &T {
        let offset = i3 + self.dims[2] * (i2 + self.dims[1] * i1);
        &self.as_slice()[offset]
    }
}

impl<T: Pod, A: BufAlloc> IndexMut<(usize, usize, usize)> for PinnedArray<T, A> {
    #[inline]
    fn index_mut(&mut self, (i1, i2, i3): (usize, usize, usize)) -> &mut T {
        let offset = i3 + self.dims[2] * (i2 + self.dims[1] * i1);
        &mut self.as_mut_slice()[offset]
    }
}

impl<T: Pod + fmt::Debug, A: BufAlloc> fmt::Debug for PinnedArray<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PinnedArray")
            .field("dims", &self.dims)
            .field("len", &self.len)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::{AlignedAlloc, is_aligned_to};

    #[test]
    fn allocation_is_zeroed_and_sized() {
        let arr = PinnedArray::<f64>::new(&[3, 4]).unwrap();
        assert_eq!(arr.len(), 12);
        assert_eq!(arr.rank(), 2);
        assert_eq!(arr.dim_len(1), 4);
        assert!(arr.as_slice().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn rejects_invalid_dims() {
        assert_eq!(
            PinnedArray::<f64>::new(&[]).err(),
            Some(Error::InvalidDimension)
        );
        assert_eq!(
            PinnedArray::<f64>::new(&[2, 0]).err(),
            Some(Error::InvalidDimension)
        );
    }

    #[test]
    fn rank2_indexing_round_trips() {
        let mut arr = PinnedArray::<i64>::new(&[2, 3]).unwrap();
        for i in 0..2 {
            for j in 0..3 {
                arr[(i, j)] = (10 * i + j) as i64;
            }
        }
        assert_eq!(arr[(1, 2)], 12);
        // Same cell through the checked generic path.
        assert_eq!(arr.get(&[1, 2]), Ok(12));
    }

    #[test]
    fn shape_copy_is_defensive() {
        let arr = PinnedArray::<f32>::new(&[2, 5]).unwrap();
        let mut shape = arr.shape();
        shape[0] = 999;
        assert_eq!(arr.dims(), &[2, 5]);
    }

    #[test]
    fn dispose_is_idempotent() {
        let mut arr = PinnedArray::<f64>::new(&[16]).unwrap();
        assert!(!arr.is_disposed());
        arr.dispose();
        assert!(arr.is_disposed());
        arr.dispose();
        assert!(arr.is_disposed());
        // Drop after explicit dispose must also be a no-op.
    }

    #[test]
    fn checked_access_after_dispose_is_an_error() {
        let mut arr = PinnedArray::<f64>::new(&[4]).unwrap();
        arr.dispose();
        assert_eq!(arr.get(&[0]), Err(Error::UseAfterDispose));
        assert_eq!(arr.set(&[0], 1.0), Err(Error::UseAfterDispose));
    }

    #[test]
    #[should_panic(expected = "after dispose")]
    fn flat_view_after_dispose_fails_fast() {
        let mut arr = PinnedArray::<f64>::new(&[4]).unwrap();
        arr.dispose();
        let _ = arr.as_slice();
    }

    #[test]
    #[should_panic(expected = "after dispose")]
    fn unchecked_read_after_dispose_fails_fast() {
        let mut arr = PinnedArray::<f64>::new(&[4]).unwrap();
        arr.dispose();
        // The base pointer is guarded, so the panic fires before any read.
        let _ = unsafe { arr.get1_unchecked(0) };
    }

    #[test]
    fn aligned_strategy_alignment_is_observable() {
        let arr =
            PinnedArray::<f64, AlignedAlloc>::with_alloc(AlignedAlloc::new(64).unwrap(), &[7])
                .unwrap();
        assert!(is_aligned_to(arr.as_ptr(), 64));
    }
}
