//! Buffer ownership strategies: where bytes come from and how they go back.

use std::alloc::{self, Layout};
use std::ptr::NonNull;

use crate::error::{Error, Result};

/// Capability pair for obtaining and releasing a fixed-address block.
///
/// A strategy is selected once, at array construction time, and the same
/// strategy instance releases what it allocated. `free` always receives
/// the layout that was passed to `alloc`; each implementation maps that
/// layout to its own allocator family internally, so an unaligned
/// allocation can never be handed to an aligned free or vice versa.
///
/// # Safety
///
/// Implementations must return memory valid for reads and writes of
/// `layout.size()` bytes, aligned to at least `layout.align()`, zeroed,
/// and stable at its address until `free` is called with the same layout.
pub unsafe trait BufAlloc {
    fn alloc(&self, layout: Layout) -> Result<NonNull<u8>>;

    /// # Safety
    ///
    /// `ptr` must come from `alloc` on the same strategy instance with the
    /// same `layout`, and must not be used afterwards.
    unsafe fn free(&self, ptr: NonNull<u8>, layout: Layout);
}

/// Returns `true` if `ptr` is a multiple of `align` bytes.
pub fn is_aligned_to<T>(ptr: *const T, align: usize) -> bool {
    (ptr as usize).is_multiple_of(align)
}

fn zeroed_alloc(layout: Layout) -> Result<NonNull<u8>> {
    if layout.size() == 0 {
        return Err(Error::InvalidDimension);
    }
    let ptr: *mut u8 = unsafe { alloc::alloc_zeroed(layout) };
    NonNull::new(ptr).ok_or(Error::AllocationFailed(layout.size()))
}

/// General-purpose heap allocation at the element's natural alignment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeapAlloc;

unsafe impl BufAlloc for HeapAlloc {
    fn alloc(&self, layout: Layout) -> Result<NonNull<u8>> {
        zeroed_alloc(layout)
    }

    unsafe fn free(&self, ptr: NonNull<u8>, layout: Layout) {
        unsafe { alloc::dealloc(ptr.as_ptr(), layout) }
    }
}

/// Heap allocation at a caller-specified byte alignment.
///
/// The alignment is validated at construction and becomes part of the
/// strategy's identity: both `alloc` and `free` widen the element layout
/// with it, keeping the pair consistent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AlignedAlloc {
    align: usize,
}

impl AlignedAlloc {
    /// Fails with [`Error::InvalidAlignment`] unless `align` is a power of
    /// two at least as large as a pointer.
    pub fn new(align: usize) -> Result<Self> {
        if !align.is_power_of_two() || align < size_of::<*const u8>() {
            return Err(Error::InvalidAlignment(align));
        }
        Ok(Self { align })
    }

    pub fn align(&self) -> usize {
        self.align
    }

    fn widen(&self, layout: Layout) -> Result<Layout> {
        Layout::from_size_align(layout.size(), layout.align().max(self.align))
            .map_err(|_| Error::AllocationFailed(layout.size()))
    }
}

unsafe impl BufAlloc for AlignedAlloc {
    fn alloc(&self, layout: Layout) -> Result<NonNull<u8>> {
        zeroed_alloc(self.widen(layout)?)
    }

    unsafe fn free(&self, ptr: NonNull<u8>, layout: Layout) {
        // The layout was validated when alloc accepted it.
        let widened = self.widen(layout).expect("layout accepted at alloc time");
        unsafe { alloc::dealloc(ptr.as_ptr(), widened) }
    }
}
