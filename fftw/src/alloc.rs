//! Native-library allocation strategy.
//!
//! `fftw_malloc` returns blocks aligned for whatever SIMD width the
//! library was built with, which lets the library take its fastest code
//! paths. [`FftwAlloc`] plugs that allocator into the common
//! [`BufAlloc`] strategy seam, so [`FftwArray`] behaves exactly like any
//! other pinned array while its bytes live in native-owned memory.

use std::alloc::Layout;
use std::ptr::NonNull;

use buffer::{BufAlloc, Error, PinnedArray, Result, is_aligned_to};

use crate::api;

/// Allocation through `fftw_malloc` / `fftw_free`.
///
/// Construction does not touch the native library; the first `alloc`
/// does, and fails with [`Error::LibraryUnavailable`] when it is absent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FftwAlloc;

/// A pinned array backed by native-library memory.
pub type FftwArray<T> = PinnedArray<T, FftwAlloc>;

unsafe impl BufAlloc for FftwAlloc {
    fn alloc(&self, layout: Layout) -> Result<NonNull<u8>> {
        if layout.size() == 0 {
            return Err(Error::InvalidDimension);
        }
        let api = api::api()?;
        let ptr = unsafe { (api.malloc)(layout.size()) } as *mut u8;
        let ptr = NonNull::new(ptr).ok_or(Error::AllocationFailed(layout.size()))?;
        if !is_aligned_to(ptr.as_ptr(), layout.align()) {
            // The native allocator aligns for SIMD, typically 16 or 32
            // bytes; anything stricter cannot be guaranteed.
            unsafe { (api.free)(ptr.as_ptr() as *mut _) };
            return Err(Error::InvalidAlignment(layout.align()));
        }
        unsafe { std::ptr::write_bytes(ptr.as_ptr(), 0, layout.size()) };
        Ok(ptr)
    }

    unsafe fn free(&self, ptr: NonNull<u8>, _layout: Layout) {
        // alloc succeeded, so the library is resolved for the process.
        if let Ok(api) = api::api() {
            unsafe { (api.free)(ptr.as_ptr() as *mut _) };
        }
    }
}

/// Asks the native library how `ptr` relates to its preferred alignment.
///
/// Two buffers reporting the same value can reuse each other's plans.
pub fn alignment_of(ptr: *mut f64) -> Result<i32> {
    let api = api::api()?;
    Ok(unsafe { (api.alignment_of)(ptr) })
}
