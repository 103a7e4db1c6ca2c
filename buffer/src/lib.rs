//! Typed, multi-dimensional views over fixed-address memory.
//!
//! This crate is the buffer layer of a wrapper around a native
//! Fourier-transform engine. The engine consumes raw pointers, so every
//! array variant here guarantees a contiguous row-major buffer at a fixed
//! address for its whole lifetime, released exactly once.
//!
//! ## Core Concepts
//!
//! **Ownership strategies** ([`alloc`]): where the bytes live is decided at
//! construction time through the [`BufAlloc`] capability pair
//! (allocate/release). [`HeapAlloc`] uses the global allocator at natural
//! alignment, [`AlignedAlloc`] at a caller-specified power-of-two alignment.
//! The native library's own allocator plugs in through the same trait from
//! the `fftw` crate.
//!
//! **Adoption** ([`SliceArray`]): an array view over storage owned elsewhere,
//! generic over the data container (`Vec<T>` for a leased buffer, `&mut [T]`
//! to pin a caller-owned slice in place). No copy is made; releasing the
//! view releases only the adoption, never the bytes.
//!
//! **View traits** ([`NdInfo`], [`NdView`], [`NdViewMut`]): shape metadata,
//! flat zero-copy views, unchecked rank-1/2/3 element access and a checked
//! generic path for arbitrary rank. The unchecked/checked split is
//! deliberate and both entry points are part of the public surface.
//!
//! **Kernel** ([`kernel`]): vectorized in-place pairwise complex
//! multiplication over [`Complex64`] buffers, AVX2 with a scalar fallback.

pub mod alloc;
pub mod dims;
pub mod kernel;
pub mod source;

mod adopted;
mod complex;
mod error;
mod pinned;
mod view;

pub use adopted::{SliceArray, SliceArrayMut, SliceArrayOwned};
pub use alloc::{AlignedAlloc, BufAlloc, HeapAlloc, is_aligned_to};
pub use complex::Complex64;
pub use error::{Error, Result};
pub use kernel::{MulInplace, cmul_inplace};
pub use pinned::PinnedArray;
pub use view::{NdInfo, NdView, NdViewMut};
