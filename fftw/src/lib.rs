//! Safe lifecycle management for a dynamically loaded FFTW library.
//!
//! The native library is optional at runtime: it is resolved once, on
//! first use, and a host without it degrades to
//! [`Error::LibraryUnavailable`] on every dependent call instead of
//! failing to start. On top of the loaded entry points this crate
//! offers:
//!
//! - [`FftwArray`], a pinned array allocated through `fftw_malloc` so
//!   transforms can take their SIMD fast paths,
//! - [`plan_dft`] / [`plan_dft_r2c`] / [`plan_dft_c2r`], shape-checked
//!   plan construction serialized on a process-wide planner lock,
//! - [`wisdom`], import and export of accumulated planner knowledge.
//!
//! ```no_run
//! use buffer::Complex64;
//! use fftw::{Direction, FftwAlloc, FftwArray, PlannerFlags, plan_dft};
//!
//! let mut input = FftwArray::<Complex64>::with_alloc(FftwAlloc, &[1024])?;
//! let mut output = FftwArray::<Complex64>::with_alloc(FftwAlloc, &[1024])?;
//! let mut plan = plan_dft(
//!     &mut input,
//!     &mut output,
//!     Direction::Forward,
//!     PlannerFlags::ESTIMATE,
//! )?
//! .ok_or(fftw::Error::PlanFailure)?;
//! plan.execute();
//! # Ok::<(), fftw::Error>(())
//! ```

mod api;
mod alloc;
mod plan;
pub mod wisdom;

pub use api::{is_available, plan_with_nthreads, version};
pub use alloc::{FftwAlloc, FftwArray, alignment_of};
pub use buffer::{Error, Result};
pub use plan::{Direction, Plan, PlannerFlags, plan_dft, plan_dft_c2r, plan_dft_r2c};
