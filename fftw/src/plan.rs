//! Transform plans.
//!
//! A plan binds a transform geometry to a concrete pair of buffers. The
//! native planner is not reentrant, so construction and destruction
//! serialize on a process-wide lock; execution is free-threaded. Plans
//! borrow their buffers mutably for their whole lifetime, which rules
//! out freeing or resizing a buffer while a plan still points into it.

use std::ffi::{c_int, c_uint, c_void};
use std::marker::PhantomData;
use std::ptr::NonNull;

use bitflags::bitflags;
use buffer::{Complex64, Error, NdViewMut, Result};

use crate::api::{self, FftwApi};

/// Transform direction, in the native library's sign convention.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum Direction {
    Forward = -1,
    Backward = 1,
}

bitflags! {
    /// Planner rigor and behavior flags.
    ///
    /// `empty()` selects the default `MEASURE` rigor. `WISDOM_ONLY`
    /// turns a planning miss into an absent plan instead of an error.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct PlannerFlags: u32 {
        const EXHAUSTIVE = 1 << 3;
        const PATIENT = 1 << 5;
        const ESTIMATE = 1 << 6;
        const WISDOM_ONLY = 1 << 21;
    }
}

impl PlannerFlags {
    /// Default rigor: time candidate algorithms and pick the fastest.
    pub const MEASURE: PlannerFlags = PlannerFlags::empty();
}

/// An executable transform bound to its buffers.
///
/// Executing runs the transform the plan was built for, over the exact
/// buffers it was built on. Dropping the plan releases the native plan
/// under the planner lock.
pub struct Plan<'buf> {
    handle: NonNull<c_void>,
    api: &'static FftwApi,
    _buffers: PhantomData<&'buf mut ()>,
}

impl Plan<'_> {
    fn wrap(
        api: &'static FftwApi,
        raw: *mut c_void,
        flags: PlannerFlags,
    ) -> Result<Option<Self>> {
        match NonNull::new(raw) {
            Some(handle) => Ok(Some(Plan {
                handle,
                api,
                _buffers: PhantomData,
            })),
            // A null plan is the expected answer to a wisdom-only probe,
            // and a failure otherwise.
            None if flags.contains(PlannerFlags::WISDOM_ONLY) => Ok(None),
            None => Err(Error::PlanFailure),
        }
    }

    pub fn execute(&mut self) {
        unsafe { (self.api.execute)(self.handle.as_ptr()) };
    }
}

impl Drop for Plan<'_> {
    fn drop(&mut self) {
        let _guard = api::planner_lock()
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        unsafe { (self.api.destroy_plan)(self.handle.as_ptr()) };
    }
}

fn dims_i32(shape: &[usize]) -> Result<Vec<c_int>> {
    shape
        .iter()
        .map(|&d| c_int::try_from(d).map_err(|_| Error::InvalidDimension))
        .collect()
}

fn require_equal_shapes(a: &[usize], b: &[usize]) -> Result<()> {
    if a != b {
        return Err(Error::LengthMismatch {
            left: a.iter().product(),
            right: b.iter().product(),
        });
    }
    Ok(())
}

/// The complex side of a real transform is a half-spectrum: the last
/// axis stores `n / 2 + 1` bins for a real axis of length `n`.
fn require_half_spectrum(real: &[usize], complex: &[usize]) -> Result<()> {
    let matches = !real.is_empty()
        && real.len() == complex.len()
        && real[..real.len() - 1] == complex[..complex.len() - 1]
        && complex[complex.len() - 1] == real[real.len() - 1] / 2 + 1;
    if !matches {
        return Err(Error::LengthMismatch {
            left: real.iter().product(),
            right: complex.iter().product(),
        });
    }
    Ok(())
}

/// Plans a complex-to-complex transform of `input` into `output`.
///
/// Both buffers must share one shape. Returns `Ok(None)` only for a
/// `WISDOM_ONLY` probe that found no applicable wisdom.
pub fn plan_dft<'b, I, O>(
    input: &'b mut I,
    output: &'b mut O,
    direction: Direction,
    flags: PlannerFlags,
) -> Result<Option<Plan<'b>>>
where
    I: NdViewMut<Elem = Complex64>,
    O: NdViewMut<Elem = Complex64>,
{
    let api = api::api()?;
    require_equal_shapes(input.dims(), output.dims())?;
    let n = dims_i32(input.dims())?;

    let _guard = api::planner_lock()
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let raw = unsafe {
        (api.plan_dft)(
            n.len() as c_int,
            n.as_ptr(),
            input.as_mut_ptr() as *mut c_void,
            output.as_mut_ptr() as *mut c_void,
            direction as c_int,
            flags.bits() as c_uint,
        )
    };
    Plan::wrap(api, raw, flags)
}

/// Plans a real-to-complex forward transform.
///
/// `output` must hold the half-spectrum of `input`'s shape.
pub fn plan_dft_r2c<'b, I, O>(
    input: &'b mut I,
    output: &'b mut O,
    flags: PlannerFlags,
) -> Result<Option<Plan<'b>>>
where
    I: NdViewMut<Elem = f64>,
    O: NdViewMut<Elem = Complex64>,
{
    let api = api::api()?;
    require_half_spectrum(input.dims(), output.dims())?;
    let n = dims_i32(input.dims())?;

    let _guard = api::planner_lock()
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let raw = unsafe {
        (api.plan_dft_r2c)(
            n.len() as c_int,
            n.as_ptr(),
            input.as_mut_ptr(),
            output.as_mut_ptr() as *mut c_void,
            flags.bits() as c_uint,
        )
    };
    Plan::wrap(api, raw, flags)
}

/// Plans a complex-to-real backward transform.
///
/// `input` must hold the half-spectrum of `output`'s shape. The native
/// transform may scribble over `input` during execution.
pub fn plan_dft_c2r<'b, I, O>(
    input: &'b mut I,
    output: &'b mut O,
    flags: PlannerFlags,
) -> Result<Option<Plan<'b>>>
where
    I: NdViewMut<Elem = Complex64>,
    O: NdViewMut<Elem = f64>,
{
    let api = api::api()?;
    require_half_spectrum(output.dims(), input.dims())?;
    let n = dims_i32(output.dims())?;

    let _guard = api::planner_lock()
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let raw = unsafe {
        (api.plan_dft_c2r)(
            n.len() as c_int,
            n.as_ptr(),
            input.as_mut_ptr() as *mut c_void,
            output.as_mut_ptr(),
            flags.bits() as c_uint,
        )
    };
    Plan::wrap(api, raw, flags)
}
