//! Runtime loading of the native FFTW library.
//!
//! The library is resolved dynamically, once per process. A host without
//! the library is a supported configuration: loading fails quietly, the
//! manager stays disabled, and every dependent call reports
//! [`Error::LibraryUnavailable`] instead of crashing.

use std::ffi::{c_char, c_int, c_uint, c_void};
use std::sync::{Mutex, OnceLock};

use buffer::{Error, Result};

/// Byte-oriented write callback used by the wisdom export entry point.
pub(crate) type WriteChar = unsafe extern "C" fn(c: c_char, data: *mut c_void);

type FnInitThreads = unsafe extern "C" fn() -> c_int;
type FnPlanWithNthreads = unsafe extern "C" fn(nthreads: c_int);
type FnPlanDft = unsafe extern "C" fn(
    rank: c_int,
    n: *const c_int,
    input: *mut c_void,
    output: *mut c_void,
    sign: c_int,
    flags: c_uint,
) -> *mut c_void;
type FnPlanDftR2c = unsafe extern "C" fn(
    rank: c_int,
    n: *const c_int,
    input: *mut f64,
    output: *mut c_void,
    flags: c_uint,
) -> *mut c_void;
type FnPlanDftC2r = unsafe extern "C" fn(
    rank: c_int,
    n: *const c_int,
    input: *mut c_void,
    output: *mut f64,
    flags: c_uint,
) -> *mut c_void;
type FnDestroyPlan = unsafe extern "C" fn(plan: *mut c_void);
type FnExecute = unsafe extern "C" fn(plan: *mut c_void);
type FnExportWisdom = unsafe extern "C" fn(write_char: WriteChar, data: *mut c_void);
type FnWisdomFilename = unsafe extern "C" fn(filename: *const c_char) -> c_int;
type FnImportWisdomString = unsafe extern "C" fn(wisdom: *const c_char) -> c_int;
type FnForgetWisdom = unsafe extern "C" fn();
type FnMalloc = unsafe extern "C" fn(size: usize) -> *mut c_void;
type FnFree = unsafe extern "C" fn(ptr: *mut c_void);
type FnAlignmentOf = unsafe extern "C" fn(ptr: *mut f64) -> c_int;

/// Resolved entry points of the native library.
///
/// Threading symbols are optional: a build of the library without combined
/// threads still loads, it just cannot enable threaded planning.
pub(crate) struct FftwApi {
    pub init_threads: Option<FnInitThreads>,
    pub plan_with_nthreads: Option<FnPlanWithNthreads>,
    pub plan_dft: FnPlanDft,
    pub plan_dft_r2c: FnPlanDftR2c,
    pub plan_dft_c2r: FnPlanDftC2r,
    pub destroy_plan: FnDestroyPlan,
    pub execute: FnExecute,
    pub export_wisdom: FnExportWisdom,
    pub export_wisdom_to_filename: FnWisdomFilename,
    pub import_wisdom_from_filename: FnWisdomFilename,
    pub import_wisdom_from_string: FnImportWisdomString,
    pub forget_wisdom: FnForgetWisdom,
    pub malloc: FnMalloc,
    pub free: FnFree,
    pub alignment_of: FnAlignmentOf,
}

pub(crate) struct Loaded {
    pub api: FftwApi,
    pub version: Option<String>,
}

static FFTW: OnceLock<Option<Loaded>> = OnceLock::new();

/// The native planner is not thread-safe; plan construction and
/// destruction serialize on this lock.
pub(crate) fn planner_lock() -> &'static Mutex<()> {
    static LOCK: Mutex<()> = Mutex::new(());
    &LOCK
}

#[cfg(target_os = "linux")]
const LIB_NAMES: &[&str] = &["libfftw3.so.3", "libfftw3.so"];

#[cfg(target_os = "macos")]
const LIB_NAMES: &[&str] = &["libfftw3.dylib", "libfftw3.3.dylib"];

#[cfg(target_os = "windows")]
const LIB_NAMES: &[&str] = &["libfftw3-3.dll", "fftw3.dll"];

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
const LIB_NAMES: &[&str] = &[];

fn try_load(name: &str) -> Option<FftwApi> {
    tracing::debug!("attempting to load native FFT library: {name}");

    // Safety: symbols come from a library with a stable C ABI; the
    // signatures above must match it exactly.
    unsafe {
        let lib = libloading::Library::new(name).ok()?;

        let init_threads = lib
            .get::<FnInitThreads>(b"fftw_init_threads")
            .ok()
            .map(|s| *s);
        let plan_with_nthreads = lib
            .get::<FnPlanWithNthreads>(b"fftw_plan_with_nthreads")
            .ok()
            .map(|s| *s);
        let plan_dft: libloading::Symbol<FnPlanDft> = lib.get(b"fftw_plan_dft").ok()?;
        let plan_dft_r2c: libloading::Symbol<FnPlanDftR2c> = lib.get(b"fftw_plan_dft_r2c").ok()?;
        let plan_dft_c2r: libloading::Symbol<FnPlanDftC2r> = lib.get(b"fftw_plan_dft_c2r").ok()?;
        let destroy_plan: libloading::Symbol<FnDestroyPlan> = lib.get(b"fftw_destroy_plan").ok()?;
        let execute: libloading::Symbol<FnExecute> = lib.get(b"fftw_execute").ok()?;
        let export_wisdom: libloading::Symbol<FnExportWisdom> =
            lib.get(b"fftw_export_wisdom").ok()?;
        let export_wisdom_to_filename: libloading::Symbol<FnWisdomFilename> =
            lib.get(b"fftw_export_wisdom_to_filename").ok()?;
        let import_wisdom_from_filename: libloading::Symbol<FnWisdomFilename> =
            lib.get(b"fftw_import_wisdom_from_filename").ok()?;
        let import_wisdom_from_string: libloading::Symbol<FnImportWisdomString> =
            lib.get(b"fftw_import_wisdom_from_string").ok()?;
        let forget_wisdom: libloading::Symbol<FnForgetWisdom> =
            lib.get(b"fftw_forget_wisdom").ok()?;
        let malloc: libloading::Symbol<FnMalloc> = lib.get(b"fftw_malloc").ok()?;
        let free: libloading::Symbol<FnFree> = lib.get(b"fftw_free").ok()?;
        let alignment_of: libloading::Symbol<FnAlignmentOf> =
            lib.get(b"fftw_alignment_of").ok()?;

        let api = FftwApi {
            init_threads,
            plan_with_nthreads,
            plan_dft: *plan_dft,
            plan_dft_r2c: *plan_dft_r2c,
            plan_dft_c2r: *plan_dft_c2r,
            destroy_plan: *destroy_plan,
            execute: *execute,
            export_wisdom: *export_wisdom,
            export_wisdom_to_filename: *export_wisdom_to_filename,
            import_wisdom_from_filename: *import_wisdom_from_filename,
            import_wisdom_from_string: *import_wisdom_from_string,
            forget_wisdom: *forget_wisdom,
            malloc: *malloc,
            free: *free,
            alignment_of: *alignment_of,
        };

        // Keep the library mapped for the rest of the process: raw
        // function pointers outlive the Library handle.
        std::mem::forget(lib);

        tracing::info!("loaded native FFT library: {name}");
        Some(api)
    }
}

fn init_process() -> Option<Loaded> {
    let api = LIB_NAMES.iter().find_map(|name| try_load(name));
    let Some(api) = api else {
        tracing::debug!("no usable native FFT library found; manager disabled");
        return None;
    };

    if let Some(init) = api.init_threads {
        if unsafe { init() } == 0 {
            tracing::warn!("fftw_init_threads failed; threaded planning disabled");
        }
    }

    let version = scan_version(&api);
    match &version {
        Some(v) => tracing::info!("native FFT library version {v}"),
        None => tracing::warn!("could not recover library version from wisdom header"),
    }

    Some(Loaded { api, version })
}

fn loaded() -> Option<&'static Loaded> {
    FFTW.get_or_init(init_process).as_ref()
}

pub(crate) fn api() -> Result<&'static FftwApi> {
    loaded().map(|l| &l.api).ok_or(Error::LibraryUnavailable)
}

/// True when the native library was found and initialized.
pub fn is_available() -> bool {
    loaded().is_some()
}

/// Library version recovered from the wisdom header, e.g. `3.3.10`.
/// `None` when the library is unavailable.
pub fn version() -> Option<&'static str> {
    loaded()?.version.as_deref()
}

/// Enables threaded execution for plans built afterwards.
///
/// Must be called before plan construction to take effect. Fails with
/// [`Error::LibraryUnavailable`] when the library (or its threading
/// build) is absent.
pub fn plan_with_nthreads(nthreads: usize) -> Result<()> {
    let api = api()?;
    let f = api.plan_with_nthreads.ok_or(Error::LibraryUnavailable)?;
    unsafe { f(nthreads as c_int) };
    Ok(())
}

const VERSION_PREFIX: &[u8] = b"fftw-";

/// Scanner for the version string embedded in the wisdom header.
///
/// The header starts with `(fftw-X.Y.Z ...`; the scanner matches the
/// fixed prefix and then captures up to the next whitespace.
#[derive(Default)]
struct VersionScan {
    matched: usize,
    done: bool,
    out: Vec<u8>,
}

impl VersionScan {
    fn push(&mut self, c: u8) {
        if self.done {
            return;
        }
        if self.matched == VERSION_PREFIX.len() {
            if c == b' ' {
                self.done = true;
            } else {
                self.out.push(c);
            }
        } else if c == VERSION_PREFIX[self.matched] {
            self.matched += 1;
        } else {
            self.matched = 0;
        }
    }
}

unsafe extern "C" fn capture_version(c: c_char, data: *mut c_void) {
    let scan = unsafe { &mut *(data as *mut VersionScan) };
    scan.push(c as u8);
}

fn scan_version(api: &FftwApi) -> Option<String> {
    let mut scan = VersionScan::default();
    unsafe {
        (api.export_wisdom)(
            capture_version,
            &mut scan as *mut VersionScan as *mut c_void,
        )
    };
    if scan.out.is_empty() {
        None
    } else {
        Some(String::from_utf8_lossy(&scan.out).into_owned())
    }
}
