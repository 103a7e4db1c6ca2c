use thiserror::Error;

/// Error taxonomy shared by the buffer core and the native-library layer.
///
/// Shape, rank and type errors are detected at construction or index time
/// and reported immediately; nothing is clamped or truncated. Disposal
/// never reports an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A dimension vector is empty, contains a zero entry, or its product
    /// overflows.
    #[error("dimension vector is empty or contains an invalid entry")]
    InvalidDimension,

    /// An index vector's length differs from the array's rank.
    #[error("index vector has {got} entries, array rank is {expected}")]
    RankMismatch { expected: usize, got: usize },

    /// An index entry is outside its axis bound (checked path only).
    #[error("index {index} out of range for axis {axis} of length {len}")]
    IndexOutOfRange { axis: usize, index: usize, len: usize },

    /// A byte buffer cannot be viewed as the requested element type
    /// (misaligned start or a trailing partial element).
    #[error("byte buffer cannot be viewed as the requested element type")]
    TypeMismatch,

    /// The requested alignment is not a power of two at least as large as a
    /// pointer.
    #[error("alignment {0} is not a supported power of two")]
    InvalidAlignment(usize),

    /// Two operands that must pair off element-by-element have incompatible
    /// lengths.
    #[error("operand lengths are incompatible: left {left}, right {right}")]
    LengthMismatch { left: usize, right: usize },

    /// A checked operation was attempted after the buffer was released.
    #[error("buffer accessed after dispose")]
    UseAfterDispose,

    /// The underlying allocator reported out of memory.
    #[error("allocation of {0} bytes failed")]
    AllocationFailed(usize),

    /// The native FFT library could not be located at process start.
    #[error("native FFT library is not available")]
    LibraryUnavailable,

    /// The planner returned a null plan without `WISDOM_ONLY` being set.
    #[error("planner returned a null plan")]
    PlanFailure,

    /// A wisdom file path contains an interior NUL byte.
    #[error("path contains an interior NUL byte")]
    InvalidPath,
}

pub type Result<T> = std::result::Result<T, Error>;
