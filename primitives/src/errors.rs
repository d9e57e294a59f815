use thiserror::Error;

extern crate alloc;
use alloc::string::String;

/// Errors related to FFT and polynomial arithmetic.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum PolynomialError {
    /// Error related to Fast Fourier Transform (FFT) operations with a descriptive message.
    #[error("FFT error: {0}")]
    FFTError(String),

    #[error("domain of size {size} exceeds the maximum width {max_width}")]
    DomainTooLarge { size: usize, max_width: usize },

    #[error("division by the zero polynomial")]
    DivisionByZero,

    /// A generic error with a descriptive message.
    #[error("generic error: {0}")]
    GenericError(String),
}

/// Parameter and data errors raised while encoding or decoding chunks.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum EncodingError {
    #[error("number of systematic chunks must be positive")]
    ZeroSystematic,

    #[error("number of parity chunks must be positive")]
    ZeroParity,

    #[error("cannot create number of frame higher than possible {position} (max {max})")]
    TooManyFrames { position: u64, max: u64 },

    #[error("input of {len} field elements exceeds capacity {capacity}")]
    InputTooLarge { len: usize, capacity: usize },

    #[error("insufficient frames: got {got}, need at least {need}")]
    InsufficientFrames { got: usize, need: usize },

    #[error("missing systematic frames: got {got}, need {need}")]
    MissingSystematicFrames { got: usize, need: usize },

    #[error("frame has {got} coefficients, expected {expected}")]
    FrameLengthMismatch { expected: usize, got: usize },

    #[error("{frames} frames supplied with {positions} positions")]
    LengthMismatch { frames: usize, positions: usize },

    #[error("polynomial recovery failed: {0}")]
    RecoveryFailed(String),

    #[error("polynomial error: {0}")]
    PolynomialError(#[from] PolynomialError),
}

/// Errors related to KZG operations.
///
/// Each failed cryptographic check has its own variant so that callers can
/// tell which proof did not hold.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum KzgError {
    /// Wraps errors originating from Polynomial operations.
    #[error("polynomial error: {0}")]
    PolynomialError(#[from] PolynomialError),

    #[error("encoding error: {0}")]
    EncodingError(#[from] EncodingError),

    #[error("MSM error: {0}")]
    MsmError(String),

    /// Error related to serialization with a descriptive message.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// Error when polynomial degree exceeds SRS capacity
    #[error("polynomial degree {polynomial_len} exceeds SRS capacity {srs_len}")]
    SrsCapacityExceeded {
        polynomial_len: usize,
        srs_len: usize,
    },

    #[error("not on curve error: {0}")]
    NotOnCurveError(String),

    /// A generic error with a descriptive message.
    #[error("generic error: {0}")]
    GenericError(String),

    /// Error indicating an invalid input length scenario, typically in data processing.
    #[error("invalid input length")]
    InvalidInputLength,

    /// Error indicating invalid field element bytes that exceed the field modulus.
    #[error("invalid field element: {0}")]
    InvalidFieldElement(String),

    #[error("low degree proof fails")]
    LowDegreeProofFailed,

    #[error("multireveal proof fails for chunk {index}")]
    MultiRevealProofFailed { index: u64 },

    #[error("zero padding proof fails")]
    ZeroPaddingProofFailed,
}

/// Errors raised while decoding a [crate::frame::Frame] from bytes.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum FrameError {
    #[error("frame bytes too short: {len}")]
    TooShort { len: usize },

    #[error("frame declares {expected} bytes but {got} were supplied")]
    LengthMismatch { expected: usize, got: usize },

    #[error("invalid proof point: {0}")]
    InvalidPoint(String),

    #[error("invalid field element: {0}")]
    InvalidFieldElement(String),
}

/// Errors raised while decoding or validating a
/// [crate::header::DataStoreHeader].
#[derive(Clone, Debug, PartialEq, Error)]
pub enum HeaderError {
    #[error("header must be {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },

    #[error("invalid point in header: {0}")]
    InvalidPoint(String),

    #[error("numSys {header} in header does not match {expected} computed from state")]
    InconsistentNumSys { header: u32, expected: u64 },

    #[error("numPar {header} in header does not match {expected} computed from state")]
    InconsistentNumPar { header: u32, expected: u64 },

    #[error("degree {degree} inconsistent with original data size (expected {expected})")]
    InconsistentDegreeAndOrigDataSize { degree: u32, expected: u64 },

    #[error("frame size received {frame_len} != degree claimed in the header {degree}")]
    InconsistentFrameLength { degree: u32, frame_len: u32 },

    #[error("encoding error: {0}")]
    EncodingError(#[from] EncodingError),
}
