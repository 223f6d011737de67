use thiserror::Error;

/// Everything that can go wrong while identifying the host CPU.
///
/// None of these are fatal. The public query functions collapse every
/// variant into `false` plus an empty buffer.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("CPUID leaf {requested:#x} not supported (max {max:#x})")]
    UnsupportedLevel { requested: u32, max: u32 },
    #[error("register unavailable: {0}")]
    MissingRegister(&'static str),
    #[error("no matching table entry")]
    NoMatch,
    #[error("invalid output buffer")]
    BufferInvalid,
    #[error("output buffer too small: need {needed} bytes, have {capacity}")]
    BufferTooSmall { needed: usize, capacity: usize },
    #[error("result holds a NUL at byte {position}")]
    InteriorNul { position: usize },
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
