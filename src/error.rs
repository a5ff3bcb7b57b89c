use thiserror::Error;

/// Errors surfaced while decoding a FIT file.
///
/// The fatal variants abort the current sub-file and are collected by
/// [`crate::Decoder::read`]; everything recoverable (field size coercion,
/// unknown global messages, orphan developer fields) is handled in place
/// and never reaches the caller.
#[derive(Debug, Error)]
pub enum FitError {
    #[error("not a FIT file at byte {position}")]
    NotAFitFile { position: usize },

    #[error("CRC mismatch, file says {expected:#06x} but computed {computed:#06x}")]
    CrcMismatch { expected: u16, computed: u16 },

    #[error("unknown base type {base_type:#04x} in definition at byte {position}")]
    UnknownBaseType { base_type: u8, position: usize },

    #[error("no live definition for local message number {local_mesg_num}")]
    UnknownLocalMesgNum { local_mesg_num: u8 },

    #[error("compressed timestamp messages are not supported (byte {position})")]
    CompressedTimestampUnsupported { position: usize },

    #[error("end of stream, needed {needed} bytes but only {remaining} remain")]
    EndOfStream { needed: usize, remaining: usize },

    #[error("bit stream exhausted")]
    OutOfBits,

    #[error("invalid options: {0}")]
    InvalidOptions(&'static str),
}

pub type Result<T> = std::result::Result<T, FitError>;
