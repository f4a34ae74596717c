//! Error types for cipher adapter operations
//!
//! Every phase of the adapter lifecycle has its own error type so that a
//! caller can always tell "the data was invalid" apart from "the API was
//! misused". Nothing in this crate collapses these kinds into one.

use thiserror::Error;

/// Failure configuring a cipher with key material.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InitError {
    #[error("Invalid key length for {algorithm}: {actual} bytes (expected {expected})")]
    InvalidKeyLength {
        algorithm: &'static str,
        expected: &'static str,
        actual: usize,
    },

    #[error("{0} requires an IV")]
    MissingIv(&'static str),

    #[error("Invalid IV length for {mode}: {actual} bytes (expected {expected})")]
    InvalidIvLength {
        mode: &'static str,
        expected: String,
        actual: usize,
    },

    #[error("{0} does not accept an IV")]
    UnexpectedIv(&'static str),

    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),
}

/// Failure of a single block or keystream transform.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    #[error("{0} not initialised")]
    NotInitialized(&'static str),

    #[error("Block too short: {actual} bytes (block size {block_size})")]
    BlockLength { block_size: usize, actual: usize },

    #[error("Output buffer too short: {actual} bytes (need {needed})")]
    OutputLength { needed: usize, actual: usize },
}

/// Failure feeding bytes into an adapter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessError {
    #[error("Cipher not initialised")]
    NotInitialized,

    #[error("Cipher already finalised; call init or reset first")]
    Finalized,

    #[error("Input range {offset}+{len} exceeds buffer of {available} bytes")]
    InvalidRange {
        offset: usize,
        len: usize,
        available: usize,
    },

    #[error("Output buffer too small: need {needed} bytes, {available} available")]
    BufferTooSmall { needed: usize, available: usize },

    #[error(transparent)]
    Transform(#[from] TransformError),
}

/// Failure finishing an adapter session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FinalizeError {
    /// The ciphertext failed padding or authentication checks, or was
    /// truncated. Expected under corrupted or adversarial input.
    #[error("Invalid ciphertext: {0}")]
    InvalidCiphertext(String),

    /// The caller under-sized the output buffer.
    #[error("Output buffer too small: need {needed} bytes, {available} available")]
    BufferTooSmall { needed: usize, available: usize },

    #[error("Cipher not initialised")]
    NotInitialized,

    #[error("Cipher already finalised; call init or reset first")]
    Finalized,

    /// Unpadded block mode asked to encrypt a trailing partial block.
    #[error("Data not block aligned: {remaining} bytes left over")]
    IncompleteBlock { remaining: usize },

    #[error(transparent)]
    Transform(#[from] TransformError),
}

impl FinalizeError {
    /// True for failures caused by the data rather than by the caller.
    pub fn is_invalid_ciphertext(&self) -> bool {
        matches!(self, FinalizeError::InvalidCiphertext(_))
    }
}

/// Malformed padding found while unpadding a final block.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaddingError {
    #[error("Pad block corrupted")]
    Corrupted,

    #[error("Pad count {count} out of range for block of {block_size} bytes")]
    InvalidCount { count: usize, block_size: usize },
}

impl From<PaddingError> for FinalizeError {
    fn from(err: PaddingError) -> Self {
        FinalizeError::InvalidCiphertext(err.to_string())
    }
}

/// Failure parsing an `ALG/MODE/PADDING` cipher specification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpecError {
    #[error("Invalid cipher specification '{0}' (expected ALG/MODE/PADDING)")]
    Malformed(String),

    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Unsupported mode: {0}")]
    UnsupportedMode(String),

    #[error("Unsupported padding: {0}")]
    UnsupportedPadding(String),
}

/// Umbrella error for whole-buffer and streaming helpers.
#[derive(Error, Debug)]
pub enum CipherError {
    #[error(transparent)]
    Init(#[from] InitError),

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error(transparent)]
    Finalize(#[from] FinalizeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CipherError {
    /// True when the underlying failure is [`FinalizeError::InvalidCiphertext`].
    pub fn is_invalid_ciphertext(&self) -> bool {
        matches!(self, CipherError::Finalize(e) if e.is_invalid_ciphertext())
    }
}

pub type Result<T> = std::result::Result<T, CipherError>;
