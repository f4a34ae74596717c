//! The uniform processing contract every adapter implements

use crate::error::{FinalizeError, InitError, ProcessError};
use crate::params::CipherParameters;

/// Where an adapter is in its session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    Ready,
    Finalized,
}

impl Lifecycle {
    pub(crate) fn check_process(self) -> Result<(), ProcessError> {
        match self {
            Lifecycle::Ready => Ok(()),
            Lifecycle::Uninitialized => Err(ProcessError::NotInitialized),
            Lifecycle::Finalized => Err(ProcessError::Finalized),
        }
    }

    pub(crate) fn check_finalize(self) -> Result<(), FinalizeError> {
        match self {
            Lifecycle::Ready => Ok(()),
            Lifecycle::Uninitialized => Err(FinalizeError::NotInitialized),
            Lifecycle::Finalized => Err(FinalizeError::Finalized),
        }
    }
}

/// Buffered cipher processing: `init`, any number of `process_bytes`,
/// `do_final`, optionally `reset` and go again.
///
/// Output is independent of how input is split across `process_bytes`
/// calls. Use [`output_size`](Self::output_size) to size the buffer for a
/// whole session and [`update_output_size`](Self::update_output_size) for a
/// single `process_bytes` call.
///
/// `reset` keeps the key and IV from the last `init`: a reset adapter is
/// `Ready` again and reproduces the ciphertext of a fresh session. An adapter
/// that was never initialised stays `Uninitialized`.
pub trait BlockCipherAdapter {
    /// Upper bound on the bytes `process_bytes(len)` followed by `do_final`
    /// would emit from the current state. Over-estimates by at most one
    /// block.
    fn output_size(&self, len: usize) -> usize;

    /// Exact number of bytes `process_bytes(len)` would emit now.
    fn update_output_size(&self, len: usize) -> usize;

    fn init(&mut self, for_encryption: bool, params: &CipherParameters) -> Result<(), InitError>;

    /// Consume `input[in_off..in_off + len]`, writing whole transformed
    /// blocks to `output[out_off..]`. Returns the number of bytes written.
    /// On error nothing has been consumed.
    fn process_bytes(
        &mut self,
        input: &[u8],
        in_off: usize,
        len: usize,
        output: &mut [u8],
        out_off: usize,
    ) -> Result<usize, ProcessError>;

    /// Flush buffered bytes, apply or strip padding, and end the session.
    fn do_final(&mut self, output: &mut [u8], out_off: usize) -> Result<usize, FinalizeError>;

    fn reset(&mut self);

    fn lifecycle(&self) -> Lifecycle;

    fn algorithm_name(&self) -> String;
}

impl<A: BlockCipherAdapter + ?Sized> BlockCipherAdapter for Box<A> {
    fn output_size(&self, len: usize) -> usize {
        (**self).output_size(len)
    }

    fn update_output_size(&self, len: usize) -> usize {
        (**self).update_output_size(len)
    }

    fn init(&mut self, for_encryption: bool, params: &CipherParameters) -> Result<(), InitError> {
        (**self).init(for_encryption, params)
    }

    fn process_bytes(
        &mut self,
        input: &[u8],
        in_off: usize,
        len: usize,
        output: &mut [u8],
        out_off: usize,
    ) -> Result<usize, ProcessError> {
        (**self).process_bytes(input, in_off, len, output, out_off)
    }

    fn do_final(&mut self, output: &mut [u8], out_off: usize) -> Result<usize, FinalizeError> {
        (**self).do_final(output, out_off)
    }

    fn reset(&mut self) {
        (**self).reset()
    }

    fn lifecycle(&self) -> Lifecycle {
        (**self).lifecycle()
    }

    fn algorithm_name(&self) -> String {
        (**self).algorithm_name()
    }
}

/// Validate the input range of a `process_bytes` call.
pub(crate) fn input_range(input: &[u8], in_off: usize, len: usize) -> Result<std::ops::Range<usize>, ProcessError> {
    match in_off.checked_add(len) {
        Some(end) if end <= input.len() => Ok(in_off..end),
        _ => Err(ProcessError::InvalidRange {
            offset: in_off,
            len,
            available: input.len(),
        }),
    }
}

/// Bytes available in `output` from `out_off` on.
pub(crate) fn available(output: &[u8], out_off: usize) -> usize {
    output.len().saturating_sub(out_off)
}
