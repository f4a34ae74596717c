//! # Block Adapter Library
//!
//! One processing contract for block ciphers: `init`, feed bytes with
//! `process_bytes`, finish with `do_final`, `reset` and go again. The
//! buffering, padding and finalisation logic is written once, generically,
//! against a small [`BlockCipher`] trait, so any keyed block transform can be
//! driven the same way.
//!
//! ## Pieces
//!
//! - [`BlockCipher`] - one keyed block in, one block out (AES, or a mode
//!   wrapping another `BlockCipher`)
//! - [`BufferedBlockCipher`] - accumulates input into whole blocks, pads on
//!   encryption and unpads on decryption
//! - [`StreamCipherAdapter`] - pass-through for byte-oriented transforms
//! - [`AuthenticatedCipher`] - encrypt-then-MAC over any adapter
//! - [`BlockCipherSpec`] - builds adapters from strings like `AES/CBC/PKCS7Padding`
//!
//! ## Usage
//!
//! ```rust
//! use block_adapter::{BlockCipherAdapter, BlockCipherSpec, CipherParameters};
//!
//! let spec: BlockCipherSpec = "AES/CBC/PKCS7Padding".parse()?;
//! let params = CipherParameters::new(b"my-secret-key-16".to_vec())
//!     .with_iv(b"initialization16".to_vec());
//!
//! let mut cipher = spec.new_cipher();
//! cipher.init(true, &params)?;
//!
//! // Size the output for the whole session up front.
//! let plaintext = b"Hello, World! More than one block.";
//! let mut out = vec![0u8; cipher.output_size(plaintext.len())];
//! let mut written = cipher.process_bytes(plaintext, 0, 10, &mut out, 0)?;
//! written += cipher.process_bytes(plaintext, 10, plaintext.len() - 10, &mut out, written)?;
//! written += cipher.do_final(&mut out, written)?;
//! assert_eq!(written, 48);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Errors
//!
//! Decryption of corrupted data ends in [`FinalizeError::InvalidCiphertext`];
//! an under-sized output buffer in `BufferTooSmall`. The two are never merged,
//! so callers can reject a message without treating it as a bug.

// Public modules
pub mod adapter;
pub mod authenticated;
pub mod buffered;
pub mod cipher;
pub mod cipher_spec;
pub mod engines;
pub mod error;
pub mod modes;
pub mod padding;
pub mod params;
pub mod stream;
pub mod util;

// Re-exports for easy access
pub use adapter::{BlockCipherAdapter, Lifecycle};
pub use authenticated::{AuthenticatedCipher, TAG_LEN};
pub use buffered::BufferedBlockCipher;
pub use cipher::{BlockCipher, Direction, StreamCipher};
pub use cipher_spec::{Algorithm, BlockCipherSpec, Mode, PaddingScheme};
pub use engines::AesEngine;
pub use error::{
    CipherError, FinalizeError, InitError, PaddingError, ProcessError, Result, SpecError,
    TransformError,
};
pub use modes::{CbcBlockCipher, CtrBlockCipher, OfbBlockCipher};
pub use padding::{BlockCipherPadding, Iso7816d4Padding, Pkcs7Padding, ZeroBytePadding};
pub use params::CipherParameters;
pub use stream::StreamCipherAdapter;
pub use util::{process_all, process_stream};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_adapters_are_send() {
        fn assert_send<T: Send>() {}
        assert_send::<BufferedBlockCipher<CbcBlockCipher<AesEngine>>>();
        assert_send::<StreamCipherAdapter<CtrBlockCipher<AesEngine>>>();
        assert_send::<AuthenticatedCipher<Box<dyn BlockCipherAdapter + Send>>>();
    }

    #[test]
    fn test_all_modes_integration() {
        let key = b"test-key-16-byte";
        let plaintext = b"Integration test message for all modes!";
        let iv = b"initialization16";

        for spec in ["AES/ECB/PKCS7Padding", "AES/CBC/PKCS7Padding", "AES/CTR/NoPadding", "AES/OFB/NoPadding"] {
            let spec: BlockCipherSpec = spec.parse().unwrap();
            let mut params = CipherParameters::new(key.to_vec());
            if spec.mode.needs_iv() {
                params = params.with_iv(iv.to_vec());
            }

            let mut cipher = spec.new_cipher();
            cipher.init(true, &params).unwrap();
            let encrypted = process_all(&mut cipher, plaintext).unwrap();
            assert_ne!(&encrypted[..plaintext.len()], &plaintext[..]);

            cipher.init(false, &params).unwrap();
            let decrypted = process_all(&mut cipher, &encrypted).unwrap();
            assert_eq!(plaintext, &decrypted[..]);
        }
    }

    #[test]
    fn test_different_key_lengths() {
        let plaintext = b"Test with various key lengths";
        for key_len in [16, 24, 32] {
            let params = CipherParameters::new(vec![0x42; key_len]).with_iv(vec![0u8; 16]);
            let mut cipher = BufferedBlockCipher::with_padding(CbcBlockCipher::new(AesEngine::new()), Pkcs7Padding);
            cipher.init(true, &params).unwrap();
            let encrypted = process_all(&mut cipher, plaintext).unwrap();
            cipher.init(false, &params).unwrap();
            assert_eq!(process_all(&mut cipher, &encrypted).unwrap(), plaintext);
        }

        let mut cipher = BufferedBlockCipher::new(AesEngine::new());
        assert!(matches!(
            cipher.init(true, &CipherParameters::new(b"short".to_vec())),
            Err(InitError::InvalidKeyLength { actual: 5, .. })
        ));
    }
}
