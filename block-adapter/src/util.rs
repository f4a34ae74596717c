//! Whole-buffer and streaming helpers over any adapter

use std::io::{ErrorKind, Read, Write};

use tracing::debug;

use crate::adapter::BlockCipherAdapter;
use crate::error::Result;

/// Read size used by [`process_stream`].
pub const STREAM_CHUNK_SIZE: usize = 8192;

/// Run `input` through an initialised adapter and finalise it.
///
/// ```rust
/// use block_adapter::{
///     process_all, AesEngine, BlockCipherAdapter, BufferedBlockCipher, CbcBlockCipher,
///     CipherParameters, Pkcs7Padding,
/// };
///
/// let params = CipherParameters::new(b"my-secret-key-16".to_vec())
///     .with_iv(b"initialization16".to_vec());
///
/// let mut cipher = BufferedBlockCipher::with_padding(CbcBlockCipher::new(AesEngine::new()), Pkcs7Padding);
/// cipher.init(true, &params)?;
/// let encrypted = process_all(&mut cipher, b"Hello, World!")?;
/// assert_eq!(encrypted.len(), 16);
///
/// cipher.init(false, &params)?;
/// let decrypted = process_all(&mut cipher, &encrypted)?;
/// assert_eq!(decrypted, b"Hello, World!");
/// # Ok::<(), block_adapter::CipherError>(())
/// ```
pub fn process_all<A>(cipher: &mut A, input: &[u8]) -> Result<Vec<u8>>
where
    A: BlockCipherAdapter + ?Sized,
{
    let mut output = vec![0u8; cipher.output_size(input.len())];
    let processed = cipher.process_bytes(input, 0, input.len(), &mut output, 0)?;
    let finished = cipher.do_final(&mut output, processed)?;
    output.truncate(processed + finished);
    Ok(output)
}

/// Pump `reader` through an initialised adapter into `writer`.
/// Returns the number of bytes written.
pub fn process_stream<A, R, W>(cipher: &mut A, reader: &mut R, writer: &mut W) -> Result<u64>
where
    A: BlockCipherAdapter + ?Sized,
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let mut in_buf = vec![0u8; STREAM_CHUNK_SIZE];
    let mut out_buf = vec![0u8; cipher.update_output_size(STREAM_CHUNK_SIZE)];
    let mut total_in = 0u64;
    let mut total_out = 0u64;

    loop {
        let read = match reader.read(&mut in_buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        total_in += read as u64;

        let needed = cipher.update_output_size(read);
        if out_buf.len() < needed {
            out_buf.resize(needed, 0);
        }
        let written = cipher.process_bytes(&in_buf, 0, read, &mut out_buf, 0)?;
        writer.write_all(&out_buf[..written])?;
        total_out += written as u64;
    }

    let needed = cipher.output_size(0);
    if out_buf.len() < needed {
        out_buf.resize(needed, 0);
    }
    let written = cipher.do_final(&mut out_buf, 0)?;
    writer.write_all(&out_buf[..written])?;
    writer.flush()?;
    total_out += written as u64;

    debug!(total_in, total_out, "stream processed");
    Ok(total_out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffered::BufferedBlockCipher;
    use crate::engines::AesEngine;
    use crate::modes::CbcBlockCipher;
    use crate::padding::Pkcs7Padding;
    use crate::params::CipherParameters;
    use std::io::Cursor;

    fn cipher(for_encryption: bool) -> BufferedBlockCipher<CbcBlockCipher<AesEngine>> {
        let mut c = BufferedBlockCipher::with_padding(CbcBlockCipher::new(AesEngine::new()), Pkcs7Padding);
        let params = CipherParameters::new(vec![3u8; 24]).with_iv(vec![4u8; 16]);
        c.init(for_encryption, &params).unwrap();
        c
    }

    #[test]
    fn test_stream_matches_whole_buffer() {
        let plaintext: Vec<u8> = (0..STREAM_CHUNK_SIZE * 2 + 123).map(|i| (i % 251) as u8).collect();
        let expected = process_all(&mut cipher(true), &plaintext).unwrap();

        let mut streamed = Vec::new();
        let written = process_stream(&mut cipher(true), &mut Cursor::new(&plaintext), &mut streamed).unwrap();
        assert_eq!(written as usize, streamed.len());
        assert_eq!(streamed, expected);

        let mut decrypted = Vec::new();
        process_stream(&mut cipher(false), &mut Cursor::new(&streamed), &mut decrypted).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_stream_empty_input() {
        let mut out = Vec::new();
        let written = process_stream(&mut cipher(true), &mut Cursor::new(Vec::new()), &mut out).unwrap();
        assert_eq!(written, 16);
    }

    #[test]
    fn test_stream_reports_bad_ciphertext() {
        let mut out = Vec::new();
        let err = process_stream(&mut cipher(false), &mut Cursor::new(vec![0u8; 15]), &mut out)
            .unwrap_err();
        assert!(err.is_invalid_ciphertext());
    }
}
