//! block-crypt: file encryption through the block-adapter engine
//!
//! Output layout: `IV || ciphertext [|| tag]`. The IV is generated fresh for
//! every encryption and only present when the mode takes one.

use block_adapter::{
    process_stream, AuthenticatedCipher, BlockCipherAdapter, BlockCipherSpec, CipherError,
    CipherParameters, FinalizeError,
};
use clap::{Parser, ValueEnum};
use rand::rngs::OsRng;
use rand::RngCore;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Encrypt or decrypt a file with a block cipher in the chosen mode
#[derive(Parser)]
#[command(
    name = "block-crypt",
    about = "Encrypt/decrypt files with a buffered block cipher",
    long_about = "
Reads the input file, runs it through the cipher described by --cipher and
writes the result to --output.

INPUT FORMAT:
- Key file: the key as hex (16, 24 or 32 bytes), whitespace ignored
- Encrypted files start with the IV when the mode uses one (all but ECB)

LOGGING:
RUST_LOG overrides the log filter; --verbose sets it to debug.
"
)]
#[command(version, author)]
struct Args {
    /// Operation: encrypt or decrypt
    #[arg(long, value_enum)]
    operation: Operation,

    /// Path to the input file
    #[arg(long, value_name = "INPUT_FILE")]
    file: PathBuf,

    /// Path to the key file (hex)
    #[arg(long, value_name = "KEY_FILE")]
    key: PathBuf,

    /// Output destination (file or directory)
    ///
    /// For a directory, the output file gets the input file's name.
    #[arg(long, value_name = "OUTPUT_DESTINATION")]
    output: PathBuf,

    /// Cipher as ALG/MODE/PADDING
    #[arg(long, default_value = "AES/CBC/PKCS7Padding")]
    cipher: BlockCipherSpec,

    /// Append and verify an HMAC-SHA256 tag
    #[arg(long)]
    authenticate: bool,

    /// Log lifecycle events at debug level
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Operation {
    Encrypt,
    Decrypt,
}

impl Operation {
    fn is_encrypt(self) -> bool {
        self == Operation::Encrypt
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Reads a hex key, ignoring whitespace and line breaks.
fn read_key(file_path: &Path) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    if !file_path.is_file() {
        return Err(format!("Key file not found: {}", file_path.display()).into());
    }

    let content = fs::read_to_string(file_path)
        .map_err(|e| format!("Failed to read key file {}: {}", file_path.display(), e))?;
    let cleaned: String = content.chars().filter(|c| !c.is_whitespace()).collect();

    hex::decode(&cleaned)
        .map_err(|e| format!("Key file {} is not valid hex: {}", file_path.display(), e).into())
}

/// Determines the final output path.
///
/// If `output_destination` is a directory the input's file name is used
/// inside it; otherwise `output_destination` is the file path.
fn resolve_output_path(
    output_destination: &Path,
    input_path: &Path,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let output_path = if output_destination.is_dir() {
        let input_filename = input_path.file_name().ok_or("Invalid input file name")?;
        output_destination.join(input_filename)
    } else {
        output_destination.to_path_buf()
    };

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Cannot create directory {}: {}", parent.display(), e))?;
    }

    Ok(output_path)
}

fn build_cipher(spec: &BlockCipherSpec, authenticate: bool) -> Box<dyn BlockCipherAdapter + Send> {
    let mut cipher = spec.new_cipher();
    if authenticate {
        cipher = Box::new(AuthenticatedCipher::new(cipher));
    }
    cipher
}

/// Runs the whole operation over arbitrary streams. Returns bytes written.
fn transform<R: Read, W: Write>(
    operation: Operation,
    spec: &BlockCipherSpec,
    authenticate: bool,
    key: Vec<u8>,
    reader: &mut R,
    writer: &mut W,
) -> Result<u64, CipherError> {
    let mut params = CipherParameters::new(key);
    let mut header = 0u64;

    if let Some(iv_len) = spec.iv_len() {
        let mut iv = vec![0u8; iv_len];
        if operation.is_encrypt() {
            OsRng.fill_bytes(&mut iv);
            writer.write_all(&iv)?;
            header = iv_len as u64;
        } else {
            reader.read_exact(&mut iv).map_err(|e| match e.kind() {
                ErrorKind::UnexpectedEof => CipherError::Finalize(FinalizeError::InvalidCiphertext(
                    "input shorter than the IV".to_string(),
                )),
                _ => CipherError::Io(e),
            })?;
        }
        params = params.with_iv(iv);
    }

    let mut cipher = build_cipher(spec, authenticate);
    cipher.init(operation.is_encrypt(), &params)?;
    debug!(cipher = %cipher.algorithm_name(), ?operation, "starting");

    let written = process_stream(&mut cipher, reader, writer)?;
    Ok(header + written)
}

fn run(args: &Args) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let key = read_key(&args.key)?;
    let output_path = resolve_output_path(&args.output, &args.file)?;

    let input = File::open(&args.file)
        .map_err(|e| format!("Failed to open {}: {}", args.file.display(), e))?;
    let output = File::create(&output_path)
        .map_err(|e| format!("Failed to create {}: {}", output_path.display(), e))?;

    let result = transform(
        args.operation,
        &args.cipher,
        args.authenticate,
        key,
        &mut BufReader::new(input),
        &mut BufWriter::new(output),
    );

    match result {
        Ok(written) => {
            info!(bytes = written, output = %output_path.display(), "done");
            Ok(output_path)
        }
        Err(err) => {
            // Never leave partial plaintext or ciphertext behind.
            let _ = fs::remove_file(&output_path);
            Err(err.into())
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(output_path) => {
            println!("{:?} finished.", args.operation);
            println!("Result written to: {}", output_path.display());
            ExitCode::SUCCESS
        }
        Err(err) => match err.downcast_ref::<CipherError>() {
            Some(cipher_err) if cipher_err.is_invalid_ciphertext() => {
                eprintln!("Decryption rejected: {}", cipher_err);
                ExitCode::from(2)
            }
            _ => {
                eprintln!("Error: {}", err);
                ExitCode::FAILURE
            }
        },
    }
}
