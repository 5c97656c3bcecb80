//! Hashing utilities for integrity checks.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{bail, Context, Result};
use sha2::{Digest, Sha256, Sha512};

/// Digest algorithms accepted in integrity fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Md5,
    Sha256,
    Sha512,
}

impl Algorithm {
    /// Parse an algorithm name such as `sha256` or `SHA-256`.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().replace('-', "").as_str() {
            "md5" => Some(Algorithm::Md5),
            "sha256" => Some(Algorithm::Sha256),
            "sha512" => Some(Algorithm::Sha512),
            _ => None,
        }
    }
}

/// Compute SHA256 hash of a byte slice.
pub fn sha256_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Compute SHA256 hash of a string.
pub fn sha256_str(s: &str) -> String {
    sha256_bytes(s.as_bytes())
}

/// Compute the hex digest of a file.
pub fn digest_file(algorithm: Algorithm, path: &Path) -> Result<String> {
    let file = File::open(path)
        .with_context(|| format!("failed to open file for hashing: {}", path.display()))?;
    let mut reader = BufReader::new(file);
    match algorithm {
        Algorithm::Md5 => {
            let mut context = md5::Context::new();
            feed(&mut reader, |chunk| context.consume(chunk))?;
            Ok(format!("{:x}", context.compute()))
        }
        Algorithm::Sha256 => {
            let mut hasher = Sha256::new();
            feed(&mut reader, |chunk| hasher.update(chunk))?;
            Ok(hex::encode(hasher.finalize()))
        }
        Algorithm::Sha512 => {
            let mut hasher = Sha512::new();
            feed(&mut reader, |chunk| hasher.update(chunk))?;
            Ok(hex::encode(hasher.finalize()))
        }
    }
}

/// Compute SHA256 hash of a file.
pub fn sha256_file(path: &Path) -> Result<String> {
    digest_file(Algorithm::Sha256, path)
}

fn feed(reader: &mut impl Read, mut update: impl FnMut(&[u8])) -> Result<()> {
    let mut buffer = [0u8; 8192];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            return Ok(());
        }
        update(&buffer[..bytes_read]);
    }
}

/// Verify a file against `algorithm=hexdigest` and `size=n` pairs.
pub fn verify_file(path: &Path, checks: &[(String, String)]) -> Result<()> {
    for (name, expected) in checks {
        if name == "size" {
            let actual = std::fs::metadata(path)
                .with_context(|| format!("failed to read metadata: {}", path.display()))?
                .len();
            if expected.parse::<u64>().ok() != Some(actual) {
                bail!(
                    "size mismatch for {}:\n  expected: {}\n  actual:   {}",
                    path.display(),
                    expected,
                    actual
                );
            }
            continue;
        }
        let Some(algorithm) = Algorithm::parse(name) else {
            bail!("unsupported digest algorithm `{}`", name);
        };
        let actual = digest_file(algorithm, path)?;
        if !actual.eq_ignore_ascii_case(expected) {
            bail!(
                "{} mismatch for {}:\n  expected: {}\n  actual:   {}",
                name,
                path.display(),
                expected,
                actual
            );
        }
    }
    Ok(())
}
