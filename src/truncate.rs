//! Bit-exact truncation of SHA-256 digests.
//!
//! A truncated value keeps the leading `width` bits of a digest, most
//! significant bit first within a byte and most significant byte first across
//! bytes. Two digests are equal under a width when those leading bits agree.

use core::fmt;

use sha2::{Digest as _, Sha256};

use crate::error::{Error, Result};

/// Size in bytes of a SHA-256 digest.
pub const DIGEST_LEN: usize = 32;
/// Largest meaningful truncation width.
pub const MAX_WIDTH: u32 = DIGEST_LEN as u32 * 8;

pub type Digest = [u8; DIGEST_LEN];

/// Number of leading digest bits considered significant, `0..=256`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BitWidth(u32);

impl BitWidth {
    pub fn new(bits: u32) -> Result<Self> {
        if bits > MAX_WIDTH {
            return Err(Error::InvalidWidth(bits));
        }
        Ok(Self(bits))
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    fn full_bytes(self) -> usize {
        (self.0 / 8) as usize
    }

    fn trailing_bits(self) -> u32 {
        self.0 % 8
    }

    /// Mask selecting the leading bits of the partial byte, if any.
    fn trailing_mask(self) -> Option<u8> {
        match self.trailing_bits() {
            0 => None,
            rem => Some(0xff_u8 << (8 - rem)),
        }
    }
}

impl fmt::Display for BitWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The leading `width` bits of a digest.
///
/// Bits past the width in the final partial byte are always zero, so the
/// derived equality is exactly bit-prefix equality.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TruncatedValue {
    width: BitWidth,
    bytes: Vec<u8>,
}

impl TruncatedValue {
    pub fn width(&self) -> BitWidth {
        self.width
    }

    /// Number of bits held, always equal to the width.
    pub fn len(&self) -> usize {
        self.width.bits() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.width.bits() == 0
    }

    pub fn bit(&self, index: usize) -> Option<bool> {
        if index >= self.len() {
            return None;
        }
        Some(self.bytes[index / 8] >> (7 - index % 8) & 1 == 1)
    }

    pub fn bits(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len()).filter_map(move |i| self.bit(i))
    }
}

impl fmt::Display for TruncatedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.bits() {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

pub fn sha256(message: &[u8]) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(message);
    let mut digest = [0u8; DIGEST_LEN];
    digest.copy_from_slice(&hasher.finalize());
    digest
}

/// Returns the first `width` bits of `digest`.
pub fn to_bitstring(digest: &Digest, width: BitWidth) -> TruncatedValue {
    let full = width.full_bytes();
    let mut bytes = digest[..full].to_vec();
    if let Some(mask) = width.trailing_mask() {
        bytes.push(digest[full] & mask);
    }
    TruncatedValue { width, bytes }
}

/// Compares the leading `width` bits of two digests.
pub fn equal_under_truncation(x: &Digest, y: &Digest, width: BitWidth) -> bool {
    let full = width.full_bytes();
    if x[..full] != y[..full] {
        return false;
    }
    match width.trailing_mask() {
        Some(mask) => x[full] & mask == y[full] & mask,
        None => true,
    }
}

/// Hashes the UTF-8 bytes of `message` and truncates the digest.
pub fn hash_and_truncate(message: &str, width: BitWidth) -> TruncatedValue {
    to_bitstring(&sha256(message.as_bytes()), width)
}
