//! Content checksums.
//!
//! Records, tables and query shapes are fingerprinted with BLAKE3 over a
//! canonical, type-tagged byte encoding. Field maps are visited in key order,
//! so two structurally equal values always produce the same checksum.

use crate::record::Record;
use crate::value::Value;
use alloc::string::String;
use core::fmt;

/// A 32-byte content checksum.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Checksum([u8; 32]);

impl Checksum {
    /// Checksum of a single encodable item.
    pub fn of<T: Digestible + ?Sized>(item: &T) -> Self {
        let mut digest = Digest::new();
        item.digest(&mut digest);
        digest.finish()
    }

    /// Aggregate checksum over a set of checksums.
    ///
    /// The input is sorted first, so the result does not depend on the
    /// order the checksums were collected in.
    pub fn aggregate<I>(checksums: I) -> Self
    where
        I: IntoIterator<Item = Checksum>,
    {
        let mut sorted: alloc::vec::Vec<Checksum> = checksums.into_iter().collect();
        sorted.sort_unstable();
        let mut digest = Digest::new();
        digest.write_len(sorted.len());
        for checksum in &sorted {
            digest.write_bytes(&checksum.0);
        }
        digest.finish()
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Returns the lowercase hex form.
    pub fn to_hex(&self) -> String {
        String::from(blake3::Hash::from_bytes(self.0).to_hex().as_str())
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Incremental canonical encoder feeding a BLAKE3 hasher.
pub struct Digest {
    hasher: blake3::Hasher,
}

impl Digest {
    /// Creates an empty digest.
    pub fn new() -> Self {
        Self {
            hasher: blake3::Hasher::new(),
        }
    }

    /// Writes a single tag byte.
    pub fn write_tag(&mut self, tag: u8) {
        self.hasher.update(&[tag]);
    }

    /// Writes a length prefix.
    pub fn write_len(&mut self, len: usize) {
        self.hasher.update(&(len as u64).to_le_bytes());
    }

    /// Writes raw bytes without a prefix.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    /// Writes a length-prefixed string.
    pub fn write_str(&mut self, s: &str) {
        self.write_len(s.len());
        self.hasher.update(s.as_bytes());
    }

    /// Finalizes into a checksum.
    pub fn finish(self) -> Checksum {
        Checksum(*self.hasher.finalize().as_bytes())
    }
}

impl Default for Digest {
    fn default() -> Self {
        Self::new()
    }
}

/// Types with a canonical checksum encoding.
pub trait Digestible {
    /// Feeds the canonical encoding of `self` into `digest`.
    fn digest(&self, digest: &mut Digest);
}

impl Digestible for Value {
    fn digest(&self, digest: &mut Digest) {
        digest.write_tag(self.tag());
        match self {
            Value::Null => {}
            Value::Boolean(b) => digest.write_tag(*b as u8),
            Value::Integer(i) => digest.write_bytes(&i.to_le_bytes()),
            Value::Number(n) => {
                let bits = if n.is_nan() {
                    f64::NAN.to_bits()
                } else if *n == 0.0 {
                    0.0f64.to_bits()
                } else {
                    n.to_bits()
                };
                digest.write_bytes(&bits.to_le_bytes());
            }
            Value::String(s) => digest.write_str(s),
            Value::DateTime(d) => digest.write_bytes(&d.to_le_bytes()),
            Value::List(items) => {
                digest.write_len(items.len());
                for item in items {
                    item.digest(digest);
                }
            }
            Value::Object(fields) => {
                digest.write_len(fields.len());
                for (key, value) in fields {
                    digest.write_str(key);
                    value.digest(digest);
                }
            }
        }
    }
}

impl Digestible for Record {
    fn digest(&self, digest: &mut Digest) {
        digest.write_len(self.len());
        for (key, value) in self.iter() {
            digest.write_str(key);
            value.digest(digest);
        }
    }
}

impl Digestible for str {
    fn digest(&self, digest: &mut Digest) {
        digest.write_str(self);
    }
}

impl Digestible for String {
    fn digest(&self, digest: &mut Digest) {
        digest.write_str(self);
    }
}

impl<T: Digestible> Digestible for [T] {
    fn digest(&self, digest: &mut Digest) {
        digest.write_len(self.len());
        for item in self {
            item.digest(digest);
        }
    }
}

impl<T: Digestible> Digestible for Option<T> {
    fn digest(&self, digest: &mut Digest) {
        match self {
            None => digest.write_tag(0),
            Some(item) => {
                digest.write_tag(1);
                item.digest(digest);
            }
        }
    }
}
