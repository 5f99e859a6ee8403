//! Zeroization utilities for secure memory handling.

use zeroize::{Zeroize, ZeroizeOnDrop};

/// A master password held in memory only as long as needed.
///
/// The buffer is automatically zeroized when it goes out of scope.
#[derive(ZeroizeOnDrop)]
pub struct MasterPassword {
    data: Vec<u8>,
}

impl MasterPassword {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get a reference to the raw bytes (use sparingly).
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl From<String> for MasterPassword {
    fn from(s: String) -> Self {
        Self {
            data: s.into_bytes(),
        }
    }
}

impl From<&str> for MasterPassword {
    fn from(s: &str) -> Self {
        Self {
            data: s.as_bytes().to_vec(),
        }
    }
}

impl AsRef<[u8]> for MasterPassword {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

/// Overwrite a byte slice with zeros.
pub fn zeroize_bytes(data: &mut [u8]) {
    data.zeroize();
}
