//! Field-level decryption collaborator.
//!
//! Stored names are encrypted per jurisdiction. The engine only depends on
//! the `decrypt(ciphertext, key_context) -> plaintext` contract; every field
//! decrypts independently so one unreadable field never aborts a record by
//! itself.

use thiserror::Error;

/// Failure to decrypt a single field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot decrypt field '{field}'")]
pub struct DecryptionError {
    pub field: String,
}

impl DecryptionError {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }
}

/// Why a whole record was dropped from the candidate pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// A name needed for matching could not be decrypted.
    EssentialFieldUnreadable(String),
}

/// Decrypts one stored field under a jurisdiction key context.
pub trait FieldCipher: Send + Sync {
    fn decrypt(&self, ciphertext: &str, key_context: &str) -> Result<String, DecryptionError>;
}

/// Identity cipher for plaintext deployments and tests.
#[derive(Debug, Clone, Default)]
pub struct PlainCipher;

impl FieldCipher for PlainCipher {
    fn decrypt(&self, ciphertext: &str, _key_context: &str) -> Result<String, DecryptionError> {
        Ok(ciphertext.to_string())
    }
}

/// Decrypts a field the matcher depends on. Failure skips the record.
pub fn essential_field(
    cipher: &dyn FieldCipher,
    field: &str,
    ciphertext: &str,
    key_context: &str,
) -> Result<String, SkipReason> {
    cipher
        .decrypt(ciphertext, key_context)
        .map_err(|_| SkipReason::EssentialFieldUnreadable(field.to_string()))
}

/// Decrypts a display-only field. Failure renders it empty.
pub fn optional_field(
    cipher: &dyn FieldCipher,
    field: &str,
    ciphertext: &str,
    key_context: &str,
) -> String {
    match cipher.decrypt(ciphertext, key_context) {
        Ok(plain) => plain,
        Err(_) => {
            tracing::debug!(field, "field decryption failed, rendering empty");
            String::new()
        }
    }
}

/// Decrypts an absent-or-present parent-name field. Absent stays absent,
/// unreadable becomes absent.
pub fn nullable_field(
    cipher: &dyn FieldCipher,
    ciphertext: Option<&str>,
    key_context: &str,
) -> Option<String> {
    let ciphertext = ciphertext?;
    cipher
        .decrypt(ciphertext, key_context)
        .ok()
        .filter(|plain| !plain.trim().is_empty())
}
