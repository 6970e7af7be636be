//! Person registries: record types, field decryption and the reader.

pub mod decrypt;
pub mod reader;
pub mod records;

pub use decrypt::{DecryptionError, FieldCipher, PlainCipher};
pub use reader::{CandidatePool, RegistryReader};
