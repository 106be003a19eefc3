//! Cipher seam for encrypted columns
//!
//! The table machinery seals and opens column payloads through `RowCipher`
//! without knowing the algorithm. Implementations hold one data key per key
//! set; key sets are themselves rows, registered as they are loaded or
//! inserted.

use crate::errors::{FolioError, Result};
use crate::value::RowId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CipherSuite {
    Aes256Gcm,
}

impl CipherSuite {
    /// Bytes added to every payload: format version, nonce and tag
    pub fn overhead(&self) -> u32 {
        match self {
            CipherSuite::Aes256Gcm => 1 + 12 + 16,
        }
    }
}

/// Where a payload lives; bound into the ciphertext as associated data
#[derive(Debug, Clone, Copy)]
pub struct SealContext<'a> {
    pub table: &'a str,
    pub column: &'a str,
    pub key_set: RowId,
}

impl SealContext<'_> {
    pub fn associated_data(&self) -> Vec<u8> {
        format!("{}.{}#{}", self.table, self.column, self.key_set).into_bytes()
    }
}

pub trait RowCipher {
    fn seal(&self, ctx: &SealContext<'_>, plaintext: &[u8]) -> Result<Vec<u8>>;

    fn open(&self, ctx: &SealContext<'_>, ciphertext: &[u8]) -> Result<Vec<u8>>;

    /// Make the key set persisted as row `id` available for sealing/opening
    fn register_key_set(&mut self, id: RowId, material: &[u8]) -> Result<()>;
}

/// Cipher for schemas without encrypted columns; every use is reported
/// as a missing key set.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCipher;

impl RowCipher for NoCipher {
    fn seal(&self, ctx: &SealContext<'_>, _plaintext: &[u8]) -> Result<Vec<u8>> {
        Err(FolioError::MissingKeySet {
            column: ctx.column.to_string(),
            key_set: ctx.key_set.get(),
        }
        .into())
    }

    fn open(&self, ctx: &SealContext<'_>, _ciphertext: &[u8]) -> Result<Vec<u8>> {
        Err(FolioError::MissingKeySet {
            column: ctx.column.to_string(),
            key_set: ctx.key_set.get(),
        }
        .into())
    }

    fn register_key_set(&mut self, _id: RowId, _material: &[u8]) -> Result<()> {
        Ok(())
    }
}
