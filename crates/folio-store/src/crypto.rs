//! AES-256-GCM key vault for encrypted columns
//!
//! Every key set row carries a random data key wrapped under the master
//! key. Column payloads are sealed with the data key of the row's key set
//! and bound to their table, column and key-set id as associated data, so
//! a payload copied to another row or column fails to open.
//!
//! Payload layout: `version(1) | nonce(12) | tag(16) | ciphertext`.

use crate::errors::{config_error, decryption_error, Result};
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce, Tag};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use folio_core::cipher::{CipherSuite, RowCipher, SealContext};
use folio_core::errors::{ExError, ExErrorKind, FolioError};
use folio_core::value::RowId;
use folio_core_types::Sensitive;
use rand::rngs::OsRng;
use rand::RngCore;
use std::collections::HashMap;
use std::fmt;

const PAYLOAD_VERSION: u8 = 1;
const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const HEADER_LEN: usize = 1 + NONCE_LEN + TAG_LEN;

const WRAP_AAD: &[u8] = b"folio:key-set";

/// Stored length of a wrapped data key
pub const WRAPPED_KEY_LEN: usize = HEADER_LEN + KEY_LEN;

/// Key that wraps the data keys of every key set
#[derive(Clone)]
pub struct MasterKey([u8; KEY_LEN]);

impl MasterKey {
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn generate() -> Self {
        let mut key = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut key);
        Self(key)
    }

    /// Decode the base64 form used in configuration files
    pub fn from_base64(encoded: &Sensitive<String>) -> Result<Self> {
        let decoded = STANDARD
            .decode(encoded.expose().trim())
            .map_err(|e| config_error(&format!("master_key is not base64: {}", e)))?;
        if decoded.len() != KEY_LEN {
            return Err(config_error(&format!(
                "master_key must be {} bytes, got {}",
                KEY_LEN,
                decoded.len()
            )));
        }
        let mut bytes = [0u8; KEY_LEN];
        bytes.copy_from_slice(&decoded);
        Ok(Self(bytes))
    }

    pub fn to_base64(&self) -> Sensitive<String> {
        Sensitive::new(STANDARD.encode(self.0))
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MasterKey").finish_non_exhaustive()
    }
}

fn seal_with(key: &[u8; KEY_LEN], aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(nonce, aad, &mut buffer)
        .map_err(|_| ExError::new(ExErrorKind::Internal).with_message("AES-GCM encryption failed"))?;

    let mut out = Vec::with_capacity(HEADER_LEN + buffer.len());
    out.push(PAYLOAD_VERSION);
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(tag.as_slice());
    out.extend_from_slice(&buffer);
    Ok(out)
}

fn open_with(key: &[u8; KEY_LEN], aad: &[u8], payload: &[u8], column: &str) -> Result<Vec<u8>> {
    if payload.len() < HEADER_LEN {
        return Err(decryption_error(column, "payload is truncated"));
    }
    if payload[0] != PAYLOAD_VERSION {
        return Err(decryption_error(
            column,
            &format!("unsupported payload version {}", payload[0]),
        ));
    }
    let nonce = Nonce::from_slice(&payload[1..1 + NONCE_LEN]);
    let tag = Tag::from_slice(&payload[1 + NONCE_LEN..HEADER_LEN]);
    let mut buffer = payload[HEADER_LEN..].to_vec();

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    cipher
        .decrypt_in_place_detached(nonce, aad, &mut buffer, tag)
        .map_err(|_| decryption_error(column, "authentication failed"))?;
    Ok(buffer)
}

/// Data keys of every registered key set, unwrapped in memory
pub struct KeyVault {
    master: MasterKey,
    data_keys: HashMap<RowId, [u8; KEY_LEN]>,
}

impl KeyVault {
    pub fn new(master: MasterKey) -> Self {
        Self {
            master,
            data_keys: HashMap::new(),
        }
    }

    /// Fresh wrapped key material for a new key-set row
    pub fn generate_key_set(&self) -> Result<Vec<u8>> {
        let mut data_key = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut data_key);
        seal_with(&self.master.0, WRAP_AAD, &data_key)
    }

    pub fn has_key_set(&self, id: RowId) -> bool {
        self.data_keys.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.data_keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data_keys.is_empty()
    }

    fn data_key(&self, ctx: &SealContext<'_>) -> Result<&[u8; KEY_LEN]> {
        self.data_keys.get(&ctx.key_set).ok_or_else(|| {
            FolioError::MissingKeySet {
                column: ctx.column.to_string(),
                key_set: ctx.key_set.get(),
            }
            .into()
        })
    }
}

impl fmt::Debug for KeyVault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyVault")
            .field("key_sets", &self.data_keys.len())
            .finish_non_exhaustive()
    }
}

impl RowCipher for KeyVault {
    fn seal(&self, ctx: &SealContext<'_>, plaintext: &[u8]) -> Result<Vec<u8>> {
        let key = self.data_key(ctx)?;
        seal_with(key, &ctx.associated_data(), plaintext)
    }

    fn open(&self, ctx: &SealContext<'_>, ciphertext: &[u8]) -> Result<Vec<u8>> {
        let key = self.data_key(ctx)?;
        open_with(key, &ctx.associated_data(), ciphertext, ctx.column)
    }

    fn register_key_set(&mut self, id: RowId, material: &[u8]) -> Result<()> {
        let unwrapped = open_with(&self.master.0, WRAP_AAD, material, "key material")
            .map_err(|e| e.with_row_id(id.get()))?;
        let mut key = [0u8; KEY_LEN];
        if unwrapped.len() != KEY_LEN {
            return Err(decryption_error("key material", "wrapped key has the wrong length")
                .with_row_id(id.get()));
        }
        key.copy_from_slice(&unwrapped);
        self.data_keys.insert(id, key);
        Ok(())
    }
}

/// Bytes a sealed payload adds over its plaintext
pub fn overhead() -> usize {
    CipherSuite::Aes256Gcm.overhead() as usize
}
