//! Whole-tree binary snapshots
//!
//! Layout: 4-byte magic, little-endian `u16` format version, SHA-256 digest
//! of the payload, then the bincode-encoded node store.

use std::path::Path;
use bincode::Options;
use sha2::{Digest, Sha256};
use crate::tree::{NodeStore, TaxTree};
use crate::{Result, TaxoTreeError};

const MAGIC: &[u8; 4] = b"TXTR";

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u16 = 1;

const DIGEST_LEN: usize = 32;
const HEADER_LEN: usize = MAGIC.len() + 2 + DIGEST_LEN;

/// Fixed-width integers, the layout of `bincode::serialize`
fn codec() -> impl Options {
    bincode::DefaultOptions::new().with_fixint_encoding()
}

/// Serialize a tree into an opaque byte blob
pub fn save(tree: &TaxTree) -> Result<Vec<u8>> {
    let payload = codec()
        .serialize(tree.store())
        .map_err(|e| TaxoTreeError::SerializationError(e.to_string()))?;
    Ok(frame(&payload))
}

/// Prefix a payload with magic, version and digest
fn frame(payload: &[u8]) -> Vec<u8> {
    let digest = Sha256::digest(payload);

    let mut blob = Vec::with_capacity(HEADER_LEN + payload.len());
    blob.extend_from_slice(MAGIC);
    blob.extend_from_slice(&SNAPSHOT_VERSION.to_le_bytes());
    blob.extend_from_slice(&digest);
    blob.extend_from_slice(payload);
    blob
}

/// Restore a tree from a blob produced by [`save`]
pub fn load(bytes: &[u8]) -> Result<TaxTree> {
    if bytes.len() < HEADER_LEN {
        return Err(TaxoTreeError::SerializationError(format!(
            "snapshot too short: {} bytes",
            bytes.len()
        )));
    }

    let (magic, rest) = bytes.split_at(MAGIC.len());
    if magic != MAGIC {
        return Err(TaxoTreeError::SerializationError("not a tree snapshot".to_string()));
    }

    let (version, rest) = rest.split_at(2);
    let version = u16::from_le_bytes([version[0], version[1]]);
    if version != SNAPSHOT_VERSION {
        return Err(TaxoTreeError::SerializationError(format!(
            "unsupported snapshot version {} (expected {})",
            version, SNAPSHOT_VERSION
        )));
    }

    let (digest, payload) = rest.split_at(DIGEST_LEN);
    if Sha256::digest(payload).as_slice() != digest {
        return Err(TaxoTreeError::SerializationError(
            "snapshot checksum mismatch".to_string(),
        ));
    }

    // A payload never decodes to more than its own size
    let store: NodeStore = codec()
        .with_limit(payload.len() as u64)
        .deserialize(payload)
        .map_err(|e| TaxoTreeError::SerializationError(e.to_string()))?;
    let tree = TaxTree::from_store(store).map_err(TaxoTreeError::SerializationError)?;

    log::debug!("loaded snapshot with {} nodes", tree.size());
    Ok(tree)
}

/// Write a snapshot to a file
pub fn save_to_file<P: AsRef<Path>>(tree: &TaxTree, path: P) -> Result<()> {
    let blob = save(tree)?;
    std::fs::write(path, blob)?;
    Ok(())
}

/// Read a snapshot from a file
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<TaxTree> {
    let bytes = std::fs::read(path)?;
    load(&bytes)
}
