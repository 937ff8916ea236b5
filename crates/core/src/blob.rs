//! Blob storage with compression and content-addressing

use crate::error::{ObjectKind, StoreError};
use crate::hash::{hash_bytes, Blake3Hash};
use crate::store::{atomic_write, object_path};
use std::path::PathBuf;

/// Blob header format (version 1)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobHeaderV1 {
    /// Flags: bit0=compressed, bit1-7=reserved
    pub flags: u8,
    /// Original size (before compression)
    pub orig_len: u64,
    /// Stored size (after compression, if compressed)
    pub stored_len: u64,
}

impl BlobHeaderV1 {
    const MAGIC: [u8; 4] = *b"SNB1";
    const FLAG_COMPRESSED: u8 = 0b0000_0001;
    /// magic(4) + flags(1) + orig_len(8) + stored_len(8)
    pub const LEN: usize = 21;

    pub fn new(orig_len: u64, stored_len: u64, compressed: bool) -> Self {
        let flags = if compressed { Self::FLAG_COMPRESSED } else { 0 };
        Self {
            flags,
            orig_len,
            stored_len,
        }
    }

    pub fn is_compressed(&self) -> bool {
        (self.flags & Self::FLAG_COMPRESSED) != 0
    }

    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        let mut out = [0u8; Self::LEN];
        out[..4].copy_from_slice(&Self::MAGIC);
        out[4] = self.flags;
        out[5..13].copy_from_slice(&self.orig_len.to_le_bytes());
        out[13..21].copy_from_slice(&self.stored_len.to_le_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StoreError> {
        if bytes.len() < Self::LEN || bytes[..4] != Self::MAGIC {
            return Err(StoreError::Corrupt("bad blob header".to_string()));
        }
        let mut orig = [0u8; 8];
        let mut stored = [0u8; 8];
        orig.copy_from_slice(&bytes[5..13]);
        stored.copy_from_slice(&bytes[13..21]);
        Ok(Self {
            flags: bytes[4],
            orig_len: u64::from_le_bytes(orig),
            stored_len: u64::from_le_bytes(stored),
        })
    }
}

/// A blob represents a stored file's contents
#[derive(Debug, Clone)]
pub struct Blob {
    /// Content hash of the uncompressed data
    pub hash: Blake3Hash,
    /// Original size
    pub size: u64,
    /// Whether this blob is stored compressed
    pub compressed: bool,
}

impl Blob {
    /// Payloads above this size are considered for compression
    pub const COMPRESSION_THRESHOLD: usize = 4 * 1024;

    /// Create blob metadata plus its on-disk encoding
    pub fn encode(data: &[u8]) -> Result<(Self, Vec<u8>), StoreError> {
        let hash = hash_bytes(data);

        let compressed = if data.len() > Self::COMPRESSION_THRESHOLD {
            let packed = zstd::encode_all(data, 3)?;
            (packed.len() < data.len()).then_some(packed)
        } else {
            None
        };

        let is_compressed = compressed.is_some();
        let payload = compressed.unwrap_or_else(|| data.to_vec());
        let header = BlobHeaderV1::new(data.len() as u64, payload.len() as u64, is_compressed);

        let mut out = Vec::with_capacity(BlobHeaderV1::LEN + payload.len());
        out.extend_from_slice(&header.to_bytes());
        out.extend_from_slice(&payload);

        let blob = Blob {
            hash,
            size: data.len() as u64,
            compressed: is_compressed,
        };
        Ok((blob, out))
    }

    /// Decode the on-disk encoding back into content
    pub fn decode(bytes: &[u8]) -> Result<Vec<u8>, StoreError> {
        let header = BlobHeaderV1::from_bytes(bytes)?;
        let payload = &bytes[BlobHeaderV1::LEN..];
        if payload.len() as u64 != header.stored_len {
            return Err(StoreError::Corrupt("blob length mismatch".to_string()));
        }
        let data = if header.is_compressed() {
            zstd::decode_all(payload)?
        } else {
            payload.to_vec()
        };
        if data.len() as u64 != header.orig_len {
            return Err(StoreError::Corrupt("blob size mismatch".to_string()));
        }
        Ok(data)
    }
}

/// Blob storage rooted at `objects/blobs`
pub struct BlobStore {
    root: PathBuf,
    tmp_dir: PathBuf,
}

impl BlobStore {
    pub fn new(root: PathBuf, tmp_dir: PathBuf) -> Self {
        Self { root, tmp_dir }
    }

    /// Write content, returning its hash
    pub fn write_blob(&self, data: &[u8]) -> Result<Blake3Hash, StoreError> {
        let (blob, encoded) = Blob::encode(data)?;
        let path = object_path(&self.root, blob.hash);
        if !path.exists() {
            atomic_write(&self.tmp_dir, &path, &encoded)?;
        }
        Ok(blob.hash)
    }

    pub fn read_blob(&self, hash: Blake3Hash) -> Result<Vec<u8>, StoreError> {
        let path = object_path(&self.root, hash);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::not_found(ObjectKind::Blob, hash))
            }
            Err(e) => return Err(e.into()),
        };
        Blob::decode(&bytes)
    }

    pub fn has_blob(&self, hash: Blake3Hash) -> bool {
        object_path(&self.root, hash).exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_header_serialization() {
        let header = BlobHeaderV1::new(1000, 500, true);
        let parsed = BlobHeaderV1::from_bytes(&header.to_bytes()).unwrap();
        assert_eq!(header, parsed);
        assert!(parsed.is_compressed());
    }

    #[test]
    fn test_small_blob_not_compressed() {
        let (blob, encoded) = Blob::encode(b"tiny").unwrap();
        assert!(!blob.compressed);
        assert_eq!(encoded.len(), BlobHeaderV1::LEN + 4);
        assert_eq!(Blob::decode(&encoded).unwrap(), b"tiny");
    }

    #[test]
    fn test_blob_compression() {
        let data = b"hello world".repeat(1000);
        let (blob, encoded) = Blob::encode(&data).unwrap();
        assert!(blob.compressed);
        assert!(encoded.len() < data.len());
        assert_eq!(blob.hash, hash_bytes(&data));
        assert_eq!(Blob::decode(&encoded).unwrap(), data);
    }

    #[test]
    fn test_blob_store_write_read() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = BlobStore::new(
            temp_dir.path().join("blobs"),
            temp_dir.path().join("tmp"),
        );
        std::fs::create_dir_all(temp_dir.path().join("tmp")).unwrap();

        let hash = store.write_blob(b"test data").unwrap();
        assert!(store.has_blob(hash));
        assert_eq!(store.read_blob(hash).unwrap(), b"test data");
        assert_eq!(store.write_blob(b"test data").unwrap(), hash);

        let missing = hash_bytes(b"missing");
        assert!(store.read_blob(missing).unwrap_err().is_not_found());
    }
}
