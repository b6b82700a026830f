use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Stable identifier of an indexed chunk.
///
/// Derived from the document reference and the chunk's sequence index, so a
/// redelivered ingestion job produces the same identifiers and its upserts
/// overwrite the earlier attempt instead of duplicating it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkId(Uuid);

impl ChunkId {
    pub fn derive(document_reference: &str, sequence_index: usize) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(document_reference.as_bytes());
        hasher.update([0u8]);
        hasher.update((sequence_index as u64).to_be_bytes());
        let digest = hasher.finalize();

        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest[..16]);
        Self(Uuid::from_bytes(bytes))
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for ChunkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<ChunkId> for Uuid {
    fn from(id: ChunkId) -> Self {
        id.0
    }
}
