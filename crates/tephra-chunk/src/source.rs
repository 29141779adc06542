use crate::ChunkPayload;
use crate::coords::ChunkCoord;

/// Seam to whatever produces chunk payloads: a generator, a disk store,
/// or a network fetch. Implementations are shared across load workers.
pub trait ChunkSource: Send + Sync {
    /// Produces the payload for a chunk, or `None` when the chunk does
    /// not exist (or its data is malformed).
    fn load(&self, coord: ChunkCoord) -> Option<ChunkPayload>;
}
