//! Chunk columns, chunklets, and the persisted-payload seam.
#![forbid(unsafe_code)]

mod chunklet;
mod coords;
mod source;

pub use chunklet::Chunklet;
pub use coords::{ChunkCoord, ChunkletCoord};
pub use source::ChunkSource;
pub use tephra_mesh_cpu::Face;

use tephra_blocks::BlockRegistry;

/// Horizontal chunk extent in blocks.
pub const CHUNK_SX: usize = 16;
/// Vertical chunk extent in blocks.
pub const CHUNK_SY: usize = 128;
/// Horizontal chunk extent in blocks (z axis).
pub const CHUNK_SZ: usize = 16;
/// Vertical chunklet slices per chunk.
pub const CHUNKLETS_PER_CHUNK: usize = 8;

/// Total block cells per chunk.
pub const BLOCK_COUNT: usize = CHUNK_SX * CHUNK_SY * CHUNK_SZ;
/// Bytes per packed 4-bit light channel (two cells per byte).
pub const LIGHT_BYTES: usize = BLOCK_COUNT / 2;

/// Linear cell index; y is the fastest-varying axis.
#[inline]
pub fn block_index(x: usize, y: usize, z: usize) -> usize {
    debug_assert!(x < CHUNK_SX && y < CHUNK_SY && z < CHUNK_SZ);
    y + z * CHUNK_SY + x * CHUNK_SY * CHUNK_SZ
}

/// Selects the 4-bit light value at a linear cell index out of a packed
/// channel: even indices use the low nibble of the shared byte.
#[inline]
pub fn light_nibble(channel: &[u8], index: usize) -> u8 {
    let byte = channel[index / 2];
    if index & 1 == 0 { byte & 0x0F } else { byte >> 4 }
}

/// The decoded content of one persisted chunk: what the external
/// `Blocks`/`SkyLight`/`BlockLight` fields carry. Construction validates
/// the array lengths; malformed data is rejected as if the chunk were
/// missing.
pub struct ChunkPayload {
    blocks: Vec<u8>,
    skylight: Vec<u8>,
    blocklight: Vec<u8>,
}

impl ChunkPayload {
    pub fn new(blocks: Vec<u8>, skylight: Vec<u8>, blocklight: Vec<u8>) -> Option<Self> {
        if blocks.len() != BLOCK_COUNT
            || skylight.len() != LIGHT_BYTES
            || blocklight.len() != LIGHT_BYTES
        {
            return None;
        }
        Some(Self {
            blocks,
            skylight,
            blocklight,
        })
    }

    /// An all-air, fully skylit payload.
    pub fn empty() -> Self {
        Self {
            blocks: vec![0; BLOCK_COUNT],
            skylight: vec![0xFF; LIGHT_BYTES],
            blocklight: vec![0; LIGHT_BYTES],
        }
    }

    #[inline]
    pub fn block(&self, x: usize, y: usize, z: usize) -> u8 {
        self.blocks[block_index(x, y, z)]
    }

    #[inline]
    pub fn set_block(&mut self, x: usize, y: usize, z: usize, id: u8) {
        self.blocks[block_index(x, y, z)] = id;
    }

    /// Writes a 4-bit skylight value for one cell.
    pub fn set_sky_light(&mut self, x: usize, y: usize, z: usize, level: u8) {
        let index = block_index(x, y, z);
        let byte = &mut self.skylight[index / 2];
        if index & 1 == 0 {
            *byte = (*byte & 0xF0) | (level & 0x0F);
        } else {
            *byte = (*byte & 0x0F) | ((level & 0x0F) << 4);
        }
    }
}

/// One 16x16x128 column of the world, owning its eight chunklets.
pub struct Chunk {
    pub coord: ChunkCoord,
    payload: ChunkPayload,
    chunklets: [Chunklet; CHUNKLETS_PER_CHUNK],
}

impl Chunk {
    /// Builds the chunk and precomputes every chunklet's sheet and
    /// empty flags. `shell` samples world-absolute block ids for cells
    /// outside this chunk (missing neighbors read as air, a known
    /// world-edge approximation).
    pub fn new(
        coord: ChunkCoord,
        payload: ChunkPayload,
        reg: &BlockRegistry,
        shell: &dyn Fn(i32, i32, i32) -> u8,
    ) -> Self {
        let base_x = coord.cx * CHUNK_SX as i32;
        let base_z = coord.cz * CHUNK_SZ as i32;
        // Chunk-local sampler that may step out of the column.
        let sample = |lx: i32, ly: i32, lz: i32| -> u8 {
            if !(0..CHUNK_SY as i32).contains(&ly) {
                return 0;
            }
            if (0..CHUNK_SX as i32).contains(&lx) && (0..CHUNK_SZ as i32).contains(&lz) {
                payload.block(lx as usize, ly as usize, lz as usize)
            } else {
                shell(base_x + lx, ly, base_z + lz)
            }
        };
        let chunklets = core::array::from_fn(|sy| {
            Chunklet::build(ChunkletCoord::new(coord.cx, sy as i32, coord.cz), &sample, reg)
        });
        Self {
            coord,
            payload,
            chunklets,
        }
    }

    #[inline]
    pub fn block(&self, x: usize, y: usize, z: usize) -> u8 {
        self.payload.block(x, y, z)
    }

    /// Writes a block id. Geometry dirtying is the caller's job; the
    /// chunklet's sheet and empty flags intentionally stay as built.
    #[inline]
    pub fn set_block(&mut self, x: usize, y: usize, z: usize, id: u8) {
        self.payload.set_block(x, y, z, id);
    }

    #[inline]
    pub fn sky_light(&self, x: usize, y: usize, z: usize) -> u8 {
        light_nibble(&self.payload.skylight, block_index(x, y, z))
    }

    #[inline]
    pub fn block_light(&self, x: usize, y: usize, z: usize) -> u8 {
        light_nibble(&self.payload.blocklight, block_index(x, y, z))
    }

    /// Combined light used for face brightness.
    #[inline]
    pub fn light_max(&self, x: usize, y: usize, z: usize) -> u8 {
        self.sky_light(x, y, z).max(self.block_light(x, y, z))
    }

    /// Marks every chunklet's geometry stale. Called when this chunk
    /// loads and when a lateral neighbor finishes loading; sheet/empty
    /// flags are deliberately not recomputed.
    pub fn geom_dirty(&mut self) {
        for c in &mut self.chunklets {
            c.geom_dirty();
        }
    }

    #[inline]
    pub fn chunklet(&self, sy: usize) -> &Chunklet {
        &self.chunklets[sy]
    }

    #[inline]
    pub fn chunklet_mut(&mut self, sy: usize) -> &mut Chunklet {
        &mut self.chunklets[sy]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_formula_matches_layout() {
        assert_eq!(block_index(0, 0, 0), 0);
        assert_eq!(block_index(0, 1, 0), 1);
        assert_eq!(block_index(0, 0, 1), 128);
        assert_eq!(block_index(1, 0, 0), 2048);
        assert_eq!(block_index(15, 127, 15), BLOCK_COUNT - 1);
    }

    #[test]
    fn nibble_parity_selects_halves() {
        // Cell 0 -> low nibble, cell 1 -> high nibble of byte 0.
        let channel = vec![0xA3u8];
        assert_eq!(light_nibble(&channel, 0), 0x3);
        assert_eq!(light_nibble(&channel, 1), 0xA);
    }

    #[test]
    fn payload_rejects_wrong_lengths() {
        assert!(ChunkPayload::new(vec![0; BLOCK_COUNT], vec![0; LIGHT_BYTES], vec![0; 7]).is_none());
        assert!(
            ChunkPayload::new(vec![0; BLOCK_COUNT], vec![0; LIGHT_BYTES], vec![0; LIGHT_BYTES])
                .is_some()
        );
    }

    #[test]
    fn set_sky_light_round_trips() {
        let mut p = ChunkPayload::empty();
        p.set_sky_light(3, 40, 9, 11);
        p.set_sky_light(3, 41, 9, 4);
        let chunk = Chunk::new(
            ChunkCoord::new(0, 0),
            p,
            &BlockRegistry::new(),
            &|_, _, _| 0,
        );
        assert_eq!(chunk.sky_light(3, 40, 9), 11);
        assert_eq!(chunk.sky_light(3, 41, 9), 4);
    }
}
