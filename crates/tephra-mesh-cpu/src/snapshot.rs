use tephra_geom::Vec3;

/// Chunklets are 16^3 blocks.
pub const CHUNKLET_DIM: usize = 16;
/// Snapshot edge length: the chunklet plus a one-block neighbor shell.
pub const SNAP_DIM: usize = CHUNKLET_DIM + 2;

const SNAP_LEN: usize = SNAP_DIM * SNAP_DIM * SNAP_DIM;

/// An owned copy of one chunklet's blocks and combined light, including
/// the one-block shell from neighboring chunklets/chunks. Captured on
/// the main thread, consumed by a mesh worker, and reusable afterwards
/// through the runtime's snapshot pool.
#[derive(Clone)]
pub struct ChunkletSnapshot {
    /// World-space position of the chunklet's minimum corner.
    pub origin: Vec3,
    blocks: Vec<u8>,
    /// `max(skylight, blocklight)` per cell, in `[0, 15]`.
    light: Vec<u8>,
}

impl Default for ChunkletSnapshot {
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            blocks: vec![0; SNAP_LEN],
            light: vec![0; SNAP_LEN],
        }
    }
}

impl ChunkletSnapshot {
    /// Local coordinates run `-1..=16` on each axis.
    #[inline]
    fn index(x: i32, y: i32, z: i32) -> usize {
        debug_assert!((-1..=CHUNKLET_DIM as i32).contains(&x));
        debug_assert!((-1..=CHUNKLET_DIM as i32).contains(&y));
        debug_assert!((-1..=CHUNKLET_DIM as i32).contains(&z));
        (((y + 1) as usize) * SNAP_DIM + (z + 1) as usize) * SNAP_DIM + (x + 1) as usize
    }

    /// Refills the snapshot from samplers in chunklet-local coordinates.
    pub fn fill(
        &mut self,
        origin: Vec3,
        mut block_at: impl FnMut(i32, i32, i32) -> u8,
        mut light_at: impl FnMut(i32, i32, i32) -> u8,
    ) {
        self.origin = origin;
        for y in -1..=CHUNKLET_DIM as i32 {
            for z in -1..=CHUNKLET_DIM as i32 {
                for x in -1..=CHUNKLET_DIM as i32 {
                    let i = Self::index(x, y, z);
                    self.blocks[i] = block_at(x, y, z);
                    self.light[i] = light_at(x, y, z);
                }
            }
        }
    }

    #[inline]
    pub fn block(&self, x: i32, y: i32, z: i32) -> u8 {
        self.blocks[Self::index(x, y, z)]
    }

    #[inline]
    pub fn light(&self, x: i32, y: i32, z: i32) -> u8 {
        self.light[Self::index(x, y, z)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_round_trips_samples() {
        let mut snap = ChunkletSnapshot::default();
        snap.fill(
            Vec3::new(16.0, 0.0, 0.0),
            |x, y, z| (x + y + z).rem_euclid(7) as u8,
            |_, _, _| 15,
        );
        assert_eq!(snap.block(0, 0, 0), 0);
        assert_eq!(snap.block(-1, 0, 0), 6);
        assert_eq!(snap.block(16, 16, 16), (48i32).rem_euclid(7) as u8);
        assert_eq!(snap.light(5, 5, 5), 15);
    }
}
