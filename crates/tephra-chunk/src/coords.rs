use tephra_geom::{Aabb, Vec3};
use tephra_mesh_cpu::Face;

use crate::{CHUNK_SX, CHUNK_SZ, CHUNKLETS_PER_CHUNK};

/// Integer coordinates of a chunk column.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ChunkCoord {
    pub cx: i32,
    pub cz: i32,
}

impl ChunkCoord {
    #[inline]
    pub const fn new(cx: i32, cz: i32) -> Self {
        Self { cx, cz }
    }

    /// Chunk column containing the given world position.
    #[inline]
    pub fn containing(x: f32, z: f32) -> Self {
        Self {
            cx: (x / CHUNK_SX as f32).floor() as i32,
            cz: (z / CHUNK_SZ as f32).floor() as i32,
        }
    }

    /// The four lateral neighbors sharing a vertical face.
    #[inline]
    pub fn lateral_neighbors(self) -> [ChunkCoord; 4] {
        [
            ChunkCoord::new(self.cx - 1, self.cz),
            ChunkCoord::new(self.cx + 1, self.cz),
            ChunkCoord::new(self.cx, self.cz - 1),
            ChunkCoord::new(self.cx, self.cz + 1),
        ]
    }
}

/// Integer coordinates of a 16^3 chunklet: chunk x/z and slice y 0..8.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ChunkletCoord {
    pub cx: i32,
    pub sy: i32,
    pub cz: i32,
}

impl ChunkletCoord {
    #[inline]
    pub const fn new(cx: i32, sy: i32, cz: i32) -> Self {
        Self { cx, sy, cz }
    }

    /// Chunklet containing the given world position. The slice index
    /// may land outside `0..8`; callers treat that as unloaded.
    #[inline]
    pub fn containing(p: Vec3) -> Self {
        Self {
            cx: (p.x / 16.0).floor() as i32,
            sy: (p.y / 16.0).floor() as i32,
            cz: (p.z / 16.0).floor() as i32,
        }
    }

    #[inline]
    pub fn chunk(self) -> ChunkCoord {
        ChunkCoord::new(self.cx, self.cz)
    }

    #[inline]
    pub fn in_world_height(self) -> bool {
        (0..CHUNKLETS_PER_CHUNK as i32).contains(&self.sy)
    }

    /// Neighboring chunklet across the given face.
    #[inline]
    pub fn neighbor(self, face: Face) -> Self {
        let (dx, dy, dz) = face.delta();
        Self {
            cx: self.cx + dx,
            sy: self.sy + dy,
            cz: self.cz + dz,
        }
    }

    /// World-space minimum corner.
    #[inline]
    pub fn world_min(self) -> Vec3 {
        Vec3::new(
            self.cx as f32 * 16.0,
            self.sy as f32 * 16.0,
            self.cz as f32 * 16.0,
        )
    }

    #[inline]
    pub fn bounds(self) -> Aabb {
        let min = self.world_min();
        Aabb::new(min, min + Vec3::new(16.0, 16.0, 16.0))
    }

    /// Approximate anchor used for culling and sort order only: the
    /// minimum corner nudged half a block inward, never the center.
    #[inline]
    pub fn anchor(self) -> Vec3 {
        self.world_min() + Vec3::new(0.5, 0.5, 0.5)
    }

    /// Squared distance from the anchor to a point.
    #[inline]
    pub fn distance_sq(self, p: Vec3) -> f32 {
        self.anchor().distance_sq(p)
    }
}
