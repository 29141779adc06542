use tephra_blocks::BlockRegistry;
use tephra_geom::{Aabb, Containment, Frustum, Vec3};
use tephra_mesh_cpu::{ChunkletMesh, Face};

use crate::coords::ChunkletCoord;

const DIM: i32 = 16;

/// One 16^3 slice of a chunk. Owns the published mesh buffers and the
/// flag lifecycle that drives background remeshing.
pub struct Chunklet {
    coord: ChunkletCoord,
    /// Per-face seal flags: true when every boundary block on that face
    /// is opaque, so visibility cannot pass through it.
    sheets: [bool; 6],
    /// True when no mesh face could possibly be emitted; empty
    /// chunklets skip meshing entirely but still admit visibility.
    empty: bool,
    dirty: bool,
    /// Job id of the in-flight mesh build, if any.
    pending: Option<u64>,
    mesh: Option<ChunkletMesh>,
    /// Last traversal stamp that visited this chunklet.
    stamp: u64,
}

impl Chunklet {
    /// Builds the chunklet from a chunk-local sampler (`x`/`z` in
    /// chunk-local block coordinates, `y` absolute in `0..128`; the
    /// sampler answers one block beyond every boundary). Sheet and
    /// empty flags are fixed here for the chunklet's lifetime.
    pub(crate) fn build(
        coord: ChunkletCoord,
        sample: &dyn Fn(i32, i32, i32) -> u8,
        reg: &BlockRegistry,
    ) -> Self {
        let y0 = coord.sy * DIM;
        let at = |x: i32, y: i32, z: i32| sample(x, y0 + y, z);

        let mut sheets = [false; 6];
        for face in Face::ALL {
            sheets[face.index()] = Self::face_sealed(face, &at, reg);
        }

        Self {
            coord,
            sheets,
            empty: Self::scan_empty(&at, reg),
            dirty: true,
            pending: None,
            mesh: None,
            stamp: 0,
        }
    }

    /// A face is sealed when all 256 blocks of its boundary layer are
    /// opaque.
    fn face_sealed(face: Face, at: &dyn Fn(i32, i32, i32) -> u8, reg: &BlockRegistry) -> bool {
        let layer = |a: i32, b: i32| -> (i32, i32, i32) {
            match face {
                Face::PosY => (a, DIM - 1, b),
                Face::NegY => (a, 0, b),
                Face::PosX => (DIM - 1, a, b),
                Face::NegX => (0, a, b),
                Face::PosZ => (a, b, DIM - 1),
                Face::NegZ => (a, b, 0),
            }
        };
        for a in 0..DIM {
            for b in 0..DIM {
                let (x, y, z) = layer(a, b);
                if !reg.is_opaque(at(x, y, z)) {
                    return false;
                }
            }
        }
        true
    }

    /// True when no cell would emit geometry: the mesher skips faces
    /// between identical ids and faces hidden by an opaque neighbor,
    /// so a chunklet is empty when every renderable cell is boxed in.
    fn scan_empty(at: &dyn Fn(i32, i32, i32) -> u8, reg: &BlockRegistry) -> bool {
        for x in 0..DIM {
            for y in 0..DIM {
                for z in 0..DIM {
                    let id = at(x, y, z);
                    let renderable = reg.get(id).map(|t| t.renderable()).unwrap_or(false);
                    if !renderable {
                        continue;
                    }
                    for face in Face::ALL {
                        let (dx, dy, dz) = face.delta();
                        let nid = at(x + dx, y + dy, z + dz);
                        if nid != id && !reg.is_opaque(nid) {
                            return false;
                        }
                    }
                }
            }
        }
        true
    }

    #[inline]
    pub fn coord(&self) -> ChunkletCoord {
        self.coord
    }

    #[inline]
    pub fn sheet(&self, face: Face) -> bool {
        self.sheets[face.index()]
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.empty
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Marks the geometry stale; the next draw that wants this chunklet
    /// will schedule a rebuild.
    #[inline]
    pub fn geom_dirty(&mut self) {
        self.dirty = true;
    }

    /// Whether a mesh build should be scheduled right now.
    #[inline]
    pub fn needs_mesh(&self) -> bool {
        !self.empty && self.dirty && self.pending.is_none()
    }

    /// Records the job id handed to the mesh worker and clears the
    /// dirty flag. An edit that lands while the job is in flight sets
    /// dirty again, which reschedules after this job publishes.
    pub fn begin_mesh(&mut self, job_id: u64) {
        debug_assert!(self.pending.is_none());
        self.pending = Some(job_id);
        self.dirty = false;
    }

    /// Accepts a finished mesh only if it answers the in-flight job;
    /// results from superseded jobs are dropped. Returns whether the
    /// mesh was installed.
    pub fn publish_mesh(&mut self, job_id: u64, mesh: ChunkletMesh) -> bool {
        if self.pending != Some(job_id) {
            return false;
        }
        self.pending = None;
        self.mesh = Some(mesh);
        true
    }

    #[inline]
    pub fn mesh(&self) -> Option<&ChunkletMesh> {
        self.mesh.as_ref()
    }

    /// Drops published geometry and forgets any in-flight job. A late
    /// result for the forgotten job will fail its id check.
    pub fn unload(&mut self) {
        self.mesh = None;
        self.pending = None;
        self.dirty = true;
    }

    #[inline]
    pub fn stamp(&self) -> u64 {
        self.stamp
    }

    #[inline]
    pub fn set_stamp(&mut self, stamp: u64) {
        self.stamp = stamp;
    }

    #[inline]
    pub fn bounds(&self) -> Aabb {
        self.coord.bounds()
    }

    #[inline]
    pub fn anchor(&self) -> Vec3 {
        self.coord.anchor()
    }

    #[inline]
    pub fn distance_sq(&self, p: Vec3) -> f32 {
        self.coord.distance_sq(p)
    }

    #[inline]
    pub fn containment(&self, frustum: &Frustum) -> Containment {
        frustum.intersect_aabb(&self.bounds())
    }
}
