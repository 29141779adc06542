//! Sheet-bounded visibility flood fill over chunklet adjacency.

use std::collections::VecDeque;

use tephra_chunk::{ChunkletCoord, Face};
use tephra_geom::Containment;

/// What the walker needs to know about the world. Kept abstract so the
/// traversal can be exercised against synthetic graphs.
pub trait ChunkletGraph {
    /// Whether a loaded chunklet occupies this coordinate.
    fn exists(&self, coord: ChunkletCoord) -> bool;
    /// Sheet flag for one face of a loaded chunklet.
    fn sheet(&self, coord: ChunkletCoord, face: Face) -> bool;
    fn stamp(&self, coord: ChunkletCoord) -> u64;
    fn set_stamp(&mut self, coord: ChunkletCoord, stamp: u64);
    fn containment(&self, coord: ChunkletCoord) -> Containment;
    fn distance_sq(&self, coord: ChunkletCoord) -> f32;
}

/// BFS walker with an owned, reusable work queue. Visited tracking
/// rides on the per-chunklet stamps so no reset pass is needed between
/// frames; each frame just uses a fresh stamp value.
#[derive(Default)]
pub struct Walker {
    queue: VecDeque<ChunkletCoord>,
    /// Optional squared-distance cap on the traversal.
    pub max_distance_sq: Option<f32>,
}

impl Walker {
    /// Expands from the chunklet containing the eye, appending every
    /// admitted chunklet to `out` exactly once. Does nothing when the
    /// origin chunklet is not loaded.
    pub fn run(
        &mut self,
        graph: &mut dyn ChunkletGraph,
        origin: ChunkletCoord,
        stamp: u64,
        out: &mut Vec<ChunkletCoord>,
    ) {
        if !graph.exists(origin) {
            return;
        }
        self.queue.clear();
        graph.set_stamp(origin, stamp);
        out.push(origin);
        self.queue.push_back(origin);

        while let Some(cur) = self.queue.pop_front() {
            for face in Face::ALL {
                // One-way directional prune: once the traversal has
                // crossed the origin's boundary along an axis it never
                // re-crosses it backwards. Not a full occlusion test.
                if Self::pruned(origin, cur, face) {
                    continue;
                }
                let next = cur.neighbor(face);
                if !graph.exists(next) {
                    continue;
                }
                // Either side of the shared face being sealed blocks
                // visibility through it.
                if graph.sheet(cur, face) || graph.sheet(next, face.opposite()) {
                    continue;
                }
                if graph.stamp(next) == stamp {
                    continue;
                }
                if let Some(max) = self.max_distance_sq
                    && graph.distance_sq(next) > max
                {
                    continue;
                }
                if graph.containment(next) == Containment::Miss {
                    continue;
                }
                graph.set_stamp(next, stamp);
                out.push(next);
                self.queue.push_back(next);
            }
        }
    }

    #[inline]
    fn pruned(origin: ChunkletCoord, cur: ChunkletCoord, face: Face) -> bool {
        match face {
            Face::PosX => cur.cx < origin.cx,
            Face::NegX => cur.cx > origin.cx,
            Face::PosY => cur.sy < origin.sy,
            Face::NegY => cur.sy > origin.sy,
            Face::PosZ => cur.cz < origin.cz,
            Face::NegZ => cur.cz > origin.cz,
        }
    }
}
