//! Seam to the rendering backend. The engine decides what to draw and
//! in which order; actually drawing triangles happens elsewhere.

use tephra_chunk::ChunkletCoord;
use tephra_mesh_cpu::MeshBuild;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Pass {
    Opaque,
    Transparent,
}

/// One call per present mesh handle, in the exact order supplied by
/// `World::draw`.
pub trait RenderBackend {
    fn draw_chunklet(&mut self, coord: ChunkletCoord, pass: Pass, mesh: &MeshBuild);
}

/// Counting backend used by the headless demo and tests.
#[derive(Default)]
pub struct StatsBackend {
    pub opaque_draws: usize,
    pub transparent_draws: usize,
    pub triangles: usize,
    /// Draw order as received, for ordering assertions.
    pub sequence: Vec<(ChunkletCoord, Pass)>,
}

impl StatsBackend {
    pub fn reset(&mut self) {
        self.opaque_draws = 0;
        self.transparent_draws = 0;
        self.triangles = 0;
        self.sequence.clear();
    }
}

impl RenderBackend for StatsBackend {
    fn draw_chunklet(&mut self, coord: ChunkletCoord, pass: Pass, mesh: &MeshBuild) {
        match pass {
            Pass::Opaque => self.opaque_draws += 1,
            Pass::Transparent => self.transparent_draws += 1,
        }
        self.triangles += mesh.idx.len() / 3;
        self.sequence.push((coord, pass));
    }
}
