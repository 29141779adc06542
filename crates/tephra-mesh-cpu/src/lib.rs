//! CPU-side chunklet mesh generation.
#![forbid(unsafe_code)]

mod build;
mod face;
mod mesh_build;
mod snapshot;

pub use build::{ChunkletMesh, brightness, build_chunklet_mesh};
pub use face::Face;
pub use mesh_build::MeshBuild;
pub use snapshot::{CHUNKLET_DIM, ChunkletSnapshot, SNAP_DIM};
