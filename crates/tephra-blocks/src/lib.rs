//! Block definitions and the id-indexed registry.
#![forbid(unsafe_code)]

pub mod config;
pub mod registry;
pub mod types;

pub use config::{BlockDef, BlocksConfig, TilesDef};
pub use registry::{BlockRegistry, BlockType};
pub use types::{AIR, BlockId, FaceRole, Tile};
