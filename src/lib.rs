//! Voxel streaming client: sliding chunk window, sheet-bounded
//! visibility, background meshing, and player collision.
#![forbid(unsafe_code)]

pub mod camera;
pub mod config;
pub mod player;
pub mod render;
pub mod visibility;
pub mod world;
pub mod worldgen;
