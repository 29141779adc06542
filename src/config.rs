//! Engine configuration, loadable from a TOML file with every field
//! optional.

use std::error::Error;
use std::path::Path;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Chunk window radius r; the window is (2r+1) squared columns.
    pub radius: i32,
    pub seed: i32,
    pub mesh_workers: usize,
    pub load_workers: usize,
    pub fov_y_deg: f32,
    /// Optional squared-distance cap for the visibility walk.
    pub max_walk_distance_sq: Option<f32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            radius: 4,
            seed: 1337,
            mesh_workers: 1,
            load_workers: 2,
            fov_y_deg: 70.0,
            max_walk_distance_sq: None,
        }
    }
}

impl Config {
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Ok(toml::from_str(&text)?)
    }
}
