use serde::Deserialize;

use crate::types::Tile;

/// On-disk shape of a blocks definition file.
#[derive(Debug, Deserialize)]
pub struct BlocksConfig {
    pub blocks: Vec<BlockDef>,
}

#[derive(Debug, Deserialize)]
pub struct BlockDef {
    pub name: String,
    pub id: u8,
    /// Collides with the player.
    #[serde(default)]
    pub solid: bool,
    /// Hides neighboring faces and counts toward sealed sheets.
    #[serde(default)]
    pub opaque: bool,
    /// Water is non-solid for collision even when present.
    #[serde(default)]
    pub water: bool,
    /// Absent tiles mean the block emits no geometry (air and friends).
    pub tiles: Option<TilesDef>,
}

/// Per-role tile selection; `all` is the fallback for unset roles.
#[derive(Debug, Default, Deserialize)]
pub struct TilesDef {
    pub all: Option<Tile>,
    pub top: Option<Tile>,
    pub bottom: Option<Tile>,
    pub side: Option<Tile>,
}
