use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::path::Path;

use crate::config::{BlockDef, BlocksConfig};
use crate::types::{AIR, BlockId, FaceRole, Tile};

/// A registered block kind. Queries against unregistered ids fall back
/// to "air": nothing to draw, nothing to collide with.
#[derive(Clone, Debug)]
pub struct BlockType {
    pub name: String,
    pub solid: bool,
    pub opaque: bool,
    pub water: bool,
    tile_all: Option<Tile>,
    tile_top: Option<Tile>,
    tile_bottom: Option<Tile>,
    tile_side: Option<Tile>,
}

impl BlockType {
    /// Face tile for the given role, falling back to the `all` tile.
    #[inline]
    pub fn tile_for(&self, role: FaceRole) -> Option<Tile> {
        let specific = match role {
            FaceRole::Top => self.tile_top,
            FaceRole::Bottom => self.tile_bottom,
            FaceRole::Side => self.tile_side,
        };
        specific.or(self.tile_all)
    }

    /// Whether this block can emit geometry at all.
    #[inline]
    pub fn renderable(&self) -> bool {
        self.tile_all.is_some()
            || self.tile_top.is_some()
            || self.tile_bottom.is_some()
            || self.tile_side.is_some()
    }
}

#[derive(Default)]
pub struct BlockRegistry {
    types: Vec<Option<BlockType>>,
    by_name: HashMap<String, BlockId>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self {
            types: vec![None; 256],
            by_name: HashMap::new(),
        }
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, Box<dyn Error>> {
        let cfg: BlocksConfig = toml::from_str(text)?;
        Self::from_config(cfg)
    }

    pub fn from_config(cfg: BlocksConfig) -> Result<Self, Box<dyn Error>> {
        let mut reg = Self::new();
        for def in cfg.blocks {
            reg.insert(def)?;
        }
        Ok(reg)
    }

    fn insert(&mut self, def: BlockDef) -> Result<(), Box<dyn Error>> {
        let slot = &mut self.types[def.id as usize];
        if slot.is_some() {
            return Err(format!("duplicate block id {} ({})", def.id, def.name).into());
        }
        if self.by_name.contains_key(&def.name) {
            return Err(format!("duplicate block name {}", def.name).into());
        }
        let tiles = def.tiles.unwrap_or_default();
        *slot = Some(BlockType {
            name: def.name.clone(),
            solid: def.solid,
            opaque: def.opaque,
            water: def.water,
            tile_all: tiles.all,
            tile_top: tiles.top,
            tile_bottom: tiles.bottom,
            tile_side: tiles.side,
        });
        self.by_name.insert(def.name, def.id);
        Ok(())
    }

    #[inline]
    pub fn get(&self, id: BlockId) -> Option<&BlockType> {
        self.types[id as usize].as_ref()
    }

    #[inline]
    pub fn id_by_name(&self, name: &str) -> Option<BlockId> {
        self.by_name.get(name).copied()
    }

    #[inline]
    pub fn is_opaque(&self, id: BlockId) -> bool {
        self.get(id).map(|t| t.opaque).unwrap_or(false)
    }

    /// Solid for collision purposes: present, registered, and not water.
    #[inline]
    pub fn is_solid(&self, id: BlockId) -> bool {
        if id == AIR {
            return false;
        }
        self.get(id).map(|t| t.solid && !t.water).unwrap_or(false)
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) const TEST_BLOCKS: &str = r#"
        [[blocks]]
        name = "air"
        id = 0

        [[blocks]]
        name = "stone"
        id = 1
        solid = true
        opaque = true
        tiles = { all = { tx = 1, ty = 0 } }

        [[blocks]]
        name = "grass"
        id = 2
        solid = true
        opaque = true
        tiles = { top = { tx = 0, ty = 0 }, bottom = { tx = 2, ty = 0 }, side = { tx = 3, ty = 0 } }

        [[blocks]]
        name = "water"
        id = 8
        solid = true
        water = true
        tiles = { all = { tx = 13, ty = 12 } }
    "#;

    #[test]
    fn loads_and_answers_queries() {
        let reg = BlockRegistry::from_toml(TEST_BLOCKS).unwrap();
        assert_eq!(reg.id_by_name("stone"), Some(1));
        assert!(reg.is_opaque(1));
        assert!(reg.is_solid(1));
        assert!(!reg.is_opaque(8));
        // Water never collides even though it is flagged solid.
        assert!(!reg.is_solid(8));
    }

    #[test]
    fn unregistered_ids_are_airlike() {
        let reg = BlockRegistry::from_toml(TEST_BLOCKS).unwrap();
        assert!(reg.get(200).is_none());
        assert!(!reg.is_opaque(200));
        assert!(!reg.is_solid(200));
    }

    #[test]
    fn role_fallback_goes_to_all() {
        let reg = BlockRegistry::from_toml(TEST_BLOCKS).unwrap();
        let grass = reg.get(2).unwrap();
        assert_eq!(grass.tile_for(FaceRole::Top), Some(Tile { tx: 0, ty: 0 }));
        assert_eq!(grass.tile_for(FaceRole::Side), Some(Tile { tx: 3, ty: 0 }));
        let stone = reg.get(1).unwrap();
        assert_eq!(stone.tile_for(FaceRole::Side), Some(Tile { tx: 1, ty: 0 }));
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let text = r#"
            [[blocks]]
            name = "a"
            id = 1
            [[blocks]]
            name = "b"
            id = 1
        "#;
        assert!(BlockRegistry::from_toml(text).is_err());
    }

    #[test]
    fn air_has_no_geometry() {
        let reg = BlockRegistry::from_toml(TEST_BLOCKS).unwrap();
        assert!(!reg.get(0).unwrap().renderable());
        assert!(reg.get(1).unwrap().renderable());
    }

    proptest::proptest! {
        #[test]
        fn uv_rects_stay_in_unit_square(tx in 0u32..16, ty in 0u32..16) {
            let (u0, v0, u1, v1) = Tile { tx, ty }.uv_rect(16);
            proptest::prop_assert!(u0 >= 0.0 && v0 >= 0.0);
            proptest::prop_assert!(u1 <= 1.0 + 1e-6 && v1 <= 1.0 + 1e-6);
            proptest::prop_assert!(u1 > u0 && v1 > v0);
        }
    }
}
