use serde::Deserialize;

/// Block ids are single bytes; 0 is always air.
pub type BlockId = u8;

pub const AIR: BlockId = 0;

/// Which side of a block a face belongs to, for texture selection.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum FaceRole {
    Top,
    Bottom,
    Side,
}

/// Cell coordinates into a square texture atlas.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize)]
pub struct Tile {
    pub tx: u32,
    pub ty: u32,
}

impl Tile {
    /// UV rectangle `(u0, v0, u1, v1)` for this tile in an atlas with
    /// `tiles_per_row` cells per axis.
    #[inline]
    pub fn uv_rect(self, tiles_per_row: u32) -> (f32, f32, f32, f32) {
        let step = 1.0 / tiles_per_row as f32;
        let u0 = self.tx as f32 * step;
        let v0 = self.ty as f32 * step;
        (u0, v0, u0 + step, v0 + step)
    }
}
