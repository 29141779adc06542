use tephra_geom::Vec3;

use crate::face::Face;

/// Flat vertex/index arrays for one draw batch. Positions are in world
/// units; colors carry the per-vertex light-derived brightness.
#[derive(Default, Clone, Debug, PartialEq)]
pub struct MeshBuild {
    pub pos: Vec<f32>,
    pub norm: Vec<f32>,
    pub uv: Vec<f32>,
    pub idx: Vec<u32>,
    pub col: Vec<u8>,
}

impl MeshBuild {
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.pos.len() / 3
    }

    #[inline]
    pub fn quad_count(&self) -> usize {
        self.idx.len() / 6
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.idx.is_empty()
    }

    /// Appends a unit quad on the given face of the block whose minimum
    /// corner sits at `origin`. Winding is counterclockwise seen from
    /// outside the block.
    pub fn add_unit_face(
        &mut self,
        face: Face,
        origin: Vec3,
        uv_rect: (f32, f32, f32, f32),
        rgba: [u8; 4],
    ) {
        let o = origin;
        let corners: [Vec3; 4] = match face {
            Face::PosY => [
                Vec3::new(o.x, o.y + 1.0, o.z),
                Vec3::new(o.x, o.y + 1.0, o.z + 1.0),
                Vec3::new(o.x + 1.0, o.y + 1.0, o.z + 1.0),
                Vec3::new(o.x + 1.0, o.y + 1.0, o.z),
            ],
            Face::NegY => [
                Vec3::new(o.x, o.y, o.z),
                Vec3::new(o.x + 1.0, o.y, o.z),
                Vec3::new(o.x + 1.0, o.y, o.z + 1.0),
                Vec3::new(o.x, o.y, o.z + 1.0),
            ],
            Face::PosX => [
                Vec3::new(o.x + 1.0, o.y, o.z),
                Vec3::new(o.x + 1.0, o.y + 1.0, o.z),
                Vec3::new(o.x + 1.0, o.y + 1.0, o.z + 1.0),
                Vec3::new(o.x + 1.0, o.y, o.z + 1.0),
            ],
            Face::NegX => [
                Vec3::new(o.x, o.y, o.z),
                Vec3::new(o.x, o.y, o.z + 1.0),
                Vec3::new(o.x, o.y + 1.0, o.z + 1.0),
                Vec3::new(o.x, o.y + 1.0, o.z),
            ],
            Face::PosZ => [
                Vec3::new(o.x, o.y, o.z + 1.0),
                Vec3::new(o.x + 1.0, o.y, o.z + 1.0),
                Vec3::new(o.x + 1.0, o.y + 1.0, o.z + 1.0),
                Vec3::new(o.x, o.y + 1.0, o.z + 1.0),
            ],
            Face::NegZ => [
                Vec3::new(o.x, o.y, o.z),
                Vec3::new(o.x, o.y + 1.0, o.z),
                Vec3::new(o.x + 1.0, o.y + 1.0, o.z),
                Vec3::new(o.x + 1.0, o.y, o.z),
            ],
        };
        let (u0, v0, u1, v1) = uv_rect;
        let uvs = [(u0, v1), (u0, v0), (u1, v0), (u1, v1)];

        let n = face.normal();
        let base = self.vertex_count() as u32;
        for (corner, uv) in corners.iter().zip(uvs.iter()) {
            self.pos.extend_from_slice(&[corner.x, corner.y, corner.z]);
            self.norm.extend_from_slice(&[n.x, n.y, n.z]);
            self.uv.extend_from_slice(&[uv.0, uv.1]);
            self.col.extend_from_slice(&rgba);
        }
        self.idx
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
}
