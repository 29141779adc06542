use tephra_blocks::BlockRegistry;
use tephra_geom::Vec3;

use crate::face::Face;
use crate::mesh_build::MeshBuild;
use crate::snapshot::{CHUNKLET_DIM, ChunkletSnapshot};

/// Square texture atlas cells per axis.
pub const ATLAS_TILES: u32 = 16;

const OPAQUE_ALPHA: u8 = 255;

/// The two published buffers for a chunklet; either may be absent when
/// no faces of that class were emitted.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChunkletMesh {
    pub opaque: Option<MeshBuild>,
    pub transparent: Option<MeshBuild>,
}

/// Light-to-brightness curve: each missing light level dims the face by
/// a factor of 0.8.
#[inline]
pub fn brightness(light: u8) -> u8 {
    let l = light.min(15);
    (255.0 * 0.8f32.powi((15 - l) as i32)).round() as u8
}

/// Converts a snapshot into the chunklet's two mesh buffers.
///
/// A face is emitted iff the neighboring cell holds a *different* block
/// id that is absent or non-opaque; identical adjacent ids never emit.
/// Vertex brightness comes from the light value of the exposed neighbor
/// cell. Output is deterministic for identical snapshot contents.
pub fn build_chunklet_mesh(snap: &ChunkletSnapshot, reg: &BlockRegistry) -> ChunkletMesh {
    let mut opaque = MeshBuild::default();
    let mut transparent = MeshBuild::default();

    for y in 0..CHUNKLET_DIM as i32 {
        for z in 0..CHUNKLET_DIM as i32 {
            for x in 0..CHUNKLET_DIM as i32 {
                let id = snap.block(x, y, z);
                let Some(ty) = reg.get(id) else { continue };
                if !ty.renderable() {
                    continue;
                }
                let origin = snap.origin + Vec3::new(x as f32, y as f32, z as f32);
                for face in Face::ALL {
                    let (dx, dy, dz) = face.delta();
                    let (nx, ny, nz) = (x + dx, y + dy, z + dz);
                    let nid = snap.block(nx, ny, nz);
                    if nid == id || reg.is_opaque(nid) {
                        continue;
                    }
                    let Some(tile) = ty.tile_for(face.role()) else {
                        continue;
                    };
                    let level = brightness(snap.light(nx, ny, nz));
                    let rgba = [level, level, level, OPAQUE_ALPHA];
                    let target = if ty.opaque {
                        &mut opaque
                    } else {
                        &mut transparent
                    };
                    target.add_unit_face(face, origin, tile.uv_rect(ATLAS_TILES), rgba);
                }
            }
        }
    }

    log::trace!(
        target: "mesh",
        "chunklet at {:?}: {} opaque / {} transparent quads",
        snap.origin,
        opaque.quad_count(),
        transparent.quad_count(),
    );

    ChunkletMesh {
        opaque: (!opaque.is_empty()).then_some(opaque),
        transparent: (!transparent.is_empty()).then_some(transparent),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_registry() -> BlockRegistry {
        BlockRegistry::from_toml(
            r#"
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
            name = "water"
            id = 8
            solid = true
            water = true
            tiles = { all = { tx = 13, ty = 12 } }

            [[blocks]]
            name = "glass"
            id = 20
            solid = true
            tiles = { all = { tx = 1, ty = 3 } }
            "#,
        )
        .unwrap()
    }

    fn snapshot_with(blocks: &[((i32, i32, i32), u8)]) -> ChunkletSnapshot {
        let mut snap = ChunkletSnapshot::default();
        snap.fill(
            Vec3::ZERO,
            |x, y, z| {
                blocks
                    .iter()
                    .find(|(p, _)| *p == (x, y, z))
                    .map(|(_, id)| *id)
                    .unwrap_or(0)
            },
            |_, _, _| 15,
        );
        snap
    }

    #[test]
    fn lone_block_emits_six_opaque_faces() {
        let reg = test_registry();
        let snap = snapshot_with(&[((8, 8, 8), 1)]);
        let mesh = build_chunklet_mesh(&snap, &reg);
        let opaque = mesh.opaque.expect("opaque buffer");
        assert_eq!(opaque.quad_count(), 6);
        assert_eq!(opaque.vertex_count(), 24);
        assert!(mesh.transparent.is_none());
    }

    #[test]
    fn identical_neighbors_never_emit_between_themselves() {
        let reg = test_registry();
        let snap = snapshot_with(&[((4, 4, 4), 8), ((5, 4, 4), 8)]);
        let mesh = build_chunklet_mesh(&snap, &reg);
        // Two touching water blocks: 10 outer faces, none on the seam.
        let transparent = mesh.transparent.expect("transparent buffer");
        assert_eq!(transparent.quad_count(), 10);
        assert!(mesh.opaque.is_none());
    }

    #[test]
    fn different_transparent_neighbors_emit_both_sides() {
        let reg = test_registry();
        let snap = snapshot_with(&[((4, 4, 4), 8), ((5, 4, 4), 20)]);
        let mesh = build_chunklet_mesh(&snap, &reg);
        // Water/glass disagree, so the seam faces both stay.
        assert_eq!(mesh.transparent.expect("transparent").quad_count(), 12);
    }

    #[test]
    fn opaque_neighbor_hides_the_face() {
        let reg = test_registry();
        let snap = snapshot_with(&[((4, 4, 4), 8), ((5, 4, 4), 1)]);
        let mesh = build_chunklet_mesh(&snap, &reg);
        assert_eq!(mesh.transparent.expect("water").quad_count(), 5);
        assert_eq!(mesh.opaque.expect("stone").quad_count(), 5);
    }

    #[test]
    fn unregistered_ids_render_nothing() {
        let reg = test_registry();
        let snap = snapshot_with(&[((4, 4, 4), 200)]);
        let mesh = build_chunklet_mesh(&snap, &reg);
        assert!(mesh.opaque.is_none());
        assert!(mesh.transparent.is_none());
    }

    #[test]
    fn output_is_deterministic() {
        let reg = test_registry();
        let mut snap = ChunkletSnapshot::default();
        // Deterministic pseudo-random fill.
        let mut state = 0x2545_F491u32;
        let mut next = move || {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state
        };
        let mut cells = Vec::new();
        for _ in 0..512 {
            let r = next();
            let x = (r & 15) as i32;
            let y = ((r >> 4) & 15) as i32;
            let z = ((r >> 8) & 15) as i32;
            let id = if r & 1 == 0 { 1u8 } else { 8u8 };
            cells.push(((x, y, z), id));
        }
        snap.fill(
            Vec3::new(32.0, 16.0, -16.0),
            |x, y, z| {
                cells
                    .iter()
                    .find(|(p, _)| *p == (x, y, z))
                    .map(|(_, id)| *id)
                    .unwrap_or(0)
            },
            |x, y, z| ((x + y + z).rem_euclid(16)) as u8,
        );
        let a = build_chunklet_mesh(&snap, &reg);
        let b = build_chunklet_mesh(&snap, &reg);
        assert_eq!(a, b);
    }

    #[test]
    fn brightness_curve_endpoints_and_monotonicity() {
        assert_eq!(brightness(15), 255);
        assert!(brightness(0) < 10);
        for l in 0..15u8 {
            assert!(brightness(l) <= brightness(l + 1));
        }
    }

    proptest::proptest! {
        #[test]
        fn brightness_saturates_above_fifteen(l in 0u8..=255) {
            proptest::prop_assert!(brightness(l) <= 255);
            if l >= 15 {
                proptest::prop_assert_eq!(brightness(l), 255);
            }
        }
    }
}
