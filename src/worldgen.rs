//! Procedural chunk source for the demo and tests: a heightmapped
//! terrain with water, plus a straight-down column skylight.

use fastnoise_lite::{FastNoiseLite, NoiseType};
use tephra_blocks::BlockRegistry;
use tephra_chunk::{CHUNK_SY, ChunkCoord, ChunkPayload, ChunkSource};

pub struct ProceduralSource {
    noise: FastNoiseLite,
    sea_level: usize,
    stone: u8,
    dirt: u8,
    grass: u8,
    sand: u8,
    water: u8,
}

impl ProceduralSource {
    pub fn new(seed: i32, reg: &BlockRegistry) -> Self {
        let mut noise = FastNoiseLite::with_seed(seed);
        noise.set_noise_type(Some(NoiseType::OpenSimplex2));
        noise.set_frequency(Some(0.008));
        let id = |name: &str, fallback: u8| reg.id_by_name(name).unwrap_or(fallback);
        Self {
            noise,
            sea_level: 38,
            stone: id("stone", 1),
            dirt: id("dirt", 3),
            grass: id("grass", 2),
            sand: id("sand", 12),
            water: id("water", 8),
        }
    }

    /// Terrain height at a world column, in [8, 96).
    fn height(&self, wx: i32, wz: i32) -> usize {
        let n = self.noise.get_noise_2d(wx as f32, wz as f32);
        let h = (n + 1.0) * 0.5 * 88.0 + 8.0;
        (h as usize).clamp(1, CHUNK_SY - 1)
    }
}

impl ChunkSource for ProceduralSource {
    fn load(&self, coord: ChunkCoord) -> Option<ChunkPayload> {
        let mut payload = ChunkPayload::empty();
        let base_x = coord.cx * 16;
        let base_z = coord.cz * 16;
        for z in 0..16usize {
            for x in 0..16usize {
                let height = self.height(base_x + x as i32, base_z + z as i32);
                let beach = height <= self.sea_level + 1;
                for y in 0..height {
                    let id = if y + 1 == height {
                        if beach { self.sand } else { self.grass }
                    } else if y + 4 >= height {
                        self.dirt
                    } else {
                        self.stone
                    };
                    payload.set_block(x, y, z, id);
                }
                let water_top = self.sea_level.max(height);
                for y in height..water_top {
                    payload.set_block(x, y, z, self.water);
                }
                // Straight-down skylight: full above the surface, dark
                // inside terrain, dimmed one level per water cell.
                for y in 0..CHUNK_SY {
                    let light = if y >= water_top {
                        15
                    } else if y >= height {
                        let depth = water_top - y;
                        15u8.saturating_sub(depth as u8 * 2)
                    } else {
                        0
                    };
                    payload.set_sky_light(x, y, z, light);
                }
            }
        }
        Some(payload)
    }
}
