// ============================================
// Procedural Source - Процедурная генерация чанков
// ============================================
// generate(cx, cy, cz) - чистая функция: без I/O и общего состояния,
// поэтому вызывается параллельно из пула rayon.

use serde::{Deserialize, Serialize};

use crate::gpu::layout::ChunkLayout;
use crate::gpu::voxel::{Voxel, VoxelChunk, AIR, DIRT, GRASS, STONE, WATER};
use crate::gpu::world::{ChunkCoord, WorldResult};

use super::noise::fbm2d;
use super::ChunkSource;

/// Параметры ландшафта (карта высот на фрактальном шуме)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainParams {
    pub seed: u32,
    /// Больше - глаже, меньше - грубее
    pub scale: f32,
    pub octaves: u32,
    pub persistence: f32,
    pub lacunarity: f32,
    /// Минимальная высота поверхности в вокселях
    pub base_height: f32,
    /// Разброс высот над base_height
    pub amplitude: f32,
    /// Всё ниже этого уровня и выше поверхности - вода
    pub ocean_level: i64,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            seed: 42,
            scale: 100.0,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            base_height: 22.0,
            amplitude: 40.0,
            ocean_level: 32,
        }
    }
}

impl TerrainParams {
    /// Высота поверхности в колонне (x, z) мировых координат
    #[inline]
    pub fn surface_height(&self, x: i64, z: i64) -> i64 {
        let h = fbm2d(
            x as f32 / self.scale,
            z as f32 / self.scale,
            self.octaves,
            self.persistence,
            self.lacunarity,
            self.seed,
        );
        (self.base_height + h * self.amplitude) as i64
    }

    /// Материал по высоте относительно поверхности
    #[inline]
    pub fn material_at(&self, y: i64, surface: i64) -> Voxel {
        if y < surface - 5 {
            STONE
        } else if y < surface - 1 {
            DIRT
        } else if y < surface {
            GRASS
        } else if y < self.ocean_level {
            WATER
        } else {
            AIR
        }
    }
}

/// Процедурный генератор (выбирается в конфигурации)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Generator {
    /// Ландшафт: камень, земля, трава, вода
    Terrain(TerrainParams),
    /// Рёбра куба материалом 1 и сфера в центре каждого чанка
    FramedSphere { radius: f32, material: Voxel },
    /// Восемь углов материалом 1 и сфера в центре каждого чанка
    CornersSphere { radius: f32, material: Voxel },
    /// Каждый воксель - один материал (0 = пустой мир)
    Fill { material: Voxel },
}

impl Default for Generator {
    fn default() -> Self {
        Generator::Terrain(TerrainParams::default())
    }
}

#[inline]
fn in_center_sphere(x: u32, y: u32, z: u32, size: u32, radius: f32) -> bool {
    let c = size as f32 / 2.0;
    let dx = x as f32 + 0.5 - c;
    let dy = y as f32 + 0.5 - c;
    let dz = z as f32 + 0.5 - c;
    (dx * dx + dy * dy + dz * dz).sqrt() < radius
}

#[inline]
fn boundary_axes(x: u32, y: u32, z: u32, size: u32) -> u32 {
    let last = size - 1;
    [x, y, z].iter().filter(|&&v| v == 0 || v == last).count() as u32
}

/// Детерминированная генерация без внешнего ввода
#[derive(Clone, Debug)]
pub struct ProceduralSource {
    layout: ChunkLayout,
    generator: Generator,
}

impl ProceduralSource {
    pub fn new(layout: ChunkLayout, generator: Generator) -> Self {
        Self { layout, generator }
    }

    pub fn generate(&self, coord: ChunkCoord) -> VoxelChunk {
        let layout = &self.layout;
        let size = layout.chunk_size();

        match &self.generator {
            Generator::Terrain(params) => {
                let base_x = coord.x as i64 * size as i64;
                let base_y = coord.y as i64 * size as i64;
                let base_z = coord.z as i64 * size as i64;

                // Карта высот чанка считается один раз на колонну
                let heights: Vec<i64> = (0..size * size)
                    .map(|i| {
                        let (lx, lz) = (i % size, i / size);
                        params.surface_height(base_x + lx as i64, base_z + lz as i64)
                    })
                    .collect();

                VoxelChunk::from_fn(layout, |x, y, z| {
                    let surface = heights[(z * size + x) as usize];
                    params.material_at(base_y + y as i64, surface)
                })
            }
            Generator::FramedSphere { radius, material } => {
                VoxelChunk::from_fn(layout, |x, y, z| {
                    if in_center_sphere(x, y, z, size, *radius) {
                        *material
                    } else if boundary_axes(x, y, z, size) >= 2 {
                        STONE
                    } else {
                        AIR
                    }
                })
            }
            Generator::CornersSphere { radius, material } => {
                VoxelChunk::from_fn(layout, |x, y, z| {
                    if in_center_sphere(x, y, z, size, *radius) {
                        *material
                    } else if boundary_axes(x, y, z, size) == 3 {
                        STONE
                    } else {
                        AIR
                    }
                })
            }
            Generator::Fill { material } => VoxelChunk::filled(layout, *material),
        }
    }
}

impl ChunkSource for ProceduralSource {
    fn load(&self, coord: ChunkCoord) -> WorldResult<VoxelChunk> {
        Ok(self.generate(coord))
    }

    fn describe(&self) -> String {
        format!("procedural {:?}", self.generator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(size: u32) -> ChunkLayout {
        ChunkLayout::new(size).unwrap()
    }

    #[test]
    fn generation_is_deterministic() {
        let source = ProceduralSource::new(layout(16), Generator::default());
        let coord = ChunkCoord::new(3, 1, 2);
        assert_eq!(source.generate(coord), source.generate(coord));
    }

    #[test]
    fn terrain_layers_follow_surface() {
        let params = TerrainParams::default();
        assert_eq!(params.material_at(10, 20), STONE);
        assert_eq!(params.material_at(15, 20), DIRT);
        assert_eq!(params.material_at(18, 20), DIRT);
        assert_eq!(params.material_at(19, 20), GRASS);
        assert_eq!(params.material_at(25, 20), WATER);
        assert_eq!(params.material_at(40, 20), AIR);
    }

    #[test]
    fn terrain_chunks_are_seamless_columns() {
        let size = 8;
        let source = ProceduralSource::new(layout(size), Generator::default());
        let params = TerrainParams::default();
        let chunk = source.generate(ChunkCoord::new(2, 0, 1));
        for z in 0..size {
            for x in 0..size {
                let surface = params.surface_height((2 * size + x) as i64, (size + z) as i64);
                for y in 0..size {
                    assert_eq!(chunk.get(x, y, z), params.material_at(y as i64, surface));
                }
            }
        }
    }

    #[test]
    fn framed_sphere_pattern() {
        let source = ProceduralSource::new(
            layout(8),
            Generator::FramedSphere { radius: 2.5, material: 5 },
        );
        let chunk = source.generate(ChunkCoord::default());
        assert_eq!(chunk.get(0, 0, 0), STONE);
        assert_eq!(chunk.get(0, 0, 4), STONE);
        assert_eq!(chunk.get(0, 4, 4), AIR);
        assert_eq!(chunk.get(4, 4, 4), 5);
        assert_eq!(chunk.get(3, 3, 3), 5);
    }

    #[test]
    fn corners_sphere_pattern() {
        let source = ProceduralSource::new(
            layout(8),
            Generator::CornersSphere { radius: 2.5, material: 2 },
        );
        let chunk = source.generate(ChunkCoord::default());
        assert_eq!(chunk.get(7, 7, 7), STONE);
        assert_eq!(chunk.get(0, 0, 4), AIR);
        assert_eq!(chunk.get(4, 4, 4), 2);
        assert_eq!(chunk.solid_count(), 8 + (0..512).filter(|&i| {
            let (x, y, z) = (i % 8, (i / 8) % 8, i / 64);
            in_center_sphere(x, y, z, 8, 2.5)
        }).count());
    }

    #[test]
    fn generator_config_from_json() {
        let generator: Generator =
            serde_json::from_str(r#"{ "kind": "framed_sphere", "radius": 3.0, "material": 7 }"#)
                .unwrap();
        assert_eq!(generator, Generator::FramedSphere { radius: 3.0, material: 7 });

        let generator: Generator =
            serde_json::from_str(r#"{ "kind": "terrain", "seed": 7 }"#).unwrap();
        match generator {
            Generator::Terrain(params) => {
                assert_eq!(params.seed, 7);
                assert_eq!(params.ocean_level, 32);
            }
            other => panic!("unexpected generator {other:?}"),
        }
    }
}
