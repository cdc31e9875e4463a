// ============================================
// Voxel Chunk - Плотный чанк вокселей
// ============================================
// Индексация: z * CHUNK_SIZE^2 + y * CHUNK_SIZE + x
// Формат на диске: CHUNK_VOXELS значений u32, little-endian, без заголовка

use ndshape::Shape;

use crate::gpu::layout::ChunkLayout;
use crate::gpu::world::{WorldError, WorldResult};

use super::materials::{Voxel, AIR};

/// Плотная сетка материалов одного чанка.
/// После генерации/загрузки не изменяется.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoxelChunk {
    layout: ChunkLayout,
    voxels: Vec<Voxel>,
}

impl VoxelChunk {
    /// Пустой чанк (весь воздух)
    pub fn empty(layout: &ChunkLayout) -> Self {
        Self::filled(layout, AIR)
    }

    /// Чанк, целиком заполненный одним материалом
    pub fn filled(layout: &ChunkLayout, material: Voxel) -> Self {
        Self {
            layout: *layout,
            voxels: vec![material; layout.chunk_voxels()],
        }
    }

    /// Из готового массива; длина должна быть ровно CHUNK_VOXELS
    pub fn from_voxels(layout: &ChunkLayout, voxels: Vec<Voxel>) -> WorldResult<Self> {
        if voxels.len() != layout.chunk_voxels() {
            return Err(WorldError::ChunkSizeMismatch {
                expected: layout.chunk_voxels(),
                actual: voxels.len(),
            });
        }
        Ok(Self { layout: *layout, voxels })
    }

    /// Заполнить функцией от локальных координат
    pub fn from_fn(layout: &ChunkLayout, mut f: impl FnMut(u32, u32, u32) -> Voxel) -> Self {
        let shape = layout.voxel_shape();
        let voxels = (0..shape.size())
            .map(|i| {
                let [x, y, z] = shape.delinearize(i);
                f(x, y, z)
            })
            .collect();
        Self { layout: *layout, voxels }
    }

    /// Разобрать сырой little-endian массив
    pub fn from_le_bytes(layout: &ChunkLayout, bytes: &[u8]) -> WorldResult<Self> {
        if bytes.len() != layout.chunk_bytes() {
            return Err(WorldError::ChunkSizeMismatch {
                expected: layout.chunk_bytes(),
                actual: bytes.len(),
            });
        }
        let voxels = bytes
            .chunks_exact(4)
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        Ok(Self { layout: *layout, voxels })
    }

    /// Сериализовать в сырой little-endian массив
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.voxels.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[inline]
    pub fn size(&self) -> u32 {
        self.layout.chunk_size()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    #[inline]
    pub fn voxels(&self) -> &[Voxel] {
        &self.voxels
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32, z: u32) -> Voxel {
        self.voxels[self.layout.voxel_index(x, y, z)]
    }

    /// Количество непустых вокселей
    pub fn solid_count(&self) -> usize {
        self.voxels.iter().filter(|&&v| v != AIR).count()
    }
}
