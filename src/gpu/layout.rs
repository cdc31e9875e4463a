// ============================================
// Buffer Layout - Формат буферов для трассировщика
// ============================================
//
// Буфер узлов: плоский массив записей по 8 байт (GpuNode)
// - header, биты 0-1: тег (0 = Empty, 1 = Uniform, 2 = Mixed)
// - header, биты 8-15: child_mask (только Mixed)
// - payload: материал (Uniform) или индекс первого ребёнка (Mixed)
//
// Индекс первого ребёнка считается от начала блока чанка.
// Complete: ребёнок k узла n лежит в 8n + k + 1, маска всегда 0xFF.
// Pruned: хранятся только непустые дети, подряд в порядке октантов,
//         ребёнок k = first + popcount(mask & ((1 << k) - 1)).
//
// Таблица смещений: TOTAL_CHUNKS значений u32 в порядке chunk_index,
// единица измерения - записи GpuNode (не байты).

use bytemuck::{Pod, Zeroable};
use ndshape::{RuntimeShape, Shape};
use serde::{Deserialize, Serialize};

use crate::gpu::voxel::Voxel;
use crate::gpu::world::{WorldError, WorldResult};

/// Максимальный размер чанка: индексы узлов чанка помещаются в u32
pub const MAX_CHUNK_SIZE: u32 = 1024;

pub const TAG_EMPTY: u32 = 0;
pub const TAG_UNIFORM: u32 = 1;
pub const TAG_MIXED: u32 = 2;

const TAG_MASK: u32 = 0b11;
const CHILD_MASK_SHIFT: u32 = 8;

/// Способ кодирования октодеревьев (один на весь мир)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Полное дерево фиксированного размера, адресация арифметикой
    Complete,
    /// Пустые и однородные поддеревья схлопнуты, нужна таблица смещений
    #[default]
    Pruned,
}

/// Запись узла в буфере GPU (8 байт)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct GpuNode {
    pub header: u32,
    pub payload: u32,
}

impl GpuNode {
    pub const EMPTY: Self = Self { header: TAG_EMPTY, payload: 0 };

    #[inline]
    pub fn uniform(material: Voxel) -> Self {
        debug_assert!(material != 0, "uniform node with air material");
        Self { header: TAG_UNIFORM, payload: material }
    }

    #[inline]
    pub fn mixed(child_mask: u8, first_child: u32) -> Self {
        debug_assert!(child_mask != 0, "mixed node without children");
        Self {
            header: TAG_MIXED | ((child_mask as u32) << CHILD_MASK_SHIFT),
            payload: first_child,
        }
    }

    #[inline]
    pub fn tag(&self) -> u32 {
        self.header & TAG_MASK
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tag() == TAG_EMPTY
    }

    #[inline]
    pub fn is_uniform(&self) -> bool {
        self.tag() == TAG_UNIFORM
    }

    #[inline]
    pub fn is_mixed(&self) -> bool {
        self.tag() == TAG_MIXED
    }

    #[inline]
    pub fn material(&self) -> Option<Voxel> {
        if self.is_uniform() {
            Some(self.payload)
        } else {
            None
        }
    }

    #[inline]
    pub fn child_mask(&self) -> u8 {
        ((self.header >> CHILD_MASK_SHIFT) & 0xFF) as u8
    }

    #[inline]
    pub fn first_child(&self) -> u32 {
        self.payload
    }

    /// Индекс ребёнка (от начала чанка) для октанта, None если октант пуст
    #[inline]
    pub fn child_slot(&self, octant: u8) -> Option<u32> {
        if !self.is_mixed() {
            return None;
        }
        let mask = self.child_mask();
        if (mask & (1 << octant)) == 0 {
            return None;
        }
        let mask_before = mask & ((1u16 << octant) - 1) as u8;
        Some(self.first_child() + mask_before.count_ones())
    }
}

/// Номер октанта ребёнка: x - младший бит, затем y, затем z
#[inline]
pub fn octant_of(xbit: u32, ybit: u32, zbit: u32) -> u8 {
    ((zbit << 2) | (ybit << 1) | xbit) as u8
}

/// Смещения октанта (x, y, z) по его номеру
#[inline]
pub fn octant_offset(octant: u8) -> [u32; 3] {
    let o = octant as u32;
    [o & 1, (o >> 1) & 1, (o >> 2) & 1]
}

/// Чередование битов (x младший) - порядковый номер узла внутри уровня
/// полного дерева.
pub fn morton_encode(pos: [u32; 3], bits: u32) -> usize {
    let mut code = 0usize;
    for bit in 0..bits {
        let octant = octant_of((pos[0] >> bit) & 1, (pos[1] >> bit) & 1, (pos[2] >> bit) & 1);
        code |= (octant as usize) << (3 * bit);
    }
    code
}

/// Количество узлов полного 8-арного дерева с `levels + 1` уровнями
#[inline]
pub fn complete_node_count(levels: u32) -> usize {
    ((8u64.pow(levels + 1) - 1) / 7) as usize
}

/// Геометрия чанка и производные константы
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkLayout {
    chunk_size: u32,
    levels: u32,
}

impl ChunkLayout {
    /// Размер чанка должен быть степенью двойки в 1..=MAX_CHUNK_SIZE
    pub fn new(chunk_size: u32) -> WorldResult<Self> {
        if !chunk_size.is_power_of_two() || chunk_size > MAX_CHUNK_SIZE {
            return Err(WorldError::InvalidChunkSize(chunk_size));
        }
        Ok(Self {
            chunk_size,
            levels: chunk_size.trailing_zeros(),
        })
    }

    #[inline]
    pub fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    /// levels = log2(CHUNK_SIZE)
    #[inline]
    pub fn levels(&self) -> u32 {
        self.levels
    }

    /// CHUNK_VOXELS = CHUNK_SIZE^3
    #[inline]
    pub fn chunk_voxels(&self) -> usize {
        (self.chunk_size as usize).pow(3)
    }

    /// Размер сырого чанка на диске
    #[inline]
    pub fn chunk_bytes(&self) -> usize {
        self.chunk_voxels() * std::mem::size_of::<Voxel>()
    }

    /// nodesPerChunk = (8^(levels+1) - 1) / 7
    #[inline]
    pub fn nodes_per_chunk(&self) -> usize {
        complete_node_count(self.levels)
    }

    /// Индекс первого узла уровня `depth` в полном дереве
    #[inline]
    pub fn level_start(&self, depth: u32) -> usize {
        debug_assert!(depth <= self.levels);
        ((8u64.pow(depth) - 1) / 7) as usize
    }

    /// Форма плотной сетки вокселей, x быстрее всех
    #[inline]
    pub fn voxel_shape(&self) -> RuntimeShape<u32, 3> {
        RuntimeShape::<u32, 3>::new([self.chunk_size; 3])
    }

    /// i = z * CHUNK_SIZE^2 + y * CHUNK_SIZE + x
    #[inline]
    pub fn voxel_index(&self, x: u32, y: u32, z: u32) -> usize {
        self.voxel_shape().linearize([x, y, z]) as usize
    }
}

/// Смещение узла в байтах
#[inline]
pub fn node_byte_offset(node_index: usize) -> usize {
    node_index * std::mem::size_of::<GpuNode>()
}
