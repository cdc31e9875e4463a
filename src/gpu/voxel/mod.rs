// ============================================
// Voxel Module - Воксельные данные чанков
// ============================================

mod chunk;
pub mod materials;

pub use chunk::VoxelChunk;
pub use materials::{is_air, Voxel, AIR, DIRT, GRASS, STONE, WATER};
