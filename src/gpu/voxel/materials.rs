// ============================================
// Materials - Идентификаторы материалов
// ============================================
// Voxel = u32 (material id). 0 зарезервирован под пустоту.

/// Воксель - просто идентификатор материала
pub type Voxel = u32;

pub const AIR: Voxel = 0;
pub const STONE: Voxel = 1;
pub const DIRT: Voxel = 2;
pub const GRASS: Voxel = 3;
pub const WATER: Voxel = 4;

#[inline]
pub fn is_air(voxel: Voxel) -> bool {
    voxel == AIR
}
