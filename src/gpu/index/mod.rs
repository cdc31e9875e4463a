// ============================================
// World Index - Общий буфер узлов всего мира
// ============================================

mod world_index;

pub use world_index::{WorldOctree, WorldOctreeIndex, WorldStats};
