// ============================================
// GPU Module - Разреженное воксельное октодерево мира
// ============================================
// Мир режется на чанки, каждый чанк - отдельное октодерево,
// все деревья лежат в одном буфере узлов для трассировки на GPU.
//
// Поток данных:
//   WorldGrid -> ChunkSource -> OctreeBuilder -> WorldOctreeIndex -> upload

pub mod layout;
pub mod voxel;
pub mod octree;
pub mod source;
pub mod world;
pub mod index;
pub mod upload;

pub mod core;

pub use self::core::app::run;
