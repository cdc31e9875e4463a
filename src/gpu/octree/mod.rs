// ============================================
// Octree Module - Октодеревья чанков
// ============================================
//
// Две кодировки (выбирается одна на весь мир):
// - Complete: фиксированный размер, дети по формуле 8n + k + 1
// - Pruned: пустые/однородные поддеревья схлопнуты

mod builder;
mod node;

pub use builder::{ChunkOctree, OctreeBuilder};
pub use node::{NodeIndex, NodeStatus, OctreeNode};
