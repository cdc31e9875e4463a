// ============================================
// World Module - Решётка чанков, конфигурация, построение
// ============================================

mod builder;
mod config;
mod error;
mod grid;

pub use builder::WorldBuilder;
pub use config::{BuildSettings, SourceConfig, WorldConfig};
pub use error::{Axis, WorldError, WorldResult};
pub use grid::{ChunkCoord, WorldGrid};
