// ============================================
// Chunk Sources - Источники вокселей чанков
// ============================================
//
// Загрузка чанка вызывается параллельно из пула потоков,
// поэтому источник обязан быть Send + Sync и не менять состояние.

mod export;
mod file_backed;
mod noise;
mod procedural;

pub use export::{export_world, write_chunk};
pub use file_backed::{chunk_file_name, FileBackedSource};
pub use procedural::{Generator, ProceduralSource, TerrainParams};

use crate::gpu::voxel::VoxelChunk;
use crate::gpu::world::{ChunkCoord, WorldResult};

/// Поставщик плотных массивов вокселей по координате чанка
pub trait ChunkSource: Send + Sync {
    /// Вернуть ровно CHUNK_VOXELS материалов для чанка
    fn load(&self, coord: ChunkCoord) -> WorldResult<VoxelChunk>;

    /// Короткое описание для логов
    fn describe(&self) -> String;
}

impl<S: ChunkSource + ?Sized> ChunkSource for Box<S> {
    fn load(&self, coord: ChunkCoord) -> WorldResult<VoxelChunk> {
        (**self).load(coord)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
