// ============================================
// Chunk Export - Выгрузка чанков в сырые файлы
// ============================================
// Обратная операция к FileBackedSource: после выгрузки
// каталог можно использовать как источник того же мира.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use rayon::prelude::*;

use crate::gpu::voxel::VoxelChunk;
use crate::gpu::world::{ChunkCoord, WorldError, WorldGrid, WorldResult};

use super::file_backed::chunk_file_name;
use super::ChunkSource;

/// Записать один чанк в каталог
pub fn write_chunk(dir: &Path, coord: ChunkCoord, chunk: &VoxelChunk) -> WorldResult<()> {
    let file = File::create(dir.join(chunk_file_name(coord)))?;
    let mut writer = BufWriter::new(file);
    writer.write_all(&chunk.to_le_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Выгрузить все чанки мира из источника; первый сбой прерывает выгрузку
pub fn export_world(source: &dyn ChunkSource, grid: &WorldGrid, dir: &Path) -> WorldResult<()> {
    fs::create_dir_all(dir)?;

    (0..grid.total_chunks()).into_par_iter().try_for_each(|index| {
        let coord = grid.chunk_coord(index);
        source
            .load(coord)
            .and_then(|chunk| write_chunk(dir, coord, &chunk))
            .map_err(|e| WorldError::chunk_build_failed(index, e))
    })?;

    log::info!(
        "Exported {} chunks from {} to {}",
        grid.total_chunks(),
        source.describe(),
        dir.display()
    );
    Ok(())
}
