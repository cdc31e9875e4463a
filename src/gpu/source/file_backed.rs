// ============================================
// File Backed Source - Чанки из сырых файлов
// ============================================
// Один файл на чанк: chunk-{x}-{y}-{z}.bin
// Содержимое: CHUNK_VOXELS значений u32 little-endian, без заголовка

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use crate::gpu::layout::ChunkLayout;
use crate::gpu::voxel::VoxelChunk;
use crate::gpu::world::{ChunkCoord, WorldError, WorldResult};

use super::ChunkSource;

/// Имя файла чанка внутри каталога мира
#[inline]
pub fn chunk_file_name(coord: ChunkCoord) -> String {
    format!("chunk-{}-{}-{}.bin", coord.x, coord.y, coord.z)
}

/// Чтение чанков из каталога
#[derive(Clone, Debug)]
pub struct FileBackedSource {
    dir: PathBuf,
    layout: ChunkLayout,
}

impl FileBackedSource {
    pub fn new(dir: impl Into<PathBuf>, layout: ChunkLayout) -> Self {
        Self { dir: dir.into(), layout }
    }

    pub fn chunk_path(&self, coord: ChunkCoord) -> PathBuf {
        self.dir.join(chunk_file_name(coord))
    }

    fn read_bytes(&self, coord: ChunkCoord, path: &Path) -> WorldResult<Vec<u8>> {
        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => WorldError::ChunkNotFound {
                coord,
                path: path.to_path_buf(),
            },
            _ => WorldError::ChunkReadError { coord, source: e },
        })?;

        let mut reader = BufReader::new(file);
        let mut bytes = Vec::with_capacity(self.layout.chunk_bytes());
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| WorldError::ChunkReadError { coord, source: e })?;
        Ok(bytes)
    }
}

impl ChunkSource for FileBackedSource {
    fn load(&self, coord: ChunkCoord) -> WorldResult<VoxelChunk> {
        let path = self.chunk_path(coord);
        let bytes = self.read_bytes(coord, &path)?;
        VoxelChunk::from_le_bytes(&self.layout, &bytes)
    }

    fn describe(&self) -> String {
        format!("files in {}", self.dir.display())
    }
}
