// ============================================
// World Config - Конфигурация мира (JSON)
// ============================================
// Читается один раз при старте. Все проверки - в validate(),
// дальше работаем только с проверенными BuildSettings.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::gpu::layout::{ChunkLayout, Encoding};
use crate::gpu::source::{ChunkSource, FileBackedSource, Generator, ProceduralSource};

use super::error::{WorldError, WorldResult};
use super::grid::WorldGrid;

/// Откуда берутся воксели чанков
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceConfig {
    Procedural {
        #[serde(default)]
        generator: Generator,
    },
    File {
        dir: PathBuf,
    },
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::Procedural { generator: Generator::default() }
    }
}

/// Файл конфигурации мира
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Сторона чанка в вокселях, степень двойки
    pub chunk_size: u32,
    /// Размер мира в чанках [Wx, Wy, Wz]
    pub world_dim: [i64; 3],
    pub encoding: Encoding,
    pub source: SourceConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            chunk_size: 32,
            world_dim: [16, 2, 16],
            encoding: Encoding::default(),
            source: SourceConfig::default(),
        }
    }
}

/// Проверенные параметры построения
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuildSettings {
    pub layout: ChunkLayout,
    pub grid: WorldGrid,
    pub encoding: Encoding,
}

impl BuildSettings {
    /// Полное дерево занимает total_chunks * nodes_per_chunk узлов заранее,
    /// поэтому переполнение u32 видно до построения чанков
    pub fn new(layout: ChunkLayout, grid: WorldGrid, encoding: Encoding) -> WorldResult<Self> {
        if encoding == Encoding::Complete {
            let nodes = grid.total_chunks() as u64 * layout.nodes_per_chunk() as u64;
            if nodes > u32::MAX as u64 {
                return Err(WorldError::BufferOverflow { nodes });
            }
        }
        Ok(Self { layout, grid, encoding })
    }
}

impl WorldConfig {
    pub fn from_json(json: &str) -> WorldResult<Self> {
        serde_json::from_str(json).map_err(|e| WorldError::Config(e.to_string()))
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> WorldResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| WorldError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_json(&content)
    }

    pub fn to_json(&self) -> WorldResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| WorldError::Config(e.to_string()))
    }

    /// Размер чанка и размеры мира проверяются здесь и только здесь
    pub fn validate(&self) -> WorldResult<BuildSettings> {
        let layout = ChunkLayout::new(self.chunk_size)?;
        let [wx, wy, wz] = self.world_dim;
        let grid = WorldGrid::new(wx, wy, wz)?;

        BuildSettings::new(layout, grid, self.encoding)
    }

    /// Источник выбирается один раз, дальше используется только через трейт
    pub fn create_source(&self, layout: ChunkLayout) -> Box<dyn ChunkSource> {
        match &self.source {
            SourceConfig::Procedural { generator } => {
                Box::new(ProceduralSource::new(layout, generator.clone()))
            }
            SourceConfig::File { dir } => Box::new(FileBackedSource::new(dir.clone(), layout)),
        }
    }
}
