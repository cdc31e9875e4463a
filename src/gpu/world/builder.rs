// ============================================
// World Builder - Построение октодерева всего мира
// ============================================
//
// Фаза 1 (параллельно, rayon): загрузка + построение каждого чанка.
//   Общего изменяемого состояния нет, чанки независимы.
// Барьер: collect() всех результатов.
// Фаза 2 (последовательно): добавление в WorldOctreeIndex по порядку.
//   Любая ошибка -> ChunkBuildFailed с наименьшим индексом, буферов нет.

use std::time::Instant;

use rayon::prelude::*;

use crate::gpu::index::{WorldOctree, WorldOctreeIndex};
use crate::gpu::layout::{ChunkLayout, Encoding};
use crate::gpu::octree::{ChunkOctree, OctreeBuilder};
use crate::gpu::source::ChunkSource;

use super::config::BuildSettings;
use super::error::{WorldError, WorldResult};
use super::grid::WorldGrid;

/// Оркестратор построения мира
#[derive(Clone, Copy, Debug)]
pub struct WorldBuilder {
    grid: WorldGrid,
    octree: OctreeBuilder,
}

impl WorldBuilder {
    pub fn new(layout: ChunkLayout, grid: WorldGrid, encoding: Encoding) -> Self {
        Self {
            grid,
            octree: OctreeBuilder::new(layout, encoding),
        }
    }

    pub fn from_settings(settings: BuildSettings) -> Self {
        Self::new(settings.layout, settings.grid, settings.encoding)
    }

    #[inline]
    pub fn grid(&self) -> &WorldGrid {
        &self.grid
    }

    /// Один чанк: загрузка и построение (вызывается из пула потоков)
    fn build_chunk(&self, source: &dyn ChunkSource, chunk_index: usize) -> WorldResult<ChunkOctree> {
        let coord = self.grid.chunk_coord(chunk_index);
        let chunk = source.load(coord)?;
        self.octree.build(&chunk)
    }

    pub fn build(&self, source: &dyn ChunkSource) -> WorldResult<WorldOctree> {
        let total = self.grid.total_chunks();
        let layout = *self.octree.layout();
        let encoding = self.octree.encoding();
        log::info!(
            "Building world {:?} ({} chunks of {}^3, {:?}) from {}",
            self.grid.dims(),
            total,
            layout.chunk_size(),
            encoding,
            source.describe()
        );

        // WorldBuilder::new не проверяет объём буфера, проверяем до работы
        BuildSettings::new(layout, self.grid, encoding)?;

        let start = Instant::now();
        let results: Vec<WorldResult<ChunkOctree>> = (0..total)
            .into_par_iter()
            .map(|i| self.build_chunk(source, i))
            .collect();
        log::debug!("Parallel chunk phase took {:?}", start.elapsed());

        let mut index = WorldOctreeIndex::new(layout, self.grid, encoding);
        for (i, result) in results.into_iter().enumerate() {
            let appended = result.and_then(|octree| index.append(i, octree));
            if let Err(cause) = appended {
                log::error!("Chunk #{} {} failed: {}", i, self.grid.chunk_coord(i), cause);
                return Err(WorldError::chunk_build_failed(i, cause));
            }
        }

        let world = index.finish();
        log::info!("World built in {:?}: {}", start.elapsed(), world.stats());
        Ok(world)
    }
}
