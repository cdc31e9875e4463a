// ============================================
// World Octree Index - Сборка буфера узлов мира
// ============================================
//
// Единственная точка синхронизации: после параллельной фазы чанки
// добавляются строго по возрастанию chunk_index одним писателем.
// offsets[i] = длина буфера перед добавлением чанка i (в узлах).

use std::fmt;

use crate::gpu::layout::{node_byte_offset, octant_of, ChunkLayout, Encoding, GpuNode};
use crate::gpu::octree::{ChunkOctree, NodeIndex, OctreeNode};
use crate::gpu::voxel::{Voxel, AIR};
use crate::gpu::world::{ChunkCoord, WorldError, WorldGrid, WorldResult};

/// Таблица смещений чанков (в узлах)
#[derive(Clone, Debug, PartialEq, Eq)]
enum ChunkOffsets {
    /// Полное дерево: offset = i * nodes_per_chunk, таблица не хранится
    Fixed { nodes_per_chunk: usize },
    /// Сжатое дерево: по одному u32 на чанк
    Table(Vec<u32>),
}

/// Накопитель: принимает октодеревья чанков по порядку
pub struct WorldOctreeIndex {
    layout: ChunkLayout,
    grid: WorldGrid,
    encoding: Encoding,
    nodes: Vec<GpuNode>,
    offsets: Vec<u32>,
}

impl WorldOctreeIndex {
    pub fn new(layout: ChunkLayout, grid: WorldGrid, encoding: Encoding) -> Self {
        let capacity = match encoding {
            Encoding::Complete => grid.total_chunks() * layout.nodes_per_chunk(),
            Encoding::Pruned => grid.total_chunks(),
        };
        Self {
            layout,
            grid,
            encoding,
            nodes: Vec::with_capacity(capacity),
            offsets: Vec::with_capacity(grid.total_chunks()),
        }
    }

    /// Добавить чанк. Порядок и кодировка - инварианты вызывающего кода.
    pub fn append(&mut self, chunk_index: usize, octree: ChunkOctree) -> WorldResult<()> {
        assert_eq!(
            chunk_index,
            self.offsets.len(),
            "chunks must be appended in chunk-index order"
        );
        assert!(chunk_index < self.grid.total_chunks(), "chunk #{chunk_index} outside of world");
        assert_eq!(octree.encoding(), self.encoding, "mixed encodings in one world");

        let offset = self.nodes.len();
        let end = offset + octree.node_count();
        if end > u32::MAX as usize {
            return Err(WorldError::BufferOverflow { nodes: end as u64 });
        }

        if self.encoding == Encoding::Complete {
            let per_chunk = self.layout.nodes_per_chunk();
            assert_eq!(octree.node_count(), per_chunk, "complete chunk with wrong node count");
            assert_eq!(offset, chunk_index * per_chunk, "complete chunk at wrong offset");
        }

        self.offsets.push(offset as u32);
        self.nodes.extend_from_slice(octree.nodes());
        Ok(())
    }

    /// Закрыть накопитель; все чанки мира должны быть добавлены
    pub fn finish(self) -> WorldOctree {
        assert_eq!(
            self.offsets.len(),
            self.grid.total_chunks(),
            "world index finished before every chunk was appended"
        );

        let offsets = match self.encoding {
            Encoding::Complete => ChunkOffsets::Fixed {
                nodes_per_chunk: self.layout.nodes_per_chunk(),
            },
            Encoding::Pruned => ChunkOffsets::Table(self.offsets),
        };

        WorldOctree {
            layout: self.layout,
            grid: self.grid,
            encoding: self.encoding,
            nodes: self.nodes,
            offsets,
        }
    }
}

/// Готовый мир: буфер узлов + таблица смещений. Не изменяется.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorldOctree {
    layout: ChunkLayout,
    grid: WorldGrid,
    encoding: Encoding,
    nodes: Vec<GpuNode>,
    offsets: ChunkOffsets,
}

impl WorldOctree {
    #[inline]
    pub fn layout(&self) -> &ChunkLayout {
        &self.layout
    }

    #[inline]
    pub fn grid(&self) -> &WorldGrid {
        &self.grid
    }

    #[inline]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    #[inline]
    pub fn nodes(&self) -> &[GpuNode] {
        &self.nodes
    }

    /// Буфер узлов как байты для загрузки на GPU
    #[inline]
    pub fn node_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.nodes)
    }

    /// Таблица смещений (только для сжатой кодировки)
    pub fn offset_table(&self) -> Option<&[u32]> {
        match &self.offsets {
            ChunkOffsets::Fixed { .. } => None,
            ChunkOffsets::Table(table) => Some(table),
        }
    }

    /// Таблица смещений как байты; пусто для полного дерева
    pub fn offset_bytes(&self) -> &[u8] {
        match self.offset_table() {
            Some(table) => bytemuck::cast_slice(table),
            None => &[],
        }
    }

    /// Начало чанка в буфере (в узлах)
    pub fn chunk_offset(&self, chunk_index: usize) -> usize {
        match &self.offsets {
            ChunkOffsets::Fixed { nodes_per_chunk } => chunk_index * nodes_per_chunk,
            ChunkOffsets::Table(table) => table[chunk_index] as usize,
        }
    }

    /// Узлы одного чанка
    pub fn chunk_nodes(&self, chunk_index: usize) -> &[GpuNode] {
        let start = self.chunk_offset(chunk_index);
        let end = if chunk_index + 1 < self.grid.total_chunks() {
            self.chunk_offset(chunk_index + 1)
        } else {
            self.nodes.len()
        };
        &self.nodes[start..end]
    }

    #[inline]
    pub fn root(&self, chunk_index: usize) -> OctreeNode {
        OctreeNode::from_gpu(self.nodes[self.chunk_offset(chunk_index)])
    }

    /// Материал вокселя в мировых координатах; None вне мира.
    /// Спуск повторяет обход трассировщика: корень чанка, затем октанты.
    pub fn material_at(&self, x: u32, y: u32, z: u32) -> Option<Voxel> {
        let size = self.layout.chunk_size();
        let coord = ChunkCoord::new(x / size, y / size, z / size);
        if !self.grid.contains(coord) {
            return None;
        }
        let (lx, ly, lz) = (x % size, y % size, z % size);

        let base = self.chunk_offset(self.grid.chunk_index(coord));
        let mut index = NodeIndex::ROOT;
        let mut depth = 0;
        loop {
            match OctreeNode::from_gpu(self.nodes[base + index.get()]) {
                OctreeNode::Empty => return Some(AIR),
                OctreeNode::Uniform(m) => return Some(m),
                OctreeNode::Mixed { .. } => {
                    assert!(depth < self.layout.levels(), "mixed node below voxel level");
                    let shift = self.layout.levels() - depth - 1;
                    let octant = octant_of((lx >> shift) & 1, (ly >> shift) & 1, (lz >> shift) & 1);
                    match self.nodes[base + index.get()].child_slot(octant) {
                        Some(slot) => index = NodeIndex::new(slot),
                        None => return Some(AIR),
                    }
                    depth += 1;
                }
            }
        }
    }

    pub fn stats(&self) -> WorldStats {
        let chunks = self.grid.total_chunks();
        let mut stats = WorldStats {
            encoding: self.encoding,
            chunks,
            nodes: self.nodes.len(),
            node_bytes: node_byte_offset(self.nodes.len()),
            offset_bytes: self.offset_bytes().len(),
            voxel_bytes: chunks * self.layout.chunk_bytes(),
            ..Default::default()
        };
        for i in 0..chunks {
            match self.root(i) {
                OctreeNode::Empty => stats.empty_roots += 1,
                OctreeNode::Uniform(_) => stats.uniform_roots += 1,
                OctreeNode::Mixed { .. } => stats.mixed_roots += 1,
            }
        }
        stats
    }
}

/// Сводка по готовому буферу (для логов)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorldStats {
    pub encoding: Encoding,
    pub chunks: usize,
    pub nodes: usize,
    pub node_bytes: usize,
    pub offset_bytes: usize,
    /// Размер исходных плотных вокселей (для сравнения)
    pub voxel_bytes: usize,
    pub empty_roots: usize,
    pub uniform_roots: usize,
    pub mixed_roots: usize,
}

impl fmt::Display for WorldStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mb = |bytes: usize| bytes as f64 / (1024.0 * 1024.0);
        write!(
            f,
            "{} chunks, {} nodes ({:?}): nodes {:.2} MB, offsets {:.2} MB, dense voxels {:.2} MB; roots empty/uniform/mixed = {}/{}/{}",
            self.chunks,
            self.nodes,
            self.encoding,
            mb(self.node_bytes),
            mb(self.offset_bytes),
            mb(self.voxel_bytes),
            self.empty_roots,
            self.uniform_roots,
            self.mixed_roots,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::octree::OctreeBuilder;
    use crate::gpu::voxel::VoxelChunk;

    fn build_index(size: u32, dims: [i64; 3], encoding: Encoding, chunks: &[VoxelChunk]) -> WorldOctree {
        let layout = ChunkLayout::new(size).unwrap();
        let grid = WorldGrid::new(dims[0], dims[1], dims[2]).unwrap();
        let builder = OctreeBuilder::new(layout, encoding);
        let mut index = WorldOctreeIndex::new(layout, grid, encoding);
        for (i, chunk) in chunks.iter().enumerate() {
            index.append(i, builder.build(chunk).unwrap()).unwrap();
        }
        index.finish()
    }

    fn sample_chunks(layout: &ChunkLayout) -> Vec<VoxelChunk> {
        vec![
            VoxelChunk::empty(layout),
            VoxelChunk::filled(layout, 5),
            VoxelChunk::from_fn(layout, |x, y, z| if x + y + z < 3 { 2 } else { 0 }),
            VoxelChunk::from_fn(layout, |x, _, z| (x ^ z) & 1),
        ]
    }

    #[test]
    fn pruned_offsets_follow_node_counts() {
        let layout = ChunkLayout::new(4).unwrap();
        let chunks = sample_chunks(&layout);
        let world = build_index(4, [2, 2, 1], Encoding::Pruned, &chunks);

        let builder = OctreeBuilder::new(layout, Encoding::Pruned);
        let table = world.offset_table().unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table[0], 0);
        for i in 0..3 {
            let count = builder.build(&chunks[i]).unwrap().node_count() as u32;
            assert_eq!(table[i + 1] - table[i], count);
            assert_eq!(world.chunk_nodes(i).len() as u32, count);
        }
        assert_eq!(world.offset_bytes().len(), 16);
        assert_eq!(world.root(0), OctreeNode::Empty);
        assert_eq!(world.root(1), OctreeNode::Uniform(5));
    }

    #[test]
    fn complete_offsets_are_arithmetic() {
        let layout = ChunkLayout::new(4).unwrap();
        let chunks = sample_chunks(&layout);
        let world = build_index(4, [4, 1, 1], Encoding::Complete, &chunks);

        assert!(world.offset_table().is_none());
        assert!(world.offset_bytes().is_empty());
        assert_eq!(world.nodes().len(), 4 * 73);
        assert_eq!(world.chunk_offset(3), 3 * 73);
        assert_eq!(world.node_bytes().len(), 4 * 73 * 8);
    }

    #[test]
    fn single_voxel_world_end_to_end() {
        let layout = ChunkLayout::new(2).unwrap();
        let chunk = VoxelChunk::from_voxels(&layout, vec![1, 0, 0, 0, 0, 0, 0, 0]).unwrap();
        let world = build_index(2, [1, 1, 1], Encoding::Pruned, &[chunk]);

        match world.root(0) {
            OctreeNode::Mixed { child_mask, first_child } => {
                assert_eq!(child_mask.count_ones(), 1);
                assert_eq!(child_mask, 0b0000_0001);
                let child = OctreeNode::from_gpu(world.nodes()[first_child.get()]);
                assert_eq!(child, OctreeNode::Uniform(1));
            }
            other => panic!("expected mixed root, got {other:?}"),
        }
        assert_eq!(world.material_at(0, 0, 0), Some(1));
        assert_eq!(world.material_at(1, 0, 0), Some(AIR));
        assert_eq!(world.material_at(2, 0, 0), None);
    }

    #[test]
    fn material_lookup_matches_voxels() {
        let layout = ChunkLayout::new(4).unwrap();
        let chunks = sample_chunks(&layout);
        for encoding in [Encoding::Complete, Encoding::Pruned] {
            let world = build_index(4, [2, 2, 1], encoding, &chunks);
            for (i, chunk) in chunks.iter().enumerate() {
                let coord = world.grid().chunk_coord(i);
                for z in 0..4 {
                    for y in 0..4 {
                        for x in 0..4 {
                            let found = world.material_at(coord.x * 4 + x, coord.y * 4 + y, z);
                            assert_eq!(found, Some(chunk.get(x, y, z)), "{encoding:?} chunk {i}");
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn stats_count_roots_and_bytes() {
        let layout = ChunkLayout::new(4).unwrap();
        let world = build_index(4, [2, 2, 1], Encoding::Pruned, &sample_chunks(&layout));
        let stats = world.stats();
        assert_eq!(stats.chunks, 4);
        assert_eq!(stats.empty_roots, 1);
        assert_eq!(stats.uniform_roots, 1);
        assert_eq!(stats.mixed_roots, 2);
        assert_eq!(stats.node_bytes, world.nodes().len() * 8);
        assert_eq!(stats.voxel_bytes, 4 * 64 * 4);
    }

    #[test]
    #[should_panic(expected = "chunk-index order")]
    fn out_of_order_append_panics() {
        let layout = ChunkLayout::new(2).unwrap();
        let grid = WorldGrid::new(2, 1, 1).unwrap();
        let builder = OctreeBuilder::new(layout, Encoding::Pruned);
        let mut index = WorldOctreeIndex::new(layout, grid, Encoding::Pruned);
        let octree = builder.build(&VoxelChunk::empty(&layout)).unwrap();
        let _ = index.append(1, octree);
    }
}
