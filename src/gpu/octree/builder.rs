// ============================================
// Octree Builder - Построение октодерева чанка
// ============================================
//
// Снизу вверх: сначала пирамида статусов по уровням
// (лист = один воксель), затем сериализация в плоский Vec<GpuNode>.
//
// Complete: все узлы всех уровней в порядке уровней (8n + k + 1).
// Pruned: узел, затем блок его непустых детей подряд, затем спуск
//         в детей по порядку октантов 0..7.

use ndshape::{RuntimeShape, Shape};

use crate::gpu::layout::{
    morton_encode, octant_offset, ChunkLayout, Encoding, GpuNode,
};
use crate::gpu::voxel::VoxelChunk;
use crate::gpu::world::{WorldError, WorldResult};

use super::node::{NodeIndex, NodeStatus, OctreeNode};

/// Статусы узлов всех уровней, levels[d] - плотная сетка (2^d)^3
struct StatusPyramid {
    levels: Vec<Vec<NodeStatus>>,
}

impl StatusPyramid {
    fn from_chunk(layout: &ChunkLayout, chunk: &VoxelChunk) -> Self {
        let depth = layout.levels() as usize;
        let mut levels = Vec::with_capacity(depth + 1);

        // Нижний уровень - воксели в том же порядке, что и в чанке
        let mut children: Vec<NodeStatus> =
            chunk.voxels().iter().map(|&v| NodeStatus::from_voxel(v)).collect();

        for d in (0..depth).rev() {
            let child_side = 1u32 << (d + 1);
            let side = 1u32 << d;
            let child_shape = RuntimeShape::<u32, 3>::new([child_side; 3]);
            let shape = RuntimeShape::<u32, 3>::new([side; 3]);

            let parents: Vec<NodeStatus> = (0..shape.size())
                .map(|i| {
                    let [x, y, z] = shape.delinearize(i);
                    let mut octants = [NodeStatus::Empty; 8];
                    for (k, slot) in octants.iter_mut().enumerate() {
                        let [ox, oy, oz] = octant_offset(k as u8);
                        let child = child_shape.linearize([2 * x + ox, 2 * y + oy, 2 * z + oz]);
                        *slot = children[child as usize];
                    }
                    NodeStatus::merge(&octants)
                })
                .collect();
            levels.push(std::mem::replace(&mut children, parents));
        }
        levels.push(children);

        // Корень первым
        levels.reverse();
        Self { levels }
    }

    #[inline]
    fn status(&self, depth: u32, pos: [u32; 3]) -> NodeStatus {
        let side = 1u32 << depth;
        let shape = RuntimeShape::<u32, 3>::new([side; 3]);
        self.levels[depth as usize][shape.linearize(pos) as usize]
    }
}

/// Линеаризованное октодерево одного чанка
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkOctree {
    encoding: Encoding,
    nodes: Vec<GpuNode>,
}

impl ChunkOctree {
    #[inline]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    #[inline]
    pub fn nodes(&self) -> &[GpuNode] {
        &self.nodes
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn node(&self, index: NodeIndex) -> OctreeNode {
        OctreeNode::from_gpu(self.nodes[index.get()])
    }

    #[inline]
    pub fn root(&self) -> OctreeNode {
        self.node(NodeIndex::ROOT)
    }

    /// Ребёнок узла в октанте; None если узел не Mixed или октант пуст
    pub fn child(&self, index: NodeIndex, octant: u8) -> Option<NodeIndex> {
        self.nodes[index.get()].child_slot(octant).map(NodeIndex::new)
    }
}

/// Строитель октодеревьев: без состояния, безопасен для параллельного вызова
#[derive(Clone, Copy, Debug)]
pub struct OctreeBuilder {
    layout: ChunkLayout,
    encoding: Encoding,
}

impl OctreeBuilder {
    pub fn new(layout: ChunkLayout, encoding: Encoding) -> Self {
        Self { layout, encoding }
    }

    /// С проверкой размера чанка (степень двойки)
    pub fn with_chunk_size(chunk_size: u32, encoding: Encoding) -> WorldResult<Self> {
        Ok(Self::new(ChunkLayout::new(chunk_size)?, encoding))
    }

    #[inline]
    pub fn layout(&self) -> &ChunkLayout {
        &self.layout
    }

    #[inline]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn build(&self, chunk: &VoxelChunk) -> WorldResult<ChunkOctree> {
        if chunk.size() != self.layout.chunk_size() || chunk.len() != self.layout.chunk_voxels() {
            return Err(WorldError::ChunkSizeMismatch {
                expected: self.layout.chunk_voxels(),
                actual: chunk.len(),
            });
        }

        let pyramid = StatusPyramid::from_chunk(&self.layout, chunk);
        let nodes = match self.encoding {
            Encoding::Complete => self.emit_complete(&pyramid),
            Encoding::Pruned => self.emit_pruned(&pyramid),
        };

        Ok(ChunkOctree { encoding: self.encoding, nodes })
    }

    fn emit_complete(&self, pyramid: &StatusPyramid) -> Vec<GpuNode> {
        let mut nodes = vec![GpuNode::EMPTY; self.layout.nodes_per_chunk()];

        for depth in 0..=self.layout.levels() {
            let start = self.layout.level_start(depth);
            let side = 1u32 << depth;
            let shape = RuntimeShape::<u32, 3>::new([side; 3]);

            for (i, status) in pyramid.levels[depth as usize].iter().enumerate() {
                let pos = shape.delinearize(i as u32);
                let n = start + morton_encode(pos, depth);
                nodes[n] = match *status {
                    NodeStatus::Empty => GpuNode::EMPTY,
                    NodeStatus::Uniform(m) => GpuNode::uniform(m),
                    NodeStatus::Mixed => GpuNode::mixed(0xFF, (8 * n + 1) as u32),
                };
            }
        }

        nodes
    }

    fn emit_pruned(&self, pyramid: &StatusPyramid) -> Vec<GpuNode> {
        let mut nodes = vec![GpuNode::EMPTY];
        self.emit_pruned_node(pyramid, 0, [0, 0, 0], 0, &mut nodes);
        nodes
    }

    fn emit_pruned_node(
        &self,
        pyramid: &StatusPyramid,
        depth: u32,
        pos: [u32; 3],
        slot: usize,
        nodes: &mut Vec<GpuNode>,
    ) {
        match pyramid.status(depth, pos) {
            NodeStatus::Empty => nodes[slot] = GpuNode::EMPTY,
            NodeStatus::Uniform(m) => nodes[slot] = GpuNode::uniform(m),
            NodeStatus::Mixed => {
                assert!(depth < self.layout.levels(), "mixed leaf at depth {depth}");

                let mut child_mask = 0u8;
                let mut children = Vec::with_capacity(8);
                for octant in 0..8u8 {
                    let [ox, oy, oz] = octant_offset(octant);
                    let child_pos = [2 * pos[0] + ox, 2 * pos[1] + oy, 2 * pos[2] + oz];
                    if !pyramid.status(depth + 1, child_pos).is_empty() {
                        child_mask |= 1 << octant;
                        children.push(child_pos);
                    }
                }

                // Дети одного узла лежат подряд
                let first = nodes.len();
                nodes.resize(first + children.len(), GpuNode::EMPTY);
                nodes[slot] = GpuNode::mixed(child_mask, first as u32);

                for (i, child_pos) in children.into_iter().enumerate() {
                    self.emit_pruned_node(pyramid, depth + 1, child_pos, first + i, nodes);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::layout::octant_of;
    use crate::gpu::voxel::{AIR, STONE};

    fn builder(size: u32, encoding: Encoding) -> OctreeBuilder {
        OctreeBuilder::with_chunk_size(size, encoding).unwrap()
    }

    /// Спуск от корня до вокселя (x, y, z) - как это делает трассировщик
    fn lookup(octree: &ChunkOctree, levels: u32, x: u32, y: u32, z: u32) -> u32 {
        let mut index = NodeIndex::ROOT;
        for depth in 0..=levels {
            match octree.node(index) {
                OctreeNode::Empty => return AIR,
                OctreeNode::Uniform(m) => return m,
                OctreeNode::Mixed { .. } => {
                    let shift = levels - depth - 1;
                    let octant = octant_of((x >> shift) & 1, (y >> shift) & 1, (z >> shift) & 1);
                    match octree.child(index, octant) {
                        Some(child) => index = child,
                        None => return AIR,
                    }
                }
            }
        }
        unreachable!("descended below leaf level")
    }

    fn sample_chunk(layout: &ChunkLayout) -> VoxelChunk {
        let s = layout.chunk_size();
        VoxelChunk::from_fn(layout, |x, y, z| {
            if y < s / 2 {
                STONE
            } else if (x + z) % 5 == 0 {
                7 + (x % 3)
            } else {
                AIR
            }
        })
    }

    #[test]
    fn rejects_non_power_of_two_size() {
        assert!(matches!(
            OctreeBuilder::with_chunk_size(12, Encoding::Pruned),
            Err(WorldError::InvalidChunkSize(12))
        ));
    }

    #[test]
    fn rejects_mismatched_chunk() {
        let small = ChunkLayout::new(4).unwrap();
        let chunk = VoxelChunk::empty(&small);
        let result = builder(8, Encoding::Pruned).build(&chunk);
        assert!(matches!(
            result,
            Err(WorldError::ChunkSizeMismatch { expected: 512, actual: 64 })
        ));
    }

    #[test]
    fn empty_chunk_pruned_is_single_empty_root() {
        let b = builder(32, Encoding::Pruned);
        let octree = b.build(&VoxelChunk::empty(b.layout())).unwrap();
        assert_eq!(octree.node_count(), 1);
        assert_eq!(octree.root(), OctreeNode::Empty);
    }

    #[test]
    fn empty_chunk_complete_is_full_tree_of_empty_nodes() {
        let b = builder(8, Encoding::Complete);
        let octree = b.build(&VoxelChunk::empty(b.layout())).unwrap();
        assert_eq!(octree.node_count(), 585);
        assert!(octree.nodes().iter().all(|n| n.is_empty()));
    }

    #[test]
    fn uniform_chunk_pruned_is_single_uniform_root() {
        let b = builder(16, Encoding::Pruned);
        let octree = b.build(&VoxelChunk::filled(b.layout(), 9)).unwrap();
        assert_eq!(octree.node_count(), 1);
        assert_eq!(octree.root(), OctreeNode::Uniform(9));
    }

    #[test]
    fn single_filled_octant() {
        let b = builder(2, Encoding::Pruned);
        let chunk = VoxelChunk::from_voxels(b.layout(), vec![1, 0, 0, 0, 0, 0, 0, 0]).unwrap();
        let octree = b.build(&chunk).unwrap();

        assert_eq!(octree.node_count(), 2);
        match octree.root() {
            OctreeNode::Mixed { child_mask, .. } => assert_eq!(child_mask, 0b0000_0001),
            other => panic!("expected mixed root, got {other:?}"),
        }
        let child = octree.child(NodeIndex::ROOT, 0).unwrap();
        assert_eq!(octree.node(child), OctreeNode::Uniform(1));
        for octant in 1..8 {
            assert_eq!(octree.child(NodeIndex::ROOT, octant), None);
        }
    }

    #[test]
    fn complete_tree_uses_arithmetic_children() {
        let b = builder(2, Encoding::Complete);
        let chunk = VoxelChunk::from_voxels(b.layout(), vec![1, 0, 0, 0, 0, 0, 0, 3]).unwrap();
        let octree = b.build(&chunk).unwrap();

        assert_eq!(octree.node_count(), 9);
        let root = octree.nodes()[0];
        assert!(root.is_mixed());
        assert_eq!(root.child_mask(), 0xFF);
        assert_eq!(root.first_child(), 1);
        assert_eq!(octree.nodes()[1].material(), Some(1));
        assert_eq!(octree.nodes()[8].material(), Some(3));
        assert!(octree.nodes()[2..8].iter().all(|n| n.is_empty()));
    }

    #[test]
    fn uniform_subtrees_collapse() {
        let b = builder(4, Encoding::Pruned);
        // нижняя половина - камень, верхняя - воздух
        let chunk = VoxelChunk::from_fn(b.layout(), |_, y, _| if y < 2 { STONE } else { AIR });
        let octree = b.build(&chunk).unwrap();

        // корень + 4 нижних октанта (верхние пустые и не хранятся)
        assert_eq!(octree.node_count(), 5);
        match octree.root() {
            OctreeNode::Mixed { child_mask, .. } => assert_eq!(child_mask, 0b0011_0011),
            other => panic!("expected mixed root, got {other:?}"),
        }
        assert!(octree.nodes()[1..].iter().all(|n| n.material() == Some(STONE)));
    }

    #[test]
    fn building_twice_is_identical() {
        for encoding in [Encoding::Complete, Encoding::Pruned] {
            let b = builder(16, encoding);
            let chunk = sample_chunk(b.layout());
            let first = b.build(&chunk).unwrap();
            let second = b.build(&chunk).unwrap();
            assert_eq!(
                bytemuck::cast_slice::<GpuNode, u8>(first.nodes()),
                bytemuck::cast_slice::<GpuNode, u8>(second.nodes())
            );
        }
    }

    #[test]
    fn lookup_matches_voxels_for_both_encodings() {
        for encoding in [Encoding::Complete, Encoding::Pruned] {
            let b = builder(8, encoding);
            let chunk = sample_chunk(b.layout());
            let octree = b.build(&chunk).unwrap();
            for z in 0..8 {
                for y in 0..8 {
                    for x in 0..8 {
                        assert_eq!(
                            lookup(&octree, 3, x, y, z),
                            chunk.get(x, y, z),
                            "{encoding:?} at ({x}, {y}, {z})"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn pruned_is_smaller_than_complete() {
        let complete = builder(16, Encoding::Complete);
        let pruned = builder(16, Encoding::Pruned);
        let chunk = sample_chunk(complete.layout());
        let c = complete.build(&chunk).unwrap();
        let p = pruned.build(&chunk).unwrap();
        assert_eq!(c.node_count(), complete.layout().nodes_per_chunk());
        assert!(p.node_count() < c.node_count());
    }
}
