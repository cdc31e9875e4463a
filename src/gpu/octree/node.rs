// ============================================
// Octree Node - Узлы октодерева чанка
// ============================================

use crate::gpu::layout::{GpuNode, TAG_EMPTY, TAG_MIXED, TAG_UNIFORM};
use crate::gpu::voxel::{is_air, Voxel};

/// Состояние куба пространства (без ссылок на детей)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeStatus {
    /// Пустой (воздух)
    Empty,
    /// Заполнен одним материалом
    Uniform(Voxel),
    /// Смешанный - есть дети
    Mixed,
}

impl NodeStatus {
    /// Статус листа (один воксель)
    #[inline]
    pub fn from_voxel(voxel: Voxel) -> Self {
        if is_air(voxel) {
            NodeStatus::Empty
        } else {
            NodeStatus::Uniform(voxel)
        }
    }

    /// Статус родителя по 8 детям: все пустые -> Empty,
    /// все Uniform с одним материалом -> Uniform, иначе Mixed
    #[inline]
    pub fn merge(children: &[NodeStatus; 8]) -> Self {
        let first = children[0];
        if first == NodeStatus::Mixed {
            return NodeStatus::Mixed;
        }
        if children[1..].iter().all(|&c| c == first) {
            first
        } else {
            NodeStatus::Mixed
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, NodeStatus::Empty)
    }
}

/// Непрозрачный индекс узла внутри блока чанка
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeIndex(u32);

impl NodeIndex {
    pub const ROOT: Self = Self(0);

    #[inline]
    pub(crate) fn new(index: u32) -> Self {
        Self(index)
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0 as usize
    }
}

/// Раскодированный узел
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OctreeNode {
    Empty,
    Uniform(Voxel),
    Mixed { child_mask: u8, first_child: NodeIndex },
}

impl OctreeNode {
    /// Обратное преобразование; неизвестный тег - нарушение формата
    #[inline]
    pub fn from_gpu(node: GpuNode) -> Self {
        match node.tag() {
            TAG_EMPTY => OctreeNode::Empty,
            TAG_UNIFORM => OctreeNode::Uniform(node.payload),
            TAG_MIXED => OctreeNode::Mixed {
                child_mask: node.child_mask(),
                first_child: NodeIndex(node.first_child()),
            },
            tag => unreachable!("corrupt node record with tag {tag}"),
        }
    }
}
