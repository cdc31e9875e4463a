// ============================================
// World Grid - Решётка чанков мира
// ============================================
// chunk_index = cz * Wy * Wx + cy * Wx + cx (x быстрее всех)

use std::fmt;

use ndshape::{RuntimeShape, Shape};

use super::error::{Axis, WorldError, WorldResult};

/// Координаты чанка в решётке мира
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ChunkCoord {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl ChunkCoord {
    #[inline]
    pub fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn to_array(self) -> [u32; 3] {
        [self.x, self.y, self.z]
    }

    #[inline]
    pub fn from_array(arr: [u32; 3]) -> Self {
        Self { x: arr[0], y: arr[1], z: arr[2] }
    }
}

impl fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Размеры мира в чанках
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorldGrid {
    dims: [u32; 3],
}

impl WorldGrid {
    /// Создать решётку, каждое измерение должно быть > 0
    pub fn new(wx: i64, wy: i64, wz: i64) -> WorldResult<Self> {
        let mut dims = [0u32; 3];
        for ((axis, value), dst) in [(Axis::X, wx), (Axis::Y, wy), (Axis::Z, wz)]
            .into_iter()
            .zip(dims.iter_mut())
        {
            if value <= 0 || value > u32::MAX as i64 {
                return Err(WorldError::InvalidDimension { axis, value });
            }
            *dst = value as u32;
        }

        // Индексы чанков хранятся в u32 (таблица смещений)
        let total = dims.iter().map(|&d| d as u64).product::<u64>();
        if total > u32::MAX as u64 {
            return Err(WorldError::TooManyChunks { dims, total });
        }

        Ok(Self { dims })
    }

    #[inline]
    pub fn dims(&self) -> [u32; 3] {
        self.dims
    }

    #[inline]
    fn shape(&self) -> RuntimeShape<u32, 3> {
        RuntimeShape::<u32, 3>::new(self.dims)
    }

    /// TOTAL_CHUNKS = Wx * Wy * Wz
    #[inline]
    pub fn total_chunks(&self) -> usize {
        self.shape().size() as usize
    }

    #[inline]
    pub fn contains(&self, coord: ChunkCoord) -> bool {
        coord.x < self.dims[0] && coord.y < self.dims[1] && coord.z < self.dims[2]
    }

    /// Линейный индекс чанка
    #[inline]
    pub fn chunk_index(&self, coord: ChunkCoord) -> usize {
        debug_assert!(self.contains(coord), "chunk {coord} outside of {:?}", self.dims);
        self.shape().linearize(coord.to_array()) as usize
    }

    /// Обратное преобразование индекса в координаты
    #[inline]
    pub fn chunk_coord(&self, index: usize) -> ChunkCoord {
        debug_assert!(index < self.total_chunks());
        ChunkCoord::from_array(self.shape().delinearize(index as u32))
    }

    /// Все координаты в каноническом порядке: z, затем y, затем x.
    /// Порядок совпадает с возрастанием chunk_index.
    pub fn coords(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        let [wx, wy, wz] = self.dims;
        (0..wz).flat_map(move |z| {
            (0..wy).flat_map(move |y| (0..wx).map(move |x| ChunkCoord::new(x, y, z)))
        })
    }
}
