// ============================================
// World Error - Ошибки построения мира
// ============================================
// Ошибки конфигурации проверяются один раз при старте,
// ошибки чанков собираются и сворачиваются в ChunkBuildFailed.

use std::fmt;
use std::io;
use std::path::PathBuf;

use super::grid::ChunkCoord;

/// Ось мира (для сообщений об ошибках размеров)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
            Axis::Z => write!(f, "z"),
        }
    }
}

/// Ошибки подсистемы октодеревьев
#[derive(Debug)]
pub enum WorldError {
    /// Размер мира по оси <= 0 (или больше u32)
    InvalidDimension { axis: Axis, value: i64 },
    /// Wx * Wy * Wz не помещается в u32 индекс чанка
    TooManyChunks { dims: [u32; 3], total: u64 },
    /// Размер чанка не степень двойки (или вне допустимого диапазона)
    InvalidChunkSize(u32),
    /// Файл чанка отсутствует
    ChunkNotFound { coord: ChunkCoord, path: PathBuf },
    /// Количество байт/вокселей не совпадает с CHUNK_VOXELS
    ChunkSizeMismatch { expected: usize, actual: usize },
    /// Ошибка ввода-вывода при чтении чанка
    ChunkReadError { coord: ChunkCoord, source: io::Error },
    /// Построение чанка упало, мир целиком не построен
    ChunkBuildFailed { chunk_index: usize, cause: Box<WorldError> },
    /// Общий буфер узлов не адресуется u32 смещениями
    BufferOverflow { nodes: u64 },
    /// Некорректный файл конфигурации
    Config(String),
    /// Нет адаптера/устройства или буфер не помещается в лимиты GPU
    Gpu(String),
    Io(io::Error),
}

impl WorldError {
    /// Оборачивает ошибку одного чанка в ошибку всего мира
    pub fn chunk_build_failed(chunk_index: usize, cause: WorldError) -> Self {
        WorldError::ChunkBuildFailed {
            chunk_index,
            cause: Box::new(cause),
        }
    }
}

impl fmt::Display for WorldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDimension { axis, value } => {
                write!(f, "invalid world dimension along {axis}: {value} (must be in 1..=u32::MAX)")
            }
            Self::TooManyChunks { dims, total } => {
                write!(f, "world of {dims:?} chunks has {total} chunks, limit is u32::MAX")
            }
            Self::InvalidChunkSize(size) => {
                write!(f, "invalid chunk size {size}: must be a power of two in 1..=1024")
            }
            Self::ChunkNotFound { coord, path } => {
                write!(f, "chunk {coord} not found at {}", path.display())
            }
            Self::ChunkSizeMismatch { expected, actual } => {
                write!(f, "chunk data size mismatch: expected {expected}, got {actual}")
            }
            Self::ChunkReadError { coord, source } => {
                write!(f, "failed to read chunk {coord}: {source}")
            }
            Self::ChunkBuildFailed { chunk_index, cause } => {
                write!(f, "failed to build chunk #{chunk_index}: {cause}")
            }
            Self::BufferOverflow { nodes } => {
                write!(f, "node buffer of {nodes} nodes exceeds u32 offset range")
            }
            Self::Config(msg) => write!(f, "invalid configuration: {msg}"),
            Self::Gpu(msg) => write!(f, "gpu error: {msg}"),
            Self::Io(e) => write!(f, "i/o error: {e}"),
        }
    }
}

impl std::error::Error for WorldError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ChunkReadError { source, .. } => Some(source),
            Self::ChunkBuildFailed { cause, .. } => Some(cause.as_ref()),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for WorldError {
    fn from(e: io::Error) -> Self {
        WorldError::Io(e)
    }
}

pub type WorldResult<T> = Result<T, WorldError>;
