// ============================================
// GPU Upload - Передача готового мира на GPU
// ============================================
//
// binding 0: storage буфер узлов (GpuNode, 8 байт)
// binding 1: storage таблица смещений (u32 на чанк, в узлах);
//            для полного дерева - заглушка из одного u32
// binding 2: uniform параметры мира

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::gpu::index::WorldOctree;
use crate::gpu::layout::Encoding;
use crate::gpu::world::{WorldError, WorldResult};

/// Параметры мира для трассировщика (32 байта, выравнивание uniform)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct GpuWorldParams {
    pub world_dim: [u32; 3],
    pub chunk_size: u32,
    pub levels: u32,
    /// 0 - Complete, 1 - Pruned
    pub encoding: u32,
    /// Только для Complete, иначе 0
    pub nodes_per_chunk: u32,
    pub _pad: u32,
}

impl GpuWorldParams {
    pub fn from_world(world: &WorldOctree) -> Self {
        let layout = world.layout();
        let (encoding, nodes_per_chunk) = match world.encoding() {
            Encoding::Complete => (0, layout.nodes_per_chunk() as u32),
            Encoding::Pruned => (1, 0),
        };
        Self {
            world_dim: world.grid().dims(),
            chunk_size: layout.chunk_size(),
            levels: layout.levels(),
            encoding,
            nodes_per_chunk,
            _pad: 0,
        }
    }
}

/// Буферы мира на GPU
pub struct GpuOctreeBuffers {
    pub nodes: wgpu::Buffer,
    pub offsets: wgpu::Buffer,
    pub params: wgpu::Buffer,
    pub node_count: u32,
    pub chunk_count: u32,
}

impl GpuOctreeBuffers {
    pub fn new(device: &wgpu::Device, world: &WorldOctree) -> WorldResult<Self> {
        let node_bytes = world.node_bytes();
        let limits = device.limits();
        if node_bytes.len() as u64 > limits.max_buffer_size
            || node_bytes.len() as u64 > limits.max_storage_buffer_binding_size as u64
        {
            return Err(WorldError::Gpu(format!(
                "node buffer of {} bytes exceeds device limits",
                node_bytes.len()
            )));
        }

        let nodes = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Octree Nodes"),
            contents: node_bytes,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        });

        // Пустой storage буфер недопустим, а раскладка групп должна совпадать
        let placeholder = [0u32];
        let offset_bytes = match world.offset_table() {
            Some(table) => bytemuck::cast_slice(table),
            None => bytemuck::cast_slice(&placeholder[..]),
        };
        let offsets = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Octree Chunk Offsets"),
            contents: offset_bytes,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        });

        let params = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Octree World Params"),
            contents: bytemuck::bytes_of(&GpuWorldParams::from_world(world)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        log::info!(
            "Uploaded octree: {} nodes ({} bytes), {} offset bytes",
            world.nodes().len(),
            node_bytes.len(),
            offset_bytes.len()
        );

        Ok(Self {
            nodes,
            offsets,
            params,
            node_count: world.nodes().len() as u32,
            chunk_count: world.grid().total_chunks() as u32,
        })
    }

    /// Раскладка группы привязок, одинаковая для обеих кодировок
    pub fn bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        let storage = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: true },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Octree Layout"),
            entries: &[
                storage(0),
                storage(1),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::COMPUTE | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        })
    }

    pub fn bind_group(&self, device: &wgpu::Device, layout: &wgpu::BindGroupLayout) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Octree Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: self.nodes.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: self.offsets.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 2, resource: self.params.as_entire_binding() },
            ],
        })
    }
}

/// Устройство без окна (для выгрузки и проверок)
pub async fn request_headless_device() -> WorldResult<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });

    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await
        .map_err(|e| WorldError::Gpu(e.to_string()))?;
    log::info!("Using adapter: {}", adapter.get_info().name);

    adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("Octree Device"),
            required_features: wgpu::Features::empty(),
            required_limits: adapter.limits(),
            memory_hints: Default::default(),
            trace: wgpu::Trace::Off,
        })
        .await
        .map_err(|e| WorldError::Gpu(e.to_string()))
}
