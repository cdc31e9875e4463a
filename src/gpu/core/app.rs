// ============================================
// App - Построение мира при старте
// ============================================

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;

use crate::gpu::index::WorldOctree;
use crate::gpu::source::export_world;
use crate::gpu::upload::{request_headless_device, GpuOctreeBuffers};
use crate::gpu::world::{WorldBuilder, WorldConfig, WorldResult};

use super::args::{CliArgs, DEFAULT_CONFIG_FILE};

/// Приложение: конфигурация + шаги запуска
pub struct App {
    config: WorldConfig,
    args: CliArgs,
}

impl App {
    pub fn new(args: CliArgs) -> WorldResult<Self> {
        let config = match &args.config {
            Some(path) => WorldConfig::load_from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                WorldConfig::load_from_file(DEFAULT_CONFIG_FILE)?
            }
            None => {
                log::info!("No config file, using built-in defaults");
                WorldConfig::default()
            }
        };
        Ok(Self { config, args })
    }

    pub fn run(&self) -> WorldResult<WorldOctree> {
        // Проверка один раз, до любой работы с чанками
        let settings = self.config.validate()?;
        let source = self.config.create_source(settings.layout);

        if let Some(dir) = &self.args.export {
            export_world(&*source, &settings.grid, dir)?;
        }

        let world = WorldBuilder::from_settings(settings).build(&*source)?;
        let stats = world.stats();
        log::info!(
            "Buffers: nodes {} bytes, offsets {} bytes, dense voxels {} bytes",
            stats.node_bytes,
            stats.offset_bytes,
            stats.voxel_bytes
        );

        if self.args.upload {
            let (device, _queue) = pollster::block_on(request_headless_device())?;
            let buffers = GpuOctreeBuffers::new(&device, &world)?;
            log::info!(
                "GPU buffers ready: {} nodes, {} chunks",
                buffers.node_count,
                buffers.chunk_count
            );
        }

        Ok(world)
    }
}

/// Запуск из командной строки
pub fn run() -> ExitCode {
    env_logger::init();

    let args = CliArgs::parse();

    let result = App::new(args).and_then(|app| app.run());
    match result {
        Ok(world) => {
            println!("{}", world.stats());
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
