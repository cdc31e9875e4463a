// ============================================
// CLI Args - Аргументы командной строки
// ============================================

use std::path::PathBuf;

use clap::Parser;

/// Файл конфигурации по умолчанию (если есть в рабочем каталоге)
pub const DEFAULT_CONFIG_FILE: &str = "world.json";

#[derive(Clone, Debug, Default, PartialEq, Eq, Parser)]
#[command(
    name = "chunked-svo",
    about = "Build the chunked sparse voxel octree of a world",
    after_help = "Log level: RUST_LOG=info|debug"
)]
pub struct CliArgs {
    /// World configuration JSON (default: world.json if present)
    pub config: Option<PathBuf>,
    /// Write every chunk as DIR/chunk-x-y-z.bin
    #[arg(long, value_name = "DIR")]
    pub export: Option<PathBuf>,
    /// Upload the built buffers to a headless GPU device
    #[arg(long)]
    pub upload: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_options() {
        let args =
            CliArgs::try_parse_from(["chunked-svo", "world.json", "--export", "out", "--upload"])
                .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("world.json")));
        assert_eq!(args.export, Some(PathBuf::from("out")));
        assert!(args.upload);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(CliArgs::try_parse_from(["chunked-svo", "--export"]).is_err());
        assert!(CliArgs::try_parse_from(["chunked-svo", "--fast"]).is_err());
        assert!(CliArgs::try_parse_from(["chunked-svo", "a.json", "b.json"]).is_err());
        assert_eq!(CliArgs::try_parse_from(["chunked-svo"]).unwrap(), CliArgs::default());
    }
}
