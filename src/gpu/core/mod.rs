// ============================================
// Core Module - Точка входа и аргументы запуска
// ============================================

pub mod app;
mod args;

pub use app::{run, App};
pub use args::{CliArgs, DEFAULT_CONFIG_FILE};
