//! # imgload CLI
//!
//! Library half of the `imgload` binary: argument definitions, tracing
//! setup, a filesystem [`ImageSource`](imgload_core::ImageSource), and the
//! subcommand runners.

pub mod cli;
pub mod commands;
pub mod fs_source;
pub mod logging;

pub use cli::{build_cli, loader_config, log_settings};
pub use commands::{compress, probe, run, sizes, CompressReport, SizesReport};
pub use fs_source::FsImageSource;
pub use logging::{init_tracing, LogSettings};
