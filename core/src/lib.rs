use anyhow::Context;
use log::LevelFilter;
use log4rs::{
    append::{
        console::{ConsoleAppender, Target},
        file::FileAppender,
    },
    config::{Appender, Config, Root},
    encode::{Encode, pattern::PatternEncoder},
    filter::threshold::ThresholdFilter,
};
use std::{backtrace, env, path::Path};

#[macro_use]
pub mod byte_operations;
pub mod config;
pub mod constants;
pub mod decoder;
pub mod error;
pub mod grid;
pub mod height;
pub mod manifest;
pub mod map;
pub mod mesh;
pub mod overview;
pub mod services;
pub mod spatial;
pub mod string_operations;
pub mod types;

pub use config::TerrainConfig;
pub use error::{ErrorKind, MapError, MapResult};
pub use grid::ChunkGrid;
pub use manifest::{ManifestRegistry, MapManifest, MapModes};
pub use map::{Map, MapState};
pub use services::{
    DirectoryResolver, HeadlessBackend, MapServices, PathResolver, RenderBackend,
};
pub use types::{MapChunk, MapDimensions, MapSpawn, MapTile, TileType, Vec2};

#[derive(Debug)]
struct BacktracePatternEncoder {
    pattern_encoder: PatternEncoder,
    is_backtrace_enabled: bool,
}

impl BacktracePatternEncoder {
    fn new(pattern: &str) -> Self {
        BacktracePatternEncoder {
            pattern_encoder: PatternEncoder::new(pattern),
            is_backtrace_enabled: env::var("RUST_BACKTRACE").is_ok()
                || env::var("RUST_LIB_BACKTRACE").is_ok(),
        }
    }
}

impl Encode for BacktracePatternEncoder {
    fn encode(
        &self,
        w: &mut dyn log4rs::encode::Write,
        record: &log::Record<'_>,
    ) -> anyhow::Result<()> {
        if record.level() != log::Level::Error || !self.is_backtrace_enabled {
            return self.pattern_encoder.encode(w, record);
        }

        let args = format_args!(
            "{}\nBacktrace:\n{}",
            record.args(),
            backtrace::Backtrace::capture()
        );
        let with_backtrace = log::Record::builder()
            .args(args)
            .level(record.level())
            .target(record.target())
            .module_path(record.module_path())
            .file(record.file())
            .line(record.line())
            .build();
        self.pattern_encoder.encode(w, &with_backtrace)
    }
}

/// Installs the global logger.
///
/// # Arguments
/// * `log_level` - Threshold for stderr; the optional log file gets the same.
/// * `file_path` - Also append records to this file when given.
pub fn initialize_logger(log_level: LevelFilter, file_path: Option<&Path>) -> anyhow::Result<()> {
    const LOGGING_PATTERN: &str = "{d} {l} {t} - {m}\n";

    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(BacktracePatternEncoder::new(LOGGING_PATTERN)))
        .build();

    let mut config_builder = Config::builder().appender(
        Appender::builder()
            .filter(Box::new(ThresholdFilter::new(log_level)))
            .build("stderr", Box::new(stderr)),
    );
    let mut root = Root::builder().appender("stderr");

    if let Some(path) = file_path {
        let logfile = FileAppender::builder()
            .encoder(Box::new(BacktracePatternEncoder::new(LOGGING_PATTERN)))
            .build(path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;

        config_builder =
            config_builder.appender(Appender::builder().build("logfile", Box::new(logfile)));
        root = root.appender("logfile");
    }

    let config = config_builder
        .build(root.build(log_level))
        .context("Invalid logger configuration")?;

    log4rs::init_config(config).context("Logger already initialized")?;

    Ok(())
}
