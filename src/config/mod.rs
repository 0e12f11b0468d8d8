mod core;
mod loader;

pub use self::core::{
    default_parallel, default_position_segments, AnalysisConfig, IgnoreConfig, ImplmapConfig,
    OutputConfig,
};
pub use loader::{
    directory_ancestors, load_config, load_config_from, parse_and_validate_config,
    CONFIG_FILE_NAME,
};
