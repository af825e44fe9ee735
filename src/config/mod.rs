// Re-export all items from the submodules
mod collection_config;
mod default_configs;

pub use collection_config::{
    ArchiveFormat,
    BoardConfig,
    BoardSection,
    CommandSpec,
    DumpConfig,
    ModemConfig,
    ToolPaths,
    load_or_create_config,
};

pub use default_configs::default_board_sections;
