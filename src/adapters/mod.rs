// Adapters - External system implementations

pub mod archive_zip;
pub mod exec_process;
pub mod fs_local;
pub mod memory_events;
pub mod os_random;
pub mod toml_config;
pub mod tracing_log;

// Re-export adapters
pub use archive_zip::ZipArchiveAdapter;
pub use exec_process::TokioProcessAdapter;
pub use fs_local::LocalFsAdapter;
pub use memory_events::MemoryEventSink;
pub use os_random::OsRandomAdapter;
pub use toml_config::TomlConfigAdapter;
pub use tracing_log::TracingEventSink;
