//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod files;
pub mod host;
pub mod registry;
pub mod settings;

// Re-export common types
pub use files::{FileError, PrivilegedFs};
pub use host::{CommandError, CommandOutput, CommandRunner};
pub use registry::{ImageRegistry, RegistryError, Release, ReleaseError, ReleaseSource};
pub use settings::SettingsStore;
