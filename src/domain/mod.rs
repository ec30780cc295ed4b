//! Domain layer - Core business logic
//!
//! Contains value objects, pure text transformations, state machines and domain errors.
//! This layer has no dependencies on external systems.

pub mod config;
pub mod dns;
pub mod env_file;
pub mod error;
pub mod operation;
pub mod proxy;
pub mod version;
pub mod whitelist;

// Re-export common types
pub use config::{ConfigStore, ConfigValue, Configuration, PanelSettings, StoreUpdate};
pub use dns::DnsVerdict;
pub use env_file::EnvMap;
pub use error::*;
pub use operation::{OperationKind, OperationState, OperationStatus, StepOutcome};
pub use whitelist::WhitelistValidation;
