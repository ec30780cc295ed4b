//! Application layer - Use cases and port interfaces
//!
//! Contains the panel's orchestrations and trait definitions
//! for external system interactions.

use std::sync::Arc;

use crate::domain::config::ConfigStore;

pub mod domain_link;
pub mod lifecycle;
pub mod panel;
pub mod ports;
pub mod save;
pub mod slot;
pub mod trigger;

#[cfg(test)]
pub(crate) mod test_support;

/// The configuration store shared by every orchestrator
pub type SharedStore = Arc<tokio::sync::Mutex<ConfigStore>>;

// Re-export use cases
pub use domain_link::{ConnectReport, DnsReport, DomainLink, DomainLinkError, DomainSettings};
pub use lifecycle::{
    BotLifecycle, BotState, BotStatus, LifecycleError, LifecycleSettings, StartReport,
    UpdateReport, VersionListing,
};
pub use panel::{Panel, PanelPorts, POLL_INTERVAL};
pub use save::{SaveError, SaveOrchestrator, SaveReport, SaveTargets};
pub use slot::{OperationSlot, SlotGuard};
pub use trigger::{Exchange, OrderTrigger, TestOrder, TriggerError};
