//! Adblock Options
//!
//! The options window of a desktop ad blocker: filter categories with
//! toggle switches, whitelist and user rule editors, a custom filter
//! subscription dialog and general settings, drawn with egui.
//!
//! The system is organized into functional modules:
//! - **error**: Unified error type hierarchy
//! - **models**: Filter, category and session data shared with the service
//! - **filters**: Loaded filter metadata cache and its view-models
//! - **editor**: Whitelist and user rule text buffers
//! - **backend**: Request/event contract and the in-process filtering service
//! - **config**: Persisted window preferences
//! - **system**: Desktop launcher and logging macros
//! - **ui**: Page controller, router, widgets and egui views

#![allow(dead_code)]

// Core foundational modules
pub mod error;
pub mod models;

// Filter metadata cache and view-models
pub mod filters;

// Rule list editors
pub mod editor;

// Page/service message contract and service
pub mod backend;

// Window preferences
pub mod config;

// OS integration (launcher, logging macros)
pub mod system;

// Robust, decoupled logging system
pub mod log_collector;

// egui frontend
pub mod ui;

// Re-export the log crate for macro usage
pub use log;

// Re-export log collector for use throughout the system
pub use log_collector::{LogCollector, LogLine};

// ============================================================================
// PUBLIC RE-EXPORTS FOR CONVENIENCE
// ============================================================================

pub use error::{AppError, BackendError, ConfigError, FetchError, ImportError, Result};

pub use models::{
    Category, CategoryFilters, CustomFilterInfo, Filter, FilterId, FiltersMetadata, GroupId,
    InitResponse, UserSettings,
};

pub use filters::FilterIndex;

pub use backend::{BackendClient, BackendEvent, BackendRequest, BackendService};

pub use config::{AppState, SettingsManager};

pub use ui::{PageController, SessionContext};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_constant() {
        assert_eq!(VERSION, "0.1.0");
    }

    #[test]
    fn test_error_reexport() {
        let _: Result<i32> = Ok(42);
    }

    #[test]
    fn test_models_reexport() {
        let filter = Filter::new(1, 10);
        assert_eq!(filter.group_id, 10);
        assert!(FilterIndex::new().is_empty());
    }
}
