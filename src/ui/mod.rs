//! UI Module - egui integration and PageController
//!
//! The controller holds page state and talks to the backend; the view
//! modules only draw it and report what the user did.

pub mod controller;
pub mod app;
pub mod custom_filter;
pub mod editors;
pub mod filters;
pub mod popup;
pub mod router;
pub mod settings;
pub mod widgets;
pub mod threading;

use std::path::Path;

pub use app::{AppUI, UIState};
pub use controller::{PageController, SessionContext};

/// Trait for handing paths and URLs to the desktop environment
pub trait Launcher: Send + Sync {
    fn open_path(&self, path: &Path) -> Result<(), String>;
    fn open_url(&self, url: &str) -> Result<(), String>;
}
