//! Application module
//!
//! Contains the main application state and UI logic.

pub mod scope_app;
pub mod theme;

pub use scope_app::ScopeApp;
