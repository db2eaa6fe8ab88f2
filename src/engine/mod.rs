//! Engine module
//!
//! The scope engine thread and everything it drives: scroll controllers
//! for the live oscilloscopes, static rendering of backend results, and
//! the command/event channels to the UI.

pub mod channels;
pub mod commands;
pub mod displays;
pub mod scope_engine;
pub mod scroll;

pub use channels::{EngineChannels, EngineHandle, EventSender, UiHandle};
pub use commands::{ScopeCommand, ScopeEvent};
pub use displays::{render_clipped, render_steps, trace_colors, DisplayId, DisplayLayout};
pub use scope_engine::{ScopeEngine, ScopeHandle};
pub use scroll::{ScrollController, Scroller};
